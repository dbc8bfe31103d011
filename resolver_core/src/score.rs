//! Score-based ambiguity resolution.
//!
//! Each candidate gets a continuous quality score built from per-subdetector
//! weighted hit/hole/outlier/shared-hit counts, kinematic cuts and the fit
//! quality. Shared hits are then pruned track by track and only tracks that
//! keep enough measurements and score above threshold survive.
//!
//! # Pipeline per call
//! 1. Classify every trajectory state of every admitted track (hit / outlier /
//!    hole), accumulating per-subdetector [`TrackFeatures`].
//! 2. Score every track with [`ScoreResolver::simple_score`].
//! 3. Prune shared hits and select the accepted tracks.

use crate::interner::MeasurementInterner;
use crate::types::{Measurement, ResolverError, TrackCandidate, TrackStateRef};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Scoring policy for one subdetector.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DetectorConfig {
    pub hits_score_weight: f64,
    pub holes_score_weight: f64,
    pub outliers_score_weight: f64,
    pub shared_hits_score_weight: f64,
    /// A track needs at least this many hits here to score at all.
    pub min_hits: usize,
    pub max_hits: usize,
    pub max_holes: usize,
    pub max_outliers: usize,
    /// Ceiling on shared hits a surviving track may keep in this subdetector.
    pub max_shared_hits: usize,
    /// Sharing is categorically disallowed here: every shared hit is dropped,
    /// never recovered.
    pub shared_hits_flag: bool,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            hits_score_weight: 1.0,
            holes_score_weight: -0.5,
            outliers_score_weight: -0.2,
            shared_hits_score_weight: -0.1,
            min_hits: 0,
            max_hits: 30,
            max_holes: 3,
            max_outliers: 3,
            max_shared_hits: 2,
            shared_hits_flag: false,
        }
    }
}

/// Resolver-level configuration for the score path.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScoreConfig {
    /// Geometry volume → subdetector index. States on unmapped volumes are
    /// skipped with a warning.
    pub volume_map: HashMap<u64, usize>,
    /// One record per subdetector, indexed by the mapped id.
    pub detector_configs: Vec<DetectorConfig>,
    /// Tracks with fewer accepted hits never enter resolution.
    pub n_hits_min: usize,
    /// Accepted tracks must score at least this much.
    pub min_score: f64,
    /// A track may only keep shared hits while its score exceeds this.
    pub min_score_shared_tracks: f64,
    /// Ceiling on shared hits kept per track.
    pub max_shared: usize,
    /// A hit shared by at least this many tracks is never kept.
    pub max_shared_tracks_per_measurement: usize,
    pub pt_min: f64,
    pub pt_max: f64,
    pub phi_min: f64,
    pub phi_max: f64,
    pub eta_min: f64,
    pub eta_max: f64,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            volume_map: HashMap::new(),
            detector_configs: vec![DetectorConfig::default()],
            n_hits_min: 7,
            min_score: 0.0,
            min_score_shared_tracks: 0.0,
            max_shared: 5,
            max_shared_tracks_per_measurement: 10,
            pt_min: 0.0,
            pt_max: 1e5,
            phi_min: -std::f64::consts::PI,
            phi_max: std::f64::consts::PI,
            eta_min: -5.0,
            eta_max: 5.0,
        }
    }
}

/// Per-subdetector state counts for one track, rebuilt every call.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackFeatures {
    pub n_hits: usize,
    pub n_holes: usize,
    pub n_outliers: usize,
    pub n_shared_hits: usize,
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// One surviving track with its pruned measurement list.
#[derive(Clone, Debug)]
pub struct AcceptedTrack {
    /// Index into the input track sequence.
    pub track: usize,
    pub score: f64,
    /// The track's hit/outlier states that survived pruning, in the original
    /// traversal order. Holes are not measurements and never appear here.
    pub measurements: Vec<TrackStateRef>,
}

/// Outcome of one score-based resolution call.
#[derive(Clone, Debug, Default)]
pub struct ScoreResolution {
    /// Accepted tracks in input order.
    pub accepted: Vec<AcceptedTrack>,
}

// ---------------------------------------------------------------------------
// Internal per-call state
// ---------------------------------------------------------------------------

/// A measurement-bearing state of an admitted track.
#[derive(Clone, Debug)]
struct StateEntry {
    canonical: usize,
    subdetector: usize,
    /// Index into the candidate's `states` list, for copying through.
    state_index: usize,
    outlier: bool,
}

struct ScoreState {
    /// Slot → original input index.
    track_index: Vec<usize>,
    /// Slot → hit/outlier entries in traversal order.
    entries: Vec<Vec<StateEntry>>,
    /// Slot → per-subdetector features.
    features: Vec<Vec<TrackFeatures>>,
    n_canonical: usize,
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

/// Computes a quality score per track, prunes shared hits and keeps tracks
/// above threshold.
#[derive(Clone, Debug, Default)]
pub struct ScoreResolver {
    pub config: ScoreConfig,
}

impl ScoreResolver {
    pub fn new(config: ScoreConfig) -> Self {
        Self { config }
    }

    /// Resolve one event's candidates. Each call builds its own state; nothing
    /// is retained between calls.
    pub fn solve(
        &self,
        tracks: &[TrackCandidate],
        measurements: &[Measurement],
    ) -> Result<ScoreResolution, ResolverError> {
        let state = self.compute_initial_state(tracks, measurements)?;
        let scores: Vec<f64> = (0..state.track_index.len())
            .map(|slot| self.simple_score(&tracks[state.track_index[slot]], &state.features[slot]))
            .collect();
        let accepted = self.clean_tracks(tracks, &state, &scores);
        Ok(ScoreResolution { accepted })
    }

    /// Classify every trajectory state of every admitted track and accumulate
    /// per-subdetector features. Hits and outliers are interned; holes carry
    /// no measurement. Shared-hit counts are taken over all admitted tracks.
    fn compute_initial_state(
        &self,
        tracks: &[TrackCandidate],
        measurements: &[Measurement],
    ) -> Result<ScoreState, ResolverError> {
        let n_subdetectors = self.config.detector_configs.len();
        let mut interner = MeasurementInterner::new();
        let mut track_index = Vec::new();
        let mut entries: Vec<Vec<StateEntry>> = Vec::new();
        let mut features: Vec<Vec<TrackFeatures>> = Vec::new();

        for (index, track) in tracks.iter().enumerate() {
            for state in &track.states {
                if let Some(raw) = state.measurement() {
                    if raw >= measurements.len() {
                        return Err(ResolverError::InvalidInput {
                            track: index,
                            measurement: raw,
                            n_measurements: measurements.len(),
                        });
                    }
                }
            }
            if track.n_hits() < self.config.n_hits_min {
                continue;
            }

            let mut track_entries = Vec::new();
            let mut track_features = vec![TrackFeatures::default(); n_subdetectors];
            for (state_index, state) in track.states.iter().enumerate() {
                let volume = state.surface().volume();
                let Some(&subdetector) = self.config.volume_map.get(&volume) else {
                    tracing::warn!(track = index, volume, "state on unmapped volume, skipping");
                    continue;
                };
                if subdetector >= n_subdetectors {
                    tracing::warn!(
                        track = index,
                        volume,
                        subdetector,
                        "volume maps to a subdetector without a config record, skipping"
                    );
                    continue;
                }
                match state {
                    TrackStateRef::Hole { .. } => {
                        track_features[subdetector].n_holes += 1;
                    }
                    TrackStateRef::Outlier { surface, measurement } => {
                        track_features[subdetector].n_outliers += 1;
                        track_entries.push(StateEntry {
                            canonical: interner.intern(*surface, *measurement),
                            subdetector,
                            state_index,
                            outlier: true,
                        });
                    }
                    TrackStateRef::Hit { surface, measurement } => {
                        track_features[subdetector].n_hits += 1;
                        track_entries.push(StateEntry {
                            canonical: interner.intern(*surface, *measurement),
                            subdetector,
                            state_index,
                            outlier: false,
                        });
                    }
                }
            }
            track_index.push(index);
            entries.push(track_entries);
            features.push(track_features);
        }

        // Second pass: flag hits shared between admitted tracks.
        let n_canonical = interner.len();
        let mut tracks_per_measurement = vec![HashSet::new(); n_canonical];
        for (slot, track_entries) in entries.iter().enumerate() {
            for entry in track_entries {
                tracks_per_measurement[entry.canonical].insert(slot);
            }
        }
        for (slot, track_entries) in entries.iter().enumerate() {
            for entry in track_entries {
                if !entry.outlier && tracks_per_measurement[entry.canonical].len() > 1 {
                    features[slot][entry.subdetector].n_shared_hits += 1;
                }
            }
        }

        Ok(ScoreState {
            track_index,
            entries,
            features,
            n_canonical,
        })
    }

    /// Score one track from its kinematics, per-subdetector features and fit
    /// quality. Any gate failure short-circuits to 0.
    pub fn simple_score(&self, track: &TrackCandidate, features: &[TrackFeatures]) -> f64 {
        let cfg = &self.config;
        let pt = track.pt();
        let phi = track.phi();
        let eta = track.eta();
        if pt < cfg.pt_min || pt > cfg.pt_max {
            return 0.0;
        }
        if phi < cfg.phi_min || phi > cfg.phi_max {
            return 0.0;
        }
        if eta < cfg.eta_min || eta > cfg.eta_max {
            return 0.0;
        }

        for (detector, features) in cfg.detector_configs.iter().zip(features) {
            if features.n_hits < detector.min_hits || features.n_hits > detector.max_hits {
                return 0.0;
            }
            if features.n_holes > detector.max_holes {
                return 0.0;
            }
            if features.n_outliers > detector.max_outliers {
                return 0.0;
            }
        }

        let mut score = 1.0;
        for (detector, features) in cfg.detector_configs.iter().zip(features) {
            score += features.n_hits as f64 * detector.hits_score_weight
                + features.n_holes as f64 * detector.holes_score_weight
                + features.n_outliers as f64 * detector.outliers_score_weight
                + features.n_shared_hits as f64 * detector.shared_hits_score_weight;
        }

        if track.chi2 > 0.0 && track.ndf > 0 {
            let p = 1.0 / (10.0 * track.chi2 / track.ndf as f64).log10();
            if p > 0.0 {
                score += p;
            } else {
                score -= 50.0;
            }
        }
        score
    }

    /// Prune shared hits track by track and keep the accepted set: walk each
    /// surviving track's measurement entries in order, copy outliers and
    /// unshared hits through, drop hits in sharing-disallowed subdetectors,
    /// and keep other shared hits while the per-track budget allows.
    fn clean_tracks(
        &self,
        tracks: &[TrackCandidate],
        state: &ScoreState,
        scores: &[f64],
    ) -> Vec<AcceptedTrack> {
        let cfg = &self.config;
        let alive: Vec<usize> = (0..state.track_index.len())
            .filter(|&slot| scores[slot] > 0.0)
            .collect();

        // Reverse index restricted to positively scored tracks.
        let mut tracks_per_measurement = vec![HashSet::new(); state.n_canonical];
        for &slot in &alive {
            for entry in &state.entries[slot] {
                tracks_per_measurement[entry.canonical].insert(slot);
            }
        }

        let mut accepted = Vec::new();
        for &slot in &alive {
            let mut kept: Vec<usize> = Vec::new();
            let mut n_shared = 0;
            let mut shared_per_detector = vec![0usize; cfg.detector_configs.len()];

            for entry in &state.entries[slot] {
                if entry.outlier {
                    kept.push(entry.state_index);
                    continue;
                }
                let n_sharing = tracks_per_measurement[entry.canonical].len();
                if n_sharing <= 1 {
                    kept.push(entry.state_index);
                    continue;
                }
                if cfg.detector_configs[entry.subdetector].shared_hits_flag {
                    // Sharing disallowed here outright.
                    continue;
                }
                if n_shared < cfg.max_shared
                    && n_sharing < cfg.max_shared_tracks_per_measurement
                    && scores[slot] > cfg.min_score_shared_tracks
                {
                    kept.push(entry.state_index);
                    n_shared += 1;
                    shared_per_detector[entry.subdetector] += 1;
                }
            }

            if kept.len() < 3 {
                continue;
            }
            if shared_per_detector
                .iter()
                .zip(&cfg.detector_configs)
                .any(|(&n, detector)| n > detector.max_shared_hits)
            {
                continue;
            }
            if scores[slot] < cfg.min_score {
                continue;
            }

            let track = state.track_index[slot];
            accepted.push(AcceptedTrack {
                track,
                score: scores[slot],
                measurements: kept
                    .into_iter()
                    .map(|state_index| tracks[track].states[state_index].clone())
                    .collect(),
            });
        }
        accepted
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
