//! Shared-hit bookkeeping over a set of candidate tracks.
//!
//! `SharedHitState` is the substrate the greedy resolver iterates on: per-track
//! canonical measurement lists, the reverse measurement → tracks index, and an
//! incrementally maintained count of shared measurements per track.
//!
//! Invariant: for every surviving track `t`, `shared_measurements_per_track[t]`
//! equals the number of its canonical measurements whose `tracks_per_measurement`
//! set holds more than one track. `remove_track` maintains this without a full
//! recount.

use crate::interner::MeasurementInterner;
use crate::types::{Measurement, ResolverError, TrackCandidate, TrackStateRef};
use std::collections::{BTreeSet, HashSet};

/// Derived per-event state for shared-hit resolution. Admitted tracks are
/// referred to by dense *slots*; `track_index` maps a slot back to the
/// candidate's position in the input sequence. All containers live for one
/// resolution call only.
#[derive(Debug)]
pub struct SharedHitState {
    /// Slot → original input index.
    pub track_index: Vec<usize>,
    /// Slot → canonical measurement indices, in trajectory traversal order.
    pub measurements_per_track: Vec<Vec<usize>>,
    /// Slot → normalized chi-square of the fit.
    pub chi2_over_ndf: Vec<f64>,
    /// Canonical measurement index → slots currently containing it.
    pub tracks_per_measurement: Vec<HashSet<usize>>,
    /// Slot → number of its measurements currently shared with another
    /// surviving track.
    pub shared_measurements_per_track: Vec<usize>,
    /// Slots not yet evicted, ascending.
    pub selected: BTreeSet<usize>,
}

impl SharedHitState {
    /// Build the state from the candidate list. Tracks with fewer than
    /// `n_measurements_min` accepted measurements are left out entirely; a
    /// measurement index outside the collection fails the whole call.
    pub fn compute_initial_state(
        tracks: &[TrackCandidate],
        measurements: &[Measurement],
        n_measurements_min: usize,
    ) -> Result<Self, ResolverError> {
        let mut interner = MeasurementInterner::new();
        let mut track_index = Vec::new();
        let mut measurements_per_track: Vec<Vec<usize>> = Vec::new();
        let mut chi2_over_ndf = Vec::new();

        for (index, track) in tracks.iter().enumerate() {
            let mut referenced = Vec::new();
            for state in &track.states {
                if let TrackStateRef::Hit { surface, measurement } = state {
                    if *measurement >= measurements.len() {
                        return Err(ResolverError::InvalidInput {
                            track: index,
                            measurement: *measurement,
                            n_measurements: measurements.len(),
                        });
                    }
                    referenced.push((*surface, *measurement));
                }
            }
            if referenced.len() < n_measurements_min {
                continue;
            }
            let canonical = referenced
                .into_iter()
                .map(|(surface, raw)| interner.intern(surface, raw))
                .collect();
            track_index.push(index);
            measurements_per_track.push(canonical);
            chi2_over_ndf.push(track.chi2_over_ndf());
        }

        let mut tracks_per_measurement: Vec<HashSet<usize>> = vec![HashSet::new(); interner.len()];
        for (slot, canonical) in measurements_per_track.iter().enumerate() {
            for &m in canonical {
                tracks_per_measurement[m].insert(slot);
            }
        }

        let shared_measurements_per_track = measurements_per_track
            .iter()
            .map(|canonical| {
                canonical
                    .iter()
                    .filter(|&&m| tracks_per_measurement[m].len() > 1)
                    .count()
            })
            .collect();

        let selected = (0..track_index.len()).collect();

        Ok(Self {
            track_index,
            measurements_per_track,
            chi2_over_ndf,
            tracks_per_measurement,
            shared_measurements_per_track,
            selected,
        })
    }

    /// Number of admitted tracks (evicted or not).
    pub fn n_tracks(&self) -> usize {
        self.track_index.len()
    }

    /// Fraction of this slot's measurements currently shared.
    pub fn shared_fraction(&self, slot: usize) -> f64 {
        let n = self.measurements_per_track[slot].len();
        if n == 0 {
            0.0
        } else {
            self.shared_measurements_per_track[slot] as f64 / n as f64
        }
    }

    /// Evict a track: drop it from every measurement's track set and from the
    /// selected set. A measurement left with exactly one track is no longer
    /// shared, so the remaining track's shared count goes down by one.
    pub fn remove_track(&mut self, slot: usize) {
        for &m in &self.measurements_per_track[slot] {
            let set = &mut self.tracks_per_measurement[m];
            if !set.remove(&slot) {
                continue;
            }
            if set.len() == 1 {
                if let Some(&remaining) = set.iter().next() {
                    self.shared_measurements_per_track[remaining] -= 1;
                }
            }
        }
        self.selected.remove(&slot);
    }

    /// Full recount of shared measurements per slot, for cross-checking the
    /// incremental values.
    #[cfg(test)]
    pub(crate) fn recount_shared(&self) -> Vec<usize> {
        self.measurements_per_track
            .iter()
            .map(|canonical| {
                canonical
                    .iter()
                    .filter(|&&m| self.tracks_per_measurement[m].len() > 1)
                    .count()
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Momentum, SurfaceId};

    /// Track whose i-th hit references measurement `hits[i]`, all on distinct
    /// surfaces derived from the measurement index.
    fn track(hits: &[usize], chi2: f64) -> TrackCandidate {
        TrackCandidate {
            states: hits
                .iter()
                .map(|&m| TrackStateRef::Hit {
                    surface: SurfaceId::new(16, m as u64),
                    measurement: m,
                })
                .collect(),
            chi2,
            ndf: hits.len() as u32,
            momentum: Momentum::new(0.0, 1.0, 0.0),
        }
    }

    fn measurements(n: usize) -> Vec<Measurement> {
        (0..n)
            .map(|m| Measurement {
                surface: SurfaceId::new(16, m as u64),
            })
            .collect()
    }

    #[test]
    fn construction_counts_shared_measurements() {
        let tracks = vec![
            track(&[0, 1, 2, 3], 1.0),
            track(&[2, 3, 4, 5], 1.0),
            track(&[6, 7, 8, 9], 1.0),
        ];
        let state =
            SharedHitState::compute_initial_state(&tracks, &measurements(10), 1).unwrap();
        assert_eq!(state.n_tracks(), 3);
        assert_eq!(state.shared_measurements_per_track, vec![2, 2, 0]);
        assert_eq!(state.selected.len(), 3);
    }

    #[test]
    fn short_tracks_are_absent_from_all_structures() {
        let tracks = vec![track(&[0, 1], 1.0), track(&[0, 1, 2, 3, 4], 1.0)];
        let state =
            SharedHitState::compute_initial_state(&tracks, &measurements(5), 3).unwrap();
        assert_eq!(state.n_tracks(), 1);
        assert_eq!(state.track_index, vec![1]);
        // The survivor shares nothing: the short track never entered the state.
        assert_eq!(state.shared_measurements_per_track, vec![0]);
    }

    #[test]
    fn traversal_order_is_preserved() {
        let tracks = vec![track(&[3, 1, 4, 0], 1.0)];
        let state =
            SharedHitState::compute_initial_state(&tracks, &measurements(5), 1).unwrap();
        // Canonical indices are allocated in traversal order.
        assert_eq!(state.measurements_per_track[0], vec![0, 1, 2, 3]);
    }

    #[test]
    fn dangling_measurement_index_fails_loudly() {
        let tracks = vec![track(&[0, 99], 1.0)];
        let err = SharedHitState::compute_initial_state(&tracks, &measurements(5), 1)
            .unwrap_err();
        let ResolverError::InvalidInput { track, measurement, n_measurements } = err;
        assert_eq!((track, measurement, n_measurements), (0, 99, 5));
    }

    #[test]
    fn eviction_maintains_the_shared_count_invariant() {
        let tracks = vec![
            track(&[0, 1, 2, 3], 1.0),
            track(&[2, 3, 4, 5], 1.0),
            track(&[3, 5, 6, 7], 1.0),
        ];
        let mut state =
            SharedHitState::compute_initial_state(&tracks, &measurements(8), 1).unwrap();
        assert_eq!(state.shared_measurements_per_track, state.recount_shared());

        state.remove_track(1);
        assert_eq!(
            state.shared_measurements_per_track[0],
            state.recount_shared()[0],
            "incremental count must match a full recount after eviction"
        );
        assert_eq!(
            state.shared_measurements_per_track[2],
            state.recount_shared()[2]
        );
        // Measurements 2 and 4 and 5 lost their second track; only 3 is still
        // shared between slots 0 and 2.
        assert_eq!(state.shared_measurements_per_track[0], 1);
        assert_eq!(state.shared_measurements_per_track[2], 1);
        assert!(!state.selected.contains(&1));

        state.remove_track(0);
        assert_eq!(state.shared_measurements_per_track[2], 0);
        assert_eq!(state.recount_shared()[2], 0);
    }
}
