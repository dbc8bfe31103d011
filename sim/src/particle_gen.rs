//! Truth-particle and candidate-track generation.
//!
//! Produces events with a controlled amount of ambiguity:
//! - every particle gets one well-fitted candidate,
//! - a configurable fraction of particles also gets a **duplicate** candidate
//!   sharing the leading hits of its source,
//! - **fakes** stitch hits from two unrelated particles and carry a poor fit.
//!
//! Everything is drawn from a seeded `ChaCha8Rng`, so an event batch is fully
//! reproducible from `(params, seed)`.

use crate::event::Event;
use detector_models::DetectorGeometry;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use resolver_core::types::{Measurement, Momentum, SurfaceId, TrackCandidate, TrackStateRef};
use serde::{Deserialize, Serialize};

/// Event-generation knobs.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenParams {
    /// Truth particles per event.
    pub n_particles: usize,
    /// Transverse momentum range (GeV), sampled uniformly.
    pub pt_range: (f64, f64),
    /// Pseudorapidity range, sampled uniformly.
    pub eta_range: (f64, f64),
    /// Per-layer detection probability; a miss leaves a hole on the track.
    pub hit_efficiency: f64,
    /// Probability that a recorded measurement is rejected by the fit.
    pub outlier_prob: f64,
    /// Fraction of particles that also get a duplicate candidate.
    pub duplicate_fraction: f64,
    /// Trailing measurement states a duplicate replaces with holes.
    pub duplicate_tail: usize,
    /// Fake candidates per truth particle.
    pub fake_fraction: f64,
}

impl Default for GenParams {
    fn default() -> Self {
        Self {
            n_particles: 50,
            pt_range: (0.5, 10.0),  // 500 MeV .. 10 GeV
            eta_range: (-2.5, 2.5), // barrel acceptance
            hit_efficiency: 0.95,
            outlier_prob: 0.02,
            duplicate_fraction: 0.3,
            duplicate_tail: 2,
            fake_fraction: 0.1,
        }
    }
}

/// Generates events from a detector geometry and generation parameters.
pub struct EventGenerator {
    geometry: DetectorGeometry,
    params: GenParams,
    rng: ChaCha8Rng,
}

impl EventGenerator {
    pub fn new(geometry: DetectorGeometry, params: GenParams, seed: u64) -> Self {
        Self {
            geometry,
            params,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Generate one event: truth candidates first (in particle order), then
    /// duplicates, then fakes.
    pub fn generate(&mut self) -> Event {
        let mut measurements = Vec::new();
        let mut tracks = Vec::new();
        let mut truth = Vec::new();

        // Truth candidates, one per particle.
        for particle in 0..self.params.n_particles as u64 {
            let momentum = self.sample_momentum();
            let mut states = Vec::with_capacity(self.geometry.n_layers());
            for layer in &self.geometry.layers {
                let surface = SurfaceId::new(layer.volume, particle);
                if self.rng.gen::<f64>() > self.params.hit_efficiency {
                    states.push(TrackStateRef::Hole { surface });
                    continue;
                }
                let measurement = measurements.len();
                measurements.push(Measurement { surface });
                if self.rng.gen::<f64>() < self.params.outlier_prob {
                    states.push(TrackStateRef::Outlier { surface, measurement });
                } else {
                    states.push(TrackStateRef::Hit { surface, measurement });
                }
            }
            let track = self.candidate(states, momentum, (0.5, 1.5));
            tracks.push(track);
            truth.push(Some(particle));
        }

        // Duplicates: share the source's leading hits, lose the tail.
        for particle in 0..self.params.n_particles as u64 {
            if self.rng.gen::<f64>() >= self.params.duplicate_fraction {
                continue;
            }
            let source = &tracks[particle as usize];
            let mut states = source.states.clone();
            let mut to_blank = self.params.duplicate_tail;
            for state in states.iter_mut().rev() {
                if to_blank == 0 {
                    break;
                }
                if state.measurement().is_some() {
                    let surface = state.surface();
                    *state = TrackStateRef::Hole { surface };
                    to_blank -= 1;
                }
            }
            let momentum = source.momentum;
            let duplicate = self.candidate(states, momentum, (2.0, 4.0));
            tracks.push(duplicate);
            truth.push(Some(particle));
        }

        // Fakes: the first half of one particle's trajectory glued to the
        // second half of another's.
        let n_fakes = (self.params.n_particles as f64 * self.params.fake_fraction) as usize;
        for _ in 0..n_fakes {
            let a = self.rng.gen_range(0..self.params.n_particles);
            let b = self.rng.gen_range(0..self.params.n_particles);
            let half = self.geometry.n_layers() / 2;
            let mut states: Vec<TrackStateRef> = tracks[a].states[..half].to_vec();
            states.extend_from_slice(&tracks[b].states[half..]);
            let momentum = tracks[a].momentum;
            let fake = self.candidate(states, momentum, (5.0, 10.0));
            tracks.push(fake);
            truth.push(None);
        }

        Event {
            measurements,
            tracks,
            truth,
        }
    }

    /// Momentum with pt and eta drawn from the configured ranges and phi
    /// uniform over the full circle, beam axis along x.
    fn sample_momentum(&mut self) -> Momentum {
        let (pt_lo, pt_hi) = self.params.pt_range;
        let (eta_lo, eta_hi) = self.params.eta_range;
        let pt = self.rng.gen_range(pt_lo..pt_hi);
        let eta = self.rng.gen_range(eta_lo..eta_hi);
        let phi = self
            .rng
            .gen_range(-std::f64::consts::PI..std::f64::consts::PI);
        Momentum::new(pt * eta.sinh(), pt * phi.cos(), pt * phi.sin())
    }

    /// Wrap states into a candidate with chi2/ndf drawn from `quality`.
    fn candidate(
        &mut self,
        states: Vec<TrackStateRef>,
        momentum: Momentum,
        quality: (f64, f64),
    ) -> TrackCandidate {
        let n_measurements = states.iter().filter(|s| s.measurement().is_some()).count();
        let ndf = (2 * n_measurements).saturating_sub(5).max(1) as u32;
        let chi2 = ndf as f64 * self.rng.gen_range(quality.0..quality.1);
        TrackCandidate {
            states,
            chi2,
            ndf,
            momentum,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn generator(seed: u64) -> EventGenerator {
        EventGenerator::new(DetectorGeometry::default(), GenParams::default(), seed)
    }

    #[test]
    fn same_seed_reproduces_the_event() {
        let a = generator(7).generate();
        let b = generator(7).generate();
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap(),
            "generation must be deterministic in the seed"
        );
    }

    #[test]
    fn different_seeds_differ() {
        let a = generator(7).generate();
        let b = generator(8).generate();
        assert_ne!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn duplicates_share_their_source_hits() {
        let params = GenParams {
            n_particles: 10,
            duplicate_fraction: 1.0,
            fake_fraction: 0.0,
            outlier_prob: 0.0,
            hit_efficiency: 1.0,
            ..GenParams::default()
        };
        let mut gen = EventGenerator::new(DetectorGeometry::default(), params, 3);
        let event = gen.generate();
        assert_eq!(event.tracks.len(), 20, "every particle gets a duplicate");

        for dup_slot in 10..20 {
            let particle = event.truth[dup_slot].unwrap() as usize;
            let source: Vec<usize> = event.tracks[particle]
                .states
                .iter()
                .filter_map(|s| s.measurement())
                .collect();
            let dup: Vec<usize> = event.tracks[dup_slot]
                .states
                .iter()
                .filter_map(|s| s.measurement())
                .collect();
            assert_eq!(dup.len(), source.len() - 2, "tail hits become holes");
            assert!(
                dup.iter().all(|m| source.contains(m)),
                "every duplicate hit must come from the source track"
            );
        }
    }

    #[test]
    fn fakes_are_labelled_none_and_reference_existing_measurements() {
        let params = GenParams {
            n_particles: 10,
            duplicate_fraction: 0.0,
            fake_fraction: 0.5,
            ..GenParams::default()
        };
        let mut gen = EventGenerator::new(DetectorGeometry::default(), params, 11);
        let event = gen.generate();
        let fakes: Vec<usize> = (0..event.tracks.len())
            .filter(|&i| event.truth[i].is_none())
            .collect();
        assert_eq!(fakes.len(), 5);
        for &f in &fakes {
            for state in &event.tracks[f].states {
                if let Some(m) = state.measurement() {
                    assert!(m < event.measurements.len());
                }
            }
        }
    }

    #[test]
    fn momentum_respects_the_configured_ranges() {
        let params = GenParams {
            n_particles: 100,
            pt_range: (1.0, 2.0),
            eta_range: (-1.0, 1.0),
            duplicate_fraction: 0.0,
            fake_fraction: 0.0,
            ..GenParams::default()
        };
        let mut gen = EventGenerator::new(DetectorGeometry::default(), params, 5);
        let event = gen.generate();
        for track in &event.tracks {
            assert!(track.pt() > 1.0 - 1e-9 && track.pt() < 2.0 + 1e-9);
            assert!(track.eta() > -1.0 - 1e-9 && track.eta() < 1.0 + 1e-9);
        }
    }
}
