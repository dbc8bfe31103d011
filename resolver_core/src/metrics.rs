//! Resolution quality metrics: efficiency, duplicate rate, fake rate.
//!
//! Truth labels come from the simulator (or any caller that knows which
//! particle a candidate belongs to); `None` marks a fake candidate.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Accumulated statistics over any number of resolved events.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ResolutionMetrics {
    /// Number of events evaluated.
    pub n_events: u64,
    /// Candidate tracks fed into resolution.
    pub n_candidates: u64,
    /// Tracks surviving resolution.
    pub n_accepted: u64,
    /// Truth particles with at least one candidate.
    pub n_true_particles: u64,
    /// Truth particles with at least one accepted track.
    pub n_matched_particles: u64,
    /// Accepted tracks beyond the first per truth particle.
    pub n_duplicates_kept: u64,
    /// Accepted tracks with no truth particle.
    pub n_fakes_kept: u64,
    /// Greedy calls that ran out of iteration budget.
    pub n_unconverged: u64,
}

impl ResolutionMetrics {
    /// Fraction of truth particles that kept at least one accepted track.
    pub fn efficiency(&self) -> f64 {
        if self.n_true_particles == 0 {
            1.0
        } else {
            self.n_matched_particles as f64 / self.n_true_particles as f64
        }
    }

    /// Fraction of accepted tracks that duplicate another accepted track.
    pub fn duplicate_rate(&self) -> f64 {
        if self.n_accepted == 0 {
            0.0
        } else {
            self.n_duplicates_kept as f64 / self.n_accepted as f64
        }
    }

    /// Fraction of accepted tracks with no truth particle.
    pub fn fake_rate(&self) -> f64 {
        if self.n_accepted == 0 {
            0.0
        } else {
            self.n_fakes_kept as f64 / self.n_accepted as f64
        }
    }

    /// Accumulate one event. `truth[i]` labels input candidate `i`;
    /// `accepted` holds the surviving candidate indices.
    pub fn accumulate(&mut self, truth: &[Option<u64>], accepted: &[usize]) {
        self.n_events += 1;
        self.n_candidates += truth.len() as u64;
        self.n_accepted += accepted.len() as u64;

        let particles: HashSet<u64> = truth.iter().flatten().copied().collect();
        self.n_true_particles += particles.len() as u64;

        let mut accepted_per_particle: HashMap<u64, u64> = HashMap::new();
        for &index in accepted {
            match truth[index] {
                Some(id) => *accepted_per_particle.entry(id).or_insert(0) += 1,
                None => self.n_fakes_kept += 1,
            }
        }
        self.n_matched_particles += accepted_per_particle.len() as u64;
        self.n_duplicates_kept += accepted_per_particle
            .values()
            .map(|&n| n.saturating_sub(1))
            .sum::<u64>();
    }

    /// Fold another accumulator into this one (for per-worker partial sums).
    pub fn merge(&mut self, other: &ResolutionMetrics) {
        self.n_events += other.n_events;
        self.n_candidates += other.n_candidates;
        self.n_accepted += other.n_accepted;
        self.n_true_particles += other.n_true_particles;
        self.n_matched_particles += other.n_matched_particles;
        self.n_duplicates_kept += other.n_duplicates_kept;
        self.n_fakes_kept += other.n_fakes_kept;
        self.n_unconverged += other.n_unconverged;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
