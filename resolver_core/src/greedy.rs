//! Greedy ambiguity resolution: iterative eviction of the worst track.
//!
//! # Algorithm
//! 1. Build [`SharedHitState`] from the candidate list.
//! 2. While any selected track still has at least `maximum_shared_hits`
//!    shared measurements, evict the worst one and update the state.
//! 3. Stop after `maximum_iterations` evictions regardless; the caller learns
//!    about the cut-off through [`GreedyResolution::converged`].
//!
//! "Worst" compares the fraction of a track's measurements that are shared,
//! then the normalized chi-square. Both scans walk slots in ascending order
//! and replace on strict inequality only, so every tie resolves to the lowest
//! slot.

use crate::shared_hits::SharedHitState;
use crate::types::{Measurement, ResolverError, TrackCandidate};

/// Configuration for greedy resolution.
#[derive(Clone, Debug)]
pub struct GreedyConfig {
    /// Tracks with fewer accepted measurements never enter resolution.
    pub n_measurements_min: usize,
    /// Eviction stops once every selected track has fewer shared hits than
    /// this ceiling.
    pub maximum_shared_hits: usize,
    /// Hard cap on evictions per call.
    pub maximum_iterations: usize,
}

impl Default for GreedyConfig {
    fn default() -> Self {
        Self {
            n_measurements_min: 7,
            maximum_shared_hits: 1,
            maximum_iterations: 1000,
        }
    }
}

/// Outcome of one greedy resolution call.
#[derive(Clone, Debug)]
pub struct GreedyResolution {
    /// Surviving track indices into the input sequence, in input order.
    pub selected: Vec<usize>,
    /// Evictions performed.
    pub iterations: usize,
    /// False when the iteration budget ran out first; the shared-hit ceiling
    /// may then still be violated by some survivors.
    pub converged: bool,
}

/// Minimizes shared hits by repeatedly evicting the single worst track.
#[derive(Clone, Debug, Default)]
pub struct GreedyResolver {
    pub config: GreedyConfig,
}

impl GreedyResolver {
    pub fn new(config: GreedyConfig) -> Self {
        Self { config }
    }

    /// Resolve one event's candidates. Each call builds its own state; nothing
    /// is retained between calls.
    pub fn resolve(
        &self,
        tracks: &[TrackCandidate],
        measurements: &[Measurement],
    ) -> Result<GreedyResolution, ResolverError> {
        let mut state = SharedHitState::compute_initial_state(
            tracks,
            measurements,
            self.config.n_measurements_min,
        )?;

        let mut iterations = 0;
        let mut converged = false;
        while iterations < self.config.maximum_iterations {
            if state.selected.is_empty() {
                converged = true;
                break;
            }
            let most_shared = state
                .selected
                .iter()
                .map(|&slot| state.shared_measurements_per_track[slot])
                .max()
                .unwrap_or(0);
            if most_shared < self.config.maximum_shared_hits {
                converged = true;
                break;
            }

            let worst = self.worst_track(&state);
            tracing::debug!(
                track = state.track_index[worst],
                shared = state.shared_measurements_per_track[worst],
                iteration = iterations,
                "evicting track"
            );
            state.remove_track(worst);
            iterations += 1;
        }
        if !converged && state.selected.is_empty() {
            converged = true;
        }

        let selected = state
            .selected
            .iter()
            .map(|&slot| state.track_index[slot])
            .collect();
        Ok(GreedyResolution {
            selected,
            iterations,
            converged,
        })
    }

    /// Slot of the worst selected track: highest shared fraction, then highest
    /// normalized chi-square, lowest slot on full ties.
    fn worst_track(&self, state: &SharedHitState) -> usize {
        let mut slots = state.selected.iter().copied();
        let mut worst = slots.next().expect("selected set checked non-empty");
        for slot in slots {
            if Self::ranks_worse(state, slot, worst) {
                worst = slot;
            }
        }
        worst
    }

    fn ranks_worse(state: &SharedHitState, a: usize, b: usize) -> bool {
        let fa = state.shared_fraction(a);
        let fb = state.shared_fraction(b);
        if fa != fb {
            return fa > fb;
        }
        state.chi2_over_ndf[a] > state.chi2_over_ndf[b]
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
