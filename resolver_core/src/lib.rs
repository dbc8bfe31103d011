//! `resolver_core` — Ambiguity resolution for charged-particle track candidates.
//!
//! Given candidate tracks referencing subsets of an event's measurements,
//! select a final set of mutually compatible tracks by removing duplicates and
//! fakes that over-share hits with better candidates.
//!
//! # Module layout
//! - [`types`]       — Fundamental types (surface ids, measurements, candidates)
//! - [`interner`]    — Canonical measurement identity per resolution call
//! - [`shared_hits`] — Track ↔ measurement sharing state and eviction
//! - [`greedy`]      — Greedy resolver: evict the worst track until clean
//! - [`score`]       — Score-based resolver: per-subdetector weighted scoring
//!                     and shared-hit pruning
//! - [`metrics`]     — Truth-matched efficiency / duplicate / fake rates

pub mod greedy;
pub mod interner;
pub mod metrics;
pub mod score;
pub mod shared_hits;
pub mod types;

pub use greedy::{GreedyConfig, GreedyResolution, GreedyResolver};
pub use metrics::ResolutionMetrics;
pub use score::{
    AcceptedTrack, DetectorConfig, ScoreConfig, ScoreResolution, ScoreResolver, TrackFeatures,
};
pub use shared_hits::SharedHitState;
pub use types::{Measurement, Momentum, ResolverError, SurfaceId, TrackCandidate, TrackStateRef};
