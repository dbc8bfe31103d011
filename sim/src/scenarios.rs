//! Scenario definitions.
//!
//! Each scenario is a named configuration of the event generator plus matched
//! resolver settings. All scenarios are deterministic given the same seed.

use crate::particle_gen::{EventGenerator, GenParams};
use detector_models::DetectorGeometry;
use resolver_core::greedy::GreedyConfig;
use resolver_core::score::{DetectorConfig, ScoreConfig};
use serde::{Deserialize, Serialize};

/// Which pre-defined scenario to load.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
pub enum ScenarioKind {
    /// 20 well-separated particles, no duplicates, no fakes
    Clean,
    /// 50 particles, 40% duplicates, a few fakes
    Duplicates,
    /// 200 particles with heavy duplication and fakes
    Dense,
    /// 2000 particles — scalability stress test
    Stress,
}

/// A fully configured simulation scenario.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub seed: u64,
    pub geometry: DetectorGeometry,
    pub gen: GenParams,
}

impl Scenario {
    /// Build the named scenario. Uses `seed` for repeatability.
    pub fn build(kind: ScenarioKind, seed: u64) -> Self {
        match kind {
            ScenarioKind::Clean => Self::clean(seed),
            ScenarioKind::Duplicates => Self::duplicates(seed),
            ScenarioKind::Dense => Self::dense(seed),
            ScenarioKind::Stress => Self::stress(seed),
        }
    }

    fn clean(seed: u64) -> Self {
        Scenario {
            name: "clean".into(),
            seed,
            geometry: DetectorGeometry::default(),
            gen: GenParams {
                n_particles: 20,
                duplicate_fraction: 0.0,
                fake_fraction: 0.0,
                ..GenParams::default()
            },
        }
    }

    fn duplicates(seed: u64) -> Self {
        Scenario {
            name: "duplicates".into(),
            seed,
            geometry: DetectorGeometry::default(),
            gen: GenParams {
                n_particles: 50,
                duplicate_fraction: 0.4,
                duplicate_tail: 2,
                fake_fraction: 0.05,
                ..GenParams::default()
            },
        }
    }

    fn dense(seed: u64) -> Self {
        Scenario {
            name: "dense".into(),
            seed,
            geometry: DetectorGeometry::default(),
            gen: GenParams {
                n_particles: 200,
                duplicate_fraction: 0.5,
                duplicate_tail: 3,
                fake_fraction: 0.25,
                ..GenParams::default()
            },
        }
    }

    fn stress(seed: u64) -> Self {
        Scenario {
            name: "stress".into(),
            seed,
            geometry: DetectorGeometry::default(),
            gen: GenParams {
                n_particles: 2000,
                duplicate_fraction: 0.3,
                duplicate_tail: 2,
                fake_fraction: 0.1,
                ..GenParams::default()
            },
        }
    }

    /// Event generator for this scenario, seeded per event batch.
    pub fn generator(&self, seed: u64) -> EventGenerator {
        EventGenerator::new(self.geometry.clone(), self.gen.clone(), seed)
    }

    /// Greedy resolver settings matched to the generated track length.
    pub fn greedy_config(&self) -> GreedyConfig {
        GreedyConfig {
            n_measurements_min: 6,
            maximum_shared_hits: 1,
            maximum_iterations: 1000,
        }
    }

    /// Score resolver settings matched to this scenario's geometry. The tight
    /// shared-hit budget makes any candidate with fewer than three unshared
    /// hits collapse below the acceptance floor.
    pub fn score_config(&self) -> ScoreConfig {
        let detector = |max_shared_hits| DetectorConfig {
            hits_score_weight: 1.0,
            holes_score_weight: -0.5,
            outliers_score_weight: -0.2,
            shared_hits_score_weight: -0.1,
            min_hits: 0,
            max_hits: 20,
            max_holes: 5,
            max_outliers: 5,
            max_shared_hits,
            shared_hits_flag: false,
        };
        ScoreConfig {
            volume_map: self.geometry.volume_map(),
            detector_configs: (0..self.geometry.n_subdetectors())
                .map(|_| detector(2))
                .collect(),
            n_hits_min: 6,
            min_score: 0.0,
            min_score_shared_tracks: 0.0,
            max_shared: 2,
            max_shared_tracks_per_measurement: 10,
            pt_min: 0.1,
            ..ScoreConfig::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
