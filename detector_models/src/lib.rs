//! `detector_models` — Detector layer description for ambiguity resolution.
//!
//! The resolvers only need to know which logical subdetector a surface belongs
//! to; this crate carries that mapping plus enough layer structure for the
//! simulator to place hits.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One detector layer: every surface on it carries the same geometry volume id.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LayerSpec {
    /// Geometry volume identifier (high bits of the surface id).
    pub volume: u64,
    /// Logical subdetector the layer belongs to.
    pub subdetector: usize,
    /// Layer radius (mm). Layers are traversed innermost first.
    pub radius: f64,
}

/// Full detector description: ordered layer list, innermost first.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DetectorGeometry {
    pub layers: Vec<LayerSpec>,
}

impl Default for DetectorGeometry {
    /// Barrel-style reference layout: four inner pixel-like layers, four
    /// short-strip layers, two long-strip layers.
    fn default() -> Self {
        let layer = |volume, subdetector, radius| LayerSpec {
            volume,
            subdetector,
            radius,
        };
        Self {
            layers: vec![
                layer(16, 0, 33.0),
                layer(16, 0, 50.0),
                layer(16, 0, 88.0),
                layer(16, 0, 122.0),
                layer(23, 1, 260.0),
                layer(23, 1, 360.0),
                layer(24, 1, 500.0),
                layer(24, 1, 660.0),
                layer(28, 2, 820.0),
                layer(29, 2, 1020.0),
            ],
        }
    }
}

impl DetectorGeometry {
    /// Number of logical subdetectors (highest index + 1).
    pub fn n_subdetectors(&self) -> usize {
        self.layers
            .iter()
            .map(|l| l.subdetector + 1)
            .max()
            .unwrap_or(0)
    }

    /// Volume → subdetector mapping consumed by the score resolver.
    pub fn volume_map(&self) -> HashMap<u64, usize> {
        self.layers
            .iter()
            .map(|l| (l.volume, l.subdetector))
            .collect()
    }

    pub fn n_layers(&self) -> usize {
        self.layers.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
