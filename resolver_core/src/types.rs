//! Fundamental types shared across the workspace.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Scalar conventions: f64 throughout, momentum in GeV, beam axis along x.
// ---------------------------------------------------------------------------

/// Momentum vector [px, py, pz] in GeV. The first component lies along the
/// beam axis; transverse quantities are built from the y/z components.
pub type Momentum = Vector3<f64>;

/// Transverse momentum: sqrt(py² + pz²).
pub fn transverse_momentum(p: &Momentum) -> f64 {
    (p.y * p.y + p.z * p.z).sqrt()
}

/// Pseudorapidity along the beam axis: asinh(px / pT).
pub fn pseudorapidity(p: &Momentum) -> f64 {
    (p.x / transverse_momentum(p)).asinh()
}

/// Azimuthal angle in the transverse plane: atan2(pz, py).
pub fn azimuth(p: &Momentum) -> f64 {
    p.z.atan2(p.y)
}

// ---------------------------------------------------------------------------
// Identifier types — newtype wrappers so IDs are never confused at compile time
// ---------------------------------------------------------------------------

/// Identifier of a detector surface. The geometry volume id occupies the high
/// 32 bits, a surface-local sensor number the low 32.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct SurfaceId(pub u64);

impl SurfaceId {
    pub fn new(volume: u64, sensor: u64) -> Self {
        SurfaceId(volume << 32 | (sensor & 0xffff_ffff))
    }

    /// Geometry volume this surface belongs to.
    pub fn volume(&self) -> u64 {
        self.0 >> 32
    }

    /// Surface-local sensor number.
    pub fn sensor(&self) -> u64 {
        self.0 & 0xffff_ffff
    }
}

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "V{}:S{}", self.volume(), self.sensor())
    }
}

// ---------------------------------------------------------------------------
// Measurement
// ---------------------------------------------------------------------------

/// A single calibrated detector hit. Read-only input to resolution; identified
/// by its position in the event's measurement collection.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Measurement {
    /// Surface the hit was recorded on.
    pub surface: SurfaceId,
}

// ---------------------------------------------------------------------------
// Track candidates
// ---------------------------------------------------------------------------

/// One entry of a candidate track's trajectory, in traversal order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackStateRef {
    /// Accepted measurement on `surface`, indexing the event's measurement
    /// collection.
    Hit { surface: SurfaceId, measurement: usize },
    /// Measurement present on the trajectory but rejected by the fit.
    Outlier { surface: SurfaceId, measurement: usize },
    /// Surface crossed with no measurement recorded.
    Hole { surface: SurfaceId },
}

impl TrackStateRef {
    pub fn surface(&self) -> SurfaceId {
        match self {
            TrackStateRef::Hit { surface, .. }
            | TrackStateRef::Outlier { surface, .. }
            | TrackStateRef::Hole { surface } => *surface,
        }
    }

    /// Raw measurement index, if this state carries one.
    pub fn measurement(&self) -> Option<usize> {
        match self {
            TrackStateRef::Hit { measurement, .. }
            | TrackStateRef::Outlier { measurement, .. } => Some(*measurement),
            TrackStateRef::Hole { .. } => None,
        }
    }

    pub fn is_hit(&self) -> bool {
        matches!(self, TrackStateRef::Hit { .. })
    }
}

/// A candidate track produced by the upstream finder/fitter. Immutable during
/// resolution; identified by its position in the input sequence.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrackCandidate {
    /// Trajectory entries in traversal order.
    pub states: Vec<TrackStateRef>,
    /// Fit chi-square.
    pub chi2: f64,
    /// Fit degrees of freedom.
    pub ndf: u32,
    /// Fitted momentum at the perigee.
    pub momentum: Momentum,
}

impl TrackCandidate {
    /// Number of accepted measurements (holes and outliers excluded).
    pub fn n_hits(&self) -> usize {
        self.states.iter().filter(|s| s.is_hit()).count()
    }

    /// Normalized chi-square. Zero when the fit carries no degrees of freedom.
    pub fn chi2_over_ndf(&self) -> f64 {
        if self.ndf == 0 {
            0.0
        } else {
            self.chi2 / self.ndf as f64
        }
    }

    pub fn pt(&self) -> f64 {
        transverse_momentum(&self.momentum)
    }

    pub fn eta(&self) -> f64 {
        pseudorapidity(&self.momentum)
    }

    pub fn phi(&self) -> f64 {
        azimuth(&self.momentum)
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Input-contract violations. Incomplete input (short tracks, unmapped
/// volumes) is excluded silently and never raises; a dangling measurement
/// index is a caller bug and fails the whole call.
#[derive(Debug, Error)]
pub enum ResolverError {
    #[error(
        "track {track} references measurement {measurement}, \
         but the event holds {n_measurements} measurements"
    )]
    InvalidInput {
        track: usize,
        measurement: usize,
        n_measurements: usize,
    },
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn surface_id_packs_volume_and_sensor() {
        let s = SurfaceId::new(17, 42);
        assert_eq!(s.volume(), 17);
        assert_eq!(s.sensor(), 42);
        assert_eq!(format!("{s}"), "V17:S42");
    }

    #[test]
    fn kinematics_follow_beam_axis_convention() {
        // pt = 5 in the transverse (y, z) plane, phi = 90 degrees, px = 3.
        let p = Momentum::new(3.0, 0.0, 5.0);
        assert_abs_diff_eq!(transverse_momentum(&p), 5.0, epsilon = 1e-12);
        assert_abs_diff_eq!(azimuth(&p), std::f64::consts::FRAC_PI_2, epsilon = 1e-12);
        assert_abs_diff_eq!(pseudorapidity(&p), (3.0f64 / 5.0).asinh(), epsilon = 1e-12);
    }

    #[test]
    fn candidate_counts_only_accepted_hits() {
        let track = TrackCandidate {
            states: vec![
                TrackStateRef::Hit { surface: SurfaceId::new(1, 0), measurement: 0 },
                TrackStateRef::Outlier { surface: SurfaceId::new(1, 1), measurement: 1 },
                TrackStateRef::Hole { surface: SurfaceId::new(2, 0) },
                TrackStateRef::Hit { surface: SurfaceId::new(2, 1), measurement: 2 },
            ],
            chi2: 4.2,
            ndf: 3,
            momentum: Momentum::new(0.0, 1.0, 0.0),
        };
        assert_eq!(track.n_hits(), 2);
        assert_abs_diff_eq!(track.chi2_over_ndf(), 1.4, epsilon = 1e-12);
    }
}
