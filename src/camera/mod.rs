//! Camera targets and the flight parameters derived from them.
//!
//! The host supplies a bare `(latitude, longitude, label)` prop bag; the
//! engine's fly-to wants a full destination (longitude-first, plus altitude
//! and view angles). The approach-view constants live here so every fly-to
//! in the crate frames a site the same way.

use serde::{Deserialize, Serialize};

/// Camera altitude above the ellipsoid for the site approach view, meters.
pub const APPROACH_ALTITUDE_M: f64 = 1_500.0;

/// Camera heading for the approach view, degrees clockwise from north.
pub const APPROACH_HEADING_DEG: f64 = 0.0;

/// Camera pitch for the approach view, degrees (negative looks down).
pub const APPROACH_PITCH_DEG: f64 = -35.0;

/// A requested camera target: the host-side location prop bag.
///
/// Every field is independently revisable at any time after mount; only the
/// most recent target matters, so the controller keeps exactly one of these.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CameraTarget {
    /// Site latitude in degrees.
    pub latitude: f64,
    /// Site longitude in degrees.
    pub longitude: f64,
    /// Human-readable site label (used for logging only).
    pub label: String,
}

impl CameraTarget {
    /// Build a target from degrees and a label.
    #[must_use]
    pub fn new(latitude: f64, longitude: f64, label: impl Into<String>) -> Self {
        Self {
            latitude,
            longitude,
            label: label.into(),
        }
    }
}

/// A fully specified fly-to destination handed to the engine.
///
/// Longitude comes first to match the engine's degree-based destination
/// constructor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraFlight {
    /// Destination longitude in degrees.
    pub longitude: f64,
    /// Destination latitude in degrees.
    pub latitude: f64,
    /// Camera altitude above the ellipsoid in meters.
    pub altitude_m: f64,
    /// Heading in degrees clockwise from north.
    pub heading_deg: f64,
    /// Pitch in degrees, negative looking down at the site.
    pub pitch_deg: f64,
}

impl CameraFlight {
    /// The standard approach view over a site target.
    #[must_use]
    pub fn over(target: &CameraTarget) -> Self {
        Self {
            longitude: target.longitude,
            latitude: target.latitude,
            altitude_m: APPROACH_ALTITUDE_M,
            heading_deg: APPROACH_HEADING_DEG,
            pitch_deg: APPROACH_PITCH_DEG,
        }
    }
}
