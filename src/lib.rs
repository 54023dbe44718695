//! Move Agent - per-entity movement arbitration for a tick-driven server
//!
//! Core modules:
//! - `movement`: Movement state machine and the `MovementAgent` controller
//! - `nav`: Navigation agent contract and a straight-line reference agent
//! - `config`: Data-driven movement tuning
//! - `error`: Error types

pub mod config;
pub mod error;
pub mod movement;
pub mod nav;

pub use config::MovementConfig;
pub use error::{ConfigError, MovementError};
pub use movement::{
    ChangeCallbacks, MovementAgent, MovementCategory, MovementSnapshot, MovementStateId,
};
pub use nav::{NavMesh, NavReport, NavigationAgent, StraightLineNav};

use glam::Vec3;

/// Simulation constants
pub mod consts {
    /// Server tick length in milliseconds (20 Hz)
    pub const TICK_MS: u32 = 50;

    /// Default navigation max speed (meters/second)
    pub const DEFAULT_MAX_SPEED: f32 = 5.0;
    /// Distance at which a destination counts as reached (meters)
    pub const ARRIVAL_TOLERANCE: f32 = 0.05;

    /// Default apex height of a ballistic displacement (meters)
    pub const SKY_PEAK_HEIGHT: f32 = 2.0;

    /// Default walkable half extent on the ground plane (meters)
    pub const MESH_HALF_EXTENT: f32 = 500.0;
    /// Default walkable half extent on the vertical axis (meters)
    pub const MESH_HALF_HEIGHT: f32 = 100.0;
}

/// Normalized angle to [-π, π). Constant time for any finite input.
#[inline]
pub fn normalize_angle(angle: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    if (-PI..PI).contains(&angle) {
        return angle;
    }
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    // rem_euclid can round up to TAU
    if wrapped >= PI { -PI } else { wrapped }
}

/// Unit direction on the ground (XZ) plane for a heading in radians.
///
/// Heading 0 points along +X, positive headings turn toward +Z.
#[inline]
pub fn heading_to_direction(heading: f32) -> Vec3 {
    Vec3::new(heading.cos(), 0.0, heading.sin())
}

/// Heading of a direction projected onto the ground plane
#[inline]
pub fn direction_to_heading(dir: Vec3) -> f32 {
    dir.z.atan2(dir.x)
}

/// True if every component is finite
#[inline]
pub fn is_finite_vec(v: Vec3) -> bool {
    v.x.is_finite() && v.y.is_finite() && v.z.is_finite()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_normalize_angle_wraps() {
        assert!((normalize_angle(1.5 * PI) - (-FRAC_PI_2)).abs() < 1e-5);
        assert!((normalize_angle(-FRAC_PI_2) - (-FRAC_PI_2)).abs() < 1e-6);
        assert!((normalize_angle(2.0 * PI + 0.25) - 0.25).abs() < 1e-5);
    }

    #[test]
    fn test_heading_direction_roundtrip() {
        let dir = heading_to_direction(FRAC_PI_2);
        assert!(dir.x.abs() < 1e-6);
        assert!((dir.z - 1.0).abs() < 1e-6);
        assert!((direction_to_heading(dir) - FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_angle_huge_inputs() {
        for angle in [1.0e9, -1.0e30, f32::MAX, -f32::MAX, 1.0e8 + 0.5] {
            let wrapped = normalize_angle(angle);
            assert!((-PI..PI).contains(&wrapped), "{angle} -> {wrapped}");
        }
    }

    #[test]
    fn test_normalize_angle_pi_edge() {
        assert_eq!(normalize_angle(PI), -PI);
        assert_eq!(normalize_angle(-PI), -PI);
        assert_eq!(normalize_angle(0.0), 0.0);
    }

    #[test]
    fn test_is_finite_vec() {
        assert!(is_finite_vec(Vec3::new(1.0, -2.0, 3.0)));
        assert!(!is_finite_vec(Vec3::new(f32::NAN, 0.0, 0.0)));
        assert!(!is_finite_vec(Vec3::new(0.0, f32::INFINITY, 0.0)));
    }
}
