//! Movement tuning
//!
//! Loaded from a JSON file by the server at startup. Missing fields fall back
//! to the defaults in [`crate::consts`].

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;
use crate::nav::NavMesh;

/// Movement configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    /// Simulation step length (milliseconds)
    pub tick_ms: u32,
    /// Navigation max speed (meters/second)
    pub max_speed: f32,
    /// Distance at which a destination counts as reached (meters)
    pub arrival_tolerance: f32,
    /// Apex height used by ballistic displacement when none is given (meters)
    pub sky_peak_height: f32,

    // === Navigation mesh bounds ===
    pub mesh_min: Vec3,
    pub mesh_max: Vec3,
}

impl Default for MovementConfig {
    fn default() -> Self {
        let half = Vec3::new(MESH_HALF_EXTENT, MESH_HALF_HEIGHT, MESH_HALF_EXTENT);
        Self {
            tick_ms: TICK_MS,
            max_speed: DEFAULT_MAX_SPEED,
            arrival_tolerance: ARRIVAL_TOLERANCE,
            sky_peak_height: SKY_PEAK_HEIGHT,
            mesh_min: -half,
            mesh_max: half,
        }
    }
}

impl MovementConfig {
    /// Parse and validate a JSON config
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded movement config from {}", path.display());
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_ms == 0 {
            return Err(invalid("tick_ms", "must be at least 1"));
        }
        if !self.max_speed.is_finite() || self.max_speed < 0.0 {
            return Err(invalid("max_speed", "must be finite and non-negative"));
        }
        if !self.arrival_tolerance.is_finite() || self.arrival_tolerance < 0.0 {
            return Err(invalid("arrival_tolerance", "must be finite and non-negative"));
        }
        if !self.sky_peak_height.is_finite() || self.sky_peak_height < 0.0 {
            return Err(invalid("sky_peak_height", "must be finite and non-negative"));
        }
        if !crate::is_finite_vec(self.mesh_min) || !crate::is_finite_vec(self.mesh_max) {
            return Err(invalid("mesh_min/mesh_max", "must be finite"));
        }
        if self.mesh_min.cmpgt(self.mesh_max).any() {
            return Err(invalid("mesh_min", "must not exceed mesh_max"));
        }
        Ok(())
    }

    /// Walkable region described by this config
    pub fn nav_mesh(&self) -> NavMesh {
        NavMesh::new(self.mesh_min, self.mesh_max)
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}
