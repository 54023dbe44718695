//! Navigation agent contract
//!
//! A navigation agent is the per-entity steering unit that actually moves an
//! entity over a shared navigation mesh. The movement state machine only
//! tells it where to go; every position/velocity it computes comes back as a
//! [`NavReport`] from [`NavigationAgent::step`].
//!
//! [`StraightLineNav`] is a deterministic reference agent: it walks in a
//! straight line over an axis-aligned walkable region.

use std::sync::Arc;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::config::MovementConfig;
use crate::consts::*;
use crate::heading_to_direction;

/// Position and velocity recomputed by a navigation step
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NavReport {
    pub position: Vec3,
    pub velocity: Vec3,
}

/// Per-entity pathfinding/steering unit bound to a shared navigation mesh.
pub trait NavigationAgent {
    fn position(&self) -> Vec3;
    fn velocity(&self) -> Vec3;

    fn max_speed(&self) -> f32;
    fn set_max_speed(&mut self, speed: f32);

    /// Whether autonomous stepping is enabled
    fn is_enabled(&self) -> bool;
    fn enable(&mut self);
    fn disable(&mut self);

    /// Drop the current goal. Velocity decays to zero on the next step.
    fn stop(&mut self);

    /// True while the agent has a goal it is still working toward
    fn is_moving(&self) -> bool;

    /// Path toward a destination on the mesh
    fn move_to(&mut self, destination: Vec3);

    /// Steer continuously along a ground heading (radians)
    fn move_along(&mut self, heading: f32);

    /// Place the agent without pathing. Does not produce a report.
    fn warp(&mut self, position: Vec3);

    /// Whether a point lies on the walkable mesh
    fn is_walkable(&self, point: Vec3) -> bool;

    /// Nearest walkable point
    fn clamp_to_mesh(&self, point: Vec3) -> Vec3;

    /// Advance by `delta_ms`. Returns at most one report per step, and `None`
    /// when disabled or nothing was recomputed.
    fn step(&mut self, delta_ms: u32) -> Option<NavReport>;
}

/// Walkable region shared read-only by every agent in a scene
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NavMesh {
    pub min: Vec3,
    pub max: Vec3,
}

impl NavMesh {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    /// Check if a point is inside the walkable bounds
    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    pub fn clamp(&self, point: Vec3) -> Vec3 {
        point.clamp(self.min, self.max)
    }
}

impl Default for NavMesh {
    fn default() -> Self {
        let half = Vec3::new(MESH_HALF_EXTENT, MESH_HALF_HEIGHT, MESH_HALF_EXTENT);
        Self::new(-half, half)
    }
}

/// What a [`StraightLineNav`] is currently steering toward
#[derive(Debug, Clone, Copy, PartialEq)]
enum Goal {
    None,
    Point(Vec3),
    Heading(Vec3),
}

/// Reference navigation agent: straight lines at max speed, no avoidance
#[derive(Debug, Clone)]
pub struct StraightLineNav {
    mesh: Arc<NavMesh>,
    position: Vec3,
    velocity: Vec3,
    max_speed: f32,
    arrival_tolerance: f32,
    enabled: bool,
    goal: Goal,
}

impl StraightLineNav {
    pub fn new(mesh: Arc<NavMesh>, position: Vec3) -> Self {
        let position = mesh.clamp(position);
        Self {
            mesh,
            position,
            velocity: Vec3::ZERO,
            max_speed: DEFAULT_MAX_SPEED,
            arrival_tolerance: ARRIVAL_TOLERANCE,
            enabled: true,
            goal: Goal::None,
        }
    }

    /// Agent tuned from the movement config
    pub fn from_config(mesh: Arc<NavMesh>, position: Vec3, config: &MovementConfig) -> Self {
        Self::new(mesh, position)
            .with_max_speed(config.max_speed)
            .with_arrival_tolerance(config.arrival_tolerance)
    }

    pub fn with_max_speed(mut self, speed: f32) -> Self {
        self.max_speed = speed.max(0.0);
        self
    }

    pub fn with_arrival_tolerance(mut self, tolerance: f32) -> Self {
        self.arrival_tolerance = tolerance.max(0.0);
        self
    }

    pub fn mesh(&self) -> &NavMesh {
        &self.mesh
    }

    /// Current point destination, if pathing
    pub fn destination(&self) -> Option<Vec3> {
        match self.goal {
            Goal::Point(p) => Some(p),
            _ => None,
        }
    }

    fn report(&self) -> Option<NavReport> {
        Some(NavReport {
            position: self.position,
            velocity: self.velocity,
        })
    }
}

impl NavigationAgent for StraightLineNav {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn velocity(&self) -> Vec3 {
        self.velocity
    }

    fn max_speed(&self) -> f32 {
        self.max_speed
    }

    fn set_max_speed(&mut self, speed: f32) {
        self.max_speed = speed.max(0.0);
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn enable(&mut self) {
        self.enabled = true;
    }

    fn disable(&mut self) {
        self.enabled = false;
    }

    fn stop(&mut self) {
        self.goal = Goal::None;
    }

    fn is_moving(&self) -> bool {
        self.goal != Goal::None
    }

    fn move_to(&mut self, destination: Vec3) {
        self.goal = Goal::Point(self.mesh.clamp(destination));
    }

    fn move_along(&mut self, heading: f32) {
        self.goal = Goal::Heading(heading_to_direction(heading));
    }

    fn warp(&mut self, position: Vec3) {
        self.position = self.mesh.clamp(position);
    }

    fn is_walkable(&self, point: Vec3) -> bool {
        self.mesh.contains(point)
    }

    fn clamp_to_mesh(&self, point: Vec3) -> Vec3 {
        self.mesh.clamp(point)
    }

    fn step(&mut self, delta_ms: u32) -> Option<NavReport> {
        if !self.enabled {
            return None;
        }
        let dt = delta_ms as f32 / 1000.0;
        let step_len = self.max_speed * dt;

        match self.goal {
            Goal::None => {
                // Only report once when coming to rest
                if self.velocity == Vec3::ZERO {
                    return None;
                }
                self.velocity = Vec3::ZERO;
            }
            Goal::Point(target) => {
                let to_target = target - self.position;
                let dist = to_target.length();
                if dist <= self.arrival_tolerance || dist <= step_len {
                    self.position = target;
                    self.velocity = Vec3::ZERO;
                    self.goal = Goal::None;
                } else {
                    let dir = to_target / dist;
                    self.position += dir * step_len;
                    self.velocity = dir * self.max_speed;
                }
            }
            Goal::Heading(dir) => {
                let next = self.position + dir * step_len;
                let clamped = self.mesh.clamp(next);
                if clamped != next {
                    // Ran into the mesh edge
                    self.position = clamped;
                    self.velocity = Vec3::ZERO;
                    self.goal = Goal::None;
                } else {
                    self.position = next;
                    self.velocity = dir * self.max_speed;
                }
            }
        }

        self.report()
    }
}
