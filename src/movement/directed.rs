//! Directed movement: steering along a heading or pathing to a point.
//!
//! Both states hand the actual motion to the navigation agent and complete
//! once it stops moving or gets disabled.

use glam::Vec3;

use super::state::{MovementState, MovementStateId, StateContext};
use crate::nav::NavigationAgent;

fn nav_finished(nav: &dyn NavigationAgent) -> bool {
    !nav.is_enabled() || !nav.is_moving()
}

/// Continuous movement along a heading
#[derive(Debug, Clone, Default)]
pub struct MoveToDirectionState {
    desired_heading: f32,
    heading: f32,
}

impl MoveToDirectionState {
    /// Heading (radians) to steer along on next entry
    pub fn set_desired_heading(&mut self, heading: f32) {
        self.desired_heading = heading;
    }

    /// Heading of the current activation
    pub fn heading(&self) -> f32 {
        self.heading
    }
}

impl MovementState for MoveToDirectionState {
    fn id(&self) -> MovementStateId {
        MovementStateId::MoveToDirection
    }

    fn enter(&mut self, ctx: &mut StateContext<'_>) {
        self.heading = self.desired_heading;
        ctx.nav.move_along(self.heading);
    }

    fn exit(&mut self, ctx: &mut StateContext<'_>) {
        ctx.nav.stop();
    }

    fn update(&mut self, _ctx: &mut StateContext<'_>, _delta_ms: u32) {}

    fn is_done(&self, nav: &dyn NavigationAgent) -> bool {
        nav_finished(nav)
    }
}

/// Path-to-point movement
#[derive(Debug, Clone, Default)]
pub struct MoveToPositionState {
    desired_destination: Vec3,
    destination: Vec3,
}

impl MoveToPositionState {
    /// Destination to path toward on next entry
    pub fn set_desired_destination(&mut self, destination: Vec3) {
        self.desired_destination = destination;
    }

    /// Destination of the current activation
    pub fn destination(&self) -> Vec3 {
        self.destination
    }
}

impl MovementState for MoveToPositionState {
    fn id(&self) -> MovementStateId {
        MovementStateId::MoveToPosition
    }

    fn enter(&mut self, ctx: &mut StateContext<'_>) {
        self.destination = self.desired_destination;
        ctx.nav.move_to(self.destination);
    }

    fn exit(&mut self, ctx: &mut StateContext<'_>) {
        ctx.nav.stop();
    }

    fn update(&mut self, _ctx: &mut StateContext<'_>, _delta_ms: u32) {}

    fn is_done(&self, nav: &dyn NavigationAgent) -> bool {
        nav_finished(nav)
    }
}
