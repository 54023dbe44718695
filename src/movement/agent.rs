//! Movement agent: per-entity controller over the movement state machine
//!
//! The agent owns one instance of every movement state, the active and
//! pending state ids, and the entity's navigation agent. Gameplay code talks
//! to the agent; the agent decides whether a request applies now or waits
//! until a forced movement or hold has finished.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::forced::{LinePlan, SkyPlan};
use super::state::{MovementCategory, MovementStateId, StateContext, StateTable};
use crate::config::MovementConfig;
use crate::error::MovementError;
use crate::nav::{NavReport, NavigationAgent};
use crate::{direction_to_heading, is_finite_vec, normalize_angle};

/// Change notification: `(agent, old_position)` or `(agent, new_velocity)`
pub type ChangeFn<N> = Box<dyn FnMut(&MovementAgent<N>, Vec3)>;

/// Observers of kinematic changes (replication, area-of-interest, ...).
///
/// Callbacks get a shared reference to the agent, so they can read it but
/// never drive it.
pub struct ChangeCallbacks<N> {
    pub on_position_changed: Option<ChangeFn<N>>,
    pub on_velocity_changed: Option<ChangeFn<N>>,
}

impl<N> Default for ChangeCallbacks<N> {
    fn default() -> Self {
        Self {
            on_position_changed: None,
            on_velocity_changed: None,
        }
    }
}

impl<N> ChangeCallbacks<N> {
    pub fn with_position_changed(
        mut self,
        f: impl FnMut(&MovementAgent<N>, Vec3) + 'static,
    ) -> Self {
        self.on_position_changed = Some(Box::new(f));
        self
    }

    pub fn with_velocity_changed(
        mut self,
        f: impl FnMut(&MovementAgent<N>, Vec3) + 'static,
    ) -> Self {
        self.on_velocity_changed = Some(Box::new(f));
        self
    }
}

/// Serializable view of an agent for downstream consumers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MovementSnapshot {
    pub id: u32,
    pub state: MovementStateId,
    pub category: MovementCategory,
    pub pending: MovementStateId,
    pub position: Vec3,
    pub velocity: Vec3,
    /// Ground heading of the last horizontal motion (radians)
    pub facing: f32,
    /// Where the running forced movement ends
    pub forced_end: Option<Vec3>,
    /// Time left on a timed hold
    pub hold_remaining_ms: Option<u32>,
}

/// Per-entity movement controller
pub struct MovementAgent<N> {
    id: u32,
    position: Vec3,
    velocity: Vec3,
    facing: f32,
    active: MovementStateId,
    pending: MovementStateId,
    states: StateTable,
    nav: N,
    sky_peak_height: f32,
    callbacks: ChangeCallbacks<N>,
}

impl<N: NavigationAgent> MovementAgent<N> {
    /// Create an agent resting in `Idle` at the navigation agent's position
    pub fn new(id: u32, nav: N, config: &MovementConfig) -> Self {
        let mut agent = Self {
            id,
            position: nav.position(),
            velocity: nav.velocity(),
            facing: 0.0,
            active: MovementStateId::Idle,
            pending: MovementStateId::Idle,
            states: StateTable::default(),
            nav,
            sky_peak_height: config.sky_peak_height,
            callbacks: ChangeCallbacks::default(),
        };
        let mut ctx = StateContext::new(&mut agent.nav, agent.position);
        agent.states.get_mut(MovementStateId::Idle).enter(&mut ctx);
        agent
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    /// Currently active state
    pub fn state_id(&self) -> MovementStateId {
        self.active
    }

    /// State entered once the active one completes
    pub fn pending_state(&self) -> MovementStateId {
        self.pending
    }

    pub fn movement_mode(&self) -> MovementCategory {
        self.active.category()
    }

    /// True while forced movement or a hold is in control
    pub fn has_lost_control(&self) -> bool {
        self.movement_mode().loses_control()
    }

    /// Destination being pathed to, while in `MoveToPosition`
    pub fn destination(&self) -> Option<Vec3> {
        (self.active == MovementStateId::MoveToPosition)
            .then(|| self.states.move_to_position.destination())
    }

    /// Heading being steered along, while in `MoveToDirection`
    pub fn heading(&self) -> Option<f32> {
        (self.active == MovementStateId::MoveToDirection)
            .then(|| self.states.move_to_direction.heading())
    }

    /// Heading of the last non-vertical velocity. Kept while at rest.
    pub fn facing(&self) -> f32 {
        self.facing
    }

    /// Start and end of the running `ForceLine` or `ForceSky` displacement
    pub fn forced_path(&self) -> Option<(Vec3, Vec3)> {
        match self.active {
            MovementStateId::ForceLine => Some(self.states.force_line.path()),
            MovementStateId::ForceSky => Some(self.states.force_sky.path()),
            _ => None,
        }
    }

    /// Time left on the active hold; `None` when not immobilized or when
    /// the hold lasts until released
    pub fn hold_remaining_ms(&self) -> Option<u32> {
        (self.active == MovementStateId::Immobilized)
            .then(|| self.states.immobilized.remaining_ms())
            .flatten()
    }

    pub fn nav(&self) -> &N {
        &self.nav
    }

    pub fn snapshot(&self) -> MovementSnapshot {
        MovementSnapshot {
            id: self.id,
            state: self.active,
            category: self.movement_mode(),
            pending: self.pending,
            position: self.position,
            velocity: self.velocity,
            facing: self.facing,
            forced_end: self.forced_path().map(|(_, end)| end),
            hold_remaining_ms: self.hold_remaining_ms(),
        }
    }

    pub fn set_callbacks(&mut self, callbacks: ChangeCallbacks<N>) {
        self.callbacks = callbacks;
    }

    pub fn max_speed(&self) -> f32 {
        self.nav.max_speed()
    }

    pub fn set_max_speed(&mut self, speed: f32) -> Result<(), MovementError> {
        if !speed.is_finite() || speed < 0.0 {
            return Err(self.reject(MovementError::invalid(
                "max speed",
                format!("{speed} is not a finite non-negative speed"),
            )));
        }
        self.nav.set_max_speed(speed);
        Ok(())
    }

    pub fn nav_enable(&mut self) {
        self.nav.enable();
    }

    pub fn nav_disable(&mut self) {
        self.nav.disable();
    }

    pub fn is_nav_enabled(&self) -> bool {
        self.nav.is_enabled()
    }

    /// Path to `target`. Applies immediately unless control is lost, in which
    /// case it runs once the forced movement or hold ends.
    pub fn request_move_to_position(&mut self, target: Vec3) -> Result<(), MovementError> {
        self.check_point("destination", target)?;
        self.states.move_to_position.set_desired_destination(target);
        self.request_directed(MovementStateId::MoveToPosition);
        Ok(())
    }

    /// Steer along `heading` (radians). Same arbitration as
    /// [`request_move_to_position`](Self::request_move_to_position).
    pub fn request_move_to_direction(&mut self, heading: f32) -> Result<(), MovementError> {
        if !heading.is_finite() {
            return Err(self.reject(MovementError::invalid(
                "heading",
                format!("{heading} is not finite"),
            )));
        }
        self.states
            .move_to_direction
            .set_desired_heading(normalize_angle(heading));
        self.request_directed(MovementStateId::MoveToDirection);
        Ok(())
    }

    /// Stop directed movement and drop any deferred request.
    ///
    /// Forced movement and holds keep running.
    pub fn request_stop(&mut self) {
        self.pending = MovementStateId::Idle;
        if self.movement_mode() == MovementCategory::Move {
            self.enter_state(MovementStateId::Idle);
        } else {
            self.nav.stop();
        }
    }

    /// End an in-progress forced movement. Returns false (and does nothing)
    /// outside `ForceMove`; holds are ended with
    /// [`release_immobilization`](Self::release_immobilization).
    pub fn cancel_forced_movement(&mut self) -> bool {
        if self.movement_mode() != MovementCategory::ForceMove {
            return false;
        }
        self.pending = MovementStateId::Idle;
        self.enter_state(MovementStateId::Idle);
        true
    }

    /// Forced straight-line displacement to `target` over `duration_ms`
    pub fn force_move_line_to(&mut self, target: Vec3, duration_ms: u32) -> Result<(), MovementError> {
        self.check_point("force line target", target)?;
        self.states
            .force_line
            .configure(LinePlan::To(target), duration_ms);
        self.enter_state(MovementStateId::ForceLine);
        Ok(())
    }

    /// Forced straight-line displacement along `direction` at `speed` m/s
    pub fn force_move_line_along(
        &mut self,
        direction: Vec3,
        speed: f32,
        duration_ms: u32,
    ) -> Result<(), MovementError> {
        let direction = self.check_direction("force line direction", direction)?;
        self.check_speed("force line speed", speed)?;
        self.states
            .force_line
            .configure(LinePlan::Along { direction, speed }, duration_ms);
        self.enter_state(MovementStateId::ForceLine);
        Ok(())
    }

    /// Ballistic displacement with the configured apex height
    pub fn force_move_sky(
        &mut self,
        direction: Vec3,
        speed: f32,
        duration_ms: u32,
    ) -> Result<(), MovementError> {
        self.force_move_sky_with_peak(direction, speed, self.sky_peak_height, duration_ms)
    }

    /// Ballistic displacement along the ground projection of `direction`
    pub fn force_move_sky_with_peak(
        &mut self,
        direction: Vec3,
        speed: f32,
        peak_height: f32,
        duration_ms: u32,
    ) -> Result<(), MovementError> {
        let direction = self.check_direction("force sky direction", direction.with_y(0.0))?;
        self.check_speed("force sky speed", speed)?;
        self.check_speed("force sky peak height", peak_height)?;
        self.states.force_sky.configure(
            SkyPlan {
                direction,
                speed,
                peak_height,
            },
            duration_ms,
        );
        self.enter_state(MovementStateId::ForceSky);
        Ok(())
    }

    /// Hold the entity in place. `None` holds until
    /// [`release_immobilization`](Self::release_immobilization).
    pub fn immobilize(&mut self, duration_ms: Option<u32>) {
        self.states.immobilized.configure(duration_ms);
        self.enter_state(MovementStateId::Immobilized);
    }

    /// Clear an active hold. The agent leaves `Immobilized` on the next tick,
    /// entering whatever request was deferred meanwhile.
    pub fn release_immobilization(&mut self) -> bool {
        if self.active != MovementStateId::Immobilized {
            return false;
        }
        self.states.immobilized.release();
        true
    }

    /// Place the entity without pathing (spawn, respawn). The active state
    /// stays active; a forced movement carries on from the new position and a
    /// hold pins the entity there.
    pub fn teleport(&mut self, position: Vec3) -> Result<(), MovementError> {
        self.check_point("teleport position", position)?;
        let offset = position - self.position;
        self.nav.warp(position);
        {
            let mut ctx = StateContext::new(&mut self.nav, position);
            self.states.get_mut(self.active).relocate(&mut ctx, offset);
        }
        self.set_position(position);
        Ok(())
    }

    /// Feed a report from a navigation agent stepped outside [`tick`](Self::tick)
    pub fn on_navigation_moved(&mut self, report: NavReport) {
        self.set_position(report.position);
        self.set_velocity(report.velocity);
    }

    /// Advance one simulation step
    pub fn tick(&mut self, delta_ms: u32) {
        let (sample, done) = {
            let mut ctx = StateContext::new(&mut self.nav, self.position);
            let state = self.states.get_mut(self.active);
            state.update(&mut ctx, delta_ms);
            let done = state.is_done(&*ctx.nav);
            (ctx.sample, done)
        };

        if done {
            // Capture before resetting: entering the next state may queue another
            let next = self.pending;
            self.pending = MovementStateId::Idle;
            self.enter_state(next);
        }

        let report = self.nav.step(delta_ms);
        let kinematics = match (sample, report) {
            (Some(s), _) if !done => Some((s.position, s.velocity)),
            (_, Some(r)) => Some((r.position, r.velocity)),
            (Some(s), None) => Some((s.position, s.velocity)),
            (None, None) => None,
        };
        if let Some((position, velocity)) = kinematics {
            self.set_position(position);
            self.set_velocity(velocity);
        }
    }

    fn request_directed(&mut self, id: MovementStateId) {
        if self.has_lost_control() {
            log::debug!(
                "agent {}: {} deferred until {} completes",
                self.id,
                id,
                self.active
            );
            self.pending = id;
        } else {
            self.pending = MovementStateId::Idle;
            self.enter_state(id);
        }
    }

    /// Exit the active state, then enter `next`
    fn enter_state(&mut self, next: MovementStateId) {
        let prev = self.active;
        let mut ctx = StateContext::new(&mut self.nav, self.position);
        self.states.get_mut(prev).exit(&mut ctx);
        self.active = next;
        self.states.get_mut(next).enter(&mut ctx);
        debug_assert_eq!(self.states.get(next).id(), next);
        log::debug!("agent {}: {} -> {}", self.id, prev, next);
    }

    fn set_position(&mut self, position: Vec3) {
        let old = self.position;
        if old == position {
            return;
        }
        self.position = position;
        if let Some(mut cb) = self.callbacks.on_position_changed.take() {
            cb(self, old);
            self.callbacks.on_position_changed = Some(cb);
        }
    }

    fn set_velocity(&mut self, velocity: Vec3) {
        if self.velocity == velocity {
            return;
        }
        self.velocity = velocity;
        if velocity.with_y(0.0).length_squared() > 0.0 {
            self.facing = direction_to_heading(velocity);
        }
        if let Some(mut cb) = self.callbacks.on_velocity_changed.take() {
            cb(self, velocity);
            self.callbacks.on_velocity_changed = Some(cb);
        }
    }

    fn check_point(&self, what: &'static str, point: Vec3) -> Result<(), MovementError> {
        if !is_finite_vec(point) {
            return Err(self.reject(MovementError::invalid(what, format!("{point} is not finite"))));
        }
        if !self.nav.is_walkable(point) {
            return Err(self.reject(MovementError::invalid(
                what,
                format!("{point} is off the navigation mesh"),
            )));
        }
        Ok(())
    }

    /// Validate and normalize a direction
    fn check_direction(&self, what: &'static str, direction: Vec3) -> Result<Vec3, MovementError> {
        if !is_finite_vec(direction) {
            return Err(self.reject(MovementError::invalid(
                what,
                format!("{direction} is not finite"),
            )));
        }
        direction
            .try_normalize()
            .ok_or_else(|| self.reject(MovementError::invalid(what, "zero-length direction")))
    }

    fn check_speed(&self, what: &'static str, value: f32) -> Result<(), MovementError> {
        if value.is_finite() && value >= 0.0 {
            Ok(())
        } else {
            Err(self.reject(MovementError::invalid(
                what,
                format!("{value} is not a finite non-negative value"),
            )))
        }
    }

    fn reject(&self, err: MovementError) -> MovementError {
        log::warn!("agent {}: rejected request: {}", self.id, err);
        err
    }
}
