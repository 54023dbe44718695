//! Forced movement and holds
//!
//! These states take the navigation agent offline while active and drive the
//! entity themselves:
//! - `ForceLine`: linear displacement (knockback, dash, pull)
//! - `ForceSky`: ballistic displacement (launch, knock-up)
//! - `Immobilized`: stun/root, position held in place
//!
//! On exit the navigation agent is warped to wherever the state left the
//! entity and its enabled flag is restored to what it was on entry.

use glam::Vec3;

use super::state::{KinematicSample, MovementState, MovementStateId, StateContext};
use crate::nav::NavigationAgent;

/// How a line displacement picks its end point
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LinePlan {
    /// Travel to a fixed point
    To(Vec3),
    /// Travel along a unit direction at a speed (meters/second)
    Along { direction: Vec3, speed: f32 },
}

impl Default for LinePlan {
    fn default() -> Self {
        LinePlan::Along {
            direction: Vec3::ZERO,
            speed: 0.0,
        }
    }
}

/// Parameters of a ballistic displacement
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SkyPlan {
    /// Unit ground direction
    pub direction: Vec3,
    /// Horizontal speed (meters/second)
    pub speed: f32,
    /// Apex height above the start/landing line (meters)
    pub peak_height: f32,
}

/// Fraction of `duration_ms` covered by `elapsed_ms`, in [0, 1]
fn progress(elapsed_ms: u32, duration_ms: u32) -> f32 {
    if duration_ms == 0 {
        1.0
    } else {
        (elapsed_ms as f32 / duration_ms as f32).min(1.0)
    }
}

fn seconds(ms: u32) -> f32 {
    ms as f32 / 1000.0
}

/// Take the navigation agent offline, remembering whether it was enabled
fn suspend_nav(nav: &mut dyn NavigationAgent) -> bool {
    let was_enabled = nav.is_enabled();
    nav.stop();
    nav.disable();
    was_enabled
}

fn resume_nav(nav: &mut dyn NavigationAgent, position: Vec3, was_enabled: bool) {
    nav.warp(position);
    if was_enabled {
        nav.enable();
    }
}

/// Linear forced displacement over a fixed duration
#[derive(Debug, Clone, Default)]
pub struct ForceLineState {
    plan: LinePlan,
    duration_ms: u32,

    start: Vec3,
    end: Vec3,
    current: Vec3,
    elapsed_ms: u32,
    nav_was_enabled: bool,
}

impl ForceLineState {
    pub fn configure(&mut self, plan: LinePlan, duration_ms: u32) {
        self.plan = plan;
        self.duration_ms = duration_ms;
    }

    /// Start and end of the current displacement
    pub fn path(&self) -> (Vec3, Vec3) {
        (self.start, self.end)
    }

    pub fn elapsed_ms(&self) -> u32 {
        self.elapsed_ms
    }

    /// Position and velocity at the current elapsed time
    fn sample(&self) -> KinematicSample {
        let t = progress(self.elapsed_ms, self.duration_ms);
        let velocity = if t >= 1.0 {
            Vec3::ZERO
        } else {
            (self.end - self.start) / seconds(self.duration_ms)
        };
        KinematicSample {
            position: self.start.lerp(self.end, t),
            velocity,
        }
    }
}

impl MovementState for ForceLineState {
    fn id(&self) -> MovementStateId {
        MovementStateId::ForceLine
    }

    fn enter(&mut self, ctx: &mut StateContext<'_>) {
        self.start = ctx.position;
        self.end = match self.plan {
            LinePlan::To(target) => target,
            LinePlan::Along { direction, speed } => ctx
                .nav
                .clamp_to_mesh(self.start + direction * speed * seconds(self.duration_ms)),
        };
        self.current = self.start;
        self.elapsed_ms = 0;
        self.nav_was_enabled = suspend_nav(ctx.nav);
    }

    fn exit(&mut self, ctx: &mut StateContext<'_>) {
        resume_nav(ctx.nav, self.current, self.nav_was_enabled);
    }

    fn relocate(&mut self, ctx: &mut StateContext<'_>, offset: Vec3) {
        self.start += offset;
        self.end = ctx.nav.clamp_to_mesh(self.end + offset);
        self.current = ctx.position;
    }

    fn update(&mut self, ctx: &mut StateContext<'_>, delta_ms: u32) {
        self.elapsed_ms = self.elapsed_ms.saturating_add(delta_ms).min(self.duration_ms);
        let sample = self.sample();
        self.current = sample.position;
        ctx.sample = Some(sample);
    }

    fn is_done(&self, _nav: &dyn NavigationAgent) -> bool {
        self.elapsed_ms >= self.duration_ms
    }
}

/// Ballistic forced displacement: straight over the ground, parabolic in height
#[derive(Debug, Clone, Default)]
pub struct ForceSkyState {
    plan: SkyPlan,
    duration_ms: u32,

    start: Vec3,
    landing: Vec3,
    current: Vec3,
    elapsed_ms: u32,
    nav_was_enabled: bool,
}

impl ForceSkyState {
    pub fn configure(&mut self, plan: SkyPlan, duration_ms: u32) {
        self.plan = plan;
        self.duration_ms = duration_ms;
    }

    /// Take-off and landing points of the current launch
    pub fn path(&self) -> (Vec3, Vec3) {
        (self.start, self.landing)
    }

    pub fn elapsed_ms(&self) -> u32 {
        self.elapsed_ms
    }

    fn sample(&self) -> KinematicSample {
        let t = progress(self.elapsed_ms, self.duration_ms);
        let h = self.plan.peak_height;
        let position = self.start.lerp(self.landing, t) + Vec3::Y * (4.0 * h * t * (1.0 - t));
        let velocity = if t >= 1.0 {
            Vec3::ZERO
        } else {
            let secs = seconds(self.duration_ms);
            (self.landing - self.start) / secs + Vec3::Y * (4.0 * h * (1.0 - 2.0 * t) / secs)
        };
        KinematicSample { position, velocity }
    }
}

impl MovementState for ForceSkyState {
    fn id(&self) -> MovementStateId {
        MovementStateId::ForceSky
    }

    fn enter(&mut self, ctx: &mut StateContext<'_>) {
        self.start = ctx.position;
        let travel = self.plan.direction * self.plan.speed * seconds(self.duration_ms);
        self.landing = ctx.nav.clamp_to_mesh(self.start + travel);
        self.current = self.start;
        self.elapsed_ms = 0;
        self.nav_was_enabled = suspend_nav(ctx.nav);
    }

    fn exit(&mut self, ctx: &mut StateContext<'_>) {
        resume_nav(ctx.nav, self.current, self.nav_was_enabled);
    }

    fn relocate(&mut self, ctx: &mut StateContext<'_>, offset: Vec3) {
        self.start += offset;
        self.landing = ctx.nav.clamp_to_mesh(self.landing + offset);
        self.current = ctx.position;
    }

    fn update(&mut self, ctx: &mut StateContext<'_>, delta_ms: u32) {
        self.elapsed_ms = self.elapsed_ms.saturating_add(delta_ms).min(self.duration_ms);
        let sample = self.sample();
        self.current = sample.position;
        ctx.sample = Some(sample);
    }

    fn is_done(&self, _nav: &dyn NavigationAgent) -> bool {
        self.elapsed_ms >= self.duration_ms
    }
}

/// Stun/root. `None` duration holds until released.
#[derive(Debug, Clone, Default)]
pub struct ImmobilizedState {
    duration_ms: Option<u32>,

    hold: Vec3,
    elapsed_ms: u32,
    released: bool,
    nav_was_enabled: bool,
}

impl ImmobilizedState {
    pub fn configure(&mut self, duration_ms: Option<u32>) {
        self.duration_ms = duration_ms;
    }

    /// End the hold; the state reports done on the next check
    pub fn release(&mut self) {
        self.released = true;
    }

    pub fn remaining_ms(&self) -> Option<u32> {
        self.duration_ms
            .map(|duration| duration.saturating_sub(self.elapsed_ms))
    }
}

impl MovementState for ImmobilizedState {
    fn id(&self) -> MovementStateId {
        MovementStateId::Immobilized
    }

    fn enter(&mut self, ctx: &mut StateContext<'_>) {
        self.hold = ctx.position;
        self.elapsed_ms = 0;
        self.released = false;
        self.nav_was_enabled = suspend_nav(ctx.nav);
    }

    fn exit(&mut self, ctx: &mut StateContext<'_>) {
        resume_nav(ctx.nav, self.hold, self.nav_was_enabled);
    }

    fn relocate(&mut self, ctx: &mut StateContext<'_>, _offset: Vec3) {
        self.hold = ctx.position;
    }

    fn update(&mut self, ctx: &mut StateContext<'_>, delta_ms: u32) {
        self.elapsed_ms = self.elapsed_ms.saturating_add(delta_ms);
        ctx.sample = Some(KinematicSample {
            position: self.hold,
            velocity: Vec3::ZERO,
        });
    }

    fn is_done(&self, _nav: &dyn NavigationAgent) -> bool {
        self.released || self.duration_ms.is_some_and(|d| self.elapsed_ms >= d)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::nav::{NavMesh, StraightLineNav};

    fn nav() -> StraightLineNav {
        StraightLineNav::new(Arc::new(NavMesh::default()), Vec3::ZERO)
    }

    #[test]
    fn test_force_line_interpolates_and_finishes() {
        let mut nav = nav();
        let mut state = ForceLineState::default();
        state.configure(LinePlan::To(Vec3::new(10.0, 0.0, 0.0)), 500);

        let mut ctx = StateContext::new(&mut nav, Vec3::ZERO);
        state.enter(&mut ctx);
        assert!(!ctx.nav.is_enabled());

        state.update(&mut ctx, 250);
        let sample = ctx.sample.take().unwrap();
        assert!((sample.position.x - 5.0).abs() < 1e-5);
        assert!((sample.velocity.x - 20.0).abs() < 1e-4);
        assert!(!state.is_done(&*ctx.nav));

        state.update(&mut ctx, 249);
        assert!(!state.is_done(&*ctx.nav));

        state.update(&mut ctx, 100);
        let sample = ctx.sample.take().unwrap();
        assert_eq!(sample.position, Vec3::new(10.0, 0.0, 0.0));
        assert_eq!(sample.velocity, Vec3::ZERO);
        assert!(state.is_done(&*ctx.nav));
        assert_eq!(state.elapsed_ms(), 500);

        state.exit(&mut ctx);
        assert!(nav.is_enabled());
        assert_eq!(nav.position(), Vec3::new(10.0, 0.0, 0.0));
    }

    #[test]
    fn test_force_line_along_is_clamped_to_mesh() {
        let mesh = Arc::new(NavMesh::new(Vec3::splat(-2.0), Vec3::splat(2.0)));
        let mut nav = StraightLineNav::new(mesh, Vec3::ZERO);
        let mut state = ForceLineState::default();
        state.configure(
            LinePlan::Along {
                direction: Vec3::X,
                speed: 10.0,
            },
            1000,
        );
        state.enter(&mut StateContext::new(&mut nav, Vec3::ZERO));
        assert_eq!(state.path().1, Vec3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn test_force_line_reentry_resets_elapsed() {
        let mut nav = nav();
        let mut state = ForceLineState::default();
        state.configure(LinePlan::To(Vec3::new(1.0, 0.0, 0.0)), 100);
        let mut ctx = StateContext::new(&mut nav, Vec3::ZERO);
        state.enter(&mut ctx);
        state.update(&mut ctx, 100);
        state.exit(&mut ctx);

        let mut ctx = StateContext::new(&mut nav, Vec3::new(1.0, 0.0, 0.0));
        state.configure(LinePlan::To(Vec3::new(3.0, 0.0, 0.0)), 100);
        state.enter(&mut ctx);
        assert_eq!(state.elapsed_ms(), 0);
        assert_eq!(state.path().0, Vec3::new(1.0, 0.0, 0.0));
        assert!(!state.is_done(&*ctx.nav));
    }

    #[test]
    fn test_zero_duration_line_completes_at_end() {
        let mut nav = nav();
        let mut state = ForceLineState::default();
        state.configure(LinePlan::To(Vec3::new(2.0, 0.0, 0.0)), 0);
        let mut ctx = StateContext::new(&mut nav, Vec3::ZERO);
        state.enter(&mut ctx);
        state.update(&mut ctx, 50);
        assert_eq!(ctx.sample.unwrap().position, Vec3::new(2.0, 0.0, 0.0));
        assert!(state.is_done(&*ctx.nav));
    }

    #[test]
    fn test_force_sky_peaks_halfway_and_lands() {
        let mut nav = nav();
        let mut state = ForceSkyState::default();
        state.configure(
            SkyPlan {
                direction: Vec3::X,
                speed: 4.0,
                peak_height: 2.0,
            },
            1000,
        );
        let mut ctx = StateContext::new(&mut nav, Vec3::ZERO);
        state.enter(&mut ctx);
        assert_eq!(state.path().1, Vec3::new(4.0, 0.0, 0.0));

        state.update(&mut ctx, 500);
        let apex = ctx.sample.take().unwrap();
        assert!((apex.position.x - 2.0).abs() < 1e-5);
        assert!((apex.position.y - 2.0).abs() < 1e-5);
        assert!(apex.velocity.y.abs() < 1e-5);

        state.update(&mut ctx, 500);
        let landed = ctx.sample.take().unwrap();
        assert_eq!(landed.position, Vec3::new(4.0, 0.0, 0.0));
        assert_eq!(landed.velocity, Vec3::ZERO);
        assert!(state.is_done(&*ctx.nav));
    }

    #[test]
    fn test_immobilized_holds_until_release() {
        let mut nav = nav();
        let mut state = ImmobilizedState::default();
        state.configure(None);
        let mut ctx = StateContext::new(&mut nav, Vec3::new(1.0, 0.0, 1.0));
        state.enter(&mut ctx);

        state.update(&mut ctx, 10_000);
        let sample = ctx.sample.take().unwrap();
        assert_eq!(sample.position, Vec3::new(1.0, 0.0, 1.0));
        assert_eq!(sample.velocity, Vec3::ZERO);
        assert!(!state.is_done(&*ctx.nav));

        state.release();
        assert!(state.is_done(&*ctx.nav));
    }

    #[test]
    fn test_immobilized_timed() {
        let mut nav = nav();
        let mut state = ImmobilizedState::default();
        state.configure(Some(300));
        let mut ctx = StateContext::new(&mut nav, Vec3::ZERO);
        state.enter(&mut ctx);
        state.update(&mut ctx, 200);
        assert_eq!(state.remaining_ms(), Some(100));
        assert!(!state.is_done(&*ctx.nav));
        state.update(&mut ctx, 100);
        assert!(state.is_done(&*ctx.nav));
    }

    #[test]
    fn test_suspend_restores_disabled_nav() {
        let mut nav = nav();
        nav.disable();
        let mut state = ImmobilizedState::default();
        let mut ctx = StateContext::new(&mut nav, Vec3::ZERO);
        state.enter(&mut ctx);
        state.exit(&mut ctx);
        assert!(!nav.is_enabled());
    }
}
