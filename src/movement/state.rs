//! Movement state ids, categories and the per-agent state table
//!
//! Every agent owns exactly one instance of each state. States are entered
//! and exited many times over the agent's lifetime; `enter` resets all
//! mode-specific runtime fields from the state's configured parameters.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::directed::{MoveToDirectionState, MoveToPositionState};
use super::forced::{ForceLineState, ForceSkyState, ImmobilizedState};
use crate::error::MovementError;
use crate::nav::NavigationAgent;

/// Identifies one of the fixed movement states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovementStateId {
    Idle,
    MoveToDirection,
    MoveToPosition,
    ForceLine,
    ForceSky,
    Immobilized,
}

impl MovementStateId {
    pub const ALL: [MovementStateId; 6] = [
        MovementStateId::Idle,
        MovementStateId::MoveToDirection,
        MovementStateId::MoveToPosition,
        MovementStateId::ForceLine,
        MovementStateId::ForceSky,
        MovementStateId::Immobilized,
    ];

    /// Coarse category used to arbitrate control
    pub fn category(self) -> MovementCategory {
        match self {
            MovementStateId::Idle => MovementCategory::Idle,
            MovementStateId::MoveToDirection | MovementStateId::MoveToPosition => {
                MovementCategory::Move
            }
            MovementStateId::ForceLine | MovementStateId::ForceSky => MovementCategory::ForceMove,
            MovementStateId::Immobilized => MovementCategory::Immobilized,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MovementStateId::Idle => "Idle",
            MovementStateId::MoveToDirection => "MoveToDirection",
            MovementStateId::MoveToPosition => "MoveToPosition",
            MovementStateId::ForceLine => "ForceLine",
            MovementStateId::ForceSky => "ForceSky",
            MovementStateId::Immobilized => "Immobilized",
        }
    }
}

impl TryFrom<u8> for MovementStateId {
    type Error = MovementError;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .get(index as usize)
            .copied()
            .ok_or(MovementError::InvalidTransition(index))
    }
}

impl std::fmt::Display for MovementStateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Movement mode. Ordering matters: anything above `Move` means the entity
/// has lost control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MovementCategory {
    Idle,
    Move,
    ForceMove,
    Immobilized,
}

impl MovementCategory {
    /// Directed requests are deferred in this category
    pub fn loses_control(self) -> bool {
        self > MovementCategory::Move
    }
}

/// Kinematics driven directly by a state (forced movement, holds)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KinematicSample {
    pub position: Vec3,
    pub velocity: Vec3,
}

/// What a state may touch while running
pub struct StateContext<'a> {
    pub nav: &'a mut dyn NavigationAgent,
    /// Agent's authoritative position at the start of the call
    pub position: Vec3,
    /// Output of `update`, applied by the agent after any transition
    pub sample: Option<KinematicSample>,
}

impl<'a> StateContext<'a> {
    pub fn new(nav: &'a mut dyn NavigationAgent, position: Vec3) -> Self {
        Self {
            nav,
            position,
            sample: None,
        }
    }
}

/// One movement mode
pub trait MovementState {
    fn id(&self) -> MovementStateId;

    /// Reset runtime fields from the configured parameters and take over the
    /// navigation agent
    fn enter(&mut self, ctx: &mut StateContext<'_>);

    /// Release anything taken in `enter`
    fn exit(&mut self, ctx: &mut StateContext<'_>);

    fn update(&mut self, ctx: &mut StateContext<'_>, delta_ms: u32);

    fn is_done(&self, nav: &dyn NavigationAgent) -> bool;

    /// The entity was placed elsewhere by `offset`; `ctx.position` is the new
    /// position. States that drive the entity themselves move their path along.
    fn relocate(&mut self, _ctx: &mut StateContext<'_>, _offset: Vec3) {}
}

/// Resting state. Never completes on its own.
#[derive(Debug, Clone, Default)]
pub struct IdleState;

impl MovementState for IdleState {
    fn id(&self) -> MovementStateId {
        MovementStateId::Idle
    }

    fn enter(&mut self, ctx: &mut StateContext<'_>) {
        ctx.nav.stop();
    }

    fn exit(&mut self, _ctx: &mut StateContext<'_>) {}

    fn update(&mut self, _ctx: &mut StateContext<'_>, _delta_ms: u32) {}

    fn is_done(&self, _nav: &dyn NavigationAgent) -> bool {
        false
    }
}

/// One instance of every state, indexed by [`MovementStateId`].
///
/// Per-state parameters are set through the typed fields; the agent drives
/// lifecycle calls through [`StateTable::get_mut`].
#[derive(Debug, Clone, Default)]
pub struct StateTable {
    pub idle: IdleState,
    pub move_to_direction: MoveToDirectionState,
    pub move_to_position: MoveToPositionState,
    pub force_line: ForceLineState,
    pub force_sky: ForceSkyState,
    pub immobilized: ImmobilizedState,
}

impl StateTable {
    pub fn get(&self, id: MovementStateId) -> &dyn MovementState {
        match id {
            MovementStateId::Idle => &self.idle,
            MovementStateId::MoveToDirection => &self.move_to_direction,
            MovementStateId::MoveToPosition => &self.move_to_position,
            MovementStateId::ForceLine => &self.force_line,
            MovementStateId::ForceSky => &self.force_sky,
            MovementStateId::Immobilized => &self.immobilized,
        }
    }

    pub fn get_mut(&mut self, id: MovementStateId) -> &mut dyn MovementState {
        match id {
            MovementStateId::Idle => &mut self.idle,
            MovementStateId::MoveToDirection => &mut self.move_to_direction,
            MovementStateId::MoveToPosition => &mut self.move_to_position,
            MovementStateId::ForceLine => &mut self.force_line,
            MovementStateId::ForceSky => &mut self.force_sky,
            MovementStateId::Immobilized => &mut self.immobilized,
        }
    }
}
