//! Movement state machine
//!
//! One `MovementAgent` per live entity, driven once per tick by the owning
//! scene loop. Single-threaded and deterministic:
//! - Exactly one state is active at any time, never shared across agents
//! - Directed requests are deferred while forced movement or a hold runs
//! - Kinematic changes reach observers only through the agent's setters

pub mod agent;
pub mod directed;
pub mod forced;
pub mod state;

pub use agent::{ChangeCallbacks, ChangeFn, MovementAgent, MovementSnapshot};
pub use directed::{MoveToDirectionState, MoveToPositionState};
pub use forced::{ForceLineState, ForceSkyState, ImmobilizedState, LinePlan, SkyPlan};
pub use state::{
    IdleState, KinematicSample, MovementCategory, MovementState, MovementStateId, StateContext,
    StateTable,
};
