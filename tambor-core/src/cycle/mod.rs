//! Wash cycle sequencing
//!
//! A cycle is compiled into a flat list of operations ([`recipe`]) and then
//! stepped through by the [`Sequencer`], which owns the actuator state while
//! a cycle runs.

pub mod handle;
pub mod params;
pub mod recipe;
pub mod sequencer;

pub use handle::CycleHandle;
pub use params::{ParamError, WashParams, WashStep, WaterLevel, MAX_RINSE_COUNT};
pub use recipe::{build_recipe, Op, Recipe, MAX_RECIPE_OPS};
pub use sequencer::{
    CycleCommand, CycleEvent, CycleEvents, CyclePhase, Sequencer, SkipStepError, StartError,
};
