//! Sugarscape engine: foraging, survival and technology diffusion among
//! agents on a finite grid with a renewable sugar field.
//!
//! The crate owns only the simulation state and its tick loop. Rendering,
//! parameter widgets and result export are left to callers, which read the
//! state through [`SugarscapeModel`]'s query methods.

pub mod agent;
pub mod config;
pub mod grid;
pub mod model;
pub mod resource;

pub use agent::{Affiliation, Agent, AgentId};
pub use config::{ConfigError, ModelConfig};
pub use grid::{Cell, Grid, GridError};
pub use model::{
    MetricsSample, ModelInitError, RunError, RunSummary, StepSummary, SugarscapeModel,
};
pub use resource::{CapacityError, SugarField};
