pub mod metrics;
mod phases;

pub use metrics::*;
pub use phases::StepSummary;

use crate::agent::{Affiliation, Agent, AgentId, TechRules};
use crate::config::{ConfigError, ModelConfig};
use crate::grid::{Grid, GridError};
use crate::resource::{CapacityError, SugarField};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use tracing::info;

/// The whole simulation: grid, sugar field, population, random source and
/// the metrics recorded so far.
///
/// Agents are never dropped from `agents`; removal flips their `alive` flag
/// and vacates their cell, so an [`AgentId`] stays a valid slot index for
/// the life of the model.
pub struct SugarscapeModel {
    pub(crate) config: ModelConfig,
    pub(crate) rules: TechRules,
    pub(crate) grid: Grid,
    pub(crate) field: SugarField,
    pub(crate) agents: Vec<Agent>,
    pub(crate) rng: ChaCha12Rng,
    pub(crate) seed: u64,
    pub(crate) tick: usize,
    pub(crate) running: bool,
    pub(crate) metrics: Vec<MetricsSample>,
    pub(crate) total_deaths: usize,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelInitError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid capacity map: {0}")]
    Capacity(#[from] CapacityError),

    #[error(
        "capacity map is {field_width}x{field_height} but the grid is {width}x{height}"
    )]
    FieldMismatch {
        field_width: usize,
        field_height: usize,
        width: usize,
        height: usize,
    },

    #[error("initial_population ({0}) exceeds the agent id space")]
    TooManyAgents(usize),

    #[error("initial placement failed: {0}")]
    Placement(#[from] GridError),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RunError {
    #[error("steps ({actual}) exceed supported maximum ({max})")]
    TooManySteps { max: usize, actual: usize },
}

impl SugarscapeModel {
    pub const MAX_RUN_STEPS: usize = 1_000_000;

    /// Panicking convenience over [`SugarscapeModel::try_new`].
    pub fn new(config: ModelConfig, field: SugarField) -> Self {
        Self::try_new(config, field).unwrap_or_else(|e| panic!("{e}"))
    }

    /// Build the model, place the initial population on distinct random
    /// cells and record the tick-0 metrics sample.
    pub fn try_new(config: ModelConfig, field: SugarField) -> Result<Self, ModelInitError> {
        config.validate()?;
        if field.width() != config.width || field.height() != config.height {
            return Err(ModelInitError::FieldMismatch {
                field_width: field.width(),
                field_height: field.height(),
                width: config.width,
                height: config.height,
            });
        }
        if u32::try_from(config.initial_population).is_err() {
            return Err(ModelInitError::TooManyAgents(config.initial_population));
        }

        let seed = config.seed.unwrap_or_else(|| rand::rng().random());
        let mut rng = ChaCha12Rng::seed_from_u64(seed);
        let mut grid = Grid::new(config.width, config.height);
        let cells: Vec<_> = grid.cells().collect();
        let placements =
            rand::seq::index::sample(&mut rng, cells.len(), config.initial_population);

        let mut agents = Vec::with_capacity(config.initial_population);
        for (slot, cell_idx) in placements.into_iter().enumerate() {
            let id = AgentId(slot as u32);
            let position = cells[cell_idx];
            let sugar = rng.random_range(config.endowment_min..=config.endowment_max);
            let metabolism = rng.random_range(config.metabolism_min..=config.metabolism_max);
            let vision = rng.random_range(config.vision_min..=config.vision_max);
            let affiliation = if rng.random_bool(config.innovating_share) {
                Affiliation::Innovating
            } else {
                Affiliation::NonInnovating
            };
            grid.place(position, id)?;
            agents.push(Agent::new(
                id,
                position,
                sugar as f64,
                metabolism as f64,
                vision,
                config.tech_min,
                affiliation,
            ));
        }

        let mut model = Self {
            rules: TechRules::from(&config),
            config,
            grid,
            field,
            agents,
            rng,
            seed,
            tick: 0,
            running: true,
            metrics: Vec::new(),
            total_deaths: 0,
        };
        let initial = model.collect_metrics();
        model.metrics.push(initial);
        info!(
            seed,
            population = model.population(),
            innovating = model.innovating_count(),
            width = model.config.width,
            height = model.config.height,
            "Sugarscape model initialized"
        );
        Ok(model)
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Seed the random source was built from, including a drawn one.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Number of completed ticks.
    pub fn tick(&self) -> usize {
        self.tick
    }

    /// False once the population is extinct. Callers decide whether to keep
    /// stepping.
    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn field(&self) -> &SugarField {
        &self.field
    }

    /// Live agents in id order.
    pub fn agents(&self) -> impl Iterator<Item = &Agent> + '_ {
        self.agents.iter().filter(|a| a.alive)
    }

    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(id.0 as usize).filter(|a| a.alive)
    }

    pub fn population(&self) -> usize {
        self.agents().count()
    }

    pub fn innovating_count(&self) -> usize {
        self.agents()
            .filter(|a| a.affiliation.is_innovating())
            .count()
    }

    pub fn total_deaths(&self) -> usize {
        self.total_deaths
    }

    /// One sample per tick, starting with tick 0.
    pub fn metrics(&self) -> &[MetricsSample] {
        &self.metrics
    }

    pub fn run(&mut self, steps: usize) -> RunSummary {
        self.try_run(steps).unwrap_or_else(|e| panic!("{e}"))
    }

    /// Advance `steps` ticks and summarize the run so far.
    pub fn try_run(&mut self, steps: usize) -> Result<RunSummary, RunError> {
        if steps > Self::MAX_RUN_STEPS {
            return Err(RunError::TooManySteps {
                max: Self::MAX_RUN_STEPS,
                actual: steps,
            });
        }
        for _ in 0..steps {
            self.step();
        }
        Ok(RunSummary {
            schema_version: 1,
            seed: self.seed,
            steps: self.tick,
            final_population: self.population(),
            total_deaths: self.total_deaths,
            samples: self.metrics.clone(),
        })
    }
}
