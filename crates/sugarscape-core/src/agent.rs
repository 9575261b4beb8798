use crate::config::ModelConfig;
use crate::grid::{Cell, Grid};
use crate::resource::SugarField;
use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Relative tolerance used when comparing sugar levels and distances while
/// choosing where to move.
pub const MOVE_TOLERANCE: f64 = 0.01;

/// Stable agent identifier; also the agent's slot in the model population.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(pub u32);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Affiliation {
    /// Group 0: innovates and shares technology.
    Innovating,
    /// Group 1: never innovates or shares.
    NonInnovating,
}

impl Affiliation {
    pub fn group(self) -> u8 {
        match self {
            Affiliation::Innovating => 0,
            Affiliation::NonInnovating => 1,
        }
    }

    pub fn is_innovating(self) -> bool {
        self == Affiliation::Innovating
    }
}

/// Parameters of the technology ladder shared by every agent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TechRules {
    pub tech_bottleneck: u32,
    pub reduction_scale: f64,
    pub innovation_difficulty: f64,
}

impl From<&ModelConfig> for TechRules {
    fn from(config: &ModelConfig) -> Self {
        Self {
            tech_bottleneck: config.tech_bottleneck,
            reduction_scale: config.reduction_scale,
            innovation_difficulty: config.innovation_difficulty,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub position: Cell,
    pub sugar: f64,
    pub metabolism: f64,
    pub vision: usize,
    pub tech: u32,
    pub affiliation: Affiliation,
    pub(crate) alive: bool,
}

/// `math.isclose`-style comparison with a purely relative tolerance.
fn is_close(a: f64, b: f64, rel_tol: f64) -> bool {
    (a - b).abs() <= rel_tol * a.abs().max(b.abs())
}

impl Agent {
    pub fn new(
        id: AgentId,
        position: Cell,
        sugar: f64,
        metabolism: f64,
        vision: usize,
        tech: u32,
        affiliation: Affiliation,
    ) -> Self {
        Self {
            id,
            position,
            sugar,
            metabolism,
            vision,
            tech,
            affiliation,
            alive: true,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Pick the cell this agent moves to: among empty cells in sight, the
    /// richest ones (within [`MOVE_TOLERANCE`]), then the nearest of those
    /// (again within tolerance), with ties broken uniformly at random.
    /// Returns the current position when nothing in sight is empty.
    pub fn choose_destination<R: Rng + ?Sized>(
        &self,
        grid: &Grid,
        field: &SugarField,
        rng: &mut R,
    ) -> Cell {
        let possibles: Vec<(Cell, f64)> = grid
            .neighborhood(self.position, self.vision, true)
            .into_iter()
            .filter(|cell| grid.is_empty(*cell))
            .map(|cell| (cell, field.level(cell)))
            .collect();
        if possibles.is_empty() {
            return self.position;
        }

        let max_sugar = possibles
            .iter()
            .map(|(_, level)| *level)
            .fold(f64::NEG_INFINITY, f64::max);
        let richest: Vec<(Cell, f64)> = possibles
            .into_iter()
            .filter(|(_, level)| is_close(*level, max_sugar, MOVE_TOLERANCE))
            .map(|(cell, _)| (cell, self.position.distance(cell)))
            .collect();

        let min_dist = richest
            .iter()
            .map(|(_, dist)| *dist)
            .fold(f64::INFINITY, f64::min);
        let nearest: Vec<Cell> = richest
            .into_iter()
            .filter(|(_, dist)| is_close(*dist, min_dist, MOVE_TOLERANCE))
            .map(|(cell, _)| cell)
            .collect();

        nearest.choose(rng).copied().unwrap_or(self.position)
    }

    /// Collect all sugar in the current cell, then pay metabolism.
    pub fn gather_and_eat(&mut self, field: &mut SugarField) {
        self.sugar += field.harvest(self.position);
        self.sugar -= self.metabolism;
    }

    /// True when the agent has run out of sugar and must leave the model.
    pub fn is_depleted(&self) -> bool {
        self.sugar <= 0.0
    }

    pub fn update_tech_level(&mut self, reduction_scale: f64) {
        self.tech += 1;
        self.metabolism *= reduction_scale;
    }

    /// Attempt one innovation. Only innovating agents with surplus sugar
    /// below the bottleneck roll; success probability is
    /// `sugar * innovation_difficulty`. Returns whether tech advanced.
    pub fn try_innovate<R: Rng + ?Sized>(&mut self, rules: &TechRules, rng: &mut R) -> bool {
        if !self.affiliation.is_innovating()
            || self.sugar <= self.metabolism
            || self.tech >= rules.tech_bottleneck
        {
            return false;
        }
        let p_success = self.sugar * rules.innovation_difficulty;
        if p_success > rng.random::<f64>() {
            self.update_tech_level(rules.reduction_scale);
            return true;
        }
        false
    }
}
