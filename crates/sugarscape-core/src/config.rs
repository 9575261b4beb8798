use serde::{Deserialize, Serialize};

/// Construction parameters for a [`SugarscapeModel`](crate::SugarscapeModel).
///
/// Integer ranges (`*_min..=*_max`) are inclusive and sampled uniformly per
/// agent at initialization.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub width: usize,
    pub height: usize,
    pub initial_population: usize,
    pub endowment_min: u32,
    pub endowment_max: u32,
    pub metabolism_min: u32,
    pub metabolism_max: u32,
    pub vision_min: usize,
    pub vision_max: usize,
    /// Tech level every agent starts with.
    pub tech_min: u32,
    /// Highest tech level reachable by innovation or sharing.
    pub tech_bottleneck: u32,
    /// Factor applied to metabolism on every tech promotion, in (0, 1).
    pub reduction_scale: f64,
    /// Innovation success probability per unit of sugar held.
    pub innovation_difficulty: f64,
    /// Probability that an initial agent joins the innovating group.
    pub innovating_share: f64,
    pub seed: Option<u64>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            width: 50,
            height: 50,
            initial_population: 200,
            endowment_min: 25,
            endowment_max: 50,
            metabolism_min: 1,
            metabolism_max: 5,
            vision_min: 1,
            vision_max: 5,
            tech_min: 1,
            tech_bottleneck: 5,
            reduction_scale: 0.9,
            innovation_difficulty: 0.00001,
            innovating_share: 0.5,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("grid dimensions must be positive (got {width}x{height})")]
    EmptyGrid { width: usize, height: usize },

    #[error("initial_population must be positive")]
    EmptyPopulation,

    #[error("initial_population ({population}) exceeds the number of cells ({cells})")]
    PopulationExceedsCells { population: usize, cells: usize },

    #[error("{name}_min ({min}) must not exceed {name}_max ({max})")]
    InvertedRange {
        name: &'static str,
        min: u64,
        max: u64,
    },

    #[error("metabolism_min must be positive")]
    ZeroMetabolism,

    #[error("tech_min ({tech_min}) must not exceed tech_bottleneck ({tech_bottleneck})")]
    TechAboveBottleneck { tech_min: u32, tech_bottleneck: u32 },

    #[error("reduction_scale must lie strictly between 0 and 1 (got {0})")]
    ReductionScale(f64),

    #[error("innovation_difficulty must be finite and positive (got {0})")]
    InnovationDifficulty(f64),

    #[error("innovating_share must lie in [0, 1] (got {0})")]
    InnovatingShare(f64),
}

impl ModelConfig {
    pub fn cell_count(&self) -> usize {
        self.width.saturating_mul(self.height)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::EmptyGrid {
                width: self.width,
                height: self.height,
            });
        }
        if self.initial_population == 0 {
            return Err(ConfigError::EmptyPopulation);
        }
        // Placement is without replacement, so every agent needs its own cell.
        if self.initial_population > self.cell_count() {
            return Err(ConfigError::PopulationExceedsCells {
                population: self.initial_population,
                cells: self.cell_count(),
            });
        }
        check_range("endowment", self.endowment_min as u64, self.endowment_max as u64)?;
        check_range(
            "metabolism",
            self.metabolism_min as u64,
            self.metabolism_max as u64,
        )?;
        check_range("vision", self.vision_min as u64, self.vision_max as u64)?;
        if self.metabolism_min == 0 {
            return Err(ConfigError::ZeroMetabolism);
        }
        if self.tech_min > self.tech_bottleneck {
            return Err(ConfigError::TechAboveBottleneck {
                tech_min: self.tech_min,
                tech_bottleneck: self.tech_bottleneck,
            });
        }
        if !(self.reduction_scale > 0.0 && self.reduction_scale < 1.0) {
            return Err(ConfigError::ReductionScale(self.reduction_scale));
        }
        if !self.innovation_difficulty.is_finite() || self.innovation_difficulty <= 0.0 {
            return Err(ConfigError::InnovationDifficulty(self.innovation_difficulty));
        }
        if !(0.0..=1.0).contains(&self.innovating_share) {
            return Err(ConfigError::InnovatingShare(self.innovating_share));
        }
        Ok(())
    }
}

fn check_range(name: &'static str, min: u64, max: u64) -> Result<(), ConfigError> {
    if min > max {
        return Err(ConfigError::InvertedRange { name, min, max });
    }
    Ok(())
}
