use super::SugarscapeModel;
use crate::agent::Agent;
use serde::{Deserialize, Serialize};

/// Population-level measurements taken after a tick (tick 0 is the state
/// right after initialization). Metrics that are undefined for the current
/// population are `None`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricsSample {
    pub tick: usize,
    pub gini: Option<f64>,
    pub ratio: Option<f64>,
    pub avg_tech: Option<f64>,
    pub population: usize,
    pub innovating: usize,
    pub sugar_total: f64,
}

fn default_schema_version() -> u32 {
    1
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunSummary {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub seed: u64,
    pub steps: usize,
    pub final_population: usize,
    #[serde(default)]
    pub total_deaths: usize,
    pub samples: Vec<MetricsSample>,
}

/// Gini coefficient of `values`: 0 for perfect equality, `1 - 1/n` when one
/// entry holds everything. `None` for an empty slice or a zero total.
pub fn gini(values: &[f64]) -> Option<f64> {
    let n = values.len();
    let sum: f64 = values.iter().sum();
    if n == 0 || sum == 0.0 {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let weighted: f64 = sorted
        .iter()
        .enumerate()
        .map(|(i, v)| v * (n - i) as f64)
        .sum();
    let x = weighted / (n as f64 * sum);
    Some(1.0 + 1.0 / n as f64 - 2.0 * x)
}

/// Share of `total` that is innovating; `None` when `total` is zero.
pub fn innovating_ratio(innovating: usize, total: usize) -> Option<f64> {
    (total > 0).then(|| innovating as f64 / total as f64)
}

/// Mean tech level of the innovating agents in `agents`.
pub fn mean_tech<'a>(agents: impl IntoIterator<Item = &'a Agent>) -> Option<f64> {
    let (sum, count) = agents
        .into_iter()
        .filter(|a| a.affiliation.is_innovating())
        .fold((0u64, 0usize), |(sum, count), a| (sum + a.tech as u64, count + 1));
    (count > 0).then(|| sum as f64 / count as f64)
}

impl SugarscapeModel {
    pub(crate) fn collect_metrics(&self) -> MetricsSample {
        let sugars: Vec<f64> = self.agents().map(|a| a.sugar).collect();
        let population = sugars.len();
        let innovating = self.innovating_count();
        MetricsSample {
            tick: self.tick,
            gini: gini(&sugars),
            ratio: innovating_ratio(innovating, population),
            avg_tech: mean_tech(self.agents()),
            population,
            innovating,
            sugar_total: self.field.total(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{Affiliation, AgentId};
    use crate::grid::Cell;

    #[test]
    fn uniform_wealth_has_zero_gini() {
        let g = gini(&[7.0; 10]).unwrap();
        assert!(g.abs() < 1e-12, "gini = {g}");
    }

    #[test]
    fn concentrated_wealth_approaches_one_minus_inverse_n() {
        let mut values = vec![0.0; 20];
        values[3] = 50.0;
        let g = gini(&values).unwrap();
        assert!((g - (1.0 - 1.0 / 20.0)).abs() < 1e-12, "gini = {g}");
    }

    #[test]
    fn gini_ignores_input_order() {
        let a = gini(&[1.0, 5.0, 2.0, 9.0]).unwrap();
        let b = gini(&[9.0, 2.0, 1.0, 5.0]).unwrap();
        assert!((a - b).abs() < 1e-12);
        assert!((0.0..=1.0).contains(&a));
    }

    #[test]
    fn gini_matches_hand_computation() {
        // sorted [1, 2, 3]: x = (1*3 + 2*2 + 3*1) / (3 * 6) = 10/18
        let g = gini(&[3.0, 1.0, 2.0]).unwrap();
        let expected = 1.0 + 1.0 / 3.0 - 2.0 * (10.0 / 18.0);
        assert!((g - expected).abs() < 1e-12);
    }

    #[test]
    fn gini_is_undefined_for_empty_or_zero_wealth() {
        assert_eq!(gini(&[]), None);
        assert_eq!(gini(&[0.0, 0.0]), None);
    }

    #[test]
    fn ratio_is_undefined_for_empty_population() {
        assert_eq!(innovating_ratio(0, 0), None);
        assert_eq!(innovating_ratio(1, 4), Some(0.25));
    }

    #[test]
    fn mean_tech_counts_only_innovators() {
        let make = |tech, affiliation| {
            Agent::new(AgentId(0), Cell::new(0, 0), 1.0, 1.0, 1, tech, affiliation)
        };
        let agents = vec![
            make(1, Affiliation::Innovating),
            make(4, Affiliation::Innovating),
            make(9, Affiliation::NonInnovating),
        ];
        assert_eq!(mean_tech(&agents), Some(2.5));
        assert_eq!(mean_tech(&agents[2..]), None);
    }
}
