use proptest::prelude::*;
use std::collections::HashSet;
use sugarscape_core::model::metrics::gini;
use sugarscape_core::{ModelConfig, RunSummary, SugarField, SugarscapeModel};

fn build(seed: u64, population: usize, difficulty: f64) -> SugarscapeModel {
    let config = ModelConfig {
        width: 15,
        height: 15,
        initial_population: population,
        innovation_difficulty: difficulty,
        seed: Some(seed),
        ..ModelConfig::default()
    };
    SugarscapeModel::new(config, SugarField::two_peaks(15, 15, 4).unwrap())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn occupancy_and_resource_bounds_hold(
        seed in any::<u64>(),
        population in 1usize..120,
        ticks in 1usize..30,
    ) {
        let mut model = build(seed, population, 0.001);
        for _ in 0..ticks {
            model.step();
            let positions: HashSet<_> = model.agents().map(|a| a.position).collect();
            prop_assert_eq!(positions.len(), model.population());
            for (level, cap) in model.field().levels().iter().zip(model.field().capacities()) {
                prop_assert!(*level >= 0.0 && level <= cap);
            }
        }
    }

    #[test]
    fn tech_stays_within_bounds(seed in any::<u64>(), difficulty in 1e-6f64..0.05) {
        let mut model = build(seed, 60, difficulty);
        let summary = model.run(20);
        let bottleneck = model.config().tech_bottleneck;
        let tech_min = model.config().tech_min as f64;
        prop_assert!(model.agents().all(|a| a.tech <= bottleneck && a.sugar > 0.0));
        for sample in &summary.samples {
            if let Some(avg) = sample.avg_tech {
                prop_assert!(avg >= tech_min && avg <= bottleneck as f64);
            }
        }
    }

    #[test]
    fn gini_is_bounded_for_non_negative_wealth(
        values in prop::collection::vec(0.0f64..1000.0, 1..64),
    ) {
        if let Some(g) = gini(&values) {
            prop_assert!((-1e-9..=1.0).contains(&g), "gini = {}", g);
        }
    }

    #[test]
    fn live_agents_always_have_positive_sugar_after_a_tick(seed in any::<u64>()) {
        let mut model = build(seed, 100, 0.00001);
        for _ in 0..10 {
            let summary = model.step();
            prop_assert_eq!(summary.population, model.population());
            prop_assert!(model.agents().all(|a| a.sugar > 0.0));
        }
    }
}

#[test]
fn run_summary_serializes_undefined_metrics_as_null() {
    let mut model = build(3, 10, 1e-9);
    let summary = model.run(2);
    assert_eq!(summary.samples.len(), 3);
    assert_eq!(summary.steps, 2);

    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["seed"], 3);
    assert_eq!(json["samples"][0]["tick"], 0);

    let mut extinct: RunSummary = serde_json::from_value(json).unwrap();
    extinct.samples[0].gini = None;
    let text = serde_json::to_string(&extinct).unwrap();
    assert!(text.contains("\"gini\":null"));
}

#[test]
fn ratio_matches_population_counts() {
    let mut model = build(17, 80, 1e-9);
    model.run(5);
    for sample in model.metrics() {
        if sample.population > 0 {
            let expected = sample.innovating as f64 / sample.population as f64;
            assert_eq!(sample.ratio, Some(expected));
        } else {
            assert_eq!(sample.ratio, None);
        }
    }
}

#[test]
fn stepwise_snapshots_expose_render_state() {
    let mut model = build(21, 30, 0.001);
    for tick in 1..=3 {
        model.step();
        let agents: Vec<_> = model.agents().collect();
        let json = serde_json::to_value(&agents).unwrap();
        let first = &json[0];
        assert!(first["position"]["x"].is_u64());
        assert!(first["position"]["y"].is_u64());
        assert!(first["sugar"].is_f64());
        assert!(first["affiliation"] == "innovating" || first["affiliation"] == "non_innovating");
        assert_eq!(model.field().levels().len(), 15 * 15);
        assert_eq!(model.metrics().len(), tick + 1);
        assert_eq!(model.metrics().last().unwrap().tick, tick);
    }
}
