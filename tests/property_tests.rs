use kproto::{InitMethod, KPrototypes, MixedValue};
use ndarray::Array2;
use proptest::prelude::*;
use std::collections::HashSet;

const SECTORS: [&str; 3] = ["tech", "fin", "nrg"];
const REGIONS: [&str; 2] = ["USA", "EU"];

type Row = (f64, usize, usize);

fn to_data(rows: &[Row]) -> Array2<MixedValue<&'static str>> {
    let cells = rows
        .iter()
        .flat_map(|&(value, sector, region)| {
            [
                MixedValue::Numerical(value),
                MixedValue::Categorical(SECTORS[sector]),
                MixedValue::Categorical(REGIONS[region]),
            ]
        })
        .collect();
    Array2::from_shape_vec((rows.len(), 3), cells).unwrap()
}

fn distinct(rows: &[Row]) -> usize {
    rows.iter()
        .map(|&(value, sector, region)| (value.to_bits(), sector, region))
        .collect::<HashSet<_>>()
        .len()
}

fn rows_strategy() -> impl Strategy<Value = Vec<Row>> {
    prop::collection::vec((-100.0f64..100.0, 0usize..3, 0usize..2), 2..24)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_every_row_gets_a_valid_label(rows in rows_strategy(), k in 1usize..5) {
        prop_assume!(k <= distinct(&rows));
        let data = to_data(&rows);

        match KPrototypes::new(k).fit(data.view(), &[1, 2], None) {
            Ok(model) => {
                prop_assert_eq!(model.labels().len(), rows.len());
                for &label in model.labels() {
                    prop_assert!((label as usize) < k);
                }
                prop_assert!(model.cost() >= 0.0);
            }
            // Degenerate data may defeat initialization; that must be a value error
            Err(err) => prop_assert!(err.is_value_error(), "{}", err),
        }
    }

    #[test]
    fn prop_fit_is_deterministic_given_seed(
        rows in rows_strategy(),
        k in 1usize..4,
        seed in any::<u64>(),
    ) {
        prop_assume!(k <= distinct(&rows));
        let data = to_data(&rows);
        let config = KPrototypes::new(k)
            .init_method(InitMethod::Random)
            .n_init(3)
            .random_state(seed);

        let first = config.fit(data.view(), &[1, 2], None);
        let second = config.fit(data.view(), &[1, 2], None);
        match (first, second) {
            (Ok(a), Ok(b)) => {
                prop_assert_eq!(a.labels(), b.labels());
                prop_assert_eq!(a.cost(), b.cost());
            }
            (Err(a), Err(b)) => prop_assert_eq!(a, b),
            _ => prop_assert!(false, "runs with the same seed disagree"),
        }
    }

    #[test]
    fn prop_uniform_weights_do_not_change_the_partition(
        rows in rows_strategy(),
        k in 1usize..4,
        scale in prop::sample::select(vec![0.1, 0.25, 0.3, 0.5, 2.0, 4.0]),
    ) {
        prop_assume!(k <= distinct(&rows));
        let data = to_data(&rows);
        let config = KPrototypes::new(k);

        let plain = config.fit(data.view(), &[1, 2], None);
        let weights = vec![scale; rows.len()];
        let scaled = config.fit(data.view(), &[1, 2], Some(&weights));
        if let (Ok(plain), Ok(scaled)) = (plain, scaled) {
            prop_assert_eq!(plain.labels(), scaled.labels());
            prop_assert_eq!(plain.categorical_centroids(), scaled.categorical_centroids());
            for (a, b) in plain.numeric_centroids().iter().zip(scaled.numeric_centroids()) {
                prop_assert!((a - b).abs() <= 1e-9 * a.abs().max(1.0));
            }
            prop_assert!((scaled.cost() - scale * plain.cost()).abs() <= 1e-9 * plain.cost().max(1.0));
        }
    }

    #[test]
    fn prop_passes_lower_the_cost(rows in rows_strategy(), k in 1usize..5) {
        prop_assume!(k <= distinct(&rows));
        let data = to_data(&rows);

        if let Ok(model) = KPrototypes::new(k).fit(data.view(), &[1, 2], None) {
            let costs = model.epoch_costs();
            prop_assert_eq!(costs.len(), model.n_iter() + 1);
            // Every pass but the last one strictly improved on its predecessor
            for pair in costs[..costs.len() - 1].windows(2) {
                prop_assert!(pair[1] < pair[0]);
            }
            // A last pass that did not pay off is rolled back
            let cheapest = costs.iter().copied().fold(f64::INFINITY, f64::min);
            prop_assert!(model.cost() >= cheapest);
            prop_assert!(model.cost() - cheapest <= 1e-9 * cheapest.max(1.0));
            prop_assert!(costs[costs.len().saturating_sub(2)..].contains(&model.cost()));
        }
    }

    #[test]
    fn prop_model_cost_matches_cost_of_labels(rows in rows_strategy(), k in 1usize..4) {
        prop_assume!(k <= distinct(&rows));
        let data = to_data(&rows);
        let config = KPrototypes::new(k);

        if let Ok(model) = config.fit(data.view(), &[1, 2], None) {
            let labels: Vec<usize> = model.labels().iter().map(|&l| l as usize).collect();
            let cost = config.cost_of_labels(data.view(), &[1, 2], &labels, None).unwrap();
            prop_assert!((cost - model.cost()).abs() <= 1e-6 * model.cost().max(1.0));
        }
    }
}
