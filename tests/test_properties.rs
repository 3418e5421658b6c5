//! Property tests for label encoding and train/test splitting

use std::collections::BTreeSet;

use polars::prelude::*;
use proptest::prelude::*;
use weather_dataprep::preprocessing::{LabelEncoder, ROW_INDEX_COLUMN};
use weather_dataprep::split::TrainTestSplitter;

fn direction() -> impl Strategy<Value = String> {
    prop::sample::select(vec![
        "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW",
        "NW", "NNW",
    ])
    .prop_map(str::to_string)
}

proptest! {
    // ─────────────────────────────────────────────────────────────────────────
    // Label encoding
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn encoding_is_a_sorted_bijection(values in prop::collection::vec(direction(), 1..60)) {
        let df = df!("WindDir9am" => &values).unwrap();
        let mut encoder = LabelEncoder::new();
        let encoded = encoder.fit_transform(&df, &["WindDir9am"]).unwrap();
        let mapping = encoder.mapping("WindDir9am").unwrap();

        let distinct: Vec<String> = values.iter().cloned().collect::<BTreeSet<_>>().into_iter().collect();
        prop_assert_eq!(mapping.classes(), distinct.as_slice());

        let codes = encoded.column("WindDir9am").unwrap().i64().unwrap();
        let seen: BTreeSet<i64> = codes.into_iter().flatten().collect();
        let expected: BTreeSet<i64> = (0..distinct.len() as i64).collect();
        prop_assert_eq!(seen, expected);

        for (code, original) in codes.into_iter().zip(values.iter()) {
            prop_assert_eq!(mapping.decode(code.unwrap()), Some(original.as_str()));
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Splitting
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn split_partitions_every_row(
        n in 2usize..300,
        test_size in 0.05f64..0.95,
        seed in any::<u64>(),
    ) {
        let splitter = TrainTestSplitter::default()
            .with_test_size(test_size)
            .with_random_state(seed);
        let sizes = splitter.split_sizes(n);
        prop_assume!(sizes.is_ok());
        let (n_train, n_test) = sizes.unwrap();

        prop_assert_eq!(n_test, (test_size * n as f64).ceil() as usize);
        prop_assert_eq!(n_train + n_test, n);

        let split = splitter.split_indices(n).unwrap();
        let train: BTreeSet<usize> = split.train_indices.iter().copied().collect();
        let test: BTreeSet<usize> = split.test_indices.iter().copied().collect();
        prop_assert_eq!(train.len(), n_train);
        prop_assert_eq!(test.len(), n_test);
        prop_assert!(train.is_disjoint(&test));
        prop_assert_eq!(train.union(&test).count(), n);

        prop_assert_eq!(splitter.split_indices(n).unwrap(), split);
    }

    #[test]
    fn split_keeps_features_and_labels_aligned(n in 5u32..120, seed in any::<u64>()) {
        let index: Vec<u32> = (0..n).collect();
        let feature: Vec<i64> = (0..n as i64).map(|i| i * 10).collect();
        let label: Vec<i64> = (0..n as i64).map(|i| i * 10 + 1).collect();
        let df = df!(
            ROW_INDEX_COLUMN => &index,
            "Humidity3pm" => &feature,
            "RainTomorrow" => &label
        )
        .unwrap();

        let artifacts = TrainTestSplitter::default()
            .with_random_state(seed)
            .split(&df)
            .unwrap();

        prop_assert_eq!(&artifacts.x_train.index, &artifacts.y_train.index);
        prop_assert_eq!(&artifacts.x_test.index, &artifacts.y_test.index);

        let x = artifacts.x_train.to_dataframe().unwrap();
        let y = artifacts.y_train.to_dataframe().unwrap();
        let features = x.column("Humidity3pm").unwrap().i64().unwrap();
        let labels = y.column("RainTomorrow").unwrap().i64().unwrap();
        for ((row, f), l) in artifacts.x_train.index.iter().zip(features.into_iter()).zip(labels.into_iter()) {
            prop_assert_eq!(f, Some(*row as i64 * 10));
            prop_assert_eq!(l, Some(*row as i64 * 10 + 1));
        }
    }
}
