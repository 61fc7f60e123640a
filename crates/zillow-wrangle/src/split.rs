//! Seeded train/validate/test partitioning.
//!
//! Two shuffle splits: the first holds out `test_fraction` of the dataset as
//! test, the second holds out `validate_fraction` of the remainder as validate.
//! Each split shuffles row positions with a fresh `StdRng` seeded from
//! [`SplitConfig::seed`], takes the first `ceil(fraction * n)` positions as the
//! held-out part and the rest, in shuffled order, as the kept part.

use crate::config::SplitConfig;
use crate::error::{Result, WrangleError};
use crate::types::Partitions;
use polars::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::info;

/// Split `df` into train, validate and test partitions.
pub fn split(df: &DataFrame, config: &SplitConfig) -> Result<Partitions<DataFrame>> {
    let (train_validate, test) = shuffle_split(df, config.test_fraction, config.seed)?;
    let (train, validate) = shuffle_split(&train_validate, config.validate_fraction, config.seed)?;

    info!(
        "Split {} rows into train={} validate={} test={}",
        df.height(),
        train.height(),
        validate.height(),
        test.height()
    );

    Ok(Partitions::new(train, validate, test))
}

/// One shuffle split, returning `(kept, held_out)`.
pub fn shuffle_split(df: &DataFrame, fraction: f64, seed: u64) -> Result<(DataFrame, DataFrame)> {
    let n = df.height();
    let n_held = (fraction * n as f64).ceil() as usize;
    if n_held == 0 || n_held >= n {
        return Err(WrangleError::EmptyPartition(format!(
            "cannot hold out {fraction} of {n} rows and keep both sides non-empty"
        )));
    }

    let mut positions: Vec<IdxSize> = (0..n as IdxSize).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    positions.shuffle(&mut rng);

    let (held, kept) = positions.split_at(n_held);
    let held_out = df.take(&IdxCa::from_vec("idx".into(), held.to_vec()))?;
    let kept = df.take(&IdxCa::from_vec("idx".into(), kept.to_vec()))?;
    Ok((kept, held_out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    fn frame(n: usize) -> DataFrame {
        let ids: Vec<i64> = (0..n as i64).collect();
        let values: Vec<f64> = ids.iter().map(|i| *i as f64 * 1.5).collect();
        df!["id" => ids, "value" => values].unwrap()
    }

    fn ids(df: &DataFrame) -> Vec<i64> {
        df.column("id")
            .unwrap()
            .i64()
            .unwrap()
            .into_no_null_iter()
            .collect()
    }

    #[test]
    fn test_split_sizes() {
        let parts = split(&frame(100), &SplitConfig::default()).unwrap();
        assert_eq!(parts.train.height(), 60);
        assert_eq!(parts.validate.height(), 20);
        assert_eq!(parts.test.height(), 20);
    }

    #[test]
    fn test_split_sizes_round_toward_held_out() {
        // 0.2 * 101 = 20.2 -> 21 test rows; 0.25 * 80 = 20 validate rows.
        let parts = split(&frame(101), &SplitConfig::default()).unwrap();
        assert_eq!(parts.test.height(), 21);
        assert_eq!(parts.validate.height(), 20);
        assert_eq!(parts.train.height(), 60);
    }

    #[test]
    fn test_split_is_deterministic() {
        let df = frame(250);
        let first = split(&df, &SplitConfig::default()).unwrap();
        let second = split(&df, &SplitConfig::default()).unwrap();
        assert_eq!(ids(&first.train), ids(&second.train));
        assert_eq!(ids(&first.validate), ids(&second.validate));
        assert_eq!(ids(&first.test), ids(&second.test));
        assert!(first.train.equals(&second.train));
    }

    #[test]
    fn test_split_depends_on_seed() {
        let df = frame(250);
        let a = split(&df, &SplitConfig::default()).unwrap();
        let b = split(
            &df,
            &SplitConfig {
                seed: 7,
                ..SplitConfig::default()
            },
        )
        .unwrap();
        assert_ne!(ids(&a.test), ids(&b.test));
    }

    #[test]
    fn test_partitions_are_disjoint_and_complete() {
        let parts = split(&frame(137), &SplitConfig::default()).unwrap();
        let mut seen = HashSet::new();
        for (_, part) in parts.iter() {
            for id in ids(part) {
                assert!(seen.insert(id), "row {id} appears twice");
            }
        }
        assert_eq!(seen.len(), 137);
    }

    #[test]
    fn test_split_shuffles_rows() {
        let parts = split(&frame(100), &SplitConfig::default()).unwrap();
        let train = ids(&parts.train);
        let mut sorted = train.clone();
        sorted.sort();
        assert_ne!(train, sorted);
    }

    #[test]
    fn test_split_too_small() {
        let err = split(&frame(1), &SplitConfig::default()).unwrap_err();
        assert!(matches!(err, WrangleError::EmptyPartition(_)));

        let err = split(&frame(0), &SplitConfig::default()).unwrap_err();
        assert!(matches!(err, WrangleError::EmptyPartition(_)));
    }
}
