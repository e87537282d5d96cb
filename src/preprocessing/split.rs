//! Stratified train/test partitioning

use crate::error::{PipelineError, Result};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Row indices of a single train/test partition, each list ascending
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainTestSplit {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
}

/// Split rows so each class keeps its share of the whole in both partitions.
///
/// The test partition holds `ceil(n * test_size)` rows. Each class contributes
/// its proportional share (largest remainder), never all and never none of its
/// rows. Shuffling within each class uses one RNG seeded with `seed`, visiting
/// classes in ascending label order.
pub fn stratified_split(y: &[f64], test_size: f64, seed: u64) -> Result<TrainTestSplit> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(PipelineError::InvalidParameter {
            name: "test_size".to_string(),
            value: test_size.to_string(),
            reason: "must be in (0, 1)".to_string(),
        });
    }

    let mut by_class: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
    for (idx, &label) in y.iter().enumerate() {
        by_class.entry(label.round() as i64).or_default().push(idx);
    }

    if by_class.len() < 2 {
        return Err(PipelineError::InsufficientData(format!(
            "stratified split needs at least 2 classes, found {}",
            by_class.len()
        )));
    }
    if let Some((class, rows)) = by_class.iter().find(|(_, rows)| rows.len() < 2) {
        return Err(PipelineError::InsufficientData(format!(
            "class {} has only {} row(s), need at least 2",
            class,
            rows.len()
        )));
    }

    let n = y.len();
    let n_classes = by_class.len();
    let n_test = (n as f64 * test_size).ceil() as usize;
    let n_train = n - n_test;
    if n_test < n_classes || n_train < n_classes {
        return Err(PipelineError::InsufficientData(format!(
            "{} rows cannot hold every class in both partitions at test_size {}",
            n, test_size
        )));
    }

    let counts: Vec<usize> = by_class.values().map(Vec::len).collect();
    let allocation = allocate_test_counts(&counts, n_test);

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut train_indices = Vec::with_capacity(n_train);
    let mut test_indices = Vec::with_capacity(n_test);
    for (rows, &k) in by_class.values().zip(allocation.iter()) {
        let mut shuffled = rows.clone();
        shuffled.shuffle(&mut rng);
        test_indices.extend_from_slice(&shuffled[..k]);
        train_indices.extend_from_slice(&shuffled[k..]);
    }

    train_indices.sort_unstable();
    test_indices.sort_unstable();

    Ok(TrainTestSplit {
        train_indices,
        test_indices,
    })
}

/// Per-class test counts summing to `n_test`, each in `1..count`
fn allocate_test_counts(counts: &[usize], n_test: usize) -> Vec<usize> {
    let n: usize = counts.iter().sum();
    let exact: Vec<f64> = counts
        .iter()
        .map(|&c| c as f64 * n_test as f64 / n as f64)
        .collect();

    let mut alloc: Vec<usize> = exact.iter().map(|e| e.floor() as usize).collect();

    let mut order: Vec<usize> = (0..counts.len()).collect();
    order.sort_by(|&a, &b| {
        let ra = exact[a] - exact[a].floor();
        let rb = exact[b] - exact[b].floor();
        rb.partial_cmp(&ra).unwrap_or(std::cmp::Ordering::Equal)
    });
    let mut remaining = n_test - alloc.iter().sum::<usize>();
    for &i in order.iter().cycle() {
        if remaining == 0 {
            break;
        }
        alloc[i] += 1;
        remaining -= 1;
    }

    for (a, &c) in alloc.iter_mut().zip(counts) {
        *a = (*a).clamp(1, c - 1);
    }

    // Clamping can move the total; shift rows between classes until it matches again.
    loop {
        let total: usize = alloc.iter().sum();
        if total == n_test {
            break;
        }
        if total > n_test {
            let i = (0..alloc.len())
                .filter(|&i| alloc[i] > 1)
                .max_by(|&a, &b| {
                    (alloc[a] as f64 - exact[a])
                        .partial_cmp(&(alloc[b] as f64 - exact[b]))
                        .unwrap_or(std::cmp::Ordering::Equal)
                });
            match i {
                Some(i) => alloc[i] -= 1,
                None => break,
            }
        } else {
            let i = (0..alloc.len())
                .filter(|&i| alloc[i] + 1 < counts[i])
                .max_by(|&a, &b| {
                    (exact[a] - alloc[a] as f64)
                        .partial_cmp(&(exact[b] - alloc[b] as f64))
                        .unwrap_or(std::cmp::Ordering::Equal)
                });
            match i {
                Some(i) => alloc[i] += 1,
                None => break,
            }
        }
    }

    alloc
}
