use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::{LensError, Result};
use crate::features::LabelEncoding;

/// Fewest examples a class may have and still be split. With two, a
/// single example would land in evaluation and leave one for training,
/// so the threshold sits one above that.
pub const MIN_SAMPLES_PER_CLASS: usize = 3;

/// Row indices for each partition, ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub eval: Vec<usize>,
}

/// Evaluation share for a class of `n` examples; at least one row on each side.
pub fn eval_count(n: usize, train_ratio: f64) -> usize {
    let raw = (n as f64 * (1.0 - train_ratio)).round() as usize;
    raw.clamp(1, n.saturating_sub(1).max(1))
}

/// Stratified random split: each class keeps its proportion in both partitions.
pub fn stratified_split(
    target: &[usize],
    encoding: &LabelEncoding,
    train_ratio: f64,
    seed: u64,
) -> Result<Split> {
    if !(train_ratio > 0.0 && train_ratio < 1.0) {
        return Err(LensError::Settings(format!(
            "train ratio must be between 0 and 1, got {train_ratio}"
        )));
    }
    if encoding.len() < 2 {
        return Err(LensError::InsufficientClasses(encoding.len()));
    }

    let mut members: Vec<Vec<usize>> = vec![Vec::new(); encoding.len()];
    for (row, &label) in target.iter().enumerate() {
        let bucket = members
            .get_mut(label)
            .ok_or_else(|| LensError::Model(format!("label {label} outside encoding")))?;
        bucket.push(row);
    }

    for (code, rows) in members.iter().enumerate() {
        if rows.len() < MIN_SAMPLES_PER_CLASS {
            return Err(LensError::InsufficientClassSamples {
                category: encoding.decode(code).unwrap_or("?").to_string(),
                count: rows.len(),
                required: MIN_SAMPLES_PER_CLASS,
            });
        }
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut split = Split {
        train: Vec::with_capacity(target.len()),
        eval: Vec::new(),
    };
    for mut rows in members {
        rows.shuffle(&mut rng);
        let n_eval = eval_count(rows.len(), train_ratio);
        split.eval.extend_from_slice(&rows[..n_eval]);
        split.train.extend_from_slice(&rows[n_eval..]);
    }
    split.train.sort_unstable();
    split.eval.sort_unstable();
    Ok(split)
}
