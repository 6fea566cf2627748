use serde::Serialize;

use crate::error::{LensError, Result};
use crate::features::LabelEncoding;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassMetrics {
    pub category: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Averages {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationReport {
    pub accuracy: f64,
    pub classes: Vec<ClassMetrics>,
    pub macro_avg: Averages,
    pub weighted_avg: Averages,
    pub support: usize,
    /// `confusion[actual][predicted]`, indexed by class code.
    pub confusion: Vec<Vec<usize>>,
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

fn f1(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}

impl ClassificationReport {
    pub fn compute(actual: &[usize], predicted: &[usize], encoding: &LabelEncoding) -> Result<Self> {
        if actual.len() != predicted.len() {
            return Err(LensError::Model(format!(
                "{} labels but {} predictions",
                actual.len(),
                predicted.len()
            )));
        }
        if actual.is_empty() {
            return Err(LensError::EmptyResult("nothing to evaluate".to_string()));
        }

        let k = encoding.len();
        let mut confusion = vec![vec![0usize; k]; k];
        for (&a, &p) in actual.iter().zip(predicted) {
            if a >= k || p >= k {
                return Err(LensError::Model(format!(
                    "class code out of range ({a} / {p}) for {k} classes"
                )));
            }
            confusion[a][p] += 1;
        }

        let classes: Vec<ClassMetrics> = (0..k)
            .map(|c| {
                let tp = confusion[c][c];
                let predicted_c: usize = confusion.iter().map(|row| row[c]).sum();
                let support: usize = confusion[c].iter().sum();
                let precision = ratio(tp, predicted_c);
                let recall = ratio(tp, support);
                ClassMetrics {
                    category: encoding.decode(c).unwrap_or_default().to_string(),
                    precision,
                    recall,
                    f1: f1(precision, recall),
                    support,
                }
            })
            .collect();

        let correct: usize = (0..k).map(|c| confusion[c][c]).sum();
        let total = actual.len();

        let macro_avg = Averages {
            precision: classes.iter().map(|c| c.precision).sum::<f64>() / k as f64,
            recall: classes.iter().map(|c| c.recall).sum::<f64>() / k as f64,
            f1: classes.iter().map(|c| c.f1).sum::<f64>() / k as f64,
        };
        let weighted = |metric: fn(&ClassMetrics) -> f64| {
            classes
                .iter()
                .map(|c| metric(c) * c.support as f64)
                .sum::<f64>()
                / total as f64
        };
        let weighted_avg = Averages {
            precision: weighted(|c| c.precision),
            recall: weighted(|c| c.recall),
            f1: weighted(|c| c.f1),
        };

        Ok(Self {
            accuracy: ratio(correct, total),
            classes,
            macro_avg,
            weighted_avg,
            support: total,
            confusion,
        })
    }
}
