//! Turns validated purchase records into a numeric model input.
//!
//! Calendar fields come from the purchase timestamp (day of week counts
//! from Monday = 0). Identifier and free-text fields never make it into
//! the matrix. The four categorical fields are one-hot encoded with the
//! lexicographically smallest observed value dropped as the reference
//! level, so a field with k observed values yields k - 1 columns.

use std::collections::{BTreeSet, HashMap};

use chrono::{Datelike, NaiveDateTime};

use crate::error::{LensError, Result};
use crate::models::TransactionRecord;

/// Numeric columns that precede the one-hot block, in matrix order.
pub const NUMERIC_COLUMNS: [&str; 4] = ["month", "day", "day_of_week", "amount"];

/// One-hot encoded fields, in matrix order.
pub const CATEGORICAL_FIELDS: [&str; 4] = ["type", "status", "medium", "merchant_name"];

// ---------------------------------------------------------------------------
// Label encoding
// ---------------------------------------------------------------------------

/// Category string <-> class code. Codes follow lexicographic order.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelEncoding {
    classes: Vec<String>,
    index: HashMap<String, usize>,
}

impl LabelEncoding {
    pub fn fit<'a, I>(categories: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let distinct: BTreeSet<&str> = categories.into_iter().collect();
        let classes: Vec<String> = distinct.into_iter().map(str::to_string).collect();
        let index = classes
            .iter()
            .enumerate()
            .map(|(code, name)| (name.clone(), code))
            .collect();
        Self { classes, index }
    }

    pub fn encode(&self, category: &str) -> Option<usize> {
        self.index.get(category).copied()
    }

    pub fn decode(&self, code: usize) -> Option<&str> {
        self.classes.get(code).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }
}

// ---------------------------------------------------------------------------
// Feature matrix
// ---------------------------------------------------------------------------

/// Dense row-major matrix with named columns.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    columns: Vec<String>,
    data: Vec<f64>,
    n_rows: usize,
}

impl FeatureMatrix {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            data: Vec::new(),
            n_rows: 0,
        }
    }

    pub fn push_row(&mut self, row: &[f64]) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(LensError::Model(format!(
                "row has {} values, matrix has {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        self.data.extend_from_slice(row);
        self.n_rows += 1;
        Ok(())
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn row(&self, i: usize) -> &[f64] {
        let width = self.columns.len();
        &self.data[i * width..(i + 1) * width]
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.columns.len() + j]
    }
}

// ---------------------------------------------------------------------------
// prepare: calendar features, label encoding, column drops
// ---------------------------------------------------------------------------

/// One training example before one-hot encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct Example {
    pub numeric: [f64; 4],
    pub categorical: [String; 4],
    pub label: usize,
}

fn calendar(ts: &NaiveDateTime) -> [f64; 3] {
    [
        ts.month() as f64,
        ts.day() as f64,
        ts.weekday().num_days_from_monday() as f64,
    ]
}

#[derive(Debug, Clone)]
pub struct Dataset {
    pub examples: Vec<Example>,
    pub encoding: LabelEncoding,
    /// Rows left out because upstream had no category for them.
    pub excluded: usize,
}

impl Dataset {
    pub fn targets(&self) -> Vec<usize> {
        self.examples.iter().map(|e| e.label).collect()
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }
}

pub fn prepare(records: &[TransactionRecord]) -> Result<Dataset> {
    let labelled: Vec<&TransactionRecord> =
        records.iter().filter(|r| r.category.is_some()).collect();
    let excluded = records.len() - labelled.len();
    if excluded > 0 {
        tracing::warn!(excluded, "Excluding rows without a category");
    }
    if labelled.is_empty() {
        return Err(LensError::EmptyResult(
            "no rows with a category to train on".to_string(),
        ));
    }

    let encoding = LabelEncoding::fit(labelled.iter().filter_map(|r| r.category.as_deref()));

    let examples = labelled
        .iter()
        .map(|r| {
            let [month, day, dow] = calendar(&r.purchased_at);
            let label = r
                .category
                .as_deref()
                .and_then(|c| encoding.encode(c))
                .ok_or_else(|| LensError::Model("category missing from fitted encoding".to_string()))?;
            Ok(Example {
                numeric: [month, day, dow, r.amount],
                categorical: [
                    r.kind.clone(),
                    r.status.clone(),
                    r.medium.clone(),
                    r.merchant_name.clone(),
                ],
                label,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Dataset {
        examples,
        encoding,
        excluded,
    })
}

// ---------------------------------------------------------------------------
// One-hot encoding
// ---------------------------------------------------------------------------

/// Indicator columns per categorical field, fixed at fit time.
#[derive(Debug, Clone, PartialEq)]
pub struct OneHotEncoder {
    /// Kept values per field, sorted; the reference level is not listed.
    levels: [Vec<String>; 4],
}

impl OneHotEncoder {
    pub fn fit<'a, I>(examples: I) -> Self
    where
        I: IntoIterator<Item = &'a Example>,
    {
        let mut seen: [BTreeSet<&str>; 4] = Default::default();
        for e in examples {
            for (field, value) in e.categorical.iter().enumerate() {
                seen[field].insert(value.as_str());
            }
        }
        let levels: [Vec<String>; 4] = seen.map(|values| {
            values
                .into_iter()
                .skip(1) // reference level
                .map(str::to_string)
                .collect()
        });
        Self { levels }
    }

    pub fn columns(&self) -> Vec<String> {
        let mut cols: Vec<String> = NUMERIC_COLUMNS.iter().map(|c| c.to_string()).collect();
        for (field, values) in CATEGORICAL_FIELDS.iter().zip(&self.levels) {
            cols.extend(values.iter().map(|v| format!("{field}={v}")));
        }
        cols
    }

    /// Encode rows; unseen values leave their whole group at zero.
    pub fn transform<'a, I>(&self, examples: I) -> Result<FeatureMatrix>
    where
        I: IntoIterator<Item = &'a Example>,
    {
        let mut matrix = FeatureMatrix::new(self.columns());
        let mut row = Vec::with_capacity(matrix.n_cols());
        for e in examples {
            row.clear();
            row.extend_from_slice(&e.numeric);
            for (values, value) in self.levels.iter().zip(&e.categorical) {
                row.extend(values.iter().map(|v| if v == value { 1.0 } else { 0.0 }));
            }
            matrix.push_row(&row)?;
        }
        Ok(matrix)
    }
}

/// Whole-table feature build: matrix, targets and encoding for every labelled row.
#[derive(Debug, Clone)]
pub struct FeatureSet {
    pub matrix: FeatureMatrix,
    pub target: Vec<usize>,
    pub encoding: LabelEncoding,
}

pub fn build(records: &[TransactionRecord]) -> Result<FeatureSet> {
    let dataset = prepare(records)?;
    let encoder = OneHotEncoder::fit(&dataset.examples);
    let matrix = encoder.transform(&dataset.examples)?;
    Ok(FeatureSet {
        matrix,
        target: dataset.targets(),
        encoding: dataset.encoding,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::parse_timestamp;

    pub(crate) fn record(category: &str, medium: &str, merchant: &str, date: &str) -> TransactionRecord {
        TransactionRecord {
            category: Some(category.to_string()).filter(|c| !c.is_empty()),
            amount: 10.0,
            purchased_at: parse_timestamp(date).unwrap(),
            kind: "merchant".to_string(),
            status: "completed".to_string(),
            medium: medium.to_string(),
            merchant_name: merchant.to_string(),
        }
    }

    #[test]
    fn test_label_encoding_is_sorted_bijection() {
        let enc = LabelEncoding::fit(["travel", "food", "bills", "food"]);
        assert_eq!(enc.len(), 3);
        assert_eq!(enc.classes(), &["bills", "food", "travel"]);
        for code in 0..enc.len() {
            let name = enc.decode(code).unwrap();
            assert_eq!(enc.encode(name), Some(code));
        }
        assert_eq!(enc.encode("rent"), None);
        assert_eq!(enc.decode(3), None);
    }

    #[test]
    fn test_calendar_features_monday_zero() {
        // 2025-03-10 is a Monday, 2025-03-16 a Sunday.
        let recs = vec![
            record("food", "balance", "A", "2025-03-10"),
            record("food", "balance", "A", "2025-03-16T18:00:00"),
        ];
        let ds = prepare(&recs).unwrap();
        assert_eq!(ds.examples[0].numeric, [3.0, 10.0, 0.0, 10.0]);
        assert_eq!(ds.examples[1].numeric[2], 6.0);
    }

    #[test]
    fn test_calendar_features_use_stated_date_across_offsets() {
        // Friday late evening in UTC-5 is already Saturday in UTC.
        let recs = vec![
            record("food", "balance", "A", "2025-03-14T23:30:00-05:00"),
            record("food", "balance", "A", "2025-03-17T00:30:00+02:00"),
        ];
        let ds = prepare(&recs).unwrap();
        assert_eq!(ds.examples[0].numeric[..3], [3.0, 14.0, 4.0]);
        assert_eq!(ds.examples[1].numeric[..3], [3.0, 17.0, 0.0]);
    }

    #[test]
    fn test_k_values_yield_k_minus_one_columns() {
        let recs = vec![
            record("food", "balance", "Zed", "2025-01-01"),
            record("food", "rewards", "Alpha", "2025-01-02"),
            record("bills", "balance", "Mid", "2025-01-03"),
            record("bills", "balance", "Alpha", "2025-01-04"),
        ];
        let fs = build(&recs).unwrap();
        // numeric 4 + type 0 + status 0 + medium 1 + merchant 2
        assert_eq!(fs.matrix.n_cols(), 7);
        assert_eq!(
            &fs.matrix.columns()[4..],
            &["medium=rewards", "merchant_name=Mid", "merchant_name=Zed"]
        );
        assert_eq!(fs.matrix.row(0)[4..], [0.0, 0.0, 1.0]);
        assert_eq!(fs.matrix.row(1)[4..], [1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_single_medium_value_yields_no_columns() {
        let recs: Vec<_> = (0..100)
            .map(|i| record(if i % 2 == 0 { "food" } else { "bills" }, "balance", "Shop", "2025-05-05"))
            .collect();
        let ds = prepare(&recs).unwrap();
        let enc = OneHotEncoder::fit(&ds.examples);
        assert!(!enc.columns().iter().any(|c| c.starts_with("medium=")));
        let m = enc.transform(&ds.examples).unwrap();
        assert_eq!(m.n_rows(), 100);
    }

    #[test]
    fn test_unseen_value_encodes_as_zero_group() {
        let train = prepare(&[
            record("food", "balance", "A", "2025-01-01"),
            record("food", "rewards", "B", "2025-01-01"),
        ])
        .unwrap();
        let enc = OneHotEncoder::fit(&train.examples);
        let eval = prepare(&[record("food", "points", "C", "2025-01-01")]).unwrap();
        let m = enc.transform(&eval.examples).unwrap();
        // columns: numeric(4), medium=rewards, merchant_name=B
        assert_eq!(m.n_cols(), 6);
        assert_eq!(m.row(0)[4..], [0.0, 0.0]);
    }

    #[test]
    fn test_uncategorized_rows_excluded_and_counted() {
        let recs = vec![
            record("food", "balance", "A", "2025-01-01"),
            record("", "balance", "A", "2025-01-01"),
            record("bills", "balance", "A", "2025-01-01"),
        ];
        let ds = prepare(&recs).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.excluded, 1);
        assert_eq!(ds.targets(), vec![1, 0]);
    }

    #[test]
    fn test_all_uncategorized_is_empty_result() {
        let recs = vec![record("", "balance", "A", "2025-01-01")];
        assert!(matches!(prepare(&recs), Err(LensError::EmptyResult(_))));
    }

    #[test]
    fn test_matrix_rejects_ragged_row() {
        let mut m = FeatureMatrix::new(vec!["a".to_string(), "b".to_string()]);
        assert!(m.push_row(&[1.0]).is_err());
        m.push_row(&[1.0, 2.0]).unwrap();
        assert_eq!(m.get(0, 1), 2.0);
    }
}
