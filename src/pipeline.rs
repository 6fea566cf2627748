use std::path::Path;

use crate::error::{AtStage, Stage, StageError};
use crate::extractor::{self, ExtractSummary};
use crate::features;
use crate::store::PurchaseStore;
use crate::trainer::{self, Evaluation, TrainConfig};

type StageResult<T> = std::result::Result<T, StageError>;

pub struct TrainRun {
    pub rows: usize,
    pub excluded: usize,
    pub checksum: String,
    pub evaluation: Evaluation,
}

pub fn extract_stage(
    store: &dyn PurchaseStore,
    customer_id: &str,
    artifact: &Path,
) -> StageResult<ExtractSummary> {
    tracing::info!(customer_id, "Extracting purchases");
    extractor::extract(store, customer_id, artifact).at(Stage::Extract)
}

/// Read the artifact, build features and run the trainer/evaluator.
pub fn train_stage(artifact: &Path, config: &TrainConfig) -> StageResult<TrainRun> {
    let records = extractor::load_artifact(artifact).at(Stage::Features)?;
    let checksum = extractor::compute_checksum(artifact).at(Stage::Features)?;
    tracing::info!(rows = records.len(), checksum = %checksum, "Artifact loaded");

    let dataset = features::prepare(&records).at(Stage::Features)?;
    tracing::info!(
        labelled = dataset.len(),
        excluded = dataset.excluded,
        classes = dataset.encoding.len(),
        "Features prepared"
    );
    let evaluation = trainer::train_and_evaluate(&dataset, config).at(Stage::Train)?;

    Ok(TrainRun {
        rows: records.len(),
        excluded: dataset.excluded,
        checksum,
        evaluation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LensError;
    use crate::extractor::tests::{purchase, FakeStore};
    use crate::settings::BoosterParams;
    use serde_json::Value;

    fn quick() -> TrainConfig {
        TrainConfig {
            booster: BoosterParams {
                rounds: 5,
                ..BoosterParams::default()
            },
            ..TrainConfig::default()
        }
    }

    fn purchases(counts: &[(&str, usize)]) -> Vec<Value> {
        let mut out = Vec::new();
        for (category, n) in counts {
            for i in 0..*n {
                let mut p = purchase(&format!("{category}-{i}"), category, 10.0 + i as f64, "2025-06-03");
                p["merchant_name"] = Value::String(format!("{category} shop"));
                out.push(p);
            }
        }
        out
    }

    #[test]
    fn test_extract_then_train() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("purchases.csv");
        let store = FakeStore::with(purchases(&[("food", 20), ("travel", 10)]));

        let summary = extract_stage(&store, "cust-1", &path).unwrap();
        let run = train_stage(&path, &quick()).unwrap();
        assert_eq!(run.rows, summary.rows);
        assert_eq!(run.checksum, summary.checksum);
        assert_eq!(run.excluded, 0);
        assert_eq!(run.evaluation.report.support, 6);
    }

    #[test]
    fn test_empty_store_fails_in_extract_stage() {
        let dir = tempfile::tempdir().unwrap();
        let store = FakeStore::with(vec![]);
        let err = extract_stage(&store, "cust-1", &dir.path().join("p.csv")).err().unwrap();
        assert_eq!(err.stage, Stage::Extract);
        assert!(matches!(err.source, LensError::EmptyResult(_)));
    }

    #[test]
    fn test_missing_artifact_fails_in_features_stage() {
        let dir = tempfile::tempdir().unwrap();
        let err = train_stage(&dir.path().join("none.csv"), &quick()).err().unwrap();
        assert_eq!(err.stage, Stage::Features);
        assert!(err.to_string().starts_with("features stage failed"));
    }

    #[test]
    fn test_rare_class_fails_in_train_stage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("purchases.csv");
        let store = FakeStore::with(purchases(&[("food", 50), ("travel", 3), ("bills", 2)]));
        extract_stage(&store, "cust-1", &path).unwrap();
        let err = train_stage(&path, &quick()).err().unwrap();
        assert_eq!(err.stage, Stage::Train);
        assert!(err.to_string().contains("'bills'"));
    }

    #[test]
    fn test_bad_date_fails_in_features_stage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("purchases.csv");
        std::fs::write(
            &path,
            "category,amount,purchase_date,type,status,medium,merchant_name\n\
             food,1.0,not-a-date,merchant,completed,balance,Shop\n",
        )
        .unwrap();
        let err = train_stage(&path, &quick()).err().unwrap();
        assert_eq!(err.stage, Stage::Features);
        assert!(matches!(err.source, LensError::MalformedRecord { line: 2, .. }));
    }
}
