use crate::booster::Booster;
use crate::error::Result;
use crate::features::{Dataset, OneHotEncoder};
use crate::report::ClassificationReport;
use crate::settings::BoosterParams;
use crate::split::{stratified_split, Split};

#[derive(Debug, Clone)]
pub struct TrainConfig {
    pub train_ratio: f64,
    pub seed: u64,
    pub booster: BoosterParams,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            train_ratio: 0.8,
            seed: 42,
            booster: BoosterParams::default(),
        }
    }
}

pub struct Evaluation {
    pub report: ClassificationReport,
    pub split: Split,
    pub feature_columns: Vec<String>,
}

/// Split, fit the one-hot block and the booster on the training rows, score the rest.
pub fn train_and_evaluate(dataset: &Dataset, config: &TrainConfig) -> Result<Evaluation> {
    let target = dataset.targets();
    let split = stratified_split(&target, &dataset.encoding, config.train_ratio, config.seed)?;

    let train_rows: Vec<_> = split.train.iter().map(|&i| &dataset.examples[i]).collect();
    let eval_rows: Vec<_> = split.eval.iter().map(|&i| &dataset.examples[i]).collect();

    let encoder = OneHotEncoder::fit(train_rows.iter().copied());
    let x_train = encoder.transform(train_rows.iter().copied())?;
    let x_eval = encoder.transform(eval_rows.iter().copied())?;
    let y_train: Vec<usize> = split.train.iter().map(|&i| target[i]).collect();
    let y_eval: Vec<usize> = split.eval.iter().map(|&i| target[i]).collect();

    tracing::info!(
        train_rows = x_train.n_rows(),
        eval_rows = x_eval.n_rows(),
        features = x_train.n_cols(),
        classes = dataset.encoding.len(),
        "Training booster"
    );

    let model = Booster::fit(&x_train, &y_train, dataset.encoding.len(), &config.booster)?;
    let predicted = model.predict(&x_eval)?;
    let report = ClassificationReport::compute(&y_eval, &predicted, &dataset.encoding)?;

    tracing::info!(accuracy = report.accuracy, "Evaluation complete");
    Ok(Evaluation {
        report,
        split,
        feature_columns: encoder.columns(),
    })
}
