use colored::Colorize;

use crate::cli::report::{format_json, format_report};
use crate::error::{AtStage, Stage, StageError};
use crate::fmt::short_hash;
use crate::pipeline::train_stage;
use crate::settings::Settings;

pub fn run() -> Result<(), StageError> {
    let settings = super::checked_settings()?;
    train(&settings)
}

pub(crate) fn train(settings: &Settings) -> Result<(), StageError> {
    let artifact = settings.artifact_path();
    println!("Building features from {}...", artifact.display());

    let run = train_stage(&artifact, &super::train_config(settings))?;
    let eval = &run.evaluation;

    println!(
        "{} rows read (SHA-256 {}), {} excluded without a category",
        run.rows,
        short_hash(&run.checksum),
        run.excluded
    );
    println!(
        "{} features, {} training rows, {} evaluation rows",
        eval.feature_columns.len(),
        eval.split.train.len(),
        eval.split.eval.len()
    );
    println!();
    println!("{}", format_report(&eval.report));
    println!();
    println!("{}", "JSON".bold());
    println!("{}", format_json(&eval.report).at(Stage::Train)?);
    Ok(())
}
