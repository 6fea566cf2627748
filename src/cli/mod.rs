pub mod extract;
pub mod report;
pub mod run;
pub mod status;
pub mod train;

use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::config::StoreConfig;
use crate::error::{AtStage, Stage, StageError};
use crate::settings::{load_settings, Settings};
use crate::store::RestStore;
use crate::trainer::TrainConfig;

#[derive(Parser)]
#[command(
    name = "ledgerlens",
    about = "Predict purchase categories from a customer's transaction history."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Extract, build features, train and report (the default).
    Run,
    /// Fetch the customer's purchases and overwrite the CSV artifact.
    Extract,
    /// Build features from the existing artifact, train and report.
    Train,
    /// Show settings, credentials and artifact details.
    Status,
}

pub(crate) fn checked_settings() -> Result<Settings, StageError> {
    let settings = load_settings();
    settings.validate().at(Stage::Config)?;
    Ok(settings)
}

pub(crate) fn train_config(settings: &Settings) -> TrainConfig {
    TrainConfig {
        train_ratio: settings.train_ratio,
        seed: settings.seed,
        booster: settings.booster.clone(),
    }
}

pub(crate) fn connect(settings: &Settings) -> Result<(StoreConfig, RestStore), StageError> {
    let config = StoreConfig::from_env().at(Stage::Config)?;
    let store = RestStore::new(&config, Duration::from_secs(settings.timeout_secs)).at(Stage::Config)?;
    Ok((config, store))
}
