use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{LensError, Result};

/// Tunables for the gradient-boosted classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoosterParams {
    #[serde(default = "default_rounds")]
    pub rounds: usize,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    #[serde(default = "default_min_child_weight")]
    pub min_child_weight: f64,
    #[serde(default = "default_lambda")]
    pub lambda: f64,
}

fn default_rounds() -> usize {
    50
}

fn default_learning_rate() -> f64 {
    0.3
}

fn default_max_depth() -> usize {
    4
}

fn default_min_child_weight() -> f64 {
    1.0
}

fn default_lambda() -> f64 {
    1.0
}

impl Default for BoosterParams {
    fn default() -> Self {
        Self {
            rounds: default_rounds(),
            learning_rate: default_learning_rate(),
            max_depth: default_max_depth(),
            min_child_weight: default_min_child_weight(),
            lambda: default_lambda(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_data_dir_string")]
    pub data_dir: String,
    #[serde(default = "default_artifact_file")]
    pub artifact_file: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_train_ratio")]
    pub train_ratio: f64,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default)]
    pub booster: BoosterParams,
}

fn default_artifact_file() -> String {
    "purchases.csv".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_train_ratio() -> f64 {
    0.8
}

fn default_seed() -> u64 {
    42
}

fn default_data_dir_string() -> String {
    default_data_dir().to_string_lossy().to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir_string(),
            artifact_file: default_artifact_file(),
            timeout_secs: default_timeout_secs(),
            train_ratio: default_train_ratio(),
            seed: default_seed(),
            booster: BoosterParams::default(),
        }
    }
}

impl Settings {
    pub fn artifact_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(&self.artifact_file)
    }

    /// Reject values the trainer cannot work with.
    pub fn validate(&self) -> Result<()> {
        if !(self.train_ratio > 0.0 && self.train_ratio < 1.0) {
            return Err(LensError::Settings(format!(
                "train_ratio must be between 0 and 1 (exclusive), got {}",
                self.train_ratio
            )));
        }
        if self.booster.rounds == 0 {
            return Err(LensError::Settings("booster.rounds must be at least 1".to_string()));
        }
        if self.booster.learning_rate <= 0.0 {
            return Err(LensError::Settings(format!(
                "booster.learning_rate must be positive, got {}",
                self.booster.learning_rate
            )));
        }
        if self.booster.lambda < 0.0 {
            return Err(LensError::Settings(format!(
                "booster.lambda must not be negative, got {}",
                self.booster.lambda
            )));
        }
        if self.timeout_secs == 0 {
            return Err(LensError::Settings("timeout_secs must be at least 1".to_string()));
        }
        Ok(())
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("ledgerlens")
}

pub fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("ledgerlens")
}

pub fn load_settings() -> Settings {
    let path = settings_path();
    if path.exists() {
        let content = std::fs::read_to_string(&path).unwrap_or_default();
        match serde_json::from_str(&content) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable settings file");
                Settings::default()
            }
        }
    } else {
        Settings::default()
    }
}
