use crate::config::credential_presence;
use crate::error::{AtStage, Stage, StageError};
use crate::extractor::{compute_checksum, load_artifact};
use crate::features::build;
use crate::fmt::short_hash;
use crate::settings::{load_settings, settings_path};
use crate::split::MIN_SAMPLES_PER_CLASS;

pub fn run() -> Result<(), StageError> {
    let settings = load_settings();
    let artifact = settings.artifact_path();

    println!("Settings:   {}", settings_path().display());
    println!("Data dir:   {}", settings.data_dir);
    println!("Artifact:   {}", artifact.display());
    println!(
        "Split:      {:.0}% train, seed {}",
        settings.train_ratio * 100.0,
        settings.seed
    );
    println!(
        "Booster:    {} rounds, learning rate {}, max depth {}",
        settings.booster.rounds, settings.booster.learning_rate, settings.booster.max_depth
    );

    println!();
    for (key, set) in credential_presence() {
        println!("{key:<22} {}", if set { "set" } else { "(not set)" });
    }

    println!();
    if artifact.exists() {
        let records = load_artifact(&artifact).at(Stage::Features)?;
        let checksum = compute_checksum(&artifact).at(Stage::Features)?;
        let uncategorized = records.iter().filter(|r| r.category.is_none()).count();
        println!("Rows:           {}", records.len());
        println!("Uncategorized:  {uncategorized}");
        println!("SHA-256:        {}", short_hash(&checksum));

        let features = build(&records).at(Stage::Features)?;
        println!("Features:       {} columns", features.matrix.columns().len());
        let mut counts = vec![0usize; features.encoding.len()];
        for &label in &features.target {
            counts[label] += 1;
        }
        println!();
        for (name, n) in features.encoding.classes().iter().zip(counts) {
            let note = if n < MIN_SAMPLES_PER_CLASS { "  (too few to split)" } else { "" };
            println!("  {name:<24} {n}{note}");
        }
    } else {
        println!("Artifact not found. Run `ledgerlens extract` to create it.");
    }
    Ok(())
}
