use crate::error::StageError;
use crate::extractor::ExtractSummary;
use crate::fmt::{money, short_hash};
use crate::pipeline::extract_stage;
use crate::settings::Settings;

pub fn run() -> Result<(), StageError> {
    let settings = super::checked_settings()?;
    extract(&settings)?;
    Ok(())
}

pub(crate) fn extract(settings: &Settings) -> Result<ExtractSummary, StageError> {
    let (config, store) = super::connect(settings)?;
    let artifact = settings.artifact_path();

    println!("Fetching purchases for customer {}...", config.customer_id);
    let summary = extract_stage(&store, &config.customer_id, &artifact)?;

    println!(
        "{} purchases ({} total) written to {}",
        summary.rows,
        money(summary.total_amount),
        summary.path.display()
    );
    if summary.uncategorized > 0 {
        println!("{} without a category (excluded from training)", summary.uncategorized);
    }
    println!("SHA-256: {}", short_hash(&summary.checksum));
    Ok(summary)
}
