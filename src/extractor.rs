use std::path::{Path, PathBuf};

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::{LensError, Result};
use crate::models::{PurchaseRow, TransactionRecord};
use crate::store::{PurchaseStore, RawObject};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub fn compute_checksum(file_path: &Path) -> Result<String> {
    let data = std::fs::read(file_path)?;
    let mut hasher = Sha256::new();
    hasher.update(&data);
    Ok(hex::encode(hasher.finalize()))
}

fn cell(value: Option<&Value>) -> Result<String> {
    Ok(match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(nested) => serde_json::to_string(nested)?,
    })
}

/// Run every upstream object through the boundary schema before anything is written.
fn validate(objects: &[RawObject]) -> Result<Vec<TransactionRecord>> {
    objects
        .iter()
        .enumerate()
        .map(|(i, obj)| {
            // Artifact line numbers: header is line 1.
            let line = i as u64 + 2;
            let row: PurchaseRow = serde_json::from_value(Value::Object(obj.clone())).map_err(|e| {
                LensError::MalformedRecord {
                    line,
                    field: "<object>".to_string(),
                    reason: e.to_string(),
                }
            })?;
            TransactionRecord::from_row(row, line)
        })
        .collect()
}

fn write_artifact(objects: &[RawObject], path: &Path) -> Result<()> {
    let header: Vec<&String> = match objects.first() {
        Some(first) => first.keys().collect(),
        None => return Err(LensError::EmptyResult("nothing to write".to_string())),
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(&header)?;
    for obj in objects {
        let record = header
            .iter()
            .map(|key| cell(obj.get(key.as_str())))
            .collect::<Result<Vec<_>>>()?;
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// extract
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct ExtractSummary {
    pub rows: usize,
    pub uncategorized: usize,
    pub total_amount: f64,
    pub path: PathBuf,
    pub checksum: String,
}

/// Fetch a customer's purchases and overwrite the artifact at `path` with them.
pub fn extract(store: &dyn PurchaseStore, customer_id: &str, path: &Path) -> Result<ExtractSummary> {
    if customer_id.trim().is_empty() {
        return Err(LensError::Config("customer id must not be empty".to_string()));
    }

    let objects = store.fetch_purchases(customer_id)?;
    if objects.is_empty() {
        return Err(LensError::EmptyResult(format!(
            "store returned no purchases for customer {customer_id}"
        )));
    }

    let records = validate(&objects)?;
    write_artifact(&objects, path)?;
    let checksum = compute_checksum(path)?;

    let summary = ExtractSummary {
        rows: records.len(),
        uncategorized: records.iter().filter(|r| r.category.is_none()).count(),
        total_amount: records.iter().map(|r| r.amount).sum(),
        path: path.to_path_buf(),
        checksum,
    };
    tracing::info!(
        rows = summary.rows,
        path = %summary.path.display(),
        checksum = %summary.checksum,
        "Artifact written"
    );
    Ok(summary)
}

// ---------------------------------------------------------------------------
// Artifact loading
// ---------------------------------------------------------------------------

/// Read the artifact back as validated records, in file order.
pub fn load_artifact(path: &Path) -> Result<Vec<TransactionRecord>> {
    if !path.exists() {
        return Err(LensError::ArtifactMissing(path.to_path_buf()));
    }

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)?;

    let mut records = Vec::new();
    for (i, result) in rdr.deserialize::<PurchaseRow>().enumerate() {
        let line = i as u64 + 2;
        let row = result.map_err(|e| LensError::MalformedRecord {
            line: e.position().map(|p| p.line()).unwrap_or(line),
            field: "<row>".to_string(),
            reason: e.to_string(),
        })?;
        records.push(TransactionRecord::from_row(row, line)?);
    }

    if records.is_empty() {
        return Err(LensError::EmptyResult(format!(
            "artifact {} has no rows",
            path.display()
        )));
    }
    Ok(records)
}
