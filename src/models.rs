use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{LensError, Result};

/// One purchase as the upstream store returns it and as the artifact stores it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PurchaseRow {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    #[serde(default)]
    pub merchant_id: Option<String>,
    #[serde(default)]
    pub payer_id: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub purchase_date: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub medium: Option<String>,
    #[serde(default)]
    pub merchant_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// A validated purchase event. Identifiers and free text stay in the artifact only.
#[derive(Debug, Clone)]
pub struct TransactionRecord {
    /// `None` when upstream has no category; such rows never reach training.
    pub category: Option<String>,
    pub amount: f64,
    /// Wall-clock time as written by the store, offset dropped.
    pub purchased_at: NaiveDateTime,
    pub kind: String,
    pub status: String,
    pub medium: String,
    pub merchant_name: String,
}

fn required(value: Option<String>, line: u64, field: &str) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(LensError::MalformedRecord {
            line,
            field: field.to_string(),
            reason: "missing value".to_string(),
        }),
    }
}

/// Parse the timestamp forms the store emits: RFC 3339, naive date-time, or a bare date.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

impl TransactionRecord {
    /// Validate a boundary row. `line` is used only for error reporting.
    pub fn from_row(row: PurchaseRow, line: u64) -> Result<Self> {
        let raw_date = required(row.purchase_date, line, "purchase_date")?;
        let purchased_at = parse_timestamp(&raw_date).ok_or_else(|| LensError::MalformedRecord {
            line,
            field: "purchase_date".to_string(),
            reason: format!("unparsable date '{raw_date}'"),
        })?;

        let amount = row.amount.ok_or_else(|| LensError::MalformedRecord {
            line,
            field: "amount".to_string(),
            reason: "missing value".to_string(),
        })?;
        if !amount.is_finite() {
            return Err(LensError::MalformedRecord {
                line,
                field: "amount".to_string(),
                reason: format!("non-finite amount {amount}"),
            });
        }

        let category = row
            .category
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        Ok(Self {
            category,
            amount,
            purchased_at,
            kind: required(row.kind, line, "type")?,
            status: required(row.status, line, "status")?,
            medium: required(row.medium, line, "medium")?,
            merchant_name: required(row.merchant_name, line, "merchant_name")?,
        })
    }
}
