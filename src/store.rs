//! HTTP access to the upstream purchase store.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::{Map, Value};

use crate::config::StoreConfig;
use crate::error::{LensError, Result};

/// One upstream object, keys in the order the store sent them.
pub type RawObject = Map<String, Value>;

/// Source of purchase rows for a customer.
pub trait PurchaseStore {
    fn fetch_purchases(&self, customer_id: &str) -> Result<Vec<RawObject>>;
}

/// Supabase REST endpoint for the `purchase` table.
pub struct RestStore {
    client: Client,
    base_url: String,
}

impl RestStore {
    pub fn new(config: &StoreConfig, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("apikey", header_value(&config.store_key)?);
        headers.insert(
            AUTHORIZATION,
            header_value(&format!("Bearer {}", config.store_key))?,
        );

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: config.store_url.clone(),
        })
    }

    fn purchases_url(&self, customer_id: &str) -> String {
        format!("{}/rest/v1/purchase?{}", self.base_url, customer_id)
    }
}

fn header_value(raw: &str) -> Result<HeaderValue> {
    let mut value = HeaderValue::from_str(raw)
        .map_err(|_| LensError::Config("store key contains invalid header characters".to_string()))?;
    value.set_sensitive(true);
    Ok(value)
}

impl PurchaseStore for RestStore {
    fn fetch_purchases(&self, customer_id: &str) -> Result<Vec<RawObject>> {
        let url = self.purchases_url(customer_id);
        tracing::debug!(url = %url, "Requesting purchases");

        let response = self.client.get(&url).send()?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(LensError::UpstreamUnavailable {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = response.json()?;
        parse_purchase_array(body)
    }
}

/// The store answers with a JSON array of objects; anything else is a shape mismatch.
pub fn parse_purchase_array(body: Value) -> Result<Vec<RawObject>> {
    let Value::Array(items) = body else {
        return Err(LensError::MalformedRecord {
            line: 0,
            field: "<response>".to_string(),
            reason: "expected a JSON array of purchases".to_string(),
        });
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Object(obj) => Ok(obj),
            other => Err(LensError::MalformedRecord {
                line: i as u64 + 1,
                field: "<response>".to_string(),
                reason: format!("expected an object, got {other}"),
            }),
        })
        .collect()
}
