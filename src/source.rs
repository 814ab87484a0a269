use std::time::Duration;
use async_trait::async_trait;
use log::debug;
use serde_json::Value;

use crate::{
    error::SourceError,
    record::EvidenceRecord,
};

/// A readable copy of the full evidence log.
#[async_trait]
pub trait LogSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<EvidenceRecord>, SourceError>;
}

// `GET <base>/logs`
pub struct HttpLogSource {
    client: reqwest::Client,

    endpoint: String,

    timeout: Duration,
}

impl HttpLogSource {
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>, timeout: Duration) -> Self {
        HttpLogSource {
            client: client,
            endpoint: endpoint.into(),
            timeout: timeout,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl LogSource for HttpLogSource {
    async fn fetch(&self) -> Result<Vec<EvidenceRecord>, SourceError> {
        let response = self.client
            .get(&self.endpoint)
            .timeout(self.timeout)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status(status.as_u16()));
        }
        let body = response.bytes().await?;
        decode_records(&body)
    }
}

// the body must be an array; elements that are not records are skipped
pub fn decode_records(body: &[u8]) -> Result<Vec<EvidenceRecord>, SourceError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| SourceError::Malformed(e.to_string()))?;
    let items = match value {
        Value::Array(items) => items,

        other => {
            return Err(SourceError::Malformed(
                format!("expected an array of records, got `{}`", json_kind(&other))
            ));
        },
    };
    let total = items.len();
    let records: Vec<_> = items
        .into_iter()
        .filter_map(EvidenceRecord::from_value)
        .collect();
    if records.len() < total {
        debug!("Dropped `{}` malformed records out of `{total}`.", total - records.len());
    }
    Ok(records)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
