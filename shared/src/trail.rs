use std::io::Read;

use flate2::read::GzDecoder;
use serde::Deserialize;
use serde_json::Value;

use crate::core::ObjectStore;
use crate::error::Error;

/// One CloudTrail change record. The operation-specific payloads stay opaque
/// here; each registered handler deserializes the shape it expects.
#[derive(Debug, Clone, Deserialize)]
pub struct TrailRecord {
    #[serde(rename = "eventSource")]
    pub event_source: String,
    #[serde(rename = "eventName")]
    pub event_name: String,
    #[serde(rename = "requestParameters", default)]
    pub request_parameters: Option<Value>,
    #[serde(rename = "responseElements", default)]
    pub response_elements: Option<Value>,
}

/// A decoded audit-log document. Built per trail object, discarded after
/// inspection.
#[derive(Debug, Clone)]
pub struct Trail {
    pub records: Vec<TrailRecord>,
}

pub struct TrailFetcher<S: ObjectStore> {
    object_store: S,
}

impl<S: ObjectStore + Send + Sync> TrailFetcher<S> {
    pub fn new(object_store: S) -> Self {
        Self { object_store }
    }

    /// Downloads `bucket/key`, gunzips it and projects the `Records` array
    /// into a [`Trail`]. No retries here; every failure propagates to the
    /// caller unchanged.
    pub async fn fetch(&self, bucket: &str, key: &str) -> Result<Trail, Error> {
        tracing::info!(bucket, key, "downloading trail object");
        let compressed = self.object_store.get_object(bucket, key).await?;

        let mut text = String::new();
        GzDecoder::new(compressed.as_slice())
            .read_to_string(&mut text)
            .map_err(|e| Error::Decompression(e.to_string()))?;

        let document: Value =
            serde_json::from_str(&text).map_err(|e| Error::Parse(e.to_string()))?;
        let records = document
            .get("Records")
            .cloned()
            .ok_or_else(|| Error::Schema("trail document has no Records field".to_string()))?;
        let records: Vec<TrailRecord> =
            serde_json::from_value(records).map_err(|e| Error::Schema(e.to_string()))?;

        Ok(Trail { records })
    }
}
