use aws_lambda_events::event::sns::{SnsEvent, SnsRecord};
use futures::stream::{self, StreamExt};
use lambda_runtime::{tracing, Error, LambdaEvent};
use serde::Deserialize;
use shared::compliance::ComplianceChecker;
use shared::core::{AlertPublisher, InstanceInventory, ObjectStore};
use shared::inspector::inspect_trail;
use shared::registry::HandlerRegistry;
use shared::trail::TrailFetcher;
use std::sync::Arc;

/// Cap on concurrently processed SNS envelopes and, within one envelope, on
/// concurrently fetched trail objects.
const ENVELOPE_CONCURRENCY: usize = 5;

/// Decoded SNS `Message` body pointing at one or more trail objects.
#[derive(Debug, Deserialize)]
struct TrailNotification {
    #[serde(rename = "s3Bucket")]
    s3_bucket: String,
    #[serde(rename = "s3ObjectKey")]
    s3_object_keys: Vec<String>,
}

pub(crate) struct HandlerDeps<S: ObjectStore, I: InstanceInventory, N: AlertPublisher> {
    pub trail_fetcher: TrailFetcher<S>,
    pub registry: HandlerRegistry,
    pub checker: Arc<ComplianceChecker<I, N>>,
}

/// Pipeline driver: unwraps the SNS envelopes, fetches and inspects every
/// referenced trail object, and reports the first error across all branches.
pub(crate) async fn function_handler<S, I, N>(
    deps: &HandlerDeps<S, I, N>,
    event: LambdaEvent<SnsEvent>,
) -> Result<String, Error>
where
    S: ObjectStore + Send + Sync,
    I: InstanceInventory + Send + Sync,
    N: AlertPublisher + Send + Sync,
{
    tracing::info!(
        envelopes = event.payload.records.len(),
        "processing trail notification batch"
    );
    deps.checker.begin_invocation().await;

    let results: Vec<Result<(), shared::error::Error>> = stream::iter(event.payload.records)
        .map(|record| process_notification(deps, record))
        .buffer_unordered(ENVELOPE_CONCURRENCY)
        .collect()
        .await;
    results
        .into_iter()
        .collect::<Result<(), shared::error::Error>>()?;

    Ok("done".to_string())
}

async fn process_notification<S, I, N>(
    deps: &HandlerDeps<S, I, N>,
    record: SnsRecord,
) -> Result<(), shared::error::Error>
where
    S: ObjectStore + Send + Sync,
    I: InstanceInventory + Send + Sync,
    N: AlertPublisher + Send + Sync,
{
    let notification: TrailNotification = serde_json::from_str(&record.sns.message)
        .map_err(|e| shared::error::Error::Parse(format!("notification message: {e}")))?;

    let bucket = notification.s3_bucket;
    let results: Vec<Result<(), shared::error::Error>> =
        stream::iter(notification.s3_object_keys)
            .map(|key| {
                let bucket = bucket.clone();
                async move {
                    let trail = deps.trail_fetcher.fetch(&bucket, &key).await?;
                    inspect_trail(&deps.registry, &trail).await
                }
            })
            .buffer_unordered(ENVELOPE_CONCURRENCY)
            .collect()
            .await;
    results.into_iter().collect()
}
