use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::compliance::ComplianceChecker;
use crate::core::{AlertPublisher, InstanceInventory};
use crate::error::Error;
use crate::registry::{HandlerRegistry, RecordHandler};
use crate::trail::TrailRecord;

pub const EC2_EVENT_SOURCE: &str = "ec2.amazonaws.com";

/// Id prefix that marks an EC2 instance among the resources of a tag-change
/// request (which can also name volumes, snapshots and so on).
const INSTANCE_ID_PREFIX: &str = "i-";

#[derive(Debug, Deserialize)]
struct ItemSet<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct RunInstancesResponse {
    #[serde(rename = "instancesSet")]
    instances: ItemSet<InstanceItem>,
}

#[derive(Debug, Deserialize)]
struct InstanceItem {
    #[serde(rename = "instanceId")]
    instance_id: String,
}

#[derive(Debug, Deserialize)]
struct TagChangeRequest {
    #[serde(rename = "resourcesSet")]
    resources: ItemSet<ResourceItem>,
}

#[derive(Debug, Deserialize)]
struct ResourceItem {
    #[serde(rename = "resourceId")]
    resource_id: String,
}

/// `RunInstances`: every launched instance gets checked for the required tag.
pub struct RunInstancesHandler<I, N> {
    checker: Arc<ComplianceChecker<I, N>>,
}

impl<I, N> RunInstancesHandler<I, N> {
    pub fn new(checker: Arc<ComplianceChecker<I, N>>) -> Self {
        Self { checker }
    }
}

#[async_trait]
impl<I, N> RecordHandler for RunInstancesHandler<I, N>
where
    I: InstanceInventory + Send + Sync,
    N: AlertPublisher + Send + Sync,
{
    async fn handle(&self, record: &TrailRecord) -> Result<(), Error> {
        let elements = record.response_elements.clone().ok_or_else(|| {
            Error::Schema("RunInstances record has no responseElements".to_string())
        })?;
        let response: RunInstancesResponse = serde_json::from_value(elements)
            .map_err(|e| Error::Schema(format!("RunInstances responseElements: {e}")))?;

        let instance_ids: Vec<String> = response
            .instances
            .items
            .into_iter()
            .map(|item| item.instance_id)
            .collect();
        self.checker.check_required_tag(&instance_ids).await
    }
}

/// `CreateTags` and `DeleteTags`: any instance whose tags just changed gets
/// re-checked. Non-instance resources in the request are ignored.
pub struct TagChangeHandler<I, N> {
    checker: Arc<ComplianceChecker<I, N>>,
}

impl<I, N> TagChangeHandler<I, N> {
    pub fn new(checker: Arc<ComplianceChecker<I, N>>) -> Self {
        Self { checker }
    }
}

#[async_trait]
impl<I, N> RecordHandler for TagChangeHandler<I, N>
where
    I: InstanceInventory + Send + Sync,
    N: AlertPublisher + Send + Sync,
{
    async fn handle(&self, record: &TrailRecord) -> Result<(), Error> {
        let parameters = record.request_parameters.clone().ok_or_else(|| {
            Error::Schema("tag-change record has no requestParameters".to_string())
        })?;
        let request: TagChangeRequest = serde_json::from_value(parameters)
            .map_err(|e| Error::Schema(format!("tag-change requestParameters: {e}")))?;

        let instance_ids: Vec<String> = request
            .resources
            .items
            .into_iter()
            .map(|item| item.resource_id)
            .filter(|id| id.starts_with(INSTANCE_ID_PREFIX))
            .collect();
        self.checker.check_required_tag(&instance_ids).await
    }
}

/// Wires up the (eventSource, eventName) pairs this tool audits.
pub fn register_default_handlers<I, N>(
    registry: &mut HandlerRegistry,
    checker: Arc<ComplianceChecker<I, N>>,
) -> Result<(), Error>
where
    I: InstanceInventory + Send + Sync + 'static,
    N: AlertPublisher + Send + Sync + 'static,
{
    registry.register(
        EC2_EVENT_SOURCE,
        "RunInstances",
        Box::new(RunInstancesHandler::new(checker.clone())),
    )?;
    registry.register(
        EC2_EVENT_SOURCE,
        "CreateTags",
        Box::new(TagChangeHandler::new(checker.clone())),
    )?;
    registry.register(
        EC2_EVENT_SOURCE,
        "DeleteTags",
        Box::new(TagChangeHandler::new(checker)),
    )?;
    Ok(())
}
