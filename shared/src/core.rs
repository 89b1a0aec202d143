use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Error;

#[cfg(any(test, feature = "mocks"))]
use mockall::automock;

/// Reads a compressed audit-log object out of the object store.
#[cfg_attr(any(test, feature = "mocks"), automock)]
#[async_trait]
pub trait ObjectStore {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, Error>;
}

/// Looks up full instance records, tags included, for a batch of instance
/// ids. May return fewer records than requested when instances have been
/// terminated since the audited event.
#[cfg_attr(any(test, feature = "mocks"), automock)]
#[async_trait]
pub trait InstanceInventory {
    async fn describe_instances(
        &self,
        instance_ids: &[String],
    ) -> Result<Vec<InstanceRecord>, Error>;
}

/// Delivers a compliance alert to the configured destination.
#[cfg_attr(any(test, feature = "mocks"), automock)]
#[async_trait]
pub trait AlertPublisher {
    async fn publish(&self, message: &str) -> Result<(), Error>;
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InstanceRecord {
    pub instance_id: String,
    pub tags: Vec<Tag>,
}
