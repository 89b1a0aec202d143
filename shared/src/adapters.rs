use async_trait::async_trait;

use crate::core::{AlertPublisher, InstanceInventory, InstanceRecord, ObjectStore, Tag};
use crate::error::Error;

/// Subject line carried by every alert.
pub const ALERT_SUBJECT: &str = "aws-tag-watch";

pub struct S3ObjectStore {
    s3_client: aws_sdk_s3::Client,
}

impl S3ObjectStore {
    pub fn new(s3_client: aws_sdk_s3::Client) -> Self {
        Self { s3_client }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, Error> {
        let object = self
            .s3_client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| Error::ObjectStore(format!("error reading {bucket}/{key}: {e:?}")))?;

        let body = object.body.collect().await.map_err(|e| {
            Error::ObjectStore(format!("error reading body of {bucket}/{key}: {e:?}"))
        })?;

        Ok(body.into_bytes().to_vec())
    }
}

pub struct Ec2InstanceInventory {
    ec2_client: aws_sdk_ec2::Client,
}

impl Ec2InstanceInventory {
    pub fn new(ec2_client: aws_sdk_ec2::Client) -> Self {
        Self { ec2_client }
    }
}

#[async_trait]
impl InstanceInventory for Ec2InstanceInventory {
    async fn describe_instances(
        &self,
        instance_ids: &[String],
    ) -> Result<Vec<InstanceRecord>, Error> {
        let response = self
            .ec2_client
            .describe_instances()
            .set_instance_ids(Some(instance_ids.to_vec()))
            .send()
            .await
            .map_err(|e| Error::Inventory(format!("DescribeInstances failed: {e:?}")))?;

        // Reservation grouping carries no signal here; flatten to instances.
        let mut records = Vec::new();
        for reservation in response.reservations() {
            for instance in reservation.instances() {
                let Some(instance_id) = instance.instance_id() else {
                    continue;
                };
                let tags = instance
                    .tags()
                    .iter()
                    .filter_map(|tag| {
                        Some(Tag {
                            key: tag.key()?.to_string(),
                            value: tag.value()?.to_string(),
                        })
                    })
                    .collect();
                records.push(InstanceRecord {
                    instance_id: instance_id.to_string(),
                    tags,
                });
            }
        }
        Ok(records)
    }
}

pub struct SnsAlertPublisher {
    sns_client: aws_sdk_sns::Client,
    topic_arn: String,
}

impl SnsAlertPublisher {
    pub fn new(sns_client: aws_sdk_sns::Client, topic_arn: String) -> Self {
        Self {
            sns_client,
            topic_arn,
        }
    }
}

#[async_trait]
impl AlertPublisher for SnsAlertPublisher {
    async fn publish(&self, message: &str) -> Result<(), Error> {
        tracing::info!(message, "publishing alert");
        self.sns_client
            .publish()
            .topic_arn(&self.topic_arn)
            .subject(ALERT_SUBJECT)
            .message(message)
            .send()
            .await
            .map(|_| ())
            .map_err(|e| Error::Notification(format!("error publishing alert: {e:?}")))
    }
}
