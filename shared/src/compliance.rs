use std::collections::HashSet;

use futures::stream::{self, StreamExt};
use tokio::sync::Mutex;

use crate::core::{AlertPublisher, InstanceInventory};
use crate::error::Error;

/// Verifies that provisioned instances carry the required tag key and
/// publishes one alert per violation.
///
/// Instance ids are deduplicated before lookup, both within one call and
/// across calls of the same invocation: one trail often carries several
/// records touching the same instance, and each should cost one inventory
/// query and at most one alert. The dedup window is reset per invocation via
/// [`ComplianceChecker::begin_invocation`].
pub struct ComplianceChecker<I, N> {
    inventory: I,
    alerts: N,
    required_tag_key: String,
    batch_size: usize,
    parallelism: usize,
    seen: Mutex<HashSet<String>>,
}

impl<I, N> ComplianceChecker<I, N>
where
    I: InstanceInventory + Send + Sync,
    N: AlertPublisher + Send + Sync,
{
    pub fn new(
        inventory: I,
        alerts: N,
        required_tag_key: String,
        batch_size: usize,
        parallelism: usize,
    ) -> Self {
        Self {
            inventory,
            alerts,
            required_tag_key,
            batch_size: batch_size.max(1),
            parallelism: parallelism.max(1),
            seen: Mutex::new(HashSet::new()),
        }
    }

    /// Forgets which instances were already checked. Called once at the top
    /// of each invocation so the dedup window never spans invocations.
    pub async fn begin_invocation(&self) {
        self.seen.lock().await.clear();
    }

    /// Checks every not-yet-seen instance in `instance_ids` for the required
    /// tag. Lookups go out in chunks of at most `batch_size` ids,
    /// `parallelism` chunks in flight; a chunk that fails to query fails the
    /// whole check, but all started chunks run to completion.
    pub async fn check_required_tag(&self, instance_ids: &[String]) -> Result<(), Error> {
        let unchecked: Vec<String> = {
            let mut seen = self.seen.lock().await;
            instance_ids
                .iter()
                .filter(|id| seen.insert((*id).clone()))
                .cloned()
                .collect()
        };
        if unchecked.is_empty() {
            return Ok(());
        }

        let results: Vec<Result<(), Error>> = stream::iter(unchecked.chunks(self.batch_size))
            .map(|chunk| self.check_chunk(chunk))
            .buffer_unordered(self.parallelism)
            .collect()
            .await;

        results.into_iter().collect()
    }

    async fn check_chunk(&self, chunk: &[String]) -> Result<(), Error> {
        let instances = self.inventory.describe_instances(chunk).await?;
        if instances.len() != chunk.len() {
            // Instances can terminate between the trail event and the lookup.
            tracing::warn!(
                requested = chunk.len(),
                returned = instances.len(),
                "inventory returned fewer instances than requested"
            );
        }

        // Alerts go out one at a time, in inventory order, to bound the
        // notification fan-out.
        for instance in instances {
            let tagged = instance
                .tags
                .iter()
                .any(|tag| tag.key == self.required_tag_key);
            if !tagged {
                tracing::info!(instance_id = %instance.instance_id, "instance is missing the required tag");
                let message = format!(
                    "instance {} is not tagged with {}",
                    instance.instance_id, self.required_tag_key
                );
                self.alerts.publish(&message).await?;
            }
        }
        Ok(())
    }
}
