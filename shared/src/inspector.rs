use futures::stream::{self, StreamExt};

use crate::error::Error;
use crate::registry::HandlerRegistry;
use crate::trail::Trail;

/// Cap on in-flight records during a trail inspection.
const RECORD_CONCURRENCY: usize = 5;

/// Dispatches every record in `trail` to its registered handler, at most
/// [`RECORD_CONCURRENCY`] in flight at a time. Records with no registered
/// handler are successful no-ops. Started handlers always run to completion;
/// the first error observed fails the whole inspection.
pub async fn inspect_trail(registry: &HandlerRegistry, trail: &Trail) -> Result<(), Error> {
    tracing::info!(records = trail.records.len(), "inspecting trail");

    let results: Vec<Result<(), Error>> = stream::iter(&trail.records)
        .map(|record| async move {
            match registry.lookup(&record.event_source, &record.event_name) {
                Some(handler) => handler.handle(record).await,
                None => Ok(()),
            }
        })
        .buffer_unordered(RECORD_CONCURRENCY)
        .collect()
        .await;

    results.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::inspect_trail;
    use crate::error::Error;
    use crate::registry::{HandlerRegistry, RecordHandler};
    use crate::trail::{Trail, TrailRecord};

    struct CountingHandler {
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    #[async_trait]
    impl RecordHandler for CountingHandler {
        async fn handle(&self, _record: &TrailRecord) -> Result<(), Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(Error::Inventory("inventory unavailable".to_string()))
            } else {
                Ok(())
            }
        }
    }

    fn record(event_source: &str, event_name: &str) -> TrailRecord {
        TrailRecord {
            event_source: event_source.to_string(),
            event_name: event_name.to_string(),
            request_parameters: None,
            response_elements: None,
        }
    }

    #[tokio::test]
    async fn when_no_record_has_a_handler_should_succeed() {
        let registry = HandlerRegistry::new();
        let trail = Trail {
            records: vec![
                record("iam.amazonaws.com", "CreateUser"),
                record("s3.amazonaws.com", "PutObject"),
            ],
        };

        assert!(inspect_trail(&registry, &trail).await.is_ok());
    }

    #[tokio::test]
    async fn when_handlers_match_should_invoke_each_matching_record() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut registry = HandlerRegistry::new();
        registry
            .register(
                "ec2.amazonaws.com",
                "RunInstances",
                Box::new(CountingHandler {
                    calls: calls.clone(),
                    fail: false,
                }),
            )
            .unwrap();

        let trail = Trail {
            records: vec![
                record("ec2.amazonaws.com", "RunInstances"),
                record("ec2.amazonaws.com", "TerminateInstances"),
                record("ec2.amazonaws.com", "RunInstances"),
            ],
        };

        assert!(inspect_trail(&registry, &trail).await.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn when_a_handler_fails_should_fail_after_siblings_complete() {
        let failing_calls = Arc::new(AtomicUsize::new(0));
        let ok_calls = Arc::new(AtomicUsize::new(0));

        let mut registry = HandlerRegistry::new();
        registry
            .register(
                "ec2.amazonaws.com",
                "RunInstances",
                Box::new(CountingHandler {
                    calls: failing_calls.clone(),
                    fail: true,
                }),
            )
            .unwrap();
        registry
            .register(
                "ec2.amazonaws.com",
                "CreateTags",
                Box::new(CountingHandler {
                    calls: ok_calls.clone(),
                    fail: false,
                }),
            )
            .unwrap();

        let trail = Trail {
            records: vec![
                record("ec2.amazonaws.com", "RunInstances"),
                record("ec2.amazonaws.com", "CreateTags"),
                record("ec2.amazonaws.com", "CreateTags"),
            ],
        };

        let result = inspect_trail(&registry, &trail).await;

        assert!(matches!(result, Err(Error::Inventory(_))));
        assert_eq!(failing_calls.load(Ordering::SeqCst), 1);
        // the failure is collected, not short-circuited mid-flight
        assert_eq!(ok_calls.load(Ordering::SeqCst), 2);
    }
}
