use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::Error;
use crate::trail::TrailRecord;

/// Logic bound to exactly one (eventSource, eventName) pair.
#[async_trait]
pub trait RecordHandler: Send + Sync {
    async fn handle(&self, record: &TrailRecord) -> Result<(), Error>;
}

/// Maps (eventSource, eventName) pairs to their handlers. Populated in
/// `main` before the runtime starts and read-only afterwards, so dispatch
/// needs no locking.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<(String, String), Box<dyn RecordHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler. A second registration for the same pair is a
    /// wiring bug and fails fast with [`Error::Configuration`].
    pub fn register(
        &mut self,
        event_source: &str,
        event_name: &str,
        handler: Box<dyn RecordHandler>,
    ) -> Result<(), Error> {
        let key = (event_source.to_string(), event_name.to_string());
        if self.handlers.contains_key(&key) {
            return Err(Error::Configuration {
                source: event_source.to_string(),
                name: event_name.to_string(),
            });
        }
        tracing::info!(event_source, event_name, "registered handler");
        self.handlers.insert(key, handler);
        Ok(())
    }

    /// Absence is not an error: records nobody registered for are skipped.
    pub fn lookup(&self, event_source: &str, event_name: &str) -> Option<&dyn RecordHandler> {
        self.handlers
            .get(&(event_source.to_string(), event_name.to_string()))
            .map(|handler| handler.as_ref())
    }
}
