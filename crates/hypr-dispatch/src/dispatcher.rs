//! Event kind to handler registry
//!
//! Handlers are registered through `&mut Dispatcher` before the listener
//! starts and invoked through `&Dispatcher` afterwards, so the registry is
//! never mutated while events are being dispatched.

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;
use tracing::trace;

use crate::event::Event;

/// A registered event callback
pub type Handler = Box<dyn Fn(&Event) -> anyhow::Result<()>>;

/// A handler returned an error while an event was being dispatched
///
/// Handlers registered after the failing one did not run for this event.
#[derive(Debug, Error)]
#[error("Handler #{position} for '{kind}' failed: {source}")]
pub struct DispatchError {
    /// Kind of the event being dispatched
    pub kind: String,
    /// Zero-based registration position of the failing handler
    pub position: usize,
    #[source]
    pub source: anyhow::Error,
}

/// Maps event kinds to the handlers registered for them, in registration order
#[derive(Default)]
pub struct Dispatcher {
    handlers: HashMap<String, Vec<Handler>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `handler` to the list for `kind`
    ///
    /// Registering the same callable twice makes it run twice per event.
    pub fn register<F>(&mut self, kind: impl Into<String>, handler: F)
    where
        F: Fn(&Event) -> anyhow::Result<()> + 'static,
    {
        self.handlers
            .entry(kind.into())
            .or_default()
            .push(Box::new(handler));
    }

    /// Invoke every handler registered for `event.kind`, in order
    ///
    /// Returns the number of handlers invoked. Events with no registered
    /// handlers are ignored. The first failing handler stops the fan-out
    /// and its error is returned.
    pub fn dispatch(&self, event: &Event) -> Result<usize, DispatchError> {
        let Some(handlers) = self.handlers.get(&event.kind) else {
            trace!(kind = %event.kind, "No handlers registered, ignoring event");
            return Ok(0);
        };

        for (position, handler) in handlers.iter().enumerate() {
            handler(event).map_err(|source| DispatchError {
                kind: event.kind.clone(),
                position,
                source,
            })?;
        }

        Ok(handlers.len())
    }

    /// Number of handlers registered for `kind`
    pub fn handler_count(&self, kind: &str) -> usize {
        self.handlers.get(kind).map_or(0, Vec::len)
    }

    /// Event kinds with at least one handler, sorted
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: Vec<(&str, usize)> = self
            .kinds()
            .into_iter()
            .map(|kind| (kind, self.handler_count(kind)))
            .collect();
        f.debug_struct("Dispatcher").field("handlers", &counts).finish()
    }
}
