//! Deferred domain event dispatch.
//!
//! [`DomainEvents`] is an explicit context object: construct one per process
//! (or per test), hand it by reference to whatever registers handlers or
//! raises events, and drop or clear it to tear it down.

use std::collections::HashMap;

use common::UniqueEntityId;
use thiserror::Error;

use crate::aggregate::{DomainEvent, EventSource, WeakEventQueue};

/// Error raised by an event handler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("handler for {event_type} failed: {message}")]
pub struct HandlerError {
    pub event_type: String,
    pub message: String,
}

impl HandlerError {
    /// Creates a handler error for the given event kind.
    pub fn new(event_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            message: message.into(),
        }
    }
}

/// A callback invoked for every dispatched event of the kind it was
/// registered for.
pub type EventHandler<E> = Box<dyn Fn(&E) -> Result<(), HandlerError> + Send + Sync>;

/// Registry of event handlers and of aggregates with undispatched events.
///
/// Marked aggregates are tracked by id with a weak handle to their event
/// queue; the registry never owns an aggregate.
pub struct DomainEvents<E: DomainEvent> {
    handlers: HashMap<String, Vec<EventHandler<E>>>,
    marked: HashMap<UniqueEntityId, WeakEventQueue<E>>,
}

impl<E: DomainEvent> DomainEvents<E> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            marked: HashMap::new(),
        }
    }

    /// Registers a handler for an event kind.
    ///
    /// Several handlers may share a kind; they run in registration order.
    pub fn register<F>(&mut self, handler: F, event_type: impl Into<String>)
    where
        F: Fn(&E) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.handlers
            .entry(event_type.into())
            .or_default()
            .push(Box::new(handler));
    }

    /// Returns the number of handlers registered for an event kind.
    pub fn handler_count(&self, event_type: &str) -> usize {
        self.handlers.get(event_type).map_or(0, Vec::len)
    }

    /// Removes every registered handler.
    pub fn clear_handlers(&mut self) {
        self.handlers.clear();
    }

    /// Marks an aggregate as having events to dispatch.
    ///
    /// Marking the same aggregate again before it is dispatched is a no-op.
    /// Entries whose aggregate has been dropped are forgotten here.
    pub fn mark_aggregate_for_dispatch<A>(&mut self, aggregate: &A)
    where
        A: EventSource<E> + ?Sized,
    {
        self.marked.retain(|_, queue| queue.is_alive());

        let id = aggregate.source_id();
        if !self.marked.contains_key(id) {
            tracing::trace!(aggregate_id = %id, "aggregate marked for dispatch");
            self.marked.insert(id.clone(), aggregate.event_queue());
        }
    }

    /// Returns true if the aggregate is waiting for dispatch.
    pub fn is_marked(&self, id: &UniqueEntityId) -> bool {
        self.marked.contains_key(id)
    }

    /// Returns the number of aggregates waiting for dispatch.
    pub fn marked_count(&self) -> usize {
        self.marked.len()
    }

    /// Forgets one marked aggregate without dispatching. Returns true if it
    /// was marked.
    pub fn unmark(&mut self, id: &UniqueEntityId) -> bool {
        self.marked.remove(id).is_some()
    }

    /// Forgets every marked aggregate without dispatching.
    pub fn clear_marked_aggregates(&mut self) {
        self.marked.clear();
    }

    /// Delivers the pending events of a marked aggregate.
    ///
    /// Events are pulled from the aggregate (clearing its queue) and handed,
    /// in the order they were raised, to every handler of their kind in
    /// registration order. Returns the number of events delivered; an id
    /// that is not marked delivers nothing.
    ///
    /// The first handler error stops delivery and is returned. Events pulled
    /// for this call are not put back, and the aggregate stays marked.
    #[tracing::instrument(skip_all, fields(aggregate_id = %id))]
    pub fn dispatch_events_for_aggregate(
        &mut self,
        id: &UniqueEntityId,
    ) -> Result<usize, HandlerError> {
        let Some(queue) = self.marked.get(id) else {
            return Ok(0);
        };

        let Some(events) = queue.pull() else {
            tracing::debug!("marked aggregate dropped before dispatch");
            self.marked.remove(id);
            return Ok(0);
        };

        let delivered = events.len();
        for event in &events {
            self.dispatch(event)?;
        }

        self.marked.remove(id);
        metrics::counter!("domain_events_dispatched_total").increment(delivered as u64);
        tracing::debug!(events = delivered, "dispatched domain events");

        Ok(delivered)
    }

    fn dispatch(&self, event: &E) -> Result<(), HandlerError> {
        let Some(handlers) = self.handlers.get(event.event_type()) else {
            return Ok(());
        };
        for handler in handlers {
            handler(event)?;
        }
        Ok(())
    }
}

impl<E: DomainEvent> Default for DomainEvents<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: DomainEvent> std::fmt::Debug for DomainEvents<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DomainEvents")
            .field("handler_kinds", &self.handlers.keys().collect::<Vec<_>>())
            .field("marked", &self.marked.len())
            .finish()
    }
}
