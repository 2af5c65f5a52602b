//! Core aggregate and domain event types.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use chrono::{DateTime, Utc};
use common::UniqueEntityId;
use serde::{Serialize, de::DeserializeOwned};

use crate::entity::Entity;

/// Trait for domain events.
///
/// Domain events represent facts that have happened to an aggregate.
/// They are immutable and should be named in past tense.
pub trait DomainEvent: Serialize + DeserializeOwned + Send + Sync + Clone + 'static {
    /// Returns the event kind.
    ///
    /// Handlers are registered against this name.
    fn event_type(&self) -> &'static str;

    /// Returns the id of the aggregate that raised the event.
    fn aggregate_id(&self) -> &UniqueEntityId;

    /// Returns when the event occurred.
    fn occurred_at(&self) -> DateTime<Utc>;
}

/// Ordered, append-only queue of events an aggregate has not dispatched yet.
///
/// The queue is owned by exactly one aggregate. Other parties only ever see
/// a [`WeakEventQueue`], which can drain the queue but not append to it.
#[derive(Debug)]
pub struct EventQueue<E> {
    inner: Arc<Mutex<Vec<E>>>,
}

impl<E> EventQueue<E> {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<E>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push(&self, event: E) {
        self.lock().push(event);
    }

    fn snapshot(&self) -> Vec<E>
    where
        E: Clone,
    {
        self.lock().clone()
    }

    fn clear(&self) {
        self.lock().clear();
    }

    fn pull(&self) -> Vec<E> {
        std::mem::take(&mut *self.lock())
    }

    fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns a non-owning handle to this queue.
    pub fn downgrade(&self) -> WeakEventQueue<E> {
        WeakEventQueue {
            inner: Arc::downgrade(&self.inner),
        }
    }
}

impl<E> Default for EventQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Non-owning handle to an aggregate's event queue.
///
/// Does not keep the aggregate's events alive.
#[derive(Debug)]
pub struct WeakEventQueue<E> {
    inner: Weak<Mutex<Vec<E>>>,
}

impl<E> WeakEventQueue<E> {
    /// Drains the queue, or returns `None` once the owning aggregate is gone.
    pub fn pull(&self) -> Option<Vec<E>> {
        let inner = self.inner.upgrade()?;
        let mut events = inner.lock().unwrap_or_else(PoisonError::into_inner);
        Some(std::mem::take(&mut *events))
    }

    /// Returns true while the owning aggregate is alive.
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }
}

impl<E> Clone for WeakEventQueue<E> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

/// What the dispatcher needs from an aggregate: its id and a weak handle to
/// its pending events.
pub trait EventSource<E> {
    /// Returns the aggregate's id.
    fn source_id(&self) -> &UniqueEntityId;

    /// Returns a non-owning handle to the aggregate's pending events.
    fn event_queue(&self) -> WeakEventQueue<E>;
}

/// An entity that is the consistency boundary for its invariants and the
/// sole owner of its pending domain events.
///
/// Appending events and mutating props are crate-private. Concrete
/// aggregates wrap an `AggregateRoot` in a private field, so only their own
/// methods can do either.
///
/// ```compile_fail
/// use domain::AggregateRoot;
///
/// let mut root: AggregateRoot<u32, String> = AggregateRoot::new(0, None);
/// root.add_domain_event("Forged".to_string());
/// ```
#[derive(Debug)]
pub struct AggregateRoot<P, E> {
    entity: Entity<P>,
    events: EventQueue<E>,
}

impl<P, E> AggregateRoot<P, E> {
    /// Creates an aggregate root with an empty event queue.
    pub fn new(props: P, id: Option<UniqueEntityId>) -> Self {
        Self {
            entity: Entity::new(props, id),
            events: EventQueue::new(),
        }
    }

    /// Returns the aggregate's identity.
    pub fn id(&self) -> &UniqueEntityId {
        self.entity.id()
    }

    /// Returns the aggregate's props.
    pub fn props(&self) -> &P {
        self.entity.props()
    }

    /// Returns the aggregate's props for mutation by the owning aggregate.
    pub(crate) fn props_mut(&mut self) -> &mut P {
        self.entity.props_mut()
    }

    /// Compares identities only.
    pub fn equals(&self, other: Option<&AggregateRoot<P, E>>) -> bool {
        self.entity.equals(other.map(|other| &other.entity))
    }

    /// Appends an event to the pending queue.
    pub(crate) fn add_domain_event(&mut self, event: E) {
        self.events.push(event);
    }

    /// Returns a copy of the pending events in the order they were raised.
    pub fn domain_events(&self) -> Vec<E>
    where
        E: Clone,
    {
        self.events.snapshot()
    }

    /// Returns the number of pending events.
    pub fn pending_event_count(&self) -> usize {
        self.events.len()
    }

    /// Discards all pending events.
    pub fn clear_domain_events(&mut self) {
        self.events.clear();
    }

    /// Returns the pending events and clears the queue in one step.
    pub fn pull_domain_events(&mut self) -> Vec<E> {
        self.events.pull()
    }
}

impl<P, E> EventSource<E> for AggregateRoot<P, E> {
    fn source_id(&self) -> &UniqueEntityId {
        self.id()
    }

    fn event_queue(&self) -> WeakEventQueue<E> {
        self.events.downgrade()
    }
}

impl<P, E> PartialEq for AggregateRoot<P, E> {
    fn eq(&self, other: &Self) -> bool {
        self.entity == other.entity
    }
}
