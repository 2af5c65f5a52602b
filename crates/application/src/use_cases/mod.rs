//! Application use cases.

mod chat_once;
mod enqueue_ai_task;

pub use chat_once::ChatOnce;
pub use enqueue_ai_task::EnqueueAiTask;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use domain::{AiTaskEvent, DomainEvents};

/// Dispatcher shared between use cases.
///
/// Locked only for synchronous sections; never held across an `.await`.
pub type SharedDomainEvents = Arc<Mutex<DomainEvents<AiTaskEvent>>>;

/// Creates an empty shared dispatcher.
pub fn shared_domain_events() -> SharedDomainEvents {
    Arc::new(Mutex::new(DomainEvents::new()))
}

fn lock_events(events: &SharedDomainEvents) -> MutexGuard<'_, DomainEvents<AiTaskEvent>> {
    events.lock().unwrap_or_else(PoisonError::into_inner)
}
