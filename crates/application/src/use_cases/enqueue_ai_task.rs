//! Create an AI task and hand it to a worker queue.

use domain::{AiTask, CreateAiTask};
use serde_json::json;
use tracing::field::Empty;

use crate::config::Config;
use crate::dto::{EnqueueAiTaskInput, EnqueueAiTaskOutput};
use crate::error::Result;
use crate::ports::{AiTaskRepository, QueuePort};

use super::{SharedDomainEvents, lock_events};

/// Creates an AI task, stores it, dispatches its events and enqueues a job
/// for it.
pub struct EnqueueAiTask<R: AiTaskRepository, Q: QueuePort> {
    repository: R,
    queue: Q,
    events: SharedDomainEvents,
    default_queue: String,
}

impl<R: AiTaskRepository, Q: QueuePort> EnqueueAiTask<R, Q> {
    pub fn new(repository: R, queue: Q, events: SharedDomainEvents, config: &Config) -> Self {
        Self {
            repository,
            queue,
            events,
            default_queue: config.queue_name.clone(),
        }
    }

    /// Runs the use case.
    ///
    /// A rejected input returns the domain error; nothing is stored or
    /// enqueued in that case. If storing or dispatching fails the task is
    /// dropped from the shared dispatcher.
    #[tracing::instrument(skip_all, fields(task_type = Empty, task_id = Empty))]
    pub async fn execute(&self, input: EnqueueAiTaskInput) -> Result<EnqueueAiTaskOutput> {
        let params = CreateAiTask {
            tenant_id: input.tenant_id,
            project_id: input.project_id,
            task_type: input.task_type,
            payload: input.payload,
            now: None,
        };
        let task = AiTask::create(params, &mut lock_events(&self.events))?;

        let span = tracing::Span::current();
        span.record("task_type", task.task_type().as_str());
        span.record("task_id", task.id().as_str());

        let delivered = match self.store_and_dispatch(&task).await {
            Ok(delivered) => delivered,
            Err(err) => {
                lock_events(&self.events).unmark(task.id());
                tracing::warn!(error = %err, "ai task not enqueued");
                return Err(err);
            }
        };
        tracing::debug!(events = delivered, "task events dispatched");

        let queue_name = input
            .queue_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| self.default_queue.clone());
        let job = json!({
            "taskId": task.id().as_str(),
            "tenantId": task.tenant_id(),
            "projectId": task.project_id(),
            "type": task.task_type(),
            "payload": task.payload(),
        });
        self.queue
            .enqueue(&queue_name, job, input.queue_options)
            .await?;

        metrics::counter!("ai_tasks_enqueued_total", "queue" => queue_name.clone()).increment(1);
        tracing::info!(queue = %queue_name, "ai task enqueued");

        Ok(EnqueueAiTaskOutput {
            task_id: task.id().to_string(),
        })
    }

    async fn store_and_dispatch(&self, task: &AiTask) -> Result<usize> {
        self.repository.save(task).await?;
        let delivered = lock_events(&self.events).dispatch_events_for_aggregate(task.id())?;
        Ok(delivered)
    }
}
