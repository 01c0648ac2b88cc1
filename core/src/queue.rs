//! Hand-off point between callers and workers.
//!
//! # Design
//! A `QueuedTask` is a task name plus a JSON payload, nothing else. Two
//! queues ship with the crate:
//! - `InMemoryQueue` only stores tasks. Tests and embedders pop them and
//!   feed them to a `Worker` themselves.
//! - `ThreadedQueue` owns a named background thread that drains an mpsc
//!   channel through a `Worker`. Dropping the queue closes the channel and
//!   joins the thread, so every accepted task is handled before drop returns.

use std::collections::VecDeque;
use std::sync::mpsc::{self, Sender};
use std::sync::Mutex;
use std::thread::{self, JoinHandle};

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::error::ClientError;
use crate::tasks::Worker;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedTask {
    pub name: String,
    pub payload: String,
}

impl QueuedTask {
    pub fn new(name: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            payload: payload.into(),
        }
    }

    /// Task whose payload is `value` as JSON.
    pub fn json<T: Serialize>(name: impl Into<String>, value: &T) -> Result<Self, ClientError> {
        Ok(Self::new(name, serde_json::to_string(value)?))
    }
}

pub trait TaskQueue: Send + Sync {
    fn enqueue(&self, task: QueuedTask) -> Result<(), ClientError>;
}

/// FIFO buffer with no consumer of its own.
#[derive(Debug, Default)]
pub struct InMemoryQueue {
    tasks: Mutex<VecDeque<QueuedTask>>,
}

impl InMemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pop(&self) -> Option<QueuedTask> {
        self.tasks.lock().ok()?.pop_front()
    }

    pub fn len(&self) -> usize {
        self.tasks.lock().map(|tasks| tasks.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the pending tasks, oldest first.
    pub fn tasks(&self) -> Vec<QueuedTask> {
        self.tasks
            .lock()
            .map(|tasks| tasks.iter().cloned().collect())
            .unwrap_or_default()
    }
}

impl TaskQueue for InMemoryQueue {
    fn enqueue(&self, task: QueuedTask) -> Result<(), ClientError> {
        let mut tasks = self
            .tasks
            .lock()
            .map_err(|_| ClientError::Queue("queue lock poisoned".to_string()))?;
        tasks.push_back(task);
        Ok(())
    }
}

/// Queue backed by one worker thread.
pub struct ThreadedQueue {
    sender: Mutex<Option<Sender<QueuedTask>>>,
    handle: Mutex<Option<JoinHandle<usize>>>,
}

impl ThreadedQueue {
    /// Start the worker thread.
    pub fn spawn(worker: Worker) -> Result<Self, ClientError> {
        let (sender, receiver) = mpsc::channel::<QueuedTask>();
        let handle = thread::Builder::new()
            .name("api-client-worker".to_string())
            .spawn(move || {
                let mut handled = 0;
                for task in receiver {
                    match worker.handle(&task) {
                        Ok(outcome) => debug!(task = %task.name, ?outcome, "task finished"),
                        Err(err) => error!(task = %task.name, error = %err, "task failed"),
                    }
                    handled += 1;
                }
                handled
            })
            .map_err(|e| ClientError::Queue(format!("failed to start worker thread: {e}")))?;
        Ok(Self {
            sender: Mutex::new(Some(sender)),
            handle: Mutex::new(Some(handle)),
        })
    }

    /// Stop accepting tasks, wait for the backlog, and return how many tasks
    /// the worker processed. Later calls return 0.
    pub fn shutdown(&self) -> usize {
        if let Ok(mut sender) = self.sender.lock() {
            sender.take();
        }
        let handle = self.handle.lock().ok().and_then(|mut handle| handle.take());
        match handle.map(JoinHandle::join) {
            Some(Ok(handled)) => handled,
            Some(Err(_)) => {
                error!("worker thread panicked");
                0
            }
            None => 0,
        }
    }
}

impl TaskQueue for ThreadedQueue {
    fn enqueue(&self, task: QueuedTask) -> Result<(), ClientError> {
        let sender = self
            .sender
            .lock()
            .map_err(|_| ClientError::Queue("queue lock poisoned".to_string()))?;
        let sender = sender
            .as_ref()
            .ok_or_else(|| ClientError::Queue("queue is shut down".to_string()))?;
        sender
            .send(task)
            .map_err(|_| ClientError::Queue("worker thread has stopped".to_string()))
    }
}

impl Drop for ThreadedQueue {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ClientContext;
    use crate::log::{InMemoryLogStore, LogStore};
    use crate::policy::InMemoryPolicies;
    use crate::registry::Registry;
    use crate::tasks::CLIENT_LOG_CLEANUP;
    use std::sync::Arc;

    fn worker(logs: Arc<InMemoryLogStore>) -> Worker {
        Worker::new(ClientContext::new(
            Arc::new(InMemoryPolicies::new()),
            logs,
            Arc::new(InMemoryQueue::new()),
            Arc::new(Registry::with_defaults()),
        ))
    }

    #[test]
    fn in_memory_queue_is_fifo() {
        let queue = InMemoryQueue::new();
        queue.enqueue(QueuedTask::new("a", "1")).unwrap();
        queue.enqueue(QueuedTask::new("b", "2")).unwrap();
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.tasks()[0].name, "a");
        assert_eq!(queue.pop().unwrap().name, "a");
        assert_eq!(queue.pop().unwrap().name, "b");
        assert!(queue.pop().is_none());
        assert!(queue.is_empty());
    }

    #[test]
    fn threaded_queue_handles_every_task_before_shutdown() {
        let logs = Arc::new(InMemoryLogStore::new());
        let mut old = logs.create();
        old.created_at = chrono::Utc::now() - chrono::Duration::days(365);
        logs.insert(old);

        let queue = ThreadedQueue::spawn(worker(logs.clone())).unwrap();
        queue.enqueue(QueuedTask::new(CLIENT_LOG_CLEANUP, "null")).unwrap();
        queue.enqueue(QueuedTask::new("unknown.task", "{}")).unwrap();
        assert_eq!(queue.shutdown(), 2);
        assert!(logs.is_empty());
    }

    #[test]
    fn enqueue_after_shutdown_fails() {
        let queue = ThreadedQueue::spawn(worker(Arc::new(InMemoryLogStore::new()))).unwrap();
        assert_eq!(queue.shutdown(), 0);
        assert!(matches!(
            queue.enqueue(QueuedTask::new(CLIENT_LOG_CLEANUP, "null")),
            Err(ClientError::Queue(_))
        ));
        assert_eq!(queue.shutdown(), 0);
    }
}
