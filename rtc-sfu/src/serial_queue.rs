//! A stoppable FIFO task runner that executes one task at a time.
//!
//! Every operation that renegotiates through the handler is pushed here so
//! that two renegotiations never overlap. Tasks run strictly in push order,
//! a failing task does not affect the ones behind it, and once the queue is
//! stopped every task that has not started yet fails with
//! [`Error::ErrQueueStopped`].

use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use log::{debug, trace, warn};
use parking_lot::Mutex;
use shared::error::{Error, Result};
use tokio::runtime::Handle;
use tokio::sync::oneshot;

pub(crate) type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

trait QueuedJob: Send {
    fn name(&self) -> &str;
    fn run(self: Box<Self>) -> BoxFuture<()>;
    fn abort(self: Box<Self>, err: Error);
}

struct Job<T, F> {
    name: String,
    task: F,
    tx: oneshot::Sender<Result<T>>,
}

impl<T, F> QueuedJob for Job<T, F>
where
    T: Send + 'static,
    F: Future<Output = Result<T>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn run(self: Box<Self>) -> BoxFuture<()> {
        let Job { name, task, tx } = *self;
        Box::pin(async move {
            let result = task.await;
            if let Err(err) = &result {
                debug!("task {name} failed: {err}");
            }
            // the caller may have stopped waiting
            let _ = tx.send(result);
        })
    }

    fn abort(self: Box<Self>, err: Error) {
        let _ = self.tx.send(Err(err));
    }
}

#[derive(Default)]
struct QueueState {
    pending: VecDeque<Box<dyn QueuedJob>>,
    running: Option<String>,
    draining: bool,
    stopped: bool,
}

/// Snapshot of a queue for diagnostics.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct QueueDump {
    pub running: Option<String>,
    pub pending: Vec<String>,
    pub stopped: bool,
}

/// Outcome of a pushed task; resolves once the task settles.
///
/// The task is queued by [`SerialTaskQueue::push`] itself, so dropping this
/// future does not cancel it.
pub struct QueuedTask<T> {
    rx: oneshot::Receiver<Result<T>>,
}

impl<T> Future for QueuedTask<T> {
    type Output = Result<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            // the job was dropped without settling: it never ran to completion
            Poll::Ready(Err(_)) => Poll::Ready(Err(Error::ErrQueueStopped)),
            Poll::Pending => Poll::Pending,
        }
    }
}

#[derive(Clone)]
pub struct SerialTaskQueue {
    state: Arc<Mutex<QueueState>>,
    runtime: Handle,
}

impl SerialTaskQueue {
    /// Creates a queue whose tasks are driven on `runtime`.
    pub fn new(runtime: Handle) -> Self {
        Self {
            state: Arc::new(Mutex::new(QueueState::default())),
            runtime,
        }
    }

    /// Enqueues `task` and returns its eventual outcome.
    ///
    /// The task is enqueued before this method returns: tasks pushed in
    /// order A then B start in that order even if B's outcome is awaited
    /// first.
    pub fn push<T, F>(&self, name: impl Into<String>, task: F) -> QueuedTask<T>
    where
        T: Send + 'static,
        F: Future<Output = Result<T>> + Send + 'static,
    {
        let name = name.into();
        let (tx, rx) = oneshot::channel();
        let job = Box::new(Job { name, task, tx });

        let spawn_drain = {
            let mut state = self.state.lock();
            if state.stopped {
                drop(state);
                trace!("push() rejected {}: queue stopped", job.name);
                job.abort(Error::ErrQueueStopped);
                return QueuedTask { rx };
            }

            trace!("push() {}", job.name);
            state.pending.push_back(job);
            !std::mem::replace(&mut state.draining, true)
        };

        if spawn_drain {
            self.spawn_drain();
        }

        QueuedTask { rx }
    }

    fn spawn_drain(&self) {
        let state = Arc::clone(&self.state);
        let runtime = self.runtime.clone();
        self.runtime.spawn(async move {
            loop {
                let job = {
                    let mut state = state.lock();
                    match state.pending.pop_front() {
                        Some(job) => {
                            state.running = Some(job.name().to_owned());
                            job
                        }
                        None => {
                            state.running = None;
                            state.draining = false;
                            return;
                        }
                    }
                };

                // run on its own task so a panicking job cannot wedge the queue
                let name = job.name().to_owned();
                if let Err(err) = runtime.spawn(job.run()).await {
                    warn!("task {name} aborted: {err}");
                }

                state.lock().running = None;
            }
        });
    }

    /// Stops the queue for good. Tasks not yet started fail with
    /// [`Error::ErrQueueStopped`]; a task already running is left to finish.
    pub fn stop(&self) {
        let pending = {
            let mut state = self.state.lock();
            if state.stopped {
                return;
            }
            state.stopped = true;
            std::mem::take(&mut state.pending)
        };

        debug!("stop() aborting {} pending tasks", pending.len());
        for job in pending {
            job.abort(Error::ErrQueueStopped);
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.state.lock().stopped
    }

    /// Number of tasks waiting, including the one running.
    pub fn size(&self) -> usize {
        let state = self.state.lock();
        state.pending.len() + usize::from(state.running.is_some())
    }

    pub fn dump(&self) -> QueueDump {
        let state = self.state.lock();
        QueueDump {
            running: state.running.clone(),
            pending: state.pending.iter().map(|job| job.name().to_owned()).collect(),
            stopped: state.stopped,
        }
    }
}

impl fmt::Debug for SerialTaskQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SerialTaskQueue").field(&self.dump()).finish()
    }
}
