//! Operations produced by requestables and their shared lifecycle

pub mod data;
pub mod download;
pub mod upload;

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use arc_swap::ArcSwapOption;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::backend::types::ProgressCallback;
use crate::{Error, Result};

/// Lifecycle state of an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationState {
    /// Created but not resumed
    Idle,
    /// Running on the tokio runtime
    Running,
    /// Finished, successfully or not
    Completed,
    /// Cancelled before it finished
    Cancelled,
}

impl OperationState {
    /// Whether the operation has reached a terminal state
    pub fn is_finished(&self) -> bool {
        matches!(self, OperationState::Completed | OperationState::Cancelled)
    }
}

pub(crate) type Job<T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'static>>;

/// Progress callback slot that can be filled after the operation started
#[derive(Clone, Default)]
pub(crate) struct Progress(Arc<ArcSwapOption<ProgressCallback>>);

impl Progress {
    pub(crate) fn set(&self, callback: ProgressCallback) {
        self.0.store(Some(Arc::new(callback)));
    }

    pub(crate) fn report(&self, transferred: u64, total: Option<u64>) {
        if let Some(callback) = self.0.load_full() {
            (**callback)(transferred, total);
        }
    }

    /// A callback forwarding to whatever is in the slot when it fires
    pub(crate) fn forwarder(&self) -> ProgressCallback {
        let progress = self.clone();
        Arc::new(move |transferred: u64, total: Option<u64>| progress.report(transferred, total))
    }
}

/// A job that runs at most once on the tokio runtime, with cancellation and a
/// single-consumer outcome.
pub(crate) struct Task<T> {
    shared: Arc<Shared<T>>,
}

struct Shared<T> {
    label: String,
    state: watch::Sender<OperationState>,
    job: Mutex<Option<Job<T>>>,
    handle: Mutex<Option<JoinHandle<()>>>,
    outcome: Mutex<Option<Result<T>>>,
}

impl<T> Clone for Task<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<T: Send + 'static> Task<T> {
    pub(crate) fn new(label: String, job: Job<T>) -> Self {
        let (state, _) = watch::channel(OperationState::Idle);
        Self {
            shared: Arc::new(Shared {
                label,
                state,
                job: Mutex::new(Some(job)),
                handle: Mutex::new(None),
                outcome: Mutex::new(None),
            }),
        }
    }

    pub(crate) fn state(&self) -> OperationState {
        *self.shared.state.borrow()
    }

    /// Spawn the job if it has not run yet. Returns whether this call started it.
    pub(crate) fn resume(&self) -> bool {
        let mut job_slot = lock(&self.shared.job);
        if job_slot.is_none() {
            return false;
        }

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                tracing::warn!("{} not started: no tokio runtime", self.shared.label);
                return false;
            }
        };

        let Some(job) = job_slot.take() else {
            return false;
        };

        tracing::debug!("{} started", self.shared.label);
        self.shared.state.send_replace(OperationState::Running);

        let shared = self.shared.clone();
        let handle = runtime.spawn(async move {
            let result = job.await;
            match &result {
                Ok(_) => tracing::debug!("{} completed", shared.label),
                Err(e) => tracing::debug!("{} failed: {}", shared.label, e),
            }
            shared.finish(result, OperationState::Completed);
        });
        *lock(&self.shared.handle) = Some(handle);
        true
    }

    /// Stop the operation. Returns `false` if it had already finished.
    pub(crate) fn cancel(&self) -> bool {
        let mut job_slot = lock(&self.shared.job);
        job_slot.take();

        if !self
            .shared
            .finish(Err(Error::Cancelled), OperationState::Cancelled)
        {
            return false;
        }

        if let Some(handle) = lock(&self.shared.handle).take() {
            handle.abort();
        }
        tracing::debug!("{} cancelled", self.shared.label);
        true
    }

    /// Wait for the outcome. The outcome can be taken once.
    pub(crate) async fn wait(&self) -> Result<T> {
        let mut state = self.shared.state.subscribe();
        if *state.borrow() == OperationState::Idle {
            return Err(Error::NotStarted);
        }

        state
            .wait_for(OperationState::is_finished)
            .await
            .map(|_| ())
            .map_err(|_| Error::Internal("Operation state channel closed".to_string()))?;

        lock(&self.shared.outcome)
            .take()
            .ok_or_else(|| Error::Internal("Response already consumed".to_string()))?
    }
}

impl<T> Shared<T> {
    /// Record the outcome unless another path already finished the task
    fn finish(&self, result: Result<T>, state: OperationState) -> bool {
        let mut outcome = lock(&self.outcome);
        if self.state.borrow().is_finished() {
            return false;
        }
        *outcome = Some(result);
        self.state.send_replace(state);
        true
    }
}
