use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Single dedicated worker thread running store jobs in submission order.
///
/// One executor serves one store, so every fetch and commit for a given
/// store is serialized on one thread. Dropping the executor closes the
/// queue and joins the worker after it drains pending jobs.
#[derive(Debug)]
pub struct TaskExecutor {
    sender: Option<mpsc::Sender<Job>>,
    worker: Option<JoinHandle<()>>,
}

impl TaskExecutor {
    /// Spawn the worker thread, named after the store it serves.
    pub fn new(store_name: &str) -> StoreResult<Self> {
        let (sender, receiver) = mpsc::channel::<Job>();
        let worker = thread::Builder::new()
            .name(format!("binprefs-worker-{store_name}"))
            .spawn(move || {
                while let Ok(job) = receiver.recv() {
                    job();
                }
                debug!("worker queue closed, thread exiting");
            })?;
        Ok(Self {
            sender: Some(sender),
            worker: Some(worker),
        })
    }

    /// Queue `job` on the worker and return a barrier for its result.
    ///
    /// If the worker is gone the barrier reports
    /// [`StoreError::WorkerUnavailable`] instead of the job's result.
    pub fn submit<T, F>(&self, job: F) -> FutureBarrier<T>
    where
        T: Send + 'static,
        F: FnOnce() -> StoreResult<T> + Send + 'static,
    {
        let (result_tx, result_rx) = mpsc::channel();
        let wrapped: Job = Box::new(move || {
            // The submitter may have stopped waiting; that is not an error.
            let _ = result_tx.send(job());
        });
        if let Some(sender) = &self.sender {
            // A send failure drops the wrapped job and with it the result
            // sender, which surfaces as WorkerUnavailable at the barrier.
            let _ = sender.send(wrapped);
        }
        FutureBarrier { result: result_rx }
    }
}

impl Drop for TaskExecutor {
    fn drop(&mut self) {
        // Closing the channel lets the worker drain and exit.
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

/// Handle to one submitted job's eventual result.
///
/// The consuming completers decide how a failure propagates: as an error,
/// as a logged fallback, or as a boolean status.
#[derive(Debug)]
pub struct FutureBarrier<T> {
    result: mpsc::Receiver<StoreResult<T>>,
}

impl<T> FutureBarrier<T> {
    /// Block until the job finishes, propagating its error.
    pub fn complete_blocking(self) -> StoreResult<T> {
        match self.result.recv() {
            Ok(result) => result,
            Err(_) => Err(StoreError::WorkerUnavailable),
        }
    }

    /// Block until the job finishes; log a failure and return `None`.
    pub fn complete_ok(self) -> Option<T> {
        match self.complete_blocking() {
            Ok(value) => Some(value),
            Err(error) => {
                warn!(%error, "background job failed");
                None
            }
        }
    }

    /// Block until the job finishes; true iff it succeeded.
    pub fn complete_status(self) -> bool {
        match self.complete_blocking() {
            Ok(_) => true,
            Err(error) => {
                warn!(%error, "background job failed");
                false
            }
        }
    }
}
