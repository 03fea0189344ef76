//! Background job execution.
//!
//! Every job runs on its own thread and delivers exactly one result through a
//! [`JobHandle`] (or a completion callback). The submitting thread never blocks
//! unless it calls [`JobHandle::wait`]. Jobs cannot be cancelled once started.

use crate::fetch::{FetchedInfo, fetch_info};
use crate::job::JobRequest;
use crate::orchestrator::Orchestrator;
use crate::outcome::DownloadOutcome;
use mediagrab_dl::Extractor;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread::{self, JoinHandle};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("worker exited without delivering a result")]
    Disconnected,
}

/// Handle to a job running on a worker thread.
#[derive(Debug)]
pub struct JobHandle<T> {
    rx: Receiver<T>,
    thread: Option<JoinHandle<()>>,
}

impl<T> JobHandle<T> {
    /// Block until the job delivers its result.
    pub fn wait(mut self) -> Result<T, WorkerError> {
        let result = self.rx.recv().map_err(|_| WorkerError::Disconnected);

        if let Some(thread) = self.thread.take()
            && thread.join().is_err()
        {
            tracing::warn!("worker thread panicked after delivering its result");
        }

        result
    }

    /// Result if the job has finished, without blocking.
    ///
    /// Yields the result at most once; later calls report [`WorkerError::Disconnected`].
    pub fn try_outcome(&self) -> Result<Option<T>, WorkerError> {
        match self.rx.try_recv() {
            Ok(value) => Ok(Some(value)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(WorkerError::Disconnected),
        }
    }

    /// Whether the worker thread has exited.
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().is_none_or(JoinHandle::is_finished)
    }
}

/// Run `job` on a named worker thread, delivering its result through the handle.
pub fn spawn_job<T, F>(name: &str, job: F) -> Result<JobHandle<T>, WorkerError>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (tx, rx) = mpsc::sync_channel(1);

    let thread = spawn_thread(name, move || {
        if tx.send(job()).is_err() {
            tracing::debug!("job result dropped, handle already gone");
        }
    })?;

    Ok(JobHandle {
        rx,
        thread: Some(thread),
    })
}

/// Run `request` in the background.
pub fn spawn_download(
    orchestrator: Arc<Orchestrator>,
    request: JobRequest,
) -> Result<JobHandle<DownloadOutcome>, WorkerError> {
    spawn_job("mediagrab-download", move || orchestrator.run(&request))
}

/// Run `request` in the background, passing the outcome to `on_complete`.
pub fn spawn_download_with<F>(
    orchestrator: Arc<Orchestrator>,
    request: JobRequest,
    on_complete: F,
) -> Result<JoinHandle<()>, WorkerError>
where
    F: FnOnce(DownloadOutcome) + Send + 'static,
{
    spawn_thread("mediagrab-download", move || {
        on_complete(orchestrator.run(&request))
    })
}

/// Fetch metadata for `url` in the background.
pub fn spawn_info(
    extractor: Arc<dyn Extractor>,
    url: String,
) -> Result<JobHandle<FetchedInfo>, WorkerError> {
    spawn_job("mediagrab-info", move || fetch_info(extractor.as_ref(), &url))
}

fn spawn_thread<F>(name: &str, f: F) -> Result<JoinHandle<()>, WorkerError>
where
    F: FnOnce() + Send + 'static,
{
    Ok(thread::Builder::new().name(name.to_string()).spawn(f)?)
}
