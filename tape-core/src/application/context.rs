use crate::application::lifecycle::{NoopObserver, PipelineObserver};
use crate::foundation::{Result, TapeError};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

/// Receiver drained by a pool of workers.
pub type SharedReceiver<T> = Arc<Mutex<mpsc::Receiver<T>>>;

pub fn shared<T>(rx: mpsc::Receiver<T>) -> SharedReceiver<T> {
    Arc::new(Mutex::new(rx))
}

/// Shared error channel. Tolerates concurrent writers and never blocks past cancellation.
#[derive(Clone)]
pub struct ErrorSink {
    tx: mpsc::Sender<TapeError>,
    cancel: CancellationToken,
}

impl ErrorSink {
    pub fn new(tx: mpsc::Sender<TapeError>, cancel: CancellationToken) -> Self {
        Self { tx, cancel }
    }

    pub async fn report(&self, err: TapeError) {
        tokio::select! {
            _ = self.cancel.cancelled() => {}
            _ = self.tx.send(err) => {}
        }
    }
}

/// What every stage worker shares: the cancellation signal, the error channel and the hooks.
#[derive(Clone)]
pub struct StageContext {
    pub cancel: CancellationToken,
    pub errors: ErrorSink,
    pub observer: Arc<dyn PipelineObserver>,
}

impl StageContext {
    pub fn new(cancel: CancellationToken, errors: mpsc::Sender<TapeError>, observer: Arc<dyn PipelineObserver>) -> Self {
        let errors = ErrorSink::new(errors, cancel.clone());
        Self { cancel, errors, observer }
    }

    /// Context with a no-op observer, mostly for driving single stages.
    pub fn detached(errors: mpsc::Sender<TapeError>) -> Self {
        Self::new(CancellationToken::new(), errors, Arc::new(NoopObserver))
    }

    /// Sends `item`, giving up when the run is cancelled. Returns false if the item was not delivered.
    pub async fn forward<T>(&self, tx: &mpsc::Sender<T>, item: T) -> bool {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            sent = tx.send(item) => sent.is_ok(),
        }
    }

    /// Receives the next item; `None` when the channel closed or the run was cancelled.
    pub async fn receive<T>(&self, rx: &mut mpsc::Receiver<T>) -> Option<T> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            item = rx.recv() => item,
        }
    }

    /// Like `receive`, for a receiver shared by a worker pool.
    pub async fn receive_shared<T>(&self, rx: &SharedReceiver<T>) -> Option<T> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            item = async { rx.lock().await.recv().await } => item,
        }
    }

    /// Runs a stage worker and reports its terminal error on the shared channel.
    pub async fn supervise<F>(&self, stage: &str, worker: F)
    where
        F: Future<Output = Result<()>>,
    {
        if let Err(err) = worker.await {
            log::debug!("stage {} stopped with error: {}", stage, err);
            self.errors.report(err).await;
        }
    }
}
