use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use anyhow::anyhow;

use super::loader;
use super::model::Dataset;
use crate::error::{LoadError, NotReady};

// ---------------------------------------------------------------------------
// Load lifecycle
// ---------------------------------------------------------------------------

/// `Uninitialized → Loading → Ready | Failed`. Each transition happens once.
#[derive(Debug)]
pub enum LoadState {
    Uninitialized,
    Loading { source_name: String },
    Ready(Dataset),
    Failed(LoadError),
}

type LoadResult = Result<Dataset, LoadError>;

// ---------------------------------------------------------------------------
// DatasetStore
// ---------------------------------------------------------------------------

/// Owns the session's dataset. The load runs on a background thread and
/// its result is consumed exactly once by [`DatasetStore::poll`].
pub struct DatasetStore {
    state: LoadState,
    pending: Option<Receiver<LoadResult>>,
}

impl Default for DatasetStore {
    fn default() -> Self {
        Self {
            state: LoadState::Uninitialized,
            pending: None,
        }
    }
}

impl DatasetStore {
    /// Start loading `source` (path or URL). `on_done` runs on the worker
    /// thread once the result has been handed over, e.g. to request a repaint.
    pub fn load(&mut self, source: &str, on_done: impl FnOnce() + Send + 'static) {
        let owned = source.to_string();
        self.load_with(source, move || loader::load_source(&owned), on_done);
    }

    /// Like [`DatasetStore::load`] with a caller-supplied load job.
    pub fn load_with<F, D>(&mut self, source_name: &str, job: F, on_done: D)
    where
        F: FnOnce() -> LoadResult + Send + 'static,
        D: FnOnce() + Send + 'static,
    {
        if !matches!(self.state, LoadState::Uninitialized) {
            log::warn!("Ignoring load of {source_name}: dataset load already started");
            return;
        }

        let (tx, rx) = mpsc::channel();
        let spawned = thread::Builder::new()
            .name("ndvi-loader".into())
            .spawn(move || {
                // The store may have been dropped; nothing left to notify then.
                if tx.send(job()).is_ok() {
                    on_done();
                }
            });

        match spawned {
            Ok(_) => {
                log::info!("Loading NDVI data from {source_name}");
                self.pending = Some(rx);
                self.state = LoadState::Loading {
                    source_name: source_name.to_string(),
                };
            }
            Err(e) => self.fail(LoadError::new(
                source_name,
                anyhow!(e).context("spawning loader thread"),
            )),
        }
    }

    /// Consume the load result if it has arrived. Returns `true` when the
    /// state changed during this call.
    pub fn poll(&mut self) -> bool {
        let Some(rx) = &self.pending else {
            return false;
        };

        let outcome = match rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return false,
            Err(TryRecvError::Disconnected) => {
                let source_name = match &self.state {
                    LoadState::Loading { source_name } => source_name.clone(),
                    _ => String::from("<unknown>"),
                };
                Err(LoadError::new(
                    source_name,
                    anyhow!("loader thread exited without a result"),
                ))
            }
        };
        self.pending = None;

        match outcome {
            Ok(dataset) => {
                log::info!("NDVI data loaded: {} locations", dataset.len());
                self.state = LoadState::Ready(dataset);
            }
            Err(e) => self.fail(e),
        }
        true
    }

    fn fail(&mut self, err: LoadError) {
        log::error!("Error loading NDVI data: {err}");
        self.pending = None;
        self.state = LoadState::Failed(err);
    }

    /// The dataset when the load has succeeded.
    pub fn get(&self) -> Result<&Dataset, NotReady> {
        match &self.state {
            LoadState::Ready(dataset) => Ok(dataset),
            _ => Err(NotReady),
        }
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }
}
