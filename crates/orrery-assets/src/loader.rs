//! Background texture decoding backed by a small thread pool.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use orrery_scene::{TextureHandle, TextureImage, TextureImageError, TextureProvider};

#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    #[error("texture key '{0}' is not a plain file name")]
    InvalidKey(String),
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("decoded image is unusable: {0}")]
    Image(#[from] TextureImageError),
    #[error("loader has been shut down")]
    ShutDown,
}

/// Result of one load, reported back to the thread that owns the loader.
#[derive(Debug)]
pub struct LoadOutcome {
    pub key: String,
    /// `(width, height)` on success.
    pub result: Result<(u32, u32), LoaderError>,
}

struct LoadTask {
    key: String,
    path: PathBuf,
    handle: TextureHandle,
}

/// Resolves `<dir>/<key>.<extension>` on worker threads.
///
/// Each key is loaded at most once; repeated requests share the first handle.
/// A failed load leaves its handle empty for good, so the renderer keeps
/// drawing its fallback.
pub struct TextureLoader {
    dir: PathBuf,
    extension: String,
    handles: Mutex<HashMap<String, TextureHandle>>,
    task_sender: Option<crossbeam_channel::Sender<LoadTask>>,
    outcome_receiver: crossbeam_channel::Receiver<LoadOutcome>,
    outcome_sender: crossbeam_channel::Sender<LoadOutcome>,
    worker_handles: Vec<JoinHandle<()>>,
    in_flight: Arc<AtomicUsize>,
}

impl TextureLoader {
    /// Spawn `worker_count` decode threads (at least one) reading from `dir`.
    pub fn new(
        dir: impl Into<PathBuf>,
        extension: impl Into<String>,
        worker_count: usize,
    ) -> Self {
        let (task_tx, task_rx) = crossbeam_channel::unbounded::<LoadTask>();
        let (outcome_tx, outcome_rx) = crossbeam_channel::unbounded();
        let in_flight = Arc::new(AtomicUsize::new(0));

        let worker_count = worker_count.max(1);
        let mut handles = Vec::with_capacity(worker_count);
        for i in 0..worker_count {
            let rx = task_rx.clone();
            let tx = outcome_tx.clone();
            let flight = Arc::clone(&in_flight);

            let spawned = std::thread::Builder::new()
                .name(format!("texture-loader-{i}"))
                .spawn(move || {
                    while let Ok(task) = rx.recv() {
                        let result = decode(&task.path).map(|image| {
                            let size = (image.width(), image.height());
                            task.handle.resolve(image);
                            size
                        });
                        match &result {
                            Ok((w, h)) => {
                                tracing::debug!("Loaded texture '{}' ({w}x{h})", task.key)
                            }
                            Err(e) => tracing::warn!("Texture '{}' unavailable: {e}", task.key),
                        }
                        flight.fetch_sub(1, Ordering::Release);
                        let _ = tx.send(LoadOutcome {
                            key: task.key,
                            result,
                        });
                    }
                });

            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => tracing::error!("Failed to spawn texture loader thread: {e}"),
            }
        }

        Self {
            dir: dir.into(),
            extension: extension.into(),
            handles: Mutex::new(HashMap::new()),
            task_sender: Some(task_tx),
            outcome_receiver: outcome_rx,
            outcome_sender: outcome_tx,
            worker_handles: handles,
            in_flight,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File path a key resolves to.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.{}", self.extension))
    }

    /// Loads queued or running.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Collect finished loads. Called once per frame on the main thread.
    pub fn drain_outcomes(&self) -> Vec<LoadOutcome> {
        self.outcome_receiver.try_iter().collect()
    }

    /// Stop the workers after they finish what is already queued.
    pub fn shutdown(&mut self) {
        self.task_sender.take();
        for handle in self.worker_handles.drain(..) {
            let _ = handle.join();
        }
    }

    fn enqueue(&self, key: &str, handle: &TextureHandle) -> Result<(), LoaderError> {
        if key.is_empty() || key.contains(['/', '\\']) || key == "." || key == ".." {
            return Err(LoaderError::InvalidKey(key.to_string()));
        }
        let sender = self.task_sender.as_ref().ok_or(LoaderError::ShutDown)?;
        self.in_flight.fetch_add(1, Ordering::AcqRel);
        let task = LoadTask {
            key: key.to_string(),
            path: self.path_for(key),
            handle: handle.clone(),
        };
        if sender.send(task).is_err() {
            self.in_flight.fetch_sub(1, Ordering::AcqRel);
            return Err(LoaderError::ShutDown);
        }
        Ok(())
    }
}

impl TextureProvider for TextureLoader {
    fn texture(&self, key: &str) -> TextureHandle {
        let mut handles = self
            .handles
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(handle) = handles.get(key) {
            return handle.clone();
        }

        let handle = TextureHandle::empty(key);
        handles.insert(key.to_string(), handle.clone());
        drop(handles);

        if let Err(e) = self.enqueue(key, &handle) {
            tracing::warn!("Texture '{key}' not queued: {e}");
            let _ = self.outcome_sender.send(LoadOutcome {
                key: key.to_string(),
                result: Err(e),
            });
        }
        handle
    }
}

impl Drop for TextureLoader {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn decode(path: &Path) -> Result<TextureImage, LoaderError> {
    let rgba = image::open(path)
        .map_err(|source| LoaderError::Decode {
            path: path.to_path_buf(),
            source,
        })?
        .to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(TextureImage::new(width, height, rgba.into_raw())?)
}
