//! Background image loading.
//!
//! This module provides a `LoadManager` that owns a background thread with a Tokio
//! runtime. Every load request becomes its own task; finished images travel back
//! to the UI thread over a channel and are picked up with [`LoadManager::poll_events`].
//! Loads are never cancelled and have no timeout; when several overlap, whichever
//! finishes last is the one the UI ends up showing.

use image::DynamicImage;
use reqwest::Url;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::runtime::Runtime;
use tokio::sync::mpsc;

use crate::error::{MemeError, Result};

/// Where a picture comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Path(PathBuf),
    /// A remote `http`/`https` image.
    Url(Url),
}

impl ImageSource {
    /// Parses a dropped or typed URL. `file:` URLs become local paths.
    pub fn from_url(url: &str) -> Result<Self> {
        let parsed = Url::parse(url.trim()).map_err(|e| MemeError::InvalidUrl(format!("{url}: {e}")))?;
        match parsed.scheme() {
            "file" => parsed
                .to_file_path()
                .map(ImageSource::Path)
                .map_err(|_| MemeError::InvalidUrl(url.to_string())),
            "http" | "https" => Ok(ImageSource::Url(parsed)),
            other => Err(MemeError::InvalidUrl(format!("{url}: unsupported scheme {other}"))),
        }
    }
}

impl fmt::Display for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageSource::Path(path) => write!(f, "{}", path.display()),
            ImageSource::Url(url) => write!(f, "{url}"),
        }
    }
}

/// Events sent from the load manager to the UI.
#[derive(Debug, Clone)]
pub enum LoadEvent {
    /// The image was fetched and decoded.
    Loaded { source: ImageSource, image: DynamicImage },
    /// Reading, fetching or decoding failed.
    Failed { source: ImageSource, error: String },
    /// The background service itself could not run.
    Error(String),
}

/// Commands sent from the UI to the load manager.
#[derive(Debug)]
pub enum LoadCommand {
    Load(ImageSource),
    Shutdown,
}

pub struct LoadManager {
    /// Channel to send commands to the background runtime.
    command_tx: mpsc::UnboundedSender<LoadCommand>,
    /// Channel to receive events from the background runtime.
    event_rx: Arc<Mutex<mpsc::UnboundedReceiver<LoadEvent>>>,
}

impl LoadManager {
    /// Creates and starts a new LoadManager.
    ///
    /// `notify` is called from the background thread after every event, typically
    /// to wake the UI up so it polls.
    pub fn new<F>(notify: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        let (command_tx, mut command_rx) = mpsc::unbounded_channel::<LoadCommand>();
        let (event_tx, event_rx) = mpsc::unbounded_channel::<LoadEvent>();
        let notify = Arc::new(notify);

        std::thread::spawn(move || {
            let rt = match Runtime::new() {
                Ok(rt) => rt,
                Err(e) => {
                    log::error!("failed to create load runtime: {e}");
                    let _ = event_tx.send(LoadEvent::Error(format!("Failed to create runtime: {}", e)));
                    notify();
                    return;
                }
            };

            rt.block_on(async move {
                while let Some(cmd) = command_rx.recv().await {
                    match cmd {
                        LoadCommand::Load(source) => {
                            let event_tx = event_tx.clone();
                            let notify = notify.clone();
                            tokio::spawn(async move {
                                log::debug!("loading {source}");
                                let result = load_source(&source).await;
                                let event = match result {
                                    Ok(image) => LoadEvent::Loaded { source, image },
                                    Err(e) => LoadEvent::Failed { source, error: e.to_string() },
                                };
                                let _ = event_tx.send(event);
                                notify();
                            });
                        }
                        LoadCommand::Shutdown => {
                            break;
                        }
                    }
                }
            });
        });

        Self {
            command_tx,
            event_rx: Arc::new(Mutex::new(event_rx)),
        }
    }

    /// Queues a load. Returns immediately.
    pub fn load(&self, source: ImageSource) -> Result<()> {
        self.command_tx
            .send(LoadCommand::Load(source))
            .map_err(|e| MemeError::Runtime(format!("Failed to send command: {}", e)))
    }

    /// Polls for events from the background task (non-blocking).
    pub fn poll_events(&self) -> Vec<LoadEvent> {
        let mut events = Vec::new();
        if let Ok(mut rx) = self.event_rx.lock() {
            while let Ok(event) = rx.try_recv() {
                events.push(event);
            }
        }
        events
    }

    /// Shuts down the load manager. Loads still in flight are dropped with the runtime.
    pub fn shutdown(&self) {
        let _ = self.command_tx.send(LoadCommand::Shutdown);
    }
}

impl Drop for LoadManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn load_source(source: &ImageSource) -> Result<DynamicImage> {
    let bytes = match source {
        ImageSource::Path(path) => tokio::fs::read(path).await?,
        ImageSource::Url(url) => reqwest::get(url.clone()).await?.error_for_status()?.bytes().await?.to_vec(),
    };

    tokio::task::spawn_blocking(move || image::load_from_memory(&bytes))
        .await
        .map_err(|e| MemeError::Runtime(e.to_string()))?
        .map_err(MemeError::from)
}
