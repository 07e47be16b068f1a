//! Watch loop: the asynchronous half of rebuild coordination.
//!
//! Runs the preview server, listens for file system changes under the source
//! directory and asks the [`Builder`] for a rebuild on each qualifying one.

use std::{
    path::{Component, Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use blogsmith_generator::Builder;
use chrono::{DateTime, Utc};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher as _, event::ModifyKind};
use thiserror::Error;
use tokio::{
    net::TcpListener,
    sync::{mpsc, oneshot},
};

use crate::server::{ServerState, create_router, serve};

/// Changes this soon after a finished build are dropped.
pub const DEBOUNCE: Duration = Duration::from_secs(1);

/// Ways the watch loop ends.
#[derive(Debug, Error)]
pub enum WatchError {
    /// The stop signal fired and the server has shut down.
    #[error("server closed")]
    ServerClosed,

    /// The file watching backend failed.
    #[error("watch error: {0}")]
    Notify(#[from] notify::Error),
}

/// Watches a source tree and keeps the preview up to date.
pub struct Watcher {
    builder: Arc<Builder>,
    src: PathBuf,
    addr: String,
    debounce: Duration,
}

impl Watcher {
    #[must_use]
    pub fn new(builder: Arc<Builder>, src: impl Into<PathBuf>, addr: impl Into<String>) -> Self {
        Self {
            builder,
            src: src.into(),
            addr: addr.into(),
            debounce: DEBOUNCE,
        }
    }

    /// Replace the default one second debounce window.
    #[must_use]
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Serve and watch until `stop` fires or the backend fails.
    ///
    /// Stopping returns [`WatchError::ServerClosed`]. Rebuild failures are
    /// logged and never end the loop.
    pub async fn run(self, stop: oneshot::Receiver<()>) -> Result<(), WatchError> {
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let server = tokio::spawn(run_server(
            self.addr.clone(),
            ServerState::new(Arc::clone(self.builder.writer()), self.builder.options().ext.clone()),
            shutdown_rx,
        ));

        let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();
        let (error_tx, mut error_rx) = mpsc::unbounded_channel::<notify::Error>();
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    let _ = event_tx.send(event);
                }
                Err(e) => {
                    let _ = error_tx.send(e);
                }
            },
            notify::Config::default(),
        )?;
        watcher.watch(&self.src, RecursiveMode::Recursive)?;
        tracing::info!(src = %self.src.display(), "watching for changes");

        spawn_rebuild(Arc::clone(&self.builder)).await;

        let excluded: Vec<PathBuf> = self
            .builder
            .options()
            .exclude
            .iter()
            .map(|prefix| self.src.join(prefix))
            .collect();
        let mut stop = stop;

        let result = loop {
            tokio::select! {
                Some(event) = event_rx.recv() => {
                    if !self.is_relevant(&event, &excluded) {
                        continue;
                    }
                    if !qualifies(&event.kind, Utc::now(), self.builder.last_built(), self.debounce) {
                        tracing::trace!(kind = ?event.kind, "dropping change event");
                        continue;
                    }
                    tracing::info!(paths = ?event.paths, "change detected, rebuilding");
                    tokio::spawn(spawn_rebuild(Arc::clone(&self.builder)));
                }
                Some(err) = error_rx.recv() => {
                    tracing::error!(error = %err, "file watcher failed");
                    break Err(WatchError::Notify(err));
                }
                _ = &mut stop => {
                    tracing::info!("stopping watch loop");
                    break Err(WatchError::ServerClosed);
                }
            }
        };

        drop(watcher);
        let _ = shutdown_tx.send(());
        if let Err(e) = server.await {
            tracing::error!(error = %e, "server task failed");
        }

        result
    }

    /// Whether any changed path is visible and outside the output tree.
    fn is_relevant(&self, event: &Event, excluded: &[PathBuf]) -> bool {
        event.paths.iter().any(|path| {
            !is_hidden(&self.src, path) && !excluded.iter().any(|prefix| path.starts_with(prefix))
        })
    }
}

/// Whether a change of `kind` at `now` should trigger a rebuild.
///
/// Metadata-only and access events never do. Anything within `window` of
/// the last completed build is dropped.
#[must_use]
pub fn qualifies(kind: &EventKind, now: DateTime<Utc>, last_built: Option<DateTime<Utc>>, window: Duration) -> bool {
    if matches!(kind, EventKind::Modify(ModifyKind::Metadata(_)) | EventKind::Access(_)) {
        return false;
    }

    match last_built {
        Some(built) => (now - built).to_std().is_ok_and(|elapsed| elapsed >= window),
        None => true,
    }
}

/// Whether `path` has a hidden segment below `root`.
fn is_hidden(root: &Path, path: &Path) -> bool {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components().any(|c| match c {
        Component::Normal(name) => name.to_string_lossy().starts_with('.'),
        _ => false,
    })
}

async fn spawn_rebuild(builder: Arc<Builder>) {
    match tokio::task::spawn_blocking(move || builder.rebuild()).await {
        Ok(Ok(stats)) => {
            tracing::info!(files = stats.files, duration_ms = stats.duration_ms, "rebuilt site");
        }
        Ok(Err(e)) if e.is_building() => tracing::warn!("skipping rebuild: {e}"),
        Ok(Err(e)) => tracing::error!(error = %e, "rebuild failed"),
        Err(e) => tracing::error!(error = %e, "rebuild task panicked"),
    }
}

async fn run_server(addr: String, state: ServerState, shutdown: oneshot::Receiver<()>) {
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(addr = %addr, error = %e, "failed to bind preview server");
            return;
        }
    };
    match listener.local_addr() {
        Ok(local) => tracing::info!(addr = %local, "preview server listening"),
        Err(_) => tracing::info!(addr = %addr, "preview server listening"),
    }

    let shutdown = async move {
        let _ = shutdown.await;
    };
    if let Err(e) = serve(listener, create_router(state), shutdown).await {
        tracing::error!(error = %e, "preview server failed");
    }
}
