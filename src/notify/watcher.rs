//! File watching for a resolved configuration.

use crate::core::ConfigHandle;
use crate::error::{ConfigError, Result};
use crate::notify::ConfigData;
use notify::event::ModifyKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher as NotifyWatcher};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace, warn};

/// Default time to wait after a change before re-reading the file.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(50);

/// Default cap on settle delays spent waiting for a file to stop changing.
pub const DEFAULT_MAX_SETTLE_ROUNDS: u32 = 5;

/// The notification kinds that trigger a re-read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// The file's contents were written.
    Modified,
    /// The file was renamed.
    Moved,
    /// The file was deleted.
    Removed,
}

impl ChangeKind {
    /// Map a raw `notify` event kind to a change, or `None` for kinds that are ignored.
    ///
    /// Metadata updates, opens, closes, accesses and creations never trigger
    /// a re-read.
    pub fn classify(kind: &EventKind) -> Option<Self> {
        match kind {
            EventKind::Modify(ModifyKind::Data(_) | ModifyKind::Any) => Some(Self::Modified),
            EventKind::Modify(ModifyKind::Name(_)) => Some(Self::Moved),
            EventKind::Remove(_) => Some(Self::Removed),
            _ => None,
        }
    }

    /// Whether the subscription may now point at an inode that no longer lives at the path.
    fn detaches(self) -> bool {
        matches!(self, Self::Moved | Self::Removed)
    }
}

/// Tuning for a watch started with [`ConfigHandle::listen_with`].
///
/// # Examples
///
/// ```rust
/// use progconf::notify::WatchOptions;
/// use std::time::Duration;
///
/// let options = WatchOptions::default()
///     .with_settle_delay(Duration::from_millis(20))
///     .with_initial_read(true);
/// assert_eq!(options.settle_delay(), Duration::from_millis(20));
/// ```
#[derive(Debug, Clone)]
pub struct WatchOptions {
    settle_delay: Duration,
    max_settle_rounds: u32,
    emit_initial: bool,
}

impl WatchOptions {
    /// Time to wait after a change, and between stability checks, before reading.
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Maximum number of settle delays to wait while the file's size or
    /// modification time keeps changing. Values below 1 are treated as 1.
    pub fn with_max_settle_rounds(mut self, rounds: u32) -> Self {
        self.max_settle_rounds = rounds;
        self
    }

    /// Publish the current contents once as soon as the watch starts.
    pub fn with_initial_read(mut self, enabled: bool) -> Self {
        self.emit_initial = enabled;
        self
    }

    /// Get the settle delay.
    pub fn settle_delay(&self) -> Duration {
        self.settle_delay
    }

    /// Get the maximum number of settle rounds.
    pub fn max_settle_rounds(&self) -> u32 {
        self.max_settle_rounds
    }

    /// Whether the current contents are published when the watch starts.
    pub fn initial_read(&self) -> bool {
        self.emit_initial
    }
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            settle_delay: DEFAULT_SETTLE_DELAY,
            max_settle_rounds: DEFAULT_MAX_SETTLE_ROUNDS,
            emit_initial: false,
        }
    }
}

impl ConfigHandle {
    /// Watch the backing file and stream its contents after every change.
    ///
    /// Equivalent to [`listen_with`](Self::listen_with) using
    /// [`WatchOptions::default`].
    ///
    /// # Errors
    ///
    /// See [`listen_with`](Self::listen_with).
    pub fn listen(&self) -> Result<ConfigData> {
        self.listen_with(WatchOptions::default())
    }

    /// Watch the backing file with custom options.
    ///
    /// Writes, renames and deletions of the file each lead to one re-read,
    /// published on the content stream or, if the read fails, on the error
    /// stream. Changes already queued while waiting for the file to settle
    /// are folded into the same read. Edits made before this call are not
    /// replayed unless [`WatchOptions::with_initial_read`] is set.
    ///
    /// Must be called from within a tokio runtime; the watch runs as a task
    /// on that runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::SubscriptionError`] if there is no runtime, the
    /// file does not exist, or the notification backend refuses the watch.
    pub fn listen_with(&self, options: WatchOptions) -> Result<ConfigData> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
            ConfigError::SubscriptionError(format!("No runtime to run the watch on: {}", e))
        })?;

        let path = self.path().canonicalize().map_err(|e| {
            ConfigError::SubscriptionError(format!(
                "Failed to resolve {}: {}",
                self.path().display(),
                e
            ))
        })?;

        // Raw events from notify's own thread, in delivery order
        let (event_tx, events) = mpsc::unbounded_channel::<notify::Result<Event>>();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let _ = event_tx.send(res);
        })
        .map_err(|e| {
            ConfigError::SubscriptionError(format!("Failed to create file watcher: {}", e))
        })?;

        watcher
            .watch(&path, RecursiveMode::NonRecursive)
            .map_err(|e| {
                ConfigError::SubscriptionError(format!(
                    "Failed to watch {}: {}",
                    path.display(),
                    e
                ))
            })?;

        let (data_tx, data_rx) = mpsc::channel(1);
        let (error_tx, error_rx) = mpsc::channel(1);
        let (cancel_tx, cancel_rx) = oneshot::channel();

        debug!(path = %path.display(), "watching configuration");

        let task = ChangeWatcher {
            handle: self.clone(),
            path,
            watcher,
            events,
            data: data_tx,
            errors: error_tx,
            cancel: cancel_rx,
            options,
        };

        Ok(ConfigData::new(data_rx, error_rx, cancel_tx, runtime.spawn(task.run())))
    }
}

/// The consumer went away or asked the watch to stop.
struct Stopped;

type Step<T = ()> = std::result::Result<T, Stopped>;

/// Background state of one watch. Owns the `notify` subscription, which is
/// released when the task ends.
struct ChangeWatcher {
    handle: ConfigHandle,
    path: PathBuf,
    watcher: RecommendedWatcher,
    events: mpsc::UnboundedReceiver<notify::Result<Event>>,
    data: mpsc::Sender<Vec<u8>>,
    errors: mpsc::Sender<ConfigError>,
    cancel: oneshot::Receiver<()>,
    options: WatchOptions,
}

impl ChangeWatcher {
    async fn run(mut self) {
        let _ = self.watch().await;
        debug!(path = %self.path.display(), "watch stopped");
    }

    async fn watch(&mut self) -> Step {
        if self.options.emit_initial {
            self.publish_current().await?;
        }

        loop {
            let next = tokio::select! {
                biased;
                _ = &mut self.cancel => return Err(Stopped),
                next = self.events.recv() => next,
            };

            match next.ok_or(Stopped)? {
                Ok(event) => self.on_event(event).await?,
                Err(e) => self.publish_error(backend_error(e)).await?,
            }
        }
    }

    async fn on_event(&mut self, event: Event) -> Step {
        let Some(kind) = ChangeKind::classify(&event.kind) else {
            trace!(kind = ?event.kind, "ignoring notification");
            return Ok(());
        };
        debug!(?kind, path = %self.path.display(), "configuration changed");

        self.settle().await?;
        let detached = self.collapse_queued().await? || kind.detaches();
        if detached {
            self.rearm().await?;
        }
        self.publish_current().await
    }

    /// Wait until the file's size and modification time stop changing.
    async fn settle(&mut self) -> Step {
        let mut previous = snapshot(&self.path);
        for _ in 0..self.options.max_settle_rounds.max(1) {
            self.sleep(self.options.settle_delay).await?;
            let current = snapshot(&self.path);
            if current == previous {
                break;
            }
            previous = current;
        }
        Ok(())
    }

    /// Drain notifications that arrived while settling. Returns true if any of
    /// them moved or removed the file.
    async fn collapse_queued(&mut self) -> Step<bool> {
        let mut detached = false;
        while let Ok(queued) = self.events.try_recv() {
            match queued {
                Ok(event) => {
                    if let Some(kind) = ChangeKind::classify(&event.kind) {
                        trace!(?kind, "collapsing queued change");
                        detached |= kind.detaches();
                    }
                }
                Err(e) => self.publish_error(backend_error(e)).await?,
            }
        }
        Ok(detached)
    }

    /// Point the subscription at whatever file now lives at the path.
    async fn rearm(&mut self) -> Step {
        if !self.path.exists() {
            return Ok(());
        }

        // The old watch may already be gone; only the new one matters.
        let _ = self.watcher.unwatch(&self.path);
        match self.watcher.watch(&self.path, RecursiveMode::NonRecursive) {
            Ok(()) => {
                debug!(path = %self.path.display(), "re-armed watch on replaced file");
                Ok(())
            }
            Err(e) => {
                let err = ConfigError::SubscriptionError(format!(
                    "Failed to re-watch {}: {}",
                    self.path.display(),
                    e
                ));
                self.publish_error(err).await
            }
        }
    }

    /// Re-read the file once the consumer has taken the previous contents.
    async fn publish_current(&mut self) -> Step {
        let slot = tokio::select! {
            biased;
            _ = &mut self.cancel => return Err(Stopped),
            slot = self.data.reserve() => slot.map_err(|_| Stopped)?,
        };

        let handle = self.handle.clone();
        let read = tokio::task::spawn_blocking(move || handle.read())
            .await
            .unwrap_or_else(|e| Err(std::io::Error::other(e.to_string()).into()));

        match read {
            Ok(contents) => {
                trace!(bytes = contents.len(), "publishing configuration");
                slot.send(contents);
                Ok(())
            }
            Err(e) => {
                drop(slot);
                warn!(path = %self.path.display(), error = %e, "could not re-read configuration");
                self.publish_error(e).await
            }
        }
    }

    async fn publish_error(&mut self, err: ConfigError) -> Step {
        let slot = tokio::select! {
            biased;
            _ = &mut self.cancel => return Err(Stopped),
            slot = self.errors.reserve() => slot.map_err(|_| Stopped)?,
        };
        slot.send(err);
        Ok(())
    }

    async fn sleep(&mut self, delay: Duration) -> Step {
        tokio::select! {
            biased;
            _ = &mut self.cancel => Err(Stopped),
            _ = tokio::time::sleep(delay) => Ok(()),
        }
    }
}

fn backend_error(e: notify::Error) -> ConfigError {
    ConfigError::SubscriptionError(format!("Notification backend error: {}", e))
}

fn snapshot(path: &Path) -> Option<(u64, Option<SystemTime>)> {
    fs::metadata(path)
        .ok()
        .map(|meta| (meta.len(), meta.modified().ok()))
}
