//! Consumer side of a configuration watch.

use crate::error::ConfigError;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// One item published by a watch task.
#[derive(Debug)]
pub enum ChangeEvent {
    /// The file's contents after a change.
    Content(Vec<u8>),
    /// Re-reading the file failed, or the notification backend reported an error.
    Error(ConfigError),
}

/// The content and error streams of a running watch.
///
/// Returned by [`ConfigHandle::listen`](crate::core::ConfigHandle::listen).
/// Values are handed over one at a time: the watch task does not look at the
/// next filesystem notification until the current value has been received,
/// so a slow consumer slows the watch down instead of queueing stale content.
///
/// Dropping this value, or calling [`cancel`](Self::cancel), stops the
/// background task and releases the filesystem subscription.
///
/// # Examples
///
/// ```rust,no_run
/// use progconf::notify::ChangeEvent;
/// use progconf::prelude::*;
///
/// # async fn example() -> Result<()> {
/// let handle = progconf::get("fonts", "fonts.conf")?;
/// let mut changes = handle.listen()?;
///
/// while let Some(event) = changes.next_event().await {
///     match event {
///         ChangeEvent::Content(bytes) => println!("{} bytes", bytes.len()),
///         ChangeEvent::Error(e) => eprintln!("watch error: {e}"),
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub struct ConfigData {
    data: mpsc::Receiver<Vec<u8>>,
    errors: mpsc::Receiver<ConfigError>,
    cancel: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl ConfigData {
    pub(crate) fn new(
        data: mpsc::Receiver<Vec<u8>>,
        errors: mpsc::Receiver<ConfigError>,
        cancel: oneshot::Sender<()>,
        task: JoinHandle<()>,
    ) -> Self {
        Self {
            data,
            errors,
            cancel: Some(cancel),
            task,
        }
    }

    /// Wait for the next file contents.
    ///
    /// Returns `None` once the watch has stopped.
    pub async fn recv_data(&mut self) -> Option<Vec<u8>> {
        self.data.recv().await
    }

    /// Wait for the next error.
    ///
    /// Returns `None` once the watch has stopped.
    pub async fn recv_error(&mut self) -> Option<ConfigError> {
        self.errors.recv().await
    }

    /// Wait for the next content or error, whichever is published first.
    ///
    /// Returns `None` once the watch has stopped.
    pub async fn next_event(&mut self) -> Option<ChangeEvent> {
        tokio::select! {
            Some(bytes) = self.data.recv() => Some(ChangeEvent::Content(bytes)),
            Some(err) = self.errors.recv() => Some(ChangeEvent::Error(err)),
            else => None,
        }
    }

    /// Ask the watch task to stop. Values already handed over stay receivable.
    pub fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
    }

    /// Returns true once the watch task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop the watch task and wait for it to release its subscription.
    pub async fn shutdown(mut self) {
        self.cancel();
        // A join error only means the task panicked; its watcher is dropped either way.
        let _ = self.task.await;
    }
}
