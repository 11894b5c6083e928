//! Configuration change notifications.
//!
//! Watches a resolved configuration file and streams its contents after
//! every external change.

pub mod stream;
pub mod watcher;

pub use stream::{ChangeEvent, ConfigData};
pub use watcher::{ChangeKind, WatchOptions};
