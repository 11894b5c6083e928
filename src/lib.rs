//! # progconf
//!
//! Layered per-program configuration file resolution with change watching.
//!
//! ## Overview
//!
//! A program asks for its configuration by program name and file name and
//! gets back a [`ConfigHandle`](core::ConfigHandle) for the best location
//! available:
//!
//! 1. `$XDG_CONFIG_HOME/<program>/<file>` (or `$HOME/.config/...`) if it exists
//! 2. a copy of `/etc/<program>/<file>` placed in that user directory
//! 3. a scratch copy of the system file under the temporary directory
//! 4. the system file itself, read-only
//!
//! The handle reads and writes the file as opaque bytes and can watch it for
//! external edits, streaming the new contents as they land.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use progconf::prelude::*;
//!
//! # async fn example() -> progconf::error::Result<()> {
//! let handle = progconf::get("fonts", "fonts.conf")?;
//! let current = handle.read()?;
//! println!("{} bytes from {}", current.len(), handle);
//!
//! // Stream contents after every external edit
//! let mut changes = handle.listen()?;
//! while let Some(contents) = changes.recv_data().await {
//!     println!("reloaded {} bytes", contents.len());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `file-watch` (default): [`ConfigHandle::listen`](core::ConfigHandle::listen)
//!   and the [`notify`] module, backed by the `notify` crate and tokio.

#![warn(missing_docs, rust_2024_compatibility)]
#![deny(unsafe_code)]

pub mod core;
pub mod error;
pub mod sources;

#[cfg(feature = "file-watch")]
pub mod notify;

/// Resolve `program`/`file` against the process environment and default roots.
///
/// Shorthand for `ConfigLocator::new().locate(program, file)`.
///
/// # Errors
///
/// See [`ConfigLocator::locate`](core::ConfigLocator::locate).
pub fn get(program: &str, file: &str) -> error::Result<core::ConfigHandle> {
    core::ConfigLocator::new().locate(program, file)
}

/// Convenient re-exports for common usage patterns.
pub mod prelude {
    pub use crate::core::{ConfigHandle, ConfigLocator, LocatorBuilder};
    pub use crate::error::{ConfigError, Result};
    pub use crate::sources::{EnvSource, ProcessEnv, StaticEnv};

    #[cfg(feature = "file-watch")]
    pub use crate::notify::{ChangeEvent, ConfigData, WatchOptions};
}
