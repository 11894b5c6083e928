//! Environment lookup trait.

use std::ffi::OsString;

/// A snapshot of environment variables the locator resolves roots from.
///
/// Implement this trait to feed resolution from somewhere other than the
/// process environment, e.g. a fixed map in tests or a sandboxed launcher.
pub trait EnvSource: Send + Sync {
    /// Look up a variable, returning `None` if it is unset.
    ///
    /// Values are returned as raw OS strings so non-Unicode paths survive.
    /// An empty value is returned as `Some("")`; callers decide whether empty
    /// counts as set.
    fn var(&self, key: &str) -> Option<OsString>;

    /// Get a human-readable name for this source (for logging/debugging).
    fn name(&self) -> String;

    /// Look up a variable, treating an empty value the same as unset.
    fn non_empty(&self, key: &str) -> Option<OsString> {
        self.var(key).filter(|value| !value.is_empty())
    }
}
