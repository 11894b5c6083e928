//! Environment source implementations.

use super::EnvSource;
use std::collections::HashMap;
use std::ffi::OsString;

/// Reads variables from the running process's environment.
///
/// Values are passed through as-is, including ones that are not valid
/// Unicode.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<OsString> {
        std::env::var_os(key)
    }

    fn name(&self) -> String {
        "env:process".to_string()
    }
}

/// A fixed set of variables, independent of the process environment.
///
/// # Examples
///
/// ```rust
/// use progconf::sources::{EnvSource, StaticEnv};
/// use std::ffi::OsStr;
///
/// let env = StaticEnv::new().with_var("HOME", "/home/me");
/// assert_eq!(env.var("HOME").as_deref(), Some(OsStr::new("/home/me")));
/// assert_eq!(env.var("XDG_CONFIG_HOME"), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticEnv {
    vars: HashMap<String, OsString>,
}

impl StaticEnv {
    /// Create an empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable.
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<OsString>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }
}

impl<K, V> FromIterator<(K, V)> for StaticEnv
where
    K: Into<String>,
    V: Into<OsString>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl EnvSource for StaticEnv {
    fn var(&self, key: &str) -> Option<OsString> {
        self.vars.get(key).cloned()
    }

    fn name(&self) -> String {
        format!("env:static({} vars)", self.vars.len())
    }
}
