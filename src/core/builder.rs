//! Builder for constructing ConfigLocator instances.

use crate::core::ConfigLocator;
use crate::core::locator::{HOME_VAR, SYSTEM_ROOT, USER_ROOT_VAR};
use crate::sources::{EnvSource, ProcessEnv};
use std::path::PathBuf;

/// Builder for constructing a [`ConfigLocator`].
///
/// Every setting has a default matching the conventional Unix layout, so
/// `LocatorBuilder::new().build()` is equivalent to [`ConfigLocator::new`].
///
/// # Examples
///
/// ```rust
/// use progconf::core::ConfigLocator;
/// use progconf::sources::StaticEnv;
///
/// let locator = ConfigLocator::builder()
///     .with_env(StaticEnv::new().with_var("HOME", "/home/me"))
///     .with_system_root("/usr/local/etc")
///     .with_temp_root("/var/tmp")
///     .build();
///
/// assert_eq!(
///     locator.user_root().unwrap(),
///     std::path::PathBuf::from("/home/me/.config")
/// );
/// ```
pub struct LocatorBuilder {
    env: Option<Box<dyn EnvSource>>,
    user_root_var: String,
    home_var: String,
    system_root: PathBuf,
    temp_root: Option<PathBuf>,
}

impl LocatorBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            env: None,
            user_root_var: USER_ROOT_VAR.to_string(),
            home_var: HOME_VAR.to_string(),
            system_root: PathBuf::from(SYSTEM_ROOT),
            temp_root: None,
        }
    }

    /// Read variables from `env` instead of the process environment.
    pub fn with_env<E: EnvSource + 'static>(mut self, env: E) -> Self {
        self.env = Some(Box::new(env));
        self
    }

    /// Name of the variable holding the user configuration root (default `XDG_CONFIG_HOME`).
    pub fn with_user_root_var(mut self, name: impl Into<String>) -> Self {
        self.user_root_var = name.into();
        self
    }

    /// Name of the variable holding the home directory (default `HOME`).
    pub fn with_home_var(mut self, name: impl Into<String>) -> Self {
        self.home_var = name.into();
        self
    }

    /// System-wide configuration root (default `/etc`).
    pub fn with_system_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.system_root = root.into();
        self
    }

    /// Scratch root for temporary copies (default [`std::env::temp_dir`]).
    pub fn with_temp_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.temp_root = Some(root.into());
        self
    }

    /// Build the locator.
    pub fn build(self) -> ConfigLocator {
        ConfigLocator {
            env: self.env.unwrap_or_else(|| Box::new(ProcessEnv)),
            user_root_var: self.user_root_var,
            home_var: self.home_var,
            system_root: self.system_root,
            temp_root: self.temp_root.unwrap_or_else(std::env::temp_dir),
        }
    }
}

impl Default for LocatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
