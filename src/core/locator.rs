//! Layered resolution of a program's configuration file.

use crate::core::{ConfigHandle, LocatorBuilder};
use crate::error::{ConfigError, Result};
use crate::sources::EnvSource;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Default variable naming the user configuration root.
pub const USER_ROOT_VAR: &str = "XDG_CONFIG_HOME";

/// Default variable naming the user's home directory.
pub const HOME_VAR: &str = "HOME";

/// Default system-wide configuration root.
pub const SYSTEM_ROOT: &str = "/etc";

/// Resolves a program's configuration across user, system and scratch roots.
///
/// Resolution order for [`locate`](Self::locate):
///
/// 1. `<user root>/<program>/<file>` if it exists, where the user root is
///    `$XDG_CONFIG_HOME`, or `$HOME/.config` when that is empty.
/// 2. A fresh copy of the system configuration placed in the user root.
/// 3. A scratch copy of the system configuration under the temporary root.
/// 4. The system configuration itself, read-only.
///
/// # Examples
///
/// ```rust,no_run
/// use progconf::core::ConfigLocator;
///
/// # fn example() -> progconf::error::Result<()> {
/// let handle = ConfigLocator::new().locate("fonts", "fonts.conf")?;
/// println!("using {handle}");
/// # Ok(())
/// # }
/// ```
pub struct ConfigLocator {
    pub(crate) env: Box<dyn EnvSource>,
    pub(crate) user_root_var: String,
    pub(crate) home_var: String,
    pub(crate) system_root: PathBuf,
    pub(crate) temp_root: PathBuf,
}

impl ConfigLocator {
    /// Create a locator over the process environment with default roots.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Create a builder for customizing the environment and roots.
    pub fn builder() -> LocatorBuilder {
        LocatorBuilder::new()
    }

    /// System-wide configuration root.
    pub fn system_root(&self) -> &Path {
        &self.system_root
    }

    /// Scratch root temporary copies are placed in.
    pub fn temp_root(&self) -> &Path {
        &self.temp_root
    }

    /// Determine the user configuration root from the environment.
    ///
    /// Returns `None` when neither the user root variable nor the home
    /// variable is set to a non-empty value.
    pub fn user_root(&self) -> Option<PathBuf> {
        self.env
            .non_empty(&self.user_root_var)
            .map(PathBuf::from)
            .or_else(|| {
                self.env
                    .non_empty(&self.home_var)
                    .map(|home| Path::new(&home).join(".config"))
            })
    }

    /// Resolve the configuration for `program`/`file`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidHandle`] if `program` or `file` is empty
    /// and [`ConfigError::ResolutionError`] if no user configuration exists
    /// and there is no system configuration to fall back on.
    pub fn locate(&self, program: &str, file: &str) -> Result<ConfigHandle> {
        if let Some(user_root) = self.user_root() {
            debug!(root = %user_root.display(), source = %self.env.name(), "resolved user root");

            if let Some(user) = self.find_config(&user_root, program, file)? {
                info!(path = %user.path().display(), "using user configuration");
                return Ok(user);
            }

            match self.find_config(&self.system_root, program, file)? {
                Some(system) => match system.copy_to(&user_root, program, file) {
                    Ok(user) => {
                        info!(
                            path = %user.path().display(),
                            "seeded user configuration from system"
                        );
                        return Ok(user);
                    }
                    Err(e) => warn!(
                        root = %user_root.display(),
                        error = %e,
                        "could not seed user configuration"
                    ),
                },
                None => debug!(program, file, "no system configuration to seed user root from"),
            }
        } else {
            debug!(
                user_root_var = %self.user_root_var,
                home_var = %self.home_var,
                "no user root available"
            );
        }

        let system = self.find_config(&self.system_root, program, file)?.ok_or_else(|| {
            ConfigError::ResolutionError {
                program: program.to_string(),
                file: file.to_string(),
            }
        })?;

        match system.make_temporary() {
            Ok(temp) => {
                info!(
                    path = %temp.path().display(),
                    "using temporary copy of system configuration"
                );
                Ok(temp)
            }
            Err(e) => {
                warn!(
                    path = %system.path().display(),
                    error = %e,
                    "could not create temporary copy, using system configuration read-only"
                );
                Ok(system)
            }
        }
    }

    /// Build a handle under `root` and return it only if its file exists.
    fn find_config(&self, root: &Path, program: &str, file: &str) -> Result<Option<ConfigHandle>> {
        let handle = ConfigHandle::new(root, program, file)?.with_temp_root(&self.temp_root);
        Ok(handle.exists().then_some(handle))
    }
}

impl Default for ConfigLocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::StaticEnv;
    use std::fs;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        system: PathBuf,
        scratch: PathBuf,
        home: PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let system = dir.path().join("etc");
            let scratch = dir.path().join("tmp");
            let home = dir.path().join("home");
            for d in [&system, &scratch, &home] {
                fs::create_dir_all(d).unwrap();
            }
            Self {
                _dir: dir,
                system,
                scratch,
                home,
            }
        }

        fn locator(&self, env: StaticEnv) -> ConfigLocator {
            ConfigLocator::builder()
                .with_env(env)
                .with_system_root(&self.system)
                .with_temp_root(&self.scratch)
                .build()
        }

        fn seed(root: &Path, contents: &str) {
            fs::create_dir_all(root.join("app")).unwrap();
            fs::write(root.join("app").join("app.conf"), contents).unwrap();
        }
    }

    #[test]
    fn test_user_root_prefers_xdg() {
        let fx = Fixture::new();
        let env = StaticEnv::new()
            .with_var("XDG_CONFIG_HOME", "/xdg")
            .with_var("HOME", "/home/me");
        assert_eq!(fx.locator(env).user_root(), Some(PathBuf::from("/xdg")));
    }

    #[test]
    fn test_user_root_falls_back_to_home() {
        let fx = Fixture::new();
        let env = StaticEnv::new()
            .with_var("XDG_CONFIG_HOME", "")
            .with_var("HOME", "/home/me");
        assert_eq!(
            fx.locator(env).user_root(),
            Some(PathBuf::from("/home/me/.config"))
        );
    }

    #[test]
    fn test_user_root_unresolved() {
        let fx = Fixture::new();
        let env = StaticEnv::new().with_var("HOME", "");
        assert_eq!(fx.locator(env).user_root(), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_non_unicode_home_resolves() {
        use std::ffi::OsString;
        use std::os::unix::ffi::OsStringExt;

        let fx = Fixture::new();
        let home = OsString::from_vec(b"/home/caf\xe9".to_vec());
        let env = StaticEnv::new().with_var("HOME", home.clone());
        assert_eq!(
            fx.locator(env).user_root(),
            Some(PathBuf::from(home).join(".config"))
        );
    }

    // Some filesystems (APFS) refuse non-UTF-8 names
    #[cfg(target_os = "linux")]
    #[test]
    fn test_non_unicode_user_root_locates_config() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let fx = Fixture::new();
        let user_root = fx.home.join(OsStr::from_bytes(b"conf\xe9"));
        Fixture::seed(&user_root, "user");

        let env = StaticEnv::new().with_var("XDG_CONFIG_HOME", user_root.clone());
        let handle = fx.locator(env).locate("app", "app.conf").unwrap();
        assert_eq!(handle.path(), user_root.join("app").join("app.conf"));
        assert_eq!(handle.read().unwrap(), b"user");
    }

    #[test]
    fn test_custom_variable_names() {
        let fx = Fixture::new();
        let locator = ConfigLocator::builder()
            .with_env(StaticEnv::new().with_var("APP_CONFIG_DIR", "/srv/conf"))
            .with_user_root_var("APP_CONFIG_DIR")
            .with_system_root(&fx.system)
            .build();
        assert_eq!(locator.user_root(), Some(PathBuf::from("/srv/conf")));
    }

    #[test]
    fn test_existing_user_config_wins() {
        let fx = Fixture::new();
        let user_root = fx.home.join(".config");
        Fixture::seed(&user_root, "user");
        Fixture::seed(&fx.system, "system");

        let env = StaticEnv::new().with_var("HOME", fx.home.to_str().unwrap());
        let handle = fx.locator(env).locate("app", "app.conf").unwrap();

        assert_eq!(handle.path(), user_root.join("app").join("app.conf"));
        assert!(!handle.is_temporary());
        assert_eq!(handle.read().unwrap(), b"user");
    }

    #[test]
    fn test_user_config_seeded_from_system() {
        let fx = Fixture::new();
        Fixture::seed(&fx.system, "system");
        let xdg = fx.home.join("xdg");

        let env = StaticEnv::new().with_var("XDG_CONFIG_HOME", xdg.to_str().unwrap());
        let handle = fx.locator(env).locate("app", "app.conf").unwrap();

        assert_eq!(handle.path(), xdg.join("app").join("app.conf"));
        assert!(!handle.is_temporary());
        assert_eq!(handle.read().unwrap(), b"system");
    }

    #[test]
    fn test_no_system_config_is_resolution_error() {
        let fx = Fixture::new();
        let err = fx.locator(StaticEnv::new()).locate("app", "app.conf").unwrap_err();
        assert!(matches!(err, ConfigError::ResolutionError { .. }));
    }

    #[test]
    fn test_user_root_without_any_config_is_resolution_error() {
        let fx = Fixture::new();
        let env = StaticEnv::new().with_var("HOME", fx.home.to_str().unwrap());
        let err = fx.locator(env).locate("app", "app.conf").unwrap_err();
        assert!(matches!(err, ConfigError::ResolutionError { .. }));
        assert!(!fx.home.join(".config").join("app").exists());
    }

    #[test]
    fn test_no_user_root_gives_temporary_copy() {
        let fx = Fixture::new();
        Fixture::seed(&fx.system, "system");

        let handle = fx.locator(StaticEnv::new()).locate("app", "app.conf").unwrap();
        assert!(handle.is_temporary());
        assert_eq!(handle.path(), fx.scratch.join("app").join("app.conf"));
        assert_eq!(handle.read().unwrap(), b"system");
    }

    #[test]
    fn test_empty_names_are_rejected() {
        let fx = Fixture::new();
        let locator = fx.locator(StaticEnv::new());
        assert!(matches!(
            locator.locate("", "app.conf"),
            Err(ConfigError::InvalidHandle(_))
        ));
        assert!(matches!(
            locator.locate("app", ""),
            Err(ConfigError::InvalidHandle(_))
        ));
    }
}
