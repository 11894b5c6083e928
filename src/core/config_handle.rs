//! A resolved configuration location and the lock guarding its backing file.

use crate::core::path::{build_path, split_path};
use crate::error::{ConfigError, Result};
use parking_lot::RwLock;
use std::fmt;
use std::fs::{self, DirBuilder, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// A configuration file at `<root>/<program>/<file>`.
///
/// The handle treats the file as an opaque byte sequence. Reads and writes made
/// through the handle are serialized by a reader/writer lock owned by the
/// handle. Clones share that lock; a second handle constructed for the same
/// path does not, and neither does another process.
///
/// # Examples
///
/// ```rust,no_run
/// use progconf::core::ConfigHandle;
///
/// # fn example() -> progconf::error::Result<()> {
/// let handle = ConfigHandle::new("/home/me/.config", "fonts", "fonts.conf")?;
/// if handle.exists() {
///     let bytes = handle.read()?;
///     handle.write(&bytes)?;
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ConfigHandle {
    root: PathBuf,
    program: String,
    file: String,
    /// True when `root` is the scratch root copies are made into
    is_temporary: bool,
    temp_root: PathBuf,
    lock: Arc<RwLock<()>>,
}

impl ConfigHandle {
    /// Create a handle for `<root>/<program>/<file>`.
    ///
    /// The temporary root used by [`make_temporary`](Self::make_temporary)
    /// defaults to [`std::env::temp_dir`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidHandle`] if any component is empty.
    pub fn new(root: impl Into<PathBuf>, program: &str, file: &str) -> Result<Self> {
        let root = root.into();
        if root.as_os_str().is_empty() {
            return Err(ConfigError::InvalidHandle("empty root".to_string()));
        }
        if program.is_empty() {
            return Err(ConfigError::InvalidHandle("empty program name".to_string()));
        }
        if file.is_empty() {
            return Err(ConfigError::InvalidHandle("empty file name".to_string()));
        }

        Ok(Self {
            root,
            program: program.to_string(),
            file: file.to_string(),
            is_temporary: false,
            temp_root: PathBuf::new(),
            lock: Arc::new(RwLock::new(())),
        }
        .with_temp_root(std::env::temp_dir()))
    }

    /// Create a handle from a full `<root>/<program>/<file>` path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DecompositionError`] if the path has fewer than
    /// three segments.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let (root, program, file) = split_path(path)?;
        Self::new(root, &program, &file)
    }

    /// Set the scratch root that [`make_temporary`](Self::make_temporary) copies into.
    pub fn with_temp_root(mut self, temp_root: impl Into<PathBuf>) -> Self {
        self.temp_root = temp_root.into();
        self.is_temporary = self.root == self.temp_root;
        self
    }

    /// Full path of the backing file.
    pub fn path(&self) -> PathBuf {
        build_path(&self.root, &self.program, &self.file)
    }

    /// Directory the program's configuration directory lives in.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Program name, used as the configuration directory name.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Base name of the configuration file.
    pub fn file(&self) -> &str {
        &self.file
    }

    /// Scratch root used for temporary copies.
    pub fn temp_root(&self) -> &Path {
        &self.temp_root
    }

    /// Whether this handle lives under the scratch root rather than a
    /// durable user or system location.
    pub fn is_temporary(&self) -> bool {
        self.is_temporary
    }

    /// Returns true if the backing file can be stat'ed.
    ///
    /// Any stat failure, including permission errors, is reported as `false`.
    pub fn exists(&self) -> bool {
        fs::metadata(self.path()).is_ok()
    }

    /// Read the whole backing file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::IoError`] if the file cannot be read.
    pub fn read(&self) -> Result<Vec<u8>> {
        let _guard = self.lock.read();
        Ok(fs::read(self.path())?)
    }

    /// Replace the contents of the backing file, returning the number of bytes written.
    ///
    /// The parent directory must already exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::IoError`] if the file cannot be created or written.
    pub fn write(&self, contents: &[u8]) -> Result<usize> {
        // Held across the truncating open too, so readers never see the empty file.
        let _guard = self.lock.write();
        let mut file = File::create(self.path())?;
        file.write_all(contents)?;
        Ok(contents.len())
    }

    /// Copy this configuration to `<root>/<program>/<file>` and return a handle to the copy.
    ///
    /// The program directory is created with owner-only permissions if it is
    /// missing. An existing destination file is truncated, unless it is this
    /// handle's own file (directly or through a symlink), which is left as is.
    /// The new handle keeps this handle's scratch root, and is temporary iff
    /// `root` is it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidHandle`] for empty components and
    /// [`ConfigError::IoError`] if the directory, source or destination
    /// cannot be created, opened or copied.
    pub fn copy_to(&self, root: impl Into<PathBuf>, program: &str, file: &str) -> Result<Self> {
        let copy = Self::new(root, program, file)?.with_temp_root(&self.temp_root);

        // Truncating the destination would wipe the source it aliases.
        if same_file(&self.path(), &copy.path()) {
            fs::metadata(self.path())?;
            debug!(
                path = %copy.path().display(),
                "copy target is the source, nothing to copy"
            );
            return Ok(copy);
        }

        create_private_dir(&copy.root.join(&copy.program))?;

        let copied = {
            let _source_guard = self.lock.read();
            let mut source = File::open(self.path())?;

            let _dest_guard = copy.lock.write();
            let mut dest = File::create(copy.path())?;
            io::copy(&mut source, &mut dest)?
        };

        debug!(
            from = %self.path().display(),
            to = %copy.path().display(),
            bytes = copied,
            "copied configuration"
        );

        Ok(copy)
    }

    /// Copy this configuration into the scratch root under the same program and file name.
    ///
    /// # Errors
    ///
    /// See [`copy_to`](Self::copy_to).
    pub fn make_temporary(&self) -> Result<Self> {
        self.copy_to(self.temp_root.clone(), &self.program, &self.file)
    }
}

impl fmt::Display for ConfigHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path().display())
    }
}

impl fmt::Debug for ConfigHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigHandle")
            .field("path", &self.path())
            .field("is_temporary", &self.is_temporary)
            .finish()
    }
}

/// Whether `a` and `b` name the same file, following symlinks when both exist.
fn same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Create `dir` and any missing parents. Existing directories are not an error.
fn create_private_dir(dir: &Path) -> io::Result<()> {
    let mut builder = DirBuilder::new();
    builder.recursive(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }

    builder.create(dir)
}
