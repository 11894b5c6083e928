//! Configuration resolution and access.

mod builder;
mod config_handle;
pub(crate) mod locator;
mod path;

pub use builder::LocatorBuilder;
pub use config_handle::ConfigHandle;
pub use locator::{ConfigLocator, HOME_VAR, SYSTEM_ROOT, USER_ROOT_VAR};
pub use path::{build_path, split_path};
