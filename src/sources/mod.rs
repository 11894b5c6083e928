//! Environment sources the locator reads its roots from.

mod config_source;
mod env;

pub use config_source::EnvSource;
pub use env::{ProcessEnv, StaticEnv};
