//! The plugin loader (C11): discovers executor implementations from
//! shared libraries at startup and registers them with C4.

pub mod error;
pub mod loader;

pub use error::PluginLoadError;
pub use loader::PluginLoader;
