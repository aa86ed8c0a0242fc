//! Plugin-loading errors.

/// Errors from the dynamic loading layer.
#[derive(Debug, thiserror::Error)]
pub enum PluginLoadError {
    /// Library file not found or failed to open.
    #[error("failed to load plugin library '{name}': {reason}")]
    Load {
        /// The plugin artifact name that was being loaded.
        name: String,
        /// The underlying error message.
        reason: String,
    },

    /// The registration entry-point symbol was not found in the library.
    #[error("symbol 'register_executors' not found in plugin '{name}': {reason}")]
    SymbolNotFound {
        /// The plugin artifact name.
        name: String,
        /// The underlying error message.
        reason: String,
    },

    /// A panic occurred while the library's registration function ran.
    #[error("panic occurred while loading plugin '{0}'")]
    Panic(String),

    /// Failed to read the plugin directory.
    #[error("directory read error: {0}")]
    DirectoryRead(String),
}
