//! The `NodeExecutor` capability, its execution context, and the executor
//! registry (C4).

pub mod context;
pub mod error;
pub mod executor;
pub mod registry;

pub use context::ExecutionContext;
pub use error::{ExecutorError, RegistryError};
pub use executor::{NodeExecutor, ValidationResult};
pub use registry::ExecutorRegistry;
