pub mod config;
pub mod error;
pub mod validation;

pub use config::{CacheConfig, CoreConfig, LedgerConfig, ValidationConfig};
pub use error::{AppError, FailureKind, Result};
pub use validation::ValidationFailureKind;
