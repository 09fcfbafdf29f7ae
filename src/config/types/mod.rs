//! Configuration utility types.
//!
//! | Module  | Purpose                           |
//! |---------|-----------------------------------|
//! | `error` | Configuration error types         |
//! | `field` | Field paths used in diagnostics   |

mod error;
mod field;

pub use error::{ConfigDiagnostic, ConfigDiagnostics, ConfigError};
pub use field::FieldPath;
