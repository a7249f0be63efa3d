//! Command implementations
//!
//! Each command module provides a clap-derived struct and execute method.

pub mod publish;
pub mod resolve;

use crate::error::DistError;

/// Unwrap a distribution result, printing hints and exiting on failure
pub(crate) fn unwrap_or_exit<T>(result: Result<T, DistError>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => {
            err.display_with_hints();
            std::process::exit(1);
        }
    }
}
