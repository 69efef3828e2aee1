//! Marker Error Types
//!
//! This module defines the [`MarkerError`] enum, which encapsulates the error
//! types that can occur while writing grading artifacts and the batch summary.
//! Each variant provides a descriptive error message for robust error handling.
//!
//! # Usage
//!
//! Use [`MarkerError`] as the error type in functions that may fail due to
//! I/O or serialization issues.
//!
//! # Example
//!
//! ```rust
//! use marker::error::MarkerError;
//!
//! fn check_dir(path: &std::path::Path) -> Result<(), MarkerError> {
//!     if !path.is_dir() {
//!         return Err(MarkerError::IoError(format!("{} is not a directory", path.display())));
//!     }
//!     Ok(())
//! }
//! ```

/// Represents the error types that can occur in the marker system.
#[derive(Debug)]
pub enum MarkerError {
    /// I/O error (file not found, unwritable, etc.).
    IoError(String),
    /// The batch summary could not be serialized.
    SerializeError(String),
}

impl From<std::io::Error> for MarkerError {
    fn from(e: std::io::Error) -> Self {
        MarkerError::IoError(e.to_string())
    }
}
