//! Top-level error type carried back to `main`.
//!
//! Every failure that reaches the user is an `AppError`: a message plus the
//! process exit code it maps to. Subsystems with richer failure modes (the
//! SQLite store) keep their own `thiserror` enums and convert at the boundary.

use crate::store::StoreError;

/// Bad input: arguments, configuration, unreadable or malformed files.
pub const EXIT_INPUT: u8 = 2;
/// Input was readable but nothing valid remained to process.
pub const EXIT_NO_DATA: u8 = 3;
/// Runtime failure: storage, terminal, report writing.
pub const EXIT_RUNTIME: u8 = 4;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn input(message: impl Into<String>) -> Self {
        Self::new(EXIT_INPUT, message)
    }

    pub fn no_data(message: impl Into<String>) -> Self {
        Self::new(EXIT_NO_DATA, message)
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Self::new(EXIT_RUNTIME, message)
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => AppError::input(err.to_string()),
            other => AppError::runtime(format!("Application store: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_not_found_is_an_input_error() {
        let err: AppError = StoreError::NotFound("abc123".to_string()).into();
        assert_eq!(err.exit_code(), EXIT_INPUT);
        assert!(err.message().contains("abc123"));
    }

    #[test]
    fn display_is_the_bare_message() {
        let err = AppError::no_data("No valid rows.");
        assert_eq!(err.to_string(), "No valid rows.");
        assert_eq!(err.exit_code(), EXIT_NO_DATA);
    }
}
