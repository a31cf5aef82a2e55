//! Configuration error types.

/// Configuration error with source location.
///
/// Validation collects every problem it finds into `problems`, so a single
/// error reports all missing or malformed fields at once.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Configuration Error: {} at line {} in {}", message, line, file)]
pub struct ConfigError {
    /// Error message
    pub message: String,
    /// Individual problems, one per offending field
    pub problems: Vec<String>,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl ConfigError {
    /// Create a new ConfigError with the given message at the current location.
    ///
    /// # Examples
    ///
    /// ```
    /// use tribune_error::ConfigError;
    ///
    /// let err = ConfigError::new("Missing required field");
    /// assert!(err.message.contains("Missing required"));
    /// ```
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            message: message.into(),
            problems: Vec::new(),
            line: location.line(),
            file: location.file(),
        }
    }

    /// Create a ConfigError listing every problem found during validation.
    ///
    /// # Examples
    ///
    /// ```
    /// use tribune_error::ConfigError;
    ///
    /// let err = ConfigError::invalid(vec![
    ///     "missing field `guild`".to_string(),
    ///     "missing field `operator_id`".to_string(),
    /// ]);
    /// assert_eq!(err.problems.len(), 2);
    /// assert!(err.message.contains("operator_id"));
    /// ```
    #[track_caller]
    pub fn invalid(problems: Vec<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            message: format!(
                "{} invalid field(s): {}",
                problems.len(),
                problems.join("; ")
            ),
            problems,
            line: location.line(),
            file: location.file(),
        }
    }
}
