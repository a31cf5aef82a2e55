//! Errors reading or writing the JSON documents the workflow keeps on disk.

/// A state or metadata document failed to encode or decode.
///
/// `document` names the file involved when one is known, so a corrupt state
/// file can be told apart from a metadata write that went wrong.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("JSON Error ({}): {} at line {} in {}", document, message, line, file)]
pub struct JsonError {
    /// What went wrong
    pub message: String,
    /// File being read or written, or `"<memory>"`
    pub document: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl JsonError {
    /// Error not tied to a file on disk.
    ///
    /// # Examples
    ///
    /// ```
    /// use tribune_error::JsonError;
    ///
    /// let err = JsonError::new("trailing comma");
    /// assert_eq!(err.document, "<memory>");
    /// ```
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        Self::in_document("<memory>", message)
    }

    /// Error while handling the named document.
    ///
    /// ```
    /// use tribune_error::JsonError;
    ///
    /// let err = JsonError::in_document("tribune.state.json", "expected value");
    /// assert!(err.to_string().starts_with("JSON Error (tribune.state.json): expected value"));
    /// ```
    #[track_caller]
    pub fn in_document(document: impl Into<String>, message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            message: message.into(),
            document: document.into(),
            line: location.line(),
            file: location.file(),
        }
    }
}
