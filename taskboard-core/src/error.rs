/// Failures surfaced by the codecs and the reconciler.
///
/// Malformed individual records are never errors; `ticket::ensure_ticket`
/// repairs them. Only whole-file problems end up here.
#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    /// Structured document is not syntactically valid.
    #[error("Invalid board document: {0}")]
    Parse(String),

    /// Delimited text is missing header columns.
    #[error("Missing required headers: {}", .0.join(", "))]
    MissingHeaders(Vec<String>),

    /// A ticket cannot be created with this status.
    #[error("Invalid status for new ticket: {0}")]
    InvalidStatus(String),

    #[error("Unsupported board file format: {0}")]
    UnsupportedFormat(String),
}

impl BoardError {
    /// Validation failures as opposed to parse or format failures.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            BoardError::MissingHeaders(_) | BoardError::InvalidStatus(_)
        )
    }
}

impl From<serde_json::Error> for BoardError {
    fn from(e: serde_json::Error) -> Self {
        BoardError::Parse(e.to_string())
    }
}
