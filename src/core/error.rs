/// Errors raised while building queues, messages and kinds.
///
/// Queue operations themselves never fail: duplicates and empty reads are
/// reported as values (`SubmitOutcome::Duplicate`, `None`).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid delay: {0} ms (must be non-negative)")]
    InvalidDelay(i64),

    #[error("message must have at least one recipient")]
    NoRecipients,

    #[error("message kind already registered: {0}")]
    DuplicateKind(String),

    #[error("unknown message kind: {0}")]
    UnknownKind(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_offending_value() {
        assert_eq!(
            Error::InvalidDelay(-5).to_string(),
            "invalid delay: -5 ms (must be non-negative)"
        );
        assert_eq!(
            Error::UnknownKind("fax".into()).to_string(),
            "unknown message kind: fax"
        );
    }

    #[test]
    fn io_errors_convert() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, Error::Io(_)));
    }
}
