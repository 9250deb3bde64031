use thiserror::Error;

// ============================================================================
// Decode Errors
// ============================================================================

/// Failure to turn one raw stream payload into a typed event.
///
/// Both variants are non-fatal: the session logs the frame and keeps the
/// stream open.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The payload was not valid JSON, lacked the `type` discriminator, or
    /// lacked the fields its type requires.
    #[error("malformed event payload: {0}")]
    Malformed(String),

    /// Valid JSON, but the `type` discriminator is not one we know.
    #[error("unknown event type `{0}`")]
    UnknownType(String),
}

impl DecodeError {
    pub fn is_unknown_type(&self) -> bool {
        matches!(self, Self::UnknownType(_))
    }
}

// ============================================================================
// Stream Errors
// ============================================================================

/// Failure to set a session up. Transport failures after the connection is
/// opened are not errors in this sense; they surface through the `on_error`
/// hook instead.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("invalid stream endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),

    #[error("failed to build http client: {0}")]
    ClientBuild(#[from] reqwest::Error),
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_display() {
        let err = DecodeError::UnknownType("ping".to_string());
        assert_eq!(err.to_string(), "unknown event type `ping`");
        assert!(err.is_unknown_type());

        let err = DecodeError::Malformed("expected value".to_string());
        assert!(err.to_string().contains("malformed"));
        assert!(!err.is_unknown_type());
    }

    #[test]
    fn test_stream_error_from_url() {
        let parse_err = url::Url::parse("not a url").unwrap_err();
        let err = StreamError::from(parse_err);
        assert!(err.to_string().contains("invalid stream endpoint"));
    }
}
