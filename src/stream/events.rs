use serde::{Deserialize, Serialize};
use strum_macros::Display;

use crate::error::DecodeError;

// ============================================================================
// Wire Events
// ============================================================================

/// One message on the search progress stream.
///
/// The wire format is a JSON object with a `type` discriminator. The three
/// non-terminal kinds carry a human-readable `message`; `complete` carries
/// the rendered result the UI swaps in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamEvent {
    Log { message: String },
    Tool { message: String },
    Error { message: String },
    Complete { html: String },
}

impl StreamEvent {
    /// True for the event that ends the stream. In-stream `error` events are
    /// progress entries, not terminals; only a transport failure or
    /// `complete` ends a session.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete { .. })
    }

    pub fn kind(&self) -> EventKind {
        match self {
            Self::Log { .. } => EventKind::Log,
            Self::Tool { .. } => EventKind::Tool,
            Self::Error { .. } => EventKind::Error,
            Self::Complete { .. } => EventKind::Complete,
        }
    }

    /// The human-readable step label, if this event carries one.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Log { message } | Self::Tool { message } | Self::Error { message } => {
                Some(message)
            }
            Self::Complete { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EventKind {
    Log,
    Tool,
    Error,
    Complete,
}

// ============================================================================
// Decoder
// ============================================================================

const KNOWN_TYPES: &[&str] = &["log", "tool", "error", "complete"];

/// Parse one raw SSE `data` payload into a [`StreamEvent`].
///
/// Pure; the caller decides what to do with a failure. Unknown
/// discriminators come back as [`DecodeError::UnknownType`] so they can be
/// skipped without tearing the stream down.
pub fn decode(raw: &str) -> Result<StreamEvent, DecodeError> {
    let value: serde_json::Value =
        serde_json::from_str(raw).map_err(|e| DecodeError::Malformed(e.to_string()))?;

    if let Some(kind) = value.get("type").and_then(|t| t.as_str()) {
        if !KNOWN_TYPES.contains(&kind) {
            return Err(DecodeError::UnknownType(kind.to_string()));
        }
    }

    serde_json::from_value(value).map_err(|e| DecodeError::Malformed(e.to_string()))
}

// ============================================================================
// Tests
// ============================================================================
