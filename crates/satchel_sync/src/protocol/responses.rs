//! Authority responses.
//!
//! The authority answers with one of three shapes:
//!
//! | Shape | Meaning |
//! |-------|---------|
//! | `true` / `false` | accepted / refused |
//! | `null` | accepted, nothing to report |
//! | `{ "success": bool, "data"?: .., "error"?: .. }` | envelope |
//!
//! Any other value counts as accepted.

use serde_json::Value;

/// Decoded authority response.
#[derive(Clone, Debug, PartialEq)]
pub enum Response {
    /// Bare boolean.
    Ack(bool),
    /// `null`.
    Void,
    /// Success envelope.
    Envelope {
        /// Whether the request was accepted.
        success: bool,
        /// Payload on success.
        data: Option<Value>,
        /// Reason on failure.
        error: Option<String>,
    },
    /// Any other value.
    Other(Value),
}

/// Why a confirmation did not go through.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RejectReason {
    /// The authority refused the request.
    Refused(Option<String>),
    /// The request never got an answer.
    Transport(String),
}

/// Final outcome of a confirmation request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The authority accepted the change.
    Fulfilled,
    /// The change must be rolled back.
    Rejected(RejectReason),
}

impl Outcome {
    /// Whether the change stands.
    #[inline]
    #[must_use]
    pub const fn is_fulfilled(&self) -> bool {
        matches!(self, Self::Fulfilled)
    }
}

impl Response {
    /// Decodes a raw response value.
    #[must_use]
    pub fn decode(value: Value) -> Self {
        match value {
            Value::Bool(accepted) => Self::Ack(accepted),
            Value::Null => Self::Void,
            Value::Object(mut body) if body.contains_key("success") => {
                let success = body.get("success").and_then(Value::as_bool).unwrap_or(false);
                let error = body.remove("error").and_then(|error| match error {
                    Value::Null => None,
                    Value::String(text) => Some(text),
                    other => Some(other.to_string()),
                });
                Self::Envelope {
                    success,
                    data: body.remove("data"),
                    error,
                }
            }
            other => Self::Other(other),
        }
    }

    /// Converts into a confirmation outcome.
    #[must_use]
    pub fn into_outcome(self) -> Outcome {
        match self {
            Self::Envelope {
                success: false, error, ..
            } => Outcome::Rejected(RejectReason::Refused(error)),
            Self::Ack(false) => Outcome::Rejected(RejectReason::Refused(None)),
            _ => Outcome::Fulfilled,
        }
    }
}
