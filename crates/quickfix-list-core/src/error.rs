//! Failure taxonomy for list fetches and mutations.
//!
//! Three layers exist deliberately: [`ValidationErrors`] never leave the
//! console (the payload was bad before any request), [`GatewayError`] covers
//! everything that can go wrong talking to the backend, and the operator only
//! ever sees the sentence produced by [`GatewayError::display_message`].

use thiserror::Error;

/// One field the operator needs to fix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    /// Form field the violation applies to.
    pub field: &'static str,
    /// Operator-facing explanation.
    pub message: String,
}

/// Everything wrong with a composed payload, reported together.
#[derive(Debug, Clone, PartialEq, Eq, Default, Error)]
#[error("validation failed")]
pub struct ValidationErrors {
    /// All violations found, in field order.
    pub violations: Vec<FieldViolation>,
}

impl ValidationErrors {
    /// A single-violation error.
    #[must_use]
    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            violations: vec![FieldViolation {
                field,
                message: message.into(),
            }],
        }
    }

    /// Record a violation against `field`.
    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.violations.push(FieldViolation {
            field,
            message: message.into(),
        });
    }

    /// True when no violations were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Turn the accumulated violations into a result.
    ///
    /// # Errors
    ///
    /// Returns `self` when at least one violation was recorded.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }

    /// All messages joined into one operator-facing sentence block.
    #[must_use]
    pub fn summary(&self) -> String {
        self.violations
            .iter()
            .map(|violation| violation.message.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Failure talking to the QuickFix API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// The request never produced a response: DNS, connect, TLS, timeout.
    #[error("transport failure: {detail}")]
    Transport {
        /// Underlying transport detail, for logs only.
        detail: String,
    },
    /// The backend answered with a non-success status.
    #[error("api rejected the request with status {status}")]
    Api {
        /// HTTP status the backend returned.
        status: u16,
        /// Server-provided detail when the response carried one.
        message: Option<String>,
    },
    /// The response arrived but its body was not what we expect.
    #[error("response decoding failed: {detail}")]
    Decode {
        /// Decoder detail, for logs only.
        detail: String,
    },
}

impl GatewayError {
    /// The sentence the operator sees. Transport and decode details stay in
    /// the logs; a server-provided message is trusted to be presentable.
    #[must_use]
    pub fn display_message(&self) -> String {
        match self {
            Self::Transport { .. } => {
                "Connection problem. Check your network and try again.".to_string()
            }
            Self::Api {
                message: Some(message),
                ..
            } => message.clone(),
            Self::Api { status, .. } => {
                format!("The server rejected the request (HTTP {status}).")
            }
            Self::Decode { .. } => "Received an unexpected response. Please try again.".to_string(),
        }
    }

    /// True when retrying the identical request could plausibly succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}

/// Convenience alias for gateway results.
pub type GatewayResult<T> = Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn violations_accumulate_and_summarise() {
        let mut errors = ValidationErrors::default();
        assert!(errors.is_empty());
        errors.push("title", "Title is required.");
        errors.push("slug", "Slug may only contain letters, digits and dashes.");
        assert_eq!(errors.violations.len(), 2);
        assert_eq!(
            errors.summary(),
            "Title is required. Slug may only contain letters, digits and dashes."
        );
        assert!(errors.into_result().is_err());
    }

    #[test]
    fn display_messages_hide_transport_detail() {
        let transport = GatewayError::Transport {
            detail: "dns error: no record for api.quickfix.internal".into(),
        };
        assert!(!transport.display_message().contains("dns"));
        assert!(transport.is_transient());

        let decode = GatewayError::Decode {
            detail: "missing field `total` at line 1".into(),
        };
        assert!(!decode.display_message().contains("total"));
    }

    #[test]
    fn display_messages_trust_server_detail() {
        let spoken = GatewayError::Api {
            status: 409,
            message: Some("That slug is already in use.".into()),
        };
        assert_eq!(spoken.display_message(), "That slug is already in use.");

        let silent = GatewayError::Api {
            status: 502,
            message: None,
        };
        assert_eq!(
            silent.display_message(),
            "The server rejected the request (HTTP 502)."
        );
    }
}
