//! API key credentials and the feed that rotates them at runtime.

use tokio::sync::watch;

use crate::ClientError;

/// A two-part admin API key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiKeyCredential {
    /// Public identifier of the key.
    pub key_id: String,
    /// Secret half of the key.
    pub secret: String,
}

impl ApiKeyCredential {
    /// Parse a `key_id:secret` pair as passed on the command line or in
    /// `QUICKFIX_API_KEY`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidApiKey`] when the separator is missing
    /// or either half is empty.
    pub fn parse(input: &str) -> Result<Self, ClientError> {
        let (key_id, secret) =
            input
                .trim()
                .split_once(':')
                .ok_or_else(|| ClientError::InvalidApiKey {
                    detail: "expected key_id:secret".to_string(),
                })?;
        if key_id.trim().is_empty() || secret.trim().is_empty() {
            return Err(ClientError::InvalidApiKey {
                detail: "neither half may be empty".to_string(),
            });
        }
        Ok(Self {
            key_id: key_id.trim().to_string(),
            secret: secret.trim().to_string(),
        })
    }

    /// Value sent in the `x-quickfix-api-key` header.
    #[must_use]
    pub fn header_value(&self) -> String {
        format!("{}:{}", self.key_id, self.secret)
    }
}

/// Credential state read by the client on every request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthSnapshot {
    /// The credential to send, when one is configured.
    pub credential: Option<ApiKeyCredential>,
}

/// Publisher side of the credential feed.
///
/// Rotating a key here takes effect on the next request of every client
/// built from the feed; nothing gets rebuilt.
pub struct AuthFeed {
    tx: watch::Sender<AuthSnapshot>,
}

impl AuthFeed {
    /// A feed starting from `credential`.
    #[must_use]
    pub fn new(credential: Option<ApiKeyCredential>) -> Self {
        let (tx, _rx) = watch::channel(AuthSnapshot { credential });
        Self { tx }
    }

    /// Swap in a rotated credential.
    pub fn rotate(&self, credential: ApiKeyCredential) {
        self.tx
            .send_modify(|snapshot| snapshot.credential = Some(credential));
    }

    /// Drop the credential; later requests go out unauthenticated.
    pub fn clear(&self) {
        self.tx.send_modify(|snapshot| snapshot.credential = None);
    }

    /// Attach a reader.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthSnapshot> {
        self.tx.subscribe()
    }
}

impl Default for AuthFeed {
    fn default() -> Self {
        Self::new(None)
    }
}
