//! The HTTP gateway the console runs against in production.
//!
//! Endpoints follow the admin API's `/v1/{collection}` layout. Success
//! bodies decode into the shared DTOs; non-success responses are folded
//! into `GatewayError` by preferring the problem document's wording, then
//! the raw body text, then the bare status code.

use std::marker::PhantomData;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::watch;
use tracing::{debug, warn};
use url::Url;
use uuid::Uuid;

use quickfix_api_models::{FieldEncode, PageEnvelope, ProblemDetails};
use quickfix_list_core::{
    GatewayError, GatewayResult, ListQuery, ListResource, ResourceGateway, ResourceSet,
};
use quickfix_telemetry::Metrics;

use crate::ClientError;
use crate::auth::AuthSnapshot;

/// Header carrying the admin API key.
pub const HEADER_API_KEY: &str = "x-quickfix-api-key";
/// Header correlating every request from one client instance.
pub const HEADER_REQUEST_ID: &str = "x-request-id";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection settings for [`AdminApi::connect`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Root of the admin API, e.g. `https://api.quickfix.example`.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl ClientConfig {
    /// Settings for `base_url` with the default timeout.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Override the per-request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Shared connection to the QuickFix admin API.
///
/// Cloning is cheap: every clone shares the HTTP connection pool, the
/// credential feed, and the metrics registry.
#[derive(Debug, Clone)]
pub struct AdminApi {
    client: Client,
    base_url: Url,
    request_id: String,
    auth: watch::Receiver<AuthSnapshot>,
    metrics: Metrics,
}

impl AdminApi {
    /// Build a client for `config`, reading credentials from `auth`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the base URL does not parse or cannot
    /// host paths, or when the HTTP client cannot be built.
    pub fn connect(
        config: &ClientConfig,
        auth: watch::Receiver<AuthSnapshot>,
        metrics: Metrics,
    ) -> Result<Self, ClientError> {
        let base_url = Url::parse(&config.base_url).map_err(|err| ClientError::InvalidBaseUrl {
            input: config.base_url.clone(),
            detail: err.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidBaseUrl {
                input: config.base_url.clone(),
                detail: "the URL cannot host paths".to_string(),
            });
        }

        let client = Client::builder().timeout(config.timeout).build()?;
        let api = Self {
            client,
            base_url,
            request_id: Uuid::new_v4().to_string(),
            auth,
            metrics,
        };
        debug!(base_url = %api.base_url, "admin api client ready");
        Ok(api)
    }

    /// A typed gateway for one collection, sharing this connection.
    #[must_use]
    pub fn gateway<R: ListResource>(&self) -> RestGateway<R> {
        RestGateway {
            api: self.clone(),
            _marker: PhantomData,
        }
    }

    fn endpoint(&self, path: &str) -> GatewayResult<Url> {
        self.base_url
            .join(path)
            .map_err(|err| GatewayError::Transport {
                detail: format!("invalid endpoint {path}: {err}"),
            })
    }

    /// Start a request with the correlation header and the credential the
    /// feed currently holds. Reading the feed here, not at build time, is
    /// what makes key rotation take effect without a client rebuild.
    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let mut builder = self
            .client
            .request(method, url)
            .header(HEADER_REQUEST_ID, self.request_id.as_str());
        let credential = self.auth.borrow().credential.clone();
        if let Some(credential) = credential {
            builder = builder.header(HEADER_API_KEY, credential.header_value());
        }
        builder
    }

    async fn execute(
        &self,
        collection: &'static str,
        method: &'static str,
        builder: RequestBuilder,
    ) -> GatewayResult<Response> {
        let response = match builder.send().await {
            Ok(response) => response,
            Err(err) => {
                self.metrics.inc_api_request(collection, method, "error");
                warn!(collection, method, error = %err, "request failed in transport");
                return Err(GatewayError::Transport {
                    detail: err.to_string(),
                });
            }
        };
        if response.status().is_success() {
            self.metrics.inc_api_request(collection, method, "ok");
            Ok(response)
        } else {
            self.metrics.inc_api_request(collection, method, "error");
            let error = classify_failure(response).await;
            warn!(collection, method, error = %error, "request rejected");
            Err(error)
        }
    }
}

/// Fold a non-success response into a [`GatewayError`].
async fn classify_failure(response: Response) -> GatewayError {
    let status = response.status().as_u16();
    let bytes = response.bytes().await.unwrap_or_default();

    let problem = serde_json::from_slice::<ProblemDetails>(&bytes).ok();
    let message = problem.map_or_else(
        || {
            let text = String::from_utf8_lossy(&bytes).trim().to_string();
            if text.is_empty() { None } else { Some(text) }
        },
        |problem| Some(problem.best_message()),
    );

    GatewayError::Api { status, message }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> GatewayResult<T> {
    let bytes = response
        .bytes()
        .await
        .map_err(|err| GatewayError::Transport {
            detail: err.to_string(),
        })?;
    serde_json::from_slice(&bytes).map_err(|err| GatewayError::Decode {
        detail: err.to_string(),
    })
}

/// HTTP-backed gateway for one resource collection.
pub struct RestGateway<R> {
    api: AdminApi,
    _marker: PhantomData<fn() -> R>,
}

impl<R> Clone for RestGateway<R> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<R> ResourceGateway for RestGateway<R>
where
    R: ListResource + DeserializeOwned,
    R::Draft: Serialize,
    R::Patch: Serialize,
    R::Field: FieldEncode,
{
    type Item = R;

    async fn list(&self, query: &ListQuery<R::Filter>) -> GatewayResult<ResourceSet<R>> {
        let mut url = self.api.endpoint(&format!("/v1/{}", R::COLLECTION))?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query.query_pairs() {
                pairs.append_pair(key, &value);
            }
        }
        let builder = self.api.request(Method::GET, url);
        let response = self.api.execute(R::COLLECTION, "GET", builder).await?;
        let envelope: PageEnvelope<R> = read_json(response).await?;
        Ok(envelope.into_set(query.page_size))
    }

    async fn create(&self, draft: &R::Draft) -> GatewayResult<R> {
        let url = self.api.endpoint(&format!("/v1/{}", R::COLLECTION))?;
        let builder = self.api.request(Method::POST, url).json(draft);
        let response = self.api.execute(R::COLLECTION, "POST", builder).await?;
        read_json(response).await
    }

    async fn update(&self, id: Uuid, patch: &R::Patch) -> GatewayResult<R> {
        let url = self
            .api
            .endpoint(&format!("/v1/{}/{id}", R::COLLECTION))?;
        let builder = self.api.request(Method::PATCH, url).json(patch);
        let response = self.api.execute(R::COLLECTION, "PATCH", builder).await?;
        read_json(response).await
    }

    async fn delete(&self, id: Uuid) -> GatewayResult<()> {
        let url = self
            .api
            .endpoint(&format!("/v1/{}/{id}", R::COLLECTION))?;
        let builder = self.api.request(Method::DELETE, url);
        self.api.execute(R::COLLECTION, "DELETE", builder).await?;
        Ok(())
    }

    async fn set_field(&self, id: Uuid, change: &R::Field) -> GatewayResult<R> {
        let url = self
            .api
            .endpoint(&format!("/v1/{}/{id}/field", R::COLLECTION))?;
        let builder = self
            .api
            .request(Method::PATCH, url)
            .json(&change.to_request());
        let response = self.api.execute(R::COLLECTION, "PATCH", builder).await?;
        read_json(response).await
    }
}
