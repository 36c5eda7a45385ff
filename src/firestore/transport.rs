//! The HTTP side of the client: anything that can take a [`RequestSpec`] to the
//! document API and hand back the status and body.

use super::config::FirestoreConfig;
use super::request::RequestSpec;
use super::FirestoreError;
use crate::core::middleware::{AuthMiddleware, SigningFailure};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{header, Client};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use url::Url;

/// Status and body of a completed call. Non-success statuses are returned here
/// rather than raised so the caller can decode the error envelope.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: Bytes,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Dispatches signed requests. Implementations own authentication; failures
/// before a response exists surface as [`FirestoreError::RequestFailed`] or
/// [`FirestoreError::Signing`].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: RequestSpec) -> Result<RawResponse, FirestoreError>;
}

/// Production transport backed by `reqwest` with an OAuth2 signing middleware.
pub struct FirestoreApiClient {
    client: ClientWithMiddleware,
    base_url: String,
}

impl FirestoreApiClient {
    /// Builds the client stack: optional transient retry, then signing.
    pub fn new(middleware: AuthMiddleware, config: &FirestoreConfig) -> Result<Self, FirestoreError> {
        Self::build(Some(middleware), config)
    }

    /// Same stack without signing, for the local emulator.
    pub fn unsigned(config: &FirestoreConfig) -> Result<Self, FirestoreError> {
        Self::build(None, config)
    }

    fn build(middleware: Option<AuthMiddleware>, config: &FirestoreConfig) -> Result<Self, FirestoreError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| FirestoreError::RequestFailed(e.into()))?;

        let mut builder = ClientBuilder::new(http);
        if config.transport_retries > 0 {
            let retry_policy =
                ExponentialBackoff::builder().build_with_max_retries(config.transport_retries);
            builder = builder.with(RetryTransientMiddleware::new_with_policy(retry_policy));
        }
        if let Some(middleware) = middleware {
            builder = builder.with(middleware);
        }

        Ok(Self {
            client: builder.build(),
            base_url: config.documents_url(),
        })
    }

    /// Wraps an already-built client, e.g. one without signing for an emulator.
    pub fn new_with_client(client: ClientWithMiddleware, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub(crate) fn url_for(&self, path: &str, query: &str) -> Result<Url, FirestoreError> {
        let mut url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        if !query.is_empty() {
            url.push('?');
            url.push_str(query);
        }
        Ok(Url::parse(&url)?)
    }
}

#[async_trait]
impl Transport for FirestoreApiClient {
    async fn execute(&self, request: RequestSpec) -> Result<RawResponse, FirestoreError> {
        let RequestSpec {
            method,
            path,
            query,
            body,
            mut headers,
        } = request;

        let url = self.url_for(&path, &query)?;
        if !body.is_empty() && !headers.contains_key(header::CONTENT_TYPE) {
            headers.insert(
                header::CONTENT_TYPE,
                header::HeaderValue::from_static("application/json"),
            );
        }

        tracing::debug!(%method, path = %path, query = %query, "sending firestore request");

        let response = self
            .client
            .request(method, url)
            .headers(headers)
            .body(body)
            .send()
            .await
            .map_err(classify_middleware_error)?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| FirestoreError::RequestFailed(e.into()))?;

        tracing::debug!(status, bytes = body.len(), "firestore response received");
        Ok(RawResponse { status, body })
    }
}

/// Signing failures get their own variant; everything else is a request failure.
fn classify_middleware_error(error: reqwest_middleware::Error) -> FirestoreError {
    if let reqwest_middleware::Error::Middleware(inner) = &error {
        if let Some(signing) = inner.downcast_ref::<SigningFailure>() {
            return FirestoreError::Signing(signing.0.clone());
        }
    }
    FirestoreError::RequestFailed(error)
}
