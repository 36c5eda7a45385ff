use http::Extensions;
use reqwest::{header, Request, Response};
use reqwest_middleware::{Middleware, Next};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::OnceCell;
use yup_oauth2::authenticator::DefaultAuthenticator;
use yup_oauth2::{ServiceAccountAuthenticator, ServiceAccountKey};

const SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/cloud-platform",
    "https://www.googleapis.com/auth/datastore",
];

/// Raised by [`AuthMiddleware`] when no bearer token could be obtained.
///
/// Travels inside `reqwest_middleware::Error::Middleware` so the transport can
/// tell credential failures apart from network failures.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct SigningFailure(pub String);

/// Signs every outgoing request with an OAuth2 bearer token minted from a
/// service-account key. The authenticator is built lazily on first use and
/// shared between clones.
#[derive(Clone)]
pub struct AuthMiddleware {
    key: ServiceAccountKey,
    authenticator: Arc<OnceCell<DefaultAuthenticator>>,
}

impl AuthMiddleware {
    pub fn new(key: ServiceAccountKey) -> Self {
        Self {
            key,
            authenticator: Arc::new(OnceCell::new()),
        }
    }

    async fn get_token(&self) -> Result<String, SigningFailure> {
        let auth = self
            .authenticator
            .get_or_try_init(|| async {
                ServiceAccountAuthenticator::builder(self.key.clone())
                    .build()
                    .await
            })
            .await
            .map_err(|e| SigningFailure(format!("failed to build authenticator: {}", e)))?;

        let token = auth
            .token(SCOPES)
            .await
            .map_err(|e| SigningFailure(format!("failed to fetch access token: {}", e)))?;

        token
            .token()
            .map(str::to_string)
            .ok_or_else(|| SigningFailure("token response carried no access token".into()))
    }
}

#[async_trait::async_trait]
impl Middleware for AuthMiddleware {
    async fn handle(
        &self,
        mut req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> reqwest_middleware::Result<Response> {
        let token = self
            .get_token()
            .await
            .map_err(|e| reqwest_middleware::Error::Middleware(anyhow::Error::new(e)))?;

        let value = header::HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|e| {
            reqwest_middleware::Error::Middleware(anyhow::Error::new(SigningFailure(format!(
                "access token is not a valid header value: {}",
                e
            ))))
        })?;
        req.headers_mut().insert(header::AUTHORIZATION, value);

        tracing::trace!("attached bearer token");
        next.run(req, extensions).await
    }
}
