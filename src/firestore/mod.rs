//! Cloud Firestore documents over the v1 REST API.
//!
//! [`FirestoreResource`] is the operation set: get, list, create, update and
//! delete documents, with results decoded into whatever type the caller names
//! at the call site. Every call goes through an injected [`Transport`], so the
//! façade itself holds no network state.
//!
//! # Pagination
//!
//! [`FirestoreResource::list_documents`] returns the first page only.
//! [`FirestoreResource::list_all_documents`] follows `nextPageToken` until the
//! service stops returning one, fetching pages strictly one after another.
//!
//! # Errors
//!
//! Nothing is retried here. Transport failures, signing failures, undecodable
//! bodies and error envelopes each map to their own [`FirestoreError`] variant.

pub mod blocking;
pub mod codec;
pub mod config;
pub mod models;
pub mod paginator;
pub mod request;
pub mod transport;


use self::config::PartialResults;
use self::models::{Document, ListResponse};
use self::paginator::{PaginationError, PaginationOptions, Paginator};
use self::request::{document_id_query, page_query, update_mask_query, RequestSpec};
use self::transport::Transport;
use crate::core::FirestoreErrorResponse;
use futures::Stream;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur during Firestore operations.
#[derive(Error, Debug)]
pub enum FirestoreError {
    /// The request never produced a response (network, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest_middleware::Error),
    /// No credential could be attached to the request.
    #[error("Request signing failed: {0}")]
    Signing(String),
    /// The body matched neither the expected shape nor the error envelope.
    /// `data` is the body as received.
    #[error("Failed to parse response: {source}")]
    ParseFailed {
        data: String,
        #[source]
        source: serde_json::Error,
    },
    /// The service answered with an error envelope.
    #[error("API error: {0}")]
    Remote(FirestoreErrorResponse),
    /// The payload could not be serialized.
    #[error("Serialization error: {0}")]
    Encoding(#[source] serde_json::Error),
    #[error("Invalid request URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The service account key provided does not contain a project ID.
    #[error("Project ID is missing in service account key")]
    ProjectIdMissing,
    /// A listing hit its page cap while the service still reported more results.
    #[error("Listing stopped after {pages} pages with more results pending")]
    PageLimitExceeded { pages: usize },
    #[error("Failed to start runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

impl FirestoreError {
    /// Returns `true` if the service itself rejected the call.
    pub fn is_remote(&self) -> bool {
        matches!(self, FirestoreError::Remote(_))
    }

    /// The `status` string of an error envelope, e.g. `NOT_FOUND`.
    pub fn remote_status(&self) -> Option<&str> {
        match self {
            FirestoreError::Remote(envelope) => Some(envelope.error.status.as_str()),
            _ => None,
        }
    }
}

/// Typed access to the documents of one database.
///
/// Cheap to clone; clones share the transport.
#[derive(Clone)]
pub struct FirestoreResource {
    transport: Arc<dyn Transport>,
    pagination: PaginationOptions,
}

impl FirestoreResource {
    /// Creates a façade over `transport`.
    ///
    /// This is typically called via `FirestoreApp::firestore()`.
    pub fn new(transport: Arc<dyn Transport>, pagination: PaginationOptions) -> Self {
        Self {
            transport,
            pagination,
        }
    }

    /// The pagination settings used by [`list_all_documents_with`](Self::list_all_documents_with)
    /// when called through the configured defaults.
    pub fn pagination_options(&self) -> PaginationOptions {
        self.pagination
    }

    /// Dispatches one request and decodes the body into `T`.
    pub async fn send<T: DeserializeOwned>(&self, request: RequestSpec) -> Result<T, FirestoreError> {
        let response = self.transport.execute(request).await?;
        codec::decode_response(response.status, &response.body)
    }

    /// Fetches a single document.
    ///
    /// # Arguments
    ///
    /// * `path` - The slash-separated path to the document (e.g., "users/alice").
    pub async fn get_document<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<Document<T>, FirestoreError> {
        self.send(RequestSpec::get(path)).await
    }

    /// Returns the documents of the first page of a collection only.
    ///
    /// Kept for callers that page manually; [`list_all_documents`](Self::list_all_documents)
    /// follows continuation tokens.
    pub async fn list_documents<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<Vec<Document<T>>, FirestoreError> {
        let page: ListResponse<T> = self.send(RequestSpec::get(path)).await?;
        Ok(page.documents)
    }

    /// Fetches one page of a collection.
    pub async fn list_documents_page<T: DeserializeOwned>(
        &self,
        path: &str,
        page_size: u32,
        page_token: Option<&str>,
    ) -> Result<ListResponse<T>, FirestoreError> {
        let request = RequestSpec::get(path).with_query(page_query(page_size, page_token));
        self.send(request).await
    }

    /// Lists every document of a collection, following `nextPageToken`.
    ///
    /// Documents come back in fetch order. A failing page fails the whole call
    /// and nothing fetched before it is returned.
    pub async fn list_all_documents<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<Vec<Document<T>>, FirestoreError> {
        let options = PaginationOptions {
            partial_results: PartialResults::Discard,
            ..self.pagination
        };
        self.list_all_documents_with(path, options)
            .await
            .map_err(|e| e.error)
    }

    /// Like [`list_all_documents`](Self::list_all_documents), with explicit page
    /// size, page cap and partial-result policy.
    pub async fn list_all_documents_with<T: DeserializeOwned>(
        &self,
        path: &str,
        options: PaginationOptions,
    ) -> Result<Vec<Document<T>>, PaginationError<T>> {
        self.paginate(path, options).collect().await
    }

    /// A paginator positioned before the first page.
    pub fn paginate<T: DeserializeOwned>(&self, path: &str, options: PaginationOptions) -> Paginator<T> {
        Paginator::new(self.clone(), path, options)
    }

    /// Pages of a collection as a stream. The next page is requested only when
    /// the stream is polled past the current one.
    pub fn list_documents_stream<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> impl Stream<Item = Result<Vec<Document<T>>, FirestoreError>> {
        self.paginate(path, self.pagination).into_stream()
    }

    /// Creates a document in the collection at `path`.
    ///
    /// With `name`, the document gets that id; the service fails the call if it
    /// already exists. Without, the service assigns one.
    pub async fn create_document<T: Serialize + DeserializeOwned>(
        &self,
        path: &str,
        name: Option<&str>,
        fields: &T,
    ) -> Result<Document<T>, FirestoreError> {
        let body = codec::encode_fields(fields)?;
        let request = RequestSpec::post(path)
            .with_query(document_id_query(name))
            .with_body(body);
        self.send(request).await
    }

    /// Creates a document from a pre-built `fields` fragment.
    ///
    /// The fragment is not validated; see [`codec::encode_raw_fields_unchecked`].
    pub async fn create_document_raw_unchecked<T: DeserializeOwned>(
        &self,
        path: &str,
        name: Option<&str>,
        raw: &str,
    ) -> Result<T, FirestoreError> {
        let request = RequestSpec::post(path)
            .with_query(document_id_query(name))
            .with_body(codec::encode_raw_fields_unchecked(raw));
        self.send(request).await
    }

    /// Writes `fields` to the document at `path`.
    ///
    /// With a non-empty `update_mask` only the named field paths are written;
    /// otherwise the whole document is replaced.
    pub async fn update_document<T: Serialize + DeserializeOwned>(
        &self,
        path: &str,
        fields: &T,
        update_mask: Option<&[&str]>,
    ) -> Result<Document<T>, FirestoreError> {
        let body = codec::encode_fields(fields)?;
        let request = RequestSpec::patch(path)
            .with_query(update_mask_query(update_mask))
            .with_body(body);
        self.send(request).await
    }

    /// Writes a pre-built `fields` fragment to the document at `path`.
    ///
    /// The fragment is sent as `{fields: <raw>}` without validation; an
    /// unbalanced or otherwise malformed fragment is the caller's bug and comes
    /// back as whatever error the service returns.
    pub async fn update_document_raw_unchecked<T: DeserializeOwned>(
        &self,
        path: &str,
        raw: &str,
        update_mask: Option<&[&str]>,
    ) -> Result<T, FirestoreError> {
        let request = RequestSpec::patch(path)
            .with_query(update_mask_query(update_mask))
            .with_body(codec::encode_raw_fields_unchecked(raw));
        self.send(request).await
    }

    /// Deletes the document at `path`.
    pub async fn delete_document(&self, path: &str) -> Result<(), FirestoreError> {
        let response = self.transport.execute(RequestSpec::delete(path)).await?;
        if response.is_success() {
            return Ok(());
        }
        codec::decode_response::<IgnoredAny>(response.status, &response.body).map(|_| ())
    }
}
