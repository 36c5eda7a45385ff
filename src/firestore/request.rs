//! One-shot request descriptions and the query strings the document API understands.

use bytes::Bytes;
use http::{HeaderMap, Method};

/// Everything the transport needs for a single call. Built per operation and
/// consumed by [`Transport::execute`](super::transport::Transport::execute).
#[derive(Debug, Clone)]
pub struct RequestSpec {
    pub method: Method,
    /// Resource path relative to the documents root, e.g. `users/alice`.
    pub path: String,
    /// Raw query string without the leading `?`. Sent as-is.
    pub query: String,
    pub body: Bytes,
    pub headers: HeaderMap,
}

impl RequestSpec {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: String::new(),
            body: Bytes::new(),
            headers: HeaderMap::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }
}

/// `documentId=<name>` when an explicit id is requested, otherwise empty.
pub fn document_id_query(name: Option<&str>) -> String {
    match name {
        Some(name) => format!("documentId={}", name),
        None => String::new(),
    }
}

/// `updateMask.fieldPaths=<a>&updateMask.fieldPaths=<b>...`. An absent or empty
/// mask yields an empty query, which the API reads as "replace the document".
pub fn update_mask_query(update_mask: Option<&[&str]>) -> String {
    update_mask
        .unwrap_or_default()
        .iter()
        .map(|path| format!("updateMask.fieldPaths={}", path))
        .collect::<Vec<_>>()
        .join("&")
}

/// `pageSize=<n>` plus `&pageToken=<token>` for every page after the first.
pub fn page_query(page_size: u32, page_token: Option<&str>) -> String {
    match page_token {
        Some(token) => format!("pageSize={}&pageToken={}", page_size, token),
        None => format!("pageSize={}", page_size),
    }
}
