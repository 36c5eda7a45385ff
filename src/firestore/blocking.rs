//! Direct-call wrapper over [`FirestoreResource`].
//!
//! Each method drives the corresponding async operation to completion on an
//! owned runtime. Do not call these from inside an async context; `block_on`
//! panics there.

use super::models::{Document, ListResponse};
use super::paginator::{PaginationError, PaginationOptions};
use super::{FirestoreError, FirestoreResource};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tokio::runtime::{Builder, Runtime};

pub struct BlockingFirestoreResource {
    inner: FirestoreResource,
    runtime: Arc<Runtime>,
}

impl BlockingFirestoreResource {
    /// Wraps `inner` with a fresh current-thread runtime.
    pub fn new(inner: FirestoreResource) -> Result<Self, FirestoreError> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        Ok(Self::with_runtime(inner, Arc::new(runtime)))
    }

    /// Wraps `inner` with a caller-owned runtime.
    pub fn with_runtime(inner: FirestoreResource, runtime: Arc<Runtime>) -> Self {
        Self { inner, runtime }
    }

    /// The async façade this wrapper drives.
    pub fn inner(&self) -> &FirestoreResource {
        &self.inner
    }

    pub fn get_document<T: DeserializeOwned>(&self, path: &str) -> Result<Document<T>, FirestoreError> {
        self.runtime.block_on(self.inner.get_document(path))
    }

    pub fn list_documents<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<Vec<Document<T>>, FirestoreError> {
        self.runtime.block_on(self.inner.list_documents(path))
    }

    pub fn list_documents_page<T: DeserializeOwned>(
        &self,
        path: &str,
        page_size: u32,
        page_token: Option<&str>,
    ) -> Result<ListResponse<T>, FirestoreError> {
        self.runtime
            .block_on(self.inner.list_documents_page(path, page_size, page_token))
    }

    pub fn list_all_documents<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<Vec<Document<T>>, FirestoreError> {
        self.runtime.block_on(self.inner.list_all_documents(path))
    }

    pub fn list_all_documents_with<T: DeserializeOwned>(
        &self,
        path: &str,
        options: PaginationOptions,
    ) -> Result<Vec<Document<T>>, PaginationError<T>> {
        self.runtime
            .block_on(self.inner.list_all_documents_with(path, options))
    }

    pub fn create_document<T: Serialize + DeserializeOwned>(
        &self,
        path: &str,
        name: Option<&str>,
        fields: &T,
    ) -> Result<Document<T>, FirestoreError> {
        self.runtime
            .block_on(self.inner.create_document(path, name, fields))
    }

    pub fn create_document_raw_unchecked<T: DeserializeOwned>(
        &self,
        path: &str,
        name: Option<&str>,
        raw: &str,
    ) -> Result<T, FirestoreError> {
        self.runtime
            .block_on(self.inner.create_document_raw_unchecked(path, name, raw))
    }

    pub fn update_document<T: Serialize + DeserializeOwned>(
        &self,
        path: &str,
        fields: &T,
        update_mask: Option<&[&str]>,
    ) -> Result<Document<T>, FirestoreError> {
        self.runtime
            .block_on(self.inner.update_document(path, fields, update_mask))
    }

    pub fn update_document_raw_unchecked<T: DeserializeOwned>(
        &self,
        path: &str,
        raw: &str,
        update_mask: Option<&[&str]>,
    ) -> Result<T, FirestoreError> {
        self.runtime
            .block_on(self.inner.update_document_raw_unchecked(path, raw, update_mask))
    }

    pub fn delete_document(&self, path: &str) -> Result<(), FirestoreError> {
        self.runtime.block_on(self.inner.delete_document(path))
    }
}
