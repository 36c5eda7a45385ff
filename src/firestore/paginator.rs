//! Follows `nextPageToken` across `documents.list` calls.
//!
//! A [`Paginator`] is either waiting to fetch (holding the token for the next
//! page, `None` before the first) or done. [`Paginator::collect`] concatenates
//! pages in fetch order; nothing is re-sorted.
//!
//! Dropping a paginator future cancels it: the in-flight request is abandoned
//! and no further page is requested.

use super::config::{FirestoreConfig, PartialResults, DEFAULT_PAGE_SIZE};
use super::models::{Document, ListResponse};
use super::{FirestoreError, FirestoreResource};
use futures::Stream;
use serde::de::DeserializeOwned;
use std::fmt;
use std::marker::PhantomData;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationOptions {
    pub page_size: u32,
    /// Stop with [`FirestoreError::PageLimitExceeded`] instead of fetching more
    /// than this many pages. `Some(0)` fails before the first request.
    pub max_pages: Option<usize>,
    pub partial_results: PartialResults,
}

impl Default for PaginationOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: None,
            partial_results: PartialResults::Discard,
        }
    }
}

impl From<&FirestoreConfig> for PaginationOptions {
    fn from(config: &FirestoreConfig) -> Self {
        Self {
            page_size: config.page_size,
            max_pages: config.max_pages,
            partial_results: config.partial_results,
        }
    }
}

/// A failed listing, plus whatever was fetched before the failure when the
/// policy is [`PartialResults::Keep`]. Empty under `Discard`.
pub struct PaginationError<T> {
    pub error: FirestoreError,
    pub partial: Vec<Document<T>>,
}

impl<T> fmt::Debug for PaginationError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaginationError")
            .field("error", &self.error)
            .field("partial", &self.partial.len())
            .finish()
    }
}

impl<T> fmt::Display for PaginationError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "listing failed with {} documents fetched: {}",
            self.partial.len(),
            self.error
        )
    }
}

impl<T> std::error::Error for PaginationError<T> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl<T> From<PaginationError<T>> for FirestoreError {
    fn from(err: PaginationError<T>) -> Self {
        err.error
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PageState {
    HasMore(Option<String>),
    Done,
}

pub struct Paginator<T> {
    resource: FirestoreResource,
    path: String,
    options: PaginationOptions,
    state: PageState,
    pages_fetched: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> Paginator<T> {
    pub fn new(resource: FirestoreResource, path: impl Into<String>, options: PaginationOptions) -> Self {
        Self {
            resource,
            path: path.into(),
            options,
            state: PageState::HasMore(None),
            pages_fetched: 0,
            _marker: PhantomData,
        }
    }

    pub fn is_done(&self) -> bool {
        self.state == PageState::Done
    }

    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    /// Fetches the next page. `Ok(None)` once the service has stopped returning
    /// a token. After an error the paginator is done.
    pub async fn next_page(&mut self) -> Result<Option<Vec<Document<T>>>, FirestoreError> {
        let token = match &self.state {
            PageState::Done => return Ok(None),
            PageState::HasMore(token) => token.clone(),
        };

        if let Some(max) = self.options.max_pages {
            if self.pages_fetched >= max {
                self.state = PageState::Done;
                return Err(FirestoreError::PageLimitExceeded { pages: max });
            }
        }

        let page: ListResponse<T> = match self
            .resource
            .list_documents_page(&self.path, self.options.page_size, token.as_deref())
            .await
        {
            Ok(page) => page,
            Err(e) => {
                self.state = PageState::Done;
                return Err(e);
            }
        };

        self.pages_fetched += 1;
        self.state = match page.next_token() {
            Some(next) => PageState::HasMore(Some(next.to_string())),
            None => PageState::Done,
        };

        tracing::debug!(
            path = %self.path,
            page = self.pages_fetched,
            documents = page.documents.len(),
            more = !self.is_done(),
            "fetched page"
        );

        Ok(Some(page.documents))
    }

    /// Drains every remaining page into one ordered list.
    pub async fn collect(mut self) -> Result<Vec<Document<T>>, PaginationError<T>> {
        let mut documents = Vec::new();
        loop {
            match self.next_page().await {
                Ok(Some(page)) => documents.extend(page),
                Ok(None) => return Ok(documents),
                Err(error) => {
                    let partial = match self.options.partial_results {
                        PartialResults::Discard => Vec::new(),
                        PartialResults::Keep => documents,
                    };
                    return Err(PaginationError { error, partial });
                }
            }
        }
    }

    /// Pages as a stream, fetched lazily and one at a time.
    pub fn into_stream(self) -> impl Stream<Item = Result<Vec<Document<T>>, FirestoreError>> {
        futures::stream::try_unfold(self, |mut paginator| async move {
            let page = paginator.next_page().await?;
            Ok::<_, FirestoreError>(page.map(|documents| (documents, paginator)))
        })
    }
}
