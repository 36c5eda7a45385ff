//! Client configuration.

use super::FirestoreError;
use std::time::Duration;
use yup_oauth2::ServiceAccountKey;

const FIRESTORE_V1_API: &str =
    "https://firestore.googleapis.com/v1/projects/{project_id}/databases/{database_id}/documents";

/// Number of documents requested per page when listing.
pub const DEFAULT_PAGE_SIZE: u32 = 250;

/// What a paginated listing hands back when a page fails midway.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PartialResults {
    /// Drop everything fetched so far and return only the error.
    #[default]
    Discard,
    /// Return the documents fetched before the failing page alongside the error.
    Keep,
}

/// Configuration shared by the transport and the document façade.
///
/// ```
/// use firestore_resource::firestore::config::FirestoreConfig;
/// use std::time::Duration;
///
/// let config = FirestoreConfig::new("my-project")
///     .with_timeout(Duration::from_secs(10))
///     .with_max_pages(100);
/// assert_eq!(config.page_size, 250);
/// ```
#[derive(Debug, Clone)]
pub struct FirestoreConfig {
    pub project_id: String,
    pub database_id: String,
    /// Overrides the documents root, e.g. to point at the emulator.
    pub base_url: Option<String>,
    pub page_size: u32,
    /// Upper bound on pages fetched by one listing. `None` means unbounded.
    /// A cap of 0 fails every listing with `PageLimitExceeded { pages: 0 }`
    /// before any request is sent.
    pub max_pages: Option<usize>,
    pub partial_results: PartialResults,
    pub timeout: Duration,
    /// Transient-failure retries performed by the HTTP transport. Zero disables
    /// the retry middleware entirely.
    pub transport_retries: u32,
    pub user_agent: String,
}

impl Default for FirestoreConfig {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            database_id: "(default)".to_string(),
            base_url: None,
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: None,
            partial_results: PartialResults::Discard,
            timeout: Duration::from_secs(30),
            transport_retries: 0,
            user_agent: format!("firestore-resource/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl FirestoreConfig {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            ..Default::default()
        }
    }

    /// Builds a configuration for the project named in a service-account key.
    pub fn from_key(key: &ServiceAccountKey) -> Result<Self, FirestoreError> {
        match key.project_id.as_deref() {
            Some(id) if !id.is_empty() => Ok(Self::new(id)),
            _ => Err(FirestoreError::ProjectIdMissing),
        }
    }

    pub fn with_database_id(mut self, database_id: impl Into<String>) -> Self {
        self.database_id = database_id.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Caps the pages one listing may fetch. See [`FirestoreConfig::max_pages`].
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = Some(max_pages);
        self
    }

    pub fn with_partial_results(mut self, policy: PartialResults) -> Self {
        self.partial_results = policy;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_transport_retries(mut self, retries: u32) -> Self {
        self.transport_retries = retries;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// The documents root every resource path is resolved against.
    pub fn documents_url(&self) -> String {
        match &self.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => FIRESTORE_V1_API
                .replace("{project_id}", &self.project_id)
                .replace("{database_id}", &self.database_id),
        }
    }
}
