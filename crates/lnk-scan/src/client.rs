use async_trait::async_trait;
use lnk_core::{Candidate, PageCursor};
use thiserror::Error;

/// One page of search results as returned by the platform.
#[derive(Debug, Clone)]
pub struct SearchPage {
    pub candidates: Vec<Candidate>,
    /// Cursor for the following page, `None` when results are exhausted.
    pub next: Option<PageCursor>,
    pub meta: ResponseMeta,
}

/// Enough of the raw response to run detection against: the final URL
/// after redirects and an excerpt of the body.
#[derive(Debug, Clone, Default)]
pub struct ResponseMeta {
    pub url: String,
    pub body_excerpt: String,
}

#[derive(Debug, Clone)]
pub struct ConnectResponse {
    pub status: ConnectStatus,
    pub meta: ResponseMeta,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectStatus {
    /// Invitation went out.
    Sent,
    /// The platform reports an existing or pending connection.
    AlreadyConnected,
    /// The platform refused the invite for this profile.
    Unreachable(String),
}

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("request timed out")]
    Timeout,
    #[error("malformed page: {0}")]
    MalformedPage(String),
    #[error("transport error: {0}")]
    Io(String),
}

impl PlatformError {
    /// Whether a retry of the same request could plausibly succeed.
    /// Malformed pages count: the platform intermittently serves partial
    /// or interstitial markup that a later fetch renders fine.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout | Self::Io(_) | Self::MalformedPage(_) => true,
        }
    }
}

/// Seam between the campaign engine and the actual platform. Production
/// implementations drive a browser or HTTP client; tests script pages
/// and connect responses.
#[async_trait]
pub trait PlatformClient: Send + Sync {
    /// Fetch one page of search results for an already-rendered
    /// canonical query.
    async fn fetch_page(
        &self,
        query: &str,
        cursor: &PageCursor,
    ) -> Result<SearchPage, PlatformError>;

    /// Send a connection invite, optionally with a note.
    async fn connect(
        &self,
        candidate: &Candidate,
        note: Option<&str>,
    ) -> Result<ConnectResponse, PlatformError>;
}
