//! HTTP driver for the platform seam.
//!
//! The session blob is the raw cookie header captured at login; it is
//! replayed verbatim on every request. Search and invitation endpoints
//! speak JSON; the final URL and a body excerpt ride along on every
//! response so the detection classifier sees what the platform
//! actually served.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use lnk_config::PlatformSettings;
use lnk_core::{Candidate, PageCursor, profile_id_from_url};
use lnk_detect::Verdict;
use lnk_scan::{
    ConnectResponse, ConnectStatus, PlatformClient, PlatformError, ResponseMeta, SearchPage,
};
use serde::Deserialize;
use tracing::{debug, warn};

const EXCERPT_MAX_BYTES: usize = 4096;

pub struct HttpPlatformClient {
    http: reqwest::Client,
    base_url: String,
    cookie_header: String,
}

#[derive(Deserialize)]
struct PageDto {
    #[serde(default)]
    profiles: Vec<ProfileDto>,
    #[serde(default)]
    next_token: Option<String>,
    #[serde(default)]
    has_more: bool,
}

#[derive(Deserialize)]
struct ProfileDto {
    profile_url: String,
    name: String,
    #[serde(default)]
    headline: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    company: Option<String>,
}

impl HttpPlatformClient {
    pub fn new(settings: &PlatformSettings, auth_blob: &[u8]) -> Result<Self> {
        let cookie_header = String::from_utf8_lossy(auth_blob).trim().to_string();
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            cookie_header,
        })
    }

    fn search_url(&self, query: &str, cursor: &PageCursor) -> String {
        let mut url = format!(
            "{}/search/results/people/?{}&page={}",
            self.base_url,
            query,
            cursor.page + 1
        );
        if let Some(token) = &cursor.token {
            url.push_str("&searchToken=");
            url.push_str(token);
        }
        url
    }

    async fn get_text(&self, url: &str) -> Result<(String, reqwest::StatusCode, String), PlatformError> {
        let response = self
            .http
            .get(url)
            .header(reqwest::header::COOKIE, &self.cookie_header)
            .send()
            .await
            .map_err(request_error)?;
        let final_url = response.url().to_string();
        let status = response.status();
        let body = response.text().await.map_err(request_error)?;
        Ok((final_url, status, body))
    }
}

fn request_error(e: reqwest::Error) -> PlatformError {
    if e.is_timeout() {
        PlatformError::Timeout
    } else {
        PlatformError::Io(e.to_string())
    }
}

/// Leading slice of the body, cut at a char boundary.
fn excerpt(body: &str) -> String {
    if body.len() <= EXCERPT_MAX_BYTES {
        return body.to_string();
    }
    let mut end = EXCERPT_MAX_BYTES;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    body[..end].to_string()
}

fn candidates_from_dto(profiles: Vec<ProfileDto>) -> Vec<Candidate> {
    profiles
        .into_iter()
        .filter_map(|p| match profile_id_from_url(&p.profile_url) {
            Some(profile_id) => Some(Candidate {
                profile_id,
                profile_url: p.profile_url,
                name: p.name,
                headline: p.headline,
                location: p.location,
                company: p.company,
            }),
            None => {
                warn!(url = %p.profile_url, "skipping profile without a parseable slug");
                None
            }
        })
        .collect()
}

#[async_trait]
impl PlatformClient for HttpPlatformClient {
    async fn fetch_page(
        &self,
        query: &str,
        cursor: &PageCursor,
    ) -> Result<SearchPage, PlatformError> {
        let url = self.search_url(query, cursor);
        debug!(page = cursor.page, "fetching search page");
        let (final_url, status, body) = self.get_text(&url).await?;
        let meta = ResponseMeta {
            url: final_url,
            body_excerpt: excerpt(&body),
        };

        let parsed = if status.is_success() {
            serde_json::from_str::<PageDto>(&body).ok()
        } else {
            None
        };
        let Some(dto) = parsed else {
            // A challenge or restriction page is a signal, not a parse
            // failure: hand it to the scanner so the classifier halts
            // the run properly.
            if lnk_detect::classify(&meta.url, &meta.body_excerpt).verdict != Verdict::Normal {
                return Ok(SearchPage {
                    candidates: Vec::new(),
                    next: None,
                    meta,
                });
            }
            if !status.is_success() {
                return Err(PlatformError::Io(format!("search returned {status}")));
            }
            return Err(PlatformError::MalformedPage(
                "unexpected search payload".to_string(),
            ));
        };
        let next = dto.has_more.then(|| PageCursor {
            page: cursor.page + 1,
            token: dto.next_token.clone(),
        });
        Ok(SearchPage {
            candidates: candidates_from_dto(dto.profiles),
            next,
            meta,
        })
    }

    async fn connect(
        &self,
        candidate: &Candidate,
        note: Option<&str>,
    ) -> Result<ConnectResponse, PlatformError> {
        let url = format!("{}/voyager/growth/invitations", self.base_url);
        let payload = serde_json::json!({
            "invitee": candidate.profile_id,
            "message": note,
        });
        let response = self
            .http
            .post(&url)
            .header(reqwest::header::COOKIE, &self.cookie_header)
            .json(&payload)
            .send()
            .await
            .map_err(request_error)?;
        let final_url = response.url().to_string();
        let status = response.status();
        let body = response.text().await.map_err(request_error)?;
        let meta = ResponseMeta {
            url: final_url,
            body_excerpt: excerpt(&body),
        };

        let outcome = if status.is_success() {
            ConnectStatus::Sent
        } else if status == reqwest::StatusCode::CONFLICT {
            ConnectStatus::AlreadyConnected
        } else {
            ConnectStatus::Unreachable(format!("invitation returned {status}"))
        };
        Ok(ConnectResponse {
            status: outcome,
            meta,
        })
    }
}
