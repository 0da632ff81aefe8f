use crate::error::{PrbenchError, Result};
use crate::github::types::{FileChange, PullRequest, RateLimitResponse};
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::Client;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.github.com";

/// GitHub REST API client with quota-aware pagination.
///
/// Before every request the client queries the quota endpoint; when the
/// remaining allowance drops below the configured buffer it sleeps until the
/// published reset time (plus a 10s cushion) and then proceeds. Non-quota
/// HTTP failures (4xx/5xx) are fatal and propagate to the caller unretried.
#[derive(Debug)]
pub struct GitHubClient {
    client: Client,
    base_url: String,
    rate_limit_buffer: u64,
}

impl GitHubClient {
    /// Create a new GitHub client.
    ///
    /// # Arguments
    ///
    /// * `token` - GitHub personal access token
    /// * `rate_limit_buffer` - wait for the quota reset when this few calls remain
    pub fn new(token: &str, rate_limit_buffer: u64) -> Result<Self> {
        if token.is_empty() {
            return Err(PrbenchError::Config("GitHub token is empty".to_string()));
        }

        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("token {}", token))
            .map_err(|_| PrbenchError::Config("GitHub token contains invalid characters".to_string()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github.v3+json"));

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("prbench/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()
            .map_err(|e| PrbenchError::Api(format!("Failed to build HTTP client: {}", e)))?;

        log::info!("GitHub API client initialized");

        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            rate_limit_buffer,
        })
    }

    /// Override the API base URL (used by tests against a local stub).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Check remaining quota and sleep until the reset if it is low.
    async fn check_rate_limit(&self) -> Result<()> {
        let url = format!("{}/rate_limit", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| PrbenchError::Api(format!("Network error: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(PrbenchError::Api(format!("GitHub API error {}: {}", status, body)));
        }

        let data: RateLimitResponse = response
            .json()
            .await
            .map_err(|e| PrbenchError::Api(format!("Failed to parse rate limit response: {}", e)))?;

        let remaining = data.resources.core.remaining;
        log::debug!("Rate limit: {} requests remaining", remaining);

        if remaining < self.rate_limit_buffer {
            // 10s cushion past the published reset, matching the API's own slack
            let wait_secs = data.resources.core.reset - Utc::now().timestamp() + 10;
            if wait_secs > 0 {
                log::warn!("Rate limit approaching. Waiting {} seconds...", wait_secs);
                tokio::time::sleep(Duration::from_secs(wait_secs as u64)).await;
            }
        }

        Ok(())
    }

    /// Fetch one page of the PR listing for a repository.
    ///
    /// Returns the page's PRs plus whether the response advertised a next
    /// page in its `Link` header. The listing is requested sorted by
    /// creation date descending, which the too-old early stop relies on.
    pub async fn list_pull_requests_page(
        &self,
        owner: &str,
        repo: &str,
        state: &str,
        per_page: u32,
        page: u64,
    ) -> Result<(Vec<PullRequest>, bool)> {
        self.check_rate_limit().await?;

        let url = format!("{}/repos/{}/{}/pulls", self.base_url, owner, repo);
        log::info!("Fetching PRs from {}/{} (page {})...", owner, repo, page);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("state", state.to_string()),
                ("per_page", per_page.to_string()),
                ("sort", "created".to_string()),
                ("direction", "desc".to_string()),
                ("page", page.to_string()),
            ])
            .send()
            .await
            .map_err(|e| PrbenchError::Api(format!("Network error: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(PrbenchError::Api(format!("GitHub API error {}: {}", status, body)));
        }

        let has_next = has_next_link(
            response
                .headers()
                .get(reqwest::header::LINK)
                .and_then(|v| v.to_str().ok()),
        );

        let prs: Vec<PullRequest> = response
            .json()
            .await
            .map_err(|e| PrbenchError::Api(format!("Failed to parse PR listing: {}", e)))?;

        Ok((prs, has_next))
    }

    /// Fetch the full list of changed files for one PR (paged internally).
    pub async fn pull_request_files(
        &self,
        owner: &str,
        repo: &str,
        pr_number: u64,
    ) -> Result<Vec<FileChange>> {
        self.check_rate_limit().await?;

        let url = format!("{}/repos/{}/{}/pulls/{}/files", self.base_url, owner, repo, pr_number);

        let mut all_files = Vec::new();
        let mut page: u64 = 1;

        loop {
            let response = self
                .client
                .get(&url)
                .query(&[("per_page", "100".to_string()), ("page", page.to_string())])
                .send()
                .await
                .map_err(|e| PrbenchError::Api(format!("Network error: {}", e)))?;

            let status = response.status();
            if !status.is_success() {
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unable to read error response".to_string());
                return Err(PrbenchError::Api(format!("GitHub API error {}: {}", status, body)));
            }

            let has_next = has_next_link(
                response
                    .headers()
                    .get(reqwest::header::LINK)
                    .and_then(|v| v.to_str().ok()),
            );

            let files: Vec<FileChange> = response
                .json()
                .await
                .map_err(|e| PrbenchError::Api(format!("Failed to parse file listing: {}", e)))?;

            if files.is_empty() {
                break;
            }

            all_files.extend(files);

            if !has_next {
                break;
            }
            page += 1;
        }

        Ok(all_files)
    }
}

/// True if an RFC 5988 `Link` header advertises a `rel="next"` page.
fn has_next_link(link_header: Option<&str>) -> bool {
    match link_header {
        Some(value) => value.split(',').any(|part| part.contains(r#"rel="next""#)),
        None => false,
    }
}
