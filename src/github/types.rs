//! Wire types for the GitHub REST API payloads PRBench consumes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One pull request as returned by the listing endpoint.
///
/// Immutable once fetched; the filter and collector only read it.
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    /// Free-text description; null on GitHub becomes None here.
    #[serde(default)]
    pub body: Option<String>,
    pub html_url: String,
    pub created_at: DateTime<Utc>,
    /// Absent means the PR was never merged.
    #[serde(default)]
    pub merged_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub merge_commit_sha: Option<String>,
    pub base: BaseRef,
    pub head: HeadRef,
    pub user: User,
}

/// Base branch reference of a PR.
#[derive(Debug, Clone, Deserialize)]
pub struct BaseRef {
    #[serde(rename = "ref")]
    pub branch: String,
}

/// Head commit reference of a PR.
#[derive(Debug, Clone, Deserialize)]
pub struct HeadRef {
    pub sha: String,
}

/// PR author.
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub login: String,
}

/// One changed file in a PR. Persisted in checkpoints, so it also serializes.
///
/// `changes == additions + deletions` is expected from the API but not
/// re-validated here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileChange {
    pub filename: String,
    /// One of added, modified, removed (plus renamed/copied on newer API versions).
    pub status: String,
    pub additions: u64,
    pub deletions: u64,
    pub changes: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch: Option<String>,
}

/// Response of the /rate_limit quota endpoint.
#[derive(Debug, Deserialize)]
pub struct RateLimitResponse {
    pub resources: RateLimitResources,
}

#[derive(Debug, Deserialize)]
pub struct RateLimitResources {
    pub core: RateLimitCore,
}

/// Remaining quota and the epoch second at which it resets.
#[derive(Debug, Deserialize)]
pub struct RateLimitCore {
    pub remaining: u64,
    pub reset: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pull_request_deserializes_listing_payload() {
        let json = r#"{
            "number": 42,
            "title": "Fix retry logic",
            "body": "Reworks the backoff loop.",
            "html_url": "https://github.com/o/r/pull/42",
            "created_at": "2024-03-01T12:00:00Z",
            "merged_at": "2024-03-02T09:30:00Z",
            "merge_commit_sha": "abc123",
            "base": {"ref": "main"},
            "head": {"sha": "def456"},
            "user": {"login": "octocat"}
        }"#;
        let pr: PullRequest = serde_json::from_str(json).unwrap();
        assert_eq!(pr.number, 42);
        assert_eq!(pr.base.branch, "main");
        assert_eq!(pr.head.sha, "def456");
        assert_eq!(pr.user.login, "octocat");
        assert!(pr.merged_at.is_some());
    }

    #[test]
    fn test_pull_request_null_body_and_merged_at() {
        let json = r#"{
            "number": 7,
            "title": "WIP",
            "body": null,
            "html_url": "https://github.com/o/r/pull/7",
            "created_at": "2024-03-01T12:00:00Z",
            "merged_at": null,
            "merge_commit_sha": null,
            "base": {"ref": "main"},
            "head": {"sha": "fff"},
            "user": {"login": "octocat"}
        }"#;
        let pr: PullRequest = serde_json::from_str(json).unwrap();
        assert!(pr.body.is_none());
        assert!(pr.merged_at.is_none());
    }

    #[test]
    fn test_file_change_missing_patch() {
        let json = r#"{
            "filename": "src/lib.rs",
            "status": "modified",
            "additions": 10,
            "deletions": 2,
            "changes": 12
        }"#;
        let file: FileChange = serde_json::from_str(json).unwrap();
        assert_eq!(file.changes, 12);
        assert!(file.patch.is_none());
    }

    #[test]
    fn test_rate_limit_response() {
        let json = r#"{"resources": {"core": {"remaining": 4980, "reset": 1700000000, "limit": 5000}}}"#;
        let rl: RateLimitResponse = serde_json::from_str(json).unwrap();
        assert_eq!(rl.resources.core.remaining, 4980);
        assert_eq!(rl.resources.core.reset, 1700000000);
    }
}
