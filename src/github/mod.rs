//! GitHub REST API client: rate-limited pagination over PR listings and
//! per-PR file listings.

pub mod client;
pub mod types;

pub use client::GitHubClient;
pub use types::{FileChange, PullRequest};
