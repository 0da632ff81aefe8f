//! Resumable collection checkpoints: processed-id set plus accepted records,
//! rewritten wholesale on every save and mirrored to a plain output file.

use crate::error::Result;
use crate::github::types::{FileChange, PullRequest};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// One accepted PR in the shape persisted for downstream stages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapedPr {
    pub pr_number: u64,
    pub title: String,
    pub body: String,
    pub html_url: String,
    pub created_at: DateTime<Utc>,
    pub merged_at: Option<DateTime<Utc>>,
    pub merge_commit_sha: Option<String>,
    pub base_ref: String,
    pub head_sha: String,
    pub user: String,
    pub files: Vec<FileChange>,
    pub num_files: usize,
    pub scraped_at: DateTime<Utc>,
}

impl ScrapedPr {
    /// Flatten an API candidate and its file list into the persisted shape.
    pub fn from_api(pr: &PullRequest, files: Vec<FileChange>) -> Self {
        let num_files = files.len();
        Self {
            pr_number: pr.number,
            title: pr.title.clone(),
            body: pr.body.clone().unwrap_or_default(),
            html_url: pr.html_url.clone(),
            created_at: pr.created_at,
            merged_at: pr.merged_at,
            merge_commit_sha: pr.merge_commit_sha.clone(),
            base_ref: pr.base.branch.clone(),
            head_sha: pr.head.sha.clone(),
            user: pr.user.login.clone(),
            files,
            num_files,
            scraped_at: Utc::now(),
        }
    }
}

/// Persisted collection progress for one repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub processed_pr_numbers: BTreeSet<u64>,
    pub filtered_prs: Vec<ScrapedPr>,
    pub last_updated: DateTime<Utc>,
}

impl Checkpoint {
    pub fn new() -> Self {
        Self {
            processed_pr_numbers: BTreeSet::new(),
            filtered_prs: Vec::new(),
            last_updated: Utc::now(),
        }
    }

    pub fn is_processed(&self, pr_number: u64) -> bool {
        self.processed_pr_numbers.contains(&pr_number)
    }

    pub fn mark_processed(&mut self, pr_number: u64) {
        self.processed_pr_numbers.insert(pr_number);
    }

    pub fn accepted_count(&self) -> usize {
        self.filtered_prs.len()
    }
}

impl Default for Checkpoint {
    fn default() -> Self {
        Self::new()
    }
}

/// Owns the checkpoint file and its mirror output for one repository
/// directory. The checkpoint is read once at startup and rewritten
/// wholesale after each batch; there are no partial or append updates.
pub struct CheckpointStore {
    checkpoint_path: PathBuf,
    output_path: PathBuf,
}

impl CheckpointStore {
    pub fn new(repo_dir: &Path) -> Self {
        Self {
            checkpoint_path: repo_dir.join("checkpoint.json"),
            output_path: repo_dir.join("prs.json"),
        }
    }

    /// Load a previously persisted checkpoint, if any.
    pub fn load(&self) -> Result<Option<Checkpoint>> {
        if !self.checkpoint_path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.checkpoint_path)?;
        let checkpoint: Checkpoint = serde_json::from_str(&content)?;
        Ok(Some(checkpoint))
    }

    /// Persist the checkpoint and mirror the accepted list to the output file.
    ///
    /// Stamps `last_updated` before writing.
    pub fn save(&self, checkpoint: &mut Checkpoint) -> Result<()> {
        checkpoint.last_updated = Utc::now();

        if let Some(parent) = self.checkpoint_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(&self.checkpoint_path, serde_json::to_string_pretty(checkpoint)?)?;
        std::fs::write(&self.output_path, serde_json::to_string_pretty(&checkpoint.filtered_prs)?)?;

        log::debug!("Checkpoint saved: {} PRs", checkpoint.filtered_prs.len());
        Ok(())
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }
}
