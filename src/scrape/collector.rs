//! Checkpointed collection loop: drives the paged PR source through the
//! filter, accumulating accepted records up to a target count with
//! resumable progress.

use crate::error::Result;
use crate::github::client::GitHubClient;
use crate::github::types::{FileChange, PullRequest};
use crate::scrape::checkpoint::{Checkpoint, CheckpointStore, ScrapedPr};
use crate::scrape::filter::{FilterOutcome, PrFilter};
use async_trait::async_trait;
use chrono::Utc;

/// One page of candidates plus whether the source advertises another page.
#[derive(Debug, Clone)]
pub struct PrPage {
    pub items: Vec<PullRequest>,
    pub has_next: bool,
}

/// Source of candidate PRs for one repository.
///
/// Abstracted so the collector can be driven by a scripted source in tests.
#[async_trait]
pub trait PullRequestSource {
    /// Fetch one page of the PR listing (1-based page numbers).
    async fn page(&self, page: u64) -> Result<PrPage>;

    /// Fetch the changed-file list for one PR.
    async fn files(&self, pr_number: u64) -> Result<Vec<FileChange>>;
}

/// Adapts [`GitHubClient`] to one repository's listing.
pub struct RepoSource<'a> {
    client: &'a GitHubClient,
    owner: String,
    repo: String,
    state: String,
    per_page: u32,
}

impl<'a> RepoSource<'a> {
    pub fn new(
        client: &'a GitHubClient,
        owner: impl Into<String>,
        repo: impl Into<String>,
        state: impl Into<String>,
        per_page: u32,
    ) -> Self {
        Self {
            client,
            owner: owner.into(),
            repo: repo.into(),
            state: state.into(),
            per_page,
        }
    }
}

#[async_trait]
impl PullRequestSource for RepoSource<'_> {
    async fn page(&self, page: u64) -> Result<PrPage> {
        let (items, has_next) = self
            .client
            .list_pull_requests_page(&self.owner, &self.repo, &self.state, self.per_page, page)
            .await?;
        Ok(PrPage { items, has_next })
    }

    async fn files(&self, pr_number: u64) -> Result<Vec<FileChange>> {
        self.client.pull_request_files(&self.owner, &self.repo, pr_number).await
    }
}

/// Outcome of one collection pass.
#[derive(Debug)]
pub struct CollectionReport {
    /// Accepted records in acceptance order (including resumed ones).
    pub prs: Vec<ScrapedPr>,
    /// Candidates returned by the listing across all fetched pages.
    pub fetched: usize,
    /// Candidates actually run through the filter this pass.
    pub checked: usize,
    /// Candidates rejected by the filter this pass.
    pub skipped: usize,
    /// True when the pass ended on the too-old signal or the scan cap.
    pub stopped_early: bool,
}

/// Drives pager + filter, persisting resumable progress.
pub struct Collector<'a> {
    filter: &'a PrFilter,
    target_count: usize,
    checkpoint_interval: usize,
    max_candidates: usize,
}

impl<'a> Collector<'a> {
    pub fn new(
        filter: &'a PrFilter,
        target_count: usize,
        checkpoint_interval: usize,
        max_candidates: usize,
    ) -> Self {
        Self {
            filter,
            target_count,
            checkpoint_interval,
            max_candidates,
        }
    }

    /// Collect accepted PRs until the target count, the too-old signal, the
    /// scan cap, or the end of the listing.
    ///
    /// Resumes from a persisted checkpoint when one exists. The checkpoint
    /// is persisted after every `checkpoint_interval` acceptances and
    /// unconditionally on every termination path, so partial progress
    /// survives interruption. Candidates whose file list cannot be fetched
    /// are marked processed and skipped without counting as checked.
    pub async fn collect<S>(&self, source: &S, store: &CheckpointStore) -> Result<CollectionReport>
    where
        S: PullRequestSource + Sync,
    {
        let mut checkpoint = match store.load()? {
            Some(checkpoint) => {
                log::info!(
                    "Resuming from checkpoint: {} PRs already processed, {} accepted",
                    checkpoint.processed_pr_numbers.len(),
                    checkpoint.accepted_count()
                );
                checkpoint
            }
            None => Checkpoint::new(),
        };

        let mut fetched = 0;
        let mut checked = 0;
        let mut skipped = 0;
        let mut stopped_early = false;

        let mut page: u64 = 1;

        // A resumed checkpoint that already meets the target is a no-op pass.
        'pages: while checkpoint.accepted_count() < self.target_count {
            let pr_page = source.page(page).await?;
            if pr_page.items.is_empty() {
                log::info!("No more PRs available");
                break;
            }

            fetched += pr_page.items.len();
            log::info!("  Retrieved {} PRs (total fetched: {})", pr_page.items.len(), fetched);

            for pr in &pr_page.items {
                if checkpoint.is_processed(pr.number) {
                    log::debug!("  PR #{}: already processed", pr.number);
                    continue;
                }

                if checkpoint.accepted_count() >= self.target_count {
                    log::info!("Reached target of {} PRs", self.target_count);
                    break 'pages;
                }

                log::info!(
                    "  [{}/{}] Processing PR #{}: {}",
                    checkpoint.accepted_count(),
                    self.target_count,
                    pr.number,
                    truncate(&pr.title, 60)
                );

                // A failed file fetch skips the candidate without counting it
                // as rejected or accepted
                let files = match source.files(pr.number).await {
                    Ok(files) => files,
                    Err(e) => {
                        log::error!("    Error fetching files for PR #{}: {}", pr.number, e);
                        checkpoint.mark_processed(pr.number);
                        continue;
                    }
                };

                checked += 1;

                let verdict = self.filter.evaluate(pr, &files, Utc::now());
                match verdict.outcome {
                    FilterOutcome::Rejected(reason) => {
                        log::info!("    Excluded: {}", reason);
                        skipped += 1;
                        checkpoint.mark_processed(pr.number);

                        if verdict.should_stop() {
                            log::warn!(
                                "Encountered old PR - stopping search (checked {} PRs)",
                                checked
                            );
                            store.save(&mut checkpoint)?;
                            return Ok(CollectionReport {
                                prs: checkpoint.filtered_prs,
                                fetched,
                                checked,
                                skipped,
                                stopped_early: true,
                            });
                        }
                    }
                    FilterOutcome::Accepted => {
                        checkpoint.filtered_prs.push(ScrapedPr::from_api(pr, files));
                        checkpoint.mark_processed(pr.number);
                        log::info!(
                            "    Included ({}/{})",
                            checkpoint.accepted_count(),
                            self.target_count
                        );

                        if checkpoint.accepted_count() % self.checkpoint_interval == 0 {
                            store.save(&mut checkpoint)?;
                        }
                    }
                }
            }

            if checked >= self.max_candidates {
                log::warn!("Reached scan cap of {} candidates", self.max_candidates);
                stopped_early = true;
                break;
            }

            if !pr_page.has_next {
                log::info!("No more pages available");
                break;
            }

            page += 1;
        }

        store.save(&mut checkpoint)?;

        log::info!(
            "Collection summary: fetched {}, checked {}, included {}, skipped {}",
            fetched,
            checked,
            checkpoint.accepted_count(),
            skipped
        );

        Ok(CollectionReport {
            prs: checkpoint.filtered_prs,
            fetched,
            checked,
            skipped,
            stopped_early,
        })
    }
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
