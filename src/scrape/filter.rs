//! Structural PR filter: ordered predicate checks with a fixed rejection
//! vocabulary, evaluated first-failure-wins.

use crate::config::FilterConfig;
use crate::error::{PrbenchError, Result};
use crate::github::types::{FileChange, PullRequest};
use chrono::{DateTime, Duration, Utc};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Serialize;

/// Why a candidate was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    NotMerged,
    CreatedTooLate,
    TooOld,
    TooFewFiles,
    TooManyFiles,
    InsufficientDescription,
    OnlyExcludedFileTypes,
    TrivialChanges,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::NotMerged => "not_merged",
            RejectReason::CreatedTooLate => "created_too_late",
            RejectReason::TooOld => "too_old",
            RejectReason::TooFewFiles => "too_few_files",
            RejectReason::TooManyFiles => "too_many_files",
            RejectReason::InsufficientDescription => "insufficient_description",
            RejectReason::OnlyExcludedFileTypes => "only_excluded_file_types",
            RejectReason::TrivialChanges => "trivial_changes",
        }
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accept/reject decision for one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOutcome {
    Accepted,
    Rejected(RejectReason),
}

/// Whether the caller should keep scanning after this candidate.
///
/// Kept separate from the rejection reason: the listing is sorted by
/// creation date descending, so a too-old candidate implies every later
/// candidate is also too old, and the driver must stop paging. No other
/// rejection carries a control-flow meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanControl {
    Continue,
    StopScan,
}

/// Filter result: the outcome plus the scan-control signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterVerdict {
    pub outcome: FilterOutcome,
    pub control: ScanControl,
}

impl FilterVerdict {
    pub fn accepted() -> Self {
        Self {
            outcome: FilterOutcome::Accepted,
            control: ScanControl::Continue,
        }
    }

    /// The reason-to-control mapping lives here and nowhere else.
    pub fn rejected(reason: RejectReason) -> Self {
        let control = match reason {
            RejectReason::TooOld => ScanControl::StopScan,
            _ => ScanControl::Continue,
        };
        Self {
            outcome: FilterOutcome::Rejected(reason),
            control,
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self.outcome, FilterOutcome::Accepted)
    }

    pub fn should_stop(&self) -> bool {
        matches!(self.control, ScanControl::StopScan)
    }
}

/// Compiled PR filter.
///
/// Construction parses the cutoff date and compiles the exclude globs once;
/// `evaluate` is then a pure function over its inputs.
pub struct PrFilter {
    merged_only: bool,
    created_before: Option<DateTime<Utc>>,
    max_age_months: Option<u32>,
    min_files_changed: usize,
    max_files_changed: usize,
    require_description: bool,
    min_description_length: usize,
    exclude: GlobSet,
}

impl PrFilter {
    pub fn new(config: &FilterConfig) -> Result<Self> {
        let created_before = match &config.created_before {
            Some(s) => Some(
                DateTime::parse_from_rfc3339(s)
                    .map_err(|e| PrbenchError::Parse(format!("Invalid created_before date {}: {}", s, e)))?
                    .with_timezone(&Utc),
            ),
            None => None,
        };

        let mut builder = GlobSetBuilder::new();
        for pattern in &config.exclude_patterns {
            let glob = Glob::new(pattern)
                .map_err(|e| PrbenchError::Parse(format!("Invalid exclude pattern {}: {}", pattern, e)))?;
            builder.add(glob);
        }
        let exclude = builder
            .build()
            .map_err(|e| PrbenchError::Parse(format!("Failed to build exclude set: {}", e)))?;

        Ok(Self {
            merged_only: config.merged_only,
            created_before,
            max_age_months: config.max_age_months,
            min_files_changed: config.min_files_changed,
            max_files_changed: config.max_files_changed,
            require_description: config.require_description,
            min_description_length: config.min_description_length,
            exclude,
        })
    }

    /// Evaluate one candidate against the configured criteria.
    ///
    /// Checks run in a fixed order and the first failing check decides the
    /// verdict; later checks are not evaluated. `now` is passed in so the
    /// age check stays deterministic under test.
    pub fn evaluate(&self, pr: &PullRequest, files: &[FileChange], now: DateTime<Utc>) -> FilterVerdict {
        if self.merged_only && pr.merged_at.is_none() {
            return FilterVerdict::rejected(RejectReason::NotMerged);
        }

        if let Some(cutoff) = self.created_before {
            if pr.created_at >= cutoff {
                return FilterVerdict::rejected(RejectReason::CreatedTooLate);
            }
        }

        if let (Some(months), Some(merged_at)) = (self.max_age_months, pr.merged_at) {
            let cutoff = now - Duration::days(i64::from(months) * 30);
            if merged_at < cutoff {
                return FilterVerdict::rejected(RejectReason::TooOld);
            }
        }

        let num_files = files.len();
        if num_files < self.min_files_changed {
            return FilterVerdict::rejected(RejectReason::TooFewFiles);
        }
        if num_files > self.max_files_changed {
            return FilterVerdict::rejected(RejectReason::TooManyFiles);
        }

        if self.require_description {
            let body_len = pr.body.as_deref().unwrap_or("").chars().count();
            if body_len < self.min_description_length {
                return FilterVerdict::rejected(RejectReason::InsufficientDescription);
            }
        }

        // Files left after dropping docs-only / generated-file patterns
        let non_excluded: Vec<&FileChange> = files
            .iter()
            .filter(|f| !self.exclude.is_match(&f.filename))
            .collect();

        if non_excluded.is_empty() {
            return FilterVerdict::rejected(RejectReason::OnlyExcludedFileTypes);
        }

        let avg_changes =
            non_excluded.iter().map(|f| f.changes as f64).sum::<f64>() / non_excluded.len() as f64;
        if avg_changes < 5.0 {
            return FilterVerdict::rejected(RejectReason::TrivialChanges);
        }

        FilterVerdict::accepted()
    }
}
