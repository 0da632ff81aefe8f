//! PR collection pipeline: structural filter, checkpointed collection loop,
//! and merged-output helpers.

pub mod checkpoint;
pub mod collector;
pub mod filter;
pub mod merge;

pub use checkpoint::{Checkpoint, CheckpointStore, ScrapedPr};
pub use collector::{CollectionReport, Collector, PrPage, PullRequestSource, RepoSource};
pub use filter::{FilterOutcome, FilterVerdict, PrFilter, RejectReason, ScanControl};
