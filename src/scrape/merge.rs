//! Merge per-repository collection outputs into a single dataset file plus
//! a summary of per-repo counts.

use crate::error::Result;
use crate::scrape::checkpoint::ScrapedPr;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use walkdir::WalkDir;

/// One accepted PR tagged with the repository it came from.
#[derive(Debug, Serialize, Deserialize)]
pub struct MergedPr {
    pub repository: String,
    #[serde(flatten)]
    pub pr: ScrapedPr,
}

/// Per-run totals written alongside the merged dataset.
#[derive(Debug, Serialize, Deserialize)]
pub struct ScrapeSummary {
    pub scraped_at: DateTime<Utc>,
    pub repositories: BTreeMap<String, usize>,
    pub total_prs: usize,
}

/// Discover `<repo_dir>/prs.json` files one level under the output directory.
///
/// Returns (repository name, file path) pairs sorted by name, so merged
/// output is deterministic across runs.
fn find_repo_outputs(output_dir: &Path) -> Vec<(String, std::path::PathBuf)> {
    let mut outputs = Vec::new();
    for entry in WalkDir::new(output_dir)
        .min_depth(2)
        .max_depth(2)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if path.is_file() && path.file_name().is_some_and(|n| n == "prs.json") {
            if let Some(repo_name) = path
                .parent()
                .and_then(|p| p.file_name())
                .and_then(|n| n.to_str())
            {
                outputs.push((repo_name.to_string(), path.to_path_buf()));
            }
        }
    }
    outputs.sort();
    outputs
}

/// Merge all per-repo `prs.json` files under `output_dir` into
/// `all_prs.json` and write `summary.json` with per-repo counts.
pub fn merge_scraped(output_dir: &Path) -> Result<ScrapeSummary> {
    let mut merged: Vec<MergedPr> = Vec::new();
    let mut repositories = BTreeMap::new();

    for (repo_name, path) in find_repo_outputs(output_dir) {
        let content = std::fs::read_to_string(&path)?;
        let prs: Vec<ScrapedPr> = serde_json::from_str(&content)?;
        log::info!("Loaded {} PRs from {}", prs.len(), repo_name);
        repositories.insert(repo_name.clone(), prs.len());
        merged.extend(prs.into_iter().map(|pr| MergedPr {
            repository: repo_name.clone(),
            pr,
        }));
    }

    let summary = ScrapeSummary {
        scraped_at: Utc::now(),
        total_prs: merged.len(),
        repositories,
    };

    std::fs::create_dir_all(output_dir)?;
    std::fs::write(
        output_dir.join("all_prs.json"),
        serde_json::to_string_pretty(&merged)?,
    )?;
    std::fs::write(
        output_dir.join("summary.json"),
        serde_json::to_string_pretty(&summary)?,
    )?;

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::types::{BaseRef, FileChange, HeadRef, PullRequest, User};
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn write_repo_output(output_dir: &Path, repo: &str, numbers: &[u64]) {
        let repo_dir = output_dir.join(repo);
        std::fs::create_dir_all(&repo_dir).unwrap();
        let prs: Vec<ScrapedPr> = numbers
            .iter()
            .map(|&n| {
                let pr = PullRequest {
                    number: n,
                    title: format!("PR #{}", n),
                    body: Some("body".to_string()),
                    html_url: format!("https://github.com/o/r/pull/{}", n),
                    created_at: Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
                    merged_at: Some(Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap()),
                    merge_commit_sha: Some("abc".to_string()),
                    base: BaseRef { branch: "main".to_string() },
                    head: HeadRef { sha: "def".to_string() },
                    user: User { login: "octocat".to_string() },
                };
                ScrapedPr::from_api(
                    &pr,
                    vec![FileChange {
                        filename: "src/lib.rs".to_string(),
                        status: "modified".to_string(),
                        additions: 3,
                        deletions: 3,
                        changes: 6,
                        patch: None,
                    }],
                )
            })
            .collect();
        std::fs::write(
            repo_dir.join("prs.json"),
            serde_json::to_string_pretty(&prs).unwrap(),
        )
        .unwrap();
    }

    #[test]
    fn test_merge_combines_repos() {
        let temp_dir = TempDir::new().unwrap();
        write_repo_output(temp_dir.path(), "org_alpha", &[1, 2]);
        write_repo_output(temp_dir.path(), "org_beta", &[7]);

        let summary = merge_scraped(temp_dir.path()).unwrap();
        assert_eq!(summary.total_prs, 3);
        assert_eq!(summary.repositories.get("org_alpha"), Some(&2));
        assert_eq!(summary.repositories.get("org_beta"), Some(&1));

        let merged = std::fs::read_to_string(temp_dir.path().join("all_prs.json")).unwrap();
        let merged: Vec<MergedPr> = serde_json::from_str(&merged).unwrap();
        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0].repository, "org_alpha");
        assert_eq!(merged[2].repository, "org_beta");
        assert_eq!(merged[2].pr.pr_number, 7);
    }

    #[test]
    fn test_merge_skips_dirs_without_output() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir_all(temp_dir.path().join("empty_repo")).unwrap();
        write_repo_output(temp_dir.path(), "org_alpha", &[1]);

        let summary = merge_scraped(temp_dir.path()).unwrap();
        assert_eq!(summary.total_prs, 1);
        assert!(!summary.repositories.contains_key("empty_repo"));
    }

    #[test]
    fn test_merge_empty_output_dir() {
        let temp_dir = TempDir::new().unwrap();
        let summary = merge_scraped(temp_dir.path()).unwrap();
        assert_eq!(summary.total_prs, 0);
        assert!(summary.repositories.is_empty());
        assert!(temp_dir.path().join("summary.json").exists());
    }
}
