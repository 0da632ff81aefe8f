//! Scraping CLI: collect filtered PRs from every enabled repository, then
//! merge the per-repo outputs into one dataset.

use clap::Parser;
use prbench::github::GitHubClient;
use prbench::scrape::{merge, Collector, CheckpointStore, PrFilter, RepoSource};
use prbench::Config;

/// Collect pull requests for the benchmark dataset.
#[derive(Parser, Debug)]
#[command(name = "scrape")]
struct Args {
    /// Only scrape this repository (owner/name), ignoring the rest of the config.
    #[arg(long)]
    only: Option<String>,

    /// Skip the final merge of per-repo outputs.
    #[arg(long)]
    no_merge: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default()
            .filter_or("RUST_LOG", "info")
    ).init();

    let args = Args::parse();
    let config = Config::load()?;

    let token = config.github_token()?;
    let client = GitHubClient::new(&token, config.github.rate_limit_buffer)?;
    let filter = PrFilter::new(&config.pr_filters)?;

    if config.repositories.is_empty() {
        anyhow::bail!("No repositories configured. Add [[repositories]] entries to config.toml.");
    }

    let mut scraped_any = false;
    for repo in &config.repositories {
        let full_name = format!("{}/{}", repo.owner, repo.name);

        if !repo.enabled {
            log::info!("Skipping disabled repository: {}", full_name);
            continue;
        }
        if let Some(ref only) = args.only {
            if only != &full_name {
                continue;
            }
        }

        log::info!("Scraping repository: {}", full_name);

        let repo_dir = config.output_dir().join(format!("{}_{}", repo.owner, repo.name));
        let store = CheckpointStore::new(&repo_dir);
        let source = RepoSource::new(
            &client,
            repo.owner.clone(),
            repo.name.clone(),
            config.pr_filters.state.clone(),
            config.scraping.per_page,
        );
        let collector = Collector::new(
            &filter,
            config.scraping.max_prs_per_repo,
            config.scraping.checkpoint_interval,
            config.scraping.max_candidates,
        );

        // One failing repository must not abort the others; its checkpoint
        // keeps whatever progress was saved before the failure
        match collector.collect(&source, &store).await {
            Ok(report) => {
                scraped_any = true;
                log::info!(
                    "{}: {} accepted ({} checked, {} skipped{})",
                    full_name,
                    report.prs.len(),
                    report.checked,
                    report.skipped,
                    if report.stopped_early { ", stopped early" } else { "" }
                );
            }
            Err(e) => {
                log::error!("Error scraping {}: {}", full_name, e);
                continue;
            }
        }
    }

    if args.only.is_some() && !scraped_any {
        anyhow::bail!("--only did not match any enabled configured repository");
    }

    if !args.no_merge {
        let summary = merge::merge_scraped(config.output_dir())?;
        log::info!("Scraping complete: {} PRs collected", summary.total_prs);
        for (repo, count) in &summary.repositories {
            log::info!("  {}: {} PRs", repo, count);
        }
        log::info!("Merged dataset: {}", config.output_dir().join("all_prs.json").display());
    }

    Ok(())
}
