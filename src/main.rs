use anyhow::Result;
use prbench::Config;

fn main() -> Result<()> {
    // Initialize logger from environment variable or default to info level
    env_logger::Builder::from_env(
        env_logger::Env::default()
            .filter_or("RUST_LOG", "info")
    ).init();

    // Parse command-line arguments
    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(|s| s.as_str()).unwrap_or("verify");

    match command {
        "verify" | _ => {
            // Default: verify configuration
            run_config_verification()?;
        }
    }

    Ok(())
}

/// Load the configuration, report the resolved settings, and check that the
/// credentials needed for each pipeline stage are present.
fn run_config_verification() -> Result<()> {
    log::info!("Starting PRBench v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::load()?;
    log::info!("Configuration loaded successfully");
    log::info!("Output directory: {}", config.output_dir().display());
    log::info!(
        "Target: {} PRs per repository (scan cap {})",
        config.scraping.max_prs_per_repo,
        config.scraping.max_candidates
    );

    let enabled = config.repositories.iter().filter(|r| r.enabled).count();
    log::info!("Repositories: {} configured, {} enabled", config.repositories.len(), enabled);

    log::info!(
        "Filters: merged_only={}, files {}..={}, min description {} chars, {} exclude patterns",
        config.pr_filters.merged_only,
        config.pr_filters.min_files_changed,
        config.pr_filters.max_files_changed,
        config.pr_filters.min_description_length,
        config.pr_filters.exclude_patterns.len()
    );
    if let Some(ref cutoff) = config.pr_filters.created_before {
        log::info!("Filters: created before {}", cutoff);
    }
    if let Some(months) = config.pr_filters.max_age_months {
        log::info!("Filters: merged within the last {} months", months);
    }

    log::info!("Judge model: {}", config.evaluation.model);

    match config.github_token() {
        Ok(_) => log::info!("GitHub token present ({})", config.github.token_env),
        Err(_) => log::warn!(
            "{} not set - the scrape binary will fail without it",
            config.github.token_env
        ),
    }
    match config.judge_api_key() {
        Ok(_) => log::info!("Judge API key present ({})", config.evaluation.api_key_env),
        Err(_) => log::warn!(
            "{} not set - the evaluate binary will fail without it",
            config.evaluation.api_key_env
        ),
    }

    log::info!("Configuration verification complete");
    Ok(())
}
