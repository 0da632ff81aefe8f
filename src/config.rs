use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub github: GithubConfig,
    pub scraping: ScrapingConfig,
    pub pr_filters: FilterConfig,
    #[serde(default)]
    pub repositories: Vec<RepositoryConfig>,
    #[serde(default)]
    pub evaluation: EvaluationConfig,
}

/// GitHub API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GithubConfig {
    #[serde(default = "default_token_env")]
    pub token_env: String,
    /// Sleep until the quota window resets when this few API calls remain.
    #[serde(default = "default_rate_limit_buffer")]
    pub rate_limit_buffer: u64,
}

/// Scraping / collection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ScrapingConfig {
    pub output_dir: PathBuf,
    /// Target number of accepted PRs per repository.
    pub max_prs_per_repo: usize,
    pub per_page: u32,
    /// Persist the checkpoint after this many acceptances.
    pub checkpoint_interval: usize,
    /// Hard cap on candidates examined per repository (bounds scans of
    /// inactive repositories).
    #[serde(default = "default_max_candidates")]
    pub max_candidates: usize,
}

/// PR filter criteria
#[derive(Debug, Clone, Deserialize)]
pub struct FilterConfig {
    /// PR state requested from the listing endpoint (open, closed, all).
    #[serde(default = "default_state")]
    pub state: String,
    pub merged_only: bool,
    /// Only keep PRs created strictly before this RFC3339 instant.
    #[serde(default)]
    pub created_before: Option<String>,
    /// Reject PRs merged more than this many months (30-day) ago. Also
    /// stops the scan, since listings are sorted by creation descending.
    #[serde(default)]
    pub max_age_months: Option<u32>,
    pub min_files_changed: usize,
    pub max_files_changed: usize,
    pub require_description: bool,
    pub min_description_length: usize,
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
}

/// One repository to scrape
#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryConfig {
    pub owner: String,
    pub name: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

/// Judge (answer evaluation) configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EvaluationConfig {
    #[serde(default = "default_judge_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_judge_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,
    #[serde(default = "default_prompt_file")]
    pub prompt_file: PathBuf,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_judge_key_env(),
            model: default_judge_model(),
            max_tokens: default_max_tokens(),
            max_retries: default_max_retries(),
            prompt_file: default_prompt_file(),
        }
    }
}

fn default_token_env() -> String {
    "GITHUB_TOKEN".to_string()
}

fn default_rate_limit_buffer() -> u64 {
    100
}

fn default_max_candidates() -> usize {
    500
}

fn default_state() -> String {
    "closed".to_string()
}

fn default_enabled() -> bool {
    true
}

fn default_judge_key_env() -> String {
    "ANTHROPIC_API_KEY".to_string()
}

fn default_judge_model() -> String {
    "claude-haiku-4-5".to_string()
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_max_retries() -> usize {
    3
}

fn default_prompt_file() -> PathBuf {
    PathBuf::from("prompts/evaluation_prompt.txt")
}

impl Config {
    /// Load configuration from file
    ///
    /// Loads environment variables from .env file (if present) before loading config.
    /// Looks for config file in this order:
    /// 1. Path specified in PRBENCH_CONFIG environment variable
    /// 2. ./config.toml in current directory
    pub fn load() -> Result<Self> {
        // Load .env file if it exists (ignore errors - file is optional)
        let _ = dotenv::dotenv();

        let config_path = std::env::var("PRBENCH_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config.toml"));

        let config_str = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config: Config = toml::from_str(&config_str)
            .context("Failed to parse config.toml")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if self.scraping.per_page == 0 || self.scraping.per_page > 100 {
            anyhow::bail!("scraping.per_page must be between 1 and 100");
        }

        if self.scraping.max_prs_per_repo == 0 {
            anyhow::bail!("scraping.max_prs_per_repo must be greater than 0");
        }

        if self.scraping.checkpoint_interval == 0 {
            anyhow::bail!("scraping.checkpoint_interval must be greater than 0");
        }

        if self.scraping.max_candidates == 0 {
            anyhow::bail!("scraping.max_candidates must be greater than 0");
        }

        if self.pr_filters.min_files_changed > self.pr_filters.max_files_changed {
            anyhow::bail!(
                "pr_filters.min_files_changed ({}) exceeds max_files_changed ({})",
                self.pr_filters.min_files_changed,
                self.pr_filters.max_files_changed
            );
        }

        // Fail at startup on a bad cutoff date rather than mid-scan
        if let Some(ref cutoff) = self.pr_filters.created_before {
            chrono::DateTime::parse_from_rfc3339(cutoff).with_context(|| {
                format!("pr_filters.created_before is not a valid RFC3339 timestamp: {}", cutoff)
            })?;
        }

        // Fail at startup on a bad exclude glob rather than mid-scan
        for pattern in &self.pr_filters.exclude_patterns {
            globset::Glob::new(pattern)
                .with_context(|| format!("Invalid exclude pattern: {}", pattern))?;
        }

        if self.evaluation.max_tokens == 0 {
            anyhow::bail!("evaluation.max_tokens must be greater than 0");
        }

        Ok(())
    }

    /// Resolve the GitHub token from the configured environment variable.
    /// Missing credentials abort the run (proceeding would fail every request).
    pub fn github_token(&self) -> Result<String> {
        std::env::var(&self.github.token_env).with_context(|| {
            format!(
                "Environment variable {} not set. Set it in your .env file or as an environment variable with your GitHub token.",
                self.github.token_env
            )
        })
    }

    /// Resolve the judge API key from the configured environment variable.
    pub fn judge_api_key(&self) -> Result<String> {
        std::env::var(&self.evaluation.api_key_env).with_context(|| {
            format!(
                "Environment variable {} not set. Set it in your .env file or as an environment variable with your judge API key.",
                self.evaluation.api_key_env
            )
        })
    }

    /// Get the scraping output directory
    pub fn output_dir(&self) -> &Path {
        &self.scraping.output_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Serialize config tests that mutate process-wide env so they don't race.
    static CONFIG_TEST_LOCK: Mutex<()> = Mutex::new(());

    fn test_config_toml() -> &'static str {
        r#"
[github]
token_env = "GITHUB_TOKEN"
rate_limit_buffer = 50

[scraping]
output_dir = "data/prs_raw"
max_prs_per_repo = 30
per_page = 100
checkpoint_interval = 5

[pr_filters]
state = "closed"
merged_only = true
created_before = "2024-06-01T00:00:00Z"
max_age_months = 6
min_files_changed = 2
max_files_changed = 20
require_description = true
min_description_length = 100
exclude_patterns = ["*.md", "docs/*"]

[[repositories]]
owner = "example-org"
name = "example-repo"

[evaluation]
model = "claude-haiku-4-5"
max_tokens = 1024
"#
    }

    fn with_config_env(config_path: &Path, f: impl FnOnce()) {
        let original = std::env::var("PRBENCH_CONFIG").ok();
        std::env::set_var("PRBENCH_CONFIG", config_path.to_str().unwrap());
        f();
        std::env::remove_var("PRBENCH_CONFIG");
        if let Some(val) = original {
            std::env::set_var("PRBENCH_CONFIG", val);
        }
    }

    #[test]
    fn test_config_load_success() {
        let _lock = CONFIG_TEST_LOCK.lock().unwrap();
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, test_config_toml()).unwrap();
        with_config_env(&config_path, || {
            let config = Config::load();
            assert!(config.is_ok(), "Config::load() failed: {:?}", config.err());
            let config = config.unwrap();
            assert_eq!(config.github.rate_limit_buffer, 50);
            assert_eq!(config.scraping.max_prs_per_repo, 30);
            assert_eq!(config.scraping.max_candidates, 500);
            assert_eq!(config.pr_filters.exclude_patterns.len(), 2);
            assert_eq!(config.repositories.len(), 1);
            assert!(config.repositories[0].enabled);
            assert_eq!(config.evaluation.max_retries, 3);
        });
    }

    #[test]
    fn test_config_invalid_path() {
        let _lock = CONFIG_TEST_LOCK.lock().unwrap();
        let original = std::env::var("PRBENCH_CONFIG").ok();
        std::env::set_var("PRBENCH_CONFIG", "nonexistent.toml");
        let config = Config::load();
        assert!(config.is_err());
        std::env::remove_var("PRBENCH_CONFIG");
        if let Some(v) = original {
            std::env::set_var("PRBENCH_CONFIG", v);
        }
    }

    #[test]
    fn test_config_rejects_bad_cutoff_date() {
        let _lock = CONFIG_TEST_LOCK.lock().unwrap();
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        let content = test_config_toml().replace("2024-06-01T00:00:00Z", "June 2024");
        fs::write(&config_path, content).unwrap();
        with_config_env(&config_path, || {
            let err = Config::load().unwrap_err();
            assert!(err.to_string().contains("created_before"));
        });
    }

    #[test]
    fn test_config_rejects_bad_exclude_pattern() {
        let _lock = CONFIG_TEST_LOCK.lock().unwrap();
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        let content = test_config_toml().replace(r#"["*.md", "docs/*"]"#, r#"["foo[bar"]"#);
        fs::write(&config_path, content).unwrap();
        with_config_env(&config_path, || {
            let err = Config::load().unwrap_err();
            assert!(err.to_string().contains("Invalid exclude pattern"));
        });
    }

    #[test]
    fn test_config_rejects_inverted_file_bounds() {
        let _lock = CONFIG_TEST_LOCK.lock().unwrap();
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        let content = test_config_toml().replace("min_files_changed = 2", "min_files_changed = 50");
        fs::write(&config_path, content).unwrap();
        with_config_env(&config_path, || {
            let err = Config::load().unwrap_err();
            assert!(err.to_string().contains("min_files_changed"));
        });
    }

    #[test]
    fn test_config_rejects_per_page_out_of_range() {
        let _lock = CONFIG_TEST_LOCK.lock().unwrap();
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        let content = test_config_toml().replace("per_page = 100", "per_page = 250");
        fs::write(&config_path, content).unwrap();
        with_config_env(&config_path, || {
            let err = Config::load().unwrap_err();
            assert!(err.to_string().contains("per_page"));
        });
    }
}
