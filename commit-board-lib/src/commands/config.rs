use crate::Result;
use crate::board::DEFAULT_REQUEST_PAUSE;
use crate::fetch::{DEFAULT_BATCH_PAUSE, DEFAULT_BATCH_SIZE, RetryPolicy};
use crate::github::DEFAULT_API_URL;
use crate::stats::{AggregatorSettings, CacheTtls, DEFAULT_GRAPH_URL_TEMPLATE};
use camino::{Utf8Path, Utf8PathBuf};
use core::time::Duration;
use ohno::{IntoAppError, app_err};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;

/// The default configuration TOML content, embedded from `default_config.toml`
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../../default_config.toml");

/// Name of the configuration file looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "commit-board.toml";

const LOG_TARGET: &str = "    config";

const MAX_RETRIES_LIMIT: u32 = 10;

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub github: GithubConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub batch: BatchConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub aggregation: AggregationConfig,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct GithubConfig {
    /// Base URL of the REST API
    pub api_url: String,

    /// Contribution graph image URL with a `{username}` placeholder
    pub graph_url_template: String,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            graph_url_template: DEFAULT_GRAPH_URL_TEMPLATE.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryConfig {
    pub max_retries: u32,

    #[serde(with = "humantime_serde")]
    pub initial_delay: Duration,

    #[serde(with = "humantime_serde")]
    pub max_reset_wait: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_retries: policy.max_retries,
            initial_delay: policy.initial_delay,
            max_reset_wait: policy.max_reset_wait,
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatchConfig {
    pub batch_size: usize,

    #[serde(with = "humantime_serde")]
    pub batch_pause: Duration,

    #[serde(with = "humantime_serde")]
    pub request_pause: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            batch_pause: DEFAULT_BATCH_PAUSE,
            request_pause: DEFAULT_REQUEST_PAUSE,
        }
    }
}

/// Per-endpoint response cache lifetimes
#[derive(Debug, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    #[serde(with = "humantime_serde")]
    pub profile: Duration,

    #[serde(with = "humantime_serde")]
    pub repositories: Duration,

    #[serde(with = "humantime_serde")]
    pub commits: Duration,

    #[serde(with = "humantime_serde")]
    pub search: Duration,

    #[serde(with = "humantime_serde")]
    pub participation: Duration,

    #[serde(with = "humantime_serde")]
    pub commit_detail: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        let ttls = CacheTtls::default();
        Self {
            profile: ttls.profile,
            repositories: ttls.repositories,
            commits: ttls.commits,
            search: ttls.search,
            participation: ttls.participation,
            commit_detail: ttls.commit_detail,
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AggregationConfig {
    pub detailed_repo_threshold: usize,
    pub max_commit_pages: u32,
    pub participation_sample: usize,
    pub sample_commit_sizes: bool,
    pub size_sample_repos: usize,
    pub size_sample_commits: u32,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        let settings = AggregatorSettings::default();
        Self {
            detailed_repo_threshold: settings.detailed_repo_threshold,
            max_commit_pages: settings.max_commit_pages,
            participation_sample: settings.participation_sample,
            sample_commit_sizes: settings.sample_commit_sizes,
            size_sample_repos: settings.size_sample_repos,
            size_sample_commits: settings.size_sample_commits,
        }
    }
}

impl Config {
    /// Load configuration from a file or use defaults
    ///
    /// Without an explicit path, `commit-board.toml` in `base_dir` is used if it exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or fails validation
    pub fn load(base_dir: &Utf8Path, config_path: Option<&Utf8PathBuf>) -> Result<Self> {
        let (final_path, text) = if let Some(path) = config_path {
            let text = fs::read_to_string(path).into_app_err_with(|| format!("reading commit-board configuration file '{path}'"))?;
            (path.clone(), text)
        } else {
            let path = base_dir.join(CONFIG_FILE_NAME);
            match fs::read_to_string(&path) {
                Ok(text) => (path, text),
                Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
                Err(e) => return Err(e).into_app_err_with(|| format!("reading commit-board configuration file '{path}'")),
            }
        };

        let config: Self = toml::from_str(&text).into_app_err_with(|| format!("parsing configuration file '{final_path}'"))?;
        config.validate()?;

        log::debug!(target: LOG_TARGET, "Loaded configuration from '{final_path}'");
        Ok(config)
    }

    /// Save the default configuration to a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written
    pub fn save_default(output_path: &Utf8Path) -> Result<()> {
        fs::write(output_path, DEFAULT_CONFIG_TOML).into_app_err_with(|| format!("writing default configuration to {output_path}"))?;
        Ok(())
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns an error if a value is out of range
    fn validate(&self) -> Result<()> {
        if self.batch.batch_size == 0 {
            return Err(app_err!("batch.batch_size must be at least 1"));
        }

        if self.retry.max_retries > MAX_RETRIES_LIMIT {
            return Err(app_err!(
                "retry.max_retries must be at most {MAX_RETRIES_LIMIT}, got {}",
                self.retry.max_retries
            ));
        }

        if self.aggregation.detailed_repo_threshold == 0 {
            return Err(app_err!("aggregation.detailed_repo_threshold must be at least 1"));
        }

        if !self.github.graph_url_template.contains("{username}") {
            return Err(app_err!(
                "github.graph_url_template must contain a {{username}} placeholder, got '{}'",
                self.github.graph_url_template
            ));
        }

        Ok(())
    }

    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.retry.max_retries,
            initial_delay: self.retry.initial_delay,
            max_reset_wait: self.retry.max_reset_wait,
        }
    }

    #[must_use]
    pub fn aggregator_settings(&self) -> AggregatorSettings {
        let aggregation = &self.aggregation;
        let cache = &self.cache;

        AggregatorSettings {
            detailed_repo_threshold: aggregation.detailed_repo_threshold,
            max_commit_pages: aggregation.max_commit_pages,
            participation_sample: aggregation.participation_sample,
            sample_commit_sizes: aggregation.sample_commit_sizes,
            size_sample_repos: aggregation.size_sample_repos,
            size_sample_commits: aggregation.size_sample_commits,
            graph_url_template: self.github.graph_url_template.clone(),
            ttls: CacheTtls {
                profile: cache.profile,
                repositories: cache.repositories,
                commits: cache.commits,
                search: cache.search,
                participation: cache.participation,
                commit_detail: cache.commit_detail,
            },
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn parse(text: &str) -> Config {
        toml::from_str(text).unwrap()
    }

    #[test]
    fn test_default_config_toml_matches_builtin_defaults() {
        let from_file = parse(DEFAULT_CONFIG_TOML);
        from_file.validate().unwrap();

        assert_eq!(from_file.retry_policy(), RetryPolicy::default());
        assert_eq!(from_file.aggregator_settings(), AggregatorSettings::default());
        assert_eq!(from_file.github.api_url, DEFAULT_API_URL);
        assert_eq!(from_file.batch.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(from_file.batch.batch_pause, DEFAULT_BATCH_PAUSE);
        assert_eq!(from_file.batch.request_pause, DEFAULT_REQUEST_PAUSE);
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = parse("");
        config.validate().unwrap();
        assert_eq!(config.aggregator_settings(), AggregatorSettings::default());
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config = parse("[batch]\nbatch_size = 2\n\n[cache]\nprofile = \"2h\"\n");
        assert_eq!(config.batch.batch_size, 2);
        assert_eq!(config.batch.batch_pause, DEFAULT_BATCH_PAUSE);
        assert_eq!(config.cache.profile, Duration::from_hours(2));
        assert_eq!(config.cache.commits, CacheTtls::default().commits);
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        assert!(toml::from_str::<Config>("[batch]\nbatch_sizes = 2\n").is_err());
        assert!(toml::from_str::<Config>("[unknown]\nvalue = 1\n").is_err());
    }

    #[test]
    fn test_validate_zero_batch_size() {
        let config = parse("[batch]\nbatch_size = 0\n");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_too_many_retries() {
        assert!(parse("[retry]\nmax_retries = 11\n").validate().is_err());
        parse("[retry]\nmax_retries = 10\n").validate().unwrap();
    }

    #[test]
    fn test_validate_zero_detailed_threshold() {
        let config = parse("[aggregation]\ndetailed_repo_threshold = 0\n");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_graph_template_without_placeholder() {
        let config = parse("[github]\ngraph_url_template = \"https://example.com/graph\"\n");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_settings_carry_overrides() {
        let config = parse("[github]\ngraph_url_template = \"https://graphs.example.com/{username}.svg\"\n\n[aggregation]\nsample_commit_sizes = false\n");
        let settings = config.aggregator_settings();
        assert_eq!(settings.graph_url_template, "https://graphs.example.com/{username}.svg");
        assert!(!settings.sample_commit_sizes);
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_save_default_and_load() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = Utf8PathBuf::try_from(tmp.path().to_path_buf()).unwrap();
        let output_path = dir.join(CONFIG_FILE_NAME);

        Config::save_default(&output_path).unwrap();
        let loaded = Config::load(&dir, None).unwrap();
        assert_eq!(loaded.aggregator_settings(), AggregatorSettings::default());
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_load_missing_config_uses_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = Utf8PathBuf::try_from(tmp.path().to_path_buf()).unwrap();
        let config = Config::load(&dir, None).unwrap();
        assert_eq!(config.retry_policy(), RetryPolicy::default());
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_load_explicit_missing_path_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = Utf8PathBuf::try_from(tmp.path().to_path_buf()).unwrap();
        let missing = dir.join("nope.toml");
        assert!(Config::load(&dir, Some(&missing)).is_err());
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_load_invalid_values_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = Utf8PathBuf::try_from(tmp.path().to_path_buf()).unwrap();
        fs::write(dir.join(CONFIG_FILE_NAME), "[batch]\nbatch_size = 0\n").unwrap();
        assert!(Config::load(&dir, None).is_err());
    }
}
