use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::RetryConfig;

pub const DEFAULT_NVD_URL: &str = "https://services.nvd.nist.gov/rest/json/cves/2.0";
pub const DEFAULT_KEV_URL: &str =
    "https://www.cisa.gov/sites/default/files/feeds/known_exploited_vulnerabilities.json";
pub const DEFAULT_EPSS_URL: &str = "https://api.first.org/data/v1/epss";

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ForecastConfig {
    pub sources: SourcesConfig,
    pub fetch: FetchConfig,
    pub training: TrainingConfig,
    pub features: FeatureConfig,
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SourcesConfig {
    pub nvd: NvdSourceConfig,
    pub kev: KevSourceConfig,
    pub epss: EpssSourceConfig,
}

impl SourcesConfig {
    pub fn any_enabled(&self) -> bool {
        self.nvd.enabled || self.kev.enabled || self.epss.enabled
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NvdSourceConfig {
    pub enabled: bool,
    pub base_url: String,
    /// API key, or `$VAR` to read it from the environment.
    pub api_key: Option<String>,
    pub results_per_page: u32,
}

impl Default for NvdSourceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: DEFAULT_NVD_URL.to_string(),
            api_key: Some("$NVD_API_KEY".to_string()),
            results_per_page: 2000,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct KevSourceConfig {
    pub enabled: bool,
    pub url: String,
    /// A manually supplied catalog file. Takes precedence over `url`.
    pub path: Option<PathBuf>,
}

impl Default for KevSourceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: DEFAULT_KEV_URL.to_string(),
            path: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EpssSourceConfig {
    pub enabled: bool,
    pub base_url: String,
    pub page_size: u32,
}

impl Default for EpssSourceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: DEFAULT_EPSS_URL.to_string(),
            page_size: 1000,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FetchConfig {
    pub rate_limit_per_minute: u32,
    pub request_timeout_secs: u64,
    pub max_retries: u32,
    pub backoff_base_ms: u64,
    pub backoff_max_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        // NVD allows 50 requests per rolling 30s window with a key
        Self {
            rate_limit_per_minute: 50,
            request_timeout_secs: 30,
            max_retries: 3,
            backoff_base_ms: 1000,
            backoff_max_ms: 30_000,
        }
    }
}

impl FetchConfig {
    pub fn retry(&self) -> RetryConfig {
        RetryConfig {
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.backoff_base_ms),
            max_delay: Duration::from_millis(self.backoff_max_ms),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn request_interval(&self) -> Duration {
        Duration::from_secs_f64(60.0 / self.rate_limit_per_minute.max(1) as f64)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub test_ratio: f64,
    pub seed: u64,
    pub decision_threshold: f64,
    pub learning_rate: f64,
    pub max_iter: usize,
    pub l2: f64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            test_ratio: 0.2,
            seed: 42,
            decision_threshold: 0.5,
            learning_rate: 0.1,
            max_iter: 500,
            l2: 0.001,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct FeatureConfig {
    /// Maximum number of distinct levels kept per categorical feature.
    pub vocabulary_cap: usize,
    /// Levels seen fewer times than this during fit go to the "other" bucket.
    pub other_threshold: usize,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            vocabulary_cap: 50,
            other_threshold: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PathsConfig {
    pub data_dir: PathBuf,
    pub artifact_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            artifact_dir: PathBuf::from("./models"),
        }
    }
}

impl PathsConfig {
    pub fn dataset_path(&self) -> PathBuf {
        self.data_dir.join("dataset.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = ForecastConfig::default();
        assert!(config.sources.any_enabled());
        assert_eq!(config.training.seed, 42);
        assert_eq!(config.features.vocabulary_cap, 50);
        assert_eq!(config.fetch.max_retries, 3);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = "training:\n  seed: 7\nfeatures:\n  other_threshold: 2\n";
        let config: ForecastConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.training.seed, 7);
        assert_eq!(config.training.test_ratio, 0.2);
        assert_eq!(config.features.other_threshold, 2);
        assert_eq!(config.features.vocabulary_cap, 50);
        assert_eq!(config.sources.nvd.results_per_page, 2000);
    }

    #[test]
    fn test_request_interval_from_rate_limit() {
        let fetch = FetchConfig { rate_limit_per_minute: 120, ..Default::default() };
        assert_eq!(fetch.request_interval(), Duration::from_millis(500));
    }

    #[test]
    fn test_retry_from_fetch_config() {
        let fetch = FetchConfig { max_retries: 5, backoff_base_ms: 250, ..Default::default() };
        let retry = fetch.retry();
        assert_eq!(retry.max_retries, 5);
        assert_eq!(retry.base_delay, Duration::from_millis(250));
    }
}
