use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;
use validator::Validate;

/// Environment variable naming an optional configuration file
pub const CONFIG_PATH_ENV: &str = "RSS_DATA_CONFIG";

/// Prefix for environment overrides, e.g. `RSS_DATA__ELASTICSEARCH__WRITE_INDEX`
pub const ENV_PREFIX: &str = "RSS_DATA";

const DEFAULT_CONFIG_PATH: &str = "config/article-index.toml";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Config {
    /// Store backend selection
    #[serde(default)]
    pub store: StoreConfig,

    /// Search engine connection and targets
    #[validate(nested)]
    pub elasticsearch: ElasticsearchConfig,

    /// Write index provisioning
    #[serde(default)]
    pub provision: ProvisionConfig,

    /// Logging configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from the embedded defaults, the file named by
    /// `RSS_DATA_CONFIG` (if present) and `RSS_DATA__*` environment variables
    pub fn load() -> crate::Result<Self> {
        let config_path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_file(Path::new(&config_path))
    }

    /// Load configuration using `path` as the optional override file
    pub fn load_file(path: &Path) -> crate::Result<Self> {
        let config: Config = config::Config::builder()
            // Start with default values
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            // Override with config file if it exists
            .add_source(config::File::from(path).required(false))
            // Override with environment variables
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string layered over the embedded defaults
    pub fn from_toml_str(toml: &str) -> crate::Result<Self> {
        let config: Config = config::Config::builder()
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StoreConfig {
    /// Store backend type
    #[serde(default)]
    pub backend: StoreBackend,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    #[default]
    Elasticsearch,
    InMemory,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ElasticsearchConfig {
    /// Expected cluster name; endpoints reporting another name are rejected
    pub cluster_name: Option<String>,

    /// Engine endpoints, as a list or a comma separated string
    #[serde(default, deserialize_with = "string_list")]
    pub endpoints: Vec<String>,

    /// Index that receives writes and deletes
    #[serde(default, deserialize_with = "non_empty_string")]
    pub write_index: Option<String>,

    /// Indices queried by search, as a list or a comma separated string
    #[serde(default, deserialize_with = "string_list")]
    pub search_indices: Vec<String>,

    /// Per-request timeout (seconds)
    #[serde(default = "default_request_timeout")]
    #[validate(range(min = 1, max = 3600))]
    pub request_timeout_secs: u64,
}

impl Default for ElasticsearchConfig {
    fn default() -> Self {
        Self {
            cluster_name: None,
            endpoints: vec!["localhost:9200".to_string()],
            write_index: None,
            search_indices: Vec::new(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProvisionConfig {
    /// Index to provision; falls back to `elasticsearch.write_index`
    #[serde(default, deserialize_with = "non_empty_string")]
    pub write_index: Option<String>,

    /// Drop an existing index before creating it
    #[serde(default)]
    pub drop_and_create: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log filter directive
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
        }
    }
}

/// Split a comma separated list, trimming whitespace and dropping empty entries
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrList {
    One(String),
    Many(Vec<String>),
}

fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<StringOrList>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(StringOrList::One(raw)) => parse_list(&raw),
        Some(StringOrList::Many(items)) => items
            .iter()
            .flat_map(|item| parse_list(item))
            .collect(),
    })
}

fn non_empty_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty()))
}

// Default value functions
fn default_request_timeout() -> u64 {
    30
}

fn default_log_level() -> String {
    "article_index=info".to_string()
}
