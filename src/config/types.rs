use serde::Deserialize;

/// Main configuration structure for Ripple-Update
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub update: UpdateConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    pub storage: StorageConfig,
}

impl Config {
    /// Default settings over the given crawl database
    pub fn with_database_path(path: impl Into<String>) -> Self {
        Self {
            update: UpdateConfig::default(),
            schedule: ScheduleConfig::default(),
            scoring: ScoringConfig::default(),
            storage: StorageConfig {
                database_path: path.into(),
            },
        }
    }
}

/// Graph update behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct UpdateConfig {
    /// Label for the crawl this database belongs to
    pub crawl_id: String,

    /// Pages deeper than this are not expanded into outlink shards
    pub max_distance: u32,

    /// Maximum number of outlinks emitted per page
    pub max_outlinks: usize,

    /// Whether unseen outlink targets get a new page record
    pub additions_allowed: bool,

    /// RETRY pages with this many retries become GONE
    pub retry_max: u32,

    /// Hard ceiling on the fetch interval (seconds); longer intervals force a refetch
    pub max_fetch_interval: i64,

    /// Maximum number of inbound links kept per page
    pub max_inlinks: usize,

    /// Number of parallel map and reduce tasks
    pub workers: usize,

    /// Number of shuffle partitions
    pub partitions: usize,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            crawl_id: "default".to_string(),
            max_distance: u32::MAX,
            max_outlinks: 1000,
            additions_allowed: true,
            retry_max: 3,
            max_fetch_interval: 90 * 24 * 3600,
            max_inlinks: 10_000,
            workers: 4,
            partitions: 8,
        }
    }
}

/// Fetch schedule configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ScheduleConfig {
    /// Schedule policy name: "default", "adaptive" or "news"
    pub class: String,

    /// Interval given to newly created pages (seconds)
    pub default_interval: i64,

    /// Lower bound of computed intervals (seconds)
    pub min_interval: i64,

    /// Upper bound of computed intervals (seconds)
    pub max_interval: i64,

    /// Upper bound for seed pages under the news policy (seconds)
    pub seed_max_interval: i64,

    pub inc_rate: f64,

    pub dec_rate: f64,

    /// Shift the next fetch toward the observed modification time
    pub sync_delta: bool,

    pub sync_delta_rate: f64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            class: "adaptive".to_string(),
            default_interval: 30 * 24 * 3600,
            min_interval: 60,
            max_interval: 365 * 24 * 3600,
            seed_max_interval: 24 * 3600,
            inc_rate: 0.2,
            dec_rate: 0.2,
            sync_delta: true,
            sync_delta_rate: 0.2,
        }
    }
}

/// Scoring filter configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ScoringConfig {
    /// Scoring filter name: "opic" or "link"
    pub class: String,

    /// Multiplier for score flowing to same-host outlinks
    pub internal_link_factor: f32,

    /// Multiplier for score flowing to other hosts
    pub external_link_factor: f32,

    /// Multiplier applied by the link-analysis filter at index time
    pub normalize_score: f32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            class: "opic".to_string(),
            internal_link_factor: 1.0,
            external_link_factor: 1.0,
            normalize_score: 1.0,
        }
    }
}

/// Crawl database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite crawl database
    #[serde(rename = "database-path")]
    pub database_path: String,
}
