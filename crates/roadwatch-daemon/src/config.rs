use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub db_dir: PathBuf,
    pub media_root: PathBuf,

    pub oracle_base_url: String,
    pub oracle_model: String,
    pub oracle_api_key: String,
    pub oracle_timeout_seconds: u64,

    /// Minimum oracle confidence required to confirm, on top of the
    /// boolean verdict. 0.0 means the verdict alone decides.
    pub min_confidence: f64,
    /// Label vocabulary the oracle verifies against.
    pub labels: Vec<String>,

    pub watcher_interval_seconds: u64,
    pub watcher_grace_seconds: u64,
}
