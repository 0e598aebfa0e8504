use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

/// Maximum accepted upload size in bytes (5 MiB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 5 * 1024 * 1024;
/// Maximum number of files in one batch.
pub const DEFAULT_MAX_FILES_PER_BATCH: usize = 10;
pub const DEFAULT_ALLOWED_EXTENSION: &str = ".json";
pub const DEFAULT_ALLOWED_MEDIA_TYPE: &str = "application/json";
/// Wait between two result queries for the same upload.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;
/// Result queries issued before giving up (~60 seconds at the default interval).
pub const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 30;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub limits: LimitsConfig,
    pub polling: PollingConfig,
    pub server: ServerConfig,
    pub storage: StorageConfig,
}

/// Backend API the client talks to
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    /// Base URL of the backend (e.g., "http://localhost:8080")
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_timeout() -> u32 {
    30
}

/// Client-side file checks applied before anything is uploaded
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LimitsConfig {
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    #[serde(default = "default_max_files_per_batch")]
    pub max_files_per_batch: usize,
    #[serde(default = "default_allowed_extension")]
    pub allowed_extension: String,
    #[serde(default = "default_allowed_media_type")]
    pub allowed_media_type: String,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size: default_max_file_size(),
            max_files_per_batch: default_max_files_per_batch(),
            allowed_extension: default_allowed_extension(),
            allowed_media_type: default_allowed_media_type(),
        }
    }
}

fn default_max_file_size() -> u64 {
    DEFAULT_MAX_FILE_SIZE
}

fn default_max_files_per_batch() -> usize {
    DEFAULT_MAX_FILES_PER_BATCH
}

fn default_allowed_extension() -> String {
    DEFAULT_ALLOWED_EXTENSION.to_string()
}

fn default_allowed_media_type() -> String {
    DEFAULT_ALLOWED_MEDIA_TYPE.to_string()
}

/// Result polling schedule
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PollingConfig {
    #[serde(default = "default_poll_interval")]
    pub interval_ms: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_poll_interval(),
            max_attempts: default_max_attempts(),
        }
    }
}

fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_POLL_ATTEMPTS
}

/// Development backend listener
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Externally reachable URL used in result links.
    /// Derived from host and port when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_url: Option<String>,
}

impl ServerConfig {
    /// Base URL for links handed out to clients, without trailing slash.
    pub fn public_base_url(&self) -> String {
        match &self.public_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => {
                let host = if self.host.is_unspecified() {
                    IpAddr::V4(Ipv4Addr::LOCALHOST)
                } else {
                    self.host
                };
                format!("http://{}", SocketAddr::new(host, self.port))
            }
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_url: None,
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8080
}

/// Local blob storage used by the development backend.
/// Each bucket is a directory below `root`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_root")]
    pub root: PathBuf,
    /// Uploaded problem documents
    #[serde(default = "default_json_bucket")]
    pub json_bucket: String,
    /// Optimizer output documents
    #[serde(default = "default_optimized_bucket")]
    pub optimized_bucket: String,
    /// Plotter output images
    #[serde(default = "default_plotted_bucket")]
    pub plotted_bucket: String,
    /// Lifetime of signed result links
    #[serde(default = "default_signed_url_ttl")]
    pub signed_url_ttl_minutes: u32,
    /// Key used to sign result links
    #[serde(default = "default_signing_key")]
    pub signing_key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_storage_root(),
            json_bucket: default_json_bucket(),
            optimized_bucket: default_optimized_bucket(),
            plotted_bucket: default_plotted_bucket(),
            signed_url_ttl_minutes: default_signed_url_ttl(),
            signing_key: default_signing_key(),
        }
    }
}

fn default_storage_root() -> PathBuf {
    PathBuf::from("data")
}

fn default_json_bucket() -> String {
    "booking-opt-json".to_string()
}

fn default_optimized_bucket() -> String {
    "booking-opt-optimized".to_string()
}

fn default_plotted_bucket() -> String {
    "booking-opt-plotted".to_string()
}

fn default_signed_url_ttl() -> u32 {
    60
}

fn default_signing_key() -> String {
    "bookopt-dev-signing-key".to_string()
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub limits: LimitsConfig,
    pub polling: PollingConfig,
    pub server: ServerConfig,
    pub storage: SanitizedStorageConfig,
}

/// Sanitized storage config (signing key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedStorageConfig {
    pub json_bucket: String,
    pub optimized_bucket: String,
    pub plotted_bucket: String,
    pub signed_url_ttl_minutes: u32,
    pub signing_key_configured: bool,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            limits: config.limits.clone(),
            polling: config.polling.clone(),
            server: config.server.clone(),
            storage: SanitizedStorageConfig {
                json_bucket: config.storage.json_bucket.clone(),
                optimized_bucket: config.storage.optimized_bucket.clone(),
                plotted_bucket: config.storage.plotted_bucket.clone(),
                signed_url_ttl_minutes: config.storage.signed_url_ttl_minutes,
                signing_key_configured: config.storage.signing_key != default_signing_key(),
            },
        }
    }
}
