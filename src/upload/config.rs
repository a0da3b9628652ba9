use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:8080/files";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(60_000);
pub const DEFAULT_USER_ID: &str = "user123";
pub const DEFAULT_ACCEPTED: [&str; 6] = ["pdf", "doc", "docx", "txt", "jpg", "png"];

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} must be a positive integer, got `{value}`")]
    InvalidNumber { key: &'static str, value: String },
}

/// Settings for a `FileManager` and the transport it talks through.
#[derive(Debug, Clone, PartialEq)]
pub struct ManagerConfig {
    pub endpoint: String,
    pub timeout: Duration,
    pub user_id: String,
    pub accepted_extensions: Vec<String>,
    /// `None` lets every selected file upload at once.
    pub max_concurrent_uploads: Option<usize>,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_id: DEFAULT_USER_ID.to_string(),
            accepted_extensions: DEFAULT_ACCEPTED.iter().map(|e| e.to_string()).collect(),
            max_concurrent_uploads: None,
        }
    }
}

impl ManagerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from `FILE_MANAGER_*` keys, falling back to defaults
    /// for anything missing or blank.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(endpoint) = get("FILE_MANAGER_ENDPOINT") {
            config.endpoint = endpoint;
        }
        if let Some(user_id) = get("FILE_MANAGER_USER_ID") {
            config.user_id = user_id;
        }
        if let Some(raw) = get("FILE_MANAGER_TIMEOUT_MS") {
            let millis = parse_positive("FILE_MANAGER_TIMEOUT_MS", &raw)?;
            config.timeout = Duration::from_millis(millis as u64);
        }
        if let Some(raw) = get("FILE_MANAGER_MAX_UPLOADS") {
            config.max_concurrent_uploads = Some(parse_positive("FILE_MANAGER_MAX_UPLOADS", &raw)?);
        }
        if let Some(raw) = get("FILE_MANAGER_ACCEPT") {
            config.accepted_extensions = raw
                .split(',')
                .map(|ext| ext.trim().trim_start_matches('.').to_lowercase())
                .filter(|ext| !ext.is_empty())
                .collect();
        }

        Ok(config)
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = user_id.into();
        self
    }

    pub fn with_max_concurrent_uploads(mut self, limit: usize) -> Self {
        self.max_concurrent_uploads = Some(limit);
        self
    }
}

fn parse_positive(key: &'static str, raw: &str) -> Result<usize, ConfigError> {
    match raw.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidNumber {
            key,
            value: raw.to_string(),
        }),
    }
}
