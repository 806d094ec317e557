use config::{ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable holding the downstream store endpoint.
pub const STORE_URL_ENV: &str = "SUPABASE_URL";
/// Environment variable holding the downstream store credential.
pub const STORE_KEY_ENV: &str = "SUPABASE_SERVICE_ROLE_KEY";
/// Longest recency window accepted, in days.
pub const MAX_WINDOW_DAYS: i64 = 3650;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub store: StoreConfig,
    pub source: SourceConfig,
    pub ingest: IngestConfig,
    pub http: HttpConfig,
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    pub url: String,
    pub service_key: String,
    pub table: String,
    pub key_page_size: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceConfig {
    pub base_url: String,
    /// Prefix for the details URL of notices that carry no canonical URL.
    pub notice_base_url: String,
    pub page_size: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IngestConfig {
    pub categories: Vec<String>,
    pub window_days: i64,
    pub error_policy: ErrorPolicy,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpConfig {
    pub request_timeout_secs: Option<u64>,
    pub user_agent: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub log_format: LogFormat,
    pub metrics_enabled: bool,
    pub metrics_port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

/// What to do when the store cannot be read or an upstream page does not decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Log and keep going with whatever was gathered so far.
    Continue,
    /// Fail the run.
    Abort,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();

        // Load default configuration
        builder = builder.add_source(config::Config::try_from(&Config::default())?);

        // Layer on config file if it exists
        if Path::new("config.toml").exists() {
            builder = builder.add_source(File::with_name("config"));
        }

        // Layer on environment variables (TENDERS_ prefix)
        builder = builder.add_source(
            Environment::with_prefix("TENDERS")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("ingest.categories")
                .try_parsing(true),
        );

        let config = builder.build()?;
        let mut settings: Config = config.try_deserialize()?;

        settings.apply_store_credentials(
            std::env::var(STORE_URL_ENV).ok(),
            std::env::var(STORE_KEY_ENV).ok(),
        );

        settings.validate()?;
        Ok(settings)
    }

    /// Store location and credential come from the execution environment and
    /// win over anything set in files.
    pub fn apply_store_credentials(&mut self, url: Option<String>, key: Option<String>) {
        if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
            self.store.url = url.trim_end_matches('/').to_string();
        }
        if let Some(key) = key.filter(|k| !k.trim().is_empty()) {
            self.store.service_key = key;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.url.is_empty() {
            return Err(ConfigError::Message(format!(
                "store.url is required (set {})",
                STORE_URL_ENV
            )));
        }

        if self.store.service_key.is_empty() {
            return Err(ConfigError::Message(format!(
                "store.service_key is required (set {})",
                STORE_KEY_ENV
            )));
        }

        if self.store.key_page_size == 0 {
            return Err(ConfigError::Message(
                "store.key_page_size must be greater than 0".into(),
            ));
        }

        if self.source.page_size == 0 {
            return Err(ConfigError::Message(
                "source.page_size must be greater than 0".into(),
            ));
        }

        if self.ingest.window_days <= 0 {
            return Err(ConfigError::Message(
                "ingest.window_days must be greater than 0".into(),
            ));
        }

        if self.ingest.window_days > MAX_WINDOW_DAYS {
            return Err(ConfigError::Message(format!(
                "ingest.window_days must be at most {}",
                MAX_WINDOW_DAYS
            )));
        }

        if self.ingest.categories.iter().all(|c| c.trim().is_empty()) {
            return Err(ConfigError::Message(
                "ingest.categories must name at least one notice type".into(),
            ));
        }

        Ok(())
    }

    /// Copy safe to print: the store credential is masked.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if !copy.store.service_key.is_empty() {
            copy.store.service_key = "***".to_string();
        }
        copy
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store: StoreConfig {
                url: String::new(), // Filled from SUPABASE_URL in load()
                service_key: String::new(),
                table: "tenders".to_string(),
                key_page_size: 1000,
            },
            source: SourceConfig {
                base_url: "https://www.contractsfinder.service.gov.uk/api/rest/2/search_notices/json"
                    .to_string(),
                notice_base_url: "https://www.contractsfinder.service.gov.uk/notice".to_string(),
                page_size: 100,
            },
            ingest: IngestConfig {
                categories: vec!["Opportunity".to_string(), "Awarded".to_string()],
                window_days: 7,
                error_policy: ErrorPolicy::Continue,
            },
            http: HttpConfig {
                request_timeout_secs: None,
                user_agent: concat!("tender-ingester/", env!("CARGO_PKG_VERSION")).to_string(),
            },
            telemetry: TelemetryConfig {
                log_level: "info".to_string(),
                log_format: LogFormat::Pretty,
                metrics_enabled: false,
                metrics_port: 9090,
            },
        }
    }
}
