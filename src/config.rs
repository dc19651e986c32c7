use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::{DeclutterError, Result};
use crate::export::DEFAULT_EXPORT_FILE;

/// Application configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Backend connection
    pub gateway: GatewayConfig,
    /// Log output
    pub logging: LoggingConfig,
    /// Health-check pacing
    pub health_check: HealthCheckConfig,
    /// Export file placement
    pub export: ExportConfig,
}

/// Backend connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Project endpoint, e.g. `https://xyz.supabase.co`
    pub url: String,
    /// Public (anon) API key
    pub anon_key: String,
    /// Origin the sign-up confirmation link sends users back to
    pub redirect_base_url: String,
    /// Per-request timeout
    pub request_timeout_secs: u64,
}

/// Log output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter level
    pub level: String,
    /// Directory for rolling JSON log files
    pub file_path: Option<String>,
    /// Console format, "json" or "text"
    pub format: String,
}

/// Pacing of the staged health-check progress display
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Number of progress stages
    pub stages: u8,
    /// Delay per stage
    pub stage_delay_ms: u64,
}

/// Export settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory export files are written to
    pub output_directory: String,
    /// Export file name
    pub file_name: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            anon_key: String::new(),
            redirect_base_url: "http://localhost:5173".to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_path: None,
            format: "text".to_string(),
        }
    }
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            stages: 5,
            stage_delay_ms: 700,
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_directory: ".".to_string(),
            file_name: DEFAULT_EXPORT_FILE.to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from multiple sources with precedence
    ///
    /// Missing gateway url or key is fatal.
    pub fn load() -> Result<Self> {
        let mut app_config = Self::load_unvalidated()?;
        app_config.apply_well_known_env();
        app_config.validate()?;
        Ok(app_config)
    }

    /// Load every source without validating, for offline runs that need no gateway
    pub fn load_unvalidated() -> Result<Self> {
        let config = Config::builder()
            // Start with default values
            .add_source(Config::try_from(&Self::default())?)
            // Add config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(File::with_name("declutter").required(false))
            // Add environment variables with prefix, e.g. DECLUTTER__GATEWAY__URL
            .add_source(Environment::with_prefix("DECLUTTER").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// `SUPABASE_URL` / `SUPABASE_ANON_KEY` override whatever the sources said
    fn apply_well_known_env(&mut self) {
        if let Ok(url) = std::env::var("SUPABASE_URL") {
            self.gateway.url = url;
        }
        if let Ok(key) = std::env::var("SUPABASE_ANON_KEY") {
            self.gateway.anon_key = key;
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        // Validate gateway config
        if self.gateway.url.trim().is_empty() || self.gateway.anon_key.trim().is_empty() {
            return Err(DeclutterError::InvalidConfig(
                "Missing gateway connection: set SUPABASE_URL and SUPABASE_ANON_KEY".to_string(),
            ));
        }
        if !self.gateway.url.starts_with("http://") && !self.gateway.url.starts_with("https://") {
            return Err(DeclutterError::InvalidConfig(format!(
                "Gateway url must be http(s): {}",
                self.gateway.url
            )));
        }
        if self.gateway.request_timeout_secs == 0 {
            return Err(DeclutterError::InvalidConfig(
                "request_timeout_secs must be greater than 0".to_string(),
            ));
        }

        self.validate_local()
    }

    /// Validate everything except the gateway connection
    pub fn validate_local(&self) -> Result<()> {
        // Validate logging config
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(DeclutterError::InvalidConfig(format!(
                "Invalid log level: {}. Must be one of: {:?}",
                self.logging.level, valid_levels
            )));
        }

        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(DeclutterError::InvalidConfig(format!(
                "Invalid log format: {}. Must be one of: {:?}",
                self.logging.format, valid_formats
            )));
        }

        // Validate health-check pacing
        if self.health_check.stages == 0 {
            return Err(DeclutterError::InvalidConfig(
                "health_check.stages must be greater than 0".to_string(),
            ));
        }

        if self.export.file_name.trim().is_empty() {
            return Err(DeclutterError::InvalidConfig(
                "export.file_name cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Where sign-up confirmation links point
    #[must_use]
    pub fn sign_up_redirect(&self) -> String {
        format!("{}/signin", self.gateway.redirect_base_url.trim_end_matches('/'))
    }

    /// Get log level from environment or config
    #[must_use]
    pub fn get_log_level(&self) -> String {
        std::env::var("RUST_LOG").unwrap_or_else(|_| self.logging.level.clone())
    }
}
