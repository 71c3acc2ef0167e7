use crate::domain::model::ReplenishmentRequest;
use crate::utils::error::{ReplenishError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_peer_locations, validate_positive_number,
    validate_range, validate_required_field, validate_url, Validate,
};
use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplenishConfig {
    pub run: RunConfig,
    pub erp: ServiceConfig,
    pub marketplace: ServiceConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub material: String,
    pub home_location: String,
    #[serde(default)]
    pub peer_locations: Vec<String>,
    #[serde(default = "default_horizon_weeks")]
    pub horizon_weeks: u32,
    #[serde(default = "default_transport_days")]
    pub transport_days: u32,
    #[serde(default = "default_currency")]
    pub currency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub base_url: String,
    /// Ready-to-use bearer token; takes precedence over `auth`.
    pub token: Option<String>,
    pub auth: Option<ClientCredentials>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientCredentials {
    pub token_url: String,
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_true")]
    pub concurrent_peer_queries: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
            concurrent_peer_queries: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_path")]
    pub path: String,
    #[serde(default = "default_summary_file")]
    pub summary_file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            summary_file: default_summary_file(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
}

fn default_horizon_weeks() -> u32 {
    4
}

fn default_transport_days() -> u32 {
    2
}

fn default_currency() -> String {
    "EUR".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

fn default_output_path() -> String {
    "./output".to_string()
}

fn default_summary_file() -> String {
    "replenishment_summary.json".to_string()
}

impl ReplenishConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ReplenishError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| ReplenishError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${S4_TOKEN})；未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> String {
        static PLACEHOLDER: OnceLock<Option<Regex>> = OnceLock::new();
        let Some(re) = PLACEHOLDER
            .get_or_init(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").ok())
            .as_ref()
        else {
            return content.to_string();
        };

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
    }

    pub fn request(&self, today: NaiveDate) -> ReplenishmentRequest {
        ReplenishmentRequest {
            material: self.run.material.clone(),
            home_location: self.run.home_location.clone(),
            peer_locations: self.run.peer_locations.clone(),
            horizon_weeks: self.run.horizon_weeks,
            transport_days: self.run.transport_days,
            currency: self.run.currency.clone(),
            today,
        }
    }

    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.http.timeout_seconds)
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_non_empty_string("run.material", &self.run.material)?;
        validate_non_empty_string("run.home_location", &self.run.home_location)?;
        validate_peer_locations(
            "run.peer_locations",
            &self.run.home_location,
            &self.run.peer_locations,
        )?;
        validate_positive_number("run.horizon_weeks", self.run.horizon_weeks as usize, 1)?;
        validate_range("run.transport_days", self.run.transport_days, 0, 365)?;
        validate_non_empty_string("run.currency", &self.run.currency)?;

        self.erp.validate_service("erp")?;
        self.marketplace.validate_service("marketplace")?;

        validate_range("http.timeout_seconds", self.http.timeout_seconds, 1, 600)?;
        validate_path("output.path", &self.output.path)?;
        validate_path("output.summary_file", &self.output.summary_file)?;

        Ok(())
    }
}

impl ServiceConfig {
    fn validate_service(&self, section: &str) -> Result<()> {
        validate_url(&format!("{}.base_url", section), &self.base_url)?;

        if let Some(token) = &self.token {
            return check_resolved(&format!("{}.token", section), token);
        }

        let auth = validate_required_field(&format!("{}.auth", section), &self.auth)?;
        validate_url(&format!("{}.auth.token_url", section), &auth.token_url)?;
        check_resolved(&format!("{}.auth.client_id", section), &auth.client_id)?;
        check_resolved(&format!("{}.auth.client_secret", section), &auth.client_secret)
    }
}

/// Credentials still holding a `${VAR}` placeholder came from an unset variable.
fn check_resolved(field: &str, value: &str) -> Result<()> {
    validate_non_empty_string(field, value)?;
    if value.contains("${") {
        return Err(ReplenishError::MissingConfigError {
            field: format!("{} (environment variable not set: {})", field, value),
        });
    }
    Ok(())
}

impl Validate for ReplenishConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
