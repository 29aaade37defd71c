//! Configuration for the job digest pipeline.
//!
//! Settings come from a JSON file shaped like:
//!
//! ```json
//! {
//!   "email": "me@example.com",
//!   "smtp_settings": {
//!     "server": "smtp.gmail.com",
//!     "port": 587,
//!     "sender_email": "bot@example.com",
//!     "password_env_var": "EMAIL_PASSWORD",
//!     "receiver_email": "me@example.com"
//!   },
//!   "search_parameters": { "locations": "all", "years": -1, "job_group_id": 518 }
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default listings endpoint.
pub const DEFAULT_API_BASE_URL: &str = "https://www.wanted.co.kr/api/v4/jobs";

/// Default public URL of a single listing; `{id}` is replaced with the listing id.
pub const DEFAULT_JOB_URL_TEMPLATE: &str = "https://www.wanted.co.kr/wd/{id}";

/// Default country filter sent with every query.
pub const DEFAULT_COUNTRY: &str = "kr";

/// Default sort order sent with every query.
pub const DEFAULT_SORT: &str = "job.latest_order";

/// Default page size sent with every query.
pub const DEFAULT_LIMIT: u32 = 20;

/// Default digest subject.
pub const DEFAULT_SUBJECT: &str = "New Wanted job listings";

/// Sentinel meaning "no constraint" for a search parameter.
pub const ALL_SENTINEL: &str = "all";

/// A search parameter value as written in the settings file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SearchValue {
    Number(i64),
    Text(String),
    List(Vec<SearchValue>),
}

impl SearchValue {
    /// Query values this parameter contributes.
    ///
    /// Empty strings, `"all"`, zero and empty lists contribute nothing, so the
    /// parameter is left out of the query entirely.
    pub fn query_values(&self) -> Vec<String> {
        match self {
            Self::Number(0) => Vec::new(),
            Self::Number(n) => vec![n.to_string()],
            Self::Text(s) if s.is_empty() || s == ALL_SENTINEL => Vec::new(),
            Self::Text(s) => vec![s.clone()],
            Self::List(items) => items.iter().flat_map(Self::query_values).collect(),
        }
    }
}

/// Listing filters forwarded to the API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParameters {
    #[serde(default)]
    pub locations: Option<SearchValue>,
    #[serde(default)]
    pub years: Option<SearchValue>,
    #[serde(default)]
    pub job_group_id: Option<SearchValue>,
}

/// Listings API endpoint and its fixed query parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    pub base_url: String,
    pub job_url_template: String,
    pub country: String,
    pub sort: String,
    pub limit: u32,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            job_url_template: DEFAULT_JOB_URL_TEMPLATE.to_string(),
            country: DEFAULT_COUNTRY.to_string(),
            sort: DEFAULT_SORT.to_string(),
            limit: DEFAULT_LIMIT,
        }
    }
}

/// SMTP connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpSettings {
    /// SMTP server hostname.
    pub host: String,
    /// SMTP server port (STARTTLS).
    pub port: u16,
    /// Sender email address.
    pub sender: String,
    /// Login name; the sender address unless overridden.
    pub username: String,
    /// Name of the environment variable holding the SMTP password.
    pub password_env_var: String,
}

/// Resolved configuration for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestConfig {
    /// The single digest recipient.
    pub recipient: String,
    pub smtp: SmtpSettings,
    pub search: SearchParameters,
    pub api: ApiSettings,
    pub subject: String,
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    email: Option<String>,
    smtp_settings: RawSmtpSettings,
    #[serde(default)]
    search_parameters: SearchParameters,
    #[serde(default)]
    api: ApiSettings,
    #[serde(default)]
    subject: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawSmtpSettings {
    server: String,
    port: u16,
    sender_email: String,
    password_env_var: String,
    #[serde(default)]
    receiver_email: Option<String>,
    #[serde(default)]
    username: Option<String>,
}

impl DigestConfig {
    /// Load configuration from a JSON settings file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Parse configuration from JSON text.
    ///
    /// The recipient is `smtp_settings.receiver_email` when present, falling
    /// back to the top-level `email`.
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_json::from_str(content)?;
        let smtp = raw.smtp_settings;

        let recipient = non_empty(smtp.receiver_email)
            .or_else(|| non_empty(raw.email))
            .ok_or_else(|| ConfigError::Invalid {
                field: "smtp_settings.receiver_email",
                reason: "no recipient configured (set receiver_email or email)".to_string(),
            })?;

        if smtp.server.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "smtp_settings.server",
                reason: "must not be empty".to_string(),
            });
        }
        if smtp.port == 0 {
            return Err(ConfigError::Invalid {
                field: "smtp_settings.port",
                reason: "must be non-zero".to_string(),
            });
        }
        if smtp.password_env_var.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "smtp_settings.password_env_var",
                reason: "must name an environment variable".to_string(),
            });
        }

        let username = non_empty(smtp.username).unwrap_or_else(|| smtp.sender_email.clone());

        Ok(Self {
            recipient,
            smtp: SmtpSettings {
                host: smtp.server,
                port: smtp.port,
                sender: smtp.sender_email,
                username,
                password_env_var: smtp.password_env_var,
            },
            search: raw.search_parameters,
            api: raw.api,
            subject: non_empty(raw.subject).unwrap_or_else(|| DEFAULT_SUBJECT.to_string()),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
