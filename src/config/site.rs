//! Site configuration (_config.yml)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Environment variable overriding `api_endpoint`
pub const ENV_API_ENDPOINT: &str = "PRISMIC_API_ENDPOINT";

/// Environment variable overriding `access_token`
pub const ENV_ACCESS_TOKEN: &str = "PRISMIC_ACCESS_TOKEN";

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub description: String,
    pub language: String,
    pub timezone: String,
    pub url: String,

    // Content repository
    pub api_endpoint: String,
    pub access_token: Option<String>,
    pub document_type: String,

    // Listing
    pub page_size: usize,
    pub words_per_minute: usize,

    // Regeneration interval for cached pages, in seconds
    pub revalidate_secs: u64,

    // Directory
    pub public_dir: String,
    pub static_dir: String,
    pub i18n_dir: String,

    // Preview
    pub preview_cookie: String,

    #[serde(default)]
    pub utterances: UtterancesConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "spacetraveling".to_string(),
            description: String::new(),
            language: "en".to_string(),
            timezone: "UTC".to_string(),
            url: "http://localhost:3000".to_string(),

            api_endpoint: "https://spacetraveling.cdn.prismic.io/api/v2".to_string(),
            access_token: None,
            document_type: "posts".to_string(),

            page_size: 5,
            words_per_minute: 200,

            revalidate_secs: 60 * 30,

            public_dir: "public".to_string(),
            static_dir: "static".to_string(),
            i18n_dir: "languages".to_string(),

            preview_cookie: "spacetraveling.preview".to_string(),

            utterances: UtterancesConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SiteConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Apply `PRISMIC_*` environment overrides
    pub fn apply_env(&mut self) {
        self.apply_overrides(
            std::env::var(ENV_API_ENDPOINT).ok(),
            std::env::var(ENV_ACCESS_TOKEN).ok(),
        );
    }

    fn apply_overrides(&mut self, endpoint: Option<String>, token: Option<String>) {
        if let Some(endpoint) = endpoint.filter(|e| !e.trim().is_empty()) {
            tracing::debug!(endpoint = %endpoint, "api endpoint taken from environment");
            self.api_endpoint = endpoint.trim().to_string();
        }
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            self.access_token = Some(token.trim().to_string());
        }
    }

    /// Regeneration interval as a `Duration`
    pub fn revalidate(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.revalidate_secs)
    }

    /// Display time zone, falling back to UTC for unknown names
    pub fn tz(&self) -> chrono_tz::Tz {
        self.timezone.parse().unwrap_or_else(|_| {
            tracing::warn!(timezone = %self.timezone, "unknown timezone, using UTC");
            chrono_tz::UTC
        })
    }
}

/// Utterances comment widget configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UtterancesConfig {
    /// `owner/repo` holding the comment issues; comments are disabled when empty
    pub repo: String,
    pub issue_term: String,
    pub theme: String,
}

impl Default for UtterancesConfig {
    fn default() -> Self {
        Self {
            repo: String::new(),
            issue_term: "pathname".to_string(),
            theme: "github-dark".to_string(),
        }
    }
}

impl UtterancesConfig {
    pub fn enabled(&self) -> bool {
        !self.repo.trim().is_empty()
    }
}
