//! Settings loading.
//!
//! Settings come from a YAML file (default `news_ebook.yaml` in the working
//! directory). A missing file means "all defaults"; a malformed one aborts
//! the run. API keys can be overridden from the environment through the CLI.

use crate::cli::Cli;
use crate::error::{DigestError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

pub const DEFAULT_CONFIG_FILE: &str = "news_ebook.yaml";

/// Base URLs of the external services.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Endpoints {
    pub geocode: String,
    pub weather: String,
    pub news: String,
    pub mailgun: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            geocode: "https://nominatim.openstreetmap.org/search".to_string(),
            weather: "https://api.darksky.net/forecast".to_string(),
            news: "https://newsapi.org/v2/top-headlines".to_string(),
            mailgun: "https://api.mailgun.net/v3".to_string(),
        }
    }
}

/// Process-wide settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub news_api_key: String,
    pub weather_api_key: String,
    pub mailgun_api_key: String,
    /// Domain the Mailgun account is registered under.
    pub mailgun_domain: String,
    /// Sender, preferably `Name <address@example.com>`.
    pub mailgun_from: String,
    /// Identifies this client to the Nominatim server.
    pub nominatim_user_agent: String,
    /// Country code passed to the news-list service.
    pub country: String,
    /// Case-insensitive title substrings that drop an article outright.
    pub title_exclusions: Vec<String>,
    /// Minimum paragraph count for an article body to be accepted.
    pub min_paragraphs: usize,
    pub output_dir: PathBuf,
    /// Optional stylesheet replacing the built-in one.
    pub stylesheet: Option<PathBuf>,
    pub endpoints: Endpoints,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            news_api_key: String::new(),
            weather_api_key: String::new(),
            mailgun_api_key: String::new(),
            mailgun_domain: String::new(),
            mailgun_from: String::new(),
            nominatim_user_agent: concat!("news_ebook/", env!("CARGO_PKG_VERSION")).to_string(),
            country: "us".to_string(),
            title_exclusions: vec!["video:".to_string(), "watch:".to_string()],
            min_paragraphs: 5,
            output_dir: PathBuf::from("."),
            stylesheet: None,
            endpoints: Endpoints::default(),
        }
    }
}

impl Settings {
    /// Parse settings from YAML text.
    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).map_err(|e| DigestError::config(e.to_string()))
    }

    /// Load settings from `path`, falling back to defaults when the file is absent.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub async fn load(path: &Path) -> Result<Self> {
        match tokio::fs::read_to_string(path).await {
            Ok(text) => {
                let settings = Self::from_yaml(&text)?;
                info!("Loaded settings");
                Ok(settings)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Settings file not found; using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(DigestError::io(path, e)),
        }
    }

    /// Apply key overrides supplied on the command line or via the environment.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(key) = &cli.news_api_key {
            self.news_api_key = key.clone();
        }
        if let Some(key) = &cli.weather_api_key {
            self.weather_api_key = key.clone();
        }
        if let Some(key) = &cli.mailgun_api_key {
            self.mailgun_api_key = key.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.min_paragraphs, 5);
        assert_eq!(settings.country, "us");
        assert_eq!(settings.title_exclusions, vec!["video:", "watch:"]);
        assert!(settings.nominatim_user_agent.starts_with("news_ebook/"));
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
news_api_key: abc
min_paragraphs: 3
endpoints:
  news: http://localhost:9000/news
"#;
        let settings = Settings::from_yaml(yaml).unwrap();
        assert_eq!(settings.news_api_key, "abc");
        assert_eq!(settings.min_paragraphs, 3);
        assert_eq!(settings.endpoints.news, "http://localhost:9000/news");
        assert_eq!(settings.endpoints.geocode, Endpoints::default().geocode);
        assert_eq!(settings.title_exclusions.len(), 2);
    }

    #[test]
    fn test_malformed_yaml_is_config_error() {
        let err = Settings::from_yaml("min_paragraphs: [nope").unwrap_err();
        assert!(matches!(err, DigestError::Config { .. }));
    }

    #[tokio::test]
    async fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(&dir.path().join("absent.yaml")).await.unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_cli_overrides_keys() {
        let cli = Cli::parse_from([
            "news_ebook",
            "-c",
            "Chicago",
            "-e",
            "a@example.com",
            "--news-api-key",
            "from-cli",
        ]);
        let mut settings = Settings::default();
        settings.apply_cli(&cli);
        assert_eq!(settings.news_api_key, "from-cli");
    }
}
