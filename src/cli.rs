//! Command-line interface definitions for the news ebook builder.
//!
//! The place name and at least one recipient are required; clap prints the
//! usage text and exits non-zero when either is missing. API keys can be
//! given as flags or environment variables and override the settings file.

use clap::Parser;
use std::path::PathBuf;

/// Create an EPUB eBook with the latest weather and news headlines and email it.
///
/// # Examples
///
/// ```sh
/// news_ebook -c "Chicago" -e reader@example.com
///
/// # Several recipients, remove the .epub once it has been sent
/// news_ebook -c "Chicago" -e a@example.com b@example.com --delete
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about, arg_required_else_help = true)]
pub struct Cli {
    /// City whose weather to download
    #[arg(short, long)]
    pub city: String,

    /// Emails to send the resulting ebook to
    #[arg(short, long, num_args = 1.., required = true)]
    pub email: Vec<String>,

    /// Delete the saved ebook from the filesystem after it was delivered
    #[arg(short, long, default_value_t = false)]
    pub delete: bool,

    /// Path to the YAML settings file
    #[arg(long, default_value = crate::config::DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// NewsAPI key
    #[arg(long, env = "NEWS_API_KEY", hide_env_values = true)]
    pub news_api_key: Option<String>,

    /// Dark Sky API key
    #[arg(long, env = "WEATHER_API_KEY", hide_env_values = true)]
    pub weather_api_key: Option<String>,

    /// Mailgun API key
    #[arg(long, env = "MAILGUN_API_KEY", hide_env_values = true)]
    pub mailgun_api_key: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from([
            "news_ebook",
            "--city",
            "Chicago",
            "--email",
            "a@example.com",
            "b@example.com",
        ]);

        assert_eq!(cli.city, "Chicago");
        assert_eq!(cli.email, vec!["a@example.com", "b@example.com"]);
        assert!(!cli.delete);
        assert_eq!(cli.config, PathBuf::from("news_ebook.yaml"));
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from([
            "news_ebook",
            "-c",
            "Oslo",
            "-e",
            "reader@example.com",
            "-d",
        ]);

        assert_eq!(cli.city, "Oslo");
        assert_eq!(cli.email, vec!["reader@example.com"]);
        assert!(cli.delete);
    }

    #[test]
    fn test_cli_requires_city_and_email() {
        assert!(Cli::try_parse_from(["news_ebook", "-e", "a@example.com"]).is_err());
        assert!(Cli::try_parse_from(["news_ebook", "-c", "Oslo"]).is_err());
        assert!(Cli::try_parse_from(["news_ebook"]).is_err());
    }
}
