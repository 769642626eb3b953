//! # News eBook
//!
//! Builds an EPUB digest of the current weather for a place plus the top news
//! headlines, and emails it to one or more recipients.
//!
//! ## Usage
//!
//! ```sh
//! news_ebook -c "Chicago" -e reader@example.com --delete
//! ```
//!
//! ## Architecture
//!
//! 1. **Gathering**: geocode the place, fetch its forecast and the headline list
//! 2. **Resolution**: extract each article body, falling back to boilerplate
//!    removal when the first pass comes back short
//! 3. **Assembly**: bind the weather chapter and accepted articles into a
//!    package with a two-level table of contents and a spine
//! 4. **Output**: write the EPUB, email it, optionally delete it afterwards

use chrono::Local;
use clap::Parser;
use std::process::ExitCode;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod article;
mod assembler;
mod cli;
mod config;
mod delivery;
mod error;
mod extract;
mod models;
mod outputs;
mod pipeline;
mod resolver;
mod sources;
mod utils;
mod weather;

use cli::Cli;
use config::Settings;

#[tokio::main]
async fn main() -> ExitCode {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("news_ebook starting up");

    let args = Cli::parse();
    debug!(city = %args.city, recipients = args.email.len(), delete = args.delete, "Parsed CLI arguments");

    let code = run(&args).await;
    info!(elapsed_s = start_time.elapsed().as_secs_f64(), "news_ebook finished");
    code
}

#[instrument(level = "info", skip_all, fields(city = %args.city))]
async fn run(args: &Cli) -> ExitCode {
    let mut settings = match Settings::load(&args.config).await {
        Ok(settings) => settings,
        Err(e) => return fatal(&e),
    };
    settings.apply_cli(args);

    let client = match reqwest::Client::builder()
        .user_agent(concat!("news_ebook/", env!("CARGO_PKG_VERSION")))
        .build()
    {
        Ok(client) => client,
        Err(e) => return fatal(&e),
    };

    let digest = match pipeline::build_digest(&client, &settings, &args.city, Local::now()).await {
        Ok(digest) => digest,
        Err(e) => return fatal(&e),
    };
    println!("Saved as {}.", digest.path.display());

    match pipeline::deliver(&client, &settings, &digest, &args.email, args.delete).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, path = %digest.path.display(), "Delivery failed; the ebook was kept");
            eprintln!("Delivery failed: {e}");
            eprintln!("The ebook was kept at {}.", digest.path.display());
            ExitCode::FAILURE
        }
    }
}

fn fatal(e: &dyn std::error::Error) -> ExitCode {
    error!(error = %e, "Run aborted");
    eprintln!("Error: {e}");
    ExitCode::FAILURE
}
