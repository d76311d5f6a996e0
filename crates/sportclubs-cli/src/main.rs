//! sportclubs - command-line access to InnoHassle sport clubs.
//!
//! Signs in against the accounts service, lists clubs and FAQ entries, and
//! shows the upcoming trainings of every club.

use std::io;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use serde_json::json;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sportclubs_core::models::{Club, FaqEntries};
use sportclubs_core::utils::{format_session_range, truncate_string};
use sportclubs_core::{ApiClient, ApiError, Config, TokenProvider};

// ============================================================================
// Constants
// ============================================================================

/// Log file name inside the cache directory
const LOG_FILE: &str = "sportclubs.log";

/// Maximum width of descriptions in list output
const DESCRIPTION_WIDTH: usize = 72;

const USAGE: &str = "\
Usage: sportclubs <command>

Commands:
  login                          Obtain and store an access token
  logout                         Forget the stored access token
  clubs                          List clubs and their groups
  faq                            Show frequently asked questions
  upcoming [--json] [--limit N]  Show upcoming trainings per club
  overview                       Fetch clubs and FAQ together";

/// Initialize the tracing subscriber for logging.
/// The returned guard must live until exit when logging to a file.
fn init_tracing(config: &Config) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    if config.log_to_file {
        if let Ok(dir) = config.cache_dir() {
            let _ = std::fs::create_dir_all(&dir);
            let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, LOG_FILE));
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(writer).with_ansi(false))
                .with(filter)
                .init();
            return Some(guard);
        }
    }

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
    None
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let mut config = Config::load().context("Failed to load config")?;
    let _guard = init_tracing(&config);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        println!("{}", USAGE);
        return Ok(());
    };
    info!(command = %command, "sportclubs starting");

    let result = match command.as_str() {
        "login" => login(&mut config).await,
        "logout" => logout(&config).await,
        "clubs" => clubs(&config).await,
        "faq" => faq(&config).await,
        "upcoming" => upcoming(&config, &args[1..]).await,
        "overview" => overview(&config).await,
        "-h" | "--help" | "help" => {
            println!("{}", USAGE);
            Ok(())
        }
        other => bail!("Unknown command: {}\n\n{}", other, USAGE),
    };

    if let Err(ref e) = result {
        if e.downcast_ref::<ApiError>().is_some_and(ApiError::is_auth) {
            eprintln!("Your session may have expired. Run `sportclubs login` to sign in again.");
        }
    }
    result
}

/// Build an API client, refusing to run until a token has been stored
async fn signed_in_client(config: &Config) -> Result<ApiClient> {
    let tokens = TokenProvider::from_config(config)?;
    if !tokens.has_session().await {
        bail!("Sign in required. Run `sportclubs login` first.");
    }
    ApiClient::from_config(config, tokens)
}

async fn login(config: &mut Config) -> Result<()> {
    if config.session_cookie.is_none() {
        let cookie = rpassword::prompt_password("Session cookie (name=value): ")?;
        let cookie = cookie.trim();
        if cookie.is_empty() {
            bail!("A session cookie is required to obtain a token");
        }
        config
            .remember_session_cookie(cookie)
            .context("Failed to save session cookie")?;
    }

    let tokens = TokenProvider::from_config(config)?;
    tokens.acquire_token().await?;
    println!("Signed in. Access token stored.");
    Ok(())
}

async fn logout(config: &Config) -> Result<()> {
    TokenProvider::from_config(config)?.sign_out().await?;
    println!("Signed out.");
    Ok(())
}

async fn clubs(config: &Config) -> Result<()> {
    let client = signed_in_client(config).await?;
    print_clubs(&client.get_clubs().await?);
    Ok(())
}

async fn faq(config: &Config) -> Result<()> {
    let client = signed_in_client(config).await?;
    print_faq(&client.get_faq().await?);
    Ok(())
}

async fn upcoming(config: &Config, args: &[String]) -> Result<()> {
    let mut as_json = false;
    let mut limit = config.upcoming_limit;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--json" => as_json = true,
            "--limit" => {
                let value = iter.next().context("--limit needs a value")?;
                limit = value
                    .parse()
                    .with_context(|| format!("Invalid limit: {}", value))?;
            }
            other => bail!("Unknown option for upcoming: {}", other),
        }
    }

    let client = signed_in_client(config).await?;
    let clubs = client.get_clubs().await?;
    let now = Utc::now();

    if as_json {
        let schedule: Vec<_> = clubs
            .iter()
            .map(|club| {
                json!({
                    "club_id": club.id,
                    "club": club.name,
                    "sessions": club.upcoming_sessions(now, limit),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&schedule)?);
        return Ok(());
    }

    for club in &clubs {
        println!("{}", club.name);
        let sessions = club.upcoming_sessions(now, limit);
        if sessions.is_empty() {
            println!("  No upcoming trainings");
        }
        for session in sessions {
            println!(
                "  {:<28} {:<24} {} spots",
                format_session_range(&session.start, &session.end),
                truncate_string(&session.training_class, 24),
                session.available_spots
            );
        }
        println!();
    }
    Ok(())
}

async fn overview(config: &Config) -> Result<()> {
    let client = signed_in_client(config).await?;
    // Independent requests, each with its own token
    let (clubs, faq) = futures::try_join!(client.get_clubs(), client.get_faq())?;

    print_clubs(&clubs);
    println!();
    print_faq(&faq);
    Ok(())
}

fn print_clubs(clubs: &[Club]) {
    for club in clubs {
        println!("{} ({} groups)", club.name, club.groups.len());
        if !club.description.is_empty() {
            println!("  {}", truncate_string(&club.description, DESCRIPTION_WIDTH));
        }
        for group in &club.groups {
            let status = if group.is_full() { "full" } else { "open" };
            println!(
                "  - {} [{}/{} {}]",
                group.name, group.current_enrollment, group.capacity, status
            );
            let trainers = group.trainer_names();
            if !trainers.is_empty() {
                println!("    Trainers: {}", trainers.join(", "));
            }
        }
    }
}

fn print_faq(faq: &FaqEntries) {
    for (question, answer) in faq {
        println!("Q: {}", question);
        println!("A: {}", answer);
        println!();
    }
}
