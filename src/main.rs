//! `sse-tail`: follow a Server-Sent-Events stream from the terminal.
//!
//! Thin consumer over the `sse-client` crate, printing every lifecycle
//! notification and payload. Doubles as a manual test tool against a
//! real endpoint: kill the server mid-stream and watch the client
//! resume from its cursor.

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use log::LevelFilter;
use serde_json::Value;
use simplelog::{ColorChoice, Config as LogConfig, TermLogger, TerminalMode};
use sse_client::{
    Client, ClientConfig, Error, ErrorClass, MessageMeta, ReplayProgress, StreamObserver,
};
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "sse-tail")]
#[command(about = "Follow an SSE stream with resume, reconnect, and heartbeat detection")]
struct Cli {
    /// Stream URL (e.g. http://localhost:4747/events)
    #[arg(long, env = "SSE_URL")]
    url: String,

    /// Maximum reconnect attempts before giving up
    #[arg(long, default_value_t = 10)]
    max_attempts: u32,

    /// Expected heartbeat interval in seconds (enables the watchdog)
    #[arg(long)]
    heartbeat_secs: Option<u64>,

    /// In-memory event buffer capacity
    #[arg(long, default_value_t = 500)]
    buffer_limit: usize,

    /// Disable automatic reconnection
    #[arg(long)]
    no_reconnect: bool,

    /// Extra request header as KEY:VALUE (repeatable)
    #[arg(long = "header")]
    headers: Vec<String>,

    /// Enable debug output
    #[arg(long, short)]
    verbose: bool,
}

struct PrintObserver;

impl StreamObserver for PrintObserver {
    fn on_open(&self, resumed: bool) {
        if resumed {
            println!("{} stream open (resumed from cursor)", "✓".green());
        } else {
            println!("{} stream open", "✓".green());
        }
    }

    fn on_message(&self, payload: &Value, meta: &MessageMeta) {
        let id = meta.id.as_deref().unwrap_or("-");
        println!(
            "{} [{}] {}",
            meta.event_type.cyan(),
            id.dimmed(),
            payload
        );
    }

    fn on_parse_error(&self, raw: &str, error: &serde_json::Error) {
        eprintln!("{} payload is not JSON ({error}): {raw}", "!".yellow());
    }

    fn on_error(&self, error: &Error, class: ErrorClass, attempt: u32, max_attempts: u32) {
        eprintln!(
            "{} {error} (class {class:?}, attempt {attempt}/{max_attempts})",
            "✗".red()
        );
    }

    fn on_close(&self, reason: &str, uptime: Duration) {
        println!("{} closed ({reason}) after {uptime:?}", "→".blue());
    }

    fn on_replay_start(&self, total: u64) {
        println!("{} replay started ({total} events)", "→".blue());
    }

    fn on_replay_progress(&self, progress: &ReplayProgress) {
        let eta = progress
            .estimated_remaining
            .map(|d| format!("{d:?}"))
            .unwrap_or_else(|| "?".to_owned());
        println!(
            "{} replay {}/{} (eta {eta})",
            "→".blue(),
            progress.current,
            progress.total
        );
    }

    fn on_replay_end(&self) {
        println!("{} replay finished", "→".blue());
    }

    fn on_heartbeat_missed(&self, gap: Duration) {
        eprintln!("{} no heartbeat for {gap:?}", "!".yellow());
    }

    fn on_reconnect_attempt(&self, attempt: u32, max_attempts: u32, delay: Duration) {
        eprintln!(
            "{} reconnecting in {delay:?} (attempt {attempt}/{max_attempts})",
            "→".blue()
        );
    }

    fn on_reconnect_failed(&self, attempts: u32) {
        eprintln!("{} gave up after {attempts} attempts", "✗".red());
    }

    fn on_network_lost(&self) {
        eprintln!("{} network lost", "!".yellow());
    }

    fn on_network_restore(&self, downtime: Duration) {
        println!("{} network restored after {downtime:?}", "✓".green());
    }

    fn on_duplicate_connection(&self) {
        eprintln!("{} already connected", "!".yellow());
    }

    fn on_retry_interval_update(&self, interval: Duration) {
        println!("{} server suggests a retry interval of {interval:?}", "→".blue());
    }
}

fn parse_headers(raw: &[String]) -> Result<Vec<(String, String)>> {
    raw.iter()
        .map(|entry| {
            let (name, value) = entry
                .split_once(':')
                .with_context(|| format!("invalid header {entry:?}, expected KEY:VALUE"))?;
            Ok((name.trim().to_owned(), value.trim().to_owned()))
        })
        .collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    TermLogger::init(
        level,
        LogConfig::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )?;

    let headers = parse_headers(&cli.headers)?;

    let client = Client::new(ClientConfig {
        url: Some(cli.url.clone()),
        headers,
        reconnect: !cli.no_reconnect,
        max_reconnect_attempts: cli.max_attempts,
        heartbeat_interval: cli.heartbeat_secs.map(Duration::from_secs),
        buffer_limit: cli.buffer_limit,
        observer: Arc::new(PrintObserver),
        ..ClientConfig::default()
    })
    .context("failed to build the streaming client")?;

    println!("{} connecting to {}", "→".blue(), cli.url);
    if let Err(err) = client.connect(None).await {
        // With reconnection enabled the retry policy takes over from here.
        eprintln!("{} initial connect failed: {err}", "✗".red());
        if cli.no_reconnect {
            std::process::exit(1);
        }
    }

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;
    client.disconnect();

    let metrics = client.metrics();
    println!("\n{}", "=== SESSION SUMMARY ===".bright_white().bold());
    println!("events:       {}", metrics.total_events);
    println!("reconnects:   {}", metrics.total_reconnects);
    println!("errors:       {}", metrics.total_errors);
    println!("avg payload:  {:.0} bytes", metrics.avg_event_size);
    if let Some(id) = client.cursor() {
        println!("last cursor:  {id}");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_key_value_headers() {
        let parsed =
            parse_headers(&["Authorization: Bearer abc".to_owned(), "X-Tag:v".to_owned()])
                .unwrap();
        assert_eq!(parsed[0], ("Authorization".to_owned(), "Bearer abc".to_owned()));
        assert_eq!(parsed[1], ("X-Tag".to_owned(), "v".to_owned()));
    }

    #[test]
    fn rejects_malformed_headers() {
        assert!(parse_headers(&["nocolon".to_owned()]).is_err());
    }
}
