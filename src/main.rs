use anyhow::Context;
use api_client::{ApiClient, CoinGeckoClient};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use clap::{Parser, Subcommand};
use configuration::{Config, load_config};
use core_types::AssetId;
use engine::{ComparisonEngine, ComparisonRequest};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod display;

/// The main entry point for the numeraire application.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Optional .env overrides for NUMERAIRE__* settings and RUST_LOG.
    dotenvy::dotenv().ok();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Parse command-line arguments
    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref()).context("Failed to load configuration")?;

    // Execute the appropriate command
    match cli.command {
        Commands::Compare(args) => handle_compare(args, &mut config).await,
        Commands::Price(args) => handle_price(args, &config).await,
        Commands::Top(args) => handle_top(args, &mut config).await,
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Relative crypto performance in the native currency and two pivot assets.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a TOML configuration file (default: ./config.toml, if present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare the top assets (plus a target) between two instants.
    Compare(CompareArgs),
    /// Resolve the price of one asset at one instant.
    Price(PriceArgs),
    /// List the ranked assets the comparison universe starts from.
    Top(TopArgs),
}

#[derive(Parser)]
struct CompareArgs {
    /// Provider id of an extra asset to compare (e.g. "solana").
    #[arg(long)]
    target: Option<AssetId>,

    /// The start instant (RFC 3339, or "YYYY-MM-DD[ HH:MM[:SS]]" in UTC).
    #[arg(long, value_parser = parse_instant)]
    from: DateTime<Utc>,

    /// The end instant. Defaults to now.
    #[arg(long, value_parser = parse_instant)]
    to: Option<DateTime<Utc>>,

    /// Overrides the size of the ranked listing.
    #[arg(long)]
    top_n: Option<usize>,
}

#[derive(Parser)]
struct PriceArgs {
    /// Provider id of the asset (e.g. "bitcoin").
    #[arg(long)]
    asset: AssetId,

    /// The instant to resolve (RFC 3339, or "YYYY-MM-DD[ HH:MM[:SS]]" in UTC).
    #[arg(long, value_parser = parse_instant)]
    at: DateTime<Utc>,
}

#[derive(Parser)]
struct TopArgs {
    /// Overrides the size of the ranked listing.
    #[arg(long)]
    top_n: Option<usize>,
}

// ==============================================================================
// Command Logic
// ==============================================================================

fn build_engine(config: &Config) -> anyhow::Result<ComparisonEngine> {
    let client: Arc<dyn ApiClient> =
        Arc::new(CoinGeckoClient::new(&config.provider).context("Failed to build the API client")?);
    Ok(ComparisonEngine::from_config(client, config))
}

fn apply_top_n(config: &mut Config, top_n: Option<usize>) -> anyhow::Result<()> {
    if let Some(top_n) = top_n {
        config.universe.top_n = top_n;
        config.validate()?;
    }
    Ok(())
}

fn spinner(message: &'static str) -> anyhow::Result<ProgressBar> {
    let progress = ProgressBar::new_spinner();
    progress.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    progress.set_message(message);
    progress.enable_steady_tick(Duration::from_millis(120));
    Ok(progress)
}

/// Handles the orchestration of a full comparison run.
async fn handle_compare(args: CompareArgs, config: &mut Config) -> anyhow::Result<()> {
    apply_top_n(config, args.top_n)?;

    let target = match args.target {
        Some(target) => Some(target),
        None => config
            .universe
            .default_target
            .as_deref()
            .map(AssetId::parse)
            .transpose()?,
    };
    let request = ComparisonRequest {
        target,
        start: args.from,
        end: args.to.unwrap_or_else(Utc::now),
    };

    let engine = build_engine(config)?;
    let progress = spinner("Querying the price provider...")?;
    let result = engine.run(&request).await;
    progress.finish_and_clear();

    let outcome = result.context("Comparison failed")?;
    println!(
        "{} -> {} ({} pivots: {} / {})",
        outcome.start.format("%Y-%m-%d %H:%M UTC"),
        outcome.end.format("%Y-%m-%d %H:%M UTC"),
        outcome.vs_currency.to_uppercase(),
        outcome.table.pivot_a.symbol,
        outcome.table.pivot_b.symbol,
    );
    println!("{}", display::performance_table(&outcome, &Default::default()));

    if !outcome.excluded.is_empty() {
        println!();
        println!("{}", display::excluded_assets(&outcome.excluded));
    }
    Ok(())
}

async fn handle_price(args: PriceArgs, config: &Config) -> anyhow::Result<()> {
    let engine = build_engine(config)?;
    let point = engine
        .resolve_price(&args.asset, args.at)
        .await
        .with_context(|| format!("Could not resolve the price of '{}'", args.asset))?;

    println!(
        "{} at {}: {} {} (sample at {})",
        args.asset,
        point.instant.format("%Y-%m-%d %H:%M:%S UTC"),
        point.price.round_dp(8).normalize(),
        config.provider.vs_currency.to_uppercase(),
        point.sampled_at.format("%Y-%m-%d %H:%M:%S UTC"),
    );
    Ok(())
}

async fn handle_top(args: TopArgs, config: &mut Config) -> anyhow::Result<()> {
    apply_top_n(config, args.top_n)?;
    let engine = build_engine(config)?;
    let assets = engine.top_assets().await.context("Failed to fetch the listing")?;
    println!("{}", display::listing(&assets));
    Ok(())
}

/// Parses an instant given on the command line. Anything without an explicit
/// offset is read as UTC.
fn parse_instant(input: &str) -> Result<DateTime<Utc>, String> {
    let input = input.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(input) {
        return Ok(instant.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN).and_utc());
    }
    Err(format!(
        "'{}' is neither RFC 3339 nor 'YYYY-MM-DD[ HH:MM[:SS]]'",
        input
    ))
}
