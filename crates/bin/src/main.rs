//! hsvar CLI binary.
//!
//! Computes the historical-simulation Value-at-Risk of an equity portfolio
//! from Yahoo Finance quotes or a CSV file.

mod integration;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use hsvar::{AnalysisConfig, ConfigError, Portfolio, run_analysis};
use hsvar_data::{YahooQuoteProvider, read_quotes_csv};
use hsvar_output::{ExportFormat, Exporter, ReportFormat};
use hsvar_risk::{PercentileMethod, ReturnKind};
use indicatif::{ProgressBar, ProgressStyle};
use integration::cache_manager;
use integration::data_pipeline::{FetchConfig, clear_cache, fetch_portfolio_quotes, print_cache_info};
use polars::prelude::DataFrame;
use std::path::{Path, PathBuf};
use std::process;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(name = "hsvar")]
#[command(about = "Historical-simulation Value-at-Risk for equity portfolios", long_about = None)]
#[command(version)]
struct Cli {
    /// Log more detail (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute Value-at-Risk for a portfolio
    Run(RunArgs),

    /// Inspect or clear the quote cache
    Cache {
        /// Show cache location and contents (default)
        #[arg(long)]
        info: bool,

        /// Remove cached quotes
        #[arg(long)]
        clear: bool,

        /// Restrict --clear to one symbol
        #[arg(long, requires = "clear")]
        symbol: Option<String>,
    },
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Comma-separated ticker symbols [default: AAPL,MSFT,GOOGL]
    #[arg(long, value_delimiter = ',')]
    tickers: Option<Vec<String>>,

    /// Comma-separated weights, one per ticker [default: equal]
    #[arg(long, value_delimiter = ',')]
    weights: Option<Vec<f64>>,

    /// Portfolio value in dollars [default: 100000]
    #[arg(long)]
    value: Option<f64>,

    /// First day of the lookback window, YYYY-MM-DD [default: 2023-01-01]
    #[arg(long)]
    start: Option<NaiveDate>,

    /// Last day of the lookback window, YYYY-MM-DD [default: 2024-12-31]
    #[arg(long)]
    end: Option<NaiveDate>,

    /// Confidence level [default: 0.95]
    #[arg(long)]
    confidence: Option<f64>,

    /// Return definition: simple or log [default: simple]
    #[arg(long)]
    returns: Option<ReturnKind>,

    /// Percentile method: linear, lower, higher, nearest or midpoint [default: linear]
    #[arg(long)]
    method: Option<PercentileMethod>,

    /// Number of histogram bins [default: 50]
    #[arg(long)]
    bins: Option<usize>,

    /// JSON analysis config; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Read quotes from a date,symbol,adjusted_close CSV instead of Yahoo Finance
    #[arg(long)]
    prices: Option<PathBuf>,

    /// Disable caching (always fetch fresh data)
    #[arg(long)]
    no_cache: bool,

    /// Force refresh cached data
    #[arg(long)]
    refresh: bool,

    /// Report format: text, markdown or json
    #[arg(long, default_value = "text")]
    format: ReportFormat,

    /// Export the VaR summary (.csv or .json)
    #[arg(long)]
    export: Option<PathBuf>,

    /// Export the daily portfolio returns (.csv or .json)
    #[arg(long)]
    export_returns: Option<PathBuf>,

    /// Export the return histogram (.csv or .json)
    #[arg(long)]
    export_histogram: Option<PathBuf>,

    /// Leave the histogram out of the report
    #[arg(long)]
    no_histogram: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "info,hsvar=debug,hsvar_data=debug,hsvar_risk=debug"
    } else {
        "warn,hsvar=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    // stdout carries the report
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Run(args) => run_var(args).await?,
        Commands::Cache {
            info,
            clear,
            symbol,
        } => {
            let (clear, show_info) = cache_plan(info, clear);
            if clear {
                let removed = clear_cache(symbol.as_deref())?;
                match symbol {
                    Some(symbol) => println!("Removed {removed} cached quotes for {symbol}"),
                    None => println!("Removed {removed} cached quotes"),
                }
            }
            if show_info {
                print_cache_info()?;
            }
        }
    }

    Ok(())
}

/// Steps of `hsvar cache` as `(clear, show_info)`; info runs after clearing
/// and is the default when no flag is given.
const fn cache_plan(info: bool, clear: bool) -> (bool, bool) {
    (clear, info || !clear)
}

/// Merge the config file, flags and defaults into one validated config.
fn build_config(args: &RunArgs) -> Result<AnalysisConfig, ConfigError> {
    let mut config = match &args.config {
        Some(path) => AnalysisConfig::from_json_file(path)?,
        None => AnalysisConfig::default(),
    };

    if args.tickers.is_some() || args.weights.is_some() || args.value.is_some() {
        let base = &config.portfolio;
        let symbols = args.tickers.clone().unwrap_or_else(|| base.symbols());
        let weights = match (&args.tickers, &args.weights) {
            (_, Some(weights)) => Some(weights.clone()),
            // New tickers without weights are equally weighted
            (Some(_), None) => None,
            (None, None) => Some(base.holdings.iter().map(|h| h.weight).collect()),
        };
        let value = args.value.unwrap_or(base.value);

        let portfolio = Portfolio::from_symbols(&symbols, weights, value)?;
        config.portfolio = if args.tickers.is_some() {
            portfolio
        } else {
            portfolio.with_name(base.name.clone())
        };
    }

    if let Some(start) = args.start {
        config.start = start;
    }
    if let Some(end) = args.end {
        config.end = end;
    }
    if let Some(confidence) = args.confidence {
        config.confidence = confidence;
    }
    if let Some(kind) = args.returns {
        config.return_kind = kind;
    }
    if let Some(method) = args.method {
        config.percentile_method = method;
    }
    if let Some(bins) = args.bins {
        config.histogram_bins = bins;
    }

    config.validate()?;
    Ok(config)
}

async fn load_quotes(
    args: &RunArgs,
    config: &AnalysisConfig,
) -> Result<DataFrame, Box<dyn std::error::Error>> {
    if let Some(path) = &args.prices {
        info!(path = %path.display(), "reading quotes from csv");
        return Ok(read_quotes_csv(path)?);
    }

    let symbols = config.portfolio.symbols();
    let fetch_config = FetchConfig {
        use_cache: !args.no_cache,
        force_refresh: args.refresh,
        ..FetchConfig::default()
    };
    if fetch_config.use_cache {
        info!(path = %cache_manager::get_cache_path().display(), "using quote cache");
    }

    let provider = YahooQuoteProvider::new()?;
    let pb = ProgressBar::new(symbols.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("█▓░"),
    );

    let quotes = fetch_portfolio_quotes(
        &provider,
        &symbols,
        config.start,
        config.end,
        &fetch_config,
        Some(&pb),
    )
    .await;
    pb.finish_and_clear();

    Ok(quotes?)
}

async fn run_var(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = build_config(&args)?;
    info!(
        symbols = %config.portfolio.symbols().join(","),
        start = %config.start,
        end = %config.end,
        confidence = config.confidence,
        "starting analysis"
    );

    let quotes = load_quotes(&args, &config).await?;
    let analysis = run_analysis(&config, &quotes)?;

    let report = analysis.report(!args.no_histogram)?;
    println!("{}", report.render(args.format)?);

    if let Some(path) = &args.export {
        export(&analysis.summary(), path)?;
    }
    if let Some(path) = &args.export_returns {
        export(&analysis.returns_export(), path)?;
    }
    if let Some(path) = &args.export_histogram {
        export(&analysis.histogram, path)?;
    }

    Ok(())
}

fn export(item: &impl Exporter, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let format = ExportFormat::from_path(path)?;
    item.export_to_file(path, format)?;
    info!(path = %path.display(), format = format.extension(), "exported");
    Ok(())
}
