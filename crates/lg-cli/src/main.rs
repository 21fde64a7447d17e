//! # lg — grep for columnar event logs
//!
//! Searches a `(time, millis, payload...)` table on a ClickHouse-style
//! HTTP endpoint and prints matching rows like grep would.
//!
//! - `lg -F "timeout" -C 2`: substring search with two lines of context.
//! - `lg -E "5\d\d" --reverse=false --after "2024-01-01 00:00:00"`: regex, oldest first.
//! - `lg --tailf --where "level='error'"`: follow new rows as they land.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::builder::BoolishValueParser;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use lg_core::config::non_empty;
use lg_core::ScanConfig;
use lg_io::{ScanError, Scanner, TailController, TcpConnector};

mod config;

use config::FileConfig;

// =============================================================================
// CLI
// =============================================================================

/// Grep-like explorer for timestamped event logs stored in a column database.
#[derive(Parser, Debug)]
#[command(name = "lg", version, about, long_about = None)]
struct Cli {
    /// How many lines of context to return before the found line
    #[arg(short = 'B', default_value_t = 0)]
    before_lines: u64,

    /// How many lines of context to return after the found line
    #[arg(short = 'A', default_value_t = 0)]
    after_lines: u64,

    /// How many lines of context to return both before and after the found line
    #[arg(short = 'C', default_value_t = 0)]
    context_lines: u64,

    /// Fixed string search
    #[arg(short = 'F')]
    fixed: Option<String>,

    /// Regex string search
    #[arg(short = 'E')]
    regex: Option<String>,

    /// Print incoming logs continuously
    #[arg(long)]
    tailf: bool,

    /// Whether or not to return results in reverse chronological order
    #[arg(
        long,
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    reverse: Option<bool>,

    /// Date and time before which to display results (without milliseconds)
    #[arg(long)]
    before: Option<String>,

    /// Date and time after which to display results (without milliseconds)
    #[arg(long)]
    after: Option<String>,

    /// Comma-separated list of fields to return in addition to the timestamp
    #[arg(long)]
    fields: Option<String>,

    /// The name of the text field that is being matched
    #[arg(long = "text-field")]
    text_field: Option<String>,

    /// Additional filters in WHERE (e.g. "vine='Y' AND star_rating>4")
    #[arg(long = "where")]
    filter: Option<String>,

    /// Limit the number of results (0 means no limit)
    #[arg(long)]
    limit: Option<u64>,

    /// The name of the table to scan
    #[arg(long)]
    table: Option<String>,

    /// Query service address (HTTP endpoint, host:port)
    #[arg(long = "ch-addr", env = "LG_CH_ADDR")]
    ch_addr: Option<String>,

    /// Log generated queries and context timings to stderr
    #[arg(long)]
    debug: bool,

    /// Optional TOML file with connection and table defaults
    #[arg(long, default_value = "lg.toml")]
    config: PathBuf,
}

impl Cli {
    /// Layer flags over the file config. `-C` wins over `-A`/`-B`.
    fn scan_config(&self, file: FileConfig) -> ScanConfig {
        let (before_lines, after_lines) = if self.context_lines != 0 {
            (self.context_lines, self.context_lines)
        } else {
            (self.before_lines, self.after_lines)
        };

        ScanConfig {
            fixed: non_empty(self.fixed.clone()),
            regex: non_empty(self.regex.clone()),
            raw_filter: non_empty(self.filter.clone()),
            after: non_empty(self.after.clone()),
            before: non_empty(self.before.clone()),
            text_field: self.text_field.clone().unwrap_or(file.text_field),
            fields: self.fields.clone().unwrap_or(file.fields),
            table: self.table.clone().unwrap_or(file.table),
            limit: self.limit.unwrap_or(file.limit),
            reverse: self.reverse.unwrap_or(file.reverse),
            before_lines,
            after_lines,
            endpoint: self.ch_addr.clone().unwrap_or(file.ch_addr),
        }
    }
}

// =============================================================================
// Runtime
// =============================================================================

const DEBUG_DIRECTIVES: [&str; 3] = ["lg=debug", "lg_core=debug", "lg_io=debug"];

/// `--debug` adds our crates' debug directives on top of whatever the
/// base filter (RUST_LOG or "warn") already says.
fn debug_filter(mut filter: EnvFilter, debug: bool) -> EnvFilter {
    if debug {
        for directive in DEBUG_DIRECTIVES {
            if let Ok(directive) = directive.parse() {
                filter = filter.add_directive(directive);
            }
        }
    }
    filter
}

fn init_tracing(debug: bool) {
    let base = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(debug_filter(base, debug))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Cancel `token` on SIGINT, SIGTERM or SIGPIPE. Shares nothing else
/// with the scan.
fn spawn_signal_observer(token: CancellationToken) {
    tokio::spawn(async move {
        if let Err(e) = wait_for_signal().await {
            tracing::warn!("signal handlers unavailable: {}", e);
            return;
        }
        tracing::debug!("terminate signal received");
        token.cancel();
    });
}

#[cfg(unix)]
async fn wait_for_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut term = signal(SignalKind::terminate())?;
    let mut pipe = signal(SignalKind::pipe())?;
    tokio::select! {
        r = tokio::signal::ctrl_c() => r?,
        _ = term.recv() => {}
        _ = pipe.recv() => {}
    }
    Ok(())
}

#[cfg(not(unix))]
async fn wait_for_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}

async fn run(config: ScanConfig, tail: bool) -> Result<(), ScanError> {
    let cancel = CancellationToken::new();
    spawn_signal_observer(cancel.clone());

    let connector = TcpConnector::new(config.endpoint.clone());
    tracing::debug!(addr = connector.addr(), table = %config.table, tail, "starting");
    let mut out = tokio::io::stdout();
    let mut diag = tokio::io::stderr();

    if tail {
        TailController::new(&connector, &config, cancel)
            .run(&mut out, &mut diag)
            .await
    } else {
        let summary = Scanner::new(&connector, &config, cancel)
            .run(&mut out, &mut diag)
            .await?;
        tracing::debug!(rows = summary.rows, "scan finished");
        Ok(())
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let file = match FileConfig::load(&cli.config) {
        Ok(file) => file,
        Err(e) => {
            tracing::error!("FATAL error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };
    let config = cli.scan_config(file);

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("FATAL error: building runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match rt.block_on(run(config, cli.tailf)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.is_clean_shutdown() => {
            tracing::debug!("clean shutdown: {}", e);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("FATAL error: {}", e);
            ExitCode::FAILURE
        }
    }
}
