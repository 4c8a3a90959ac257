use clap::{ArgAction, Parser, ValueEnum};
use console::{Term, set_colors_enabled, style};
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use chrono::Local;
use pulseboard::{Monitor, ProbeMode, PulseError, Settings, fmt};

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Csv,
}

#[derive(Parser, Debug)]
#[command(name = "pulseboard")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Uptime dashboard - check a fixed list of URLs and report their status")]
struct Args {
    /// Addresses to check (added to those from the config file)
    #[arg(index = 1)]
    targets: Vec<String>,

    /// Config file (defaults to $PULSEBOARD_CONFIG_DIR or the user config dir)
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Probe mode
    #[arg(short = 'm', long, value_enum)]
    mode: Option<ProbeMode>,

    /// Intermediary base URL for remote mode
    #[arg(long)]
    intermediary: Option<String>,

    /// Per-probe timeout in seconds
    #[arg(long)]
    timeout: Option<f64>,

    /// Reject invalid or self-signed certificates
    #[arg(long)]
    strict_tls: bool,

    /// Degraded mode: block plain-http targets as a secure page would
    #[arg(long)]
    secure_origin: bool,

    /// Maximum concurrent probes (0 = unbounded)
    #[arg(long)]
    max_in_flight: Option<usize>,

    /// Put an address under maintenance before checking (repeatable)
    #[arg(long = "suspend", value_name = "ADDR")]
    suspend: Vec<String>,

    /// Output format
    #[arg(short = 'f', long, default_value = "text", value_enum)]
    format: OutputFormat,

    /// Alias for JSON output
    #[arg(short = 'j', long)]
    json: bool,

    /// Pretty-print JSON
    #[arg(short = 'p', long)]
    pretty: bool,

    /// Disable colored output
    #[arg(long = "no-color", alias = "nocolor")]
    no_color: bool,

    /// Also write the CSV report to this file, or into this directory
    #[arg(short = 'o', long, value_name = "PATH")]
    export: Option<PathBuf>,

    /// Open the interactive dashboard
    #[cfg(feature = "tui")]
    #[arg(long)]
    tui: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short = 'v', long, action = ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8, quiet: bool) {
    let default = match (quiet, verbose) {
        (true, _) => "off",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, _) => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .init();
}

/// Merge the config file with command line overrides.
fn build_settings(args: &Args) -> Result<Settings, PulseError> {
    let mut settings = Settings::load(args.config.as_deref())?;
    settings.targets.extend(args.targets.iter().cloned());
    settings.suspended.extend(args.suspend.iter().cloned());
    let probe = &mut settings.probe;
    if let Some(mode) = args.mode {
        probe.mode = mode;
    }
    if let Some(url) = &args.intermediary {
        probe.intermediary = Some(url.clone());
    }
    if let Some(timeout) = args.timeout {
        probe.timeout_secs = timeout;
    }
    if args.strict_tls {
        probe.accept_invalid_certs = false;
    }
    if args.secure_origin {
        probe.secure_origin = true;
    }
    if let Some(max) = args.max_in_flight {
        probe.max_in_flight = max;
    }
    Ok(settings)
}

fn export_path(path: &Path) -> PathBuf {
    if path.is_dir() {
        path.join(fmt::csv::report_file_name(Local::now().date_naive()))
    } else {
        path.to_path_buf()
    }
}

#[tokio::main]
async fn main() {
    let mut args = Args::parse();
    if args.json {
        args.format = OutputFormat::Json;
    }

    #[cfg(feature = "tui")]
    let interactive = args.tui;
    #[cfg(not(feature = "tui"))]
    let interactive = false;

    init_logging(
        args.verbose,
        interactive && std::env::var_os("RUST_LOG").is_none(),
    );

    let want_color = matches!(args.format, OutputFormat::Text)
        && io::stdout().is_terminal()
        && std::env::var_os("NO_COLOR").is_none()
        && !args.no_color;
    set_colors_enabled(want_color);

    let term = Term::stdout();
    let exit_code = match run(&args, &term, interactive).await {
        Ok(()) => 0,
        Err(e) => handle_error(&term, e),
    };
    process::exit(exit_code);
}

#[cfg_attr(not(feature = "tui"), allow(unused_variables))]
async fn run(args: &Args, term: &Term, interactive: bool) -> Result<(), PulseError> {
    let settings = build_settings(args)?;
    let monitor = Arc::new(Monitor::from_settings(&settings)?);

    #[cfg(feature = "tui")]
    if interactive {
        use pulseboard::tui::{TuiApp, run_tui};
        let mut app = TuiApp::new(Arc::clone(&monitor), tokio::runtime::Handle::current());
        app.run_cycle();
        tokio::task::block_in_place(|| run_tui(&mut app))?;
        return Ok(());
    }

    monitor.run_cycle().await?;
    let snapshot = monitor.snapshot().await;

    match args.format {
        OutputFormat::Text => {
            term.write_line(&fmt::text::render_board(&snapshot)).ok();
        }
        OutputFormat::Json => println!("{}", fmt::json::to_json(&snapshot, args.pretty)?),
        OutputFormat::Csv => print!("{}", fmt::csv::to_csv(&snapshot.targets)),
    }

    if let Some(path) = &args.export {
        let path = export_path(path);
        std::fs::write(&path, fmt::csv::to_csv(&snapshot.targets))?;
        tracing::info!(path = %path.display(), "report exported");
    }
    Ok(())
}

fn handle_error(term: &Term, err: PulseError) -> i32 {
    term.write_line(&style(format!("Error: {}", err)).red().to_string())
        .ok();
    match err {
        PulseError::NoTargets => 2,
        _ => 1,
    }
}
