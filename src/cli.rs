//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::adapters::csv_adapter::CsvBarSource;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::sim_broker::{BrokerConfig, SimulatedBroker};
use crate::domain::config_validation::{validate_broker_config, validate_ichimoku_config};
use crate::domain::engine::{BacktestResult, Engine};
use crate::domain::error::IchitraderError;
use crate::domain::indicator::ichimoku::IchimokuParams;
use crate::domain::position::PositionSide;
use crate::ports::config_port::ConfigPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "ichitrader", about = "Ichimoku cloud strategy backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest over a CSV bar file
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Bar file; overrides [data] path
        #[arg(short, long)]
        data: Option<PathBuf>,
        /// Directory for signals.csv and executions.csv
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(short, long)]
        verbose: bool,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Backtest {
            config,
            data,
            output,
            verbose,
        } => {
            init_tracing(verbose);
            run_backtest(&config, data.as_deref(), output.as_deref()).map(|summary| {
                print_summary(&summary);
            })
        }
        Command::Validate { config } => run_validate(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Install the log subscriber. `RUST_LOG` wins unless `--verbose` is given.
pub fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    // A subscriber may already be installed (tests run `run` repeatedly).
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, IchitraderError> {
    FileConfigAdapter::from_file(path)
}

fn period(config: &dyn ConfigPort, key: &str, default: i64) -> usize {
    // Validation has already rejected values below 1.
    config.get_int("ichimoku", key, default).max(1) as usize
}

pub fn build_ichimoku_params(config: &dyn ConfigPort) -> Result<IchimokuParams, IchitraderError> {
    validate_ichimoku_config(config)?;
    Ok(IchimokuParams {
        tenkan_period: period(config, "tenkan_period", 9),
        kijun_period: period(config, "kijun_period", 26),
        senkou_b_period: period(config, "senkou_b_period", 52),
        shift: period(config, "shift", 26),
    })
}

pub fn build_broker_config(config: &dyn ConfigPort) -> Result<BrokerConfig, IchitraderError> {
    validate_broker_config(config)?;
    let defaults = BrokerConfig::default();
    Ok(BrokerConfig {
        cash: config.get_double("broker", "cash", defaults.cash),
        size: config.get_double("broker", "size", defaults.size),
        commission_pct: config.get_double("broker", "commission_pct", defaults.commission_pct),
        slippage_pct: config.get_double("broker", "slippage_pct", defaults.slippage_pct),
    })
}

pub fn resolve_data_path(
    data_override: Option<&Path>,
    config: &dyn ConfigPort,
) -> Result<PathBuf, IchitraderError> {
    if let Some(path) = data_override {
        return Ok(path.to_path_buf());
    }
    config
        .get_string("data", "path")
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from)
        .ok_or_else(|| IchitraderError::ConfigMissing {
            section: "data".into(),
            key: "path".into(),
        })
}

/// End-of-run figures printed after a backtest.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestSummary {
    pub bars: usize,
    pub skipped: usize,
    pub decisions: usize,
    pub fills: usize,
    pub failures: usize,
    pub total_commission: f64,
    pub position: PositionSide,
    pub entry_price: Option<f64>,
    /// Open position profit per unit at the last close.
    pub open_pnl: f64,
    pub starting_cash: f64,
    pub final_cash: f64,
    /// Cash plus holdings marked at the last close.
    pub final_value: f64,
}

impl BacktestSummary {
    fn new(result: &BacktestResult, broker: &SimulatedBroker, starting_cash: f64) -> Self {
        let mark = result.last_close.unwrap_or(0.0);
        BacktestSummary {
            bars: result.signals.len(),
            skipped: result.skipped.len(),
            decisions: result.decisions().count(),
            fills: result.execution_log.fills().count(),
            failures: result.execution_log.failures().count(),
            total_commission: result.execution_log.total_commission(),
            position: result.position.side(),
            entry_price: result.position.entry_price(),
            open_pnl: result.position.unrealized_pnl(mark),
            starting_cash,
            final_cash: broker.cash(),
            final_value: broker.value(mark),
        }
    }
}

pub fn run_backtest(
    config_path: &Path,
    data_override: Option<&Path>,
    output_dir: Option<&Path>,
) -> Result<BacktestSummary, IchitraderError> {
    info!(config = %config_path.display(), "loading config");
    let config = load_config(config_path)?;
    let params = build_ichimoku_params(&config)?;
    let broker_config = build_broker_config(&config)?;
    let data_path = resolve_data_path(data_override, &config)?;

    info!(
        tenkan = params.tenkan_period,
        kijun = params.kijun_period,
        senkou_b = params.senkou_b_period,
        shift = params.shift,
        data = %data_path.display(),
        "starting backtest"
    );

    let starting_cash = broker_config.cash;
    let mut source = CsvBarSource::from_path(&data_path)?;
    let mut broker = SimulatedBroker::new(broker_config);
    let result = Engine::new(params).run(&mut source, &mut broker)?;

    if let Some(dir) = output_dir {
        let reporter = CsvReportAdapter {
            include_warmup: config.get_bool("report", "include_warmup", false),
        };
        reporter.write(&result, dir)?;
        info!(dir = %dir.display(), "reports written");
    }

    Ok(BacktestSummary::new(&result, &broker, starting_cash))
}

fn print_summary(summary: &BacktestSummary) {
    println!("Bars processed:   {}", summary.bars);
    println!("Bars skipped:     {}", summary.skipped);
    println!("Signals:          {}", summary.decisions);
    println!("Fills:            {}", summary.fills);
    println!("Failed orders:    {}", summary.failures);
    println!("Commission paid:  {:.2}", summary.total_commission);
    println!("Final position:   {}", summary.position);
    if let Some(entry) = summary.entry_price {
        println!("Entry price:      {entry:.2}");
        println!("Open P&L/unit:    {:.2}", summary.open_pnl);
    }
    println!("Starting cash:    {:.2}", summary.starting_cash);
    println!("Final cash:       {:.2}", summary.final_cash);
    println!("Final value:      {:.2}", summary.final_value);
}

pub fn run_validate(config_path: &Path) -> Result<(), IchitraderError> {
    let config = load_config(config_path)?;
    let params = build_ichimoku_params(&config)?;
    let broker = build_broker_config(&config)?;

    println!("Config is valid.");
    println!(
        "  ichimoku: tenkan={} kijun={} senkou_b={} shift={} (warm-up {} bars)",
        params.tenkan_period,
        params.kijun_period,
        params.senkou_b_period,
        params.shift,
        params.warmup()
    );
    println!(
        "  broker:   cash={:.2} size={} commission={}% slippage={}%",
        broker.cash, broker.size, broker.commission_pct, broker.slippage_pct
    );
    match config.get_string("data", "path") {
        Some(path) => println!("  data:     {path}"),
        None => println!("  data:     (none, pass --data)"),
    }
    Ok(())
}
