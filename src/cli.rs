//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{ArgAction, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::Level;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_intent_adapter::CsvIntentAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::config_validation::{parse_date, validate_replay_config, validate_strategy_config};
use crate::domain::controller::StrategyController;
use crate::domain::error::RaphaelError;
use crate::domain::instrument::Instrument;
use crate::domain::instrument_data::InstrumentData;
use crate::domain::replay::{ReplayResult, run_replay};
use crate::domain::strategy::{IndicatorPeriods, RsiResolution, StrategyParameters};
use crate::domain::universe::{parse_instruments, validate_universe};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::order_port::OrderPort;

#[derive(Parser, Debug)]
#[command(name = "raphael", about = "Multi-asset trend-following signal engine")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replay historical bars through the strategy and write order intents
    Run {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        instrument: Option<String>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List instruments with CSV data in a directory
    ListInstruments {
        #[arg(long)]
        data_dir: PathBuf,
    },
    /// Show bar count and time range for instrument(s)
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        instrument: Option<String>,
    },
}

/// Installs the stderr log subscriber. Warnings only unless `-v` is given.
pub fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .init();
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Run {
            config,
            output,
            instrument,
            dry_run,
        } => {
            if dry_run {
                run_dry_run(&config, instrument.as_deref())
            } else {
                run_signals(&config, output.as_ref(), instrument.as_deref())
            }
        }
        Command::Validate { config } => run_validate(&config),
        Command::ListInstruments { data_dir } => run_list_instruments(&data_dir),
        Command::Info { config, instrument } => run_info(&config, instrument.as_deref()),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = RaphaelError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

/// Where the replay reads from and writes to.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplaySettings {
    pub data_dir: PathBuf,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub output: PathBuf,
}

pub fn build_replay_settings(config: &dyn ConfigPort) -> Result<ReplaySettings, RaphaelError> {
    Ok(ReplaySettings {
        data_dir: PathBuf::from(
            config
                .get_string("replay", "data_dir")
                .unwrap_or_else(|| "./data".to_string()),
        ),
        start_date: parse_date(config.get_string("replay", "start_date").as_deref(), "start_date")?,
        end_date: parse_date(config.get_string("replay", "end_date").as_deref(), "end_date")?,
        output: PathBuf::from(
            config
                .get_string("replay", "output")
                .unwrap_or_else(|| "intents.csv".to_string()),
        ),
    })
}

pub fn build_indicator_periods(config: &dyn ConfigPort) -> IndicatorPeriods {
    let defaults = IndicatorPeriods::default();
    let period = |key: &str, default: usize| {
        config.get_int("indicators", key, default as i64).max(1) as usize
    };
    IndicatorPeriods {
        rsi: period("rsi_period", defaults.rsi),
        rsi_resolution: config
            .get_string("indicators", "rsi_resolution")
            .and_then(|s| s.parse::<RsiResolution>().ok())
            .unwrap_or(defaults.rsi_resolution),
        macd_fast: period("macd_fast", defaults.macd_fast),
        macd_slow: period("macd_slow", defaults.macd_slow),
        macd_signal: period("macd_signal", defaults.macd_signal),
        ema: period("ema_period", defaults.ema),
        atr: period("atr_period", defaults.atr),
    }
}

pub fn build_strategy_parameters(config: &dyn ConfigPort) -> StrategyParameters {
    let defaults = StrategyParameters::default();
    StrategyParameters {
        rsi_threshold: config.get_double("strategy", "rsi_threshold", defaults.rsi_threshold),
        stop_loss_atr: config.get_double("strategy", "stop_loss_atr", defaults.stop_loss_atr),
        take_profit_atr: config.get_double("strategy", "take_profit_atr", defaults.take_profit_atr),
        allocation: config.get_double("strategy", "allocation", defaults.allocation),
    }
}

/// `--instrument` wins over the configured list.
pub fn resolve_instruments(
    instrument_override: Option<&str>,
    config: &dyn ConfigPort,
) -> Result<Vec<Instrument>, RaphaelError> {
    if let Some(symbol) = instrument_override {
        return Ok(parse_instruments(symbol)?);
    }
    match config.get_string("replay", "instruments") {
        Some(list) => Ok(parse_instruments(&list)?),
        None => Err(RaphaelError::ConfigMissing {
            section: "replay".into(),
            key: "instruments".into(),
        }),
    }
}

fn validate_all(config: &dyn ConfigPort) -> Result<(), RaphaelError> {
    validate_replay_config(config)?;
    validate_strategy_config(config)
}

fn run_signals(
    config_path: &Path,
    output_override: Option<&PathBuf>,
    instrument_override: Option<&str>,
) -> ExitCode {
    // Stage 1: Load and validate config
    eprintln!("Loading config from {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    if let Err(e) = validate_all(&config) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    // Stage 2: Build parameters
    let settings = match build_replay_settings(&config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let periods = build_indicator_periods(&config);
    let params = build_strategy_parameters(&config);
    let instruments = match resolve_instruments(instrument_override, &config) {
        Ok(i) => i,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    // Stage 3: Load and validate bar data
    let data_port = CsvAdapter::new(settings.data_dir.clone());
    eprintln!(
        "Validating {} instruments in {}...",
        instruments.len(),
        settings.data_dir.display()
    );
    let data = match load_instrument_data(&data_port, &settings, &periods, instruments) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    // Stage 4: Open the order sink
    let output = output_override.cloned().unwrap_or_else(|| settings.output.clone());
    let mut orders = match CsvIntentAdapter::create(&output) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    // Stage 5: Replay
    let result = match replay_loaded(&data, &settings, params, &mut orders) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    // Stage 6: Console summary
    print_summary(&result);
    eprintln!("\nIntents written to: {}", output.display());
    ExitCode::SUCCESS
}

/// Loads data for `instruments` and drops those that cannot warm up.
pub fn load_instrument_data(
    data_port: &dyn DataPort,
    settings: &ReplaySettings,
    periods: &IndicatorPeriods,
    instruments: Vec<Instrument>,
) -> Result<Vec<InstrumentData>, RaphaelError> {
    let validation = validate_universe(
        data_port,
        instruments,
        settings.start_date,
        settings.end_date,
        periods,
    )?;

    Ok(validation
        .universe
        .instruments
        .into_iter()
        .zip(validation.bars)
        .map(|(instrument, bars)| InstrumentData::new(instrument, bars, periods))
        .collect())
}

/// [`load_instrument_data`] followed by a replay through a fresh controller.
pub fn run_replay_pipeline(
    data_port: &dyn DataPort,
    settings: &ReplaySettings,
    periods: &IndicatorPeriods,
    params: StrategyParameters,
    instruments: Vec<Instrument>,
    orders: &mut dyn OrderPort,
) -> Result<ReplayResult, RaphaelError> {
    let data = load_instrument_data(data_port, settings, periods, instruments)?;
    replay_loaded(&data, settings, params, orders)
}

fn replay_loaded(
    data: &[InstrumentData],
    settings: &ReplaySettings,
    params: StrategyParameters,
    orders: &mut dyn OrderPort,
) -> Result<ReplayResult, RaphaelError> {
    let universe: Vec<Instrument> = data.iter().map(|d| d.instrument.clone()).collect();

    eprintln!(
        "Replaying {} instruments, {} to {}",
        universe.len(),
        settings.start_date,
        settings.end_date
    );

    let mut controller = StrategyController::new(&universe, params);
    run_replay(data, &mut controller, orders)
}

fn print_summary(result: &ReplayResult) {
    eprintln!("\n=== Replay Results ===");
    eprintln!("Bars processed:   {}", result.ticks);
    match result.warmed_up_at {
        Some(ts) => eprintln!("Warm-up complete: {}", ts),
        None => eprintln!("Warm-up complete: never"),
    }
    eprintln!("Intents emitted:  {}", result.intents.len());
    eprintln!("Ledger faults:    {}", result.faults.len());

    if !result.summaries.is_empty() {
        eprintln!("\n=== Per-Instrument Summary ===");
        for s in &result.summaries {
            eprintln!(
                "  {}:  {} entries, {} stop-loss, {} take-profit, {:.1}% win rate{}",
                s.instrument,
                s.entries,
                s.stop_losses,
                s.take_profits,
                s.win_rate() * 100.0,
                if s.open_at_end { ", open" } else { "" },
            );
        }
    }
}

pub fn run_dry_run(config_path: &Path, instrument_override: Option<&str>) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    if let Err(e) = validate_all(&config) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    eprintln!("Config validated successfully");

    let periods = build_indicator_periods(&config);
    let params = build_strategy_parameters(&config);

    eprintln!("\nIndicators to compute:");
    for indicator in periods.indicator_types() {
        eprintln!("  {}", indicator);
    }
    eprintln!("  warm-up: {} bars", periods.warmup_bars());
    if periods.warmup_days() > 0 {
        eprintln!("  warm-up: {} trading days", periods.warmup_days());
    }

    eprintln!("\nStrategy parameters:");
    eprintln!("  rsi_threshold:   {}", params.rsi_threshold);
    eprintln!("  allocation:      {}", params.allocation);
    eprintln!("  stop_loss_atr:   {}", params.stop_loss_atr);
    eprintln!("  take_profit_atr: {}", params.take_profit_atr);

    match resolve_instruments(instrument_override, &config) {
        Ok(instruments) => {
            let symbols: Vec<&str> = instruments.iter().map(|i| i.symbol()).collect();
            eprintln!("\nUniverse:");
            eprintln!("  instruments: {}", symbols.join(", "));
        }
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    }

    eprintln!("\nDry run complete: configuration is valid");
    ExitCode::SUCCESS
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    if let Err(e) = validate_all(&config) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    eprintln!("Configuration is valid.");
    ExitCode::SUCCESS
}

fn run_list_instruments(data_dir: &Path) -> ExitCode {
    let adapter = CsvAdapter::new(data_dir.to_path_buf());
    let instruments = match adapter.list_instruments() {
        Ok(i) => i,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    if instruments.is_empty() {
        eprintln!("No instruments found in {}", data_dir.display());
    } else {
        for instrument in &instruments {
            println!("{}", instrument);
        }
        eprintln!("{} instruments found", instruments.len());
    }
    ExitCode::SUCCESS
}

fn run_info(config_path: &Path, instrument_override: Option<&str>) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let instruments = match resolve_instruments(instrument_override, &config) {
        Ok(i) => i,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let data_dir = config
        .get_string("replay", "data_dir")
        .unwrap_or_else(|| "./data".to_string());
    let adapter = CsvAdapter::new(PathBuf::from(data_dir));
    let periods = build_indicator_periods(&config);

    for instrument in &instruments {
        let bars = match adapter.fetch_ohlcv(instrument, NaiveDate::MIN, NaiveDate::MAX) {
            Ok(bars) => bars,
            Err(e) => {
                eprintln!("error reading {}: {}", instrument, e);
                continue;
            }
        };
        let (Some(first), Some(last)) = (bars.first(), bars.last()) else {
            eprintln!("{}: no data found", instrument);
            continue;
        };
        let range = format!(
            "{}: {} bars, {} to {}",
            instrument,
            bars.len(),
            first.timestamp,
            last.timestamp
        );
        let data = InstrumentData::new(instrument.clone(), bars, &periods);
        match data.first_ready_index() {
            Some(i) => println!("{}, indicators ready at {}", range, data.bars[i].timestamp),
            None => println!("{}, indicators never ready", range),
        }
    }
    ExitCode::SUCCESS
}
