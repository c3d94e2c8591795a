//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use chrono::SecondsFormat;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::adapters::csv_adapter::CsvTickReader;
use crate::adapters::feature_export::{export_features, next_close_labels};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::mock_broker::MockBroker;
use crate::adapters::replay::ReplayPacer;
use crate::adapters::tick_store::TickStore;
use crate::domain::config_validation::{
    validate_engine_config, validate_risk_config, validate_strategy_config,
};
use crate::domain::engine::{Engine, EngineSnapshot};
use crate::domain::error::TicksimError;
use crate::domain::evaluator::{Evaluator, Summary};
use crate::domain::features::{DEFAULT_WINDOW, FeatureEngine};
use crate::domain::risk::{RiskManager, RiskSettings};
use crate::domain::strategy::{
    BreakoutConfig, DeltaTrendConfig, MeanReversionConfig, Strategy,
};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::{TickSource, TickStream};
use crate::ports::feature_port::FeatureProvider;

pub const FLUSH_REASON: &str = "eod";

#[derive(Parser, Debug)]
#[command(name = "ticksim", about = "Tick-driven trading simulator")]
pub struct Cli {
    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Convert a CSV tick file into a tick store
    Ingest {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Compute features for every stored tick and write them as CSV
    Features {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(long, default_value_t = DEFAULT_WINDOW)]
        window: usize,
    },
    /// Print stored ticks with their recorded timing
    Replay {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(long, default_value_t = 50.0)]
        speed: f64,
    },
    /// Run a strategy over a tick store and print the summary
    Run {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Run a strategy against a paced replay
    Live {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long, default_value_t = 1.0)]
        speed: f64,
    },
    /// Run a strategy and print a status line periodically
    Dashboard {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long, default_value_t = 2000)]
        refresh_ms: u64,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    init_logging(&cli.log_level);
    let result = match cli.command {
        Command::Ingest { input, output } => run_ingest(&input, &output),
        Command::Features {
            input,
            output,
            window,
        } => run_features(&input, &output, window),
        Command::Replay { input, speed } => run_replay(&input, speed),
        Command::Run { input, config } => run_simulation(&input, &config),
        Command::Live {
            input,
            config,
            speed,
        } => run_live(&input, &config, speed),
        Command::Dashboard {
            input,
            config,
            refresh_ms,
        } => run_dashboard(&input, &config, refresh_ms),
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

/// Install the global subscriber. Later calls are no-ops.
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .try_init();
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, TicksimError> {
    eprintln!("Loading config from {}", path.display());
    FileConfigAdapter::from_file(path)
}

/// `[engine]` and `[features]` values after defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    pub symbol: String,
    pub tick_size: f64,
    pub size: i64,
    pub window: usize,
}

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), TicksimError> {
    validate_engine_config(config)?;
    validate_risk_config(config)?;
    validate_strategy_config(config)?;
    Ok(())
}

pub fn build_engine_settings(config: &dyn ConfigPort) -> EngineSettings {
    EngineSettings {
        symbol: config
            .get_string("engine", "symbol")
            .unwrap_or_default()
            .trim()
            .to_string(),
        tick_size: config.get_double("engine", "tick_size", 0.0),
        size: config.get_int("engine", "size", 1),
        window: non_negative(config.get_int("features", "window", DEFAULT_WINDOW as i64)),
    }
}

/// `[risk]` values; a missing or zero tick size falls back to the engine's.
pub fn build_risk_settings(config: &dyn ConfigPort, engine_tick_size: f64) -> RiskSettings {
    let mut tick_size = config.get_double("risk", "tick_size", 0.0);
    if tick_size == 0.0 && engine_tick_size > 0.0 {
        tick_size = engine_tick_size;
    }
    RiskSettings {
        daily_stop_loss: config.get_double("risk", "daily_stop_loss", 0.0),
        per_trade_stop_ticks: config.get_int("risk", "per_trade_stop_ticks", 0),
        breakeven_ticks: config.get_int("risk", "breakeven_ticks", 0),
        breakeven_plus: config.get_int("risk", "breakeven_plus", 0),
        trailing_ticks: config.get_int("risk", "trailing_ticks", 0),
        tick_size,
        max_daily_trades: non_negative(config.get_int("risk", "max_daily_trades", 0)),
    }
}

pub fn build_strategy(config: &dyn ConfigPort) -> Result<Strategy, TicksimError> {
    let name = config
        .get_string("strategy", "name")
        .ok_or_else(|| TicksimError::ConfigMissing {
            section: "strategy".into(),
            key: "name".into(),
        })?
        .trim()
        .to_lowercase();

    let strategy = match name.as_str() {
        "breakout" => BreakoutConfig {
            lookback: non_negative(config.get_int("strategy", "lookback", 0)),
            min_range: config.get_double("strategy", "min_range", 0.0),
            confidence: config.get_double("strategy", "confidence", 0.0),
        }
        .into(),
        "mean_reversion" => MeanReversionConfig {
            lookback: non_negative(config.get_int("strategy", "lookback", 0)),
            z_threshold: config.get_double("strategy", "z_threshold", 0.0),
        }
        .into(),
        "delta_trend" => DeltaTrendConfig {
            delta_threshold: config.get_double("strategy", "delta_threshold", 0.0),
            profile_skew: config.get_double("strategy", "profile_skew", 0.0),
            min_volume: config.get_double("strategy", "min_volume", 0.0),
        }
        .into(),
        _ => return Err(TicksimError::UnknownStrategy { name }),
    };
    Ok(strategy)
}

/// Validate `config` and assemble an engine around a [`MockBroker`].
pub fn build_engine(config: &dyn ConfigPort) -> Result<Engine, TicksimError> {
    validate_config(config)?;
    let settings = build_engine_settings(config);
    let risk = build_risk_settings(config, settings.tick_size);
    let strategy = build_strategy(config)?;
    info!(
        strategy = %strategy,
        symbol = %settings.symbol,
        tick_size = settings.tick_size,
        size = settings.size,
        "engine configured"
    );

    Engine::builder()
        .strategy(strategy)
        .venue(MockBroker::new())
        .evaluator(Evaluator::new())
        .risk(RiskManager::new(risk))
        .features(FeatureEngine::standard(settings.window))
        .trade_size(settings.size)
        .symbol(settings.symbol)
        .build()
}

fn non_negative(value: i64) -> usize {
    usize::try_from(value).unwrap_or(0)
}

/// Feed every tick of `stream` to the engine, stopping at the first error.
pub fn drive(engine: &mut Engine, stream: TickStream) -> Result<usize, TicksimError> {
    let mut count = 0usize;
    for item in stream {
        engine.on_tick(&item?)?;
        count += 1;
    }
    debug!(ticks = count, "stream drained");
    Ok(count)
}

pub fn summary_lines(summary: &Summary) -> [String; 2] {
    [
        format!(
            "Trades: {} Wins: {} Losses: {} WinRate: {:.2} Expectancy: {:.2} MaxDD: {:.2}",
            summary.total_trades,
            summary.wins,
            summary.losses,
            summary.win_rate,
            summary.expectancy,
            summary.max_drawdown
        ),
        format!("Win/Loss Distribution: {}", summary.distribution),
    ]
}

pub fn dashboard_line(snapshot: &EngineSnapshot) -> String {
    let pos = if snapshot.position.open {
        snapshot.position.direction.to_string()
    } else {
        "FLAT".to_string()
    };
    format!(
        "POS: {} Trades: {} WinRate: {:.2} Expectancy: {:.2} DailyPnL: {:.2}",
        pos,
        snapshot.summary.total_trades,
        snapshot.summary.win_rate,
        snapshot.summary.expectancy,
        snapshot.daily_pnl
    )
}

fn run_ingest(input: &Path, output: &Path) -> Result<(), TicksimError> {
    eprintln!("Ingesting {} into {}", input.display(), output.display());
    let reader = CsvTickReader::new(input);
    let written = TickStore::new(output).ingest(reader.stream())?;
    eprintln!("Ingested {written} ticks");
    Ok(())
}

fn run_features(input: &Path, output: &Path, window: usize) -> Result<(), TicksimError> {
    let ticks = TickStore::new(input).load_all()?;
    let mut features = FeatureEngine::standard(window);
    let sets: Vec<_> = ticks.iter().map(|t| features.build(t)).collect();
    let labels = next_close_labels(&ticks);
    export_features(output, &sets, |i, _| labels.get(i).copied().unwrap_or(0))?;
    eprintln!("Wrote {} feature rows to {}", sets.len(), output.display());
    Ok(())
}

fn run_replay(input: &Path, speed: f64) -> Result<(), TicksimError> {
    let ticks = TickStore::new(input).load_all()?;
    ReplayPacer::new(speed).run(&ticks, |tick| {
        println!(
            "{} {:.2} {} {}",
            tick.timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            tick.close,
            tick.volume,
            tick.session
        );
    });
    Ok(())
}

fn run_simulation(input: &Path, config_path: &Path) -> Result<(), TicksimError> {
    let config = load_config(config_path)?;
    let mut engine = build_engine(&config)?;
    eprintln!("Running {} on {}", engine.strategy().name(), input.display());

    let ticks = drive(&mut engine, TickStore::new(input).stream())?;
    engine.flush(FLUSH_REASON)?;
    eprintln!("Processed {ticks} ticks");

    for line in summary_lines(&engine.summary()) {
        println!("{line}");
    }
    Ok(())
}

fn run_live(input: &Path, config_path: &Path, speed: f64) -> Result<(), TicksimError> {
    let config = load_config(config_path)?;
    let mut engine = build_engine(&config)?;
    let stream = ReplayPacer::new(speed).pace(TickStore::new(input).stream());

    drive(&mut engine, stream)?;
    engine.flush(FLUSH_REASON)?;
    println!("{}", dashboard_line(&engine.snapshot()));
    Ok(())
}

/// Cheap fingerprint of what the dashboard shows, to avoid resending unchanged state.
fn dashboard_key(engine: &Engine) -> (bool, String, usize, usize, u64) {
    (
        engine.position().open,
        engine.position().direction.to_string(),
        engine.evaluator().trades().len(),
        engine.risk().daily_trades,
        engine.risk().daily_pnl.to_bits(),
    )
}

fn run_dashboard(input: &Path, config_path: &Path, refresh_ms: u64) -> Result<(), TicksimError> {
    let config = load_config(config_path)?;
    let mut engine = build_engine(&config)?;
    let refresh = Duration::from_millis(refresh_ms.max(1));

    let (tx, rx) = mpsc::channel::<EngineSnapshot>();
    let reporter = thread::spawn(move || {
        let mut latest: Option<EngineSnapshot> = None;
        let mut next = Instant::now() + refresh;
        loop {
            match rx.recv_timeout(next.saturating_duration_since(Instant::now())) {
                Ok(snapshot) => latest = Some(snapshot),
                Err(RecvTimeoutError::Timeout) => {
                    if let Some(snapshot) = &latest {
                        println!("{}", dashboard_line(snapshot));
                    }
                    next = Instant::now() + refresh;
                }
                Err(RecvTimeoutError::Disconnected) => return,
            }
        }
    });

    let _ = tx.send(engine.snapshot());
    let mut last_key = dashboard_key(&engine);
    let mut result = Ok(());
    for item in TickStore::new(input).stream() {
        let step = item.and_then(|tick| engine.on_tick(&tick));
        if let Err(e) = step {
            result = Err(e);
            break;
        }
        let key = dashboard_key(&engine);
        if key != last_key {
            let _ = tx.send(engine.snapshot());
            last_key = key;
        }
    }
    drop(tx);
    let _ = reporter.join();

    result?;
    println!("{}", dashboard_line(&engine.snapshot()));
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), TicksimError> {
    let config = load_config(config_path)?;
    let engine = build_engine(&config)?;
    let risk = &engine.risk().settings;

    eprintln!("Config validated successfully");
    eprintln!("\nEngine:");
    eprintln!("  symbol:    {}", engine.symbol());
    eprintln!("  strategy:  {}", engine.strategy());
    eprintln!("\nRisk:");
    eprintln!("  daily_stop_loss:      {:.2}", risk.daily_stop_loss);
    eprintln!("  per_trade_stop_ticks: {}", risk.per_trade_stop_ticks);
    eprintln!("  breakeven_ticks:      {} (+{})", risk.breakeven_ticks, risk.breakeven_plus);
    eprintln!("  trailing_ticks:       {}", risk.trailing_ticks);
    eprintln!("  max_daily_trades:     {}", risk.max_daily_trades);
    eprintln!("  tick_size:            {}", risk.tick_size);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::position::{Direction, Position};

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    #[test]
    fn risk_tick_size_falls_back_to_engine() {
        let config = make_config("[risk]\nper_trade_stop_ticks = 4\n");
        let risk = build_risk_settings(&config, 0.25);
        assert_eq!(risk.tick_size, 0.25);
        assert_eq!(risk.per_trade_stop_ticks, 4);

        let config = make_config("[risk]\ntick_size = 0.5\n");
        assert_eq!(build_risk_settings(&config, 0.25).tick_size, 0.5);
    }

    #[test]
    fn engine_settings_defaults() {
        let settings = build_engine_settings(&make_config("[engine]\nsymbol = NQ \ntick_size = 0.25\n"));
        assert_eq!(
            settings,
            EngineSettings {
                symbol: "NQ".into(),
                tick_size: 0.25,
                size: 1,
                window: DEFAULT_WINDOW,
            }
        );
    }

    #[test]
    fn build_strategy_by_name() {
        let s = build_strategy(&make_config("[strategy]\nname = Mean_Reversion\nlookback = 12\nz_threshold = 1.5\n")).unwrap();
        assert_eq!(s.name(), "mean_reversion");
        assert_eq!(s.to_string(), "mean_reversion(lookback=12, z_threshold=1.5)");

        let err = build_strategy(&make_config("[strategy]\nname = grid\n")).unwrap_err();
        assert!(matches!(err, TicksimError::UnknownStrategy { .. }));
    }

    #[test]
    fn dashboard_line_format() {
        let snapshot = EngineSnapshot {
            position: Position {
                open: true,
                direction: Direction::Short,
                ..Position::default()
            },
            summary: Summary {
                total_trades: 3,
                win_rate: 2.0 / 3.0,
                expectancy: 12.5,
                ..Summary::default()
            },
            daily_pnl: -40.0,
            daily_trades: 3,
            halted: false,
        };
        assert_eq!(
            dashboard_line(&snapshot),
            "POS: SHORT Trades: 3 WinRate: 0.67 Expectancy: 12.50 DailyPnL: -40.00"
        );
    }

    #[test]
    fn summary_line_format() {
        let [first, second] = summary_lines(&Summary::default());
        assert_eq!(
            first,
            "Trades: 0 Wins: 0 Losses: 0 WinRate: 0.00 Expectancy: 0.00 MaxDD: 0.00"
        );
        assert!(second.starts_with("Win/Loss Distribution: loss_small:0"));
    }

    #[test]
    fn cli_parses_subcommands() {
        let cli = Cli::try_parse_from([
            "ticksim", "--log-level", "debug", "dashboard", "-i", "t.jsonl", "-c", "c.ini",
            "--refresh-ms", "500",
        ])
        .unwrap();
        assert_eq!(cli.log_level, "debug");
        assert!(matches!(cli.command, Command::Dashboard { refresh_ms: 500, .. }));

        let cli = Cli::try_parse_from(["ticksim", "replay", "--input", "t.jsonl"]).unwrap();
        assert!(matches!(cli.command, Command::Replay { speed, .. } if speed == 50.0));
    }
}
