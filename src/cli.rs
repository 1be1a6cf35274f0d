//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_report_adapter::JsonReportAdapter;
use crate::adapters::synthetic_market_adapter::{MarketConfig, SyntheticMarketAdapter};
use crate::adapters::tracing_observer::TracingObserver;
use crate::domain::company::Company;
use crate::domain::config_validation::{
    parse_trader_names, read_date, read_number, validate_market_config,
    validate_simulation_config, validate_traders_config,
};
use crate::domain::error::TradesimError;
use crate::domain::evaluator::PortfolioEvaluator;
use crate::domain::market::MarketSnapshot;
use crate::domain::predictor::PredictorKind;
use crate::domain::report::SimulationReport;
use crate::domain::simulation::{
    PredictorSettings, SimulationConfig, TraderKind, TraderSettings, build_pairings,
};
use crate::ports::config_port::ConfigPort;
use crate::ports::market_data_port::MarketDataPort;
use crate::ports::observer_port::EvaluationObserver;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "tradesim", about = "Didactic stock trading simulator")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run every configured trader over the simulated market
    Simulate {
        #[arg(short, long)]
        config: PathBuf,
        /// Write a JSON report here
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Rows to simulate, counting the baseline
        #[arg(long, conflicts_with = "start_date")]
        offset: Option<usize>,
        /// First trading day (YYYY-MM-DD)
        #[arg(long)]
        start_date: Option<NaiveDate>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Simulate {
            config,
            output,
            offset,
            start_date,
            dry_run,
        } => {
            if dry_run {
                run_dry_run(&config)
            } else {
                run_simulate(&config, output.as_deref(), offset, start_date)
            }
        }
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })
}

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), TradesimError> {
    validate_simulation_config(config)?;
    validate_market_config(config)?;
    validate_traders_config(config)?;
    Ok(())
}

pub fn build_simulation_config(config: &dyn ConfigPort) -> Result<SimulationConfig, TradesimError> {
    let defaults = SimulationConfig::default();
    Ok(SimulationConfig {
        initial_cash: read_number(config, "simulation", "initial_cash")?
            .unwrap_or(defaults.initial_cash),
        evaluation_offset: read_number(config, "simulation", "evaluation_offset")?,
        start_date: read_date(config, "simulation", "start_date")?,
        risk_free_rate: read_number(config, "simulation", "risk_free_rate")?
            .unwrap_or(defaults.risk_free_rate),
    })
}

pub fn build_market_config(config: &dyn ConfigPort) -> Result<MarketConfig, TradesimError> {
    let defaults = MarketConfig::default();

    let mut initial_prices = BTreeMap::new();
    for company in Company::ALL {
        let key = format!("initial_price_{}", company.id().to_lowercase());
        let default = defaults.initial_prices.get(&company).copied().unwrap_or(100.0);
        initial_prices.insert(company, read_number(config, "market", &key)?.unwrap_or(default));
    }

    Ok(MarketConfig {
        start_date: read_date(config, "market", "start_date")?.unwrap_or(defaults.start_date),
        days: read_number(config, "market", "days")?.unwrap_or(defaults.days),
        seed: read_number(config, "market", "seed")?.unwrap_or(defaults.seed),
        initial_prices,
        drift: read_number(config, "market", "drift")?.unwrap_or(defaults.drift),
        volatility: read_number(config, "market", "volatility")?.unwrap_or(defaults.volatility),
    })
}

pub fn build_trader_settings(
    config: &dyn ConfigPort,
) -> Result<Vec<TraderSettings>, TradesimError> {
    parse_trader_names(config)?
        .into_iter()
        .map(|name| read_trader_settings(config, name))
        .collect()
}

fn read_trader_settings(
    config: &dyn ConfigPort,
    name: String,
) -> Result<TraderSettings, TradesimError> {
    let section = name.as_str();
    let kind_str = config
        .get_string(section, "kind")
        .ok_or_else(|| TradesimError::ConfigMissing {
            section: name.clone(),
            key: "kind".to_string(),
        })?;
    let kind: TraderKind = kind_str.parse().map_err(|reason| TradesimError::ConfigInvalid {
        section: name.clone(),
        key: "kind".to_string(),
        reason,
    })?;

    let mut settings = TraderSettings::new(name.clone(), kind);
    let predictor_defaults = PredictorSettings::default();
    let predictor_kind = match config.get_string(section, "predictor") {
        Some(s) => s
            .parse::<PredictorKind>()
            .map_err(|reason| TradesimError::ConfigInvalid {
                section: name.clone(),
                key: "predictor".to_string(),
                reason,
            })?,
        None => predictor_defaults.kind,
    };
    let seed = read_number(config, section, "seed")?.unwrap_or(predictor_defaults.seed);

    settings.predictor = PredictorSettings {
        kind: predictor_kind,
        lookback: read_number(config, section, "lookback")?.unwrap_or(predictor_defaults.lookback),
        max_change: read_number(config, section, "max_change")?
            .unwrap_or(predictor_defaults.max_change),
        seed,
    };
    settings.threshold = read_number(config, section, "threshold")?.unwrap_or(settings.threshold);
    settings.trade_fraction =
        read_number(config, section, "trade_fraction")?.unwrap_or(settings.trade_fraction);

    let q = &mut settings.q_learning;
    q.alpha = read_number(config, section, "alpha")?.unwrap_or(q.alpha);
    q.gamma = read_number(config, section, "gamma")?.unwrap_or(q.gamma);
    q.epsilon = read_number(config, section, "epsilon")?.unwrap_or(q.epsilon);
    q.epsilon_decay = read_number(config, section, "epsilon_decay")?.unwrap_or(q.epsilon_decay);
    q.epsilon_min = read_number(config, section, "epsilon_min")?.unwrap_or(q.epsilon_min);
    q.memory_size = read_number(config, section, "memory_size")?.unwrap_or(q.memory_size);
    q.batch_size = read_number(config, section, "batch_size")?.unwrap_or(q.batch_size);
    q.seed = seed;

    Ok(settings)
}

/// Runs every trader over `market` and assembles the report.
pub fn run_simulation_pipeline(
    simulation: &SimulationConfig,
    market: &MarketSnapshot,
    trader_settings: &[TraderSettings],
    observer: Box<dyn EvaluationObserver>,
) -> Result<SimulationReport, TradesimError> {
    let pairings = build_pairings(trader_settings, simulation.initial_cash, market)?;
    let mut evaluator = PortfolioEvaluator::new(pairings)?.with_observer(observer);

    let trajectories = match simulation.start_date {
        Some(date) => evaluator.inspect_over_time_with_start_date(market, date)?,
        None => evaluator.inspect_over_time(market, simulation.evaluation_offset)?,
    };
    SimulationReport::build(&trajectories, market, simulation.risk_free_rate)
}

fn run_simulate(
    config_path: &Path,
    output_path: Option<&Path>,
    offset_override: Option<usize>,
    start_date_override: Option<NaiveDate>,
) -> ExitCode {
    match simulate(config_path, output_path, offset_override, start_date_override) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn simulate(
    config_path: &Path,
    output_path: Option<&Path>,
    offset_override: Option<usize>,
    start_date_override: Option<NaiveDate>,
) -> Result<(), TradesimError> {
    // Stage 1: Load and validate config
    eprintln!("Loading config from {}", config_path.display());
    let adapter = FileConfigAdapter::from_file(config_path)?;
    validate_config(&adapter)?;

    // Stage 2: Resolve run parameters; command line wins over the file
    let mut simulation = build_simulation_config(&adapter)?;
    if let Some(offset) = offset_override {
        simulation.evaluation_offset = Some(offset);
        simulation.start_date = None;
    }
    if let Some(date) = start_date_override {
        simulation.start_date = Some(date);
        simulation.evaluation_offset = None;
    }
    let trader_settings = build_trader_settings(&adapter)?;

    // Stage 3: Generate market
    let market_config = build_market_config(&adapter)?;
    let market = SyntheticMarketAdapter::new(market_config).load_market()?;

    // Stage 4: Evaluate
    eprintln!(
        "Simulating {} traders over {} days...",
        trader_settings.len(),
        market.row_count()
    );
    let report = run_simulation_pipeline(
        &simulation,
        &market,
        &trader_settings,
        Box::new(TracingObserver),
    )?;
    print_summary(&report);

    // Stage 5: Report
    if let Some(output) = output_path {
        JsonReportAdapter::new().write(&report, output)?;
        eprintln!("\nReport written to: {}", output.display());
    }
    Ok(())
}

pub fn print_summary(report: &SimulationReport) {
    if let (Some(first), Some(last)) = (report.first_date, report.last_date) {
        println!("\n=== Results {} to {} ===", first, last);
    }
    println!(
        "{:<16} {:>12} {:>10} {:>8} {:>8} {:>9}",
        "Trader", "Final Value", "Return", "Sharpe", "Sortino", "Max DD"
    );
    for trader in &report.traders {
        let m = &trader.metrics;
        println!(
            "{:<16} {:>12.2} {:>9.2}% {:>8.2} {:>8.2} {:>8.1}%",
            trader.name,
            m.final_value,
            m.total_return * 100.0,
            m.sharpe_ratio,
            m.sortino_ratio,
            -m.max_drawdown * 100.0
        );
    }
    if let Some(best) = report.best() {
        println!("\nBest trader: {}", best.name);
    }
}

pub fn run_dry_run(config_path: &Path) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    eprintln!("Config validated successfully");

    let plan = build_simulation_config(&adapter).and_then(|simulation| {
        Ok((
            simulation,
            build_market_config(&adapter)?,
            build_trader_settings(&adapter)?,
        ))
    });
    let (simulation, market, trader_settings) = match plan {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    eprintln!("\nSimulation:");
    eprintln!("  initial cash: {:.2}", simulation.initial_cash);
    match (simulation.evaluation_offset, simulation.start_date) {
        (Some(offset), _) => eprintln!("  evaluation offset: {}", offset),
        (None, Some(date)) => eprintln!("  start date: {}", date),
        (None, None) => eprintln!("  evaluation window: all rows"),
    }

    eprintln!("\nMarket:");
    eprintln!(
        "  {} days from {} (seed {})",
        market.days, market.start_date, market.seed
    );
    for (company, price) in &market.initial_prices {
        eprintln!("  {}: starts at {:.2}", company, price);
    }

    eprintln!("\nTraders:");
    for settings in &trader_settings {
        match settings.kind {
            TraderKind::BuyAndHold => eprintln!("  {} ({})", settings.name, settings.kind),
            _ => eprintln!(
                "  {} ({}, predictor {})",
                settings.name, settings.kind, settings.predictor.kind
            ),
        }
    }

    eprintln!("\nDry run complete: configuration is valid");
    ExitCode::SUCCESS
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    match validate_config(&adapter) {
        Ok(()) => {
            eprintln!("Config is valid");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;
    use crate::ports::observer_port::NullObserver;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    #[test]
    fn cli_parses_simulate() {
        let cli = Cli::try_parse_from([
            "tradesim", "simulate", "--config", "sim.ini", "--offset", "30", "-o", "out.json",
        ])
        .unwrap();
        match cli.command {
            Command::Simulate {
                config,
                output,
                offset,
                start_date,
                dry_run,
            } => {
                assert_eq!(config, PathBuf::from("sim.ini"));
                assert_eq!(output, Some(PathBuf::from("out.json")));
                assert_eq!(offset, Some(30));
                assert!(start_date.is_none());
                assert!(!dry_run);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn cli_rejects_offset_with_start_date() {
        let result = Cli::try_parse_from([
            "tradesim", "simulate", "-c", "sim.ini", "--offset", "3", "--start-date", "2020-01-05",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn cli_parses_start_date() {
        let cli = Cli::try_parse_from([
            "tradesim", "simulate", "-c", "sim.ini", "--start-date", "2020-01-05",
        ])
        .unwrap();
        let Command::Simulate { start_date, .. } = cli.command else {
            panic!("expected simulate");
        };
        assert_eq!(start_date, NaiveDate::from_ymd_opt(2020, 1, 5));
    }

    #[test]
    fn simulation_config_defaults() {
        let sim = build_simulation_config(&make_config("[simulation]\n")).unwrap();
        assert_eq!(sim, SimulationConfig::default());
    }

    #[test]
    fn market_config_reads_prices() {
        let market = build_market_config(&make_config(
            "[market]\ndays = 40\ninitial_price_company_a = 12.5\nvolatility = 0\n",
        ))
        .unwrap();
        assert_eq!(market.days, 40);
        assert_eq!(market.initial_prices[&Company::CompanyA], 12.5);
        assert_eq!(market.initial_prices[&Company::CompanyB], 50.0);
        assert_eq!(market.volatility, 0.0);
    }

    #[test]
    fn trader_settings_follow_sections() {
        let trader_settings = build_trader_settings(&make_config(
            r#"
[traders]
names = Keeper, Learner

[Keeper]
kind = buy_and_hold

[Learner]
kind = q_learning
predictor = linear_trend
lookback = 7
seed = 5
epsilon = 0.3
batch_size = 4
"#,
        ))
        .unwrap();
        assert_eq!(trader_settings.len(), 2);
        assert_eq!(trader_settings[0].name, "Keeper");
        assert_eq!(trader_settings[0].kind, TraderKind::BuyAndHold);

        let learner = &trader_settings[1];
        assert_eq!(learner.kind, TraderKind::QLearning);
        assert_eq!(learner.predictor.kind, PredictorKind::LinearTrend);
        assert_eq!(learner.predictor.lookback, 7);
        assert_eq!(learner.q_learning.seed, 5);
        assert_eq!(learner.q_learning.epsilon, 0.3);
        assert_eq!(learner.q_learning.batch_size, 4);
    }

    #[test]
    fn pipeline_produces_one_result_per_trader() {
        let config = make_config(
            r#"
[simulation]
initial_cash = 1000
evaluation_offset = 20

[market]
days = 60
seed = 1

[traders]
names = hold, trust

[hold]
kind = buy_and_hold

[trust]
kind = trusting
predictor = perfect
"#,
        );
        validate_config(&config).unwrap();
        let simulation = build_simulation_config(&config).unwrap();
        let market = SyntheticMarketAdapter::new(build_market_config(&config).unwrap())
            .load_market()
            .unwrap();
        let trader_settings = build_trader_settings(&config).unwrap();

        let report = run_simulation_pipeline(
            &simulation,
            &market,
            &trader_settings,
            Box::new(NullObserver),
        )
        .unwrap();
        assert_eq!(report.traders.len(), 2);
        for trader in &report.traders {
            assert_eq!(trader.trajectory.len(), 20);
            assert_eq!(trader.metrics.trading_days, 19);
        }
    }
}
