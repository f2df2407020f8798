//! Pricing simulator CLI.
//!
//! Runs the Thompson Sampling agent against a simulated market and prints
//! what it learned.
//!
//! Usage:
//!   cargo run --bin simulate -- [OPTIONS]
//!
//! Examples:
//!   cargo run --bin simulate                          # Default market, 2000 days
//!   cargo run --bin simulate -- --seed 42             # Reproducible run
//!   cargo run --bin simulate -- --runs 50 --seed 1    # 50 parallel replications
//!   cargo run --bin simulate -- --config market.json --csv history.csv

use clap::Parser;
use pricebandit::build_info::version_string;
use pricebandit::simulator::{
    run_replications, run_simulation, ReplicationSummary, SimConfig, SimReport,
};
use pricebandit::PricingError;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "simulate", about = "Thompson Sampling price optimization simulator")]
struct Cli {
    /// JSON config file; flags below override its fields
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of rounds (customers)
    #[arg(short, long)]
    days: Option<u32>,

    /// Random seed for reproducibility
    #[arg(short, long)]
    seed: Option<u64>,

    /// Product cost
    #[arg(long)]
    cost: Option<f64>,

    /// Price at which demand is exactly 50%
    #[arg(long)]
    true_value: Option<f64>,

    /// Demand decay rate above the true value
    #[arg(long)]
    sensitivity: Option<f64>,

    /// Candidate prices, comma separated
    #[arg(short, long, value_delimiter = ',')]
    prices: Option<Vec<f64>>,

    /// Run N independent replications in parallel
    #[arg(short = 'n', long, default_value_t = 1)]
    runs: u32,

    /// Save the report as JSON
    #[arg(long)]
    json: bool,

    /// Write the round-by-round history as CSV (single run only)
    #[arg(long, conflicts_with = "runs")]
    csv: Option<PathBuf>,

    /// Only print the final report
    #[arg(short, long)]
    quiet: bool,

    /// Print version and build info
    #[arg(short = 'V', long)]
    version: bool,
}

impl Cli {
    /// Output flags that only make sense for a single run.
    fn check_outputs(&self) -> pricebandit::Result<()> {
        if self.runs > 1 && self.csv.is_some() {
            return Err(PricingError::config("--csv requires a single run"));
        }
        Ok(())
    }

    fn to_config(&self) -> pricebandit::Result<SimConfig> {
        let mut config = match &self.config {
            Some(path) => SimConfig::from_json_file(path)?,
            None => SimConfig::default(),
        };
        if let Some(days) = self.days {
            config.days = days;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if let Some(cost) = self.cost {
            config.product_cost = cost;
        }
        if let Some(true_value) = self.true_value {
            config.true_value = true_value;
        }
        if let Some(sensitivity) = self.sensitivity {
            config.sensitivity = sensitivity;
        }
        if let Some(prices) = &self.prices {
            config.prices = prices.clone();
        }
        if self.quiet {
            config.progress_interval = 0;
        }
        config.validate()?;
        Ok(config)
    }
}

fn init_logging(quiet: bool) {
    let default = if quiet { "warn" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn save_json(json: &str) -> pricebandit::Result<String> {
    let filename = format!(
        "pricing_report_{}.json",
        chrono::Utc::now().format("%Y%m%d_%H%M%S")
    );
    std::fs::write(&filename, json)?;
    Ok(filename)
}

fn run(cli: &Cli) -> pricebandit::Result<()> {
    cli.check_outputs()?;
    let config = cli.to_config()?;

    info!(
        days = config.days,
        cost = config.product_cost,
        prices = ?config.prices,
        seed = ?config.seed,
        runs = cli.runs,
        "starting simulation"
    );

    if cli.runs > 1 {
        let results = run_replications(&config, cli.runs)?;
        let summary = ReplicationSummary::from_results(&config, &results)?;
        println!("{}", summary.to_text());
        if cli.json {
            let filename = save_json(&summary.to_json())?;
            println!("JSON report saved to: {}", filename);
        }
        return Ok(());
    }

    let result = run_simulation(&config)?;
    let report = SimReport::from_result(&config, &result)?;
    println!("{}", report.to_text());

    if let Some(path) = &cli.csv {
        result.history.write_csv(BufWriter::new(File::create(path)?))?;
        println!("History written to: {}", path.display());
    }
    if cli.json {
        let filename = save_json(&report.to_json())?;
        println!("JSON report saved to: {}", filename);
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.version {
        println!("simulate {}", version_string());
        return ExitCode::SUCCESS;
    }

    init_logging(cli.quiet);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_rejected_with_replications() {
        assert!(Cli::try_parse_from(["simulate", "--runs", "5", "--csv", "out.csv"]).is_err());
        assert!(Cli::try_parse_from(["simulate", "-n", "5", "--csv", "out.csv"]).is_err());
    }

    #[test]
    fn test_csv_accepted_for_single_run() {
        let cli = Cli::try_parse_from(["simulate", "--csv", "out.csv"]).unwrap();
        assert_eq!(cli.runs, 1);
        cli.check_outputs().unwrap();
    }

    #[test]
    fn test_check_outputs_rejects_csv_with_replications() {
        let mut cli = Cli::try_parse_from(["simulate", "--csv", "out.csv"]).unwrap();
        cli.runs = 3;
        assert!(matches!(
            cli.check_outputs(),
            Err(PricingError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "simulate", "--days", "50", "--seed", "3", "--prices", "40,45", "--quiet",
        ])
        .unwrap();
        let config = cli.to_config().unwrap();
        assert_eq!(config.days, 50);
        assert_eq!(config.seed, Some(3));
        assert_eq!(config.prices, vec![40.0, 45.0]);
        assert_eq!(config.progress_interval, 0);
    }
}
