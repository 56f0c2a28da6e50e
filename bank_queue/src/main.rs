use std::path::PathBuf;

use anyhow::Context;
use bank_queue::{DEFAULT_WAIT_THRESHOLD, QueueConfig, SummaryError, WaitSummary, sweep_mean_interarrival};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bank_queue")]
#[command(about = "Mobile-money desk queue simulation")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Simulate one session at the desk
    Run(ModelArgs),
    /// Simulate one session per mean interarrival time
    Sweep {
        #[command(flatten)]
        model: ModelArgs,
        /// Comma-separated mean interarrival times, e.g. 2,2.5,3
        #[arg(long, value_delimiter = ',', required = true)]
        means: Vec<f64>,
        #[arg(long)]
        threads: Option<usize>,
    },
}

#[derive(Args)]
struct ModelArgs {
    /// TOML file with horizon, mean_interarrival, service_range and seed
    #[arg(long)]
    config: Option<PathBuf>,
    /// Session length in minutes
    #[arg(long, allow_negative_numbers = true)]
    horizon: Option<f64>,
    #[arg(long, allow_negative_numbers = true)]
    mean_interarrival: Option<f64>,
    #[arg(long, allow_negative_numbers = true)]
    service_min: Option<f64>,
    #[arg(long, allow_negative_numbers = true)]
    service_max: Option<f64>,
    #[arg(long)]
    seed: Option<u64>,
    /// Waits longer than this count as long waits
    #[arg(long, default_value_t = DEFAULT_WAIT_THRESHOLD)]
    threshold: f64,
}

impl ModelArgs {
    fn config(&self) -> anyhow::Result<QueueConfig> {
        let mut config = match &self.config {
            Some(path) => QueueConfig::from_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => QueueConfig::default(),
        };
        if let Some(horizon) = self.horizon {
            config.horizon = horizon;
        }
        if let Some(mean) = self.mean_interarrival {
            config.mean_interarrival = mean;
        }
        if let Some(lower) = self.service_min {
            config.service_range.0 = lower;
        }
        if let Some(upper) = self.service_max {
            config.service_range.1 = upper;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        config.validate()?;
        Ok(config)
    }
}

fn run(args: &ModelArgs) -> anyhow::Result<()> {
    let config = args.config()?;
    tracing::info!(?config, "running desk simulation");
    let report = config.simulate()?;

    println!("Mobile-Money Desk Simulation");
    println!("  Horizon: {} minutes", config.horizon);
    println!("  Seed: {}", report.seed);
    match WaitSummary::from_waits(&report.waiting_times, args.threshold) {
        Ok(summary) => {
            println!("  Customers served: {}", summary.customers);
            println!("  Average waiting time (mins): {:.2}", summary.mean);
            println!("  Longest wait (mins): {:.2}", summary.max);
            println!(
                "  Customers waited > {} mins: {:.2}%",
                args.threshold,
                summary.share_over_threshold() * 100.0
            );
        }
        Err(SummaryError::InsufficientData) => {
            println!("  No customers were served before the horizon");
        }
    }
    Ok(())
}

fn sweep(args: &ModelArgs, means: &[f64], threads: Option<usize>) -> anyhow::Result<()> {
    let config = args.config()?;
    let points = sweep_mean_interarrival(&config, means, args.threshold, threads)?;

    println!("Mean interarrival sweep (horizon {} minutes)", config.horizon);
    for point in points {
        match point.outcome {
            Ok(summary) => println!(
                "  mean {:>6.2}: {:>4} customers, average wait {:>6.2}, waited > {}: {:>6.2}%",
                point.mean_interarrival,
                summary.customers,
                summary.mean,
                args.threshold,
                summary.share_over_threshold() * 100.0
            ),
            Err(reason) => println!("  mean {:>6.2}: {}", point.mean_interarrival, reason),
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match &cli.command {
        Command::Run(args) => run(args),
        Command::Sweep {
            model,
            means,
            threads,
        } => sweep(model, means, *threads),
    }
}
