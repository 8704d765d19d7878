use clap::{Parser, Subcommand};
use econ_pulse_collectors::CollectorSet;
use econ_pulse_core::PulseConfig;
use econ_pulse_metrics::MetricsCalculator;
use econ_pulse_store::TsdbClient;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "econ-pulse")]
#[command(about = "Macro economic data collection pipeline", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "econ-pulse.toml", global = true)]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every registered collector once
    CollectAll,
    /// Run only the named collectors (e.g. "treasury fred")
    Collect {
        /// Collector names, space separated
        #[arg(required = true)]
        sources: Vec<String>,
    },
    /// List registered collector names and exit
    Sources,
    /// Compute derived metrics from already-collected data
    Metrics,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = PulseConfig::load_from(&cli.config)?;

    match cli.command {
        Commands::CollectAll => {
            let set = build_collector_set(&config)?;
            print_summary(&set.collect_all().await);
        }
        Commands::Collect { sources } => {
            let set = build_collector_set(&config)?;
            print_summary(&set.collect_subset(&sources).await);
        }
        Commands::Sources => {
            let set = build_collector_set(&config)?;
            for name in set.names() {
                println!("{name}");
            }
        }
        Commands::Metrics => {
            run_metrics(&config).await?;
        }
    }

    Ok(())
}

fn build_collector_set(config: &PulseConfig) -> anyhow::Result<CollectorSet> {
    let client = Arc::new(TsdbClient::new((&config.store).into())?);
    Ok(CollectorSet::from_config(config, client)?)
}

async fn run_metrics(config: &PulseConfig) -> anyhow::Result<()> {
    let client = Arc::new(TsdbClient::new((&config.store).into())?);
    let calculator = MetricsCalculator::new(
        client.clone(),
        client,
        &config.store.bucket,
        &config.store.metrics_bucket,
    );

    let summary = calculator.run_all().await;
    for (stage, count) in &summary.points {
        println!("{stage}: {count}");
    }
    if !summary.failed_stages.is_empty() {
        anyhow::bail!("failed stages: {}", summary.failed_stages.join(", "));
    }
    Ok(())
}

fn print_summary(summary: &econ_pulse_collectors::RunSummary) {
    for (source, code) in summary {
        if *code < 0 {
            println!("{source}: FAILED");
        } else {
            println!("{source}: {code} points");
        }
    }
}
