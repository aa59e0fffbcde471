use anyhow::Result;
use clap::Parser;
use log::{error, info};
use std::path::PathBuf;

use trendlab::config::ExperimentConfig;
use trendlab::experiment::Experiment;
use trendlab::generator::SyntheticSource;
use trendlab::injector::AnomalyInjector;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON experiment configuration (defaults are used when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seed for generation and injection; overrides the config file
    #[arg(long)]
    seed: Option<u64>,

    /// Print the full report as JSON on stdout
    #[arg(long, default_value_t = false)]
    json: bool,

    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::builder()
        .format_timestamp(None)
        .filter_level(if args.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .init();

    let mut config = match &args.config {
        Some(path) => ExperimentConfig::from_file(path)?,
        None => ExperimentConfig::default(),
    };
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        std::process::exit(2);
    }

    let source = SyntheticSource::from_config(&config)?;
    // Injection draws from its own stream so it does not shift the noise.
    let injector =
        AnomalyInjector::from_config(&config.anomalies, config.seed.map(|s| s.wrapping_add(1)));

    let mut experiment = Experiment::new(source, injector, config)?;
    let report = experiment.run()?;

    for line in report.summary_lines() {
        info!("{}", line);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(())
}
