mod app;
mod config;
mod csv_log;
mod error;
mod models;
mod nvidia;
mod sampler;
mod shutdown;
mod top;

use clap::Parser;
use env_logger::Env;
use log::{error, info};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::app::{App, RunSummary};
use crate::config::{Config, Preset};
use crate::csv_log::CsvLog;
use crate::error::CollectError;
use crate::models::{GpuSample, Record, TopSample};
use crate::sampler::CommandSampler;
use crate::shutdown::Shutdown;

#[derive(Parser)]
#[command(name = "metrics-csv-cli")]
#[command(about = "Poll nvidia-smi or top and append the readings to a CSV file", long_about = None)]
struct Args {
    /// Collector to run
    #[arg(value_enum)]
    preset: Preset,

    /// CSV file to append to (default depends on the preset)
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Seconds between samples (default depends on the preset)
    #[arg(short, long, value_name = "SECONDS", value_parser = clap::value_parser!(u64).range(1..))]
    interval: Option<u64>,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = match Config::for_preset(args.preset, args.output) {
        Ok(config) => config.with_interval(args.interval),
        Err(err) => {
            error!("{err}");
            return ExitCode::from(err.exit_code());
        }
    };

    match run(&config).await {
        Ok(RunSummary { cycles, rows }) => {
            info!("stopped after {cycles} cycles, {rows} rows written");
            println!("data saved to {}", config.output.display());
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{err}");
            ExitCode::from(err.exit_code())
        }
    }
}

async fn run(config: &Config) -> Result<RunSummary, CollectError> {
    let (trigger, mut stop) = shutdown::channel();
    shutdown::listen(trigger);

    match config.preset {
        Preset::Gpu | Preset::GpuStress => {
            collect::<GpuSample>(nvidia::sampler(), config, &mut stop).await
        }
        Preset::Top => collect::<TopSample>(top::sampler(), config, &mut stop).await,
    }
}

async fn collect<R: Record>(
    sampler: CommandSampler,
    config: &Config,
    shutdown: &mut Shutdown,
) -> Result<RunSummary, CollectError> {
    let log = CsvLog::<R>::open(&config.output)?;
    info!(
        "{:?}: sampling `{}` every {}s",
        config.preset,
        sampler.program(),
        config.interval.as_secs()
    );
    let mut app = App::new(sampler, log, config.interval);
    app.run(shutdown).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn parses_preset_and_overrides() {
        let args = Args::try_parse_from(["metrics-csv-cli", "gpu-stress", "-o", "out.csv", "-i", "5"])
            .unwrap();
        assert_eq!(args.preset, Preset::GpuStress);
        assert_eq!(args.output, Some(PathBuf::from("out.csv")));
        assert_eq!(args.interval, Some(5));
    }

    #[test]
    fn rejects_zero_interval() {
        assert!(Args::try_parse_from(["metrics-csv-cli", "top", "--interval", "0"]).is_err());
    }

    #[test]
    fn requires_a_preset() {
        assert!(Args::try_parse_from(["metrics-csv-cli"]).is_err());
    }
}
