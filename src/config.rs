use clap::ValueEnum;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

/// Which collector to run, with its default output path and interval.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Preset {
    /// GPU metrics from nvidia-smi every second.
    Gpu,
    /// GPU metrics every minute into the home directory, for long stress runs.
    GpuStress,
    /// CPU and memory utilisation from top every second.
    Top,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub preset: Preset,
    pub output: PathBuf,
    pub interval: Duration,
}

impl Config {
    /// Resolves the preset, preferring an explicit `output` over the default path.
    ///
    /// `$HOME` is only consulted when the default path needs it.
    pub fn for_preset(preset: Preset, output: Option<PathBuf>) -> Result<Self, ConfigError> {
        Self::with_home(preset, output, || std::env::var_os("HOME").map(PathBuf::from))
    }

    fn with_home(
        preset: Preset,
        output: Option<PathBuf>,
        home: impl FnOnce() -> Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let output = match output {
            Some(output) => output,
            None => Self::default_output(preset, home)?,
        };
        let interval = match preset {
            Preset::Gpu | Preset::Top => Duration::from_secs(1),
            Preset::GpuStress => Duration::from_secs(60),
        };
        Ok(Self {
            preset,
            output,
            interval,
        })
    }

    fn default_output(
        preset: Preset,
        home: impl FnOnce() -> Option<PathBuf>,
    ) -> Result<PathBuf, ConfigError> {
        Ok(match preset {
            Preset::Gpu => PathBuf::from("gpu_check/result.csv"),
            Preset::GpuStress => home()
                .ok_or(ConfigError::NoHomeDir)?
                .join("gpu_stress_test_result.csv"),
            Preset::Top => PathBuf::from("top_check/result.csv"),
        })
    }

    pub fn with_interval(mut self, interval_secs: Option<u64>) -> Self {
        if let Some(secs) = interval_secs {
            self.interval = Duration::from_secs(secs);
        }
        self
    }
}
