use chrono::{DateTime, SecondsFormat, Utc};
use std::io::BufRead;

use crate::error::ParseError;

/// A row type that can be parsed from a command's output and appended to a CSV log.
pub trait Record: Sized {
    /// Column names, written once when the log file is created.
    const HEADER: &'static [&'static str];

    /// Parses one invocation's raw output into zero or more records.
    fn parse(output: impl BufRead) -> Result<Vec<Self>, ParseError>;

    fn to_row(&self) -> Vec<String>;
}

/// One GPU line from `nvidia-smi`. Values are kept exactly as reported.
#[derive(Clone, Debug, PartialEq)]
pub struct GpuSample {
    pub timestamp: DateTime<Utc>,
    pub gpu_index: String,
    pub temperature_celsius: String,
    pub power_watts: String,
    pub memory_used_mib: String,
    pub gpu_util_percent: String,
}

/// System-wide CPU and memory utilisation from one `top` snapshot.
#[derive(Clone, Debug, PartialEq)]
pub struct TopSample {
    pub timestamp: DateTime<Utc>,
    pub cpu_util_percent: f64,
    pub mem_util_percent: f64,
}

pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
}

impl Record for GpuSample {
    const HEADER: &'static [&'static str] = &[
        "Time",
        "GPU Number",
        "GPU Temperature(℃)",
        "Power(W)",
        "Memory-Usage(MiB)",
        "GPU-Util(%)",
    ];

    fn parse(output: impl BufRead) -> Result<Vec<Self>, ParseError> {
        crate::nvidia::parse_output(output)
    }

    fn to_row(&self) -> Vec<String> {
        vec![
            format_timestamp(&self.timestamp),
            self.gpu_index.clone(),
            self.temperature_celsius.clone(),
            self.power_watts.clone(),
            self.memory_used_mib.clone(),
            self.gpu_util_percent.clone(),
        ]
    }
}

impl Record for TopSample {
    const HEADER: &'static [&'static str] = &["Time", "CPU Util", "Memory Util"];

    fn parse(output: impl BufRead) -> Result<Vec<Self>, ParseError> {
        crate::top::parse_output(output).map(|sample| vec![sample])
    }

    fn to_row(&self) -> Vec<String> {
        vec![
            format_timestamp(&self.timestamp),
            format!("{:.2}", self.cpu_util_percent),
            format!("{:.2}", self.mem_util_percent),
        ]
    }
}
