use chrono::Utc;
use log::warn;
use std::io::BufRead;

use crate::error::ParseError;
use crate::models::TopSample;
use crate::sampler::CommandSampler;

const CPU_MARKER: &str = "%Cpu(s):";
const MEM_MARKER: &str = "MiB Mem";

pub fn sampler() -> CommandSampler {
    CommandSampler::new("top", ["-bn1"])
}

/// Extracts overall CPU and memory utilisation from a `top -bn1` snapshot.
///
/// A missing marker line leaves that value at zero. A marker whose value
/// isn't a number fails the whole snapshot.
pub fn parse_output(output: impl BufRead) -> Result<TopSample, ParseError> {
    let mut cpu_util = None;
    let mut mem_util = None;

    for line in output.lines() {
        let line = line?;
        if line.contains(CPU_MARKER) {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if let Some(idle) = value_before(&fields, "id,")? {
                cpu_util = Some(100.0 - idle);
            }
        } else if line.contains(MEM_MARKER) {
            let fields: Vec<&str> = line.split_whitespace().collect();
            let total = value_before(&fields, "total,")?.unwrap_or(0.0);
            let free = value_before(&fields, "free,")?.unwrap_or(0.0);
            mem_util = Some(memory_utilization(total, free));
        }
    }

    if cpu_util.is_none() {
        warn!("no {CPU_MARKER:?} line in top output, reporting 0.00 cpu");
    }
    if mem_util.is_none() {
        warn!("no {MEM_MARKER:?} line in top output, reporting 0.00 memory");
    }

    Ok(TopSample {
        timestamp: Utc::now(),
        cpu_util_percent: cpu_util.unwrap_or(0.0),
        mem_util_percent: mem_util.unwrap_or(0.0),
    })
}

/// Parses the token immediately preceding `marker`, if the marker is present.
///
/// top pads values to a fixed width, so a wide value can run into the previous
/// label (`0.0 ni,100.0 id,`). Only the part after the last comma is the value.
fn value_before(fields: &[&str], marker: &'static str) -> Result<Option<f64>, ParseError> {
    let Some(pos) = fields.iter().position(|field| *field == marker) else {
        return Ok(None);
    };
    let Some(value) = pos.checked_sub(1).map(|i| fields[i]) else {
        return Err(ParseError::MissingValue { field: marker });
    };
    let value = value.rsplit(',').next().unwrap_or(value);

    value
        .parse::<f64>()
        .map(Some)
        .map_err(|source| ParseError::InvalidNumber {
            field: marker,
            value: value.to_owned(),
            source,
        })
}

fn memory_utilization(total: f64, free: f64) -> f64 {
    if total <= 0.0 {
        warn!("top reported {total} MiB total memory, reporting 0.00 memory");
        return 0.0;
    }
    (total - free) / total * 100.0
}
