use chrono::Utc;
use log::debug;
use std::io::BufRead;

use crate::error::ParseError;
use crate::models::GpuSample;
use crate::sampler::CommandSampler;

const FIELD_SEPARATOR: &str = ", ";
const FIELD_COUNT: usize = 5;

pub fn sampler() -> CommandSampler {
    CommandSampler::new(
        "nvidia-smi",
        [
            "--query-gpu=index,temperature.gpu,power.draw,memory.used,utilization.gpu",
            "--format=csv,noheader,nounits",
        ],
    )
}

/// Parses `nvidia-smi --format=csv,noheader,nounits` output, one sample per GPU line.
///
/// Lines that don't split into exactly five fields are skipped, not treated as errors.
pub fn parse_output(output: impl BufRead) -> Result<Vec<GpuSample>, ParseError> {
    let mut samples = Vec::new();

    for line in output.lines() {
        let line = line?;
        let parts: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
        let [index, temperature, power, memory, util] = parts.as_slice() else {
            debug!(
                "skipping nvidia-smi line with {} of {FIELD_COUNT} fields: {line:?}",
                parts.len()
            );
            continue;
        };

        samples.push(GpuSample {
            timestamp: Utc::now(),
            gpu_index: index.to_string(),
            temperature_celsius: temperature.to_string(),
            power_watts: power.to_string(),
            memory_used_mib: memory.to_string(),
            gpu_util_percent: util.to_string(),
        });
    }

    Ok(samples)
}
