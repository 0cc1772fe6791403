use log::{debug, warn};
use std::fs::File;
use std::io::Write;
use std::time::Duration;

use crate::csv_log::CsvLog;
use crate::error::CollectError;
use crate::models::Record;
use crate::sampler::Sampler;
use crate::shutdown::Shutdown;

/// Drives the sample → parse → append cycle on a fixed interval.
pub struct App<S, R, W: Write = File> {
    sampler: S,
    log: CsvLog<R, W>,
    interval: Duration,
    summary: RunSummary,
}

/// Totals for one run of the collection loop.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub cycles: u64,
    pub rows: u64,
}

impl<S: Sampler, R: Record, W: Write> App<S, R, W> {
    pub fn new(sampler: S, log: CsvLog<R, W>, interval: Duration) -> Self {
        App {
            sampler,
            log,
            interval,
            summary: RunSummary::default(),
        }
    }

    /// Runs a single cycle and returns the number of rows appended.
    pub async fn collect_once(&mut self) -> Result<usize, CollectError> {
        let output = self.sampler.sample().await?;
        let records = R::parse(output.as_slice())?;
        let written = self.log.append(&records)?;

        self.summary.cycles += 1;
        self.summary.rows += written as u64;
        debug!("cycle {}: appended {written} rows", self.summary.cycles);
        Ok(written)
    }

    /// Loops until `shutdown` fires or a cycle fails.
    ///
    /// Shutdown is checked before each sample and each sleep, and interrupts the
    /// sleep. A cycle that has started always runs to completion; if it fails
    /// after shutdown was requested the run still ends cleanly.
    pub async fn run(&mut self, shutdown: &mut Shutdown) -> Result<RunSummary, CollectError> {
        loop {
            if shutdown.is_triggered() {
                break;
            }
            if let Err(err) = self.collect_once().await {
                if shutdown.is_triggered() {
                    warn!("cycle interrupted by shutdown: {err}");
                    break;
                }
                return Err(err);
            }
            if shutdown.is_triggered() {
                break;
            }
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = shutdown.triggered() => break,
            }
        }
        Ok(self.summary)
    }

    #[cfg(test)]
    fn summary(&self) -> RunSummary {
        self.summary
    }

    #[cfg(test)]
    fn log(&self) -> &CsvLog<R, W> {
        &self.log
    }

    #[cfg(test)]
    fn sampler(&self) -> &S {
        &self.sampler
    }
}
