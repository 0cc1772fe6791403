use csv::Writer;
use log::info;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::marker::PhantomData;
use std::path::Path;

use crate::error::AppendError;
use crate::models::Record;

/// An append-only CSV log of `R` records.
pub struct CsvLog<R, W: Write = File> {
    writer: Writer<W>,
    _record: PhantomData<fn(&R)>,
}

impl<R: Record> CsvLog<R, File> {
    /// Opens `path` for appending, creating it (and its parent directories) if needed.
    ///
    /// The header is written only when the file is empty, so re-running
    /// against an existing log resumes it without a second header.
    pub fn open(path: &Path) -> Result<Self, AppendError> {
        let open_err = |source: std::io::Error| AppendError::Open {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(open_err)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(open_err)?;
        let is_new = file.metadata().map_err(open_err)?.len() == 0;

        let log = Self::from_writer(file, is_new)?;
        if is_new {
            info!("created {} with header", path.display());
        } else {
            info!("appending to existing {}", path.display());
        }
        Ok(log)
    }
}

impl<R: Record, W: Write> CsvLog<R, W> {
    pub fn from_writer(inner: W, write_header: bool) -> Result<Self, AppendError> {
        let mut writer = Writer::from_writer(inner);
        if write_header {
            writer.write_record(R::HEADER)?;
            writer.flush()?;
        }
        Ok(Self {
            writer,
            _record: PhantomData,
        })
    }

    /// Writes one row per record and flushes. Returns the number of rows written.
    pub fn append(&mut self, records: &[R]) -> Result<usize, AppendError> {
        for record in records {
            self.writer.write_record(record.to_row())?;
        }
        self.writer.flush()?;
        Ok(records.len())
    }

    #[cfg(test)]
    pub fn get_ref(&self) -> &W {
        self.writer.get_ref()
    }
}
