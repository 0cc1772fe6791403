use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SampleError {
    #[error("failed to run `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("`{program}` exited with {status}: {stderr}")]
    Status {
        program: String,
        status: ExitStatus,
        stderr: String,
    },
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to read command output: {0}")]
    Scan(#[from] io::Error),
    #[error("`{field}` marker has no value before it")]
    MissingValue { field: &'static str },
    #[error("invalid number {value:?} for `{field}`")]
    InvalidNumber {
        field: &'static str,
        value: String,
        #[source]
        source: std::num::ParseFloatError,
    },
}

#[derive(Debug, Error)]
pub enum AppendError {
    #[error("failed to open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write csv row: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to flush csv log: {0}")]
    Flush(#[from] io::Error),
}

/// A fatal failure of one collection cycle.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error("sampling failed: {0}")]
    Sample(#[from] SampleError),
    #[error("parsing failed: {0}")]
    Parse(#[from] ParseError),
    #[error("csv write failed: {0}")]
    Append(#[from] AppendError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("$HOME is not set; pass --output explicitly")]
    NoHomeDir,
}

impl CollectError {
    pub fn exit_code(&self) -> u8 {
        match self {
            CollectError::Sample(_) => 2,
            CollectError::Parse(_) => 3,
            CollectError::Append(_) => 4,
        }
    }
}

impl ConfigError {
    pub fn exit_code(&self) -> u8 {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct_and_nonzero() {
        let sample = CollectError::from(SampleError::Spawn {
            program: "nvidia-smi".into(),
            source: io::Error::from(io::ErrorKind::NotFound),
        });
        let parse = CollectError::from(ParseError::MissingValue { field: "id," });
        let append = CollectError::from(AppendError::Flush(io::Error::other("disk full")));

        let codes = [
            ConfigError::NoHomeDir.exit_code(),
            sample.exit_code(),
            parse.exit_code(),
            append.exit_code(),
        ];
        assert_eq!(codes, [1, 2, 3, 4]);
    }

    #[test]
    fn spawn_error_names_program() {
        let err = SampleError::Spawn {
            program: "top".into(),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert!(err.to_string().starts_with("failed to run `top`"));
    }
}
