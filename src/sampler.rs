use log::trace;
use tokio::process::Command;

use crate::error::SampleError;

/// Produces the raw text output of a monitoring tool.
pub trait Sampler {
    async fn sample(&self) -> Result<Vec<u8>, SampleError>;
}

/// Runs an external command and captures its stdout.
#[derive(Clone, Debug)]
pub struct CommandSampler {
    program: String,
    args: Vec<String>,
}

impl CommandSampler {
    pub fn new<I, S>(program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.to_owned(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Sampler for CommandSampler {
    async fn sample(&self) -> Result<Vec<u8>, SampleError> {
        trace!("running {} {}", self.program, self.args.join(" "));

        let mut command = std::process::Command::new(&self.program);
        command.args(&self.args);
        // keep ctrl-c aimed at the terminal's process group away from the child.
        #[cfg(unix)]
        std::os::unix::process::CommandExt::process_group(&mut command, 0);

        let output = Command::from(command)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| SampleError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(SampleError::Status {
                program: self.program.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }

        Ok(output.stdout)
    }
}

#[cfg(test)]
pub use self::mock::MockSampler;

#[cfg(test)]
mod mock {
    use super::*;
    use crate::shutdown::Trigger;
    use std::{collections::VecDeque, io, sync::Mutex};

    /// a sampler that replays canned outputs, then fails as if the tool were missing.
    #[derive(Default)]
    pub struct MockSampler {
        outputs: Mutex<VecDeque<Vec<u8>>>,
        calls: Mutex<usize>,
        on_drained: Option<Trigger>,
        on_exhausted: Option<Trigger>,
    }

    impl MockSampler {
        pub fn new<I: IntoIterator<Item = &'static str>>(outputs: I) -> Self {
            Self {
                outputs: Mutex::new(outputs.into_iter().map(|s| s.as_bytes().to_vec()).collect()),
                ..Self::default()
            }
        }

        /// fires `trigger` when the last canned output is handed out.
        pub fn shutdown_when_drained(mut self, trigger: Trigger) -> Self {
            self.on_drained = Some(trigger);
            self
        }

        /// fires `trigger` when asked for output after the canned outputs run out,
        /// just before failing.
        pub fn shutdown_when_exhausted(mut self, trigger: Trigger) -> Self {
            self.on_exhausted = Some(trigger);
            self
        }

        pub fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    impl Sampler for MockSampler {
        async fn sample(&self) -> Result<Vec<u8>, SampleError> {
            *self.calls.lock().unwrap() += 1;
            let mut outputs = self.outputs.lock().unwrap();
            let Some(next) = outputs.pop_front() else {
                if let Some(trigger) = &self.on_exhausted {
                    trigger.fire();
                }
                return Err(SampleError::Spawn {
                    program: "mock".into(),
                    source: io::Error::from(io::ErrorKind::NotFound),
                });
            };
            if outputs.is_empty() {
                if let Some(trigger) = &self.on_drained {
                    trigger.fire();
                }
            }
            Ok(next)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_program_is_a_spawn_error() {
        let sampler = CommandSampler::new("definitely-not-a-real-monitor-binary", ["--help"]);
        let err = sampler.sample().await.unwrap_err();
        assert!(matches!(err, SampleError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn captures_stdout() {
        let sampler = CommandSampler::new("echo", ["0, 55, 100.5, 2048, 30"]);
        let output = sampler.sample().await.unwrap();
        assert_eq!(output, b"0, 55, 100.5, 2048, 30\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_zero_exit_is_a_status_error() {
        let sampler = CommandSampler::new("false", Vec::<String>::new());
        let err = sampler.sample().await.unwrap_err();
        assert!(matches!(err, SampleError::Status { .. }));
    }

    /// the child leads its own process group, so a terminal SIGINT doesn't reach it.
    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn child_runs_in_its_own_process_group() {
        let sampler = CommandSampler::new("sh", ["-c", "cut -d' ' -f5 /proc/$$/stat; echo $$"]);
        let output = String::from_utf8(sampler.sample().await.unwrap()).unwrap();
        let lines: Vec<&str> = output.lines().map(str::trim).collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], lines[1]);
    }

    #[test]
    fn fixed_command_lines() {
        assert_eq!(crate::nvidia::sampler().program(), "nvidia-smi");
        assert_eq!(crate::top::sampler().program(), "top");
    }
}
