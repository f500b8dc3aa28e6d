// SPDX-FileCopyrightText: 2026 Sauron Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The fetcher invocation contract and its process runner.

use std::ffi::OsString;
use std::process::Stdio;

use async_trait::async_trait;
use sauron_config::model::ArchiveConfig;
use sauron_core::{ArchiveJob, JobRunner, SauronError, ScanKind};
use tracing::{debug, info};

/// Argument vector builder for the mirroring fetcher.
#[derive(Debug, Clone, PartialEq)]
pub struct WgetCommand {
    pub program: String,
    pub user_agent: String,
    pub local_depth: u32,
    pub outer_depth: u32,
    pub wait_secs: f64,
}

impl WgetCommand {
    pub fn from_config(config: &ArchiveConfig) -> Self {
        Self {
            program: config.fetcher.clone(),
            user_agent: config.user_agent.clone(),
            local_depth: config.local_depth,
            outer_depth: config.outer_depth,
            wait_secs: config.wait_secs,
        }
    }

    /// Arguments for `job`, URL last. Passed to the process as-is, no shell.
    pub fn args(&self, job: &ArchiveJob) -> Vec<OsString> {
        let mut args: Vec<OsString> = [
            "-U",
            self.user_agent.as_str(),
            "--follow-ftp",
            "-r",
            "-N",
            "--no-remove-listing",
            "--no-parent",
            "--convert-links",
            "-p",
            "-w",
        ]
        .into_iter()
        .map(OsString::from)
        .collect();
        args.push(self.wait_secs.to_string().into());
        args.push("--random-wait".into());
        args.push("-x".into());
        args.push("-P".into());
        args.push(job.target_dir.clone().into_os_string());
        match job.kind {
            ScanKind::DeepLocal => {
                args.push("-l".into());
                args.push(self.local_depth.to_string().into());
            }
            ScanKind::ShallowOuter => {
                args.push("-H".into());
                args.push("-l".into());
                args.push(self.outer_depth.to_string().into());
            }
        }
        args.push(job.url.clone().into());
        args
    }
}

/// Runs the fetcher as a child process with output captured to the job transcript.
///
/// The job directory must already exist. The child is not killed when the
/// awaiting task is dropped.
pub struct WgetRunner {
    command: WgetCommand,
}

impl WgetRunner {
    pub fn new(command: WgetCommand) -> Self {
        Self { command }
    }
}

#[async_trait]
impl JobRunner for WgetRunner {
    async fn run(&self, job: &ArchiveJob) -> Result<i32, SauronError> {
        let transcript_path = job.transcript_path();
        let transcript = tokio::fs::File::create(&transcript_path)
            .await
            .map_err(|e| SauronError::io(format!("creating {}", transcript_path.display()), e))?
            .into_std()
            .await;
        let stderr = transcript
            .try_clone()
            .map_err(|e| SauronError::io(format!("cloning {}", transcript_path.display()), e))?;

        let args = self.command.args(job);
        debug!(job = %job.id, program = %self.command.program, ?args, "spawning fetcher");
        let status = tokio::process::Command::new(&self.command.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::from(transcript))
            .stderr(Stdio::from(stderr))
            .status()
            .await
            .map_err(|e| SauronError::Archive {
                message: format!("failed to start {}: {e}", self.command.program),
                source: Some(Box::new(e)),
            })?;

        match status.code() {
            Some(code) => {
                info!(job = %job.id, url = %job.url, kind = %job.kind, code, "fetcher exited");
                Ok(code)
            }
            None => Err(SauronError::Archive {
                message: format!("{} terminated by signal", self.command.program),
                source: None,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn command() -> WgetCommand {
        WgetCommand::from_config(&ArchiveConfig::default())
    }

    fn strings(args: Vec<OsString>) -> Vec<String> {
        args.into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn deep_local_flags() {
        let job = ArchiveJob::new("http://example.com/x", Path::new("/d/base"), ScanKind::DeepLocal);
        let args = strings(command().args(&job));
        let ua = ArchiveConfig::default().user_agent;
        let expected = vec![
            "-U", ua.as_str(), "--follow-ftp", "-r", "-N", "--no-remove-listing",
            "--no-parent", "--convert-links", "-p", "-w", "0.5", "--random-wait", "-x",
            "-P", "/d/base_local", "-l", "10", "http://example.com/x",
        ];
        assert_eq!(args, expected);
    }

    #[test]
    fn shallow_outer_spans_hosts_with_low_depth() {
        let job = ArchiveJob::new("example.com", Path::new("/d/base"), ScanKind::ShallowOuter);
        let args = strings(command().args(&job));
        let tail = &args[args.len() - 5..];
        assert_eq!(tail, ["/d/base_outer", "-H", "-l", "3", "example.com"]);
        assert!(!args.contains(&"10".to_string()));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn runner_reports_exit_codes_and_writes_transcript() {
        let dir = tempfile::tempdir().unwrap();
        let job = ArchiveJob::new("http://example.com", &dir.path().join("j"), ScanKind::DeepLocal);
        std::fs::create_dir_all(&job.target_dir).unwrap();

        let ok = WgetRunner::new(WgetCommand {
            program: "true".into(),
            ..command()
        });
        assert_eq!(ok.run(&job).await.unwrap(), 0);
        assert!(job.transcript_path().exists());

        let failing = WgetRunner::new(WgetCommand {
            program: "false".into(),
            ..command()
        });
        assert_eq!(failing.run(&job).await.unwrap(), 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn missing_program_is_an_archive_error() {
        let dir = tempfile::tempdir().unwrap();
        let job = ArchiveJob::new("u", &dir.path().join("j"), ScanKind::DeepLocal);
        std::fs::create_dir_all(&job.target_dir).unwrap();
        let runner = WgetRunner::new(WgetCommand {
            program: "/nonexistent/sauron-fetcher".into(),
            ..command()
        });
        assert!(matches!(
            runner.run(&job).await,
            Err(SauronError::Archive { .. })
        ));
    }

    #[tokio::test]
    async fn missing_job_directory_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let job = ArchiveJob::new("u", &dir.path().join("absent/j"), ScanKind::DeepLocal);
        let runner = WgetRunner::new(command());
        assert!(matches!(runner.run(&job).await, Err(SauronError::Io { .. })));
    }
}
