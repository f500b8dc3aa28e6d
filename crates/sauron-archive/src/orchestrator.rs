// SPDX-FileCopyrightText: 2026 Sauron Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scheduling, tracking, and reporting of archival jobs.
//!
//! The [`Orchestrator`] lives on the chat event loop. [`Orchestrator::schedule`]
//! spawns one task per job; each task reports [`JobEvent`]s through an
//! unbounded channel whose receiver the event loop polls and feeds back into
//! [`Orchestrator::handle_event`].

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use sauron_chanlog::ChannelLogger;
use sauron_config::model::{ArchiveConfig, MailConfig};
use sauron_core::{
    ArchiveJob, ChatMessage, JobId, JobRunner, JobStatus, Notification, Notifier, ScanKind,
    UrlMatch,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::layout::base_path;

/// Progress reported by a job task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobEvent {
    /// The job directory exists and the fetcher is being started.
    Started(JobId),
    /// Exit code, or why the job produced none.
    Finished(JobId, Result<i32, String>),
}

/// Where jobs write and who hears about them.
#[derive(Debug, Clone)]
pub struct ArchiveSettings {
    pub data_dir: PathBuf,
    pub outer_delay: Duration,
    pub recipients: Vec<String>,
    pub attach_transcript: bool,
}

impl ArchiveSettings {
    pub fn from_config(archive: &ArchiveConfig, mail: &MailConfig) -> Self {
        Self {
            data_dir: PathBuf::from(&archive.workdir).join("data"),
            outer_delay: Duration::from_secs(archive.outer_delay_secs),
            recipients: mail.recipients.clone(),
            attach_transcript: mail.attach_transcript,
        }
    }
}

struct TrackedJob {
    job: ArchiveJob,
    message: Arc<ChatMessage>,
}

pub struct Orchestrator {
    settings: ArchiveSettings,
    runner: Arc<dyn JobRunner>,
    notifier: Arc<dyn Notifier>,
    jobs: HashMap<JobId, TrackedJob>,
    events: mpsc::UnboundedSender<JobEvent>,
}

impl Orchestrator {
    /// Returns the orchestrator and the receiver its job tasks report to.
    pub fn new(
        settings: ArchiveSettings,
        runner: Arc<dyn JobRunner>,
        notifier: Arc<dyn Notifier>,
    ) -> (Self, mpsc::UnboundedReceiver<JobEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let orchestrator = Self {
            settings,
            runner,
            notifier,
            jobs: HashMap::new(),
            events,
        };
        (orchestrator, rx)
    }

    /// Schedules the deep-local and shallow-outer jobs for one URL match.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule(
        &mut self,
        logger: &mut ChannelLogger,
        message: &ChatMessage,
        url: &UrlMatch,
    ) -> [JobId; 2] {
        let base = base_path(&self.settings.data_dir, message, &url.url);
        let line = format!("will archive {} under {}", url.url, base.display());
        if let Err(e) = logger.log(&message.channel, &line) {
            warn!(channel = %message.channel, error = %e, "channel log write failed");
        }

        let message = Arc::new(message.clone());
        let ids = [ScanKind::DeepLocal, ScanKind::ShallowOuter].map(|kind| {
            let job = ArchiveJob::new(url.url.clone(), &base, kind);
            let delay = match kind {
                ScanKind::DeepLocal => Duration::ZERO,
                ScanKind::ShallowOuter => self.settings.outer_delay,
            };
            let id = job.id;
            tokio::spawn(run_job(
                job.clone(),
                delay,
                Arc::clone(&self.runner),
                self.events.clone(),
            ));
            self.jobs.insert(
                id,
                TrackedJob {
                    job,
                    message: Arc::clone(&message),
                },
            );
            id
        });
        info!(url = %url.url, base = %base.display(), "archival scheduled");
        ids
    }

    /// Applies a job event. On a terminal event the job is logged, reported
    /// to the notifier, dropped from tracking, and returned.
    pub async fn handle_event(
        &mut self,
        event: JobEvent,
        logger: &mut ChannelLogger,
    ) -> Option<ArchiveJob> {
        match event {
            JobEvent::Started(id) => {
                if let Some(tracked) = self.jobs.get_mut(&id)
                    && let Err(e) = tracked.job.transition(JobStatus::Running)
                {
                    warn!(job = %id, error = %e, "ignoring start event");
                }
                None
            }
            JobEvent::Finished(id, outcome) => {
                let Some(mut tracked) = self.jobs.remove(&id) else {
                    warn!(job = %id, "finish event for unknown job");
                    return None;
                };
                let status = match outcome {
                    Ok(code) => JobStatus::Completed { code },
                    Err(reason) => JobStatus::Failed { reason },
                };
                if let Err(e) = tracked.job.transition(status) {
                    warn!(job = %id, error = %e, "ignoring finish event");
                    return None;
                }
                self.report(&tracked, logger).await;
                Some(tracked.job)
            }
        }
    }

    async fn report(&self, tracked: &TrackedJob, logger: &mut ChannelLogger) {
        let job = &tracked.job;
        let channel = &tracked.message.channel;
        info!(
            job = %job.id,
            url = %job.url,
            kind = %job.kind,
            status = %job.status().report(),
            "archival finished"
        );
        if logger.is_open(channel) {
            let line = format!(
                "archive of {} finished under {} with status {}",
                job.url,
                job.target_dir.display(),
                job.status().report()
            );
            if let Err(e) = logger.log(channel, &line) {
                warn!(channel = %channel, error = %e, "channel log write failed");
            }
        }

        let mut notification =
            Notification::for_job(&self.settings.recipients, job, &tracked.message);
        if self.settings.attach_transcript && job.transcript_path().exists() {
            notification = notification.with_attachment(job.transcript_path());
        }
        if let Err(e) = self.notifier.notify(notification).await {
            warn!(job = %job.id, notifier = self.notifier.name(), error = %e, "notification failed");
        }
    }

    /// Number of jobs that have not reached a terminal status.
    pub fn in_flight(&self) -> usize {
        self.jobs.len()
    }

    /// Snapshot of a job still in flight.
    pub fn job(&self, id: JobId) -> Option<ArchiveJob> {
        self.jobs.get(&id).map(|tracked| tracked.job.clone())
    }
}

async fn run_job(
    job: ArchiveJob,
    delay: Duration,
    runner: Arc<dyn JobRunner>,
    events: mpsc::UnboundedSender<JobEvent>,
) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    let outcome = match tokio::fs::create_dir_all(&job.target_dir).await {
        Ok(()) => {
            send(&events, JobEvent::Started(job.id));
            runner.run(&job).await.map_err(|e| e.to_string())
        }
        Err(e) => {
            error!(
                path = %job.target_dir.display(),
                error = %e,
                "cannot create archive directory"
            );
            Err(format!("cannot create {}: {e}", job.target_dir.display()))
        }
    };
    send(&events, JobEvent::Finished(job.id, outcome));
}

fn send(events: &mpsc::UnboundedSender<JobEvent>, event: JobEvent) {
    if events.send(event).is_err() {
        debug!("job event dropped, event loop is gone");
    }
}
