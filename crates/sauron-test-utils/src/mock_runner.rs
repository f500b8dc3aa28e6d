// SPDX-FileCopyrightText: 2026 Sauron Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Job runner returning configured outcomes without spawning processes.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sauron_core::{ArchiveJob, JobRunner, SauronError, ScanKind};
use tokio::sync::Mutex;

/// Exit status, or the reason a job could not produce one.
pub type Outcome = Result<i32, String>;

/// Replays configured outcomes and records which jobs ran.
#[derive(Clone)]
pub struct ScriptedRunner {
    default: Outcome,
    per_kind: HashMap<ScanKind, Outcome>,
    delay: Duration,
    ran: Arc<Mutex<Vec<ArchiveJob>>>,
}

impl ScriptedRunner {
    /// Every job exits with `code`.
    pub fn exiting(code: i32) -> Self {
        Self {
            default: Ok(code),
            per_kind: HashMap::new(),
            delay: Duration::ZERO,
            ran: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Overrides the outcome for one scan kind.
    pub fn with_outcome(mut self, kind: ScanKind, outcome: Outcome) -> Self {
        self.per_kind.insert(kind, outcome);
        self
    }

    /// Simulated process run time.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Jobs passed to `run`, in start order.
    pub async fn ran(&self) -> Vec<ArchiveJob> {
        self.ran.lock().await.clone()
    }
}

#[async_trait]
impl JobRunner for ScriptedRunner {
    async fn run(&self, job: &ArchiveJob) -> Result<i32, SauronError> {
        self.ran.lock().await.push(job.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match self.per_kind.get(&job.kind).unwrap_or(&self.default) {
            Ok(code) => Ok(*code),
            Err(reason) => Err(SauronError::Archive {
                message: reason.clone(),
                source: None,
            }),
        }
    }
}
