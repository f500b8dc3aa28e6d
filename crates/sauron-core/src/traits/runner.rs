// SPDX-FileCopyrightText: 2026 Sauron Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Archival job execution seam.

use async_trait::async_trait;

use crate::error::SauronError;
use crate::types::ArchiveJob;

/// Runs the external fetcher for one job and reports its exit code.
///
/// The job directory already exists when `run` is called.
#[async_trait]
pub trait JobRunner: Send + Sync {
    /// Returns the process exit code, or an error if the process could not be
    /// started or ended without one.
    async fn run(&self, job: &ArchiveJob) -> Result<i32, SauronError>;
}
