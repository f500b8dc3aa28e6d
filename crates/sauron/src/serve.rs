// SPDX-FileCopyrightText: 2026 Sauron Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `sauron serve` command implementation.
//!
//! Builds the notifier, fetcher runner, orchestrator, channel logger, and
//! IRC transport from configuration, then runs the connection manager until
//! a shutdown signal arrives or the reconnect policy gives up.

use std::path::PathBuf;
use std::sync::Arc;

use sauron_archive::{ArchiveSettings, Orchestrator, WgetCommand, WgetRunner};
use sauron_chanlog::ChannelLogger;
use sauron_config::SauronConfig;
use sauron_core::{JobRunner, Notifier, SauronError};
use sauron_irc::{ConnectionManager, IrcConnector, ManagerSettings, ReconnectPolicy};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::shutdown;

/// Runs the `sauron serve` command.
pub async fn run_serve(config: SauronConfig) -> Result<(), SauronError> {
    init_tracing(&config.log.level);
    info!(
        server = %config.irc.server,
        port = config.irc.port,
        channels = ?config.irc.channels,
        "starting sauron"
    );

    let workdir = PathBuf::from(&config.archive.workdir);
    let logger = ChannelLogger::new(workdir.join("logs"))?;

    let notifier = sauron_mail::from_config(&config.mail).await;
    info!(notifier = notifier.name(), "notifier ready");

    let runner: Arc<dyn JobRunner> =
        Arc::new(WgetRunner::new(WgetCommand::from_config(&config.archive)));
    let (orchestrator, job_events) = Orchestrator::new(
        ArchiveSettings::from_config(&config.archive, &config.mail),
        runner,
        Arc::clone(&notifier),
    );

    let mut manager = ConnectionManager::new(
        Arc::new(IrcConnector::new(config.irc.clone())),
        ReconnectPolicy::from_config(&config.reconnect),
        ManagerSettings::from_config(&config.irc),
        logger,
        orchestrator,
        job_events,
    );

    let cancel = shutdown::install_signal_handler();
    run_until_stopped(&mut manager, notifier.as_ref(), cancel).await
}

/// Drives `manager` to completion, then drains the notifier queue.
async fn run_until_stopped(
    manager: &mut ConnectionManager,
    notifier: &dyn Notifier,
    cancel: CancellationToken,
) -> Result<(), SauronError> {
    let result = manager.run(cancel).await;

    let in_flight = manager.orchestrator().in_flight();
    if in_flight > 0 {
        info!(in_flight, "leaving archival jobs running");
    }
    if let Err(e) = notifier.shutdown().await {
        warn!(error = %e, "notifier shutdown failed");
    }
    info!("sauron stopped");
    result
}

/// Initializes the tracing subscriber. `RUST_LOG` takes precedence over
/// the configured level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("sauron={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::time::Duration;

    use sauron_test_utils::{LinkScript, RecordingNotifier, ScriptedConnector, ScriptedRunner};

    fn manager(
        workdir: &Path,
        scripts: Vec<LinkScript>,
        notifier: &RecordingNotifier,
    ) -> ConnectionManager {
        let settings = ArchiveSettings {
            data_dir: workdir.join("data"),
            outer_delay: Duration::from_secs(3),
            recipients: vec!["ops@example.com".into()],
            attach_transcript: false,
        };
        let (orchestrator, job_events) = Orchestrator::new(
            settings,
            Arc::new(ScriptedRunner::exiting(0)),
            Arc::new(notifier.clone()),
        );
        ConnectionManager::new(
            Arc::new(ScriptedConnector::new(scripts)),
            ReconnectPolicy::None,
            ManagerSettings {
                nickname: "sauron".into(),
                channels: vec!["#chat".into()],
                heartbeat: Duration::from_secs(45),
                quit_message: "The eye closes".into(),
            },
            ChannelLogger::new(workdir.join("logs")).unwrap(),
            orchestrator,
            job_events,
        )
    }

    #[tokio::test]
    async fn notifier_is_drained_when_the_connection_gives_up() {
        let dir = tempfile::tempdir().unwrap();
        let notifier = RecordingNotifier::new();
        let mut manager = manager(dir.path(), vec![LinkScript::refuse()], &notifier);

        let result = run_until_stopped(&mut manager, &notifier, CancellationToken::new()).await;
        assert!(matches!(result, Err(SauronError::Connection { .. })));
        assert!(notifier.was_shut_down().await);
    }

    #[tokio::test]
    async fn notifier_is_drained_on_cancellation() {
        let dir = tempfile::tempdir().unwrap();
        let notifier = RecordingNotifier::new();
        let scripts = vec![LinkScript::session().welcome("sauron").hold()];
        let mut manager = manager(dir.path(), scripts, &notifier);
        let cancel = CancellationToken::new();
        cancel.cancel();

        run_until_stopped(&mut manager, &notifier, cancel).await.unwrap();
        assert!(notifier.was_shut_down().await);
        assert_eq!(notifier.count().await, 0);
    }
}
