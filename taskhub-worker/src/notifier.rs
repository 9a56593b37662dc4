/// Deadline notifier
///
/// Runs [`NotificationService::check_deadlines`] on a fixed interval until
/// shut down. The first scan happens immediately.
///
/// # Failure handling
///
/// A failed scan is logged and the loop waits for the next tick; a failed
/// email only shows up in the scan counts. Cancelling the shutdown token
/// drops any scan in flight.
///
/// # Example
///
/// ```no_run
/// # use taskhub_worker::notifier::DeadlineNotifier;
/// # async fn example(notifier: DeadlineNotifier) -> anyhow::Result<()> {
/// let shutdown = notifier.shutdown_token();
/// tokio::spawn(async move {
///     let _ = tokio::signal::ctrl_c().await;
///     shutdown.cancel();
/// });
///
/// notifier.run().await?;
/// # Ok(())
/// # }
/// ```
use crate::config::NotifierConfig;
use taskhub_shared::error::ServiceResult;
use taskhub_shared::services::views::DeadlineScan;
use taskhub_shared::services::NotificationService;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

pub struct DeadlineNotifier {
    notifications: NotificationService,

    config: NotifierConfig,

    shutdown_token: CancellationToken,
}

impl DeadlineNotifier {
    pub fn new(notifications: NotificationService, config: NotifierConfig) -> Self {
        DeadlineNotifier {
            notifications,
            config,
            shutdown_token: CancellationToken::new(),
        }
    }

    /// Cancel to stop [`run`](Self::run)
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    /// One scan over the configured window
    pub async fn run_once(&self) -> ServiceResult<DeadlineScan> {
        self.notifications.check_deadlines(self.config.window()).await
    }

    /// Scans every interval until the shutdown token is cancelled
    pub async fn run(&self) -> anyhow::Result<()> {
        tracing::info!(
            interval_secs = self.config.interval_secs,
            window_hours = self.config.window_hours,
            "Deadline notifier starting"
        );

        let mut ticker = tokio::time::interval(self.config.interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = self.shutdown_token.cancelled() => break,
                _ = ticker.tick() => {}
            }

            tokio::select! {
                biased;
                _ = self.shutdown_token.cancelled() => {
                    tracing::info!("Shutdown requested during scan, abandoning it");
                    break;
                }
                result = self.run_once() => match result {
                    Ok(scan) if scan.flagged > 0 => tracing::info!(
                        flagged = scan.flagged,
                        notified = scan.notified,
                        failed = scan.failed,
                        "Deadline scan completed"
                    ),
                    Ok(_) => tracing::debug!("Deadline scan found nothing due"),
                    Err(e) => tracing::error!(error = %e, "Deadline scan failed"),
                },
            }
        }

        tracing::info!("Deadline notifier shut down");
        Ok(())
    }
}
