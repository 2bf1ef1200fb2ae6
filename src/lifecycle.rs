//! Process-wide failure handling.
//!
//! Two paths end the process:
//! - a panic anywhere: logged, then an immediate exit with no drain
//! - an error reported through [`FatalErrorReporter`]: the running application stops
//!   accepting connections, lets in-flight requests finish, then `main` exits

use sqlx::PgPool;
use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Exit code for every fatal failure.
pub const FATAL_EXIT_CODE: i32 = 1;

/// Installs a panic hook that logs the panic and terminates the process.
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let message = info
            .payload()
            .downcast_ref::<&str>()
            .map(|message| message.to_string())
            .or_else(|| info.payload().downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic payload".to_string());
        let location = info
            .location()
            .map(|location| location.to_string())
            .unwrap_or_default();
        tracing::error!(panic.message = %message, panic.location = %location, "Uncaught panic, shutting down");
        std::process::exit(FATAL_EXIT_CODE);
    }));
}

/// Sends fatal errors to the running application. Cheap to clone.
#[derive(Clone, Debug)]
pub struct FatalErrorReporter {
    sender: mpsc::UnboundedSender<anyhow::Error>,
}

impl FatalErrorReporter {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<anyhow::Error>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    pub fn report(&self, error: anyhow::Error) {
        if let Err(e) = self.sender.send(error) {
            // the application is already gone; there is nobody left to stop
            tracing::error!(error.cause_chain = ?e.0, "Fatal error reported after shutdown");
        }
    }
}

/// Spawns `task`; if it returns an error the error is reported as fatal.
pub fn supervise<F>(name: &'static str, reporter: FatalErrorReporter, task: F) -> JoinHandle<()>
where
    F: Future<Output = Result<(), anyhow::Error>> + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(e) = task.await {
            tracing::error!(task = name, error.cause_chain = ?e, "Background task failed");
            reporter.report(e.context(format!("Background task `{}` failed", name)));
        }
    })
}

/// Pings the database every `interval`; gives up after `max_failures` consecutive failures.
pub async fn watch_database(
    pool: PgPool,
    interval: Duration,
    max_failures: u32,
) -> Result<(), anyhow::Error> {
    let mut ticker = tokio::time::interval(interval);
    // the first tick completes immediately; the pool was just proven reachable
    ticker.tick().await;
    let mut consecutive_failures = 0;
    loop {
        ticker.tick().await;
        match sqlx::query("SELECT 1").execute(&pool).await {
            Ok(_) => consecutive_failures = 0,
            Err(e) => {
                consecutive_failures += 1;
                tracing::warn!(
                    error.cause_chain = ?e,
                    consecutive_failures,
                    "Database liveness check failed"
                );
                if consecutive_failures >= max_failures {
                    return Err(anyhow::Error::new(e).context(format!(
                        "Database unreachable for {} consecutive checks",
                        consecutive_failures
                    )));
                }
            }
        }
    }
}
