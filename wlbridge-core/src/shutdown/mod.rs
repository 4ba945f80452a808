//! Graceful shutdown coordinator
//!
//! Stops intake on Ctrl-C or SIGTERM, then gives in-flight dispatches the
//! configured grace period before they are aborted.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinSet;
use tracing::{error, info, warn};

/// Shutdown state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownState {
    Running,
    ShuttingDown,
    Shutdown,
}

pub struct ShutdownCoordinator {
    state: Arc<RwLock<ShutdownState>>,
    shutdown_tx: broadcast::Sender<()>,
    timeout: Duration,
}

impl ShutdownCoordinator {
    pub fn new(timeout: Duration) -> Self {
        let (shutdown_tx, _) = broadcast::channel(16);

        Self {
            state: Arc::new(RwLock::new(ShutdownState::Running)),
            shutdown_tx,
            timeout,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Tell every subscriber to stop taking new work
    pub async fn shutdown(&self) {
        let mut state = self.state.write().await;
        if *state != ShutdownState::Running {
            warn!("Shutdown already in progress");
            return;
        }
        info!("Initiating graceful shutdown");
        *state = ShutdownState::ShuttingDown;
        drop(state);

        if self.shutdown_tx.send(()).is_err() {
            info!("No components subscribed to shutdown");
        }
    }

    pub async fn is_shutting_down(&self) -> bool {
        *self.state.read().await != ShutdownState::Running
    }

    pub async fn state(&self) -> ShutdownState {
        *self.state.read().await
    }

    /// Wait for in-flight tasks, aborting whatever is left after the timeout
    ///
    /// Returns the number of tasks that had to be aborted.
    pub async fn drain<T: 'static>(&self, tasks: &mut JoinSet<T>) -> usize {
        let pending = tasks.len();
        if pending > 0 {
            info!("Waiting for {} in-flight dispatches", pending);
        }

        let finished = tokio::time::timeout(self.timeout, async {
            while let Some(joined) = tasks.join_next().await {
                if let Err(e) = joined {
                    warn!("Dispatch task ended abnormally: {}", e);
                }
            }
        })
        .await;

        let aborted = match finished {
            Ok(()) => 0,
            Err(_) => {
                let left = tasks.len();
                warn!(
                    "Shutdown timeout of {:?} reached, aborting {} dispatches",
                    self.timeout, left
                );
                tasks.abort_all();
                left
            }
        };

        *self.state.write().await = ShutdownState::Shutdown;
        info!("Shutdown complete");
        aborted
    }
}

/// Resolve on Ctrl-C, or SIGTERM on unix
pub async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl-C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_shutdown_notifies_subscribers_once() {
        let coordinator = ShutdownCoordinator::new(Duration::from_secs(1));
        let mut rx = coordinator.subscribe();
        assert!(!coordinator.is_shutting_down().await);

        coordinator.shutdown().await;
        coordinator.shutdown().await;

        assert!(rx.recv().await.is_ok());
        assert!(rx.try_recv().is_err());
        assert_eq!(coordinator.state().await, ShutdownState::ShuttingDown);
    }

    #[tokio::test]
    async fn test_drain_waits_for_quick_tasks() {
        let coordinator = ShutdownCoordinator::new(Duration::from_secs(5));
        let mut tasks = JoinSet::new();
        for i in 0..3u64 {
            tasks.spawn(async move {
                tokio::time::sleep(Duration::from_millis(10 * i)).await;
            });
        }

        assert_eq!(coordinator.drain(&mut tasks).await, 0);
        assert!(tasks.is_empty());
        assert_eq!(coordinator.state().await, ShutdownState::Shutdown);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drain_aborts_after_timeout() {
        let coordinator = ShutdownCoordinator::new(Duration::from_millis(100));
        let mut tasks = JoinSet::new();
        tasks.spawn(async {});
        tasks.spawn(std::future::pending::<()>());

        assert_eq!(coordinator.drain(&mut tasks).await, 1);
    }
}
