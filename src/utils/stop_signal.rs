//! Process-wide cooperative stop signal

use std::{future::Future, time::Duration};
use tokio::sync::watch;
use tracing::debug;

/// Cloneable stop flag observed by every loop and every blocking wait.
///
/// Cancellation is cooperative: holders check it at the top of their loops
/// and race it against their sleeps, nothing is interrupted mid-call.
#[derive(Debug, Clone)]
pub struct StopSignal {
    tx: watch::Sender<bool>,
}

impl StopSignal {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    /// Set the signal. Idempotent.
    pub fn trigger(&self) {
        if !self.is_set() {
            debug!("Stop signal triggered");
        }
        self.tx.send_replace(true);
    }

    pub fn is_set(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolve once the signal is set.
    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so the channel cannot close under us.
        let _ = rx.wait_for(|stopped| *stopped).await;
    }

    /// Sleep for `duration` unless stopped first.
    ///
    /// Returns `true` if the full duration elapsed, `false` if the stop
    /// signal cut it short.
    pub async fn sleep(&self, duration: Duration) -> bool {
        self.sleep_or(duration, std::future::pending::<()>()).await
    }

    /// Sleep for `duration`, waking early on stop or when `wake` resolves.
    ///
    /// Returns `false` only when the stop signal ended the wait.
    pub async fn sleep_or<F>(&self, duration: Duration, wake: F) -> bool
    where
        F: Future<Output = ()>,
    {
        if self.is_set() {
            return false;
        }
        tokio::select! {
            _ = tokio::time::sleep(duration) => true,
            _ = wake => true,
            _ = self.wait() => false,
        }
    }
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_sleep_runs_to_completion() {
        let stop = StopSignal::new();
        assert!(stop.sleep(Duration::from_secs(5)).await);
        assert!(!stop.is_set());
    }

    #[tokio::test(start_paused = true)]
    async fn test_trigger_cuts_sleep_short() {
        let stop = StopSignal::new();
        let sleeper = stop.clone();
        let handle = tokio::spawn(async move { sleeper.sleep(Duration::from_secs(3600)).await });

        tokio::time::sleep(Duration::from_millis(10)).await;
        stop.trigger();

        assert!(!handle.await.unwrap());
    }

    #[tokio::test]
    async fn test_sleep_after_trigger_returns_immediately() {
        let stop = StopSignal::new();
        stop.trigger();
        stop.trigger();
        assert!(stop.is_set());
        assert!(!stop.sleep(Duration::from_secs(3600)).await);
    }
}
