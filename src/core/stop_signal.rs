use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

/// Cooperative cancellation for one run, shared with the Ctrl-C handler.
#[derive(Clone, Default)]
pub struct StopSignal {
    token: CancellationToken,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.token.cancel();
    }

    pub fn is_triggered(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_trigger_wakes_waiters() {
        let signal = StopSignal::new();
        let clone = signal.clone();
        assert!(!signal.is_triggered());

        let waiter = tokio::spawn(async move { clone.cancelled().await });
        signal.trigger();
        waiter.await.unwrap();
        assert!(signal.is_triggered());
    }
}
