use tokio_util::sync::CancellationToken;

/// Cancellation token bound to the lifetime of the view that started a
/// request. Clones share state; cancelling any clone cancels all of them.
#[derive(Debug, Clone, Default)]
pub struct LoadScope {
    token: CancellationToken,
}

impl LoadScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        if !self.token.is_cancelled() {
            tracing::debug!("load scope cancelled");
        }
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the scope is cancelled.
    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }
}
