use std::sync::atomic::{AtomicU64, Ordering};

use tokio_util::sync::CancellationToken;

static NEXT_HANDLE_ID: AtomicU64 = AtomicU64::new(1);

/// Cooperative cancellation handle for one in-flight request.
///
/// Cloning is cheap and every clone observes the same signal.  Backends poll
/// [`Self::is_cancelled`] before each body read and race pending reads
/// against [`Self::cancelled`]; nothing is aborted on the server side beyond
/// dropping the connection.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    id: u64,
    token: CancellationToken,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self {
            id: NEXT_HANDLE_ID.fetch_add(1, Ordering::Relaxed),
            token: CancellationToken::new(),
        }
    }

    /// Signal cancellation. Idempotent.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once [`Self::cancel`] has been called on any clone.
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }

    /// `true` if both handles belong to the same request.
    pub fn same_request(&self, other: &CancelHandle) -> bool {
        self.id == other.id
    }
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}
