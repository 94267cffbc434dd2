use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::Alert;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkOutcome {
    Updated,
    /// The alert no longer exists or is no longer Pending. Treated as a logged no-op.
    Absent,
}

/// Persistence for alerts. The worker only lists candidates and performs the
/// one-way Pending -> Sent transition.
#[async_trait]
pub trait AlertStore: Send + Sync {
    /// All alerts with `active = true` and `status = Pending`.
    async fn list_pending(&self) -> Result<Vec<Alert>, StoreError>;

    /// Sets `status = Sent` and `active = false`. Must never touch an alert that is already Sent.
    async fn mark_sent(&self, id: &str) -> Result<MarkOutcome, StoreError>;
}
