use super::payment::{PaymentRequest, PaymentStatus, PaymentUpdate};
use super::transaction::Transaction;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Durable store for payment requests and the append-only transaction log.
///
/// Pure CRUD plus filtered queries; all business rules live in the engine.
/// The ledger is the single source of truth, so a request left `approved`
/// before a crash must still be visible and executable after restart.
#[async_trait]
pub trait PaymentLedger: Send + Sync {
    /// Inserts a new request row. Fails with `DuplicateRequestId` if the id
    /// is already present.
    async fn insert_payment_request(&self, request: PaymentRequest) -> Result<()>;

    /// Merge-updates the mutable fields of an existing row. Fails with
    /// `NotFound` for an unknown id.
    async fn update_payment_request(&self, id: Uuid, update: PaymentUpdate) -> Result<()>;

    async fn get_payment_request_by_id(&self, id: Uuid) -> Result<Option<PaymentRequest>>;

    /// All rows with the given status, ascending by `requested_at` (id as
    /// tiebreak for a stable order).
    async fn get_payment_requests_by_status(
        &self,
        status: PaymentStatus,
    ) -> Result<Vec<PaymentRequest>>;

    /// Rows with `requested_at >= since`. Feeds the sliding-window rate
    /// limiter.
    async fn get_payment_requests_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<PaymentRequest>>;

    async fn insert_transaction(&self, tx: Transaction) -> Result<()>;

    /// Up to `limit` audit entries, most recent first.
    async fn get_recent_transactions(&self, limit: usize) -> Result<Vec<Transaction>>;
}

pub type LedgerBox = Box<dyn PaymentLedger>;

/// Result of a completed outbound transfer.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct TransferReceipt {
    pub transfer_id: String,
    pub status: String,
    pub to_address: String,
    pub amount_cents: u64,
    pub balance_after_cents: u64,
}

/// The external client that performs the real value movement.
#[async_trait]
pub trait TransferExecutor: Send + Sync {
    async fn transfer(
        &self,
        to_address: &str,
        amount_cents: u64,
        note: Option<&str>,
    ) -> Result<TransferReceipt>;
}

pub type ExecutorBox = Box<dyn TransferExecutor>;

/// Optional hook informing a human reviewer that a request awaits review.
#[async_trait]
pub trait ReviewNotifier: Send + Sync {
    async fn notify_pending(&self, request: &PaymentRequest) -> Result<()>;
}

pub type NotifierBox = Box<dyn ReviewNotifier>;
