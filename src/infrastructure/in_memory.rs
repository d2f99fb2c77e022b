use crate::domain::payment::{PaymentRequest, PaymentStatus, PaymentUpdate};
use crate::domain::ports::PaymentLedger;
use crate::domain::transaction::Transaction;
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// A thread-safe in-memory ledger.
///
/// Uses `Arc<RwLock<..>>` to allow shared concurrent access. Ideal for tests
/// and one-shot runs where durability is not required; the transaction log is
/// an append-only `Vec`, so insertion order is the audit order.
#[derive(Default, Clone)]
pub struct InMemoryLedger {
    requests: Arc<RwLock<HashMap<Uuid, PaymentRequest>>>,
    transactions: Arc<RwLock<Vec<Transaction>>>,
}

impl InMemoryLedger {
    /// Creates a new, empty in-memory ledger.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentLedger for InMemoryLedger {
    async fn insert_payment_request(&self, request: PaymentRequest) -> Result<()> {
        let mut requests = self.requests.write().await;
        if requests.contains_key(&request.id) {
            return Err(PaymentError::DuplicateRequestId(request.id));
        }
        requests.insert(request.id, request);
        Ok(())
    }

    async fn update_payment_request(&self, id: Uuid, update: PaymentUpdate) -> Result<()> {
        let mut requests = self.requests.write().await;
        let request = requests.get_mut(&id).ok_or(PaymentError::NotFound(id))?;
        update.apply(request);
        Ok(())
    }

    async fn get_payment_request_by_id(&self, id: Uuid) -> Result<Option<PaymentRequest>> {
        let requests = self.requests.read().await;
        Ok(requests.get(&id).cloned())
    }

    async fn get_payment_requests_by_status(
        &self,
        status: PaymentStatus,
    ) -> Result<Vec<PaymentRequest>> {
        let requests = self.requests.read().await;
        let mut matching: Vec<PaymentRequest> = requests
            .values()
            .filter(|r| r.status == status)
            .cloned()
            .collect();
        matching.sort_by_key(|r| (r.requested_at, r.id));
        Ok(matching)
    }

    async fn get_payment_requests_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<PaymentRequest>> {
        let requests = self.requests.read().await;
        let mut matching: Vec<PaymentRequest> = requests
            .values()
            .filter(|r| r.requested_at >= since)
            .cloned()
            .collect();
        matching.sort_by_key(|r| (r.requested_at, r.id));
        Ok(matching)
    }

    async fn insert_transaction(&self, tx: Transaction) -> Result<()> {
        let mut transactions = self.transactions.write().await;
        transactions.push(tx);
        Ok(())
    }

    async fn get_recent_transactions(&self, limit: usize) -> Result<Vec<Transaction>> {
        let transactions = self.transactions.read().await;
        Ok(transactions.iter().rev().take(limit).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::transaction::TransactionType;
    use chrono::Duration;

    #[tokio::test]
    async fn test_insert_and_get_request() {
        let ledger = InMemoryLedger::new();
        let request = PaymentRequest::new("0xAAA", 100, None, Utc::now());

        ledger.insert_payment_request(request.clone()).await.unwrap();
        let retrieved = ledger
            .get_payment_request_by_id(request.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(retrieved, request);

        assert!(
            ledger
                .get_payment_request_by_id(Uuid::now_v7())
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_duplicate_insert_rejected() {
        let ledger = InMemoryLedger::new();
        let request = PaymentRequest::new("0xAAA", 100, None, Utc::now());

        ledger.insert_payment_request(request.clone()).await.unwrap();
        let err = ledger.insert_payment_request(request).await.unwrap_err();
        assert!(matches!(err, PaymentError::DuplicateRequestId(_)));
    }

    #[tokio::test]
    async fn test_update_unknown_id() {
        let ledger = InMemoryLedger::new();
        let err = ledger
            .update_payment_request(Uuid::now_v7(), PaymentUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_by_status_ordered_by_requested_at() {
        let ledger = InMemoryLedger::new();
        let base = Utc::now();

        // Inserted out of order on purpose.
        let later = PaymentRequest::new("0xBBB", 2, None, base + Duration::minutes(5));
        let earlier = PaymentRequest::new("0xAAA", 1, None, base);
        ledger.insert_payment_request(later.clone()).await.unwrap();
        ledger.insert_payment_request(earlier.clone()).await.unwrap();

        let pending = ledger
            .get_payment_requests_by_status(PaymentStatus::PendingApproval)
            .await
            .unwrap();
        assert_eq!(
            pending.iter().map(|r| r.id).collect::<Vec<_>>(),
            vec![earlier.id, later.id]
        );
    }

    #[tokio::test]
    async fn test_since_filters_window() {
        let ledger = InMemoryLedger::new();
        let base = Utc::now();

        let old = PaymentRequest::new("0xAAA", 1, None, base - Duration::hours(2));
        let recent = PaymentRequest::new("0xBBB", 2, None, base);
        ledger.insert_payment_request(old).await.unwrap();
        ledger.insert_payment_request(recent.clone()).await.unwrap();

        let since = ledger
            .get_payment_requests_since(base - Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(since.len(), 1);
        assert_eq!(since[0].id, recent.id);
    }

    #[tokio::test]
    async fn test_recent_transactions_most_recent_first() {
        let ledger = InMemoryLedger::new();
        let base = Utc::now();

        for i in 0..3u64 {
            let request =
                PaymentRequest::new("0xAAA", i, None, base + Duration::seconds(i as i64));
            ledger
                .insert_transaction(Transaction::creation(&request))
                .await
                .unwrap();
        }

        let recent = ledger.get_recent_transactions(2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].amount_cents, 2);
        assert_eq!(recent[1].amount_cents, 1);
        assert!(recent.iter().all(|t| t.r#type == TransactionType::Creation));
    }
}
