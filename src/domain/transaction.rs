use super::payment::PaymentRequest;
use super::ports::TransferReceipt;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Creation,
    Rejection,
    Transfer,
}

/// Append-only audit entry, one per financially meaningful event.
///
/// Entries are written at request creation, at rejection, and at successful
/// execution. A failed transfer writes no entry since nothing financial
/// occurred. Entries are never mutated or removed.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Transaction {
    pub id: Uuid,
    pub r#type: TransactionType,
    pub amount_cents: u64,
    pub balance_after_cents: Option<u64>,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

impl Transaction {
    pub fn creation(request: &PaymentRequest) -> Self {
        Self {
            id: Uuid::now_v7(),
            r#type: TransactionType::Creation,
            amount_cents: request.amount_cents,
            balance_after_cents: None,
            description: format!(
                "payment request to {} created ({})",
                request.to_address, request.status
            ),
            timestamp: request.requested_at,
        }
    }

    pub fn rejection(request: &PaymentRequest, reason: &str, at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            r#type: TransactionType::Rejection,
            amount_cents: request.amount_cents,
            balance_after_cents: None,
            description: format!(
                "payment request to {} rejected: {}",
                request.to_address, reason
            ),
            timestamp: at,
        }
    }

    pub fn transfer(request: &PaymentRequest, receipt: &TransferReceipt, at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            r#type: TransactionType::Transfer,
            amount_cents: receipt.amount_cents,
            balance_after_cents: Some(receipt.balance_after_cents),
            description: format!(
                "transferred {} cents to {} ({})",
                receipt.amount_cents, request.to_address, receipt.transfer_id
            ),
            timestamp: at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::payment::PaymentStatus;

    #[test]
    fn test_creation_entry_carries_request_amount() {
        let now = Utc::now();
        let request = PaymentRequest::new("0xAAA", 1500, None, now);
        let entry = Transaction::creation(&request);

        assert_eq!(entry.r#type, TransactionType::Creation);
        assert_eq!(entry.amount_cents, 1500);
        assert_eq!(entry.balance_after_cents, None);
        assert_eq!(entry.timestamp, now);
        assert!(entry.description.contains("0xAAA"));
    }

    #[test]
    fn test_creation_entry_names_initial_status() {
        let now = Utc::now();
        let mut request = PaymentRequest::new("0xAAA", 50, None, now);
        request.status = PaymentStatus::Approved;

        let entry = Transaction::creation(&request);
        assert!(entry.description.contains("approved"));
    }

    #[test]
    fn test_transfer_entry_records_balance_after() {
        let now = Utc::now();
        let request = PaymentRequest::new("0xBBB", 200, None, now);
        let receipt = TransferReceipt {
            transfer_id: "tx-1".into(),
            status: "completed".into(),
            to_address: "0xBBB".into(),
            amount_cents: 200,
            balance_after_cents: 800,
        };

        let entry = Transaction::transfer(&request, &receipt, now);
        assert_eq!(entry.r#type, TransactionType::Transfer);
        assert_eq!(entry.amount_cents, 200);
        assert_eq!(entry.balance_after_cents, Some(800));
    }
}
