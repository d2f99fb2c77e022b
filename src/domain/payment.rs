use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Reviewer name recorded when a request clears the auto-approval threshold.
pub const AUTO_REVIEWER: &str = "auto";

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    PendingApproval,
    Approved,
    Rejected,
    Executed,
    Failed,
}

impl PaymentStatus {
    /// Terminal statuses admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Rejected | Self::Executed | Self::Failed)
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::PendingApproval => "pending_approval",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Executed => "executed",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// One outbound payment intent.
///
/// Rows are created once, mutated only through [`PaymentUpdate`], and never
/// deleted; the full set of rows is the audit record of every value transfer
/// ever requested.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct PaymentRequest {
    /// Time-sortable unique id (UUID v7).
    pub id: Uuid,
    /// Opaque destination identifier.
    pub to_address: String,
    /// Amount in the smallest currency unit.
    pub amount_cents: u64,
    pub note: Option<String>,
    pub status: PaymentStatus,
    pub requested_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub reviewed_by: Option<String>,
    pub rejection_reason: Option<String>,
    /// Serialized transfer receipt on success, the error text on failure.
    pub execution_result: Option<String>,
    pub executed_at: Option<DateTime<Utc>>,
}

impl PaymentRequest {
    pub fn new(
        to_address: impl Into<String>,
        amount_cents: u64,
        note: Option<String>,
        requested_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            to_address: to_address.into(),
            amount_cents,
            note,
            status: PaymentStatus::PendingApproval,
            requested_at,
            reviewed_at: None,
            reviewed_by: None,
            rejection_reason: None,
            execution_result: None,
            executed_at: None,
        }
    }
}

/// Partial update carrying only the fields a request may legally change.
///
/// Immutable fields (id, destination, amount, note, creation time) have no
/// representation here, so a caller cannot ask the ledger to alter them.
#[derive(Debug, Default, Clone)]
pub struct PaymentUpdate {
    pub status: Option<PaymentStatus>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub reviewed_by: Option<String>,
    pub rejection_reason: Option<String>,
    pub execution_result: Option<String>,
    pub executed_at: Option<DateTime<Utc>>,
}

impl PaymentUpdate {
    /// Manual approval by a named reviewer.
    pub fn approval(reviewed_by: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            status: Some(PaymentStatus::Approved),
            reviewed_at: Some(at),
            reviewed_by: Some(reviewed_by.into()),
            ..Self::default()
        }
    }

    /// Rejection with a recorded reason. Rejections are permanent.
    pub fn rejection(
        reviewed_by: impl Into<String>,
        reason: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            status: Some(PaymentStatus::Rejected),
            reviewed_at: Some(at),
            reviewed_by: Some(reviewed_by.into()),
            rejection_reason: Some(reason.into()),
            ..Self::default()
        }
    }

    /// Successful execution; `result` is the serialized transfer receipt.
    pub fn execution(result: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            status: Some(PaymentStatus::Executed),
            execution_result: Some(result.into()),
            executed_at: Some(at),
            ..Self::default()
        }
    }

    /// Failed execution; `error` is persisted verbatim.
    pub fn failure(error: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            status: Some(PaymentStatus::Failed),
            execution_result: Some(error.into()),
            executed_at: Some(at),
            ..Self::default()
        }
    }

    /// Merges the set fields into `request`, leaving the rest untouched.
    pub fn apply(&self, request: &mut PaymentRequest) {
        if let Some(status) = self.status {
            request.status = status;
        }
        if let Some(at) = self.reviewed_at {
            request.reviewed_at = Some(at);
        }
        if let Some(by) = &self.reviewed_by {
            request.reviewed_by = Some(by.clone());
        }
        if let Some(reason) = &self.rejection_reason {
            request.rejection_reason = Some(reason.clone());
        }
        if let Some(result) = &self.execution_result {
            request.execution_result = Some(result.clone());
        }
        if let Some(at) = self.executed_at {
            request.executed_at = Some(at);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_request_is_pending() {
        let now = Utc::now();
        let request = PaymentRequest::new("0xAAA", 500, None, now);

        assert_eq!(request.status, PaymentStatus::PendingApproval);
        assert_eq!(request.requested_at, now);
        assert!(request.reviewed_at.is_none());
        assert!(request.executed_at.is_none());
    }

    #[test]
    fn test_ids_are_time_sortable() {
        let now = Utc::now();
        let first = PaymentRequest::new("0xAAA", 1, None, now);
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = PaymentRequest::new("0xBBB", 2, None, now);

        // UUID v7 encodes creation time in the most significant bits.
        assert!(first.id < second.id);
    }

    #[test]
    fn test_approval_update_applies_review_fields_only() {
        let now = Utc::now();
        let mut request = PaymentRequest::new("0xAAA", 500, Some("rent".into()), now);

        PaymentUpdate::approval("alice", now).apply(&mut request);

        assert_eq!(request.status, PaymentStatus::Approved);
        assert_eq!(request.reviewed_by.as_deref(), Some("alice"));
        assert_eq!(request.reviewed_at, Some(now));
        // Immutable fields unchanged.
        assert_eq!(request.amount_cents, 500);
        assert_eq!(request.note.as_deref(), Some("rent"));
        assert!(request.rejection_reason.is_none());
    }

    #[test]
    fn test_rejection_update_records_reason() {
        let now = Utc::now();
        let mut request = PaymentRequest::new("0xAAA", 500, None, now);

        PaymentUpdate::rejection("bob", "too large", now).apply(&mut request);

        assert_eq!(request.status, PaymentStatus::Rejected);
        assert_eq!(request.rejection_reason.as_deref(), Some("too large"));
    }

    #[test]
    fn test_status_serde_snake_case() {
        let json = serde_json::to_string(&PaymentStatus::PendingApproval).unwrap();
        assert_eq!(json, "\"pending_approval\"");

        let status: PaymentStatus = serde_json::from_str("\"executed\"").unwrap();
        assert_eq!(status, PaymentStatus::Executed);
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!PaymentStatus::PendingApproval.is_terminal());
        assert!(!PaymentStatus::Approved.is_terminal());
        assert!(PaymentStatus::Rejected.is_terminal());
        assert!(PaymentStatus::Executed.is_terminal());
        assert!(PaymentStatus::Failed.is_terminal());
    }
}
