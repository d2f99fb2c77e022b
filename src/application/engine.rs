use crate::config::EngineConfig;
use crate::domain::clock::ClockBox;
use crate::domain::payment::{AUTO_REVIEWER, PaymentRequest, PaymentStatus, PaymentUpdate};
use crate::domain::ports::{ExecutorBox, LedgerBox, NotifierBox};
use crate::domain::transaction::Transaction;
use crate::error::{PaymentError, Result};
use chrono::Duration;
use tracing::{info, warn};
use uuid::Uuid;

/// Orchestrates the payment request lifecycle: creation with rate limiting
/// and auto-approval, human review, and batch execution of approved rows.
///
/// All state lives behind the ledger port, so the engine survives restarts
/// for free. Concurrent callers may interleave at any await point; the only
/// operation needing mutual exclusion is [`execute_approved_payments`], which
/// a process-local lock serializes so two overlapping invocations can never
/// pay the same request twice.
///
/// [`execute_approved_payments`]: ApprovalEngine::execute_approved_payments
pub struct ApprovalEngine {
    ledger: LedgerBox,
    executor: ExecutorBox,
    notifier: Option<NotifierBox>,
    clock: ClockBox,
    config: EngineConfig,
    execution_lock: tokio::sync::Mutex<()>,
}

impl ApprovalEngine {
    pub fn new(
        ledger: LedgerBox,
        executor: ExecutorBox,
        clock: ClockBox,
        config: EngineConfig,
    ) -> Self {
        Self {
            ledger,
            executor,
            notifier: None,
            clock,
            config,
            execution_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Attaches the optional reviewer notification hook.
    pub fn with_notifier(mut self, notifier: NotifierBox) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Creates a new payment request.
    ///
    /// Denied with `RateLimitExceeded` (writing nothing) when the trailing
    /// hour already holds `rate_limit_per_hour` creations. Requests at or
    /// below the auto-approval threshold are born `approved` with
    /// `reviewed_by = "auto"`; everything else is left `pending_approval` and
    /// routed to the notifier when one is attached. Performs no transfer.
    pub async fn request_payment(
        &self,
        to_address: &str,
        amount_cents: u64,
        note: Option<String>,
    ) -> Result<PaymentRequest> {
        if !self.check_rate_limit().await? {
            warn!(to_address, amount_cents, "payment request denied by rate limit");
            return Err(PaymentError::RateLimitExceeded);
        }

        let now = self.clock.now();
        let mut request = PaymentRequest::new(to_address, amount_cents, note, now);

        let threshold = self.config.auto_approve_threshold_cents;
        if threshold > 0 && amount_cents <= threshold {
            request.status = PaymentStatus::Approved;
            request.reviewed_at = Some(now);
            request.reviewed_by = Some(AUTO_REVIEWER.to_string());
        }

        self.ledger.insert_payment_request(request.clone()).await?;
        self.ledger
            .insert_transaction(Transaction::creation(&request))
            .await?;

        info!(
            id = %request.id,
            to_address,
            amount_cents,
            status = %request.status,
            "payment request created"
        );

        if request.status == PaymentStatus::PendingApproval
            && let Some(notifier) = &self.notifier
        {
            // A broken notification channel must not fail the request.
            if let Err(e) = notifier.notify_pending(&request).await {
                warn!(id = %request.id, error = %e, "reviewer notification failed");
            }
        }

        Ok(request)
    }

    /// Manually approves a pending request. No audit entry is written for a
    /// manual approval; only the creation and the eventual outcome are logged.
    pub async fn approve_payment(&self, request_id: Uuid, reviewed_by: &str) -> Result<()> {
        let request = self.get_request_by_id(request_id).await?;
        if request.status != PaymentStatus::PendingApproval {
            return Err(PaymentError::InvalidStateTransition {
                id: request_id,
                status: request.status,
            });
        }

        let now = self.clock.now();
        self.ledger
            .update_payment_request(request_id, PaymentUpdate::approval(reviewed_by, now))
            .await?;

        info!(id = %request_id, reviewed_by, "payment request approved");
        Ok(())
    }

    /// Rejects a pending request with a reason. Rejection is permanent:
    /// later execution passes never touch the row again.
    pub async fn reject_payment(
        &self,
        request_id: Uuid,
        reviewed_by: &str,
        reason: &str,
    ) -> Result<()> {
        let request = self.get_request_by_id(request_id).await?;
        if request.status != PaymentStatus::PendingApproval {
            return Err(PaymentError::InvalidStateTransition {
                id: request_id,
                status: request.status,
            });
        }

        let now = self.clock.now();
        self.ledger
            .update_payment_request(
                request_id,
                PaymentUpdate::rejection(reviewed_by, reason, now),
            )
            .await?;
        self.ledger
            .insert_transaction(Transaction::rejection(&request, reason, now))
            .await?;

        info!(id = %request_id, reviewed_by, reason, "payment request rejected");
        Ok(())
    }

    /// Executes every approved request, earliest-requested first.
    ///
    /// The whole pass holds a process-local lock: two concurrent invocations
    /// cannot both observe a row as `approved`, so each request is paid at
    /// most once. Each transfer is bounded by the configured timeout; a
    /// failure or timeout marks that row `failed` and the pass moves on to
    /// the remaining rows.
    pub async fn execute_approved_payments(&self) -> Result<()> {
        let _guard = self.execution_lock.lock().await;

        let approved = self
            .ledger
            .get_payment_requests_by_status(PaymentStatus::Approved)
            .await?;

        for request in approved {
            let outcome = tokio::time::timeout(
                self.config.transfer_timeout,
                self.executor.transfer(
                    &request.to_address,
                    request.amount_cents,
                    request.note.as_deref(),
                ),
            )
            .await;

            let now = self.clock.now();
            match outcome {
                Ok(Ok(receipt)) => {
                    let result = serde_json::to_string(&receipt)
                        .map_err(|e| PaymentError::InternalError(Box::new(e)))?;
                    self.ledger
                        .update_payment_request(request.id, PaymentUpdate::execution(result, now))
                        .await?;
                    self.ledger
                        .insert_transaction(Transaction::transfer(&request, &receipt, now))
                        .await?;
                    info!(
                        id = %request.id,
                        transfer_id = %receipt.transfer_id,
                        amount_cents = request.amount_cents,
                        "payment executed"
                    );
                }
                Ok(Err(e)) => {
                    self.ledger
                        .update_payment_request(
                            request.id,
                            PaymentUpdate::failure(e.to_string(), now),
                        )
                        .await?;
                    warn!(id = %request.id, error = %e, "payment execution failed");
                }
                Err(_) => {
                    let detail = format!(
                        "transfer timed out after {}s",
                        self.config.transfer_timeout.as_secs()
                    );
                    self.ledger
                        .update_payment_request(request.id, PaymentUpdate::failure(detail.as_str(), now))
                        .await?;
                    warn!(id = %request.id, detail = %detail, "payment execution timed out");
                }
            }
        }

        Ok(())
    }

    /// All requests still awaiting review, earliest-requested first.
    pub async fn get_pending_requests(&self) -> Result<Vec<PaymentRequest>> {
        self.ledger
            .get_payment_requests_by_status(PaymentStatus::PendingApproval)
            .await
    }

    /// The latest persisted state of one request; `NotFound` for unknown ids.
    pub async fn get_request_by_id(&self, request_id: Uuid) -> Result<PaymentRequest> {
        self.ledger
            .get_payment_request_by_id(request_id)
            .await?
            .ok_or(PaymentError::NotFound(request_id))
    }

    /// Whether another request creation is currently permitted.
    ///
    /// Counts creations in the continuously sliding trailing hour; the window
    /// is anchored to "now" at every check, not to clock-aligned buckets.
    pub async fn check_rate_limit(&self) -> Result<bool> {
        let window_start = self.clock.now() - Duration::hours(1);
        let recent = self.ledger.get_payment_requests_since(window_start).await?;
        Ok((recent.len() as u64) < u64::from(self.config.rate_limit_per_hour))
    }

    /// Up to `limit` audit entries, most recent first.
    pub async fn get_recent_transactions(&self, limit: usize) -> Result<Vec<Transaction>> {
        self.ledger.get_recent_transactions(limit).await
    }
}
