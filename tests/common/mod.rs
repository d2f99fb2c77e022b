use async_trait::async_trait;
use paygate::application::engine::ApprovalEngine;
use paygate::config::EngineConfig;
use paygate::domain::clock::ClockBox;
use paygate::domain::ports::{ExecutorBox, TransferExecutor, TransferReceipt};
use paygate::error::{PaymentError, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use uuid::Uuid;

/// Executor double that counts invocations, optionally stalls to widen race
/// windows, and fails for configured destination addresses.
#[derive(Clone, Default)]
pub struct RecordingExecutor {
    calls: Arc<AtomicUsize>,
    delay: Duration,
    fail_addresses: Vec<String>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing_for(mut self, address: &str) -> Self {
        self.fail_addresses.push(address.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TransferExecutor for RecordingExecutor {
    async fn transfer(
        &self,
        to_address: &str,
        amount_cents: u64,
        _note: Option<&str>,
    ) -> Result<TransferReceipt> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail_addresses.iter().any(|a| a == to_address) {
            return Err(PaymentError::TransferError(format!(
                "destination {to_address} rejected"
            )));
        }
        Ok(TransferReceipt {
            transfer_id: Uuid::now_v7().to_string(),
            status: "completed".to_string(),
            to_address: to_address.to_string(),
            amount_cents,
            balance_after_cents: 0,
        })
    }
}

pub fn in_memory_engine(
    config: EngineConfig,
    executor: ExecutorBox,
    clock: ClockBox,
) -> ApprovalEngine {
    ApprovalEngine::new(
        Box::new(paygate::infrastructure::in_memory::InMemoryLedger::new()),
        executor,
        clock,
        config,
    )
}
