use crate::domain::ports::{TransferExecutor, TransferReceipt};
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// A transfer executor that debits a local balance instead of moving real
/// value. Stands in for the external transfer client in the CLI and in tests.
///
/// `Clone` shares the balance, so a test can keep a handle while the engine
/// owns the boxed executor.
#[derive(Clone)]
pub struct SimulatedTransferExecutor {
    balance_cents: Arc<RwLock<u64>>,
}

impl SimulatedTransferExecutor {
    pub fn new(opening_balance_cents: u64) -> Self {
        Self {
            balance_cents: Arc::new(RwLock::new(opening_balance_cents)),
        }
    }

    pub async fn balance_cents(&self) -> u64 {
        *self.balance_cents.read().await
    }
}

#[async_trait]
impl TransferExecutor for SimulatedTransferExecutor {
    async fn transfer(
        &self,
        to_address: &str,
        amount_cents: u64,
        _note: Option<&str>,
    ) -> Result<TransferReceipt> {
        let mut balance = self.balance_cents.write().await;
        if amount_cents > *balance {
            return Err(PaymentError::TransferError(format!(
                "insufficient funds: balance {} cents, requested {} cents",
                *balance, amount_cents
            )));
        }
        *balance -= amount_cents;

        Ok(TransferReceipt {
            transfer_id: Uuid::now_v7().to_string(),
            status: "completed".to_string(),
            to_address: to_address.to_string(),
            amount_cents,
            balance_after_cents: *balance,
        })
    }
}
