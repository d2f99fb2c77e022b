use crate::domain::payment::{PaymentRequest, PaymentStatus, PaymentUpdate};
use crate::domain::ports::PaymentLedger;
use crate::domain::transaction::Transaction;
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rocksdb::{ColumnFamilyDescriptor, DB, IteratorMode, Options};
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

/// Column Family for payment request rows.
pub const CF_PAYMENT_REQUESTS: &str = "payment_requests";
/// Column Family for the append-only transaction log.
pub const CF_TRANSACTIONS: &str = "transactions";

/// A persistent ledger backed by RocksDB.
///
/// Requests and the transaction log live in separate Column Families keyed by
/// their UUID v7 string, so lexicographic key order matches creation order.
/// Durability is the point: a request left `approved` before a crash is still
/// approved, and executable, after reopen.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDbLedger {
    db: Arc<DB>,
}

impl RocksDbLedger {
    /// Opens or creates a RocksDB instance at the specified path, ensuring
    /// both column families exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_requests = ColumnFamilyDescriptor::new(CF_PAYMENT_REQUESTS, Options::default());
        let cf_transactions = ColumnFamilyDescriptor::new(CF_TRANSACTIONS, Options::default());

        let db = DB::open_cf_descriptors(&opts, path, vec![cf_requests, cf_transactions])?;

        Ok(Self { db: Arc::new(db) })
    }

    fn cf_handle(&self, name: &str) -> Result<&rocksdb::ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| {
            PaymentError::InternalError(Box::new(std::io::Error::other(format!(
                "{name} column family not found"
            ))))
        })
    }

    fn encode<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        serde_json::to_vec(value).map_err(|e| PaymentError::InternalError(Box::new(e)))
    }

    fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
        serde_json::from_slice(bytes).map_err(|e| PaymentError::InternalError(Box::new(e)))
    }

    fn scan_requests(&self, mut keep: impl FnMut(&PaymentRequest) -> bool) -> Result<Vec<PaymentRequest>> {
        let cf = self.cf_handle(CF_PAYMENT_REQUESTS)?;
        let mut matching = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, value) = item?;
            let request: PaymentRequest = Self::decode(&value)?;
            if keep(&request) {
                matching.push(request);
            }
        }
        matching.sort_by_key(|r| (r.requested_at, r.id));
        Ok(matching)
    }
}

#[async_trait]
impl PaymentLedger for RocksDbLedger {
    async fn insert_payment_request(&self, request: PaymentRequest) -> Result<()> {
        let cf = self.cf_handle(CF_PAYMENT_REQUESTS)?;
        let key = request.id.to_string();

        // Probe without copying the value out.
        if self.db.get_pinned_cf(cf, &key)?.is_some() {
            return Err(PaymentError::DuplicateRequestId(request.id));
        }

        self.db.put_cf(cf, key, Self::encode(&request)?)?;
        Ok(())
    }

    async fn update_payment_request(&self, id: Uuid, update: PaymentUpdate) -> Result<()> {
        let cf = self.cf_handle(CF_PAYMENT_REQUESTS)?;
        let key = id.to_string();

        let bytes = self
            .db
            .get_cf(cf, &key)?
            .ok_or(PaymentError::NotFound(id))?;
        let mut request: PaymentRequest = Self::decode(&bytes)?;
        update.apply(&mut request);

        self.db.put_cf(cf, key, Self::encode(&request)?)?;
        Ok(())
    }

    async fn get_payment_request_by_id(&self, id: Uuid) -> Result<Option<PaymentRequest>> {
        let cf = self.cf_handle(CF_PAYMENT_REQUESTS)?;
        match self.db.get_cf(cf, id.to_string())? {
            Some(bytes) => Ok(Some(Self::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn get_payment_requests_by_status(
        &self,
        status: PaymentStatus,
    ) -> Result<Vec<PaymentRequest>> {
        self.scan_requests(|r| r.status == status)
    }

    async fn get_payment_requests_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<PaymentRequest>> {
        self.scan_requests(|r| r.requested_at >= since)
    }

    async fn insert_transaction(&self, tx: Transaction) -> Result<()> {
        let cf = self.cf_handle(CF_TRANSACTIONS)?;
        self.db
            .put_cf(cf, tx.id.to_string(), Self::encode(&tx)?)?;
        Ok(())
    }

    async fn get_recent_transactions(&self, limit: usize) -> Result<Vec<Transaction>> {
        let cf = self.cf_handle(CF_TRANSACTIONS)?;

        // Keys are UUID v7 strings, so reverse key order is reverse
        // chronological order.
        let mut transactions = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::End).take(limit) {
            let (_key, value) = item?;
            transactions.push(Self::decode(&value)?);
        }
        Ok(transactions)
    }
}
