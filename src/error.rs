use crate::domain::payment::PaymentStatus;
use thiserror::Error;
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, PaymentError>;

#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("payment request not found: {0}")]
    NotFound(Uuid),
    #[error("invalid state transition: request {id} is '{status}'")]
    InvalidStateTransition { id: Uuid, status: PaymentStatus },
    #[error("Payment rate limit exceeded")]
    RateLimitExceeded,
    #[error("duplicate payment request id: {0}")]
    DuplicateRequestId(Uuid),
    #[error("transfer failed: {0}")]
    TransferError(String),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[cfg(feature = "storage-rocksdb")]
    #[error("Storage error: {0}")]
    StorageError(#[from] rocksdb::Error),
    #[error("Internal error: {0}")]
    InternalError(Box<dyn std::error::Error + Send + Sync>),
}
