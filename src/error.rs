use thiserror::Error;

#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Gateway error: {0}")]
    GatewayError(String),
    #[error("Not found: {0}")]
    NotFoundError(String),
    #[error("Store error: {0}")]
    StoreError(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl PaymentError {
    /// Wraps any persistence failure as a `StoreError`.
    pub fn store<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::StoreError(err.into())
    }
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for PaymentError {
    fn from(err: rocksdb::Error) -> Self {
        Self::store(err)
    }
}

pub type Result<T> = std::result::Result<T, PaymentError>;
