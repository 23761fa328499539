//! Adapters for the domain ports: record stores and the payment gateway.

pub mod chapa;
pub mod in_memory;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;

use crate::config::StorageUrl;
use crate::domain::ports::{ChatStoreBox, PaymentStoreBox};
use crate::error::Result;
use in_memory::{InMemoryChatStore, InMemoryPaymentStore};
use tracing::info;

/// Opens the record store named by `DATABASE_URL`.
///
/// `rocksdb:` falls back to in-memory storage when the `storage-rocksdb`
/// feature is not compiled in.
pub fn open_stores(url: &StorageUrl) -> Result<(PaymentStoreBox, ChatStoreBox)> {
    match url {
        StorageUrl::Memory => {
            info!("using in-memory record store");
            Ok(in_memory_stores())
        }
        #[cfg(feature = "storage-rocksdb")]
        StorageUrl::RocksDb(path) => {
            info!(path = %path.display(), "opening RocksDB record store");
            let store = rocksdb::RocksDBStore::open(path)?;
            Ok((Box::new(store.clone()), Box::new(store)))
        }
        #[cfg(not(feature = "storage-rocksdb"))]
        StorageUrl::RocksDb(path) => {
            tracing::warn!(
                path = %path.display(),
                "persistent storage requested, but the 'storage-rocksdb' feature is not enabled; falling back to in-memory storage"
            );
            Ok(in_memory_stores())
        }
    }
}

fn in_memory_stores() -> (PaymentStoreBox, ChatStoreBox) {
    (
        Box::new(InMemoryPaymentStore::new()),
        Box::new(InMemoryChatStore::new()),
    )
}
