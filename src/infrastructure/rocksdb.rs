use crate::domain::chat::{Chat, Message};
use crate::domain::payment::{Payment, PaymentStatus};
use crate::domain::ports::{ChatStore, PaymentStore};
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, Direction, IteratorMode, Options, WriteBatch};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Column Family for payment rows, keyed by payment id.
pub const CF_PAYMENTS: &str = "payments";
/// Column Family mapping transaction reference to payment id.
pub const CF_PAYMENT_REFS: &str = "payment_refs";
/// Column Family for chats, keyed by chat id.
pub const CF_CHATS: &str = "chats";
/// Column Family for messages, keyed by chat id + creation time + message id.
pub const CF_MESSAGES: &str = "messages";

/// A persistent store implementation using RocksDB.
///
/// Implements both `PaymentStore` and `ChatStore` on top of separate Column
/// Families. Payment rows and their reference index are written in a single
/// `WriteBatch`; inserts are serialized so the uniqueness check cannot race.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    write_lock: Arc<Mutex<()>>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that all required column families exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cfs = [CF_PAYMENTS, CF_PAYMENT_REFS, CF_CHATS, CF_MESSAGES]
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()));

        let db = DB::open_cf_descriptors(&opts, path, cfs)?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| PaymentError::store(format!("{} column family not found", name)))
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|_| PaymentError::store("store write lock poisoned"))
    }

    fn read<T: DeserializeOwned>(&self, cf: &str, key: &[u8]) -> Result<Option<T>> {
        match self.db.get_cf(self.cf(cf)?, key)? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    fn write<T: Serialize>(&self, cf: &str, key: &[u8], value: &T) -> Result<()> {
        self.db.put_cf(self.cf(cf)?, key, encode(value)?)?;
        Ok(())
    }
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| PaymentError::store(format!("Serialization error: {}", e)))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes)
        .map_err(|e| PaymentError::store(format!("Deserialization error: {}", e)))
}

fn message_key(message: &Message) -> Vec<u8> {
    let stamp = message.created_at.timestamp_nanos_opt().unwrap_or_default() as u64;
    let mut key = Vec::with_capacity(40);
    key.extend_from_slice(message.chat_id.as_bytes());
    key.extend_from_slice(&stamp.to_be_bytes());
    key.extend_from_slice(message.id.as_bytes());
    key
}

#[async_trait]
impl PaymentStore for RocksDBStore {
    async fn create(&self, payment: Payment) -> Result<()> {
        let _guard = self.lock()?;
        let refs = self.cf(CF_PAYMENT_REFS)?;
        let tx_ref = payment.transaction_ref.as_str().as_bytes();

        if self.db.get_pinned_cf(refs, tx_ref)?.is_some() {
            return Err(PaymentError::store(format!(
                "duplicate transaction reference {}",
                payment.transaction_ref
            )));
        }

        let mut batch = WriteBatch::default();
        batch.put_cf(self.cf(CF_PAYMENTS)?, payment.id.as_bytes(), encode(&payment)?);
        batch.put_cf(refs, tx_ref, payment.id.as_bytes());
        self.db.write(batch)?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Payment>> {
        self.read(CF_PAYMENTS, id.as_bytes())
    }

    async fn find_by_transaction_ref(&self, tx_ref: &str) -> Result<Option<Payment>> {
        let Some(id) = self.db.get_cf(self.cf(CF_PAYMENT_REFS)?, tx_ref.as_bytes())? else {
            return Ok(None);
        };
        let id = Uuid::from_slice(&id).map_err(PaymentError::store)?;
        self.read(CF_PAYMENTS, id.as_bytes())
    }

    async fn find_by_job(&self, job_id: Uuid) -> Result<Vec<Payment>> {
        let mut payments = Vec::new();
        for item in self.db.iterator_cf(self.cf(CF_PAYMENTS)?, IteratorMode::Start) {
            let (_key, value) = item?;
            let payment: Payment = decode(&value)?;
            if payment.job_id == job_id {
                payments.push(payment);
            }
        }
        payments.sort_by_key(|p| p.created_at);
        Ok(payments)
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: PaymentStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<()> {
        let _guard = self.lock()?;
        let mut payment: Payment = self
            .read(CF_PAYMENTS, id.as_bytes())?
            .ok_or_else(|| PaymentError::NotFoundError(format!("payment {}", id)))?;
        payment.status = status;
        payment.updated_at = updated_at;
        self.write(CF_PAYMENTS, id.as_bytes(), &payment)
    }

    async fn ping(&self) -> Result<()> {
        self.cf(CF_PAYMENTS).map(|_| ())
    }
}

#[async_trait]
impl ChatStore for RocksDBStore {
    async fn create_chat(&self, chat: Chat) -> Result<()> {
        self.write(CF_CHATS, chat.id.as_bytes(), &chat)
    }

    async fn get_chat(&self, id: Uuid) -> Result<Option<Chat>> {
        self.read(CF_CHATS, id.as_bytes())
    }

    async fn create_message(&self, message: Message) -> Result<()> {
        if self.db.get_pinned_cf(self.cf(CF_CHATS)?, message.chat_id.as_bytes())?.is_none() {
            return Err(PaymentError::NotFoundError(format!(
                "chat {}",
                message.chat_id
            )));
        }
        self.write(CF_MESSAGES, &message_key(&message), &message)
    }

    async fn messages(&self, chat_id: Uuid) -> Result<Vec<Message>> {
        let prefix = chat_id.as_bytes();
        let iter = self.db.iterator_cf(
            self.cf(CF_MESSAGES)?,
            IteratorMode::From(prefix, Direction::Forward),
        );

        let mut messages = Vec::new();
        for item in iter {
            let (key, value) = item?;
            if !key.starts_with(prefix) {
                break;
            }
            messages.push(decode(&value)?);
        }
        Ok(messages)
    }

    async fn ping(&self) -> Result<()> {
        self.cf(CF_CHATS).map(|_| ())
    }
}
