use crate::domain::chat::{Chat, Message};
use crate::domain::payment::{Payment, PaymentStatus};
use crate::domain::ports::{ChatStore, PaymentStore};
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct PaymentTables {
    by_id: HashMap<Uuid, Payment>,
    by_ref: HashMap<String, Uuid>,
}

/// A thread-safe in-memory store for payments.
///
/// Keeps a secondary index from transaction reference to payment id so the
/// uniqueness check and the insert happen under one write lock.
/// `Clone` shares the underlying tables.
#[derive(Default, Clone)]
pub struct InMemoryPaymentStore {
    tables: Arc<RwLock<PaymentTables>>,
}

impl InMemoryPaymentStore {
    /// Creates a new, empty in-memory payment store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentStore for InMemoryPaymentStore {
    async fn create(&self, payment: Payment) -> Result<()> {
        let mut tables = self.tables.write().await;
        let tx_ref = payment.transaction_ref.as_str().to_string();
        if tables.by_ref.contains_key(&tx_ref) {
            return Err(PaymentError::store(format!(
                "duplicate transaction reference {}",
                tx_ref
            )));
        }
        tables.by_ref.insert(tx_ref, payment.id);
        tables.by_id.insert(payment.id, payment);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Payment>> {
        let tables = self.tables.read().await;
        Ok(tables.by_id.get(&id).cloned())
    }

    async fn find_by_transaction_ref(&self, tx_ref: &str) -> Result<Option<Payment>> {
        let tables = self.tables.read().await;
        Ok(tables
            .by_ref
            .get(tx_ref)
            .and_then(|id| tables.by_id.get(id))
            .cloned())
    }

    async fn find_by_job(&self, job_id: Uuid) -> Result<Vec<Payment>> {
        let tables = self.tables.read().await;
        let mut payments: Vec<Payment> = tables
            .by_id
            .values()
            .filter(|p| p.job_id == job_id)
            .cloned()
            .collect();
        payments.sort_by_key(|p| p.created_at);
        Ok(payments)
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: PaymentStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut tables = self.tables.write().await;
        let payment = tables
            .by_id
            .get_mut(&id)
            .ok_or_else(|| PaymentError::NotFoundError(format!("payment {}", id)))?;
        payment.status = status;
        payment.updated_at = updated_at;
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[derive(Default)]
struct ChatTables {
    chats: HashMap<Uuid, Chat>,
    messages: HashMap<Uuid, Vec<Message>>,
}

/// A thread-safe in-memory store for chats and their messages.
#[derive(Default, Clone)]
pub struct InMemoryChatStore {
    tables: Arc<RwLock<ChatTables>>,
}

impl InMemoryChatStore {
    /// Creates a new, empty in-memory chat store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChatStore for InMemoryChatStore {
    async fn create_chat(&self, chat: Chat) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.chats.insert(chat.id, chat);
        Ok(())
    }

    async fn get_chat(&self, id: Uuid) -> Result<Option<Chat>> {
        let tables = self.tables.read().await;
        Ok(tables.chats.get(&id).cloned())
    }

    async fn create_message(&self, message: Message) -> Result<()> {
        let mut tables = self.tables.write().await;
        if !tables.chats.contains_key(&message.chat_id) {
            return Err(PaymentError::NotFoundError(format!(
                "chat {}",
                message.chat_id
            )));
        }
        tables
            .messages
            .entry(message.chat_id)
            .or_default()
            .push(message);
        Ok(())
    }

    async fn messages(&self, chat_id: Uuid) -> Result<Vec<Message>> {
        let tables = self.tables.read().await;
        Ok(tables.messages.get(&chat_id).cloned().unwrap_or_default())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
