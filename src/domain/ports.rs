use super::chat::{Chat, Message};
use super::payment::{Amount, Currency, Payment, PaymentProvider, PaymentStatus, TransactionRef};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[async_trait]
pub trait PaymentStore: Send + Sync {
    /// Inserts a new payment. Fails if its transaction reference is already taken.
    async fn create(&self, payment: Payment) -> Result<()>;
    async fn get(&self, id: Uuid) -> Result<Option<Payment>>;
    async fn find_by_transaction_ref(&self, tx_ref: &str) -> Result<Option<Payment>>;
    /// All payments for a job, oldest first.
    async fn find_by_job(&self, job_id: Uuid) -> Result<Vec<Payment>>;
    async fn update_status(
        &self,
        id: Uuid,
        status: PaymentStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<()>;
    async fn ping(&self) -> Result<()>;
}

#[async_trait]
pub trait ChatStore: Send + Sync {
    async fn create_chat(&self, chat: Chat) -> Result<()>;
    async fn get_chat(&self, id: Uuid) -> Result<Option<Chat>>;
    /// Fails with `NotFoundError` if the message's chat does not exist.
    async fn create_message(&self, message: Message) -> Result<()>;
    /// Messages of a chat, oldest first.
    async fn messages(&self, chat_id: Uuid) -> Result<Vec<Message>>;
    async fn ping(&self) -> Result<()>;
}

/// Everything the gateway needs to open a hosted checkout session.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutRequest {
    pub amount: Amount,
    pub currency: Currency,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub tx_ref: TransactionRef,
    pub callback_url: String,
    pub return_url: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    fn provider(&self) -> PaymentProvider;
    /// Opens a checkout session and returns the URL the payer is sent to.
    async fn initialize(&self, request: &CheckoutRequest) -> Result<String>;
    /// `Ok(false)` means the gateway answered but did not confirm the payment.
    async fn verify(&self, tx_ref: &str) -> Result<bool>;
}

pub type PaymentStoreBox = Box<dyn PaymentStore>;
pub type ChatStoreBox = Box<dyn ChatStore>;
pub type PaymentGatewayBox = Box<dyn PaymentGateway>;
