use crate::config::ChapaConfig;
use crate::domain::payment::{
    Amount, Currency, Payment, PaymentStatus, TransactionRef, parse_reference,
};
use crate::domain::ports::{CheckoutRequest, PaymentGatewayBox, PaymentStoreBox};
use crate::error::{PaymentError, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

/// Raw initiation input as received at the service boundary.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InitiatePayment {
    pub job_id: String,
    pub employer_id: String,
    pub amount: String,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitiatedPayment {
    pub payment_id: Uuid,
    pub tx_ref: TransactionRef,
    pub checkout_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmedPayment {
    pub payment_id: Uuid,
    pub status: PaymentStatus,
}

/// Owns the payment lifecycle: `pending` on initiation, then `success` or
/// `failed` once the gateway has been asked to verify.
///
/// Holds no state of its own. A failed gateway call after the insert leaves
/// the row `pending`; a later `confirm` with the same reference reconciles it.
pub struct PaymentService {
    store: PaymentStoreBox,
    gateway: PaymentGatewayBox,
    return_url: String,
    callback_url: String,
}

impl PaymentService {
    /// Creates a new `PaymentService`.
    ///
    /// # Arguments
    /// * `store` - Where payment records are kept.
    /// * `gateway` - The processor that opens and verifies checkouts.
    /// * `config` - Supplies the return and callback URLs sent with each checkout.
    pub fn new(store: PaymentStoreBox, gateway: PaymentGatewayBox, config: &ChapaConfig) -> Self {
        Self {
            store,
            gateway,
            return_url: config.return_url.clone(),
            callback_url: config.callback_url.clone(),
        }
    }

    /// Records a pending payment and opens a checkout session for it.
    pub async fn initiate(&self, request: InitiatePayment) -> Result<InitiatedPayment> {
        let job_id = parse_reference("job_id", &request.job_id)?;
        let employer_id = parse_reference("employer_id", &request.employer_id)?;
        let amount = Amount::parse(&request.amount)?;
        let currency = Currency::parse(request.currency.as_deref())?;

        let payment = Payment::pending(
            job_id,
            employer_id,
            amount,
            currency,
            self.gateway.provider(),
            TransactionRef::for_job(job_id),
        );
        let payment_id = payment.id;
        let tx_ref = payment.transaction_ref.clone();

        let checkout = CheckoutRequest {
            amount: payment.amount,
            currency: payment.currency.clone(),
            email: request.email,
            first_name: request.first_name,
            last_name: request.last_name,
            tx_ref: tx_ref.clone(),
            callback_url: self.callback_url.clone(),
            return_url: self.return_url.clone(),
        };

        self.store.create(payment).await.inspect_err(|e| {
            error!(%tx_ref, error = %e, "failed to record pending payment");
        })?;
        info!(%payment_id, %tx_ref, %amount, "payment recorded as pending");

        let checkout_url = self.gateway.initialize(&checkout).await.inspect_err(|e| {
            warn!(%payment_id, %tx_ref, error = %e, "checkout initialization failed; payment left pending");
        })?;

        Ok(InitiatedPayment {
            payment_id,
            tx_ref,
            checkout_url,
        })
    }

    /// Asks the gateway for the outcome of `tx_ref` and stores the terminal status.
    ///
    /// Re-confirming a payment that is already `success` or `failed` verifies
    /// again and rewrites whatever the gateway reports.
    pub async fn confirm(&self, tx_ref: &str) -> Result<ConfirmedPayment> {
        let tx_ref = tx_ref.trim();
        if tx_ref.is_empty() {
            return Err(PaymentError::ValidationError(
                "tx_ref is required".to_string(),
            ));
        }

        let payment = self
            .store
            .find_by_transaction_ref(tx_ref)
            .await?
            .ok_or_else(|| {
                PaymentError::NotFoundError(format!("payment with transaction reference {}", tx_ref))
            })?;

        let verified = self.gateway.verify(tx_ref).await.inspect_err(|e| {
            warn!(payment_id = %payment.id, tx_ref, error = %e, "verification failed; status unchanged");
        })?;
        let status = PaymentStatus::from_verification(verified);

        self.store
            .update_status(payment.id, status, Utc::now())
            .await
            .inspect_err(|e| {
                error!(payment_id = %payment.id, tx_ref, error = %e, "failed to store payment status");
            })?;
        info!(payment_id = %payment.id, tx_ref, previous = %payment.status, %status, "payment confirmed");

        Ok(ConfirmedPayment {
            payment_id: payment.id,
            status,
        })
    }

    /// Every payment recorded for a job, oldest first.
    pub async fn payments_for_job(&self, job_id: &str) -> Result<Vec<Payment>> {
        let job_id = parse_reference("job_id", job_id)?;
        self.store.find_by_job(job_id).await
    }

    /// Checks that the payment store answers.
    pub async fn ping(&self) -> Result<()> {
        self.store.ping().await
    }
}
