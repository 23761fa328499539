use crate::error::{PaymentError, Result};
use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Currency applied when the payer does not name one.
pub const DEFAULT_CURRENCY: &str = "ETB";

/// Integer digits an [`Amount`] may carry in front of its 2 fractional digits.
pub const MAX_AMOUNT_INTEGER_DIGITS: u32 = 18;

/// Lifecycle state of a payment.
///
/// `Pending` is the only initial state. `Success` and `Failed` are written by
/// confirmation; `Refunded` is only ever set by processes outside this crate.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Success,
    Failed,
    Refunded,
}

impl PaymentStatus {
    /// Maps the gateway's verification verdict onto a terminal status.
    pub fn from_verification(verified: bool) -> Self {
        if verified { Self::Success } else { Self::Failed }
    }

    /// The lowercase name stored and sent over the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Refunded => "refunded",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Upstream processor a payment is collected through.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentProvider {
    #[default]
    Chapa,
    Telebirr,
    CbeBirr,
}

/// A non-negative monetary amount carried with exactly 2 fractional digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(Decimal);

impl Amount {
    /// Validates `value` and fixes it to 2 fractional digits, rounding
    /// midpoints away from zero.
    ///
    /// # Errors
    /// `ValidationError` if `value` is negative or has more than
    /// [`MAX_AMOUNT_INTEGER_DIGITS`] integer digits once rounded.
    pub fn new(value: Decimal) -> Result<Self> {
        if value < Decimal::ZERO {
            return Err(PaymentError::ValidationError(
                "Amount must not be negative".to_string(),
            ));
        }
        let mut fixed = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        if fixed.is_zero() {
            fixed = Decimal::ZERO;
        }
        let limit = Decimal::from(10u64.pow(MAX_AMOUNT_INTEGER_DIGITS));
        if fixed >= limit {
            return Err(PaymentError::ValidationError(format!(
                "Amount {} exceeds {} integer digits",
                value, MAX_AMOUNT_INTEGER_DIGITS
            )));
        }
        fixed.rescale(2);
        if fixed.scale() != 2 {
            return Err(PaymentError::ValidationError(format!(
                "Amount {} cannot be carried with 2 decimal places",
                value
            )));
        }
        Ok(Self(fixed))
    }

    /// Parses a decimal string such as `"150"` or `" 99.5 "`.
    pub fn parse(raw: &str) -> Result<Self> {
        let value = Decimal::from_str(raw.trim()).map_err(|e| {
            PaymentError::ValidationError(format!("Invalid amount '{}': {}", raw, e))
        })?;
        Self::new(value)
    }

    /// The underlying decimal, always at scale 2.
    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = PaymentError;

    fn try_from(value: Decimal) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

/// An upper-case currency code, e.g. `ETB`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Currency(String);

impl Currency {
    /// Empty or absent input falls back to [`DEFAULT_CURRENCY`].
    pub fn parse(raw: Option<&str>) -> Result<Self> {
        let code = raw.map(str::trim).unwrap_or_default();
        if code.is_empty() {
            return Ok(Self::default());
        }
        if code.len() > 10 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(PaymentError::ValidationError(format!(
                "Invalid currency code '{}'",
                code
            )));
        }
        Ok(Self(code.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Currency {
    fn default() -> Self {
        Self(DEFAULT_CURRENCY.to_string())
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

static LAST_STAMP: AtomicU64 = AtomicU64::new(0);

/// Nanoseconds since the epoch, strictly increasing across calls in this process.
fn next_stamp() -> u64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default();
    let mut last = LAST_STAMP.load(Ordering::Relaxed);
    loop {
        let next = now.max(last + 1);
        match LAST_STAMP.compare_exchange_weak(last, next, Ordering::AcqRel, Ordering::Relaxed) {
            Ok(_) => return next,
            Err(actual) => last = actual,
        }
    }
}

/// Merchant-side reference shared with the gateway: `job-<job id>-<stamp>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionRef(String);

impl TransactionRef {
    /// Generates `job-<job_id>-<stamp>` with a process-wide, strictly
    /// increasing nanosecond stamp, so back-to-back calls never collide.
    pub fn for_job(job_id: Uuid) -> Self {
        Self(format!("job-{}-{}", job_id, next_stamp()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<TransactionRef> for String {
    fn from(tx_ref: TransactionRef) -> Self {
        tx_ref.0
    }
}

/// One attempt to collect money for a job posting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub job_id: Uuid,
    pub employer_id: Uuid,
    pub amount: Amount,
    pub currency: Currency,
    pub status: PaymentStatus,
    pub provider: PaymentProvider,
    pub transaction_ref: TransactionRef,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    /// Builds a fully-populated payment in the `Pending` state.
    pub fn pending(
        job_id: Uuid,
        employer_id: Uuid,
        amount: Amount,
        currency: Currency,
        provider: PaymentProvider,
        transaction_ref: TransactionRef,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            job_id,
            employer_id,
            amount,
            currency,
            status: PaymentStatus::Pending,
            provider,
            transaction_ref,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Parses a job or employer reference, rejecting malformed and nil UUIDs.
pub fn parse_reference(field: &str, raw: &str) -> Result<Uuid> {
    let id = Uuid::parse_str(raw.trim()).map_err(|e| {
        PaymentError::ValidationError(format!("Invalid {} '{}': {}", field, raw, e))
    })?;
    if id.is_nil() {
        return Err(PaymentError::ValidationError(format!(
            "{} must not be the nil identifier",
            field
        )));
    }
    Ok(id)
}
