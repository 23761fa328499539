//! Client for the Chapa hosted-checkout REST API.
//!
//! Both operations decode the same `{status, message, data}` envelope. A
//! transport fault, a non-2xx answer or an undecodable body is a
//! `GatewayError`; a well-formed verify answer that does not confirm the
//! payment is `Ok(false)`, including one that carries no verdict at all.

use crate::config::ChapaConfig;
use crate::domain::payment::PaymentProvider;
use crate::domain::ports::{CheckoutRequest, PaymentGateway};
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

const SUCCESS: &str = "success";

#[derive(Serialize)]
struct InitializeBody<'a> {
    amount: String,
    currency: &'a str,
    email: &'a str,
    first_name: &'a str,
    last_name: &'a str,
    tx_ref: &'a str,
    callback_url: &'a str,
    return_url: &'a str,
}

impl<'a> From<&'a CheckoutRequest> for InitializeBody<'a> {
    fn from(req: &'a CheckoutRequest) -> Self {
        Self {
            amount: req.amount.to_string(),
            currency: req.currency.as_str(),
            email: &req.email,
            first_name: &req.first_name,
            last_name: &req.last_name,
            tx_ref: req.tx_ref.as_str(),
            callback_url: &req.callback_url,
            return_url: &req.return_url,
        }
    }
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: serde_json::Value,
    #[serde(default)]
    data: serde_json::Value,
}

impl Envelope {
    fn is_success(&self) -> bool {
        self.status == SUCCESS
    }

    /// The `message` field as text; Chapa sends a string or a field-error object.
    fn message(&self) -> String {
        match &self.message {
            serde_json::Value::Null => String::new(),
            serde_json::Value::String(text) => text.clone(),
            other => other.to_string(),
        }
    }

    fn data<T: DeserializeOwned>(self, op: &str) -> Result<T> {
        serde_json::from_value(self.data).map_err(|e| {
            PaymentError::GatewayError(format!("chapa {} returned malformed data: {}", op, e))
        })
    }
}

#[derive(Deserialize)]
struct InitializeData {
    checkout_url: String,
}

#[derive(Deserialize)]
struct VerifyData {
    #[serde(default)]
    tx_ref: Option<String>,
    #[serde(default)]
    status: String,
}

#[derive(Clone)]
pub struct ChapaClient {
    http: Client,
    base_url: Url,
    secret_key: String,
    timeout: Duration,
}

impl ChapaClient {
    /// Builds a client for the API rooted at `config.base_url`.
    ///
    /// Every request carries `config.secret_key` as a bearer token and is
    /// abandoned after `config.timeout`.
    ///
    /// # Errors
    /// `GatewayError` if the base URL does not parse or cannot carry a path.
    pub fn new(config: &ChapaConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            PaymentError::GatewayError(format!("invalid Chapa base URL '{}': {}", config.base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(PaymentError::GatewayError(format!(
                "invalid Chapa base URL '{}'",
                config.base_url
            )));
        }
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PaymentError::GatewayError(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url,
            secret_key: config.secret_key.clone(),
            timeout: config.timeout,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Checked in `new`: the base URL can carry path segments.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(["v1", "transaction"]).extend(segments);
        }
        url
    }

    /// Sends the request and decodes the envelope of a 2xx answer.
    async fn call(&self, op: &str, request: RequestBuilder) -> Result<Envelope> {
        let response = request
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(|e| self.transport_error(op, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(op, e))?;

        if !status.is_success() {
            return Err(PaymentError::GatewayError(format!(
                "chapa {} failed with HTTP {}: {}",
                op, status, body
            )));
        }

        serde_json::from_str(&body).map_err(|e| {
            PaymentError::GatewayError(format!("chapa {} returned malformed body: {}", op, e))
        })
    }

    fn transport_error(&self, op: &str, err: reqwest::Error) -> PaymentError {
        if err.is_timeout() {
            PaymentError::GatewayError(format!(
                "chapa {} timed out after {:?}",
                op, self.timeout
            ))
        } else {
            PaymentError::GatewayError(format!("chapa {} request failed: {}", op, err))
        }
    }
}

#[async_trait]
impl PaymentGateway for ChapaClient {
    fn provider(&self) -> PaymentProvider {
        PaymentProvider::Chapa
    }

    async fn initialize(&self, request: &CheckoutRequest) -> Result<String> {
        let url = self.endpoint(&["initialize"]);
        debug!(tx_ref = %request.tx_ref, %url, "initializing chapa transaction");

        let envelope = self
            .call("initialize", self.http.post(url).json(&InitializeBody::from(request)))
            .await?;

        if !envelope.is_success() {
            return Err(PaymentError::GatewayError(format!(
                "chapa initialize status: '{}' ({})",
                envelope.status,
                envelope.message()
            )));
        }

        let data: InitializeData = envelope.data("initialize")?;
        Ok(data.checkout_url)
    }

    async fn verify(&self, tx_ref: &str) -> Result<bool> {
        let url = self.endpoint(&["verify", tx_ref]);
        debug!(tx_ref, %url, "verifying chapa transaction");

        let envelope = self.call("verify", self.http.get(url)).await?;

        if !envelope.is_success() {
            warn!(tx_ref, status = %envelope.status, message = %envelope.message(), "chapa did not verify transaction");
            return Ok(false);
        }

        let Some(data) = envelope.data::<Option<VerifyData>>("verify")? else {
            warn!(tx_ref, "chapa verify answered without transaction data");
            return Ok(false);
        };
        if let Some(echoed) = data.tx_ref.as_deref()
            && echoed != tx_ref
        {
            warn!(tx_ref, echoed, "chapa verify echoed a different reference");
        }
        Ok(data.status == SUCCESS)
    }
}
