//! The request/response transaction pipeline.
//!
//! A [`Transaction`] accumulates request parameters for one gateway call, owns
//! the order number generated for it, and on [`Transaction::commit`] performs
//! validation, serialization, authentication, the HTTP exchange, status
//! classification and response decoding.
//!
//! A transaction borrows its [`Gateway`] immutably, so any number of
//! transactions may share one gateway across threads. Mutating a single
//! transaction requires `&mut`, so it cannot be mutated concurrently.

use crate::billing::{Address, CreditCard};
use crate::errors::{BeanstreamError, Result};
use crate::gateway::Gateway;
use crate::requests::{TransactionKind, ValidationContext};
use crate::response::{GatewayResponse, Response};
use crate::types::{
    fields, Endpoint, Params, BILLING_ADDRESS_PREFIX, EMPTY_HASH_SENTINEL, MAX_REFS,
    SHIPPING_ADDRESS_PREFIX,
};
use crate::utils::{encode_params, encode_passcode_header, generate_order_number, redacted_body};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use std::fmt;
use tracing::{debug, error, instrument, warn};
use url::form_urlencoded;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Lifecycle of a transaction.
///
/// `Completed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    /// Parameters populated, nothing sent yet
    Built,
    /// The HTTP request has been issued
    Sent,
    /// A gateway response was received and classified
    Completed,
    /// Local configuration or the network failed
    Failed,
}

/// One logical exchange with the gateway.
///
/// `K` carries the typed fields of the request kind and decides the endpoint,
/// the validation rules and the response type.
pub struct Transaction<'g, K: TransactionKind> {
    gateway: &'g Gateway,
    kind: K,
    params: Params,
    response_params: Params,
    order_number: String,
    has_credit_card: bool,
    has_billing_address: bool,
    state: TransactionState,
}

impl<'g, K: TransactionKind> Transaction<'g, K> {
    /// Creates a transaction and assigns it a fresh order number.
    pub fn new(gateway: &'g Gateway, kind: K) -> Self {
        let order_number = generate_order_number();
        let mut params = Params::new();
        params.insert(fields::ORDER_NUMBER.to_string(), order_number.clone());

        Self {
            gateway,
            kind,
            params,
            response_params: Params::new(),
            order_number,
            has_credit_card: false,
            has_billing_address: false,
            state: TransactionState::Built,
        }
    }

    /// Order number generated for this transaction.
    pub fn order_number(&self) -> &str {
        &self.order_number
    }

    /// Current lifecycle state.
    pub fn state(&self) -> TransactionState {
        self.state
    }

    /// Endpoint this transaction is sent to.
    pub fn endpoint(&self) -> Endpoint {
        self.kind.endpoint()
    }

    /// Typed request fields.
    pub fn kind(&self) -> &K {
        &self.kind
    }

    /// Mutable access to the typed request fields.
    pub fn kind_mut(&mut self) -> &mut K {
        &mut self.kind
    }

    /// Parameters merged through the setters.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Whether a card has been set.
    pub fn has_credit_card(&self) -> bool {
        self.has_credit_card
    }

    /// Whether a billing address has been set.
    pub fn has_billing_address(&self) -> bool {
        self.has_billing_address
    }

    /// The full parameter set that will be sent.
    ///
    /// Typed kind fields are written first; fields merged through the setters
    /// are applied on top, so the last write wins.
    pub fn wire_params(&self) -> Params {
        let mut wire = Params::new();
        self.kind.write_params(&mut wire);
        wire.extend(self.params.iter().map(|(k, v)| (k.clone(), v.clone())));
        wire
    }

    /// Merges the card fields.
    ///
    /// Fails with a validation error, without touching any parameter, when the
    /// gateway requires CVD and the card has none.
    pub fn set_card(&mut self, card: &CreditCard) -> Result<&mut Self> {
        if self.gateway.config().require_cvd && !card.has_cvd() {
            error!("CVD required");
            return Err(BeanstreamError::Validation("CVD required".to_string()));
        }

        self.params.extend(card.params());
        self.has_credit_card = true;
        Ok(self)
    }

    /// Merges the billing address under the `ord` prefix.
    pub fn set_billing_address(&mut self, address: &Address) -> &mut Self {
        self.params.extend(address.params(BILLING_ADDRESS_PREFIX));
        self.has_billing_address = true;
        self
    }

    /// Merges the shipping address under the `shp` prefix.
    pub fn set_shipping_address(&mut self, address: &Address) -> &mut Self {
        self.params.extend(address.params(SHIPPING_ADDRESS_PREFIX));
        self
    }

    /// Sets up to five reference fields.
    ///
    /// Entry `i` (0-based) is written as `ref{i + 1}`; `None` and empty entries
    /// are skipped rather than written blank. More than five entries is a
    /// validation error and nothing is written.
    ///
    /// # Examples
    ///
    /// ```
    /// use beanstream::{Gateway, GatewayConfig};
    /// use rust_decimal::Decimal;
    ///
    /// let gateway = Gateway::new(GatewayConfig::new("300200578")).unwrap();
    /// let mut txn = gateway.purchase_with_payment_profile(Decimal::from(10), "CUST1");
    /// txn.set_refs(&[Some(""), Some("B"), None]).unwrap();
    ///
    /// assert_eq!(txn.params().get("ref2").map(String::as_str), Some("B"));
    /// assert!(!txn.params().contains_key("ref1"));
    /// assert!(!txn.params().contains_key("ref3"));
    /// ```
    pub fn set_refs<S: AsRef<str>>(&mut self, refs: &[Option<S>]) -> Result<&mut Self> {
        if refs.len() > MAX_REFS {
            return Err(BeanstreamError::Validation("too many ref fields".to_string()));
        }

        for (idx, reference) in refs.iter().enumerate() {
            let value = match reference {
                Some(value) => value.as_ref(),
                None => continue,
            };
            if !value.is_empty() {
                self.params.insert(format!("ref{}", idx + 1), value.to_string());
            }
        }
        Ok(self)
    }

    /// Sets the free-form comments field.
    pub fn set_comments(&mut self, comments: impl Into<String>) -> &mut Self {
        self.params.insert(fields::COMMENTS.to_string(), comments.into());
        self
    }

    /// Sets an arbitrary request field, overwriting any previous value.
    pub fn set_param(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Registers a construction parameter handed to the response on success.
    pub fn add_response_param(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> &mut Self {
        self.response_params.insert(key.into(), value.into());
        self
    }

    /// Runs the kind-specific validation without sending anything.
    pub fn validate(&self) -> Result<()> {
        let ctx = ValidationContext {
            config: self.gateway.config(),
            params: &self.params,
            has_credit_card: self.has_credit_card,
            has_billing_address: self.has_billing_address,
        };
        self.kind.validate(&ctx)
    }

    /// Sends the transaction and decodes the gateway's reply.
    ///
    /// Every non-200 status is returned as the matching classified error and
    /// no response is built. A 200 reply is returned as the kind's typed
    /// response even when the gateway declined the business transaction.
    ///
    /// A validation failure leaves the transaction in `Built` so it can be
    /// fixed and committed. Once the transaction leaves `Built`, further calls
    /// fail with [`BeanstreamError::AlreadyCommitted`] and nothing is sent,
    /// since a resend would reuse the order number.
    ///
    /// # Errors
    ///
    /// - `Validation` from the kind's rules
    /// - `Configuration` when no passcode is set for the endpoint
    /// - a status variant (`Forbidden`, `InternalServer`, ...) for non-200 replies
    /// - `HashValidation` when the gateway answers `Empty hash value`
    /// - `Transport` for network failures
    #[instrument(
        skip(self),
        fields(order_number = %self.order_number, endpoint = %self.kind.endpoint())
    )]
    pub async fn commit(&mut self) -> Result<K::Response> {
        if self.state != TransactionState::Built {
            warn!(state = ?self.state, "transaction already committed");
            return Err(BeanstreamError::AlreadyCommitted {
                order_number: self.order_number.clone(),
            });
        }

        self.validate()?;

        let result = self.send().await;
        self.state = match &result {
            Ok(_) => TransactionState::Completed,
            Err(err) if err.status().is_some() => TransactionState::Completed,
            Err(BeanstreamError::HashValidation) | Err(BeanstreamError::Api(_)) => {
                TransactionState::Completed
            }
            Err(_) => TransactionState::Failed,
        };
        result
    }

    async fn send(&mut self) -> Result<K::Response> {
        let gateway = self.gateway;
        let config = gateway.config();
        let endpoint = self.kind.endpoint();

        let passcode = config.passcode_for(endpoint).ok_or_else(|| {
            error!(%endpoint, "no API passcode specified");
            BeanstreamError::Configuration(format!("no API passcode specified for {}", endpoint))
        })?;
        let url = config.endpoint_url(endpoint)?;

        let params = self.wire_params();
        let mut body = encode_params(&params);
        if endpoint == Endpoint::ProcessTransaction {
            if let Some(hasher) = &config.request_hasher {
                let hash = hasher.hash(&body)?;
                body.push('&');
                body.push_str(
                    &form_urlencoded::Serializer::new(String::new())
                        .append_pair(fields::HASH_VALUE, &hash)
                        .finish(),
                );
            }
        }

        debug!(%url, body = %redacted_body(&params), "sending transaction");
        self.state = TransactionState::Sent;

        let response = gateway
            .http_client()
            .post(url)
            .header(AUTHORIZATION, encode_passcode_header(&config.merchant_id, passcode))
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            error!(status = status.as_u16(), "response code not OK");
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    warn!(error = %e, "failed to read error response body");
                    String::new()
                }
            };
            return Err(BeanstreamError::from_status(status.as_u16(), body));
        }

        let bytes = response.bytes().await?;
        let body = String::from_utf8(bytes.to_vec())
            .map_err(|e| BeanstreamError::Api(format!("response body is not UTF-8: {}", e)))?;

        if body == EMPTY_HASH_SENTINEL {
            error!("hash validation required");
            return Err(BeanstreamError::HashValidation);
        }

        debug!(%body, "gateway response");
        let response = Response::from_body(&body).with_context(self.response_params.clone());
        Ok(K::Response::from_response(response))
    }
}

impl<K: TransactionKind + fmt::Debug> fmt::Debug for Transaction<'_, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("order_number", &self.order_number)
            .field("endpoint", &self.kind.endpoint())
            .field("kind", &self.kind)
            .field("params", &redacted_body(&self.params))
            .field("response_params", &self.response_params)
            .field("has_credit_card", &self.has_credit_card)
            .field("has_billing_address", &self.has_billing_address)
            .field("state", &self.state)
            .finish()
    }
}
