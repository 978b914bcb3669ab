//! Gateway configuration and the entry point for building transactions.
//!
//! [`GatewayConfig`] holds the merchant identity, the per-endpoint passcodes
//! and the policy flags. [`Gateway`] pairs it with an HTTP client and hands
//! out transactions that borrow it.

use crate::billing::{Address, CreditCard};
use crate::errors::{BeanstreamError, Result};
use crate::requests::payment::{Payment, PaymentTransaction};
use crate::requests::profile::{PaymentProfile, PaymentProfileTransaction};
use crate::requests::recurring::{RecurringBillingTransaction, RecurringBillingUpdate};
use crate::requests::report::{Report, ReportTransaction};
use crate::transaction::Transaction;
use crate::types::{BillingPeriod, Endpoint, TransactionType, DEFAULT_BASE_URL};
use reqwest::{redirect, Client};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Optional legacy request hashing.
///
/// When configured, the hash of the encoded body of every request sent to the
/// transaction-processing endpoint is appended as `hashValue`. The hasher owns
/// the algorithm and the merchant's hash key.
pub trait RequestHasher: Send + Sync {
    /// Hashes the encoded request body.
    ///
    /// # Errors
    ///
    /// Return a `Configuration` error when the hasher cannot be used.
    fn hash(&self, body: &str) -> Result<String>;
}

/// Configuration for a gateway connection.
///
/// # Examples
///
/// ```
/// use beanstream::GatewayConfig;
/// use beanstream::types::Endpoint;
///
/// let config = GatewayConfig::new("300200578")
///     .with_payment_passcode("payment-secret")
///     .with_reporting_passcode("report-secret")
///     .with_require_cvd(true);
///
/// assert_eq!(config.passcode_for(Endpoint::ProcessTransaction), Some("payment-secret"));
/// assert_eq!(config.passcode_for(Endpoint::ReportDownload), Some("report-secret"));
/// assert_eq!(config.passcode_for(Endpoint::PaymentProfile), None);
/// ```
#[derive(Clone, Deserialize)]
pub struct GatewayConfig {
    /// Merchant identifier
    pub merchant_id: String,

    /// Passcode for the transaction-processing endpoint
    #[serde(default)]
    pub payment_passcode: Option<String>,

    /// Passcode for the payment profile endpoint
    #[serde(default)]
    pub payment_profile_passcode: Option<String>,

    /// Passcode for the recurring billing endpoint
    #[serde(default)]
    pub recurring_billing_passcode: Option<String>,

    /// Passcode for both report endpoints
    #[serde(default)]
    pub reporting_passcode: Option<String>,

    /// Reject cards without verification digits
    #[serde(default)]
    pub require_cvd: bool,

    /// Reject card payments without a billing address
    #[serde(default)]
    pub require_billing_address: bool,

    /// Base URL the endpoint paths are joined to
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Whole-request timeout, read as `timeout_secs` (fractions allowed)
    #[serde(
        rename = "timeout_secs",
        default = "default_timeout",
        deserialize_with = "deserialize_secs"
    )]
    pub timeout: Duration,

    /// Connection timeout, read as `connect_timeout_secs`
    #[serde(
        rename = "connect_timeout_secs",
        default = "default_connect_timeout",
        deserialize_with = "deserialize_secs"
    )]
    pub connect_timeout: Duration,

    /// Legacy request hashing, disabled unless set explicitly
    #[serde(skip)]
    pub request_hasher: Option<Arc<dyn RequestHasher>>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout() -> Duration {
    Duration::from_secs(DEFAULT_TIMEOUT_SECS)
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS)
}

fn deserialize_secs<'de, D>(deserializer: D) -> std::result::Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let secs = f64::deserialize(deserializer)?;
    Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
}

impl GatewayConfig {
    /// Creates a configuration with no passcodes and both policy flags off.
    pub fn new(merchant_id: impl Into<String>) -> Self {
        Self {
            merchant_id: merchant_id.into(),
            payment_passcode: None,
            payment_profile_passcode: None,
            recurring_billing_passcode: None,
            reporting_passcode: None,
            require_cvd: false,
            require_billing_address: false,
            base_url: default_base_url(),
            timeout: default_timeout(),
            connect_timeout: default_connect_timeout(),
            request_hasher: None,
        }
    }

    /// Sets the transaction-processing passcode.
    pub fn with_payment_passcode(mut self, passcode: impl Into<String>) -> Self {
        self.payment_passcode = Some(passcode.into());
        self
    }

    /// Sets the payment profile passcode.
    pub fn with_payment_profile_passcode(mut self, passcode: impl Into<String>) -> Self {
        self.payment_profile_passcode = Some(passcode.into());
        self
    }

    /// Sets the recurring billing passcode.
    pub fn with_recurring_billing_passcode(mut self, passcode: impl Into<String>) -> Self {
        self.recurring_billing_passcode = Some(passcode.into());
        self
    }

    /// Sets the reporting passcode.
    pub fn with_reporting_passcode(mut self, passcode: impl Into<String>) -> Self {
        self.reporting_passcode = Some(passcode.into());
        self
    }

    /// Requires cards to carry verification digits.
    pub fn with_require_cvd(mut self, required: bool) -> Self {
        self.require_cvd = required;
        self
    }

    /// Requires a billing address on card payments.
    pub fn with_require_billing_address(mut self, required: bool) -> Self {
        self.require_billing_address = required;
        self
    }

    /// Points the client at another gateway host, e.g. a sandbox.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sets the whole-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the connection timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Enables legacy request hashing.
    pub fn with_request_hasher(mut self, hasher: impl RequestHasher + 'static) -> Self {
        self.request_hasher = Some(Arc::new(hasher));
        self
    }

    /// Whole-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Connection timeout.
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Passcode used for `endpoint`, if configured and non-empty.
    pub fn passcode_for(&self, endpoint: Endpoint) -> Option<&str> {
        let passcode = match endpoint {
            Endpoint::ProcessTransaction => &self.payment_passcode,
            Endpoint::RecurringBilling => &self.recurring_billing_passcode,
            Endpoint::PaymentProfile => &self.payment_profile_passcode,
            Endpoint::ReportDownload | Endpoint::Report => &self.reporting_passcode,
        };
        passcode.as_deref().filter(|p| !p.is_empty())
    }

    /// Full URL of `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns a `Configuration` error when the base URL is not a valid
    /// http(s) URL.
    pub fn endpoint_url(&self, endpoint: Endpoint) -> Result<Url> {
        let mut base = self.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base = Url::parse(&base).map_err(|e| {
            BeanstreamError::Configuration(format!("invalid gateway URL {}: {}", self.base_url, e))
        })?;
        if !matches!(base.scheme(), "https" | "http") {
            return Err(BeanstreamError::Configuration(format!(
                "unsupported gateway URL scheme: {}",
                base.scheme()
            )));
        }
        base.join(endpoint.path()).map_err(|e| {
            BeanstreamError::Configuration(format!("invalid endpoint URL for {}: {}", endpoint, e))
        })
    }
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |p: &Option<String>| p.as_ref().map(|_| "***");
        f.debug_struct("GatewayConfig")
            .field("merchant_id", &self.merchant_id)
            .field("payment_passcode", &redact(&self.payment_passcode))
            .field("payment_profile_passcode", &redact(&self.payment_profile_passcode))
            .field("recurring_billing_passcode", &redact(&self.recurring_billing_passcode))
            .field("reporting_passcode", &redact(&self.reporting_passcode))
            .field("require_cvd", &self.require_cvd)
            .field("require_billing_address", &self.require_billing_address)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("request_hasher", &self.request_hasher.is_some())
            .finish()
    }
}

/// A configured gateway connection.
///
/// Read-only once built; share it by reference between transactions.
#[derive(Debug, Clone)]
pub struct Gateway {
    config: GatewayConfig,
    http_client: Client,
}

impl Gateway {
    /// Creates a gateway with an HTTP client honouring the configured timeouts.
    ///
    /// Redirects are not followed so that a 302 reaches the status mapping.
    ///
    /// # Errors
    ///
    /// Returns a `Configuration` error if either timeout is zero or the HTTP
    /// client cannot be built.
    pub fn new(config: GatewayConfig) -> Result<Self> {
        if config.timeout().is_zero() || config.connect_timeout().is_zero() {
            return Err(BeanstreamError::Configuration(
                "timeouts must be greater than zero".to_string(),
            ));
        }

        let http_client = Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .redirect(redirect::Policy::none())
            .build()
            .map_err(|e| BeanstreamError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self { config, http_client })
    }

    /// Creates a gateway using a caller-supplied HTTP client.
    pub fn with_client(config: GatewayConfig, http_client: Client) -> Self {
        Self { config, http_client }
    }

    /// Gateway configuration.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub(crate) fn http_client(&self) -> &Client {
        &self.http_client
    }

    fn card_payment(
        &self,
        transaction_type: TransactionType,
        amount: Decimal,
        card: &CreditCard,
        billing_address: Option<&Address>,
    ) -> Result<PaymentTransaction<'_>> {
        let mut txn = Transaction::new(self, Payment::new(transaction_type, amount));
        txn.set_card(card)?;
        if let Some(address) = billing_address {
            txn.set_billing_address(address);
        }
        Ok(txn)
    }

    fn adjustment(
        &self,
        transaction_type: TransactionType,
        transaction_id: impl Into<String>,
        amount: Decimal,
    ) -> PaymentTransaction<'_> {
        let mut txn = Transaction::new(self, Payment::new(transaction_type, amount));
        txn.set_adjustment_id(transaction_id);
        txn
    }

    /// Purchase charged to a card.
    ///
    /// # Errors
    ///
    /// Returns a `Validation` error when CVD is required and the card has none.
    pub fn purchase(
        &self,
        amount: Decimal,
        card: &CreditCard,
        billing_address: Option<&Address>,
    ) -> Result<PaymentTransaction<'_>> {
        self.card_payment(TransactionType::Purchase, amount, card, billing_address)
    }

    /// Pre-authorization on a card.
    ///
    /// # Errors
    ///
    /// Returns a `Validation` error when CVD is required and the card has none.
    pub fn preauth(
        &self,
        amount: Decimal,
        card: &CreditCard,
        billing_address: Option<&Address>,
    ) -> Result<PaymentTransaction<'_>> {
        self.card_payment(TransactionType::PreAuth, amount, card, billing_address)
    }

    /// Completion of an earlier pre-authorization.
    pub fn preauth_completion(
        &self,
        transaction_id: impl Into<String>,
        amount: Decimal,
    ) -> PaymentTransaction<'_> {
        self.adjustment(TransactionType::PreAuthCompletion, transaction_id, amount)
    }

    /// Return (refund) of an earlier purchase.
    pub fn refund(&self, transaction_id: impl Into<String>, amount: Decimal) -> PaymentTransaction<'_> {
        self.adjustment(TransactionType::Return, transaction_id, amount)
    }

    /// Void of an earlier purchase.
    pub fn void_purchase(
        &self,
        transaction_id: impl Into<String>,
        amount: Decimal,
    ) -> PaymentTransaction<'_> {
        self.adjustment(TransactionType::VoidPurchase, transaction_id, amount)
    }

    /// Void of an earlier return.
    pub fn void_return(
        &self,
        transaction_id: impl Into<String>,
        amount: Decimal,
    ) -> PaymentTransaction<'_> {
        self.adjustment(TransactionType::VoidReturn, transaction_id, amount)
    }

    /// Purchase charged to a stored payment profile.
    pub fn purchase_with_payment_profile(
        &self,
        amount: Decimal,
        customer_code: impl Into<String>,
    ) -> PaymentTransaction<'_> {
        let mut txn = Transaction::new(self, Payment::new(TransactionType::Purchase, amount));
        txn.set_customer_code(customer_code);
        txn
    }

    /// Opens a recurring billing account with a first charge to a card.
    ///
    /// # Errors
    ///
    /// Returns a `Validation` error when CVD is required and the card has none.
    pub fn create_recurring_billing_account(
        &self,
        amount: Decimal,
        card: &CreditCard,
        period: BillingPeriod,
        increment: u32,
        billing_address: Option<&Address>,
    ) -> Result<PaymentTransaction<'_>> {
        let mut txn = self.purchase(amount, card, billing_address)?;
        txn.set_recurring(period, increment);
        Ok(txn)
    }

    /// Opens a recurring billing account charged to a payment profile.
    pub fn create_recurring_billing_account_from_payment_profile(
        &self,
        amount: Decimal,
        customer_code: impl Into<String>,
        period: BillingPeriod,
        increment: u32,
    ) -> PaymentTransaction<'_> {
        let mut txn = self.purchase_with_payment_profile(amount, customer_code);
        txn.set_recurring(period, increment);
        txn
    }

    /// Modifies an existing recurring billing account.
    pub fn modify_recurring_billing_account(
        &self,
        account_id: impl Into<String>,
    ) -> RecurringBillingTransaction<'_> {
        Transaction::new(self, RecurringBillingUpdate::new(account_id))
    }

    /// Creates a payment profile from a card.
    ///
    /// # Errors
    ///
    /// Returns a `Validation` error when CVD is required and the card has none.
    pub fn create_payment_profile(
        &self,
        card: &CreditCard,
        billing_address: Option<&Address>,
    ) -> Result<PaymentProfileTransaction<'_>> {
        let mut txn = Transaction::new(self, PaymentProfile::create());
        txn.set_card(card)?;
        if let Some(address) = billing_address {
            txn.set_billing_address(address);
        }
        Ok(txn)
    }

    /// Modifies an existing payment profile.
    pub fn modify_payment_profile(
        &self,
        customer_code: impl Into<String>,
    ) -> PaymentProfileTransaction<'_> {
        Transaction::new(self, PaymentProfile::modify(customer_code))
    }

    /// Fetches an existing payment profile.
    pub fn get_payment_profile(
        &self,
        customer_code: impl Into<String>,
    ) -> PaymentProfileTransaction<'_> {
        Transaction::new(self, PaymentProfile::query(customer_code))
    }

    /// Queries past transactions.
    pub fn query_transactions(&self) -> ReportTransaction<'_> {
        Transaction::new(self, Report::query())
    }

    /// Downloads a report file.
    pub fn download_report(&self) -> ReportTransaction<'_> {
        Transaction::new(self, Report::download())
    }
}
