//! Card and profile payments on the transaction-processing endpoint.
//!
//! Covers purchases, pre-authorizations and their completions, returns, voids
//! and the creation of recurring billing accounts, which the gateway handles
//! as a purchase flagged `trnRecurring`.

use super::{TransactionKind, ValidationContext};
use crate::errors::{BeanstreamError, Result};
use crate::response::{GatewayResponse, Response};
use crate::transaction::Transaction;
use crate::types::{fields, BillingPeriod, CvdStatus, Endpoint, Params, TransactionType};
use crate::utils::{format_amount, parse_amount};
use rust_decimal::Decimal;

const BACKEND_REQUEST: &str = "BACKEND";

/// A payment transaction.
pub type PaymentTransaction<'g> = Transaction<'g, Payment>;

/// Billing schedule for a recurring account created with a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecurringSchedule {
    /// Unit of the billing period
    pub period: BillingPeriod,
    /// Number of periods between charges
    pub increment: u32,
}

/// Typed fields of a payment request.
#[derive(Debug, Clone, PartialEq)]
pub struct Payment {
    transaction_type: TransactionType,
    amount: Decimal,
    adjustment_id: Option<String>,
    customer_code: Option<String>,
    recurring: Option<RecurringSchedule>,
}

impl Payment {
    /// Creates a payment of the given type and amount.
    pub fn new(transaction_type: TransactionType, amount: Decimal) -> Self {
        Self {
            transaction_type,
            amount,
            adjustment_id: None,
            customer_code: None,
            recurring: None,
        }
    }

    /// Transaction type.
    pub fn transaction_type(&self) -> TransactionType {
        self.transaction_type
    }

    /// Amount as given, before wire formatting.
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// Transaction adjusted by a completion, return or void.
    pub fn adjustment_id(&self) -> Option<&str> {
        self.adjustment_id.as_deref()
    }

    /// Payment profile charged instead of a card.
    pub fn customer_code(&self) -> Option<&str> {
        self.customer_code.as_deref()
    }

    /// Recurring schedule, when this payment opens a recurring account.
    pub fn recurring(&self) -> Option<RecurringSchedule> {
        self.recurring
    }
}

impl TransactionKind for Payment {
    type Response = PaymentResponse;

    fn endpoint(&self) -> Endpoint {
        Endpoint::ProcessTransaction
    }

    fn write_params(&self, params: &mut Params) {
        params.insert(fields::REQUEST_TYPE.to_string(), BACKEND_REQUEST.to_string());
        params.insert(
            fields::TRANSACTION_TYPE.to_string(),
            self.transaction_type.code().to_string(),
        );
        params.insert(fields::AMOUNT.to_string(), format_amount(self.amount));
        if let Some(adjustment_id) = &self.adjustment_id {
            params.insert(fields::ADJUSTMENT_ID.to_string(), adjustment_id.clone());
        }
        if let Some(customer_code) = &self.customer_code {
            params.insert(fields::CUSTOMER_CODE.to_string(), customer_code.clone());
        }
        if let Some(schedule) = self.recurring {
            params.insert(fields::RECURRING.to_string(), "1".to_string());
            params.insert(
                fields::BILLING_PERIOD.to_string(),
                schedule.period.code().to_string(),
            );
            params.insert(
                fields::BILLING_INCREMENT.to_string(),
                schedule.increment.to_string(),
            );
        }
    }

    fn validate(&self, ctx: &ValidationContext<'_>) -> Result<()> {
        if self.amount.is_sign_negative() && !self.amount.is_zero() {
            return Err(BeanstreamError::Validation(
                "amount must not be negative".to_string(),
            ));
        }

        if self.transaction_type.is_adjustment() {
            if self.adjustment_id.as_deref().map_or(true, str::is_empty) {
                return Err(BeanstreamError::Validation(format!(
                    "transaction type {} requires an adjustment id",
                    self.transaction_type.code()
                )));
            }
            return Ok(());
        }

        // A profile can also be named through the raw parameter setter.
        let has_profile = self
            .customer_code
            .as_deref()
            .or_else(|| ctx.params.get(fields::CUSTOMER_CODE).map(String::as_str))
            .map_or(false, |c| !c.is_empty());
        if !ctx.has_credit_card && !has_profile {
            return Err(BeanstreamError::Validation(
                "a card or payment profile is required".to_string(),
            ));
        }

        if ctx.config.require_billing_address && !ctx.has_billing_address && !has_profile {
            return Err(BeanstreamError::Validation(
                "billing address required".to_string(),
            ));
        }

        if let Some(schedule) = self.recurring {
            if schedule.increment == 0 {
                return Err(BeanstreamError::Validation(
                    "billing increment must be at least 1".to_string(),
                ));
            }
        }

        Ok(())
    }
}

impl<'g> Transaction<'g, Payment> {
    /// Sets the amount.
    pub fn set_amount(&mut self, amount: Decimal) -> &mut Self {
        self.kind_mut().amount = amount;
        self
    }

    /// Sets the transaction being completed, returned or voided.
    pub fn set_adjustment_id(&mut self, transaction_id: impl Into<String>) -> &mut Self {
        self.kind_mut().adjustment_id = Some(transaction_id.into());
        self
    }

    /// Charges a payment profile instead of a card.
    pub fn set_customer_code(&mut self, customer_code: impl Into<String>) -> &mut Self {
        self.kind_mut().customer_code = Some(customer_code.into());
        self
    }

    /// Opens a recurring billing account with this payment.
    pub fn set_recurring(&mut self, period: BillingPeriod, increment: u32) -> &mut Self {
        self.kind_mut().recurring = Some(RecurringSchedule { period, increment });
        self
    }
}

/// Reply from the transaction-processing endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentResponse {
    response: Response,
}

impl PaymentResponse {
    /// Whether the gateway approved the transaction.
    pub fn approved(&self) -> bool {
        self.response.get("trnApproved") == Some("1")
    }

    /// Gateway message identifier.
    pub fn message_id(&self) -> Option<&str> {
        self.response.get("messageId")
    }

    /// Gateway message text.
    pub fn message(&self) -> Option<&str> {
        self.response.get("messageText")
    }

    /// Authorization code from the issuer.
    pub fn auth_code(&self) -> Option<&str> {
        self.response.get("authCode")
    }

    /// Amount processed, quantized to two places.
    pub fn amount(&self) -> Option<Decimal> {
        self.response.get(fields::AMOUNT).and_then(parse_amount)
    }

    /// Card type code (`VI`, `MC`, ...).
    pub fn card_type(&self) -> Option<&str> {
        self.response.get("cardType")
    }

    /// Transaction type code echoed by the gateway.
    pub fn transaction_type(&self) -> Option<&str> {
        self.response.get(fields::TRANSACTION_TYPE)
    }

    /// Card verification result.
    pub fn cvd_status(&self) -> Option<CvdStatus> {
        self.response.get("cvdId").and_then(CvdStatus::from_code)
    }

    /// Address verification message.
    pub fn avs_message(&self) -> Option<&str> {
        self.response.get("avsMessage")
    }

    /// Recurring billing account opened by this payment.
    pub fn account_id(&self) -> Option<&str> {
        self.response.get(fields::ACCOUNT_ID)
    }

    /// Payment profile charged.
    pub fn customer_code(&self) -> Option<&str> {
        self.response.get(fields::CUSTOMER_CODE)
    }

    /// Error category (`U` for user errors, `S` for system errors).
    pub fn error_type(&self) -> Option<&str> {
        self.response.get("errorType")
    }

    /// Request fields the gateway rejected.
    pub fn error_fields(&self) -> Vec<&str> {
        self.response
            .get("errorFields")
            .map(|list| list.split(',').map(str::trim).filter(|f| !f.is_empty()).collect())
            .unwrap_or_default()
    }
}

impl GatewayResponse for PaymentResponse {
    fn from_response(response: Response) -> Self {
        Self { response }
    }

    fn response(&self) -> &Response {
        &self.response
    }
}
