//! Maintenance of existing recurring billing accounts.
//!
//! Accounts are opened through a payment (see
//! [`Gateway::create_recurring_billing_account`](crate::Gateway::create_recurring_billing_account));
//! this module modifies them afterwards.

use super::{TransactionKind, ValidationContext};
use crate::errors::{BeanstreamError, Result};
use crate::response::{GatewayResponse, Response};
use crate::transaction::Transaction;
use crate::types::{fields, BillingPeriod, BillingState, Endpoint, Params};
use crate::utils::format_amount;
use rust_decimal::Decimal;

const SERVICE_VERSION: &str = "1.0";
const MODIFY_OPERATION: &str = "M";

/// A recurring billing update transaction.
pub type RecurringBillingTransaction<'g> = Transaction<'g, RecurringBillingUpdate>;

/// Typed fields of a recurring billing update.
#[derive(Debug, Clone, PartialEq)]
pub struct RecurringBillingUpdate {
    account_id: String,
    billing_state: Option<BillingState>,
    amount: Option<Decimal>,
    period: Option<(BillingPeriod, u32)>,
}

impl RecurringBillingUpdate {
    /// An update of `account_id`.
    pub fn new(account_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            billing_state: None,
            amount: None,
            period: None,
        }
    }

    /// Account being modified.
    pub fn account_id(&self) -> &str {
        &self.account_id
    }
}

impl TransactionKind for RecurringBillingUpdate {
    type Response = RecurringBillingResponse;

    fn endpoint(&self) -> Endpoint {
        Endpoint::RecurringBilling
    }

    fn write_params(&self, params: &mut Params) {
        params.insert(fields::SERVICE_VERSION.to_string(), SERVICE_VERSION.to_string());
        params.insert(fields::OPERATION_TYPE.to_string(), MODIFY_OPERATION.to_string());
        params.insert(fields::ACCOUNT_ID.to_string(), self.account_id.clone());
        if let Some(state) = self.billing_state {
            params.insert(fields::BILLING_STATE.to_string(), state.code().to_string());
        }
        if let Some(amount) = self.amount {
            params.insert(fields::AMOUNT.to_string(), format_amount(amount));
        }
        if let Some((period, increment)) = self.period {
            params.insert(fields::BILLING_PERIOD.to_string(), period.code().to_string());
            params.insert(fields::BILLING_INCREMENT.to_string(), increment.to_string());
        }
    }

    fn validate(&self, _ctx: &ValidationContext<'_>) -> Result<()> {
        if self.account_id.trim().is_empty() {
            return Err(BeanstreamError::Validation("account id required".to_string()));
        }
        if matches!(self.amount, Some(amount) if amount.is_sign_negative() && !amount.is_zero()) {
            return Err(BeanstreamError::Validation(
                "amount must not be negative".to_string(),
            ));
        }
        if matches!(self.period, Some((_, 0))) {
            return Err(BeanstreamError::Validation(
                "billing increment must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl<'g> Transaction<'g, RecurringBillingUpdate> {
    /// Sets the account state.
    pub fn set_billing_state(&mut self, state: BillingState) -> &mut Self {
        self.kind_mut().billing_state = Some(state);
        self
    }

    /// Changes the recurring amount.
    pub fn set_amount(&mut self, amount: Decimal) -> &mut Self {
        self.kind_mut().amount = Some(amount);
        self
    }

    /// Changes the billing schedule.
    pub fn set_billing_period(&mut self, period: BillingPeriod, increment: u32) -> &mut Self {
        self.kind_mut().period = Some((period, increment));
        self
    }
}

/// Reply from the recurring billing endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurringBillingResponse {
    response: Response,
}

impl RecurringBillingResponse {
    /// Whether the update was accepted.
    pub fn approved(&self) -> bool {
        self.response.get("code") == Some("1")
    }

    /// Gateway message text.
    pub fn message(&self) -> Option<&str> {
        self.response.get("message")
    }

    /// Account that was modified.
    pub fn account_id(&self) -> Option<&str> {
        self.response.get(fields::ACCOUNT_ID)
    }
}

impl GatewayResponse for RecurringBillingResponse {
    fn from_response(response: Response) -> Self {
        Self { response }
    }

    fn response(&self) -> &Response {
        &self.response
    }
}
