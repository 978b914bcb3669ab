//! Secure payment profiles.

use super::{TransactionKind, ValidationContext};
use crate::errors::{BeanstreamError, Result};
use crate::response::{GatewayResponse, Response};
use crate::transaction::Transaction;
use crate::types::{fields, Endpoint, Params, ProfileStatus};

const SERVICE_VERSION: &str = "1.1";
const RESPONSE_FORMAT: &str = "responseFormat";
const QUERY_STRING_FORMAT: &str = "QS";

/// A payment profile transaction.
pub type PaymentProfileTransaction<'g> = Transaction<'g, PaymentProfile>;

/// Operation performed on a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileOperation {
    /// Create a new profile
    Create,
    /// Modify an existing profile
    Modify,
    /// Fetch an existing profile
    Query,
}

impl ProfileOperation {
    /// Wire code for the operation.
    pub fn code(self) -> &'static str {
        match self {
            ProfileOperation::Create => "N",
            ProfileOperation::Modify => "M",
            ProfileOperation::Query => "Q",
        }
    }
}

/// Typed fields of a payment profile request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentProfile {
    operation: ProfileOperation,
    customer_code: Option<String>,
    status: Option<ProfileStatus>,
}

impl PaymentProfile {
    /// A request creating a new profile.
    pub fn create() -> Self {
        Self {
            operation: ProfileOperation::Create,
            customer_code: None,
            status: None,
        }
    }

    /// A request modifying `customer_code`.
    pub fn modify(customer_code: impl Into<String>) -> Self {
        Self {
            operation: ProfileOperation::Modify,
            customer_code: Some(customer_code.into()),
            status: None,
        }
    }

    /// A request fetching `customer_code`.
    pub fn query(customer_code: impl Into<String>) -> Self {
        Self {
            operation: ProfileOperation::Query,
            customer_code: Some(customer_code.into()),
            status: None,
        }
    }

    /// Operation requested.
    pub fn operation(&self) -> ProfileOperation {
        self.operation
    }
}

impl TransactionKind for PaymentProfile {
    type Response = PaymentProfileResponse;

    fn endpoint(&self) -> Endpoint {
        Endpoint::PaymentProfile
    }

    fn write_params(&self, params: &mut Params) {
        params.insert(fields::SERVICE_VERSION.to_string(), SERVICE_VERSION.to_string());
        params.insert(fields::OPERATION_TYPE.to_string(), self.operation.code().to_string());
        params.insert(RESPONSE_FORMAT.to_string(), QUERY_STRING_FORMAT.to_string());
        if let Some(customer_code) = &self.customer_code {
            params.insert(fields::CUSTOMER_CODE.to_string(), customer_code.clone());
        }
        if let Some(status) = self.status {
            params.insert(fields::PROFILE_STATUS.to_string(), status.code().to_string());
        }
    }

    fn validate(&self, ctx: &ValidationContext<'_>) -> Result<()> {
        match self.operation {
            ProfileOperation::Create => {
                if !ctx.has_credit_card {
                    return Err(BeanstreamError::Validation(
                        "a card is required to create a payment profile".to_string(),
                    ));
                }
                if ctx.config.require_billing_address && !ctx.has_billing_address {
                    return Err(BeanstreamError::Validation(
                        "billing address required".to_string(),
                    ));
                }
            }
            ProfileOperation::Modify | ProfileOperation::Query => {
                if self.customer_code.as_deref().map_or(true, str::is_empty) {
                    return Err(BeanstreamError::Validation(
                        "customer code required".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }
}

impl<'g> Transaction<'g, PaymentProfile> {
    /// Sets the profile status.
    pub fn set_status(&mut self, status: ProfileStatus) -> &mut Self {
        self.kind_mut().status = Some(status);
        self
    }
}

/// Reply from the payment profile endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentProfileResponse {
    response: Response,
}

impl PaymentProfileResponse {
    /// Whether the operation succeeded.
    pub fn approved(&self) -> bool {
        self.response.get("responseCode") == Some("1")
    }

    /// Identifier of the profile.
    pub fn customer_code(&self) -> Option<&str> {
        self.response.get(fields::CUSTOMER_CODE)
    }

    /// Gateway message text.
    pub fn message(&self) -> Option<&str> {
        self.response.get("responseMessage")
    }

    /// Status of the profile, when the gateway reports it.
    pub fn status(&self) -> Option<ProfileStatus> {
        match self.response.get(fields::PROFILE_STATUS)? {
            "A" => Some(ProfileStatus::Active),
            "D" => Some(ProfileStatus::Disabled),
            "C" => Some(ProfileStatus::Closed),
            _ => None,
        }
    }
}

impl GatewayResponse for PaymentProfileResponse {
    fn from_response(response: Response) -> Self {
        Self { response }
    }

    fn response(&self) -> &Response {
        &self.response
    }
}
