//! Wire-level type definitions for the Beanstream legacy API.
//!
//! This module contains the endpoint set, the transaction and billing codes the
//! gateway understands, and the field names shared by requests and responses.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Request parameters keyed by wire field name.
///
/// Ordered so the serialized request body is deterministic.
pub type Params = BTreeMap<String, String>;

/// Default base URL of the production gateway.
pub const DEFAULT_BASE_URL: &str = "https://www.beanstream.com/";

/// Body the gateway returns when a request hash was expected but missing.
pub const EMPTY_HASH_SENTINEL: &str = "Empty hash value";

/// Maximum number of `refN` fields a request may carry.
pub const MAX_REFS: usize = 5;

/// Request and response field names.
pub mod fields {
    /// Client-generated order number
    pub const ORDER_NUMBER: &str = "trnOrderNumber";
    /// Gateway transaction identifier
    pub const TRANSACTION_ID: &str = "trnId";
    /// Transaction type code
    pub const TRANSACTION_TYPE: &str = "trnType";
    /// Transaction amount
    pub const AMOUNT: &str = "trnAmount";
    /// Free-form comments
    pub const COMMENTS: &str = "trnComments";
    /// Request type marker
    pub const REQUEST_TYPE: &str = "requestType";
    /// Original transaction for completions, returns and voids
    pub const ADJUSTMENT_ID: &str = "adjId";
    /// Payment profile identifier
    pub const CUSTOMER_CODE: &str = "customerCode";
    /// Card holder name
    pub const CARD_OWNER: &str = "trnCardOwner";
    /// Card number
    pub const CARD_NUMBER: &str = "trnCardNumber";
    /// Expiry month (two digits)
    pub const CARD_EXP_MONTH: &str = "trnExpMonth";
    /// Expiry year (two digits)
    pub const CARD_EXP_YEAR: &str = "trnExpYear";
    /// Card verification digits
    pub const CARD_CVD: &str = "trnCardCvd";
    /// Recurring billing flag
    pub const RECURRING: &str = "trnRecurring";
    /// Recurring billing period code
    pub const BILLING_PERIOD: &str = "rbBillingPeriod";
    /// Recurring billing increment
    pub const BILLING_INCREMENT: &str = "rbBillingIncrement";
    /// Recurring billing account
    pub const ACCOUNT_ID: &str = "rbAccountId";
    /// Recurring billing account state
    pub const BILLING_STATE: &str = "rbBillingState";
    /// Recurring and profile API service version
    pub const SERVICE_VERSION: &str = "serviceVersion";
    /// Recurring and profile API operation code
    pub const OPERATION_TYPE: &str = "operationType";
    /// Payment profile status
    pub const PROFILE_STATUS: &str = "status";
    /// Optional request hash
    pub const HASH_VALUE: &str = "hashValue";
}

/// Address field prefix for billing addresses.
pub const BILLING_ADDRESS_PREFIX: &str = "ord";

/// Address field prefix for shipping addresses.
pub const SHIPPING_ADDRESS_PREFIX: &str = "shp";

/// One of the fixed gateway endpoints.
///
/// Each endpoint has its own passcode slot in the gateway configuration.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    /// Purchases, pre-authorizations, returns and voids
    ProcessTransaction,
    /// Recurring billing account maintenance
    RecurringBilling,
    /// Secure payment profiles
    PaymentProfile,
    /// Report file download
    ReportDownload,
    /// Transaction report queries
    Report,
}

impl Endpoint {
    /// Path of the endpoint relative to the gateway base URL.
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::ProcessTransaction => "scripts/process_transaction.asp",
            Endpoint::RecurringBilling => "scripts/recurring_billing.asp",
            Endpoint::PaymentProfile => "scripts/payment_profile.asp",
            Endpoint::ReportDownload => "scripts/report_download.asp",
            Endpoint::Report => "scripts/report.aspx",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Transaction type codes accepted by the processing endpoint.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// Authorize funds without capturing them
    PreAuth,
    /// Capture a previous pre-authorization
    PreAuthCompletion,
    /// Authorize and capture
    Purchase,
    /// Refund a previous purchase
    Return,
    /// Generic void
    Void,
    /// Void a purchase
    VoidPurchase,
    /// Void a return
    VoidReturn,
}

impl TransactionType {
    /// Wire code for the transaction type.
    pub fn code(self) -> &'static str {
        match self {
            TransactionType::PreAuth => "PA",
            TransactionType::PreAuthCompletion => "PAC",
            TransactionType::Purchase => "P",
            TransactionType::Return => "R",
            TransactionType::Void => "V",
            TransactionType::VoidPurchase => "VP",
            TransactionType::VoidReturn => "VR",
        }
    }

    /// Whether this type adjusts an earlier transaction and so needs `adjId`.
    pub fn is_adjustment(self) -> bool {
        !matches!(self, TransactionType::PreAuth | TransactionType::Purchase)
    }
}

/// Recurring billing period.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BillingPeriod {
    /// Daily
    Day,
    /// Weekly
    Week,
    /// Monthly
    Month,
    /// Yearly
    Year,
}

impl BillingPeriod {
    /// Wire code for the period.
    pub fn code(self) -> &'static str {
        match self {
            BillingPeriod::Day => "D",
            BillingPeriod::Week => "W",
            BillingPeriod::Month => "M",
            BillingPeriod::Year => "Y",
        }
    }
}

/// State of a recurring billing account.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BillingState {
    /// Billing continues
    Active,
    /// Billing stopped permanently
    Closed,
    /// Billing suspended
    OnHold,
}

impl BillingState {
    /// Wire code for the state.
    pub fn code(self) -> &'static str {
        match self {
            BillingState::Active => "A",
            BillingState::Closed => "C",
            BillingState::OnHold => "O",
        }
    }
}

/// Status of a secure payment profile.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ProfileStatus {
    /// Profile may be charged
    Active,
    /// Profile rejects charges
    Disabled,
    /// Profile is closed
    Closed,
}

impl ProfileStatus {
    /// Wire code for the status.
    pub fn code(self) -> &'static str {
        match self {
            ProfileStatus::Active => "A",
            ProfileStatus::Disabled => "D",
            ProfileStatus::Closed => "C",
        }
    }
}

/// Card verification result reported in `cvdId`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CvdStatus {
    /// CVD matched
    Match,
    /// CVD did not match
    Mismatch,
    /// CVD was not verified
    NotVerified,
    /// CVD should have been present
    ShouldHaveBeenPresent,
    /// Issuer was unable to process the CVD
    IssuerUnableToProcess,
    /// CVD was not provided
    NotProvided,
}

impl CvdStatus {
    /// Parses a `cvdId` value.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "1" => Some(CvdStatus::Match),
            "2" => Some(CvdStatus::Mismatch),
            "3" => Some(CvdStatus::NotVerified),
            "4" => Some(CvdStatus::ShouldHaveBeenPresent),
            "5" => Some(CvdStatus::IssuerUnableToProcess),
            "6" => Some(CvdStatus::NotProvided),
            _ => None,
        }
    }

    /// Human-readable description used by the gateway documentation.
    pub fn description(self) -> &'static str {
        match self {
            CvdStatus::Match => "CVD Match",
            CvdStatus::Mismatch => "CVD Mismatch",
            CvdStatus::NotVerified => "CVD Not Verified",
            CvdStatus::ShouldHaveBeenPresent => "CVD Should have been present",
            CvdStatus::IssuerUnableToProcess => "CVD Issuer unable to process request",
            CvdStatus::NotProvided => "CVD Not Provided",
        }
    }
}

impl fmt::Display for CvdStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_paths() {
        assert_eq!(Endpoint::ProcessTransaction.path(), "scripts/process_transaction.asp");
        assert_eq!(Endpoint::Report.path(), "scripts/report.aspx");
        assert_eq!(Endpoint::ReportDownload.to_string(), "scripts/report_download.asp");
    }

    #[test]
    fn test_transaction_type_codes() {
        assert_eq!(TransactionType::PreAuthCompletion.code(), "PAC");
        assert_eq!(TransactionType::VoidReturn.code(), "VR");
        assert!(TransactionType::Return.is_adjustment());
        assert!(!TransactionType::Purchase.is_adjustment());
    }

    #[test]
    fn test_cvd_status() {
        assert_eq!(CvdStatus::from_code("1"), Some(CvdStatus::Match));
        assert_eq!(CvdStatus::from_code("2").unwrap().to_string(), "CVD Mismatch");
        assert_eq!(CvdStatus::from_code("9"), None);
    }

    #[test]
    fn test_endpoint_serialization() {
        let json = serde_json::to_string(&Endpoint::PaymentProfile).unwrap();
        assert_eq!(json, "\"payment_profile\"");
    }
}
