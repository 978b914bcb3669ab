//! # beanstream-rs
//!
//! A client for the Beanstream legacy payment gateway, which speaks
//! form-encoded parameters over HTTPS and answers in the same format.
//!
//! ## Features
//!
//! - **Payments**: Purchases, pre-authorizations, completions, returns and voids
//! - **Payment Profiles**: Store cards on the gateway and charge them by customer code
//! - **Recurring Billing**: Open recurring accounts and modify them afterwards
//! - **Reporting**: Query past transactions and download reports
//! - **Typed Errors**: Every non-200 reply maps to a classified error
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use beanstream::{CreditCard, Gateway, GatewayConfig, GatewayResponse};
//! use rust_decimal::Decimal;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = GatewayConfig::new("300200578")
//!     .with_payment_passcode("YOUR_PASSCODE")
//!     .with_require_cvd(true);
//! let gateway = Gateway::new(config)?;
//!
//! let card = CreditCard::new("John Doe", "4030000010001234", 5, 2030).with_cvd("123");
//! let mut txn = gateway.purchase(Decimal::new(1000, 2), &card, None)?;
//! txn.set_comments("order #42");
//!
//! let response = txn.commit().await?;
//! println!("approved: {}, id: {:?}", response.approved(), response.transaction_id());
//! # Ok(())
//! # }
//! ```
//!
//! ## Transaction Lifecycle
//!
//! 1. **Build**: A factory on [`Gateway`] creates the transaction and its order number
//! 2. **Populate**: Setters merge cards, addresses, references and raw fields
//! 3. **Commit**: The request is validated, authenticated and posted once
//! 4. **Decode**: A 200 reply becomes a typed response; anything else an error
//!
//! A committed transaction cannot be sent again. Build a new one to retry,
//! which also gives it a new order number.
//!
//! ## Error Handling
//!
//! Status codes are classified with [`classify`]:
//!
//! | Status | Kind |
//! |--------|------|
//! | 302 | `Redirection` |
//! | 400, 405, 415 | `InvalidRequest` |
//! | 401 | `UnAuthorized` |
//! | 402 | `BusinessRule` |
//! | 403 | `Forbidden` |
//! | anything else | `InternalServer` |

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod billing;
pub mod errors;
pub mod gateway;
pub mod requests;
pub mod response;
pub mod transaction;
pub mod types;
pub mod utils;

// Re-export commonly used items
pub use billing::{Address, CreditCard};
pub use errors::{classify, BeanstreamError, ErrorKind, Result};
pub use gateway::{Gateway, GatewayConfig, RequestHasher};
pub use requests::payment::{PaymentResponse, PaymentTransaction};
pub use requests::profile::{PaymentProfileResponse, PaymentProfileTransaction};
pub use requests::recurring::{RecurringBillingResponse, RecurringBillingTransaction};
pub use requests::report::{ReportResponse, ReportTransaction};
pub use requests::TransactionKind;
pub use response::{GatewayResponse, Response};
pub use transaction::{Transaction, TransactionState};
pub use types::{BillingPeriod, BillingState, Endpoint, ProfileStatus, TransactionType};
