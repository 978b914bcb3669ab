//! Request kinds.
//!
//! This module contains the trait every request kind implements and the
//! concrete kinds for each family of gateway operations.

pub mod payment;
pub mod profile;
pub mod recurring;
pub mod report;

use crate::errors::Result;
use crate::gateway::GatewayConfig;
use crate::response::GatewayResponse;
use crate::types::{Endpoint, Params};

/// What a request kind can inspect when validating before commit.
#[derive(Debug, Clone, Copy)]
pub struct ValidationContext<'a> {
    /// Gateway configuration, including policy flags
    pub config: &'a GatewayConfig,
    /// Parameters merged through the transaction setters
    pub params: &'a Params,
    /// Whether a card was set
    pub has_credit_card: bool,
    /// Whether a billing address was set
    pub has_billing_address: bool,
}

/// Trait for the typed part of a gateway request.
///
/// Each kind (payment, profile, recurring billing, report) names the endpoint
/// it targets, contributes its own wire fields, may reject the request before
/// it is sent, and decides which response type a successful commit produces.
pub trait TransactionKind {
    /// Typed response built from a successful reply.
    type Response: GatewayResponse;

    /// Endpoint this request is sent to. Selects the passcode as well.
    fn endpoint(&self) -> Endpoint;

    /// Writes the kind's typed fields into `params`.
    fn write_params(&self, params: &mut Params);

    /// Checks the request before anything is sent.
    ///
    /// # Errors
    ///
    /// Returns a `Validation` error describing the first problem found.
    fn validate(&self, _ctx: &ValidationContext<'_>) -> Result<()> {
        Ok(())
    }
}
