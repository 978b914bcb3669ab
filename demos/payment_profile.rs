//! Example payment profile lifecycle.
//!
//! Stores a card as a payment profile, charges it, then fetches the profile.
//!
//! Run with:
//! ```bash
//! cargo run --example payment_profile
//! ```
//!
//! Environment variables (a `.env` file is read if present):
//! - BEANSTREAM_MERCHANT_ID: Merchant identifier
//! - BEANSTREAM_PAYMENT_PASSCODE: Passcode for the transaction-processing API
//! - BEANSTREAM_PROFILE_PASSCODE: Passcode for the payment profile API

use anyhow::{bail, Context};
use beanstream::{CreditCard, Gateway, GatewayConfig, GatewayResponse};
use rust_decimal::Decimal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = GatewayConfig::new(
        std::env::var("BEANSTREAM_MERCHANT_ID").context("BEANSTREAM_MERCHANT_ID must be set")?,
    )
    .with_payment_passcode(
        std::env::var("BEANSTREAM_PAYMENT_PASSCODE")
            .context("BEANSTREAM_PAYMENT_PASSCODE must be set")?,
    )
    .with_payment_profile_passcode(
        std::env::var("BEANSTREAM_PROFILE_PASSCODE")
            .context("BEANSTREAM_PROFILE_PASSCODE must be set")?,
    );
    let gateway = Gateway::new(config)?;

    let card = CreditCard::new("John Doe", "4030000010001234", 5, 2030).with_cvd("123");
    let created = gateway.create_payment_profile(&card, None)?.commit().await?;
    if !created.approved() {
        bail!("profile not created: {:?}", created.message());
    }
    let customer_code = created
        .customer_code()
        .context("gateway returned no customer code")?
        .to_string();
    println!("Created profile {}", customer_code);

    let payment = gateway
        .purchase_with_payment_profile(Decimal::new(250, 2), customer_code.as_str())
        .commit()
        .await?;
    println!(
        "Charged profile: approved={}, transaction={:?}",
        payment.approved(),
        payment.transaction_id()
    );

    let profile = gateway.get_payment_profile(customer_code.as_str()).commit().await?;
    println!("Profile status: {:?}", profile.status());

    Ok(())
}
