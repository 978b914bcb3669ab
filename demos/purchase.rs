//! Example purchase against the gateway.
//!
//! Charges a test card and prints the outcome.
//!
//! Run with:
//! ```bash
//! cargo run --example purchase
//! ```
//!
//! Environment variables (a `.env` file is read if present):
//! - BEANSTREAM_MERCHANT_ID: Merchant identifier
//! - BEANSTREAM_PAYMENT_PASSCODE: Passcode for the transaction-processing API
//! - BEANSTREAM_BASE_URL: Gateway URL (optional)
//! - AMOUNT: Amount to charge (optional, defaults to 10.00)

use anyhow::Context;
use beanstream::{Address, BeanstreamError, CreditCard, Gateway, GatewayConfig, GatewayResponse};
use rust_decimal::Decimal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let merchant_id = std::env::var("BEANSTREAM_MERCHANT_ID")
        .context("BEANSTREAM_MERCHANT_ID must be set")?;
    let passcode = std::env::var("BEANSTREAM_PAYMENT_PASSCODE")
        .context("BEANSTREAM_PAYMENT_PASSCODE must be set")?;
    let amount: Decimal = std::env::var("AMOUNT")
        .unwrap_or_else(|_| "10.00".to_string())
        .parse()
        .context("AMOUNT must be a decimal number")?;

    let mut config = GatewayConfig::new(merchant_id)
        .with_payment_passcode(passcode)
        .with_require_cvd(true);
    if let Ok(base_url) = std::env::var("BEANSTREAM_BASE_URL") {
        config = config.with_base_url(base_url);
    }
    let gateway = Gateway::new(config)?;

    let card = CreditCard::new("John Doe", "4030000010001234", 5, 2030).with_cvd("123");
    let address = Address::new(
        "John Doe",
        "john.doe@example.com",
        "5145551234",
        "123 Main St",
        "",
        "Montreal",
        "QC",
        "H3A1A1",
        "CA",
    );

    let mut txn = gateway.purchase(amount, &card, Some(&address))?;
    txn.set_comments("demo purchase")
        .set_refs(&[Some("demo")])?;

    println!("Order number: {}", txn.order_number());

    match txn.commit().await {
        Ok(response) => {
            println!("Approved: {}", response.approved());
            println!("Transaction: {:?}", response.transaction_id());
            println!("Message: {:?}", response.message());
            if let Some(cvd) = response.cvd_status() {
                println!("CVD: {}", cvd);
            }
        }
        Err(BeanstreamError::HashValidation) => {
            eprintln!("The account requires request hashing");
        }
        Err(e) => {
            eprintln!("Error ({:?}): {}", e.kind(), e);
            return Err(e.into());
        }
    }

    Ok(())
}
