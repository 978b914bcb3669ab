//! Utility functions for gateway operations.
//!
//! This module provides helpers for form encoding/decoding, the passcode
//! authorization header, amount formatting and order number generation.

use crate::types::{fields, Params};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::Utc;
use rand::Rng;
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicI64, Ordering};
use url::form_urlencoded;

/// Number of decimal places the gateway expects in amount fields.
pub const AMOUNT_DECIMAL_PLACES: u32 = 2;

/// Upper bound (exclusive) of the random suffix of an order number.
const ORDER_NUMBER_RANDOM_BOUND: u32 = 1_000_000;

const NANOS_PER_SECOND: i64 = 1_000_000_000;

static LAST_ORDER_TIMESTAMP: AtomicI64 = AtomicI64::new(0);

/// Serializes request parameters as an `application/x-www-form-urlencoded` body.
///
/// # Examples
///
/// ```
/// use beanstream::types::Params;
/// use beanstream::utils::encode_params;
///
/// let mut params = Params::new();
/// params.insert("trnAmount".to_string(), "10.00".to_string());
/// params.insert("ordName".to_string(), "John Doe".to_string());
///
/// assert_eq!(encode_params(&params), "ordName=John+Doe&trnAmount=10.00");
/// ```
pub fn encode_params(params: &Params) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params.iter())
        .finish()
}

/// Decodes a form-encoded body into a map of field name to values.
///
/// Repeated keys keep every value in wire order. Keys whose value is blank are
/// treated as absent. Never fails.
///
/// # Examples
///
/// ```
/// use beanstream::utils::decode_form;
///
/// let fields = decode_form("trnId=1&ref1=a&ref1=b&ref2=");
/// assert_eq!(fields["trnId"], vec!["1"]);
/// assert_eq!(fields["ref1"], vec!["a", "b"]);
/// assert!(!fields.contains_key("ref2"));
/// ```
pub fn decode_form(body: &str) -> BTreeMap<String, Vec<String>> {
    drop_blank_values(decode_form_keep_blanks(body))
}

/// Decodes a form-encoded body keeping blank values in place.
///
/// Positions are preserved, so the `n`-th value of a repeated key still lines
/// up with the `n`-th value of every other repeated key.
///
/// # Examples
///
/// ```
/// use beanstream::utils::decode_form_keep_blanks;
///
/// let fields = decode_form_keep_blanks("ref1=&ref1=B");
/// assert_eq!(fields["ref1"], vec!["", "B"]);
/// ```
pub fn decode_form_keep_blanks(body: &str) -> BTreeMap<String, Vec<String>> {
    let mut decoded: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (key, value) in form_urlencoded::parse(body.as_bytes()) {
        decoded
            .entry(key.into_owned())
            .or_default()
            .push(value.into_owned());
    }
    decoded
}

/// Removes blank values, and keys left with no value at all.
pub fn drop_blank_values(
    mut fields: BTreeMap<String, Vec<String>>,
) -> BTreeMap<String, Vec<String>> {
    fields.retain(|_, values| {
        values.retain(|v| !v.is_empty());
        !values.is_empty()
    });
    fields
}

/// Builds the `Authorization` header value for a merchant and endpoint passcode.
///
/// # Examples
///
/// ```
/// use beanstream::utils::encode_passcode_header;
///
/// assert_eq!(
///     encode_passcode_header("300200578", "secret"),
///     "Passcode MzAwMjAwNTc4OnNlY3JldA=="
/// );
/// ```
pub fn encode_passcode_header(merchant_id: &str, passcode: &str) -> String {
    let credentials = format!("{}:{}", merchant_id, passcode);
    format!("Passcode {}", BASE64.encode(credentials.as_bytes()))
}

/// Quantizes an amount to two decimal places using banker's rounding.
pub fn quantize_amount(amount: Decimal) -> Decimal {
    let mut quantized =
        amount.round_dp_with_strategy(AMOUNT_DECIMAL_PLACES, RoundingStrategy::MidpointNearestEven);
    quantized.rescale(AMOUNT_DECIMAL_PLACES);
    quantized
}

/// Formats an amount for the wire, always with exactly two decimal places.
///
/// # Examples
///
/// ```
/// use beanstream::utils::format_amount;
/// use rust_decimal::Decimal;
///
/// assert_eq!(format_amount(Decimal::from(50)), "50.00");
/// assert_eq!(format_amount(Decimal::new(39995, 3)), "40.00");
/// assert_eq!(format_amount(Decimal::new(10005, 3)), "10.00");
/// ```
pub fn format_amount(amount: Decimal) -> String {
    quantize_amount(amount).to_string()
}

/// Parses an amount field returned by the gateway.
///
/// Returns `None` when the value is not a decimal number.
pub fn parse_amount(value: &str) -> Option<Decimal> {
    Decimal::from_str(value.trim()).ok().map(quantize_amount)
}

/// Generates a new order number.
///
/// The value is a wall-clock timestamp with nanosecond precision followed by a
/// zero-padded random integer in `0..1_000_000`. Timestamps are forced to be
/// strictly increasing within the process, so two calls in the same process
/// never collide; across processes uniqueness is best-effort only and this is
/// not a cryptographic identifier.
///
/// # Examples
///
/// ```
/// use beanstream::utils::generate_order_number;
///
/// let a = generate_order_number();
/// let b = generate_order_number();
/// assert_ne!(a, b);
/// assert!(a.len() <= 30);
/// ```
pub fn generate_order_number() -> String {
    let nanos = next_order_timestamp();
    let suffix = rand::thread_rng().gen_range(0..ORDER_NUMBER_RANDOM_BOUND);
    format!(
        "{}.{:09}{:06}",
        nanos.div_euclid(NANOS_PER_SECOND),
        nanos.rem_euclid(NANOS_PER_SECOND),
        suffix
    )
}

fn next_order_timestamp() -> i64 {
    let now = Utc::now();
    let now = now
        .timestamp_nanos_opt()
        .unwrap_or_else(|| now.timestamp_micros().saturating_mul(1_000));

    let mut last = LAST_ORDER_TIMESTAMP.load(Ordering::Relaxed);
    loop {
        let next = now.max(last.saturating_add(1));
        match LAST_ORDER_TIMESTAMP.compare_exchange_weak(
            last,
            next,
            Ordering::AcqRel,
            Ordering::Relaxed,
        ) {
            Ok(_) => return next,
            Err(actual) => last = actual,
        }
    }
}

/// Renders a request body for logging with card data masked.
pub fn redacted_body(params: &Params) -> String {
    let mut redacted = params.clone();
    if let Some(number) = redacted.get_mut(fields::CARD_NUMBER) {
        *number = mask_card_number(number);
    }
    if let Some(cvd) = redacted.get_mut(fields::CARD_CVD) {
        *cvd = "***".to_string();
    }
    encode_params(&redacted)
}

/// Masks all but the last four digits of a card number.
pub fn mask_card_number(number: &str) -> String {
    let visible = number.len().saturating_sub(4);
    number
        .char_indices()
        .map(|(i, c)| if i < visible { '*' } else { c })
        .collect()
}
