//! Billing value types: payment cards and postal addresses.
//!
//! Both types know how to render themselves as the wire fields the gateway
//! expects, which is what the transaction setters merge into a request.

use crate::types::{fields, Params};
use crate::utils::mask_card_number;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A payment card.
///
/// The card number and CVD never appear in `Debug` output.
///
/// # Examples
///
/// ```
/// use beanstream::billing::CreditCard;
///
/// let card = CreditCard::new("John Doe", "4030000010001234", 7, 2031).with_cvd("123");
/// let params = card.params();
/// assert_eq!(params["trnExpMonth"], "07");
/// assert_eq!(params["trnExpYear"], "31");
/// assert!(card.has_cvd());
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct CreditCard {
    owner: String,
    number: String,
    exp_month: u32,
    exp_year: u32,
    cvd: Option<String>,
}

impl CreditCard {
    /// Creates a card without verification digits.
    ///
    /// `exp_year` may be given with two or four digits; only the last two are sent.
    pub fn new(
        owner: impl Into<String>,
        number: impl Into<String>,
        exp_month: u32,
        exp_year: u32,
    ) -> Self {
        Self {
            owner: owner.into(),
            number: number.into(),
            exp_month,
            exp_year,
            cvd: None,
        }
    }

    /// Sets the card verification digits. An empty value counts as absent.
    pub fn with_cvd(mut self, cvd: impl Into<String>) -> Self {
        let cvd = cvd.into();
        self.cvd = if cvd.trim().is_empty() { None } else { Some(cvd) };
        self
    }

    /// Card holder name.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Whether the card carries verification digits.
    pub fn has_cvd(&self) -> bool {
        self.cvd.is_some()
    }

    /// Wire fields for this card.
    pub fn params(&self) -> Params {
        let mut params = Params::new();
        params.insert(fields::CARD_OWNER.to_string(), self.owner.clone());
        params.insert(fields::CARD_NUMBER.to_string(), self.number.clone());
        params.insert(fields::CARD_EXP_MONTH.to_string(), format!("{:02}", self.exp_month));
        params.insert(fields::CARD_EXP_YEAR.to_string(), format!("{:02}", self.exp_year % 100));
        if let Some(cvd) = &self.cvd {
            params.insert(fields::CARD_CVD.to_string(), cvd.clone());
        }
        params
    }
}

impl fmt::Debug for CreditCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreditCard")
            .field("owner", &self.owner)
            .field("number", &mask_card_number(&self.number))
            .field("exp_month", &self.exp_month)
            .field("exp_year", &self.exp_year)
            .field("cvd", &self.cvd.as_ref().map(|_| "***"))
            .finish()
    }
}

/// A postal address with contact details.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Address {
    /// Full name
    pub name: String,
    /// Email address
    pub email: String,
    /// Phone number
    pub phone: String,
    /// First address line
    pub address1: String,
    /// Second address line
    #[serde(default)]
    pub address2: String,
    /// City
    pub city: String,
    /// Two-letter province or state code
    pub province: String,
    /// Postal or ZIP code
    pub postal_code: String,
    /// Two-letter country code
    pub country: String,
}

impl Address {
    /// Creates an address.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
        address1: impl Into<String>,
        address2: impl Into<String>,
        city: impl Into<String>,
        province: impl Into<String>,
        postal_code: impl Into<String>,
        country: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            phone: phone.into(),
            address1: address1.into(),
            address2: address2.into(),
            city: city.into(),
            province: province.into(),
            postal_code: postal_code.into(),
            country: country.into(),
        }
    }

    /// Wire fields for this address, each name prefixed with `prefix`.
    ///
    /// # Examples
    ///
    /// ```
    /// use beanstream::billing::Address;
    ///
    /// let address = Address {
    ///     name: "John Doe".into(),
    ///     city: "Fake City".into(),
    ///     ..Default::default()
    /// };
    /// let params = address.params("ord");
    /// assert_eq!(params["ordName"], "John Doe");
    /// assert_eq!(params["ordCity"], "Fake City");
    /// ```
    pub fn params(&self, prefix: &str) -> Params {
        [
            ("Name", &self.name),
            ("EmailAddress", &self.email),
            ("PhoneNumber", &self.phone),
            ("Address1", &self.address1),
            ("Address2", &self.address2),
            ("City", &self.city),
            ("Province", &self.province),
            ("PostalCode", &self.postal_code),
            ("Country", &self.country),
        ]
        .into_iter()
        .map(|(name, value)| (format!("{}{}", prefix, name), value.clone()))
        .collect()
    }
}
