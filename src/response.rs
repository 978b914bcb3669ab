//! Decoded gateway responses.
//!
//! A [`Response`] is an immutable view over the key/value data the gateway
//! returned. Every accessor is total: a missing field reads as `None`.
//! Typed responses for each request kind wrap a `Response` and implement
//! [`GatewayResponse`].

use crate::types::{fields, Params, MAX_REFS};
use crate::utils::{decode_form, decode_form_keep_blanks};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Decoded response data: field name to every value returned for it.
pub type ResponseFields = BTreeMap<String, Vec<String>>;

/// Read-only view of a successful gateway reply.
///
/// # Examples
///
/// ```
/// use beanstream::response::Response;
///
/// let response = Response::from_body("trnId=999&trnOrderNumber=abc123&ref1=X");
/// assert_eq!(response.transaction_id(), Some("999"));
/// assert_eq!(response.order_number(), Some("abc123"));
/// assert_eq!(response.refs(), [Some("X"), None, None, None, None]);
/// assert_eq!(response.get("messageText"), None);
/// ```
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    fields: ResponseFields,
    #[serde(skip)]
    positional: ResponseFields,
    context: Params,
}

impl Response {
    /// Wraps already-decoded fields.
    pub fn new(fields: ResponseFields) -> Self {
        Self {
            positional: fields.clone(),
            fields,
            context: Params::new(),
        }
    }

    /// Decodes a form-encoded response body.
    pub fn from_body(body: &str) -> Self {
        Self {
            fields: decode_form(body),
            positional: decode_form_keep_blanks(body),
            context: Params::new(),
        }
    }

    /// Attaches caller-registered construction parameters.
    pub fn with_context(mut self, context: Params) -> Self {
        self.context = context;
        self
    }

    /// First value returned for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Every value returned for `key`, empty when the key is absent.
    pub fn get_all(&self, key: &str) -> &[String] {
        self.fields.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether the gateway returned `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Names of every returned field, including ones this crate does not know.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// All decoded fields.
    pub fn fields(&self) -> &ResponseFields {
        &self.fields
    }

    /// Decoded fields with blank values kept in wire position.
    ///
    /// Use this when values of repeated keys are matched up by index.
    pub fn positional_fields(&self) -> &ResponseFields {
        &self.positional
    }

    /// Construction parameter registered on the originating transaction.
    pub fn context(&self, key: &str) -> Option<&str> {
        self.context.get(key).map(String::as_str)
    }

    /// Order number assigned in the transaction request.
    pub fn order_number(&self) -> Option<&str> {
        self.get(fields::ORDER_NUMBER)
    }

    /// Gateway transaction identifier.
    pub fn transaction_id(&self) -> Option<&str> {
        self.get(fields::TRANSACTION_ID)
    }

    /// The five reference fields, `None` where absent.
    pub fn refs(&self) -> [Option<&str>; MAX_REFS] {
        std::array::from_fn(|idx| self.get(&format!("ref{}", idx + 1)))
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Response <transaction_id: {}, order_number: {}>",
            self.transaction_id().unwrap_or("None"),
            self.order_number().unwrap_or("None")
        )
    }
}

/// A typed view built from a decoded [`Response`].
///
/// Each request kind names the implementation it produces on commit.
pub trait GatewayResponse: Sized {
    /// Builds the typed view.
    fn from_response(response: Response) -> Self;

    /// The underlying decoded response.
    fn response(&self) -> &Response;

    /// Order number echoed by the gateway.
    fn order_number(&self) -> Option<&str> {
        self.response().order_number()
    }

    /// Gateway transaction identifier.
    fn transaction_id(&self) -> Option<&str> {
        self.response().transaction_id()
    }

    /// The five reference fields.
    fn refs(&self) -> [Option<&str>; MAX_REFS] {
        self.response().refs()
    }
}

impl GatewayResponse for Response {
    fn from_response(response: Response) -> Self {
        response
    }

    fn response(&self) -> &Response {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_value_of_multi_valued_field() {
        let response = Response::from_body("trnId=1&trnId=2&ref3=c&ref3=d");
        assert_eq!(response.transaction_id(), Some("1"));
        assert_eq!(response.get_all("trnId"), ["1".to_string(), "2".to_string()]);
        assert_eq!(response.refs(), [None, None, Some("c"), None, None]);
    }

    #[test]
    fn test_absent_fields_are_none() {
        let response = Response::default();
        assert_eq!(response.order_number(), None);
        assert_eq!(response.transaction_id(), None);
        assert_eq!(response.refs(), [None; MAX_REFS]);
        assert!(response.get_all("anything").is_empty());
        assert_eq!(response.context("anything"), None);
    }

    #[test]
    fn test_blank_values_read_as_absent() {
        let response = Response::from_body("ref1=&ref1=B&ref2=&trnId=5");
        assert_eq!(response.get("ref1"), Some("B"));
        assert_eq!(response.get("ref2"), None);
        assert!(!response.contains("ref2"));
        assert_eq!(response.positional_fields()["ref1"], vec!["", "B"]);
        assert_eq!(response.positional_fields()["ref2"], vec![""]);
    }

    #[test]
    fn test_unknown_keys_preserved() {
        let response = Response::from_body("futureField=1&trnId=5");
        let keys: Vec<&str> = response.keys().collect();
        assert_eq!(keys, vec!["futureField", "trnId"]);
        assert!(response.contains("futureField"));
    }

    #[test]
    fn test_context() {
        let mut context = Params::new();
        context.insert("currency".to_string(), "CAD".to_string());
        let response = Response::from_body("trnId=5").with_context(context);
        assert_eq!(response.context("currency"), Some("CAD"));
    }

    #[test]
    fn test_display() {
        let response = Response::from_body("trnId=5&trnOrderNumber=abc");
        assert_eq!(response.to_string(), "Response <transaction_id: 5, order_number: abc>");
        assert_eq!(
            Response::default().to_string(),
            "Response <transaction_id: None, order_number: None>"
        );
    }

    #[test]
    fn test_trait_defaults_delegate() {
        let response = Response::from_body("trnId=5&ref5=e");
        let typed = <Response as GatewayResponse>::from_response(response);
        assert_eq!(GatewayResponse::transaction_id(&typed), Some("5"));
        assert_eq!(GatewayResponse::refs(&typed)[4], Some("e"));
    }

    #[test]
    fn test_serializes_to_json() {
        let response = Response::from_body("trnId=5");
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["fields"]["trnId"][0], "5");
    }
}
