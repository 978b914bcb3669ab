//! Integration tests for the beanstream-rs library.
//!
//! These tests run transactions against a local stub gateway and check the
//! request as received on the wire as well as the decoded outcome.

use axum::Router;
use beanstream::{
    types::{fields, BillingPeriod, BillingState, ProfileStatus},
    Address, BeanstreamError, CreditCard, ErrorKind, Gateway, GatewayConfig, GatewayResponse,
    RequestHasher, TransactionState,
};
use http::{header, HeaderMap, StatusCode, Uri};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};

const MERCHANT_ID: &str = "300200578";

#[derive(Debug, Clone)]
struct CapturedRequest {
    path: String,
    authorization: Option<String>,
    content_type: Option<String>,
    body: String,
}

impl CapturedRequest {
    fn form(&self) -> BTreeMap<String, String> {
        url::form_urlencoded::parse(self.body.as_bytes())
            .into_owned()
            .collect()
    }
}

type Captured = Arc<Mutex<Vec<CapturedRequest>>>;

/// Starts a gateway stub that answers every request with `status` and `reply`.
async fn stub_gateway(status: StatusCode, reply: &'static str) -> (String, Captured) {
    let captured: Captured = Arc::new(Mutex::new(Vec::new()));
    let sink = captured.clone();

    let app = Router::new().fallback(move |uri: Uri, headers: HeaderMap, body: String| {
        let sink = sink.clone();
        async move {
            let header_value = |name: header::HeaderName| {
                headers
                    .get(name)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string)
            };
            sink.lock().unwrap().push(CapturedRequest {
                path: uri.path().to_string(),
                authorization: header_value(header::AUTHORIZATION),
                content_type: header_value(header::CONTENT_TYPE),
                body,
            });
            (status, reply)
        }
    });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}/", addr), captured)
}

fn config(base_url: &str) -> GatewayConfig {
    GatewayConfig::new(MERCHANT_ID)
        .with_payment_passcode("secret")
        .with_payment_profile_passcode("profile-secret")
        .with_recurring_billing_passcode("recurring-secret")
        .with_reporting_passcode("report-secret")
        .with_base_url(base_url)
}

fn card() -> CreditCard {
    CreditCard::new("John Doe", "4030000010001234", 5, 2030).with_cvd("123")
}

fn address() -> Address {
    Address::new(
        "John Doe",
        "john.doe@example.com",
        "5145551234",
        "123 Main St",
        "",
        "Montreal",
        "QC",
        "H3A 1A1",
        "CA",
    )
}

#[tokio::test]
async fn test_purchase_round_trip() {
    let (base_url, captured) = stub_gateway(
        StatusCode::OK,
        "trnApproved=1&trnId=999&trnOrderNumber=abc123&ref1=X&messageText=Approved&trnAmount=10.00",
    )
    .await;
    let gateway = Gateway::new(config(&base_url)).unwrap();

    let mut txn = gateway
        .purchase(Decimal::new(1000, 2), &card(), Some(&address()))
        .unwrap();
    txn.set_refs(&[Some("X")]).unwrap();
    let order_number = txn.order_number().to_string();

    let response = txn.commit().await.unwrap();
    assert_eq!(txn.state(), TransactionState::Completed);
    assert!(response.approved());
    assert_eq!(response.transaction_id(), Some("999"));
    assert_eq!(response.order_number(), Some("abc123"));
    assert_eq!(response.refs(), [Some("X"), None, None, None, None]);
    assert_eq!(response.amount(), Some(Decimal::new(1000, 2)));

    let requests = captured.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.path, "/scripts/process_transaction.asp");
    assert_eq!(
        request.authorization.as_deref(),
        Some("Passcode MzAwMjAwNTc4OnNlY3JldA==")
    );
    assert_eq!(
        request.content_type.as_deref(),
        Some("application/x-www-form-urlencoded")
    );

    let form = request.form();
    assert_eq!(form[fields::ORDER_NUMBER], order_number);
    assert_eq!(form[fields::TRANSACTION_TYPE], "P");
    assert_eq!(form[fields::AMOUNT], "10.00");
    assert_eq!(form[fields::CARD_NUMBER], "4030000010001234");
    assert_eq!(form[fields::CARD_EXP_MONTH], "05");
    assert_eq!(form[fields::CARD_EXP_YEAR], "30");
    assert_eq!(form["ordEmailAddress"], "john.doe@example.com");
    assert_eq!(form["ref1"], "X");
    assert!(!form.contains_key(fields::HASH_VALUE));
}

#[tokio::test]
async fn test_declined_payment_is_ok() {
    let (base_url, _captured) =
        stub_gateway(StatusCode::OK, "trnApproved=0&messageId=7&messageText=DECLINE").await;
    let gateway = Gateway::new(config(&base_url)).unwrap();

    let mut txn = gateway.purchase(Decimal::from(5), &card(), None).unwrap();
    let response = txn.commit().await.unwrap();

    assert!(!response.approved());
    assert_eq!(response.message(), Some("DECLINE"));
    assert_eq!(response.transaction_id(), None);
}

#[tokio::test]
async fn test_forbidden_status() {
    let (base_url, captured) = stub_gateway(StatusCode::FORBIDDEN, "denied").await;
    let gateway = Gateway::new(config(&base_url)).unwrap();

    let mut txn = gateway.refund("10000001", Decimal::from(5));
    let err = txn.commit().await.unwrap_err();

    match &err {
        BeanstreamError::Forbidden { status, body } => {
            assert_eq!(*status, 403);
            assert_eq!(body, "denied");
        }
        other => panic!("expected Forbidden, got {:?}", other),
    }
    assert_eq!(err.kind(), Some(ErrorKind::Forbidden));
    assert_eq!(txn.state(), TransactionState::Completed);
    assert_eq!(captured.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_status_classification_on_the_wire() {
    let cases = [
        (StatusCode::BAD_REQUEST, ErrorKind::InvalidRequest),
        (StatusCode::UNAUTHORIZED, ErrorKind::UnAuthorized),
        (StatusCode::PAYMENT_REQUIRED, ErrorKind::BusinessRule),
        (StatusCode::INTERNAL_SERVER_ERROR, ErrorKind::InternalServer),
        (StatusCode::SERVICE_UNAVAILABLE, ErrorKind::InternalServer),
    ];

    for (status, kind) in cases {
        let (base_url, _captured) = stub_gateway(status, "").await;
        let gateway = Gateway::new(config(&base_url)).unwrap();

        let err = gateway
            .void_purchase("10000001", Decimal::from(5))
            .commit()
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Some(kind), "status {}", status);
        assert_eq!(err.status(), Some(status.as_u16()));
    }
}

#[tokio::test]
async fn test_redirect_is_not_followed() {
    let (base_url, captured) = stub_gateway(StatusCode::FOUND, "moved").await;
    let gateway = Gateway::new(config(&base_url)).unwrap();

    let err = gateway
        .preauth_completion("10000001", Decimal::from(5))
        .commit()
        .await
        .unwrap_err();

    assert!(matches!(err, BeanstreamError::Redirection { status: 302, .. }));
    assert_eq!(captured.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_empty_hash_sentinel() {
    let (base_url, _captured) = stub_gateway(StatusCode::OK, "Empty hash value").await;
    let gateway = Gateway::new(config(&base_url)).unwrap();

    let mut txn = gateway.purchase(Decimal::from(5), &card(), None).unwrap();
    let err = txn.commit().await.unwrap_err();

    assert!(matches!(err, BeanstreamError::HashValidation));
    assert_eq!(err.kind(), None);
    assert_eq!(txn.state(), TransactionState::Completed);
}

#[tokio::test]
async fn test_missing_passcode_sends_nothing() {
    let (base_url, captured) = stub_gateway(StatusCode::OK, "trnId=1").await;
    let config = GatewayConfig::new(MERCHANT_ID)
        .with_payment_passcode("secret")
        .with_base_url(&base_url);
    let gateway = Gateway::new(config).unwrap();

    let mut txn = gateway.get_payment_profile("CUST");
    let err = txn.commit().await.unwrap_err();

    assert!(matches!(err, BeanstreamError::Configuration(_)));
    assert_eq!(txn.state(), TransactionState::Failed);
    assert!(captured.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_transport_failure() {
    let gateway = Gateway::new(config("http://127.0.0.1:1/")).unwrap();

    let mut txn = gateway.purchase(Decimal::from(5), &card(), None).unwrap();
    let err = txn.commit().await.unwrap_err();

    assert!(matches!(err, BeanstreamError::Transport(_)));
    assert_eq!(err.kind(), None);
    assert_eq!(txn.state(), TransactionState::Failed);
}

#[tokio::test]
async fn test_commit_twice_is_rejected() {
    let (base_url, captured) = stub_gateway(StatusCode::OK, "trnApproved=1&trnId=1").await;
    let gateway = Gateway::new(config(&base_url)).unwrap();

    let mut txn = gateway.purchase(Decimal::from(5), &card(), None).unwrap();
    txn.commit().await.unwrap();

    let err = txn.commit().await.unwrap_err();
    match err {
        BeanstreamError::AlreadyCommitted { order_number } => {
            assert_eq!(order_number, txn.order_number());
        }
        other => panic!("expected AlreadyCommitted, got {:?}", other),
    }
    assert_eq!(captured.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_validation_failure_sends_nothing() {
    let (base_url, captured) = stub_gateway(StatusCode::OK, "trnId=1").await;
    let gateway = Gateway::new(config(&base_url).with_require_billing_address(true)).unwrap();

    let mut txn = gateway.purchase(Decimal::from(5), &card(), None).unwrap();
    let err = txn.commit().await.unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::Validation));
    assert!(captured.lock().unwrap().is_empty());

    txn.set_billing_address(&address());
    txn.commit().await.unwrap();
    assert_eq!(captured.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_payment_profile_uses_profile_passcode() {
    let (base_url, captured) = stub_gateway(
        StatusCode::OK,
        "responseCode=1&responseMessage=Operation+Successful&customerCode=ABC123",
    )
    .await;
    let gateway = Gateway::new(config(&base_url)).unwrap();

    let mut txn = gateway.create_payment_profile(&card(), Some(&address())).unwrap();
    let response = txn.commit().await.unwrap();
    assert!(response.approved());
    assert_eq!(response.customer_code(), Some("ABC123"));

    let requests = captured.lock().unwrap();
    assert_eq!(requests[0].path, "/scripts/payment_profile.asp");
    assert_eq!(
        requests[0].authorization.as_deref(),
        Some("Passcode MzAwMjAwNTc4OnByb2ZpbGUtc2VjcmV0")
    );
    let form = requests[0].form();
    assert_eq!(form[fields::OPERATION_TYPE], "N");
    assert_eq!(form[fields::SERVICE_VERSION], "1.1");
}

#[tokio::test]
async fn test_modify_payment_profile_status() {
    let (base_url, captured) = stub_gateway(StatusCode::OK, "responseCode=1&status=D").await;
    let gateway = Gateway::new(config(&base_url)).unwrap();

    let mut txn = gateway.modify_payment_profile("ABC123");
    txn.set_status(ProfileStatus::Disabled);
    let response = txn.commit().await.unwrap();
    assert_eq!(response.status(), Some(ProfileStatus::Disabled));

    let form = captured.lock().unwrap()[0].form();
    assert_eq!(form[fields::CUSTOMER_CODE], "ABC123");
    assert_eq!(form[fields::PROFILE_STATUS], "D");
}

#[tokio::test]
async fn test_recurring_billing_flow() {
    let (base_url, captured) =
        stub_gateway(StatusCode::OK, "code=1&message=Request+successful&rbAccountId=42").await;
    let gateway = Gateway::new(config(&base_url)).unwrap();

    let mut txn = gateway.modify_recurring_billing_account("42");
    txn.set_billing_state(BillingState::OnHold)
        .set_billing_period(BillingPeriod::Month, 2);
    let response = txn.commit().await.unwrap();
    assert!(response.approved());
    assert_eq!(response.account_id(), Some("42"));

    let requests = captured.lock().unwrap();
    assert_eq!(requests[0].path, "/scripts/recurring_billing.asp");
    assert!(requests[0]
        .authorization
        .as_deref()
        .unwrap()
        .starts_with("Passcode "));
    let form = requests[0].form();
    assert_eq!(form[fields::ACCOUNT_ID], "42");
    assert_eq!(form[fields::BILLING_STATE], "O");
    assert_eq!(form[fields::BILLING_PERIOD], "M");
    assert_eq!(form[fields::BILLING_INCREMENT], "2");
}

#[tokio::test]
async fn test_report_query() {
    let (base_url, captured) = stub_gateway(
        StatusCode::OK,
        "trnId=1&trnId=2&trnAmount=5.00&trnAmount=7.50",
    )
    .await;
    let gateway = Gateway::new(config(&base_url)).unwrap();

    let start = chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let end = chrono::NaiveDate::from_ymd_opt(2024, 1, 31)
        .unwrap()
        .and_hms_opt(23, 59, 59)
        .unwrap();

    let mut txn = gateway.query_transactions();
    txn.set_query_params(start, end, 1, 50);
    let response = txn.commit().await.unwrap();

    assert_eq!(response.record_count(), 2);
    assert_eq!(response.records()[1]["trnAmount"], "7.50");

    let requests = captured.lock().unwrap();
    assert_eq!(requests[0].path, "/scripts/report.aspx");
    let form = requests[0].form();
    assert_eq!(form["rptStartDate"], "2024-01-01 00:00:00");
    assert_eq!(form["rptEndRow"], "50");
}

#[tokio::test]
async fn test_response_context() {
    let (base_url, _captured) = stub_gateway(StatusCode::OK, "trnApproved=1&trnId=7").await;
    let gateway = Gateway::new(config(&base_url)).unwrap();

    let mut txn = gateway.purchase(Decimal::from(5), &card(), None).unwrap();
    txn.add_response_param("cart", "42");
    let response = txn.commit().await.unwrap();

    assert_eq!(response.response().context("cart"), Some("42"));
    assert!(!response.response().contains("cart"));
}

#[derive(Debug)]
struct LengthHasher;

impl RequestHasher for LengthHasher {
    fn hash(&self, body: &str) -> beanstream::Result<String> {
        Ok(format!("len-{}", body.len()))
    }
}

#[tokio::test]
async fn test_request_hash_appended_to_payments_only() {
    let (base_url, captured) = stub_gateway(StatusCode::OK, "trnId=1&responseCode=1").await;
    let gateway = Gateway::new(config(&base_url).with_request_hasher(LengthHasher)).unwrap();

    gateway
        .purchase(Decimal::from(5), &card(), None)
        .unwrap()
        .commit()
        .await
        .unwrap();
    gateway.get_payment_profile("ABC").commit().await.unwrap();

    let requests = captured.lock().unwrap();
    let (hashed, hash) = requests[0].body.rsplit_once("&hashValue=").unwrap();
    assert_eq!(hash, format!("len-{}", hashed.len()));
    assert!(!requests[1].form().contains_key(fields::HASH_VALUE));
}

#[tokio::test]
async fn test_order_numbers_unique_over_the_wire() {
    let (base_url, captured) = stub_gateway(StatusCode::OK, "trnApproved=1").await;
    let gateway = Gateway::new(config(&base_url)).unwrap();

    for _ in 0..20 {
        gateway
            .purchase_with_payment_profile(Decimal::from(1), "CUST")
            .commit()
            .await
            .unwrap();
    }

    let numbers: HashSet<String> = captured
        .lock()
        .unwrap()
        .iter()
        .map(|r| r.form()[fields::ORDER_NUMBER].clone())
        .collect();
    assert_eq!(numbers.len(), 20);
}
