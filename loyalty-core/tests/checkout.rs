mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use common::{FakeGateway, pix_payload, seeded_store};
use loyalty_core::checkout::{
    CheckoutBackend, CheckoutService, CreateChargeRequest, LOGIN_MESSAGE, PaymentAttempt,
    PaymentStep, RETRY_MESSAGE,
};
use loyalty_core::gateway::{Charge, GatewayError, PixPayload};
use loyalty_core::session::{SessionClaims, SessionToken, TokenSessionResolver};
use loyalty_core::store::{MemoryStore, MerchantStore};
use parking_lot::Mutex;
use rust_decimal_macros::dec;
use shared::error::{AppError, ErrorCode};
use shared::models::BillingMethod;
use shared::money::Money;
use tokio_util::sync::CancellationToken;

type Service = CheckoutService<MemoryStore, FakeGateway, TokenSessionResolver>;

fn token(merchant_id: &str) -> SessionToken {
    SessionClaims {
        company_id: merchant_id.into(),
        exp: i64::MAX,
    }
    .encode()
}

fn service(gateway: FakeGateway) -> (Service, Arc<MemoryStore>, Arc<FakeGateway>) {
    let store = Arc::new(seeded_store());
    let gateway = Arc::new(gateway);
    let svc = CheckoutService::new(store.clone(), gateway.clone(), Arc::new(TokenSessionResolver));
    (svc, store, gateway)
}

// ========== Attempt driver against the real service ==========

#[tokio::test]
async fn pix_attempt_lands_in_display() {
    let (svc, store, gateway) = service(FakeGateway::new());
    let mut attempt = PaymentAttempt::new(svc, "a");

    let step = attempt
        .select_method(BillingMethod::Pix, Some(&token("m-1")))
        .await
        .unwrap();

    match step {
        PaymentStep::PixDisplay { charge, pix } => {
            assert_eq!(charge.amount, Money::new(dec!(49.90)));
            assert!(!pix.qr_text.is_empty());
        }
        other => panic!("unexpected {other:?}"),
    }

    let created = gateway.created.lock();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].method, BillingMethod::Pix);
    assert_eq!(created[0].description, "Subscription to plan A");
    assert_eq!(created[0].customer_id, "cus_000001");
    assert!(created[0].external_reference.starts_with("merchant_m-1_plan_a_"));
    assert_eq!(
        created[0].idempotency_key.as_deref(),
        created[0].external_reference.strip_prefix("merchant_m-1_plan_a_")
    );

    // customer id written back to the merchant
    let merchant = store.find_merchant("m-1").await.unwrap().unwrap();
    assert_eq!(merchant.gateway_customer_id.as_deref(), Some("cus_000001"));
}

#[tokio::test]
async fn card_attempt_redirects() {
    let (svc, _, _) = service(FakeGateway::new());
    let mut attempt = PaymentAttempt::new(svc, "b");

    let step = attempt
        .select_method(BillingMethod::CreditCard, Some(&token("m-1")))
        .await
        .unwrap();

    match step {
        PaymentStep::RedirectCard { checkout_url, .. } => {
            assert!(checkout_url.starts_with("https://"))
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn gateway_rejection_lands_in_error_then_retry() {
    let mut gateway = FakeGateway::new();
    gateway.create_error = Some(GatewayError::Rejected(vec![
        "O valor deve ser maior que zero".into(),
        "Cliente inválido".into(),
    ]));
    let (svc, _, gateway) = service(gateway);
    let mut attempt = PaymentAttempt::new(svc, "a");

    let step = attempt
        .select_method(BillingMethod::Pix, Some(&token("m-1")))
        .await
        .unwrap();
    assert_eq!(
        step,
        &PaymentStep::Error {
            message: "O valor deve ser maior que zero, Cliente inválido".into(),
            requires_login: false,
        }
    );
    assert_eq!(gateway.pix_calls.load(Ordering::SeqCst), 0);

    // only way out is back to selection
    assert!(attempt.select_method(BillingMethod::Pix, Some(&token("m-1"))).await.is_err());
    assert_eq!(attempt.retry().unwrap(), &PaymentStep::SelectMethod);
}

#[tokio::test]
async fn network_failure_shows_generic_message() {
    let mut gateway = FakeGateway::new();
    gateway.create_error = Some(GatewayError::Network("dns error: sandbox.asaas.com".into()));
    let (svc, _, _) = service(gateway);
    let mut attempt = PaymentAttempt::new(svc, "a");

    let step = attempt
        .select_method(BillingMethod::CreditCard, Some(&token("m-1")))
        .await
        .unwrap();
    match step {
        PaymentStep::Error { message, .. } => assert_eq!(message, RETRY_MESSAGE),
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn qr_failure_goes_pending_and_refresh_recovers() {
    let gateway = FakeGateway::new();
    *gateway.pix.lock() = Err(GatewayError::Timeout);
    let (svc, _, gateway) = service(gateway);
    let mut attempt = PaymentAttempt::new(svc, "a");
    let session = token("m-1");

    let step = attempt
        .select_method(BillingMethod::Pix, Some(&session))
        .await
        .unwrap();
    assert_eq!(step.name(), "pix-pending");
    assert!(step.charge().is_some());

    // still failing: stays pending
    let step = attempt.refresh_pix(&session).await.unwrap();
    assert_eq!(step.name(), "pix-pending");

    *gateway.pix.lock() = Ok(pix_payload("000201010212"));
    let step = attempt.refresh_pix(&session).await.unwrap();
    assert_eq!(step.name(), "pix-display");

    // refresh never re-creates the charge
    assert_eq!(gateway.create_count(), 1);
    assert_eq!(gateway.pix_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn empty_qr_payload_is_pending() {
    let gateway = FakeGateway::new();
    *gateway.pix.lock() = Ok(pix_payload(""));
    let (svc, _, _) = service(gateway);
    let mut attempt = PaymentAttempt::new(svc, "a");

    let step = attempt
        .select_method(BillingMethod::Pix, Some(&token("m-1")))
        .await
        .unwrap();
    assert_eq!(step.name(), "pix-pending");
}

#[tokio::test]
async fn missing_session_requires_login() {
    let (svc, _, gateway) = service(FakeGateway::new());
    let mut attempt = PaymentAttempt::new(svc, "a");

    let step = attempt.select_method(BillingMethod::Pix, None).await.unwrap();
    assert_eq!(
        step,
        &PaymentStep::Error {
            message: LOGIN_MESSAGE.into(),
            requires_login: true,
        }
    );
    assert_eq!(gateway.create_count(), 0);
}

#[tokio::test]
async fn expired_session_requires_login() {
    let (svc, _, gateway) = service(FakeGateway::new());
    let mut attempt = PaymentAttempt::new(svc, "a");
    let expired = SessionClaims {
        company_id: "m-1".into(),
        exp: 1,
    }
    .encode();

    let step = attempt
        .select_method(BillingMethod::Pix, Some(&expired))
        .await
        .unwrap();
    match step {
        PaymentStep::Error { requires_login, .. } => assert!(*requires_login),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(gateway.create_count(), 0);
}

#[tokio::test]
async fn close_discards_transient_state() {
    let (svc, _, _) = service(FakeGateway::new());
    let mut attempt = PaymentAttempt::new(svc, "a");
    attempt
        .select_method(BillingMethod::Pix, Some(&token("m-1")))
        .await
        .unwrap();

    attempt.close().unwrap();
    assert_eq!(attempt.step(), &PaymentStep::SelectMethod);
    assert!(attempt.step().charge().is_none());
}

// ========== Service rules ==========

#[tokio::test]
async fn unregistered_merchant_contacts_support() {
    let mut gateway = FakeGateway::new();
    gateway.customer = None;
    let (svc, store, _) = service(gateway);

    let err = svc
        .create_charge(
            &token("m-1"),
            &CreateChargeRequest {
                plan_id: "a".into(),
                billing_type: BillingMethod::Pix,
                attempt_key: "k-1".into(),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::MerchantNotRegistered);
    assert!(err.message.contains("contact support"));

    let merchant = store.find_merchant("m-1").await.unwrap().unwrap();
    assert!(merchant.gateway_customer_id.is_none());
}

#[tokio::test]
async fn cached_customer_skips_lookup() {
    let (svc, store, gateway) = service(FakeGateway::new());
    store.set_gateway_customer_id("m-1", "cus_cached").await.unwrap();

    svc.create_charge(
        &token("m-1"),
        &CreateChargeRequest {
            plan_id: "a".into(),
            billing_type: BillingMethod::CreditCard,
            attempt_key: "k-1".into(),
        },
    )
    .await
    .unwrap();

    assert_eq!(gateway.lookups.load(Ordering::SeqCst), 0);
    assert_eq!(gateway.created.lock()[0].customer_id, "cus_cached");
}

#[tokio::test]
async fn same_attempt_key_reuses_charge() {
    let (svc, _, gateway) = service(FakeGateway::new());
    let request = CreateChargeRequest {
        plan_id: "a".into(),
        billing_type: BillingMethod::Pix,
        attempt_key: "k-1".into(),
    };

    let first = svc.create_charge(&token("m-1"), &request).await.unwrap();
    let second = svc.create_charge(&token("m-1"), &request).await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(gateway.create_count(), 1);
}

#[tokio::test]
async fn inactive_or_unknown_plan_rejected() {
    let (svc, _, gateway) = service(FakeGateway::new());
    for plan_id in ["old", "missing"] {
        let err = svc
            .create_charge(
                &token("m-1"),
                &CreateChargeRequest {
                    plan_id: plan_id.into(),
                    billing_type: BillingMethod::Pix,
                    attempt_key: "k".into(),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::PlanNotFound);
    }
    assert_eq!(gateway.create_count(), 0);
}

#[tokio::test]
async fn missing_tax_document_contacts_support() {
    let (svc, store, _) = service(FakeGateway::new());
    let mut merchant = store.find_merchant("m-1").await.unwrap().unwrap();
    merchant.cnpj = None;
    store.insert_merchant(merchant);

    let err = svc
        .create_charge(
            &token("m-1"),
            &CreateChargeRequest {
                plan_id: "a".into(),
                billing_type: BillingMethod::Pix,
                attempt_key: "k".into(),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::MerchantTaxIdMissing);
}

#[tokio::test]
async fn empty_plan_id_is_validation_error() {
    let (svc, _, _) = service(FakeGateway::new());
    let err = svc
        .create_charge(
            &token("m-1"),
            &CreateChargeRequest {
                plan_id: "".into(),
                billing_type: BillingMethod::Pix,
                attempt_key: "k".into(),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::RequiredField);
}

// ========== Cancellation ==========

/// Backend that cancels the attempt while its create call is in flight
struct CancelDuringCreate {
    cancel: Mutex<Option<CancellationToken>>,
    calls: AtomicUsize,
}

#[async_trait]
impl CheckoutBackend for CancelDuringCreate {
    async fn create_charge(
        &self,
        _token: &SessionToken,
        _request: &CreateChargeRequest,
    ) -> Result<Charge, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(token) = self.cancel.lock().as_ref() {
            token.cancel();
        }
        Ok(Charge {
            id: "pay_x".into(),
            status: "PENDING".into(),
            amount: Money::new(dec!(49.90)),
            checkout_url: None,
            external_reference: None,
        })
    }

    async fn pix_payload(&self, _token: &SessionToken, _charge_id: &str) -> Result<PixPayload, AppError> {
        Ok(pix_payload("000201"))
    }
}

#[tokio::test]
async fn cancel_during_processing_discards_result() {
    let backend = Arc::new(CancelDuringCreate {
        cancel: Mutex::new(None),
        calls: AtomicUsize::new(0),
    });
    let mut attempt = PaymentAttempt::new(backend.clone(), "a");
    *backend.cancel.lock() = Some(attempt.cancellation());

    let step = attempt
        .select_method(BillingMethod::Pix, Some(&token("m-1")))
        .await
        .unwrap();

    // in-flight call completed, result dropped
    assert_eq!(step, &PaymentStep::SelectMethod);
    assert_eq!(backend.calls.load(Ordering::SeqCst), 1);

    // a fresh cancellation token is armed for the next attempt
    assert!(!attempt.cancellation().is_cancelled());
}

#[tokio::test]
async fn cancelled_then_closed_attempt_does_not_poison_the_next() {
    let (svc, _store, gateway) = service(FakeGateway::new());
    let mut attempt = PaymentAttempt::new(svc, "a");
    let session = token("m-1");

    let step = attempt.select_method(BillingMethod::Pix, Some(&session)).await.unwrap();
    assert!(matches!(step, PaymentStep::PixDisplay { .. }));

    // UI cancels on close after the call already returned
    attempt.cancellation().cancel();
    attempt.close().unwrap();
    assert!(!attempt.cancellation().is_cancelled());

    let step = attempt.select_method(BillingMethod::Pix, Some(&session)).await.unwrap();
    assert!(matches!(step, PaymentStep::PixDisplay { .. }), "got {step:?}");
    assert_eq!(gateway.create_count(), 2);
}

#[tokio::test]
async fn token_cancelled_before_selection_is_rearmed() {
    let (svc, _store, gateway) = service(FakeGateway::new());
    let mut attempt = PaymentAttempt::new(svc, "a");
    attempt.cancellation().cancel();

    let step = attempt
        .select_method(BillingMethod::CreditCard, Some(&token("m-1")))
        .await
        .unwrap();
    assert!(matches!(step, PaymentStep::RedirectCard { .. }), "got {step:?}");
    assert_eq!(gateway.create_count(), 1);
}

#[tokio::test]
async fn pix_payload_is_scoped_to_the_owning_merchant() {
    let (svc, _, _) = service(FakeGateway::new());
    let request = CreateChargeRequest {
        plan_id: "a".into(),
        billing_type: BillingMethod::Pix,
        attempt_key: "k-1".into(),
    };
    let charge = svc.create_charge(&token("m-1"), &request).await.unwrap();

    assert!(svc.pix_payload(&token("m-1"), &charge.id).await.is_ok());

    let err = svc.pix_payload(&token("m-10"), &charge.id).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ChargeNotFound);
    let err = svc.pix_payload(&token("m-1"), "pay_unknown").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ChargeNotFound);
}
