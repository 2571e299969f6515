#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use loyalty_core::gateway::{Charge, GatewayError, NewCharge, PaymentGateway, PixPayload};
use loyalty_core::store::{MemoryStore, SubscriptionRow};
use parking_lot::Mutex;
use rust_decimal_macros::dec;
use shared::document::TaxId;
use shared::models::{Customer, Merchant, Plan, SubscriptionStatus};
use shared::money::{Money, Percent};

pub const CNPJ: &str = "11.222.333/0001-81";

/// Scriptable in-process gateway
pub struct FakeGateway {
    pub customer: Option<String>,
    pub create_error: Option<GatewayError>,
    pub pix: Mutex<Result<PixPayload, GatewayError>>,
    pub created: Mutex<Vec<NewCharge>>,
    pub lookups: AtomicUsize,
    pub pix_calls: AtomicUsize,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self {
            customer: Some("cus_000001".into()),
            create_error: None,
            pix: Mutex::new(Ok(pix_payload("00020126580014br.gov.bcb.pix"))),
            created: Mutex::new(Vec::new()),
            lookups: AtomicUsize::new(0),
            pix_calls: AtomicUsize::new(0),
        }
    }

    pub fn create_count(&self) -> usize {
        self.created.lock().len()
    }
}

pub fn pix_payload(text: &str) -> PixPayload {
    PixPayload {
        qr_image_base64: "iVBORw0KGgoAAAANSUhEUg==".into(),
        qr_text: text.into(),
        expires_at: Some("2024-06-04 23:59:59".into()),
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn find_customer_by_tax_id(&self, _tax_id: &TaxId) -> Result<Option<String>, GatewayError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.customer.clone())
    }

    async fn find_charge_by_reference(
        &self,
        external_reference: &str,
    ) -> Result<Option<Charge>, GatewayError> {
        let created = self.created.lock();
        Ok(created
            .iter()
            .position(|c| c.external_reference == external_reference)
            .map(|i| charge_for(i, &created[i])))
    }

    async fn find_charge(&self, charge_id: &str) -> Result<Option<Charge>, GatewayError> {
        let created = self.created.lock();
        Ok(created
            .iter()
            .enumerate()
            .map(|(i, c)| charge_for(i, c))
            .find(|c| c.id == charge_id))
    }

    async fn create_charge(&self, charge: &NewCharge) -> Result<Charge, GatewayError> {
        if let Some(err) = &self.create_error {
            return Err(err.clone());
        }
        let mut created = self.created.lock();
        created.push(charge.clone());
        let index = created.len() - 1;
        Ok(charge_for(index, charge))
    }

    async fn pix_payload(&self, _charge_id: &str) -> Result<PixPayload, GatewayError> {
        self.pix_calls.fetch_add(1, Ordering::SeqCst);
        self.pix.lock().clone()
    }
}

fn charge_for(index: usize, charge: &NewCharge) -> Charge {
    Charge {
        id: format!("pay_{index}"),
        status: "PENDING".into(),
        amount: charge.amount,
        checkout_url: Some(format!("https://sandbox.asaas.com/i/{index}")),
        external_reference: Some(charge.external_reference.clone()),
    }
}

pub fn plan(id: &str, price: Money, limit: u32, fee: Money) -> Plan {
    Plan {
        id: id.into(),
        name: id.to_uppercase(),
        description: None,
        monthly_price: price,
        included_profiles: limit,
        excess_profile_fee: fee,
        is_active: true,
    }
}

/// Merchant m-1 on plan "a" with 40 profiles, plus customer c-1
pub fn seeded_store() -> MemoryStore {
    let store = MemoryStore::new();
    store.insert_merchant(Merchant {
        id: "m-1".into(),
        name: "Mercado Bom Preço".into(),
        cnpj: Some(CNPJ.into()),
        cashback_percent: Percent::from(10),
        min_purchase_value: None,
        cashback_expiration_days: None,
        gateway_customer_id: None,
    });
    store.insert_customer(Customer {
        id: "c-1".into(),
        name: "João".into(),
        cpf: Some("529.982.247-25".into()),
        phone: None,
    });
    store.insert_plan(plan("a", Money::new(dec!(49.90)), 100, Money::new(dec!(2.00))));
    store.insert_plan(plan("b", Money::new(dec!(29.90)), 20, Money::new(dec!(3.00))));
    let mut retired = plan("old", Money::new(dec!(19.90)), 10, Money::new(dec!(1.00)));
    retired.is_active = false;
    store.insert_plan(retired);
    store.insert_subscription(SubscriptionRow {
        id: "s-1".into(),
        merchant_id: "m-1".into(),
        plan_id: "a".into(),
        status: SubscriptionStatus::Active,
        current_profile_count: 40,
        started_at: 0,
        updated_at: 0,
    });
    store
}
