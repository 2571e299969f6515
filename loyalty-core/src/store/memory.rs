//! In-memory store
//!
//! Reference implementation of the persistence traits. Every trait call takes
//! the lock once, so each conditional write is atomic with its check.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use shared::models::{
    Customer, CustomerBalance, Merchant, PaymentRecord, Plan, Sale, Subscription,
    SubscriptionStatus,
};
use shared::money::Money;

use super::{
    LedgerStore, MerchantStore, PlanCatalog, SaleCommit, StoreError, StoreResult,
    SubscriptionStore,
};
use crate::billing::{BillingError, recompute_subscription_usage};
use crate::cashback::is_expired;

/// Stored form of a subscription: the plan is a reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionRow {
    pub id: String,
    pub merchant_id: String,
    pub plan_id: String,
    pub status: SubscriptionStatus,
    #[serde(default)]
    pub current_profile_count: u32,
    #[serde(default)]
    pub started_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

/// Initial contents, usually loaded from a JSON file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Seed {
    pub merchants: Vec<Merchant>,
    pub customers: Vec<Customer>,
    pub balances: Vec<CustomerBalance>,
    pub plans: Vec<Plan>,
    pub subscriptions: Vec<SubscriptionRow>,
    pub payments: Vec<PaymentRecord>,
    pub sales: Vec<Sale>,
}

type BalanceKey = (String, String);

fn balance_key(merchant_id: &str, customer_id: &str) -> BalanceKey {
    (merchant_id.to_string(), customer_id.to_string())
}

#[derive(Default)]
struct Tables {
    merchants: HashMap<String, Merchant>,
    customers: HashMap<String, Customer>,
    balances: HashMap<BalanceKey, CustomerBalance>,
    plans: HashMap<String, Plan>,
    /// Keyed by merchant id (one subscription per merchant)
    subscriptions: HashMap<String, SubscriptionRow>,
    payments: Vec<PaymentRecord>,
    sales: Vec<Sale>,
}

impl Tables {
    fn join(&self, row: &SubscriptionRow) -> StoreResult<Subscription> {
        let plan = self.plans.get(&row.plan_id).cloned().ok_or_else(|| {
            StoreError::Backend(format!(
                "subscription {} references unknown plan {}",
                row.id, row.plan_id
            ))
        })?;
        Ok(Subscription {
            id: row.id.clone(),
            merchant_id: row.merchant_id.clone(),
            plan,
            status: row.status,
            current_profile_count: row.current_profile_count,
            started_at: row.started_at,
            updated_at: row.updated_at,
        })
    }

    fn subscription(&self, merchant_id: &str) -> StoreResult<Subscription> {
        let row = self
            .subscriptions
            .get(merchant_id)
            .ok_or_else(|| StoreError::NotFound("subscription".into()))?;
        self.join(row)
    }

    /// Re-derive pending payment amounts after a plan or count change
    fn recompute(&mut self, merchant_id: &str) -> StoreResult<()> {
        let Some(row) = self.subscriptions.get(merchant_id) else {
            return Ok(());
        };
        let subscription = self.join(row)?;
        let usage = recompute_subscription_usage(&subscription, self.payments.iter_mut());
        tracing::debug!(
            merchant_id = %merchant_id,
            plan_id = %subscription.plan.id,
            excess_profiles = usage.excess_profiles,
            excess_amount = %usage.excess_amount,
            "Subscription usage recomputed"
        );
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seed(seed: Seed) -> Self {
        let store = Self::new();
        {
            let mut t = store.tables.write();
            t.merchants = seed.merchants.into_iter().map(|m| (m.id.clone(), m)).collect();
            t.customers = seed.customers.into_iter().map(|c| (c.id.clone(), c)).collect();
            t.balances = seed
                .balances
                .into_iter()
                .map(|b| (balance_key(&b.merchant_id, &b.customer_id), b))
                .collect();
            t.plans = seed.plans.into_iter().map(|p| (p.id.clone(), p)).collect();
            t.subscriptions = seed
                .subscriptions
                .into_iter()
                .map(|s| (s.merchant_id.clone(), s))
                .collect();
            t.payments = seed.payments;
            t.sales = seed.sales;
        }
        store
    }

    pub fn from_json(json: &str) -> StoreResult<Self> {
        let seed: Seed = serde_json::from_str(json)
            .map_err(|e| StoreError::Backend(format!("invalid seed: {e}")))?;
        Ok(Self::from_seed(seed))
    }

    pub fn insert_merchant(&self, merchant: Merchant) {
        self.tables.write().merchants.insert(merchant.id.clone(), merchant);
    }

    pub fn insert_customer(&self, customer: Customer) {
        self.tables.write().customers.insert(customer.id.clone(), customer);
    }

    pub fn insert_balance(&self, balance: CustomerBalance) {
        let key = balance_key(&balance.merchant_id, &balance.customer_id);
        self.tables.write().balances.insert(key, balance);
    }

    pub fn insert_plan(&self, plan: Plan) {
        self.tables.write().plans.insert(plan.id.clone(), plan);
    }

    pub fn insert_subscription(&self, row: SubscriptionRow) {
        self.tables.write().subscriptions.insert(row.merchant_id.clone(), row);
    }

    pub fn insert_payment(&self, payment: PaymentRecord) {
        self.tables.write().payments.push(payment);
    }
}

#[async_trait]
impl MerchantStore for MemoryStore {
    async fn find_merchant(&self, merchant_id: &str) -> StoreResult<Option<Merchant>> {
        Ok(self.tables.read().merchants.get(merchant_id).cloned())
    }

    async fn set_gateway_customer_id(
        &self,
        merchant_id: &str,
        gateway_customer_id: &str,
    ) -> StoreResult<()> {
        let mut t = self.tables.write();
        let merchant = t
            .merchants
            .get_mut(merchant_id)
            .ok_or_else(|| StoreError::NotFound("merchant".into()))?;
        merchant.gateway_customer_id = Some(gateway_customer_id.to_string());
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn load_balance(
        &self,
        merchant_id: &str,
        customer_id: &str,
    ) -> StoreResult<CustomerBalance> {
        let t = self.tables.read();
        if !t.customers.contains_key(customer_id) {
            return Err(StoreError::NotFound("customer".into()));
        }
        Ok(t.balances
            .get(&balance_key(merchant_id, customer_id))
            .cloned()
            .unwrap_or_else(|| CustomerBalance::new(customer_id, merchant_id)))
    }

    async fn commit_sale(&self, commit: SaleCommit) -> StoreResult<CustomerBalance> {
        let mut t = self.tables.write();
        let SaleCommit {
            sale,
            expected_balance,
            new_balance,
        } = commit;

        if !t.customers.contains_key(&sale.customer_id) {
            return Err(StoreError::NotFound("customer".into()));
        }

        let key = balance_key(&sale.merchant_id, &sale.customer_id);
        let existing = t.balances.get(&key);
        let is_first_purchase = existing.is_none();
        let actual = existing.map(|b| b.current_balance).unwrap_or(Money::ZERO);
        if actual != expected_balance {
            return Err(StoreError::BalanceConflict {
                expected: expected_balance,
                actual,
            });
        }

        let merchant_id = sale.merchant_id.clone();
        // the plan must resolve before anything is written
        if is_first_purchase {
            if let Some(row) = t.subscriptions.get(&merchant_id) {
                t.join(row)?;
            }
        }

        t.balances.insert(key, new_balance.clone());
        t.sales.push(sale);

        // A new customer relationship counts against the merchant's plan
        if is_first_purchase {
            if let Some(row) = t.subscriptions.get_mut(&merchant_id) {
                row.current_profile_count = row.current_profile_count.saturating_add(1);
            }
            t.recompute(&merchant_id)?;
        }

        Ok(new_balance)
    }

    async fn list_sales(&self, merchant_id: &str, since: i64) -> StoreResult<Vec<Sale>> {
        let t = self.tables.read();
        let mut sales: Vec<Sale> = t
            .sales
            .iter()
            .filter(|s| s.merchant_id == merchant_id && s.created_at >= since)
            .cloned()
            .collect();
        sales.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sales)
    }

    async fn expire_balances(&self, now: i64) -> StoreResult<usize> {
        let mut t = self.tables.write();
        let Tables {
            merchants,
            balances,
            ..
        } = &mut *t;

        let mut expired = 0;
        for balance in balances.values_mut() {
            let window = merchants
                .get(&balance.merchant_id)
                .and_then(|m| m.cashback_expiration_days);
            if balance.current_balance.is_positive()
                && is_expired(balance.last_purchase_at, window, now)
            {
                tracing::info!(
                    merchant_id = %balance.merchant_id,
                    customer_id = %balance.customer_id,
                    amount = %balance.current_balance,
                    "Cashback balance expired"
                );
                balance.current_balance = Money::ZERO;
                expired += 1;
            }
        }
        Ok(expired)
    }
}

#[async_trait]
impl PlanCatalog for MemoryStore {
    async fn list_active_plans(&self) -> StoreResult<Vec<Plan>> {
        let t = self.tables.read();
        let mut plans: Vec<Plan> = t.plans.values().filter(|p| p.is_active).cloned().collect();
        plans.sort_by(|a, b| {
            a.monthly_price
                .cmp(&b.monthly_price)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(plans)
    }

    async fn find_plan(&self, plan_id: &str) -> StoreResult<Option<Plan>> {
        Ok(self.tables.read().plans.get(plan_id).cloned())
    }
}

#[async_trait]
impl SubscriptionStore for MemoryStore {
    async fn find_subscription(&self, merchant_id: &str) -> StoreResult<Option<Subscription>> {
        let t = self.tables.read();
        match t.subscriptions.get(merchant_id) {
            Some(row) => t.join(row).map(Some),
            None => Ok(None),
        }
    }

    async fn commit_plan_change(
        &self,
        updated: &Subscription,
        expected_plan_id: &str,
    ) -> StoreResult<Subscription> {
        let mut t = self.tables.write();
        if !t.plans.contains_key(&updated.plan.id) {
            return Err(StoreError::NotFound("plan".into()));
        }

        {
            let row = t
                .subscriptions
                .get_mut(&updated.merchant_id)
                .ok_or_else(|| StoreError::NotFound("subscription".into()))?;

            if row.status == SubscriptionStatus::Cancelled {
                return Err(BillingError::SubscriptionCancelled.into());
            }
            if row.plan_id == updated.plan.id {
                return Err(BillingError::AlreadyOnPlan(row.plan_id.clone()).into());
            }
            if row.plan_id != expected_plan_id {
                return Err(StoreError::PlanConflict {
                    expected: expected_plan_id.to_string(),
                    actual: row.plan_id.clone(),
                });
            }

            row.plan_id = updated.plan.id.clone();
            row.updated_at = updated.updated_at;
        }

        t.recompute(&updated.merchant_id)?;
        t.subscription(&updated.merchant_id)
    }

    async fn set_profile_count(&self, merchant_id: &str, count: u32) -> StoreResult<Subscription> {
        let mut t = self.tables.write();
        t.subscription(merchant_id)?;
        t.subscriptions
            .get_mut(merchant_id)
            .ok_or_else(|| StoreError::NotFound("subscription".into()))?
            .current_profile_count = count;
        t.recompute(merchant_id)?;
        t.subscription(merchant_id)
    }

    async fn list_payments(&self, merchant_id: &str) -> StoreResult<Vec<PaymentRecord>> {
        let t = self.tables.read();
        let mut payments: Vec<PaymentRecord> = t
            .payments
            .iter()
            .filter(|p| p.merchant_id == merchant_id)
            .cloned()
            .collect();
        payments.sort_by(|a, b| b.due_date.cmp(&a.due_date));
        Ok(payments)
    }
}
