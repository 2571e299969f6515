//! Persistence boundary
//!
//! The core never talks to a database directly. Workflows depend on these
//! traits; every write that has to be atomic is a single trait call that
//! carries the value it expects to overwrite, so implementations can turn it
//! into a conditional update.

mod memory;

pub use memory::{MemoryStore, Seed, SubscriptionRow};

use async_trait::async_trait;
use shared::error::{AppError, ErrorCode};
use shared::models::{CustomerBalance, Merchant, PaymentRecord, Plan, Sale, Subscription};
use shared::money::Money;
use thiserror::Error;

use crate::billing::BillingError;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("Balance changed: expected {expected}, found {actual}")]
    BalanceConflict { expected: Money, actual: Money },

    #[error("Subscription changed: expected plan {expected}, found {actual}")]
    PlanConflict { expected: String, actual: String },

    #[error(transparent)]
    Rejected(#[from] BillingError),

    #[error("Storage error: {0}")]
    Backend(String),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => AppError::not_found(what),
            StoreError::BalanceConflict { .. } => AppError::new(ErrorCode::BalanceConflict),
            StoreError::PlanConflict { .. } => AppError::new(ErrorCode::PlanChangeConflict),
            StoreError::Rejected(e) => e.into(),
            StoreError::Backend(msg) => {
                tracing::error!(error = %msg, "Store backend failure");
                AppError::new(ErrorCode::DatabaseError)
            }
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Atomic unit written when a sale is registered
#[derive(Debug, Clone)]
pub struct SaleCommit {
    pub sale: Sale,
    /// Stored balance the settlement was computed against
    pub expected_balance: Money,
    pub new_balance: CustomerBalance,
}

#[async_trait]
pub trait MerchantStore: Send + Sync {
    async fn find_merchant(&self, merchant_id: &str) -> StoreResult<Option<Merchant>>;

    /// Cache the merchant's customer id at the payment gateway
    async fn set_gateway_customer_id(
        &self,
        merchant_id: &str,
        gateway_customer_id: &str,
    ) -> StoreResult<()>;
}

#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Current balance of a known customer at a merchant
    ///
    /// A customer without history at the merchant gets a zero balance;
    /// an unknown customer is `NotFound`.
    async fn load_balance(&self, merchant_id: &str, customer_id: &str)
    -> StoreResult<CustomerBalance>;

    /// Write the sale and the balance delta together, only if the stored
    /// balance still equals `commit.expected_balance`
    async fn commit_sale(&self, commit: SaleCommit) -> StoreResult<CustomerBalance>;

    /// Sales of a merchant created at or after `since`, newest first
    async fn list_sales(&self, merchant_id: &str, since: i64) -> StoreResult<Vec<Sale>>;

    /// Zero every balance whose validity window has passed; returns how many
    async fn expire_balances(&self, now: i64) -> StoreResult<usize>;
}

#[async_trait]
pub trait PlanCatalog: Send + Sync {
    /// Active plans ordered by monthly price
    async fn list_active_plans(&self) -> StoreResult<Vec<Plan>>;

    async fn find_plan(&self, plan_id: &str) -> StoreResult<Option<Plan>>;
}

#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    async fn find_subscription(&self, merchant_id: &str) -> StoreResult<Option<Subscription>>;

    /// Reassign the plan, only if the stored subscription is still on
    /// `expected_plan_id`; the cancelled and already-on-plan guards are
    /// re-checked at write time
    async fn commit_plan_change(
        &self,
        updated: &Subscription,
        expected_plan_id: &str,
    ) -> StoreResult<Subscription>;

    /// Set the externally supplied profile count
    async fn set_profile_count(&self, merchant_id: &str, count: u32) -> StoreResult<Subscription>;

    /// Payment history, newest due date first
    async fn list_payments(&self, merchant_id: &str) -> StoreResult<Vec<PaymentRecord>>;
}
