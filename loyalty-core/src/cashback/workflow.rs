//! Sale quote and registration
//!
//! Both steps re-read the customer's balance from the store immediately
//! before settling. Registration commits through a conditional write keyed on
//! that read, so two concurrent sales cannot redeem the same balance.

use serde::{Deserialize, Serialize};
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{CustomerBalance, Merchant, Sale};
use shared::money::{Money, Percent};

use super::balance::{apply_settlement, spendable_balance};
use super::settlement::{Redemption, Settlement, settle_sale};
use crate::store::{LedgerStore, MerchantStore, SaleCommit, StoreError};

/// Sale as submitted by the merchant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleRequest {
    pub customer_id: String,
    pub purchase_amount: Money,
    #[serde(default)]
    pub redemption: Redemption,
    /// Redemption shown to the merchant when the sale was quoted
    #[serde(default)]
    pub quoted_redemption: Option<Money>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaleQuote {
    pub customer_id: String,
    pub purchase_amount: Money,
    pub available_balance: Money,
    /// Rate actually applied (zero below the merchant's minimum purchase)
    pub cashback_percent: Percent,
    pub below_minimum: bool,
    #[serde(flatten)]
    pub settlement: Settlement,
}

/// Rate for this purchase: the merchant's rate, or zero when the purchase is
/// below the configured minimum
fn effective_percent(merchant: &Merchant, purchase: Money) -> (Percent, bool) {
    match merchant.min_purchase_value {
        Some(min) if purchase < min => (Percent::ZERO, true),
        _ => (merchant.cashback_percent, false),
    }
}

async fn load_context<S>(
    store: &S,
    merchant_id: &str,
    customer_id: &str,
) -> AppResult<(Merchant, CustomerBalance)>
where
    S: MerchantStore + LedgerStore + ?Sized,
{
    if customer_id.trim().is_empty() {
        return Err(AppError::required("customer_id"));
    }

    let merchant = store
        .find_merchant(merchant_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::MerchantNotFound))?;

    let balance = store
        .load_balance(merchant_id, customer_id)
        .await
        .map_err(|e| match e {
            StoreError::NotFound(_) => AppError::new(ErrorCode::CustomerNotFound)
                .with_detail("customer_id", customer_id),
            other => other.into(),
        })?;

    Ok((merchant, balance))
}

/// Preview a sale against the customer's current balance
pub async fn quote_sale<S>(
    store: &S,
    merchant_id: &str,
    request: &SaleRequest,
    now: i64,
) -> AppResult<SaleQuote>
where
    S: MerchantStore + LedgerStore + ?Sized,
{
    let (merchant, balance) = load_context(store, merchant_id, &request.customer_id).await?;
    let available = spendable_balance(&balance, &merchant, now);
    let (percent, below_minimum) = effective_percent(&merchant, request.purchase_amount);

    let settlement = settle_sale(request.purchase_amount, available, request.redemption, percent)?;

    Ok(SaleQuote {
        customer_id: request.customer_id.clone(),
        purchase_amount: request.purchase_amount,
        available_balance: available,
        cashback_percent: percent,
        below_minimum,
        settlement,
    })
}

/// Register a sale and adjust the customer's balance atomically
///
/// If the balance dropped below a previously quoted redemption, or changed
/// between the read and the write, nothing is written and the caller gets a
/// `BalanceConflict` to re-quote.
pub async fn register_sale<S>(
    store: &S,
    merchant_id: &str,
    request: &SaleRequest,
    now: i64,
) -> AppResult<Sale>
where
    S: MerchantStore + LedgerStore + ?Sized,
{
    // 1. Fresh read
    let (merchant, balance) = load_context(store, merchant_id, &request.customer_id).await?;
    let available = spendable_balance(&balance, &merchant, now);

    // 2. Settle
    let (percent, _) = effective_percent(&merchant, request.purchase_amount);
    let settlement = settle_sale(request.purchase_amount, available, request.redemption, percent)?;

    // 3. Quoted redemption must still be honoured in full
    if let Some(quoted) = request.quoted_redemption {
        if settlement.redemption_used < quoted {
            tracing::warn!(
                merchant_id = %merchant_id,
                customer_id = %request.customer_id,
                quoted = %quoted,
                available = %available,
                "Balance dropped below quoted redemption"
            );
            return Err(AppError::new(ErrorCode::BalanceConflict)
                .with_detail("quoted_redemption", quoted.to_string())
                .with_detail("available_balance", available.to_string()));
        }
    }

    // 4. Build the atomic unit
    let new_balance = apply_settlement(&balance, available, &settlement, now)?;
    let sale = Sale {
        id: uuid::Uuid::new_v4().to_string(),
        merchant_id: merchant_id.to_string(),
        customer_id: request.customer_id.clone(),
        purchase_amount: request.purchase_amount,
        redemption_used: settlement.redemption_used,
        amount_payable: settlement.amount_payable,
        cashback_earned: settlement.cashback_earned,
        cashback_percent: percent,
        created_at: now,
    };

    // 5. Conditional commit
    let commit = SaleCommit {
        sale: sale.clone(),
        expected_balance: balance.current_balance,
        new_balance,
    };
    match store.commit_sale(commit).await {
        Ok(updated) => {
            tracing::info!(
                merchant_id = %merchant_id,
                customer_id = %sale.customer_id,
                sale_id = %sale.id,
                purchase = %sale.purchase_amount,
                redeemed = %sale.redemption_used,
                cashback = %sale.cashback_earned,
                balance = %updated.current_balance,
                "Sale registered"
            );
            Ok(sale)
        }
        Err(e @ StoreError::BalanceConflict { .. }) => {
            tracing::warn!(merchant_id = %merchant_id, customer_id = %sale.customer_id, %e, "Sale commit conflict");
            Err(e.into())
        }
        Err(e) => Err(e.into()),
    }
}
