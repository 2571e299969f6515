//! Dashboard statistics: today against yesterday

use rust_decimal::prelude::*;
use serde::Serialize;
use shared::error::AppResult;
use shared::models::Sale;
use shared::money::Money;
use shared::util::start_of_day_millis;

use crate::store::LedgerStore;

const DAY_MS: i64 = 86_400_000;
const RECENT_SALES: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PeriodTotals {
    pub sales_count: u32,
    /// Sum of purchase amounts
    pub total_sales: Money,
    /// Sum of amounts actually paid
    pub revenue: Money,
    pub cashback_issued: Money,
    pub cashback_redeemed: Money,
}

impl PeriodTotals {
    fn add(&mut self, sale: &Sale) {
        self.sales_count += 1;
        self.total_sales += sale.purchase_amount;
        self.revenue += sale.amount_payable;
        self.cashback_issued += sale.cashback_earned;
        self.cashback_redeemed += sale.redemption_used;
    }
}

/// Percentage change per metric, one decimal place
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trends {
    pub sales_count: Decimal,
    pub total_sales: Decimal,
    pub revenue: Decimal,
    pub cashback_issued: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardStats {
    pub today: PeriodTotals,
    pub yesterday: PeriodTotals,
    pub trends: Trends,
    pub recent_sales: Vec<Sale>,
}

/// Percentage change from `previous` to `current`, rounded to one decimal
///
/// With no previous value the trend is 100 if anything happened, else 0.
pub fn calculate_trend(current: Decimal, previous: Decimal) -> Decimal {
    if previous.is_zero() {
        return if current > Decimal::ZERO {
            Decimal::ONE_HUNDRED
        } else {
            Decimal::ZERO
        };
    }
    ((current - previous) / previous * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
}

/// Aggregate sales into today/yesterday totals (UTC days)
pub fn dashboard_stats(sales: &[Sale], now: i64) -> DashboardStats {
    let today_start = start_of_day_millis(now);
    let yesterday_start = today_start - DAY_MS;

    let mut today = PeriodTotals::default();
    let mut yesterday = PeriodTotals::default();
    for sale in sales {
        if sale.created_at >= today_start {
            today.add(sale);
        } else if sale.created_at >= yesterday_start {
            yesterday.add(sale);
        }
    }

    let mut recent: Vec<Sale> = sales.to_vec();
    recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    recent.truncate(RECENT_SALES);

    let trends = Trends {
        sales_count: calculate_trend(
            Decimal::from(today.sales_count),
            Decimal::from(yesterday.sales_count),
        ),
        total_sales: calculate_trend(today.total_sales.amount(), yesterday.total_sales.amount()),
        revenue: calculate_trend(today.revenue.amount(), yesterday.revenue.amount()),
        cashback_issued: calculate_trend(
            today.cashback_issued.amount(),
            yesterday.cashback_issued.amount(),
        ),
    };

    DashboardStats {
        today,
        yesterday,
        trends,
        recent_sales: recent,
    }
}

/// Load a merchant's sales and build the dashboard
pub async fn load_dashboard_stats<S>(store: &S, merchant_id: &str, now: i64) -> AppResult<DashboardStats>
where
    S: LedgerStore + ?Sized,
{
    let sales = store.list_sales(merchant_id, 0).await?;
    Ok(dashboard_stats(&sales, now))
}
