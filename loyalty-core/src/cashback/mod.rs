//! Cashback: settlement, balances, sale registration and statistics

mod balance;
mod settlement;
mod stats;
mod workflow;

pub use balance::{apply_settlement, is_expired, spendable_balance};
pub use settlement::{MAX_PURCHASE_AMOUNT, Redemption, Settlement, SettlementError, settle_sale};
pub use stats::{DashboardStats, PeriodTotals, Trends, calculate_trend, dashboard_stats, load_dashboard_stats};
pub use workflow::{SaleQuote, SaleRequest, quote_sale, register_sale};
