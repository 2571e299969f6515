//! Loyalty core
//!
//! Business logic of the cashback dashboard:
//! - [`cashback`]: sale settlement, balance bookkeeping and dashboard statistics
//! - [`billing`]: subscription usage, overage and plan changes
//! - [`checkout`]: the payment attempt state machine and its server-side backend
//!
//! Collaborators are reached through traits: [`store`] for persistence,
//! [`session`] for resolving the merchant behind a request, and [`gateway`]
//! for the external payment processor.

pub mod billing;
pub mod cashback;
pub mod checkout;
pub mod gateway;
pub mod session;
pub mod store;

pub use billing::{BillingError, PlanChangePreview, Usage, UsageLevel};
pub use cashback::{Redemption, Settlement, SettlementError};
pub use checkout::{PaymentAttempt, PaymentEvent, PaymentStep, TransitionError};
pub use gateway::{Charge, GatewayError, NewCharge, PaymentGateway, PixPayload};
pub use session::{MerchantSession, SessionError, SessionResolver, SessionToken};
pub use store::{MemoryStore, StoreError};
