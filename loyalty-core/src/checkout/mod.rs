//! Plan checkout: state machine, attempt driver and server-side backend

mod attempt;
mod message;
mod service;
mod state;

pub use attempt::{CheckoutBackend, CreateChargeRequest, PaymentAttempt};
pub use message::{LOGIN_MESSAGE, RETRY_MESSAGE, user_message};
pub use service::{CheckoutService, external_reference};
pub use state::{PaymentEvent, PaymentStep, TransitionError, transition};
