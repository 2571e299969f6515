//! Status codes for [`ErrorCode`]

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Business and validation failures default to 400
    pub fn http_status(&self) -> StatusCode {
        use ErrorCode::*;
        match self {
            Success => StatusCode::OK,
            NotAuthenticated | TokenInvalid | SessionExpired => StatusCode::UNAUTHORIZED,
            NotFound | MerchantNotFound | CustomerNotFound | PlanNotFound
            | SubscriptionNotFound | ChargeNotFound => StatusCode::NOT_FOUND,
            BalanceConflict | PlanChangeConflict => StatusCode::CONFLICT,
            GatewayRejected => StatusCode::BAD_GATEWAY,
            // retryable
            NetworkError | TimeoutError | PixPayloadUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Unknown | InternalError | DatabaseError | ConfigError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => StatusCode::BAD_REQUEST,
        }
    }
}
