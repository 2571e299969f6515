//! Bearer session authentication for the dashboard API

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use loyalty_core::session::{SessionError, SessionToken};
use shared::error::AppError;
use shared::util::now_millis;

use crate::state::AppState;

/// Resolves `Authorization: Bearer <token>` into a `MerchantSession`
///
/// On success both the session and the raw token are inserted into the
/// request extensions.
pub async fn session_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, Response> {
    let token = request
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(SessionToken::from_bearer)
        .ok_or_else(|| AppError::from(SessionError::Missing).into_response())?;

    let session = state.sessions.resolve(&token, now_millis()).map_err(|e| {
        tracing::debug!(%e, "Session rejected");
        AppError::from(e).into_response()
    })?;

    request.extensions_mut().insert(session);
    request.extensions_mut().insert(token);

    Ok(next.run(request).await)
}
