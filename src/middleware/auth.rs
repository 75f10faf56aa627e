//! Bearer-credential middleware.
//!
//! Every authenticated route verifies a fresh provider credential; nothing
//! is cached between requests. The verified [`Identity`] lands in the
//! request extensions for handlers to pick up.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::auth::Identity;
use crate::utils::error::AppError;
use crate::AppState;

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, Response> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            AppError::Auth("Missing authorization header".to_string()).into_response()
        })?;

    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        AppError::Auth("Invalid authorization header format".to_string()).into_response()
    })?;

    let identity: Identity = state.identity.verify(token).map_err(|_| {
        AppError::Auth("Invalid or expired credential".to_string()).into_response()
    })?;

    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}
