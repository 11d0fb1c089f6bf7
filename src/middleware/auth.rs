// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Access token authentication middleware.

use crate::error::AppError;
use crate::models::TokenKind;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Authenticated user extracted from an access token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub session_id: String,
}

/// Middleware that requires a valid access token in the `Authorization` header.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or(AppError::Malformed)?;

    let claims = state.codec.verify(token)?;
    if claims.kind != TokenKind::Access {
        return Err(AppError::Malformed);
    }

    let auth_user = AuthUser {
        user_id: claims.sub,
        session_id: claims.sid,
    };
    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}
