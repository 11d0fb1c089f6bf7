// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Refresh and logout routes.
//!
//! The refresh token is read from a JSON body `{"refreshToken": "..."}` or,
//! failing that, from the `refresh_token` cookie.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    routing::post,
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::time_utils::{format_utc_rfc3339, seconds_until};
use crate::AppState;

/// Name of the cookie carrying the refresh token.
pub const REFRESH_COOKIE: &str = "refresh_token";

const TOKEN_TYPE: &str = "Bearer";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/refresh", post(refresh))
        .route("/logout", post(logout))
}

/// Request body for `/refresh` and `/logout`.
#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RefreshBody {
    #[validate(length(min = 1, max = 4096))]
    refresh_token: String,
}

/// New token pair returned by `/refresh`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "bindings/")
)]
pub struct TokenPairResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token expiry (RFC 3339, UTC)
    pub expires_at: String,
    /// Seconds until the access token expires
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub expires_in: i64,
    pub token_type: String,
}

/// Exchange a refresh token for a new pair.
async fn refresh(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    body: Bytes,
) -> Result<(CookieJar, Json<TokenPairResponse>)> {
    let presented = presented_token(&jar, &body).inspect_err(|_| {
        tracing::warn!("Refresh request without a usable token");
    })?;

    let pair = state.refresh.refresh(&presented).await?;

    let now = state.clock.now();
    let cookie = refresh_cookie(
        &state.config,
        pair.refresh_token.clone(),
        seconds_until(now, pair.refresh_expires_at),
    );

    Ok((
        jar.add(cookie),
        Json(TokenPairResponse {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            expires_at: format_utc_rfc3339(pair.access_expires_at),
            expires_in: seconds_until(now, pair.access_expires_at),
            token_type: TOKEN_TYPE.to_string(),
        }),
    ))
}

/// Revoke the presented refresh token and clear the cookie.
async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    body: Bytes,
) -> Result<(StatusCode, CookieJar)> {
    if let Ok(presented) = presented_token(&jar, &body) {
        state.refresh.logout(&presented).await?;
    }

    let removal = refresh_cookie(&state.config, String::new(), 0);
    Ok((StatusCode::NO_CONTENT, jar.remove(removal)))
}

/// Pick the refresh token from the body, falling back to the cookie.
///
/// A body that does not parse as [`RefreshBody`] is treated as absent.
fn presented_token(jar: &CookieJar, body: &Bytes) -> Result<String> {
    if let Ok(parsed) = serde_json::from_slice::<RefreshBody>(body) {
        parsed.validate().map_err(|_| AppError::Malformed)?;
        return Ok(parsed.refresh_token);
    }

    jar.get(REFRESH_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
        .ok_or(AppError::Malformed)
}

fn refresh_cookie(config: &Config, value: String, max_age_secs: i64) -> Cookie<'static> {
    Cookie::build((REFRESH_COOKIE, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(config.cookie_secure)
        .max_age(time::Duration::seconds(max_age_secs))
        .build()
}
