// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request},
    response::Response,
};
use chrono::{DateTime, Utc};
use refresh_gate::config::Config;
use refresh_gate::db::{MemoryTokenStore, StoreError, TokenStore};
use refresh_gate::error::AppError;
use refresh_gate::models::RefreshRecord;
use refresh_gate::routes::create_router;
use refresh_gate::services::{FixedClock, InMemoryUserDirectory, UserDirectory};
use refresh_gate::AppState;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

/// Test app wired to in-memory collaborators and a controllable clock.
#[allow(dead_code)]
pub struct TestApp {
    pub router: axum::Router,
    pub state: Arc<AppState>,
    pub store: MemoryTokenStore,
    pub users: Arc<InMemoryUserDirectory>,
    pub clock: Arc<FixedClock>,
}

/// Create a test app with user "u1" known to the directory.
#[allow(dead_code)]
pub fn create_test_app() -> TestApp {
    create_test_app_with_config(Config::test_default())
}

#[allow(dead_code)]
pub fn create_test_app_with_config(config: Config) -> TestApp {
    let store = MemoryTokenStore::new();
    let users = Arc::new(InMemoryUserDirectory::new(["u1", "u2"]));
    let clock = Arc::new(FixedClock::new(Utc::now()));

    let state = Arc::new(AppState::new(
        config,
        Arc::new(store.clone()),
        users.clone(),
        clock.clone(),
    ));

    TestApp {
        router: create_router(state.clone()),
        state,
        store,
        users,
        clock,
    }
}

/// Create a test app whose user directory is `users`.
#[allow(dead_code)]
pub fn create_test_app_with_users(users: Arc<dyn UserDirectory>) -> StoreBackedApp {
    let store = MemoryTokenStore::new();
    let state = Arc::new(AppState::new(
        Config::test_default(),
        Arc::new(store.clone()),
        users,
        Arc::new(FixedClock::new(Utc::now())),
    ));
    StoreBackedApp {
        router: create_router(state.clone()),
        state,
        store,
    }
}

/// Test app with a caller-supplied user directory.
#[allow(dead_code)]
pub struct StoreBackedApp {
    pub router: axum::Router,
    pub state: Arc<AppState>,
    pub store: MemoryTokenStore,
}

/// Create a test app on top of an arbitrary store.
#[allow(dead_code)]
pub fn create_test_app_with_store(store: Arc<dyn TokenStore>) -> (axum::Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(
        Config::test_default(),
        store,
        Arc::new(InMemoryUserDirectory::new(["u1"])),
        Arc::new(FixedClock::new(Utc::now())),
    ));
    (create_router(state.clone()), state)
}

/// POST `/refresh` (or `/logout`) with an optional JSON token and cookie.
#[allow(dead_code)]
pub async fn post_token(
    router: &axum::Router,
    path: &str,
    body_token: Option<&str>,
    cookie_token: Option<&str>,
) -> Response {
    let mut request = Request::builder().method("POST").uri(path);

    if let Some(token) = cookie_token {
        request = request.header(header::COOKIE, format!("refresh_token={}", token));
    }

    let body = match body_token {
        Some(token) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(serde_json::json!({ "refreshToken": token }).to_string())
        }
        None => Body::empty(),
    };

    router
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap()
}

/// Read a JSON response body.
#[allow(dead_code)]
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// All `Set-Cookie` header values of a response.
#[allow(dead_code)]
pub fn set_cookie_headers(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|value| value.to_str().unwrap().to_string())
        .collect()
}

/// Store whose every call fails as if the backend were down.
#[allow(dead_code)]
pub struct UnavailableStore;

#[async_trait]
impl TokenStore for UnavailableStore {
    async fn insert(&self, _record: RefreshRecord) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn lookup(&self, _token_id: &str) -> Result<Option<RefreshRecord>, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn rotate(
        &self,
        _old_token_id: &str,
        _new_record: RefreshRecord,
    ) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn revoke(&self, _token_id: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn revoke_session(&self, _session_id: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn purge_expired(&self, _now: DateTime<Utc>) -> Result<usize, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }
}

/// Store that never answers within the configured timeout.
#[allow(dead_code)]
pub struct StalledStore;

impl StalledStore {
    const STALL: Duration = Duration::from_secs(30);
}

#[async_trait]
impl TokenStore for StalledStore {
    async fn insert(&self, _record: RefreshRecord) -> Result<(), StoreError> {
        tokio::time::sleep(Self::STALL).await;
        Ok(())
    }

    async fn lookup(&self, _token_id: &str) -> Result<Option<RefreshRecord>, StoreError> {
        tokio::time::sleep(Self::STALL).await;
        Ok(None)
    }

    async fn rotate(
        &self,
        _old_token_id: &str,
        _new_record: RefreshRecord,
    ) -> Result<(), StoreError> {
        tokio::time::sleep(Self::STALL).await;
        Ok(())
    }

    async fn revoke(&self, _token_id: &str) -> Result<(), StoreError> {
        tokio::time::sleep(Self::STALL).await;
        Ok(())
    }

    async fn revoke_session(&self, _session_id: &str) -> Result<(), StoreError> {
        tokio::time::sleep(Self::STALL).await;
        Ok(())
    }

    async fn purge_expired(&self, _now: DateTime<Utc>) -> Result<usize, StoreError> {
        tokio::time::sleep(Self::STALL).await;
        Ok(0)
    }
}

/// User directory that never answers within the configured timeout.
#[allow(dead_code)]
pub struct StalledUsers;

#[async_trait]
impl UserDirectory for StalledUsers {
    async fn exists(&self, _user_id: &str) -> Result<bool, AppError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(true)
    }
}
