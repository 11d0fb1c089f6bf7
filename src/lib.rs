// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! refresh-gate: refresh token rotation service
//!
//! This crate exchanges refresh tokens for new access/refresh pairs,
//! rotating the stored token on every use and rejecting replays.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::TokenStore;
use services::{Clock, RefreshService, RefreshSettings, TokenCodec, UserDirectory};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub clock: Arc<dyn Clock>,
    pub codec: Arc<TokenCodec>,
    pub refresh: RefreshService,
}

impl AppState {
    /// Assemble the state from its collaborators.
    pub fn new(
        config: Config,
        store: Arc<dyn TokenStore>,
        users: Arc<dyn UserDirectory>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let codec = Arc::new(TokenCodec::new(
            &config.jwt_signing_key,
            &config.issuer,
            clock.clone(),
        ));
        let refresh = RefreshService::new(
            codec.clone(),
            store,
            users,
            clock.clone(),
            RefreshSettings::from(&config),
        );

        Self {
            config,
            clock,
            codec,
            refresh,
        }
    }
}
