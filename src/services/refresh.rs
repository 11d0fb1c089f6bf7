// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Refresh token rotation with reuse detection.
//!
//! A refresh request moves through `Received → Verified → Rotated → Issued`
//! or stops at a rejection:
//! 1. verify the presented token (signature, structure, kind)
//! 2. look up its record; unknown or revoked means revoked/reused
//! 3. check expiry against the clock; an expired record is revoked
//! 4. confirm the user still exists
//! 5. issue a new pair in the same session
//! 6. compare-and-rotate the stored record; losing the race means reuse
//!
//! Every store and user directory call is bounded by the configured
//! timeout.

use crate::config::Config;
use crate::db::{StoreError, TokenStore};
use crate::error::{AppError, Result};
use crate::models::{RefreshRecord, TokenKind, TokenPair};
use crate::services::clock::Clock;
use crate::services::token_codec::TokenCodec;
use crate::services::users::UserDirectory;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Lifetimes and policy knobs for the refresh flow.
#[derive(Debug, Clone)]
pub struct RefreshSettings {
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub store_timeout: Duration,
    pub revoke_session_on_reuse: bool,
}

impl From<&Config> for RefreshSettings {
    fn from(config: &Config) -> Self {
        Self {
            access_ttl: config.access_ttl,
            refresh_ttl: config.refresh_ttl,
            store_timeout: config.store_timeout,
            revoke_session_on_reuse: config.revoke_session_on_reuse,
        }
    }
}

/// Issues, rotates and revokes refresh tokens.
pub struct RefreshService {
    codec: Arc<TokenCodec>,
    store: Arc<dyn TokenStore>,
    users: Arc<dyn UserDirectory>,
    clock: Arc<dyn Clock>,
    settings: RefreshSettings,
}

impl RefreshService {
    pub fn new(
        codec: Arc<TokenCodec>,
        store: Arc<dyn TokenStore>,
        users: Arc<dyn UserDirectory>,
        clock: Arc<dyn Clock>,
        settings: RefreshSettings,
    ) -> Self {
        Self {
            codec,
            store,
            users,
            clock,
            settings,
        }
    }

    pub fn settings(&self) -> &RefreshSettings {
        &self.settings
    }

    /// Open a new session for an already authenticated user.
    ///
    /// This is the hand-off point for the login flow. Unknown users are
    /// rejected before anything is issued.
    pub async fn start_session(&self, user_id: &str) -> Result<TokenPair> {
        if !self.user_exists(user_id).await? {
            tracing::warn!(user_id, "Session start for unknown user");
            return Err(AppError::RevokedOrReused);
        }

        let session_id = self.codec.new_id()?;
        let (pair, record) = self.issue_pair(user_id, &session_id)?;

        self.timed("insert", self.store.insert(record)).await?;

        tracing::info!(user_id, session_id = %session_id, "Session started");
        Ok(pair)
    }

    /// Exchange a refresh token for a new pair, rotating the stored record.
    pub async fn refresh(&self, presented: &str) -> Result<TokenPair> {
        let result = self.rotate(presented).await;

        if let Err(err) = &result {
            if err.is_rejection() {
                tracing::warn!(reason = %err, "Refresh rejected");
            }
        }

        result
    }

    async fn rotate(&self, presented: &str) -> Result<TokenPair> {
        // Expiry is checked below so the stored record can be revoked.
        let claims = self.codec.verify_ignoring_expiry(presented)?;
        if claims.kind != TokenKind::Refresh {
            return Err(AppError::Malformed);
        }

        let record = self
            .timed("lookup", self.store.lookup(&claims.jti))
            .await?
            .ok_or(AppError::RevokedOrReused)?;

        if record.user_id != claims.sub || record.session_id != claims.sid {
            return Err(AppError::RevokedOrReused);
        }

        if record.revoked {
            self.handle_reuse(&record).await?;
            return Err(AppError::RevokedOrReused);
        }

        let now = self.clock.now();
        if record.is_expired(now) || claims.exp <= now.timestamp() {
            self.timed("revoke", self.store.revoke(&record.token_id))
                .await?;
            return Err(AppError::Expired);
        }

        if !self.user_exists(&record.user_id).await? {
            tracing::warn!(
                user_id = %record.user_id,
                session_id = %record.session_id,
                "Refresh for unknown user, revoking session"
            );
            self.timed("revoke_session", self.store.revoke_session(&record.session_id))
                .await?;
            return Err(AppError::RevokedOrReused);
        }

        let (pair, next) = self.issue_pair(&record.user_id, &record.session_id)?;

        match self
            .timed("rotate", self.store.rotate(&record.token_id, next))
            .await
        {
            Ok(()) => {}
            Err(AppError::RevokedOrReused) => {
                self.handle_reuse(&record).await?;
                return Err(AppError::RevokedOrReused);
            }
            Err(err) => return Err(err),
        }

        tracing::info!(
            user_id = %record.user_id,
            session_id = %record.session_id,
            "Refresh token rotated"
        );
        Ok(pair)
    }

    /// Revoke the presented refresh token.
    ///
    /// Tokens that fail verification have nothing left to revoke, so only
    /// store failures are reported.
    pub async fn logout(&self, presented: &str) -> Result<()> {
        let claims = match self.codec.verify(presented) {
            Ok(claims) if claims.kind == TokenKind::Refresh => claims,
            Ok(_) => return Ok(()),
            Err(err) if err.is_rejection() => {
                tracing::debug!(reason = %err, "Logout with unusable token");
                return Ok(());
            }
            Err(err) => return Err(err),
        };

        self.timed("revoke", self.store.revoke(&claims.jti)).await?;

        tracing::info!(user_id = %claims.sub, session_id = %claims.sid, "Session logged out");
        Ok(())
    }

    /// Drop records that are past their expiry.
    pub async fn sweep_expired(&self) -> Result<usize> {
        let purged = self
            .timed("purge_expired", self.store.purge_expired(self.clock.now()))
            .await?;

        if purged > 0 {
            tracing::info!(purged, "Purged expired refresh tokens");
        }
        Ok(purged)
    }

    async fn handle_reuse(&self, record: &RefreshRecord) -> Result<()> {
        tracing::warn!(
            user_id = %record.user_id,
            session_id = %record.session_id,
            revoke_session = self.settings.revoke_session_on_reuse,
            "Refresh token reuse detected"
        );

        if self.settings.revoke_session_on_reuse {
            self.timed("revoke_session", self.store.revoke_session(&record.session_id))
                .await?;
        }
        Ok(())
    }

    fn issue_pair(&self, user_id: &str, session_id: &str) -> Result<(TokenPair, RefreshRecord)> {
        let access = self.codec.issue(
            user_id,
            session_id,
            TokenKind::Access,
            self.settings.access_ttl,
        )?;
        let refresh = self.codec.issue(
            user_id,
            session_id,
            TokenKind::Refresh,
            self.settings.refresh_ttl,
        )?;

        let record = RefreshRecord::from_claims(&refresh.claims);
        let pair = TokenPair {
            access_token: access.token,
            refresh_token: refresh.token,
            access_expires_at: access.claims.expires_at(),
            refresh_expires_at: refresh.claims.expires_at(),
        };

        Ok((pair, record))
    }

    async fn user_exists(&self, user_id: &str) -> Result<bool> {
        match tokio::time::timeout(self.settings.store_timeout, self.users.exists(user_id)).await {
            Ok(result) => result,
            Err(_) => Err(AppError::StoreUnavailable(format!(
                "user lookup timed out after {:?}",
                self.settings.store_timeout
            ))),
        }
    }

    async fn timed<T, F>(&self, op: &'static str, call: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, StoreError>>,
    {
        match tokio::time::timeout(self.settings.store_timeout, call).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(AppError::StoreUnavailable(format!(
                "{} timed out after {:?}",
                op, self.settings.store_timeout
            ))),
        }
    }
}
