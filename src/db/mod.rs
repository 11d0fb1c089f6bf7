// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Refresh token persistence.
//!
//! [`TokenStore`] is the seam the refresh flow depends on; the in-memory
//! implementation backs the server and the tests.

pub mod memory;

pub use memory::MemoryTokenStore;

use crate::models::RefreshRecord;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Store-level failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The presented token is no longer the session's active token.
    #[error("refresh token is not the active token for its session")]
    Conflict,

    #[error("token store unavailable: {0}")]
    Unavailable(String),
}

/// Persistence for refresh token records.
///
/// Each session has at most one active token id. Implementations must make
/// [`TokenStore::rotate`] a single conditional update so two callers holding
/// the same token cannot both succeed.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Store a new record and make it its session's active token.
    async fn insert(&self, record: RefreshRecord) -> Result<(), StoreError>;

    /// Fetch a record by token id, revoked or not.
    async fn lookup(&self, token_id: &str) -> Result<Option<RefreshRecord>, StoreError>;

    /// Replace the active record of `old_token_id`'s session with `new_record`.
    ///
    /// Fails with [`StoreError::Conflict`] if `old_token_id` is unknown or no
    /// longer active.
    async fn rotate(&self, old_token_id: &str, new_record: RefreshRecord)
        -> Result<(), StoreError>;

    /// Mark a token inactive. Unknown or already revoked ids are fine.
    async fn revoke(&self, token_id: &str) -> Result<(), StoreError>;

    /// Revoke every record belonging to a session.
    async fn revoke_session(&self, session_id: &str) -> Result<(), StoreError>;

    /// Delete records that expired at or before `now`; returns how many.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, StoreError>;
}
