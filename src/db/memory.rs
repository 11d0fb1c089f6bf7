// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory token store backed by `DashMap`.
//!
//! Lock order is always `active` before `records`. Rotation holds the
//! session's `active` entry for the whole compare-and-swap.

use super::{StoreError, TokenStore};
use crate::models::RefreshRecord;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;

/// Token store that lives in process memory.
#[derive(Clone, Default)]
pub struct MemoryTokenStore {
    /// All known records keyed by token id
    records: Arc<DashMap<String, RefreshRecord>>,
    /// Active token id keyed by session id
    active: Arc<DashMap<String, String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records held, revoked ones included.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Active token id of a session, if any.
    pub fn active_token(&self, session_id: &str) -> Option<String> {
        self.active.get(session_id).map(|id| id.clone())
    }

    fn mark_revoked(&self, token_id: &str) {
        if let Some(mut record) = self.records.get_mut(token_id) {
            record.revoked = true;
        }
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn insert(&self, record: RefreshRecord) -> Result<(), StoreError> {
        let active = self
            .active
            .entry(record.session_id.clone())
            .or_insert_with(|| record.token_id.clone());
        if *active != record.token_id {
            // A session only ever starts once; an existing pointer means the
            // caller reused a session id.
            return Err(StoreError::Conflict);
        }
        self.records.insert(record.token_id.clone(), record);
        Ok(())
    }

    async fn lookup(&self, token_id: &str) -> Result<Option<RefreshRecord>, StoreError> {
        Ok(self.records.get(token_id).map(|record| record.clone()))
    }

    async fn rotate(
        &self,
        old_token_id: &str,
        new_record: RefreshRecord,
    ) -> Result<(), StoreError> {
        let session_id = match self.records.get(old_token_id) {
            Some(record) => record.session_id.clone(),
            None => return Err(StoreError::Conflict),
        };
        if new_record.session_id != session_id {
            return Err(StoreError::Conflict);
        }

        let mut active = self
            .active
            .get_mut(&session_id)
            .ok_or(StoreError::Conflict)?;
        if *active != old_token_id {
            return Err(StoreError::Conflict);
        }

        if let Some(mut old) = self.records.get_mut(old_token_id) {
            old.revoked = true;
            old.replaced_by = Some(new_record.token_id.clone());
        }
        *active = new_record.token_id.clone();
        self.records.insert(new_record.token_id.clone(), new_record);
        Ok(())
    }

    async fn revoke(&self, token_id: &str) -> Result<(), StoreError> {
        let session_id = match self.records.get(token_id) {
            Some(record) => record.session_id.clone(),
            None => return Ok(()),
        };

        self.active
            .remove_if(&session_id, |_, active_id| active_id == token_id);
        self.mark_revoked(token_id);
        Ok(())
    }

    async fn revoke_session(&self, session_id: &str) -> Result<(), StoreError> {
        self.active.remove(session_id);
        for mut record in self.records.iter_mut() {
            if record.session_id == session_id {
                record.revoked = true;
            }
        }
        Ok(())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let before = self.records.len();
        self.active.retain(|_, token_id| {
            self.records
                .get(token_id.as_str())
                .map(|record| !record.is_expired(now))
                .unwrap_or(false)
        });
        self.records.retain(|_, record| !record.is_expired(now));
        Ok(before.saturating_sub(self.records.len()))
    }
}
