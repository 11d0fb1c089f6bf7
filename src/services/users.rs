// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User existence checks.
//!
//! Accounts are owned by a separate user-management system; the refresh
//! flow only needs to know whether a user id still exists.

use crate::error::AppError;
use async_trait::async_trait;
use dashmap::DashSet;

/// Lookup of user ids owned by the account system.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn exists(&self, user_id: &str) -> Result<bool, AppError>;
}

/// Directory that accepts every user id.
///
/// For deployments where account deletion already revokes sessions
/// upstream.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyUser;

#[async_trait]
impl UserDirectory for AnyUser {
    async fn exists(&self, _user_id: &str) -> Result<bool, AppError> {
        Ok(true)
    }
}

/// Directory backed by an in-memory set of user ids.
#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    users: DashSet<String>,
}

impl InMemoryUserDirectory {
    pub fn new<I, S>(users: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            users: users.into_iter().map(Into::into).collect(),
        }
    }

    pub fn add(&self, user_id: &str) {
        self.users.insert(user_id.to_string());
    }

    pub fn remove(&self, user_id: &str) {
        self.users.remove(user_id);
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn exists(&self, user_id: &str) -> Result<bool, AppError> {
        Ok(self.users.contains(user_id))
    }
}
