// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Token payloads and stored refresh records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which of the two token flavours a JWT is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT claims shared by access and refresh tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Session the token belongs to
    pub sid: String,
    /// Token ID, unique per issuance
    pub jti: String,
    /// Access or refresh
    pub kind: TokenKind,
    /// Issuer
    pub iss: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    pub fn issued_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.iat, 0).unwrap_or_default()
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or_default()
    }
}

/// A freshly signed token together with the claims it carries.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
}

/// Stored state of one refresh token issuance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshRecord {
    /// Matches the `jti` claim (also used as the record key)
    pub token_id: String,
    pub user_id: String,
    pub session_id: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Set on rotation, logout or reuse detection
    pub revoked: bool,
    /// Token ID that superseded this one on rotation
    pub replaced_by: Option<String>,
}

impl RefreshRecord {
    /// Build the record for a newly issued refresh token.
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            token_id: claims.jti.clone(),
            user_id: claims.sub.clone(),
            session_id: claims.sid.clone(),
            issued_at: claims.issued_at(),
            expires_at: claims.expires_at(),
            revoked: false,
            replaced_by: None,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Access/refresh pair handed back to the client.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
}
