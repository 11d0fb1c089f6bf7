// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Loaded once at startup and handed to constructors explicitly; nothing
//! reads the environment after `main` has built the state.

use std::env;
use std::time::Duration;

/// Signing keys shorter than this are refused for HS256.
pub const MIN_SIGNING_KEY_LEN: usize = 32;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// Server port
    pub port: u16,
    /// `iss` claim written into and required on every token
    pub issuer: String,
    /// Lifetime of access tokens
    pub access_ttl: Duration,
    /// Lifetime of refresh tokens
    pub refresh_ttl: Duration,
    /// Upper bound on any single token store call
    pub store_timeout: Duration,
    /// How often expired refresh records are purged
    pub sweep_interval: Duration,
    /// Revoke the whole session when a rotated token is presented again
    pub revoke_session_on_reuse: bool,
    /// Mark the refresh cookie `Secure`
    pub cookie_secure: bool,

    // --- Secrets ---
    /// JWT signing key (raw bytes)
    pub jwt_signing_key: Vec<u8>,
}

impl Config {
    /// Config for tests only.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            port: 8080,
            issuer: "refresh-gate-test".to_string(),
            access_ttl: Duration::from_secs(15 * 60),
            refresh_ttl: Duration::from_secs(60 * 60),
            store_timeout: Duration::from_millis(500),
            sweep_interval: Duration::from_secs(60),
            revoke_session_on_reuse: true,
            cookie_secure: false,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!!".to_vec(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// A `.env` file is honoured for local development.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let jwt_signing_key = env::var("JWT_SIGNING_KEY")
            .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
            .into_bytes();
        if jwt_signing_key.len() < MIN_SIGNING_KEY_LEN {
            return Err(ConfigError::Invalid(
                "JWT_SIGNING_KEY",
                format!("must be at least {} bytes", MIN_SIGNING_KEY_LEN),
            ));
        }

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            port: parse_or("PORT", 8080)?,
            issuer: env::var("TOKEN_ISSUER").unwrap_or_else(|_| "refresh-gate".to_string()),
            access_ttl: Duration::from_secs(nonzero_or("ACCESS_TOKEN_TTL_SECS", 15 * 60)?),
            refresh_ttl: Duration::from_secs(nonzero_or(
                "REFRESH_TOKEN_TTL_SECS",
                14 * 24 * 60 * 60,
            )?),
            store_timeout: Duration::from_millis(nonzero_or("STORE_TIMEOUT_MS", 2000)?),
            sweep_interval: Duration::from_secs(nonzero_or("SWEEP_INTERVAL_SECS", 300)?),
            revoke_session_on_reuse: parse_or("REVOKE_SESSION_ON_REUSE", true)?,
            cookie_secure: parse_or("COOKIE_SECURE", true)?,
            jwt_signing_key,
        })
    }
}

/// Read an optional variable, falling back to `default` when unset.
fn parse_or<T>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::Invalid(name, e.to_string())),
        Err(_) => Ok(default),
    }
}

/// Like [`parse_or`], for durations where zero is meaningless.
fn nonzero_or(name: &'static str, default: u64) -> Result<u64, ConfigError> {
    match parse_or(name, default)? {
        0 => Err(ConfigError::Invalid(name, "must be greater than zero".to_string())),
        value => Ok(value),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
