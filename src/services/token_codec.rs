// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Signed token encoding and verification (HS256 JWT).
//!
//! Expiry is checked against the injected [`Clock`] rather than by
//! `jsonwebtoken`, so tests can move time and there is no leeway.

use crate::error::{AppError, Result};
use crate::models::{Claims, IssuedToken, TokenKind};
use crate::services::clock::Clock;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use ring::rand::{SecureRandom, SystemRandom};
use std::sync::Arc;
use std::time::Duration;

/// Bytes of randomness in token and session ids.
const ID_BYTES: usize = 16;

/// Issues and verifies access and refresh tokens.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: String,
    clock: Arc<dyn Clock>,
    rng: SystemRandom,
}

impl TokenCodec {
    pub fn new(signing_key: &[u8], issuer: &str, clock: Arc<dyn Clock>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false; // checked against `clock`
        validation.validate_aud = false;
        validation.set_issuer(&[issuer]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(signing_key),
            decoding_key: DecodingKey::from_secret(signing_key),
            validation,
            issuer: issuer.to_string(),
            clock,
            rng: SystemRandom::new(),
        }
    }

    /// Random URL-safe identifier for tokens and sessions.
    pub fn new_id(&self) -> Result<String> {
        let mut bytes = [0u8; ID_BYTES];
        self.rng
            .fill(&mut bytes)
            .map_err(|_| AppError::Internal(anyhow::anyhow!("System RNG failure")))?;
        Ok(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Sign a new token for `user_id` in `session_id`, valid for `ttl`.
    pub fn issue(
        &self,
        user_id: &str,
        session_id: &str,
        kind: TokenKind,
        ttl: Duration,
    ) -> Result<IssuedToken> {
        let now = self.clock.now().timestamp();
        let ttl_secs = i64::try_from(ttl.as_secs())
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Token TTL out of range: {}", e)))?;

        let claims = Claims {
            sub: user_id.to_string(),
            sid: session_id.to_string(),
            jti: self.new_id()?,
            kind,
            iss: self.issuer.clone(),
            iat: now,
            exp: now.saturating_add(ttl_secs),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT encoding failed: {}", e)))?;

        Ok(IssuedToken { token, claims })
    }

    /// Check signature, structure and expiry, returning the claims.
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let claims = self.verify_ignoring_expiry(token)?;

        if claims.exp <= self.clock.now().timestamp() {
            return Err(AppError::Expired);
        }

        Ok(claims)
    }

    /// Check signature and structure only.
    ///
    /// Callers must check `exp` themselves; the refresh flow uses this to
    /// find and revoke the stored record of an expired token.
    pub fn verify_ignoring_expiry(&self, token: &str) -> Result<Claims> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => AppError::InvalidSignature,
                ErrorKind::ExpiredSignature => AppError::Expired,
                _ => AppError::Malformed,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::clock::FixedClock;
    use chrono::Utc;

    const KEY: &[u8] = b"unit_test_signing_key_32_bytes!!";

    fn codec() -> (TokenCodec, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::new(Utc::now()));
        (TokenCodec::new(KEY, "unit-test", clock.clone()), clock)
    }

    #[test]
    fn test_issue_then_verify_returns_user_and_kind() {
        let (codec, _) = codec();

        for kind in [TokenKind::Access, TokenKind::Refresh] {
            let issued = codec
                .issue("u1", "s1", kind, Duration::from_secs(3600))
                .unwrap();
            let claims = codec.verify(&issued.token).unwrap();

            assert_eq!(claims.sub, "u1");
            assert_eq!(claims.sid, "s1");
            assert_eq!(claims.kind, kind);
            assert_eq!(claims, issued.claims);
            assert_eq!(claims.exp - claims.iat, 3600);
        }
    }

    #[test]
    fn test_expired_after_ttl() {
        let (codec, clock) = codec();
        let issued = codec
            .issue("u1", "s1", TokenKind::Refresh, Duration::from_secs(60))
            .unwrap();

        clock.advance(chrono::Duration::seconds(59));
        assert!(codec.verify(&issued.token).is_ok());

        clock.advance(chrono::Duration::seconds(1));
        assert!(matches!(codec.verify(&issued.token), Err(AppError::Expired)));
    }

    #[test]
    fn test_expired_claims_still_readable_when_signed() {
        let (codec, clock) = codec();
        let issued = codec
            .issue("u1", "s1", TokenKind::Refresh, Duration::from_secs(60))
            .unwrap();

        clock.advance(chrono::Duration::minutes(5));
        assert!(matches!(codec.verify(&issued.token), Err(AppError::Expired)));
        assert_eq!(codec.verify_ignoring_expiry(&issued.token).unwrap(), issued.claims);
        assert!(matches!(
            codec.verify_ignoring_expiry("not-a-token"),
            Err(AppError::Malformed)
        ));
    }

    #[test]
    fn test_tampered_signature_rejected() {
        let (codec, _) = codec();
        let issued = codec
            .issue("u1", "s1", TokenKind::Refresh, Duration::from_secs(60))
            .unwrap();

        let (unsigned, signature) = issued.token.rsplit_once('.').unwrap();
        let flipped = if signature.starts_with('A') { "B" } else { "A" };
        let tampered = format!("{}.{}{}", unsigned, flipped, &signature[1..]);

        assert!(matches!(
            codec.verify(&tampered),
            Err(AppError::InvalidSignature)
        ));
    }

    #[test]
    fn test_foreign_key_rejected() {
        let (codec, clock) = codec();
        let other = TokenCodec::new(b"another_signing_key_of_32_bytes!", "unit-test", clock);
        let issued = other
            .issue("u1", "s1", TokenKind::Refresh, Duration::from_secs(60))
            .unwrap();

        assert!(matches!(
            codec.verify(&issued.token),
            Err(AppError::InvalidSignature)
        ));
    }

    #[test]
    fn test_garbage_is_malformed() {
        let (codec, _) = codec();
        assert!(matches!(codec.verify("not-a-token"), Err(AppError::Malformed)));
        assert!(matches!(codec.verify(""), Err(AppError::Malformed)));
    }

    #[test]
    fn test_wrong_issuer_is_malformed() {
        let (codec, clock) = codec();
        let other = TokenCodec::new(KEY, "someone-else", clock);
        let issued = other
            .issue("u1", "s1", TokenKind::Access, Duration::from_secs(60))
            .unwrap();

        assert!(matches!(codec.verify(&issued.token), Err(AppError::Malformed)));
    }

    #[test]
    fn test_ids_are_unique() {
        let (codec, _) = codec();
        let a = codec.new_id().unwrap();
        let b = codec.new_id().unwrap();
        assert_ne!(a, b);
        assert_eq!(a.len(), 22);
    }
}
