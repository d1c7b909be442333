//! # Session Tokens
//!
//! Stateless HS256 tokens in compact JWT layout
//! (`base64url(header).base64url(claims).base64url(hmac)`).
//! Claims bind a user id to an issue and expiry instant.

use super::AuthConfig;
use crate::error::{ShopError, ShopResult};
use crate::id::RecordId;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Duration, TimeZone, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::debug;

type HmacSha256 = Hmac<Sha256>;

/// Source of the current instant
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Move the clock forward
    pub fn advance(&self, by: Duration) {
        if let Ok(mut now) = self.now.lock() {
            *now += by;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.lock().map(|now| *now).unwrap_or_else(|e| *e.into_inner())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    typ: String,
}

/// Signed token claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expires at (unix seconds)
    pub exp: i64,
}

/// A freshly issued token
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues and verifies session tokens
#[derive(Debug, Clone)]
pub struct TokenService {
    config: AuthConfig,
    clock: Arc<dyn Clock>,
}

impl TokenService {
    /// Token service on the wall clock
    pub fn new(config: AuthConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Token service on an injected clock
    pub fn with_clock(config: AuthConfig, clock: Arc<dyn Clock>) -> Self {
        Self { config, clock }
    }

    fn mac(&self) -> ShopResult<HmacSha256> {
        HmacSha256::new_from_slice(self.config.signing_secret())
            .map_err(|_| ShopError::Configuration("unusable signing secret".to_string()))
    }

    fn encode_segment<T: Serialize>(value: &T) -> ShopResult<String> {
        let json = serde_json::to_vec(value)
            .map_err(|e| ShopError::Internal(format!("token encode failed: {}", e)))?;
        Ok(URL_SAFE_NO_PAD.encode(json))
    }

    fn decode_segment<T: for<'de> Deserialize<'de>>(segment: &str) -> ShopResult<T> {
        let bytes = URL_SAFE_NO_PAD
            .decode(segment)
            .map_err(|_| ShopError::InvalidToken)?;
        serde_json::from_slice(&bytes).map_err(|_| ShopError::InvalidToken)
    }

    /// Issue a token for `user_id`, valid for the configured TTL
    pub fn issue(&self, user_id: &RecordId) -> ShopResult<IssuedToken> {
        let issued_at = self.clock.now();
        let expires_at = issued_at + self.config.token_ttl;

        let header = Header {
            alg: "HS256".to_string(),
            typ: "JWT".to_string(),
        };
        let claims = Claims {
            sub: user_id.to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };

        let signing_input = format!(
            "{}.{}",
            Self::encode_segment(&header)?,
            Self::encode_segment(&claims)?
        );

        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(IssuedToken {
            token: format!("{}.{}", signing_input, signature),
            expires_at: Utc
                .timestamp_opt(claims.exp, 0)
                .single()
                .unwrap_or(expires_at),
        })
    }

    /// Verify a token and return the user id it was issued to
    pub fn verify(&self, token: &str) -> ShopResult<RecordId> {
        let claims = self.decode(token)?;

        if self.clock.now().timestamp() > claims.exp {
            debug!(sub = %claims.sub, "rejected expired token");
            return Err(ShopError::ExpiredToken);
        }

        Ok(RecordId::new(claims.sub))
    }

    /// Check structure and signature, returning the claims without
    /// looking at expiry
    pub fn decode(&self, token: &str) -> ShopResult<Claims> {
        let mut parts = token.split('.');
        let (Some(header), Some(claims), Some(signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(ShopError::InvalidToken);
        };

        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| ShopError::InvalidToken)?;

        let mut mac = self.mac()?;
        mac.update(header.as_bytes());
        mac.update(b".");
        mac.update(claims.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| ShopError::InvalidToken)?;

        let header: Header = Self::decode_segment(header)?;
        if header.alg != "HS256" {
            return Err(ShopError::InvalidToken);
        }

        let claims: Claims = Self::decode_segment(claims)?;
        if claims.sub.trim().is_empty() {
            return Err(ShopError::InvalidToken);
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> (TokenService, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap(),
        ));
        let config = AuthConfig::new("test-signing-secret-0123").unwrap();
        (TokenService::with_clock(config, clock.clone()), clock)
    }

    #[test]
    fn test_issue_then_verify() {
        let (tokens, _) = service();
        let issued = tokens.issue(&RecordId::new("u1")).unwrap();

        assert_eq!(issued.token.split('.').count(), 3);
        assert_eq!(tokens.verify(&issued.token).unwrap(), RecordId::new("u1"));
    }

    #[test]
    fn test_expiry() {
        let (tokens, clock) = service();
        let issued = tokens.issue(&RecordId::new("u1")).unwrap();

        clock.advance(Duration::minutes(59));
        assert!(tokens.verify(&issued.token).is_ok());

        // exactly at expiry is still valid; one second later is not
        clock.advance(Duration::minutes(1));
        assert!(tokens.verify(&issued.token).is_ok());

        clock.advance(Duration::seconds(1));
        assert!(matches!(
            tokens.verify(&issued.token),
            Err(ShopError::ExpiredToken)
        ));
    }

    #[test]
    fn test_tampered_claims_rejected() {
        let (tokens, _) = service();
        let issued = tokens.issue(&RecordId::new("u1")).unwrap();
        let parts: Vec<&str> = issued.token.split('.').collect();

        let forged = URL_SAFE_NO_PAD.encode(br#"{"sub":"admin","iat":0,"exp":99999999999}"#);
        let token = format!("{}.{}.{}", parts[0], forged, parts[2]);

        assert!(matches!(tokens.verify(&token), Err(ShopError::InvalidToken)));
    }

    #[test]
    fn test_foreign_secret_rejected() {
        let (tokens, clock) = service();
        let other = TokenService::with_clock(
            AuthConfig::new("a-different-secret-9876").unwrap(),
            clock,
        );
        let issued = other.issue(&RecordId::new("u1")).unwrap();

        assert!(matches!(
            tokens.verify(&issued.token),
            Err(ShopError::InvalidToken)
        ));
    }

    #[test]
    fn test_malformed_tokens() {
        let (tokens, _) = service();
        for token in ["", "abc", "a.b", "a.b.c.d", "!!.??.##"] {
            assert!(matches!(tokens.verify(token), Err(ShopError::InvalidToken)));
        }
    }
}
