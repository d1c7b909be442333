//! Bearer-token gate for inbound requests.

use super::TokenService;
use crate::error::{ShopError, ShopResult};
use crate::id::RecordId;

/// Resolves an `Authorization` header to a user id.
///
/// Pure with respect to the record store: only the token is consulted.
#[derive(Debug, Clone)]
pub struct AuthGate {
    tokens: TokenService,
}

impl AuthGate {
    pub fn new(tokens: TokenService) -> Self {
        Self { tokens }
    }

    /// Extract the token from a `Bearer <token>` header value
    pub fn bearer_token(header: Option<&str>) -> ShopResult<&str> {
        let value = header.ok_or(ShopError::MissingCredential)?.trim();
        let (scheme, token) = value
            .split_once(char::is_whitespace)
            .ok_or(ShopError::MissingCredential)?;

        if !scheme.eq_ignore_ascii_case("bearer") {
            return Err(ShopError::MissingCredential);
        }

        let token = token.trim();
        if token.is_empty() {
            return Err(ShopError::MissingCredential);
        }
        Ok(token)
    }

    /// Authenticate a request from its raw `Authorization` header
    pub fn authenticate(&self, header: Option<&str>) -> ShopResult<RecordId> {
        let token = Self::bearer_token(header)?;
        self.tokens.verify(token)
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }
}
