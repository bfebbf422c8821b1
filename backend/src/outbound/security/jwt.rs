//! HS256 JWT access tokens.
//!
//! Expiry is checked against the caller's clock rather than by
//! `jsonwebtoken`, so an expired token is reported as such and never lumped
//! in with malformed ones.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{AccessTokenError, AccessTokens};
use crate::domain::{AccessClaims, AccountId, AccountRole, TokenId};

use super::signing_key::SigningKey;

const SUBKEY_LABEL: &str = "shiptrack access token";

/// Wire form of [`AccessClaims`].
#[derive(Debug, Serialize, Deserialize)]
struct JwtClaims {
    sub: Uuid,
    role: String,
    name: String,
    jti: Uuid,
    iat: i64,
    exp: i64,
}

impl From<&AccessClaims> for JwtClaims {
    fn from(claims: &AccessClaims) -> Self {
        Self {
            sub: *claims.subject.as_uuid(),
            role: claims.role.as_str().to_owned(),
            name: claims.name.clone(),
            jti: *claims.token_id.as_uuid(),
            iat: claims.issued_at.timestamp(),
            exp: claims.expires_at.timestamp(),
        }
    }
}

impl JwtClaims {
    fn into_domain(self) -> Result<AccessClaims, AccessTokenError> {
        let role: AccountRole = self
            .role
            .parse()
            .map_err(|_| AccessTokenError::invalid("unknown role"))?;
        let issued_at = DateTime::from_timestamp(self.iat, 0)
            .ok_or_else(|| AccessTokenError::invalid("iat out of range"))?;
        let expires_at = DateTime::from_timestamp(self.exp, 0)
            .ok_or_else(|| AccessTokenError::invalid("exp out of range"))?;
        Ok(AccessClaims {
            subject: AccountId::from_uuid(self.sub),
            role,
            name: self.name,
            token_id: TokenId::from_uuid(self.jti),
            issued_at,
            expires_at,
        })
    }
}

/// [`AccessTokens`] adapter backed by `jsonwebtoken`.
#[derive(Clone)]
pub struct JwtAccessTokens {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl JwtAccessTokens {
    /// Build a signer from a subkey of `key`.
    pub fn new(key: &SigningKey) -> Self {
        let secret = key.derive(SUBKEY_LABEL);
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.required_spec_claims =
            HashSet::from(["exp".to_owned(), "sub".to_owned(), "iat".to_owned()]);
        Self {
            encoding: EncodingKey::from_secret(&secret),
            decoding: DecodingKey::from_secret(&secret),
            validation,
        }
    }
}

impl AccessTokens for JwtAccessTokens {
    fn issue(&self, claims: &AccessClaims) -> Result<String, AccessTokenError> {
        encode(
            &Header::new(Algorithm::HS256),
            &JwtClaims::from(claims),
            &self.encoding,
        )
        .map_err(|error| AccessTokenError::issue(error.to_string()))
    }

    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<AccessClaims, AccessTokenError> {
        let data = decode::<JwtClaims>(token, &self.decoding, &self.validation).map_err(|error| {
            debug!(kind = ?error.kind(), "access token failed to decode");
            match error.kind() {
                ErrorKind::ExpiredSignature => AccessTokenError::Expired,
                _ => AccessTokenError::invalid(error.to_string()),
            }
        })?;
        if data.claims.exp <= now.timestamp() {
            return Err(AccessTokenError::Expired);
        }
        data.claims.into_domain()
    }
}
