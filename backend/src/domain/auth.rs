//! Authentication primitives: login credentials, access-token claims and
//! signed account-link claims.
//!
//! Keep inbound payload parsing outside the domain by exposing constructors
//! that validate string inputs before a handler talks to a port or service.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use zeroize::Zeroizing;

use super::account::{AccountId, AccountRole, EmailAddress};

/// Domain error returned when login payload values are invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginValidationError {
    /// Email was missing or malformed.
    InvalidEmail,
    /// Password was blank.
    EmptyPassword,
}

impl fmt::Display for LoginValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEmail => write!(f, "email must be a valid address"),
            Self::EmptyPassword => write!(f, "password must not be empty"),
        }
    }
}

impl std::error::Error for LoginValidationError {}

/// Validated login credentials used by authentication services.
///
/// ## Invariants
/// - `email` is normalised the same way as at signup.
/// - `password` is required to be non-empty but retains caller-provided
///   whitespace.
///
/// # Examples
/// ```
/// use shiptrack::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts("Ada@Example.com", "password").unwrap();
/// assert_eq!(creds.email().as_str(), "ada@example.com");
/// assert_eq!(creds.password(), "password");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: EmailAddress,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw email/password inputs.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, LoginValidationError> {
        let email = EmailAddress::parse(email).map_err(|_| LoginValidationError::InvalidEmail)?;
        if password.is_empty() {
            return Err(LoginValidationError::EmptyPassword);
        }

        Ok(Self {
            email,
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Address used for the account lookup.
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Password string provided by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Unique identifier embedded in every access token; the revocation key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenId(Uuid);

impl TokenId {
    /// New random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Underlying UUID.
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Claims carried by a bearer access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessClaims {
    /// Account the token was issued to.
    pub subject: AccountId,
    /// Role the account logged in as.
    pub role: AccountRole,
    /// Display name at issue time.
    pub name: String,
    /// Unique id used for revocation.
    pub token_id: TokenId,
    /// Issue time.
    pub issued_at: DateTime<Utc>,
    /// Expiry; the token is rejected from this instant.
    pub expires_at: DateTime<Utc>,
}

impl AccessClaims {
    /// Fresh claims for `subject`, valid for `ttl` from `now`.
    pub fn new(
        subject: AccountId,
        role: AccountRole,
        name: impl Into<String>,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            subject,
            role,
            name: name.into(),
            token_id: TokenId::random(),
            issued_at: now,
            expires_at: now + ttl,
        }
    }

    /// Lifetime left at `now`, clamped to at least one second so a revocation
    /// entry never gets a zero TTL.
    ///
    /// # Examples
    /// ```
    /// use chrono::{Duration, Utc};
    /// use shiptrack::domain::{AccessClaims, AccountId, AccountRole};
    ///
    /// let now = Utc::now();
    /// let claims = AccessClaims::new(AccountId::random(), AccountRole::Seller, "Ada", now, Duration::minutes(5));
    /// assert_eq!(claims.remaining_lifetime(now).as_secs(), 300);
    /// assert_eq!(claims.remaining_lifetime(now + Duration::hours(1)).as_secs(), 1);
    /// ```
    pub fn remaining_lifetime(&self, now: DateTime<Utc>) -> std::time::Duration {
        let seconds = (self.expires_at - now).num_seconds().max(1);
        std::time::Duration::from_secs(seconds.unsigned_abs())
    }

    /// Authenticated identity these claims describe.
    pub fn principal(&self) -> Principal {
        Principal {
            id: self.subject,
            role: self.role,
        }
    }
}

/// Authenticated caller as seen by services.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    /// Caller account.
    pub id: AccountId,
    /// Role the caller authenticated as.
    pub role: AccountRole,
}

impl Principal {
    /// Seller principal.
    pub const fn seller(id: AccountId) -> Self {
        Self {
            id,
            role: AccountRole::Seller,
        }
    }

    /// Partner principal.
    pub const fn partner(id: AccountId) -> Self {
        Self {
            id,
            role: AccountRole::Partner,
        }
    }
}

/// Encoded access token together with the claims it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    /// Encoded bearer token.
    pub token: String,
    /// Claims inside `token`.
    pub claims: AccessClaims,
}

/// What a signed account link authorises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkPurpose {
    /// Confirms the signup address.
    EmailVerification,
    /// Sets a new password.
    PasswordReset,
}

impl LinkPurpose {
    /// Domain-separation label mixed into the link signature.
    pub const fn label(self) -> &'static str {
        match self {
            Self::EmailVerification => "email-verify",
            Self::PasswordReset => "password-reset",
        }
    }

    /// How long after issue a link stays valid.
    pub fn max_age(self) -> Duration {
        match self {
            Self::EmailVerification => Duration::days(3),
            Self::PasswordReset => Duration::days(1),
        }
    }

    /// Path segment of the link target under the role's route prefix.
    pub const fn path(self) -> &'static str {
        match self {
            Self::EmailVerification => "verify",
            Self::PasswordReset => "reset-password",
        }
    }
}

/// Claims embedded in a signed account link.
///
/// The address is bound into the link so a link minted before an address
/// change stops working.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkClaims {
    /// Account the link acts on.
    pub account_id: AccountId,
    /// Role directory holding the account.
    pub role: AccountRole,
    /// Address the link was mailed to.
    pub email: EmailAddress,
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", "pw", LoginValidationError::InvalidEmail)]
    #[case("   ", "pw", LoginValidationError::InvalidEmail)]
    #[case("not-an-email", "pw", LoginValidationError::InvalidEmail)]
    #[case("ada@example.com", "", LoginValidationError::EmptyPassword)]
    fn invalid_credentials(
        #[case] email: &str,
        #[case] password: &str,
        #[case] expected: LoginValidationError,
    ) {
        let err = LoginCredentials::try_from_parts(email, password)
            .expect_err("invalid inputs must fail");
        assert_eq!(err, expected);
    }

    #[rstest]
    #[case("  ada@example.com  ", "secret")]
    #[case("ADA@example.com", " correct horse battery staple ")]
    fn valid_credentials_normalise_email(#[case] email: &str, #[case] password: &str) {
        let creds =
            LoginCredentials::try_from_parts(email, password).expect("valid inputs should succeed");
        assert_eq!(creds.email().as_str(), "ada@example.com");
        assert_eq!(creds.password(), password);
    }

    #[rstest]
    fn claims_expire_after_ttl() {
        let now = Utc::now();
        let claims = AccessClaims::new(
            AccountId::random(),
            AccountRole::Partner,
            "Dan",
            now,
            Duration::minutes(30),
        );
        assert_eq!(claims.expires_at - claims.issued_at, Duration::minutes(30));
        assert_eq!(claims.principal().role, AccountRole::Partner);
    }

    #[rstest]
    #[case(LinkPurpose::EmailVerification, "email-verify", 3)]
    #[case(LinkPurpose::PasswordReset, "password-reset", 1)]
    fn link_purposes_have_distinct_labels_and_lifetimes(
        #[case] purpose: LinkPurpose,
        #[case] label: &str,
        #[case] days: i64,
    ) {
        assert_eq!(purpose.label(), label);
        assert_eq!(purpose.max_age(), Duration::days(days));
    }
}
