//! Seller and delivery-partner accounts.
//!
//! Both roles share one [`Account`] shape; role-specific data lives in the
//! tagged [`AccountProfile`]. Services refer to accounts by [`AccountId`] and
//! resolve them through the account repository on demand.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use zeroize::Zeroizing;

/// Longest accepted account display name, in characters.
pub const NAME_MAX: usize = 64;
/// Shortest accepted password, in characters.
pub const PASSWORD_MIN: usize = 8;
/// Largest accepted zip code value.
pub const ZIP_CODE_MAX: u32 = 999_999;

/// Validation errors raised by account constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountValidationError {
    /// Display name is blank.
    EmptyName,
    /// Display name exceeds the length limit.
    NameTooLong {
        /// Upper limit.
        max: usize,
    },
    /// Address is not a plausible email.
    InvalidEmail,
    /// Password is below the minimum length.
    PasswordTooShort {
        /// Lower limit.
        min: usize,
    },
    /// Zip code is outside `1..=999_999`.
    InvalidZipCode {
        /// Rejected value.
        value: i64,
    },
    /// Seller pickup address is blank.
    EmptyAddress,
    /// Partner lists no serviceable zip codes.
    NoServiceableZipCodes,
    /// Partner capacity must be at least one.
    ZeroCapacity,
    /// Profile update carries no fields.
    EmptyProfileUpdate,
}

impl fmt::Display for AccountValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "name must not be empty"),
            Self::NameTooLong { max } => write!(f, "name must be at most {max} characters"),
            Self::InvalidEmail => write!(f, "email must be a valid address"),
            Self::PasswordTooShort { min } => {
                write!(f, "password must be at least {min} characters")
            }
            Self::InvalidZipCode { value } => {
                write!(f, "zip code must be between 1 and {ZIP_CODE_MAX} (got {value})")
            }
            Self::EmptyAddress => write!(f, "address must not be empty"),
            Self::NoServiceableZipCodes => {
                write!(f, "at least one serviceable zip code is required")
            }
            Self::ZeroCapacity => write!(f, "max handling capacity must be at least 1"),
            Self::EmptyProfileUpdate => write!(f, "no data provided to update"),
        }
    }
}

impl std::error::Error for AccountValidationError {}

/// Stable account identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(Uuid);

impl AccountId {
    /// Generate a new random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap a stored UUID.
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Borrow the underlying UUID.
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The two kinds of account the service knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountRole {
    /// Ships parcels.
    Seller,
    /// Delivers parcels.
    Partner,
}

impl AccountRole {
    /// Wire and storage representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Seller => "seller",
            Self::Partner => "partner",
        }
    }

    /// Path segment used by the HTTP surface for this role.
    pub const fn route_prefix(self) -> &'static str {
        match self {
            Self::Seller => "sellers",
            Self::Partner => "partners",
        }
    }
}

impl fmt::Display for AccountRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an account role from text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseAccountRoleError;

impl fmt::Display for ParseAccountRoleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("invalid account role")
    }
}

impl std::error::Error for ParseAccountRoleError {}

impl FromStr for AccountRole {
    type Err = ParseAccountRoleError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "seller" => Ok(Self::Seller),
            "partner" => Ok(Self::Partner),
            _ => Err(ParseAccountRoleError),
        }
    }
}

/// Normalised email address.
///
/// # Examples
/// ```
/// use shiptrack::domain::EmailAddress;
///
/// let email = EmailAddress::parse("  Ada@Example.COM ").unwrap();
/// assert_eq!(email.as_str(), "ada@example.com");
/// assert!(EmailAddress::parse("no-at-sign").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Trim, lower-case and validate an address.
    pub fn parse(raw: &str) -> Result<Self, AccountValidationError> {
        let normalised = raw.trim().to_lowercase();
        let Some((local, domain)) = normalised.split_once('@') else {
            return Err(AccountValidationError::InvalidEmail);
        };
        let domain_ok = domain
            .split('.')
            .all(|label| !label.is_empty())
            && domain.contains('.');
        if local.is_empty()
            || domain.contains('@')
            || !domain_ok
            || normalised.chars().any(char::is_whitespace)
        {
            return Err(AccountValidationError::InvalidEmail);
        }
        Ok(Self(normalised))
    }

    /// Borrow the address.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = AccountValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Numeric postal code used for destinations and partner coverage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u32")]
pub struct ZipCode(u32);

impl ZipCode {
    /// Validate a raw zip code value.
    ///
    /// # Examples
    /// ```
    /// use shiptrack::domain::ZipCode;
    ///
    /// assert_eq!(ZipCode::new(11050).unwrap().value(), 11050);
    /// assert!(ZipCode::new(0).is_err());
    /// ```
    pub fn new(value: i64) -> Result<Self, AccountValidationError> {
        u32::try_from(value)
            .ok()
            .filter(|zip| (1..=ZIP_CODE_MAX).contains(zip))
            .map(Self)
            .ok_or(AccountValidationError::InvalidZipCode { value })
    }

    /// Raw numeric value.
    pub const fn value(self) -> u32 {
        self.0
    }
}

impl TryFrom<i64> for ZipCode {
    type Error = AccountValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ZipCode> for u32 {
    fn from(value: ZipCode) -> Self {
        value.0
    }
}

impl fmt::Display for ZipCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Encoded credential hash as produced by the password hasher.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Wrap an encoded hash string.
    pub fn new(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    /// Borrow the encoded hash.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(<redacted>)")
    }
}

/// Plain-text password held only long enough to hash it.
#[derive(Clone, PartialEq, Eq)]
pub struct NewPassword(Zeroizing<String>);

impl NewPassword {
    /// Validate the minimum length.
    pub fn new(raw: &str) -> Result<Self, AccountValidationError> {
        if raw.chars().count() < PASSWORD_MIN {
            return Err(AccountValidationError::PasswordTooShort { min: PASSWORD_MIN });
        }
        Ok(Self(Zeroizing::new(raw.to_owned())))
    }

    /// Borrow the plain text for hashing.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for NewPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("NewPassword(<redacted>)")
    }
}

/// Role-specific account data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountProfile {
    /// Pickup address for a seller.
    Seller {
        /// Street address parcels are collected from.
        address: String,
        /// Zip code of the pickup address.
        zip_code: ZipCode,
    },
    /// Coverage and capacity for a delivery partner.
    Partner {
        /// Zip codes the partner delivers to, sorted and deduplicated.
        serviceable_zip_codes: Vec<ZipCode>,
        /// Most shipments the partner holds at once.
        max_handling_capacity: u32,
    },
}

impl AccountProfile {
    /// Build a validated seller profile.
    pub fn seller(address: &str, zip_code: ZipCode) -> Result<Self, AccountValidationError> {
        let address = address.trim();
        if address.is_empty() {
            return Err(AccountValidationError::EmptyAddress);
        }
        Ok(Self::Seller {
            address: address.to_owned(),
            zip_code,
        })
    }

    /// Build a validated partner profile; zip codes are sorted and deduplicated.
    pub fn partner(
        serviceable_zip_codes: Vec<ZipCode>,
        max_handling_capacity: u32,
    ) -> Result<Self, AccountValidationError> {
        Ok(Self::Partner {
            serviceable_zip_codes: normalise_zip_codes(serviceable_zip_codes)?,
            max_handling_capacity: validate_capacity(max_handling_capacity)?,
        })
    }

    /// Role implied by the profile variant.
    pub const fn role(&self) -> AccountRole {
        match self {
            Self::Seller { .. } => AccountRole::Seller,
            Self::Partner { .. } => AccountRole::Partner,
        }
    }
}

fn normalise_zip_codes(zip_codes: Vec<ZipCode>) -> Result<Vec<ZipCode>, AccountValidationError> {
    let unique: BTreeSet<ZipCode> = zip_codes.into_iter().collect();
    if unique.is_empty() {
        return Err(AccountValidationError::NoServiceableZipCodes);
    }
    Ok(unique.into_iter().collect())
}

fn validate_capacity(capacity: u32) -> Result<u32, AccountValidationError> {
    if capacity == 0 {
        return Err(AccountValidationError::ZeroCapacity);
    }
    Ok(capacity)
}

fn validate_name(raw: &str) -> Result<String, AccountValidationError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(AccountValidationError::EmptyName);
    }
    if name.chars().count() > NAME_MAX {
        return Err(AccountValidationError::NameTooLong { max: NAME_MAX });
    }
    Ok(name.to_owned())
}

/// Validated signup request.
#[derive(Debug, Clone)]
pub struct SignupDraft {
    name: String,
    email: EmailAddress,
    password: NewPassword,
    profile: AccountProfile,
}

impl SignupDraft {
    /// Validate raw signup inputs.
    pub fn new(
        name: &str,
        email: &str,
        password: &str,
        profile: AccountProfile,
    ) -> Result<Self, AccountValidationError> {
        Ok(Self {
            name: validate_name(name)?,
            email: EmailAddress::parse(email)?,
            password: NewPassword::new(password)?,
            profile,
        })
    }

    /// Role requested by this signup.
    pub const fn role(&self) -> AccountRole {
        self.profile.role()
    }

    /// Plain-text password to hash.
    pub fn password(&self) -> &NewPassword {
        &self.password
    }

    /// Turn the draft into an unverified account.
    pub fn into_account(
        self,
        id: AccountId,
        password_hash: PasswordHash,
        created_at: DateTime<Utc>,
    ) -> Account {
        Account {
            id,
            name: self.name,
            email: self.email,
            password_hash,
            email_verified: false,
            profile: self.profile,
            created_at,
        }
    }
}

/// Persisted account record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    id: AccountId,
    name: String,
    email: EmailAddress,
    password_hash: PasswordHash,
    email_verified: bool,
    profile: AccountProfile,
    created_at: DateTime<Utc>,
}

/// Field bundle used by adapters to rebuild a stored account.
#[derive(Debug, Clone)]
pub struct AccountRecord {
    /// Stored identifier.
    pub id: AccountId,
    /// Display name.
    pub name: String,
    /// Normalised login address.
    pub email: EmailAddress,
    /// Encoded credential hash.
    pub password_hash: PasswordHash,
    /// Whether the verification link was followed.
    pub email_verified: bool,
    /// Role-specific data.
    pub profile: AccountProfile,
    /// Signup time.
    pub created_at: DateTime<Utc>,
}

impl From<AccountRecord> for Account {
    fn from(record: AccountRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            email: record.email,
            password_hash: record.password_hash,
            email_verified: record.email_verified,
            profile: record.profile,
            created_at: record.created_at,
        }
    }
}

impl Account {
    /// Account identifier.
    pub fn id(&self) -> AccountId {
        self.id
    }

    /// Display name.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Login address.
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Stored credential hash.
    pub fn password_hash(&self) -> &PasswordHash {
        &self.password_hash
    }

    /// Whether login is allowed yet.
    pub fn email_verified(&self) -> bool {
        self.email_verified
    }

    /// Seller or partner details.
    pub fn profile(&self) -> &AccountProfile {
        &self.profile
    }

    /// Role implied by the profile.
    pub fn role(&self) -> AccountRole {
        self.profile.role()
    }

    /// Signup time.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Seller pickup zip code, if this is a seller account.
    pub fn seller_zip_code(&self) -> Option<ZipCode> {
        match &self.profile {
            AccountProfile::Seller { zip_code, .. } => Some(*zip_code),
            AccountProfile::Partner { .. } => None,
        }
    }

    /// Apply a partner profile update, returning `false` for seller accounts.
    pub fn apply_partner_update(&mut self, update: &PartnerProfileUpdate) -> bool {
        let AccountProfile::Partner {
            serviceable_zip_codes,
            max_handling_capacity,
        } = &mut self.profile
        else {
            return false;
        };
        if let Some(zip_codes) = &update.serviceable_zip_codes {
            serviceable_zip_codes.clone_from(zip_codes);
        }
        if let Some(capacity) = update.max_handling_capacity {
            *max_handling_capacity = capacity;
        }
        true
    }
}

/// Partial update of a delivery partner's coverage and capacity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartnerProfileUpdate {
    serviceable_zip_codes: Option<Vec<ZipCode>>,
    max_handling_capacity: Option<u32>,
}

impl PartnerProfileUpdate {
    /// Validate an update; at least one field must be present.
    ///
    /// # Examples
    /// ```
    /// use shiptrack::domain::{PartnerProfileUpdate, ZipCode};
    ///
    /// assert!(PartnerProfileUpdate::new(None, None).is_err());
    /// let update = PartnerProfileUpdate::new(None, Some(5)).unwrap();
    /// assert_eq!(update.max_handling_capacity(), Some(5));
    /// ```
    pub fn new(
        serviceable_zip_codes: Option<Vec<ZipCode>>,
        max_handling_capacity: Option<u32>,
    ) -> Result<Self, AccountValidationError> {
        if serviceable_zip_codes.is_none() && max_handling_capacity.is_none() {
            return Err(AccountValidationError::EmptyProfileUpdate);
        }
        Ok(Self {
            serviceable_zip_codes: serviceable_zip_codes.map(normalise_zip_codes).transpose()?,
            max_handling_capacity: max_handling_capacity.map(validate_capacity).transpose()?,
        })
    }

    /// Replacement coverage, if supplied.
    pub fn serviceable_zip_codes(&self) -> Option<&[ZipCode]> {
        self.serviceable_zip_codes.as_deref()
    }

    /// Replacement capacity, if supplied.
    pub fn max_handling_capacity(&self) -> Option<u32> {
        self.max_handling_capacity
    }
}
