//! Credential and token adapters.
//!
//! Everything here hangs off one root [`SigningKey`]: access tokens and
//! account links each sign with their own derived subkey, so rotating the
//! root key invalidates both at once.

mod fingerprint;
mod jwt;
mod password;
mod signed_links;
mod signing_key;

pub use fingerprint::key_fingerprint;
pub use jwt::JwtAccessTokens;
pub use password::Argon2PasswordHasher;
pub use signed_links::HmacSignedLinks;
pub use signing_key::{
    BuildMode, SIGNING_KEY_MIN_LEN, SigningKey, SigningKeyError, signing_key_from_env,
};
