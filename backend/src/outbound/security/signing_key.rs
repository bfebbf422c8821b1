//! Signing secret for access tokens and account links.
//!
//! The secret is read from the file named by `SHIPTRACK_SIGNING_KEY_FILE` and
//! validated consistently so the rules can be tested in isolation. Token and
//! link signers never see the root secret: each derives its own subkey.

use std::fmt;
use std::path::PathBuf;

use mockable::Env;
use rand::RngCore;
use sha2::{Digest, Sha256};
use tracing::warn;
use zeroize::{Zeroize, Zeroizing};

const SIGNING_KEY_DEFAULT_PATH: &str = "/var/run/secrets/shiptrack_signing_key";
/// Minimum key length accepted in release builds.
pub const SIGNING_KEY_MIN_LEN: usize = 32;
const EPHEMERAL_KEY_LEN: usize = 64;
pub(crate) const KEY_FILE_ENV: &str = "SHIPTRACK_SIGNING_KEY_FILE";
pub(crate) const ALLOW_EPHEMERAL_ENV: &str = "SHIPTRACK_ALLOW_EPHEMERAL_KEY";
const BOOL_EXPECTED: &str = "1|0|true|false|yes|no|y|n";

/// Build mode for signing key validation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BuildMode {
    /// Debug builds fall back to an ephemeral key with a warning.
    Debug,
    /// Release builds require a key file of at least [`SIGNING_KEY_MIN_LEN`] bytes.
    Release,
}

impl BuildMode {
    /// Determine the build mode from `cfg!(debug_assertions)`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use shiptrack::outbound::security::BuildMode;
    ///
    /// let mode = BuildMode::from_debug_assertions();
    /// if cfg!(debug_assertions) {
    ///     assert_eq!(mode, BuildMode::Debug);
    /// } else {
    ///     assert_eq!(mode, BuildMode::Release);
    /// }
    /// ```
    #[must_use]
    pub fn from_debug_assertions() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Release
        }
    }

    fn is_debug(self) -> bool {
        matches!(self, Self::Debug)
    }
}

/// Root signing secret; zeroized on drop.
#[derive(Clone)]
pub struct SigningKey {
    bytes: Zeroizing<Vec<u8>>,
}

impl SigningKey {
    /// Wrap caller-provided key material.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            bytes: Zeroizing::new(bytes.to_vec()),
        }
    }

    /// Random key for development runs; tokens die with the process.
    pub fn generate() -> Self {
        let mut bytes = Zeroizing::new(vec![0_u8; EPHEMERAL_KEY_LEN]);
        rand::thread_rng().fill_bytes(&mut bytes);
        Self { bytes }
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Derive an independent subkey for one signing use.
    pub(crate) fn derive(&self, label: &str) -> Zeroizing<Vec<u8>> {
        let digest = Sha256::new()
            .chain_update(label.as_bytes())
            .chain_update([0_u8])
            .chain_update(self.bytes.as_slice())
            .finalize();
        Zeroizing::new(digest.to_vec())
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey").finish_non_exhaustive()
    }
}

/// Errors raised while loading the signing key.
#[derive(thiserror::Error, Debug)]
pub enum SigningKeyError {
    /// A variable is present but contains an invalid value.
    #[error("invalid value for {name}='{value}'; expected {expected}")]
    InvalidEnv {
        /// Variable name.
        name: &'static str,
        /// Rejected value.
        value: String,
        /// Accepted values.
        expected: &'static str,
    },
    /// Reading the key file failed.
    #[error("failed to read signing key at {path}: {source}")]
    KeyRead {
        /// Key file location.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The key file exists but is too short for release builds.
    #[error("signing key at {path} too short: need >= {min_len} bytes, got {length}")]
    KeyTooShort {
        /// Key file location.
        path: PathBuf,
        /// Bytes read.
        length: usize,
        /// Bytes required.
        min_len: usize,
    },
    /// Release builds must not allow ephemeral keys.
    #[error("SHIPTRACK_ALLOW_EPHEMERAL_KEY must be 0 in release builds")]
    EphemeralNotAllowed,
}

/// Load the signing key from the environment and build mode.
///
/// # Examples
///
/// ```rust
/// use mockable::MockEnv;
/// use shiptrack::outbound::security::{BuildMode, signing_key_from_env};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let key_path = std::env::temp_dir().join("shiptrack_signing_key_example");
/// std::fs::write(&key_path, vec![b'k'; 32])?;
///
/// let key_path = key_path.to_str().expect("valid path").to_owned();
/// let mut env = MockEnv::new();
/// env.expect_string().returning(move |name| match name {
///     "SHIPTRACK_SIGNING_KEY_FILE" => Some(key_path.clone()),
///     _ => None,
/// });
///
/// let key = signing_key_from_env(&env, BuildMode::Release)?;
/// assert_eq!(shiptrack::outbound::security::key_fingerprint(&key).len(), 16);
/// # Ok(())
/// # }
/// ```
pub fn signing_key_from_env<E: Env>(
    env: &E,
    mode: BuildMode,
) -> Result<SigningKey, SigningKeyError> {
    let allow_ephemeral = allow_ephemeral_from_env(env, mode)?;
    let path = PathBuf::from(
        env.string(KEY_FILE_ENV)
            .unwrap_or_else(|| SIGNING_KEY_DEFAULT_PATH.to_owned()),
    );

    match std::fs::read(&path) {
        Ok(mut bytes) => {
            let length = bytes.len();
            if mode == BuildMode::Release && length < SIGNING_KEY_MIN_LEN {
                bytes.zeroize();
                return Err(SigningKeyError::KeyTooShort {
                    path,
                    length,
                    min_len: SIGNING_KEY_MIN_LEN,
                });
            }
            let key = SigningKey::from_bytes(&bytes);
            bytes.zeroize();
            Ok(key)
        }
        Err(error) => {
            if mode.is_debug() || allow_ephemeral {
                warn!(
                    path = %path.display(),
                    error = %error,
                    "using temporary signing key (dev only)"
                );
                Ok(SigningKey::generate())
            } else {
                Err(SigningKeyError::KeyRead {
                    path,
                    source: error,
                })
            }
        }
    }
}

fn allow_ephemeral_from_env<E: Env>(env: &E, mode: BuildMode) -> Result<bool, SigningKeyError> {
    let Some(value) = env.string(ALLOW_EPHEMERAL_ENV) else {
        return Ok(false);
    };
    match parse_bool(&value) {
        Some(true) if mode.is_debug() => Ok(true),
        Some(true) => Err(SigningKeyError::EphemeralNotAllowed),
        Some(false) => Ok(false),
        None if mode.is_debug() => {
            warn!(value = %value, "invalid SHIPTRACK_ALLOW_EPHEMERAL_KEY; defaulting to disabled");
            Ok(false)
        }
        None => Err(SigningKeyError::InvalidEnv {
            name: ALLOW_EPHEMERAL_ENV,
            value,
            expected: BOOL_EXPECTED,
        }),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" => Some(true),
        "0" | "false" | "no" | "n" => Some(false),
        _ => None,
    }
}
