//! One-time delivery verification codes.

use std::fmt;

use rand::Rng;
use subtle::ConstantTimeEq as _;

/// Number of digits in a verification code.
pub const CODE_DIGITS: usize = 6;

/// Six-digit secret the recipient hands to the partner on delivery.
#[derive(Clone, PartialEq, Eq)]
pub struct VerificationCode(String);

impl VerificationCode {
    /// Draw a fresh random code.
    pub fn generate() -> Self {
        let value: u32 = rand::thread_rng().gen_range(0..1_000_000);
        Self(format!("{value:0width$}", width = CODE_DIGITS))
    }

    /// Accept a stored code; `None` unless it is exactly six ASCII digits.
    ///
    /// # Examples
    /// ```
    /// use shiptrack::domain::VerificationCode;
    ///
    /// assert!(VerificationCode::parse("004211").is_some());
    /// assert!(VerificationCode::parse("4211").is_none());
    /// ```
    pub fn parse(raw: &str) -> Option<Self> {
        (raw.len() == CODE_DIGITS && raw.bytes().all(|b| b.is_ascii_digit()))
            .then(|| Self(raw.to_owned()))
    }

    /// The six digits as text.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Compare against a caller-supplied code in constant time.
    pub fn matches(&self, candidate: &str) -> bool {
        self.0.as_bytes().ct_eq(candidate.trim().as_bytes()).into()
    }
}

impl fmt::Debug for VerificationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("VerificationCode(<redacted>)")
    }
}
