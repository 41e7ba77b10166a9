//! Authentication primitives: login credentials and stored password digests.
//!
//! Inbound payload parsing stays outside the domain; handlers call the
//! constructors here to validate raw strings before talking to a port.

use std::fmt;

use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use super::user::Username;

/// Domain error returned when login payload values are invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginValidationError {
    /// Username was missing, blank, or not a valid handle.
    InvalidUsername,
    /// Password was blank.
    EmptyPassword,
}

impl fmt::Display for LoginValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidUsername => write!(f, "username must be a valid login handle"),
            Self::EmptyPassword => write!(f, "password must not be empty"),
        }
    }
}

impl std::error::Error for LoginValidationError {}

/// Validated login credentials used by authentication services.
///
/// ## Invariants
/// - `username` is a normalised [`Username`].
/// - `password` is non-empty and keeps caller-provided whitespace.
///
/// # Examples
/// ```
/// use groups_backend::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts("Convenor", "secret").unwrap();
/// assert_eq!(creds.username().as_ref(), "convenor");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    username: Username,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw username/password inputs.
    pub fn try_from_parts(username: &str, password: &str) -> Result<Self, LoginValidationError> {
        let username =
            Username::new(username).map_err(|_| LoginValidationError::InvalidUsername)?;
        if password.is_empty() {
            return Err(LoginValidationError::EmptyPassword);
        }
        Ok(Self {
            username,
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Normalised username suitable for account lookups.
    pub fn username(&self) -> &Username {
        &self.username
    }

    /// Password string provided by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Salted SHA-256 password digest stored alongside a user account.
///
/// The salt is the normalised username, so two accounts sharing a password do
/// not share a digest.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordDigest(String);

impl PasswordDigest {
    /// Derive the digest for a username/password pair.
    pub fn derive(username: &Username, password: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(username.as_ref().as_bytes());
        hasher.update([0u8]);
        hasher.update(password.as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    /// Wrap a digest previously produced by [`PasswordDigest::derive`].
    pub fn from_hex(hex_digest: impl Into<String>) -> Self {
        Self(hex_digest.into())
    }

    /// Hex representation for persistence.
    pub fn as_hex(&self) -> &str {
        self.0.as_str()
    }

    /// Check the supplied credentials against this digest.
    pub fn verify(&self, credentials: &LoginCredentials) -> bool {
        let candidate = Self::derive(credentials.username(), credentials.password());
        constant_time_eq(self.0.as_bytes(), candidate.0.as_bytes())
    }
}

impl fmt::Debug for PasswordDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordDigest(..)")
    }
}

fn constant_time_eq(left: &[u8], right: &[u8]) -> bool {
    if left.len() != right.len() {
        return false;
    }
    left.iter()
        .zip(right)
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}
