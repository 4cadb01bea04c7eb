//! Strength checking and hashing for the registration password.

use std::fmt::Display;

use bcrypt::{BcryptError, hash, verify};
use zxcvbn::{Score, zxcvbn};

use crate::Error;

/// A password that passed the zxcvbn strength check.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedPassword(String);

impl ValidatedPassword {
    /// Check `raw_password` with zxcvbn.
    ///
    /// # Errors
    ///
    /// Returns an [Error::TooWeak] carrying zxcvbn's feedback when the
    /// password scores below three out of four.
    pub fn new(raw_password: &str) -> Result<Self, Error> {
        let analysis = zxcvbn(raw_password, &[]);

        match analysis.score() {
            Score::Three | Score::Four => Ok(Self(raw_password.to_owned())),
            _ => {
                let feedback = analysis
                    .feedback()
                    .map(ToString::to_string)
                    .unwrap_or_default();

                Err(Error::TooWeak(feedback))
            }
        }
    }

    /// Skip the strength check.
    ///
    /// Meant for tests and CLI tooling that already hold a known password.
    /// Not `unsafe`: a weak password weakens the account, not memory safety.
    pub fn new_unchecked(raw_password: &str) -> Self {
        Self(raw_password.to_owned())
    }
}

/// A bcrypt hash of the registration password, as stored in the user table.
#[derive(Debug, Clone, PartialEq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// The recommended bcrypt cost. Tests use a lower cost to stay fast.
    pub const DEFAULT_COST: u32 = bcrypt::DEFAULT_COST;

    /// Hash a validated password with `cost` rounds of bcrypt.
    ///
    /// # Errors
    ///
    /// Returns an [Error::HashingError] if bcrypt rejected the input.
    pub fn new(password: ValidatedPassword, cost: u32) -> Result<Self, Error> {
        hash(&password.0, cost)
            .map(Self)
            .map_err(|error| Error::HashingError(error.to_string()))
    }

    /// Wrap a hash string read back from the database.
    pub fn new_unchecked(hash_string: &str) -> Self {
        Self(hash_string.to_owned())
    }

    /// Validate and hash in one step.
    ///
    /// # Errors
    ///
    /// Returns an [Error::TooWeak] or [Error::HashingError] from the two
    /// underlying steps.
    pub fn from_raw_password(raw_password: &str, cost: u32) -> Result<Self, Error> {
        PasswordHash::new(ValidatedPassword::new(raw_password)?, cost)
    }

    /// Whether `raw_password` matches this hash.
    ///
    /// # Errors
    ///
    /// Returns a [BcryptError] if the stored hash could not be parsed.
    pub fn verify(&self, raw_password: &str) -> Result<bool, BcryptError> {
        verify(raw_password, &self.0)
    }
}

impl AsRef<str> for PasswordHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for PasswordHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
