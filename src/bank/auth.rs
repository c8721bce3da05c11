//! Password policy, password hashing and the caller-owned session.
use sha2::{Digest, Sha256};

use crate::bank::{CustomerId, LedgerError};

/// Minimum number of characters in a password.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Checks the password policy: at least [`MIN_PASSWORD_LENGTH`] characters, at least one
/// ASCII letter and at least one digit.
pub fn validate_password(password: &str) -> Result<(), LedgerError> {
    let long_enough = password.chars().count() >= MIN_PASSWORD_LENGTH;
    let has_letter = password.chars().any(|c| c.is_ascii_alphabetic());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if long_enough && has_letter && has_digit {
        Ok(())
    } else {
        Err(LedgerError::WeakCredential)
    }
}

/// Unsalted SHA-256 of the password, hex encoded.
pub fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

pub fn verify_password(password: &str, password_hash: &str) -> bool {
    hash_password(password) == password_hash
}

/// The authenticated customer on whose behalf ledger calls are made.
///
/// Sessions are owned by the caller and passed into every engine call, so one
/// `Ledger` can serve several independent sessions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    customer: Option<CustomerId>,
}

impl Session {
    /// A session with nobody logged in.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub(crate) fn login(&mut self, customer_id: CustomerId) {
        self.customer = Some(customer_id);
    }

    pub fn logout(&mut self) {
        self.customer = None;
    }

    /// The logged-in customer, if any.
    pub fn customer_id(&self) -> Option<&CustomerId> {
        self.customer.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.customer.is_some()
    }

    /// The logged-in customer, or [`LedgerError::NoSession`].
    pub fn require(&self) -> Result<&CustomerId, LedgerError> {
        self.customer.as_ref().ok_or(LedgerError::NoSession)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_policy() {
        assert!(validate_password("abcd1234").is_ok());
        assert!(matches!(validate_password("abc123"), Err(LedgerError::WeakCredential)));
        assert!(matches!(validate_password("abcdefgh"), Err(LedgerError::WeakCredential)));
        assert!(matches!(validate_password("12345678"), Err(LedgerError::WeakCredential)));
    }

    #[test]
    fn test_hash_is_sha256_hex() {
        assert_eq!(
            hash_password("abcd1234"),
            "e9cee71ab932fde863338d08be4de9dfe39ea049bdafb342ce659ec5450b69ae"
        );
        assert!(verify_password("abcd1234", &hash_password("abcd1234")));
        assert!(!verify_password("abcd12345", &hash_password("abcd1234")));
    }

    #[test]
    fn test_session_lifecycle() {
        let mut session = Session::anonymous();
        assert!(matches!(session.require(), Err(LedgerError::NoSession)));
        assert_eq!(session.customer_id(), None);
        session.login("CUST0001".to_string());
        assert_eq!(session.require().unwrap(), "CUST0001");
        assert_eq!(session.customer_id().map(String::as_str), Some("CUST0001"));
        session.logout();
        assert!(!session.is_authenticated());
        assert_eq!(session.customer_id(), None);
    }
}
