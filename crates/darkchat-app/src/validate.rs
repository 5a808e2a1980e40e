//! Local form validation.
//!
//! Only shape checks happen locally; the backend remains the authority on
//! credentials.

use std::sync::LazyLock;

use regex::Regex;

#[allow(clippy::unwrap_used, reason = "pattern is a compile-time constant")]
static EMAIL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

/// Whether `email` looks like `local@domain.tld`.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL.is_match(email)
}

/// Validate login input. Returns the message to show on failure.
pub fn login(email: &str, password: &str) -> Result<(), &'static str> {
    if !is_valid_email(email) {
        return Err("Please enter a valid email address");
    }
    if password.is_empty() {
        return Err("Password is required");
    }
    Ok(())
}

/// Validate registration input. Returns the message to show on failure.
pub fn registration(display_name: &str, email: &str, password: &str) -> Result<(), &'static str> {
    if display_name.trim().is_empty() {
        return Err("Display name is required");
    }
    login(email, password)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_conservative_shape() {
        assert!(is_valid_email("al@example.com"));
        assert!(is_valid_email("a.b+c@sub.example.io"));
    }

    #[test]
    fn rejects_malformed() {
        for bad in ["", "al", "al@example", "@example.com", "al @example.com", "al@@example.com"] {
            assert!(!is_valid_email(bad), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn form_checks_order() {
        assert_eq!(login("nope", ""), Err("Please enter a valid email address"));
        assert_eq!(login("al@example.com", ""), Err("Password is required"));
        assert_eq!(registration(" ", "al@example.com", "pw"), Err("Display name is required"));
        assert_eq!(registration("Al", "al@example.com", "pw"), Ok(()));
    }
}
