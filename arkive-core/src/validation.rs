//! Username, password, and email policy checks.
//!
//! Shared by the registration path and the admin CLI so both enforce the
//! same rules. All failures carry a displayable message (see
//! [`ValidationError`]); callers surface them directly.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ValidationError;

/// Usernames: leading alphanumeric, then word characters or dashes, 3-31
/// characters total.
static USER_RX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][\w-]{2,30}$").expect("valid regex"));

/// Permissive `local@domain.tld` shape; real deliverability is not checked.
static EMAIL_RX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w.+-]+@[\w.-]+\.\w+$").expect("valid regex"));

/// Names that can never be registered, mostly route segments and
/// pseudo-users.
pub const RESERVED_NAMES: &[&str] = &[
    "login",
    "logout",
    "user",
    "admin",
    "manager",
    "guest",
    "settings",
    "profile",
    "api",
    "anon",
    "anonymous",
    "register",
    "join",
    "download",
    "live",
    "embed",
];

/// Check a candidate username against registered names, the username
/// pattern, and the reserved-name set.
pub fn validate_username(
    candidate: &str,
    existing_usernames: &[String],
) -> Result<(), ValidationError> {
    if existing_usernames.iter().any(|name| name == candidate) {
        return Err(ValidationError::DuplicateUser(candidate.to_string()));
    }

    if !USER_RX.is_match(candidate) || RESERVED_NAMES.contains(&candidate) {
        return Err(ValidationError::InvalidName(candidate.to_string()));
    }

    Ok(())
}

/// Reject an email already attached to a registered account.
pub fn validate_email_uniqueness(
    email: &str,
    all_user_emails: &[String],
) -> Result<(), ValidationError> {
    if all_user_emails.iter().any(|existing| existing == email) {
        return Err(ValidationError::DuplicateEmail(email.to_string()));
    }
    Ok(())
}

/// Enforce the password policy: matching confirmation, length >= 8, at
/// least one digit or symbol, one lowercase, one uppercase.
pub fn validate_password(
    password: &str,
    confirmation: &str,
) -> Result<(), ValidationError> {
    if password != confirmation {
        return Err(ValidationError::PasswordMismatch);
    }

    let long_enough = password.chars().count() >= 8;
    let has_digit_or_symbol = password
        .chars()
        .any(|c| c.is_ascii_digit() || !(c.is_alphanumeric() || c == '_'));
    let has_lowercase = password.chars().any(|c| c.is_lowercase());
    let has_uppercase = password.chars().any(|c| c.is_uppercase());

    if !(long_enough && has_digit_or_symbol && has_lowercase && has_uppercase) {
        return Err(ValidationError::WeakPassword);
    }

    Ok(())
}

/// Check the basic shape of an email address.
pub fn validate_email_format(email: &str) -> Result<(), ValidationError> {
    if !EMAIL_RX.is_match(email) {
        return Err(ValidationError::InvalidEmail(email.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_formed_usernames() {
        for name in ["alice", "Alice-2", "a_b-c", "user123"] {
            assert!(validate_username(name, &[]).is_ok(), "{name}");
        }
    }

    #[test]
    fn rejects_malformed_usernames() {
        for name in ["ab", "-leading", "_leading", "has space", "ab!", ""] {
            assert!(
                matches!(
                    validate_username(name, &[]),
                    Err(ValidationError::InvalidName(_))
                ),
                "{name}"
            );
        }
        let too_long = "a".repeat(32);
        assert!(matches!(
            validate_username(&too_long, &[]),
            Err(ValidationError::InvalidName(_))
        ));
    }

    #[test]
    fn reserved_names_always_fail_regardless_of_availability() {
        for name in RESERVED_NAMES {
            assert!(
                matches!(
                    validate_username(name, &[]),
                    Err(ValidationError::InvalidName(_))
                ),
                "{name} should be reserved"
            );
        }
    }

    #[test]
    fn duplicate_usernames_are_reported_first() {
        let existing = vec!["admin".to_string()];
        // Even a reserved name reports the duplicate when it is registered.
        assert!(matches!(
            validate_username("admin", &existing),
            Err(ValidationError::DuplicateUser(_))
        ));
    }

    #[test]
    fn email_uniqueness() {
        let emails = vec!["a@b.com".to_string()];
        assert!(validate_email_uniqueness("c@d.com", &emails).is_ok());
        assert!(matches!(
            validate_email_uniqueness("a@b.com", &emails),
            Err(ValidationError::DuplicateEmail(_))
        ));
    }

    #[test]
    fn password_policy() {
        assert!(validate_password("Abc12345", "Abc12345").is_ok());
        assert!(validate_password("Abcdefg!", "Abcdefg!").is_ok());

        // No uppercase or digit.
        assert!(matches!(
            validate_password("abcdefgh", "abcdefgh"),
            Err(ValidationError::WeakPassword)
        ));
        // Too short.
        assert!(matches!(
            validate_password("Ab1", "Ab1"),
            Err(ValidationError::WeakPassword)
        ));
        // No lowercase.
        assert!(matches!(
            validate_password("ABCDEFG1", "ABCDEFG1"),
            Err(ValidationError::WeakPassword)
        ));
        // No digit or symbol.
        assert!(matches!(
            validate_password("Abcdefgh", "Abcdefgh"),
            Err(ValidationError::WeakPassword)
        ));
        // Mismatch wins over weakness.
        assert!(matches!(
            validate_password("Abc12345", "Abc12346"),
            Err(ValidationError::PasswordMismatch)
        ));
    }

    #[test]
    fn email_format() {
        for email in ["a@b.com", "first.last+tag@sub.domain.org"] {
            assert!(validate_email_format(email).is_ok(), "{email}");
        }
        for email in ["", "plain", "missing@tld", "@nolocal.com"] {
            assert!(
                matches!(
                    validate_email_format(email),
                    Err(ValidationError::InvalidEmail(_))
                ),
                "{email}"
            );
        }
    }
}
