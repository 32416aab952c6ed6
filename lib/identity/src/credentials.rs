//! Username/password extraction from request parameters.

use std::collections::HashMap;
use std::fmt;

use crate::error::AuthenticationError;

/// Parameter carrying the username. The uppercase variant is tried second.
pub const USER_NAME_PARAMETER: &str = "userid";
/// Parameter carrying the password. The uppercase variant is tried second.
pub const PASSWORD_PARAMETER: &str = "password";
/// Parameter announcing how the password was transported.
pub const PASSWORD_MODE_PARAMETER: &str = "passwordMode";
/// `passwordMode` value meaning the password must be decrypted first.
pub const PASSWORD_MODE_ENCRYPTED: &str = "encrypted";

/// A username/password pair submitted with a request.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    #[must_use]
    pub fn new(username: String, password: String) -> Self {
        Self { username, password }
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[redacted]")
            .finish()
    }
}

/// Failure to decrypt a transported password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecryptError {
    pub reason: String,
}

impl fmt::Display for DecryptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to decrypt password: {}", self.reason)
    }
}

impl std::error::Error for DecryptError {}

/// Reverses the cipher clients apply to passwords sent with
/// `passwordMode=encrypted`.
pub trait PasswordDecrypter: Send + Sync {
    fn decrypt(&self, ciphertext: &str) -> Result<String, DecryptError>;
}

/// Reads credentials from request parameters.
///
/// Each parameter is looked up lowercase first, then uppercase. Returns
/// `None` unless a non-empty username and a password (possibly empty)
/// are both present. A failed decryption counts as a failed silent login
/// for that user.
pub fn extract(
    params: &HashMap<String, String>,
    decrypter: &dyn PasswordDecrypter,
) -> Result<Option<Credentials>, AuthenticationError> {
    let Some(username) = lookup(params, USER_NAME_PARAMETER).filter(|u| !u.is_empty()) else {
        return Ok(None);
    };
    let Some(password) = lookup(params, PASSWORD_PARAMETER) else {
        return Ok(None);
    };
    tracing::debug!(user = username, "read credentials from request");

    let encrypted = params
        .get(PASSWORD_MODE_PARAMETER)
        .is_some_and(|mode| mode.eq_ignore_ascii_case(PASSWORD_MODE_ENCRYPTED));

    let password = if encrypted {
        decrypter.decrypt(password).map_err(|e| {
            tracing::warn!(user = username, error = %e, "password decryption failed");
            AuthenticationError::SilentAuthenticationFailed {
                user: username.to_string(),
            }
        })?
    } else {
        password.to_string()
    };

    Ok(Some(Credentials::new(username.to_string(), password)))
}

fn lookup<'a>(params: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    params
        .get(name)
        .or_else(|| params.get(&name.to_uppercase()))
        .map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Reverse;

    impl PasswordDecrypter for Reverse {
        fn decrypt(&self, ciphertext: &str) -> Result<String, DecryptError> {
            Ok(ciphertext.chars().rev().collect())
        }
    }

    struct Broken;

    impl PasswordDecrypter for Broken {
        fn decrypt(&self, _ciphertext: &str) -> Result<String, DecryptError> {
            Err(DecryptError {
                reason: "bad padding".to_string(),
            })
        }
    }

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn lowercase_parameters() {
        let creds = extract(&params(&[("userid", "alice"), ("password", "pw")]), &Reverse)
            .expect("extract")
            .expect("credentials");
        assert_eq!(creds.username(), "alice");
        assert_eq!(creds.password(), "pw");
    }

    #[test]
    fn uppercase_parameters() {
        let creds = extract(&params(&[("USERID", "bob"), ("PASSWORD", "pw")]), &Reverse)
            .expect("extract")
            .expect("credentials");
        assert_eq!(creds.username(), "bob");
    }

    #[test]
    fn lowercase_wins_over_uppercase() {
        let creds = extract(
            &params(&[("userid", "lower"), ("USERID", "upper"), ("password", "pw")]),
            &Reverse,
        )
        .expect("extract")
        .expect("credentials");
        assert_eq!(creds.username(), "lower");
    }

    #[test]
    fn missing_either_half_yields_none() {
        assert_eq!(
            extract(&params(&[("userid", "alice")]), &Reverse).expect("extract"),
            None
        );
        assert_eq!(
            extract(&params(&[("password", "pw")]), &Reverse).expect("extract"),
            None
        );
        assert_eq!(
            extract(&params(&[("userid", ""), ("password", "pw")]), &Reverse).expect("extract"),
            None
        );
    }

    #[test]
    fn empty_password_is_accepted() {
        let creds = extract(&params(&[("userid", "alice"), ("password", "")]), &Reverse)
            .expect("extract")
            .expect("credentials");
        assert_eq!(creds.password(), "");
    }

    #[test]
    fn encrypted_mode_decrypts() {
        let creds = extract(
            &params(&[
                ("userid", "alice"),
                ("password", "terces"),
                ("passwordMode", "ENCRYPTED"),
            ]),
            &Reverse,
        )
        .expect("extract")
        .expect("credentials");
        assert_eq!(creds.password(), "secret");
    }

    #[test]
    fn other_modes_leave_password_untouched() {
        let creds = extract(
            &params(&[
                ("userid", "alice"),
                ("password", "terces"),
                ("passwordMode", "plain"),
            ]),
            &Broken,
        )
        .expect("extract")
        .expect("credentials");
        assert_eq!(creds.password(), "terces");
    }

    #[test]
    fn decrypt_failure_fails_silent_login() {
        let err = extract(
            &params(&[
                ("userid", "alice"),
                ("password", "x"),
                ("passwordMode", "encrypted"),
            ]),
            &Broken,
        )
        .expect_err("decrypt fails");
        assert_eq!(
            err,
            AuthenticationError::SilentAuthenticationFailed {
                user: "alice".to_string()
            }
        );
    }

    #[test]
    fn debug_redacts_password() {
        let creds = Credentials::new("alice".to_string(), "hunter2".to_string());
        let rendered = format!("{creds:?}");
        assert!(rendered.contains("alice"));
        assert!(!rendered.contains("hunter2"));
    }
}
