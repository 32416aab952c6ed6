//! Password decryption for `passwordMode=encrypted` submissions.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use profile_gate_identity::{DecryptError, PasswordDecrypter};

/// Decodes passwords that clients transport base64-encoded.
#[derive(Debug, Clone, Copy, Default)]
pub struct Base64Decrypter;

impl PasswordDecrypter for Base64Decrypter {
    fn decrypt(&self, ciphertext: &str) -> Result<String, DecryptError> {
        let bytes = STANDARD.decode(ciphertext.trim()).map_err(|e| DecryptError {
            reason: e.to_string(),
        })?;
        String::from_utf8(bytes).map_err(|e| DecryptError {
            reason: e.to_string(),
        })
    }
}
