//! Webhook signature verification.
//!
//! EAS signs every webhook delivery with HMAC-SHA1 over the raw request
//! body, keyed by the shared webhook secret, and sends the digest in the
//! `expo-signature` header as `sha1=<hex>`.
//!
//! Verification MUST run over the raw, unparsed body bytes. Re-serializing
//! parsed JSON can change the byte layout and break the digest comparison,
//! so the HTTP layer hands the body to [`WebhookAuthenticator::verify`]
//! before any deserialization happens.
//!
//! # Security
//!
//! - Digest comparison is constant-time (`subtle::ConstantTimeEq`)
//! - Secrets and digests never appear in logs or `Debug` output
//! - Signature format is validated before the HMAC is computed

use hmac::{Hmac, Mac};
use sha1::Sha1;
use subtle::ConstantTimeEq;

type HmacSha1 = Hmac<Sha1>;

/// Signature verification failures.
#[derive(Debug, thiserror::Error)]
pub enum SignatureError {
    /// The header is not in the expected `sha1=<hex>` format.
    #[error("invalid signature format: {message}")]
    InvalidFormat { message: String },

    /// The digest does not match the payload.
    #[error("signature does not match payload")]
    Mismatch,
}

/// Verifies `expo-signature` headers against the shared webhook secret.
///
/// Constructed once at startup from configuration and shared by reference
/// across requests; verification itself is pure and synchronous.
///
/// # Examples
///
/// ```rust
/// use eas_relay_core::signature::WebhookAuthenticator;
///
/// let authenticator = WebhookAuthenticator::new("my-secret".to_string());
/// let outcome = authenticator.verify(b"{}", "sha1=deadbeef");
/// assert!(outcome.is_err());
/// ```
#[derive(Clone)]
pub struct WebhookAuthenticator {
    secret: String,
}

impl WebhookAuthenticator {
    const PREFIX: &'static str = "sha1=";

    /// Create an authenticator for the given shared secret.
    pub fn new(secret: String) -> Self {
        Self { secret }
    }

    /// Verify a signature header against the raw payload bytes.
    ///
    /// # Arguments
    ///
    /// * `payload` - The raw request body, exactly as received on the wire
    /// * `signature` - The `expo-signature` header value (`sha1=<hex>`)
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError::InvalidFormat`] when the header lacks the
    /// `sha1=` prefix or the remainder is not valid hex, and
    /// [`SignatureError::Mismatch`] when the digest differs from the one
    /// computed over the payload. Callers must treat every error as
    /// "reject the request" without processing the payload.
    pub fn verify(&self, payload: &[u8], signature: &str) -> Result<(), SignatureError> {
        let provided = self.parse_signature(signature)?;
        let expected = self.compute_digest(payload);

        // Length differs only for malformed input, safe to reject early.
        if provided.len() != expected.len() {
            return Err(SignatureError::Mismatch);
        }

        if bool::from(provided.ct_eq(&expected)) {
            Ok(())
        } else {
            Err(SignatureError::Mismatch)
        }
    }

    /// Extract the digest bytes from a `sha1=<hex>` header value.
    fn parse_signature(&self, signature: &str) -> Result<Vec<u8>, SignatureError> {
        let hex_part =
            signature
                .strip_prefix(Self::PREFIX)
                .ok_or_else(|| SignatureError::InvalidFormat {
                    message: format!("signature must start with '{}'", Self::PREFIX),
                })?;

        hex::decode(hex_part).map_err(|_| SignatureError::InvalidFormat {
            message: "signature is not valid hex".to_string(),
        })
    }

    /// Compute the HMAC-SHA1 digest of `payload` keyed by the secret.
    fn compute_digest(&self, payload: &[u8]) -> Vec<u8> {
        let mut mac = HmacSha1::new_from_slice(self.secret.as_bytes())
            .expect("HMAC can take a key of any size");
        mac.update(payload);
        mac.finalize().into_bytes().to_vec()
    }
}

// Security: never expose the secret in debug output.
impl std::fmt::Debug for WebhookAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookAuthenticator")
            .field("secret", &"<REDACTED>")
            .finish()
    }
}

#[cfg(test)]
#[path = "signature_tests.rs"]
mod tests;
