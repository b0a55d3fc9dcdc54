//! `X-Hub-Signature-256` verification

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::errors::WebhookError;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "X-Hub-Signature-256";
const PREFIX: &str = "sha256=";

/// `sha256=<hex>` for `body` under `secret`
pub fn sign(secret: &[u8], body: &[u8]) -> String {
    format!("{PREFIX}{}", hex::encode(digest(secret, body)))
}

fn digest(secret: &[u8], body: &[u8]) -> Vec<u8> {
    // HMAC accepts keys of any length
    let mut mac = match HmacSha256::new_from_slice(secret) {
        Ok(mac) => mac,
        Err(_) => return Vec::new(),
    };
    mac.update(body);
    mac.finalize().into_bytes().to_vec()
}

/// Checks `header` against the HMAC of the raw `body`, in constant time
pub fn verify_signature(secret: &[u8], body: &[u8], header: Option<&str>) -> Result<(), WebhookError> {
    let header = header.ok_or(WebhookError::MissingSignature)?;
    let provided = header
        .strip_prefix(PREFIX)
        .and_then(|hex_digest| hex::decode(hex_digest).ok())
        .ok_or(WebhookError::InvalidSignature)?;

    let expected = digest(secret, body);
    if expected.is_empty() || provided.len() != expected.len() {
        return Err(WebhookError::InvalidSignature);
    }
    if bool::from(provided.ct_eq(&expected)) {
        Ok(())
    } else {
        Err(WebhookError::InvalidSignature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_its_own_signature() {
        let header = sign(b"secret", b"{\"ref\":\"refs/heads/main\"}");
        assert!(header.starts_with("sha256="));
        assert_eq!(header.len(), PREFIX.len() + 64);
        assert!(verify_signature(b"secret", b"{\"ref\":\"refs/heads/main\"}", Some(&header)).is_ok());
    }

    #[test]
    fn rejects_tampered_body_and_wrong_secret() {
        let header = sign(b"secret", b"original");
        assert!(matches!(
            verify_signature(b"secret", b"tampered", Some(&header)),
            Err(WebhookError::InvalidSignature)
        ));
        assert!(matches!(
            verify_signature(b"other", b"original", Some(&header)),
            Err(WebhookError::InvalidSignature)
        ));
    }

    #[test]
    fn rejects_missing_and_malformed_headers() {
        assert!(matches!(
            verify_signature(b"secret", b"body", None),
            Err(WebhookError::MissingSignature)
        ));
        for header in ["sha1=abcd", "sha256=not-hex", "sha256=abcd", ""] {
            assert!(matches!(
                verify_signature(b"secret", b"body", Some(header)),
                Err(WebhookError::InvalidSignature)
            ));
        }
    }
}
