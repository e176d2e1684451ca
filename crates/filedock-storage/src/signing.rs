//! HMAC-signed download URLs for backends without native presigning.
//!
//! URL: `{base_url}/{percent-encoded key}?expires={unix_secs}&signature={hex}`,
//! where the signature is HMAC-SHA256(secret, `{key}\n{expires}`).

use crate::traits::{TransferError, TransferResult};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone)]
pub struct UrlSigner {
    base_url: String,
    secret: Vec<u8>,
}

impl UrlSigner {
    pub fn new(base_url: impl Into<String>, secret: impl Into<Vec<u8>>) -> TransferResult<Self> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(TransferError::Config(
                "URL signing secret must not be empty".to_string(),
            ));
        }
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            secret,
        })
    }

    /// Signer with a per-process secret; its URLs stop verifying after a restart.
    pub fn with_random_secret(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            secret: uuid::Uuid::new_v4().as_bytes().to_vec(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sign a download URL for `key` valid for `expires_in` from now.
    pub fn sign(&self, key: &str, expires_in: Duration) -> TransferResult<String> {
        let expires = unix_now()
            .checked_add(expires_in.as_secs())
            .ok_or_else(|| TransferError::Signing("expiry overflows".to_string()))?;
        self.sign_until(key, expires)
    }

    fn sign_until(&self, key: &str, expires: u64) -> TransferResult<String> {
        let signature = hex::encode(self.mac(key, expires)?.finalize().into_bytes());
        Ok(format!(
            "{}/{}?expires={}&signature={}",
            self.base_url,
            encode_key(key),
            expires,
            signature
        ))
    }

    /// Verify a URL produced by [`UrlSigner::sign`] and return the object key.
    pub fn verify(&self, url: &str) -> TransferResult<String> {
        let invalid = || TransferError::Signing("Invalid signed URL".to_string());

        let rest = url
            .strip_prefix(&self.base_url)
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or_else(invalid)?;
        let (encoded_key, query) = rest.split_once('?').ok_or_else(invalid)?;

        let mut expires = None;
        let mut signature = None;
        for pair in query.split('&') {
            match pair.split_once('=') {
                Some(("expires", value)) => expires = value.parse::<u64>().ok(),
                Some(("signature", value)) => signature = hex::decode(value).ok(),
                _ => {}
            }
        }
        let expires = expires.ok_or_else(invalid)?;
        let signature = signature.ok_or_else(invalid)?;

        let key = decode_key(encoded_key).ok_or_else(invalid)?;
        self.mac(&key, expires)?
            .verify_slice(&signature)
            .map_err(|_| invalid())?;

        if unix_now() > expires {
            return Err(TransferError::Signing("Signed URL has expired".to_string()));
        }

        Ok(key)
    }

    fn mac(&self, key: &str, expires: u64) -> TransferResult<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| TransferError::Signing(e.to_string()))?;
        mac.update(key.as_bytes());
        mac.update(b"\n");
        mac.update(expires.to_string().as_bytes());
        Ok(mac)
    }
}

impl std::fmt::Debug for UrlSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrlSigner")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

fn encode_key(key: &str) -> String {
    key.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn decode_key(encoded: &str) -> Option<String> {
    let segments = encoded
        .split('/')
        .map(|segment| urlencoding::decode(segment).map(|s| s.into_owned()))
        .collect::<Result<Vec<_>, _>>()
        .ok()?;
    Some(segments.join("/"))
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> UrlSigner {
        UrlSigner::new("http://localhost:8080/files/", b"test-secret".to_vec()).unwrap()
    }

    #[test]
    fn test_sign_and_verify() {
        let signer = signer();
        let url = signer
            .sign("users/uid/my report.pdf", Duration::from_secs(900))
            .unwrap();

        assert!(url.starts_with("http://localhost:8080/files/users/uid/my%20report.pdf?expires="));
        assert_eq!(signer.verify(&url).unwrap(), "users/uid/my report.pdf");
    }

    #[test]
    fn test_tampered_url_is_rejected() {
        let signer = signer();
        let url = signer.sign("users/uid/a.txt", Duration::from_secs(900)).unwrap();
        let tampered = url.replace("a.txt", "b.txt");
        assert!(matches!(signer.verify(&tampered), Err(TransferError::Signing(_))));
    }

    #[test]
    fn test_other_secret_is_rejected() {
        let url = signer().sign("users/uid/a.txt", Duration::from_secs(900)).unwrap();
        let other = UrlSigner::new("http://localhost:8080/files", b"other".to_vec()).unwrap();
        assert!(other.verify(&url).is_err());
    }

    #[test]
    fn test_expired_url_is_rejected() {
        let signer = signer();
        let url = signer.sign_until("users/uid/a.txt", 1).unwrap();
        let err = signer.verify(&url).unwrap_err();
        assert!(err.to_string().contains("expired"));
    }

    #[test]
    fn test_empty_secret_is_a_config_error() {
        assert!(matches!(
            UrlSigner::new("http://x", Vec::new()),
            Err(TransferError::Config(_))
        ));
    }
}
