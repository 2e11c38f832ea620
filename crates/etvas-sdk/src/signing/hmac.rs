//! HMAC-SHA256 signing and verification primitives.
//!
//! Pure functions over the `hmac` and `sha2` crates. Signatures are compared
//! in constant time with `subtle`.

use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::{Digest as _, Sha256};
use subtle::ConstantTimeEq;

use crate::error::SigningError;

type HmacSha256 = Hmac<Sha256>;

/// Supported HMAC algorithms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HmacAlgorithm {
    #[default]
    Sha256,
}

/// Output encoding of a computed digest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DigestEncoding {
    /// Lowercase hexadecimal string.
    #[default]
    Hex,

    /// Raw digest bytes.
    Binary,
}

/// Options for [`sign`] and [`verify`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SignOptions {
    pub algorithm: HmacAlgorithm,
    pub encoding: DigestEncoding,
}

impl SignOptions {
    /// Options producing raw binary digests.
    pub fn binary() -> Self {
        Self {
            encoding: DigestEncoding::Binary,
            ..Self::default()
        }
    }
}

/// A computed HMAC digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Digest {
    Hex(String),
    Binary(Vec<u8>),
}

impl Digest {
    /// The digest as a hex string, encoding binary digests on the fly.
    pub fn to_hex(&self) -> String {
        match self {
            Self::Hex(hex) => hex.clone(),
            Self::Binary(bytes) => hex::encode(bytes),
        }
    }

    /// Borrow the digest as a signature for [`verify`].
    pub fn as_signature(&self) -> SignatureRef<'_> {
        match self {
            Self::Hex(hex) => SignatureRef::Hex(hex),
            Self::Binary(bytes) => SignatureRef::Binary(bytes),
        }
    }
}

/// A signature to verify, either as received hex text or raw bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureRef<'a> {
    Hex(&'a str),
    Binary(&'a [u8]),
}

fn compute_mac(canonical: &[u8], key: &str, algorithm: HmacAlgorithm) -> Result<Vec<u8>, SigningError> {
    if key.is_empty() {
        return Err(SigningError::InvalidKey);
    }

    match algorithm {
        HmacAlgorithm::Sha256 => {
            let mut mac =
                HmacSha256::new_from_slice(key.as_bytes()).map_err(|_| SigningError::InvalidKey)?;
            mac.update(canonical);
            Ok(mac.finalize().into_bytes().to_vec())
        }
    }
}

/// Sign a canonical string with the given key.
///
/// The empty string is a valid canonical. An empty key fails with
/// [`SigningError::InvalidKey`].
///
/// # Examples
///
/// ```rust
/// use etvas_sdk::signing::{sign, Digest, SignOptions};
///
/// let digest = sign("I hereby agree", "my secret signature", SignOptions::default()).unwrap();
/// assert_eq!(
///     digest,
///     Digest::Hex("f11d7a44718128386a25a5c578ba5e66a3b04515276d3e4fda5ab5c422a5a40b".to_string())
/// );
/// ```
pub fn sign(canonical: &str, key: &str, options: SignOptions) -> Result<Digest, SigningError> {
    sign_bytes(canonical.as_bytes(), key, options)
}

/// Sign raw bytes, used for webhook bodies that are verified byte for byte.
pub fn sign_bytes(canonical: &[u8], key: &str, options: SignOptions) -> Result<Digest, SigningError> {
    let mac = compute_mac(canonical, key, options.algorithm)?;
    Ok(match options.encoding {
        DigestEncoding::Hex => Digest::Hex(hex::encode(mac)),
        DigestEncoding::Binary => Digest::Binary(mac),
    })
}

/// Sign a loosely typed canonical value.
///
/// Only JSON strings are signable; every other value fails with
/// [`SigningError::InvalidCanonical`].
pub fn sign_value(canonical: &Value, key: &str, options: SignOptions) -> Result<Digest, SigningError> {
    match canonical {
        Value::String(text) => sign(text, key, options),
        _ => Err(SigningError::InvalidCanonical),
    }
}

/// Verify a signature over a canonical string.
///
/// Fails with [`SigningError::InvalidCanonical`] when `canonical` is empty.
/// Hex signatures are compared against the hex encoding of the recomputed
/// digest, binary signatures against the raw digest bytes.
pub fn verify(
    canonical: &str,
    signature: SignatureRef<'_>,
    key: &str,
    options: SignOptions,
) -> Result<bool, SigningError> {
    if canonical.is_empty() {
        return Err(SigningError::InvalidCanonical);
    }
    verify_bytes(canonical.as_bytes(), signature, key, options)
}

/// Verify a signature over raw bytes.
pub fn verify_bytes(
    canonical: &[u8],
    signature: SignatureRef<'_>,
    key: &str,
    options: SignOptions,
) -> Result<bool, SigningError> {
    if canonical.is_empty() {
        return Err(SigningError::InvalidCanonical);
    }

    let expected = compute_mac(canonical, key, options.algorithm)?;
    Ok(match signature {
        SignatureRef::Hex(received) => {
            constant_time_eq(hex::encode(expected).as_bytes(), received.as_bytes())
        }
        SignatureRef::Binary(received) => constant_time_eq(&expected, received),
    })
}

/// Hex-encoded SHA-256 of the given text. `None` hashes the empty string.
pub fn sha256_hex(data: Option<&str>) -> String {
    hex::encode(Sha256::digest(data.unwrap_or_default().as_bytes()))
}

/// Constant-time byte comparison.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    // Length is not secret
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

#[cfg(test)]
#[path = "hmac_tests.rs"]
mod tests;
