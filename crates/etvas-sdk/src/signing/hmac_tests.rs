//! Tests for the HMAC engine.

use super::*;
use serde_json::json;

const CANONICAL: &str = "I hereby agree";
const KEY: &str = "my secret signature";
const EXPECTED: &str = "f11d7a44718128386a25a5c578ba5e66a3b04515276d3e4fda5ab5c422a5a40b";

// ============================================================================
// sign
// ============================================================================

mod sign_tests {
    use super::*;

    /// Verify the known HMAC-SHA256 vector.
    #[test]
    fn test_sign_known_vector() {
        let digest = sign(CANONICAL, KEY, SignOptions::default()).expect("sign");
        assert_eq!(digest, Digest::Hex(EXPECTED.to_string()));
    }

    #[test]
    fn test_sign_binary_encoding() {
        let digest = sign(CANONICAL, KEY, SignOptions::binary()).expect("sign");

        match &digest {
            Digest::Binary(bytes) => assert_eq!(bytes.len(), 32),
            other => panic!("expected binary digest, got {:?}", other),
        }
        assert_eq!(digest.to_hex(), EXPECTED);
    }

    #[test]
    fn test_sign_accepts_empty_canonical() {
        let digest = sign("", KEY, SignOptions::default()).expect("sign");
        assert_eq!(digest.to_hex().len(), 64);
    }

    #[test]
    fn test_sign_rejects_empty_key() {
        assert_eq!(
            sign(CANONICAL, "", SignOptions::default()),
            Err(SigningError::InvalidKey)
        );
    }

    /// Verify every non-string value is refused as a canonical.
    #[test]
    fn test_sign_value_rejects_non_strings() {
        let invalid = [
            json!(null),
            json!({}),
            json!({"foo": "bar"}),
            json!([]),
            json!(true),
            json!(false),
            json!(42),
            json!(1.5),
        ];

        for value in invalid {
            assert_eq!(
                sign_value(&value, KEY, SignOptions::default()),
                Err(SigningError::InvalidCanonical),
                "value {} should not be signable",
                value
            );
        }
    }

    #[test]
    fn test_sign_value_accepts_strings() {
        let digest = sign_value(&json!(CANONICAL), KEY, SignOptions::default()).expect("sign");
        assert_eq!(digest.to_hex(), EXPECTED);
    }
}

// ============================================================================
// verify
// ============================================================================

mod verify_tests {
    use super::*;

    #[test]
    fn test_verify_round_trip_hex() {
        let digest = sign(CANONICAL, KEY, SignOptions::default()).expect("sign");
        let valid = verify(CANONICAL, digest.as_signature(), KEY, SignOptions::default());
        assert_eq!(valid, Ok(true));
    }

    #[test]
    fn test_verify_round_trip_binary() {
        let digest = sign(CANONICAL, KEY, SignOptions::binary()).expect("sign");
        let valid = verify(CANONICAL, digest.as_signature(), KEY, SignOptions::binary());
        assert_eq!(valid, Ok(true));
    }

    #[test]
    fn test_verify_rejects_empty_canonical() {
        assert_eq!(
            verify("", SignatureRef::Hex(EXPECTED), KEY, SignOptions::default()),
            Err(SigningError::InvalidCanonical)
        );
    }

    /// Verify that a single changed character in canonical, key or signature fails.
    #[test]
    fn test_verify_detects_single_character_changes() {
        let options = SignOptions::default();

        assert_eq!(
            verify("I hereby agreE", SignatureRef::Hex(EXPECTED), KEY, options),
            Ok(false)
        );
        assert_eq!(
            verify(CANONICAL, SignatureRef::Hex(EXPECTED), "my secret signaturE", options),
            Ok(false)
        );

        let mut tampered = EXPECTED.to_string();
        tampered.replace_range(0..1, "0");
        assert_eq!(
            verify(CANONICAL, SignatureRef::Hex(&tampered), KEY, options),
            Ok(false)
        );
    }

    #[test]
    fn test_verify_malformed_hex_is_false() {
        assert_eq!(
            verify(CANONICAL, SignatureRef::Hex("not-hex"), KEY, SignOptions::default()),
            Ok(false)
        );
    }

    #[test]
    fn test_verify_rejects_empty_key() {
        assert_eq!(
            verify(CANONICAL, SignatureRef::Hex(EXPECTED), "", SignOptions::default()),
            Err(SigningError::InvalidKey)
        );
    }
}

// ============================================================================
// helpers
// ============================================================================

#[test]
fn test_sha256_hex_of_empty_body() {
    let expected = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";
    assert_eq!(sha256_hex(None), expected);
    assert_eq!(sha256_hex(Some("")), expected);
}

#[test]
fn test_sha256_hex_of_json_body() {
    assert_eq!(
        sha256_hex(Some(r#"{"foo":"bar"}"#)),
        "7a38bf81f383f69433ad6e900d35b3e2385593f76a7b7ab5d4355b8ba41ee24b"
    );
}

#[test]
fn test_constant_time_eq() {
    assert!(constant_time_eq(b"abc", b"abc"));
    assert!(!constant_time_eq(b"abc", b"abd"));
    assert!(!constant_time_eq(b"abc", b"abcd"));
}
