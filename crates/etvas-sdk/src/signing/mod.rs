//! Request canonicalization and HMAC signing.
//!
//! Outbound platform calls are canonicalized ([`CanonicalRequest`]) and
//! signed with the request signing secret by the [`RequestSigner`]. The
//! [`hmac`] primitives are shared with inbound event verification.

pub mod canonical;
pub mod hmac;
pub mod query;
pub mod signer;

pub use canonical::{
    prepare_signature, CanonicalRequest, PreparedSignature, API_KEY_HEADER, CONTEXT_HEADER,
    SIGNATURE_HEADER, TIMESTAMP_HEADER,
};
pub use hmac::{
    constant_time_eq, sha256_hex, sign, sign_bytes, sign_value, verify, verify_bytes, Digest,
    DigestEncoding, HmacAlgorithm, SignOptions, SignatureRef,
};
pub use query::{encode_params, encode_uri, encode_uri_component, query_string};
pub use signer::RequestSigner;
