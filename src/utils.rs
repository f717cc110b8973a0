use rand::Rng;
use subtle::ConstantTimeEq;

/// Hex-encoded key from 16 bytes of the thread-local CSPRNG.
/// Used for nonces and the default opaque token.
pub fn random_key() -> String {
    let bytes: [u8; 16] = rand::thread_rng().gen();
    hex::encode(bytes)
}

/// Compare two byte strings without short-circuiting on the first differing byte.
///
/// A length mismatch returns early; lengths of digests are public anyway.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}

/// Header values we emit between quotes must not break out of them.
pub fn is_quotable(s: &str) -> bool {
    !s.chars().any(|c| c == '"' || c == '\\' || c.is_control())
}
