use crate::{Error, Error::*, Result};
use std::fmt;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use digest::Digest;
use md5::Md5;
use sha2::{Sha256, Sha512_256};

/// Digest function as stored in the [`HashRegistry`](struct.HashRegistry.html):
/// hashes a string and returns the lowercase hex encoding.
pub type HashFn = fn(&str) -> String;

/// Hex-encoded digest of a string using any `digest` hasher
pub fn hex_digest<D: Digest>(data: &str) -> String {
    hex::encode(D::digest(data.as_bytes()))
}

/// Built-in algorithms
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[allow(non_camel_case_types)]
pub enum Algorithm {
    /// The legacy RFC 2617 algorithm, assumed when a client omits `algorithm`
    MD5,
    SHA2_256,
    SHA2_512_256,
}

impl Algorithm {
    pub const ALL: [Algorithm; 3] = [Algorithm::MD5, Algorithm::SHA2_256, Algorithm::SHA2_512_256];

    /// Name as used in the `algorithm` header parameter
    pub fn name(self) -> &'static str {
        match self {
            Algorithm::MD5 => "MD5",
            Algorithm::SHA2_256 => "SHA-256",
            Algorithm::SHA2_512_256 => "SHA-512-256",
        }
    }

    /// Digest function for this algorithm
    pub fn hash_fn(self) -> HashFn {
        match self {
            Algorithm::MD5 => hex_digest::<Md5>,
            Algorithm::SHA2_256 => hex_digest::<Sha256>,
            Algorithm::SHA2_512_256 => hex_digest::<Sha512_256>,
        }
    }

    /// Calculate a hash of string's bytes using the selected algorithm
    pub fn hash_str(self, data: &str) -> String {
        (self.hash_fn())(data)
    }
}

impl FromStr for Algorithm {
    type Err = Error;

    /// Parse from the format used in the `algorithm` parameter, ignoring case
    fn from_str(s: &str) -> Result<Self> {
        Algorithm::ALL
            .iter()
            .copied()
            .find(|a| a.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownAlgorithm(s.into()))
    }
}

impl Default for Algorithm {
    /// Get a MD5 instance
    fn default() -> Self {
        Algorithm::MD5
    }
}

impl Display for Algorithm {
    /// Format to the form used in HTTP headers
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// QOP field values. Only `auth` is accepted by the verifier.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[allow(non_camel_case_types)]
pub enum Qop {
    AUTH,
}

impl Qop {
    pub fn as_str(self) -> &'static str {
        match self {
            Qop::AUTH => "auth",
        }
    }
}

impl Display for Qop {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digests() {
        assert_eq!(Algorithm::MD5.hash_str(""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(
            Algorithm::SHA2_256.hash_str(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(
            Algorithm::MD5.hash_str("Mufasa:testrealm@host.com:Circle Of Life"),
            "939e7578ed9e3c518a452acee763bce9"
        );
        assert_eq!(Algorithm::SHA2_512_256.hash_str("abc").len(), 64);
    }

    #[test]
    fn test_parse_algorithm() {
        assert_eq!(Algorithm::from_str("MD5").unwrap(), Algorithm::MD5);
        assert_eq!(Algorithm::from_str("md5").unwrap(), Algorithm::MD5);
        assert_eq!(Algorithm::from_str("sha-256").unwrap(), Algorithm::SHA2_256);
        assert_eq!(Algorithm::from_str("SHA-512-256").unwrap(), Algorithm::SHA2_512_256);
        assert_eq!(
            Algorithm::from_str("MD5-sess"),
            Err(UnknownAlgorithm("MD5-sess".into()))
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Algorithm::default().to_string(), "MD5");
        assert_eq!(Algorithm::SHA2_512_256.to_string(), "SHA-512-256");
        assert_eq!(Qop::AUTH.to_string(), "auth");
    }
}
