use crate::enums::{Algorithm, HashFn};
use crate::{Error::*, Result};
use std::collections::HashMap;

/// Table of supported digest algorithms, keyed by upper-cased name.
///
/// Built once and then handed to the authenticator, which never mutates it.
#[derive(Debug, Clone)]
pub struct HashRegistry {
    table: HashMap<String, HashFn>,
}

impl HashRegistry {
    /// A registry with nothing in it
    pub fn empty() -> Self {
        HashRegistry { table: HashMap::new() }
    }

    /// Add or replace an algorithm. The name is matched case-insensitively.
    pub fn register(mut self, name: &str, hash: HashFn) -> Self {
        self.table.insert(name.to_ascii_uppercase(), hash);
        self
    }

    /// Find the digest function for an algorithm name
    pub fn get(&self, name: &str) -> Option<HashFn> {
        self.table.get(&name.to_ascii_uppercase()).copied()
    }

    /// Like [`get()`](#method.get), but an unknown name is an error
    pub fn resolve(&self, name: &str) -> Result<HashFn> {
        self.get(name).ok_or_else(|| UnknownAlgorithm(name.into()))
    }
}

impl Default for HashRegistry {
    /// All built-in algorithms: MD5, SHA-256 and SHA-512-256
    fn default() -> Self {
        Algorithm::ALL
            .iter()
            .fold(HashRegistry::empty(), |reg, algo| reg.register(algo.name(), algo.hash_fn()))
    }
}
