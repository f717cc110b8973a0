//! Where the authenticator gets credentials from.

use crate::{Error::*, Result};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Lookup of the stored secret for a user in a realm.
///
/// The secret is either the HA1 digest (`H(username:realm:password)`) or, when the
/// authenticator runs with plaintext secrets, the password itself. `None` means the user
/// is unknown; the request is then rejected like any other digest mismatch.
///
/// Implementations should be deterministic and free of side effects. Closures of the
/// right shape implement this trait.
pub trait SecretProvider: Send + Sync {
    fn secret(&self, username: &str, realm: &str) -> Option<String>;
}

impl<F> SecretProvider for F
where
    F: Fn(&str, &str) -> Option<String> + Send + Sync,
{
    fn secret(&self, username: &str, realm: &str) -> Option<String> {
        self(username, realm)
    }
}

/// In-memory secrets for tests and small deployments
#[derive(Debug, Default, Clone)]
pub struct MemorySecrets {
    secrets: HashMap<(String, String), String>,
}

impl MemorySecrets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, username: &str, realm: &str, secret: &str) {
        self.secrets
            .insert((username.to_string(), realm.to_string()), secret.to_string());
    }

    /// Builder-style [`insert()`](#method.insert)
    pub fn with(mut self, username: &str, realm: &str, secret: &str) -> Self {
        self.insert(username, realm, secret);
        self
    }

    pub fn len(&self) -> usize {
        self.secrets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.secrets.is_empty()
    }
}

impl SecretProvider for MemorySecrets {
    fn secret(&self, username: &str, realm: &str) -> Option<String> {
        self.secrets
            .get(&(username.to_string(), realm.to_string()))
            .cloned()
    }
}

/// Secrets in the Apache `htdigest` format: one `user:realm:HA1` entry per line.
///
/// Blank lines and lines starting with `#` are skipped. The contents are read once;
/// reload by constructing a new provider.
#[derive(Debug, Default, Clone)]
pub struct HtdigestSecrets {
    inner: MemorySecrets,
}

impl HtdigestSecrets {
    /// Parse htdigest file contents
    ///
    /// # Errors
    /// If a line doesn't have exactly three colon-separated fields, or a field is empty
    pub fn parse(contents: &str) -> Result<Self> {
        let mut inner = MemorySecrets::new();

        for (n, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let fields: Vec<&str> = line.split(':').collect();
            match fields.as_slice() {
                [user, realm, ha1] if !user.is_empty() && !ha1.is_empty() => {
                    inner.insert(user, realm, ha1);
                }
                _ => return Err(BadHtdigestLine(n + 1, line.to_string())),
            }
        }

        Ok(HtdigestSecrets { inner })
    }

    /// Read and parse an htdigest file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl SecretProvider for HtdigestSecrets {
    fn secret(&self, username: &str, realm: &str) -> Option<String> {
        self.inner.secret(username, realm)
    }
}
