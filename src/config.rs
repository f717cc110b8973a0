//! Authenticator settings.

use crate::cache::{DEFAULT_CLIENT_CACHE_SIZE, DEFAULT_CLIENT_CACHE_TOLERANCE};
use crate::enums::Algorithm;
use crate::registry::HashRegistry;
use crate::utils::{is_quotable, random_key};
use crate::{Error::*, Result};
use http::header::{self, HeaderName};
use http::StatusCode;

/// Request header carrying the authenticated username to handlers behind
/// [`DigestAuth::just_check()`](struct.DigestAuth.html#method.just_check)
pub const AUTH_USERNAME_HEADER: HeaderName = HeaderName::from_static("x-authenticated-username");

/// Header names and the unauthenticated response, for either an origin server or a proxy
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderSet {
    /// Challenge header (`WWW-Authenticate`)
    pub authenticate: HeaderName,
    /// Client response header (`Authorization`)
    pub authorization: HeaderName,
    /// Mutual authentication header (`Authentication-Info`)
    pub auth_info: HeaderName,
    pub unauth_code: StatusCode,
    pub unauth_content_type: String,
    pub unauth_response: String,
}

impl HeaderSet {
    /// Headers for an origin server
    pub fn normal() -> Self {
        HeaderSet {
            authenticate: header::WWW_AUTHENTICATE,
            authorization: header::AUTHORIZATION,
            auth_info: HeaderName::from_static("authentication-info"),
            unauth_code: StatusCode::UNAUTHORIZED,
            unauth_content_type: "text/plain".to_string(),
            unauth_response: "401 Unauthorized\n".to_string(),
        }
    }

    /// Headers for a proxy server
    pub fn proxy() -> Self {
        HeaderSet {
            authenticate: header::PROXY_AUTHENTICATE,
            authorization: header::PROXY_AUTHORIZATION,
            auth_info: HeaderName::from_static("proxy-authentication-info"),
            unauth_code: StatusCode::PROXY_AUTHENTICATION_REQUIRED,
            unauth_content_type: "text/plain".to_string(),
            unauth_response: "407 Proxy Authentication Required\n".to_string(),
        }
    }
}

impl Default for HeaderSet {
    fn default() -> Self {
        HeaderSet::normal()
    }
}

/// Settings of a [`DigestAuth`](struct.DigestAuth.html). Frozen once the authenticator is built.
#[derive(Debug, Clone)]
pub struct DigestConfig {
    /// Protection space presented to the client and bound into HA1
    pub realm: String,
    /// Token the client must echo back unchanged
    pub opaque: String,
    /// Algorithm announced in challenges
    pub algorithm: String,
    /// Secrets are passwords rather than HA1 digests
    pub plaintext_secrets: bool,
    /// Disable replay protection: accept any `nc`
    pub ignore_nonce_count: bool,
    /// Require the digest `uri` to equal the request URI, without the path-prefix fallback
    pub strict_uri: bool,
    pub headers: HeaderSet,
    /// Approximate number of tracked nonces
    pub client_cache_size: usize,
    /// How far the cache may outgrow `client_cache_size` before a purge
    pub client_cache_tolerance: usize,
}

impl DigestConfig {
    /// Defaults: random opaque, MD5, normal headers, 1000 nonces with tolerance 100.
    pub fn new(realm: &str) -> Self {
        DigestConfig {
            realm: realm.to_string(),
            opaque: random_key(),
            // NOT RECOMMENDED by RFC 7616, but the only one most clients know
            algorithm: Algorithm::MD5.name().to_string(),
            plaintext_secrets: false,
            ignore_nonce_count: false,
            strict_uri: false,
            headers: HeaderSet::normal(),
            client_cache_size: DEFAULT_CLIENT_CACHE_SIZE,
            client_cache_tolerance: DEFAULT_CLIENT_CACHE_TOLERANCE,
        }
    }

    pub fn with_opaque(mut self, opaque: &str) -> Self {
        self.opaque = opaque.to_string();
        self
    }

    pub fn with_algorithm(mut self, algorithm: &str) -> Self {
        self.algorithm = algorithm.to_string();
        self
    }

    pub fn with_plaintext_secrets(mut self, plaintext: bool) -> Self {
        self.plaintext_secrets = plaintext;
        self
    }

    pub fn with_ignore_nonce_count(mut self, ignore: bool) -> Self {
        self.ignore_nonce_count = ignore;
        self
    }

    pub fn with_strict_uri(mut self, strict: bool) -> Self {
        self.strict_uri = strict;
        self
    }

    pub fn with_headers(mut self, headers: HeaderSet) -> Self {
        self.headers = headers;
        self
    }

    /// Shortcut for `with_headers(HeaderSet::proxy())`
    pub fn for_proxy(self) -> Self {
        self.with_headers(HeaderSet::proxy())
    }

    pub fn with_client_cache(mut self, size: usize, tolerance: usize) -> Self {
        self.client_cache_size = size;
        self.client_cache_tolerance = tolerance;
        self
    }

    /// Check that the settings can produce well-formed challenges with `registry`
    pub fn validate(&self, registry: &HashRegistry) -> Result<()> {
        registry.resolve(&self.algorithm)?;
        if !is_quotable(&self.realm) {
            return Err(InvalidConfig(format!("realm {:?} can't be quoted", self.realm)));
        }
        if self.opaque.is_empty() || !is_quotable(&self.opaque) {
            return Err(InvalidConfig(format!("opaque {:?} can't be quoted", self.opaque)));
        }
        if !is_quotable(&self.algorithm) {
            return Err(InvalidConfig(format!("algorithm {:?} can't be quoted", self.algorithm)));
        }
        if self.client_cache_size == 0 {
            return Err(InvalidConfig("client cache size must not be zero".into()));
        }
        let too_large = self.client_cache_size.checked_add(self.client_cache_tolerance).is_none()
            || self.client_cache_tolerance.checked_mul(2).is_none();
        if too_large {
            return Err(InvalidConfig("client cache size and tolerance are too large".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_defaults() {
        let a = DigestConfig::new("example.org");
        let b = DigestConfig::new("example.org");

        assert_eq!(a.realm, "example.org");
        assert_eq!(a.algorithm, "MD5");
        assert_eq!(a.opaque.len(), 32);
        assert_ne!(a.opaque, b.opaque);
        assert_eq!(a.headers, HeaderSet::normal());
        assert_eq!(a.client_cache_size, 1000);
        assert_eq!(a.client_cache_tolerance, 100);
        assert!(!a.plaintext_secrets && !a.ignore_nonce_count && !a.strict_uri);
        assert_eq!(a.validate(&HashRegistry::default()), Ok(()));
    }

    #[test]
    fn test_header_sets() {
        let normal = HeaderSet::normal();
        assert_eq!(normal.authenticate, "www-authenticate");
        assert_eq!(normal.authorization, "authorization");
        assert_eq!(normal.auth_info, "authentication-info");
        assert_eq!(normal.unauth_code.as_u16(), 401);

        let proxy = DigestConfig::new("r").for_proxy().headers;
        assert_eq!(proxy.authenticate, "proxy-authenticate");
        assert_eq!(proxy.authorization, "proxy-authorization");
        assert_eq!(proxy.auth_info, "proxy-authentication-info");
        assert_eq!(proxy.unauth_code.as_u16(), 407);
        assert_eq!(proxy.unauth_response, "407 Proxy Authentication Required\n");
    }

    #[test]
    fn test_validate() {
        let registry = HashRegistry::default();

        let cfg = DigestConfig::new("r").with_algorithm("sha-256");
        assert_eq!(cfg.validate(&registry), Ok(()));

        let cfg = DigestConfig::new("r").with_algorithm("SHA-1");
        assert_eq!(cfg.validate(&registry), Err(Error::UnknownAlgorithm("SHA-1".into())));

        let cfg = DigestConfig::new("bad \"realm\"");
        assert!(matches!(cfg.validate(&registry), Err(Error::InvalidConfig(_))));

        let cfg = DigestConfig::new("r").with_opaque("");
        assert!(matches!(cfg.validate(&registry), Err(Error::InvalidConfig(_))));

        let cfg = DigestConfig::new("r").with_client_cache(0, 10);
        assert!(matches!(cfg.validate(&registry), Err(Error::InvalidConfig(_))));

        let cfg = DigestConfig::new("r").with_client_cache(usize::MAX, 1);
        assert!(matches!(cfg.validate(&registry), Err(Error::InvalidConfig(_))));

        let cfg = DigestConfig::new("r").with_client_cache(10, usize::MAX);
        assert!(matches!(cfg.validate(&registry), Err(Error::InvalidConfig(_))));

        // no slack at all still keeps the cache bounded
        let cfg = DigestConfig::new("r").with_client_cache(10, 0);
        assert_eq!(cfg.validate(&registry), Ok(()));
    }
}
