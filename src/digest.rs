use crate::cache::{AdvanceError, NonceCache};
use crate::config::DigestConfig;
use crate::enums::{Algorithm, HashFn, Qop};
use crate::params::AuthParams;
use crate::registry::HashRegistry;
use crate::secrets::SecretProvider;
use crate::utils::{constant_time_eq, random_key};
use crate::Result;
use http::Uri;
use tracing::debug;

//region DigestRequest

/// The parts of an HTTP request the verifier looks at.
///
/// All fields are borrowed; build one per request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DigestRequest<'a> {
    /// HTTP method, e.g. `GET`
    pub method: &'a str,
    /// Request target exactly as received (path and query, or absolute form)
    pub uri: &'a str,
    /// Path component of the request target
    pub path: &'a str,
}

impl<'a> DigestRequest<'a> {
    /// Construct from the method and the raw request target. The path is derived from the target.
    pub fn new(method: &'a str, uri: &'a str) -> Self {
        Self::with_path(method, uri, path_of(uri))
    }

    /// Construct with an explicitly given path
    pub fn with_path(method: &'a str, uri: &'a str, path: &'a str) -> Self {
        DigestRequest { method, uri, path }
    }
}

/// Path of a request target: drops scheme and authority, query and fragment
fn path_of(target: &str) -> &str {
    let end = target.find(|c| c == '?' || c == '#').unwrap_or(target.len());
    let target = &target[..end];

    match target.find("://") {
        Some(i) => {
            let rest = &target[i + 3..];
            rest.find('/').map_or("/", |p| &rest[p..])
        }
        None => target,
    }
}

//endregion

//region AuthOutcome

/// Result of checking a request's credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// No identity established. Deliberately carries no reason.
    Rejected,
    Accepted {
        username: String,
        /// Value for the `Authentication-Info` header (mutual authentication)
        auth_info: Option<String>,
    },
}

impl AuthOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, AuthOutcome::Accepted { .. })
    }

    pub fn username(&self) -> Option<&str> {
        match self {
            AuthOutcome::Accepted { username, .. } => Some(username),
            AuthOutcome::Rejected => None,
        }
    }

    pub fn auth_info(&self) -> Option<&str> {
        match self {
            AuthOutcome::Accepted { auth_info, .. } => auth_info.as_deref(),
            AuthOutcome::Rejected => None,
        }
    }
}

/// Internal cause of a rejection. Only ever logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rejection {
    Malformed,
    Opaque,
    Qop,
    Algorithm,
    Uri,
    Digest,
    NonceCount,
    UnknownNonce,
    Replay,
}

impl Rejection {
    fn as_str(self) -> &'static str {
        match self {
            Rejection::Malformed => "malformed authorization header",
            Rejection::Opaque => "opaque mismatch",
            Rejection::Qop => "unsupported qop",
            Rejection::Algorithm => "unsupported algorithm",
            Rejection::Uri => "uri mismatch",
            Rejection::Digest => "response digest mismatch",
            Rejection::NonceCount => "bad nonce count",
            Rejection::UnknownNonce => "unknown or purged nonce",
            Rejection::Replay => "nonce count replayed",
        }
    }
}

impl From<AdvanceError> for Rejection {
    fn from(e: AdvanceError) -> Self {
        match e {
            AdvanceError::UnknownNonce => Rejection::UnknownNonce,
            AdvanceError::Replayed => Rejection::Replay,
        }
    }
}

//endregion

//region DigestAuth

/// A freshly issued challenge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
    pub nonce: String,
    /// Value for the `WWW-Authenticate` header
    pub header: String,
}

/// Server-side digest authenticator: issues challenges and verifies responses.
///
/// Each instance owns its nonce cache, so independent authenticators never see each
/// other's nonces. All methods take `&self` and may be called from many threads.
pub struct DigestAuth<S> {
    config: DigestConfig,
    secrets: S,
    registry: HashRegistry,
    cache: NonceCache,
}

impl<S: SecretProvider> DigestAuth<S> {
    /// Build an authenticator knowing the built-in algorithms
    ///
    /// # Errors
    /// If the configured algorithm is unknown, or realm/opaque can't be put in a header
    pub fn new(config: DigestConfig, secrets: S) -> Result<Self> {
        Self::with_registry(config, secrets, HashRegistry::default())
    }

    /// Build an authenticator with a custom set of algorithms
    pub fn with_registry(config: DigestConfig, secrets: S, registry: HashRegistry) -> Result<Self> {
        config.validate(&registry)?;

        let cache = NonceCache::new(config.client_cache_size, config.client_cache_tolerance);
        Ok(DigestAuth {
            config,
            secrets,
            registry,
            cache,
        })
    }

    /// Convenience constructor with default settings for `realm`
    pub fn with_realm(realm: &str, secrets: S) -> Result<Self> {
        Self::new(DigestConfig::new(realm), secrets)
    }

    pub fn config(&self) -> &DigestConfig {
        &self.config
    }

    pub fn cache(&self) -> &NonceCache {
        &self.cache
    }

    /// Forget the `count` least recently used nonces
    pub fn purge(&self, count: usize) {
        self.cache.purge(count);
    }

    /// Create and register a new nonce and format the challenge header for it.
    ///
    /// May purge old nonces first if the cache has outgrown its bound.
    pub fn issue_challenge(&self) -> Challenge {
        self.cache.evict_if_needed();

        let nonce = random_key();
        self.cache.register(nonce.as_str());

        let header = format!(
            r#"Digest realm="{realm}", nonce="{nonce}", opaque="{opaque}", algorithm="{algorithm}", qop="{qop}""#,
            realm = self.config.realm,
            nonce = nonce,
            opaque = self.config.opaque,
            algorithm = self.config.algorithm,
            qop = Qop::AUTH,
        );

        debug!(realm = %self.config.realm, "issued digest challenge");
        Challenge { nonce, header }
    }

    /// Check the raw `Authorization` header value of a request. A missing header is rejected.
    pub fn check_authorization(&self, request: &DigestRequest<'_>, authorization: Option<&str>) -> AuthOutcome {
        match authorization.and_then(AuthParams::from_authorization) {
            Some(params) => self.check(request, &params),
            None => Self::reject(Rejection::Malformed),
        }
    }

    /// Verify parsed digest parameters against the request.
    ///
    /// On success the nonce's counter is advanced, so the same response can't be accepted twice.
    pub fn check(&self, request: &DigestRequest<'_>, params: &AuthParams) -> AuthOutcome {
        match self.verify(request, params) {
            Ok(outcome) => outcome,
            Err(reason) => Self::reject(reason),
        }
    }

    fn reject(reason: Rejection) -> AuthOutcome {
        debug!(reason = reason.as_str(), "digest authentication rejected");
        AuthOutcome::Rejected
    }

    fn verify(&self, request: &DigestRequest<'_>, params: &AuthParams) -> std::result::Result<AuthOutcome, Rejection> {
        // RFC 2617 says a missing algorithm means MD5. We always send one,
        // but some clients don't echo it back.
        let algorithm = params.get("algorithm").unwrap_or(Algorithm::MD5.name());

        if params.param("opaque") != self.config.opaque {
            return Err(Rejection::Opaque);
        }
        if params.param("qop") != Qop::AUTH.as_str() {
            return Err(Rejection::Qop);
        }

        let h = self.registry.get(algorithm).ok_or(Rejection::Algorithm)?;

        let uri = params.param("uri");
        if !self.uri_matches(request, uri) {
            return Err(Rejection::Uri);
        }

        let username = params.param("username");
        let nonce = params.param("nonce");
        let nc = params.param("nc");
        let cnonce = params.param("cnonce");
        let qop = params.param("qop");

        let (ha1, known_user) = self.ha1(h, username);
        let ha2 = h(&format!("{}:{}", request.method, uri));
        let expected = h(&[ha1.as_str(), nonce, nc, cnonce, qop, ha2.as_str()].join(":"));

        // unknown users go through the same hashing and comparison
        let matched = constant_time_eq(expected.as_bytes(), params.param("response").as_bytes());
        if !(matched & known_user) {
            return Err(Rejection::Digest);
        }

        // crypto checks passed, now the session

        let nc_value = u64::from_str_radix(nc, 16).map_err(|_| Rejection::NonceCount)?;
        self.cache
            .advance(nonce, nc_value, self.config.ignore_nonce_count)?;

        let rsp_ha2 = h(&format!(":{}", uri));
        let rspauth = h(&[ha1.as_str(), nonce, nc, cnonce, qop, rsp_ha2.as_str()].join(":"));
        let auth_info = format!(
            r#"qop="{qop}", rspauth="{rspauth}", cnonce="{cnonce}", nc="{nc}""#,
            qop = Qop::AUTH,
            rspauth = rspauth,
            cnonce = cnonce,
            nc = nc
        );

        debug!(username = %username, "digest authentication accepted");
        Ok(AuthOutcome::Accepted {
            username: username.to_string(),
            auth_info: Some(auth_info),
        })
    }

    /// HA1 for a user, and whether the user exists at all
    fn ha1(&self, h: HashFn, username: &str) -> (String, bool) {
        let realm = &self.config.realm;
        let secret = self.secrets.secret(username, realm);
        let known = secret.is_some();
        let secret = secret.unwrap_or_default();

        if self.config.plaintext_secrets {
            (h(&format!("{}:{}:{}", username, realm, secret)), known)
        } else {
            (secret, known)
        }
    }

    /// The digest `uri` should be the request target. For compatibility with old clients a
    /// URI whose path is a prefix of the request path is also accepted, unless `strict_uri` is set.
    fn uri_matches(&self, request: &DigestRequest<'_>, uri: &str) -> bool {
        if request.uri == uri {
            return true;
        }
        if self.config.strict_uri {
            return false;
        }

        match uri.parse::<Uri>() {
            Ok(parsed) => request.path.starts_with(parsed.path()),
            Err(_) => false,
        }
    }
}

//endregion

//region TESTS


//endregion
