//! This crate implements the server side of Digest Auth as specified by IETF RFCs 2617 and 7616.
//! It issues `WWW-Authenticate` challenges, verifies the `Authorization` responses sent back by
//! clients and rejects replayed requests by tracking the nonce count of every issued nonce.
//!
//! Only `qop=auth` is supported. Secrets come from a [`SecretProvider`](trait.SecretProvider.html),
//! which returns either HA1 digests or, with plaintext secrets enabled, passwords.
//!
//! # Examples
//!
//! Basic usage:
//!
//! ```
//! use digest_auth_server::{AuthOutcome, DigestAuth, DigestConfig, DigestRequest, MemorySecrets};
//!
//! // HA1 = MD5("Mufasa:testrealm@host.com:Circle Of Life")
//! let secrets = MemorySecrets::new()
//!     .with("Mufasa", "testrealm@host.com", "939e7578ed9e3c518a452acee763bce9");
//!
//! // The opaque token is random by default; it's fixed here to match the RFC 2617 example.
//! let config = DigestConfig::new("testrealm@host.com")
//!     .with_opaque("5ccc069c403ebaf9f0171e9517f40e41");
//! let auth = DigestAuth::new(config, secrets).unwrap();
//!
//! // A request without credentials gets a challenge. Send `challenge.header` in the
//! // WWW-Authenticate header of a 401 response.
//! let challenge = auth.issue_challenge();
//! assert!(challenge.header.starts_with(r#"Digest realm="testrealm@host.com", nonce=""#));
//!
//! // For the sake of the example, pretend the server issued the nonce from the RFC instead
//! auth.cache().register("dcd98b7102dd2f0e8b11d0f600bfb0c093");
//!
//! let authorization = r#"Digest username="Mufasa", realm="testrealm@host.com", nonce="dcd98b7102dd2f0e8b11d0f600bfb0c093", uri="/dir/index.html", qop=auth, nc=00000001, cnonce="0a4f113b", response="6629fae49393a05397450978507c4ef1", opaque="5ccc069c403ebaf9f0171e9517f40e41""#;
//!
//! let request = DigestRequest::new("GET", "/dir/index.html");
//! let outcome = auth.check_authorization(&request, Some(authorization));
//! assert_eq!(outcome.username(), Some("Mufasa"));
//!
//! // The same nonce count can't be used twice
//! let replay = auth.check_authorization(&request, Some(authorization));
//! assert_eq!(replay, AuthOutcome::Rejected);
//! ```
//!
//! With `http` types, [`DigestAuth::wrap()`](struct.DigestAuth.html#method.wrap) turns a handler
//! into one that challenges unauthenticated requests:
//!
//! ```
//! use digest_auth_server::{AuthenticatedRequest, DigestAuth};
//! use http::{Request, Response, StatusCode};
//!
//! let secrets = |_user: &str, _realm: &str| -> Option<String> { None };
//! let auth = DigestAuth::with_realm("example.org", secrets).unwrap();
//!
//! let handler = auth.wrap(|req: AuthenticatedRequest<()>| {
//!     Response::new(format!("Hello, {}", req.username))
//! });
//!
//! let response = handler(Request::new(()));
//! assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
//! assert!(response.headers().contains_key("www-authenticate"));
//! ```

mod cache;
mod config;
mod digest;
mod enums;
mod error;
mod gate;
mod params;
mod registry;
mod secrets;
mod utils;

pub use error::{Error, Result};

pub use crate::cache::{
    AdvanceError, ClientSession, NonceCache, DEFAULT_CLIENT_CACHE_SIZE, DEFAULT_CLIENT_CACHE_TOLERANCE,
};
pub use crate::config::{DigestConfig, HeaderSet, AUTH_USERNAME_HEADER};
pub use crate::digest::{AuthOutcome, Challenge, DigestAuth, DigestRequest};
pub use crate::enums::*;
pub use crate::gate::{AuthInfo, AuthenticatedRequest};
pub use crate::params::{parse_header_map, AuthParams};
pub use crate::registry::HashRegistry;
pub use crate::secrets::{HtdigestSecrets, MemorySecrets, SecretProvider};

/// Parse an Authorization header value.
/// It's just a convenience method to call [`AuthParams::from_authorization()`](struct.AuthParams.html#method.from_authorization).
pub fn parse(authorization: &str) -> Option<AuthParams> {
    AuthParams::from_authorization(authorization)
}

#[test]
fn test_parse_check() {
    let src = r#"
    Digest
       username="Mufasa",
       realm="http-auth@example.org",
       uri="/dir/index.html",
       algorithm=SHA-256,
       nonce="7ypf/xlj9XXwfDPEoM4URrv/xwf94BcCAzFZH4GiTo0v",
       nc=00000001,
       cnonce="f2/wE4q74E6zIJEtWaHKaf5wv/H5QzzpXusqGemxURZJ",
       qop=auth,
       response="753927fa0e85d155564e2e272a28d1802ca10daf4496794697cf8db5856cb6c1",
       opaque="FQhe/qaU925kfnzjCev0ciny7QMkPqMAFRtzCUYo5tdS"
    "#;

    let params = crate::parse(src).unwrap();
    assert_eq!(params.param("algorithm"), "SHA-256");

    let secrets = MemorySecrets::new().with("Mufasa", "http-auth@example.org", "Circle of Life");
    let config = DigestConfig::new("http-auth@example.org")
        .with_opaque("FQhe/qaU925kfnzjCev0ciny7QMkPqMAFRtzCUYo5tdS")
        .with_algorithm("SHA-256")
        .with_plaintext_secrets(true);
    let auth = DigestAuth::new(config, secrets).unwrap();
    auth.cache().register("7ypf/xlj9XXwfDPEoM4URrv/xwf94BcCAzFZH4GiTo0v");

    let request = DigestRequest::new("GET", "/dir/index.html");
    let outcome = auth.check(&request, &params);

    assert!(outcome.is_accepted());
    assert_eq!(outcome.username(), Some("Mufasa"));
    assert_eq!(auth.check(&request, &params), AuthOutcome::Rejected);
}
