//! Glue between [`DigestAuth`](struct.DigestAuth.html) and `http` request handlers.

use crate::config::AUTH_USERNAME_HEADER;
use crate::digest::{AuthOutcome, DigestAuth, DigestRequest};
use crate::secrets::SecretProvider;
use http::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use http::{Request, Response, Uri};
use std::borrow::Cow;
use std::ops::{Deref, DerefMut};
use tracing::warn;

/// A request that passed authentication, together with who sent it
#[derive(Debug)]
pub struct AuthenticatedRequest<B> {
    pub request: Request<B>,
    pub username: String,
}

impl<B> AuthenticatedRequest<B> {
    pub fn into_inner(self) -> Request<B> {
        self.request
    }
}

impl<B> Deref for AuthenticatedRequest<B> {
    type Target = Request<B>;

    fn deref(&self) -> &Request<B> {
        &self.request
    }
}

impl<B> DerefMut for AuthenticatedRequest<B> {
    fn deref_mut(&mut self) -> &mut Request<B> {
        &mut self.request
    }
}

/// Authentication state of a request, for callers that drive the response themselves.
///
/// `response_headers` holds either the `Authentication-Info` header (authenticated) or a
/// fresh challenge (not authenticated); copy them into whatever response gets sent.
#[derive(Debug, Clone, Default)]
pub struct AuthInfo {
    pub authenticated: bool,
    pub username: Option<String>,
    pub response_headers: HeaderMap,
}

impl<S: SecretProvider> DigestAuth<S> {
    /// Run the verifier on an `http` request
    pub fn check_request<B>(&self, request: &Request<B>) -> AuthOutcome {
        let target = request_target(request.uri());
        let digest_request = DigestRequest::with_path(request.method().as_str(), &target, request.uri().path());

        let authorization = request
            .headers()
            .get(&self.config().headers.authorization)
            .and_then(|value| std::str::from_utf8(value.as_bytes()).ok());

        self.check_authorization(&digest_request, authorization)
    }

    /// Issue a challenge and build the "authentication required" response carrying it
    pub fn require_auth<R: From<String>>(&self) -> Response<R> {
        let headers = &self.config().headers;
        let challenge = self.issue_challenge();

        let mut response = Response::new(R::from(headers.unauth_response.clone()));
        *response.status_mut() = headers.unauth_code;
        set_header(response.headers_mut(), CONTENT_TYPE, &headers.unauth_content_type);
        set_header(response.headers_mut(), headers.authenticate.clone(), &challenge.header);
        response
    }

    /// Protect `handler`: it only runs for authenticated requests and receives the username.
    ///
    /// Everything else gets a challenge.
    pub fn wrap<'a, B, R, F>(&'a self, handler: F) -> impl Fn(Request<B>) -> Response<R> + 'a
    where
        F: Fn(AuthenticatedRequest<B>) -> Response<R> + 'a,
        R: From<String> + 'a,
        B: 'a,
    {
        move |request: Request<B>| match self.check_request(&request) {
            AuthOutcome::Accepted { username, auth_info } => {
                let mut response = handler(AuthenticatedRequest { request, username });
                if let Some(info) = auth_info {
                    set_header(response.headers_mut(), self.config().headers.auth_info.clone(), &info);
                }
                response
            }
            AuthOutcome::Rejected => self.require_auth(),
        }
    }

    /// Like [`wrap()`](#method.wrap), for handlers that know nothing about authentication.
    ///
    /// The username is passed in the `X-Authenticated-Username` request header; a value sent
    /// by the client under that name is replaced.
    pub fn just_check<'a, B, R, F>(&'a self, handler: F) -> impl Fn(Request<B>) -> Response<R> + 'a
    where
        F: Fn(Request<B>) -> Response<R> + 'a,
        R: From<String> + 'a,
        B: 'a,
    {
        self.wrap(move |authenticated: AuthenticatedRequest<B>| {
            let AuthenticatedRequest { mut request, username } = authenticated;
            set_header(request.headers_mut(), AUTH_USERNAME_HEADER, &username);
            handler(request)
        })
    }

    /// Check a request and describe the result as a value instead of a response.
    ///
    /// A rejected request registers a new nonce, whose challenge is in the returned headers.
    pub fn authenticate<B>(&self, request: &Request<B>) -> AuthInfo {
        let headers = &self.config().headers;
        let mut info = AuthInfo::default();

        match self.check_request(request) {
            AuthOutcome::Accepted { username, auth_info } => {
                if let Some(value) = auth_info {
                    set_header(&mut info.response_headers, headers.auth_info.clone(), &value);
                }
                info.authenticated = true;
                info.username = Some(username);
            }
            AuthOutcome::Rejected => {
                let challenge = self.issue_challenge();
                set_header(&mut info.response_headers, headers.authenticate.clone(), &challenge.header);
            }
        }

        info
    }
}

/// The request target as the client sent it: path and query for origin-form requests,
/// the whole URI otherwise
fn request_target(uri: &Uri) -> Cow<'_, str> {
    match (uri.scheme(), uri.path_and_query()) {
        (None, Some(path_and_query)) => Cow::Borrowed(path_and_query.as_str()),
        _ => Cow::Owned(uri.to_string()),
    }
}

/// Replace a header. A value that can't be encoded drops the header rather than leaving a stale one.
fn set_header(headers: &mut HeaderMap, name: HeaderName, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(value) => {
            headers.insert(name, value);
        }
        Err(_) => {
            warn!(header = %name, "header value can't be encoded, dropping it");
            headers.remove(name);
        }
    }
}
