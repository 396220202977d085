//! Request handling module that provides access to HTTP request information and path parameters.
//!
//! This module contains the core types for working with HTTP requests:
//! - `RequestContext`: Provides access to request parts, path parameters and router settings
//! - `PathParams`: Holds the URL path parameters captured by the route pattern
//! - `Cookie`: A single `name=value` pair parsed from the `Cookie` headers

use crate::body::RequestBody;
use crate::settings::Settings;
use bytes::Bytes;
use http::request::Parts;
use http::{Extensions, HeaderMap, Method, Request, Uri, Version};
use http_body::Body as HttpBody;
use matchit::Params;
use percent_encoding::percent_decode_str;
use std::error::Error;
use std::sync::Arc;

/// Represents the context of an HTTP request: the request head, the path parameters captured by
/// the matched route and the settings of the router that dispatched it.
#[derive(Debug)]
pub struct RequestContext {
    parts: Parts,
    path_params: PathParams,
    settings: Arc<Settings>,
}

impl RequestContext {
    /// Creates a new RequestContext from the request head and the matched path parameters
    pub fn new(parts: Parts, path_params: PathParams, settings: Arc<Settings>) -> Self {
        Self { parts, path_params, settings }
    }

    /// Splits a request into a context with default settings and its body.
    ///
    /// Handy for driving handlers without a router, the context carries no path parameters
    /// until [`RequestContext::with_path_params`] is called.
    pub fn from_http<B>(request: Request<B>) -> (Self, RequestBody)
    where
        B: HttpBody<Data = Bytes> + Send + 'static,
        B::Error: Into<Box<dyn Error + Send + Sync>>,
    {
        let (parts, body) = request.into_parts();
        (Self::new(parts, PathParams::empty(), Arc::new(Settings::default())), RequestBody::new(body))
    }

    #[must_use]
    pub fn with_path_params(mut self, path_params: PathParams) -> Self {
        self.path_params = path_params;
        self
    }

    /// Returns the HTTP method of the request
    pub fn method(&self) -> &Method {
        &self.parts.method
    }

    /// Returns the URI of the request
    pub fn uri(&self) -> &Uri {
        &self.parts.uri
    }

    /// Returns the HTTP version of the request
    pub fn version(&self) -> Version {
        self.parts.version
    }

    /// Returns the HTTP headers of the request
    pub fn headers(&self) -> &HeaderMap {
        &self.parts.headers
    }

    /// Returns a reference to the path parameters extracted from the request URL
    pub fn path_params(&self) -> &PathParams {
        &self.path_params
    }

    pub fn extensions(&self) -> &Extensions {
        &self.parts.extensions
    }

    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.parts.extensions
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The raw query string, without the leading `?`
    pub fn query(&self) -> &str {
        self.parts.uri.query().unwrap_or_default()
    }

    /// The `Content-Type` header, if present and valid visible ascii
    pub fn content_type(&self) -> Option<&str> {
        self.parts.headers.get(http::header::CONTENT_TYPE).and_then(|value| value.to_str().ok())
    }

    /// Parses every cookie sent with the request, in header order
    pub fn cookies(&self) -> Vec<Cookie> {
        self.parts
            .headers
            .get_all(http::header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|line| line.split(';'))
            .filter_map(Cookie::parse)
            .collect()
    }

    /// Returns the first cookie with the given name
    pub fn cookie(&self, name: &str) -> Option<Cookie> {
        self.cookies().into_iter().find(|cookie| cookie.name == name)
    }
}

/// A cookie sent by the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    name: String,
    value: String,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { name: name.into(), value: value.into() }
    }

    fn parse(pair: &str) -> Option<Self> {
        let (name, value) = pair.trim().split_once('=')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        let value = value.trim();
        let value = value.strip_prefix('"').and_then(|v| v.strip_suffix('"')).unwrap_or(value);
        Some(Self::new(name, value))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Represents path parameters extracted from the URL path of an HTTP request.
///
/// Path parameters are named segments in the URL path that can be extracted and accessed
/// by name. For example, in the path "/users/{id}", "id" is a path parameter. Values are
/// percent-decoded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams {
    params: Vec<(String, String)>,
}

impl PathParams {
    /// Creates an empty PathParams instance with no parameters
    #[inline]
    pub fn empty() -> Self {
        Self { params: Vec::new() }
    }

    /// Returns true if there are no path parameters
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Returns the number of path parameters
    #[inline]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Gets the value of a path parameter by its name
    /// Returns None if the parameter doesn't exist
    pub fn get(&self, key: impl AsRef<str>) -> Option<&str> {
        let key = key.as_ref();
        self.params.iter().find(|(name, _)| name == key).map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

impl From<Params<'_, '_>> for PathParams {
    fn from(params: Params<'_, '_>) -> Self {
        let params = params
            .iter()
            .map(|(name, value)| (name.to_owned(), percent_decode_str(value).decode_utf8_lossy().into_owned()))
            .collect();
        Self { params }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PathParams {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self { params: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect() }
    }
}

#[cfg(test)]
mod tests {
    use super::{Cookie, PathParams, RequestContext};
    use http::Request;
    use http_body_util::Empty;
    use bytes::Bytes;

    fn context(request: Request<()>) -> RequestContext {
        let (parts, ()) = request.into_parts();
        RequestContext::from_http(Request::from_parts(parts, Empty::<Bytes>::new())).0
    }

    #[test]
    fn path_params_are_percent_decoded() {
        let mut router = matchit::Router::new();
        router.insert("/users/{name}", ()).unwrap();
        let matched = router.at("/users/j%C3%B6rg%20m").unwrap();

        let params = PathParams::from(matched.params);
        assert_eq!(params.len(), 1);
        assert_eq!(params.get("name"), Some("jörg m"));
        assert_eq!(params.get("missing"), None);
    }

    #[test]
    fn cookies_are_parsed_from_every_header() {
        let req = context(
            Request::builder()
                .header(http::header::COOKIE, "session=abc; theme=\"dark\"")
                .header(http::header::COOKIE, "lang=en; broken")
                .body(())
                .unwrap(),
        );

        assert_eq!(
            req.cookies(),
            vec![Cookie::new("session", "abc"), Cookie::new("theme", "dark"), Cookie::new("lang", "en")]
        );
        assert_eq!(req.cookie("lang").map(|c| c.value().to_owned()), Some("en".to_owned()));
        assert_eq!(req.cookie("missing"), None);
    }

    #[test]
    fn query_and_content_type() {
        let req = context(
            Request::builder()
                .uri("/search?q=rust&page=2")
                .header(http::header::CONTENT_TYPE, "application/json")
                .body(())
                .unwrap(),
        );

        assert_eq!(req.query(), "q=rust&page=2");
        assert_eq!(req.content_type(), Some("application/json"));
        assert!(req.path_params().is_empty());
    }
}
