//! Request filters.
//!
//! Several handlers can be registered on one path. On dispatch the router runs the filters of each
//! handler in registration order and invokes the first handler whose filter matches. Method
//! builders such as [`get`](crate::router::get) install a method filter, [`RouterItemBuilder::with`]
//! adds more.
//!
//! # Examples
//!
//! ```
//! use micro_hx::router::filter::{all_filter, any_filter, content_type, get_method, header, post_method};
//!
//! // GET or POST
//! let mut read_or_write = any_filter();
//! read_or_write.or(get_method()).or(post_method());
//!
//! // a json body from an authorized client
//! let mut json_api = all_filter();
//! json_api.and(content_type(mime::APPLICATION_JSON)).and(header("x-api-key", "secret").unwrap());
//! ```
//!
//! [`RouterItemBuilder::with`]: crate::router::RouterItemBuilder::with

use crate::RequestContext;
use http::{HeaderName, HeaderValue, Method};
use mime::Mime;
use std::fmt;

/// Decides whether a request is routed to a handler.
///
/// Filters are shared by every request of the router, hence `Send + Sync`.
pub trait Filter: Send + Sync {
    fn matches(&self, req: &RequestContext) -> bool;
}

struct FnFilter<F>(F);

impl<F: Fn(&RequestContext) -> bool + Send + Sync> Filter for FnFilter<F> {
    fn matches(&self, req: &RequestContext) -> bool {
        (self.0)(req)
    }
}

/// A filter from a closure.
///
/// ```
/// use micro_hx::router::filter::fn_filter;
///
/// let has_query = fn_filter(|req| !req.query().is_empty());
/// ```
pub fn fn_filter<F>(f: F) -> impl Filter
where
    F: Fn(&RequestContext) -> bool + Send + Sync,
{
    FnFilter(f)
}

/// Creates a new OR-composed filter chain.
pub fn any_filter() -> AnyFilter {
    AnyFilter { filters: Vec::new() }
}

/// Matches when any inner filter matches, an empty chain matches everything.
pub struct AnyFilter {
    filters: Vec<Box<dyn Filter>>,
}

impl AnyFilter {
    pub fn or<F: Filter + 'static>(&mut self, filter: F) -> &mut Self {
        self.filters.push(Box::new(filter));
        self
    }
}

impl fmt::Debug for AnyFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyFilter").field("filters", &self.filters.len()).finish()
    }
}

impl Filter for AnyFilter {
    fn matches(&self, req: &RequestContext) -> bool {
        self.filters.is_empty() || self.filters.iter().any(|filter| filter.matches(req))
    }
}

/// Creates a new AND-composed filter chain.
pub fn all_filter() -> AllFilter {
    AllFilter { filters: Vec::new() }
}

/// Matches when every inner filter matches, an empty chain matches everything.
pub struct AllFilter {
    filters: Vec<Box<dyn Filter>>,
}

impl AllFilter {
    pub fn and<F: Filter + 'static>(&mut self, filter: F) -> &mut Self {
        self.filters.push(Box::new(filter));
        self
    }
}

impl fmt::Debug for AllFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AllFilter").field("filters", &self.filters.len()).finish()
    }
}

impl Filter for AllFilter {
    fn matches(&self, req: &RequestContext) -> bool {
        self.filters.iter().all(|filter| filter.matches(req))
    }
}

/// Matches one request method, a `GET` filter also matches `HEAD`.
#[derive(Debug, Clone)]
pub struct MethodFilter(Method);

impl MethodFilter {
    pub fn new(method: Method) -> Self {
        Self(method)
    }

    pub fn method(&self) -> &Method {
        &self.0
    }
}

impl Filter for MethodFilter {
    fn matches(&self, req: &RequestContext) -> bool {
        let method = req.method();
        self.0 == *method || (self.0 == Method::GET && *method == Method::HEAD)
    }
}

macro_rules! method_filter {
    ($method:ident, $upper_case_method:ident) => {
        #[doc = concat!("Creates a filter that matches HTTP ", stringify!($upper_case_method), " requests.")]
        #[inline]
        pub fn $method() -> MethodFilter {
            MethodFilter(Method::$upper_case_method)
        }
    };
}

method_filter!(get_method, GET);
method_filter!(post_method, POST);
method_filter!(put_method, PUT);
method_filter!(delete_method, DELETE);
method_filter!(head_method, HEAD);
method_filter!(options_method, OPTIONS);
method_filter!(connect_method, CONNECT);
method_filter!(patch_method, PATCH);
method_filter!(trace_method, TRACE);

/// Matches requests carrying the header with exactly this value.
///
/// Fails when the name or value is not a valid header name or value.
pub fn header<K, V>(header_name: K, header_value: V) -> Result<HeaderFilter, http::Error>
where
    HeaderName: TryFrom<K>,
    <HeaderName as TryFrom<K>>::Error: Into<http::Error>,
    HeaderValue: TryFrom<V>,
    <HeaderValue as TryFrom<V>>::Error: Into<http::Error>,
{
    let name = HeaderName::try_from(header_name).map_err(Into::into)?;
    let value = HeaderValue::try_from(header_value).map_err(Into::into)?;
    Ok(HeaderFilter(name, value))
}

#[derive(Debug, Clone)]
pub struct HeaderFilter(HeaderName, HeaderValue);

impl Filter for HeaderFilter {
    fn matches(&self, req: &RequestContext) -> bool {
        req.headers().get_all(&self.0).iter().any(|value| *value == self.1)
    }
}

/// Matches requests whose `Content-Type` has this media type, parameters ignored.
pub fn content_type(mime: Mime) -> ContentTypeFilter {
    ContentTypeFilter(mime)
}

#[derive(Debug, Clone)]
pub struct ContentTypeFilter(Mime);

impl Filter for ContentTypeFilter {
    fn matches(&self, req: &RequestContext) -> bool {
        req.content_type()
            .and_then(|value| value.parse::<Mime>().ok())
            .is_some_and(|mime| mime.essence_str().eq_ignore_ascii_case(self.0.essence_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::{Filter, all_filter, any_filter, content_type, fn_filter, get_method, header, post_method};
    use crate::RequestContext;
    use bytes::Bytes;
    use http::{Method, Request};
    use http_body_util::Full;

    fn request(method: Method, headers: &[(&str, &str)]) -> RequestContext {
        let mut builder = Request::builder().method(method).uri("/items?page=1");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        RequestContext::from_http(builder.body(Full::new(Bytes::new())).unwrap()).0
    }

    #[test]
    fn method_and_composition() {
        let get = request(Method::GET, &[]);
        let put = request(Method::PUT, &[]);

        assert!(get_method().matches(&get));
        assert!(get_method().matches(&request(Method::HEAD, &[])));
        assert!(!get_method().matches(&put));
        assert!(!post_method().matches(&request(Method::HEAD, &[])));

        let mut either = any_filter();
        either.or(get_method()).or(post_method());
        assert!(either.matches(&get));
        assert!(!either.matches(&put));

        assert!(all_filter().matches(&put));
        assert!(any_filter().matches(&put));

        let mut both = all_filter();
        both.and(get_method()).and(fn_filter(|req| req.query() == "page=1"));
        assert!(both.matches(&get));
    }

    #[test]
    fn header_filters() {
        let filter = header("x-api-key", "secret").unwrap();
        assert!(filter.matches(&request(Method::GET, &[("X-Api-Key", "secret")])));
        assert!(!filter.matches(&request(Method::GET, &[("X-Api-Key", "other")])));
        assert!(!filter.matches(&request(Method::GET, &[])));

        assert!(header("bad header", "v").is_err());

        let json = content_type(mime::APPLICATION_JSON);
        assert!(json.matches(&request(Method::POST, &[("content-type", "Application/Json; charset=utf-8")])));
        assert!(!json.matches(&request(Method::POST, &[("content-type", "text/plain")])));
    }
}
