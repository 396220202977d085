//! Routing.
//!
//! A [`Router`] is assembled with a [`RouterBuilder`] and is immutable afterwards. Paths use the
//! [`matchit`] syntax: `{name}` captures one segment, `{*name}` captures the rest of the path.
//!
//! ```
//! use micro_hx::decorator::with_value;
//! use micro_hx::extract::{Extension, FromPath};
//! use micro_hx::router::{Router, get, post};
//! use micro_hx::{handler_fn, named_value};
//!
//! named_value!(pub UserId = "id");
//!
//! #[derive(Clone)]
//! struct Version(&'static str);
//!
//! async fn show(id: FromPath<UserId>) -> String {
//!     format!("user {id}")
//! }
//!
//! async fn create(Extension(version): Extension<Version>, body: String) -> String {
//!     format!("{} created {body}", version.0)
//! }
//!
//! let router = Router::builder()
//!     .group("/api", |api| {
//!         api.wrap(with_value(Version("v1")))
//!             .route("/users/{id}", get(handler_fn(show)))
//!             .route("/users", post(handler_fn(create)))
//!     })
//!     .static_files("/assets", "./public")
//!     .build()
//!     .unwrap();
//! ```
//!
//! On dispatch an unknown path answers `404 page not found`, a known path whose handlers all reject
//! the request answers `405 Method Not Allowed` with an `Allow` header. Errors returned by handlers
//! go to the [`ErrorHandler`] of the innermost group that set one, else to the router's.

pub mod filter;
mod path;
mod static_files;

pub use path::{clean_path, join_path};
pub use static_files::StaticFiles;

use crate::body::{BoxError, RequestBody, ResponseBody};
use crate::decorator::{Chain, Decorator, Middleware};
use crate::handler::{BoxedHandler, DefaultErrorHandler, ErrorHandler, RequestHandler};
use crate::request::PathParams;
use crate::responder::text_response;
use crate::settings::{JsonCodec, Settings};
use crate::RequestContext;
use bytes::Bytes;
use filter::{AllFilter, Filter, MethodFilter};
use http::{HeaderValue, Method, Request, Response, StatusCode};
use http_body::Body as HttpBody;
use static_files::{FILEPATH_PARAM, not_found};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

type InnerRouter<T> = matchit::Router<T>;

#[derive(Error, Debug)]
pub enum RouterError {
    #[error("invalid route '{path}': {source}")]
    Insert {
        path: String,
        #[source]
        source: matchit::InsertError,
    },
}

/// Main router structure that handles HTTP request routing
pub struct Router {
    inner_router: InnerRouter<Vec<RouterItem>>,
    error_handler: Arc<dyn ErrorHandler>,
    settings: Arc<Settings>,
}

/// A handler registered on a path, with the filter deciding whether it takes a request
pub struct RouterItem {
    method: Method,
    filter: Box<dyn Filter>,
    handler: BoxedHandler,
    error_handler: Option<Arc<dyn ErrorHandler>>,
}

/// Result of matching a route, containing matched items and path parameters
pub struct RouteResult<'router> {
    router_items: &'router [RouterItem],
    params: PathParams,
}

impl Router {
    pub fn builder() -> RouterBuilder {
        RouterBuilder::new()
    }

    /// Matches a path against the router's routes
    pub fn at(&self, path: &str) -> RouteResult<'_> {
        self.inner_router
            .at(path)
            .map(|matched| RouteResult { router_items: matched.value.as_slice(), params: matched.params.into() })
            .map_err(|e| debug!("match '{}' error: {}", path, e))
            .unwrap_or_else(|()| RouteResult::empty())
    }

    /// Dispatches one request.
    ///
    /// Never fails: routing misses become `404`/`405` responses and handler errors are rendered by
    /// the error handler.
    pub async fn handle<B>(&self, request: Request<B>) -> Response<ResponseBody>
    where
        B: HttpBody<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        let (parts, body) = request.into_parts();
        let RouteResult { router_items, params } = self.at(parts.uri.path());
        if router_items.is_empty() {
            return not_found();
        }

        let mut req = RequestContext::new(parts, params, Arc::clone(&self.settings));
        // a route for the request's own method wins over a GET route answering HEAD
        let Some(item) = router_items
            .iter()
            .find(|item| item.method == *req.method() && item.filter.matches(&req))
            .or_else(|| router_items.iter().find(|item| item.filter.matches(&req)))
        else {
            debug!(method = %req.method(), path = req.uri().path(), "no handler accepts the request");
            return method_not_allowed(router_items);
        };

        let mut response = match item.handler.invoke(&mut req, RequestBody::new(body)).await {
            Ok(response) => response,
            Err(err) => item.error_handler.as_deref().unwrap_or(self.error_handler.as_ref()).handle(&req, err),
        };
        if *req.method() == Method::HEAD {
            *response.body_mut() = ResponseBody::empty();
        }
        response
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}

fn method_not_allowed(items: &[RouterItem]) -> Response<ResponseBody> {
    let mut allow = items.iter().map(|item| item.method.as_str()).collect::<BTreeSet<_>>();
    if allow.contains(Method::GET.as_str()) {
        allow.insert("HEAD");
    }
    let mut response = text_response(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed\n".into());
    let headers = response.headers_mut();
    headers.insert(http::header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    // method names are tokens, always a valid header value
    if let Ok(allow) = HeaderValue::from_str(&allow.into_iter().collect::<Vec<_>>().join(", ")) {
        headers.insert(http::header::ALLOW, allow);
    }
    response
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router").field("settings", &self.settings).finish_non_exhaustive()
    }
}

impl RouterItem {
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Gets the filter for this router item
    pub fn filter(&self) -> &dyn Filter {
        self.filter.as_ref()
    }

    /// Gets the request handler for this router item
    pub fn handler(&self) -> &dyn RequestHandler {
        self.handler.as_ref()
    }
}

impl fmt::Debug for RouterItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterItem").field("method", &self.method).finish_non_exhaustive()
    }
}

impl<'router> RouteResult<'router> {
    fn empty() -> Self {
        Self { router_items: &[], params: PathParams::empty() }
    }

    /// Returns true if no routes were matched
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.router_items.is_empty()
    }

    /// Gets the path parameters from the matched route
    pub fn params(&self) -> &PathParams {
        &self.params
    }

    /// Gets the matched router items
    pub fn router_items(&self) -> &'router [RouterItem] {
        self.router_items
    }
}

impl fmt::Debug for RouteResult<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteResult").field("router_items", &self.router_items).field("params", &self.params).finish()
    }
}

/// Collects routes, middleware and settings, then builds a [`Router`].
///
/// Route methods act on the root group, see [`RouterGroup`].
pub struct RouterBuilder {
    root: RouterGroup,
    error_handler: Arc<dyn ErrorHandler>,
    settings: Settings,
}

impl RouterBuilder {
    fn new() -> Self {
        Self { root: RouterGroup::new("/"), error_handler: Arc::new(DefaultErrorHandler), settings: Settings::default() }
    }

    #[must_use]
    pub fn route(mut self, route: impl AsRef<str>, item_builder: RouterItemBuilder) -> Self {
        self.root = self.root.route(route, item_builder);
        self
    }

    #[must_use]
    pub fn wrap<M: Middleware + 'static>(mut self, middleware: M) -> Self {
        self.root = self.root.wrap(middleware);
        self
    }

    #[must_use]
    pub fn group<F>(mut self, prefix: impl AsRef<str>, f: F) -> Self
    where
        F: FnOnce(RouterGroup) -> RouterGroup,
    {
        self.root = self.root.group(prefix, f);
        self
    }

    #[must_use]
    pub fn static_files(mut self, prefix: impl AsRef<str>, root: impl Into<PathBuf>) -> Self {
        self.root = self.root.static_files(prefix, root);
        self
    }

    /// Sets the error handler for every route without a group error handler
    #[must_use]
    pub fn error_handler<E: ErrorHandler + 'static>(mut self, error_handler: E) -> Self {
        self.error_handler = Arc::new(error_handler);
        self
    }

    /// Sets the codec json binding and [`JsonResponse`](crate::responder::JsonResponse) use
    #[must_use]
    pub fn json_codec<C: JsonCodec + 'static>(mut self, codec: C) -> Self {
        self.settings.set_json(Arc::new(codec));
        self
    }

    /// Builds the router from the accumulated routes
    ///
    /// Routes registered on the same path keep their registration order. Fails when a path is
    /// malformed or conflicts with another one.
    pub fn build(self) -> Result<Router, RouterError> {
        let mut paths: Vec<(String, Vec<RouterItem>)> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        for (path, item) in self.root.routes {
            match index.get(&path) {
                Some(&i) => paths[i].1.push(item),
                None => {
                    index.insert(path.clone(), paths.len());
                    paths.push((path, vec![item]));
                }
            }
        }

        let mut inner_router = InnerRouter::new();
        for (path, items) in paths {
            debug!(path, handlers = items.len(), "insert route");
            inner_router.insert(path.clone(), items).map_err(|source| RouterError::Insert { path, source })?;
        }

        Ok(Router { inner_router, error_handler: self.error_handler, settings: Arc::new(self.settings) })
    }
}

impl fmt::Debug for RouterBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterBuilder").field("root", &self.root).finish_non_exhaustive()
    }
}

/// A scope of routes sharing a path prefix, middleware and an optional error handler.
///
/// Middleware is applied when a route is registered, so [`RouterGroup::wrap`] only affects routes
/// registered after it. A nested group starts with a copy of its parent's middleware and error
/// handler, whatever it adds stays inside the nested group.
pub struct RouterGroup {
    base_path: String,
    middlewares: Chain,
    error_handler: Option<Arc<dyn ErrorHandler>>,
    routes: Vec<(String, RouterItem)>,
}

impl RouterGroup {
    fn new(base_path: impl Into<String>) -> Self {
        Self { base_path: base_path.into(), middlewares: Chain::default(), error_handler: None, routes: Vec::new() }
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    #[must_use]
    pub fn route(mut self, route: impl AsRef<str>, item_builder: RouterItemBuilder) -> Self {
        let path = path::route_path(&self.base_path, route.as_ref());
        let item = item_builder.build(&self.middlewares, self.error_handler.clone());
        debug!(method = %item.method, path, "register route");
        self.routes.push((path, item));
        self
    }

    /// Appends middleware to this scope, the first added is the outermost
    #[must_use]
    pub fn wrap<M: Middleware + 'static>(mut self, middleware: M) -> Self {
        self.middlewares.push(Arc::new(middleware));
        self
    }

    #[must_use]
    pub fn group<F>(mut self, prefix: impl AsRef<str>, f: F) -> Self
    where
        F: FnOnce(RouterGroup) -> RouterGroup,
    {
        let child = RouterGroup {
            base_path: path::group_path(&self.base_path, prefix.as_ref()),
            middlewares: self.middlewares.clone(),
            error_handler: self.error_handler.clone(),
            routes: Vec::new(),
        };
        self.routes.extend(f(child).routes);
        self
    }

    /// Serves the files below `root` on `GET {prefix}/{*filepath}`
    #[must_use]
    pub fn static_files(self, prefix: impl AsRef<str>, root: impl Into<PathBuf>) -> Self {
        let route = format!("{}/{{*{FILEPATH_PARAM}}}", prefix.as_ref().trim_end_matches('/'));
        self.route(route, get(StaticFiles::new(root)))
    }

    /// Handles the errors of routes registered on this group after this call
    #[must_use]
    pub fn error_handler<E: ErrorHandler + 'static>(mut self, error_handler: E) -> Self {
        self.error_handler = Some(Arc::new(error_handler));
        self
    }
}

impl fmt::Debug for RouterGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterGroup")
            .field("base_path", &self.base_path)
            .field("middlewares", &self.middlewares)
            .field("routes", &self.routes.len())
            .finish_non_exhaustive()
    }
}

macro_rules! method_router_filter {
    ($method:ident, $upper_case_method:ident) => {
        #[doc = concat!("Routes HTTP ", stringify!($upper_case_method), " requests to `handler`.")]
        pub fn $method<H: RequestHandler + 'static>(handler: H) -> RouterItemBuilder {
            on(Method::$upper_case_method, handler)
        }
    };
}

method_router_filter!(get, GET);
method_router_filter!(post, POST);
method_router_filter!(put, PUT);
method_router_filter!(delete, DELETE);
method_router_filter!(head, HEAD);
method_router_filter!(options, OPTIONS);
method_router_filter!(connect, CONNECT);
method_router_filter!(patch, PATCH);
method_router_filter!(trace, TRACE);

/// Routes requests with `method` to `handler`.
///
/// A `GET` route also answers `HEAD` with the body dropped, unless the path has its own `HEAD`
/// route.
pub fn on<H: RequestHandler + 'static>(method: Method, handler: H) -> RouterItemBuilder {
    let mut filters = filter::all_filter();
    filters.and(MethodFilter::new(method.clone()));
    RouterItemBuilder { method, filters, handler: Box::new(handler) }
}

pub struct RouterItemBuilder {
    method: Method,
    filters: AllFilter,
    handler: BoxedHandler,
}

impl RouterItemBuilder {
    /// Adds a filter the request must also match
    #[must_use]
    pub fn with<F: Filter + 'static>(mut self, filter: F) -> Self {
        self.filters.and(filter);
        self
    }

    fn build(self, middlewares: &Chain, error_handler: Option<Arc<dyn ErrorHandler>>) -> RouterItem {
        let handler = if middlewares.is_empty() { self.handler } else { middlewares.decorate(self.handler) };
        RouterItem { method: self.method, filter: Box::new(self.filters), handler, error_handler }
    }
}

impl fmt::Debug for RouterItemBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterItemBuilder").field("method", &self.method).finish_non_exhaustive()
    }
}
