//! Request handlers.
//!
//! Everything the router dispatches to is a [`RequestHandler`]. Handlers are usually built from
//! async functions: [`handler_fn`] for functions taking any number of extractors and returning a
//! [`Responder`], and [`typed`] for `Req -> Result<Resp, E>` business functions that pick their
//! rendering when registered.

mod error_handler;
mod typed;

pub use error_handler::{DefaultErrorHandler, ErrorHandler};
pub use typed::{AsIs, AsJson, AsText, AsXml, Render, Rendered, TypedHandler, typed};

use crate::body::{RequestBody, ResponseBody};
use crate::extract::FromRequest;
use crate::fn_trait::FnTrait;
use crate::responder::Responder;
use crate::RequestContext;
use async_trait::async_trait;
use http::Response;
use std::error::Error;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// The error a handler hands to the router's [`ErrorHandler`]
pub type HandlerError = Box<dyn Error + Send + Sync>;

/// A boxed handler, what middleware wraps and the router stores
pub type BoxedHandler = Box<dyn RequestHandler>;

#[async_trait]
pub trait RequestHandler: Send + Sync {
    /// Handles one request.
    ///
    /// `req` is mutable so middleware can store values in its extensions before calling the inner
    /// handler.
    async fn invoke(&self, req: &mut RequestContext, body: RequestBody) -> Result<Response<ResponseBody>, HandlerError>;
}

#[async_trait]
impl<H> RequestHandler for Box<H>
where
    H: RequestHandler + ?Sized,
{
    async fn invoke(&self, req: &mut RequestContext, body: RequestBody) -> Result<Response<ResponseBody>, HandlerError> {
        (**self).invoke(req, body).await
    }
}

#[async_trait]
impl<H> RequestHandler for Arc<H>
where
    H: RequestHandler + ?Sized,
{
    async fn invoke(&self, req: &mut RequestContext, body: RequestBody) -> Result<Response<ResponseBody>, HandlerError> {
        (**self).invoke(req, body).await
    }
}

/// a `FnTrait` holder which represents any async Fn
pub struct FnHandler<F, Args> {
    f: F,
    _phantom: PhantomData<fn(Args)>,
}

impl<F, Args> FnHandler<F, Args>
where
    F: FnTrait<Args>,
{
    fn new(f: F) -> Self {
        Self { f, _phantom: PhantomData }
    }
}

impl<F, Args> fmt::Debug for FnHandler<F, Args> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHandler").field("f", &std::any::type_name::<F>()).finish()
    }
}

/// Turns an async fn whose arguments are all extractors into a handler.
///
/// ```
/// use micro_hx::extract::{FromPath, FromQuery};
/// use micro_hx::{handler_fn, named_value};
///
/// named_value!(pub UserId = "id");
/// named_value!(pub Page = "page");
///
/// async fn show(id: FromPath<UserId>, page: FromQuery<Page>) -> String {
///     format!("{} {}", id.as_str(), page.as_str())
/// }
///
/// let handler = handler_fn(show);
/// ```
pub fn handler_fn<F, Args>(f: F) -> FnHandler<F, Args>
where
    F: FnTrait<Args>,
{
    FnHandler::new(f)
}

#[async_trait]
impl<F, Args> RequestHandler for FnHandler<F, Args>
where
    F: FnTrait<Args>,
    F::Output: Responder,
    Args: FromRequest,
{
    async fn invoke(&self, req: &mut RequestContext, body: RequestBody) -> Result<Response<ResponseBody>, HandlerError> {
        let args = Args::from_request(req, &body).await.map_err(Into::into)?;
        let responder = self.f.call(args).await;
        responder.response_to(req)
    }
}
