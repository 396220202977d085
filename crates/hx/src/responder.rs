//! Response handling module that converts handler results into HTTP responses.
//!
//! This module provides the [`Responder`] trait which defines how different types
//! can be converted into HTTP responses. It includes implementations for common types
//! like Result, Option, String, etc., and the rendered responses typed handlers produce:
//! [`JsonResponse`], [`XmlResponse`], [`StringResponse`] and [`HtmlResponse`].
//!
//! Rendering can fail (a value that does not serialize, a template error). Such failures are
//! returned as [`RenderError`]s boxed into a [`HandlerError`] and reach the router's error handler
//! like any other handler error.

mod render;

pub use render::{HtmlResponse, JsonResponse, RenderError, StringResponse, XmlResponse};

use crate::body::ResponseBody;
use crate::handler::HandlerError;
use crate::RequestContext;
use http::{HeaderValue, Response, StatusCode};
use std::convert::Infallible;

/// A trait for types that can be converted into HTTP responses.
///
/// Types implementing this trait can be returned directly from request handlers
/// and will be automatically converted into HTTP responses.
pub trait Responder {
    fn response_to(self, req: &RequestContext) -> Result<Response<ResponseBody>, HandlerError>;
}

/// The `Err` variant is handed to the error handler instead of being rendered
impl<T, E> Responder for Result<T, E>
where
    T: Responder,
    E: Into<HandlerError>,
{
    fn response_to(self, req: &RequestContext) -> Result<Response<ResponseBody>, HandlerError> {
        match self {
            Ok(t) => t.response_to(req),
            Err(e) => Err(e.into()),
        }
    }
}

/// None case returns an empty response.
impl<T: Responder> Responder for Option<T> {
    fn response_to(self, req: &RequestContext) -> Result<Response<ResponseBody>, HandlerError> {
        match self {
            Some(t) => t.response_to(req),
            None => Ok(Response::new(ResponseBody::empty())),
        }
    }
}

/// Passes pre-built responses through, converting the body.
impl<B> Responder for Response<B>
where
    B: Into<ResponseBody>,
{
    fn response_to(self, _req: &RequestContext) -> Result<Response<ResponseBody>, HandlerError> {
        Ok(self.map(Into::into))
    }
}

/// Overrides the status code of the inner responder.
impl<T: Responder> Responder for (StatusCode, T) {
    fn response_to(self, req: &RequestContext) -> Result<Response<ResponseBody>, HandlerError> {
        let (status, responder) = self;
        let mut response = responder.response_to(req)?;
        *response.status_mut() = status;
        Ok(response)
    }
}

/// Same as above but with reversed order.
impl<T: Responder> Responder for (T, StatusCode) {
    fn response_to(self, req: &RequestContext) -> Result<Response<ResponseBody>, HandlerError> {
        let (responder, status) = self;
        (status, responder).response_to(req)
    }
}

impl<T: Responder> Responder for Box<T> {
    fn response_to(self, req: &RequestContext) -> Result<Response<ResponseBody>, HandlerError> {
        (*self).response_to(req)
    }
}

/// An empty `200 OK`.
impl Responder for () {
    fn response_to(self, _req: &RequestContext) -> Result<Response<ResponseBody>, HandlerError> {
        Ok(Response::new(ResponseBody::empty()))
    }
}

impl Responder for &'static str {
    fn response_to(self, _req: &RequestContext) -> Result<Response<ResponseBody>, HandlerError> {
        Ok(text_response(StatusCode::OK, ResponseBody::from(self)))
    }
}

impl Responder for String {
    fn response_to(self, _req: &RequestContext) -> Result<Response<ResponseBody>, HandlerError> {
        Ok(text_response(StatusCode::OK, ResponseBody::from(self)))
    }
}

impl Responder for Infallible {
    fn response_to(self, _req: &RequestContext) -> Result<Response<ResponseBody>, HandlerError> {
        match self {}
    }
}

pub(crate) fn text_response(status: StatusCode, body: ResponseBody) -> Response<ResponseBody> {
    with_content_type(status, HeaderValue::from_static("text/plain; charset=utf-8"), body)
}

pub(crate) fn with_content_type(status: StatusCode, content_type: HeaderValue, body: ResponseBody) -> Response<ResponseBody> {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    response.headers_mut().insert(http::header::CONTENT_TYPE, content_type);
    response
}

#[cfg(test)]
mod tests {
    use super::Responder;
    use crate::handler::HandlerError;
    use crate::RequestContext;
    use bytes::Bytes;
    use http::{Request, Response, StatusCode};
    use http_body_util::{BodyExt, Full};

    fn context() -> RequestContext {
        RequestContext::from_http(Request::new(Full::new(Bytes::new()))).0
    }

    #[tokio::test]
    async fn plain_responders() {
        let req = context();

        let response = "hello".response_to(&req).unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[http::header::CONTENT_TYPE], "text/plain; charset=utf-8");
        assert_eq!(response.into_body().collect().await.unwrap().to_bytes(), "hello");

        let response = (StatusCode::CREATED, String::from("made")).response_to(&req).unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = ((), StatusCode::NO_CONTENT).response_to(&req).unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response.into_body().collect().await.unwrap().to_bytes().is_empty());

        let response = None::<String>.response_to(&req).unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let prebuilt = Response::builder().status(StatusCode::ACCEPTED).body("raw").unwrap();
        assert_eq!(Box::new(prebuilt).response_to(&req).unwrap().status(), StatusCode::ACCEPTED);
    }

    #[test]
    fn err_is_not_rendered() {
        let result: Result<String, HandlerError> = Err("boom".into());
        let err = result.response_to(&context()).unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }
}
