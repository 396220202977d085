use crate::body::ResponseBody;
use crate::handler::HandlerError;
use crate::responder::text_response;
use crate::RequestContext;
use http::{HeaderValue, Response, StatusCode};
use tracing::warn;

/// Turns a handler error into the response sent to the client.
///
/// Any `Fn(&RequestContext, HandlerError) -> Response<ResponseBody>` is an error handler.
pub trait ErrorHandler: Send + Sync {
    fn handle(&self, req: &RequestContext, err: HandlerError) -> Response<ResponseBody>;
}

impl<F> ErrorHandler for F
where
    F: Fn(&RequestContext, HandlerError) -> Response<ResponseBody> + Send + Sync,
{
    fn handle(&self, req: &RequestContext, err: HandlerError) -> Response<ResponseBody> {
        (self)(req, err)
    }
}

/// `500 Internal Server Error` with the error text as a plain text body
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultErrorHandler;

impl ErrorHandler for DefaultErrorHandler {
    fn handle(&self, req: &RequestContext, err: HandlerError) -> Response<ResponseBody> {
        warn!(method = %req.method(), path = req.uri().path(), error = %err, "request handler failed");

        let mut response = text_response(StatusCode::INTERNAL_SERVER_ERROR, format!("{err}\n").into());
        response.headers_mut().insert(http::header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
        response
    }
}
