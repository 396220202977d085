//! Typed handlers.
//!
//! A typed handler is a business function `Fn(Req) -> Future<Output = Result<Resp, E>>`. Its request
//! type is any [`FromRequest`]: [`Bind<T>`](crate::binding::Bind) for content-type driven binding,
//! an extractor, a tuple of extractors or `()` for functions that need nothing from the request.
//!
//! The rendering is picked when the handler is registered:
//!
//! ```
//! use micro_hx::binding::{Bind, ExtractFields};
//! use micro_hx::handler::{HandlerError, typed};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Deserialize, Default)]
//! #[serde(default)]
//! struct Hello {
//!     name: String,
//! }
//! impl ExtractFields for Hello {}
//!
//! #[derive(Serialize)]
//! struct Greeting {
//!     message: String,
//! }
//!
//! let handler = typed(|Bind(req): Bind<Hello>| async move {
//!     Ok::<_, HandlerError>(Greeting { message: format!("hello {}", req.name) })
//! })
//! .pipe(|Bind(req): &Bind<Hello>| if req.name.is_empty() { Err("name is required") } else { Ok(()) })
//! .json();
//! ```

use crate::body::{RequestBody, ResponseBody};
use crate::extract::FromRequest;
use crate::handler::{HandlerError, RequestHandler};
use crate::responder::{JsonResponse, Responder, StringResponse, XmlResponse};
use crate::RequestContext;
use async_trait::async_trait;
use http::Response;
use serde::Serialize;
use std::fmt;
use std::marker::PhantomData;

type Pipe<Req> = Box<dyn Fn(&Req) -> Result<(), HandlerError> + Send + Sync>;

/// A business function with its pre-handler steps, waiting for a rendering
pub struct TypedHandler<F, Req> {
    f: F,
    pipes: Vec<Pipe<Req>>,
}

impl<F, Req> fmt::Debug for TypedHandler<F, Req> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedHandler")
            .field("f", &std::any::type_name::<F>())
            .field("pipes", &self.pipes.len())
            .finish()
    }
}

/// Wraps a business function, see the [module docs](self)
pub fn typed<F, Fut, Req, Resp, E>(f: F) -> TypedHandler<F, Req>
where
    F: Fn(Req) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Resp, E>> + Send,
    Req: FromRequest,
    E: Into<HandlerError>,
{
    TypedHandler { f, pipes: Vec::new() }
}

impl<F, Req> TypedHandler<F, Req>
where
    Req: FromRequest,
{
    /// Adds a step that runs on the extracted request before the business function.
    ///
    /// Steps run in the order they were added, the first error skips the rest and the function.
    #[must_use]
    pub fn pipe<P, E>(mut self, step: P) -> Self
    where
        P: Fn(&Req) -> Result<(), E> + Send + Sync + 'static,
        E: Into<HandlerError>,
    {
        self.pipes.push(Box::new(move |req| step(req).map_err(Into::into)));
        self
    }

    /// Renders the response as json with the router's codec
    pub fn json(self) -> Rendered<F, Req, AsJson> {
        Rendered::new(self)
    }

    /// Renders the response as an xml document
    pub fn xml(self) -> Rendered<F, Req, AsXml> {
        Rendered::new(self)
    }

    /// Renders the response as plain text, only for responses convertible into `String`
    pub fn string(self) -> Rendered<F, Req, AsText> {
        Rendered::new(self)
    }

    /// Lets the response render itself
    pub fn render(self) -> Rendered<F, Req, AsIs> {
        Rendered::new(self)
    }
}

/// How a typed handler turns its response value into a [`Responder`]
pub trait Render<T> {
    type Output: Responder;

    fn render(value: T) -> Self::Output;
}

/// Renders with [`JsonResponse`]
#[derive(Debug, Clone, Copy)]
pub struct AsJson;

/// Renders with [`XmlResponse`]
#[derive(Debug, Clone, Copy)]
pub struct AsXml;

/// Renders with [`StringResponse`]
#[derive(Debug, Clone, Copy)]
pub struct AsText;

/// The response is a [`Responder`] already
#[derive(Debug, Clone, Copy)]
pub struct AsIs;

impl<T: Serialize> Render<T> for AsJson {
    type Output = JsonResponse<T>;

    fn render(value: T) -> Self::Output {
        JsonResponse::new(value)
    }
}

impl<T: Serialize> Render<T> for AsXml {
    type Output = XmlResponse<T>;

    fn render(value: T) -> Self::Output {
        XmlResponse::new(value)
    }
}

impl<T: Into<String>> Render<T> for AsText {
    type Output = StringResponse;

    fn render(value: T) -> Self::Output {
        StringResponse::new(value)
    }
}

impl<T: Responder> Render<T> for AsIs {
    type Output = T;

    fn render(value: T) -> Self::Output {
        value
    }
}

/// A typed handler with its rendering chosen, ready to be routed
pub struct Rendered<F, Req, R> {
    handler: TypedHandler<F, Req>,
    _render: PhantomData<fn() -> R>,
}

impl<F, Req, R> Rendered<F, Req, R> {
    fn new(handler: TypedHandler<F, Req>) -> Self {
        Self { handler, _render: PhantomData }
    }
}

impl<F, Req, R> fmt::Debug for Rendered<F, Req, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rendered")
            .field("handler", &self.handler)
            .field("render", &std::any::type_name::<R>())
            .finish()
    }
}

#[async_trait]
impl<F, Fut, Req, Resp, E, R> RequestHandler for Rendered<F, Req, R>
where
    F: Fn(Req) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Resp, E>> + Send + 'static,
    Req: FromRequest + 'static,
    Resp: 'static,
    E: Into<HandlerError> + 'static,
    R: Render<Resp> + 'static,
{
    async fn invoke(&self, req: &mut RequestContext, body: RequestBody) -> Result<Response<ResponseBody>, HandlerError> {
        let request = Req::from_request(req, &body).await.map_err(Into::into)?;
        for pipe in &self.handler.pipes {
            pipe(&request)?;
        }
        let response = (self.handler.f)(request).await.map_err(Into::into)?;
        R::render(response).response_to(req)
    }
}

#[cfg(test)]
mod tests {
    use super::typed;
    use crate::binding::{Bind, ExtractFields};
    use crate::extract::FromQuery;
    use crate::handler::{HandlerError, RequestHandler};
    use crate::responder::StringResponse;
    use crate::{RequestContext, named_value};
    use bytes::Bytes;
    use http::{Method, Request, StatusCode};
    use http_body_util::{BodyExt, Full};
    use serde::{Deserialize, Serialize};
    use std::sync::{Arc, Mutex};

    #[derive(Deserialize, Default, Debug)]
    #[serde(default)]
    struct Hello {
        name: String,
    }

    impl ExtractFields for Hello {}

    #[derive(Serialize)]
    struct Message {
        message: String,
    }

    named_value!(Name = "name");

    async fn invoke<H: RequestHandler>(handler: &H, uri: &str) -> (StatusCode, String) {
        let (mut req, body) =
            RequestContext::from_http(Request::builder().method(Method::GET).uri(uri).body(Full::new(Bytes::new())).unwrap());
        match handler.invoke(&mut req, body).await {
            Ok(response) => {
                let status = response.status();
                let bytes = response.into_body().collect().await.unwrap().to_bytes();
                (status, String::from_utf8(bytes.to_vec()).unwrap())
            }
            Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
        }
    }

    #[tokio::test]
    async fn json_rendering() {
        let handler =
            typed(|_: ()| async { Ok::<_, HandlerError>(Message { message: "hello".into() }) }).json();

        let (status, body) = invoke(&handler, "/").await;
        assert_eq!(status, StatusCode::OK);
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value, serde_json::json!({"message": "hello"}));
    }

    #[tokio::test]
    async fn xml_string_and_self_rendering() {
        let xml = typed(|_: ()| async { Ok::<_, HandlerError>(Message { message: "hi".into() }) }).xml();
        assert_eq!(invoke(&xml, "/").await.1, "<Message><message>hi</message></Message>");

        let text = typed(|name: FromQuery<Name>| async move { Ok::<_, HandlerError>(format!("hi {name}")) }).string();
        assert_eq!(invoke(&text, "/?name=bob").await.1, "hi bob");

        let rendered = typed(|_: ()| async {
            Ok::<_, HandlerError>(StringResponse::new("created").with_status(StatusCode::CREATED))
        })
        .render();
        assert_eq!(invoke(&rendered, "/").await, (StatusCode::CREATED, "created".to_owned()));
    }

    #[tokio::test]
    async fn business_error_is_returned() {
        let handler = typed(|_: ()| async { Err::<String, _>("not allowed") }).string();
        assert_eq!(invoke(&handler, "/").await, (StatusCode::INTERNAL_SERVER_ERROR, "not allowed".to_owned()));
    }

    #[tokio::test]
    async fn pipes_run_in_order_and_abort() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let (first, second, third) = (calls.clone(), calls.clone(), calls.clone());

        let handler = typed(|Bind(req): Bind<Hello>| async move { Ok::<_, HandlerError>(req.name) })
            .pipe(move |_: &Bind<Hello>| {
                first.lock().unwrap().push("first");
                Ok::<_, HandlerError>(())
            })
            .pipe(move |Bind(req): &Bind<Hello>| {
                second.lock().unwrap().push("second");
                if req.name.is_empty() { Err("name is required") } else { Ok(()) }
            })
            .pipe(move |_: &Bind<Hello>| {
                third.lock().unwrap().push("third");
                Ok::<_, HandlerError>(())
            })
            .string();

        assert_eq!(invoke(&handler, "/?name=hx").await, (StatusCode::OK, "hx".to_owned()));
        assert_eq!(*calls.lock().unwrap(), ["first", "second", "third"]);

        calls.lock().unwrap().clear();
        assert_eq!(invoke(&handler, "/").await, (StatusCode::INTERNAL_SERVER_ERROR, "name is required".to_owned()));
        assert_eq!(*calls.lock().unwrap(), ["first", "second"]);
    }
}
