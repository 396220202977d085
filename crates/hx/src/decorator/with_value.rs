use crate::body::{RequestBody, ResponseBody};
use crate::decorator::Decorator;
use crate::handler::{HandlerError, RequestHandler};
use crate::RequestContext;
use async_trait::async_trait;
use http::Response;
use std::fmt;

/// Stores a value in the request extensions before the wrapped handler runs.
///
/// Handlers read it back with [`Extension<T>`](crate::extract::Extension). Values are keyed by type,
/// an inner `with_value` of the same type wins.
///
/// ```
/// use micro_hx::decorator::with_value;
/// use micro_hx::extract::Extension;
/// use micro_hx::handler_fn;
/// use micro_hx::router::{Router, get};
///
/// #[derive(Clone)]
/// struct Tenant(&'static str);
///
/// async fn tenant(Extension(tenant): Extension<Tenant>) -> &'static str {
///     tenant.0
/// }
///
/// let router = Router::builder()
///     .wrap(with_value(Tenant("acme")))
///     .route("/tenant", get(handler_fn(tenant)))
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct WithValue<T> {
    value: T,
}

pub fn with_value<T>(value: T) -> WithValue<T>
where
    T: Clone + Send + Sync + 'static,
{
    WithValue { value }
}

impl<T, H> Decorator<H> for WithValue<T>
where
    T: Clone + Send + Sync + 'static,
    H: RequestHandler,
{
    type Out = WithValueHandler<T, H>;

    fn decorate(&self, raw: H) -> Self::Out {
        WithValueHandler { value: self.value.clone(), inner: raw }
    }
}

pub struct WithValueHandler<T, H> {
    value: T,
    inner: H,
}

impl<T, H> fmt::Debug for WithValueHandler<T, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WithValueHandler").field("value", &std::any::type_name::<T>()).finish_non_exhaustive()
    }
}

#[async_trait]
impl<T, H> RequestHandler for WithValueHandler<T, H>
where
    T: Clone + Send + Sync + 'static,
    H: RequestHandler,
{
    async fn invoke(&self, req: &mut RequestContext, body: RequestBody) -> Result<Response<ResponseBody>, HandlerError> {
        req.extensions_mut().insert(self.value.clone());
        self.inner.invoke(req, body).await
    }
}

#[cfg(test)]
mod tests {
    use super::with_value;
    use crate::decorator::Decorator;
    use crate::extract::Extension;
    use crate::handler::{RequestHandler, handler_fn};
    use crate::RequestContext;
    use bytes::Bytes;
    use http::Request;
    use http_body_util::{BodyExt, Full};

    #[derive(Debug, Clone)]
    struct Region(&'static str);

    async fn region(Extension(region): Extension<Region>) -> &'static str {
        region.0
    }

    #[tokio::test]
    async fn inner_value_wins() {
        let handler = with_value(Region("eu")).decorate(with_value(Region("us")).decorate(handler_fn(region)));

        let (mut req, body) = RequestContext::from_http(Request::new(Full::new(Bytes::new())));
        let response = handler.invoke(&mut req, body).await.unwrap();
        assert_eq!(response.into_body().collect().await.unwrap().to_bytes(), "us");
    }

    #[tokio::test]
    async fn missing_value_fails_extraction() {
        let (mut req, body) = RequestContext::from_http(Request::new(Full::new(Bytes::new())));
        let err = handler_fn(region).invoke(&mut req, body).await.unwrap_err();
        assert!(err.to_string().contains("Region"));
    }
}
