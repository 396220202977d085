use crate::RequestContext;
use crate::body::RequestBody;
use crate::handler::HandlerError;
use async_trait::async_trait;
use std::convert::Infallible;

/// Creates a value from the request.
///
/// Every extractor gets the same shared [`RequestBody`], the body is collected once and cached so
/// several extractors may read it.
#[async_trait]
pub trait FromRequest: Sized + Send {
    type Error: Into<HandlerError> + Send;

    async fn from_request(req: &RequestContext, body: &RequestBody) -> Result<Self, Self::Error>;
}

/// A failed extraction becomes `None`
#[async_trait]
impl<T> FromRequest for Option<T>
where
    T: FromRequest,
{
    type Error = Infallible;

    async fn from_request(req: &RequestContext, body: &RequestBody) -> Result<Self, Self::Error> {
        Ok(T::from_request(req, body).await.ok())
    }
}

/// Hands the extraction error to the handler instead of failing the request
#[async_trait]
impl<T> FromRequest for Result<T, T::Error>
where
    T: FromRequest,
{
    type Error = Infallible;

    async fn from_request(req: &RequestContext, body: &RequestBody) -> Result<Self, Self::Error> {
        Ok(T::from_request(req, body).await)
    }
}

#[async_trait]
impl FromRequest for () {
    type Error = Infallible;

    async fn from_request(_req: &RequestContext, _body: &RequestBody) -> Result<Self, Self::Error> {
        Ok(())
    }
}
