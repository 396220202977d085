use crate::binding::BindError;
use crate::body::RequestBody;
use crate::extract::{Cookies, Extension, FromRequest, Headers};
use crate::RequestContext;
use async_trait::async_trait;
use http::{HeaderMap, Method, Uri, Version};
use std::convert::Infallible;

#[async_trait]
impl FromRequest for Method {
    type Error = Infallible;

    async fn from_request(req: &RequestContext, _body: &RequestBody) -> Result<Self, Self::Error> {
        Ok(req.method().clone())
    }
}

#[async_trait]
impl FromRequest for Uri {
    type Error = Infallible;

    async fn from_request(req: &RequestContext, _body: &RequestBody) -> Result<Self, Self::Error> {
        Ok(req.uri().clone())
    }
}

#[async_trait]
impl FromRequest for Version {
    type Error = Infallible;

    async fn from_request(req: &RequestContext, _body: &RequestBody) -> Result<Self, Self::Error> {
        Ok(req.version())
    }
}

#[async_trait]
impl FromRequest for HeaderMap {
    type Error = Infallible;

    async fn from_request(req: &RequestContext, _body: &RequestBody) -> Result<Self, Self::Error> {
        Ok(req.headers().clone())
    }
}

#[async_trait]
impl FromRequest for Headers {
    type Error = Infallible;

    async fn from_request(req: &RequestContext, _body: &RequestBody) -> Result<Self, Self::Error> {
        Ok(Headers(req.headers().clone()))
    }
}

#[async_trait]
impl FromRequest for Cookies {
    type Error = Infallible;

    async fn from_request(req: &RequestContext, _body: &RequestBody) -> Result<Self, Self::Error> {
        Ok(Cookies(req.cookies()))
    }
}

#[async_trait]
impl<T> FromRequest for Extension<T>
where
    T: Clone + Send + Sync + 'static,
{
    type Error = BindError;

    async fn from_request(req: &RequestContext, _body: &RequestBody) -> Result<Self, Self::Error> {
        req.extensions()
            .get::<T>()
            .cloned()
            .map(Extension)
            .ok_or(BindError::MissingExtension { type_name: std::any::type_name::<T>() })
    }
}
