use crate::binding::{BindError, Binder, parse_form};
use crate::body::RequestBody;
use crate::extract::{Form, FormValues, FromRequest, Json, Xml};
use crate::RequestContext;
use async_trait::async_trait;
use bytes::Bytes;
use serde::de::DeserializeOwned;

#[async_trait]
impl FromRequest for Bytes {
    type Error = BindError;

    async fn from_request(_req: &RequestContext, body: &RequestBody) -> Result<Self, Self::Error> {
        body.bytes().await
    }
}

#[async_trait]
impl FromRequest for String {
    type Error = BindError;

    async fn from_request(_req: &RequestContext, body: &RequestBody) -> Result<Self, Self::Error> {
        let bytes = body.bytes().await?;
        String::from_utf8(bytes.into()).map_err(|e| BindError::Body(format!("request body is not utf8: {}", e.utf8_error())))
    }
}

/// Decodes with the router's json codec, whatever the `Content-Type`
#[async_trait]
impl<T> FromRequest for Json<T>
where
    T: DeserializeOwned + Send,
{
    type Error = BindError;

    async fn from_request(req: &RequestContext, body: &RequestBody) -> Result<Self, Self::Error> {
        Binder::Json.bind(req, body).await.map(Json)
    }
}

#[async_trait]
impl<T> FromRequest for Xml<T>
where
    T: DeserializeOwned + Send,
{
    type Error = BindError;

    async fn from_request(req: &RequestContext, body: &RequestBody) -> Result<Self, Self::Error> {
        Binder::Xml.bind(req, body).await.map(Xml)
    }
}

#[async_trait]
impl<T> FromRequest for Form<T>
where
    T: DeserializeOwned + Send,
{
    type Error = BindError;

    async fn from_request(req: &RequestContext, body: &RequestBody) -> Result<Self, Self::Error> {
        Binder::Form.bind(req, body).await.map(Form)
    }
}

#[async_trait]
impl FromRequest for FormValues {
    type Error = BindError;

    async fn from_request(req: &RequestContext, body: &RequestBody) -> Result<Self, Self::Error> {
        Ok(FormValues(parse_form(req, body).await?.merged()))
    }
}
