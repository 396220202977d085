use crate::body::ResponseBody;
use crate::handler::HandlerError;
use crate::responder::{Responder, text_response, with_content_type};
use crate::settings::CodecError;
use crate::RequestContext;
use http::{HeaderValue, Response, StatusCode};
use minijinja::Environment;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

/// Failures while rendering a response body
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("json encoding failed: {0}")]
    Json(#[source] CodecError),

    #[error("xml encoding failed: {0}")]
    Xml(String),

    #[error("template rendering failed: {0}")]
    Template(#[from] minijinja::Error),
}

/// Serializes `data` with the router's json codec.
///
/// The body ends with a newline.
#[derive(Debug, Clone)]
pub struct JsonResponse<T> {
    data: T,
    status: StatusCode,
}

impl<T: Serialize> JsonResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data, status: StatusCode::OK }
    }

    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    fn encode(&self, req: &RequestContext) -> Result<Vec<u8>, RenderError> {
        let value = serde_json::to_value(&self.data).map_err(|e| RenderError::Json(e.into()))?;
        let mut bytes = req.settings().json().encode(&value).map_err(RenderError::Json)?;
        bytes.push(b'\n');
        Ok(bytes)
    }
}

impl<T: Serialize> Responder for JsonResponse<T> {
    fn response_to(self, req: &RequestContext) -> Result<Response<ResponseBody>, HandlerError> {
        let bytes = self.encode(req)?;
        Ok(with_content_type(self.status, HeaderValue::from_static("application/json"), bytes.into()))
    }
}

/// Serializes `data` as an xml document whose root element is named after the type.
#[derive(Debug, Clone)]
pub struct XmlResponse<T> {
    data: T,
    status: StatusCode,
}

impl<T: Serialize> XmlResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data, status: StatusCode::OK }
    }

    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }
}

impl<T: Serialize> Responder for XmlResponse<T> {
    fn response_to(self, _req: &RequestContext) -> Result<Response<ResponseBody>, HandlerError> {
        let xml = quick_xml::se::to_string(&self.data).map_err(|e| RenderError::Xml(e.to_string()))?;
        Ok(with_content_type(self.status, HeaderValue::from_static("application/xml"), xml.into()))
    }
}

#[derive(Debug, Clone)]
pub struct StringResponse {
    data: String,
    status: StatusCode,
}

impl StringResponse {
    pub fn new(data: impl Into<String>) -> Self {
        Self { data: data.into(), status: StatusCode::OK }
    }

    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }
}

impl Responder for StringResponse {
    fn response_to(self, _req: &RequestContext) -> Result<Response<ResponseBody>, HandlerError> {
        Ok(text_response(self.status, self.data.into()))
    }
}

/// Renders the template `name` of a shared minijinja [`Environment`] with `data` as context.
///
/// ```
/// use micro_hx::responder::HtmlResponse;
/// use minijinja::Environment;
/// use std::sync::Arc;
///
/// let mut env = Environment::new();
/// env.add_template("hello.html", "<p>{{ name }}</p>").unwrap();
/// let env = Arc::new(env);
///
/// let response = HtmlResponse::new(env, "hello.html", minijinja::context! { name => "hx" });
/// ```
#[derive(Debug, Clone)]
pub struct HtmlResponse<T> {
    env: Arc<Environment<'static>>,
    name: String,
    data: T,
    status: StatusCode,
}

impl<T: Serialize> HtmlResponse<T> {
    pub fn new(env: Arc<Environment<'static>>, name: impl Into<String>, data: T) -> Self {
        Self { env, name: name.into(), data, status: StatusCode::OK }
    }

    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    fn render(&self) -> Result<String, RenderError> {
        let template = self.env.get_template(&self.name)?;
        Ok(template.render(&self.data)?)
    }
}

impl<T: Serialize> Responder for HtmlResponse<T> {
    fn response_to(self, _req: &RequestContext) -> Result<Response<ResponseBody>, HandlerError> {
        let html = self.render()?;
        Ok(with_content_type(self.status, HeaderValue::from_static("text/html; charset=utf-8"), html.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::{HtmlResponse, JsonResponse, RenderError, StringResponse, XmlResponse};
    use crate::responder::Responder;
    use crate::settings::{SerdeJsonCodec, Settings};
    use crate::{PathParams, RequestContext};
    use bytes::Bytes;
    use http::{Request, StatusCode};
    use http_body_util::{BodyExt, Full};
    use minijinja::Environment;
    use serde::Serialize;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    #[derive(Serialize)]
    struct Message {
        message: String,
    }

    fn context() -> RequestContext {
        RequestContext::from_http(Request::new(Full::new(Bytes::new()))).0
    }

    async fn body_text(response: http::Response<crate::ResponseBody>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn json_response() {
        let response = JsonResponse::new(Message { message: "hello".into() }).response_to(&context()).unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[http::header::CONTENT_TYPE], "application/json");
        let body = body_text(response).await;
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value, serde_json::json!({"message": "hello"}));
        assert!(body.ends_with('\n'));
    }

    #[tokio::test]
    async fn json_uses_router_codec() {
        let (parts, _) = Request::new(()).into_parts();
        let req = RequestContext::new(parts, PathParams::empty(), Arc::new(Settings::new(SerdeJsonCodec::pretty())));

        let response = JsonResponse::new(Message { message: "hi".into() }).response_to(&req).unwrap();
        assert_eq!(body_text(response).await, "{\n  \"message\": \"hi\"\n}\n");
    }

    #[test]
    fn json_map_with_non_string_keys_fails() {
        let mut map = BTreeMap::new();
        map.insert(vec![1u8], 1);
        let err = JsonResponse::new(map).response_to(&context()).unwrap_err();
        assert!(err.downcast_ref::<RenderError>().is_some_and(|e| matches!(e, RenderError::Json(_))));
    }

    #[tokio::test]
    async fn xml_and_string_responses() {
        let response = XmlResponse::new(Message { message: "hello".into() })
            .with_status(StatusCode::ACCEPTED)
            .response_to(&context())
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(response.headers()[http::header::CONTENT_TYPE], "application/xml");
        assert_eq!(body_text(response).await, "<Message><message>hello</message></Message>");

        let response = StringResponse::new("plain").response_to(&context()).unwrap();
        assert_eq!(response.headers()[http::header::CONTENT_TYPE], "text/plain; charset=utf-8");
        assert_eq!(body_text(response).await, "plain");
    }

    #[tokio::test]
    async fn html_response() {
        let mut env = Environment::new();
        env.add_template("hello.html", "<p>{{ message }}</p>").unwrap();
        let env = Arc::new(env);

        let response =
            HtmlResponse::new(env.clone(), "hello.html", Message { message: "<b>".into() }).response_to(&context()).unwrap();
        assert_eq!(response.headers()[http::header::CONTENT_TYPE], "text/html; charset=utf-8");
        assert_eq!(body_text(response).await, "<p>&lt;b&gt;</p>");

        let err = HtmlResponse::new(env, "missing.html", ()).response_to(&context()).unwrap_err();
        assert!(err.to_string().starts_with("template rendering failed"));
    }
}
