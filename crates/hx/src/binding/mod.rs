//! Request binding.
//!
//! Binding turns a request into a caller defined struct in two passes:
//!
//! 1. a whole-request [`Binder`], chosen from the method and `Content-Type`, deserializes the body
//!    (json, xml, form) or the query string into the struct;
//! 2. [`ExtractFields`] then fills every declared extractor field
//!    ([`FromPath`](crate::extract::FromPath), [`FromHeader`](crate::extract::FromHeader), ...)
//!    from its own request location, overwriting whatever the first pass left there.
//!
//! [`Bind`] runs both passes and is what typed handlers usually take as their request.
//!
//! # Example
//! ```
//! use micro_hx::binding::Bind;
//! use micro_hx::extract::{FromHeader, FromPath};
//! use micro_hx::{extract_fields, named_value};
//! use serde::Deserialize;
//!
//! named_value!(pub UserId = "id");
//! named_value!(pub Token = "x-token");
//!
//! #[derive(Deserialize, Default, Debug)]
//! #[serde(default)]
//! struct UpdateUser {
//!     name: String,
//!     id: FromPath<UserId>,
//!     token: Option<FromHeader<Token>>,
//! }
//!
//! extract_fields!(UpdateUser { id, token });
//!
//! async fn update(Bind(req): Bind<UpdateUser>) -> String {
//!     format!("{} -> {}", req.id.as_str(), req.name)
//! }
//! ```

mod error;
mod form;
mod map_to;
mod values;

pub use error::BindError;
pub use form::{FileHeader, Files, FormData, MAX_MULTIPART_MEMORY, parse_form};
pub use map_to::{MAX_FIELDS, map_to};
pub use values::Values;

use crate::body::RequestBody;
use crate::extract::FromRequest;
use crate::RequestContext;
use async_trait::async_trait;
use http::Method;
use serde::de::DeserializeOwned;

/// The whole-request binding strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binder {
    Json,
    Xml,
    Form,
    Query,
}

impl Binder {
    /// Chooses a binder from the request method and the raw `Content-Type` value.
    ///
    /// GET always binds the query string. Media types compare case-insensitively and without
    /// parameters, anything missing, malformed or unknown falls back to the query binder.
    pub fn select(method: &Method, content_type: Option<&str>) -> Binder {
        if method == Method::GET {
            return Binder::Query;
        }

        let Some(mime) = content_type.and_then(|value| value.parse::<mime::Mime>().ok()) else {
            return Binder::Query;
        };

        let essence = mime.essence_str();
        if essence.eq_ignore_ascii_case(mime::APPLICATION_JSON.essence_str()) {
            Binder::Json
        } else if essence.eq_ignore_ascii_case("application/xml") {
            Binder::Xml
        } else if essence.eq_ignore_ascii_case(mime::APPLICATION_WWW_FORM_URLENCODED.essence_str())
            || essence.eq_ignore_ascii_case(mime::MULTIPART_FORM_DATA.essence_str())
        {
            Binder::Form
        } else {
            Binder::Query
        }
    }

    pub async fn bind<T: DeserializeOwned>(self, req: &RequestContext, body: &RequestBody) -> Result<T, BindError> {
        match self {
            Binder::Json => {
                let bytes = body.bytes().await?;
                let value = req.settings().json().decode(&bytes).map_err(BindError::Json)?;
                serde_json::from_value(value).map_err(|e| BindError::Json(e.into()))
            }
            Binder::Xml => {
                let bytes = body.bytes().await?;
                let text = std::str::from_utf8(&bytes).map_err(|e| BindError::Body(e.to_string()))?;
                Ok(quick_xml::de::from_str(text)?)
            }
            Binder::Form => {
                let form = parse_form(req, body).await?;
                map_to(&form.merged(), form.files())
            }
            Binder::Query => map_to(&Values::parse(req.query())?, &Files::new()),
        }
    }
}

/// The second binding pass, filling extractor fields from their request location.
///
/// Plain request structs keep the default no-op, structs with extractor fields implement it with
/// [`extract_fields!`](crate::extract_fields).
#[async_trait]
pub trait ExtractFields: Send {
    async fn extract_fields(&mut self, _req: &RequestContext, _body: &RequestBody) -> Result<(), BindError> {
        Ok(())
    }
}

/// A struct field that knows how to fill itself from the request
#[async_trait]
pub trait FieldExtractor: Send {
    async fn extract_field(&mut self, req: &RequestContext, body: &RequestBody) -> Result<(), BindError>;
}

/// An absent optional extractor is created on demand, then filled
#[async_trait]
impl<T> FieldExtractor for Option<T>
where
    T: FieldExtractor + Default,
{
    async fn extract_field(&mut self, req: &RequestContext, body: &RequestBody) -> Result<(), BindError> {
        self.get_or_insert_with(T::default).extract_field(req, body).await
    }
}

/// Implements [`ExtractFields`] for a struct by listing its extractor fields.
///
/// ```
/// # use micro_hx::{extract_fields, named_value};
/// # use micro_hx::extract::FromQuery;
/// named_value!(pub Page = "page");
///
/// #[derive(serde::Deserialize, Default)]
/// #[serde(default)]
/// struct ListUsers {
///     page: FromQuery<Page>,
/// }
///
/// extract_fields!(ListUsers { page });
/// ```
#[macro_export]
macro_rules! extract_fields {
    ($ty:ty { $($field:ident),* $(,)? }) => {
        #[$crate::__private::async_trait]
        impl $crate::binding::ExtractFields for $ty {
            async fn extract_fields(
                &mut self,
                req: &$crate::RequestContext,
                body: &$crate::RequestBody,
            ) -> ::std::result::Result<(), $crate::binding::BindError> {
                $(
                $crate::binding::FieldExtractor::extract_field(&mut self.$field, req, body).await?;
                )*
                Ok(())
            }
        }
    };
}

/// Content-type driven binding followed by field extraction
pub async fn should_bind<T>(req: &RequestContext, body: &RequestBody) -> Result<T, BindError>
where
    T: DeserializeOwned + ExtractFields,
{
    let binder = Binder::select(req.method(), req.content_type());
    let mut value: T = binder.bind(req, body).await?;
    value.extract_fields(req, body).await?;
    Ok(value)
}

/// Binds a request struct with [`should_bind`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bind<T>(pub T);

impl<T> Bind<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

#[async_trait]
impl<T> FromRequest for Bind<T>
where
    T: DeserializeOwned + ExtractFields,
{
    type Error = BindError;

    async fn from_request(req: &RequestContext, body: &RequestBody) -> Result<Self, Self::Error> {
        should_bind(req, body).await.map(Bind)
    }
}

#[cfg(test)]
mod tests {
    use super::{Bind, BindError, Binder, ExtractFields, should_bind};
    use crate::extract::{FromCookie, FromHeader, FromPath, FromQuery, FromRequest};
    use crate::{PathParams, RequestBody, RequestContext, extract_fields, named_value};
    use bytes::Bytes;
    use http::{Method, Request};
    use http_body_util::Full;
    use serde::Deserialize;

    #[test]
    fn select_binder() {
        let cases = [
            (Method::GET, Some("application/json"), Binder::Query),
            (Method::GET, Some("multipart/form-data; boundary=x"), Binder::Query),
            (Method::GET, None, Binder::Query),
            (Method::POST, Some("application/json"), Binder::Json),
            (Method::POST, Some("Application/JSON; charset=utf-8"), Binder::Json),
            (Method::PUT, Some("application/xml"), Binder::Xml),
            (Method::POST, Some("application/x-www-form-urlencoded"), Binder::Form),
            (Method::PATCH, Some("multipart/form-data; boundary=something"), Binder::Form),
            (Method::POST, Some("text/plain"), Binder::Query),
            (Method::POST, Some("not a media type"), Binder::Query),
            (Method::POST, Some(""), Binder::Query),
            (Method::DELETE, None, Binder::Query),
        ];

        for (method, content_type, expected) in cases {
            assert_eq!(Binder::select(&method, content_type), expected, "{method} {content_type:?}");
        }
    }

    named_value!(UserId = "id");
    named_value!(Token = "x-token");
    named_value!(Session = "session");
    named_value!(Lang = "lang");

    #[derive(Deserialize, Default, Debug)]
    #[serde(default)]
    struct UpdateUser {
        name: String,
        age: u32,
        id: FromPath<UserId>,
        token: Option<FromHeader<Token>>,
        lang: FromQuery<Lang>,
    }

    extract_fields!(UpdateUser { id, token, lang });

    #[derive(Deserialize, Default, Debug)]
    #[serde(default)]
    struct Plain {
        name: String,
    }

    impl ExtractFields for Plain {}

    fn context(request: Request<Full<Bytes>>) -> (RequestContext, RequestBody) {
        let (req, body) = RequestContext::from_http(request);
        (req.with_path_params([("id", "42")].into_iter().collect::<PathParams>()), body)
    }

    #[tokio::test]
    async fn json_body_then_fields() {
        let (req, body) = context(
            Request::builder()
                .method(Method::POST)
                .uri("/users/42?lang=en")
                .header(http::header::CONTENT_TYPE, "application/json")
                .header("X-Token", "secret")
                .body(Full::new(Bytes::from_static(br#"{"name":"hx","age":3,"id":"from-body"}"#)))
                .unwrap(),
        );

        let update: UpdateUser = should_bind(&req, &body).await.unwrap();

        assert_eq!(update.name, "hx");
        assert_eq!(update.age, 3);
        assert_eq!(update.id.as_str(), "42");
        assert_eq!(update.token.as_ref().map(|t| t.as_str()), Some("secret"));
        assert_eq!(update.lang.as_str(), "en");
    }

    #[tokio::test]
    async fn query_binding_for_get() {
        let (req, body) =
            context(Request::builder().uri("/users?name=q&age=7").body(Full::new(Bytes::new())).unwrap());

        let Bind(update) = Bind::<UpdateUser>::from_request(&req, &body).await.unwrap();
        assert_eq!(update.name, "q");
        assert_eq!(update.age, 7);
        assert_eq!(update.token.map(|t| t.into_inner().0), Some(String::new()));
    }

    #[tokio::test]
    async fn xml_body() {
        let (req, body) = context(
            Request::builder()
                .method(Method::POST)
                .header(http::header::CONTENT_TYPE, "application/xml")
                .body(Full::new(Bytes::from_static(b"<Plain><name>xml</name></Plain>")))
                .unwrap(),
        );

        let plain: Plain = should_bind(&req, &body).await.unwrap();
        assert_eq!(plain.name, "xml");
    }

    #[tokio::test]
    async fn form_body() {
        let (req, body) = context(
            Request::builder()
                .method(Method::POST)
                .uri("/?name=query")
                .header(http::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Full::new(Bytes::from_static(b"name=form")))
                .unwrap(),
        );

        let plain: Plain = should_bind(&req, &body).await.unwrap();
        assert_eq!(plain.name, "form");
    }

    #[tokio::test]
    async fn multipart_body_binds_for_delete() {
        let (req, body) = context(
            Request::builder()
                .method(Method::DELETE)
                .header(http::header::CONTENT_TYPE, "multipart/form-data; boundary=XB")
                .body(Full::new(Bytes::from_static(
                    b"--XB\r\nContent-Disposition: form-data; name=\"name\"\r\n\r\nbob\r\n--XB--\r\n",
                )))
                .unwrap(),
        );

        let plain: Plain = should_bind(&req, &body).await.unwrap();
        assert_eq!(plain.name, "bob");
    }

    #[tokio::test]
    async fn malformed_json_is_a_bind_error() {
        let (req, body) = context(
            Request::builder()
                .method(Method::POST)
                .header(http::header::CONTENT_TYPE, "application/json")
                .body(Full::new(Bytes::from_static(b"{")))
                .unwrap(),
        );

        let err = should_bind::<Plain>(&req, &body).await.unwrap_err();
        assert!(matches!(err, BindError::Json(_)));
    }

    #[tokio::test]
    async fn missing_cookie_fails_the_second_pass() {
        #[derive(Deserialize, Default, Debug)]
        #[serde(default)]
        struct WithSession {
            session: FromCookie<Session>,
        }
        extract_fields!(WithSession { session });

        let (req, body) = context(Request::builder().uri("/").body(Full::new(Bytes::new())).unwrap());
        let err = should_bind::<WithSession>(&req, &body).await.unwrap_err();
        assert!(matches!(err, BindError::MissingCookie));

        let (req, body) = context(
            Request::builder().uri("/").header(http::header::COOKIE, "session=abc").body(Full::new(Bytes::new())).unwrap(),
        );
        let bound = should_bind::<WithSession>(&req, &body).await.unwrap();
        assert_eq!(bound.session.as_str(), "abc");
    }
}
