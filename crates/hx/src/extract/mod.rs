//! Request extractors.
//!
//! Anything implementing [`FromRequest`] can be a handler argument. Extractors read the shared
//! [`RequestBody`](crate::RequestBody) through its cache, so `Json<T>` and `String` in one handler
//! both see the full body.

mod extract_body;
mod extract_header;
mod extract_tuple;
mod extract_url;
mod extract_value;
mod from_request;

pub use extract_value::{FromCookie, FromForm, FromHeader, FromPath, FromQuery, Value};
pub use from_request::FromRequest;

use crate::binding::Values;
use crate::request::Cookie;
use http::HeaderMap;

/// Represented as form data
///
/// Reads `application/x-www-form-urlencoded` and `multipart/form-data` bodies merged with the query
/// string. File parts bind to [`FileHeader`](crate::binding::FileHeader) fields.
///
/// # Example
/// ```
/// # use serde::Deserialize;
/// # use micro_hx::extract::Form;
/// #[derive(Deserialize, Debug, Default)]
/// #[serde(default)]
/// struct Params {
///     name: String,
///     zip: String,
/// }
///
/// pub async fn handle(Form(params): Form<Params>) -> String {
///     format!("received params: {:?}", params)
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct Form<T>(pub T);

/// Represented as json data
///
/// Decoded with the router's [`JsonCodec`](crate::JsonCodec).
///
/// # Example
/// ```
/// # use serde::Deserialize;
/// # use micro_hx::extract::Json;
/// #[derive(Deserialize, Debug)]
/// struct Params {
///     name: String,
///     zip: String,
/// }
///
/// pub async fn handle(Json(params): Json<Params>) -> String {
///     format!("received params: {:?}", params)
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct Json<T>(pub T);

/// Represented as xml data
#[derive(Debug, Clone, Default)]
pub struct Xml<T>(pub T);

/// Represented as url query data
#[derive(Debug, Clone, Default)]
pub struct Query<T>(pub T);

/// Every query value, untyped
#[derive(Debug, Clone, Default)]
pub struct QueryValues(pub Values);

/// Every form value merged with the query, untyped
#[derive(Debug, Clone, Default)]
pub struct FormValues(pub Values);

/// A copy of the request headers
#[derive(Debug, Clone, Default)]
pub struct Headers(pub HeaderMap);

/// The cookies of the request, in header order
#[derive(Debug, Clone, Default)]
pub struct Cookies(pub Vec<Cookie>);

/// A value stored in the request extensions, usually by
/// [`with_value`](crate::decorator::with_value).
///
/// Extraction fails when no value of type `T` was stored.
#[derive(Debug, Clone, Default)]
pub struct Extension<T>(pub T);
