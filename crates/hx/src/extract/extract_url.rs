//! Query string extraction.
//!
//! [`Query<T>`] decodes the query string into `T` with the same rules as form binding: repeated
//! keys fill sequences, scalars take the first value and absent keys keep their default.
//!
//! # Example
//! ```no_run
//! # use serde::Deserialize;
//! # use micro_hx::extract::Query;
//!
//! #[derive(Deserialize, Default)]
//! #[serde(default)]
//! struct Params {
//!     name: String,
//!     tags: Vec<String>,
//! }
//!
//! async fn handler(Query(params): Query<Params>) -> String {
//!     format!("{} {:?}", params.name, params.tags)
//! }
//! ```

use crate::binding::{BindError, Binder, Values};
use crate::body::RequestBody;
use crate::extract::{FromRequest, Query, QueryValues};
use crate::RequestContext;
use async_trait::async_trait;
use serde::de::DeserializeOwned;

#[async_trait]
impl<T> FromRequest for Query<T>
where
    T: DeserializeOwned + Send,
{
    type Error = BindError;

    async fn from_request(req: &RequestContext, body: &RequestBody) -> Result<Self, Self::Error> {
        Binder::Query.bind(req, body).await.map(Query)
    }
}

#[async_trait]
impl FromRequest for QueryValues {
    type Error = BindError;

    async fn from_request(req: &RequestContext, _body: &RequestBody) -> Result<Self, Self::Error> {
        Values::parse(req.query()).map(QueryValues)
    }
}

#[cfg(test)]
mod tests {
    use crate::binding::BindError;
    use crate::extract::{FromRequest, Query, QueryValues};
    use crate::RequestContext;
    use bytes::Bytes;
    use http::Request;
    use http_body_util::Full;
    use serde::Deserialize;

    #[derive(Deserialize, Debug, Default)]
    #[serde(default)]
    struct Search {
        q: String,
        page: u32,
        tags: Vec<String>,
    }

    fn get(uri: &str) -> RequestContext {
        RequestContext::from_http(Request::builder().uri(uri).body(Full::new(Bytes::new())).unwrap()).0
    }

    #[tokio::test]
    async fn typed_query() {
        let req = get("/search?q=rust%20lang&tags=a&tags=b&page=2");
        let Query(search) = Query::<Search>::from_request(&req, &crate::RequestBody::empty()).await.unwrap();

        assert_eq!(search.q, "rust lang");
        assert_eq!(search.page, 2);
        assert_eq!(search.tags, ["a", "b"]);
    }

    #[tokio::test]
    async fn missing_query_keeps_defaults() {
        let req = get("/search");
        let Query(search) = Query::<Search>::from_request(&req, &crate::RequestBody::empty()).await.unwrap();
        assert_eq!(search.page, 0);
        assert!(search.tags.is_empty());
    }

    #[tokio::test]
    async fn bad_number_names_the_field() {
        let req = get("/search?page=two");
        let err = Query::<Search>::from_request(&req, &crate::RequestBody::empty()).await.unwrap_err();
        assert!(matches!(err, BindError::Field { ref field, .. } if field == "page"));
    }

    #[tokio::test]
    async fn raw_values() {
        let req = get("/?a=1&a=2&b=");
        let QueryValues(values) = QueryValues::from_request(&req, &crate::RequestBody::empty()).await.unwrap();
        assert_eq!(values.get_all("a"), ["1", "2"]);
        assert_eq!(values.get("b"), Some(""));
    }
}
