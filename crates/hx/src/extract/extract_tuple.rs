use crate::body::RequestBody;
use crate::extract::from_request::FromRequest;
use crate::handler::HandlerError;
use crate::RequestContext;
use async_trait::async_trait;

macro_rules! impl_from_request_for_tuple {
    ($($param:ident)*) => {
        /// Extracts each element in order, the first failure stops the extraction
        #[async_trait]
        impl<$($param,)*> FromRequest for ($($param,)*)
        where
            $($param: FromRequest,)*
        {
            type Error = HandlerError;

            async fn from_request(req: &RequestContext, body: &RequestBody) -> Result<Self, Self::Error> {
                Ok(($($param::from_request(req, body).await.map_err(Into::into)?,)*))
            }
        }
    }
}

impl_from_request_for_tuple! { A }
impl_from_request_for_tuple! { A B }
impl_from_request_for_tuple! { A B C }
impl_from_request_for_tuple! { A B C D }
impl_from_request_for_tuple! { A B C D E }
impl_from_request_for_tuple! { A B C D E F }
impl_from_request_for_tuple! { A B C D E F G }
impl_from_request_for_tuple! { A B C D E F G H }
impl_from_request_for_tuple! { A B C D E F G H I }
impl_from_request_for_tuple! { A B C D E F G H I J }
impl_from_request_for_tuple! { A B C D E F G H I J K }
impl_from_request_for_tuple! { A B C D E F G H I J K L }

#[cfg(test)]
mod tests {
    use crate::extract::{FromRequest, Query};
    use crate::RequestContext;
    use bytes::Bytes;
    use http::{Method, Request};
    use http_body_util::Full;
    use serde::Deserialize;

    #[derive(Deserialize, Default)]
    #[serde(default)]
    struct Page {
        page: u32,
    }

    #[tokio::test]
    async fn tuple_in_order() {
        let (req, body) = RequestContext::from_http(
            Request::builder().method(Method::PUT).uri("/?page=4").body(Full::new(Bytes::from_static(b"data"))).unwrap(),
        );

        let (method, Query(page), text) = <(Method, Query<Page>, String)>::from_request(&req, &body).await.unwrap();
        assert_eq!(method, Method::PUT);
        assert_eq!(page.page, 4);
        assert_eq!(text, "data");
    }

    #[tokio::test]
    async fn first_failure_wins() {
        let (req, body) = RequestContext::from_http(Request::new(Full::new(Bytes::new())));
        let err = <(Method, crate::extract::Extension<u8>)>::from_request(&req, &body).await.err().unwrap();
        assert!(err.to_string().starts_with("missing request extension"));
    }
}
