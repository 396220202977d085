//! Single value extractors.
//!
//! A [`Value`] is a string newtype whose [`Value::NAME`] says which key to read. The extractor type
//! says where to read it from:
//!
//! | extractor          | source                                   | absent  |
//! |--------------------|------------------------------------------|---------|
//! | [`FromPath`]       | route variable                           | `""`    |
//! | [`FromHeader`]     | request header, case-insensitive         | `""`    |
//! | [`FromQuery`]      | first query value                        | `""`    |
//! | [`FromForm`]       | first form value, body before query      | `""`    |
//! | [`FromCookie`]     | named cookie                             | error   |
//!
//! ```
//! use micro_hx::extract::{FromPath, FromQuery};
//! use micro_hx::named_value;
//!
//! named_value!(pub UserId = "id");
//! named_value!(pub Page = "page");
//!
//! async fn show(id: FromPath<UserId>, page: FromQuery<Page>) -> String {
//!     let page: u32 = page.parse().unwrap_or(1);
//!     format!("user {} page {page}", id.as_str())
//! }
//! ```

use crate::RequestContext;
use crate::binding::{BindError, FieldExtractor, Values, parse_form};
use crate::body::RequestBody;
use crate::extract::FromRequest;
use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// A named string value.
///
/// Usually declared with [`named_value!`](crate::named_value).
pub trait Value: Default + Send + Sync + Sized {
    /// The key this value is read from
    const NAME: &'static str;

    fn from_value(value: String) -> Self;

    fn as_str(&self) -> &str;
}

/// Declares a [`Value`] newtype over `String`.
///
/// ```
/// micro_hx::named_value!(
///     /// the `id` route variable
///     pub UserId = "id"
/// );
/// ```
#[macro_export]
macro_rules! named_value {
    ($(#[$meta:meta])* $vis:vis $ty:ident = $name:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
        $vis struct $ty(pub ::std::string::String);

        impl $crate::extract::Value for $ty {
            const NAME: &'static str = $name;

            fn from_value(value: ::std::string::String) -> Self {
                Self(value)
            }

            fn as_str(&self) -> &str {
                &self.0
            }
        }
    };
}

macro_rules! value_extractor {
    ($(#[$meta:meta])* $extractor:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
        pub struct $extractor<V>(V);

        impl<V: Value> $extractor<V> {
            pub fn new(value: V) -> Self {
                Self(value)
            }

            pub fn value(&self) -> &V {
                &self.0
            }

            pub fn into_inner(self) -> V {
                self.0
            }

            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }

            pub fn is_empty(&self) -> bool {
                self.as_str().is_empty()
            }

            /// Parses the raw value, e.g. into a number
            pub fn parse<T: FromStr>(&self) -> Result<T, T::Err> {
                self.as_str().parse()
            }
        }

        impl<V: Value> fmt::Display for $extractor<V> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl<V: Value> Serialize for $extractor<V> {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de, V: Value> Deserialize<'de> for $extractor<V> {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                String::deserialize(deserializer).map(|value| Self(V::from_value(value)))
            }
        }

        #[async_trait]
        impl<V: Value> FieldExtractor for $extractor<V> {
            async fn extract_field(&mut self, req: &RequestContext, body: &RequestBody) -> Result<(), BindError> {
                *self = Self::from_request(req, body).await?;
                Ok(())
            }
        }
    };
}

value_extractor!(
    /// Reads the route variable `V::NAME`, percent-decoded
    FromPath
);
value_extractor!(
    /// Reads the request header `V::NAME`
    FromHeader
);
value_extractor!(
    /// Reads the first query value of `V::NAME`
    FromQuery
);
value_extractor!(
    /// Reads the first form value of `V::NAME`
    FromForm
);
value_extractor!(
    /// Reads the cookie `V::NAME`, a missing cookie fails the extraction
    FromCookie
);

fn wrap<V: Value>(value: Option<&str>) -> V {
    V::from_value(value.unwrap_or_default().to_owned())
}

#[async_trait]
impl<V: Value> FromRequest for FromPath<V> {
    type Error = Infallible;

    async fn from_request(req: &RequestContext, _body: &RequestBody) -> Result<Self, Self::Error> {
        Ok(Self(wrap(req.path_params().get(V::NAME))))
    }
}

#[async_trait]
impl<V: Value> FromRequest for FromHeader<V> {
    type Error = Infallible;

    async fn from_request(req: &RequestContext, _body: &RequestBody) -> Result<Self, Self::Error> {
        Ok(Self(wrap(req.headers().get(V::NAME).and_then(|value| value.to_str().ok()))))
    }
}

#[async_trait]
impl<V: Value> FromRequest for FromQuery<V> {
    type Error = Infallible;

    async fn from_request(req: &RequestContext, _body: &RequestBody) -> Result<Self, Self::Error> {
        let query = Values::parse(req.query()).unwrap_or_default();
        Ok(Self(wrap(query.get(V::NAME))))
    }
}

#[async_trait]
impl<V: Value> FromRequest for FromForm<V> {
    type Error = Infallible;

    async fn from_request(req: &RequestContext, body: &RequestBody) -> Result<Self, Self::Error> {
        let form = parse_form(req, body).await.ok();
        Ok(Self(wrap(form.as_deref().and_then(|form| form.value(V::NAME)))))
    }
}

#[async_trait]
impl<V: Value> FromRequest for FromCookie<V> {
    type Error = BindError;

    async fn from_request(req: &RequestContext, _body: &RequestBody) -> Result<Self, Self::Error> {
        let cookie = req.cookie(V::NAME).ok_or(BindError::MissingCookie)?;
        Ok(Self(V::from_value(cookie.value().to_owned())))
    }
}
