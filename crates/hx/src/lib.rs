//! Typed handlers, request binding and routing on top of the `http` crate.
//!
//! A [`Router`] dispatches `http::Request`s to [`RequestHandler`](handler::RequestHandler)s. Handlers
//! are async functions taking [extractors](extract) ([`handler_fn`]) or business functions from a
//! bound request type to a result ([`typed`]). The [`binding`] module fills request structs from the
//! query string, form and multipart bodies, json and xml payloads, path segments, headers and cookies.
//!
//! ```
//! use micro_hx::binding::{Bind, ExtractFields};
//! use micro_hx::handler::HandlerError;
//! use micro_hx::router::{Router, post};
//! use micro_hx::typed;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Deserialize, Default)]
//! #[serde(default)]
//! struct CreateUser {
//!     name: String,
//!     age: u8,
//! }
//! impl ExtractFields for CreateUser {}
//!
//! #[derive(Serialize)]
//! struct User {
//!     id: u64,
//!     name: String,
//! }
//!
//! async fn create(Bind(req): Bind<CreateUser>) -> Result<User, HandlerError> {
//!     Ok(User { id: 1, name: req.name })
//! }
//!
//! let router = Router::builder().route("/users", post(typed(create).json())).build().unwrap();
//! ```
//!
//! The crate does not listen on sockets: hand every request of your server to [`Router::handle`].

mod body;
mod fn_trait;
mod request;
mod settings;

pub mod binding;
pub mod decorator;
pub mod extract;
pub mod handler;
pub mod responder;
pub mod router;

pub use body::{RequestBody, ResponseBody};
pub use fn_trait::FnTrait;
pub use handler::{handler_fn, typed};
pub use request::{Cookie, PathParams, RequestContext};
pub use router::Router;
pub use settings::{CodecError, JsonCodec, SerdeJsonCodec, Settings};

#[doc(hidden)]
pub mod __private {
    pub use async_trait::async_trait;
}
