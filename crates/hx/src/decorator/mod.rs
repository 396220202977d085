//! Handler decoration.
//!
//! A [`Decorator`] turns one value into another, here a handler into a wrapping handler. Every
//! decorator from [`BoxedHandler`](crate::handler::BoxedHandler) to some [`RequestHandler`](crate::handler::RequestHandler)
//! is a [`Middleware`] and can be added to a router scope with
//! [`RouterBuilder::wrap`](crate::router::RouterBuilder::wrap).

mod decorator_fn;
pub(crate) mod middleware;
mod with_value;

pub use decorator_fn::{DecoratorFn, decorator_fn};
pub use middleware::{Chain, Middleware, chain};
pub use with_value::{WithValue, WithValueHandler, with_value};

pub trait Decorator<In> {
    type Out;

    fn decorate(&self, raw: In) -> Self::Out;
}
