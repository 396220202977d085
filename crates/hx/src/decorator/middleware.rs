use crate::decorator::Decorator;
use crate::handler::{BoxedHandler, RequestHandler};
use std::fmt;
use std::sync::Arc;

/// Wraps a handler into another handler.
///
/// Implemented by every [`Decorator`] from [`BoxedHandler`] to a handler, so middleware is usually
/// written as a handler type plus a [`decorator_fn`](crate::decorator::decorator_fn) building it.
pub trait Middleware: Send + Sync {
    fn apply(&self, handler: BoxedHandler) -> BoxedHandler;
}

impl<D, H> Middleware for D
where
    D: Decorator<BoxedHandler, Out = H> + Send + Sync,
    H: RequestHandler + 'static,
{
    fn apply(&self, handler: BoxedHandler) -> BoxedHandler {
        Box::new(self.decorate(handler))
    }
}

/// An ordered list of middleware acting as one.
///
/// The first middleware added is the outermost: it sees the request first and the response last.
#[derive(Clone, Default)]
pub struct Chain {
    middlewares: Vec<Arc<dyn Middleware>>,
}

/// Starts an empty [`Chain`]
pub fn chain() -> Chain {
    Chain::default()
}

impl Chain {
    #[must_use]
    pub fn with<M: Middleware + 'static>(mut self, middleware: M) -> Self {
        self.push(Arc::new(middleware));
        self
    }

    pub(crate) fn push(&mut self, middleware: Arc<dyn Middleware>) {
        self.middlewares.push(middleware);
    }

    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }
}

impl Decorator<BoxedHandler> for Chain {
    type Out = BoxedHandler;

    fn decorate(&self, raw: BoxedHandler) -> BoxedHandler {
        self.middlewares.iter().rev().fold(raw, |handler, middleware| middleware.apply(handler))
    }
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain").field("len", &self.middlewares.len()).finish()
    }
}
