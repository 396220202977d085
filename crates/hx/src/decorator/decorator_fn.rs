use crate::decorator::Decorator;

#[derive(Debug, Copy, Clone)]
pub struct DecoratorFn<F> {
    f: F,
}

/// A decorator from a plain function.
///
/// With `F: Fn(BoxedHandler) -> H` this is the closure form of a middleware.
pub fn decorator_fn<In, Out, F>(f: F) -> DecoratorFn<F>
where
    F: Fn(In) -> Out,
{
    DecoratorFn { f }
}

impl<In, Out, F> Decorator<In> for DecoratorFn<F>
where
    F: Fn(In) -> Out,
{
    type Out = Out;

    fn decorate(&self, raw: In) -> Self::Out {
        (self.f)(raw)
    }
}
