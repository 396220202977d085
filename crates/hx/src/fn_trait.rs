/// Represents an async function taking its arguments as one tuple.
///
/// The returned future is `Send` so handlers built on it can live behind a
/// `Box<dyn RequestHandler>`.
pub trait FnTrait<Args>: Send + Sync {
    type Output;
    type Fut: Future<Output = Self::Output> + Send;

    fn call(&self, args: Args) -> Self::Fut;
}

/// impl `Fn` for `FnTrait`, From 0 parameters to 12 parameters
///
/// for example, it will impl Fn(A, B) like this:
///```ignore
/// impl<Func, Fut, A, B> FnTrait<(A, B)> for Func
///    where
///        Func: Fn(A, B) -> Fut + Send + Sync,
///        Fut: std::future::Future + Send,
/// {
///    type Output = Fut::Output;
///    type Fut = Fut;
///
///    fn call(&self, (A, B): (A, B)) -> Self::Fut {
///        (self)(A, B)
///    }
/// }
///```
macro_rules! impl_fn_trait_for_fn ({ $($param:ident)* } => {
    impl<Func, Fut, $($param,)*> FnTrait<($($param,)*)> for Func
    where
        Func: Fn($($param),*) -> Fut + Send + Sync,
        Fut: Future + Send,
    {
        type Output = Fut::Output;
        type Fut = Fut;

        #[inline]
        #[allow(non_snake_case, reason = "tuple elements are bound to their type parameter names")]
        fn call(&self, ($($param,)*): ($($param,)*)) -> Self::Fut {
            (self)($($param,)*)
        }
    }
});

impl_fn_trait_for_fn! {}
impl_fn_trait_for_fn! { A }
impl_fn_trait_for_fn! { A B }
impl_fn_trait_for_fn! { A B C }
impl_fn_trait_for_fn! { A B C D }
impl_fn_trait_for_fn! { A B C D E }
impl_fn_trait_for_fn! { A B C D E F }
impl_fn_trait_for_fn! { A B C D E F G }
impl_fn_trait_for_fn! { A B C D E F G H }
impl_fn_trait_for_fn! { A B C D E F G H I }
impl_fn_trait_for_fn! { A B C D E F G H I J }
impl_fn_trait_for_fn! { A B C D E F G H I J K }
impl_fn_trait_for_fn! { A B C D E F G H I J K L }

#[cfg(test)]
mod tests {
    use crate::fn_trait::FnTrait;
    use http::{HeaderMap, Method};

    fn assert_is_fn_trait<Args, F: FnTrait<Args>>(_f: F) {
        //noop
    }
    async fn foo0() {}
    async fn foo1(_a: ()) {}
    async fn foo2(_a1: Method, _a2: HeaderMap) {}
    async fn foo3(_a1: Method, _a2: HeaderMap, _a3: ()) {}
    async fn foo6(_a1: (), _a2: HeaderMap, _a3: (), _a4: (), _a5: (), _a6: ()) {}
    async fn foo12(
        _a1: Method,
        _a2: HeaderMap,
        _a3: (),
        _a4: (),
        _a5: (),
        _a6: (),
        _a7: (),
        _a8: (),
        _a9: (),
        _a10: (),
        _a11: (),
        _a12: (),
    ) {
    }

    #[test]
    fn test_fn_is_fn_trait() {
        assert_is_fn_trait(foo0);
        assert_is_fn_trait(foo1);
        assert_is_fn_trait(foo2);
        assert_is_fn_trait(foo3);
        assert_is_fn_trait(foo6);
        assert_is_fn_trait(foo12);
        assert_is_fn_trait(|name: String| async move { name.len() });
    }

    #[tokio::test]
    async fn call_spreads_the_tuple() {
        let add = |a: u32, b: u32| async move { a + b };
        assert_eq!(add.call((2, 3)).await, 5);
    }
}
