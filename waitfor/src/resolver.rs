//! Resolver and action seams
//!
//! A poller is generic over the predicate it checks and the callable it
//! defers. Closures work out of the box through the blanket impls below;
//! implement the traits directly for stateful types.

/// Predicate that decides whether the deferred action may run
pub trait Resolver: Send + 'static {
    /// Returns `true` once the action should fire.
    fn resolve(&mut self) -> bool;
}

impl<F> Resolver for F
where
    F: FnMut() -> bool + Send + 'static,
{
    fn resolve(&mut self) -> bool {
        self()
    }
}

/// Callable invoked with the arguments of the triggering `fire` call
///
/// `Args` is the parameter tuple, e.g. `(u32, u32, u32)` or `()`.
pub trait Action<Args>: Send + 'static {
    fn invoke(&mut self, args: Args);
}

impl<F, Args> Action<Args> for F
where
    F: FnMut(Args) + Send + 'static,
{
    fn invoke(&mut self, args: Args) {
        self(args)
    }
}
