//! Method wrapping on top of [`Poller`]
//!
//! [`DeferredMethod`] wraps a method of `T` so that calling it returns
//! immediately and the real method runs once a resolver, evaluated against
//! the same instance, passes.

use std::fmt;
use std::sync::Arc;

use crate::config::WaitForOptions;
use crate::error::Result;
use crate::handle::PollHandle;
use crate::poller::Poller;

type InstanceResolver<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;
type InstanceMethod<T, Args> = Arc<dyn Fn(&T, Args) + Send + Sync>;

/// A method whose execution is deferred until a resolver passes
///
/// Each [`call`](DeferredMethod::call) builds a fresh [`Poller`] bound to the
/// given instance and fires it with the call's arguments. The method's own
/// return value is not propagated; completion and timeouts are reported
/// through the returned [`PollHandle`].
///
/// ```rust,ignore
/// struct Greeter { ready: AtomicBool }
///
/// let greet = DeferredMethod::with_defaults(
///     |greeter: &Greeter| greeter.ready.load(Ordering::SeqCst),
///     |_greeter: &Greeter, (name,): (String,)| println!("Hello {name}!"),
/// );
///
/// let greeter = Arc::new(Greeter { ready: AtomicBool::new(false) });
/// let handle = greet.call(&greeter, ("John".to_string(),))?;
/// ```
pub struct DeferredMethod<T, Args> {
    resolver: InstanceResolver<T>,
    method: InstanceMethod<T, Args>,
    options: WaitForOptions,
}

impl<T, Args> DeferredMethod<T, Args>
where
    T: Send + Sync + 'static,
    Args: Send + 'static,
{
    /// Wrap `method` so it only runs once `resolver` passes for the instance
    pub fn new<R, M>(resolver: R, method: M, options: WaitForOptions) -> Result<Self>
    where
        R: Fn(&T) -> bool + Send + Sync + 'static,
        M: Fn(&T, Args) + Send + Sync + 'static,
    {
        Ok(Self::from_normalized(resolver, method, options.normalized()?))
    }

    /// Wrap `method` using [`WaitForOptions::default`]
    pub fn with_defaults<R, M>(resolver: R, method: M) -> Self
    where
        R: Fn(&T) -> bool + Send + Sync + 'static,
        M: Fn(&T, Args) + Send + Sync + 'static,
    {
        Self::from_normalized(resolver, method, WaitForOptions::default())
    }

    fn from_normalized<R, M>(resolver: R, method: M, options: WaitForOptions) -> Self
    where
        R: Fn(&T) -> bool + Send + Sync + 'static,
        M: Fn(&T, Args) + Send + Sync + 'static,
    {
        Self {
            resolver: Arc::new(resolver),
            method: Arc::new(method),
            options,
        }
    }

    /// Invoke the wrapped method on `instance` once the resolver passes
    pub fn call(&self, instance: &Arc<T>, args: Args) -> Result<PollHandle> {
        let resolver = Arc::clone(&self.resolver);
        let context = Arc::clone(instance);
        let method = Arc::clone(&self.method);
        let target = Arc::clone(instance);

        let poller = Poller::new(
            move || resolver(&*context),
            move |args: Args| method(&*target, args),
            self.options,
        )?;

        poller.fire(args)
    }

    /// Bind the wrapped method to one instance
    pub fn bind(&self, instance: Arc<T>) -> impl Fn(Args) -> Result<PollHandle> {
        let deferred = self.clone();
        move |args| deferred.call(&instance, args)
    }

    /// Get the options each call's poller is built with
    pub fn options(&self) -> &WaitForOptions {
        &self.options
    }
}

impl<T, Args> Clone for DeferredMethod<T, Args> {
    fn clone(&self) -> Self {
        Self {
            resolver: Arc::clone(&self.resolver),
            method: Arc::clone(&self.method),
            options: self.options,
        }
    }
}

impl<T, Args> fmt::Debug for DeferredMethod<T, Args> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredMethod")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::Outcome;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct Door {
        open: AtomicBool,
        entered: AtomicUsize,
    }

    fn enter() -> DeferredMethod<Door, ()> {
        DeferredMethod::with_defaults(
            |door: &Door| door.open.load(Ordering::SeqCst),
            |door: &Door, _: ()| {
                door.entered.fetch_add(1, Ordering::SeqCst);
            },
        )
    }

    #[test]
    fn test_open_door_enters_immediately() {
        let door = Arc::new(Door::default());
        door.open.store(true, Ordering::SeqCst);

        let handle = enter().call(&door, ()).unwrap();

        assert!(handle.is_finished());
        assert_eq!(door.entered.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolver_sees_the_instance() {
        let door = Arc::new(Door::default());
        let handle = enter().call(&door, ()).unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(door.entered.load(Ordering::SeqCst), 0);

        door.open.store(true, Ordering::SeqCst);
        assert_eq!(handle.outcome().await.unwrap(), Outcome::Succeeded);
        assert_eq!(door.entered.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_arguments_are_forwarded() {
        struct Ledger {
            entries: parking_lot::Mutex<Vec<(String, u32)>>,
        }

        let record = DeferredMethod::new(
            |_: &Ledger| true,
            |ledger: &Ledger, (name, amount): (String, u32)| ledger.entries.lock().push((name, amount)),
            WaitForOptions::new(Duration::from_millis(50)),
        )
        .unwrap();

        let ledger = Arc::new(Ledger {
            entries: parking_lot::Mutex::new(Vec::new()),
        });
        let bound = record.bind(Arc::clone(&ledger));
        bound(("rent".to_string(), 1200)).unwrap();

        assert_eq!(*ledger.entries.lock(), vec![("rent".to_string(), 1200)]);
    }

    #[test]
    fn test_invalid_options_rejected() {
        let result = DeferredMethod::<Door, ()>::new(
            |_| true,
            |_, _| {},
            WaitForOptions::new(Duration::ZERO),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_constructors_share_defaults() {
        let built = DeferredMethod::<Door, ()>::new(
            |_| true,
            |_, _| {},
            WaitForOptions::default().with_frequency(Duration::ZERO),
        )
        .unwrap();

        assert_eq!(built.options(), enter().options());
    }
}
