//! Predicate polling with a timeout
//!
//! A [`Poller`] owns a resolver, an action, and its options. Each call to
//! [`Poller::fire`] checks the resolver once inline; if it does not pass, a
//! timer task re-checks it every `frequency` until it passes or `timeout`
//! elapses.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::task::AbortHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, trace, warn};

use crate::config::WaitForOptions;
use crate::error::{Result, WaitForError};
use crate::handle::{Outcome, PollHandle};
use crate::resolver::{Action, Resolver};

/// Where a poller is in its current cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PollState {
    /// No cycle has started, or a cycle is between its start and the first check
    #[default]
    Idle,
    /// The resolver failed its first check and the timer is running
    Polling,
    /// The resolver passed and the action was invoked
    Succeeded,
    /// The timeout elapsed before the resolver passed
    TimedOut,
    /// The cycle was stopped before reaching another terminal state
    Cancelled,
}

impl PollState {
    /// Check if no further polling happens until the next `fire`
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PollState::Succeeded | PollState::TimedOut | PollState::Cancelled
        )
    }
}

/// Bookkeeping for the current cycle, shared with its timer task
#[derive(Debug, Default)]
struct Cycle {
    /// Incremented on every `fire`; a timer task only updates its own cycle
    generation: u64,
    state: PollState,
    started_at: Option<Instant>,
    /// Present iff a timer task is polling
    timer: Option<AbortHandle>,
}

impl Cycle {
    /// Move an open cycle to a terminal `state`
    ///
    /// Returns `false` if `generation` was superseded or already settled, in
    /// which case the caller must not act.
    fn finish(&mut self, generation: u64, state: PollState) -> bool {
        if self.generation != generation || self.state.is_terminal() {
            return false;
        }
        self.timer = None;
        self.state = state;
        true
    }
}

/// Closes the timer task's cycle on every exit
///
/// Owned by the task future from the moment it is spawned, so it also drops
/// when the task is aborted before its first poll or unwinds from a resolver
/// or action panic. After a success or timeout it does nothing.
struct CycleGuard {
    cycle: Arc<Mutex<Cycle>>,
    generation: u64,
}

impl Drop for CycleGuard {
    fn drop(&mut self) {
        if self.cycle.lock().finish(self.generation, PollState::Cancelled) {
            debug!(generation = self.generation, "Polling task exited early, cycle cancelled");
        }
    }
}

/// Polls a resolver and invokes an action once it passes
///
/// `Args` is the action's parameter tuple; [`fire`](Poller::fire) forwards
/// it unchanged.
///
/// ```rust,ignore
/// use std::sync::atomic::{AtomicBool, Ordering};
/// use std::sync::Arc;
/// use waitfor::{Poller, WaitForOptions};
///
/// let logged_in = Arc::new(AtomicBool::new(false));
/// let flag = Arc::clone(&logged_in);
///
/// let poller = Poller::new(
///     move || flag.load(Ordering::SeqCst),
///     |(greeting,): (&'static str,)| println!("{greeting} Ben!"),
///     WaitForOptions::new(Duration::from_secs(1)),
/// )?;
///
/// let handle = poller.fire(("Welcome",))?; // nothing yet
/// logged_in.store(true, Ordering::SeqCst);
/// handle.outcome().await?; // "Welcome Ben!"
/// ```
pub struct Poller<R, A, Args> {
    resolver: Arc<Mutex<R>>,
    action: Arc<Mutex<A>>,
    options: WaitForOptions,
    cycle: Arc<Mutex<Cycle>>,
    runtime: Option<Handle>,
    _args: PhantomData<fn(Args)>,
}

impl<R, A, Args> Poller<R, A, Args>
where
    R: Resolver,
    A: Action<Args>,
    Args: Send + 'static,
{
    /// Create a new poller
    ///
    /// Options are normalised first; see [`WaitForOptions::normalized`].
    pub fn new(resolver: R, action: A, options: WaitForOptions) -> Result<Self> {
        Ok(Self::from_normalized(resolver, action, options.normalized()?))
    }

    /// Create a new poller with [`WaitForOptions::default`]
    pub fn with_defaults(resolver: R, action: A) -> Self {
        Self::from_normalized(resolver, action, WaitForOptions::default())
    }

    fn from_normalized(resolver: R, action: A, options: WaitForOptions) -> Self {
        Self {
            resolver: Arc::new(Mutex::new(resolver)),
            action: Arc::new(Mutex::new(action)),
            options,
            cycle: Arc::new(Mutex::new(Cycle::default())),
            runtime: None,
            _args: PhantomData,
        }
    }

    /// Build a poller and return a function that fires it
    ///
    /// Saves the caller from holding on to the poller itself.
    pub fn create(
        resolver: R,
        action: A,
        options: WaitForOptions,
    ) -> Result<impl Fn(Args) -> Result<PollHandle>> {
        let poller = Self::new(resolver, action, options)?;
        Ok(move |args| poller.fire(args))
    }

    /// Schedule timer tasks on `runtime` instead of the ambient runtime
    ///
    /// Lets synchronous code outside any runtime context fire a poller.
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Start a polling cycle
    ///
    /// The resolver is checked once before returning. If it passes, the
    /// action runs inline and the returned handle is already finished. If it
    /// does not, a timer task takes over and this returns immediately.
    ///
    /// A cycle still polling from an earlier `fire` is cancelled.
    ///
    /// # Deadlocks
    ///
    /// The resolver and action are called with this poller's own locks on
    /// them held. Calling `fire` on the same poller from inside either one
    /// never returns. [`state`](Poller::state), [`is_polling`](Poller::is_polling),
    /// [`elapsed`](Poller::elapsed) and [`cancel`](Poller::cancel) are fine to
    /// call from there.
    pub fn fire(&self, args: Args) -> Result<PollHandle> {
        let (generation, started_at, superseded) = {
            let mut cycle = self.cycle.lock();
            let superseded = cycle.timer.take();
            if superseded.is_some() {
                debug!(generation = cycle.generation, "Superseding in-flight polling cycle");
            }
            let started_at = Instant::now();
            cycle.generation += 1;
            cycle.state = PollState::Idle;
            cycle.started_at = Some(started_at);
            (cycle.generation, started_at, superseded)
        };
        if let Some(timer) = superseded {
            timer.abort();
        }

        if self.resolver.lock().resolve() {
            if !self.cycle.lock().finish(generation, PollState::Succeeded) {
                return Ok(PollHandle::ready(Ok(Outcome::Cancelled)));
            }
            self.action.lock().invoke(args);
            debug!(generation, "Resolver passed on first check");
            return Ok(PollHandle::ready(Ok(Outcome::Succeeded)));
        }

        let runtime = match &self.runtime {
            Some(runtime) => runtime.clone(),
            None => Handle::try_current().map_err(|_| WaitForError::NoRuntime)?,
        };

        let (outcome_tx, outcome_rx) = oneshot::channel();
        let task = runtime.spawn(run_cycle(
            Arc::clone(&self.resolver),
            Arc::clone(&self.action),
            self.options,
            CycleGuard {
                cycle: Arc::clone(&self.cycle),
                generation,
            },
            started_at,
            args,
            outcome_tx,
        ));

        // The cycle lock is taken after the spawn: a task spawned onto a shut
        // down runtime is dropped inline and its guard locks the cycle.
        {
            let mut cycle = self.cycle.lock();
            if cycle.generation != generation {
                // Superseded while spawning; the newer fire never saw this timer
                task.abort();
                return Ok(PollHandle::polling(outcome_rx, task));
            }
            if cycle.state.is_terminal() {
                return Ok(PollHandle::polling(outcome_rx, task));
            }
            cycle.timer = Some(task.abort_handle());
            cycle.state = PollState::Polling;
        }

        debug!(
            generation,
            frequency_ms = self.options.frequency.as_millis() as u64,
            timeout_ms = self.options.timeout.as_millis() as u64,
            "Resolver not ready, polling"
        );

        Ok(PollHandle::polling(outcome_rx, task))
    }

    /// Stop the in-flight cycle, if any
    ///
    /// Returns `true` if a cycle was polling.
    pub fn cancel(&self) -> bool {
        let timer = {
            let mut cycle = self.cycle.lock();
            let timer = cycle.timer.take();
            if timer.is_some() {
                cycle.state = PollState::Cancelled;
                debug!(generation = cycle.generation, "Polling cycle cancelled");
            }
            timer
        };
        match timer {
            Some(timer) => {
                timer.abort();
                true
            }
            None => false,
        }
    }
}

impl<R, A, Args> Poller<R, A, Args> {
    /// Get the state of the most recent cycle
    pub fn state(&self) -> PollState {
        self.cycle.lock().state
    }

    /// Check if a timer is currently polling
    pub fn is_polling(&self) -> bool {
        self.cycle.lock().timer.is_some()
    }

    /// Time since the most recent `fire`, if any
    pub fn elapsed(&self) -> Option<Duration> {
        self.cycle.lock().started_at.map(|started_at| started_at.elapsed())
    }

    /// Get the normalised options
    pub fn options(&self) -> &WaitForOptions {
        &self.options
    }
}

impl<R, A, Args> fmt::Debug for Poller<R, A, Args> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cycle = self.cycle.lock();
        f.debug_struct("Poller")
            .field("options", &self.options)
            .field("state", &cycle.state)
            .field("generation", &cycle.generation)
            .field("polling", &cycle.timer.is_some())
            .finish()
    }
}

/// Timer task body: tick until the resolver passes or the timeout elapses
#[allow(clippy::too_many_arguments)]
async fn run_cycle<R, A, Args>(
    resolver: Arc<Mutex<R>>,
    action: Arc<Mutex<A>>,
    options: WaitForOptions,
    guard: CycleGuard,
    started_at: Instant,
    args: Args,
    outcome_tx: oneshot::Sender<Result<Outcome>>,
) where
    R: Resolver,
    A: Action<Args>,
{
    let generation = guard.generation;
    let result = poll_until_resolved(
        &resolver,
        &action,
        &options,
        &guard.cycle,
        generation,
        started_at,
        args,
    )
    .await;

    if let Err(Err(error)) = outcome_tx.send(result) {
        warn!(generation, %error, "Polling timed out and no handle was waiting for the outcome");
    }
}

async fn poll_until_resolved<R, A, Args>(
    resolver: &Mutex<R>,
    action: &Mutex<A>,
    options: &WaitForOptions,
    cycle: &Mutex<Cycle>,
    generation: u64,
    started_at: Instant,
    args: Args,
) -> Result<Outcome>
where
    R: Resolver,
    A: Action<Args>,
{
    let mut ticker = time::interval_at(started_at + options.frequency, options.frequency);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut checks: u64 = 1;

    loop {
        ticker.tick().await;
        checks += 1;

        if resolver.lock().resolve() {
            if !cycle.lock().finish(generation, PollState::Succeeded) {
                debug!(generation, checks, "Resolver passed after the cycle was closed");
                return Ok(Outcome::Cancelled);
            }
            action.lock().invoke(args);
            debug!(
                generation,
                checks,
                elapsed_ms = started_at.elapsed().as_millis() as u64,
                "Resolver passed, action invoked"
            );
            return Ok(Outcome::Succeeded);
        }

        let elapsed = started_at.elapsed();
        if elapsed >= options.timeout {
            if !cycle.lock().finish(generation, PollState::TimedOut) {
                return Ok(Outcome::Cancelled);
            }
            if options.silent {
                debug!(generation, checks, "Polling timed out silently");
                return Ok(Outcome::Abandoned);
            }
            debug!(generation, checks, "Polling timed out");
            return Err(WaitForError::Timeout { elapsed });
        }

        trace!(generation, checks, elapsed_ms = elapsed.as_millis() as u64, "Resolver not ready");
    }
}
