//! # waitfor
//!
//! Poll a predicate on a fixed cadence and run an action once it passes, or
//! give up after a timeout.
//!
//! ## Overview
//!
//! A [`Poller`] pairs a *resolver* (a predicate) with an *action*. Firing it
//! checks the resolver once inline:
//!
//! - if it passes, the action runs right away with the fired arguments and no
//!   timer is created;
//! - otherwise a tokio task re-checks it every `frequency` and runs the action
//!   on the first pass, or stops once `timeout` has elapsed.
//!
//! Every `fire` returns a [`PollHandle`]. Awaiting it yields the terminal
//! [`Outcome`], or [`WaitForError::Timeout`] when polling gave up and the
//! options were not `silent`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::atomic::{AtomicBool, Ordering};
//! use std::sync::Arc;
//! use std::time::Duration;
//! use waitfor::prelude::*;
//!
//! let ready = Arc::new(AtomicBool::new(false));
//! let flag = Arc::clone(&ready);
//!
//! let delayed = Poller::create(
//!     move || flag.load(Ordering::SeqCst),
//!     |(name,): (&'static str,)| println!("Hello {name}!"),
//!     WaitForOptions::new(Duration::from_secs(1)),
//! )?;
//!
//! let handle = delayed(("John",))?; // nothing yet
//! ready.store(true, Ordering::SeqCst);
//! handle.outcome().await?; // "Hello John!"
//! ```
//!
//! Methods can be deferred the same way with [`DeferredMethod`], whose
//! resolver receives the instance the method is called on.

pub mod config;
pub mod deferred;
pub mod error;
pub mod handle;
pub mod logging;
pub mod poller;
pub mod resolver;

pub use config::WaitForOptions;
pub use deferred::DeferredMethod;
pub use error::{Result, WaitForError};
pub use handle::{Outcome, PollHandle};
pub use poller::{PollState, Poller};
pub use resolver::{Action, Resolver};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Action, DeferredMethod, Outcome, PollHandle, PollState, Poller, Resolver, Result,
        WaitForError, WaitForOptions,
    };
}
