//! # rxflow: thread-safe reactive streams
//!
//! Observables describe how to produce a sequence of values followed by at
//! most one terminal event (`error` or `complete`). Nothing runs until an
//! observer subscribes, and every subscription gets its own production.
//!
//! ```rust
//! use std::sync::{Arc, Mutex};
//!
//! use rxflow::prelude::*;
//!
//! let seen = Arc::new(Mutex::new(vec![]));
//! let c_seen = seen.clone();
//! let _ = Shared::from_iter(0..10)
//!   .filter(|v| v % 2 == 0)
//!   .map(|v| v * 2)
//!   .subscribe(move |v| c_seen.lock().unwrap().push(v));
//! assert_eq!(*seen.lock().unwrap(), vec![0, 4, 8, 12, 16]);
//! ```
//!
//! ## Key Concepts
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Shared`] | Static constructors for sources |
//! | [`Observable`] | The operator API, implemented for every stream |
//! | [`Observer`] | Consumes `next`, `error`, and `complete` events |
//! | [`Subscription`] | Handle to cancel an active subscription |
//! | [`Subject`] | Hot, multicast streams |
//! | [`Scheduler`] | Where and when time-based work runs |
//!
//! Every type in this crate is `Send`; values, observers and subscriptions
//! may move between threads freely.
//!
//! ## Feature Flags
//!
//! - **`tokio-scheduler`** (default): the [`TokioScheduler`]
//!
//! [`Shared`]: prelude::Shared
//! [`Observable`]: observable::Observable
//! [`Observer`]: observer::Observer
//! [`Subscription`]: subscription::Subscription
//! [`Subject`]: subject::Subject
//! [`Scheduler`]: scheduler::Scheduler
//! [`TokioScheduler`]: prelude::TokioScheduler

pub mod error;
pub mod factory;
pub mod notification;
pub mod observable;
pub mod observer;
pub mod ops;
pub mod prelude;
pub mod rc;
pub mod scheduler;
pub mod subject;
pub mod subscriber;
pub mod subscription;

pub use prelude::*;

// Run the README snippets as doctests.
#[cfg(doctest)]
mod __markdown_doctests {
  mod readme {
    #![doc = include_str!("../README.md")]
  }
}
