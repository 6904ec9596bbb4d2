//! Everything needed to build and subscribe to streams.
//!
//! ```rust
//! use rxflow::prelude::*;
//! ```

pub use std::convert::Infallible;

#[cfg(feature = "tokio-scheduler")]
pub use crate::scheduler::TokioScheduler;
pub use crate::{
  error::{StreamError, TimeoutError},
  factory::Shared,
  notification::Notification,
  observable::{
    BoxedObservable, BoxedObservableClone, ConnectableObservable, Connection, CoreObservable,
    Emitter, Observable, ObservableType,
  },
  observer::Observer,
  ops::{RetryConfig, RetryPolicy},
  scheduler::{Duration, Scheduler, TaskHandle, TestScheduler, ThreadScheduler},
  subject::{BehaviorSubject, ReplaySubject, Subject},
  subscriber::SubscriptionHandle,
  subscription::{
    BoxedSubscription, ClosureSubscription, DisposeBag, SerialSubscription, Subscription,
    SubscriptionGuard,
  },
};
