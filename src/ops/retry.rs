//! Resubscribe-on-error recovery.
//!
//! [`Retry`] subscribes to a fresh clone of its upstream every time the
//! previous attempt failed and its [`RetryPolicy`] allows another one. The
//! downstream observer is shared by all attempts and only sees the final
//! error, once the policy gives up.
//!
//! ```rust
//! use std::sync::{
//!   atomic::{AtomicUsize, Ordering},
//!   Arc,
//! };
//!
//! use rxflow::prelude::*;
//!
//! let attempts = Arc::new(AtomicUsize::new(0));
//! let c_attempts = attempts.clone();
//! let source = Shared::create(move |emitter: Emitter<i32, &'static str>| {
//!   if c_attempts.fetch_add(1, Ordering::SeqCst) < 2 {
//!     emitter.error("flaky");
//!   } else {
//!     emitter.next(1);
//!     emitter.complete();
//!   }
//! });
//!
//! let _ = source.retry_max(5).on_error(|_| {}).subscribe(|v| assert_eq!(v, 1));
//! assert_eq!(attempts.load(Ordering::SeqCst), 3);
//! ```

use crate::{
  observable::{CoreObservable, ObservableType},
  observer::Observer,
  rc::MutArc,
  subscription::{SerialSubscription, Subscription},
};

/// Decides whether a failed attempt is followed by another one.
///
/// Closures `Fn(&Err, usize) -> bool` are policies too.
pub trait RetryPolicy<Err>: Clone {
  /// `failures` counts the failed attempts so far, this one included (or,
  /// with [`reset_on_success`](RetryPolicy::reset_on_success), those since
  /// the last value).
  fn should_retry(&self, err: &Err, failures: usize) -> bool;

  /// Whether a received value resets the failure count.
  fn reset_on_success(&self) -> bool { false }
}

impl<Err, F> RetryPolicy<Err> for F
where
  F: Fn(&Err, usize) -> bool + Clone,
{
  fn should_retry(&self, err: &Err, failures: usize) -> bool { self(err, failures) }
}

/// The stock [`RetryPolicy`]: retries any error, optionally bounded.
///
/// ```rust
/// use rxflow::prelude::*;
///
/// let config = RetryConfig::new().max_attempts(3).reset_on_success();
/// assert!(RetryPolicy::<()>::should_retry(&config, &(), 2));
/// assert!(!RetryPolicy::<()>::should_retry(&config, &(), 3));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryConfig {
  max_attempts: Option<usize>,
  reset_on_success: bool,
}

impl RetryConfig {
  /// Unlimited attempts, no reset.
  pub fn new() -> Self { Self::default() }

  /// Subscribe at most `n` times in total, the first attempt included.
  pub fn max_attempts(mut self, n: usize) -> Self {
    self.max_attempts = Some(n);
    self
  }

  pub fn reset_on_success(mut self) -> Self {
    self.reset_on_success = true;
    self
  }
}

impl<Err> RetryPolicy<Err> for RetryConfig {
  fn should_retry(&self, _err: &Err, failures: usize) -> bool {
    self.max_attempts.map_or(true, |max| failures < max)
  }

  fn reset_on_success(&self) -> bool { self.reset_on_success }
}

#[derive(Clone)]
pub struct Retry<S, P> {
  pub(crate) source: S,
  pub(crate) policy: P,
}

impl<S: ObservableType, P> ObservableType for Retry<S, P> {
  type Item = S::Item;
  type Err = S::Err;
}

impl<S, P> CoreObservable for Retry<S, P>
where
  S: CoreObservable + Clone + Send + 'static,
  P: RetryPolicy<S::Err> + Send + 'static,
{
  type Unsub = SerialSubscription;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<S::Item, S::Err> + Send + 'static,
  {
    let ctx = RetryContext {
      source: self.source,
      policy: self.policy,
      observer: MutArc::own(Some(observer)),
      state: MutArc::own(RetryState { failures: 0, subscribing: false, resubscribe: false }),
      upstream: SerialSubscription::new(),
    };
    ctx.run();
    ctx.upstream
  }
}

struct RetryState {
  failures: usize,
  // Set while `actual_subscribe` of an attempt is on the stack, so an error
  // raised synchronously by that attempt loops instead of recursing.
  subscribing: bool,
  resubscribe: bool,
}

struct RetryContext<S, P, O> {
  source: S,
  policy: P,
  observer: MutArc<Option<O>>,
  state: MutArc<RetryState>,
  upstream: SerialSubscription,
}

impl<S: Clone, P: Clone, O> Clone for RetryContext<S, P, O> {
  fn clone(&self) -> Self {
    RetryContext {
      source: self.source.clone(),
      policy: self.policy.clone(),
      observer: self.observer.clone(),
      state: self.state.clone(),
      upstream: self.upstream.clone(),
    }
  }
}

impl<S, P, O> RetryContext<S, P, O>
where
  S: CoreObservable + Clone + Send + 'static,
  P: RetryPolicy<S::Err> + Send + 'static,
  O: Observer<S::Item, S::Err> + Send + 'static,
{
  fn run(&self) {
    loop {
      {
        let mut state = self.state.rc_deref_mut();
        state.subscribing = true;
        state.resubscribe = false;
      }
      let unsub = self.source.clone().actual_subscribe(RetryObserver(self.clone()));
      self.upstream.set(unsub);
      let again = {
        let mut state = self.state.rc_deref_mut();
        state.subscribing = false;
        state.resubscribe
      };
      if !again || self.upstream.is_closed() {
        break;
      }
    }
  }
}

pub struct RetryObserver<S, P, O>(RetryContext<S, P, O>);

impl<S, P, O> Observer<S::Item, S::Err> for RetryObserver<S, P, O>
where
  S: CoreObservable + Clone + Send + 'static,
  P: RetryPolicy<S::Err> + Send + 'static,
  O: Observer<S::Item, S::Err> + Send + 'static,
{
  fn next(&mut self, value: S::Item) {
    if self.0.policy.reset_on_success() {
      self.0.state.rc_deref_mut().failures = 0;
    }
    self.0.observer.next(value);
  }

  fn error(self, err: S::Err) {
    let failures = {
      let mut state = self.0.state.rc_deref_mut();
      state.failures += 1;
      state.failures
    };
    if !self.0.policy.should_retry(&err, failures) || self.0.upstream.is_closed() {
      self.0.upstream.clone().unsubscribe();
      self.0.observer.error(err);
      return;
    }
    tracing::debug!(failures, "retrying after error");
    let nested = {
      let mut state = self.0.state.rc_deref_mut();
      state.resubscribe = state.subscribing;
      state.subscribing
    };
    if !nested {
      self.0.run();
    }
  }

  fn complete(self) { self.0.observer.complete() }

  fn is_closed(&self) -> bool { self.0.observer.is_closed() }
}

#[cfg(test)]
mod tests {
  use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
  };

  use crate::prelude::*;

  /// A cold source whose n-th subscription (0-based) runs `script(n)`.
  fn scripted<F>(
    script: F,
  ) -> (Arc<AtomicUsize>, impl Observable<Item = i32, Err = &'static str> + Clone + Send + 'static)
  where
    F: Fn(usize, &Emitter<i32, &'static str>) + Clone + Send + 'static,
  {
    let attempts = Arc::new(AtomicUsize::new(0));
    let c_attempts = attempts.clone();
    let source = Shared::create(move |emitter: Emitter<i32, &'static str>| {
      let attempt = c_attempts.fetch_add(1, Ordering::SeqCst);
      script(attempt, &emitter);
    });
    (attempts, source)
  }

  #[rxflow_macro::test]
  fn retry_max_counts_total_attempts() {
    let (attempts, source) = scripted(|_, emitter| emitter.error("down"));
    let errors = Arc::new(Mutex::new(vec![]));
    let c_errors = errors.clone();
    let _ = source
      .retry_max(3)
      .on_error(move |e| c_errors.lock().unwrap().push(e))
      .subscribe(|_| {});
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
    assert_eq!(*errors.lock().unwrap(), vec!["down"]);
  }

  #[rxflow_macro::test]
  fn unbounded_retry_until_success() {
    let (attempts, source) = scripted(|n, emitter| {
      if n < 4 {
        emitter.next(-1);
        emitter.error("again");
      } else {
        emitter.next(10);
        emitter.complete();
      }
    });
    let seen = Arc::new(Mutex::new(vec![]));
    let c_seen = seen.clone();
    let _ = source.retry().on_error(|_| {}).subscribe(move |v| c_seen.lock().unwrap().push(v));
    assert_eq!(attempts.load(Ordering::SeqCst), 5);
    assert_eq!(*seen.lock().unwrap(), vec![-1, -1, -1, -1, 10]);
  }

  #[rxflow_macro::test]
  fn reset_on_success_restarts_the_count() {
    let (attempts, source) = scripted(|n, emitter| {
      if n < 2 {
        emitter.next(n as i32);
      }
      emitter.error("lost");
    });
    let _ = source
      .retry_with(RetryConfig::new().max_attempts(2).reset_on_success())
      .on_error(|_| {})
      .subscribe(|_| {});
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
  }

  #[rxflow_macro::test]
  fn closure_policy_inspects_the_error() {
    let (attempts, source) =
      scripted(|n, emitter| emitter.error(if n < 2 { "transient" } else { "fatal" }));
    let err = Arc::new(Mutex::new(None));
    let c_err = err.clone();
    let _ = source
      .retry_with(|e: &&'static str, _failures: usize| *e == "transient")
      .on_error(move |e| *c_err.lock().unwrap() = Some(e))
      .subscribe(|_| {});
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
    assert_eq!(*err.lock().unwrap(), Some("fatal"));
  }

  #[rxflow_macro::test]
  fn asynchronous_failures_resubscribe() {
    let scheduler = TestScheduler::new();
    let attempts = Arc::new(AtomicUsize::new(0));
    let c_attempts = attempts.clone();
    let c_scheduler = scheduler.clone();
    let source = Shared::defer(move || {
      c_attempts.fetch_add(1, Ordering::SeqCst);
      Shared::timer(Duration::from_millis(10), c_scheduler.clone())
        .map_err(|e: Infallible| -> &'static str { match e {} })
        .try_map(|_| Err::<usize, _>("tick failed"))
    });
    let sub = source.retry().on_error(|_| {}).subscribe(|_| {});

    scheduler.advance_by(Duration::from_millis(35));
    assert_eq!(attempts.load(Ordering::SeqCst), 4);
    sub.unsubscribe();
    assert_eq!(scheduler.pending_count(), 0);
  }
}
