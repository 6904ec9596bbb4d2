//! Static constructors for observables.
//!
//! Every source is built through the [`Shared`] marker so call sites read
//! the same way regardless of the source kind:
//!
//! ```rust
//! use std::sync::{Arc, Mutex};
//! use rxflow::prelude::*;
//!
//! let seen = Arc::new(Mutex::new(vec![]));
//! let c_seen = seen.clone();
//! let _ = Shared::from_iter(1..=4)
//!   .filter(|v| v % 2 == 0)
//!   .subscribe(move |v| c_seen.lock().unwrap().push(v));
//! assert_eq!(*seen.lock().unwrap(), vec![2, 4]);
//! ```
//!
//! Time based sources take their [`Scheduler`] explicitly; there is no
//! global default.

use std::{convert::Infallible, iter};

use crate::{
  observable::{
    CoreObservable, Create, Defer, Emitter, Empty, FromIter, Interval, Never, Observable,
    ObservableType, ThrowErr, Timer, TryCreate,
  },
  ops::{CombineLatestAll, MapErr, MergeAll, ZipAll},
  scheduler::{Duration, Scheduler},
  subscription::Subscription,
};

/// Entry point for creating observables: `Shared::of(1)`,
/// `Shared::interval(period, scheduler)`, ...
pub struct Shared;

/// Static merge/concat output: the sources are fed through `merge_all`.
pub type MergeSources<I, S> =
  MergeAll<MapErr<FromIter<I>, fn(Infallible) -> <S as ObservableType>::Err>>;

fn never_fails<E>(err: Infallible) -> E { match err {} }

impl Shared {
  /// Emit `value` and complete.
  pub fn of<Item>(value: Item) -> FromIter<iter::Once<Item>> { FromIter(iter::once(value)) }

  pub fn from_iter<I: IntoIterator>(iter: I) -> FromIter<I> { FromIter(iter) }

  pub fn empty<Item>() -> Empty<Item> { Empty::default() }

  pub fn never<Item>() -> Never<Item> { Never::default() }

  pub fn throw_err<Item, Err>(err: Err) -> ThrowErr<Item, Err> { ThrowErr::new(err) }

  /// Build a source from a producer closure. The closure runs once per
  /// subscription and returns the teardown for whatever it started (`()`
  /// when there is nothing to release).
  pub fn create<Item, Err, F, U>(producer: F) -> Create<F, Item, Err>
  where
    F: FnOnce(Emitter<Item, Err>) -> U,
    U: Subscription,
  {
    Create::new(producer)
  }

  /// Like [`create`](Shared::create), for producers whose setup can fail.
  pub fn try_create<Item, Err, F, U>(producer: F) -> TryCreate<F, Item, Err>
  where
    F: FnOnce(Emitter<Item, Err>) -> Result<U, Err>,
    U: Subscription,
  {
    TryCreate::new(producer)
  }

  /// Build the observable lazily, once per subscription.
  pub fn defer<F, S>(factory: F) -> Defer<F>
  where
    F: FnOnce() -> S,
    S: ObservableType,
  {
    Defer(factory)
  }

  pub fn interval<SD: Scheduler>(period: Duration, scheduler: SD) -> Interval<SD> {
    Interval { period, scheduler }
  }

  /// Emit `0` after `due`, then complete.
  pub fn timer<SD: Scheduler>(due: Duration, scheduler: SD) -> Timer<SD> {
    Timer { due, period: None, scheduler }
  }

  /// Emit `0` after `due`, then `1, 2, ...` every `period`.
  pub fn timer_periodic<SD: Scheduler>(
    due: Duration, period: Duration, scheduler: SD,
  ) -> Timer<SD> {
    Timer { due, period: Some(period), scheduler }
  }

  /// Merge `sources`, running at most `max_concurrent` of them at once.
  /// The rest wait in order and start as active ones complete.
  pub fn merge<I, S>(sources: I, max_concurrent: usize) -> MergeSources<I, S>
  where
    I: IntoIterator<Item = S>,
    S: CoreObservable,
    S::Err: 'static,
  {
    FromIter(sources)
      .map_err(never_fails as fn(Infallible) -> S::Err)
      .merge_all(max_concurrent)
  }

  /// Subscribe to `sources` one after another.
  pub fn concat<I, S>(sources: I) -> MergeSources<I, S>
  where
    I: IntoIterator<Item = S>,
    S: CoreObservable,
    S::Err: 'static,
  {
    Self::merge(sources, 1)
  }

  /// Combine the latest value of every source with `selector`, once each
  /// has emitted.
  pub fn combine_latest<I, S, F, B>(sources: I, selector: F) -> CombineLatestAll<S, F>
  where
    I: IntoIterator<Item = S>,
    S: ObservableType,
    F: FnMut(&[S::Item]) -> B,
  {
    CombineLatestAll { sources: sources.into_iter().collect(), selector }
  }

  /// Pair the n-th values of every source into one `Vec`.
  pub fn zip<I, S>(sources: I) -> ZipAll<S>
  where
    I: IntoIterator<Item = S>,
    S: ObservableType,
  {
    ZipAll { sources: sources.into_iter().collect() }
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{Arc, Mutex};

  use crate::prelude::*;

  #[rxflow_macro::test]
  fn of_emits_then_completes() {
    let log = Arc::new(Mutex::new(vec![]));
    let c_log = log.clone();
    let _ = Shared::of(7)
      .on_complete(move || c_log.lock().unwrap().push(-1))
      .subscribe({
        let log = log.clone();
        move |v| log.lock().unwrap().push(v)
      });
    assert_eq!(*log.lock().unwrap(), vec![7, -1]);
  }

  #[rxflow_macro::test]
  fn create_runs_per_subscription() {
    let source = Shared::create(|emitter: Emitter<i32, Infallible>| {
      emitter.next(1);
      emitter.next(2);
      emitter.complete();
      emitter.next(3);
    });
    for _ in 0..2 {
      let seen = Arc::new(Mutex::new(vec![]));
      let c_seen = seen.clone();
      let _ = source.clone().subscribe(move |v| c_seen.lock().unwrap().push(v));
      assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    }
  }

  #[rxflow_macro::test]
  fn try_create_turns_setup_failure_into_error() {
    let err = Arc::new(Mutex::new(None));
    let c_err = err.clone();
    let _ = Shared::try_create(|_emitter: Emitter<i32, String>| Err::<(), _>("refused".to_string()))
      .on_error(move |e| *c_err.lock().unwrap() = Some(e))
      .subscribe(|_| {});
    assert_eq!(err.lock().unwrap().as_deref(), Some("refused"));
  }

  #[rxflow_macro::test]
  fn timer_periodic_repeats() {
    let scheduler = TestScheduler::new();
    let seen = Arc::new(Mutex::new(vec![]));
    let c_seen = seen.clone();
    let (due, period) = (Duration::from_millis(5), Duration::from_millis(10));
    let ticks = Shared::timer_periodic(due, period, scheduler.clone());
    let sub = ticks.subscribe(move |v| c_seen.lock().unwrap().push(v));
    scheduler.advance_by(Duration::from_millis(25));
    assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2]);
    sub.unsubscribe();
    assert_eq!(scheduler.pending_count(), 0);
  }

  #[rxflow_macro::test]
  fn static_concat_runs_in_order() {
    let scheduler = TestScheduler::new();
    let seen = Arc::new(Mutex::new(vec![]));
    let c_seen = seen.clone();
    let slow = Shared::timer(Duration::from_millis(50), scheduler.clone()).map(|_| "slow").box_it();
    let fast = Shared::of("fast").box_it();
    let _ = Shared::concat(vec![slow, fast]).subscribe(move |v| c_seen.lock().unwrap().push(v));
    scheduler.flush();
    assert_eq!(*seen.lock().unwrap(), vec!["slow", "fast"]);
  }
}
