//! Observable traits and the chained operator API.
//!
//! * [`ObservableType`] names the `Item` and `Err` a stream carries.
//! * [`CoreObservable`] is what every source and operator implements: a
//!   one-shot `actual_subscribe` that wires an observer to a live production.
//! * [`Observable`] is blanket-implemented for every `CoreObservable` and
//!   carries the user-facing API: `subscribe` and every operator.
//!
//! Observables are plain values describing how to produce a sequence. Cloning
//! one gives an independent recipe, so subscribing twice to a cold source
//! runs two independent productions.

use std::convert::Infallible;

use crate::{
  observer::{FnObserver, Observer},
  ops::*,
  scheduler::{Duration, Scheduler},
  subject::{ReplaySubject, Subject},
  subscriber::{Subscriber, SubscriptionHandle},
  subscription::Subscription,
};

mod boxed;
mod connectable;
mod create;
mod defer;
mod from_iter;
mod interval;
mod timer;
mod trivial;

pub use boxed::*;
pub use connectable::*;
pub use create::*;
pub use defer::*;
pub use from_iter::*;
pub use interval::*;
pub use timer::*;
pub use trivial::*;

/// The value and error types a stream carries.
pub trait ObservableType {
  type Item;
  type Err;
}

/// The subscription primitive implemented by every source and operator.
///
/// `actual_subscribe` consumes the observable value. Operators that need to
/// subscribe to the same upstream more than once (`retry`, `repeat`-like
/// recovery) require the upstream to be `Clone` and subscribe to clones.
pub trait CoreObservable: ObservableType + Sized {
  type Unsub: Subscription + Send + 'static;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Self::Item, Self::Err> + Send + 'static;
}

/// The user-facing observable API.
pub trait Observable: CoreObservable {
  /// Subscribe with a `next` closure.
  ///
  /// Only available when the stream cannot fail (`Err = Infallible`). For a
  /// fallible stream the error policy must be chosen explicitly first, for
  /// example with [`on_error`](Observable::on_error), [`catch`](Observable::catch)
  /// or [`retry`](Observable::retry), or by passing a full observer to
  /// [`subscribe_with`](Observable::subscribe_with).
  fn subscribe<F>(self, next: F) -> SubscriptionHandle<Self::Unsub>
  where
    Self: ObservableType<Err = Infallible>,
    F: FnMut(Self::Item) + Send + 'static,
  {
    self.subscribe_with(FnObserver::new(next))
  }

  /// Subscribe a full observer.
  fn subscribe_with<O>(self, observer: O) -> SubscriptionHandle<Self::Unsub>
  where
    O: Observer<Self::Item, Self::Err> + Send + 'static,
  {
    let (subscriber, closed) = Subscriber::new(observer);
    let unsub = self.actual_subscribe(subscriber);
    SubscriptionHandle::new(closed, unsub)
  }

  /// Erase the concrete type.
  fn box_it(self) -> BoxedObservable<Self::Item, Self::Err>
  where
    Self: Send + 'static,
    Self::Item: 'static,
    Self::Err: 'static,
  {
    BoxedObservable::new(self)
  }

  /// Erase the concrete type, keeping the stream cloneable.
  fn box_clone_it(self) -> BoxedObservableClone<Self::Item, Self::Err>
  where
    Self: Clone + Send + 'static,
    Self::Item: 'static,
    Self::Err: 'static,
  {
    BoxedObservableClone::new(self)
  }

  // ==================== transformation ====================

  /// Apply `f` to each value.
  fn map<B, F>(self, f: F) -> Map<Self, F>
  where
    F: FnMut(Self::Item) -> B,
  {
    Map { source: self, func: f }
  }

  /// Apply a fallible `f` to each value. The first `Err` returned terminates
  /// the stream with that error.
  fn try_map<B, F>(self, f: F) -> TryMap<Self, F>
  where
    F: FnMut(Self::Item) -> Result<B, Self::Err>,
  {
    TryMap { source: self, func: f }
  }

  fn map_err<E, F>(self, f: F) -> MapErr<Self, F>
  where
    F: FnOnce(Self::Err) -> E,
  {
    MapErr { source: self, func: f }
  }

  /// Flatten a stream of observables, running at most `concurrent` inner
  /// subscriptions at once. Inner observables beyond the limit are queued and
  /// subscribed in arrival order as active ones complete.
  fn merge_all(self, concurrent: usize) -> MergeAll<Self> {
    MergeAll { source: self, concurrent: concurrent.max(1) }
  }

  /// Map each value to an observable and merge all of them.
  fn flat_map<Inner, F>(self, f: F) -> MergeAll<Map<Self, F>>
  where
    F: FnMut(Self::Item) -> Inner,
    Inner: ObservableType<Err = Self::Err>,
  {
    MergeAll { source: Map { source: self, func: f }, concurrent: usize::MAX }
  }

  /// Map each value to an observable and concatenate them in arrival order.
  fn concat_map<Inner, F>(self, f: F) -> MergeAll<Map<Self, F>>
  where
    F: FnMut(Self::Item) -> Inner,
    Inner: ObservableType<Err = Self::Err>,
  {
    MergeAll { source: Map { source: self, func: f }, concurrent: 1 }
  }

  /// Map each value to an observable and only follow the latest one.
  fn flat_map_latest<Inner, F>(self, f: F) -> SwitchLatest<Map<Self, F>>
  where
    F: FnMut(Self::Item) -> Inner,
    Inner: ObservableType<Err = Self::Err>,
  {
    SwitchLatest { source: Map { source: self, func: f } }
  }

  /// Forward only the most recent inner observable.
  fn switch_latest(self) -> SwitchLatest<Self> { SwitchLatest { source: self } }

  /// Emit every intermediate accumulator.
  fn scan<B, F>(self, seed: B, f: F) -> Scan<Self, F, B>
  where
    F: FnMut(B, Self::Item) -> B,
  {
    Scan { source: self, seed, func: f }
  }

  /// Emit only the final accumulator, on completion.
  fn reduce<B, F>(self, seed: B, f: F) -> Reduce<Self, F, B>
  where
    F: FnMut(B, Self::Item) -> B,
  {
    Reduce { source: self, seed, func: f }
  }

  fn materialize(self) -> Materialize<Self> { Materialize { source: self } }

  fn dematerialize(self) -> Dematerialize<Self> { Dematerialize { source: self } }

  /// Collect all values into one `Vec`, emitted on completion.
  fn to_array(self) -> ToArray<Self> { ToArray { source: self } }

  /// Pair every value with its zero-based index.
  fn enumerate(self) -> Enumerate<Self> { Enumerate { source: self } }

  // ==================== filtering ====================

  fn filter<F>(self, predicate: F) -> Filter<Self, F>
  where
    F: FnMut(&Self::Item) -> bool,
  {
    Filter { source: self, predicate }
  }

  /// Emit only the value at `index`, then complete without waiting for the
  /// upstream.
  fn element_at(self, index: usize) -> ElementAt<Self> { ElementAt { source: self, index } }

  fn ignore_elements(self) -> IgnoreElements<Self> { IgnoreElements { source: self } }

  fn distinct_until_changed(self) -> DistinctUntilChanged<Self> {
    DistinctUntilChanged { source: self }
  }

  fn skip(self, count: usize) -> Skip<Self> { Skip { source: self, count } }

  /// Emit the first `count` values, then complete and release the upstream.
  fn take(self, count: usize) -> Take<Self> { Take { source: self, count } }

  fn skip_while<F>(self, predicate: F) -> SkipWhile<Self, F>
  where
    F: FnMut(&Self::Item) -> bool,
  {
    SkipWhile { source: self, predicate }
  }

  fn take_while<F>(self, predicate: F) -> TakeWhile<Self, F>
  where
    F: FnMut(&Self::Item) -> bool,
  {
    TakeWhile { source: self, predicate }
  }

  /// Drop values until `notifier` emits its first event of any kind.
  fn skip_until<N>(self, notifier: N) -> SkipUntil<Self, N> { SkipUntil { source: self, notifier } }

  /// Forward values until `notifier` emits its first event of any kind, then
  /// complete and release both streams.
  fn take_until<N>(self, notifier: N) -> TakeUntil<Self, N> { TakeUntil { source: self, notifier } }

  // ==================== combination ====================

  /// Emit `value` before the upstream's values.
  fn start_with(self, value: Self::Item) -> StartWith<Self, Self::Item> {
    StartWith { source: self, value }
  }

  /// Subscribe to `next` once this stream completes.
  fn concat<Next>(self, next: Next) -> Concat<Self, Next>
  where
    Next: ObservableType<Item = Self::Item, Err = Self::Err>,
  {
    Concat { first: self, second: next }
  }

  fn merge<Other>(self, other: Other) -> Merge<Self, Other>
  where
    Other: ObservableType<Item = Self::Item, Err = Self::Err>,
  {
    Merge { source_a: self, source_b: other }
  }

  /// Combine the latest values of both streams with `selector` whenever
  /// either emits, once both have emitted.
  fn combine_latest<Other, F, B>(self, other: Other, selector: F) -> CombineLatest<Self, Other, F>
  where
    Other: ObservableType<Err = Self::Err>,
    F: FnMut(&Self::Item, &Other::Item) -> B,
  {
    CombineLatest { source_a: self, source_b: other, selector }
  }

  /// Pair values of both streams strictly by arrival order.
  fn zip<Other>(self, other: Other) -> Zip<Self, Other>
  where
    Other: ObservableType<Err = Self::Err>,
  {
    Zip { source_a: self, source_b: other }
  }

  /// Pair each value with the latest value of `other`; values that arrive
  /// before `other` emitted are dropped.
  fn with_latest_from<Other>(self, other: Other) -> WithLatestFrom<Self, Other>
  where
    Other: ObservableType<Err = Self::Err>,
  {
    WithLatestFrom { source: self, other }
  }

  /// Emit the latest fresh value whenever `sampler` emits.
  fn sample<N>(self, sampler: N) -> Sample<Self, N> { Sample { source: self, sampler } }

  /// Mirror whichever stream produces an event first.
  fn amb<Other>(self, other: Other) -> Amb<Self, Other>
  where
    Other: ObservableType<Item = Self::Item, Err = Self::Err>,
  {
    Amb { source_a: self, source_b: other }
  }

  // ==================== time ====================

  fn delay<SD: Scheduler>(self, delay: Duration, scheduler: SD) -> Delay<Self, SD> {
    Delay { source: self, delay, scheduler }
  }

  fn delay_subscription<SD: Scheduler>(
    self, delay: Duration, scheduler: SD,
  ) -> DelaySubscription<Self, SD> {
    DelaySubscription { source: self, delay, scheduler }
  }

  /// Group values into `Vec`s, flushed every `time_span` or once `count`
  /// values are collected, whichever comes first.
  fn buffer<SD: Scheduler>(
    self, time_span: Duration, count: usize, scheduler: SD,
  ) -> Buffer<Self, SD> {
    Buffer { source: self, time_span, count: count.max(1), scheduler }
  }

  /// Like [`buffer`](Observable::buffer), but each group is emitted as its
  /// own observable, opened at the start of the group.
  fn window<SD: Scheduler>(
    self, time_span: Duration, count: usize, scheduler: SD,
  ) -> Window<Self, SD> {
    Window { source: self, time_span, count: count.max(1), scheduler }
  }

  /// Fail with [`TimeoutError`](crate::error::TimeoutError) when no event
  /// arrives within `due` of the subscription or of the previous event.
  fn timeout<SD: Scheduler>(self, due: Duration, scheduler: SD) -> Timeout<Self, SD> {
    Timeout { source: self, due, scheduler }
  }

  // ==================== multicast ====================

  /// Share one upstream subscription among many observers, started by
  /// [`connect`](ConnectableObservable::connect).
  fn publish(self) -> ConnectableObservable<Self, Subject<Self::Item, Self::Err>> {
    ConnectableObservable::new(self, Subject::default())
  }

  /// Like [`publish`](Observable::publish), replaying the last `capacity`
  /// values to late observers.
  fn replay(
    self, capacity: usize,
  ) -> ConnectableObservable<Self, ReplaySubject<Self::Item, Self::Err>>
  where
    Self::Item: Clone,
    Self::Err: Clone,
  {
    ConnectableObservable::new(self, ReplaySubject::with_capacity(capacity))
  }

  fn replay_all(self) -> ConnectableObservable<Self, ReplaySubject<Self::Item, Self::Err>>
  where
    Self::Item: Clone,
    Self::Err: Clone,
  {
    ConnectableObservable::new(self, ReplaySubject::unbounded())
  }

  // ==================== error recovery ====================

  /// On error, continue with the observable returned by `handler`.
  fn catch<R, F>(self, handler: F) -> Catch<Self, F>
  where
    F: FnOnce(Self::Err) -> R,
    R: ObservableType<Item = Self::Item>,
  {
    Catch { source: self, handler }
  }

  /// On error, emit `value` and complete.
  fn catch_and_return(self, value: Self::Item) -> CatchAndReturn<Self, Self::Item> {
    CatchAndReturn { source: self, value }
  }

  /// Resubscribe on every error, without limit.
  fn retry(self) -> Retry<Self, RetryConfig> { self.retry_with(RetryConfig::new()) }

  /// Resubscribe on error, with at most `max_attempts` subscriptions in total.
  /// The last error is surfaced once they are used up.
  fn retry_max(self, max_attempts: usize) -> Retry<Self, RetryConfig> {
    self.retry_with(RetryConfig::new().max_attempts(max_attempts))
  }

  fn retry_with<P>(self, policy: P) -> Retry<Self, P>
  where
    P: RetryPolicy<Self::Err>,
  {
    Retry { source: self, policy }
  }

  /// Resubscribe when the notifier built from the error stream emits.
  fn retry_when<N, F>(self, notifier: F) -> RetryWhen<Self, F>
  where
    F: FnOnce(Subject<Self::Err, Self::Err>) -> N,
  {
    RetryWhen { source: self, notifier }
  }

  // ==================== lifecycle ====================

  /// Handle the error and make the stream infallible.
  fn on_error<F>(self, f: F) -> OnError<Self, F>
  where
    F: FnOnce(Self::Err),
  {
    OnError { source: self, func: f }
  }

  fn on_complete<F>(self, f: F) -> OnComplete<Self, F>
  where
    F: FnOnce(),
  {
    OnComplete { source: self, func: f }
  }

  /// Run `f` exactly once when the subscription ends: after completion,
  /// after an error, or when it is released, whichever happens first.
  fn finalize<F>(self, f: F) -> Finalize<Self, F>
  where
    F: FnOnce(),
  {
    Finalize { source: self, func: f }
  }

  /// Observe each value without changing the stream.
  fn tap<F>(self, f: F) -> Tap<Self, F>
  where
    F: FnMut(&Self::Item),
  {
    Tap { source: self, func: f }
  }
}

impl<T: CoreObservable> Observable for T {}
