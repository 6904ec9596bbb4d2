//! Side-effect operators that observe a stream without reshaping it.

use std::convert::Infallible;

use crate::{
  observable::{CoreObservable, ObservableType},
  observer::Observer,
  rc::MutArc,
  subscription::Subscription,
};

/// Handles the error with `func` and makes the stream infallible. The
/// output ends without a completion when the source fails.
#[derive(Clone)]
pub struct OnError<S, F> {
  pub(crate) source: S,
  pub(crate) func: F,
}

impl<S: ObservableType, F> ObservableType for OnError<S, F> {
  type Item = S::Item;
  type Err = Infallible;
}

impl<S, F> CoreObservable for OnError<S, F>
where
  S: CoreObservable,
  F: FnOnce(S::Err) + Send + 'static,
{
  type Unsub = S::Unsub;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<S::Item, Infallible> + Send + 'static,
  {
    self.source.actual_subscribe(OnErrorObserver { observer, func: self.func })
  }
}

pub struct OnErrorObserver<O, F> {
  observer: O,
  func: F,
}

impl<Item, Err, O, F> Observer<Item, Err> for OnErrorObserver<O, F>
where
  O: Observer<Item, Infallible>,
  F: FnOnce(Err),
{
  #[inline]
  fn next(&mut self, value: Item) { self.observer.next(value) }

  fn error(self, err: Err) { (self.func)(err) }

  #[inline]
  fn complete(self) { self.observer.complete() }

  #[inline]
  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

/// Runs `func` when the source completes, before the completion is
/// forwarded.
#[derive(Clone)]
pub struct OnComplete<S, F> {
  pub(crate) source: S,
  pub(crate) func: F,
}

impl<S: ObservableType, F> ObservableType for OnComplete<S, F> {
  type Item = S::Item;
  type Err = S::Err;
}

impl<S, F> CoreObservable for OnComplete<S, F>
where
  S: CoreObservable,
  F: FnOnce() + Send + 'static,
{
  type Unsub = S::Unsub;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<S::Item, S::Err> + Send + 'static,
  {
    self.source.actual_subscribe(OnCompleteObserver { observer, func: self.func })
  }
}

pub struct OnCompleteObserver<O, F> {
  observer: O,
  func: F,
}

impl<Item, Err, O, F> Observer<Item, Err> for OnCompleteObserver<O, F>
where
  O: Observer<Item, Err>,
  F: FnOnce(),
{
  #[inline]
  fn next(&mut self, value: Item) { self.observer.next(value) }

  #[inline]
  fn error(self, err: Err) { self.observer.error(err) }

  fn complete(self) {
    (self.func)();
    self.observer.complete();
  }

  #[inline]
  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

/// Runs `func` exactly once when the subscription ends, whether by
/// completion, error or release. On a terminal event it runs after the
/// event was forwarded.
#[derive(Clone)]
pub struct Finalize<S, F> {
  pub(crate) source: S,
  pub(crate) func: F,
}

impl<S: ObservableType, F> ObservableType for Finalize<S, F> {
  type Item = S::Item;
  type Err = S::Err;
}

impl<S, F> CoreObservable for Finalize<S, F>
where
  S: CoreObservable,
  F: FnOnce() + Send + 'static,
{
  type Unsub = FinalizeSubscription<S::Unsub, F>;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<S::Item, S::Err> + Send + 'static,
  {
    let func = MutArc::own(Some(self.func));
    let subscription =
      self.source.actual_subscribe(FinalizeObserver { observer, func: func.clone() });
    FinalizeSubscription { subscription, func }
  }
}

fn run_once<F: FnOnce()>(func: &MutArc<Option<F>>) {
  let func = func.rc_deref_mut().take();
  if let Some(func) = func {
    func();
  }
}

pub struct FinalizeObserver<O, F> {
  observer: O,
  func: MutArc<Option<F>>,
}

impl<Item, Err, O, F> Observer<Item, Err> for FinalizeObserver<O, F>
where
  O: Observer<Item, Err>,
  F: FnOnce(),
{
  #[inline]
  fn next(&mut self, value: Item) { self.observer.next(value) }

  fn error(self, err: Err) {
    self.observer.error(err);
    run_once(&self.func);
  }

  fn complete(self) {
    self.observer.complete();
    run_once(&self.func);
  }

  #[inline]
  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

pub struct FinalizeSubscription<U, F> {
  subscription: U,
  func: MutArc<Option<F>>,
}

impl<U: Subscription, F: FnOnce()> Subscription for FinalizeSubscription<U, F> {
  fn unsubscribe(self) {
    self.subscription.unsubscribe();
    run_once(&self.func);
  }

  fn is_closed(&self) -> bool { self.func.rc_deref().is_none() }
}

/// Calls `func` with a reference to every value before forwarding it.
#[derive(Clone)]
pub struct Tap<S, F> {
  pub(crate) source: S,
  pub(crate) func: F,
}

impl<S: ObservableType, F> ObservableType for Tap<S, F> {
  type Item = S::Item;
  type Err = S::Err;
}

impl<S, F> CoreObservable for Tap<S, F>
where
  S: CoreObservable,
  F: FnMut(&S::Item) + Send + 'static,
{
  type Unsub = S::Unsub;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<S::Item, S::Err> + Send + 'static,
  {
    self.source.actual_subscribe(TapObserver { observer, func: self.func })
  }
}

pub struct TapObserver<O, F> {
  observer: O,
  func: F,
}

impl<Item, Err, O, F> Observer<Item, Err> for TapObserver<O, F>
where
  O: Observer<Item, Err>,
  F: FnMut(&Item),
{
  fn next(&mut self, value: Item) {
    (self.func)(&value);
    self.observer.next(value);
  }

  forward_terminals!(observer);
}
