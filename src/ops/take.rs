use crate::{
  observable::{CoreObservable, ObservableType},
  observer::Observer,
  subscription::{SerialSubscription, Subscription},
};

/// Forwards the first `count` values, then completes and releases the
/// upstream without waiting for it.
#[derive(Clone)]
pub struct Take<S> {
  pub(crate) source: S,
  pub(crate) count: usize,
}

impl<S: ObservableType> ObservableType for Take<S> {
  type Item = S::Item;
  type Err = S::Err;
}

impl<S: CoreObservable> CoreObservable for Take<S> {
  type Unsub = SerialSubscription;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<S::Item, S::Err> + Send + 'static,
  {
    let upstream = SerialSubscription::new();
    if self.count == 0 {
      observer.complete();
      return upstream;
    }
    let observer =
      TakeObserver { observer: Some(observer), remaining: self.count, upstream: upstream.clone() };
    upstream.set(self.source.actual_subscribe(observer));
    upstream
  }
}

pub struct TakeObserver<O> {
  observer: Option<O>,
  remaining: usize,
  upstream: SerialSubscription,
}

impl<Item, Err, O> Observer<Item, Err> for TakeObserver<O>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) {
    let Some(observer) = self.observer.as_mut() else { return };
    self.remaining -= 1;
    observer.next(value);
    if self.remaining == 0 {
      self.upstream.clone().unsubscribe();
      self.observer.take().complete();
    }
  }

  forward_terminals!(observer);
}

/// Forwards values while the predicate holds; completes at the first value
/// that fails it.
pub struct TakeWhile<S, F> {
  pub(crate) source: S,
  pub(crate) predicate: F,
}

impl<S: Clone, F: Clone> Clone for TakeWhile<S, F> {
  fn clone(&self) -> Self {
    TakeWhile { source: self.source.clone(), predicate: self.predicate.clone() }
  }
}

impl<S: ObservableType, F> ObservableType for TakeWhile<S, F> {
  type Item = S::Item;
  type Err = S::Err;
}

impl<S, F> CoreObservable for TakeWhile<S, F>
where
  S: CoreObservable,
  F: FnMut(&S::Item) -> bool + Send + 'static,
{
  type Unsub = SerialSubscription;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<S::Item, S::Err> + Send + 'static,
  {
    let upstream = SerialSubscription::new();
    let observer = TakeWhileObserver {
      observer: Some(observer),
      predicate: self.predicate,
      upstream: upstream.clone(),
    };
    upstream.set(self.source.actual_subscribe(observer));
    upstream
  }
}

pub struct TakeWhileObserver<O, F> {
  observer: Option<O>,
  predicate: F,
  upstream: SerialSubscription,
}

impl<Item, Err, O, F> Observer<Item, Err> for TakeWhileObserver<O, F>
where
  O: Observer<Item, Err>,
  F: FnMut(&Item) -> bool,
{
  fn next(&mut self, value: Item) {
    if self.observer.is_none() {
      return;
    }
    if (self.predicate)(&value) {
      self.observer.next(value);
    } else {
      self.upstream.clone().unsubscribe();
      self.observer.take().complete();
    }
  }

  forward_terminals!(observer);
}
