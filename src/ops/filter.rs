use crate::{
  observable::{CoreObservable, ObservableType},
  observer::Observer,
  subscription::{SerialSubscription, Subscription},
};

pub struct Filter<S, F> {
  pub(crate) source: S,
  pub(crate) predicate: F,
}

impl<S: Clone, F: Clone> Clone for Filter<S, F> {
  fn clone(&self) -> Self {
    Filter { source: self.source.clone(), predicate: self.predicate.clone() }
  }
}

impl<S: ObservableType, F> ObservableType for Filter<S, F> {
  type Item = S::Item;
  type Err = S::Err;
}

impl<S, F> CoreObservable for Filter<S, F>
where
  S: CoreObservable,
  F: FnMut(&S::Item) -> bool + Send + 'static,
{
  type Unsub = S::Unsub;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<S::Item, S::Err> + Send + 'static,
  {
    self.source.actual_subscribe(FilterObserver { observer, predicate: self.predicate })
  }
}

pub struct FilterObserver<O, F> {
  observer: O,
  predicate: F,
}

impl<Item, Err, O, F> Observer<Item, Err> for FilterObserver<O, F>
where
  O: Observer<Item, Err>,
  F: FnMut(&Item) -> bool,
{
  fn next(&mut self, value: Item) {
    if (self.predicate)(&value) {
      self.observer.next(value)
    }
  }

  forward_terminals!(observer);
}

/// Emits only the value at `index`, then completes at once.
#[derive(Clone)]
pub struct ElementAt<S> {
  pub(crate) source: S,
  pub(crate) index: usize,
}

impl<S: ObservableType> ObservableType for ElementAt<S> {
  type Item = S::Item;
  type Err = S::Err;
}

impl<S: CoreObservable> CoreObservable for ElementAt<S> {
  type Unsub = SerialSubscription;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<S::Item, S::Err> + Send + 'static,
  {
    let upstream = SerialSubscription::new();
    let observer = ElementAtObserver {
      observer: Some(observer),
      remaining: self.index,
      upstream: upstream.clone(),
    };
    upstream.set(self.source.actual_subscribe(observer));
    upstream
  }
}

pub struct ElementAtObserver<O> {
  observer: Option<O>,
  remaining: usize,
  upstream: SerialSubscription,
}

impl<Item, Err, O> Observer<Item, Err> for ElementAtObserver<O>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) {
    if self.remaining > 0 {
      self.remaining -= 1;
      return;
    }
    if let Some(mut observer) = self.observer.take() {
      self.upstream.clone().unsubscribe();
      observer.next(value);
      observer.complete();
    }
  }

  forward_terminals!(observer);
}

#[derive(Clone)]
pub struct IgnoreElements<S> {
  pub(crate) source: S,
}

impl<S: ObservableType> ObservableType for IgnoreElements<S> {
  type Item = S::Item;
  type Err = S::Err;
}

impl<S: CoreObservable> CoreObservable for IgnoreElements<S> {
  type Unsub = S::Unsub;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<S::Item, S::Err> + Send + 'static,
  {
    self.source.actual_subscribe(IgnoreElementsObserver(observer))
  }
}

pub struct IgnoreElementsObserver<O>(O);

impl<Item, Err, O> Observer<Item, Err> for IgnoreElementsObserver<O>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, _value: Item) {}

  fn error(self, err: Err) { self.0.error(err) }

  fn complete(self) { self.0.complete() }

  fn is_closed(&self) -> bool { self.0.is_closed() }
}
