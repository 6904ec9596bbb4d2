use crate::{
  observable::{CoreObservable, ObservableType},
  observer::Observer,
  subscription::{SerialSubscription, Subscription},
};

pub struct Map<S, F> {
  pub(crate) source: S,
  pub(crate) func: F,
}

impl<S: Clone, F: Clone> Clone for Map<S, F> {
  fn clone(&self) -> Self { Map { source: self.source.clone(), func: self.func.clone() } }
}

impl<S, F, B> ObservableType for Map<S, F>
where
  S: ObservableType,
  F: FnMut(S::Item) -> B,
{
  type Item = B;
  type Err = S::Err;
}

impl<S, F, B> CoreObservable for Map<S, F>
where
  S: CoreObservable,
  F: FnMut(S::Item) -> B + Send + 'static,
{
  type Unsub = S::Unsub;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<B, S::Err> + Send + 'static,
  {
    self.source.actual_subscribe(MapObserver { observer, func: self.func })
  }
}

pub struct MapObserver<O, F> {
  observer: O,
  func: F,
}

impl<Item, Err, O, F, B> Observer<Item, Err> for MapObserver<O, F>
where
  O: Observer<B, Err>,
  F: FnMut(Item) -> B,
{
  fn next(&mut self, value: Item) { self.observer.next((self.func)(value)) }

  forward_terminals!(observer);
}

/// `map` with a fallible function. The first `Err` terminates the stream
/// and releases the upstream.
pub struct TryMap<S, F> {
  pub(crate) source: S,
  pub(crate) func: F,
}

impl<S: Clone, F: Clone> Clone for TryMap<S, F> {
  fn clone(&self) -> Self { TryMap { source: self.source.clone(), func: self.func.clone() } }
}

impl<S, F, B> ObservableType for TryMap<S, F>
where
  S: ObservableType,
  F: FnMut(S::Item) -> Result<B, S::Err>,
{
  type Item = B;
  type Err = S::Err;
}

impl<S, F, B> CoreObservable for TryMap<S, F>
where
  S: CoreObservable,
  F: FnMut(S::Item) -> Result<B, S::Err> + Send + 'static,
{
  type Unsub = SerialSubscription;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<B, S::Err> + Send + 'static,
  {
    let upstream = SerialSubscription::new();
    let observer =
      TryMapObserver { observer: Some(observer), func: self.func, upstream: upstream.clone() };
    upstream.set(self.source.actual_subscribe(observer));
    upstream
  }
}

pub struct TryMapObserver<O, F> {
  observer: Option<O>,
  func: F,
  upstream: SerialSubscription,
}

impl<Item, Err, O, F, B> Observer<Item, Err> for TryMapObserver<O, F>
where
  O: Observer<B, Err>,
  F: FnMut(Item) -> Result<B, Err>,
{
  fn next(&mut self, value: Item) {
    if self.observer.is_none() {
      return;
    }
    match (self.func)(value) {
      Ok(mapped) => self.observer.next(mapped),
      Err(err) => {
        self.upstream.clone().unsubscribe();
        self.observer.take().error(err);
      }
    }
  }

  forward_terminals!(observer);
}

/// Transform the error value, leaving values untouched.
pub struct MapErr<S, F> {
  pub(crate) source: S,
  pub(crate) func: F,
}

impl<S: Clone, F: Clone> Clone for MapErr<S, F> {
  fn clone(&self) -> Self { MapErr { source: self.source.clone(), func: self.func.clone() } }
}

impl<S, F, E> ObservableType for MapErr<S, F>
where
  S: ObservableType,
  F: FnOnce(S::Err) -> E,
{
  type Item = S::Item;
  type Err = E;
}

impl<S, F, E> CoreObservable for MapErr<S, F>
where
  S: CoreObservable,
  F: FnOnce(S::Err) -> E + Send + 'static,
{
  type Unsub = S::Unsub;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<S::Item, E> + Send + 'static,
  {
    self.source.actual_subscribe(MapErrObserver { observer, func: self.func })
  }
}

pub struct MapErrObserver<O, F> {
  observer: O,
  func: F,
}

impl<Item, Err, O, F, E> Observer<Item, Err> for MapErrObserver<O, F>
where
  O: Observer<Item, E>,
  F: FnOnce(Err) -> E,
{
  fn next(&mut self, value: Item) { self.observer.next(value) }

  fn error(self, err: Err) { self.observer.error((self.func)(err)) }

  fn complete(self) { self.observer.complete() }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}
