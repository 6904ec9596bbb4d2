use std::convert::Infallible;

use crate::{
  notification::Notification,
  observable::{CoreObservable, ObservableType},
  observer::Observer,
  subscription::{SerialSubscription, Subscription},
};

/// Turns every event, terminal ones included, into a [`Notification`]
/// value. The output always completes and never fails.
#[derive(Clone)]
pub struct Materialize<S> {
  pub(crate) source: S,
}

impl<S: ObservableType> ObservableType for Materialize<S> {
  type Item = Notification<S::Item, S::Err>;
  type Err = Infallible;
}

impl<S: CoreObservable> CoreObservable for Materialize<S> {
  type Unsub = S::Unsub;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Self::Item, Infallible> + Send + 'static,
  {
    self.source.actual_subscribe(MaterializeObserver(observer))
  }
}

pub struct MaterializeObserver<O>(O);

impl<Item, Err, O> Observer<Item, Err> for MaterializeObserver<O>
where
  O: Observer<Notification<Item, Err>, Infallible>,
{
  fn next(&mut self, value: Item) { self.0.next(Notification::Next(value)) }

  fn error(mut self, err: Err) {
    self.0.next(Notification::Error(err));
    self.0.complete();
  }

  fn complete(mut self) {
    self.0.next(Notification::Completed);
    self.0.complete();
  }

  fn is_closed(&self) -> bool { self.0.is_closed() }
}

/// The inverse of [`Materialize`]: replays carried notifications as real
/// events. A carried terminal ends the stream and releases the upstream.
#[derive(Clone)]
pub struct Dematerialize<S> {
  pub(crate) source: S,
}

impl<S, Item, Err> ObservableType for Dematerialize<S>
where
  S: ObservableType<Item = Notification<Item, Err>, Err = Infallible>,
{
  type Item = Item;
  type Err = Err;
}

impl<S, Item, Err> CoreObservable for Dematerialize<S>
where
  S: CoreObservable<Item = Notification<Item, Err>, Err = Infallible>,
{
  type Unsub = SerialSubscription;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Item, Err> + Send + 'static,
  {
    let upstream = SerialSubscription::new();
    let observer = DematerializeObserver { observer: Some(observer), upstream: upstream.clone() };
    upstream.set(self.source.actual_subscribe(observer));
    upstream
  }
}

pub struct DematerializeObserver<O> {
  observer: Option<O>,
  upstream: SerialSubscription,
}

impl<Item, Err, O> Observer<Notification<Item, Err>, Infallible> for DematerializeObserver<O>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Notification<Item, Err>) {
    match value {
      Notification::Next(v) => self.observer.next(v),
      Notification::Error(err) => {
        self.upstream.clone().unsubscribe();
        self.observer.take().error(err);
      }
      Notification::Completed => {
        self.upstream.clone().unsubscribe();
        self.observer.take().complete();
      }
    }
  }

  fn error(self, err: Infallible) { match err {} }

  fn complete(self) { self.observer.complete() }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}
