use std::marker::PhantomData;

use crate::{
  observable::{CoreObservable, ObservableType},
  observer::Observer,
  rc::MutArc,
  subscription::{SerialSubscription, Subscription, TupleSubscription},
};

/// Pairs each source value with the latest value of `other`. Source values
/// that arrive before `other` emitted anything are dropped. Only the
/// source's completion completes the output.
#[derive(Clone)]
pub struct WithLatestFrom<S, Other> {
  pub(crate) source: S,
  pub(crate) other: Other,
}

impl<S, Other> ObservableType for WithLatestFrom<S, Other>
where
  S: ObservableType,
  Other: ObservableType<Err = S::Err>,
{
  type Item = (S::Item, Other::Item);
  type Err = S::Err;
}

impl<S, Other> CoreObservable for WithLatestFrom<S, Other>
where
  S: CoreObservable,
  Other: CoreObservable<Err = S::Err>,
  S::Item: 'static,
  Other::Item: Clone + Send + 'static,
{
  type Unsub = TupleSubscription<SerialSubscription, SerialSubscription>;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<(S::Item, Other::Item), S::Err> + Send + 'static,
  {
    let observer = MutArc::own(Some(observer));
    let latest = MutArc::own(None);
    let source_sub = SerialSubscription::new();
    let other_sub = SerialSubscription::new();

    let latest_observer = LatestObserver {
      observer: observer.clone(),
      latest: latest.clone(),
      source: source_sub.clone(),
      _source_item: PhantomData,
    };
    other_sub.set(self.other.actual_subscribe(latest_observer));
    let source_observer = WithLatestObserver { observer, latest, other: other_sub.clone() };
    source_sub.set(self.source.actual_subscribe(source_observer));
    TupleSubscription::new(source_sub, other_sub)
  }
}

/// Observes `other`, remembering its latest value.
pub struct LatestObserver<O, A, B> {
  observer: MutArc<Option<O>>,
  latest: MutArc<Option<B>>,
  source: SerialSubscription,
  _source_item: PhantomData<fn(A)>,
}

impl<O, A, B, Err> Observer<B, Err> for LatestObserver<O, A, B>
where
  O: Observer<(A, B), Err>,
{
  fn next(&mut self, value: B) { *self.latest.rc_deref_mut() = Some(value); }

  fn error(self, err: Err) {
    self.source.unsubscribe();
    self.observer.error(err);
  }

  fn complete(self) {}

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

pub struct WithLatestObserver<O, B> {
  observer: MutArc<Option<O>>,
  latest: MutArc<Option<B>>,
  other: SerialSubscription,
}

impl<O, A, B, Err> Observer<A, Err> for WithLatestObserver<O, B>
where
  O: Observer<(A, B), Err>,
  B: Clone,
{
  fn next(&mut self, value: A) {
    let latest = self.latest.rc_deref().clone();
    if let Some(latest) = latest {
      self.observer.next((value, latest));
    }
  }

  fn error(self, err: Err) {
    self.other.unsubscribe();
    self.observer.error(err);
  }

  fn complete(self) {
    self.other.unsubscribe();
    self.observer.complete();
  }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

#[cfg(test)]
mod tests {
  use std::sync::{Arc, Mutex};

  use crate::prelude::*;

  #[rxflow_macro::test]
  fn drops_values_before_other_emits() {
    let source = Subject::<i32, Infallible>::new();
    let other = Subject::<&str, Infallible>::new();
    let seen = Arc::new(Mutex::new(vec![]));
    let c_seen = seen.clone();
    let _ = source
      .clone()
      .with_latest_from(other.clone())
      .subscribe(move |v| c_seen.lock().unwrap().push(v));

    source.next(1);
    other.next("a");
    other.next("b");
    source.next(2);
    other.complete();
    source.next(3);
    assert_eq!(*seen.lock().unwrap(), vec![(2, "b"), (3, "b")]);
  }

  #[rxflow_macro::test]
  fn source_completion_releases_other() {
    let source = Subject::<i32, Infallible>::new();
    let other = Subject::<i32, Infallible>::new();
    let _ = source.clone().with_latest_from(other.clone()).subscribe(|_| {});
    assert_eq!(other.observer_count(), 1);
    source.complete();
    assert_eq!(other.observer_count(), 0);
  }
}
