use crate::{
  observable::{CoreObservable, ObservableType},
  observer::Observer,
  subscription::{SerialSubscription, Subscription, TupleSubscription},
};

/// Subscribes to `second` only after `first` completed.
#[derive(Clone)]
pub struct Concat<S1, S2> {
  pub(crate) first: S1,
  pub(crate) second: S2,
}

impl<S1: ObservableType, S2> ObservableType for Concat<S1, S2> {
  type Item = S1::Item;
  type Err = S1::Err;
}

impl<S1, S2> CoreObservable for Concat<S1, S2>
where
  S1: CoreObservable,
  S2: CoreObservable<Item = S1::Item, Err = S1::Err> + Send + 'static,
{
  type Unsub = TupleSubscription<S1::Unsub, SerialSubscription>;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<S1::Item, S1::Err> + Send + 'static,
  {
    let second_sub = SerialSubscription::new();
    let observer = ConcatObserver { observer, second: self.second, second_sub: second_sub.clone() };
    let first_sub = self.first.actual_subscribe(observer);
    TupleSubscription::new(first_sub, second_sub)
  }
}

pub struct ConcatObserver<O, S2> {
  observer: O,
  second: S2,
  second_sub: SerialSubscription,
}

impl<Item, Err, O, S2> Observer<Item, Err> for ConcatObserver<O, S2>
where
  O: Observer<Item, Err> + Send + 'static,
  S2: CoreObservable<Item = Item, Err = Err>,
{
  fn next(&mut self, value: Item) { self.observer.next(value) }

  fn error(self, err: Err) { self.observer.error(err) }

  fn complete(self) {
    if !self.second_sub.is_closed() {
      self.second_sub.set(self.second.actual_subscribe(self.observer));
    }
  }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

#[cfg(test)]
mod tests {
  use std::sync::{Arc, Mutex};

  use crate::prelude::*;

  #[rxflow_macro::test]
  fn second_waits_for_first() {
    let first = Subject::<i32, Infallible>::new();
    let second = Subject::<i32, Infallible>::new();
    let seen = Arc::new(Mutex::new(vec![]));
    let c_seen = seen.clone();
    let _ = first.clone().concat(second.clone()).subscribe(move |v| c_seen.lock().unwrap().push(v));

    second.next(100);
    first.next(1);
    assert_eq!(second.observer_count(), 0);
    first.complete();
    assert_eq!(second.observer_count(), 1);
    second.next(2);
    assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
  }

  #[rxflow_macro::test]
  fn error_skips_the_rest() {
    let log = Arc::new(Mutex::new(vec![]));
    let (c_next, c_err) = (log.clone(), log.clone());
    let _ = Shared::throw_err::<i32, _>("early")
      .concat(Shared::of(1).map_err(|e: Infallible| -> &'static str { match e {} }))
      .on_error(move |e| c_err.lock().unwrap().push(e.to_string()))
      .subscribe(move |v| c_next.lock().unwrap().push(v.to_string()));
    assert_eq!(*log.lock().unwrap(), vec!["early"]);
  }

  #[rxflow_macro::test]
  fn concat_map_never_overlaps() {
    let scheduler = TestScheduler::new();
    let seen = Arc::new(Mutex::new(vec![]));
    let c_seen = seen.clone();
    let c_scheduler = scheduler.clone();
    let _ = Shared::from_iter([30u64, 10])
      .concat_map(move |ms| {
        Shared::timer(Duration::from_millis(ms), c_scheduler.clone()).map(move |_| ms)
      })
      .subscribe(move |v| c_seen.lock().unwrap().push(v));
    scheduler.advance_by(Duration::from_millis(35));
    assert_eq!(*seen.lock().unwrap(), vec![30]);
    scheduler.advance_by(Duration::from_millis(5));
    assert_eq!(*seen.lock().unwrap(), vec![30, 10]);
  }
}
