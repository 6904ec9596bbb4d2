use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc,
};

use crate::{
  observable::{CoreObservable, ObservableType},
  observer::Observer,
  rc::MutArc,
  subscription::{SerialSubscription, Subscription, TupleSubscription},
};

/// Interleaves two streams. Completes once both completed; the first error
/// ends the output and releases the other stream.
#[derive(Clone)]
pub struct Merge<S1, S2> {
  pub(crate) source_a: S1,
  pub(crate) source_b: S2,
}

impl<S1: ObservableType, S2> ObservableType for Merge<S1, S2> {
  type Item = S1::Item;
  type Err = S1::Err;
}

impl<S1, S2> CoreObservable for Merge<S1, S2>
where
  S1: CoreObservable,
  S2: CoreObservable<Item = S1::Item, Err = S1::Err>,
{
  type Unsub = TupleSubscription<SerialSubscription, SerialSubscription>;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<S1::Item, S1::Err> + Send + 'static,
  {
    let observer = MutArc::own(Some(observer));
    let live = Arc::new(AtomicUsize::new(2));
    let sub_a = SerialSubscription::new();
    let sub_b = SerialSubscription::new();

    let observer_a = MergeObserver {
      observer: observer.clone(),
      live: live.clone(),
      other: sub_b.clone(),
    };
    sub_a.set(self.source_a.actual_subscribe(observer_a));
    let observer_b = MergeObserver { observer, live, other: sub_a.clone() };
    sub_b.set(self.source_b.actual_subscribe(observer_b));
    TupleSubscription::new(sub_a, sub_b)
  }
}

pub struct MergeObserver<O> {
  observer: MutArc<Option<O>>,
  live: Arc<AtomicUsize>,
  other: SerialSubscription,
}

impl<Item, Err, O> Observer<Item, Err> for MergeObserver<O>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) { self.observer.next(value) }

  fn error(self, err: Err) {
    self.other.unsubscribe();
    self.observer.error(err);
  }

  fn complete(self) {
    if self.live.fetch_sub(1, Ordering::AcqRel) == 1 {
      self.observer.complete();
    }
  }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

#[cfg(test)]
mod tests {
  use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
  };

  use crate::prelude::*;

  #[rxflow_macro::test]
  fn interleaves_in_arrival_order() {
    let a = Subject::<&str, Infallible>::new();
    let b = Subject::<&str, Infallible>::new();
    let seen = Arc::new(Mutex::new(vec![]));
    let completed = Arc::new(AtomicBool::new(false));
    let (c_seen, c_completed) = (seen.clone(), completed.clone());
    let _ = a
      .clone()
      .merge(b.clone())
      .on_complete(move || c_completed.store(true, Ordering::SeqCst))
      .subscribe(move |v| c_seen.lock().unwrap().push(v));

    a.next("a1");
    b.next("b1");
    a.next("a2");
    a.complete();
    assert!(!completed.load(Ordering::SeqCst));
    b.next("b2");
    b.complete();
    assert!(completed.load(Ordering::SeqCst));
    assert_eq!(*seen.lock().unwrap(), vec!["a1", "b1", "a2", "b2"]);
  }

  #[rxflow_macro::test]
  fn error_releases_other_side() {
    let a = Subject::<i32, String>::new();
    let b = Subject::<i32, String>::new();
    let err = Arc::new(Mutex::new(None));
    let c_err = err.clone();
    let _ = a
      .clone()
      .merge(b.clone())
      .on_error(move |e| *c_err.lock().unwrap() = Some(e))
      .subscribe(|_| {});
    a.error("a failed".to_string());
    assert_eq!(b.observer_count(), 0);
    assert_eq!(err.lock().unwrap().as_deref(), Some("a failed"));
  }
}
