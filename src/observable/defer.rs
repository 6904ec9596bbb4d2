use crate::{
  observable::{CoreObservable, ObservableType},
  observer::Observer,
};

/// Builds the actual observable at subscription time, once per subscriber.
#[derive(Clone)]
pub struct Defer<F>(pub F);

impl<F, S> ObservableType for Defer<F>
where
  F: FnOnce() -> S,
  S: ObservableType,
{
  type Item = S::Item;
  type Err = S::Err;
}

impl<F, S> CoreObservable for Defer<F>
where
  F: FnOnce() -> S,
  S: CoreObservable,
{
  type Unsub = S::Unsub;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Self::Item, Self::Err> + Send + 'static,
  {
    (self.0)().actual_subscribe(observer)
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
  };

  use crate::prelude::*;

  #[rxflow_macro::test]
  fn factory_runs_per_subscription() {
    let calls = Arc::new(AtomicUsize::new(0));
    let c_calls = calls.clone();
    let seen = Arc::new(Mutex::new(vec![]));

    let deferred = Shared::defer(move || {
      let n = c_calls.fetch_add(1, Ordering::SeqCst);
      Shared::of(n)
    });
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    for _ in 0..2 {
      let c_seen = seen.clone();
      deferred.clone().subscribe(move |v| c_seen.lock().unwrap().push(v));
    }
    assert_eq!(*seen.lock().unwrap(), vec![0, 1]);
  }
}
