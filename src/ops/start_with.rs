use crate::{
  observable::{CoreObservable, ObservableType},
  observer::Observer,
};

/// Emits `value` before subscribing to the source.
#[derive(Clone)]
pub struct StartWith<S, V> {
  pub(crate) source: S,
  pub(crate) value: V,
}

impl<S, V> ObservableType for StartWith<S, V>
where
  S: ObservableType<Item = V>,
{
  type Item = V;
  type Err = S::Err;
}

impl<S, V> CoreObservable for StartWith<S, V>
where
  S: CoreObservable<Item = V>,
{
  type Unsub = Option<S::Unsub>;

  fn actual_subscribe<O>(self, mut observer: O) -> Self::Unsub
  where
    O: Observer<V, S::Err> + Send + 'static,
  {
    observer.next(self.value);
    if observer.is_closed() {
      return None;
    }
    Some(self.source.actual_subscribe(observer))
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
  fn prepends_value() {
    let seen = Arc::new(Mutex::new(vec![]));
    let c_seen = seen.clone();
    let _ = Shared::from_iter([2, 3])
      .start_with(1)
      .subscribe(move |v| c_seen.lock().unwrap().push(v));
    assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3]);
  }

  #[rxflow_macro::test]
  fn source_skipped_when_downstream_is_satisfied() {
    let subscribed = Arc::new(AtomicUsize::new(0));
    let c_subscribed = subscribed.clone();
    let source = Shared::defer(move || {
      c_subscribed.fetch_add(1, Ordering::SeqCst);
      Shared::from_iter([2, 3])
    });
    let seen = Arc::new(Mutex::new(vec![]));
    let c_seen = seen.clone();
    let _ = source.start_with(1).take(1).subscribe(move |v| c_seen.lock().unwrap().push(v));
    assert_eq!(*seen.lock().unwrap(), vec![1]);
    assert_eq!(subscribed.load(Ordering::SeqCst), 0);
  }
}
