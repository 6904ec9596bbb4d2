use crate::{
  observable::{CoreObservable, ObservableType},
  observer::Observer,
};

/// Collects every value; emits them as one `Vec` when the upstream
/// completes.
#[derive(Clone)]
pub struct ToArray<S> {
  pub(crate) source: S,
}

impl<S: ObservableType> ObservableType for ToArray<S> {
  type Item = Vec<S::Item>;
  type Err = S::Err;
}

impl<S> CoreObservable for ToArray<S>
where
  S: CoreObservable,
  S::Item: Send + 'static,
{
  type Unsub = S::Unsub;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Vec<S::Item>, S::Err> + Send + 'static,
  {
    self.source.actual_subscribe(ToArrayObserver { observer, values: Vec::new() })
  }
}

pub struct ToArrayObserver<O, Item> {
  observer: O,
  values: Vec<Item>,
}

impl<Item, Err, O> Observer<Item, Err> for ToArrayObserver<O, Item>
where
  O: Observer<Vec<Item>, Err>,
{
  fn next(&mut self, value: Item) { self.values.push(value) }

  fn error(self, err: Err) { self.observer.error(err) }

  fn complete(mut self) {
    self.observer.next(self.values);
    self.observer.complete();
  }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

#[cfg(test)]
mod tests {
  use std::sync::{Arc, Mutex};

  use crate::prelude::*;

  #[rxflow_macro::test]
  fn collects_in_order() {
    let seen = Arc::new(Mutex::new(vec![]));
    let c_seen = seen.clone();
    let _ = Shared::from_iter(["x", "y", "z"])
      .to_array()
      .subscribe(move |v| c_seen.lock().unwrap().push(v));
    assert_eq!(*seen.lock().unwrap(), vec![vec!["x", "y", "z"]]);
  }

  #[rxflow_macro::test]
  fn empty_source_gives_empty_vec() {
    let seen = Arc::new(Mutex::new(vec![]));
    let c_seen = seen.clone();
    let _ = Shared::empty::<u8>().to_array().subscribe(move |v| c_seen.lock().unwrap().push(v));
    assert_eq!(*seen.lock().unwrap(), vec![Vec::<u8>::new()]);
  }
}
