use crate::{
  observable::{CoreObservable, ObservableType},
  observer::Observer,
};

/// Drops values equal to the previously forwarded one.
#[derive(Clone)]
pub struct DistinctUntilChanged<S> {
  pub(crate) source: S,
}

impl<S: ObservableType> ObservableType for DistinctUntilChanged<S> {
  type Item = S::Item;
  type Err = S::Err;
}

impl<S> CoreObservable for DistinctUntilChanged<S>
where
  S: CoreObservable,
  S::Item: PartialEq + Clone + Send + 'static,
{
  type Unsub = S::Unsub;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<S::Item, S::Err> + Send + 'static,
  {
    self.source.actual_subscribe(DistinctUntilChangedObserver { observer, last: None })
  }
}

pub struct DistinctUntilChangedObserver<O, Item> {
  observer: O,
  last: Option<Item>,
}

impl<Item, Err, O> Observer<Item, Err> for DistinctUntilChangedObserver<O, Item>
where
  O: Observer<Item, Err>,
  Item: PartialEq + Clone,
{
  fn next(&mut self, value: Item) {
    if self.last.as_ref() != Some(&value) {
      self.last = Some(value.clone());
      self.observer.next(value);
    }
  }

  forward_terminals!(observer);
}

#[cfg(test)]
mod tests {
  use std::sync::{Arc, Mutex};

  use crate::prelude::*;

  #[rxflow_macro::test]
  fn collapses_runs() {
    let seen = Arc::new(Mutex::new(vec![]));
    let c_seen = seen.clone();
    let _ = Shared::from_iter(["A", "A", "B", "B", "B", "A"])
      .distinct_until_changed()
      .subscribe(move |v| c_seen.lock().unwrap().push(v));
    assert_eq!(*seen.lock().unwrap(), vec!["A", "B", "A"]);
  }

  #[rxflow_macro::test]
  fn first_value_always_passes() {
    let seen = Arc::new(Mutex::new(vec![]));
    let c_seen = seen.clone();
    let _ = Shared::of(None::<i32>)
      .distinct_until_changed()
      .subscribe(move |v| c_seen.lock().unwrap().push(v));
    assert_eq!(*seen.lock().unwrap(), vec![None]);
  }
}
