use crate::{
  observable::{CoreObservable, ObservableType},
  observer::Observer,
};

#[derive(Clone)]
pub struct Enumerate<S> {
  pub(crate) source: S,
}

impl<S: ObservableType> ObservableType for Enumerate<S> {
  type Item = (usize, S::Item);
  type Err = S::Err;
}

impl<S: CoreObservable> CoreObservable for Enumerate<S> {
  type Unsub = S::Unsub;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Self::Item, S::Err> + Send + 'static,
  {
    self.source.actual_subscribe(EnumerateObserver { observer, index: 0 })
  }
}

pub struct EnumerateObserver<O> {
  observer: O,
  index: usize,
}

impl<Item, Err, O> Observer<Item, Err> for EnumerateObserver<O>
where
  O: Observer<(usize, Item), Err>,
{
  fn next(&mut self, value: Item) {
    let index = self.index;
    self.index += 1;
    self.observer.next((index, value));
  }

  forward_terminals!(observer);
}

#[cfg(test)]
mod tests {
  use std::sync::{Arc, Mutex};

  use crate::prelude::*;

  #[rxflow_macro::test]
  fn pairs_values_with_index() {
    let seen = Arc::new(Mutex::new(vec![]));
    let c_seen = seen.clone();
    let _ = Shared::from_iter(['a', 'b', 'c'])
      .skip(1)
      .enumerate()
      .subscribe(move |v| c_seen.lock().unwrap().push(v));
    assert_eq!(*seen.lock().unwrap(), vec![(0, 'b'), (1, 'c')]);
  }
}
