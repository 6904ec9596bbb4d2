use std::convert::Infallible;

use crate::{
  observable::{CoreObservable, ObservableType},
  observer::Observer,
};

/// Emits every element of an iterator synchronously, then completes.
///
/// Production stops early once the observer reports itself closed, so
/// `Shared::from_iter(0..).take(3)` terminates.
#[derive(Clone)]
pub struct FromIter<I>(pub I);

impl<I: IntoIterator> ObservableType for FromIter<I> {
  type Item = I::Item;
  type Err = Infallible;
}

impl<I: IntoIterator> CoreObservable for FromIter<I> {
  type Unsub = ();

  fn actual_subscribe<O>(self, mut observer: O) -> Self::Unsub
  where
    O: Observer<Self::Item, Self::Err> + Send + 'static,
  {
    let mut iter = self.0.into_iter();
    while !observer.is_closed() {
      match iter.next() {
        Some(v) => observer.next(v),
        None => return observer.complete(),
      }
    }
  }
}
