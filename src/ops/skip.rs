use crate::{
  observable::{CoreObservable, ObservableType},
  observer::Observer,
};

#[derive(Clone)]
pub struct Skip<S> {
  pub(crate) source: S,
  pub(crate) count: usize,
}

impl<S: ObservableType> ObservableType for Skip<S> {
  type Item = S::Item;
  type Err = S::Err;
}

impl<S: CoreObservable> CoreObservable for Skip<S> {
  type Unsub = S::Unsub;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<S::Item, S::Err> + Send + 'static,
  {
    self.source.actual_subscribe(SkipObserver { observer, remaining: self.count })
  }
}

pub struct SkipObserver<O> {
  observer: O,
  remaining: usize,
}

impl<Item, Err, O> Observer<Item, Err> for SkipObserver<O>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) {
    if self.remaining == 0 {
      self.observer.next(value);
    } else {
      self.remaining -= 1;
    }
  }

  forward_terminals!(observer);
}

/// Drops values while the predicate holds; once it fails, everything
/// passes.
pub struct SkipWhile<S, F> {
  pub(crate) source: S,
  pub(crate) predicate: F,
}

impl<S: Clone, F: Clone> Clone for SkipWhile<S, F> {
  fn clone(&self) -> Self {
    SkipWhile { source: self.source.clone(), predicate: self.predicate.clone() }
  }
}

impl<S: ObservableType, F> ObservableType for SkipWhile<S, F> {
  type Item = S::Item;
  type Err = S::Err;
}

impl<S, F> CoreObservable for SkipWhile<S, F>
where
  S: CoreObservable,
  F: FnMut(&S::Item) -> bool + Send + 'static,
{
  type Unsub = S::Unsub;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<S::Item, S::Err> + Send + 'static,
  {
    self.source.actual_subscribe(SkipWhileObserver { observer, predicate: Some(self.predicate) })
  }
}

pub struct SkipWhileObserver<O, F> {
  observer: O,
  // Dropped once it first fails.
  predicate: Option<F>,
}

impl<Item, Err, O, F> Observer<Item, Err> for SkipWhileObserver<O, F>
where
  O: Observer<Item, Err>,
  F: FnMut(&Item) -> bool,
{
  fn next(&mut self, value: Item) {
    if let Some(predicate) = self.predicate.as_mut() {
      if predicate(&value) {
        return;
      }
      self.predicate = None;
    }
    self.observer.next(value);
  }

  forward_terminals!(observer);
}
