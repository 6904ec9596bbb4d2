use crate::{
  observable::{CoreObservable, ObservableType},
  observer::Observer,
};

/// Emits every intermediate accumulator.
pub struct Scan<S, F, B> {
  pub(crate) source: S,
  pub(crate) seed: B,
  pub(crate) func: F,
}

impl<S: Clone, F: Clone, B: Clone> Clone for Scan<S, F, B> {
  fn clone(&self) -> Self {
    Scan { source: self.source.clone(), seed: self.seed.clone(), func: self.func.clone() }
  }
}

impl<S: ObservableType, F, B> ObservableType for Scan<S, F, B> {
  type Item = B;
  type Err = S::Err;
}

impl<S, F, B> CoreObservable for Scan<S, F, B>
where
  S: CoreObservable,
  F: FnMut(B, S::Item) -> B + Send + 'static,
  B: Clone + Send + 'static,
{
  type Unsub = S::Unsub;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<B, S::Err> + Send + 'static,
  {
    self.source.actual_subscribe(ScanObserver { observer, acc: Some(self.seed), func: self.func })
  }
}

pub struct ScanObserver<O, F, B> {
  observer: O,
  // `None` only while `func` runs.
  acc: Option<B>,
  func: F,
}

impl<Item, Err, O, F, B> Observer<Item, Err> for ScanObserver<O, F, B>
where
  O: Observer<B, Err>,
  F: FnMut(B, Item) -> B,
  B: Clone,
{
  fn next(&mut self, value: Item) {
    if let Some(acc) = self.acc.take() {
      let acc = (self.func)(acc, value);
      self.acc = Some(acc.clone());
      self.observer.next(acc);
    }
  }

  forward_terminals!(observer);
}

/// Accumulates silently and emits the final accumulator on completion.
pub struct Reduce<S, F, B> {
  pub(crate) source: S,
  pub(crate) seed: B,
  pub(crate) func: F,
}

impl<S: Clone, F: Clone, B: Clone> Clone for Reduce<S, F, B> {
  fn clone(&self) -> Self {
    Reduce { source: self.source.clone(), seed: self.seed.clone(), func: self.func.clone() }
  }
}

impl<S: ObservableType, F, B> ObservableType for Reduce<S, F, B> {
  type Item = B;
  type Err = S::Err;
}

impl<S, F, B> CoreObservable for Reduce<S, F, B>
where
  S: CoreObservable,
  F: FnMut(B, S::Item) -> B + Send + 'static,
  B: Send + 'static,
{
  type Unsub = S::Unsub;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<B, S::Err> + Send + 'static,
  {
    self.source.actual_subscribe(ReduceObserver { observer, acc: Some(self.seed), func: self.func })
  }
}

pub struct ReduceObserver<O, F, B> {
  observer: O,
  acc: Option<B>,
  func: F,
}

impl<Item, Err, O, F, B> Observer<Item, Err> for ReduceObserver<O, F, B>
where
  O: Observer<B, Err>,
  F: FnMut(B, Item) -> B,
{
  fn next(&mut self, value: Item) {
    if let Some(acc) = self.acc.take() {
      self.acc = Some((self.func)(acc, value));
    }
  }

  fn error(self, err: Err) { self.observer.error(err) }

  fn complete(mut self) {
    if let Some(acc) = self.acc.take() {
      self.observer.next(acc);
    }
    self.observer.complete();
  }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}
