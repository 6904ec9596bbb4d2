use std::{convert::Infallible, marker::PhantomData};

use crate::{
  observable::{CoreObservable, ObservableType},
  observer::Observer,
};

/// Completes immediately without emitting.
pub struct Empty<Item>(PhantomData<fn() -> Item>);

/// Never emits and never terminates.
pub struct Never<Item>(PhantomData<fn() -> Item>);

/// Emits no value, only the given error.
pub struct ThrowErr<Item, Err> {
  err: Err,
  _marker: PhantomData<fn() -> Item>,
}

impl<Item> Default for Empty<Item> {
  fn default() -> Self { Empty(PhantomData) }
}

impl<Item> Clone for Empty<Item> {
  fn clone(&self) -> Self { Self::default() }
}

impl<Item> Default for Never<Item> {
  fn default() -> Self { Never(PhantomData) }
}

impl<Item> Clone for Never<Item> {
  fn clone(&self) -> Self { Self::default() }
}

impl<Item, Err> ThrowErr<Item, Err> {
  pub fn new(err: Err) -> Self { ThrowErr { err, _marker: PhantomData } }
}

impl<Item, Err: Clone> Clone for ThrowErr<Item, Err> {
  fn clone(&self) -> Self { Self::new(self.err.clone()) }
}

impl<Item> ObservableType for Empty<Item> {
  type Item = Item;
  type Err = Infallible;
}

impl<Item> ObservableType for Never<Item> {
  type Item = Item;
  type Err = Infallible;
}

impl<Item, Err> ObservableType for ThrowErr<Item, Err> {
  type Item = Item;
  type Err = Err;
}

impl<Item> CoreObservable for Empty<Item> {
  type Unsub = ();

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Item, Infallible> + Send + 'static,
  {
    observer.complete();
  }
}

impl<Item> CoreObservable for Never<Item> {
  type Unsub = ();

  fn actual_subscribe<O>(self, _observer: O) -> Self::Unsub
  where
    O: Observer<Item, Infallible> + Send + 'static,
  {
  }
}

impl<Item, Err> CoreObservable for ThrowErr<Item, Err> {
  type Unsub = ();

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Item, Err> + Send + 'static,
  {
    observer.error(self.err);
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{Arc, Mutex};

  use crate::prelude::*;

  #[rxflow_macro::test]
  fn empty_only_completes() {
    let log = Arc::new(Mutex::new(vec![]));
    let c_log = log.clone();
    let n_log = log.clone();
    Shared::empty::<i32>()
      .on_complete(move || c_log.lock().unwrap().push("complete".to_string()))
      .subscribe(move |v| n_log.lock().unwrap().push(v.to_string()));
    assert_eq!(*log.lock().unwrap(), vec!["complete"]);
  }

  #[rxflow_macro::test]
  fn never_stays_silent() {
    let hits = Arc::new(Mutex::new(0));
    let c_hits = hits.clone();
    let sub = Shared::never::<i32>()
      .finalize(move || *c_hits.lock().unwrap() += 1)
      .subscribe(|_| {});
    assert_eq!(*hits.lock().unwrap(), 0);
    assert!(!sub.is_closed());
    sub.unsubscribe();
    assert_eq!(*hits.lock().unwrap(), 1);
  }

  #[rxflow_macro::test]
  fn throw_err_only_errors() {
    let errors = Arc::new(Mutex::new(vec![]));
    let c_errors = errors.clone();
    Shared::throw_err::<i32, _>("boom")
      .on_error(move |e| c_errors.lock().unwrap().push(e))
      .subscribe(|_| unreachable!());
    assert_eq!(*errors.lock().unwrap(), vec!["boom"]);
  }
}
