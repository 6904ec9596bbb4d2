//! Boxed Observable types for type erasure
//!
//! Heterogeneous observables (different operator chains with the same `Item`
//! and `Err`) can be stored together or returned from one function once boxed.

use crate::{
  observable::{CoreObservable, ObservableType},
  observer::{BoxedObserver, Observer},
  subscription::BoxedSubscription,
};

// ============================================================================
// DynCoreObservable Trait
// ============================================================================

/// Object-safe observable trait for type erasure.
pub trait DynCoreObservable<Item, Err> {
  fn dyn_subscribe(self: Box<Self>, observer: BoxedObserver<Item, Err>) -> BoxedSubscription;
}

/// Object-safe clone support for type-erased observables.
pub trait DynCoreObservableClone<Item, Err>: DynCoreObservable<Item, Err> {
  fn clone_box(&self) -> Box<dyn DynCoreObservableClone<Item, Err> + Send>;
}

impl<S> DynCoreObservable<S::Item, S::Err> for S
where
  S: CoreObservable,
  S::Item: 'static,
  S::Err: 'static,
{
  fn dyn_subscribe(
    self: Box<Self>, observer: BoxedObserver<S::Item, S::Err>,
  ) -> BoxedSubscription {
    BoxedSubscription::new((*self).actual_subscribe(observer))
  }
}

impl<S> DynCoreObservableClone<S::Item, S::Err> for S
where
  S: CoreObservable + Clone + Send + 'static,
  S::Item: 'static,
  S::Err: 'static,
{
  fn clone_box(&self) -> Box<dyn DynCoreObservableClone<S::Item, S::Err> + Send> {
    Box::new(self.clone())
  }
}

// ============================================================================
// Boxed observable types
// ============================================================================

/// A type-erased observable that can be subscribed once.
pub struct BoxedObservable<Item, Err>(Box<dyn DynCoreObservable<Item, Err> + Send>);

/// A type-erased observable that stays cloneable, so it can be used with
/// operators that resubscribe (`retry`, `merge` of several sources, ...).
pub struct BoxedObservableClone<Item, Err>(Box<dyn DynCoreObservableClone<Item, Err> + Send>);

impl<Item, Err> Clone for BoxedObservableClone<Item, Err> {
  fn clone(&self) -> Self { BoxedObservableClone(self.0.clone_box()) }
}

impl<Item: 'static, Err: 'static> BoxedObservable<Item, Err> {
  pub fn new<S>(source: S) -> Self
  where
    S: CoreObservable<Item = Item, Err = Err> + Send + 'static,
  {
    BoxedObservable(Box::new(source))
  }
}

impl<Item: 'static, Err: 'static> BoxedObservableClone<Item, Err> {
  pub fn new<S>(source: S) -> Self
  where
    S: CoreObservable<Item = Item, Err = Err> + Clone + Send + 'static,
  {
    BoxedObservableClone(Box::new(source))
  }
}

impl<Item, Err> ObservableType for BoxedObservable<Item, Err> {
  type Item = Item;
  type Err = Err;
}

impl<Item, Err> ObservableType for BoxedObservableClone<Item, Err> {
  type Item = Item;
  type Err = Err;
}

impl<Item: 'static, Err: 'static> CoreObservable for BoxedObservable<Item, Err> {
  type Unsub = BoxedSubscription;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Item, Err> + Send + 'static,
  {
    self.0.dyn_subscribe(Box::new(observer))
  }
}

impl<Item: 'static, Err: 'static> CoreObservable for BoxedObservableClone<Item, Err> {
  type Unsub = BoxedSubscription;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Item, Err> + Send + 'static,
  {
    self.0.dyn_subscribe(Box::new(observer))
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{Arc, Mutex};

  use crate::prelude::*;

  #[rxflow_macro::test]
  fn different_chains_share_a_type() {
    let seen = Arc::new(Mutex::new(vec![]));
    let sources: Vec<BoxedObservable<i32, Infallible>> = vec![
      Shared::of(1).box_it(),
      Shared::from_iter([2, 3]).map(|v| v * 10).box_it(),
      Shared::from_iter([4, 5, 6]).filter(|v| v % 2 == 0).box_it(),
    ];
    for source in sources {
      let c_seen = seen.clone();
      source.subscribe(move |v| c_seen.lock().unwrap().push(v));
    }
    assert_eq!(*seen.lock().unwrap(), vec![1, 20, 30, 4, 6]);
  }

  #[rxflow_macro::test]
  fn clone_boxed_resubscribes() {
    let seen = Arc::new(Mutex::new(vec![]));
    let source = Shared::from_iter([1, 2]).map(|v| v + 1).box_clone_it();
    for _ in 0..2 {
      let c_seen = seen.clone();
      source.clone().subscribe(move |v| c_seen.lock().unwrap().push(v));
    }
    assert_eq!(*seen.lock().unwrap(), vec![2, 3, 2, 3]);
  }
}
