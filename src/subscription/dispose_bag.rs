use super::{BoxedSubscription, Subscription};
use crate::rc::MutArc;

#[derive(Default)]
struct BagInner {
  disposed: bool,
  items: Vec<BoxedSubscription>,
}

/// Owns a group of subscriptions and releases all of them, in insertion
/// order, exactly once: on [`dispose`](DisposeBag::dispose) or when the bag
/// is dropped, whichever comes first.
///
/// ```rust
/// use rxflow::prelude::*;
///
/// let bag = DisposeBag::new();
/// let subject = Subject::<i32, std::convert::Infallible>::default();
/// subject.clone().subscribe(|v| println!("{v}")).disposed_by(&bag);
/// assert_eq!(subject.observer_count(), 1);
/// drop(bag);
/// assert_eq!(subject.observer_count(), 0);
/// ```
#[derive(Default)]
pub struct DisposeBag(MutArc<BagInner>);

impl DisposeBag {
  pub fn new() -> Self { Self::default() }

  /// Adding to a bag that was already disposed releases the subscription at
  /// once.
  pub fn add<U: Subscription + Send + 'static>(&self, subscription: U) {
    let rejected = {
      let mut inner = self.0.rc_deref_mut();
      if inner.disposed {
        Some(subscription)
      } else {
        inner.items.retain(|s| !s.is_closed());
        inner.items.push(BoxedSubscription::new(subscription));
        None
      }
    };
    if let Some(rejected) = rejected {
      rejected.unsubscribe();
    }
  }

  pub fn dispose(&self) {
    let items = {
      let mut inner = self.0.rc_deref_mut();
      if inner.disposed {
        return;
      }
      inner.disposed = true;
      std::mem::take(&mut inner.items)
    };
    tracing::trace!(count = items.len(), "dispose bag released");
    for item in items {
      item.unsubscribe();
    }
  }

  pub fn is_disposed(&self) -> bool { self.0.rc_deref().disposed }

  pub fn len(&self) -> usize { self.0.rc_deref().items.len() }

  pub fn is_empty(&self) -> bool { self.len() == 0 }
}

impl Drop for DisposeBag {
  fn drop(&mut self) { self.dispose(); }
}

#[cfg(test)]
mod tests {
  use std::sync::{Arc, Mutex};

  use super::*;
  use crate::subscription::{test_util::CountingSubscription, ClosureSubscription};

  #[rxflow_macro::test]
  fn disposes_in_insertion_order_once() {
    let order = Arc::new(Mutex::new(vec![]));
    let bag = DisposeBag::new();
    for i in 0..3 {
      let order = order.clone();
      bag.add(ClosureSubscription::new(move || order.lock().unwrap().push(i)));
    }
    bag.dispose();
    bag.dispose();
    drop(bag);
    assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
  }

  #[rxflow_macro::test]
  fn drop_disposes() {
    let sub = CountingSubscription::default();
    {
      let bag = DisposeBag::new();
      sub.clone().disposed_by(&bag);
    }
    assert_eq!(sub.count(), 1);
  }

  #[rxflow_macro::test]
  fn add_after_dispose_releases_immediately() {
    let bag = DisposeBag::new();
    bag.dispose();
    let sub = CountingSubscription::default();
    bag.add(sub.clone());
    assert_eq!(sub.count(), 1);
    assert!(bag.is_disposed());
    assert!(bag.is_empty());
  }
}
