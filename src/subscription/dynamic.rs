use smallvec::SmallVec;

use super::{BoxedSubscription, Subscription};
use crate::rc::MutArc;

struct DynamicInner {
  closed: bool,
  next_id: usize,
  items: SmallVec<[(usize, Option<BoxedSubscription>); 2]>,
}

/// A keyed set of inner subscriptions for merge-style operators.
///
/// Inner observables may complete before their `subscribe` call returns, so
/// an entry is reserved first, the reserved id is handed to the inner
/// observer, and the subscription is filled in afterwards:
///
/// ```rust
/// use rxflow::{prelude::*, subscription::DynamicSubscriptions};
///
/// let subs = DynamicSubscriptions::default();
/// let id = subs.reserve();
/// // ... subscribe an inner observable whose observer calls `subs.remove(id)`
/// subs.fill(id, ());
/// assert_eq!(subs.len(), 1);
/// subs.remove(id);
/// assert!(subs.is_empty());
/// ```
///
/// `SmallVec` keeps the common case of one or two inners off the heap.
#[derive(Clone)]
pub struct DynamicSubscriptions(MutArc<DynamicInner>);

impl Default for DynamicSubscriptions {
  fn default() -> Self {
    Self(MutArc::own(DynamicInner { closed: false, next_id: 0, items: SmallVec::new() }))
  }
}

impl DynamicSubscriptions {
  /// Reserve a slot and return its id.
  pub fn reserve(&self) -> usize {
    let mut inner = self.0.rc_deref_mut();
    let id = inner.next_id;
    inner.next_id += 1;
    inner.items.push((id, None));
    id
  }

  /// Store the subscription for a reserved id. When the slot was already
  /// removed, or the whole set was released, the subscription is released.
  pub fn fill<U: Subscription + Send + 'static>(&self, id: usize, subscription: U) {
    let rejected = {
      let mut inner = self.0.rc_deref_mut();
      let closed = inner.closed;
      match inner.items.iter_mut().find(|(item_id, _)| *item_id == id) {
        Some((_, slot)) if !closed => {
          *slot = Some(BoxedSubscription::new(subscription));
          None
        }
        _ => Some(subscription),
      }
    };
    if let Some(rejected) = rejected {
      rejected.unsubscribe();
    }
  }

  /// Remove a slot, releasing its subscription if it was filled.
  pub fn remove(&self, id: usize) {
    let removed = {
      let mut inner = self.0.rc_deref_mut();
      let pos = inner.items.iter().position(|(item_id, _)| *item_id == id);
      pos.and_then(|pos| inner.items.remove(pos).1)
    };
    if let Some(removed) = removed {
      removed.unsubscribe();
    }
  }

  pub fn len(&self) -> usize { self.0.rc_deref().items.len() }

  pub fn is_empty(&self) -> bool { self.len() == 0 }
}

impl Subscription for DynamicSubscriptions {
  fn unsubscribe(self) {
    let items = {
      let mut inner = self.0.rc_deref_mut();
      inner.closed = true;
      std::mem::take(&mut inner.items)
    };
    for (_, sub) in items {
      sub.unsubscribe();
    }
  }

  fn is_closed(&self) -> bool { self.0.rc_deref().closed }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::subscription::test_util::CountingSubscription;

  #[rxflow_macro::test]
  fn fill_after_remove_releases() {
    let subs = DynamicSubscriptions::default();
    let id = subs.reserve();
    subs.remove(id);

    let inner = CountingSubscription::default();
    subs.fill(id, inner.clone());
    assert_eq!(inner.count(), 1);
    assert!(subs.is_empty());
  }

  #[rxflow_macro::test]
  fn release_all() {
    let subs = DynamicSubscriptions::default();
    let a = CountingSubscription::default();
    let b = CountingSubscription::default();
    let id_a = subs.reserve();
    subs.fill(id_a, a.clone());
    let id_b = subs.reserve();
    subs.fill(id_b, b.clone());
    assert_eq!(subs.len(), 2);

    subs.clone().unsubscribe();
    assert_eq!((a.count(), b.count()), (1, 1));

    let late = CountingSubscription::default();
    let id = subs.reserve();
    subs.fill(id, late.clone());
    assert_eq!(late.count(), 1);
  }

  #[rxflow_macro::test]
  fn remove_releases_filled_slot() {
    let subs = DynamicSubscriptions::default();
    let inner = CountingSubscription::default();
    let id = subs.reserve();
    subs.fill(id, inner.clone());
    subs.remove(id);
    assert_eq!(inner.count(), 1);
  }
}
