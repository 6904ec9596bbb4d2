use super::{BoxedSubscription, Subscription};
use crate::rc::MutArc;

struct SerialInner {
  closed: bool,
  current: Option<BoxedSubscription>,
}

/// Holds at most one inner subscription at a time.
///
/// Setting a new inner releases the previous one. Once the serial handle is
/// released, any inner set afterwards is released immediately. Operators that
/// must cut their upstream from inside an event callback (`take`,
/// `take_until`, `amb`, `switch_latest`, `retry`) hand a clone of this handle
/// to their observer before the upstream `subscribe` call has even returned.
///
/// The lock is never held while an inner subscription is released, so a
/// release that re-enters the handle does not deadlock.
#[derive(Clone)]
pub struct SerialSubscription(MutArc<SerialInner>);

impl Default for SerialSubscription {
  fn default() -> Self { Self(MutArc::own(SerialInner { closed: false, current: None })) }
}

impl SerialSubscription {
  pub fn new() -> Self { Self::default() }

  /// Replace the inner subscription, releasing the previous one.
  pub fn set<U: Subscription + Send + 'static>(&self, subscription: U) {
    let released = {
      let mut inner = self.0.rc_deref_mut();
      if inner.closed {
        Some(BoxedSubscription::new(subscription))
      } else {
        inner.current.replace(BoxedSubscription::new(subscription))
      }
    };
    if let Some(released) = released {
      released.unsubscribe();
    }
  }

  /// Release the current inner subscription but stay open for the next.
  pub fn clear(&self) {
    let released = self.0.rc_deref_mut().current.take();
    if let Some(released) = released {
      released.unsubscribe();
    }
  }
}

impl Subscription for SerialSubscription {
  fn unsubscribe(self) {
    let released = {
      let mut inner = self.0.rc_deref_mut();
      inner.closed = true;
      inner.current.take()
    };
    if let Some(released) = released {
      released.unsubscribe();
    }
  }

  fn is_closed(&self) -> bool { self.0.rc_deref().closed }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::subscription::test_util::CountingSubscription;

  #[rxflow_macro::test]
  fn set_releases_previous() {
    let serial = SerialSubscription::new();
    let first = CountingSubscription::default();
    let second = CountingSubscription::default();

    serial.set(first.clone());
    serial.set(second.clone());
    assert_eq!(first.count(), 1);
    assert_eq!(second.count(), 0);

    serial.clone().unsubscribe();
    assert_eq!(second.count(), 1);
    assert!(serial.is_closed());
  }

  #[rxflow_macro::test]
  fn set_after_release_is_released_at_once() {
    let serial = SerialSubscription::new();
    serial.clone().unsubscribe();

    let late = CountingSubscription::default();
    serial.set(late.clone());
    assert_eq!(late.count(), 1);
  }

  #[rxflow_macro::test]
  fn double_release_is_noop() {
    let serial = SerialSubscription::new();
    let inner = CountingSubscription::default();
    serial.set(inner.clone());
    serial.clone().unsubscribe();
    serial.unsubscribe();
    assert_eq!(inner.count(), 1);
  }
}
