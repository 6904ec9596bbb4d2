//! Disposable handles.
//!
//! A [`Subscription`] is returned by every `subscribe` call and by every
//! scheduled task. Releasing it stops delivery and frees whatever upstream
//! resources were created for that one subscription.

mod boxed;
mod closure;
mod dispose_bag;
mod dynamic;
mod serial;
mod tuple;

pub use boxed::*;
pub use closure::*;
pub use dispose_bag::*;
pub use dynamic::*;
pub use serial::*;
pub use tuple::*;

/// Subscription returned from `Observable::subscribe` to allow unsubscribing.
///
/// `unsubscribe` consumes the handle, so a handle is released at most once.
/// Handles that share state (clones of a [`SerialSubscription`], a scheduler
/// [`TaskHandle`](crate::scheduler::TaskHandle), ...) make the second release
/// a no-op.
pub trait Subscription {
  /// Deregister the stream before it has finished delivering all events.
  fn unsubscribe(self);

  fn is_closed(&self) -> bool;

  /// Activates "RAII" behavior: the subscription is unsubscribed when the
  /// returned guard goes out of scope.
  #[must_use]
  fn unsubscribe_when_dropped(self) -> SubscriptionGuard<Self>
  where
    Self: Sized,
  {
    SubscriptionGuard(Some(self))
  }

  /// Hand the subscription to a [`DisposeBag`], which releases it together
  /// with everything else it holds.
  fn disposed_by(self, bag: &DisposeBag)
  where
    Self: Sized + Send + 'static,
  {
    bag.add(self);
  }

  fn into_boxed(self) -> BoxedSubscription
  where
    Self: Sized + Send + 'static,
  {
    BoxedSubscription::new(self)
  }
}

/// The subscription of a source that finishes synchronously.
impl Subscription for () {
  #[inline]
  fn unsubscribe(self) {}

  #[inline]
  fn is_closed(&self) -> bool { true }
}

impl<T: Subscription> Subscription for Option<T> {
  fn unsubscribe(self) {
    if let Some(inner) = self {
      inner.unsubscribe();
    }
  }

  fn is_closed(&self) -> bool { self.as_ref().map_or(true, Subscription::is_closed) }
}

/// An RAII implementation of a "scoped subscribed" of a subscription.
/// When this structure is dropped (falls out of scope), the subscription will
/// be unsubscribed.
///
/// This structure is created by the
/// [`unsubscribe_when_dropped`](Subscription::unsubscribe_when_dropped) method.
#[must_use]
pub struct SubscriptionGuard<T: Subscription>(Option<T>);

impl<T: Subscription> SubscriptionGuard<T> {
  /// Give the subscription back without unsubscribing it.
  pub fn release(mut self) -> T {
    match self.0.take() {
      Some(inner) => inner,
      None => unreachable!("a guard always holds its subscription until dropped"),
    }
  }
}

impl<T: Subscription> Drop for SubscriptionGuard<T> {
  fn drop(&mut self) {
    if let Some(inner) = self.0.take() {
      inner.unsubscribe();
    }
  }
}

#[cfg(test)]
pub(crate) mod test_util {
  use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
  };

  use super::Subscription;

  /// Counts how many times it was released.
  #[derive(Clone, Default)]
  pub struct CountingSubscription(pub Arc<AtomicUsize>);

  impl CountingSubscription {
    pub fn count(&self) -> usize { self.0.load(Ordering::SeqCst) }
  }

  impl Subscription for CountingSubscription {
    fn unsubscribe(self) { self.0.fetch_add(1, Ordering::SeqCst); }

    fn is_closed(&self) -> bool { self.count() > 0 }
  }
}

#[cfg(test)]
mod tests {
  use super::{test_util::CountingSubscription, *};

  #[rxflow_macro::test]
  fn guard_unsubscribes_on_drop() {
    let sub = CountingSubscription::default();
    {
      let _guard = sub.clone().unsubscribe_when_dropped();
    }
    assert_eq!(sub.count(), 1);
  }

  #[rxflow_macro::test]
  fn released_guard_keeps_subscription() {
    let sub = CountingSubscription::default();
    let inner = sub.clone().unsubscribe_when_dropped().release();
    assert_eq!(sub.count(), 0);
    inner.unsubscribe();
    assert_eq!(sub.count(), 1);
  }

  #[rxflow_macro::test]
  fn unit_subscription_is_closed() {
    assert!(().is_closed());
    assert!(None::<CountingSubscription>.is_closed());
  }
}
