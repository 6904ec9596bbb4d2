use std::sync::{
  atomic::{AtomicBool, Ordering},
  Arc,
};

use crate::{observer::Observer, subscription::Subscription};

/// The gate between a stream and the observer handed to `subscribe`.
///
/// Sources and operators may still be running when the subscription is
/// released (a scheduled task already fired, another thread is mid-emission).
/// The gate shares a flag with the returned [`SubscriptionHandle`] so that
/// nothing reaches the observer once the handle was released, and so that
/// the observer never sees more than one terminal event.
pub struct Subscriber<O> {
  observer: O,
  closed: Arc<AtomicBool>,
}

impl<O> Subscriber<O> {
  pub fn new(observer: O) -> (Self, Arc<AtomicBool>) {
    let closed = Arc::new(AtomicBool::new(false));
    (Subscriber { observer, closed: closed.clone() }, closed)
  }
}

impl<Item, Err, O> Observer<Item, Err> for Subscriber<O>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) {
    if !self.closed.load(Ordering::Acquire) {
      self.observer.next(value);
    }
  }

  fn error(self, err: Err) {
    if !self.closed.swap(true, Ordering::AcqRel) {
      self.observer.error(err);
    }
  }

  fn complete(self) {
    if !self.closed.swap(true, Ordering::AcqRel) {
      self.observer.complete();
    }
  }

  fn is_closed(&self) -> bool { self.closed.load(Ordering::Acquire) || self.observer.is_closed() }
}

/// Returned by `subscribe` and `subscribe_with`.
///
/// Dropping the handle keeps the subscription alive. Releasing it closes
/// the gate first, then releases the upstream subscription chain.
pub struct SubscriptionHandle<U> {
  closed: Arc<AtomicBool>,
  source: U,
}

impl<U> SubscriptionHandle<U> {
  pub(crate) fn new(closed: Arc<AtomicBool>, source: U) -> Self {
    SubscriptionHandle { closed, source }
  }
}

impl<U: Subscription> Subscription for SubscriptionHandle<U> {
  fn unsubscribe(self) {
    self.closed.store(true, Ordering::Release);
    self.source.unsubscribe();
  }

  /// True once released or once the stream reached a terminal event.
  fn is_closed(&self) -> bool { self.closed.load(Ordering::Acquire) }
}
