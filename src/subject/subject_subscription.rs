use std::sync::{
  atomic::{AtomicBool, Ordering},
  Arc,
};

use super::subject_core::SubjectState;
use crate::{
  observer::BoxedObserver,
  rc::{MutArc, WeakMutArc},
  subscription::Subscription,
};

/// Subscription handle for a Subject.
///
/// Releasing it flags the subscriber as closed (effective immediately, even
/// for an emission already in flight on another thread) and removes it from
/// the subject. The handle does not keep the subject alive.
pub struct SubjectSubscription<Item, Err> {
  pub(crate) id: usize,
  pub(crate) closed: Arc<AtomicBool>,
  pub(crate) observer: MutArc<Option<BoxedObserver<Item, Err>>>,
  pub(crate) state: WeakMutArc<SubjectState<Item, Err>>,
}

impl<Item, Err> Subscription for SubjectSubscription<Item, Err> {
  fn unsubscribe(self) {
    if self.closed.swap(true, Ordering::AcqRel) {
      return;
    }
    if let Some(state) = self.state.upgrade() {
      state.rc_deref_mut().subscribers.remove(self.id);
    }
    // Free the observer now unless it is running on this stack.
    if let Some(mut observer) = self.observer.try_rc_deref() {
      observer.take();
    }
  }

  fn is_closed(&self) -> bool { self.closed.load(Ordering::Acquire) }
}
