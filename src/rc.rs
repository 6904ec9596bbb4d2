use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError, Weak};

use crate::{observer::Observer, subscription::Subscription};

/// Shared, mutex-protected state used by every operator that has to reach the
/// same value from more than one place (an upstream observer and a scheduled
/// task, two sources of a `zip`, a subject and its subscribers).
///
/// A poisoned lock is recovered rather than propagated: the state behind it
/// is plain bookkeeping and a panic in a user callback must not take every
/// other subscriber down with it.
pub struct MutArc<T>(Arc<Mutex<T>>);

impl<T> MutArc<T> {
  pub fn own(t: T) -> Self { Self(Arc::new(Mutex::new(t))) }

  #[inline]
  pub fn rc_deref(&self) -> MutexGuard<'_, T> {
    self.0.lock().unwrap_or_else(PoisonError::into_inner)
  }

  #[inline]
  pub fn rc_deref_mut(&self) -> MutexGuard<'_, T> { self.rc_deref() }

  /// Lock without blocking. `None` means the lock is held, usually by the
  /// current call stack.
  pub fn try_rc_deref(&self) -> Option<MutexGuard<'_, T>> {
    match self.0.try_lock() {
      Ok(guard) => Some(guard),
      Err(TryLockError::Poisoned(e)) => Some(e.into_inner()),
      Err(TryLockError::WouldBlock) => None,
    }
  }

  pub fn downgrade(&self) -> WeakMutArc<T> { WeakMutArc(Arc::downgrade(&self.0)) }
}

/// A non-owning reference to a [`MutArc`], used where a callback registered
/// inside the state must not keep that state alive.
pub struct WeakMutArc<T>(Weak<Mutex<T>>);

impl<T> WeakMutArc<T> {
  pub fn upgrade(&self) -> Option<MutArc<T>> { self.0.upgrade().map(MutArc) }
}

impl<T> Clone for WeakMutArc<T> {
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<T: Default> Default for MutArc<T> {
  fn default() -> Self { Self::own(T::default()) }
}

impl<T> Clone for MutArc<T> {
  #[inline]
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

/// A shared observer slot. The observer is taken out of the slot on the
/// first terminal event and the lock is released before the terminal
/// callback runs.
impl<Item, Err, O> Observer<Item, Err> for MutArc<Option<O>>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) {
    if let Some(observer) = self.rc_deref_mut().as_mut() {
      observer.next(value);
    }
  }

  fn error(self, err: Err) {
    let observer = self.rc_deref_mut().take();
    if let Some(observer) = observer {
      observer.error(err);
    }
  }

  fn complete(self) {
    let observer = self.rc_deref_mut().take();
    if let Some(observer) = observer {
      observer.complete();
    }
  }

  fn is_closed(&self) -> bool {
    match self.try_rc_deref() {
      Some(guard) => guard.as_ref().map_or(true, |o| o.is_closed()),
      None => false,
    }
  }
}

impl<T: Subscription> Subscription for MutArc<Option<T>> {
  fn unsubscribe(self) {
    let inner = self.rc_deref_mut().take();
    if let Some(inner) = inner {
      inner.unsubscribe();
    }
  }

  fn is_closed(&self) -> bool { self.rc_deref().as_ref().map_or(true, |s| s.is_closed()) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[rxflow_macro::test]
  fn shared_slot_drops_observer_on_complete() {
    let hits = MutArc::own(Vec::new());
    let c_hits = hits.clone();
    let mut slot = MutArc::own(Some(crate::observer::FnObserver::new(move |v: i32| {
      c_hits.rc_deref_mut().push(v)
    })));
    let other = slot.clone();

    Observer::<i32, std::convert::Infallible>::next(&mut slot, 1);
    Observer::<i32, std::convert::Infallible>::complete(slot);
    assert!(Observer::<i32, std::convert::Infallible>::is_closed(&other));
    assert_eq!(*hits.rc_deref(), vec![1]);
  }

  #[rxflow_macro::test]
  fn poisoned_lock_is_recovered() {
    let state = MutArc::own(1);
    let c_state = state.clone();
    let _ = std::thread::spawn(move || {
      let _guard = c_state.rc_deref_mut();
      panic!("poison");
    })
    .join();
    *state.rc_deref_mut() += 1;
    assert_eq!(*state.rc_deref(), 2);
  }
}
