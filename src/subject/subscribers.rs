use std::sync::{
  atomic::{AtomicBool, Ordering},
  Arc,
};

use smallvec::SmallVec;

use crate::{
  observer::{BoxedObserver, Observer},
  rc::MutArc,
};

/// One subscriber of a subject.
///
/// The `closed` flag is flipped by the subscription handle without touching
/// the observer lock, so a subscriber can be released from inside its own
/// callback.
pub(crate) struct Slot<Item, Err> {
  pub(crate) id: usize,
  pub(crate) closed: Arc<AtomicBool>,
  pub(crate) observer: MutArc<Option<BoxedObserver<Item, Err>>>,
}

impl<Item, Err> Clone for Slot<Item, Err> {
  fn clone(&self) -> Self {
    Slot { id: self.id, closed: self.closed.clone(), observer: self.observer.clone() }
  }
}

impl<Item, Err> Slot<Item, Err> {
  pub(crate) fn new(id: usize, observer: BoxedObserver<Item, Err>) -> Self {
    Slot { id, closed: Arc::new(AtomicBool::new(false)), observer: MutArc::own(Some(observer)) }
  }

  #[inline]
  pub(crate) fn is_released(&self) -> bool { self.closed.load(Ordering::Acquire) }

  /// Deliver a value. Returns false once the observer no longer accepts
  /// values, so the caller can drop the slot.
  pub(crate) fn next(&self, value: Item) -> bool {
    if self.is_released() {
      return false;
    }
    let mut guard = self.observer.rc_deref_mut();
    match guard.as_mut() {
      Some(observer) => {
        observer.next(value);
        !observer.is_closed()
      }
      None => false,
    }
  }

  pub(crate) fn error(&self, err: Err) {
    if self.closed.swap(true, Ordering::AcqRel) {
      return;
    }
    let observer = self.observer.rc_deref_mut().take();
    if let Some(observer) = observer {
      observer.error(err);
    }
  }

  pub(crate) fn complete(&self) {
    if self.closed.swap(true, Ordering::AcqRel) {
      return;
    }
    let observer = self.observer.rc_deref_mut().take();
    if let Some(observer) = observer {
      observer.complete();
    }
  }
}

/// The live subscriber list of a subject, in subscription order.
pub(crate) struct Subscribers<Item, Err> {
  next_id: usize,
  slots: SmallVec<[Slot<Item, Err>; 2]>,
}

impl<Item, Err> Default for Subscribers<Item, Err> {
  fn default() -> Self { Subscribers { next_id: 0, slots: SmallVec::new() } }
}

impl<Item, Err> Subscribers<Item, Err> {
  pub(crate) fn reserve_id(&mut self) -> usize {
    let id = self.next_id;
    self.next_id += 1;
    id
  }

  pub(crate) fn push(&mut self, slot: Slot<Item, Err>) { self.slots.push(slot); }

  pub(crate) fn remove(&mut self, id: usize) { self.slots.retain(|s| s.id != id); }

  pub(crate) fn len(&self) -> usize { self.slots.iter().filter(|s| !s.is_released()).count() }

  /// Copy of the live slots, for delivery outside the subject lock.
  pub(crate) fn snapshot(&self) -> SmallVec<[Slot<Item, Err>; 2]> {
    self.slots.iter().filter(|s| !s.is_released()).cloned().collect()
  }

  pub(crate) fn drain(&mut self) -> SmallVec<[Slot<Item, Err>; 2]> {
    std::mem::take(&mut self.slots)
  }
}

/// Deliver `value` to every slot, cloning for all but the last one.
/// Returns the ids of slots that stopped accepting values.
pub(crate) fn broadcast_value<Item: Clone, Err>(
  slots: &[Slot<Item, Err>], value: Item,
) -> SmallVec<[usize; 2]> {
  let mut stale = SmallVec::new();
  let mut iter = slots.iter().peekable();
  while let Some(slot) = iter.next() {
    if iter.peek().is_some() {
      if !slot.next(value.clone()) {
        stale.push(slot.id);
      }
    } else {
      if !slot.next(value) {
        stale.push(slot.id);
      }
      break;
    }
  }
  stale
}

pub(crate) fn broadcast_error<Item, Err: Clone>(slots: &[Slot<Item, Err>], err: Err) {
  let mut iter = slots.iter().peekable();
  while let Some(slot) = iter.next() {
    if iter.peek().is_some() {
      slot.error(err.clone());
    } else {
      slot.error(err);
      break;
    }
  }
}

pub(crate) fn broadcast_complete<Item, Err>(slots: &[Slot<Item, Err>]) {
  for slot in slots {
    slot.complete();
  }
}
