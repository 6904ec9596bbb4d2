//! Shared state machine behind every subject variant.
//!
//! `Active(buffer)` accepts `next`, `error` and `complete`; the first terminal
//! event moves the subject to `Terminated`, which is absorbing. The replay
//! policy decides how much of the `next` history a late subscriber receives.
//!
//! Events are delivered by a single emission loop at a time. An event raised
//! while the loop runs, from a subscriber callback or from another thread, is
//! queued and delivered by the running loop once the current event has
//! reached every subscriber.
//!
//! Locking discipline:
//!
//! * the loop takes the next event, updates the buffer and copies the
//!   subscriber list under the state lock, then delivers with the lock
//!   released;
//! * subscription locks the new subscriber's slot before registering it, so
//!   replayed values always reach it before any live value.

use std::{collections::VecDeque, sync::atomic::Ordering};

use super::{
  subject_subscription::SubjectSubscription,
  subscribers::{broadcast_complete, broadcast_error, broadcast_value, Slot, Subscribers},
};
use crate::{
  observer::{BoxedObserver, Observer},
  rc::MutArc,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ReplayPolicy {
  None,
  /// Exactly one value, seeded at construction.
  Latest,
  Bounded(usize),
  Unbounded,
}

#[derive(Clone)]
pub(crate) enum Terminal<Err> {
  Error(Err),
  Completed,
}

enum Event<Item, Err> {
  Next(Item),
  Error(Err),
  Complete,
}

pub(crate) struct SubjectState<Item, Err> {
  pub(crate) subscribers: Subscribers<Item, Err>,
  terminal: Option<Terminal<Err>>,
  buffer: VecDeque<Item>,
  policy: ReplayPolicy,
  /// A terminal event was accepted, though maybe not delivered yet.
  stopped: bool,
  emitting: bool,
  pending: VecDeque<Event<Item, Err>>,
}

impl<Item, Err> SubjectState<Item, Err> {
  fn record(&mut self, value: &Item)
  where
    Item: Clone,
  {
    match self.policy {
      ReplayPolicy::None => {}
      ReplayPolicy::Latest => {
        self.buffer.clear();
        self.buffer.push_back(value.clone());
      }
      ReplayPolicy::Bounded(capacity) => {
        if capacity > 0 {
          if self.buffer.len() == capacity {
            self.buffer.pop_front();
          }
          self.buffer.push_back(value.clone());
        }
      }
      ReplayPolicy::Unbounded => self.buffer.push_back(value.clone()),
    }
  }
}

pub(crate) struct SubjectCore<Item, Err>(MutArc<SubjectState<Item, Err>>);

impl<Item, Err> Clone for SubjectCore<Item, Err> {
  fn clone(&self) -> Self { SubjectCore(self.0.clone()) }
}

impl<Item, Err> SubjectCore<Item, Err> {
  pub(crate) fn new(policy: ReplayPolicy, seed: Option<Item>) -> Self {
    let buffer = seed.into_iter().collect();
    SubjectCore(MutArc::own(SubjectState {
      subscribers: Subscribers::default(),
      terminal: None,
      buffer,
      policy,
      stopped: false,
      emitting: false,
      pending: VecDeque::new(),
    }))
  }

  pub(crate) fn next(&self, value: Item)
  where
    Item: Clone,
    Err: Clone,
  {
    self.emit(Event::Next(value))
  }

  pub(crate) fn error(&self, err: Err)
  where
    Item: Clone,
    Err: Clone,
  {
    self.emit(Event::Error(err))
  }

  pub(crate) fn complete(&self)
  where
    Item: Clone,
    Err: Clone,
  {
    self.emit(Event::Complete)
  }

  fn emit(&self, event: Event<Item, Err>)
  where
    Item: Clone,
    Err: Clone,
  {
    {
      let mut state = self.0.rc_deref_mut();
      if state.stopped {
        return;
      }
      if !matches!(event, Event::Next(_)) {
        state.stopped = true;
      }
      state.pending.push_back(event);
      if state.emitting {
        return;
      }
      state.emitting = true;
    }
    self.drain_pending();
  }

  /// Deliver queued events until none is left. Only the caller that set
  /// `emitting` runs this.
  fn drain_pending(&self)
  where
    Item: Clone,
    Err: Clone,
  {
    loop {
      let (event, slots) = {
        let mut state = self.0.rc_deref_mut();
        let Some(event) = state.pending.pop_front() else {
          state.emitting = false;
          return;
        };
        let slots = match &event {
          Event::Next(value) => {
            state.record(value);
            state.subscribers.snapshot()
          }
          Event::Error(err) => {
            state.terminal = Some(Terminal::Error(err.clone()));
            state.subscribers.drain()
          }
          Event::Complete => {
            state.terminal = Some(Terminal::Completed);
            state.subscribers.drain()
          }
        };
        (event, slots)
      };
      match event {
        Event::Next(value) => {
          if slots.is_empty() {
            continue;
          }
          let stale = broadcast_value(&slots, value);
          if !stale.is_empty() {
            let mut state = self.0.rc_deref_mut();
            for id in stale {
              state.subscribers.remove(id);
            }
          }
        }
        Event::Error(err) => {
          tracing::debug!(subscribers = slots.len(), "subject terminated with error");
          broadcast_error(&slots, err);
        }
        Event::Complete => {
          tracing::debug!(subscribers = slots.len(), "subject completed");
          broadcast_complete(&slots);
        }
      }
    }
  }

  pub(crate) fn subscribe<O>(&self, observer: O) -> SubjectSubscription<Item, Err>
  where
    O: Observer<Item, Err> + Send + 'static,
    Item: Clone + 'static,
    Err: Clone + 'static,
  {
    let boxed: BoxedObserver<Item, Err> = Box::new(observer);
    let id = self.0.rc_deref_mut().subscribers.reserve_id();
    let slot = Slot::new(id, boxed);

    let mut guard = slot.observer.rc_deref_mut();
    // Holding the loop while replaying queues anything the new subscriber
    // emits back into this subject.
    let (replay, terminal, owns_loop) = {
      let mut state = self.0.rc_deref_mut();
      let replay: Vec<Item> = state.buffer.iter().cloned().collect();
      let terminal = state.terminal.clone();
      if terminal.is_none() {
        state.subscribers.push(slot.clone());
      }
      let owns_loop = !state.emitting;
      state.emitting = true;
      (replay, terminal, owns_loop)
    };

    for value in replay {
      if let Some(observer) = guard.as_mut() {
        observer.next(value);
      }
    }
    if let Some(terminal) = terminal {
      slot.closed.store(true, Ordering::Release);
      let observer = guard.take();
      drop(guard);
      match (observer, terminal) {
        (Some(observer), Terminal::Error(err)) => observer.error(err),
        (Some(observer), Terminal::Completed) => observer.complete(),
        (None, _) => {}
      }
    } else {
      drop(guard);
    }
    if owns_loop {
      self.drain_pending();
    }

    SubjectSubscription {
      id,
      closed: slot.closed.clone(),
      observer: slot.observer.clone(),
      state: self.0.downgrade(),
    }
  }

  pub(crate) fn observer_count(&self) -> usize { self.0.rc_deref().subscribers.len() }

  pub(crate) fn is_terminated(&self) -> bool { self.0.rc_deref().terminal.is_some() }

  pub(crate) fn latest(&self) -> Option<Item>
  where
    Item: Clone,
  {
    self.0.rc_deref().buffer.back().cloned()
  }
}
