//! Test Scheduler for deterministic testing of time-based operators.
//!
//! Provides virtual time that only advances when explicitly instructed,
//! enabling deterministic testing of `delay`, `timeout`, `interval`, etc.
//!
//! # Usage
//!
//! ```rust
//! use std::sync::{Arc, Mutex};
//! use rxflow::prelude::*;
//!
//! let scheduler = TestScheduler::new();
//! let seen = Arc::new(Mutex::new(vec![]));
//! let c_seen = seen.clone();
//!
//! let _sub = Shared::of(42)
//!   .delay(Duration::from_millis(100), scheduler.clone())
//!   .subscribe(move |v| c_seen.lock().unwrap().push(v));
//!
//! scheduler.advance_by(Duration::from_millis(99));
//! assert!(seen.lock().unwrap().is_empty());
//! scheduler.advance_by(Duration::from_millis(1));
//! assert_eq!(*seen.lock().unwrap(), vec![42]);
//! ```
//!
//! # Execution
//!
//! Clones share one clock and one queue. Tasks run on the thread that
//! advances time, in due-time order and FIFO among tasks due at the same
//! instant. No scheduler lock is held while a task runs, so tasks may
//! schedule or cancel other tasks.

use std::collections::BTreeMap;

use super::{Duration, Scheduler, TaskHandle};
use crate::{rc::MutArc, subscription::Subscription};

enum Work {
  Once(Box<dyn FnOnce() + Send>),
  Periodic { task: Box<dyn FnMut() + Send>, period: Duration },
}

struct Entry {
  id: u64,
  work: Work,
  handle: TaskHandle,
}

#[derive(Default)]
struct TestSchedulerState {
  virtual_time: Duration,
  next_seq: u64,
  queue: BTreeMap<(Duration, u64), Entry>,
}

impl TestSchedulerState {
  fn push(&mut self, due: Duration, entry: Entry) {
    let seq = self.next_seq;
    self.next_seq += 1;
    self.queue.insert((due, seq), entry);
  }

  fn pop_due(&mut self, until: Duration) -> Option<(Duration, Entry)> {
    let key = *self.queue.keys().next()?;
    if key.0 > until {
      return None;
    }
    self.queue.remove(&key).map(|entry| (key.0, entry))
  }
}

/// A virtual time scheduler for deterministic testing.
#[derive(Clone, Default)]
pub struct TestScheduler(MutArc<TestSchedulerState>);

impl TestScheduler {
  pub fn new() -> Self { Self::default() }

  /// Current virtual time, measured from the scheduler's creation.
  pub fn now(&self) -> Duration { self.0.rc_deref().virtual_time }

  /// Number of tasks waiting in the queue.
  pub fn pending_count(&self) -> usize { self.0.rc_deref().queue.len() }

  /// Advance the clock by `delta`, running every task that falls due.
  pub fn advance_by(&self, delta: Duration) {
    let target = self.now() + delta;
    self.advance_to(target);
  }

  /// Advance the clock to `target`, running every task that falls due.
  pub fn advance_to(&self, target: Duration) {
    loop {
      let next = self.0.rc_deref_mut().pop_due(target);
      let Some((due, entry)) = next else { break };
      self.0.rc_deref_mut().virtual_time = due;
      self.run(due, entry);
    }
    let mut state = self.0.rc_deref_mut();
    if state.virtual_time < target {
      state.virtual_time = target;
    }
  }

  /// Run everything currently queued by advancing to the latest due time in
  /// the queue. Periodic tasks fire as many times as fit in that span.
  pub fn flush(&self) {
    let last = self.0.rc_deref().queue.keys().next_back().map(|k| k.0);
    if let Some(last) = last {
      self.advance_to(last);
    }
  }

  fn run(&self, due: Duration, entry: Entry) {
    let Entry { id, work, handle } = entry;
    if handle.is_closed() {
      return;
    }
    match work {
      Work::Once(task) => {
        handle.mark_finished();
        tracing::trace!(?due, id, "test scheduler runs task");
        task();
      }
      Work::Periodic { mut task, period } => {
        tracing::trace!(?due, id, "test scheduler runs periodic task");
        task();
        if !handle.is_closed() {
          let entry = Entry { id, work: Work::Periodic { task, period }, handle };
          self.0.rc_deref_mut().push(due + period, entry);
        }
      }
    }
  }

  fn enqueue(&self, work: Work, delay: Duration) -> TaskHandle {
    let handle = TaskHandle::new();
    let id = {
      let mut state = self.0.rc_deref_mut();
      let id = state.next_seq;
      let due = state.virtual_time + delay;
      state.push(due, Entry { id, work, handle: handle.clone() });
      id
    };
    let weak = self.0.downgrade();
    handle.set_canceller(move || {
      if let Some(state) = weak.upgrade() {
        state.rc_deref_mut().queue.retain(|_, entry| entry.id != id);
      }
    });
    handle
  }
}

impl Scheduler for TestScheduler {
  fn schedule<F>(&self, task: F, delay: Option<Duration>) -> TaskHandle
  where
    F: FnOnce() + Send + 'static,
  {
    self.enqueue(Work::Once(Box::new(task)), delay.unwrap_or(Duration::ZERO))
  }

  fn schedule_periodic<F>(&self, task: F, delay: Duration, period: Duration) -> TaskHandle
  where
    F: FnMut() + Send + 'static,
  {
    let period = period.max(Duration::from_nanos(1));
    self.enqueue(Work::Periodic { task: Box::new(task), period }, delay)
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{Arc, Mutex};

  use super::*;

  fn recorder() -> (Arc<Mutex<Vec<u32>>>, impl Fn(u32) -> Box<dyn FnOnce() + Send>) {
    let log = Arc::new(Mutex::new(vec![]));
    let c_log = log.clone();
    let make = move |v: u32| -> Box<dyn FnOnce() + Send> {
      let log = c_log.clone();
      Box::new(move || log.lock().unwrap().push(v))
    };
    (log, make)
  }

  #[rxflow_macro::test]
  fn runs_in_due_order_then_fifo() {
    let scheduler = TestScheduler::new();
    let (log, task) = recorder();

    scheduler.schedule_after(Duration::from_millis(20), task(3));
    scheduler.schedule_after(Duration::from_millis(10), task(1));
    scheduler.schedule_after(Duration::from_millis(10), task(2));
    scheduler.schedule_now(task(0));
    assert_eq!(scheduler.pending_count(), 4);

    scheduler.advance_by(Duration::ZERO);
    assert_eq!(*log.lock().unwrap(), vec![0]);

    scheduler.advance_by(Duration::from_millis(10));
    assert_eq!(*log.lock().unwrap(), vec![0, 1, 2]);
    assert_eq!(scheduler.now(), Duration::from_millis(10));

    scheduler.flush();
    assert_eq!(*log.lock().unwrap(), vec![0, 1, 2, 3]);
    assert_eq!(scheduler.pending_count(), 0);
  }

  #[rxflow_macro::test]
  fn cancelled_task_is_removed() {
    let scheduler = TestScheduler::new();
    let (log, task) = recorder();

    let handle = scheduler.schedule_after(Duration::from_millis(5), task(1));
    assert_eq!(scheduler.pending_count(), 1);
    handle.unsubscribe();
    assert_eq!(scheduler.pending_count(), 0);

    scheduler.advance_by(Duration::from_millis(10));
    assert!(log.lock().unwrap().is_empty());
  }

  #[rxflow_macro::test]
  fn periodic_until_cancelled() {
    let scheduler = TestScheduler::new();
    let ticks = Arc::new(Mutex::new(vec![]));
    let c_ticks = ticks.clone();
    let c_scheduler = scheduler.clone();

    let handle = scheduler.schedule_periodic(
      move || c_ticks.lock().unwrap().push(c_scheduler.now().as_millis()),
      Duration::from_millis(5),
      Duration::from_millis(10),
    );

    scheduler.advance_by(Duration::from_millis(30));
    assert_eq!(*ticks.lock().unwrap(), vec![5, 15, 25]);

    handle.unsubscribe();
    scheduler.advance_by(Duration::from_millis(30));
    assert_eq!(ticks.lock().unwrap().len(), 3);
    assert_eq!(scheduler.pending_count(), 0);
  }

  #[rxflow_macro::test]
  fn tasks_may_schedule_tasks() {
    let scheduler = TestScheduler::new();
    let (log, task) = recorder();
    let c_scheduler = scheduler.clone();
    let inner = task(2);
    scheduler.schedule_after(Duration::from_millis(1), move || {
      c_scheduler.schedule_after(Duration::from_millis(1), inner);
    });
    scheduler.advance_by(Duration::from_millis(1));
    assert!(log.lock().unwrap().is_empty());
    scheduler.advance_by(Duration::from_millis(1));
    assert_eq!(*log.lock().unwrap(), vec![2]);
  }
}
