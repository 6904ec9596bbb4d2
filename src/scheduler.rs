//! Execution contexts for time-based work.
//!
//! Every time-based operator takes its scheduler as an explicit argument;
//! there is no global default.
//!
//! * [`TestScheduler`]: virtual time, advanced by hand. Deterministic.
//! * [`ThreadScheduler`]: one OS thread per scheduled task.
//! * `TokioScheduler` (feature `tokio-scheduler`): tasks spawned on a tokio
//!   runtime.

use std::sync::{
  atomic::{AtomicBool, Ordering},
  Arc, Mutex, PoisonError,
};
pub use std::time::Duration;

use crate::subscription::Subscription;

mod test_scheduler;
mod thread_scheduler;
#[cfg(feature = "tokio-scheduler")]
mod tokio_scheduler;

pub use test_scheduler::TestScheduler;
pub use thread_scheduler::ThreadScheduler;
#[cfg(feature = "tokio-scheduler")]
pub use tokio_scheduler::TokioScheduler;

/// A Scheduler orders units of work and runs them now, later, or
/// periodically. Each call returns a [`TaskHandle`] that cancels the work if
/// released before it runs (or, for periodic work, stops further runs).
pub trait Scheduler: Clone + Send + Sync + 'static {
  /// Run `task` once, after `delay` if given.
  fn schedule<F>(&self, task: F, delay: Option<Duration>) -> TaskHandle
  where
    F: FnOnce() + Send + 'static;

  /// Run `task` first after `delay`, then every `period` until cancelled.
  fn schedule_periodic<F>(&self, task: F, delay: Duration, period: Duration) -> TaskHandle
  where
    F: FnMut() + Send + 'static;

  #[inline]
  fn schedule_now<F>(&self, task: F) -> TaskHandle
  where
    F: FnOnce() + Send + 'static,
  {
    self.schedule(task, None)
  }

  #[inline]
  fn schedule_after<F>(&self, delay: Duration, task: F) -> TaskHandle
  where
    F: FnOnce() + Send + 'static,
  {
    self.schedule(task, Some(delay))
  }
}

type Canceller = Box<dyn FnOnce() + Send>;

struct TaskHandleInner {
  closed: AtomicBool,
  canceller: Mutex<Option<Canceller>>,
}

/// Cancel handle for scheduled work.
///
/// A scheduler registers a canceller with [`set_canceller`]; releasing the
/// handle runs it once so the pending work is removed from the scheduler
/// instead of firing and being ignored.
///
/// [`set_canceller`]: TaskHandle::set_canceller
#[derive(Clone)]
pub struct TaskHandle(Arc<TaskHandleInner>);

impl Default for TaskHandle {
  fn default() -> Self { Self::new() }
}

impl TaskHandle {
  pub fn new() -> Self {
    TaskHandle(Arc::new(TaskHandleInner {
      closed: AtomicBool::new(false),
      canceller: Mutex::new(None),
    }))
  }

  /// A handle for work that has already run.
  pub fn finished() -> Self {
    let handle = Self::new();
    handle.mark_finished();
    handle
  }

  /// Register how to cancel the work. If the handle was released before the
  /// scheduler got here, the canceller runs right away.
  pub fn set_canceller(&self, canceller: impl FnOnce() + Send + 'static) {
    if self.is_closed() {
      canceller();
      return;
    }
    *self.lock_canceller() = Some(Box::new(canceller));
    // released between the check and the store
    if self.is_closed() {
      let canceller = self.lock_canceller().take();
      if let Some(canceller) = canceller {
        canceller();
      }
    }
  }

  /// The work ran to completion; nothing is left to cancel.
  pub fn mark_finished(&self) {
    self.0.closed.store(true, Ordering::Release);
    self.lock_canceller().take();
  }

  fn lock_canceller(&self) -> std::sync::MutexGuard<'_, Option<Canceller>> {
    self.0.canceller.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

impl Subscription for TaskHandle {
  fn unsubscribe(self) {
    if !self.0.closed.swap(true, Ordering::AcqRel) {
      let canceller = self.lock_canceller().take();
      if let Some(canceller) = canceller {
        tracing::trace!("scheduled task cancelled");
        canceller();
      }
    }
  }

  fn is_closed(&self) -> bool { self.0.closed.load(Ordering::Acquire) }
}
