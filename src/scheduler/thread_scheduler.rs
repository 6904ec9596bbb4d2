use std::{
  sync::{Arc, Condvar, Mutex, PoisonError},
  thread,
  time::Instant,
};

use super::{Duration, Scheduler, TaskHandle};

/// Runs every scheduled task on a new OS thread.
///
/// A waiting thread sleeps on a condition variable, so releasing the task
/// handle wakes it up and the work is dropped without running.
#[derive(Clone, Copy, Default, Debug)]
pub struct ThreadScheduler;

#[derive(Default)]
struct CancelSignal {
  cancelled: Mutex<bool>,
  wake: Condvar,
}

impl CancelSignal {
  fn cancel(&self) {
    *self.cancelled.lock().unwrap_or_else(PoisonError::into_inner) = true;
    self.wake.notify_all();
  }

  /// Sleep until `deadline`. Returns false if cancelled first.
  fn wait_until(&self, deadline: Instant) -> bool {
    let mut cancelled = self.cancelled.lock().unwrap_or_else(PoisonError::into_inner);
    loop {
      if *cancelled {
        return false;
      }
      let now = Instant::now();
      if now >= deadline {
        return true;
      }
      cancelled = self
        .wake
        .wait_timeout(cancelled, deadline - now)
        .unwrap_or_else(PoisonError::into_inner)
        .0;
    }
  }

  fn is_cancelled(&self) -> bool { *self.cancelled.lock().unwrap_or_else(PoisonError::into_inner) }
}

fn spawn_with_signal(handle: &TaskHandle, body: impl FnOnce(Arc<CancelSignal>) + Send + 'static) {
  let signal = Arc::new(CancelSignal::default());
  let c_signal = signal.clone();
  handle.set_canceller(move || c_signal.cancel());
  thread::spawn(move || body(signal));
}

impl Scheduler for ThreadScheduler {
  fn schedule<F>(&self, task: F, delay: Option<Duration>) -> TaskHandle
  where
    F: FnOnce() + Send + 'static,
  {
    let handle = TaskHandle::new();
    let c_handle = handle.clone();
    let deadline = Instant::now() + delay.unwrap_or(Duration::ZERO);
    spawn_with_signal(&handle, move |signal| {
      if signal.wait_until(deadline) {
        c_handle.mark_finished();
        task();
      }
    });
    handle
  }

  fn schedule_periodic<F>(&self, mut task: F, delay: Duration, period: Duration) -> TaskHandle
  where
    F: FnMut() + Send + 'static,
  {
    let handle = TaskHandle::new();
    let mut deadline = Instant::now() + delay;
    spawn_with_signal(&handle, move |signal| {
      while signal.wait_until(deadline) {
        task();
        if signal.is_cancelled() {
          break;
        }
        deadline += period;
      }
    });
    handle
  }
}
