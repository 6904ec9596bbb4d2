use futures::future::abortable;
use tokio::{
  runtime::Handle,
  time::{interval_at, sleep, Instant, MissedTickBehavior},
};

use super::{Duration, Scheduler, TaskHandle};

/// Spawns scheduled work onto a tokio runtime.
///
/// Each task is an abortable future; releasing the handle aborts it, which
/// drops the pending sleep together with the work.
#[derive(Clone, Debug)]
pub struct TokioScheduler {
  handle: Handle,
}

impl TokioScheduler {
  /// Use the runtime of the current context.
  ///
  /// # Panics
  ///
  /// Panics when called outside a tokio runtime.
  pub fn current() -> Self { TokioScheduler { handle: Handle::current() } }

  pub fn from_handle(handle: Handle) -> Self { TokioScheduler { handle } }

  fn spawn_abortable<Fut>(&self, task_handle: &TaskHandle, fut: Fut)
  where
    Fut: std::future::Future<Output = ()> + Send + 'static,
  {
    let (fut, abort) = abortable(fut);
    task_handle.set_canceller(move || abort.abort());
    self.handle.spawn(fut);
  }
}

impl Scheduler for TokioScheduler {
  fn schedule<F>(&self, task: F, delay: Option<Duration>) -> TaskHandle
  where
    F: FnOnce() + Send + 'static,
  {
    let handle = TaskHandle::new();
    let c_handle = handle.clone();
    self.spawn_abortable(&handle, async move {
      if let Some(delay) = delay {
        sleep(delay).await;
      }
      c_handle.mark_finished();
      task();
    });
    handle
  }

  fn schedule_periodic<F>(&self, mut task: F, delay: Duration, period: Duration) -> TaskHandle
  where
    F: FnMut() + Send + 'static,
  {
    let handle = TaskHandle::new();
    let period = period.max(Duration::from_millis(1));
    self.spawn_abortable(&handle, async move {
      let mut ticker = interval_at(Instant::now() + delay, period);
      ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
      loop {
        ticker.tick().await;
        task();
      }
    });
    handle
  }
}
