use std::convert::Infallible;

use crate::{
  observable::{CoreObservable, ObservableType},
  observer::Observer,
  scheduler::{Duration, Scheduler, TaskHandle},
};

/// Emits `0, 1, 2, ...`, one value every `period`, the first one after one
/// `period` has elapsed. Never completes.
#[derive(Clone)]
pub struct Interval<SD> {
  pub period: Duration,
  pub scheduler: SD,
}

impl<SD> ObservableType for Interval<SD> {
  type Item = usize;
  type Err = Infallible;
}

impl<SD: Scheduler> CoreObservable for Interval<SD> {
  type Unsub = TaskHandle;

  fn actual_subscribe<O>(self, mut observer: O) -> Self::Unsub
  where
    O: Observer<usize, Infallible> + Send + 'static,
  {
    let mut tick = 0;
    self.scheduler.schedule_periodic(
      move || {
        if !observer.is_closed() {
          observer.next(tick);
          tick += 1;
        }
      },
      self.period,
      self.period,
    )
  }
}
