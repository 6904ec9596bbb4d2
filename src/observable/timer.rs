use std::convert::Infallible;

use crate::{
  observable::{CoreObservable, ObservableType},
  observer::Observer,
  scheduler::{Duration, Scheduler, TaskHandle},
};

/// Emits `0` after `due`. With a `period`, keeps emitting `1, 2, ...` every
/// `period` and never completes; without one it completes after the single
/// value.
#[derive(Clone)]
pub struct Timer<SD> {
  pub due: Duration,
  pub period: Option<Duration>,
  pub scheduler: SD,
}

impl<SD> ObservableType for Timer<SD> {
  type Item = usize;
  type Err = Infallible;
}

impl<SD: Scheduler> CoreObservable for Timer<SD> {
  type Unsub = TaskHandle;

  fn actual_subscribe<O>(self, mut observer: O) -> Self::Unsub
  where
    O: Observer<usize, Infallible> + Send + 'static,
  {
    match self.period {
      None => self.scheduler.schedule(
        move || {
          observer.next(0);
          observer.complete();
        },
        Some(self.due),
      ),
      Some(period) => {
        let mut tick = 0;
        self.scheduler.schedule_periodic(
          move || {
            if !observer.is_closed() {
              observer.next(tick);
              tick += 1;
            }
          },
          self.due,
          period,
        )
      }
    }
  }
}
