use std::sync::{
  atomic::{AtomicU64, Ordering},
  Arc,
};

use crate::{
  error::TimeoutError,
  observable::{CoreObservable, ObservableType},
  observer::Observer,
  rc::MutArc,
  scheduler::{Duration, Scheduler},
  subscription::{SerialSubscription, Subscription, TupleSubscription},
};

/// Fails with [`TimeoutError`] when no event arrives within `due` of the
/// subscription or of the previous value. Every value restarts the clock.
#[derive(Clone)]
pub struct Timeout<S, SD> {
  pub(crate) source: S,
  pub(crate) due: Duration,
  pub(crate) scheduler: SD,
}

impl<S: ObservableType, SD> ObservableType for Timeout<S, SD> {
  type Item = S::Item;
  type Err = S::Err;
}

impl<S, SD> CoreObservable for Timeout<S, SD>
where
  S: CoreObservable,
  S::Err: From<TimeoutError> + 'static,
  SD: Scheduler,
{
  type Unsub = TupleSubscription<SerialSubscription, SerialSubscription>;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<S::Item, S::Err> + Send + 'static,
  {
    let ctx = TimeoutContext {
      observer: MutArc::own(Some(observer)),
      generation: Arc::new(AtomicU64::new(0)),
      upstream: SerialSubscription::new(),
      timer: SerialSubscription::new(),
      due: self.due,
      scheduler: self.scheduler,
    };
    ctx.arm::<S::Item, S::Err>(0);
    ctx.upstream.set(self.source.actual_subscribe(TimeoutObserver(ctx.clone())));
    TupleSubscription::new(ctx.upstream, ctx.timer)
  }
}

struct TimeoutContext<O, SD> {
  observer: MutArc<Option<O>>,
  generation: Arc<AtomicU64>,
  upstream: SerialSubscription,
  timer: SerialSubscription,
  due: Duration,
  scheduler: SD,
}

impl<O, SD: Clone> Clone for TimeoutContext<O, SD> {
  fn clone(&self) -> Self {
    TimeoutContext {
      observer: self.observer.clone(),
      generation: self.generation.clone(),
      upstream: self.upstream.clone(),
      timer: self.timer.clone(),
      due: self.due,
      scheduler: self.scheduler.clone(),
    }
  }
}

impl<O, SD> TimeoutContext<O, SD>
where
  O: Send + 'static,
  SD: Scheduler,
{
  fn arm<Item, Err>(&self, generation: u64)
  where
    O: Observer<Item, Err>,
    Err: From<TimeoutError> + 'static,
  {
    let ctx = self.clone();
    let handle = self.scheduler.schedule_after(self.due, move || ctx.fire::<Item, Err>(generation));
    self.timer.set(handle);
  }

  fn fire<Item, Err>(&self, generation: u64)
  where
    O: Observer<Item, Err>,
    Err: From<TimeoutError>,
  {
    // A value that arrived meanwhile moved the generation on.
    let moved_on = self
      .generation
      .compare_exchange(generation, generation + 1, Ordering::AcqRel, Ordering::Acquire)
      .is_err();
    if moved_on {
      return;
    }
    tracing::debug!(due = ?self.due, "timeout elapsed");
    self.upstream.clone().unsubscribe();
    self.observer.clone().error(TimeoutError { due: self.due }.into());
  }
}

pub struct TimeoutObserver<O, SD>(TimeoutContext<O, SD>);

impl<Item, Err, O, SD> Observer<Item, Err> for TimeoutObserver<O, SD>
where
  O: Observer<Item, Err> + Send + 'static,
  Err: From<TimeoutError> + 'static,
  SD: Scheduler,
{
  fn next(&mut self, value: Item) {
    let generation = self.0.generation.fetch_add(1, Ordering::AcqRel) + 1;
    self.0.observer.next(value);
    self.0.arm::<Item, Err>(generation);
  }

  fn error(self, err: Err) {
    self.0.generation.fetch_add(1, Ordering::AcqRel);
    self.0.timer.clone().unsubscribe();
    self.0.observer.error(err);
  }

  fn complete(self) {
    self.0.generation.fetch_add(1, Ordering::AcqRel);
    self.0.timer.clone().unsubscribe();
    self.0.observer.complete();
  }

  fn is_closed(&self) -> bool { self.0.observer.is_closed() }
}
