use crate::{
  observable::{CoreObservable, ObservableType},
  observer::Observer,
  rc::MutArc,
  scheduler::{Duration, Scheduler, TaskHandle},
  subscription::{DynamicSubscriptions, SerialSubscription, TupleSubscription},
};

/// Shifts every event, terminal ones included, later by `delay`. Relative
/// order and spacing are kept. Releasing the subscription cancels every
/// delivery still waiting on the scheduler.
#[derive(Clone)]
pub struct Delay<S, SD> {
  pub(crate) source: S,
  pub(crate) delay: Duration,
  pub(crate) scheduler: SD,
}

impl<S: ObservableType, SD> ObservableType for Delay<S, SD> {
  type Item = S::Item;
  type Err = S::Err;
}

impl<S, SD> CoreObservable for Delay<S, SD>
where
  S: CoreObservable,
  S::Item: Send + 'static,
  S::Err: Send + 'static,
  SD: Scheduler,
{
  type Unsub = TupleSubscription<S::Unsub, DynamicSubscriptions>;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<S::Item, S::Err> + Send + 'static,
  {
    let pending = DynamicSubscriptions::default();
    let observer = DelayObserver {
      observer: MutArc::own(Some(observer)),
      delay: self.delay,
      scheduler: self.scheduler,
      pending: pending.clone(),
    };
    let unsub = self.source.actual_subscribe(observer);
    TupleSubscription::new(unsub, pending)
  }
}

pub struct DelayObserver<O, SD> {
  observer: MutArc<Option<O>>,
  delay: Duration,
  scheduler: SD,
  pending: DynamicSubscriptions,
}

impl<O, SD: Scheduler> DelayObserver<O, SD> {
  fn later<F>(&self, deliver: F)
  where
    F: FnOnce(MutArc<Option<O>>) + Send + 'static,
    O: Send + 'static,
  {
    let id = self.pending.reserve();
    let observer = self.observer.clone();
    let pending = self.pending.clone();
    let handle = self.scheduler.schedule_after(self.delay, move || {
      deliver(observer);
      pending.remove(id);
    });
    self.pending.fill(id, handle);
  }
}

impl<Item, Err, O, SD> Observer<Item, Err> for DelayObserver<O, SD>
where
  O: Observer<Item, Err> + Send + 'static,
  Item: Send + 'static,
  Err: Send + 'static,
  SD: Scheduler,
{
  fn next(&mut self, value: Item) { self.later(move |mut observer| observer.next(value)) }

  fn error(self, err: Err) { self.later(move |observer| observer.error(err)) }

  fn complete(self) { self.later(|observer| observer.complete()) }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

/// Postpones subscribing to the upstream by `delay`. Events themselves are
/// not shifted.
#[derive(Clone)]
pub struct DelaySubscription<S, SD> {
  pub(crate) source: S,
  pub(crate) delay: Duration,
  pub(crate) scheduler: SD,
}

impl<S: ObservableType, SD> ObservableType for DelaySubscription<S, SD> {
  type Item = S::Item;
  type Err = S::Err;
}

impl<S, SD> CoreObservable for DelaySubscription<S, SD>
where
  S: CoreObservable + Send + 'static,
  SD: Scheduler,
{
  type Unsub = TupleSubscription<TaskHandle, SerialSubscription>;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<S::Item, S::Err> + Send + 'static,
  {
    let upstream = SerialSubscription::new();
    let c_upstream = upstream.clone();
    let source = self.source;
    let handle = self.scheduler.schedule_after(self.delay, move || {
      tracing::trace!("delayed subscription starts");
      c_upstream.set(source.actual_subscribe(observer));
    });
    TupleSubscription::new(handle, upstream)
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{Arc, Mutex};

  use crate::prelude::*;

  fn log() -> Arc<Mutex<Vec<String>>> { Arc::new(Mutex::new(vec![])) }

  #[rxflow_macro::test]
  fn keeps_relative_spacing() {
    let scheduler = TestScheduler::new();
    let source = Subject::<i32, Infallible>::new();
    let seen = log();
    let (n_seen, c_seen) = (seen.clone(), seen.clone());
    let _ = source
      .clone()
      .delay(Duration::from_millis(100), scheduler.clone())
      .on_complete(move || c_seen.lock().unwrap().push("done".into()))
      .subscribe(move |v| n_seen.lock().unwrap().push(v.to_string()));

    source.next(1);
    scheduler.advance_by(Duration::from_millis(30));
    source.next(2);
    source.complete();
    scheduler.advance_by(Duration::from_millis(70));
    assert_eq!(*seen.lock().unwrap(), vec!["1"]);
    scheduler.advance_by(Duration::from_millis(30));
    assert_eq!(*seen.lock().unwrap(), vec!["1", "2", "done"]);
  }

  #[rxflow_macro::test]
  fn errors_are_delayed_too() {
    let scheduler = TestScheduler::new();
    let err = Arc::new(Mutex::new(None));
    let c_err = err.clone();
    let _ = Shared::throw_err::<i32, _>("late")
      .delay(Duration::from_millis(5), scheduler.clone())
      .on_error(move |e| *c_err.lock().unwrap() = Some(e))
      .subscribe(|_| {});
    assert!(err.lock().unwrap().is_none());
    scheduler.advance_by(Duration::from_millis(5));
    assert_eq!(*err.lock().unwrap(), Some("late"));
  }

  #[rxflow_macro::test]
  fn release_cancels_pending_deliveries() {
    let scheduler = TestScheduler::new();
    let seen = Arc::new(Mutex::new(vec![]));
    let c_seen = seen.clone();
    let sub = Shared::from_iter([1, 2, 3])
      .delay(Duration::from_millis(10), scheduler.clone())
      .subscribe(move |v| c_seen.lock().unwrap().push(v));
    assert_eq!(scheduler.pending_count(), 4);

    sub.unsubscribe();
    assert_eq!(scheduler.pending_count(), 0);
    scheduler.advance_by(Duration::from_millis(10));
    assert!(seen.lock().unwrap().is_empty());
  }

  #[rxflow_macro::test]
  fn delay_subscription_defers_cold_start() {
    let scheduler = TestScheduler::new();
    let subscribed = Arc::new(Mutex::new(None));
    let c_subscribed = subscribed.clone();
    let c_scheduler = scheduler.clone();
    let source = Shared::defer(move || {
      *c_subscribed.lock().unwrap() = Some(c_scheduler.now());
      Shared::of(1)
    });
    let _ = source
      .delay_subscription(Duration::from_millis(50), scheduler.clone())
      .subscribe(|_| {});

    assert!(subscribed.lock().unwrap().is_none());
    scheduler.advance_by(Duration::from_millis(50));
    assert_eq!(*subscribed.lock().unwrap(), Some(Duration::from_millis(50)));
  }

  #[rxflow_macro::test]
  fn delay_subscription_released_before_start() {
    let scheduler = TestScheduler::new();
    let source = Subject::<i32, Infallible>::new();
    let sub = source
      .clone()
      .delay_subscription(Duration::from_millis(50), scheduler.clone())
      .subscribe(|_| {});
    sub.unsubscribe();
    scheduler.flush();
    assert_eq!(source.observer_count(), 0);
    assert_eq!(scheduler.pending_count(), 0);
  }
}
