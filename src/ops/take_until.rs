use std::sync::{
  atomic::{AtomicBool, Ordering},
  Arc,
};

use crate::{
  observable::{CoreObservable, ObservableType},
  observer::Observer,
  rc::MutArc,
  subscription::{SerialSubscription, Subscription, TupleSubscription},
};

/// Forwards source values until `notifier` produces its first event of any
/// kind, then completes and releases both streams.
#[derive(Clone)]
pub struct TakeUntil<S, N> {
  pub(crate) source: S,
  pub(crate) notifier: N,
}

impl<S: ObservableType, N> ObservableType for TakeUntil<S, N> {
  type Item = S::Item;
  type Err = S::Err;
}

impl<S, N> CoreObservable for TakeUntil<S, N>
where
  S: CoreObservable,
  N: CoreObservable,
{
  type Unsub = TupleSubscription<SerialSubscription, SerialSubscription>;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<S::Item, S::Err> + Send + 'static,
  {
    let shared = StopShared {
      observer: MutArc::own(Some(observer)),
      stopped: Arc::new(AtomicBool::new(false)),
    };
    let source_sub = SerialSubscription::new();
    let notifier_sub = SerialSubscription::new();

    let stop = {
      let shared = shared.clone();
      let source_sub = source_sub.clone();
      let notifier_sub = notifier_sub.clone();
      move || {
        shared.stopped.store(true, Ordering::Release);
        source_sub.clone().unsubscribe();
        notifier_sub.clone().unsubscribe();
        // Busy means a value is being delivered right now; its sender
        // completes once it sees the flag.
        if let Some(mut slot) = shared.observer.try_rc_deref() {
          if let Some(observer) = slot.take() {
            drop(slot);
            tracing::trace!("take_until notifier fired");
            observer.complete();
          }
        }
      }
    };
    let trigger = StopTrigger { stop, notifier: notifier_sub.clone() };
    notifier_sub.set(self.notifier.actual_subscribe(trigger));

    if !shared.stopped.load(Ordering::Acquire) {
      let forward = TakeUntilObserver { shared, notifier: notifier_sub.clone() };
      source_sub.set(self.source.actual_subscribe(forward));
    }
    TupleSubscription::new(source_sub, notifier_sub)
  }
}

struct StopShared<O> {
  observer: MutArc<Option<O>>,
  stopped: Arc<AtomicBool>,
}

impl<O> Clone for StopShared<O> {
  fn clone(&self) -> Self {
    StopShared { observer: self.observer.clone(), stopped: self.stopped.clone() }
  }
}

impl<O> StopShared<O> {
  fn complete_if_stopped<Item, Err>(&self)
  where
    O: Observer<Item, Err>,
  {
    if self.stopped.load(Ordering::Acquire) {
      let taken = self.observer.rc_deref_mut().take();
      if let Some(observer) = taken {
        observer.complete();
      }
    }
  }
}

/// Observes the notifier; any event runs `stop`.
pub struct StopTrigger<F> {
  stop: F,
  notifier: SerialSubscription,
}

impl<NItem, NErr, F: Fn()> Observer<NItem, NErr> for StopTrigger<F> {
  fn next(&mut self, _value: NItem) { (self.stop)() }

  fn error(self, _err: NErr) { (self.stop)() }

  fn complete(self) { (self.stop)() }

  fn is_closed(&self) -> bool { self.notifier.is_closed() }
}

pub struct TakeUntilObserver<O> {
  shared: StopShared<O>,
  notifier: SerialSubscription,
}

impl<Item, Err, O> Observer<Item, Err> for TakeUntilObserver<O>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) {
    self.shared.observer.next(value);
    self.shared.complete_if_stopped::<Item, Err>();
  }

  fn error(self, err: Err) {
    self.notifier.unsubscribe();
    self.shared.observer.error(err)
  }

  fn complete(self) {
    self.notifier.unsubscribe();
    self.shared.observer.complete()
  }

  fn is_closed(&self) -> bool {
    self.shared.stopped.load(Ordering::Acquire) || self.shared.observer.is_closed()
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
  };

  use crate::prelude::*;

  #[rxflow_macro::test]
  fn completes_when_notifier_fires() {
    let source = Subject::<i32, Infallible>::new();
    let notifier = Subject::<&str, Infallible>::new();
    let seen = Arc::new(Mutex::new(vec![]));
    let completed = Arc::new(AtomicBool::new(false));
    let (c_seen, c_completed) = (seen.clone(), completed.clone());
    let _ = source
      .clone()
      .take_until(notifier.clone())
      .on_complete(move || c_completed.store(true, Ordering::SeqCst))
      .subscribe(move |v| c_seen.lock().unwrap().push(v));

    source.next(1);
    source.next(2);
    notifier.next("stop");
    source.next(3);
    assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    assert!(completed.load(Ordering::SeqCst));
    assert_eq!(source.observer_count(), 0);
    assert_eq!(notifier.observer_count(), 0);
  }

  #[rxflow_macro::test]
  fn notifier_error_also_stops() {
    let source = Subject::<i32, Infallible>::new();
    let notifier = Subject::<(), String>::new();
    let seen = Arc::new(Mutex::new(vec![]));
    let c_seen = seen.clone();
    let _ = source
      .clone()
      .take_until(notifier.clone())
      .subscribe(move |v| c_seen.lock().unwrap().push(v));
    source.next(1);
    notifier.error("gone".to_string());
    source.next(2);
    assert_eq!(*seen.lock().unwrap(), vec![1]);
  }

  #[rxflow_macro::test]
  fn source_completion_releases_notifier() {
    let notifier = Subject::<(), Infallible>::new();
    let seen = Arc::new(Mutex::new(vec![]));
    let c_seen = seen.clone();
    let _ = Shared::from_iter([1, 2])
      .take_until(notifier.clone())
      .subscribe(move |v| c_seen.lock().unwrap().push(v));
    assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    assert_eq!(notifier.observer_count(), 0);
  }

  #[rxflow_macro::test]
  fn timer_notifier_cuts_interval() {
    let scheduler = TestScheduler::new();
    let seen = Arc::new(Mutex::new(vec![]));
    let c_seen = seen.clone();
    let _ = Shared::interval(Duration::from_millis(10), scheduler.clone())
      .take_until(Shared::timer(Duration::from_millis(35), scheduler.clone()))
      .subscribe(move |v| c_seen.lock().unwrap().push(v));
    scheduler.advance_by(Duration::from_millis(100));
    assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2]);
    assert_eq!(scheduler.pending_count(), 0);
  }
}
