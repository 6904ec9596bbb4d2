use std::sync::{
  atomic::{AtomicBool, Ordering},
  Arc,
};

use crate::{
  observable::{CoreObservable, ObservableType},
  observer::Observer,
  subscription::{SerialSubscription, Subscription, TupleSubscription},
};

/// Drops source values until `notifier` produces its first event of any
/// kind.
#[derive(Clone)]
pub struct SkipUntil<S, N> {
  pub(crate) source: S,
  pub(crate) notifier: N,
}

impl<S: ObservableType, N> ObservableType for SkipUntil<S, N> {
  type Item = S::Item;
  type Err = S::Err;
}

impl<S, N> CoreObservable for SkipUntil<S, N>
where
  S: CoreObservable,
  N: CoreObservable,
{
  type Unsub = TupleSubscription<SerialSubscription, S::Unsub>;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<S::Item, S::Err> + Send + 'static,
  {
    let open = Arc::new(AtomicBool::new(false));
    let notifier_sub = SerialSubscription::new();
    let gate = OpenGate { open: open.clone(), subscription: notifier_sub.clone() };
    notifier_sub.set(self.notifier.actual_subscribe(gate));
    let source_sub = self.source.actual_subscribe(SkipUntilObserver {
      observer,
      open,
      notifier: notifier_sub.clone(),
    });
    TupleSubscription::new(notifier_sub, source_sub)
  }
}

/// Opens the gate on the notifier's first event and lets the notifier go.
pub struct OpenGate {
  open: Arc<AtomicBool>,
  subscription: SerialSubscription,
}

impl OpenGate {
  fn open(&self) {
    self.open.store(true, Ordering::Release);
    self.subscription.clone().unsubscribe();
  }
}

impl<Item, Err> Observer<Item, Err> for OpenGate {
  fn next(&mut self, _value: Item) { self.open() }

  fn error(self, _err: Err) { self.open() }

  fn complete(self) { self.open() }

  fn is_closed(&self) -> bool { self.open.load(Ordering::Acquire) }
}

pub struct SkipUntilObserver<O> {
  observer: O,
  open: Arc<AtomicBool>,
  notifier: SerialSubscription,
}

impl<Item, Err, O> Observer<Item, Err> for SkipUntilObserver<O>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) {
    if self.open.load(Ordering::Acquire) {
      self.observer.next(value);
    }
  }

  fn error(self, err: Err) {
    self.notifier.unsubscribe();
    self.observer.error(err);
  }

  fn complete(self) {
    self.notifier.unsubscribe();
    self.observer.complete();
  }

  #[inline]
  fn is_closed(&self) -> bool { self.observer.is_closed() }
}
