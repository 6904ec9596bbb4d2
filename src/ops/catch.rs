use std::convert::Infallible;

use crate::{
  observable::{CoreObservable, ObservableType},
  observer::Observer,
  subscription::{SerialSubscription, TupleSubscription},
};

/// On error, continues with the observable `handler` builds from it.
///
/// Values and completion of the source pass through unchanged. The output
/// carries the recovery stream's error type, so a recovery that cannot fail
/// makes the whole stream infallible.
#[derive(Clone)]
pub struct Catch<S, F> {
  pub(crate) source: S,
  pub(crate) handler: F,
}

impl<S, F, R> ObservableType for Catch<S, F>
where
  S: ObservableType,
  F: FnOnce(S::Err) -> R,
  R: ObservableType<Item = S::Item>,
{
  type Item = S::Item;
  type Err = R::Err;
}

impl<S, F, R> CoreObservable for Catch<S, F>
where
  S: CoreObservable,
  F: FnOnce(S::Err) -> R + Send + 'static,
  R: CoreObservable<Item = S::Item>,
{
  type Unsub = TupleSubscription<SerialSubscription, SerialSubscription>;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<S::Item, R::Err> + Send + 'static,
  {
    let upstream = SerialSubscription::new();
    let recovery = SerialSubscription::new();
    let observer = CatchObserver { observer, handler: self.handler, recovery: recovery.clone() };
    upstream.set(self.source.actual_subscribe(observer));
    TupleSubscription::new(upstream, recovery)
  }
}

pub struct CatchObserver<O, F> {
  observer: O,
  handler: F,
  recovery: SerialSubscription,
}

impl<Item, Err, O, F, R> Observer<Item, Err> for CatchObserver<O, F>
where
  F: FnOnce(Err) -> R,
  R: CoreObservable<Item = Item>,
  O: Observer<Item, R::Err> + Send + 'static,
{
  fn next(&mut self, value: Item) { self.observer.next(value) }

  fn error(self, err: Err) {
    tracing::trace!("catch switches to the recovery stream");
    let fallback = (self.handler)(err);
    self.recovery.set(fallback.actual_subscribe(self.observer));
  }

  fn complete(self) { self.observer.complete() }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

/// On error, emits `value` and completes.
#[derive(Clone)]
pub struct CatchAndReturn<S, V> {
  pub(crate) source: S,
  pub(crate) value: V,
}

impl<S, V> ObservableType for CatchAndReturn<S, V>
where
  S: ObservableType<Item = V>,
{
  type Item = V;
  type Err = Infallible;
}

impl<S, V> CoreObservable for CatchAndReturn<S, V>
where
  S: CoreObservable<Item = V>,
  V: Send + 'static,
{
  type Unsub = S::Unsub;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<V, Infallible> + Send + 'static,
  {
    self.source.actual_subscribe(CatchAndReturnObserver { observer, value: self.value })
  }
}

pub struct CatchAndReturnObserver<O, V> {
  observer: O,
  value: V,
}

impl<V, Err, O> Observer<V, Err> for CatchAndReturnObserver<O, V>
where
  O: Observer<V, Infallible>,
{
  fn next(&mut self, value: V) { self.observer.next(value) }

  fn error(mut self, _err: Err) {
    self.observer.next(self.value);
    self.observer.complete();
  }

  fn complete(self) { self.observer.complete() }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

#[cfg(test)]
mod tests {
  use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
  };

  use crate::prelude::*;

  #[rxflow_macro::test]
  fn switches_to_recovery_stream() {
    let source = Subject::<i32, String>::new();
    let seen = Arc::new(Mutex::new(vec![]));
    let c_seen = seen.clone();
    let _ = source
      .clone()
      .catch(|e| Shared::from_iter([e.len() as i32, 0]))
      .subscribe(move |v| c_seen.lock().unwrap().push(v));

    source.next(1);
    source.error("four".to_string());
    assert_eq!(*seen.lock().unwrap(), vec![1, 4, 0]);
  }

  #[rxflow_macro::test]
  fn recovery_error_reaches_the_output() {
    let err = Arc::new(Mutex::new(None));
    let c_err = err.clone();
    let _ = Shared::throw_err::<i32, _>("first")
      .catch(|_| Shared::throw_err::<i32, _>(404))
      .on_error(move |e| *c_err.lock().unwrap() = Some(e))
      .subscribe(|_| {});
    assert_eq!(*err.lock().unwrap(), Some(404));
  }

  #[rxflow_macro::test]
  fn release_reaches_the_recovery_stream() {
    let source = Subject::<i32, ()>::new();
    let fallback = Subject::<i32, Infallible>::new();
    let c_fallback = fallback.clone();
    let sub = source.clone().catch(move |_| c_fallback).subscribe(|_| {});
    source.error(());
    assert_eq!(fallback.observer_count(), 1);
    sub.unsubscribe();
    assert_eq!(fallback.observer_count(), 0);
  }

  #[rxflow_macro::test]
  fn catch_and_return_emits_then_completes() {
    let seen = Arc::new(Mutex::new(vec![]));
    let completed = Arc::new(AtomicBool::new(false));
    let (c_seen, c_completed) = (seen.clone(), completed.clone());
    let _ = Shared::from_iter([1, 2])
      .map_err(|e: Infallible| -> &'static str { match e {} })
      .concat(Shared::throw_err("broken"))
      .catch_and_return(-1)
      .on_complete(move || c_completed.store(true, Ordering::SeqCst))
      .subscribe(move |v| c_seen.lock().unwrap().push(v));
    assert_eq!(*seen.lock().unwrap(), vec![1, 2, -1]);
    assert!(completed.load(Ordering::SeqCst));
  }
}
