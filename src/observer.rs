//! Observer trait and implementations
//!
//! The Observer trait defines the consumer of data in the reactive pattern.
//! It provides three methods: next (for values), error (for errors), and
//! complete (for stream completion).

use std::convert::Infallible;

// ============================================================================
// Observer Trait
// ============================================================================

/// Observer trait: The consumer of data in reactive programming
///
/// An Observer receives values, errors, and completion notifications from
/// an Observable.
pub trait Observer<Item, Err> {
  /// Receive the next value from the observable
  fn next(&mut self, value: Item);

  /// Handle an error from the observable
  ///
  /// This consumes the observer, as no more values can be emitted after an
  /// error
  fn error(self, err: Err);

  /// Handle completion of the observable
  ///
  /// This consumes the observer, as no more values can be emitted after
  /// completion
  fn complete(self);

  /// Checks if the observer is closed.
  ///
  /// Sources (like `from_iter`) poll this between emissions so a downstream
  /// `take` or a disposed subscription stops the production loop early.
  fn is_closed(&self) -> bool;
}

// ============================================================================
// DynObserver Trait - Object-safe Observer
// ============================================================================

/// Helper trait to enable object-safe Observers (`Box<dyn Observer>`)
///
/// The Observer trait is not object-safe because its terminal methods take
/// `self` by value. DynObserver mirrors the interface for vtables.
pub trait DynObserver<Item, Err> {
  fn box_next(&mut self, value: Item);
  fn box_error(self: Box<Self>, err: Err);
  fn box_complete(self: Box<Self>);
  fn box_is_closed(&self) -> bool;
}

impl<T, Item, Err> DynObserver<Item, Err> for T
where
  T: Observer<Item, Err>,
{
  fn box_next(&mut self, value: Item) { self.next(value); }
  fn box_error(self: Box<Self>, err: Err) { (*self).error(err); }
  fn box_complete(self: Box<Self>) { (*self).complete(); }
  fn box_is_closed(&self) -> bool { self.is_closed() }
}

/// A type-erased observer that can cross threads.
pub type BoxedObserver<Item, Err> = Box<dyn DynObserver<Item, Err> + Send>;

impl<Item, Err> Observer<Item, Err> for BoxedObserver<Item, Err> {
  #[inline]
  fn next(&mut self, value: Item) { (**self).box_next(value) }

  #[inline]
  fn error(self, err: Err) { self.box_error(err) }

  #[inline]
  fn complete(self) { self.box_complete() }

  #[inline]
  fn is_closed(&self) -> bool { (**self).box_is_closed() }
}

// ============================================================================
// Option<O>
// ============================================================================

/// `None` is a closed observer that swallows everything. Operators keep their
/// downstream in an `Option` and `take()` it when they terminate early.
impl<Item, Err, O> Observer<Item, Err> for Option<O>
where
  O: Observer<Item, Err>,
{
  #[inline]
  fn next(&mut self, value: Item) {
    if let Some(observer) = self {
      observer.next(value);
    }
  }

  #[inline]
  fn error(self, err: Err) {
    if let Some(observer) = self {
      observer.error(err);
    }
  }

  #[inline]
  fn complete(self) {
    if let Some(observer) = self {
      observer.complete();
    }
  }

  #[inline]
  fn is_closed(&self) -> bool { self.as_ref().map_or(true, |o| o.is_closed()) }
}

// ============================================================================
// Closure observer
// ============================================================================

/// Observer built from a `next` closure. Only infallible streams can be
/// consumed this way; a stream that may error has to state its error policy
/// first (`on_error`, `catch`, `retry`, ...).
#[derive(Clone)]
pub struct FnObserver<F>(F);

impl<F> FnObserver<F> {
  pub fn new(f: F) -> Self { Self(f) }
}

impl<Item, F> Observer<Item, Infallible> for FnObserver<F>
where
  F: FnMut(Item),
{
  #[inline]
  fn next(&mut self, value: Item) { (self.0)(value) }

  fn error(self, err: Infallible) { match err {} }

  fn complete(self) {}

  #[inline]
  fn is_closed(&self) -> bool { false }
}

#[cfg(test)]
mod tests {
  use super::*;

  struct Recorder<'a>(&'a mut Vec<String>);

  impl Observer<i32, String> for Recorder<'_> {
    fn next(&mut self, value: i32) { self.0.push(format!("next {value}")); }
    fn error(self, err: String) { self.0.push(format!("error {err}")); }
    fn complete(self) { self.0.push("complete".into()); }
    fn is_closed(&self) -> bool { false }
  }

  #[rxflow_macro::test]
  fn option_observer_forwards_until_taken() {
    let mut log = vec![];
    let mut observer = Some(Recorder(&mut log));
    observer.next(1);
    observer.take().complete();
    observer.next(2);
    assert!(observer.is_closed());
    assert_eq!(log, vec!["next 1", "complete"]);
  }

  #[rxflow_macro::test]
  fn boxed_observer_dispatches() {
    let hits = std::sync::Arc::new(std::sync::Mutex::new(vec![]));
    let c_hits = hits.clone();
    let mut boxed: BoxedObserver<i32, Infallible> =
      Box::new(FnObserver::new(move |v| c_hits.lock().unwrap().push(v)));
    boxed.next(1);
    boxed.next(2);
    assert!(!boxed.is_closed());
    boxed.complete();
    assert_eq!(*hits.lock().unwrap(), vec![1, 2]);
  }
}
