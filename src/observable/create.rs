use std::{
  marker::PhantomData,
  sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
  },
};

use crate::{
  observable::{CoreObservable, ObservableType},
  observer::{BoxedObserver, Observer},
  rc::MutArc,
  subscription::Subscription,
};

struct EmitterInner<Item, Err> {
  closed: AtomicBool,
  observer: MutArc<Option<BoxedObserver<Item, Err>>>,
}

/// The producer handle given to a [`Shared::create`](crate::factory::Shared::create)
/// closure.
///
/// It is cheap to clone and can be moved to other threads, so a producer can
/// hand it to a worker thread or a callback-based I/O API. Events sent after
/// a terminal event, or after the subscription was released, are dropped.
pub struct Emitter<Item, Err>(Arc<EmitterInner<Item, Err>>);

impl<Item, Err> Clone for Emitter<Item, Err> {
  fn clone(&self) -> Self { Emitter(self.0.clone()) }
}

impl<Item, Err> Emitter<Item, Err> {
  fn new(observer: BoxedObserver<Item, Err>) -> Self {
    Emitter(Arc::new(EmitterInner {
      closed: AtomicBool::new(false),
      observer: MutArc::own(Some(observer)),
    }))
  }

  pub fn next(&self, value: Item) {
    if self.0.closed.load(Ordering::Acquire) {
      return;
    }
    if let Some(observer) = self.0.observer.rc_deref_mut().as_mut() {
      observer.next(value);
    }
  }

  pub fn error(&self, err: Err) {
    if let Some(observer) = self.terminate() {
      observer.error(err);
    }
  }

  pub fn complete(&self) {
    if let Some(observer) = self.terminate() {
      observer.complete();
    }
  }

  /// True once a terminal event was sent, the subscription was released, or
  /// the downstream stopped accepting values (for example a `take` that is
  /// already satisfied). Long-running producers should poll this.
  pub fn is_closed(&self) -> bool {
    self.0.closed.load(Ordering::Acquire)
      || self
        .0
        .observer
        .try_rc_deref()
        .map_or(false, |o| o.as_ref().map_or(true, |o| o.is_closed()))
  }

  fn terminate(&self) -> Option<BoxedObserver<Item, Err>> {
    if self.0.closed.swap(true, Ordering::AcqRel) {
      return None;
    }
    self.0.observer.rc_deref_mut().take()
  }

  fn close(&self) {
    self.0.closed.store(true, Ordering::Release);
    // Drop the downstream now unless an emission is in flight on this stack.
    if let Some(mut observer) = self.0.observer.try_rc_deref() {
      observer.take();
    }
  }
}

/// Observable created from a producer closure.
///
/// The closure receives an [`Emitter`] and returns the teardown
/// [`Subscription`] for whatever it started.
pub struct Create<F, Item, Err> {
  func: F,
  _marker: PhantomData<fn() -> (Item, Err)>,
}

impl<F, Item, Err> Create<F, Item, Err> {
  pub fn new(func: F) -> Self { Self { func, _marker: PhantomData } }
}

impl<F: Clone, Item, Err> Clone for Create<F, Item, Err> {
  fn clone(&self) -> Self { Self::new(self.func.clone()) }
}

impl<F, Item, Err> ObservableType for Create<F, Item, Err> {
  type Item = Item;
  type Err = Err;
}

/// Releasing it closes the emitter first, then runs the producer's teardown.
pub struct CreateSubscription<Item, Err, U> {
  emitter: Emitter<Item, Err>,
  teardown: Option<U>,
}

impl<Item, Err, U: Subscription> Subscription for CreateSubscription<Item, Err, U> {
  fn unsubscribe(self) {
    self.emitter.close();
    self.teardown.unsubscribe();
  }

  fn is_closed(&self) -> bool { self.emitter.0.closed.load(Ordering::Acquire) }
}

impl<F, Item, Err, U> CoreObservable for Create<F, Item, Err>
where
  F: FnOnce(Emitter<Item, Err>) -> U,
  U: Subscription + Send + 'static,
  Item: 'static,
  Err: 'static,
{
  type Unsub = CreateSubscription<Item, Err, U>;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Item, Err> + Send + 'static,
  {
    let emitter = Emitter::new(Box::new(observer));
    let teardown = (self.func)(emitter.clone());
    CreateSubscription { emitter, teardown: Some(teardown) }
  }
}

/// Observable created from a producer closure that may fail before it
/// starts. An `Err` returned by the closure becomes the stream's error.
pub struct TryCreate<F, Item, Err> {
  func: F,
  _marker: PhantomData<fn() -> (Item, Err)>,
}

impl<F, Item, Err> TryCreate<F, Item, Err> {
  pub fn new(func: F) -> Self { Self { func, _marker: PhantomData } }
}

impl<F: Clone, Item, Err> Clone for TryCreate<F, Item, Err> {
  fn clone(&self) -> Self { Self::new(self.func.clone()) }
}

impl<F, Item, Err> ObservableType for TryCreate<F, Item, Err> {
  type Item = Item;
  type Err = Err;
}

impl<F, Item, Err, U> CoreObservable for TryCreate<F, Item, Err>
where
  F: FnOnce(Emitter<Item, Err>) -> Result<U, Err>,
  U: Subscription + Send + 'static,
  Item: 'static,
  Err: 'static,
{
  type Unsub = CreateSubscription<Item, Err, U>;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Item, Err> + Send + 'static,
  {
    let emitter = Emitter::new(Box::new(observer));
    let teardown = match (self.func)(emitter.clone()) {
      Ok(teardown) => Some(teardown),
      Err(err) => {
        emitter.error(err);
        None
      }
    };
    CreateSubscription { emitter, teardown }
  }
}
