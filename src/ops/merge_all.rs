use std::collections::VecDeque;

use crate::{
  observable::{CoreObservable, ObservableType},
  observer::Observer,
  rc::MutArc,
  subscription::{DynamicSubscriptions, SerialSubscription, Subscription, TupleSubscription},
};

/// Flattens a stream of observables with at most `concurrent` inner
/// subscriptions alive at once.
///
/// Inner observables arriving while the limit is reached wait in a FIFO
/// queue and are subscribed as active ones complete. The output completes
/// once the outer stream completed and every inner stream, active or
/// queued, completed. The first error from any stream ends the output and
/// releases everything else.
///
/// `flat_map`, `concat_map` and the static `Shared::merge` /
/// `Shared::concat` are all built on this operator.
#[derive(Clone)]
pub struct MergeAll<S> {
  pub(crate) source: S,
  pub(crate) concurrent: usize,
}

impl<S> ObservableType for MergeAll<S>
where
  S: ObservableType,
  S::Item: ObservableType,
{
  type Item = <S::Item as ObservableType>::Item;
  type Err = S::Err;
}

impl<S, Inner> CoreObservable for MergeAll<S>
where
  S: CoreObservable<Item = Inner>,
  Inner: CoreObservable<Err = S::Err> + Send + 'static,
{
  type Unsub = TupleSubscription<SerialSubscription, DynamicSubscriptions>;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Inner::Item, S::Err> + Send + 'static,
  {
    let ctx = MergeContext {
      observer: MutArc::own(Some(observer)),
      state: MutArc::own(MergeState {
        active: 0,
        queue: VecDeque::new(),
        outer_done: false,
        concurrent: self.concurrent,
      }),
      outer: SerialSubscription::new(),
      inners: DynamicSubscriptions::default(),
    };
    ctx.outer.set(self.source.actual_subscribe(OuterObserver(ctx.clone())));
    TupleSubscription::new(ctx.outer, ctx.inners)
  }
}

struct MergeState<Inner> {
  active: usize,
  queue: VecDeque<Inner>,
  outer_done: bool,
  concurrent: usize,
}

/// Everything the outer and inner observers share.
struct MergeContext<O, Inner> {
  observer: MutArc<Option<O>>,
  state: MutArc<MergeState<Inner>>,
  outer: SerialSubscription,
  inners: DynamicSubscriptions,
}

impl<O, Inner> Clone for MergeContext<O, Inner> {
  fn clone(&self) -> Self {
    MergeContext {
      observer: self.observer.clone(),
      state: self.state.clone(),
      outer: self.outer.clone(),
      inners: self.inners.clone(),
    }
  }
}

impl<O, Inner> MergeContext<O, Inner>
where
  Inner: CoreObservable + Send + 'static,
  O: Observer<Inner::Item, Inner::Err> + Send + 'static,
{
  fn subscribe_inner(&self, inner: Inner) {
    let id = self.inners.reserve();
    let unsub = inner.actual_subscribe(InnerObserver { ctx: self.clone(), id });
    self.inners.fill(id, unsub);
  }

  fn accept(&self, inner: Inner) {
    let start = {
      let mut state = self.state.rc_deref_mut();
      if state.active < state.concurrent {
        state.active += 1;
        Some(inner)
      } else {
        state.queue.push_back(inner);
        None
      }
    };
    if let Some(inner) = start {
      self.subscribe_inner(inner);
    }
  }

  fn inner_done(&self, id: usize) {
    self.inners.remove(id);
    let next = {
      let mut state = self.state.rc_deref_mut();
      match state.queue.pop_front() {
        Some(next) => Some(next),
        None => {
          state.active -= 1;
          None
        }
      }
    };
    match next {
      Some(next) => self.subscribe_inner(next),
      None => self.complete_if_drained(),
    }
  }

  fn complete_if_drained(&self) {
    let drained = {
      let state = self.state.rc_deref();
      state.outer_done && state.active == 0 && state.queue.is_empty()
    };
    if drained {
      self.observer.clone().complete();
    }
  }

  fn fail(&self, err: Inner::Err) {
    let observer = self.observer.rc_deref_mut().take();
    self.outer.clone().unsubscribe();
    self.inners.clone().unsubscribe();
    self.state.rc_deref_mut().queue.clear();
    if let Some(observer) = observer {
      observer.error(err);
    }
  }
}

pub struct OuterObserver<O, Inner>(MergeContext<O, Inner>);

impl<O, Inner> Observer<Inner, Inner::Err> for OuterObserver<O, Inner>
where
  Inner: CoreObservable + Send + 'static,
  O: Observer<Inner::Item, Inner::Err> + Send + 'static,
{
  fn next(&mut self, inner: Inner) { self.0.accept(inner) }

  fn error(self, err: Inner::Err) { self.0.fail(err) }

  fn complete(self) {
    self.0.state.rc_deref_mut().outer_done = true;
    self.0.complete_if_drained();
  }

  fn is_closed(&self) -> bool { self.0.observer.is_closed() }
}

pub struct InnerObserver<O, Inner> {
  ctx: MergeContext<O, Inner>,
  id: usize,
}

impl<O, Inner> Observer<Inner::Item, Inner::Err> for InnerObserver<O, Inner>
where
  Inner: CoreObservable + Send + 'static,
  O: Observer<Inner::Item, Inner::Err> + Send + 'static,
{
  fn next(&mut self, value: Inner::Item) { self.ctx.observer.next(value) }

  fn error(self, err: Inner::Err) { self.ctx.fail(err) }

  fn complete(self) { self.ctx.inner_done(self.id) }

  fn is_closed(&self) -> bool { self.ctx.observer.is_closed() }
}

#[cfg(test)]
mod tests {
  use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
  };

  use crate::prelude::*;

  #[rxflow_macro::test]
  fn flat_map_waits_for_every_inner() {
    let outer = Subject::<i32, Infallible>::new();
    let inner = Subject::<i32, Infallible>::new();
    let seen = Arc::new(Mutex::new(vec![]));
    let completed = Arc::new(AtomicBool::new(false));
    let (c_seen, c_completed) = (seen.clone(), completed.clone());
    let c_inner = inner.clone();
    let _ = outer
      .clone()
      .flat_map(move |v| c_inner.clone().map(move |x| x * v))
      .on_complete(move || c_completed.store(true, Ordering::SeqCst))
      .subscribe(move |v| c_seen.lock().unwrap().push(v));

    outer.next(1);
    outer.next(10);
    inner.next(2);
    outer.complete();
    assert!(!completed.load(Ordering::SeqCst));
    inner.complete();
    assert!(completed.load(Ordering::SeqCst));
    assert_eq!(*seen.lock().unwrap(), vec![2, 20]);
  }

  #[rxflow_macro::test]
  fn at_most_two_concurrent() {
    let sources: Vec<_> = (0..3).map(|_| Subject::<&str, Infallible>::new()).collect();
    let seen = Arc::new(Mutex::new(vec![]));
    let c_seen = seen.clone();
    let _ = Shared::merge(sources.clone(), 2).subscribe(move |v| c_seen.lock().unwrap().push(v));

    assert_eq!(sources[0].observer_count(), 1);
    assert_eq!(sources[1].observer_count(), 1);
    assert_eq!(sources[2].observer_count(), 0);

    sources[2].next("lost");
    sources[0].next("a");
    sources[0].clone().complete();
    assert_eq!(sources[2].observer_count(), 1);
    sources[2].next("c");
    sources[1].next("b");
    assert_eq!(*seen.lock().unwrap(), vec!["a", "c", "b"]);
  }

  #[rxflow_macro::test]
  fn inner_error_releases_everything() {
    let outer = Subject::<Subject<i32, String>, String>::new();
    let first = Subject::<i32, String>::new();
    let second = Subject::<i32, String>::new();
    let err = Arc::new(Mutex::new(None));
    let c_err = err.clone();
    let _ = outer
      .clone()
      .merge_all(usize::MAX)
      .on_error(move |e| *c_err.lock().unwrap() = Some(e))
      .subscribe(|_| {});

    outer.next(first.clone());
    outer.next(second.clone());
    first.error("inner failed".to_string());
    assert_eq!(err.lock().unwrap().as_deref(), Some("inner failed"));
    assert_eq!(second.observer_count(), 0);
    assert_eq!(outer.observer_count(), 0);
  }

  #[rxflow_macro::test]
  fn synchronous_inners_complete_in_order() {
    let seen = Arc::new(Mutex::new(vec![]));
    let c_seen = seen.clone();
    let _ = Shared::from_iter(1..=3)
      .concat_map(|v| Shared::from_iter(vec![v; v]))
      .subscribe(move |v| c_seen.lock().unwrap().push(v));
    assert_eq!(*seen.lock().unwrap(), vec![1, 2, 2, 3, 3, 3]);
  }
}
