use std::collections::VecDeque;

use crate::{
  observable::{CoreObservable, ObservableType},
  observer::Observer,
  rc::MutArc,
  subscription::{DynamicSubscriptions, SerialSubscription, Subscription, TupleSubscription},
};

/// Pairs values of two streams strictly by arrival order.
///
/// Values wait in a FIFO per side until the other side has one to pair
/// with. The output completes as soon as one side completed with nothing
/// left in its queue, since no further pair can be formed.
#[derive(Clone)]
pub struct Zip<S1, S2> {
  pub(crate) source_a: S1,
  pub(crate) source_b: S2,
}

impl<S1, S2> ObservableType for Zip<S1, S2>
where
  S1: ObservableType,
  S2: ObservableType<Err = S1::Err>,
{
  type Item = (S1::Item, S2::Item);
  type Err = S1::Err;
}

impl<S1, S2> CoreObservable for Zip<S1, S2>
where
  S1: CoreObservable,
  S2: CoreObservable<Err = S1::Err>,
  S1::Item: Send + 'static,
  S2::Item: Send + 'static,
{
  type Unsub = TupleSubscription<SerialSubscription, SerialSubscription>;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<(S1::Item, S2::Item), S1::Err> + Send + 'static,
  {
    let ctx = ZipContext {
      observer: MutArc::own(Some(observer)),
      state: MutArc::own(ZipState {
        a: VecDeque::new(),
        b: VecDeque::new(),
        a_done: false,
        b_done: false,
      }),
      sub_a: SerialSubscription::new(),
      sub_b: SerialSubscription::new(),
    };
    ctx.sub_a.set(self.source_a.actual_subscribe(ZipA(ctx.clone())));
    ctx.sub_b.set(self.source_b.actual_subscribe(ZipB(ctx.clone())));
    TupleSubscription::new(ctx.sub_a, ctx.sub_b)
  }
}

struct ZipState<A, B> {
  a: VecDeque<A>,
  b: VecDeque<B>,
  a_done: bool,
  b_done: bool,
}

impl<A, B> ZipState<A, B> {
  fn exhausted(&self) -> bool {
    (self.a_done && self.a.is_empty()) || (self.b_done && self.b.is_empty())
  }
}

struct ZipContext<O, A, B> {
  observer: MutArc<Option<O>>,
  state: MutArc<ZipState<A, B>>,
  sub_a: SerialSubscription,
  sub_b: SerialSubscription,
}

impl<O, A, B> Clone for ZipContext<O, A, B> {
  fn clone(&self) -> Self {
    ZipContext {
      observer: self.observer.clone(),
      state: self.state.clone(),
      sub_a: self.sub_a.clone(),
      sub_b: self.sub_b.clone(),
    }
  }
}

impl<O, A, B> ZipContext<O, A, B> {
  fn release(&self) {
    self.sub_a.clone().unsubscribe();
    self.sub_b.clone().unsubscribe();
  }

  /// Run `f` on the state, emit the pair it produced, and complete if no
  /// further pair is possible.
  fn step<Err, F>(&self, f: F)
  where
    O: Observer<(A, B), Err>,
    F: FnOnce(&mut ZipState<A, B>) -> Option<(A, B)>,
  {
    let (pair, exhausted) = {
      let mut state = self.state.rc_deref_mut();
      let pair = f(&mut state);
      (pair, state.exhausted())
    };
    if let Some(pair) = pair {
      self.observer.clone().next(pair);
    }
    if exhausted {
      self.release();
      self.observer.clone().complete();
    }
  }

  fn fail<Err>(&self, err: Err)
  where
    O: Observer<(A, B), Err>,
  {
    self.release();
    self.observer.clone().error(err);
  }
}

pub struct ZipA<O, A, B>(ZipContext<O, A, B>);

pub struct ZipB<O, A, B>(ZipContext<O, A, B>);

impl<O, A, B, Err> Observer<A, Err> for ZipA<O, A, B>
where
  O: Observer<(A, B), Err>,
{
  fn next(&mut self, value: A) {
    self.0.step::<Err, _>(|state| match state.b.pop_front() {
      Some(b) => Some((value, b)),
      None => {
        state.a.push_back(value);
        None
      }
    })
  }

  fn error(self, err: Err) { self.0.fail(err) }

  fn complete(self) {
    self.0.step::<Err, _>(|state| {
      state.a_done = true;
      None
    })
  }

  fn is_closed(&self) -> bool { self.0.observer.is_closed() }
}

impl<O, A, B, Err> Observer<B, Err> for ZipB<O, A, B>
where
  O: Observer<(A, B), Err>,
{
  fn next(&mut self, value: B) {
    self.0.step::<Err, _>(|state| match state.a.pop_front() {
      Some(a) => Some((a, value)),
      None => {
        state.b.push_back(value);
        None
      }
    })
  }

  fn error(self, err: Err) { self.0.fail(err) }

  fn complete(self) {
    self.0.step::<Err, _>(|state| {
      state.b_done = true;
      None
    })
  }

  fn is_closed(&self) -> bool { self.0.observer.is_closed() }
}

/// [`Zip`] over any number of sources of one type, emitting a `Vec` with
/// one value per source.
#[derive(Clone)]
pub struct ZipAll<S> {
  pub(crate) sources: Vec<S>,
}

impl<S: ObservableType> ObservableType for ZipAll<S> {
  type Item = Vec<S::Item>;
  type Err = S::Err;
}

impl<S> CoreObservable for ZipAll<S>
where
  S: CoreObservable,
  S::Item: Send + 'static,
{
  type Unsub = DynamicSubscriptions;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Vec<S::Item>, S::Err> + Send + 'static,
  {
    let subs = DynamicSubscriptions::default();
    let count = self.sources.len();
    if count == 0 {
      observer.complete();
      return subs;
    }
    let ctx = ZipAllContext {
      observer: MutArc::own(Some(observer)),
      state: MutArc::own(ZipAllState {
        queues: (0..count).map(|_| VecDeque::new()).collect(),
        done: vec![false; count],
      }),
      subs: subs.clone(),
    };
    for (index, source) in self.sources.into_iter().enumerate() {
      let id = subs.reserve();
      subs.fill(id, source.actual_subscribe(ZipAllObserver { ctx: ctx.clone(), index }));
    }
    subs
  }
}

struct ZipAllState<Item> {
  queues: Vec<VecDeque<Item>>,
  done: Vec<bool>,
}

impl<Item> ZipAllState<Item> {
  fn exhausted(&self) -> bool {
    self.queues.iter().zip(&self.done).any(|(q, done)| *done && q.is_empty())
  }
}

struct ZipAllContext<O, Item> {
  observer: MutArc<Option<O>>,
  state: MutArc<ZipAllState<Item>>,
  subs: DynamicSubscriptions,
}

impl<O, Item> Clone for ZipAllContext<O, Item> {
  fn clone(&self) -> Self {
    ZipAllContext {
      observer: self.observer.clone(),
      state: self.state.clone(),
      subs: self.subs.clone(),
    }
  }
}

impl<O, Item> ZipAllContext<O, Item> {
  fn finish_if_exhausted<Err>(&self, exhausted: bool)
  where
    O: Observer<Vec<Item>, Err>,
  {
    if exhausted {
      self.subs.clone().unsubscribe();
      self.observer.clone().complete();
    }
  }
}

pub struct ZipAllObserver<O, Item> {
  ctx: ZipAllContext<O, Item>,
  index: usize,
}

impl<O, Item, Err> Observer<Item, Err> for ZipAllObserver<O, Item>
where
  O: Observer<Vec<Item>, Err>,
{
  fn next(&mut self, value: Item) {
    let (row, exhausted) = {
      let mut state = self.ctx.state.rc_deref_mut();
      state.queues[self.index].push_back(value);
      let row = if state.queues.iter().all(|q| !q.is_empty()) {
        Some(state.queues.iter_mut().filter_map(VecDeque::pop_front).collect::<Vec<_>>())
      } else {
        None
      };
      (row, state.exhausted())
    };
    if let Some(row) = row {
      self.ctx.observer.next(row);
    }
    self.ctx.finish_if_exhausted::<Err>(exhausted);
  }

  fn error(self, err: Err) {
    self.ctx.subs.clone().unsubscribe();
    self.ctx.observer.error(err);
  }

  fn complete(self) {
    let exhausted = {
      let mut state = self.ctx.state.rc_deref_mut();
      state.done[self.index] = true;
      state.exhausted()
    };
    self.ctx.finish_if_exhausted::<Err>(exhausted);
  }

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
  fn pairs_by_position_and_stops_at_shorter() {
    let seen = Arc::new(Mutex::new(vec![]));
    let completed = Arc::new(AtomicBool::new(false));
    let (c_seen, c_completed) = (seen.clone(), completed.clone());
    let _ = Shared::from_iter([1, 2, 3])
      .zip(Shared::from_iter(["a", "b"]))
      .on_complete(move || c_completed.store(true, Ordering::SeqCst))
      .subscribe(move |v| c_seen.lock().unwrap().push(v));
    assert_eq!(*seen.lock().unwrap(), vec![(1, "a"), (2, "b")]);
    assert!(completed.load(Ordering::SeqCst));
  }

  #[rxflow_macro::test]
  fn buffered_values_still_pair_after_completion() {
    let a = Subject::<i32, Infallible>::new();
    let b = Subject::<char, Infallible>::new();
    let seen = Arc::new(Mutex::new(vec![]));
    let completed = Arc::new(AtomicBool::new(false));
    let (c_seen, c_completed) = (seen.clone(), completed.clone());
    let _ = a
      .clone()
      .zip(b.clone())
      .on_complete(move || c_completed.store(true, Ordering::SeqCst))
      .subscribe(move |v| c_seen.lock().unwrap().push(v));

    a.next(1);
    a.next(2);
    a.complete();
    assert!(!completed.load(Ordering::SeqCst));
    b.next('x');
    assert!(!completed.load(Ordering::SeqCst));
    b.next('y');
    assert!(completed.load(Ordering::SeqCst));
    assert_eq!(*seen.lock().unwrap(), vec![(1, 'x'), (2, 'y')]);
    assert_eq!(b.observer_count(), 0);
  }

  #[rxflow_macro::test]
  fn static_zip_collects_rows() {
    let seen = Arc::new(Mutex::new(vec![]));
    let c_seen = seen.clone();
    let _ = Shared::zip(vec![Shared::from_iter(vec![1, 2]), Shared::from_iter(vec![10, 20, 30])])
      .subscribe(move |v| c_seen.lock().unwrap().push(v));
    assert_eq!(*seen.lock().unwrap(), vec![vec![1, 10], vec![2, 20]]);
  }
}
