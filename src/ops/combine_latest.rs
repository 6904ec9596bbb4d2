use crate::{
  observable::{CoreObservable, ObservableType},
  observer::Observer,
  rc::MutArc,
  subscription::{DynamicSubscriptions, SerialSubscription, Subscription, TupleSubscription},
};

/// Combines the latest values of two streams whenever either emits, once
/// both have emitted. Completes when both completed.
#[derive(Clone)]
pub struct CombineLatest<S1, S2, F> {
  pub(crate) source_a: S1,
  pub(crate) source_b: S2,
  pub(crate) selector: F,
}

impl<S1, S2, F, Out> ObservableType for CombineLatest<S1, S2, F>
where
  S1: ObservableType,
  S2: ObservableType<Err = S1::Err>,
  F: FnMut(&S1::Item, &S2::Item) -> Out,
{
  type Item = Out;
  type Err = S1::Err;
}

impl<S1, S2, F, Out> CoreObservable for CombineLatest<S1, S2, F>
where
  S1: CoreObservable,
  S2: CoreObservable<Err = S1::Err>,
  S1::Item: Send + 'static,
  S2::Item: Send + 'static,
  F: FnMut(&S1::Item, &S2::Item) -> Out + Send + 'static,
{
  type Unsub = TupleSubscription<SerialSubscription, SerialSubscription>;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Out, S1::Err> + Send + 'static,
  {
    let ctx = PairContext {
      observer: MutArc::own(Some(observer)),
      state: MutArc::own(PairState { a: None, b: None, completed: 0, selector: self.selector }),
      sub_a: SerialSubscription::new(),
      sub_b: SerialSubscription::new(),
    };
    ctx.sub_a.set(self.source_a.actual_subscribe(CombineA(ctx.clone())));
    ctx.sub_b.set(self.source_b.actual_subscribe(CombineB(ctx.clone())));
    TupleSubscription::new(ctx.sub_a, ctx.sub_b)
  }
}

struct PairState<A, B, F> {
  a: Option<A>,
  b: Option<B>,
  completed: usize,
  selector: F,
}

struct PairContext<O, A, B, F> {
  observer: MutArc<Option<O>>,
  state: MutArc<PairState<A, B, F>>,
  sub_a: SerialSubscription,
  sub_b: SerialSubscription,
}

impl<O, A, B, F> Clone for PairContext<O, A, B, F> {
  fn clone(&self) -> Self {
    PairContext {
      observer: self.observer.clone(),
      state: self.state.clone(),
      sub_a: self.sub_a.clone(),
      sub_b: self.sub_b.clone(),
    }
  }
}

impl<O, A, B, F, Out> PairContext<O, A, B, F>
where
  F: FnMut(&A, &B) -> Out,
{
  fn update<Err, U>(&self, set: U)
  where
    O: Observer<Out, Err>,
    U: FnOnce(&mut PairState<A, B, F>),
  {
    let combined = {
      let mut state = self.state.rc_deref_mut();
      set(&mut state);
      let PairState { a, b, selector, .. } = &mut *state;
      match (a.as_ref(), b.as_ref()) {
        (Some(a), Some(b)) => Some(selector(a, b)),
        _ => None,
      }
    };
    if let Some(combined) = combined {
      self.observer.clone().next(combined);
    }
  }

  fn fail<Err>(&self, err: Err)
  where
    O: Observer<Out, Err>,
  {
    self.sub_a.clone().unsubscribe();
    self.sub_b.clone().unsubscribe();
    self.observer.clone().error(err);
  }

  fn complete_one<Err>(&self)
  where
    O: Observer<Out, Err>,
  {
    let all_done = {
      let mut state = self.state.rc_deref_mut();
      state.completed += 1;
      state.completed == 2
    };
    if all_done {
      self.observer.clone().complete();
    }
  }
}

pub struct CombineA<O, A, B, F>(PairContext<O, A, B, F>);

pub struct CombineB<O, A, B, F>(PairContext<O, A, B, F>);

impl<O, A, B, F, Out, Err> Observer<A, Err> for CombineA<O, A, B, F>
where
  O: Observer<Out, Err>,
  F: FnMut(&A, &B) -> Out,
{
  fn next(&mut self, value: A) { self.0.update::<Err, _>(|state| state.a = Some(value)) }

  fn error(self, err: Err) { self.0.fail(err) }

  fn complete(self) { self.0.complete_one::<Err>() }

  fn is_closed(&self) -> bool { self.0.observer.is_closed() }
}

impl<O, A, B, F, Out, Err> Observer<B, Err> for CombineB<O, A, B, F>
where
  O: Observer<Out, Err>,
  F: FnMut(&A, &B) -> Out,
{
  fn next(&mut self, value: B) { self.0.update::<Err, _>(|state| state.b = Some(value)) }

  fn error(self, err: Err) { self.0.fail(err) }

  fn complete(self) { self.0.complete_one::<Err>() }

  fn is_closed(&self) -> bool { self.0.observer.is_closed() }
}

/// [`CombineLatest`] over any number of sources of one type; the selector
/// sees the latest values in source order.
#[derive(Clone)]
pub struct CombineLatestAll<S, F> {
  pub(crate) sources: Vec<S>,
  pub(crate) selector: F,
}

impl<S, F, Out> ObservableType for CombineLatestAll<S, F>
where
  S: ObservableType,
  F: FnMut(&[S::Item]) -> Out,
{
  type Item = Out;
  type Err = S::Err;
}

impl<S, F, Out> CoreObservable for CombineLatestAll<S, F>
where
  S: CoreObservable,
  S::Item: Send + 'static,
  F: FnMut(&[S::Item]) -> Out + Send + 'static,
{
  type Unsub = DynamicSubscriptions;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Out, S::Err> + Send + 'static,
  {
    let subs = DynamicSubscriptions::default();
    let count = self.sources.len();
    if count == 0 {
      observer.complete();
      return subs;
    }
    let ctx = ListContext {
      observer: MutArc::own(Some(observer)),
      state: MutArc::own(ListState {
        pending: std::iter::repeat_with(|| None).take(count).collect(),
        ready: None,
        sources: count,
        completed: 0,
        selector: self.selector,
      }),
      subs: subs.clone(),
    };
    for (index, source) in self.sources.into_iter().enumerate() {
      let id = subs.reserve();
      subs.fill(id, source.actual_subscribe(CombineAllObserver { ctx: ctx.clone(), index }));
    }
    subs
  }
}

struct ListState<Item, F> {
  // Filled until every source has emitted once, then moved into `ready`.
  pending: Vec<Option<Item>>,
  ready: Option<Vec<Item>>,
  sources: usize,
  completed: usize,
  selector: F,
}

struct ListContext<O, Item, F> {
  observer: MutArc<Option<O>>,
  state: MutArc<ListState<Item, F>>,
  subs: DynamicSubscriptions,
}

impl<O, Item, F> Clone for ListContext<O, Item, F> {
  fn clone(&self) -> Self {
    ListContext {
      observer: self.observer.clone(),
      state: self.state.clone(),
      subs: self.subs.clone(),
    }
  }
}

pub struct CombineAllObserver<O, Item, F> {
  ctx: ListContext<O, Item, F>,
  index: usize,
}

impl<O, Item, F, Out, Err> Observer<Item, Err> for CombineAllObserver<O, Item, F>
where
  O: Observer<Out, Err>,
  F: FnMut(&[Item]) -> Out,
{
  fn next(&mut self, value: Item) {
    let combined = {
      let mut state = self.ctx.state.rc_deref_mut();
      let state = &mut *state;
      match state.ready.as_mut() {
        Some(ready) => ready[self.index] = value,
        None => {
          state.pending[self.index] = Some(value);
          if state.pending.iter().all(Option::is_some) {
            state.ready = Some(state.pending.drain(..).flatten().collect());
          }
        }
      }
      let ListState { ready, selector, .. } = state;
      ready.as_deref().map(|values| selector(values))
    };
    if let Some(combined) = combined {
      self.ctx.observer.next(combined);
    }
  }

  fn error(self, err: Err) {
    self.ctx.subs.clone().unsubscribe();
    self.ctx.observer.error(err);
  }

  fn complete(self) {
    let all_done = {
      let mut state = self.ctx.state.rc_deref_mut();
      state.completed += 1;
      state.completed == state.sources
    };
    if all_done {
      self.ctx.observer.complete();
    }
  }

  fn is_closed(&self) -> bool { self.ctx.observer.is_closed() }
}
