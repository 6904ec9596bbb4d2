use crate::{
  observable::{CoreObservable, ObservableType},
  observer::Observer,
  rc::MutArc,
  subscription::{SerialSubscription, Subscription, TupleSubscription},
};

/// Follows only the most recent inner observable.
///
/// A new inner releases the previous one before it is subscribed. The
/// output completes once the outer stream and the current inner both
/// completed.
#[derive(Clone)]
pub struct SwitchLatest<S> {
  pub(crate) source: S,
}

impl<S> ObservableType for SwitchLatest<S>
where
  S: ObservableType,
  S::Item: ObservableType,
{
  type Item = <S::Item as ObservableType>::Item;
  type Err = S::Err;
}

impl<S, Inner> CoreObservable for SwitchLatest<S>
where
  S: CoreObservable<Item = Inner>,
  Inner: CoreObservable<Err = S::Err>,
{
  type Unsub = TupleSubscription<SerialSubscription, SerialSubscription>;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Inner::Item, S::Err> + Send + 'static,
  {
    let ctx = SwitchContext {
      observer: MutArc::own(Some(observer)),
      state: MutArc::own(SwitchState { generation: 0, inner_active: false, outer_done: false }),
      outer: SerialSubscription::new(),
      inner: SerialSubscription::new(),
    };
    ctx.outer.set(self.source.actual_subscribe(SwitchOuterObserver(ctx.clone())));
    TupleSubscription::new(ctx.outer, ctx.inner)
  }
}

struct SwitchState {
  generation: u64,
  inner_active: bool,
  outer_done: bool,
}

struct SwitchContext<O> {
  observer: MutArc<Option<O>>,
  state: MutArc<SwitchState>,
  outer: SerialSubscription,
  inner: SerialSubscription,
}

impl<O> Clone for SwitchContext<O> {
  fn clone(&self) -> Self {
    SwitchContext {
      observer: self.observer.clone(),
      state: self.state.clone(),
      outer: self.outer.clone(),
      inner: self.inner.clone(),
    }
  }
}

impl<O> SwitchContext<O> {
  fn is_current(&self, generation: u64) -> bool { self.state.rc_deref().generation == generation }

  fn fail<Item, Err>(&self, err: Err)
  where
    O: Observer<Item, Err>,
  {
    let observer = self.observer.rc_deref_mut().take();
    self.outer.clone().unsubscribe();
    self.inner.clone().unsubscribe();
    if let Some(observer) = observer {
      observer.error(err);
    }
  }

  fn complete<Item, Err>(&self)
  where
    O: Observer<Item, Err>,
  {
    let observer = self.observer.rc_deref_mut().take();
    if let Some(observer) = observer {
      observer.complete();
    }
  }
}

pub struct SwitchOuterObserver<O>(SwitchContext<O>);

impl<O, Inner> Observer<Inner, Inner::Err> for SwitchOuterObserver<O>
where
  Inner: CoreObservable,
  O: Observer<Inner::Item, Inner::Err> + Send + 'static,
{
  fn next(&mut self, inner: Inner) {
    let generation = {
      let mut state = self.0.state.rc_deref_mut();
      state.generation += 1;
      state.inner_active = true;
      state.generation
    };
    self.0.inner.clear();
    let unsub = inner.actual_subscribe(SwitchInnerObserver { ctx: self.0.clone(), generation });
    if self.0.is_current(generation) {
      self.0.inner.set(unsub);
    } else {
      unsub.unsubscribe();
    }
  }

  fn error(self, err: Inner::Err) { self.0.fail::<Inner::Item, _>(err) }

  fn complete(self) {
    let finished = {
      let mut state = self.0.state.rc_deref_mut();
      state.outer_done = true;
      !state.inner_active
    };
    if finished {
      self.0.complete::<Inner::Item, Inner::Err>();
    }
  }

  fn is_closed(&self) -> bool { self.0.observer.is_closed() }
}

pub struct SwitchInnerObserver<O> {
  ctx: SwitchContext<O>,
  generation: u64,
}

impl<Item, Err, O> Observer<Item, Err> for SwitchInnerObserver<O>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) {
    if self.ctx.is_current(self.generation) {
      self.ctx.observer.next(value);
    }
  }

  fn error(self, err: Err) {
    if self.ctx.is_current(self.generation) {
      self.ctx.fail::<Item, _>(err);
    }
  }

  fn complete(self) {
    let finished = {
      let mut state = self.ctx.state.rc_deref_mut();
      if state.generation != self.generation {
        return;
      }
      state.inner_active = false;
      state.outer_done
    };
    if finished {
      self.ctx.complete::<Item, Err>();
    }
  }

  fn is_closed(&self) -> bool {
    !self.ctx.is_current(self.generation) || self.ctx.observer.is_closed()
  }
}
