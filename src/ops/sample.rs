use crate::{
  observable::{CoreObservable, ObservableType},
  observer::Observer,
  rc::MutArc,
  subscription::{SerialSubscription, Subscription, TupleSubscription},
};

/// Emits the most recent source value each time `sampler` emits, but only
/// if the source produced a value since the previous sample.
///
/// When the source completes with an unsampled value, that value is emitted
/// on the next sampler tick and the output completes right after it. With
/// nothing pending the output completes at once. Completion of the sampler
/// flushes a pending value and then completes.
#[derive(Clone)]
pub struct Sample<S, N> {
  pub(crate) source: S,
  pub(crate) sampler: N,
}

impl<S: ObservableType, N> ObservableType for Sample<S, N> {
  type Item = S::Item;
  type Err = S::Err;
}

impl<S, N> CoreObservable for Sample<S, N>
where
  S: CoreObservable,
  N: CoreObservable<Err = S::Err>,
  S::Item: Send + 'static,
{
  type Unsub = TupleSubscription<SerialSubscription, SerialSubscription>;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<S::Item, S::Err> + Send + 'static,
  {
    let ctx = SampleContext {
      observer: MutArc::own(Some(observer)),
      state: MutArc::own(SampleState { latest: None, source_done: false }),
      source: SerialSubscription::new(),
      sampler: SerialSubscription::new(),
    };
    ctx.source.set(self.source.actual_subscribe(SampleSourceObserver(ctx.clone())));
    ctx.sampler.set(self.sampler.actual_subscribe(SamplerObserver(ctx.clone())));
    TupleSubscription::new(ctx.source, ctx.sampler)
  }
}

struct SampleState<Item> {
  latest: Option<Item>,
  source_done: bool,
}

struct SampleContext<O, Item> {
  observer: MutArc<Option<O>>,
  state: MutArc<SampleState<Item>>,
  source: SerialSubscription,
  sampler: SerialSubscription,
}

impl<O, Item> Clone for SampleContext<O, Item> {
  fn clone(&self) -> Self {
    SampleContext {
      observer: self.observer.clone(),
      state: self.state.clone(),
      source: self.source.clone(),
      sampler: self.sampler.clone(),
    }
  }
}

impl<O, Item> SampleContext<O, Item> {
  /// Emit the unsampled value, if any. Returns whether the source has
  /// already completed.
  fn emit_fresh<Err>(&self) -> bool
  where
    O: Observer<Item, Err>,
  {
    let (fresh, source_done) = {
      let mut state = self.state.rc_deref_mut();
      (state.latest.take(), state.source_done)
    };
    if let Some(value) = fresh {
      self.observer.clone().next(value);
    }
    source_done
  }

  fn release(&self) {
    self.source.clone().unsubscribe();
    self.sampler.clone().unsubscribe();
  }
}

pub struct SampleSourceObserver<O, Item>(SampleContext<O, Item>);

impl<O, Item, Err> Observer<Item, Err> for SampleSourceObserver<O, Item>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) { self.0.state.rc_deref_mut().latest = Some(value); }

  fn error(self, err: Err) {
    self.0.release();
    self.0.observer.error(err);
  }

  fn complete(self) {
    let pending = {
      let mut state = self.0.state.rc_deref_mut();
      state.source_done = true;
      state.latest.is_some()
    };
    if !pending {
      self.0.release();
      self.0.observer.complete();
    }
  }

  fn is_closed(&self) -> bool { self.0.observer.is_closed() }
}

pub struct SamplerObserver<O, Item>(SampleContext<O, Item>);

impl<O, Item, NItem, Err> Observer<NItem, Err> for SamplerObserver<O, Item>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, _tick: NItem) {
    if self.0.emit_fresh::<Err>() {
      self.0.release();
      self.0.observer.clone().complete();
    }
  }

  fn error(self, err: Err) {
    self.0.release();
    self.0.observer.error(err);
  }

  fn complete(self) {
    self.0.emit_fresh::<Err>();
    self.0.release();
    self.0.observer.complete();
  }

  fn is_closed(&self) -> bool { self.0.observer.is_closed() }
}
