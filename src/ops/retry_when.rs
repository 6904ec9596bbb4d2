use crate::{
  observable::{CoreObservable, ObservableType},
  observer::Observer,
  rc::MutArc,
  subject::Subject,
  subscription::{SerialSubscription, Subscription, TupleSubscription},
};

/// Resubscribes to the source whenever the notifier emits a value.
///
/// `notifier` is called once per subscription with a [`Subject`] that
/// receives every error of the source. The stream it returns drives the
/// recovery: each value it emits starts a new attempt, and its error or
/// completion becomes the output's terminal event. An error the notifier
/// never answers leaves the output waiting.
#[derive(Clone)]
pub struct RetryWhen<S, F> {
  pub(crate) source: S,
  pub(crate) notifier: F,
}

impl<S: ObservableType, F> ObservableType for RetryWhen<S, F> {
  type Item = S::Item;
  type Err = S::Err;
}

impl<S, F, N> CoreObservable for RetryWhen<S, F>
where
  S: CoreObservable + Clone + Send + 'static,
  S::Err: Clone + Send + 'static,
  F: FnOnce(Subject<S::Err, S::Err>) -> N,
  N: CoreObservable<Err = S::Err>,
{
  type Unsub = TupleSubscription<SerialSubscription, SerialSubscription>;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<S::Item, S::Err> + Send + 'static,
  {
    let errors = Subject::new();
    let notifier = (self.notifier)(errors.clone());
    let ctx = RetryWhenContext {
      source: self.source,
      observer: MutArc::own(Some(observer)),
      errors,
      state: MutArc::own(AttemptState { busy: false, pending: false }),
      upstream: SerialSubscription::new(),
      notifier: SerialSubscription::new(),
    };
    ctx.notifier.set(notifier.actual_subscribe(RetryNotifier(ctx.clone())));
    ctx.run();
    TupleSubscription::new(ctx.upstream, ctx.notifier)
  }
}

/// `busy` is held while an attempt is being subscribed or its error is
/// being handed to the notifier. A retry requested meanwhile only sets
/// `pending`, and whoever clears `busy` starts it.
struct AttemptState {
  busy: bool,
  pending: bool,
}

struct RetryWhenContext<S, O, Err> {
  source: S,
  observer: MutArc<Option<O>>,
  errors: Subject<Err, Err>,
  state: MutArc<AttemptState>,
  upstream: SerialSubscription,
  notifier: SerialSubscription,
}

impl<S: Clone, O, Err> Clone for RetryWhenContext<S, O, Err> {
  fn clone(&self) -> Self {
    RetryWhenContext {
      source: self.source.clone(),
      observer: self.observer.clone(),
      errors: self.errors.clone(),
      state: self.state.clone(),
      upstream: self.upstream.clone(),
      notifier: self.notifier.clone(),
    }
  }
}

impl<S, O, Err> RetryWhenContext<S, O, Err>
where
  S: CoreObservable<Err = Err> + Clone + Send + 'static,
  O: Observer<S::Item, Err> + Send + 'static,
  Err: Clone + Send + 'static,
{
  fn run(&self) {
    loop {
      if self.upstream.is_closed() {
        break;
      }
      {
        let mut state = self.state.rc_deref_mut();
        state.busy = true;
        state.pending = false;
      }
      let unsub = self.source.clone().actual_subscribe(RetryAttempt(self.clone()));
      self.upstream.set(unsub);
      if !self.leave_busy() {
        break;
      }
    }
  }

  /// Clear `busy`, reporting whether a retry was requested meanwhile.
  fn leave_busy(&self) -> bool {
    let mut state = self.state.rc_deref_mut();
    state.busy = false;
    std::mem::take(&mut state.pending)
  }

  fn resubscribe(&self) {
    let busy = {
      let mut state = self.state.rc_deref_mut();
      state.pending = state.busy;
      state.busy
    };
    if !busy {
      tracing::debug!("retry_when resubscribes");
      self.run();
    }
  }
}

pub struct RetryAttempt<S, O, Err>(RetryWhenContext<S, O, Err>);

impl<S, O, Err> Observer<S::Item, Err> for RetryAttempt<S, O, Err>
where
  S: CoreObservable<Err = Err> + Clone + Send + 'static,
  O: Observer<S::Item, Err> + Send + 'static,
  Err: Clone + Send + 'static,
{
  fn next(&mut self, value: S::Item) { self.0.observer.next(value) }

  fn error(self, err: Err) {
    let nested = {
      let mut state = self.0.state.rc_deref_mut();
      std::mem::replace(&mut state.busy, true)
    };
    self.0.errors.next(err);
    if !nested && self.0.leave_busy() {
      self.0.run();
    }
  }

  fn complete(self) {
    self.0.notifier.clone().unsubscribe();
    self.0.observer.complete();
  }

  fn is_closed(&self) -> bool { self.0.observer.is_closed() }
}

pub struct RetryNotifier<S, O, Err>(RetryWhenContext<S, O, Err>);

impl<S, O, Err, NItem> Observer<NItem, Err> for RetryNotifier<S, O, Err>
where
  S: CoreObservable<Err = Err> + Clone + Send + 'static,
  O: Observer<S::Item, Err> + Send + 'static,
  Err: Clone + Send + 'static,
{
  fn next(&mut self, _value: NItem) { self.0.resubscribe() }

  fn error(self, err: Err) {
    self.0.upstream.clone().unsubscribe();
    self.0.observer.error(err);
  }

  fn complete(self) {
    self.0.upstream.clone().unsubscribe();
    self.0.observer.complete();
  }

  fn is_closed(&self) -> bool { self.0.observer.is_closed() }
}
