use crate::{
  observable::{CoreObservable, ObservableType},
  observer::Observer,
  rc::MutArc,
  scheduler::{Duration, Scheduler},
  subject::Subject,
  subscription::{SerialSubscription, Subscription, TupleSubscription},
};

/// Splits the stream into windows, each emitted as its own [`Subject`].
///
/// Boundaries follow [`Buffer`](super::Buffer): a window closes after
/// `time_span` or after `count` values, whichever comes first. The first
/// window is emitted on subscribe. At a boundary the closing window completes
/// before the next one is emitted, so a consumer never sees two open
/// windows. Completion and errors of the source close the current window the
/// same way before reaching the output.
#[derive(Clone)]
pub struct Window<S, SD> {
  pub(crate) source: S,
  pub(crate) time_span: Duration,
  pub(crate) count: usize,
  pub(crate) scheduler: SD,
}

impl<S: ObservableType, SD> ObservableType for Window<S, SD> {
  type Item = Subject<S::Item, S::Err>;
  type Err = S::Err;
}

impl<S, SD> CoreObservable for Window<S, SD>
where
  S: CoreObservable,
  S::Item: Clone + Send + 'static,
  S::Err: Clone + Send + 'static,
  SD: Scheduler,
{
  type Unsub = TupleSubscription<S::Unsub, SerialSubscription>;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Subject<S::Item, S::Err>, S::Err> + Send + 'static,
  {
    let first = Subject::new();
    let ctx = WindowContext {
      observer: MutArc::own(Some(observer)),
      state: MutArc::own(WindowState { current: first.clone(), received: 0, generation: 0 }),
      timer: SerialSubscription::new(),
      time_span: self.time_span,
      count: self.count,
      scheduler: self.scheduler,
    };
    ctx.arm_timer(&mut ctx.state.rc_deref_mut());
    ctx.observer.clone().next(first);
    let timer = ctx.timer.clone();
    let unsub = self.source.actual_subscribe(WindowObserver(ctx));
    TupleSubscription::new(unsub, timer)
  }
}

struct WindowState<Item, Err> {
  current: Subject<Item, Err>,
  received: usize,
  generation: u64,
}

struct WindowContext<O, Item, Err, SD> {
  observer: MutArc<Option<O>>,
  state: MutArc<WindowState<Item, Err>>,
  timer: SerialSubscription,
  time_span: Duration,
  count: usize,
  scheduler: SD,
}

impl<O, Item, Err, SD: Clone> Clone for WindowContext<O, Item, Err, SD> {
  fn clone(&self) -> Self {
    WindowContext {
      observer: self.observer.clone(),
      state: self.state.clone(),
      timer: self.timer.clone(),
      time_span: self.time_span,
      count: self.count,
      scheduler: self.scheduler.clone(),
    }
  }
}

impl<O, Item, Err, SD> WindowContext<O, Item, Err, SD>
where
  O: Observer<Subject<Item, Err>, Err> + Send + 'static,
  Item: Clone + Send + 'static,
  Err: Clone + Send + 'static,
  SD: Scheduler,
{
  fn arm_timer(&self, state: &mut WindowState<Item, Err>) {
    state.generation += 1;
    let generation = state.generation;
    let ctx = self.clone();
    let handle = self.scheduler.schedule_after(self.time_span, move || ctx.on_timer(generation));
    self.timer.set(handle);
  }

  /// Swap in a fresh window. Returns the closing one and its replacement.
  fn rotate(&self, state: &mut WindowState<Item, Err>) -> (Subject<Item, Err>, Subject<Item, Err>) {
    let next = Subject::new();
    let closing = std::mem::replace(&mut state.current, next.clone());
    state.received = 0;
    self.arm_timer(state);
    (closing, next)
  }

  fn on_timer(&self, generation: u64) {
    let (closing, next) = {
      let mut state = self.state.rc_deref_mut();
      if state.generation != generation {
        return;
      }
      self.rotate(&mut state)
    };
    closing.complete();
    self.observer.clone().next(next);
  }
}

pub struct WindowObserver<O, Item, Err, SD>(WindowContext<O, Item, Err, SD>);

impl<O, Item, Err, SD> Observer<Item, Err> for WindowObserver<O, Item, Err, SD>
where
  O: Observer<Subject<Item, Err>, Err> + Send + 'static,
  Item: Clone + Send + 'static,
  Err: Clone + Send + 'static,
  SD: Scheduler,
{
  fn next(&mut self, value: Item) {
    let (current, rotated) = {
      let mut state = self.0.state.rc_deref_mut();
      let current = state.current.clone();
      state.received += 1;
      let rotated =
        if state.received >= self.0.count { Some(self.0.rotate(&mut state)) } else { None };
      (current, rotated)
    };
    current.next(value);
    if let Some((closing, next)) = rotated {
      closing.complete();
      self.0.observer.next(next);
    }
  }

  fn error(self, err: Err) {
    self.0.timer.clone().unsubscribe();
    let current = self.0.state.rc_deref().current.clone();
    current.error(err.clone());
    self.0.observer.error(err);
  }

  fn complete(self) {
    self.0.timer.clone().unsubscribe();
    let current = self.0.state.rc_deref().current.clone();
    current.complete();
    self.0.observer.complete();
  }

  fn is_closed(&self) -> bool { self.0.observer.is_closed() }
}

#[cfg(test)]
mod tests {
  use std::sync::{Arc, Mutex};

  use crate::prelude::*;

  /// Subscribe to every window and record `(window index, value)` plus a
  /// `(window index, -1)` marker when a window completes.
  fn collect_windows<S>(windows: S) -> Arc<Mutex<Vec<(usize, i32)>>>
  where
    S: Observable<Item = Subject<i32, Infallible>, Err = Infallible>,
  {
    let log = Arc::new(Mutex::new(vec![]));
    let c_log = log.clone();
    let _ = windows.enumerate().subscribe(move |(index, window)| {
      let n_log = c_log.clone();
      let d_log = c_log.clone();
      let _ = window
        .on_complete(move || d_log.lock().unwrap().push((index, -1)))
        .subscribe(move |v| n_log.lock().unwrap().push((index, v)));
    });
    log
  }

  #[rxflow_macro::test]
  fn count_boundary_closes_before_next_opens() {
    let scheduler = TestScheduler::new();
    let source = Shared::from_iter(1..=5);
    let log = collect_windows(source.window(Duration::from_secs(1), 2, scheduler.clone()));
    assert_eq!(
      *log.lock().unwrap(),
      vec![(0, 1), (0, 2), (0, -1), (1, 3), (1, 4), (1, -1), (2, 5), (2, -1)]
    );
    assert_eq!(scheduler.pending_count(), 0);
  }

  #[rxflow_macro::test]
  fn time_boundary_rotates_windows() {
    let scheduler = TestScheduler::new();
    let source = Subject::<i32, Infallible>::new();
    let windows = source.clone().window(Duration::from_millis(50), 10, scheduler.clone());
    let log = collect_windows(windows);

    source.next(1);
    scheduler.advance_by(Duration::from_millis(50));
    source.next(2);
    source.next(3);
    scheduler.advance_by(Duration::from_millis(50));
    assert_eq!(*log.lock().unwrap(), vec![(0, 1), (0, -1), (1, 2), (1, 3), (1, -1)]);
  }
}
