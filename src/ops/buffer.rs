use crate::{
  observable::{CoreObservable, ObservableType},
  observer::Observer,
  rc::MutArc,
  scheduler::{Duration, Scheduler},
  subscription::{SerialSubscription, Subscription, TupleSubscription},
};

/// Collects values into groups emitted as `Vec`s.
///
/// A group is flushed when `time_span` has elapsed since it was opened or
/// when it holds `count` values, whichever comes first; either way the next
/// group opens with a fresh timer. A time-based flush emits the group even
/// when it is empty. On completion the remaining values are flushed if there
/// are any; on error they are dropped.
#[derive(Clone)]
pub struct Buffer<S, SD> {
  pub(crate) source: S,
  pub(crate) time_span: Duration,
  pub(crate) count: usize,
  pub(crate) scheduler: SD,
}

impl<S: ObservableType, SD> ObservableType for Buffer<S, SD> {
  type Item = Vec<S::Item>;
  type Err = S::Err;
}

impl<S, SD> CoreObservable for Buffer<S, SD>
where
  S: CoreObservable,
  S::Item: Send + 'static,
  S::Err: 'static,
  SD: Scheduler,
{
  type Unsub = TupleSubscription<S::Unsub, SerialSubscription>;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Vec<S::Item>, S::Err> + Send + 'static,
  {
    let ctx = BufferContext {
      observer: MutArc::own(Some(observer)),
      state: MutArc::own(BufferState { items: Vec::new(), generation: 0 }),
      timer: SerialSubscription::new(),
      time_span: self.time_span,
      count: self.count,
      scheduler: self.scheduler,
    };
    ctx.open_group::<S::Err>(&mut ctx.state.rc_deref_mut());
    let timer = ctx.timer.clone();
    let unsub = self.source.actual_subscribe(BufferObserver(ctx));
    TupleSubscription::new(unsub, timer)
  }
}

struct BufferState<Item> {
  items: Vec<Item>,
  generation: u64,
}

struct BufferContext<O, Item, SD> {
  observer: MutArc<Option<O>>,
  state: MutArc<BufferState<Item>>,
  timer: SerialSubscription,
  time_span: Duration,
  count: usize,
  scheduler: SD,
}

impl<O, Item, SD: Clone> Clone for BufferContext<O, Item, SD> {
  fn clone(&self) -> Self {
    BufferContext {
      observer: self.observer.clone(),
      state: self.state.clone(),
      timer: self.timer.clone(),
      time_span: self.time_span,
      count: self.count,
      scheduler: self.scheduler.clone(),
    }
  }
}

impl<O, Item, SD> BufferContext<O, Item, SD>
where
  O: Send + 'static,
  Item: Send + 'static,
  SD: Scheduler,
{
  /// Start a new group timer. Runs with the state lock held, so a timer
  /// firing on another thread cannot observe a half-opened group.
  fn open_group<Err>(&self, state: &mut BufferState<Item>)
  where
    O: Observer<Vec<Item>, Err>,
    Err: 'static,
  {
    state.generation += 1;
    let generation = state.generation;
    let ctx = self.clone();
    let handle =
      self.scheduler.schedule_after(self.time_span, move || ctx.on_timer::<Err>(generation));
    self.timer.set(handle);
  }

  fn on_timer<Err>(&self, generation: u64)
  where
    O: Observer<Vec<Item>, Err>,
    Err: 'static,
  {
    let group = {
      let mut state = self.state.rc_deref_mut();
      if state.generation != generation {
        return;
      }
      let group = std::mem::take(&mut state.items);
      self.open_group::<Err>(&mut state);
      group
    };
    self.observer.clone().next(group);
  }
}

pub struct BufferObserver<O, Item, SD>(BufferContext<O, Item, SD>);

impl<O, Item, Err, SD> Observer<Item, Err> for BufferObserver<O, Item, SD>
where
  O: Observer<Vec<Item>, Err> + Send + 'static,
  Item: Send + 'static,
  Err: 'static,
  SD: Scheduler,
{
  fn next(&mut self, value: Item) {
    let full = {
      let mut state = self.0.state.rc_deref_mut();
      state.items.push(value);
      if state.items.len() >= self.0.count {
        let group = std::mem::take(&mut state.items);
        self.0.open_group::<Err>(&mut state);
        Some(group)
      } else {
        None
      }
    };
    if let Some(group) = full {
      self.0.observer.next(group);
    }
  }

  fn error(self, err: Err) {
    self.0.timer.clone().unsubscribe();
    self.0.observer.error(err);
  }

  fn complete(self) {
    self.0.timer.clone().unsubscribe();
    let rest = std::mem::take(&mut self.0.state.rc_deref_mut().items);
    let mut observer = self.0.observer;
    if !rest.is_empty() {
      observer.next(rest);
    }
    observer.complete();
  }

  fn is_closed(&self) -> bool { self.0.observer.is_closed() }
}

#[cfg(test)]
mod tests {
  use std::sync::{Arc, Mutex};

  use crate::prelude::*;

  #[rxflow_macro::test]
  fn flushes_on_count_and_at_completion() {
    let scheduler = TestScheduler::new();
    let seen = Arc::new(Mutex::new(vec![]));
    let c_seen = seen.clone();
    let _ = Shared::from_iter(1..=5)
      .buffer(Duration::from_secs(1), 2, scheduler.clone())
      .subscribe(move |v| c_seen.lock().unwrap().push(v));
    assert_eq!(*seen.lock().unwrap(), vec![vec![1, 2], vec![3, 4], vec![5]]);
    assert_eq!(scheduler.pending_count(), 0);
  }

  #[rxflow_macro::test]
  fn flushes_on_time_span() {
    let scheduler = TestScheduler::new();
    let source = Subject::<&str, Infallible>::new();
    let seen = Arc::new(Mutex::new(vec![]));
    let c_seen = seen.clone();
    let _ = source
      .clone()
      .buffer(Duration::from_millis(100), 3, scheduler.clone())
      .subscribe(move |v| c_seen.lock().unwrap().push(v));

    source.next("a");
    scheduler.advance_by(Duration::from_millis(100));
    scheduler.advance_by(Duration::from_millis(100));
    source.next("b");
    assert_eq!(*seen.lock().unwrap(), vec![vec!["a"], vec![]]);
  }

  #[rxflow_macro::test]
  fn count_flush_restarts_the_timer() {
    let scheduler = TestScheduler::new();
    let source = Subject::<i32, Infallible>::new();
    let seen = Arc::new(Mutex::new(vec![]));
    let c_seen = seen.clone();
    let _ = source
      .clone()
      .buffer(Duration::from_millis(100), 2, scheduler.clone())
      .subscribe(move |v| c_seen.lock().unwrap().push(v));

    scheduler.advance_by(Duration::from_millis(60));
    source.next(1);
    source.next(2);
    source.next(3);
    scheduler.advance_by(Duration::from_millis(60));
    assert_eq!(*seen.lock().unwrap(), vec![vec![1, 2]]);
    scheduler.advance_by(Duration::from_millis(40));
    assert_eq!(*seen.lock().unwrap(), vec![vec![1, 2], vec![3]]);
  }

  #[rxflow_macro::test]
  fn release_cancels_the_timer() {
    let scheduler = TestScheduler::new();
    let source = Subject::<i32, Infallible>::new();
    let sub = source
      .clone()
      .buffer(Duration::from_millis(10), 5, scheduler.clone())
      .subscribe(|_| {});
    assert_eq!(scheduler.pending_count(), 1);
    sub.unsubscribe();
    assert_eq!(scheduler.pending_count(), 0);
    assert_eq!(source.observer_count(), 0);
  }
}
