use std::sync::{
  atomic::{AtomicU8, Ordering},
  Arc,
};

use crate::{
  observable::{CoreObservable, ObservableType},
  observer::Observer,
  rc::MutArc,
  subscription::{SerialSubscription, Subscription, TupleSubscription},
};

/// Mirrors whichever of two streams produces an event first.
///
/// The first event of any kind (value, error or completion) decides the
/// winner; the other stream is released at that moment. `source_a` is
/// subscribed first, so when both streams emit synchronously on subscribe
/// `source_a` wins, and `source_b` is never subscribed.
#[derive(Clone)]
pub struct Amb<S1, S2> {
  pub(crate) source_a: S1,
  pub(crate) source_b: S2,
}

impl<S1: ObservableType, S2> ObservableType for Amb<S1, S2> {
  type Item = S1::Item;
  type Err = S1::Err;
}

const UNDECIDED: u8 = 0;
const SIDE_A: u8 = 1;
const SIDE_B: u8 = 2;

impl<S1, S2> CoreObservable for Amb<S1, S2>
where
  S1: CoreObservable,
  S2: CoreObservable<Item = S1::Item, Err = S1::Err>,
{
  type Unsub = TupleSubscription<SerialSubscription, SerialSubscription>;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<S1::Item, S1::Err> + Send + 'static,
  {
    let ctx = AmbContext {
      observer: MutArc::own(Some(observer)),
      winner: Arc::new(AtomicU8::new(UNDECIDED)),
      sub_a: SerialSubscription::new(),
      sub_b: SerialSubscription::new(),
    };
    ctx.sub_a.set(self.source_a.actual_subscribe(AmbObserver { ctx: ctx.clone(), side: SIDE_A }));
    if ctx.winner.load(Ordering::Acquire) == UNDECIDED {
      ctx.sub_b.set(self.source_b.actual_subscribe(AmbObserver { ctx: ctx.clone(), side: SIDE_B }));
    }
    TupleSubscription::new(ctx.sub_a, ctx.sub_b)
  }
}

struct AmbContext<O> {
  observer: MutArc<Option<O>>,
  winner: Arc<AtomicU8>,
  sub_a: SerialSubscription,
  sub_b: SerialSubscription,
}

impl<O> Clone for AmbContext<O> {
  fn clone(&self) -> Self {
    AmbContext {
      observer: self.observer.clone(),
      winner: self.winner.clone(),
      sub_a: self.sub_a.clone(),
      sub_b: self.sub_b.clone(),
    }
  }
}

pub struct AmbObserver<O> {
  ctx: AmbContext<O>,
  side: u8,
}

impl<O> AmbObserver<O> {
  /// Whether events from this side may pass. The first caller claims the
  /// race and releases the other side.
  fn wins(&self) -> bool {
    let decided =
      self.ctx.winner.compare_exchange(UNDECIDED, self.side, Ordering::AcqRel, Ordering::Acquire);
    match decided {
      Ok(_) => {
        tracing::trace!(side = self.side, "amb race decided");
        let loser = if self.side == SIDE_A { &self.ctx.sub_b } else { &self.ctx.sub_a };
        loser.clone().unsubscribe();
        true
      }
      Err(winner) => winner == self.side,
    }
  }
}

impl<Item, Err, O> Observer<Item, Err> for AmbObserver<O>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) {
    if self.wins() {
      self.ctx.observer.next(value);
    }
  }

  fn error(self, err: Err) {
    if self.wins() {
      self.ctx.observer.error(err);
    }
  }

  fn complete(self) {
    if self.wins() {
      self.ctx.observer.complete();
    }
  }

  fn is_closed(&self) -> bool {
    let winner = self.ctx.winner.load(Ordering::Acquire);
    (winner != UNDECIDED && winner != self.side) || self.ctx.observer.is_closed()
  }
}
