//! Subjects: hot, multicast streams that are observers and observables at
//! the same time.
//!
//! | type | replays to a late subscriber |
//! |------|------------------------------|
//! | [`Subject`] | nothing |
//! | [`BehaviorSubject`] | the latest value (seeded at construction) |
//! | [`ReplaySubject`] | the last `n` values, or all of them |
//!
//! Every variant is a cheap `Clone` handle to one shared state and may be
//! driven from any thread. Subscribers are notified in subscription order.
//! After a terminal event, new subscribers get the replayed values followed
//! by that terminal event. A subject keeps accepting values when it has no
//! subscribers.
//!
//! `next` takes `&self`. The terminal events come from the [`Observer`]
//! impl and consume the handle they are called on, so a producer that keeps
//! its handle terminates through a clone: `subject.clone().complete()`.
//!
//! Delivery is serialized per subject. An event raised while another
//! delivery is running, from another thread or from a subscriber callback
//! emitting into its own subject, is queued and delivered by the running
//! one once the current event has reached every subscriber.
//!
//! [`Observer`]: crate::observer::Observer

mod behavior_subject;
mod publish_subject;
mod replay_subject;
mod subject_core;
mod subject_subscription;
mod subscribers;

pub use behavior_subject::*;
pub use publish_subject::*;
pub use replay_subject::*;
pub use subject_subscription::*;

macro_rules! impl_subject {
  ($name:ident) => {
    impl<Item, Err> Clone for $name<Item, Err> {
      fn clone(&self) -> Self { $name(self.0.clone()) }
    }

    impl<Item, Err> $name<Item, Err> {
      /// Emit a value to every current subscriber. No-op once terminated.
      pub fn next(&self, value: Item)
      where
        Item: Clone,
        Err: Clone,
      {
        self.0.next(value)
      }

      /// Number of live subscribers.
      pub fn observer_count(&self) -> usize { self.0.observer_count() }

      pub fn is_terminated(&self) -> bool { self.0.is_terminated() }
    }

    impl<Item, Err> $crate::observable::ObservableType for $name<Item, Err> {
      type Item = Item;
      type Err = Err;
    }

    impl<Item, Err> $crate::observable::CoreObservable for $name<Item, Err>
    where
      Item: Clone + Send + 'static,
      Err: Clone + Send + 'static,
    {
      type Unsub = $crate::subject::SubjectSubscription<Item, Err>;

      fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
      where
        O: $crate::observer::Observer<Item, Err> + Send + 'static,
      {
        self.0.subscribe(observer)
      }
    }

    impl<Item: Clone, Err: Clone> $crate::observer::Observer<Item, Err> for $name<Item, Err> {
      fn next(&mut self, value: Item) { self.0.next(value) }

      fn error(self, err: Err) { self.0.error(err) }

      fn complete(self) { self.0.complete() }

      fn is_closed(&self) -> bool { self.0.is_terminated() }
    }
  };
}

pub(crate) use impl_subject;
