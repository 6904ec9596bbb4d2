//! ConnectableObservable implementation for multicasting.
//!
//! `ConnectableObservable` bridges a cold source and a subject, turning one
//! production run into a shared hot stream.
//!
//! # Key Concepts
//!
//! - **No implicit start**: subscribing only registers with the subject.
//! - **Connect**: `connect()` subscribes the subject to the source, exactly
//!   once while connected. Values the source would have produced before that
//!   are never seen.
//! - **Fork**: `fork()` (or cloning the connectable) gives observables to
//!   subscribe to.
//!
//! # Example
//!
//! ```rust
//! use std::sync::{Arc, Mutex};
//! use rxflow::prelude::*;
//!
//! let connectable = Shared::from_iter([1, 2, 3]).replay(1);
//! let seen = Arc::new(Mutex::new(vec![]));
//!
//! let c_seen = seen.clone();
//! connectable.fork().subscribe(move |v| c_seen.lock().unwrap().push(("a", v)));
//! connectable.connect();
//!
//! let c_seen = seen.clone();
//! connectable.fork().subscribe(move |v| c_seen.lock().unwrap().push(("b", v)));
//! assert_eq!(*seen.lock().unwrap(), vec![("a", 1), ("a", 2), ("a", 3), ("b", 3)]);
//! ```

use crate::{
  observable::{CoreObservable, ObservableType},
  observer::Observer,
  rc::MutArc,
  subscription::{SerialSubscription, Subscription},
};

/// Handle to a live connection. Releasing it releases the source
/// subscription; the connectable can then be connected again.
#[derive(Clone)]
pub struct Connection(SerialSubscription);

impl Subscription for Connection {
  fn unsubscribe(self) { self.0.unsubscribe() }

  fn is_closed(&self) -> bool { self.0.is_closed() }
}

/// A source paired with the subject that multicasts it.
pub struct ConnectableObservable<S, Sub> {
  source: S,
  subject: Sub,
  connection: MutArc<Option<Connection>>,
}

impl<S: Clone, Sub: Clone> Clone for ConnectableObservable<S, Sub> {
  fn clone(&self) -> Self {
    ConnectableObservable {
      source: self.source.clone(),
      subject: self.subject.clone(),
      connection: self.connection.clone(),
    }
  }
}

impl<S, Sub> ConnectableObservable<S, Sub> {
  pub fn new(source: S, subject: Sub) -> Self {
    ConnectableObservable { source, subject, connection: MutArc::own(None) }
  }

  /// An observable of the shared stream.
  pub fn fork(&self) -> Sub
  where
    Sub: Clone,
  {
    self.subject.clone()
  }

  /// Subscribe the subject to the source. While a connection is live, this
  /// returns that same connection instead of subscribing again.
  pub fn connect(&self) -> Connection
  where
    S: CoreObservable + Clone,
    Sub: Observer<S::Item, S::Err> + Clone + Send + 'static,
  {
    let serial = {
      let mut connection = self.connection.rc_deref_mut();
      if let Some(live) = connection.as_ref().filter(|c| !c.is_closed()) {
        return live.clone();
      }
      let serial = SerialSubscription::new();
      *connection = Some(Connection(serial.clone()));
      serial
    };
    tracing::debug!("connectable observable connected");
    serial.set(self.source.clone().actual_subscribe(self.subject.clone()));
    Connection(serial)
  }
}

impl<S, Sub: ObservableType> ObservableType for ConnectableObservable<S, Sub> {
  type Item = Sub::Item;
  type Err = Sub::Err;
}

impl<S, Sub: CoreObservable> CoreObservable for ConnectableObservable<S, Sub> {
  type Unsub = Sub::Unsub;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Self::Item, Self::Err> + Send + 'static,
  {
    self.subject.actual_subscribe(observer)
  }
}
