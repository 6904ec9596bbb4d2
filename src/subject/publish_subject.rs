use super::{
  impl_subject,
  subject_core::{ReplayPolicy, SubjectCore},
};

/// A publish subject: subscribers only see what is emitted after they
/// subscribed.
///
/// ```rust
/// use std::sync::{Arc, Mutex};
/// use rxflow::prelude::*;
///
/// let subject = Subject::<i32, Infallible>::default();
/// subject.next(1);
///
/// let seen = Arc::new(Mutex::new(vec![]));
/// let c_seen = seen.clone();
/// subject.clone().subscribe(move |v| c_seen.lock().unwrap().push(v));
/// subject.next(2);
/// assert_eq!(*seen.lock().unwrap(), vec![2]);
/// ```
pub struct Subject<Item, Err>(SubjectCore<Item, Err>);

impl<Item, Err> Default for Subject<Item, Err> {
  fn default() -> Self { Subject(SubjectCore::new(ReplayPolicy::None, None)) }
}

impl<Item, Err> Subject<Item, Err> {
  pub fn new() -> Self { Self::default() }
}

impl_subject!(Subject);

#[cfg(test)]
mod tests {
  use std::sync::{Arc, Mutex};

  use crate::prelude::*;

  fn record(subject: &Subject<i32, String>) -> (Arc<Mutex<Vec<String>>>, impl Subscription) {
    let log = Arc::new(Mutex::new(vec![]));
    let (n, e, c) = (log.clone(), log.clone(), log.clone());
    let sub = subject
      .clone()
      .on_complete(move || c.lock().unwrap().push("complete".into()))
      .on_error(move |err| e.lock().unwrap().push(format!("error {err}")))
      .subscribe(move |v| n.lock().unwrap().push(v.to_string()));
    (log, sub)
  }

  #[rxflow_macro::test]
  fn multicasts_in_subscription_order() {
    let subject = Subject::<i32, Infallible>::new();
    let order = Arc::new(Mutex::new(vec![]));
    for tag in ["a", "b"] {
      let order = order.clone();
      subject.clone().subscribe(move |v| order.lock().unwrap().push(format!("{tag}{v}")));
    }
    subject.next(1);
    subject.next(2);
    assert_eq!(*order.lock().unwrap(), vec!["a1", "b1", "a2", "b2"]);
  }

  #[rxflow_macro::test]
  fn no_replay_for_late_subscriber() {
    let subject = Subject::new();
    subject.next(1);
    let (log, _sub) = record(&subject);
    subject.next(2);
    assert_eq!(*log.lock().unwrap(), vec!["2"]);
  }

  #[rxflow_macro::test]
  fn terminal_is_absorbing_and_replayed() {
    let subject = Subject::new();
    let (early, _sub) = record(&subject);
    subject.next(1);
    subject.clone().complete();
    subject.next(2);
    subject.clone().error("late".to_string());

    let (late, _sub) = record(&subject);
    assert_eq!(*early.lock().unwrap(), vec!["1", "complete"]);
    assert_eq!(*late.lock().unwrap(), vec!["complete"]);
    assert!(subject.is_terminated());
  }

  #[rxflow_macro::test]
  fn error_reaches_every_subscriber() {
    let subject = Subject::new();
    let (first, _a) = record(&subject);
    let (second, _b) = record(&subject);
    subject.clone().error("boom".to_string());
    assert_eq!(*first.lock().unwrap(), vec!["error boom"]);
    assert_eq!(*second.lock().unwrap(), vec!["error boom"]);
    assert_eq!(subject.observer_count(), 0);
  }

  #[rxflow_macro::test]
  fn released_subscriber_stops_receiving() {
    let subject = Subject::new();
    let (log, sub) = record(&subject);
    subject.next(1);
    sub.unsubscribe();
    subject.next(2);
    subject.clone().complete();
    assert_eq!(*log.lock().unwrap(), vec!["1"]);
    assert_eq!(subject.observer_count(), 0);
  }

  #[rxflow_macro::test]
  fn unsubscribe_from_inside_callback() {
    let subject = Subject::<i32, Infallible>::new();
    let seen = Arc::new(Mutex::new(vec![]));
    let slot: Arc<Mutex<Option<BoxedSubscription>>> = Arc::new(Mutex::new(None));
    let (c_seen, c_slot) = (seen.clone(), slot.clone());
    let sub = subject.clone().subscribe(move |v| {
      c_seen.lock().unwrap().push(v);
      if let Some(sub) = c_slot.lock().unwrap().take() {
        sub.unsubscribe();
      }
    });
    *slot.lock().unwrap() = Some(sub.into_boxed());
    subject.next(1);
    subject.next(2);
    assert_eq!(*seen.lock().unwrap(), vec![1]);
  }

  #[rxflow_macro::test]
  fn emit_into_itself_from_a_callback() {
    let subject = Subject::<i32, Infallible>::new();
    let order = Arc::new(Mutex::new(vec![]));
    let (c_subject, c_order) = (subject.clone(), order.clone());
    subject.clone().subscribe(move |v| {
      c_order.lock().unwrap().push(format!("a{v}"));
      if v == 1 {
        c_subject.next(2);
        c_subject.clone().complete();
      }
    });
    let c_order = order.clone();
    subject.clone().subscribe(move |v| c_order.lock().unwrap().push(format!("b{v}")));

    subject.next(1);
    assert_eq!(*order.lock().unwrap(), vec!["a1", "b1", "a2", "b2"]);
    assert!(subject.is_terminated());
    assert_eq!(subject.observer_count(), 0);
  }

  #[rxflow_macro::test]
  fn replayed_subscriber_emits_into_its_subject() {
    let subject = ReplaySubject::<i32, Infallible>::with_capacity(1);
    subject.next(1);
    let seen = Arc::new(Mutex::new(vec![]));
    let (c_subject, c_seen) = (subject.clone(), seen.clone());
    subject.clone().subscribe(move |v| {
      c_seen.lock().unwrap().push(v);
      if v < 3 {
        c_subject.next(v + 1);
      }
    });
    assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3]);
  }

  #[rxflow_macro::test]
  fn terminating_through_a_clone_keeps_the_handle() {
    let subject = Subject::new();
    let (log, _sub) = record(&subject);
    subject.next(7);
    subject.clone().complete();
    subject.next(8);
    assert!(subject.is_terminated());
    assert_eq!(*log.lock().unwrap(), vec!["7", "complete"]);
  }

  #[rxflow_macro::test]
  fn keeps_accepting_without_subscribers() {
    let subject = Subject::<i32, Infallible>::new();
    subject.next(1);
    assert!(!subject.is_terminated());
    assert_eq!(subject.observer_count(), 0);
  }

  #[rxflow_macro::test]
  fn emissions_from_many_threads() {
    let subject = Subject::<usize, Infallible>::new();
    let total = Arc::new(Mutex::new(0));
    let c_total = total.clone();
    subject.clone().subscribe(move |v| *c_total.lock().unwrap() += v);

    let workers: Vec<_> = (0..4)
      .map(|_| {
        let subject = subject.clone();
        std::thread::spawn(move || (1..=100).for_each(|v| subject.next(v)))
      })
      .collect();
    for w in workers {
      w.join().unwrap();
    }
    assert_eq!(*total.lock().unwrap(), 4 * 5050);
  }

  #[rxflow_macro::test]
  fn subject_as_observer_of_a_cold_source() {
    let subject = Subject::<i32, Infallible>::new();
    let seen = Arc::new(Mutex::new(vec![]));
    let c_seen = seen.clone();
    subject.clone().subscribe(move |v| c_seen.lock().unwrap().push(v));
    Shared::from_iter([1, 2, 3]).subscribe_with(subject.clone());
    assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3]);
    assert!(subject.is_terminated());
  }
}
