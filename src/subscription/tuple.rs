use super::Subscription;

/// TupleSubscription that combines two subscriptions
///
/// Used by two-source operators (`amb`, `zip`, `take_until`, ...) that own
/// exactly two upstream subscriptions.
pub struct TupleSubscription<U1, U2> {
  unsub1: U1,
  unsub2: U2,
}

impl<U1, U2> TupleSubscription<U1, U2> {
  pub fn new(unsub1: U1, unsub2: U2) -> Self { TupleSubscription { unsub1, unsub2 } }
}

impl<U1, U2> Subscription for TupleSubscription<U1, U2>
where
  U1: Subscription,
  U2: Subscription,
{
  fn unsubscribe(self) {
    self.unsub1.unsubscribe();
    self.unsub2.unsubscribe();
  }

  /// Closed only when both halves are closed.
  fn is_closed(&self) -> bool { self.unsub1.is_closed() && self.unsub2.is_closed() }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::subscription::test_util::CountingSubscription;

  #[rxflow_macro::test]
  fn releases_both_halves() {
    let first = CountingSubscription::default();
    let second = CountingSubscription::default();

    let tuple_sub = TupleSubscription::new(first.clone(), second.clone());
    assert!(!tuple_sub.is_closed());
    tuple_sub.unsubscribe();

    assert_eq!(first.count(), 1);
    assert_eq!(second.count(), 1);
  }
}
