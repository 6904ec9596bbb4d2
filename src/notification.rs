/// One event of a stream, reified as data.
///
/// Produced by `materialize` and consumed by `dematerialize`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification<Item, Err> {
  Next(Item),
  Error(Err),
  Completed,
}

impl<Item, Err> Notification<Item, Err> {
  pub fn is_terminal(&self) -> bool { !matches!(self, Notification::Next(_)) }

  pub fn value(&self) -> Option<&Item> {
    match self {
      Notification::Next(v) => Some(v),
      _ => None,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[rxflow_macro::test]
  fn terminal_variants() {
    assert!(!Notification::<i32, ()>::Next(1).is_terminal());
    assert!(Notification::<i32, ()>::Error(()).is_terminal());
    assert!(Notification::<i32, ()>::Completed.is_terminal());
    assert_eq!(Notification::<i32, ()>::Next(3).value(), Some(&3));
  }
}
