use super::{
  impl_subject,
  subject_core::{ReplayPolicy, SubjectCore},
};

/// A subject that always holds a current value.
///
/// It is seeded at construction, so its buffer is never empty: every new
/// subscriber first receives the latest value, then the live ones.
pub struct BehaviorSubject<Item, Err>(SubjectCore<Item, Err>);

impl<Item, Err> BehaviorSubject<Item, Err> {
  pub fn new(value: Item) -> Self {
    BehaviorSubject(SubjectCore::new(ReplayPolicy::Latest, Some(value)))
  }

  /// The latest value.
  pub fn value(&self) -> Item
  where
    Item: Clone,
  {
    match self.0.latest() {
      Some(value) => value,
      None => unreachable!("a behavior subject is seeded at construction"),
    }
  }
}

impl_subject!(BehaviorSubject);
