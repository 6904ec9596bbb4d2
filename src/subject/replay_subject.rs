use super::{
  impl_subject,
  subject_core::{ReplayPolicy, SubjectCore},
};

/// A subject that replays its history to late subscribers: the last
/// `capacity` values (oldest evicted first), or everything when unbounded.
pub struct ReplaySubject<Item, Err>(SubjectCore<Item, Err>);

impl<Item, Err> ReplaySubject<Item, Err> {
  pub fn with_capacity(capacity: usize) -> Self {
    ReplaySubject(SubjectCore::new(ReplayPolicy::Bounded(capacity), None))
  }

  pub fn unbounded() -> Self { ReplaySubject(SubjectCore::new(ReplayPolicy::Unbounded, None)) }
}

impl_subject!(ReplaySubject);
