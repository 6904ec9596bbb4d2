use super::Subscription;

/// A subscription that runs a teardown closure when released.
///
/// This is what a `create` producer usually returns: the closure cancels the
/// producer's own resources (a timer, a socket, a worker thread).
pub struct ClosureSubscription<F>(F);

impl<F: FnOnce()> ClosureSubscription<F> {
  pub fn new(teardown: F) -> Self { ClosureSubscription(teardown) }
}

impl<F: FnOnce()> Subscription for ClosureSubscription<F> {
  #[inline]
  fn unsubscribe(self) { (self.0)() }

  #[inline]
  fn is_closed(&self) -> bool { false }
}
