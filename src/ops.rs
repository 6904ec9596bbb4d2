//! Operator implementations.
//!
//! Each operator is a plain struct holding its upstream and parameters,
//! built by the matching method on [`Observable`](crate::observable::Observable).
//! Subscribing wraps the downstream observer in the operator's own observer
//! and subscribes that to the upstream.
//!
//! Operators that end a stream early (`take`, `take_until`, `amb`, ...) keep
//! a [`SerialSubscription`](crate::subscription::SerialSubscription) to their
//! upstream so they can release it from inside an event callback.

/// Forward `error`, `complete` and `is_closed` to the observer in `$field`.
/// Expects the error type parameter of the surrounding impl to be `Err`.
macro_rules! forward_terminals {
  ($field:ident) => {
    fn error(self, err: Err) { self.$field.error(err) }

    fn complete(self) { self.$field.complete() }

    fn is_closed(&self) -> bool { self.$field.is_closed() }
  };
}

pub(crate) use forward_terminals;

mod amb;
mod buffer;
mod catch;
mod combine_latest;
mod concat;
mod delay;
mod distinct_until_changed;
mod enumerate;
mod filter;
mod lifecycle;
mod map;
mod materialize;
mod merge;
mod merge_all;
mod retry;
mod retry_when;
mod sample;
mod scan;
mod skip;
mod skip_until;
mod start_with;
mod switch_latest;
mod take;
mod take_until;
mod timeout;
mod to_array;
mod window;
mod with_latest_from;
mod zip;

pub use amb::*;
pub use buffer::*;
pub use catch::*;
pub use combine_latest::*;
pub use concat::*;
pub use delay::*;
pub use distinct_until_changed::*;
pub use enumerate::*;
pub use filter::*;
pub use lifecycle::*;
pub use map::*;
pub use materialize::*;
pub use merge::*;
pub use merge_all::*;
pub use retry::*;
pub use retry_when::*;
pub use sample::*;
pub use scan::*;
pub use skip::*;
pub use skip_until::*;
pub use start_with::*;
pub use switch_latest::*;
pub use take::*;
pub use take_until::*;
pub use timeout::*;
pub use to_array::*;
pub use window::*;
pub use with_latest_from::*;
pub use zip::*;
