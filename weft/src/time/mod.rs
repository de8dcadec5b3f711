//! Timers.
//!
//! Every timer is a one-shot clock registered with a [`Manager`]: a
//! [`Future<()>`] fulfilled by the first epoch whose clock reading reaches
//! its deadline. Expired timers fire in deadline order, ties in creation
//! order.
//!
//! This module provides the shapes built on top of that primitive:
//! - [`Countdown`] for periodic rounds towards a fixed end,
//! - [`Interval`] for drift-free periodic ticks,
//! - [`timeout`] and [`with_deadline`] for bounding a future.
//!
//! One-shot clocks themselves come from [`Manager::make_clock`].
//!
//! [`Manager`]: crate::Manager
//! [`Manager::make_clock`]: crate::Manager::make_clock
//! [`Future<()>`]: crate::Future

mod countdown;
mod interval;
mod timeout;

pub(crate) mod timer;

#[doc(inline)]
pub use countdown::Countdown;

#[doc(inline)]
pub use interval::{Interval, interval};

#[doc(inline)]
pub use timeout::{timeout, with_deadline};
