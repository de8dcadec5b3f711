//! Wait-combinators.
//!
//! A combinator owns N child futures and aggregates them into one parent
//! future under a policy. Every child is converted into a settlement
//! callback reporting to a shared node, which is how one future keeps a
//! single consumer while still being waited on as part of a group.
//!
//! - [`race`], [`all`] and [`all_settled`] take a set of futures of one
//!   type; the [`race!`](crate::race), [`all!`](crate::all) and
//!   [`all_settled!`](crate::all_settled) macros accept any mix of types.
//! - [`Dynamic`] is a set that keeps growing while it is waited on.

mod dynamic;
mod fixed;
mod node;

pub use dynamic::Dynamic;
pub use fixed::{Winner, all, all_settled, race};
pub use node::Policy;

/// Support items for the combinator macros. Not public API.
#[doc(hidden)]
pub mod __private {
    pub use super::node::{Node, Policy, Slot};
}
