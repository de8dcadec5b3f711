//! Bridge to OS threads for blocking work.
//!
//! Cooperative tasks must not block the driver thread. A [`Pool`] runs
//! blocking callables on real threads, in parallel, and hands each result
//! back to the driver through the manager's completion inbox: the future
//! returned by [`Pool::post`] settles only inside
//! [`Manager::drive`](crate::Manager::drive).

mod builder;
mod core;
mod worker;

pub use self::builder::PoolBuilder;
pub use self::core::Pool;
