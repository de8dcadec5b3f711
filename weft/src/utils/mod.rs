//! Utilities for memory-efficient data structures.
//!
//! This module provides low-level utilities used internally by the runtime.
//! In particular, it exposes a generation-checked [`Slab`] used as the task
//! arena: the manager holds keys into it, never pointers to frames.

mod slab;

pub(crate) use slab::{Key, Slab};
