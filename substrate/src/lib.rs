//!
//! strand-substrate - Native Threading Substrate Boundary
//!
//! Models the minimal threading substrate of a console-style lightweight OS:
//!
//! - Two-phase thread lifecycle: `spawn` creates a thread in a
//!   created-not-started state, `start` lets it run, `join` waits for it,
//!   `close` releases the handle without waiting.
//! - Spawn accepts only a fixed-signature entry function plus one opaque
//!   argument. There is no native "run this arbitrary function with this
//!   argument" primitive; higher layers must bundle what they need into the
//!   single argument themselves.
//! - Per-thread scheduling priority (lower numeric value = higher priority)
//!   and a core-affinity hint, both fixed at spawn time.
//! - Raw, guard-free mutex and condition-variable primitives.
//!
//! The host backend realizes this contract on `std::thread` and `std::sync`
//! so the layers above can be exercised on any development machine. Priority
//! and core affinity are recorded as scheduling hints; the host scheduler is
//! not actually steered.
//!

pub mod condvar;
pub mod error;
pub mod mutex;
pub mod thread;

pub use condvar::RawCondvar;
pub use error::SubstrateError;
pub use mutex::RawMutex;
pub use thread::{
    DEFAULT_PRIORITY, RawEntry, close, current_priority, exit_current, join, spawn, start,
};
