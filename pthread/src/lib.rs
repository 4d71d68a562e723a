//!
//! strand-pthread - POSIX-Compatible Threading Shim
//!
//! Reconciles the POSIX threading contract with a minimal native substrate
//! whose spawn primitive takes only a fixed-signature entry function plus
//! one opaque argument, has no cancellation, and gives every thread a small
//! fixed stack.
//!
//! ## Thread creation
//!
//! `launch::create` bundles the user entry function and its argument into a
//! per-call heap context and passes it through the substrate's single
//! argument slot; a fixed trampoline unpacks it inside the new thread.
//! Creation is fully concurrent; no call can observe another call's entry.
//! Created threads run at the caller's priority minus one and are pinned to
//! a fixed worker core.
//!
//! ## Identity and lifecycle
//!
//! The trampoline records each thread's identity in thread-local storage
//! before user code runs; `identity::current` reads it back. `thread::join`
//! and `thread::detach` track per-handle state, so joining a detached or
//! already-joined handle fails fast. `thread::exit` ends the calling thread
//! immediately, with no cleanup-handler stack.
//!
//! ## Synchronization
//!
//! `Mutex` and `Condvar` are pass-throughs over the substrate's raw
//! primitives, shaped like their POSIX counterparts. `Condvar::timed_wait`
//! keeps the original shim's relative-duration reading of the deadline's
//! sub-second component; see the condvar module docs.
//!
//! ## Limits
//!
//! No cancellation: a thread stops only by returning from its entry or
//! calling `exit` itself. No scheduling policy beyond the fixed priority
//! bias. No stack growth.
//!

pub mod abi;
pub mod condvar;
pub mod error;
pub mod identity;
pub mod launch;
pub mod mutex;
pub mod thread;

pub use condvar::{Condvar, TimeSpec};
pub use error::ThreadError;
pub use identity::{current, equal};
pub use launch::{
    CreateOptions, DEFAULT_PRIORITY_BIAS, DEFAULT_STACK_SIZE, StartRoutine, create, create_with,
};
pub use mutex::Mutex;
pub use thread::{Thread, detach, exit, join};
