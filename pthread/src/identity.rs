///
/// Thread Identity Resolver
///
/// Every thread started through the launch coordinator carries a typed
/// identity in thread-local storage, written by the trampoline before the
/// user entry function runs. `current` answers "who am I" from that slot.
///
/// Threads the coordinator did not create (the process main thread, foreign
/// std threads) have no identity. Asking for one is a precondition
/// violation, not a recoverable failure, and panics.
///

use std::cell::Cell;

use crate::thread::Thread;

thread_local! {
    static IDENTITY: Cell<Option<u32>> = const { Cell::new(None) };
}

/// Record the calling thread's identity. Runs in the trampoline, before any
/// user code on the thread.
pub(crate) fn establish(thread: Thread) {
    IDENTITY.set(Some(thread.raw()));
}

/// The calling thread's own handle.
///
/// # Panics
///
/// Panics when called from a thread the launch coordinator did not create.
pub fn current() -> Thread {
    match IDENTITY.get() {
        Some(raw) => Thread::from_raw(raw),
        None => panic!(
            "thread identity requested before it was established; \
             only threads started through create() carry an identity"
        ),
    }
}

/// Whether two handles name the same underlying native thread.
pub fn equal(a: Thread, b: Thread) -> bool {
    a.raw() == b.raw()
}
