///
/// Condition-Variable Adapter
///
/// Pass-through over the substrate's raw condvar. Each wait first records
/// which mutex it is waiting with; the association is transient and
/// overwritten by every wait, so concurrent waits on one condvar with
/// *different* mutexes are not supported and must not be relied upon.
///
/// `timed_wait` reproduces the original shim's semantics deliberately: the
/// bound handed to the substrate is the deadline's sub-second component
/// taken as a relative duration, NOT `deadline - now`. Callers expecting
/// POSIX absolute-deadline behavior will observe too-short or too-long
/// waits. This fidelity gap is documented here instead of silently fixed;
/// see DESIGN.md before changing it.
///

use std::ptr;
use std::sync::atomic::{AtomicPtr, Ordering};
use std::time::Duration;

use strand_substrate::{RawCondvar, RawMutex};

use crate::mutex::Mutex;

/// Absolute-deadline shape of the POSIX timed wait, split into whole
/// seconds and the sub-second remainder in nanoseconds. Only the
/// sub-second part bounds the wait (see module docs).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSpec {
    pub seconds: i64,
    pub nanoseconds: i64,
}

pub struct Condvar {
    raw: RawCondvar,
    /// Mutex recorded by the most recent wait call.
    associated: AtomicPtr<RawMutex>,
}

impl Condvar {
    /// Initialize a condition variable. Always succeeds.
    pub const fn new() -> Self {
        Self {
            raw: RawCondvar::new(),
            associated: AtomicPtr::new(ptr::null_mut()),
        }
    }

    /// Best-effort teardown; the substrate condvar needs none.
    pub fn destroy(&mut self) {}

    fn associate(&self, mutex: &Mutex) -> &RawMutex {
        let raw = mutex.raw() as *const RawMutex as *mut RawMutex;
        self.associated.store(raw, Ordering::Release);
        // Waits go through the recorded association, like the native
        // condvar does.
        unsafe { &*self.associated.load(Ordering::Acquire) }
    }

    /// Release `mutex`, block until signalled, reacquire `mutex`. The
    /// caller must hold `mutex`.
    pub fn wait(&self, mutex: &Mutex) {
        let raw = self.associate(mutex);
        self.raw.wait(raw);
    }

    /// As `wait`, bounded by the deadline's sub-second component (see
    /// module docs for the fidelity gap). Returns `true` when the wait
    /// ended because of a signal or broadcast, `false` on timeout.
    pub fn timed_wait(&self, mutex: &Mutex, deadline: &TimeSpec) -> bool {
        let raw = self.associate(mutex);
        let bound = Duration::from_nanos(deadline.nanoseconds.max(0) as u64);
        self.raw.wait_timeout(raw, bound)
    }

    /// Wake exactly one waiter, if any.
    pub fn signal(&self) {
        self.raw.wake_one();
    }

    /// Wake all current waiters.
    pub fn broadcast(&self) {
        self.raw.wake_all();
    }
}

impl Default for Condvar {
    fn default() -> Self {
        Self::new()
    }
}
