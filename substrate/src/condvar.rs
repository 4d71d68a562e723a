///
/// Raw Condition-Variable Primitive
///
/// Wake tracking uses a sequence counter: waiters record the counter before
/// releasing the caller's mutex and sleep until it changes. Because the
/// counter lock is taken before the mutex is released and wakers bump the
/// counter under the same lock, a wake issued between unlock and sleep is
/// never lost.
///

use std::sync::{Condvar, Mutex};
use std::time::Duration;

use crate::mutex::RawMutex;

pub struct RawCondvar {
    seq: Mutex<u64>,
    condvar: Condvar,
}

impl RawCondvar {
    pub const fn new() -> Self {
        Self {
            seq: Mutex::new(0),
            condvar: Condvar::new(),
        }
    }

    /// Atomically release `mutex` and block until woken, then reacquire
    /// `mutex` before returning. The caller must hold `mutex`.
    pub fn wait(&self, mutex: &RawMutex) {
        let seq = self.seq.lock().unwrap();
        let ticket = *seq;
        mutex.unlock();

        let seq = self.condvar.wait_while(seq, |s| *s == ticket).unwrap();
        drop(seq);

        mutex.lock();
    }

    /// As `wait`, but give up after `bound`. Returns `true` when the wait
    /// ended because of a wake, `false` on timeout. `mutex` is reacquired
    /// either way.
    pub fn wait_timeout(&self, mutex: &RawMutex, bound: Duration) -> bool {
        let seq = self.seq.lock().unwrap();
        let ticket = *seq;
        mutex.unlock();

        let (seq, timeout) = self
            .condvar
            .wait_timeout_while(seq, bound, |s| *s == ticket)
            .unwrap();
        let signalled = !timeout.timed_out();
        drop(seq);

        mutex.lock();
        signalled
    }

    /// Wake exactly one waiter, if any.
    pub fn wake_one(&self) {
        let mut seq = self.seq.lock().unwrap();
        *seq += 1;
        drop(seq);
        self.condvar.notify_one();
    }

    /// Wake all current waiters.
    pub fn wake_all(&self) {
        let mut seq = self.seq.lock().unwrap();
        *seq += 1;
        drop(seq);
        self.condvar.notify_all();
    }
}

impl Default for RawCondvar {
    fn default() -> Self {
        Self::new()
    }
}
