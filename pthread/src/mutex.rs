///
/// Mutex Adapter
///
/// Pass-through over the substrate's raw mutex, shaped like the POSIX
/// contract: init always succeeds, destroy never fails, lock/unlock are
/// unguarded calls. Unlock by a thread that does not hold the mutex is
/// undefined behavior inherited from the substrate and is not checked here.
///

use strand_substrate::RawMutex;

pub struct Mutex {
    raw: RawMutex,
}

impl Mutex {
    /// Initialize a mutex. Always succeeds.
    pub const fn new() -> Self {
        Self {
            raw: RawMutex::new(),
        }
    }

    /// Best-effort teardown: reset the wrapper to its initial unlocked
    /// state. Never fails; destroying an already-destroyed mutex is safe.
    pub fn destroy(&mut self) {
        self.raw = RawMutex::new();
    }

    /// Block until the mutex is acquired.
    pub fn lock(&self) {
        self.raw.lock();
    }

    /// Release the mutex.
    pub fn unlock(&self) {
        self.raw.unlock();
    }

    /// Acquire only if uncontended. `false` means another thread holds the
    /// mutex; that is the normal non-blocking outcome, not an error.
    pub fn try_lock(&self) -> bool {
        self.raw.try_lock()
    }

    pub(crate) fn raw(&self) -> &RawMutex {
        &self.raw
    }
}

impl Default for Mutex {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::launch::create;
    use crate::thread::join;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::{Duration, Instant};

    static TALLY_MUTEX: Mutex = Mutex::new();
    static TALLY: AtomicUsize = AtomicUsize::new(0);

    extern "C-unwind" fn add_one_thousand(_argument: *mut u8) {
        for _ in 0..1000 {
            TALLY_MUTEX.lock();
            // Non-atomic read-modify-write: lost updates would show up
            // immediately without the mutex.
            let value = TALLY.load(Ordering::Relaxed);
            TALLY.store(value + 1, Ordering::Relaxed);
            TALLY_MUTEX.unlock();
        }
    }

    #[test]
    fn test_four_threads_thousand_increments_no_lost_updates() {
        let threads = [
            create(add_one_thousand, std::ptr::null_mut()).unwrap(),
            create(add_one_thousand, std::ptr::null_mut()).unwrap(),
            create(add_one_thousand, std::ptr::null_mut()).unwrap(),
            create(add_one_thousand, std::ptr::null_mut()).unwrap(),
        ];
        for thread in threads {
            join(thread).unwrap();
        }
        assert_eq!(TALLY.load(Ordering::Relaxed), 4000);
    }

    #[test]
    fn test_try_lock_on_uncontended_mutex_acquires() {
        let mutex = Mutex::new();
        assert!(mutex.try_lock());
        mutex.unlock();
        // Equivalent to lock: the mutex is really held in between.
        assert!(mutex.try_lock());
        assert!(!mutex.try_lock());
        mutex.unlock();
    }

    static HELD_MUTEX: Mutex = Mutex::new();
    static HOLDING: AtomicBool = AtomicBool::new(false);
    static RELEASE: AtomicBool = AtomicBool::new(false);

    extern "C-unwind" fn hold_until_released(_argument: *mut u8) {
        HELD_MUTEX.lock();
        HOLDING.store(true, Ordering::SeqCst);
        while !RELEASE.load(Ordering::SeqCst) {
            std::thread::sleep(Duration::from_millis(5));
        }
        HELD_MUTEX.unlock();
    }

    #[test]
    fn test_try_lock_on_contended_mutex_returns_without_blocking() {
        let holder = create(hold_until_released, std::ptr::null_mut()).unwrap();
        while !HOLDING.load(Ordering::SeqCst) {
            std::thread::sleep(Duration::from_millis(5));
        }

        let started = Instant::now();
        assert!(!HELD_MUTEX.try_lock());
        assert!(started.elapsed() < Duration::from_millis(100));

        RELEASE.store(true, Ordering::SeqCst);
        join(holder).unwrap();
        assert!(HELD_MUTEX.try_lock());
        HELD_MUTEX.unlock();
    }

    #[test]
    fn test_destroy_is_idempotent_and_resets() {
        let mut mutex = Mutex::new();
        mutex.lock();
        mutex.destroy();
        mutex.destroy();
        // A destroyed wrapper is back in its initial state.
        assert!(mutex.try_lock());
        mutex.unlock();
    }
}
