///
/// Raw Mutex Primitive
///
/// Guard-free mutual exclusion: `lock` and `unlock` are independent calls,
/// matching the substrate contract rather than Rust's scoped-guard idiom.
/// `unlock` by a thread that does not hold the mutex is undefined behavior
/// of the substrate and is not checked here.
///

use std::sync::{Condvar, Mutex};

pub struct RawMutex {
    locked: Mutex<bool>,
    condvar: Condvar,
}

impl RawMutex {
    pub const fn new() -> Self {
        Self {
            locked: Mutex::new(false),
            condvar: Condvar::new(),
        }
    }

    /// Block until the mutex is acquired.
    pub fn lock(&self) {
        let mut locked = self.locked.lock().unwrap();
        while *locked {
            locked = self.condvar.wait(locked).unwrap();
        }
        *locked = true;
    }

    /// Release the mutex and wake one waiter, if any.
    pub fn unlock(&self) {
        let mut locked = self.locked.lock().unwrap();
        *locked = false;
        drop(locked);
        self.condvar.notify_one();
    }

    /// Acquire the mutex only if it is uncontended. Returns whether the
    /// lock was taken; `false` is an outcome, not an error.
    pub fn try_lock(&self) -> bool {
        let mut locked = self.locked.lock().unwrap();
        if *locked {
            false
        } else {
            *locked = true;
            true
        }
    }
}

impl Default for RawMutex {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_lock_unlock_round_trip() {
        let mutex = RawMutex::new();
        mutex.lock();
        mutex.unlock();
        mutex.lock();
        mutex.unlock();
    }

    #[test]
    fn test_try_lock_reports_contention() {
        let mutex = Arc::new(RawMutex::new());
        mutex.lock();

        let contender = Arc::clone(&mutex);
        let acquired = thread::spawn(move || contender.try_lock())
            .join()
            .unwrap();
        assert!(!acquired);

        mutex.unlock();
        assert!(mutex.try_lock());
        mutex.unlock();
    }

    #[test]
    fn test_lock_excludes_concurrent_writers() {
        let mutex = Arc::new(RawMutex::new());
        let counter = Arc::new(std::sync::atomic::AtomicUsize::new(0));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let mutex = Arc::clone(&mutex);
                let counter = Arc::clone(&counter);
                thread::spawn(move || {
                    for _ in 0..1000 {
                        mutex.lock();
                        let value = counter.load(std::sync::atomic::Ordering::Relaxed);
                        counter.store(value + 1, std::sync::atomic::Ordering::Relaxed);
                        mutex.unlock();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(counter.load(std::sync::atomic::Ordering::Relaxed), 4000);
    }
}
