///
/// Thread Handles and Lifecycle Operations
///
/// A `Thread` is the caller-facing handle to a thread made by the launch
/// coordinator. Lifecycle state (joinable vs. detached) is tracked in a
/// process-wide registry so misuse fails fast: joining a detached handle or
/// joining twice returns an error instead of silently waiting on a handle
/// that is no longer valid.
///
/// `exit` terminates the calling thread immediately. No cleanup-handler
/// stack runs; anything that must be released on thread exit has to be
/// released by the caller before the call.
///

use std::collections::HashMap;
use std::sync::{LazyLock, Mutex};

use crate::error::ThreadError;

/// Handle to a thread created by `launch::create`. Copyable, like the
/// POSIX thread id it stands in for; validity is tracked per underlying
/// native handle, not per copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thread {
    raw: u32,
}

impl Thread {
    pub(crate) fn from_raw(raw: u32) -> Self {
        Self { raw }
    }

    /// The underlying native handle id.
    pub fn raw(&self) -> u32 {
        self.raw
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum HandleState {
    Joinable,
    Detached,
}

static HANDLE_STATES: LazyLock<Mutex<HashMap<u32, HandleState>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

pub(crate) fn register(raw: u32) {
    HANDLE_STATES
        .lock()
        .unwrap()
        .insert(raw, HandleState::Joinable);
}

pub(crate) fn unregister(raw: u32) {
    HANDLE_STATES.lock().unwrap().remove(&raw);
}

/// Block until `thread` has finished, then release its native handle.
///
/// Valid at most once per handle: a second join, or a join after `detach`,
/// fails fast.
pub fn join(thread: Thread) -> Result<(), ThreadError> {
    let mut states = HANDLE_STATES.lock().unwrap();
    match states.get(&thread.raw) {
        None => return Err(ThreadError::UnknownHandle(thread.raw)),
        Some(HandleState::Detached) => return Err(ThreadError::AlreadyDetached(thread.raw)),
        Some(HandleState::Joinable) => {}
    }
    states.remove(&thread.raw);
    drop(states);

    tracing::debug!(handle = thread.raw, "waiting for thread exit");
    strand_substrate::join(thread.raw).map_err(|_| ThreadError::UnknownHandle(thread.raw))
}

/// Give up the right to join `thread`. The thread keeps running; its native
/// handle is released now instead of at join time.
pub fn detach(thread: Thread) -> Result<(), ThreadError> {
    let mut states = HANDLE_STATES.lock().unwrap();
    match states.get(&thread.raw) {
        None => return Err(ThreadError::UnknownHandle(thread.raw)),
        Some(HandleState::Detached) => return Err(ThreadError::AlreadyDetached(thread.raw)),
        Some(HandleState::Joinable) => {}
    }
    states.insert(thread.raw, HandleState::Detached);
    drop(states);

    strand_substrate::close(thread.raw).map_err(|_| ThreadError::UnknownHandle(thread.raw))
}

/// Terminate the calling thread immediately.
pub fn exit() -> ! {
    tracing::debug!("exiting thread");
    strand_substrate::exit_current()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::launch::create;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::{Duration, Instant};

    extern "C-unwind" fn nap_briefly(_argument: *mut u8) {
        std::thread::sleep(Duration::from_millis(50));
    }

    #[test]
    fn test_join_returns_after_thread_finishes() {
        let thread = create(nap_briefly, std::ptr::null_mut()).unwrap();

        let started = Instant::now();
        join(thread).unwrap();
        let elapsed = started.elapsed();

        assert!(elapsed >= Duration::from_millis(50));
        assert!(elapsed < Duration::from_secs(5));
    }

    #[test]
    fn test_join_twice_fails_fast() {
        let thread = create(nap_briefly, std::ptr::null_mut()).unwrap();
        join(thread).unwrap();
        assert_eq!(join(thread), Err(ThreadError::UnknownHandle(thread.raw())));
    }

    #[test]
    fn test_join_after_detach_fails_fast() {
        let thread = create(nap_briefly, std::ptr::null_mut()).unwrap();
        detach(thread).unwrap();

        let started = Instant::now();
        let result = join(thread);
        assert_eq!(result, Err(ThreadError::AlreadyDetached(thread.raw())));
        // Fails fast instead of waiting out the thread.
        assert!(started.elapsed() < Duration::from_millis(50));
    }

    #[test]
    fn test_detach_twice_fails() {
        let thread = create(nap_briefly, std::ptr::null_mut()).unwrap();
        detach(thread).unwrap();
        assert_eq!(
            detach(thread),
            Err(ThreadError::AlreadyDetached(thread.raw()))
        );
    }

    static RAN_PAST_EXIT: AtomicBool = AtomicBool::new(false);
    static REACHED_EXIT: AtomicBool = AtomicBool::new(false);

    extern "C-unwind" fn stop_half_way(_argument: *mut u8) {
        REACHED_EXIT.store(true, Ordering::SeqCst);
        exit();
        #[allow(unreachable_code)]
        RAN_PAST_EXIT.store(true, Ordering::SeqCst);
    }

    #[test]
    fn test_exit_ends_the_thread_and_join_still_completes() {
        let thread = create(stop_half_way, std::ptr::null_mut()).unwrap();
        join(thread).unwrap();
        assert!(REACHED_EXIT.load(Ordering::SeqCst));
        assert!(!RAN_PAST_EXIT.load(Ordering::SeqCst));
    }
}
