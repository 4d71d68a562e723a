///
/// C ABI Surface
///
/// `extern "C"` entry points mirroring the conventional POSIX threading
/// contract, so code written against that contract can link against the
/// shim unmodified. Thread handles cross the boundary as raw `u32` ids;
/// mutexes and condition variables as heap-allocated opaque pointers.
///
/// Status codes follow errno conventions: 0 for success, positive errno
/// values for reportable failures, -1 for a thread that was created but
/// could not be started (as the original shim reported it).
///

use crate::condvar::{Condvar, TimeSpec};
use crate::error::ThreadError;
use crate::identity;
use crate::launch::{self, StartRoutine};
use crate::mutex::Mutex;
use crate::thread::{self, Thread};

pub const STRAND_OK: i32 = 0;
/// Native substrate out of thread resources.
pub const STRAND_EAGAIN: i32 = 11;
/// Resource busy: contended trylock.
pub const STRAND_EBUSY: i32 = 16;
/// Invalid handle or handle in the wrong state.
pub const STRAND_EINVAL: i32 = 22;
/// Timed wait expired without a signal.
pub const STRAND_ETIMEDOUT: i32 = 110;
/// Thread created but failed to start.
pub const STRAND_ESTART: i32 = -1;

/// Create and start a thread running `entry(argument)`. Writes the new
/// handle through `out_thread` on success.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn strand_thread_create(
    out_thread: *mut u32,
    entry: StartRoutine,
    argument: *mut u8,
) -> i32 {
    match launch::create(entry, argument) {
        Ok(created) => {
            if !out_thread.is_null() {
                unsafe {
                    *out_thread = created.raw();
                }
            }
            STRAND_OK
        }
        Err(ThreadError::ResourceExhausted) => STRAND_EAGAIN,
        Err(ThreadError::StartFailure) => STRAND_ESTART,
        Err(_) => STRAND_EINVAL,
    }
}

/// The calling thread's own handle. Only valid on threads created through
/// `strand_thread_create`; anywhere else this is a fatal usage error.
#[unsafe(no_mangle)]
pub extern "C" fn strand_thread_self() -> u32 {
    identity::current().raw()
}

/// Non-zero iff both handles name the same thread.
#[unsafe(no_mangle)]
pub extern "C" fn strand_thread_equal(a: u32, b: u32) -> i32 {
    identity::equal(Thread::from_raw(a), Thread::from_raw(b)) as i32
}

/// Wait for the thread behind `handle` to finish and release the handle.
#[unsafe(no_mangle)]
pub extern "C" fn strand_thread_join(handle: u32) -> i32 {
    match thread::join(Thread::from_raw(handle)) {
        Ok(()) => STRAND_OK,
        Err(_) => STRAND_EINVAL,
    }
}

/// Mark `handle` detached; joining it afterwards fails with EINVAL.
#[unsafe(no_mangle)]
pub extern "C" fn strand_thread_detach(handle: u32) -> i32 {
    match thread::detach(Thread::from_raw(handle)) {
        Ok(()) => STRAND_OK,
        Err(_) => STRAND_EINVAL,
    }
}

/// Terminate the calling thread immediately. Unwinds the caller's frames
/// on its way out, hence the "C-unwind" ABI.
#[unsafe(no_mangle)]
pub extern "C-unwind" fn strand_thread_exit() -> ! {
    thread::exit()
}

/// Allocate a mutex. Never fails short of allocation failure.
#[unsafe(no_mangle)]
pub extern "C" fn strand_mutex_new() -> *mut Mutex {
    Box::into_raw(Box::new(Mutex::new()))
}

/// Release a mutex allocated by `strand_mutex_new`. Null is ignored.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn strand_mutex_destroy(mutex: *mut Mutex) -> i32 {
    if !mutex.is_null() {
        drop(unsafe { Box::from_raw(mutex) });
    }
    STRAND_OK
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn strand_mutex_lock(mutex: *mut Mutex) -> i32 {
    if mutex.is_null() {
        return STRAND_EINVAL;
    }
    unsafe { &*mutex }.lock();
    STRAND_OK
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn strand_mutex_unlock(mutex: *mut Mutex) -> i32 {
    if mutex.is_null() {
        return STRAND_EINVAL;
    }
    unsafe { &*mutex }.unlock();
    STRAND_OK
}

/// 0 when acquired, EBUSY when another thread holds the mutex.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn strand_mutex_trylock(mutex: *mut Mutex) -> i32 {
    if mutex.is_null() {
        return STRAND_EINVAL;
    }
    if unsafe { &*mutex }.try_lock() {
        STRAND_OK
    } else {
        STRAND_EBUSY
    }
}

/// Allocate a condition variable.
#[unsafe(no_mangle)]
pub extern "C" fn strand_cond_new() -> *mut Condvar {
    Box::into_raw(Box::new(Condvar::new()))
}

/// Release a condition variable allocated by `strand_cond_new`. Null is
/// ignored.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn strand_cond_destroy(cond: *mut Condvar) -> i32 {
    if !cond.is_null() {
        drop(unsafe { Box::from_raw(cond) });
    }
    STRAND_OK
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn strand_cond_wait(cond: *mut Condvar, mutex: *mut Mutex) -> i32 {
    if cond.is_null() || mutex.is_null() {
        return STRAND_EINVAL;
    }
    unsafe { &*cond }.wait(unsafe { &*mutex });
    STRAND_OK
}

/// Timed wait bounded by the deadline's sub-second component (see the
/// condvar module docs for the semantics). ETIMEDOUT when no signal
/// arrived within the bound.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn strand_cond_timedwait(
    cond: *mut Condvar,
    mutex: *mut Mutex,
    deadline_seconds: i64,
    deadline_nanoseconds: i64,
) -> i32 {
    if cond.is_null() || mutex.is_null() {
        return STRAND_EINVAL;
    }
    let deadline = TimeSpec {
        seconds: deadline_seconds,
        nanoseconds: deadline_nanoseconds,
    };
    if unsafe { &*cond }.timed_wait(unsafe { &*mutex }, &deadline) {
        STRAND_OK
    } else {
        STRAND_ETIMEDOUT
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn strand_cond_signal(cond: *mut Condvar) -> i32 {
    if cond.is_null() {
        return STRAND_EINVAL;
    }
    unsafe { &*cond }.signal();
    STRAND_OK
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn strand_cond_broadcast(cond: *mut Condvar) -> i32 {
    if cond.is_null() {
        return STRAND_EINVAL;
    }
    unsafe { &*cond }.broadcast();
    STRAND_OK
}
