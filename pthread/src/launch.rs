///
/// Thread Launch Coordinator
///
/// The native substrate can spawn a thread only with a fixed-signature
/// entry function plus one opaque argument; there is no native "run this
/// arbitrary function with this argument" primitive. The coordinator
/// bridges that gap with a heap-allocated per-call `LaunchContext` bundling
/// the user entry, its argument, and the child's own handle, passed as the
/// substrate's single argument and consumed exactly once by the trampoline.
///
/// Because every call carries its own context, concurrent creates never
/// share mutable state and need no serialization: each trampoline observes
/// exactly the entry/argument pair of its own call.
///
/// The child's handle is written into the context between native spawn and
/// start, while the child is still parked on its start gate, so the
/// trampoline can establish the thread's identity before user code runs.
///
/// Created threads run at the caller's priority minus one (lower numeric
/// value = higher priority) so workers are not starved relative to their
/// creator, and are pinned to a fixed worker core.
///

use std::sync::atomic::{AtomicU32, Ordering};

use crate::error::ThreadError;
use crate::identity;
use crate::thread::{self, Thread};

/// Entry signature for user start routines.
pub type StartRoutine = extern "C-unwind" fn(*mut u8);

/// Stack given to created threads unless overridden.
pub const DEFAULT_STACK_SIZE: usize = 8 * 1024;

/// Created threads run slightly elevated relative to their creator.
pub const DEFAULT_PRIORITY_BIAS: i32 = -1;

/// Fixed core every created thread is pinned to.
const WORKER_CORE: i32 = 1;

/// Per-call creation knobs. The defaults reproduce the fixed policy of the
/// original shim.
#[derive(Debug, Clone, Copy)]
pub struct CreateOptions {
    pub stack_size: usize,
    pub priority_bias: i32,
}

impl Default for CreateOptions {
    fn default() -> Self {
        Self {
            stack_size: DEFAULT_STACK_SIZE,
            priority_bias: DEFAULT_PRIORITY_BIAS,
        }
    }
}

/// Diagnostic count of threads that have entered their start routine.
static CREATED_THREADS: AtomicU32 = AtomicU32::new(0);

/// How many threads have been launched so far. Diagnostic only; never used
/// for correctness.
pub fn created_count() -> u32 {
    CREATED_THREADS.load(Ordering::Relaxed)
}

/// Everything one created thread needs, bundled into the substrate's single
/// opaque argument. `handle` is filled in after native spawn, while the
/// child is still parked.
struct LaunchContext {
    entry: StartRoutine,
    argument: *mut u8,
    handle: u32,
}

/// Fixed entry every native thread actually starts in. Takes ownership of
/// its call's context, establishes the thread identity, then runs the user
/// entry.
extern "C-unwind" fn launch_trampoline(data: *mut u8) {
    let context = unsafe { Box::from_raw(data.cast::<LaunchContext>()) };
    identity::establish(Thread::from_raw(context.handle));

    let sequence = CREATED_THREADS.fetch_add(1, Ordering::Relaxed) + 1;
    tracing::debug!(
        thread = sequence,
        handle = context.handle,
        "starting thread"
    );

    (context.entry)(context.argument);
}

/// Create and start a thread running `entry(argument)` with the default
/// stack size and priority bias.
pub fn create(entry: StartRoutine, argument: *mut u8) -> Result<Thread, ThreadError> {
    create_with(entry, argument, CreateOptions::default())
}

/// As `create`, with explicit stack size and priority bias.
pub fn create_with(
    entry: StartRoutine,
    argument: *mut u8,
    options: CreateOptions,
) -> Result<Thread, ThreadError> {
    let caller_priority = strand_substrate::current_priority() as i32;
    let priority = (caller_priority + options.priority_bias).max(0) as u32;

    let context = Box::into_raw(Box::new(LaunchContext {
        entry,
        argument,
        handle: 0,
    }));

    let handle = match strand_substrate::spawn(
        launch_trampoline,
        context.cast(),
        options.stack_size,
        priority,
        WORKER_CORE,
    ) {
        Ok(handle) => handle,
        Err(_) => {
            drop(unsafe { Box::from_raw(context) });
            return Err(ThreadError::ResourceExhausted);
        }
    };

    // The child is parked on its start gate until start() below, so the
    // context is still exclusively ours to finish.
    unsafe {
        (*context).handle = handle;
    }
    thread::register(handle);

    if strand_substrate::start(handle).is_err() {
        thread::unregister(handle);
        let _ = strand_substrate::close(handle);
        // close() aborts the parked child before it ever reads the context.
        drop(unsafe { Box::from_raw(context) });
        return Err(ThreadError::StartFailure);
    }

    Ok(Thread::from_raw(handle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thread::join;
    use std::sync::atomic::AtomicUsize;
    use std::time::{Duration, Instant};
    use strand_substrate::DEFAULT_PRIORITY;

    // fetch_add instead of store so a duplicated invocation would be
    // visible as a doubled value.
    static OBSERVED_A: AtomicUsize = AtomicUsize::new(0);
    static OBSERVED_B: AtomicUsize = AtomicUsize::new(0);
    static OBSERVED_C: AtomicUsize = AtomicUsize::new(0);
    static OBSERVED_D: AtomicUsize = AtomicUsize::new(0);

    extern "C-unwind" fn record_a(argument: *mut u8) {
        OBSERVED_A.fetch_add(argument as usize, Ordering::SeqCst);
    }
    extern "C-unwind" fn record_b(argument: *mut u8) {
        OBSERVED_B.fetch_add(argument as usize, Ordering::SeqCst);
    }
    extern "C-unwind" fn record_c(argument: *mut u8) {
        OBSERVED_C.fetch_add(argument as usize, Ordering::SeqCst);
    }
    extern "C-unwind" fn record_d(argument: *mut u8) {
        OBSERVED_D.fetch_add(argument as usize, Ordering::SeqCst);
    }

    #[test]
    fn test_each_thread_gets_its_own_entry_and_argument() {
        let threads = [
            create(record_a, 0xA1 as *mut u8).unwrap(),
            create(record_b, 0xB2 as *mut u8).unwrap(),
            create(record_c, 0xC3 as *mut u8).unwrap(),
            create(record_d, 0xD4 as *mut u8).unwrap(),
        ];
        for thread in threads {
            join(thread).unwrap();
        }

        assert_eq!(OBSERVED_A.load(Ordering::SeqCst), 0xA1);
        assert_eq!(OBSERVED_B.load(Ordering::SeqCst), 0xB2);
        assert_eq!(OBSERVED_C.load(Ordering::SeqCst), 0xC3);
        assert_eq!(OBSERVED_D.load(Ordering::SeqCst), 0xD4);
    }

    static SLOW_OBSERVED: AtomicUsize = AtomicUsize::new(0);
    static FAST_OBSERVED: AtomicUsize = AtomicUsize::new(0);

    extern "C-unwind" fn slow_record(argument: *mut u8) {
        std::thread::sleep(Duration::from_millis(500));
        SLOW_OBSERVED.fetch_add(argument as usize, Ordering::SeqCst);
    }
    extern "C-unwind" fn fast_record(argument: *mut u8) {
        FAST_OBSERVED.fetch_add(argument as usize, Ordering::SeqCst);
    }

    #[test]
    fn test_back_to_back_creates_with_delayed_first_entry() {
        let first = create(slow_record, 0x11 as *mut u8).unwrap();

        // The second create must neither block on the first thread's
        // progress nor hand it the wrong entry.
        let started = Instant::now();
        let second = create(fast_record, 0x22 as *mut u8).unwrap();
        assert!(started.elapsed() < Duration::from_millis(400));

        join(first).unwrap();
        join(second).unwrap();
        assert_eq!(SLOW_OBSERVED.load(Ordering::SeqCst), 0x11);
        assert_eq!(FAST_OBSERVED.load(Ordering::SeqCst), 0x22);
    }

    static CHILD_PRIORITY: AtomicUsize = AtomicUsize::new(0);

    extern "C-unwind" fn record_child_priority(_argument: *mut u8) {
        CHILD_PRIORITY.store(
            strand_substrate::current_priority() as usize,
            Ordering::SeqCst,
        );
    }

    #[test]
    fn test_child_runs_one_priority_step_above_caller() {
        let thread = create(record_child_priority, std::ptr::null_mut()).unwrap();
        join(thread).unwrap();
        assert_eq!(
            CHILD_PRIORITY.load(Ordering::SeqCst),
            (DEFAULT_PRIORITY - 1) as usize
        );
    }

    static RAN_ON_BIG_STACK: AtomicUsize = AtomicUsize::new(0);

    extern "C-unwind" fn fill_big_stack(_argument: *mut u8) {
        // Would overflow the 8 KiB default stack.
        let buffer = [0u8; 64 * 1024];
        RAN_ON_BIG_STACK.store(buffer.len(), Ordering::SeqCst);
    }

    #[test]
    fn test_create_with_honors_stack_size() {
        let options = CreateOptions {
            stack_size: 256 * 1024,
            ..CreateOptions::default()
        };
        let thread = create_with(fill_big_stack, std::ptr::null_mut(), options).unwrap();
        join(thread).unwrap();
        assert_eq!(RAN_ON_BIG_STACK.load(Ordering::SeqCst), 64 * 1024);
    }

    extern "C-unwind" fn do_nothing(_argument: *mut u8) {}

    #[test]
    fn test_created_count_moves_forward() {
        let before = created_count();
        let thread = create(do_nothing, std::ptr::null_mut()).unwrap();
        join(thread).unwrap();
        assert!(created_count() > before);
    }
}
