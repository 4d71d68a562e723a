///
/// Two-Phase Native Thread Lifecycle
///
/// `spawn` creates an OS thread parked on a start gate, in the substrate's
/// created-not-started state. `start` opens the gate and the thread runs its
/// entry function; `close` before `start` makes it exit without ever running
/// the entry. `join` waits for completion. Handles are small integer ids in
/// a process-wide registry; a handle becomes invalid once joined or closed.
///
/// The entry signature is fixed: `extern "C-unwind" fn(*mut u8)`. The substrate
/// carries exactly one opaque argument per thread and nothing else.
///
/// `exit_current` terminates only the calling thread. On the host backend
/// this unwinds to the substrate's thread main with a private payload, so it
/// must only be called from threads spawned through this module.
///

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, LazyLock, Mutex, Once};
use std::thread;

use crate::error::SubstrateError;

/// Fixed entry signature every native thread starts in.
pub type RawEntry = extern "C-unwind" fn(*mut u8);

/// Priority assigned to threads that were not spawned through the
/// substrate (the process main thread, foreign std threads). Lower numeric
/// value means higher priority.
pub const DEFAULT_PRIORITY: u32 = 44;

thread_local! {
    static CURRENT_PRIORITY: std::cell::Cell<u32> =
        const { std::cell::Cell::new(DEFAULT_PRIORITY) };
}

/// Payload used by `exit_current` to unwind back to the thread main.
struct ThreadExit;

/// Commands a parked thread can receive through its start gate.
#[derive(Clone, Copy, PartialEq, Eq)]
enum GateCommand {
    Hold,
    Run,
    Abort,
}

struct StartGate {
    command: Mutex<GateCommand>,
    condvar: Condvar,
}

impl StartGate {
    fn new() -> Self {
        Self {
            command: Mutex::new(GateCommand::Hold),
            condvar: Condvar::new(),
        }
    }

    fn open(&self, command: GateCommand) {
        let mut slot = self.command.lock().unwrap();
        *slot = command;
        drop(slot);
        self.condvar.notify_one();
    }

    fn wait(&self) -> GateCommand {
        let slot = self.command.lock().unwrap();
        let slot = self
            .condvar
            .wait_while(slot, |cmd| *cmd == GateCommand::Hold)
            .unwrap();
        *slot
    }
}

struct NativeThread {
    join_handle: Option<thread::JoinHandle<()>>,
    gate: Arc<StartGate>,
    started: bool,
    /// Scheduling hints recorded at spawn time. The host backend does not
    /// steer the scheduler with them.
    priority: u32,
    core: i32,
}

struct ThreadRegistry {
    threads: HashMap<u32, NativeThread>,
    next_id: u32,
}

impl ThreadRegistry {
    fn new() -> Self {
        Self {
            threads: HashMap::new(),
            next_id: 1,
        }
    }

    fn reserve_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

static THREAD_REGISTRY: LazyLock<Mutex<ThreadRegistry>> =
    LazyLock::new(|| Mutex::new(ThreadRegistry::new()));

/// The one opaque argument a native thread carries. The pointer is handed
/// across threads exactly once, from spawner to spawnee.
struct EntryArg(*mut u8);

unsafe impl Send for EntryArg {}

fn thread_main(gate: Arc<StartGate>, entry: RawEntry, arg: EntryArg, priority: u32) {
    CURRENT_PRIORITY.set(priority);

    match gate.wait() {
        GateCommand::Run => {}
        _ => return,
    }

    let result = panic::catch_unwind(AssertUnwindSafe(|| entry(arg.0)));
    if let Err(payload) = result {
        if payload.downcast_ref::<ThreadExit>().is_none() {
            panic::resume_unwind(payload);
        }
    }
}

/// Create a native thread in the created-not-started state.
///
/// The thread will execute `entry(arg)` once `start` is called on the
/// returned handle. Fails with `OutOfThreads` when the host cannot allocate
/// a thread (out of memory or thread slots).
pub fn spawn(
    entry: RawEntry,
    arg: *mut u8,
    stack_size: usize,
    priority: u32,
    core: i32,
) -> Result<u32, SubstrateError> {
    let mut registry = THREAD_REGISTRY.lock().unwrap();
    let id = registry.reserve_id();

    let gate = Arc::new(StartGate::new());
    let thread_gate = Arc::clone(&gate);
    let thread_arg = EntryArg(arg);

    let join_handle = thread::Builder::new()
        .name(format!("strand-native-{id}"))
        .stack_size(stack_size)
        .spawn(move || thread_main(thread_gate, entry, thread_arg, priority))
        .map_err(|_| SubstrateError::OutOfThreads)?;

    registry.threads.insert(
        id,
        NativeThread {
            join_handle: Some(join_handle),
            gate,
            started: false,
            priority,
            core,
        },
    );

    tracing::trace!(handle = id, priority, core, "native thread created");
    Ok(id)
}

/// Let a created thread run its entry function.
pub fn start(handle: u32) -> Result<(), SubstrateError> {
    let mut registry = THREAD_REGISTRY.lock().unwrap();
    let record = registry
        .threads
        .get_mut(&handle)
        .ok_or(SubstrateError::UnknownHandle(handle))?;

    if record.started {
        return Err(SubstrateError::NotStartable(handle));
    }
    record.started = true;
    tracing::trace!(
        handle,
        priority = record.priority,
        core = record.core,
        "native thread started"
    );
    record.gate.open(GateCommand::Run);
    Ok(())
}

/// Block until the thread behind `handle` has finished, then invalidate the
/// handle. Joining a created-not-started thread aborts it instead of waiting
/// forever on a gate nobody will open.
pub fn join(handle: u32) -> Result<(), SubstrateError> {
    let mut registry = THREAD_REGISTRY.lock().unwrap();
    let mut record = registry
        .threads
        .remove(&handle)
        .ok_or(SubstrateError::UnknownHandle(handle))?;
    drop(registry);

    if !record.started {
        record.gate.open(GateCommand::Abort);
    }
    if let Some(join_handle) = record.join_handle.take() {
        if join_handle.join().is_err() {
            tracing::warn!(handle, "native thread terminated by panic");
        }
    }
    Ok(())
}

/// Invalidate `handle` without waiting. A running thread keeps running; a
/// created-not-started thread exits without running its entry.
pub fn close(handle: u32) -> Result<(), SubstrateError> {
    let mut registry = THREAD_REGISTRY.lock().unwrap();
    let record = registry
        .threads
        .remove(&handle)
        .ok_or(SubstrateError::UnknownHandle(handle))?;
    drop(registry);

    if !record.started {
        record.gate.open(GateCommand::Abort);
    }
    // Dropping the JoinHandle detaches the OS thread.
    Ok(())
}

/// Scheduling priority of the calling thread, as recorded at spawn time.
/// Threads not spawned through the substrate report `DEFAULT_PRIORITY`.
pub fn current_priority() -> u32 {
    CURRENT_PRIORITY.get()
}

static EXIT_HOOK: Once = Once::new();

fn install_exit_hook() {
    EXIT_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if info.payload().downcast_ref::<ThreadExit>().is_none() {
                previous(info);
            }
        }));
    });
}

/// Terminate the calling thread immediately.
///
/// Only valid on threads spawned through this module: the host backend
/// unwinds to the substrate's thread main, which recognizes the payload and
/// returns normally. Frames between the caller and the thread main are
/// unwound, so their `Drop` impls still run; there is no cleanup-handler
/// stack beyond that.
pub fn exit_current() -> ! {
    install_exit_hook();
    panic::panic_any(ThreadExit);
}
