//!
//! Shared-counter demo: four threads each take a mutex one thousand times.
//!
//! Run with `cargo run --example counter`; the launch coordinator's
//! per-thread events show up at debug level.
//!

use std::sync::atomic::{AtomicUsize, Ordering};

use strand_pthread::{Mutex, create, join};

static COUNTER_MUTEX: Mutex = Mutex::new();
static COUNTER: AtomicUsize = AtomicUsize::new(0);

extern "C-unwind" fn add_one_thousand(_argument: *mut u8) {
    for _ in 0..1000 {
        COUNTER_MUTEX.lock();
        let value = COUNTER.load(Ordering::Relaxed);
        COUNTER.store(value + 1, Ordering::Relaxed);
        COUNTER_MUTEX.unlock();
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let workers: Vec<_> = (0..4)
        .map(|_| create(add_one_thousand, std::ptr::null_mut()).expect("create worker"))
        .collect();

    for worker in workers {
        join(worker).expect("join worker");
    }

    tracing::info!(total = COUNTER.load(Ordering::Relaxed), "counter settled");
    assert_eq!(COUNTER.load(Ordering::Relaxed), 4000);
}
