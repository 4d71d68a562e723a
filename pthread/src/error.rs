///
/// Threading Shim Error Types
///
/// Failures the shim reports to its callers. All of them are returned
/// synchronously from the failing operation; nothing is retried internally.
///
/// Two outcomes are deliberately not errors:
/// - A contended `try_lock` reports `false`, the normal non-blocking result.
/// - A missing thread identity (reading `identity::current()` on a thread
///   the launch coordinator did not create) is a programming error and
///   panics rather than returning a value.
///

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ThreadError {
    #[error("native substrate could not allocate a thread")]
    ResourceExhausted,

    #[error("thread was created but failed to start")]
    StartFailure,

    #[error("unknown or already joined thread handle {0}")]
    UnknownHandle(u32),

    #[error("thread handle {0} is detached and cannot be joined")]
    AlreadyDetached(u32),
}
