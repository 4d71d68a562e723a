///
/// Substrate Error Types
///
/// Failures reported by the native thread lifecycle calls. The raw mutex
/// and condition-variable primitives never fail; misuse there (for example
/// unlocking a mutex the caller does not hold) is undefined behavior of the
/// substrate, not a reportable error.
///

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SubstrateError {
    #[error("out of native thread resources")]
    OutOfThreads,

    #[error("native thread {0} is not in a startable state")]
    NotStartable(u32),

    #[error("unknown native thread handle {0}")]
    UnknownHandle(u32),
}
