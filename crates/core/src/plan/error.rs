#![forbid(unsafe_code)]

use super::names::ThreadNameError;

/// Rejection reasons for topology mutations. All are local and recoverable;
/// callers surface the message verbatim.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MutationError {
    /// Node id 1 holds the protected main-start position.
    ProtectedNode,
    UnknownTarget { id: i64 },
    UnknownThread { thread_id: String },
    MainThreadProtected,
    DuplicateThreadName { name: String },
    EmptyName,
    InvalidThreadName(ThreadNameError),
    InvalidIndex { index: i64 },
}

impl std::fmt::Display for MutationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ProtectedNode => write!(f, "node id 1 is protected and cannot be moved"),
            Self::UnknownTarget { id } => write!(f, "no node with id {id}"),
            Self::UnknownThread { thread_id } => write!(f, "unknown thread '{thread_id}'"),
            Self::MainThreadProtected => write!(f, "the main thread cannot be moved or removed"),
            Self::DuplicateThreadName { name } => {
                write!(f, "thread '{name}' already exists")
            }
            Self::EmptyName => write!(f, "thread name must not be empty"),
            Self::InvalidThreadName(reason) => write!(f, "{}", reason.message()),
            Self::InvalidIndex { index } => write!(f, "invalid thread view index {index}"),
        }
    }
}

impl std::error::Error for MutationError {}
