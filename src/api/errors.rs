use thiserror::Error;

use crate::types::ExecError;

/// Failures surfaced at the facade boundary, before any unit runs.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The batch would delete the caller's own current directory (or an
    /// ancestor of it). Raised at submission, before the worker starts.
    #[error("batch consistency violation: {0}")]
    ConsistencyViolation(String),
    /// The dedicated batch worker could not be spawned.
    #[error("batch worker could not be started: {0}")]
    WorkerUnavailable(String),
}

// Stable identifiers for emitted facts. SCREAMING_SNAKE_CASE matches the
// emitted id strings.
#[allow(
    non_camel_case_types,
    reason = "variants must match the emitted E_* id strings"
)]
#[derive(Clone, Copy, Debug)]
pub enum ErrorId {
    E_NOT_FOUND,
    E_PERM,
    E_UNAVAILABLE,
    E_TIMEOUT,
    E_EXEC,
    E_READ_ONLY,
    E_ALLOC,
    E_CONSISTENCY,
    E_GENERIC,
}

#[must_use]
pub const fn id_str(id: ErrorId) -> &'static str {
    match id {
        ErrorId::E_NOT_FOUND => "E_NOT_FOUND",
        ErrorId::E_PERM => "E_PERM",
        ErrorId::E_UNAVAILABLE => "E_UNAVAILABLE",
        ErrorId::E_TIMEOUT => "E_TIMEOUT",
        ErrorId::E_EXEC => "E_EXEC",
        ErrorId::E_READ_ONLY => "E_READ_ONLY",
        ErrorId::E_ALLOC => "E_ALLOC",
        ErrorId::E_CONSISTENCY => "E_CONSISTENCY",
        ErrorId::E_GENERIC => "E_GENERIC",
    }
}

#[must_use]
pub const fn exit_code_for(id: ErrorId) -> i32 {
    match id {
        ErrorId::E_NOT_FOUND => 10,
        ErrorId::E_PERM => 20,
        ErrorId::E_UNAVAILABLE => 30,
        ErrorId::E_TIMEOUT => 40,
        ErrorId::E_EXEC => 50,
        ErrorId::E_READ_ONLY => 60,
        ErrorId::E_ALLOC => 70,
        ErrorId::E_CONSISTENCY => 80,
        ErrorId::E_GENERIC => 1,
    }
}

/// The stable identifier for a classified failure.
#[must_use]
pub const fn error_id_for(err: &ExecError) -> ErrorId {
    match err {
        ExecError::NotFound => ErrorId::E_NOT_FOUND,
        ExecError::InsufficientPermissions { .. } => ErrorId::E_PERM,
        ExecError::CommandUnavailable => ErrorId::E_UNAVAILABLE,
        ExecError::Timeout => ErrorId::E_TIMEOUT,
        ExecError::ExecutionFailed(_) => ErrorId::E_EXEC,
        ExecError::ReadOnlyFilesystem => ErrorId::E_READ_ONLY,
        ExecError::AllocationFailed(_) => ErrorId::E_ALLOC,
    }
}
