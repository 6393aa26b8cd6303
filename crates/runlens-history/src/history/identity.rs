//! Identity types for run history.
//!
//! RunId identifies one execution of a durable function; GroupId identifies a
//! logical step within it (retries share a GroupId and increment attempt);
//! EventId is the opaque ordering key assigned by the backend (lexically
//! sortable, ULID-like).

/// Identifies one execution of a durable function.
pub type RunId = String;

/// Identifies a logical step within a run; retries of the same step share a
/// GroupId.
pub type GroupId = String;

/// Opaque ordering key of a history item (lexically sortable, ULID-like).
pub type EventId = String;
