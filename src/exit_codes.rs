//! Stable exit codes for the `bootengine` binary.

/// Workflow completed.
pub const OK: i32 = 0;
/// Parse, validation, plugin or command failure.
pub const FAILURE: i32 = 1;
/// The user declined a confirmation or variable prompt.
pub const DECLINED: i32 = 2;
/// Interrupted by Ctrl-C.
pub const CANCELLED: i32 = 130;
