use thiserror::Error;

/// Script-level faults.
///
/// Every variant terminates only the faulting context's current run; none of
/// them abort the host process or other scheduled contexts. Malformed
/// instruction streams (unknown opcode, truncated operand) surface through
/// the same taxonomy as runtime faults, since the stream is never
/// pre-validated.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Fault {
    #[error("stack underflow")]
    StackUnderflow,

    #[error("stack overflow (limit={limit})")]
    StackOverflow { limit: usize },

    #[error("type mismatch: expected {expected}, got {got}")]
    TypeMismatch {
        expected: &'static str,
        got: &'static str,
    },

    #[error("unknown opcode 0x{code:04X} at pc=0x{pc:X}")]
    UnknownOpcode { code: u16, pc: u32 },

    #[error("{kind} index out of range: {index} (len={len})")]
    IndexOutOfRange {
        kind: &'static str,
        index: i64,
        len: usize,
    },

    #[error("host call {op} failed: {message}")]
    HostCallFailure { op: &'static str, message: String },

    #[error("division by zero")]
    DivisionByZero,
}
