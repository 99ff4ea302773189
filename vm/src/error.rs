use bytecode::DecodeError;
use object::{ObjectError, Symbol};
use thiserror::Error;

use crate::process::HandlerId;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Object(#[from] ObjectError),

    #[error("malformed bytecode: {0}")]
    Decode(#[from] DecodeError),

    #[error("malformed bytecode: {0}")]
    MalformedBytecode(String),

    #[error("{receiver} does not understand {selector}")]
    MessageNotUnderstood { receiver: String, selector: Symbol },

    #[error("unhandled exception #{kind}")]
    UnhandledException { kind: Symbol },

    #[error("type error: expected {expected}, got {got}")]
    TypeError { expected: &'static str, got: String },

    #[error("wrong number of arguments: expected {expected}, got {got}")]
    ArityMismatch { expected: usize, got: usize },

    #[error("stack overflow: limit of {0} exceeded")]
    StackOverflow(usize),

    #[error("value stack underflow")]
    StackUnderflow,

    #[error("no primitive at index {0}")]
    UnknownPrimitive(usize),

    #[error("output failed: {0}")]
    Output(String),

    /// An exception on its way to the handler that caught it.
    #[error("exception #{kind} in flight to handler {handler:?}")]
    Thrown { kind: Symbol, handler: HandlerId },
}

impl RuntimeError {
    pub fn type_error(expected: &'static str, got: &object::Value) -> Self {
        RuntimeError::TypeError {
            expected,
            got: got.type_name().to_owned(),
        }
    }

    /// Everything except an exception still travelling to its handler
    /// halts the process.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, RuntimeError::Thrown { .. })
    }
}
