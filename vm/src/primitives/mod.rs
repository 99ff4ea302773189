//! Host-implemented methods, grouped by the prototype they are
//! installed on.

use object::{ClosureRef, Symbol, Value};

use crate::process::Process;
use crate::{RuntimeError, VM};

pub mod boolean;
pub mod closure;
pub mod integer;
pub mod root;
pub mod string;
pub mod symbol;
pub mod world;

pub type PrimitiveFn =
    fn(&mut VM, &mut Process, Value, &[Value]) -> Result<Value, RuntimeError>;

#[derive(Clone, Copy)]
pub struct PrimitiveDesc {
    pub selector: &'static str,
    pub arity: u8,
    pub func: PrimitiveFn,
}

impl PrimitiveDesc {
    pub const fn new(selector: &'static str, arity: u8, func: PrimitiveFn) -> Self {
        Self {
            selector,
            arity,
            func,
        }
    }
}

/// The closure `nil isNil` binds to.
pub fn nil_is_nil(
    _vm: &mut VM,
    _process: &mut Process,
    _receiver: Value,
    _args: &[Value],
) -> Result<Value, RuntimeError> {
    Ok(Value::Boolean(true))
}

pub(crate) fn arg(args: &[Value], idx: usize) -> Result<&Value, RuntimeError> {
    args.get(idx).ok_or(RuntimeError::ArityMismatch {
        expected: idx + 1,
        got: args.len(),
    })
}

pub(crate) fn expect_integer(value: &Value) -> Result<i64, RuntimeError> {
    value
        .as_integer()
        .ok_or_else(|| RuntimeError::type_error("Integer", value))
}

pub(crate) fn expect_boolean(value: &Value) -> Result<bool, RuntimeError> {
    value
        .as_boolean()
        .ok_or_else(|| RuntimeError::type_error("Boolean", value))
}

pub(crate) fn expect_str(value: &Value) -> Result<&str, RuntimeError> {
    value
        .as_str()
        .ok_or_else(|| RuntimeError::type_error("String", value))
}

pub(crate) fn expect_symbol(value: &Value) -> Result<Symbol, RuntimeError> {
    value
        .as_symbol()
        .ok_or_else(|| RuntimeError::type_error("Symbol", value))
}

pub(crate) fn expect_closure(value: &Value) -> Result<&ClosureRef, RuntimeError> {
    value
        .as_closure()
        .ok_or_else(|| RuntimeError::type_error("Closure", value))
}

/// Text shown by `printString`, `print` and `printNl`.
pub(crate) fn print_string(value: &Value) -> String {
    value.to_string()
}

pub(crate) fn print(vm: &VM, receiver: Value, newline: bool) -> Result<Value, RuntimeError> {
    let mut text = print_string(&receiver);
    if newline {
        text.push('\n');
    }
    vm.output.write_str(&text)?;
    Ok(receiver)
}
