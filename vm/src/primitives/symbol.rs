use object::Value;

use crate::exception::throw;
use crate::primitives::{PrimitiveDesc, expect_symbol, print, print_string};
use crate::process::Process;
use crate::{RuntimeError, VM};

pub const PRIMITIVES: &[PrimitiveDesc] = &[
    PrimitiveDesc::new("throw", 0, symbol_throw),
    PrimitiveDesc::new("printString", 0, symbol_print_string),
    PrimitiveDesc::new("print", 0, symbol_print),
    PrimitiveDesc::new("printNl", 0, symbol_print_nl),
];

/// Raises the receiver as an exception kind.
pub fn symbol_throw(
    _vm: &mut VM,
    process: &mut Process,
    receiver: Value,
    _args: &[Value],
) -> Result<Value, RuntimeError> {
    let kind = expect_symbol(&receiver)?;
    Err(throw(process, kind))
}

pub fn symbol_print_string(
    _vm: &mut VM,
    _process: &mut Process,
    receiver: Value,
    _args: &[Value],
) -> Result<Value, RuntimeError> {
    expect_symbol(&receiver)?;
    Ok(Value::string(&print_string(&receiver)))
}

pub fn symbol_print(
    vm: &mut VM,
    _process: &mut Process,
    receiver: Value,
    _args: &[Value],
) -> Result<Value, RuntimeError> {
    expect_symbol(&receiver)?;
    print(vm, receiver, false)
}

pub fn symbol_print_nl(
    vm: &mut VM,
    _process: &mut Process,
    receiver: Value,
    _args: &[Value],
) -> Result<Value, RuntimeError> {
    expect_symbol(&receiver)?;
    print(vm, receiver, true)
}
