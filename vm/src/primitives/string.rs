use object::Value;

use crate::primitives::{PrimitiveDesc, arg, expect_str, print};
use crate::process::Process;
use crate::{RuntimeError, VM};

pub const PRIMITIVES: &[PrimitiveDesc] = &[
    PrimitiveDesc::new("size", 0, string_size),
    PrimitiveDesc::new(",", 1, string_concat),
    PrimitiveDesc::new("print", 0, string_print),
    PrimitiveDesc::new("printNl", 0, string_print_nl),
    PrimitiveDesc::new("=", 1, string_eq),
];

/// Length in characters.
pub fn string_size(
    _vm: &mut VM,
    _process: &mut Process,
    receiver: Value,
    _args: &[Value],
) -> Result<Value, RuntimeError> {
    Ok(Value::Integer(expect_str(&receiver)?.chars().count() as i64))
}

pub fn string_concat(
    _vm: &mut VM,
    _process: &mut Process,
    receiver: Value,
    args: &[Value],
) -> Result<Value, RuntimeError> {
    let mut text = expect_str(&receiver)?.to_owned();
    text.push_str(expect_str(arg(args, 0)?)?);
    Ok(Value::string(&text))
}

pub fn string_print(
    vm: &mut VM,
    _process: &mut Process,
    receiver: Value,
    _args: &[Value],
) -> Result<Value, RuntimeError> {
    expect_str(&receiver)?;
    print(vm, receiver, false)
}

pub fn string_print_nl(
    vm: &mut VM,
    _process: &mut Process,
    receiver: Value,
    _args: &[Value],
) -> Result<Value, RuntimeError> {
    expect_str(&receiver)?;
    print(vm, receiver, true)
}

pub fn string_eq(
    _vm: &mut VM,
    _process: &mut Process,
    receiver: Value,
    args: &[Value],
) -> Result<Value, RuntimeError> {
    let text = expect_str(&receiver)?;
    Ok(Value::Boolean(arg(args, 0)?.as_str() == Some(text)))
}
