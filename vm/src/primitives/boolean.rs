use object::Value;

use crate::dispatch::call_value;
use crate::primitives::{PrimitiveDesc, arg, expect_boolean};
use crate::process::Process;
use crate::{RuntimeError, VM};

pub const PRIMITIVES: &[PrimitiveDesc] = &[
    PrimitiveDesc::new("not", 0, boolean_not),
    PrimitiveDesc::new("&", 1, boolean_and),
    PrimitiveDesc::new("|", 1, boolean_or),
    PrimitiveDesc::new("ifTrue:", 1, boolean_if_true),
    PrimitiveDesc::new("ifFalse:", 1, boolean_if_false),
    PrimitiveDesc::new("ifTrue:ifFalse:", 2, boolean_if_true_if_false),
];

pub fn boolean_not(
    _vm: &mut VM,
    _process: &mut Process,
    receiver: Value,
    _args: &[Value],
) -> Result<Value, RuntimeError> {
    Ok(Value::Boolean(!expect_boolean(&receiver)?))
}

pub fn boolean_and(
    _vm: &mut VM,
    _process: &mut Process,
    receiver: Value,
    args: &[Value],
) -> Result<Value, RuntimeError> {
    let a = expect_boolean(&receiver)?;
    let b = expect_boolean(arg(args, 0)?)?;
    Ok(Value::Boolean(a && b))
}

pub fn boolean_or(
    _vm: &mut VM,
    _process: &mut Process,
    receiver: Value,
    args: &[Value],
) -> Result<Value, RuntimeError> {
    let a = expect_boolean(&receiver)?;
    let b = expect_boolean(arg(args, 0)?)?;
    Ok(Value::Boolean(a || b))
}

pub fn boolean_if_true(
    vm: &mut VM,
    process: &mut Process,
    receiver: Value,
    args: &[Value],
) -> Result<Value, RuntimeError> {
    if expect_boolean(&receiver)? {
        call_value(vm, process, arg(args, 0)?, Vec::new())
    } else {
        Ok(Value::Nil)
    }
}

pub fn boolean_if_false(
    vm: &mut VM,
    process: &mut Process,
    receiver: Value,
    args: &[Value],
) -> Result<Value, RuntimeError> {
    if expect_boolean(&receiver)? {
        Ok(Value::Nil)
    } else {
        call_value(vm, process, arg(args, 0)?, Vec::new())
    }
}

pub fn boolean_if_true_if_false(
    vm: &mut VM,
    process: &mut Process,
    receiver: Value,
    args: &[Value],
) -> Result<Value, RuntimeError> {
    let branch = if expect_boolean(&receiver)? {
        arg(args, 0)?
    } else {
        arg(args, 1)?
    };
    call_value(vm, process, branch, Vec::new())
}
