use object::{Symbol, Value};

use crate::exception::throw;
use crate::primitives::{PrimitiveDesc, arg, expect_integer, print, print_string};
use crate::process::Process;
use crate::{RuntimeError, VM};

pub const PRIMITIVES: &[PrimitiveDesc] = &[
    PrimitiveDesc::new("+", 1, integer_add),
    PrimitiveDesc::new("-", 1, integer_sub),
    PrimitiveDesc::new("*", 1, integer_mul),
    PrimitiveDesc::new("/", 1, integer_div),
    PrimitiveDesc::new("\\\\", 1, integer_mod),
    PrimitiveDesc::new("<", 1, integer_lt),
    PrimitiveDesc::new(">", 1, integer_gt),
    PrimitiveDesc::new("<=", 1, integer_le),
    PrimitiveDesc::new(">=", 1, integer_ge),
    PrimitiveDesc::new("=", 1, integer_eq),
    PrimitiveDesc::new("printString", 0, integer_print_string),
    PrimitiveDesc::new("print", 0, integer_print),
    PrimitiveDesc::new("printNl", 0, integer_print_nl),
];

fn operands(receiver: &Value, args: &[Value]) -> Result<(i64, i64), RuntimeError> {
    Ok((expect_integer(receiver)?, expect_integer(arg(args, 0)?)?))
}

// Arithmetic wraps on overflow.

pub fn integer_add(
    _vm: &mut VM,
    _process: &mut Process,
    receiver: Value,
    args: &[Value],
) -> Result<Value, RuntimeError> {
    let (a, b) = operands(&receiver, args)?;
    Ok(Value::Integer(a.wrapping_add(b)))
}

pub fn integer_sub(
    _vm: &mut VM,
    _process: &mut Process,
    receiver: Value,
    args: &[Value],
) -> Result<Value, RuntimeError> {
    let (a, b) = operands(&receiver, args)?;
    Ok(Value::Integer(a.wrapping_sub(b)))
}

pub fn integer_mul(
    _vm: &mut VM,
    _process: &mut Process,
    receiver: Value,
    args: &[Value],
) -> Result<Value, RuntimeError> {
    let (a, b) = operands(&receiver, args)?;
    Ok(Value::Integer(a.wrapping_mul(b)))
}

/// Truncating division. Dividing by zero throws `#DivByZero`.
pub fn integer_div(
    _vm: &mut VM,
    process: &mut Process,
    receiver: Value,
    args: &[Value],
) -> Result<Value, RuntimeError> {
    let (a, b) = operands(&receiver, args)?;
    if b == 0 {
        return Err(throw(process, Symbol::intern("DivByZero")));
    }
    Ok(Value::Integer(a.wrapping_div(b)))
}

/// Remainder with the sign of the divisor.
pub fn integer_mod(
    _vm: &mut VM,
    process: &mut Process,
    receiver: Value,
    args: &[Value],
) -> Result<Value, RuntimeError> {
    let (a, b) = operands(&receiver, args)?;
    if b == 0 {
        return Err(throw(process, Symbol::intern("DivByZero")));
    }
    let r = a.wrapping_rem(b);
    Ok(Value::Integer(if r != 0 && (r < 0) != (b < 0) { r.wrapping_add(b) } else { r }))
}

pub fn integer_lt(
    _vm: &mut VM,
    _process: &mut Process,
    receiver: Value,
    args: &[Value],
) -> Result<Value, RuntimeError> {
    let (a, b) = operands(&receiver, args)?;
    Ok(Value::Boolean(a < b))
}

pub fn integer_gt(
    _vm: &mut VM,
    _process: &mut Process,
    receiver: Value,
    args: &[Value],
) -> Result<Value, RuntimeError> {
    let (a, b) = operands(&receiver, args)?;
    Ok(Value::Boolean(a > b))
}

pub fn integer_le(
    _vm: &mut VM,
    _process: &mut Process,
    receiver: Value,
    args: &[Value],
) -> Result<Value, RuntimeError> {
    let (a, b) = operands(&receiver, args)?;
    Ok(Value::Boolean(a <= b))
}

pub fn integer_ge(
    _vm: &mut VM,
    _process: &mut Process,
    receiver: Value,
    args: &[Value],
) -> Result<Value, RuntimeError> {
    let (a, b) = operands(&receiver, args)?;
    Ok(Value::Boolean(a >= b))
}

/// Equality with any value; non-integers are simply unequal.
pub fn integer_eq(
    _vm: &mut VM,
    _process: &mut Process,
    receiver: Value,
    args: &[Value],
) -> Result<Value, RuntimeError> {
    Ok(Value::Boolean(receiver.identical(arg(args, 0)?)))
}

pub fn integer_print_string(
    _vm: &mut VM,
    _process: &mut Process,
    receiver: Value,
    _args: &[Value],
) -> Result<Value, RuntimeError> {
    expect_integer(&receiver)?;
    Ok(Value::string(&print_string(&receiver)))
}

pub fn integer_print(
    vm: &mut VM,
    _process: &mut Process,
    receiver: Value,
    _args: &[Value],
) -> Result<Value, RuntimeError> {
    expect_integer(&receiver)?;
    print(vm, receiver, false)
}

pub fn integer_print_nl(
    vm: &mut VM,
    _process: &mut Process,
    receiver: Value,
    _args: &[Value],
) -> Result<Value, RuntimeError> {
    expect_integer(&receiver)?;
    print(vm, receiver, true)
}
