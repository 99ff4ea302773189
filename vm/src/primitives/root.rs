//! Methods of the root object, inherited by every value except nil.

use object::{Value, bind};

use crate::exception::throw;
use crate::primitives::{PrimitiveDesc, arg, expect_symbol, print, print_string};
use crate::process::Process;
use crate::{RuntimeError, VM};

pub const PRIMITIVES: &[PrimitiveDesc] = &[
    PrimitiveDesc::new("isNil", 0, object_is_nil),
    PrimitiveDesc::new("new", 0, object_new),
    PrimitiveDesc::new("==", 1, object_identical),
    PrimitiveDesc::new("=", 1, object_identical),
    PrimitiveDesc::new("print", 0, object_print),
    PrimitiveDesc::new("printNl", 0, object_print_nl),
    PrimitiveDesc::new("printString", 0, object_print_string),
    PrimitiveDesc::new("respondsTo:", 1, object_responds_to),
    PrimitiveDesc::new("throw:", 1, object_throw),
    PrimitiveDesc::new("thisWorld", 0, object_this_world),
    PrimitiveDesc::new("proto", 0, object_proto),
    PrimitiveDesc::new("callDepth", 0, object_call_depth),
];

pub fn object_is_nil(
    _vm: &mut VM,
    _process: &mut Process,
    _receiver: Value,
    _args: &[Value],
) -> Result<Value, RuntimeError> {
    Ok(Value::Boolean(false))
}

/// A new instance with private copies of every instance-variable level.
pub fn object_new(
    _vm: &mut VM,
    process: &mut Process,
    receiver: Value,
    _args: &[Value],
) -> Result<Value, RuntimeError> {
    let Value::Object(proto) = &receiver else {
        return Err(RuntimeError::type_error("Object", &receiver));
    };
    Ok(Value::Object(proto.new_instance(&process.world)))
}

pub fn object_identical(
    _vm: &mut VM,
    _process: &mut Process,
    receiver: Value,
    args: &[Value],
) -> Result<Value, RuntimeError> {
    Ok(Value::Boolean(receiver.identical(arg(args, 0)?)))
}

pub fn object_print(
    vm: &mut VM,
    _process: &mut Process,
    receiver: Value,
    _args: &[Value],
) -> Result<Value, RuntimeError> {
    print(vm, receiver, false)
}

pub fn object_print_nl(
    vm: &mut VM,
    _process: &mut Process,
    receiver: Value,
    _args: &[Value],
) -> Result<Value, RuntimeError> {
    print(vm, receiver, true)
}

pub fn object_print_string(
    _vm: &mut VM,
    _process: &mut Process,
    receiver: Value,
    _args: &[Value],
) -> Result<Value, RuntimeError> {
    Ok(Value::string(&print_string(&receiver)))
}

pub fn object_responds_to(
    vm: &mut VM,
    _process: &mut Process,
    receiver: Value,
    args: &[Value],
) -> Result<Value, RuntimeError> {
    let selector = expect_symbol(arg(args, 0)?)?;
    Ok(Value::Boolean(bind(&receiver, selector, &vm.specials).is_some()))
}

pub fn object_throw(
    _vm: &mut VM,
    process: &mut Process,
    _receiver: Value,
    args: &[Value],
) -> Result<Value, RuntimeError> {
    let kind = expect_symbol(arg(args, 0)?)?;
    Err(throw(process, kind))
}

pub fn object_this_world(
    _vm: &mut VM,
    process: &mut Process,
    _receiver: Value,
    _args: &[Value],
) -> Result<Value, RuntimeError> {
    Ok(Value::World(process.world.clone()))
}

pub fn object_proto(
    _vm: &mut VM,
    _process: &mut Process,
    receiver: Value,
    _args: &[Value],
) -> Result<Value, RuntimeError> {
    Ok(match &receiver {
        Value::Object(obj) => obj.proto().cloned().map_or(Value::Nil, Value::Object),
        _ => Value::Nil,
    })
}

pub fn object_call_depth(
    _vm: &mut VM,
    process: &mut Process,
    _receiver: Value,
    _args: &[Value],
) -> Result<Value, RuntimeError> {
    Ok(Value::Integer(process.depth() as i64))
}
