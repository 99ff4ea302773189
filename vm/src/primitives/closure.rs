use object::Value;

use crate::dispatch::call_value;
use crate::exception::catch;
use crate::primitives::{PrimitiveDesc, arg, expect_boolean, expect_closure};
use crate::process::Process;
use crate::{RuntimeError, VM};

/// Selectors bound to the distinguished apply closure, with their arity.
pub const APPLY: &[(&str, usize)] = &[
    ("value", 0),
    ("value:", 1),
    ("value:value:", 2),
    ("value:value:value:", 3),
];

pub const PRIMITIVES: &[PrimitiveDesc] = &[
    PrimitiveDesc::new("on:do:", 2, closure_on_do),
    PrimitiveDesc::new("whileTrue:", 1, closure_while_true),
    PrimitiveDesc::new("world", 0, closure_world),
];

/// `tryBlock on: kinds do: handlerBlock`. `kinds` is a symbol, or nil to
/// catch every exception.
pub fn closure_on_do(
    vm: &mut VM,
    process: &mut Process,
    receiver: Value,
    args: &[Value],
) -> Result<Value, RuntimeError> {
    expect_closure(&receiver)?;
    let kinds = match arg(args, 0)? {
        Value::Nil => Vec::new(),
        Value::Symbol(kind) => vec![*kind],
        other => return Err(RuntimeError::type_error("Symbol", other)),
    };
    catch(vm, process, &receiver, kinds, arg(args, 1)?)
}

pub fn closure_while_true(
    vm: &mut VM,
    process: &mut Process,
    receiver: Value,
    args: &[Value],
) -> Result<Value, RuntimeError> {
    let body = arg(args, 0)?;
    while expect_boolean(&call_value(vm, process, &receiver, Vec::new())?)? {
        call_value(vm, process, body, Vec::new())?;
    }
    Ok(Value::Nil)
}

/// The world the closure was created in. Nil for host closures.
pub fn closure_world(
    _vm: &mut VM,
    _process: &mut Process,
    receiver: Value,
    _args: &[Value],
) -> Result<Value, RuntimeError> {
    Ok(match &**expect_closure(&receiver)? {
        object::Closure::User(user) => Value::World(user.world.clone()),
        _ => Value::Nil,
    })
}
