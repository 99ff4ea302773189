use object::{Value, World, WorldRef};

use crate::dispatch::call_in_world;
use crate::primitives::{PrimitiveDesc, arg};
use crate::process::Process;
use crate::{RuntimeError, VM};

pub const PRIMITIVES: &[PrimitiveDesc] = &[
    PrimitiveDesc::new("sprout", 0, world_sprout),
    PrimitiveDesc::new("eval:", 1, world_eval),
    PrimitiveDesc::new("commit", 0, world_commit),
    PrimitiveDesc::new("revert", 0, world_revert),
    PrimitiveDesc::new("parent", 0, world_parent),
    PrimitiveDesc::new("isRoot", 0, world_is_root),
];

fn expect_world(value: &Value) -> Result<&WorldRef, RuntimeError> {
    value
        .as_world()
        .ok_or_else(|| RuntimeError::type_error("World", value))
}

pub fn world_sprout(
    _vm: &mut VM,
    _process: &mut Process,
    receiver: Value,
    _args: &[Value],
) -> Result<Value, RuntimeError> {
    Ok(Value::World(World::spawn(expect_world(&receiver)?)))
}

/// Runs a block with the receiver as the active world.
pub fn world_eval(
    vm: &mut VM,
    process: &mut Process,
    receiver: Value,
    args: &[Value],
) -> Result<Value, RuntimeError> {
    let world = expect_world(&receiver)?.clone();
    call_in_world(vm, process, &world, arg(args, 0)?, Vec::new())
}

/// Answers whether the merge succeeded. Committing the root world is
/// fatal.
pub fn world_commit(
    _vm: &mut VM,
    _process: &mut Process,
    receiver: Value,
    _args: &[Value],
) -> Result<Value, RuntimeError> {
    Ok(Value::Boolean(expect_world(&receiver)?.commit()?))
}

pub fn world_revert(
    _vm: &mut VM,
    _process: &mut Process,
    receiver: Value,
    _args: &[Value],
) -> Result<Value, RuntimeError> {
    expect_world(&receiver)?.revert();
    Ok(receiver)
}

pub fn world_parent(
    _vm: &mut VM,
    _process: &mut Process,
    receiver: Value,
    _args: &[Value],
) -> Result<Value, RuntimeError> {
    Ok(expect_world(&receiver)?
        .parent()
        .cloned()
        .map_or(Value::Nil, Value::World))
}

pub fn world_is_root(
    _vm: &mut VM,
    _process: &mut Process,
    receiver: Value,
    _args: &[Value],
) -> Result<Value, RuntimeError> {
    Ok(Value::Boolean(expect_world(&receiver)?.is_root()))
}
