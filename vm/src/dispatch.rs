//! Message sending and closure application.
//!
//! A send either completes immediately (a primitive ran and produced a
//! value) or activates a bytecode closure by pushing its frame, in
//! which case the caller's interpreter loop simply continues with the
//! new frame. Host code and primitives that need the result right away
//! use [`send_value`] / [`call_value`], which re-enter the interpreter.

use log::{info, trace};
use object::{Closure, ClosureRef, Scope, Symbol, UserClosure, Value, WorldRef, bind};

use crate::interpreter;
use crate::process::{FrameKind, Process};
use crate::{RuntimeError, VM};

pub enum Sent {
    Value(Value),
    Activated,
}

pub fn send(
    vm: &mut VM,
    process: &mut Process,
    receiver: Value,
    selector: Symbol,
    args: Vec<Value>,
) -> Result<Sent, RuntimeError> {
    if vm.settings.trace_send.as_deref() == Some(&*selector.name()) {
        info!("send {selector} to {receiver:?} with {args:?} at depth {}", process.depth());
    } else {
        trace!("send {selector} to {receiver:?}");
    }

    match bind(&receiver, selector, &vm.specials) {
        Some(method) => invoke(vm, process, method, receiver, args),
        None => not_understood(vm, process, receiver, selector),
    }
}

fn not_understood(
    vm: &mut VM,
    process: &mut Process,
    receiver: Value,
    selector: Symbol,
) -> Result<Sent, RuntimeError> {
    let dnu = Symbol::intern("doesNotUnderstand:");
    match bind(&receiver, dnu, &vm.specials) {
        Some(handler) => invoke(vm, process, handler, receiver, vec![Value::Symbol(selector)]),
        None => Err(RuntimeError::MessageNotUnderstood {
            receiver: format!("{receiver:?}"),
            selector,
        }),
    }
}

fn invoke(
    vm: &mut VM,
    process: &mut Process,
    method: ClosureRef,
    receiver: Value,
    args: Vec<Value>,
) -> Result<Sent, RuntimeError> {
    if let Closure::Apply { .. } = &*method {
        let Value::Closure(callee) = receiver else {
            return Err(RuntimeError::type_error("Closure", &receiver));
        };
        return apply(vm, process, &callee, None, args);
    }
    apply(vm, process, &method, Some(receiver), args)
}

/// Applies `closure` to `args`. `receiver` is `None` for plain block
/// calls, whose `self` is found lexically.
pub fn apply(
    vm: &mut VM,
    process: &mut Process,
    closure: &ClosureRef,
    receiver: Option<Value>,
    args: Vec<Value>,
) -> Result<Sent, RuntimeError> {
    match &**closure {
        Closure::Internal(prim) => {
            if args.len() != prim.arity {
                return Err(RuntimeError::ArityMismatch {
                    expected: prim.arity,
                    got: args.len(),
                });
            }
            let desc = *vm
                .primitives
                .get(prim.primitive)
                .ok_or(RuntimeError::UnknownPrimitive(prim.primitive))?;
            let value = (desc.func)(vm, process, receiver.unwrap_or_default(), &args)?;
            Ok(Sent::Value(value))
        }
        Closure::User(user) => {
            activate(vm, process, user, receiver, args)?;
            Ok(Sent::Activated)
        }
        Closure::Apply { .. } => match receiver {
            Some(Value::Closure(callee)) => apply(vm, process, &callee, None, args),
            other => Err(RuntimeError::type_error("Closure", &other.unwrap_or_default())),
        },
    }
}

/// Pushes a frame for `closure`.
///
/// For a method the lexical parent is the receiver's own instance scope
/// for the level that declared the method; otherwise it is the scope the
/// closure was created in. Arguments and locals are declared in the new
/// scope under the active world.
fn activate(
    vm: &VM,
    process: &mut Process,
    closure: &UserClosure,
    receiver: Option<Value>,
    args: Vec<Value>,
) -> Result<(), RuntimeError> {
    let code = &closure.code;
    let desc = code.block(closure.block).ok_or_else(|| {
        RuntimeError::MalformedBytecode(format!("block ^{} out of range", closure.block))
    })?;
    if args.len() != desc.params.len() {
        return Err(RuntimeError::ArityMismatch {
            expected: desc.params.len(),
            got: args.len(),
        });
    }
    if process.depth() >= vm.settings.max_depth {
        return Err(RuntimeError::StackOverflow(vm.settings.max_depth));
    }

    let parent = receiver
        .as_ref()
        .and_then(Value::as_object)
        .and_then(|obj| obj.instance_scope_for(&closure.scope))
        .unwrap_or_else(|| closure.scope.clone());
    let kind = if receiver.is_some() {
        FrameKind::Method
    } else {
        FrameKind::Block
    };
    let scope = Scope::new(Some(parent), receiver);
    process.push_scope(scope.clone(), code.clone(), desc.start as usize, kind);

    let world = process.world.clone();
    let missing = |idx: u16| RuntimeError::MalformedBytecode(format!("symbol @{idx} out of range"));
    for (&param, arg) in desc.params.iter().zip(args) {
        scope.declare(code.symbol(param).ok_or_else(|| missing(param))?, arg, &world);
    }
    for &local in &desc.locals {
        scope.declare(code.symbol(local).ok_or_else(|| missing(local))?, Value::Nil, &world);
    }
    Ok(())
}

/// Sends and runs the activated frame, if any, to completion.
pub fn send_value(
    vm: &mut VM,
    process: &mut Process,
    receiver: Value,
    selector: Symbol,
    args: Vec<Value>,
) -> Result<Value, RuntimeError> {
    let depth = process.depth();
    match send(vm, process, receiver, selector, args)? {
        Sent::Value(value) => Ok(value),
        Sent::Activated => run_nested(vm, process, depth),
    }
}

/// Calls the closure `callee` with `args` and returns its result.
pub fn call_value(
    vm: &mut VM,
    process: &mut Process,
    callee: &Value,
    args: Vec<Value>,
) -> Result<Value, RuntimeError> {
    let Value::Closure(closure) = callee else {
        return Err(RuntimeError::type_error("Closure", callee));
    };
    let depth = process.depth();
    match apply(vm, process, closure, None, args)? {
        Sent::Value(value) => Ok(value),
        Sent::Activated => run_nested(vm, process, depth),
    }
}

/// Runs the frames above `depth` in a nested interpreter loop.
///
/// Nested loops live on the native stack, so their count is bounded by
/// `max_reentries` independently of the frame limit.
fn run_nested(vm: &mut VM, process: &mut Process, depth: usize) -> Result<Value, RuntimeError> {
    let limit = vm.settings.max_reentries;
    if process.reentries >= limit {
        return Err(RuntimeError::StackOverflow(limit));
    }
    process.reentries += 1;
    let result = interpreter::run(vm, process, depth);
    process.reentries -= 1;
    result
}

/// Calls `callee` with `world` as the active world, restoring the
/// previous world afterwards whatever the outcome.
pub fn call_in_world(
    vm: &mut VM,
    process: &mut Process,
    world: &WorldRef,
    callee: &Value,
    args: Vec<Value>,
) -> Result<Value, RuntimeError> {
    let saved = std::mem::replace(&mut process.world, world.clone());
    let result = call_value(vm, process, callee, args);
    process.world = saved;
    result
}
