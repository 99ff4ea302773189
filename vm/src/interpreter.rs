use std::rc::Rc;

use bytecode::{Instruction, decode_at};
use log::trace;
use object::{Closure, Code, Object, ObjectRef, Scope, Symbol, UserClosure, Value};

use crate::dispatch::{self, Sent};
use crate::process::Process;
use crate::{RuntimeError, VM};

fn symbol(code: &Code, idx: u16) -> Result<Symbol, RuntimeError> {
    code.symbol(idx)
        .ok_or_else(|| RuntimeError::MalformedBytecode(format!("symbol @{idx} out of range")))
}

/// Runs `process` until the frame at index `entry` returns, and yields
/// its result. Frames below `entry` belong to an outer run.
pub fn run(vm: &mut VM, process: &mut Process, entry: usize) -> Result<Value, RuntimeError> {
    while process.depth() > entry {
        let (code, instr) = {
            let Some(frame) = process.frames.last_mut() else {
                break;
            };
            let (instr, next_pc) = decode_at(frame.code.bytes(), frame.pc)?;
            frame.pc = next_pc;
            (frame.code.clone(), instr)
        };
        trace!("{instr}");

        match instr {
            Instruction::PushConstant { idx } => {
                let value = code.constant(idx).ok_or_else(|| {
                    RuntimeError::MalformedBytecode(format!("constant #{idx} out of range"))
                })?;
                process.push(value);
            }
            Instruction::PushSmi { value } => process.push(Value::Integer(value as i64)),
            Instruction::PushNil => process.push(Value::Nil),
            Instruction::PushTrue => process.push(Value::Boolean(true)),
            Instruction::PushFalse => process.push(Value::Boolean(false)),
            Instruction::PushSelf => {
                let receiver = current_scope(process)?.receiver();
                process.push(receiver);
            }
            Instruction::PushVariable { symbol: idx } => {
                let name = symbol(&code, idx)?;
                let value = current_scope(process)?.lookup(name, &process.world)?;
                process.push(value);
            }
            Instruction::SetVariable { symbol: idx } => {
                let name = symbol(&code, idx)?;
                let value = process.peek()?.clone();
                current_scope(process)?.set(name, value, &process.world)?;
            }
            Instruction::Pop => {
                process.pop()?;
            }
            Instruction::Send { symbol: idx, argc } => {
                let selector = symbol(&code, idx)?;
                let args = process.pop_n(argc as usize)?;
                let receiver = process.pop()?;
                match dispatch::send(vm, process, receiver, selector, args)? {
                    Sent::Value(value) => process.push(value),
                    Sent::Activated => {}
                }
            }
            Instruction::NewBlock { block } => {
                let closure = new_block(process, &code, block)?;
                process.push(closure);
            }
            Instruction::NewObject { object } => {
                let obj = new_object(vm, process, &code, object)?;
                process.push(Value::Object(obj));
            }
            Instruction::EndBlock | Instruction::EndProgram => {
                let value = process.return_from_frame();
                if process.depth() <= entry {
                    return Ok(value);
                }
                process.push(value);
            }
        }
    }

    Ok(Value::Nil)
}

fn current_scope(process: &Process) -> Result<object::ScopeRef, RuntimeError> {
    process
        .current_scope()
        .ok_or_else(|| RuntimeError::MalformedBytecode("instruction outside of a frame".into()))
}

/// Closes block `block` over the current scope and world.
fn new_block(process: &Process, code: &Rc<Code>, block: u16) -> Result<Value, RuntimeError> {
    let desc = code
        .block(block)
        .ok_or_else(|| RuntimeError::MalformedBytecode(format!("block ^{block} out of range")))?;
    Ok(Value::Closure(Rc::new(Closure::User(UserClosure {
        code: code.clone(),
        block,
        arity: desc.arity(),
        scope: current_scope(process)?,
        world: process.world.clone(),
    }))))
}

/// Builds a prototype from object descriptor `object`.
///
/// Pops the initial values of its instance variables and, beneath them,
/// the prototype (`nil` for the root object). The variables live in a
/// template scope nested in the current scope; every method closes over
/// that template.
fn new_object(
    vm: &VM,
    process: &mut Process,
    code: &Rc<Code>,
    object: u16,
) -> Result<ObjectRef, RuntimeError> {
    let desc = code
        .object(object)
        .ok_or_else(|| RuntimeError::MalformedBytecode(format!("object %{object} out of range")))?;
    let values = process.pop_n(desc.vars.len())?;
    let proto = match process.pop()? {
        Value::Nil => vm.specials.object.clone(),
        Value::Object(proto) => proto,
        other => return Err(RuntimeError::type_error("Object", &other)),
    };

    let template = Scope::new(Some(current_scope(process)?), None);
    for (&var, value) in desc.vars.iter().zip(values) {
        template.declare(symbol(code, var)?, value, &process.world);
    }

    let obj = Object::with_template(Some(proto), desc.methods.len(), template.clone());
    for method in &desc.methods {
        let body = code.block(method.block).ok_or_else(|| {
            RuntimeError::MalformedBytecode(format!("method body ^{} out of range", method.block))
        })?;
        let closure = Closure::User(UserClosure {
            code: code.clone(),
            block: method.block,
            arity: body.arity(),
            scope: template.clone(),
            world: process.world.clone(),
        });
        obj.add_method(symbol(code, method.selector)?, Rc::new(closure))?;
    }
    Ok(obj)
}
