//! Non-local exit along the dynamic call chain.
//!
//! `on:do:` installs a [`Handler`](crate::process::Handler) on the
//! current scope before running the protected block. [`throw`] walks the
//! caller chain from the current scope looking for a scope with a
//! matching handler and returns a [`RuntimeError::Thrown`] addressed to
//! it, which propagates through every Rust frame in between. [`catch`]
//! recognizes its own handler, abandons the intervening frames in one
//! step and runs the handler block.

use std::rc::Rc;

use log::debug;
use object::{Symbol, Value};

use crate::dispatch::call_value;
use crate::process::Process;
use crate::{RuntimeError, VM};

pub fn catch(
    vm: &mut VM,
    process: &mut Process,
    try_block: &Value,
    kinds: Vec<Symbol>,
    handler_block: &Value,
) -> Result<Value, RuntimeError> {
    let id = process.install_handler(kinds);
    let result = call_value(vm, process, try_block, Vec::new());
    let installed = process.remove_handler(id);

    match result {
        Err(RuntimeError::Thrown { kind, handler }) if handler == id => {
            let Some(installed) = installed else {
                return Err(RuntimeError::UnhandledException { kind });
            };
            process.unwind_to(installed.depth, installed.stack_len, installed.world);
            debug!("caught #{kind} at depth {}", process.depth());
            let takes_kind = handler_block.as_closure().is_some_and(|c| c.arity() == 1);
            let args = if takes_kind {
                vec![Value::Symbol(kind)]
            } else {
                Vec::new()
            };
            call_value(vm, process, handler_block, args)
        }
        other => other,
    }
}

/// Finds the nearest handler for `kind` along the caller chain.
///
/// Returns the error to propagate: `Thrown` addressed to that handler, or
/// `UnhandledException` when the chain is exhausted.
pub fn throw(process: &Process, kind: Symbol) -> RuntimeError {
    let mut scope = process.current_scope();
    let mut depth = process.depth();
    while let Some(current) = scope {
        let found = process.handlers.iter().rev().find(|h| {
            h.catches(kind) && h.scope.as_ref().is_some_and(|s| Rc::ptr_eq(s, &current))
        });
        if let Some(handler) = found {
            debug!("throw #{kind}: handler {:?} at depth {depth}", handler.id);
            return RuntimeError::Thrown {
                kind,
                handler: handler.id,
            };
        }
        scope = current.caller();
        depth = depth.saturating_sub(1);
    }

    // Handlers installed by the host outside of any frame.
    match process
        .handlers
        .iter()
        .rev()
        .find(|h| h.scope.is_none() && h.catches(kind))
    {
        Some(handler) => RuntimeError::Thrown {
            kind,
            handler: handler.id,
        },
        None => RuntimeError::UnhandledException { kind },
    }
}
