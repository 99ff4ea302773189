use std::rc::Rc;

use crate::{Code, ScopeRef, WorldRef};

/// A host-implemented closure: an index into the VM's primitive table.
#[derive(Debug, Clone)]
pub struct InternalClosure {
    pub primitive: usize,
    pub arity: usize,
    pub name: &'static str,
}

/// A bytecode closure. It always knows the scope it was created in,
/// independent of who calls it.
#[derive(Clone)]
pub struct UserClosure {
    pub code: Rc<Code>,
    pub block: u16,
    pub arity: usize,
    pub scope: ScopeRef,
    pub world: WorldRef,
}

#[derive(Clone)]
pub enum Closure {
    Internal(InternalClosure),
    User(UserClosure),
    /// The distinguished apply primitive: the receiver is itself the
    /// callable and the remaining arguments are passed to it.
    Apply { arity: usize },
}

impl Closure {
    pub fn internal(primitive: usize, arity: usize, name: &'static str) -> Self {
        Closure::Internal(InternalClosure {
            primitive,
            arity,
            name,
        })
    }

    pub fn arity(&self) -> usize {
        match self {
            Closure::Internal(p) => p.arity,
            Closure::User(u) => u.arity,
            Closure::Apply { arity } => *arity,
        }
    }
}
