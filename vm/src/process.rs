use std::rc::Rc;

use log::debug;
use object::{Code, ScopeRef, Symbol, Value, WorldRef};

use crate::RuntimeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Program,
    Block,
    Method,
}

/// One activation on a process's call stack.
pub struct Frame {
    pub scope: ScopeRef,
    pub code: Rc<Code>,
    pub pc: usize,
    /// Height of the shared value stack when the frame was entered.
    pub stack_base: usize,
    pub kind: FrameKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

/// A resumption point installed by `on:do:`.
pub struct Handler {
    pub id: HandlerId,
    /// Exception kinds caught. Empty catches everything.
    pub kinds: Vec<Symbol>,
    /// Scope the handler was installed on, if any frame was active.
    pub scope: Option<ScopeRef>,
    pub depth: usize,
    pub stack_len: usize,
    pub world: WorldRef,
}

impl Handler {
    pub fn catches(&self, kind: Symbol) -> bool {
        self.kinds.is_empty() || self.kinds.contains(&kind)
    }
}

/// One logical thread of bytecode execution.
pub struct Process {
    pub frames: Vec<Frame>,
    pub stack: Vec<Value>,
    /// The active world. Variable reads and writes go through it.
    pub world: WorldRef,
    pub handlers: Vec<Handler>,
    /// Interpreter runs currently nested inside one another.
    pub reentries: usize,
    next_handler: u64,
}

impl Process {
    pub fn new(world: WorldRef, stack_capacity: usize) -> Self {
        Self {
            frames: Vec::new(),
            stack: Vec::with_capacity(stack_capacity),
            world,
            handlers: Vec::new(),
            reentries: 0,
            next_handler: 0,
        }
    }

    /// Number of active frames.
    #[inline]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn current_scope(&self) -> Option<ScopeRef> {
        self.frames.last().map(|frame| frame.scope.clone())
    }

    // ── Scopes ─────────────────────────────────────────────────────

    /// Links `scope` under the current one, binds it to the active world
    /// if it has none yet and makes it current.
    pub fn push_scope(&mut self, scope: ScopeRef, code: Rc<Code>, pc: usize, kind: FrameKind) {
        scope.set_caller(self.frames.last().map(|frame| &frame.scope));
        scope.bind_world(&self.world);
        if let Some(world) = scope.world() {
            self.world = world;
        }
        debug!(
            "push {kind:?} scope at depth {} in world {}",
            self.frames.len() + 1,
            self.world.id()
        );
        self.frames.push(Frame {
            scope,
            code,
            pc,
            stack_base: self.stack.len(),
            kind,
        });
    }

    /// Pops the current scope and restores the active world from the
    /// scope that becomes current.
    pub fn pop_scope(&mut self) -> Option<Frame> {
        let frame = self.frames.pop()?;
        frame.scope.set_caller(None);
        if let Some(world) = self.frames.last().and_then(|top| top.scope.world()) {
            self.world = world;
        }
        debug!("pop {:?} scope, depth now {}", frame.kind, self.frames.len());
        Some(frame)
    }

    /// Ends the current frame: the top of its stack (or nil) is the
    /// result, everything it pushed is discarded.
    pub fn return_from_frame(&mut self) -> Value {
        let Some(base) = self.frames.last().map(|frame| frame.stack_base) else {
            return Value::Nil;
        };
        let value = if self.stack.len() > base {
            self.stack.pop().unwrap_or_default()
        } else {
            Value::Nil
        };
        self.stack.truncate(base);
        self.pop_scope();
        value
    }

    // ── Value stack ────────────────────────────────────────────────

    fn base(&self) -> usize {
        self.frames.last().map_or(0, |frame| frame.stack_base)
    }

    #[inline]
    pub fn push(&mut self, value: Value) {
        self.stack.push(value);
    }

    pub fn pop(&mut self) -> Result<Value, RuntimeError> {
        if self.stack.len() <= self.base() {
            return Err(RuntimeError::StackUnderflow);
        }
        self.stack.pop().ok_or(RuntimeError::StackUnderflow)
    }

    pub fn peek(&self) -> Result<&Value, RuntimeError> {
        if self.stack.len() <= self.base() {
            return Err(RuntimeError::StackUnderflow);
        }
        self.stack.last().ok_or(RuntimeError::StackUnderflow)
    }

    /// Pops the top `n` values, oldest first.
    pub fn pop_n(&mut self, n: usize) -> Result<Vec<Value>, RuntimeError> {
        if self.stack.len() < self.base() + n {
            return Err(RuntimeError::StackUnderflow);
        }
        Ok(self.stack.split_off(self.stack.len() - n))
    }

    // ── Handlers ───────────────────────────────────────────────────

    pub fn install_handler(&mut self, kinds: Vec<Symbol>) -> HandlerId {
        let id = HandlerId(self.next_handler);
        self.next_handler += 1;
        self.handlers.push(Handler {
            id,
            kinds,
            scope: self.current_scope(),
            depth: self.frames.len(),
            stack_len: self.stack.len(),
            world: self.world.clone(),
        });
        id
    }

    pub fn remove_handler(&mut self, id: HandlerId) -> Option<Handler> {
        let pos = self.handlers.iter().rposition(|h| h.id == id)?;
        Some(self.handlers.remove(pos))
    }

    /// Abandons every frame above `depth` without tearing them down.
    pub fn unwind_to(&mut self, depth: usize, stack_len: usize, world: WorldRef) {
        self.frames.truncate(depth);
        self.stack.truncate(stack_len);
        self.world = world;
    }
}

#[cfg(test)]
mod tests {
    use bytecode::ProgramBuilder;
    use object::{Scope, World};

    use super::*;

    fn code() -> Rc<Code> {
        Code::load(ProgramBuilder::new().finish().unwrap()).unwrap()
    }

    #[test]
    fn push_links_caller_and_binds_world() {
        let root = World::root();
        let mut process = Process::new(root.clone(), 8);
        let outer = Scope::new(None, None);
        let inner = Scope::new(None, None);
        process.push_scope(outer.clone(), code(), 0, FrameKind::Program);
        process.push_scope(inner.clone(), code(), 0, FrameKind::Block);

        assert!(Rc::ptr_eq(&inner.caller().unwrap(), &outer));
        assert!(Rc::ptr_eq(&inner.world().unwrap(), &root));
        assert_eq!(process.depth(), 2);

        process.pop_scope();
        assert!(inner.caller().is_none());
        assert_eq!(process.depth(), 1);
    }

    #[test]
    fn pop_restores_world_of_caller() {
        let root = World::root();
        let child = World::spawn(&root);
        let mut process = Process::new(root.clone(), 8);
        process.push_scope(Scope::new(None, None), code(), 0, FrameKind::Program);
        process.world = child.clone();
        process.push_scope(Scope::new(None, None), code(), 0, FrameKind::Block);
        assert_eq!(process.world.id(), child.id());
        process.pop_scope();
        assert_eq!(process.world.id(), root.id());
    }

    #[test]
    fn frames_cannot_pop_below_their_base() {
        let mut process = Process::new(World::root(), 8);
        process.push(Value::Integer(1));
        process.push_scope(Scope::new(None, None), code(), 0, FrameKind::Block);
        assert_eq!(process.pop(), Err(RuntimeError::StackUnderflow));
        process.push(Value::Integer(2));
        process.push(Value::Integer(3));
        assert_eq!(process.pop_n(2).unwrap(), vec![Value::Integer(2), Value::Integer(3)]);
        process.push(Value::Integer(4));
        assert_eq!(process.return_from_frame(), Value::Integer(4));
        assert_eq!(process.stack, vec![Value::Integer(1)]);
    }

    #[test]
    fn handlers_match_kinds() {
        let mut process = Process::new(World::root(), 8);
        let div = Symbol::intern("DivByZero");
        let id = process.install_handler(vec![div]);
        let any = process.install_handler(Vec::new());
        assert!(process.handlers[0].catches(div));
        assert!(!process.handlers[0].catches(Symbol::intern("Other")));
        assert!(process.handlers[1].catches(Symbol::intern("Other")));
        assert!(process.remove_handler(any).is_some());
        assert_eq!(process.remove_handler(id).map(|h| h.id), Some(id));
        assert!(process.handlers.is_empty());
    }
}
