use std::cell::RefCell;
use std::rc::{Rc, Weak};

use ahash::AHashMap;
use log::warn;

use crate::{ObjectError, Slot, SlotRef, Symbol, Value, WorldRef};

pub type ScopeRef = Rc<Scope>;

/// An activation record and variable table.
///
/// `containing` is the lexical parent, fixed when the scope is created
/// and used for variable resolution. `caller` is the dynamic parent,
/// set while the scope is on a process's call stack; it is a weak
/// back-reference and never keeps the caller alive.
pub struct Scope {
    variables: RefCell<AHashMap<Symbol, SlotRef>>,
    containing: Option<ScopeRef>,
    caller: RefCell<Weak<Scope>>,
    world: RefCell<Option<WorldRef>>,
    receiver: Option<Value>,
}

impl Scope {
    pub fn new(containing: Option<ScopeRef>, receiver: Option<Value>) -> ScopeRef {
        Rc::new(Self {
            variables: RefCell::new(AHashMap::new()),
            containing,
            caller: RefCell::new(Weak::new()),
            world: RefCell::new(None),
            receiver,
        })
    }

    /// A fresh scope whose variables are deep copies of `template`'s:
    /// each slot's world map is copied, then the value visible from
    /// `world` is written under `world`.
    pub fn copy_of(template: &Scope, world: &WorldRef) -> ScopeRef {
        let variables = template
            .variables
            .borrow()
            .iter()
            .map(|(name, slot)| {
                let copy = Slot::copy_of(slot);
                if let Some(value) = world.peek(slot) {
                    world.write(&copy, value);
                }
                (*name, copy)
            })
            .collect();
        Rc::new(Self {
            variables: RefCell::new(variables),
            containing: template.containing.clone(),
            caller: RefCell::new(Weak::new()),
            world: RefCell::new(None),
            receiver: None,
        })
    }

    #[inline]
    pub fn containing(&self) -> Option<&ScopeRef> {
        self.containing.as_ref()
    }

    pub fn caller(&self) -> Option<ScopeRef> {
        self.caller.borrow().upgrade()
    }

    pub fn set_caller(&self, caller: Option<&ScopeRef>) {
        *self.caller.borrow_mut() = caller.map(Rc::downgrade).unwrap_or_default();
    }

    pub fn world(&self) -> Option<WorldRef> {
        self.world.borrow().clone()
    }

    /// Binds the owning world unless one is already set.
    pub fn bind_world(&self, world: &WorldRef) {
        let mut slot = self.world.borrow_mut();
        if slot.is_none() {
            *slot = Some(world.clone());
        }
    }

    /// `self` of the innermost enclosing method activation.
    pub fn receiver(&self) -> Value {
        let mut scope = Some(self);
        while let Some(s) = scope {
            if let Some(receiver) = &s.receiver {
                return receiver.clone();
            }
            scope = s.containing.as_deref();
        }
        Value::Nil
    }

    pub fn has_local(&self, name: Symbol) -> bool {
        self.variables.borrow().contains_key(&name)
    }

    /// Creates `name` in this scope with `value` written under `world`.
    /// Redeclaring replaces the slot.
    pub fn declare(&self, name: Symbol, value: Value, world: &WorldRef) {
        let slot = Slot::new();
        world.write(&slot, value);
        self.variables.borrow_mut().insert(name, slot);
    }

    /// Finds the slot for `name` along the lexical chain.
    pub fn resolve(&self, name: Symbol) -> Result<SlotRef, ObjectError> {
        let mut scope = Some(self);
        while let Some(s) = scope {
            if let Some(slot) = s.variables.borrow().get(&name) {
                return Ok(slot.clone());
            }
            scope = s.containing.as_deref();
        }
        Err(ObjectError::UnresolvedVariable(name))
    }

    /// Reads `name` as seen from `world`. A declared variable with no
    /// value visible from `world` reads as nil.
    pub fn lookup(&self, name: Symbol, world: &WorldRef) -> Result<Value, ObjectError> {
        let slot = self.resolve(name)?;
        Ok(world.read(&slot).unwrap_or_else(|| {
            warn!("variable {name} has no value in world {}", world.id());
            Value::Nil
        }))
    }

    pub fn set(&self, name: Symbol, value: Value, world: &WorldRef) -> Result<(), ObjectError> {
        let slot = self.resolve(name)?;
        world.write(&slot, value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::World;

    #[test]
    fn lookup_walks_containing_chain() {
        let root = World::root();
        let outer = Scope::new(None, None);
        outer.declare(Symbol::intern("x"), Value::Integer(1), &root);
        let inner = Scope::new(Some(outer.clone()), None);
        inner.declare(Symbol::intern("y"), Value::Integer(2), &root);

        assert_eq!(inner.lookup(Symbol::intern("x"), &root), Ok(Value::Integer(1)));
        assert_eq!(inner.lookup(Symbol::intern("y"), &root), Ok(Value::Integer(2)));
        assert_eq!(
            outer.lookup(Symbol::intern("y"), &root),
            Err(ObjectError::UnresolvedVariable(Symbol::intern("y")))
        );
    }

    #[test]
    fn set_writes_declaring_scope() {
        let root = World::root();
        let outer = Scope::new(None, None);
        let x = Symbol::intern("x");
        outer.declare(x, Value::Integer(1), &root);
        let inner = Scope::new(Some(outer.clone()), None);
        inner.set(x, Value::Integer(5), &root).unwrap();
        assert_eq!(outer.lookup(x, &root), Ok(Value::Integer(5)));
        assert!(inner.set(Symbol::intern("nowhere"), Value::Nil, &root).is_err());
    }

    #[test]
    fn same_scope_different_worlds() {
        let root = World::root();
        let scope = Scope::new(None, None);
        let x = Symbol::intern("x");
        scope.declare(x, Value::Integer(1), &root);
        let w1 = World::spawn(&root);
        scope.set(x, Value::Integer(2), &w1).unwrap();
        assert_eq!(scope.lookup(x, &root), Ok(Value::Integer(1)));
        assert_eq!(scope.lookup(x, &w1), Ok(Value::Integer(2)));
    }

    #[test]
    fn variable_declared_in_child_world_reads_nil_elsewhere() {
        let root = World::root();
        let w1 = World::spawn(&root);
        let scope = Scope::new(None, None);
        let t = Symbol::intern("t");
        scope.declare(t, Value::Integer(3), &w1);
        assert_eq!(scope.lookup(t, &root), Ok(Value::Nil));
    }

    #[test]
    fn receiver_comes_from_nearest_method_scope() {
        let method = Scope::new(None, Some(Value::Integer(42)));
        let block = Scope::new(Some(method), None);
        assert_eq!(block.receiver(), Value::Integer(42));
        assert_eq!(Scope::new(None, None).receiver(), Value::Nil);
    }

    #[test]
    fn caller_is_weak() {
        let a = Scope::new(None, None);
        let b = Scope::new(None, None);
        b.set_caller(Some(&a));
        assert!(b.caller().is_some());
        drop(a);
        assert!(b.caller().is_none());
    }

    #[test]
    fn copies_are_independent() {
        let root = World::root();
        let template = Scope::new(None, None);
        let n = Symbol::intern("n");
        template.declare(n, Value::Integer(0), &root);
        let a = Scope::copy_of(&template, &root);
        let b = Scope::copy_of(&template, &root);
        a.set(n, Value::Integer(7), &root).unwrap();
        assert_eq!(a.lookup(n, &root), Ok(Value::Integer(7)));
        assert_eq!(b.lookup(n, &root), Ok(Value::Integer(0)));
        assert_eq!(template.lookup(n, &root), Ok(Value::Integer(0)));
    }
}
