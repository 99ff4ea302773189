use std::cell::RefCell;
use std::rc::Rc;

use crate::{ClosureRef, MethodTable, ObjectError, Scope, ScopeRef, Symbol, Value, WorldRef};

pub type ObjectRef = Rc<Object>;

/// Pairs a prototype level's template scope with the scope that holds
/// this object's own copy of that level's variables.
#[derive(Clone)]
pub struct InstanceScope {
    pub template: ScopeRef,
    pub scope: ScopeRef,
}

/// A prototype-based object.
///
/// `scopes` has one entry per ancestor level that declared instance
/// variables, nearest first. A prototype's entries point at its own
/// templates; an instance's entries point at private copies.
pub struct Object {
    proto: Option<ObjectRef>,
    methods: RefCell<MethodTable>,
    template: Option<ScopeRef>,
    scopes: Vec<InstanceScope>,
}

impl Object {
    pub fn new(proto: Option<ObjectRef>, method_capacity: usize) -> ObjectRef {
        let scopes = proto.as_ref().map(|p| p.scopes.clone()).unwrap_or_default();
        Rc::new(Self {
            proto,
            methods: RefCell::new(MethodTable::with_capacity(method_capacity)),
            template: None,
            scopes,
        })
    }

    /// A prototype declaring instance variables through `template`.
    pub fn with_template(
        proto: Option<ObjectRef>,
        method_capacity: usize,
        template: ScopeRef,
    ) -> ObjectRef {
        let mut scopes = vec![InstanceScope {
            template: template.clone(),
            scope: template.clone(),
        }];
        if let Some(p) = &proto {
            scopes.extend(p.scopes.iter().cloned());
        }
        Rc::new(Self {
            proto,
            methods: RefCell::new(MethodTable::with_capacity(method_capacity)),
            template: Some(template),
            scopes,
        })
    }

    #[inline]
    pub fn proto(&self) -> Option<&ObjectRef> {
        self.proto.as_ref()
    }

    #[inline]
    pub fn template(&self) -> Option<&ScopeRef> {
        self.template.as_ref()
    }

    pub fn scopes(&self) -> &[InstanceScope] {
        &self.scopes
    }

    /// Iterates `self`, then its prototype, and so on to the root.
    pub fn ancestors(self: &Rc<Self>) -> Ancestors {
        Ancestors {
            next: Some(self.clone()),
        }
    }

    pub fn add_method(&self, selector: Symbol, closure: ClosureRef) -> Result<(), ObjectError> {
        self.methods.borrow_mut().insert(selector, closure)
    }

    /// Method defined directly on this object.
    pub fn method(&self, selector: Symbol) -> Option<ClosureRef> {
        self.methods.borrow().get(selector)
    }

    pub fn method_count(&self) -> usize {
        self.methods.borrow().len()
    }

    /// This object's variable scope for the level whose template is
    /// `template`.
    pub fn instance_scope_for(&self, template: &ScopeRef) -> Option<ScopeRef> {
        self.scopes
            .iter()
            .find(|level| Rc::ptr_eq(&level.template, template))
            .map(|level| level.scope.clone())
    }

    /// A new object delegating to `self`, with a private deep copy of
    /// every instance-variable level, seeded under `world`.
    pub fn new_instance(self: &Rc<Self>, world: &WorldRef) -> ObjectRef {
        let scopes = self
            .scopes
            .iter()
            .map(|level| InstanceScope {
                template: level.template.clone(),
                scope: Scope::copy_of(&level.scope, world),
            })
            .collect();
        Rc::new(Self {
            proto: Some(self.clone()),
            methods: RefCell::new(MethodTable::with_capacity(0)),
            template: None,
            scopes,
        })
    }

    /// Reads instance variable `name` from the nearest level declaring it.
    pub fn instance_variable(&self, name: Symbol, world: &WorldRef) -> Option<Value> {
        self.scopes
            .iter()
            .find(|level| level.scope.has_local(name))
            .and_then(|level| level.scope.lookup(name, world).ok())
    }
}

pub struct Ancestors {
    next: Option<ObjectRef>,
}

impl Iterator for Ancestors {
    type Item = ObjectRef;

    fn next(&mut self) -> Option<ObjectRef> {
        let current = self.next.take()?;
        self.next = current.proto.clone();
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::World;

    fn counter(world: &WorldRef) -> ObjectRef {
        let template = Scope::new(None, None);
        template.declare(Symbol::intern("n"), Value::Integer(0), world);
        Object::with_template(None, 1, template)
    }

    #[test]
    fn ancestors_start_with_self() {
        let a = Object::new(None, 0);
        let b = Object::new(Some(a.clone()), 0);
        let c = Object::new(Some(b.clone()), 0);
        let chain: Vec<ObjectRef> = c.ancestors().collect();
        assert_eq!(chain.len(), 3);
        assert!(Rc::ptr_eq(&chain[0], &c));
        assert!(Rc::ptr_eq(&chain[2], &a));
    }

    #[test]
    fn instances_have_private_variables() {
        let root = World::root();
        let proto = counter(&root);
        let n = Symbol::intern("n");
        let c1 = proto.new_instance(&root);
        let c2 = proto.new_instance(&root);

        let template = proto.template().unwrap().clone();
        let s1 = c1.instance_scope_for(&template).unwrap();
        s1.set(n, Value::Integer(2), &root).unwrap();

        assert_eq!(c1.instance_variable(n, &root), Some(Value::Integer(2)));
        assert_eq!(c2.instance_variable(n, &root), Some(Value::Integer(0)));
        assert_eq!(proto.instance_variable(n, &root), Some(Value::Integer(0)));
        assert!(Rc::ptr_eq(c1.proto().unwrap(), &proto));
    }

    #[test]
    fn every_level_is_copied() {
        let root = World::root();
        let base = counter(&root);
        let derived_template = Scope::new(None, None);
        derived_template.declare(Symbol::intern("m"), Value::Integer(5), &root);
        let derived = Object::with_template(Some(base.clone()), 0, derived_template);
        assert_eq!(derived.scopes().len(), 2);

        let inst = derived.new_instance(&root);
        let base_template = base.template().unwrap().clone();
        let own = inst.instance_scope_for(&base_template).unwrap();
        assert!(!Rc::ptr_eq(&own, &base_template));
        assert_eq!(inst.instance_variable(Symbol::intern("m"), &root), Some(Value::Integer(5)));
    }

    #[test]
    fn instances_made_in_a_branch_carry_world_state() {
        let root = World::root();
        let proto = counter(&root);
        let n = Symbol::intern("n");
        let branch = World::spawn(&root);
        proto
            .instance_scope_for(&proto.template().unwrap().clone())
            .unwrap()
            .set(n, Value::Integer(9), &branch)
            .unwrap();
        let inst = proto.new_instance(&branch);
        assert_eq!(inst.instance_variable(n, &branch), Some(Value::Integer(9)));
        assert_eq!(inst.instance_variable(n, &root), Some(Value::Integer(0)));
    }
}
