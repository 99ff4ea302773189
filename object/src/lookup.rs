use crate::{ClosureRef, SpecialObjects, Symbol, Value};

/// Resolves `selector` for `receiver`.
///
/// Walks the prototype chain from the receiver (or, for non-object
/// values, from the prototype registered for its kind) and returns the
/// first closure found. Methods are never merged across levels. Nil
/// understands only `isNil`.
pub fn bind(receiver: &Value, selector: Symbol, specials: &SpecialObjects) -> Option<ClosureRef> {
    let Some(start) = specials.proto_of(receiver) else {
        return (selector == specials.is_nil).then(|| specials.nil_is_nil.clone());
    };
    start.ancestors().find_map(|holder| holder.method(selector))
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::{Closure, Object, ObjectRef};

    fn prim(index: usize, name: &'static str) -> ClosureRef {
        Rc::new(Closure::internal(index, 0, name))
    }

    fn specials() -> SpecialObjects {
        let object = Object::new(None, 2);
        object.add_method(Symbol::intern("isNil"), prim(0, "isNil")).unwrap();
        let kind = || Object::new(Some(object.clone()), 1);
        SpecialObjects {
            integer: kind(),
            boolean: kind(),
            string: kind(),
            symbol: kind(),
            closure: kind(),
            world: kind(),
            object,
            nil_is_nil: prim(99, "isNil"),
            is_nil: Symbol::intern("isNil"),
        }
    }

    fn primitive_of(closure: &ClosureRef) -> usize {
        match &**closure {
            Closure::Internal(p) => p.primitive,
            _ => usize::MAX,
        }
    }

    #[test]
    fn nearest_ancestor_wins() {
        let specials = specials();
        let m = Symbol::intern("m");
        let a = Object::new(Some(specials.object.clone()), 1);
        let b = Object::new(Some(a.clone()), 1);
        let c: ObjectRef = Object::new(Some(b.clone()), 0);
        a.add_method(m, prim(1, "a.m")).unwrap();

        let found = bind(&Value::Object(c.clone()), m, &specials).unwrap();
        assert_eq!(primitive_of(&found), 1);

        b.add_method(m, prim(2, "b.m")).unwrap();
        let found = bind(&Value::Object(c), m, &specials).unwrap();
        assert_eq!(primitive_of(&found), 2);
    }

    #[test]
    fn missing_selector_fails() {
        let specials = specials();
        let obj = Object::new(Some(specials.object.clone()), 0);
        assert!(bind(&Value::Object(obj), Symbol::intern("frobnicate"), &specials).is_none());
    }

    #[test]
    fn nil_binds_only_is_nil() {
        let specials = specials();
        let found = bind(&Value::Nil, Symbol::intern("isNil"), &specials).unwrap();
        assert_eq!(primitive_of(&found), 99);
        assert!(bind(&Value::Nil, Symbol::intern("printNl"), &specials).is_none());
    }

    #[test]
    fn immediates_bind_through_kind_prototype() {
        let specials = specials();
        let plus = Symbol::intern("+");
        specials.integer.add_method(plus, prim(5, "+")).unwrap();
        let found = bind(&Value::Integer(1), plus, &specials).unwrap();
        assert_eq!(primitive_of(&found), 5);
        assert!(bind(&Value::Boolean(true), plus, &specials).is_none());
        // inherited from the root object
        let found = bind(&Value::Integer(1), Symbol::intern("isNil"), &specials).unwrap();
        assert_eq!(primitive_of(&found), 0);
    }
}
