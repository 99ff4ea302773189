use std::rc::Rc;

use log::debug;
use object::{Closure, Object, ObjectRef, Scope, SpecialObjects, Symbol, Value, World};

use crate::primitives::{self, PrimitiveDesc};
use crate::{Output, RuntimeError, VM, VmSettings};

/// Registers `table` and installs each entry on `proto`.
fn install(
    registry: &mut Vec<PrimitiveDesc>,
    proto: &ObjectRef,
    table: &[PrimitiveDesc],
) -> Result<(), RuntimeError> {
    for desc in table {
        let index = registry.len();
        registry.push(*desc);
        let closure = Closure::internal(index, desc.arity as usize, desc.selector);
        proto.add_method(Symbol::intern(desc.selector), Rc::new(closure))?;
    }
    Ok(())
}

/// Builds the prototypes every value binds through, registers the
/// primitive library and creates the global scope.
///
/// Each prototype's method table is sized exactly for the primitives
/// installed on it. The globals `Object` and `World` name the root
/// object and the root world.
pub fn bootstrap(settings: VmSettings, output: Output) -> Result<VM, RuntimeError> {
    let mut registry = Vec::new();

    let object = Object::new(None, primitives::root::PRIMITIVES.len());
    install(&mut registry, &object, primitives::root::PRIMITIVES)?;

    let kind = |table: &[PrimitiveDesc], extra: usize| {
        Object::new(Some(object.clone()), table.len() + extra)
    };
    let integer = kind(primitives::integer::PRIMITIVES, 0);
    let boolean = kind(primitives::boolean::PRIMITIVES, 0);
    let string = kind(primitives::string::PRIMITIVES, 0);
    let symbol = kind(primitives::symbol::PRIMITIVES, 0);
    let closure = kind(primitives::closure::PRIMITIVES, primitives::closure::APPLY.len());
    let world = kind(primitives::world::PRIMITIVES, 0);

    install(&mut registry, &integer, primitives::integer::PRIMITIVES)?;
    install(&mut registry, &boolean, primitives::boolean::PRIMITIVES)?;
    install(&mut registry, &string, primitives::string::PRIMITIVES)?;
    install(&mut registry, &symbol, primitives::symbol::PRIMITIVES)?;
    install(&mut registry, &closure, primitives::closure::PRIMITIVES)?;
    install(&mut registry, &world, primitives::world::PRIMITIVES)?;
    for &(selector, arity) in primitives::closure::APPLY {
        closure.add_method(Symbol::intern(selector), Rc::new(Closure::Apply { arity }))?;
    }

    let nil_is_nil = Rc::new(Closure::internal(registry.len(), 0, "isNil"));
    registry.push(PrimitiveDesc::new("isNil", 0, primitives::nil_is_nil));

    let root_world = World::root();
    let globals = Scope::new(None, None);
    globals.declare(Symbol::intern("Object"), Value::Object(object.clone()), &root_world);
    globals.declare(Symbol::intern("World"), Value::World(root_world.clone()), &root_world);

    debug!("bootstrapped {} primitives", registry.len());

    Ok(VM {
        specials: SpecialObjects {
            object,
            integer,
            boolean,
            string,
            symbol,
            closure,
            world,
            nil_is_nil,
            is_nil: Symbol::intern("isNil"),
        },
        primitives: registry,
        globals,
        root_world,
        settings,
        output,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prototypes_are_filled_to_capacity() {
        let vm = bootstrap(VmSettings::default(), Output::buffer()).unwrap();
        assert_eq!(vm.specials.object.method_count(), primitives::root::PRIMITIVES.len());
        assert_eq!(
            vm.specials.closure.method_count(),
            primitives::closure::PRIMITIVES.len() + primitives::closure::APPLY.len()
        );
        let extra = vm.specials.nil_is_nil.clone();
        assert!(vm.specials.integer.add_method(Symbol::intern("extra"), extra).is_err());
    }

    #[test]
    fn kind_prototypes_inherit_from_object() {
        let vm = bootstrap(VmSettings::default(), Output::buffer()).unwrap();
        for proto in [&vm.specials.integer, &vm.specials.world, &vm.specials.string] {
            assert!(Rc::ptr_eq(proto.proto().unwrap(), &vm.specials.object));
        }
        assert!(vm.specials.object.proto().is_none());
    }

    #[test]
    fn globals_name_root_object_and_world() {
        let vm = bootstrap(VmSettings::default(), Output::buffer()).unwrap();
        assert!(matches!(
            vm.global("Object"),
            Some(Value::Object(o)) if Rc::ptr_eq(&o, &vm.specials.object)
        ));
        assert!(matches!(vm.global("World"), Some(Value::World(w)) if w.is_root()));
        assert_eq!(vm.global("Missing"), None);
    }
}
