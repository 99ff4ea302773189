//! Object model of the runtime: interned symbols, values, prototype
//! objects with fixed-capacity method tables, closures, scopes and the
//! world-versioned variable store.

mod closure;
mod code;
mod error;
mod lookup;
mod method_table;
mod object;
mod scope;
mod special;
mod symbol;
mod value;
mod world;

use std::rc::Rc;

pub use closure::{Closure, InternalClosure, UserClosure};
pub use code::Code;
pub use error::ObjectError;
pub use lookup::bind;
pub use method_table::MethodTable;
pub use object::{Ancestors, InstanceScope, Object, ObjectRef};
pub use scope::{Scope, ScopeRef};
pub use special::SpecialObjects;
pub use symbol::{Symbol, SymbolTable};
pub use value::{Value, ValueKind};
pub use world::{Slot, SlotRef, World, WorldId, WorldRef};

pub type ClosureRef = Rc<Closure>;
