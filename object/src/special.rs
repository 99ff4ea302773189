use crate::{ClosureRef, ObjectRef, Symbol, Value, ValueKind};

/// Well-known objects the runtime needs for binding.
///
/// Values that are not objects carry no method table of their own;
/// they bind through the prototype registered here for their kind.
/// Every prototype has `object` as its own prototype.
pub struct SpecialObjects {
    /// The root object. Its prototype is `None`.
    pub object: ObjectRef,
    pub integer: ObjectRef,
    pub boolean: ObjectRef,
    pub string: ObjectRef,
    pub symbol: ObjectRef,
    pub closure: ObjectRef,
    pub world: ObjectRef,

    /// The closure `nil isNil` binds to.
    pub nil_is_nil: ClosureRef,
    pub is_nil: Symbol,
}

impl SpecialObjects {
    /// The object binding starts from for `value`, or `None` for nil.
    pub fn proto_of(&self, value: &Value) -> Option<ObjectRef> {
        let proto = match value.kind() {
            ValueKind::Nil => return None,
            ValueKind::Integer => &self.integer,
            ValueKind::Boolean => &self.boolean,
            ValueKind::String => &self.string,
            ValueKind::Symbol => &self.symbol,
            ValueKind::Closure => &self.closure,
            ValueKind::World => &self.world,
            ValueKind::Object => return value.as_object().cloned(),
        };
        Some(proto.clone())
    }
}
