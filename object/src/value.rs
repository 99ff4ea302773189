use std::fmt;
use std::rc::Rc;

use crate::{ClosureRef, ObjectRef, Symbol, WorldRef};

/// A runtime value.
///
/// Integers, booleans and symbols are immediates. Strings are shared
/// immutable text. Closures, worlds and objects are shared by reference;
/// cloning a `Value` never copies the referent.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Nil,
    Integer(i64),
    Boolean(bool),
    String(Rc<str>),
    Symbol(Symbol),
    Closure(ClosureRef),
    World(WorldRef),
    Object(ObjectRef),
}

/// Discriminant of a [`Value`], used to pick the prototype that
/// non-object values bind their messages through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Nil,
    Integer,
    Boolean,
    String,
    Symbol,
    Closure,
    World,
    Object,
}

impl Value {
    pub fn string(text: &str) -> Value {
        Value::String(Rc::from(text))
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Nil => ValueKind::Nil,
            Value::Integer(_) => ValueKind::Integer,
            Value::Boolean(_) => ValueKind::Boolean,
            Value::String(_) => ValueKind::String,
            Value::Symbol(_) => ValueKind::Symbol,
            Value::Closure(_) => ValueKind::Closure,
            Value::World(_) => ValueKind::World,
            Value::Object(_) => ValueKind::Object,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self.kind() {
            ValueKind::Nil => "nil",
            ValueKind::Integer => "Integer",
            ValueKind::Boolean => "Boolean",
            ValueKind::String => "String",
            ValueKind::Symbol => "Symbol",
            ValueKind::Closure => "Closure",
            ValueKind::World => "World",
            ValueKind::Object => "Object",
        }
    }

    /// Identity comparison: immediates by value, strings by content,
    /// everything else by reference.
    pub fn identical(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::Closure(a), Value::Closure(b)) => Rc::ptr_eq(a, b),
            (Value::World(a), Value::World(b)) => Rc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    #[inline]
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    #[inline]
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    #[inline]
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_symbol(&self) -> Option<Symbol> {
        match self {
            Value::Symbol(s) => Some(*s),
            _ => None,
        }
    }

    pub fn as_closure(&self) -> Option<&ClosureRef> {
        match self {
            Value::Closure(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_world(&self) -> Option<&WorldRef> {
        match self {
            Value::World(w) => Some(w),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.identical(other)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<Symbol> for Value {
    fn from(s: Symbol) -> Self {
        Value::Symbol(s)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => f.write_str("nil"),
            Value::Integer(n) => write!(f, "{n}"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::String(s) => f.write_str(s),
            Value::Symbol(s) => write!(f, "#{s}"),
            Value::Closure(_) => f.write_str("a Closure"),
            Value::World(_) => f.write_str("a World"),
            Value::Object(_) => f.write_str("an Object"),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{s:?}"),
            Value::Closure(c) => write!(f, "<closure/{}>", c.arity()),
            Value::World(w) => write!(f, "<world {}>", w.id()),
            Value::Object(o) => write!(f, "<object {:p}>", Rc::as_ptr(o)),
            other => write!(f, "{other}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn immediates_compare_by_value() {
        assert!(Value::Integer(3).identical(&Value::Integer(3)));
        assert!(!Value::Integer(3).identical(&Value::Boolean(true)));
        assert!(Value::Nil.identical(&Value::Nil));
        assert!(Value::string("abc").identical(&Value::string("abc")));
    }

    #[test]
    fn display() {
        assert_eq!(Value::Nil.to_string(), "nil");
        assert_eq!(Value::Integer(-7).to_string(), "-7");
        assert_eq!(Value::from(true).to_string(), "true");
        assert_eq!(Value::string("hi").to_string(), "hi");
        assert_eq!(Value::Symbol(Symbol::intern("DivByZero")).to_string(), "#DivByZero");
    }
}
