//! Runtime value representation.

use crate::proto::FunctionProto;
use crate::types::{FunctionSignature, Type};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// A one-slot mutable container shared between a defining frame and any
/// closures capturing that name. Aliasing is the entire point: assignment
/// through any alias must be observed by every other alias.
pub type UpvalueCell = Rc<RefCell<Value>>;

pub fn new_cell(value: Value) -> UpvalueCell {
    Rc::new(RefCell::new(value))
}

/// A runtime pairing of a prototype with its captured upvalue cells.
#[derive(Debug, Clone)]
pub struct ClosureObj {
    pub proto: Rc<FunctionProto>,
    pub upvalues: Vec<UpvalueCell>,
}

/// The host-side implementation of a built-in. Holds its own signature so
/// call sites can be checked like any user closure, regardless of which
/// kind of callee it is.
pub struct NativeFunction {
    pub name: String,
    pub signature: FunctionSignature,
    #[allow(clippy::type_complexity)]
    pub func: Box<dyn Fn(&[Value]) -> Result<Value, crate::vm::RuntimeFault>>,
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction").field("name", &self.name).finish()
    }
}

/// A tagged runtime value. Values are held by value;
/// the only shared/mutable state is behind `Rc<RefCell<_>>` in `Array` and
/// in upvalue cells — there is no cyclic garbage collector because nothing
/// in this language can construct a reference cycle (no first-class
/// mutable closures stored inside arrays of the same type, no object
/// graphs).
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Int(i64),
    Bool(bool),
    Closure(Rc<ClosureObj>),
    Native(Rc<NativeFunction>),
    Array(Rc<RefCell<Vec<Value>>>),
}

impl Value {
    pub fn array(values: Vec<Value>) -> Self {
        Value::Array(Rc::new(RefCell::new(values)))
    }

    /// The canonical default value for a static `Type`.
    pub fn default_for(ty: &Type) -> Value {
        match ty {
            Type::Int => Value::Int(0),
            Type::Bool => Value::Bool(false),
            Type::Null => Value::Null,
            Type::Void => Value::Null,
            Type::Array(_) => Value::array(Vec::new()),
            Type::Closure | Type::NativeFunction => Value::Null,
        }
    }

    pub fn type_of(&self) -> Type {
        match self {
            Value::Null => Type::Null,
            Value::Int(_) => Type::Int,
            Value::Bool(_) => Type::Bool,
            Value::Closure(_) => Type::Closure,
            Value::Native(_) => Type::NativeFunction,
            // The static element type is carried by the *declaring* binding,
            // not recoverable from an empty runtime array; callers that need
            // the static type read it off the `Variable`/`Upvar` record
            // instead of this method.
            Value::Array(elems) => {
                let elems = elems.borrow();
                match elems.first() {
                    Some(v) => Type::array_of(v.type_of()),
                    None => Type::array_of(Type::Null),
                }
            }
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Closure(c) => write!(f, "<function {}>", c.proto.name),
            Value::Native(n) => write!(f, "<native {}>", n.name),
            Value::Array(elems) => {
                write!(f, "[")?;
                for (i, v) in elems.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_for_array_is_empty() {
        let v = Value::default_for(&Type::array_of(Type::Int));
        assert_eq!(v.to_string(), "[]");
    }

    #[test]
    fn display_matches_source_literals() {
        assert_eq!(Value::Int(42).to_string(), "42");
        assert_eq!(Value::Bool(true).to_string(), "true");
        assert_eq!(Value::Null.to_string(), "null");
        assert_eq!(Value::array(vec![Value::Int(1), Value::Int(2)]).to_string(), "[1, 2]");
    }
}
