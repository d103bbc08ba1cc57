//! Built-in registration, run before compilation starts. Two tables must
//! always agree: the `GlobalTable` the
//! compiler type-checks calls against, and the `Value::Native` vector the VM
//! actually invokes — both are built here, in the same order, so their
//! slots never drift apart.

use crate::globals::GlobalTable;
use crate::types::{FunctionSignature, Type};
use crate::value::{NativeFunction, Value};
use crate::vm::RuntimeFault;
use std::rc::Rc;
use tracing::info;

/// Populate a fresh `GlobalTable` with every built-in's signature, in
/// registration order. The compiler calls this once per compile.
pub fn register_builtins() -> GlobalTable {
    let mut table = GlobalTable::new();
    table.register(
        "println",
        FunctionSignature { param_types: vec![Type::Int], return_type: Type::Null },
    );
    table.register(
        "append",
        FunctionSignature {
            param_types: vec![Type::array_of(Type::Int), Type::Int],
            return_type: Type::array_of(Type::Int),
        },
    );
    table
}

/// Build the runtime `Value::Native` handles in the same slot order as
/// `register_builtins`, ready to seed `Vm::globals`.
pub fn native_values() -> Vec<Value> {
    vec![
        Value::Native(Rc::new(NativeFunction {
            name: "println".to_string(),
            signature: FunctionSignature { param_types: vec![Type::Int], return_type: Type::Null },
            func: Box::new(println_impl),
        })),
        Value::Native(Rc::new(NativeFunction {
            name: "append".to_string(),
            signature: FunctionSignature {
                param_types: vec![Type::array_of(Type::Int), Type::Int],
                return_type: Type::array_of(Type::Int),
            },
            func: Box::new(append_impl),
        })),
    ]
}

fn println_impl(args: &[Value]) -> Result<Value, RuntimeFault> {
    let n = args[0].as_int().expect("compiler checked arity/types");
    info!(value = n, "println");
    println!("{n}");
    Ok(Value::Null)
}

fn append_impl(args: &[Value]) -> Result<Value, RuntimeFault> {
    let Value::Array(elems) = &args[0] else {
        panic!("compiler checked arity/types")
    };
    let elem = args[1].clone();
    let mut next = elems.borrow().clone();
    next.push(elem);
    Ok(Value::array(next))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn println_returns_null() {
        assert!(matches!(println_impl(&[Value::Int(5)]), Ok(Value::Null)));
    }

    #[test]
    fn append_does_not_mutate_the_source_array() {
        let original = Value::array(vec![Value::Int(1), Value::Int(2)]);
        let result = append_impl(&[original.clone(), Value::Int(3)]).unwrap();
        assert_eq!(original.to_string(), "[1, 2]");
        assert_eq!(result.to_string(), "[1, 2, 3]");
    }

    #[test]
    fn global_table_and_native_values_share_slot_order() {
        let table = register_builtins();
        let natives = native_values();
        assert_eq!(table.len(), natives.len());
        assert_eq!(table.lookup("println").unwrap().slot, 0);
        assert_eq!(table.lookup("append").unwrap().slot, 1);
    }
}
