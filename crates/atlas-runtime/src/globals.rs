//! The global table: an insertion-ordered mapping from name to slot,
//! populated with built-ins before compilation starts. User programs never
//! gain module-wide globals of their own — a top-level `var`/`const`
//! compiles to a module-local the same as any other, so this table only
//! ever holds the built-in registry.

use crate::types::{FunctionSignature, Type};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct GlobalVar {
    pub name: String,
    pub slot: u16,
    pub mutable: bool,
    pub ty: Type,
    pub signature: Option<FunctionSignature>,
}

#[derive(Debug, Clone, Default)]
pub struct GlobalTable {
    entries: Vec<GlobalVar>,
    by_name: HashMap<String, usize>,
}

impl GlobalTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a built-in. Slot equals insertion index.
    pub fn register(&mut self, name: &str, signature: FunctionSignature) -> u16 {
        let slot = self.entries.len() as u16;
        self.by_name.insert(name.to_string(), self.entries.len());
        self.entries.push(GlobalVar {
            name: name.to_string(),
            slot,
            mutable: false,
            ty: Type::NativeFunction,
            signature: Some(signature),
        });
        slot
    }

    pub fn lookup(&self, name: &str) -> Option<&GlobalVar> {
        self.by_name.get(name).map(|&i| &self.entries[i])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GlobalVar> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_equals_insertion_index() {
        let mut table = GlobalTable::new();
        let s0 = table.register(
            "println",
            FunctionSignature {
                param_types: vec![Type::Int],
                return_type: Type::Null,
            },
        );
        let s1 = table.register(
            "append",
            FunctionSignature {
                param_types: vec![Type::array_of(Type::Int), Type::Int],
                return_type: Type::array_of(Type::Int),
            },
        );
        assert_eq!(s0, 0);
        assert_eq!(s1, 1);
        assert_eq!(table.lookup("println").unwrap().slot, 0);
    }
}
