//! Immutable compiled code objects.
//!
//! Built once by the compiler, then frozen: nothing may append to a proto's
//! instruction list once compilation of its owning function/module has
//! finished.

use crate::bytecode::{FuncIdx, Instr, Slot};
use crate::types::Type;
use crate::value::Value;
use std::rc::Rc;

/// Where a function's upvalue cell comes from when a `Closure` instruction
/// instantiates it: either a direct local of the immediate parent frame, or
/// an upvalue cell the parent itself already holds (transitive capture).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpvarDescriptor {
    pub slot_in_parent: Slot,
    pub is_from_parent: bool,
}

/// A compiled function body: everything a `Closure` instance needs besides
/// its captured upvalue cells.
#[derive(Debug, Clone)]
pub struct FunctionProto {
    pub name: String,
    pub num_locals: usize,
    pub instructions: Vec<Instr>,
    pub constants: Vec<Value>,
    pub upvar_descriptors: Vec<UpvarDescriptor>,
    pub param_types: Vec<Type>,
    pub return_type: Type,
}

/// A compiled module: the root of a compiled program, owning its own
/// top-level instructions plus every function nested anywhere inside it
/// (nesting is flattened into one `functions` list, indexed by `FuncIdx`).
///
/// `instructions` always holds the *entire* module's code, not just the
/// current chunk's — branch targets are absolute indices into it, and a
/// sliced tail would invalidate any `Jump`/`JumpIfFalse` a REPL chunk
/// patches. `entry_point` marks where this proto's own code starts
/// executing: 0 for a whole-program compile, or the prior cumulative
/// instruction count for a REPL chunk appended after earlier ones.
#[derive(Debug, Clone)]
pub struct ModuleProto {
    pub num_locals: usize,
    pub entry_point: usize,
    pub instructions: Vec<Instr>,
    pub constants: Vec<Value>,
    pub functions: Vec<Rc<FunctionProto>>,
}

impl ModuleProto {
    pub fn function(&self, idx: FuncIdx) -> &Rc<FunctionProto> {
        &self.functions[idx as usize]
    }
}
