//! Per-call activation records.

use crate::bytecode::{ConstIdx, Instr, Reg, Slot};
use crate::proto::ModuleProto;
use crate::value::{new_cell, ClosureObj, UpvalueCell, Value};
use std::rc::Rc;

/// A local starts life as a plain value and is promoted to a shared cell the
/// first time a nested closure captures it directly — once promoted, every
/// later `LOAD_VAR`/`STORE_VAR` against the same slot reads/writes through
/// the same cell so the defining frame and its closures stay aliased.
enum LocalSlot {
    Plain(Value),
    Captured(UpvalueCell),
}

enum FrameRoot {
    Module(Rc<ModuleProto>),
    Function(Rc<ClosureObj>),
}

pub struct Frame {
    root: FrameRoot,
    locals: Vec<LocalSlot>,
    registers: Vec<Value>,
    pub pc: usize,
}

impl Frame {
    pub fn for_module(module: Rc<ModuleProto>) -> Self {
        let num_locals = module.num_locals;
        let pc = module.entry_point;
        Self {
            root: FrameRoot::Module(module),
            locals: (0..num_locals).map(|_| LocalSlot::Plain(Value::Null)).collect(),
            registers: Vec::new(),
            pc,
        }
    }

    pub fn for_function(closure: Rc<ClosureObj>) -> Self {
        let num_locals = closure.proto.num_locals;
        Self {
            root: FrameRoot::Function(closure),
            locals: (0..num_locals).map(|_| LocalSlot::Plain(Value::Null)).collect(),
            registers: Vec::new(),
            pc: 0,
        }
    }

    /// Rebind this frame to a freshly-compiled REPL chunk's module, keeping
    /// every existing local (growing the vector if the chunk declared new
    /// ones) and resetting `pc` to the start of the chunk's own instruction
    /// segment.
    pub fn reset_for_chunk(&mut self, module: Rc<ModuleProto>) {
        if module.num_locals > self.locals.len() {
            self.locals.resize_with(module.num_locals, || LocalSlot::Plain(Value::Null));
        }
        let pc = module.entry_point;
        self.root = FrameRoot::Module(module);
        self.pc = pc;
    }

    fn instructions(&self) -> &[Instr] {
        match &self.root {
            FrameRoot::Module(m) => &m.instructions,
            FrameRoot::Function(c) => &c.proto.instructions,
        }
    }

    pub fn constant(&self, k: ConstIdx) -> &Value {
        match &self.root {
            FrameRoot::Module(m) => &m.constants[k as usize],
            FrameRoot::Function(c) => &c.proto.constants[k as usize],
        }
    }

    /// The upvalue cell at `slot` in the currently-executing closure. Panics
    /// if the active frame is the module root — the compiler never emits
    /// `LOAD_UPVAR`/`ASSIGN_UPVAR` at module scope.
    pub fn upvalue(&self, slot: Slot) -> &UpvalueCell {
        match &self.root {
            FrameRoot::Function(c) => &c.upvalues[slot as usize],
            FrameRoot::Module(_) => unreachable!("module frame has no upvalues"),
        }
    }

    /// Fetch the instruction at `pc`, or `None` once the stream is
    /// exhausted.
    pub fn fetch(&self) -> Option<Instr> {
        self.instructions().get(self.pc).cloned()
    }

    pub fn advance(&mut self) {
        self.pc += 1;
    }

    pub fn reg(&self, r: Reg) -> &Value {
        &self.registers[r as usize]
    }

    pub fn set_reg(&mut self, r: Reg, value: Value) {
        let idx = r as usize;
        if idx >= self.registers.len() {
            self.registers.resize(idx + 1, Value::Null);
        }
        self.registers[idx] = value;
    }

    pub fn local(&self, slot: Slot) -> Value {
        match &self.locals[slot as usize] {
            LocalSlot::Plain(v) => v.clone(),
            LocalSlot::Captured(cell) => cell.borrow().clone(),
        }
    }

    pub fn set_local(&mut self, slot: Slot, value: Value) {
        match &mut self.locals[slot as usize] {
            LocalSlot::Plain(v) => *v = value,
            LocalSlot::Captured(cell) => *cell.borrow_mut() = value,
        }
    }

    /// Promote `slot` to a shared cell if it isn't one already, and return
    /// it. Called when a `CLOSURE` instruction directly captures this local;
    /// promotion happens in place so every later `LOAD_VAR`/`STORE_VAR`
    /// against this slot reads/writes through the same cell.
    pub fn promote_local(&mut self, slot: Slot) -> UpvalueCell {
        if let LocalSlot::Captured(cell) = &self.locals[slot as usize] {
            return cell.clone();
        }
        let value = match std::mem::replace(&mut self.locals[slot as usize], LocalSlot::Plain(Value::Null)) {
            LocalSlot::Plain(v) => v,
            LocalSlot::Captured(_) => unreachable!(),
        };
        let cell = new_cell(value);
        self.locals[slot as usize] = LocalSlot::Captured(cell.clone());
        cell
    }
}
