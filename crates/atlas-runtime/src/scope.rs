//! The scope chain: Module/Function/Block contexts sharing one contract.
//! Implemented as a tagged `Context` enum-of-kinds held
//! in a single stack rather than as a parent-pointer chain: the stack's
//! order *is* the chain, which keeps the borrow checker happy and matches
//! how the compiler actually visits the tree (push on entry, pop on exit).

use crate::bytecode::{Instr, Reg, Slot};
use crate::types::{FunctionSignature, Type};
use crate::value::Value;

/// A named local binding: a declared variable, a function parameter, or a
/// function's own name bound in its defining scope.
#[derive(Debug, Clone)]
pub struct Variable {
    pub name: String,
    pub slot: Slot,
    pub mutable: bool,
    pub ty: Type,
    pub signature: Option<FunctionSignature>,
}

/// A captured variable recorded on the *capturing* function.
#[derive(Debug, Clone)]
pub struct Upvar {
    pub name: String,
    pub slot: Slot,
    pub mutable: bool,
    pub ty: Type,
    pub signature: Option<FunctionSignature>,
    pub slot_in_parent: Slot,
    pub is_from_parent: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextKind {
    Module,
    Function,
    Block,
}

/// One entry in the scope-chain stack. `Block` contexts own only `locals`;
/// every other field is meaningless for them and left empty — emission and
/// constant pooling are delegated to the nearest enclosing `Module`/
/// `Function` entry (see `ScopeChain::emit`/`add_constant`).
pub struct Context {
    pub kind: ContextKind,
    pub instructions: Vec<Instr>,
    pub constants: Vec<Value>,
    pub return_type: Option<Type>,
    pub param_types: Vec<Type>,
    pub upvars: Vec<Upvar>,
    pub locals: Vec<Variable>,
    pub next_slot: Slot,
    /// Register scratch counter, meaningless on `Block` contexts (which
    /// delegate to the nearest owning context, same as instruction/constant
    /// emission). Reset to zero at the top of every statement lowered
    /// directly into the owning context.
    pub next_reg: Reg,
}

impl Context {
    fn module() -> Self {
        Self {
            kind: ContextKind::Module,
            instructions: Vec::new(),
            constants: Vec::new(),
            return_type: None,
            param_types: Vec::new(),
            upvars: Vec::new(),
            locals: Vec::new(),
            next_slot: 0,
            next_reg: 0,
        }
    }

    fn function(return_type: Type, param_types: Vec<Type>) -> Self {
        Self {
            kind: ContextKind::Function,
            instructions: Vec::new(),
            constants: Vec::new(),
            return_type: Some(return_type),
            param_types,
            upvars: Vec::new(),
            locals: Vec::new(),
            next_slot: 0,
            next_reg: 0,
        }
    }

    fn block(inherited_next_slot: Slot) -> Self {
        Self {
            kind: ContextKind::Block,
            instructions: Vec::new(),
            constants: Vec::new(),
            return_type: None,
            param_types: Vec::new(),
            upvars: Vec::new(),
            locals: Vec::new(),
            next_slot: inherited_next_slot,
            next_reg: 0,
        }
    }
}

/// The full compile-time scope chain, rooted in one `Module` context.
pub struct ScopeChain {
    stack: Vec<Context>,
}

impl ScopeChain {
    pub fn new() -> Self {
        Self {
            stack: vec![Context::module()],
        }
    }

    pub fn push_function(&mut self, return_type: Type, param_types: Vec<Type>) {
        self.stack.push(Context::function(return_type, param_types));
    }

    pub fn push_block(&mut self) {
        let inherited = self.stack.last().expect("non-empty stack").next_slot;
        self.stack.push(Context::block(inherited));
    }

    /// Pop the current context. For a `Block`, its high-water slot mark is
    /// folded back into the nearest owning `Function`/`Module` context so
    /// later sibling declarations never reuse a slot — blocks do not free
    /// slots in this design.
    pub fn pop(&mut self) -> Context {
        let popped = self.stack.pop().expect("pop without matching push");
        if popped.kind == ContextKind::Block {
            if let Some(owner) = self.stack.last_mut() {
                owner.next_slot = owner.next_slot.max(popped.next_slot);
            }
        }
        popped
    }

    pub fn current(&self) -> &Context {
        self.stack.last().expect("non-empty stack")
    }

    pub fn current_mut(&mut self) -> &mut Context {
        self.stack.last_mut().expect("non-empty stack")
    }

    pub fn in_function(&self) -> bool {
        self.stack.iter().any(|c| c.kind == ContextKind::Function)
    }

    /// The declared return type of the innermost enclosing function, if any.
    pub fn current_return_type(&self) -> Option<&Type> {
        self.stack
            .iter()
            .rev()
            .find(|c| c.kind != ContextKind::Block)
            .and_then(|c| c.return_type.as_ref())
    }

    /// Emit an instruction into the nearest owning (non-`Block`) context.
    pub fn emit(&mut self, instr: Instr) -> usize {
        let idx = self.owning_index();
        self.stack[idx].instructions.push(instr);
        self.stack[idx].instructions.len() - 1
    }

    pub fn patch(&mut self, instr_index: usize, instr: Instr) {
        let idx = self.owning_index();
        self.stack[idx].instructions[instr_index] = instr;
    }

    pub fn current_offset(&self) -> usize {
        let idx = self.owning_index();
        self.stack[idx].instructions.len()
    }

    /// Compute a backward/forward jump target using the "one-before"
    /// encoding: the interpreter always performs its ordinary `ip += 1`
    /// advance even after a branch sets `ip`, so the recorded target must be
    /// one less than the instruction we actually want to land on.
    pub fn jump_target_to_current_offset(&self) -> usize {
        self.current_offset() - 1
    }

    pub fn add_constant(&mut self, value: Value) -> u16 {
        let idx = self.owning_index();
        let ctx = &mut self.stack[idx];
        ctx.constants.push(value);
        (ctx.constants.len() - 1) as u16
    }

    /// Allocate the next scratch register in the owning context, growing its
    /// counter monotonically.
    pub fn next_register(&mut self) -> Reg {
        let idx = self.owning_index();
        let ctx = &mut self.stack[idx];
        let r = ctx.next_reg;
        ctx.next_reg += 1;
        r
    }

    /// Reset the owning context's register counter to zero. Called at the
    /// top of every statement lowered directly into that context — nesting
    /// a block or function does not introduce a *second* counter, it keeps
    /// using the owning context's, which this same call already resets per
    /// statement.
    pub fn reset_registers(&mut self) {
        let idx = self.owning_index();
        self.stack[idx].next_reg = 0;
    }

    fn owning_index(&self) -> usize {
        self.stack
            .iter()
            .rposition(|c| c.kind != ContextKind::Block)
            .expect("module context always present")
    }

    /// Current (instructions, constants) length of the root module context.
    /// Used by REPL chunk compilation to snapshot/roll back a failed
    /// submission without disturbing earlier, already-accepted chunks.
    pub fn module_snapshot(&self) -> (usize, usize) {
        (self.stack[0].instructions.len(), self.stack[0].constants.len())
    }

    pub fn truncate_module(&mut self, instr_len: usize, const_len: usize) {
        self.stack[0].instructions.truncate(instr_len);
        self.stack[0].constants.truncate(const_len);
    }

    pub fn module_num_locals(&self) -> usize {
        self.stack[0].next_slot as usize
    }

    /// The root module context's full instruction list, from the very
    /// first chunk onward. REPL chunk protos carry the whole list (rather
    /// than a rebased tail) so branch targets, which are absolute indices
    /// into it, stay valid without rewriting.
    pub fn module_instructions(&self) -> Vec<Instr> {
        self.stack[0].instructions.clone()
    }

    pub fn module_constants(&self) -> Vec<Value> {
        self.stack[0].constants.clone()
    }

    /// Define a local in the *current* (innermost) context's own map.
    /// Returns `Err` if the name is already declared in that exact context.
    /// Redeclaration is checked only against the current context, not
    /// enclosing blocks — shadowing across nested blocks is intentional.
    pub fn define_local(
        &mut self,
        name: &str,
        mutable: bool,
        ty: Type,
        signature: Option<FunctionSignature>,
    ) -> Result<Slot, ()> {
        let ctx = self.stack.last_mut().expect("non-empty stack");
        if ctx.locals.iter().any(|v| v.name == name) {
            return Err(());
        }
        let slot = ctx.next_slot;
        ctx.next_slot += 1;
        ctx.locals.push(Variable {
            name: name.to_string(),
            slot,
            mutable,
            ty,
            signature,
        });
        Ok(slot)
    }

    /// Resolve `name` as a local reachable from the current context: its own
    /// map, then (if it's a `Block`) its enclosing blocks, stopping at (and
    /// including) the first `Function`/`Module` boundary it crosses.
    pub fn resolve_local(&self, name: &str) -> Option<Variable> {
        let top = self.stack.len() - 1;
        self.resolve_local_from(top, name).map(|(_, var)| var)
    }

    fn resolve_local_from(&self, from_idx: usize, name: &str) -> Option<(usize, Variable)> {
        for idx in (0..=from_idx).rev() {
            let ctx = &self.stack[idx];
            if let Some(var) = ctx.locals.iter().rev().find(|v| v.name == name) {
                return Some((idx, var.clone()));
            }
            if ctx.kind != ContextKind::Block {
                break;
            }
        }
        None
    }

    fn nearest_non_block_below(&self, idx: usize) -> Option<usize> {
        (0..idx).rev().find(|&i| self.stack[i].kind != ContextKind::Block)
    }

    /// Resolve `name` as an upvalue of the innermost enclosing function,
    /// registering new `Upvar` descriptors along the capture chain as
    /// needed.
    pub fn resolve_upvar(&mut self, name: &str) -> Option<Upvar> {
        let fn_idx = self.nearest_non_block_below(self.stack.len())?;
        if self.stack[fn_idx].kind != ContextKind::Function {
            return None; // directly inside the module: no enclosing function at all
        }
        let idx = self.resolve_upvar_at(fn_idx, name)?;
        Some(self.stack[fn_idx].upvars[idx as usize].clone())
    }

    fn resolve_upvar_at(&mut self, fn_idx: usize, name: &str) -> Option<Slot> {
        if let Some(existing) = self.stack[fn_idx].upvars.iter().position(|u| u.name == name) {
            return Some(existing as Slot);
        }

        if let Some((owner_idx, var)) = self.resolve_local_from(fn_idx.checked_sub(1)?, name) {
            let _ = owner_idx;
            let upvar_slot = self.stack[fn_idx].upvars.len() as Slot;
            self.stack[fn_idx].upvars.push(Upvar {
                name: name.to_string(),
                slot: upvar_slot,
                mutable: var.mutable,
                ty: var.ty,
                signature: var.signature,
                slot_in_parent: var.slot,
                is_from_parent: true,
            });
            return Some(upvar_slot);
        }

        let parent_fn_idx = self.nearest_non_block_below(fn_idx)?;
        if self.stack[parent_fn_idx].kind != ContextKind::Function {
            return None; // parent is the module: no further upvars to chain through
        }
        let parent_upvar_idx = self.resolve_upvar_at(parent_fn_idx, name)?;
        let parent_upvar = self.stack[parent_fn_idx].upvars[parent_upvar_idx as usize].clone();

        let upvar_slot = self.stack[fn_idx].upvars.len() as Slot;
        self.stack[fn_idx].upvars.push(Upvar {
            name: name.to_string(),
            slot: upvar_slot,
            mutable: parent_upvar.mutable,
            ty: parent_upvar.ty,
            signature: parent_upvar.signature,
            slot_in_parent: parent_upvar_idx,
            is_from_parent: false,
        });
        Some(upvar_slot)
    }
}

impl Default for ScopeChain {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redeclaration_in_same_context_is_rejected() {
        let mut chain = ScopeChain::new();
        assert!(chain.define_local("x", true, Type::Int, None).is_ok());
        assert!(chain.define_local("x", true, Type::Int, None).is_err());
    }

    #[test]
    fn shadowing_across_nested_blocks_is_allowed() {
        let mut chain = ScopeChain::new();
        chain.define_local("x", true, Type::Int, None).unwrap();
        chain.push_block();
        assert!(chain.define_local("x", true, Type::Bool, None).is_ok());
        let shadowed = chain.resolve_local("x").unwrap();
        assert_eq!(shadowed.ty, Type::Bool);
        chain.pop();
        let original = chain.resolve_local("x").unwrap();
        assert_eq!(original.ty, Type::Int);
    }

    #[test]
    fn block_does_not_reclaim_slots() {
        let mut chain = ScopeChain::new();
        chain.define_local("a", true, Type::Int, None).unwrap();
        chain.push_block();
        chain.define_local("b", true, Type::Int, None).unwrap();
        chain.pop();
        let c_slot = chain.define_local("c", true, Type::Int, None).unwrap();
        assert_eq!(c_slot, 2, "slot used inside the closed block must not be reused");
    }

    #[test]
    fn direct_capture_records_parent_local_slot() {
        let mut chain = ScopeChain::new();
        let c_slot = chain.define_local("c", true, Type::Int, None).unwrap();
        chain.push_function(Type::Int, vec![]);
        let upvar = chain.resolve_upvar("c").unwrap();
        assert!(upvar.is_from_parent);
        assert_eq!(upvar.slot_in_parent, c_slot);
    }

    #[test]
    fn transitive_capture_chains_through_the_middle_function() {
        let mut chain = ScopeChain::new();
        chain.define_local("c", true, Type::Int, None).unwrap();
        chain.push_function(Type::Int, vec![]); // middle function, doesn't use c itself yet
        chain.push_function(Type::Int, vec![]); // inner function references c
        let inner_upvar = chain.resolve_upvar("c").unwrap();
        assert!(!inner_upvar.is_from_parent);

        chain.pop(); // back to middle function
        let middle_upvars = &chain.current().upvars;
        assert_eq!(middle_upvars.len(), 1);
        assert!(middle_upvars[0].is_from_parent);
    }

    #[test]
    fn resolving_the_same_upvar_twice_reuses_the_slot() {
        let mut chain = ScopeChain::new();
        chain.define_local("c", true, Type::Int, None).unwrap();
        chain.push_function(Type::Int, vec![]);
        let first = chain.resolve_upvar("c").unwrap();
        let second = chain.resolve_upvar("c").unwrap();
        assert_eq!(first.slot, second.slot);
    }
}
