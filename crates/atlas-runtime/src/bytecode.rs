//! The register-based instruction set.
//!
//! Each `Instr` carries its operands as typed fields rather than a packed
//! byte stream: register numbers, local/global/upvalue slots, constant
//! indices, and absolute jump targets. This is the instruction set's
//! complete operand vector, just given a name per field instead of a
//! positional `Vec<i32>` — the compiler and VM agree on one `enum` instead
//! of on byte-layout conventions.

use std::fmt;

/// A register index into a frame's elastic working-value array.
pub type Reg = u16;

/// A slot index into a frame's local array, the global table, or a
/// closure's upvalue-cell array (which one depends on the instruction).
pub type Slot = u16;

/// An index into a proto's constant pool.
pub type ConstIdx = u16;

/// An index into a module's nested-function list.
pub type FuncIdx = u16;

/// An absolute index into the *owning proto's* instruction list.
///
/// Branch targets are recorded "one before" the intended landing
/// instruction: the interpreter always performs its
/// ordinary post-execution `ip += 1` advance even after a branch sets `ip`,
/// so `Jump`/`JumpIfFalse` targets must already be `landing_index - 1`. The
/// compiler's `patch_jump` helper (see `compiler` module) is the only place
/// that should ever compute one of these.
pub type JumpTarget = usize;

/// The operator half of the binary-operator table: which machine operation
/// to run once operand kinds have already been checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOpcode {
    AddInt,
    SubInt,
    MulInt,
    DivInt,
    EqInt,
    NeInt,
    EqBool,
    NeBool,
    LtInt,
    LteInt,
    GtInt,
    GteInt,
    AndBool,
    OrBool,
}

impl fmt::Display for BinOpcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinOpcode::AddInt => "ADD_INT",
            BinOpcode::SubInt => "SUB_INT",
            BinOpcode::MulInt => "MUL_INT",
            BinOpcode::DivInt => "DIV_INT",
            BinOpcode::EqInt => "EQ_INT",
            BinOpcode::NeInt => "NE_INT",
            BinOpcode::EqBool => "EQ_BOOL",
            BinOpcode::NeBool => "NE_BOOL",
            BinOpcode::LtInt => "LT_INT",
            BinOpcode::LteInt => "LTE_INT",
            BinOpcode::GtInt => "GT_INT",
            BinOpcode::GteInt => "GTE_INT",
            BinOpcode::AndBool => "AND_BOOL",
            BinOpcode::OrBool => "OR_BOOL",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Instr {
    LoadConst { dst: Reg, k: ConstIdx },
    LoadVar { dst: Reg, slot: Slot },
    StoreVar { src: Reg, slot: Slot },
    LoadGlobal { dst: Reg, slot: Slot },
    AssignGlobal { src: Reg, slot: Slot },
    LoadUpvar { dst: Reg, slot: Slot },
    AssignUpvar { src: Reg, slot: Slot },
    BinOp {
        op: BinOpcode,
        dst: Reg,
        lhs: Reg,
        rhs: Reg,
    },
    /// Build a closure from nested function slot `func` of the enclosing
    /// module, populating its upvalue cells from the current frame.
    Closure { dst: Reg, func: FuncIdx },
    /// Variable-arity call: `args` is the ordered argument register list.
    Call { dst: Reg, func: Reg, args: Vec<Reg> },
    Return { src: Reg },
    JumpIfFalse { cond: Reg, target: JumpTarget },
    Jump { target: JumpTarget },
    MakeArray { dst: Reg, elems: Vec<Reg> },
    IndexArray { dst: Reg, arr: Reg, idx: Reg },
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instr::LoadConst { dst, k } => write!(f, "LOAD_CONST    r{dst}, k{k}"),
            Instr::LoadVar { dst, slot } => write!(f, "LOAD_VAR      r{dst}, s{slot}"),
            Instr::StoreVar { src, slot } => write!(f, "STORE_VAR     r{src}, s{slot}"),
            Instr::LoadGlobal { dst, slot } => write!(f, "LOAD_GLOBAL   r{dst}, s{slot}"),
            Instr::AssignGlobal { src, slot } => write!(f, "ASSIGN_GLOBAL r{src}, s{slot}"),
            Instr::LoadUpvar { dst, slot } => write!(f, "LOAD_UPVAR    r{dst}, s{slot}"),
            Instr::AssignUpvar { src, slot } => write!(f, "ASSIGN_UPVAR  r{src}, s{slot}"),
            Instr::BinOp { op, dst, lhs, rhs } => write!(f, "{op:<13} r{dst}, r{lhs}, r{rhs}"),
            Instr::Closure { dst, func } => write!(f, "CLOSURE       r{dst}, f{func}"),
            Instr::Call { dst, func, args } => {
                write!(f, "CALL          r{dst}, r{func}")?;
                for a in args {
                    write!(f, ", r{a}")?;
                }
                Ok(())
            }
            Instr::Return { src } => write!(f, "RETURN        r{src}"),
            Instr::JumpIfFalse { cond, target } => write!(f, "JUMP_IF_FALSE r{cond}, @{target}"),
            Instr::Jump { target } => write!(f, "JUMP          @{target}"),
            Instr::MakeArray { dst, elems } => {
                write!(f, "MAKE_ARRAY    r{dst}")?;
                for e in elems {
                    write!(f, ", r{e}")?;
                }
                Ok(())
            }
            Instr::IndexArray { dst, arr, idx } => write!(f, "INDEX_ARRAY   r{dst}, r{arr}, r{idx}"),
        }
    }
}

/// Render a full instruction list with index prefixes, the way `atlas
/// disasm` would show a compiled proto to a human.
pub fn disassemble(instructions: &[Instr]) -> String {
    let mut out = String::new();
    for (i, instr) in instructions.iter().enumerate() {
        out.push_str(&format!("{i:>4}: {instr}\n"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disassembly_is_one_line_per_instruction() {
        let instrs = vec![
            Instr::LoadConst { dst: 0, k: 0 },
            Instr::Return { src: 0 },
        ];
        let text = disassemble(&instrs);
        assert_eq!(text.lines().count(), 2);
        assert!(text.contains("LOAD_CONST"));
        assert!(text.contains("RETURN"));
    }
}
