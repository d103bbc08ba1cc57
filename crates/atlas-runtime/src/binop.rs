//! The static operator table: `op × leftKind × rightKind ->
//! (opcode, resultKind)` in one lookup, shared by the compiler (to pick an
//! opcode and type-check) and by this module's doc as the single source of
//! truth for which combinations are legal.

use crate::ast::BinOp;
use crate::bytecode::BinOpcode;
use crate::types::Type;

/// Look up the table entry for `op` applied to `(lhs, rhs)`.
///
/// Returns `None` when the combination isn't in the table — a compile-time
/// error at the call site.
pub fn lookup(op: BinOp, lhs: &Type, rhs: &Type) -> Option<(BinOpcode, Type)> {
    use BinOp::*;
    use Type::*;

    match (op, lhs, rhs) {
        (Add, Int, Int) => Some((BinOpcode::AddInt, Int)),
        (Sub, Int, Int) => Some((BinOpcode::SubInt, Int)),
        (Mul, Int, Int) => Some((BinOpcode::MulInt, Int)),
        (Div, Int, Int) => Some((BinOpcode::DivInt, Int)),

        (Eq, Int, Int) => Some((BinOpcode::EqInt, Bool)),
        (Ne, Int, Int) => Some((BinOpcode::NeInt, Bool)),
        (Eq, Bool, Bool) => Some((BinOpcode::EqBool, Bool)),
        (Ne, Bool, Bool) => Some((BinOpcode::NeBool, Bool)),

        (Lt, Int, Int) => Some((BinOpcode::LtInt, Bool)),
        (Lte, Int, Int) => Some((BinOpcode::LteInt, Bool)),
        (Gt, Int, Int) => Some((BinOpcode::GtInt, Bool)),
        (Gte, Int, Int) => Some((BinOpcode::GteInt, Bool)),

        (And, Bool, Bool) => Some((BinOpcode::AndBool, Bool)),
        (Or, Bool, Bool) => Some((BinOpcode::OrBool, Bool)),

        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_arithmetic_is_in_the_table() {
        assert_eq!(lookup(BinOp::Add, &Type::Int, &Type::Int), Some((BinOpcode::AddInt, Type::Int)));
    }

    #[test]
    fn comparisons_produce_bool() {
        assert_eq!(lookup(BinOp::Lt, &Type::Int, &Type::Int), Some((BinOpcode::LtInt, Type::Bool)));
    }

    #[test]
    fn mismatched_kinds_are_absent() {
        assert_eq!(lookup(BinOp::Add, &Type::Int, &Type::Bool), None);
        assert_eq!(lookup(BinOp::And, &Type::Int, &Type::Int), None);
    }

    #[test]
    fn arrays_have_no_entries() {
        let arr = Type::array_of(Type::Int);
        assert_eq!(lookup(BinOp::Eq, &arr, &arr), None);
    }
}
