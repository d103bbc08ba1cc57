//! Expression lowering.

use super::{Compiler, Lowered};
use crate::ast::{BinOp, Expr, ExprKind};
use crate::binop;
use crate::bytecode::Instr;
use crate::diagnostic::error_codes;
use crate::types::Type;
use crate::value::Value;

impl Compiler {
    /// Lower one expression node, honoring the statement-expression elision
    /// optimization: a pure literal or identifier at the root of an
    /// expression-statement emits nothing; a binary expression always visits
    /// its children but omits its own combining opcode when elided; a call
    /// always emits regardless.
    pub(crate) fn lower_expr(&mut self, expr: &Expr) -> Option<Lowered> {
        match &expr.kind {
            ExprKind::Int(n) => Some(self.lower_literal(expr.is_statement, Type::Int, Value::Int(*n))),
            ExprKind::Bool(b) => Some(self.lower_literal(expr.is_statement, Type::Bool, Value::Bool(*b))),
            ExprKind::Null => Some(self.lower_literal(expr.is_statement, Type::Null, Value::Null)),
            ExprKind::Ident(name) => self.lower_ident(name, expr),
            ExprKind::Binary { op, lhs, rhs } => self.lower_binary(*op, lhs, rhs, expr),
            ExprKind::Call { callee, args } => self.lower_call(callee, args, expr),
            ExprKind::Index { array, index } => self.lower_index(array, index, expr),
            ExprKind::ArrayLiteral(elems) => self.lower_array_literal(elems, expr),
        }
    }

    fn lower_literal(&mut self, is_statement: bool, ty: Type, value: Value) -> Lowered {
        if is_statement {
            return Lowered { reg: 0, ty, signature: None };
        }
        let k = self.scope.add_constant(value);
        let dst = self.scope.next_register();
        self.scope.emit(Instr::LoadConst { dst, k });
        Lowered { reg: dst, ty, signature: None }
    }

    fn lower_ident(&mut self, name: &str, expr: &Expr) -> Option<Lowered> {
        if let Some(local) = self.scope.resolve_local(name) {
            if expr.is_statement {
                return Some(Lowered { reg: 0, ty: local.ty, signature: local.signature });
            }
            let dst = self.scope.next_register();
            self.scope.emit(Instr::LoadVar { dst, slot: local.slot });
            return Some(Lowered { reg: dst, ty: local.ty, signature: local.signature });
        }
        if self.scope.in_function() {
            if let Some(upvar) = self.scope.resolve_upvar(name) {
                if expr.is_statement {
                    return Some(Lowered { reg: 0, ty: upvar.ty, signature: upvar.signature });
                }
                let dst = self.scope.next_register();
                self.scope.emit(Instr::LoadUpvar { dst, slot: upvar.slot });
                return Some(Lowered { reg: dst, ty: upvar.ty, signature: upvar.signature });
            }
        }
        if let Some(global) = self.globals.lookup(name) {
            let ty = global.ty.clone();
            let signature = global.signature.clone();
            let slot = global.slot;
            if expr.is_statement {
                return Some(Lowered { reg: 0, ty, signature });
            }
            let dst = self.scope.next_register();
            self.scope.emit(Instr::LoadGlobal { dst, slot });
            return Some(Lowered { reg: dst, ty, signature });
        }

        self.error(
            error_codes::UNDEFINED_NAME,
            format!("variable `{name}` not found"),
            expr.span,
        );
        None
    }

    fn lower_binary(&mut self, op: BinOp, lhs: &Expr, rhs: &Expr, expr: &Expr) -> Option<Lowered> {
        let lhs = self.lower_expr(lhs)?;
        let rhs = self.lower_expr(rhs)?;

        let Some((opcode, result_ty)) = binop::lookup(op, &lhs.ty, &rhs.ty) else {
            self.error(
                error_codes::ILLEGAL_OPERATOR,
                format!(
                    "operator `{}` is not defined for `{}` and `{}`",
                    describe_binop(op),
                    lhs.ty,
                    rhs.ty
                ),
                expr.span,
            );
            return None;
        };

        if expr.is_statement {
            return Some(Lowered { reg: 0, ty: result_ty, signature: None });
        }
        let dst = self.scope.next_register();
        self.scope.emit(Instr::BinOp { op: opcode, dst, lhs: lhs.reg, rhs: rhs.reg });
        Some(Lowered { reg: dst, ty: result_ty, signature: None })
    }

    fn lower_call(&mut self, callee: &Expr, args: &[Expr], expr: &Expr) -> Option<Lowered> {
        let callee_lowered = self.lower_expr(callee)?;

        if !matches!(callee_lowered.ty, Type::Closure | Type::NativeFunction) {
            self.error(
                error_codes::NOT_CALLABLE,
                format!("`{}` is not callable", callee_lowered.ty),
                callee.span,
            );
            return None;
        }
        let Some(signature) = callee_lowered.signature.clone() else {
            self.error(
                error_codes::NOT_CALLABLE,
                "callee has no known signature",
                callee.span,
            );
            return None;
        };

        if signature.param_types.len() != args.len() {
            self.error(
                error_codes::ARITY_MISMATCH,
                format!(
                    "expected {} argument(s), found {}",
                    signature.param_types.len(),
                    args.len()
                ),
                expr.span,
            );
            return None;
        }

        let mut arg_regs = Vec::with_capacity(args.len());
        let mut ok = true;
        for (arg, expected_ty) in args.iter().zip(signature.param_types.iter()) {
            let Some(lowered) = self.lower_expr(arg) else {
                ok = false;
                continue;
            };
            if &lowered.ty != expected_ty {
                self.error(
                    error_codes::TYPE_MISMATCH,
                    format!("expected argument of type `{expected_ty}`, found `{}`", lowered.ty),
                    arg.span,
                );
                ok = false;
            }
            arg_regs.push(lowered.reg);
        }
        if !ok {
            return None;
        }

        let dst = self.scope.next_register();
        self.scope.emit(Instr::Call { dst, func: callee_lowered.reg, args: arg_regs });
        Some(Lowered { reg: dst, ty: signature.return_type.clone(), signature: None })
    }

    fn lower_index(&mut self, array: &Expr, index: &Expr, expr: &Expr) -> Option<Lowered> {
        let array_lowered = self.lower_expr(array)?;
        let index_lowered = self.lower_expr(index)?;

        let Some(elem_ty) = array_lowered.ty.element_type().cloned() else {
            self.error(
                error_codes::TYPE_MISMATCH,
                format!("cannot index into `{}`", array_lowered.ty),
                array.span,
            );
            return None;
        };
        if index_lowered.ty != Type::Int {
            self.error(
                error_codes::NON_INT_INDEX,
                format!("array index must be `int`, found `{}`", index_lowered.ty),
                index.span,
            );
            return None;
        }

        let dst = self.scope.next_register();
        self.scope.emit(Instr::IndexArray { dst, arr: array_lowered.reg, idx: index_lowered.reg });
        let _ = expr;
        Some(Lowered { reg: dst, ty: elem_ty, signature: None })
    }

    fn lower_array_literal(&mut self, elems: &[Expr], expr: &Expr) -> Option<Lowered> {
        let mut lowered_elems = Vec::with_capacity(elems.len());
        for e in elems {
            lowered_elems.push(self.lower_expr(e)?);
        }

        let elem_ty = lowered_elems.first().map(|l| l.ty.clone()).unwrap_or(Type::Null);
        if let Some(mismatch) = lowered_elems.iter().find(|l| l.ty != elem_ty) {
            let _ = mismatch;
            self.error(
                error_codes::HETEROGENEOUS_ARRAY,
                "array literal elements must share one type",
                expr.span,
            );
            return None;
        }

        let dst = self.scope.next_register();
        let regs = lowered_elems.iter().map(|l| l.reg).collect();
        self.scope.emit(Instr::MakeArray { dst, elems: regs });
        Some(Lowered { reg: dst, ty: Type::array_of(elem_ty), signature: None })
    }
}

fn describe_binop(op: BinOp) -> &'static str {
    match op {
        BinOp::Add => "+",
        BinOp::Sub => "-",
        BinOp::Mul => "*",
        BinOp::Div => "/",
        BinOp::Eq => "==",
        BinOp::Ne => "!=",
        BinOp::Lt => "<",
        BinOp::Lte => "<=",
        BinOp::Gt => ">",
        BinOp::Gte => ">=",
        BinOp::And => "&&",
        BinOp::Or => "||",
    }
}
