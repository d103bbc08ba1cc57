//! Statement lowering.

use super::Compiler;
use crate::ast::{FunctionDecl, Stmt, StmtKind, TypeExpr};
use crate::bytecode::Instr;
use crate::diagnostic::error_codes;
use crate::proto::{FunctionProto, UpvarDescriptor};
use crate::types::{FunctionSignature, Type};
use crate::value::Value;

impl Compiler {
    pub(crate) fn lower_stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::VarDecl { name, mutable, declared_type, initializer } => {
                self.lower_var_decl(name, *mutable, declared_type.as_ref(), initializer.as_ref(), stmt)
            }
            StmtKind::Assign { name, name_span, value } => self.lower_assign(name, *name_span, value),
            StmtKind::Return(value) => self.lower_return(value, stmt),
            StmtKind::If { cond, then_branch, else_branch } => {
                self.lower_if(cond, then_branch, else_branch.as_deref())
            }
            StmtKind::Block(body) => self.lower_block(body),
            StmtKind::FunctionDecl(decl) => self.lower_function_decl(decl),
            StmtKind::ExprStmt(e) => {
                self.lower_expr(e);
            }
        }
    }

    fn resolve_type_expr(&self, ty: &TypeExpr) -> Type {
        match ty {
            TypeExpr::Int => Type::Int,
            TypeExpr::Bool => Type::Bool,
            TypeExpr::Null => Type::Null,
            TypeExpr::Array(elem) => Type::array_of(self.resolve_type_expr(elem)),
        }
    }

    fn lower_var_decl(
        &mut self,
        name: &str,
        mutable: bool,
        declared_type: Option<&TypeExpr>,
        initializer: Option<&crate::ast::Expr>,
        stmt: &Stmt,
    ) {
        let (value_reg, ty, signature) = match initializer {
            Some(init) => {
                let Some(lowered) = self.lower_expr(init) else { return };
                if let Some(declared) = declared_type {
                    let declared_ty = self.resolve_type_expr(declared);
                    if declared_ty != lowered.ty {
                        self.error(
                            error_codes::TYPE_MISMATCH,
                            format!("expected `{declared_ty}`, found `{}`", lowered.ty),
                            init.span,
                        );
                        return;
                    }
                }
                (lowered.reg, lowered.ty, lowered.signature)
            }
            None => {
                if !mutable {
                    self.error(
                        error_codes::CONST_WITHOUT_VALUE,
                        format!("constant `{name}` must have a value"),
                        stmt.span,
                    );
                    return;
                }
                let Some(declared) = declared_type else {
                    self.error(
                        error_codes::MISSING_TYPE_ANNOTATION,
                        format!("`{name}` needs a type annotation or an initializer"),
                        stmt.span,
                    );
                    return;
                };
                let declared_ty = self.resolve_type_expr(declared);
                let k = self.scope.add_constant(Value::default_for(&declared_ty));
                let dst = self.scope.next_register();
                self.scope.emit(Instr::LoadConst { dst, k });
                (dst, declared_ty, None)
            }
        };

        match self.scope.define_local(name, mutable, ty, signature) {
            Ok(slot) => {
                self.scope.emit(Instr::StoreVar { src: value_reg, slot });
            }
            Err(()) => {
                self.error(
                    error_codes::REDECLARATION,
                    format!("`{name}` is already declared in this scope"),
                    stmt.span,
                );
            }
        }
    }

    fn lower_assign(&mut self, name: &str, name_span: crate::span::Span, value: &crate::ast::Expr) {
        if let Some(local) = self.scope.resolve_local(name) {
            if !local.mutable {
                self.error(
                    error_codes::ASSIGN_TO_CONST,
                    format!("cannot assign to constant `{name}`"),
                    name_span,
                );
                return;
            }
            let Some(lowered) = self.lower_expr(value) else { return };
            if lowered.ty != local.ty {
                self.error(
                    error_codes::TYPE_MISMATCH,
                    format!("expected `{}`, found `{}`", local.ty, lowered.ty),
                    value.span,
                );
                return;
            }
            self.scope.emit(Instr::StoreVar { src: lowered.reg, slot: local.slot });
            return;
        }

        if self.scope.in_function() {
            if let Some(upvar) = self.scope.resolve_upvar(name) {
                if !upvar.mutable {
                    self.error(
                        error_codes::ASSIGN_TO_CONST,
                        format!("cannot assign to constant `{name}`"),
                        name_span,
                    );
                    return;
                }
                let Some(lowered) = self.lower_expr(value) else { return };
                if lowered.ty != upvar.ty {
                    self.error(
                        error_codes::TYPE_MISMATCH,
                        format!("expected `{}`, found `{}`", upvar.ty, lowered.ty),
                        value.span,
                    );
                    return;
                }
                self.scope.emit(Instr::AssignUpvar { src: lowered.reg, slot: upvar.slot });
                return;
            }
        }

        if let Some(global) = self.globals.lookup(name) {
            self.error(
                error_codes::ASSIGN_TO_CONST,
                format!("cannot assign to built-in `{}`", global.name),
                name_span,
            );
            return;
        }

        self.error(
            error_codes::UNDEFINED_NAME,
            format!("variable `{name}` not found"),
            name_span,
        );
    }

    fn lower_return(&mut self, value: &crate::ast::Expr, stmt: &Stmt) {
        let Some(lowered) = self.lower_expr(value) else { return };
        if let Some(expected) = self.scope.current_return_type().cloned() {
            if lowered.ty != expected {
                self.error(
                    error_codes::TYPE_MISMATCH,
                    format!("expected return type `{expected}`, found `{}`", lowered.ty),
                    stmt.span,
                );
                return;
            }
        }
        self.scope.emit(Instr::Return { src: lowered.reg });
    }

    fn lower_if(&mut self, cond: &crate::ast::Expr, then_branch: &[Stmt], else_branch: Option<&[Stmt]>) {
        let Some(cond_lowered) = self.lower_expr(cond) else { return };
        if cond_lowered.ty != Type::Bool {
            self.error(
                error_codes::NON_BOOL_CONDITION,
                format!("`if` condition must be `bool`, found `{}`", cond_lowered.ty),
                cond.span,
            );
            return;
        }

        let branch_idx = self.scope.emit(Instr::JumpIfFalse { cond: cond_lowered.reg, target: 0 });
        self.lower_block(then_branch);

        if let Some(else_branch) = else_branch {
            let skip_else_idx = self.scope.emit(Instr::Jump { target: 0 });
            let else_target = self.scope.jump_target_to_current_offset();
            self.scope.patch(branch_idx, Instr::JumpIfFalse { cond: cond_lowered.reg, target: else_target });

            self.lower_block(else_branch);

            let end_target = self.scope.jump_target_to_current_offset();
            self.scope.patch(skip_else_idx, Instr::Jump { target: end_target });
        } else {
            let end_target = self.scope.jump_target_to_current_offset();
            self.scope.patch(branch_idx, Instr::JumpIfFalse { cond: cond_lowered.reg, target: end_target });
        }
    }

    fn lower_block(&mut self, body: &[Stmt]) {
        self.scope.push_block();
        for stmt in body {
            self.scope.reset_registers();
            self.lower_stmt(stmt);
        }
        self.scope.pop();
    }

    fn lower_function_decl(&mut self, decl: &FunctionDecl) {
        let return_type = self.resolve_type_expr(&decl.return_type);
        let param_types: Vec<Type> = decl.params.iter().map(|p| self.resolve_type_expr(&p.ty)).collect();
        let signature = FunctionSignature { param_types: param_types.clone(), return_type: return_type.clone() };

        self.scope.push_function(return_type.clone(), param_types.clone());
        for param in &decl.params {
            let ty = self.resolve_type_expr(&param.ty);
            // Parameters are guaranteed fresh in a brand-new function context.
            let _ = self.scope.define_local(&param.name, true, ty, None);
        }
        for stmt in &decl.body {
            self.scope.reset_registers();
            self.lower_stmt(stmt);
        }
        let func_ctx = self.scope.pop();

        let upvar_descriptors: Vec<UpvarDescriptor> = func_ctx
            .upvars
            .iter()
            .map(|u| UpvarDescriptor { slot_in_parent: u.slot_in_parent, is_from_parent: u.is_from_parent })
            .collect();

        let proto = FunctionProto {
            name: decl.name.clone(),
            num_locals: func_ctx.next_slot as usize,
            instructions: func_ctx.instructions,
            constants: func_ctx.constants,
            upvar_descriptors,
            param_types,
            return_type,
        };
        let func_idx = self.register_function(proto);

        match self.scope.define_local(&decl.name, false, Type::Closure, Some(signature)) {
            Ok(slot) => {
                let dst = self.scope.next_register();
                self.scope.emit(Instr::Closure { dst, func: func_idx });
                self.scope.emit(Instr::StoreVar { src: dst, slot });
            }
            Err(()) => {
                self.error(
                    error_codes::REDECLARATION,
                    format!("`{}` is already declared in this scope", decl.name),
                    decl.name_span,
                );
            }
        }
    }
}
