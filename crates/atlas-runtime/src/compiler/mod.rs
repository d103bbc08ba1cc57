//! AST-to-bytecode compiler, a visitor-style tree walk over the parsed AST.
//!
//! Compiles a parsed `Program` directly to register bytecode. Expressions
//! lower to the register holding their result; statements lower to zero or
//! more instructions appended to whichever context currently owns emission.
//! Locals are tracked by slot (never reclaimed), upvalues by the promotion
//! algorithm in `crate::scope`, globals by the pre-populated `GlobalTable`.

mod expr;
mod stmt;

use crate::ast::Program;
use crate::bytecode::FuncIdx;
use crate::diagnostic::{sort_diagnostics, Diagnostic};
use crate::globals::GlobalTable;
use crate::proto::{FunctionProto, ModuleProto};
use crate::scope::ScopeChain;
use crate::span::Span;
use crate::types::Type;
use std::rc::Rc;

/// The result of lowering one expression: the register its value lives in,
/// its static type, and — for closures and native functions — the callable
/// signature carried along so call sites can be checked without re-deriving
/// it.
pub(crate) struct Lowered {
    pub reg: crate::bytecode::Reg,
    pub ty: Type,
    pub signature: Option<crate::types::FunctionSignature>,
}

pub struct Compiler {
    pub(crate) scope: ScopeChain,
    pub(crate) globals: GlobalTable,
    pub(crate) module_functions: Vec<Rc<FunctionProto>>,
    pub(crate) diagnostics: Vec<Diagnostic>,
}

impl Compiler {
    pub fn new(globals: GlobalTable) -> Self {
        Self {
            scope: ScopeChain::new(),
            globals,
            module_functions: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Compile a whole program into a `ModuleProto`, or return every
    /// accumulated diagnostic if compilation failed. Compilation collects
    /// all such errors from a module before refusing to emit.
    pub fn compile(mut self, program: &Program) -> Result<Rc<ModuleProto>, Vec<Diagnostic>> {
        for stmt in &program.statements {
            self.scope.reset_registers();
            self.lower_stmt(stmt);
        }

        if !self.diagnostics.is_empty() {
            let mut diagnostics = self.diagnostics;
            sort_diagnostics(&mut diagnostics);
            return Err(diagnostics);
        }

        let module = self.scope.pop();

        Ok(Rc::new(ModuleProto {
            num_locals: module.next_slot as usize,
            entry_point: 0,
            instructions: module.instructions,
            constants: module.constants,
            functions: self.module_functions,
        }))
    }

    /// Compile one REPL submission against the module context this
    /// `Compiler` already holds, leaving module-locals and globals intact
    /// for the next submission. The returned `ModuleProto` carries the
    /// *entire* cumulative instruction list (not just this chunk's tail) so
    /// that branch targets — absolute indices into it — stay valid, along
    /// with the cumulative constant pool and nested-function list; only
    /// `entry_point` tells the VM where this chunk's own code begins.
    pub fn compile_chunk(&mut self, program: &Program) -> Result<Rc<ModuleProto>, Vec<Diagnostic>> {
        let (instr_start, const_start) = self.scope.module_snapshot();

        for stmt in &program.statements {
            self.scope.reset_registers();
            self.lower_stmt(stmt);
        }

        if !self.diagnostics.is_empty() {
            self.scope.truncate_module(instr_start, const_start);
            let mut diagnostics = std::mem::take(&mut self.diagnostics);
            sort_diagnostics(&mut diagnostics);
            return Err(diagnostics);
        }

        Ok(Rc::new(ModuleProto {
            num_locals: self.scope.module_num_locals(),
            entry_point: instr_start,
            instructions: self.scope.module_instructions(),
            constants: self.scope.module_constants(),
            functions: self.module_functions.clone(),
        }))
    }

    pub(crate) fn error(&mut self, code: &'static str, message: impl Into<String>, span: Span) {
        self.diagnostics.push(Diagnostic::error(code, message, span));
    }

    pub(crate) fn register_function(&mut self, proto: FunctionProto) -> FuncIdx {
        self.module_functions.push(Rc::new(proto));
        (self.module_functions.len() - 1) as FuncIdx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::*;
    use crate::bytecode::Instr;
    use crate::diagnostic::error_codes;
    use crate::span::Span;
    use crate::stdlib;

    fn int_lit(n: i64) -> Expr {
        Expr::new(ExprKind::Int(n), Span::dummy())
    }

    fn compile_ok(program: Program) -> Rc<ModuleProto> {
        let compiler = Compiler::new(stdlib::register_builtins());
        compiler.compile(&program).unwrap_or_else(|diags| {
            panic!("expected successful compile, got: {diags:?}")
        })
    }

    #[test]
    fn var_decl_with_initializer_emits_store() {
        let program = Program {
            statements: vec![Stmt {
                kind: StmtKind::VarDecl {
                    name: "x".into(),
                    mutable: true,
                    declared_type: Some(TypeExpr::Int),
                    initializer: Some(int_lit(3)),
                },
                span: Span::dummy(),
            }],
        };
        let module = compile_ok(program);
        assert!(matches!(module.instructions[0], Instr::LoadConst { .. }));
        assert!(matches!(module.instructions[1], Instr::StoreVar { slot: 0, .. }));
        assert_eq!(module.num_locals, 1);
    }

    #[test]
    fn redeclaration_in_same_function_is_rejected() {
        let decl = |name: &str| Stmt {
            kind: StmtKind::VarDecl {
                name: name.into(),
                mutable: true,
                declared_type: Some(TypeExpr::Int),
                initializer: Some(int_lit(1)),
            },
            span: Span::dummy(),
        };
        let program = Program {
            statements: vec![decl("x"), decl("x")],
        };
        let compiler = Compiler::new(stdlib::register_builtins());
        let err = compiler.compile(&program).unwrap_err();
        assert!(err.iter().any(|d| d.code == error_codes::REDECLARATION));
    }

    #[test]
    fn undefined_name_is_reported() {
        let program = Program {
            statements: vec![Stmt {
                kind: StmtKind::Return(Expr::new(ExprKind::Ident("missing".into()), Span::dummy())),
                span: Span::dummy(),
            }],
        };
        let compiler = Compiler::new(stdlib::register_builtins());
        let err = compiler.compile(&program).unwrap_err();
        assert!(err.iter().any(|d| d.code == error_codes::UNDEFINED_NAME));
    }
}
