//! Recursive-descent parser: token stream to AST.
//!
//! A small hand-written Pratt-style expression parser plus straightforward
//! statement parsing, producing the AST the compiler lowers.

use crate::ast::*;
use crate::diagnostic::{error_codes, Diagnostic};
use crate::span::Span;
use crate::token::{Token, TokenKind};

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    diagnostics: Vec<Diagnostic>,
}

type ParseResult<T> = Result<T, ()>;

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            current: 0,
            diagnostics: Vec::new(),
        }
    }

    pub fn parse(mut self) -> Result<Program, Vec<Diagnostic>> {
        let mut statements = Vec::new();
        while !self.check(&TokenKind::Eof) {
            match self.statement() {
                Ok(stmt) => statements.push(stmt),
                Err(()) => self.synchronize(),
            }
        }
        if self.diagnostics.is_empty() {
            Ok(Program { statements })
        } else {
            Err(self.diagnostics)
        }
    }

    // --- token stream helpers -------------------------------------------------

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn peek_at(&self, offset: usize) -> &Token {
        let idx = (self.current + offset).min(self.tokens.len() - 1);
        &self.tokens[idx]
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.peek().kind) == std::mem::discriminant(kind)
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.current].clone();
        if self.current + 1 < self.tokens.len() {
            self.current += 1;
        }
        token
    }

    fn match_token(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> ParseResult<Token> {
        if self.check(&kind) {
            Ok(self.advance())
        } else {
            let found = self.peek().kind.describe();
            let span = self.peek().span;
            self.diagnostics.push(Diagnostic::error(
                error_codes::PARSE_UNEXPECTED_TOKEN,
                format!("expected {}, found {found}", kind.describe()),
                span,
            ));
            Err(())
        }
    }

    fn expect_ident(&mut self) -> ParseResult<(String, Span)> {
        let span = self.peek().span;
        if let TokenKind::Ident(name) = &self.peek().kind {
            let name = name.clone();
            self.advance();
            Ok((name, span))
        } else {
            self.diagnostics.push(Diagnostic::error(
                error_codes::PARSE_UNEXPECTED_TOKEN,
                format!("expected identifier, found {}", self.peek().kind.describe()),
                span,
            ));
            Err(())
        }
    }

    /// Skip tokens until a plausible statement boundary, so one parse error
    /// doesn't suppress every diagnostic after it.
    fn synchronize(&mut self) {
        while !self.check(&TokenKind::Eof) {
            if matches!(self.peek().kind, TokenKind::Semicolon) {
                self.advance();
                return;
            }
            if matches!(
                self.peek().kind,
                TokenKind::Var
                    | TokenKind::Const
                    | TokenKind::Function
                    | TokenKind::If
                    | TokenKind::Return
                    | TokenKind::RightBrace
            ) {
                return;
            }
            self.advance();
        }
    }

    // --- statements -------------------------------------------------------

    fn statement(&mut self) -> ParseResult<Stmt> {
        match &self.peek().kind {
            TokenKind::Var | TokenKind::Const => self.var_decl(),
            TokenKind::Return => self.return_stmt(),
            TokenKind::If => self.if_stmt(),
            TokenKind::LeftBrace => self.block_stmt(),
            TokenKind::Function => self.function_decl().map(|f| Stmt {
                span: f.span,
                kind: StmtKind::FunctionDecl(f),
            }),
            TokenKind::Ident(_) if matches!(self.peek_at(1).kind, TokenKind::Equal) => {
                self.assign_stmt()
            }
            _ => self.expr_stmt(),
        }
    }

    fn var_decl(&mut self) -> ParseResult<Stmt> {
        let start = self.peek().span;
        let mutable = matches!(self.peek().kind, TokenKind::Var);
        self.advance(); // 'var' or 'const'

        let (name, _) = self.expect_ident()?;

        let declared_type = if self.match_token(&TokenKind::Colon) {
            Some(self.type_expr()?)
        } else {
            None
        };

        let initializer = if self.match_token(&TokenKind::Equal) {
            Some(self.expression()?)
        } else {
            None
        };

        let end = self.expect(TokenKind::Semicolon)?.span;
        Ok(Stmt {
            span: start.merge(end),
            kind: StmtKind::VarDecl {
                name,
                mutable,
                declared_type,
                initializer,
            },
        })
    }

    fn assign_stmt(&mut self) -> ParseResult<Stmt> {
        let (name, name_span) = self.expect_ident()?;
        self.expect(TokenKind::Equal)?;
        let value = self.expression()?;
        let end = self.expect(TokenKind::Semicolon)?.span;
        Ok(Stmt {
            span: name_span.merge(end),
            kind: StmtKind::Assign {
                name,
                name_span,
                value,
            },
        })
    }

    fn return_stmt(&mut self) -> ParseResult<Stmt> {
        let start = self.advance().span; // 'return'
        let value = self.expression()?;
        let end = self.expect(TokenKind::Semicolon)?.span;
        Ok(Stmt {
            span: start.merge(end),
            kind: StmtKind::Return(value),
        })
    }

    fn if_stmt(&mut self) -> ParseResult<Stmt> {
        let start = self.advance().span; // 'if'
        self.expect(TokenKind::LeftParen)?;
        let cond = self.expression()?;
        self.expect(TokenKind::RightParen)?;
        let then_branch = self.block()?;
        let (else_branch, end) = if self.match_token(&TokenKind::Else) {
            let b = self.block()?;
            let end = b.last().map(|s| s.span).unwrap_or(start);
            (Some(b), end)
        } else {
            let end = then_branch.last().map(|s| s.span).unwrap_or(start);
            (None, end)
        };
        Ok(Stmt {
            span: start.merge(end),
            kind: StmtKind::If {
                cond,
                then_branch,
                else_branch,
            },
        })
    }

    fn block_stmt(&mut self) -> ParseResult<Stmt> {
        let start = self.peek().span;
        let stmts = self.block()?;
        let end = stmts.last().map(|s| s.span).unwrap_or(start);
        Ok(Stmt {
            span: start.merge(end),
            kind: StmtKind::Block(stmts),
        })
    }

    fn block(&mut self) -> ParseResult<Vec<Stmt>> {
        self.expect(TokenKind::LeftBrace)?;
        let mut stmts = Vec::new();
        while !self.check(&TokenKind::RightBrace) && !self.check(&TokenKind::Eof) {
            match self.statement() {
                Ok(s) => stmts.push(s),
                Err(()) => self.synchronize(),
            }
        }
        self.expect(TokenKind::RightBrace)?;
        Ok(stmts)
    }

    fn function_decl(&mut self) -> ParseResult<FunctionDecl> {
        let start = self.advance().span; // 'function'
        let (name, name_span) = self.expect_ident()?;
        self.expect(TokenKind::LeftParen)?;

        let mut params = Vec::new();
        if !self.check(&TokenKind::RightParen) {
            loop {
                let (pname, pspan) = self.expect_ident()?;
                self.expect(TokenKind::Colon)?;
                let ty = self.type_expr()?;
                params.push(Param {
                    name: pname,
                    ty,
                    span: pspan,
                });
                if !self.match_token(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RightParen)?;
        self.expect(TokenKind::Colon)?;
        let return_type = self.type_expr()?;
        let body = self.block()?;
        let end = body.last().map(|s| s.span).unwrap_or(start);

        Ok(FunctionDecl {
            name,
            name_span,
            params,
            return_type,
            body,
            span: start.merge(end),
        })
    }

    fn expr_stmt(&mut self) -> ParseResult<Stmt> {
        let mut expr = self.expression()?;
        expr.is_statement = true;
        let end = self.expect(TokenKind::Semicolon)?.span;
        Ok(Stmt {
            span: expr.span.merge(end),
            kind: StmtKind::ExprStmt(expr),
        })
    }

    fn type_expr(&mut self) -> ParseResult<TypeExpr> {
        if self.match_token(&TokenKind::LeftBracket) {
            self.expect(TokenKind::RightBracket)?;
            let inner = self.type_expr()?;
            return Ok(TypeExpr::Array(Box::new(inner)));
        }
        let span = self.peek().span;
        match self.peek().kind {
            TokenKind::IntType => {
                self.advance();
                Ok(TypeExpr::Int)
            }
            TokenKind::BoolType => {
                self.advance();
                Ok(TypeExpr::Bool)
            }
            TokenKind::Null => {
                self.advance();
                Ok(TypeExpr::Null)
            }
            _ => {
                self.diagnostics.push(Diagnostic::error(
                    error_codes::PARSE_EXPECTED_TYPE,
                    format!("expected a type, found {}", self.peek().kind.describe()),
                    span,
                ));
                Err(())
            }
        }
    }

    // --- expressions (precedence climbing) --------------------------------

    fn expression(&mut self) -> ParseResult<Expr> {
        self.or_expr()
    }

    fn or_expr(&mut self) -> ParseResult<Expr> {
        let mut lhs = self.and_expr()?;
        while self.check(&TokenKind::PipePipe) {
            self.advance();
            let rhs = self.and_expr()?;
            let span = lhs.span.merge(rhs.span);
            lhs = Expr::new(
                ExprKind::Binary {
                    op: BinOp::Or,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span,
            );
        }
        Ok(lhs)
    }

    fn and_expr(&mut self) -> ParseResult<Expr> {
        let mut lhs = self.equality_expr()?;
        while self.check(&TokenKind::AmpAmp) {
            self.advance();
            let rhs = self.equality_expr()?;
            let span = lhs.span.merge(rhs.span);
            lhs = Expr::new(
                ExprKind::Binary {
                    op: BinOp::And,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span,
            );
        }
        Ok(lhs)
    }

    fn equality_expr(&mut self) -> ParseResult<Expr> {
        let mut lhs = self.comparison_expr()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::EqualEqual => BinOp::Eq,
                TokenKind::BangEqual => BinOp::Ne,
                _ => break,
            };
            self.advance();
            let rhs = self.comparison_expr()?;
            let span = lhs.span.merge(rhs.span);
            lhs = Expr::new(
                ExprKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span,
            );
        }
        Ok(lhs)
    }

    fn comparison_expr(&mut self) -> ParseResult<Expr> {
        let mut lhs = self.additive_expr()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Less => BinOp::Lt,
                TokenKind::LessEqual => BinOp::Lte,
                TokenKind::Greater => BinOp::Gt,
                TokenKind::GreaterEqual => BinOp::Gte,
                _ => break,
            };
            self.advance();
            let rhs = self.additive_expr()?;
            let span = lhs.span.merge(rhs.span);
            lhs = Expr::new(
                ExprKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span,
            );
        }
        Ok(lhs)
    }

    fn additive_expr(&mut self) -> ParseResult<Expr> {
        let mut lhs = self.multiplicative_expr()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.multiplicative_expr()?;
            let span = lhs.span.merge(rhs.span);
            lhs = Expr::new(
                ExprKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span,
            );
        }
        Ok(lhs)
    }

    fn multiplicative_expr(&mut self) -> ParseResult<Expr> {
        let mut lhs = self.postfix_expr()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                _ => break,
            };
            self.advance();
            let rhs = self.postfix_expr()?;
            let span = lhs.span.merge(rhs.span);
            lhs = Expr::new(
                ExprKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span,
            );
        }
        Ok(lhs)
    }

    fn postfix_expr(&mut self) -> ParseResult<Expr> {
        let mut expr = self.primary_expr()?;
        loop {
            match self.peek().kind {
                TokenKind::LeftParen => {
                    self.advance();
                    let mut args = Vec::new();
                    if !self.check(&TokenKind::RightParen) {
                        loop {
                            args.push(self.expression()?);
                            if !self.match_token(&TokenKind::Comma) {
                                break;
                            }
                        }
                    }
                    let end = self.expect(TokenKind::RightParen)?.span;
                    let span = expr.span.merge(end);
                    expr = Expr::new(
                        ExprKind::Call {
                            callee: Box::new(expr),
                            args,
                        },
                        span,
                    );
                }
                TokenKind::LeftBracket => {
                    self.advance();
                    let index = self.expression()?;
                    let end = self.expect(TokenKind::RightBracket)?.span;
                    let span = expr.span.merge(end);
                    expr = Expr::new(
                        ExprKind::Index {
                            array: Box::new(expr),
                            index: Box::new(index),
                        },
                        span,
                    );
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn primary_expr(&mut self) -> ParseResult<Expr> {
        let span = self.peek().span;
        match self.peek().kind.clone() {
            TokenKind::Int(n) => {
                self.advance();
                Ok(Expr::new(ExprKind::Int(n), span))
            }
            TokenKind::True => {
                self.advance();
                Ok(Expr::new(ExprKind::Bool(true), span))
            }
            TokenKind::False => {
                self.advance();
                Ok(Expr::new(ExprKind::Bool(false), span))
            }
            TokenKind::Null => {
                self.advance();
                Ok(Expr::new(ExprKind::Null, span))
            }
            TokenKind::Ident(name) => {
                self.advance();
                Ok(Expr::new(ExprKind::Ident(name), span))
            }
            TokenKind::LeftParen => {
                self.advance();
                let inner = self.expression()?;
                self.expect(TokenKind::RightParen)?;
                Ok(inner)
            }
            TokenKind::LeftBracket => {
                self.advance();
                let mut elems = Vec::new();
                if !self.check(&TokenKind::RightBracket) {
                    loop {
                        elems.push(self.expression()?);
                        if !self.match_token(&TokenKind::Comma) {
                            break;
                        }
                    }
                }
                let end = self.expect(TokenKind::RightBracket)?.span;
                Ok(Expr::new(ExprKind::ArrayLiteral(elems), span.merge(end)))
            }
            _ => {
                self.diagnostics.push(Diagnostic::error(
                    error_codes::PARSE_UNEXPECTED_TOKEN,
                    format!("expected an expression, found {}", self.peek().kind.describe()),
                    span,
                ));
                Err(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn parse(source: &str) -> Program {
        let (tokens, diags) = Lexer::new(source).tokenize();
        assert!(diags.is_empty());
        Parser::new(tokens).parse().expect("parse should succeed")
    }

    #[test]
    fn parses_var_decl_with_initializer() {
        let program = parse("var x:int = 1 + 2;");
        assert_eq!(program.statements.len(), 1);
        assert!(matches!(program.statements[0].kind, StmtKind::VarDecl { .. }));
    }

    #[test]
    fn parses_if_else() {
        let program = parse("if (1 == 2) { return 7; } else { return 9; }");
        assert!(matches!(program.statements[0].kind, StmtKind::If { .. }));
    }

    #[test]
    fn parses_function_decl() {
        let program = parse("function add(a:int, b:int):int { return a+b; }");
        match &program.statements[0].kind {
            StmtKind::FunctionDecl(f) => {
                assert_eq!(f.name, "add");
                assert_eq!(f.params.len(), 2);
            }
            _ => panic!("expected function decl"),
        }
    }

    #[test]
    fn parses_array_index() {
        let program = parse("var xs:[]int = [1,2,3]; return xs[2];");
        assert_eq!(program.statements.len(), 2);
    }

    #[test]
    fn distinguishes_assignment_from_expr_statement() {
        let program = parse("x = 1; 1 + 1;");
        assert!(matches!(program.statements[0].kind, StmtKind::Assign { .. }));
        assert!(matches!(program.statements[1].kind, StmtKind::ExprStmt(_)));
    }

    #[test]
    fn reports_unexpected_token() {
        let (tokens, _) = Lexer::new("var x = ;").tokenize();
        let result = Parser::new(tokens).parse();
        assert!(result.is_err());
    }
}
