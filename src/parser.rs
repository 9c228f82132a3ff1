// ABOUTME: Recursive-descent parser turning a token stream into a Program AST

use crate::ast::{
    BinaryOp, Expr, ExprKind, FunctionDecl, LiteralValue, LogicalOp, NodeIdGen, Program, Stmt, StmtKind, UnaryOp,
};
use crate::error::{ErrorList, LoxError};
use crate::token::{Literal as TokLiteral, Token, TokenKind};

type ParseResult<T> = Result<T, LoxError>;

/// Parses a finished token stream (must end in `EOF`) into a `Program`,
/// accumulating syntax errors and resynchronizing after each one so a single
/// run can report more than one problem.
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    errors: ErrorList,
    ids: NodeIdGen,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser {
            tokens,
            current: 0,
            errors: ErrorList::new(),
            ids: NodeIdGen::new(),
        }
    }

    pub fn parse(mut self) -> (Program, ErrorList) {
        let mut statements = Vec::new();
        while !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }
        (statements, self.errors)
    }

    // ---- token stream primitives ----

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current - 1]
    }

    fn advance(&mut self) -> Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous().clone()
    }

    fn check(&self, kind: TokenKind) -> bool {
        !self.is_at_end() && self.peek().kind == kind
    }

    fn match_kind(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume(&mut self, kind: TokenKind, message: &str) -> ParseResult<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(LoxError::parse(self.peek(), message))
        }
    }

    fn mk_expr(&mut self, kind: ExprKind) -> Expr {
        Expr::new(self.ids.next(), kind)
    }

    fn synchronize(&mut self) {
        self.advance();
        while !self.is_at_end() {
            if self.previous().kind == TokenKind::Semicolon {
                return;
            }
            match self.peek().kind {
                TokenKind::Class
                | TokenKind::Fun
                | TokenKind::Var
                | TokenKind::For
                | TokenKind::If
                | TokenKind::While
                | TokenKind::Print
                | TokenKind::Return => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    // ---- declarations & statements ----

    fn declaration(&mut self) -> Option<Stmt> {
        let result = if self.match_kind(TokenKind::Var) {
            self.var_declaration()
        } else if self.match_kind(TokenKind::Fun) {
            self.fun_declaration("function")
                .map(|decl| Stmt::new(StmtKind::Function(decl)))
        } else if self.match_kind(TokenKind::Class) {
            self.class_declaration()
        } else {
            self.statement()
        };

        match result {
            Ok(stmt) => Some(stmt),
            Err(err) => {
                self.errors.push(err);
                self.synchronize();
                None
            }
        }
    }

    fn var_declaration(&mut self) -> ParseResult<Stmt> {
        let name = self.consume(TokenKind::Identifier, "Expected identifier after 'var'.")?;
        let initializer = if self.match_kind(TokenKind::Equal) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenKind::Semicolon, "Expected ';' after variable declaration.")?;
        Ok(Stmt::new(StmtKind::Var { name, initializer }))
    }

    fn fun_declaration(&mut self, kind: &str) -> ParseResult<FunctionDecl> {
        let name = self.consume(TokenKind::Identifier, &format!("Expected {} name.", kind))?;
        self.consume(TokenKind::LeftParen, &format!("Expected '(' after {} name.", kind))?;
        let mut params = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                if params.len() >= 255 {
                    self.errors
                        .push(LoxError::parse(self.peek(), "Can't have more than 255 parameters."));
                }
                params.push(self.consume(TokenKind::Identifier, "Expected parameter name.")?);
                if !self.match_kind(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen, "Expected ')' after parameters.")?;
        self.consume(TokenKind::LeftBrace, &format!("Expected '{{' before {} body.", kind))?;
        let body = self.block_statements()?;
        Ok(FunctionDecl { name, params, body })
    }

    fn class_declaration(&mut self) -> ParseResult<Stmt> {
        let name = self.consume(TokenKind::Identifier, "Expected class name.")?;
        self.consume(TokenKind::LeftBrace, "Expected '{' before class body.")?;

        let mut constructor = None;
        let mut methods = Vec::new();
        let mut static_methods = Vec::new();

        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            let is_static = self.match_kind(TokenKind::Class);
            let decl = self.fun_declaration("method")?;
            if is_static {
                static_methods.push(decl);
            } else if decl.name.lexeme == "init" {
                constructor = Some(decl);
            } else {
                methods.push(decl);
            }
        }

        self.consume(TokenKind::RightBrace, "Expected '}' after class body.")?;
        Ok(Stmt::new(StmtKind::Class {
            name,
            constructor,
            methods,
            static_methods,
        }))
    }

    fn block_statements(&mut self) -> ParseResult<Vec<Stmt>> {
        let mut statements = Vec::new();
        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }
        self.consume(TokenKind::RightBrace, "Expected '}' after block.")?;
        Ok(statements)
    }

    fn statement(&mut self) -> ParseResult<Stmt> {
        if self.match_kind(TokenKind::Print) {
            return self.print_statement();
        }
        if self.match_kind(TokenKind::Return) {
            return self.return_statement();
        }
        if self.match_kind(TokenKind::If) {
            return self.if_statement();
        }
        if self.match_kind(TokenKind::While) {
            return self.while_statement();
        }
        if self.match_kind(TokenKind::For) {
            return self.for_statement();
        }
        if self.match_kind(TokenKind::LeftBrace) {
            return Ok(Stmt::new(StmtKind::Block(self.block_statements()?)));
        }
        self.expression_statement()
    }

    fn print_statement(&mut self) -> ParseResult<Stmt> {
        let value = self.expression()?;
        self.consume(TokenKind::Semicolon, "Expected ';' after value.")?;
        Ok(Stmt::new(StmtKind::Print(value)))
    }

    fn return_statement(&mut self) -> ParseResult<Stmt> {
        let keyword = self.previous().clone();
        let value = if !self.check(TokenKind::Semicolon) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenKind::Semicolon, "Expected ';' after return value.")?;
        Ok(Stmt::new(StmtKind::Return { keyword, value }))
    }

    fn if_statement(&mut self) -> ParseResult<Stmt> {
        self.consume(TokenKind::LeftParen, "Expected '(' after 'if'.")?;
        let condition = self.expression()?;
        self.consume(TokenKind::RightParen, "Expected ')' after condition.")?;
        let then_branch = Box::new(self.statement()?);
        let else_branch = if self.match_kind(TokenKind::Else) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };
        Ok(Stmt::new(StmtKind::If {
            condition,
            then_branch,
            else_branch,
        }))
    }

    fn while_statement(&mut self) -> ParseResult<Stmt> {
        self.consume(TokenKind::LeftParen, "Expected '(' after 'while'.")?;
        let condition = self.expression()?;
        self.consume(TokenKind::RightParen, "Expected ')' after condition.")?;
        let body = Box::new(self.statement()?);
        Ok(Stmt::new(StmtKind::While { condition, body }))
    }

    /// Desugars `for (init; cond; incr) body` into a `while` wrapped in the
    /// blocks needed to scope `init` and to re-run `incr` every iteration.
    fn for_statement(&mut self) -> ParseResult<Stmt> {
        self.consume(TokenKind::LeftParen, "Expected '(' after 'for'.")?;

        let initializer = if self.match_kind(TokenKind::Semicolon) {
            None
        } else if self.match_kind(TokenKind::Var) {
            Some(self.var_declaration()?)
        } else {
            Some(self.expression_statement()?)
        };

        let condition = if !self.check(TokenKind::Semicolon) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenKind::Semicolon, "Expected ';' after loop condition.")?;

        let increment = if !self.check(TokenKind::RightParen) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenKind::RightParen, "Expected ')' after for clauses.")?;

        let mut body = self.statement()?;

        if let Some(increment) = increment {
            body = Stmt::new(StmtKind::Block(vec![body, Stmt::new(StmtKind::Expr(increment))]));
        }

        let condition = condition.unwrap_or_else(|| self.mk_expr(ExprKind::Literal(LiteralValue::True)));
        body = Stmt::new(StmtKind::While {
            condition,
            body: Box::new(body),
        });

        if let Some(initializer) = initializer {
            body = Stmt::new(StmtKind::Block(vec![initializer, body]));
        }

        Ok(body)
    }

    fn expression_statement(&mut self) -> ParseResult<Stmt> {
        if self.match_kind(TokenKind::Semicolon) {
            // Bare ';' is a no-op expression statement evaluating to nil.
            let nil = self.mk_expr(ExprKind::Literal(LiteralValue::Nil));
            return Ok(Stmt::new(StmtKind::Expr(nil)));
        }
        let expr = self.expression()?;
        self.consume(TokenKind::Semicolon, "Expected ';' after expression.")?;
        Ok(Stmt::new(StmtKind::Expr(expr)))
    }

    // ---- expressions, lowest to highest precedence ----

    fn expression(&mut self) -> ParseResult<Expr> {
        self.assignment()
    }

    fn assignment(&mut self) -> ParseResult<Expr> {
        let expr = self.logic_or()?;

        if self.check(TokenKind::Equal) {
            match expr.kind {
                ExprKind::Var { name } => {
                    self.advance(); // consume '='
                    let value = self.assignment()?;
                    return Ok(self.mk_expr(ExprKind::Assign {
                        name,
                        value: Box::new(value),
                    }));
                }
                ExprKind::GetProperty { object, name } => {
                    self.advance(); // consume '='
                    let value = self.assignment()?;
                    return Ok(self.mk_expr(ExprKind::SetProperty {
                        object,
                        name,
                        value: Box::new(value),
                    }));
                }
                other => {
                    // Do not consume '=' so resynchronization stays aligned.
                    self.errors
                        .push(LoxError::parse(self.peek(), "Invalid assignment target."));
                    return Ok(Expr::new(expr.id, other));
                }
            }
        }

        Ok(expr)
    }

    fn logic_or(&mut self) -> ParseResult<Expr> {
        let mut left = self.logic_and()?;
        while self.match_kind(TokenKind::Or) {
            let right = self.logic_and()?;
            left = self.mk_expr(ExprKind::Logical {
                left: Box::new(left),
                op: LogicalOp::Or,
                right: Box::new(right),
            });
        }
        Ok(left)
    }

    fn logic_and(&mut self) -> ParseResult<Expr> {
        let mut left = self.equality()?;
        while self.match_kind(TokenKind::And) {
            let right = self.equality()?;
            left = self.mk_expr(ExprKind::Logical {
                left: Box::new(left),
                op: LogicalOp::And,
                right: Box::new(right),
            });
        }
        Ok(left)
    }

    fn equality(&mut self) -> ParseResult<Expr> {
        let mut left = self.comparison()?;
        loop {
            let op = if self.match_kind(TokenKind::BangEqual) {
                BinaryOp::NotEqual
            } else if self.match_kind(TokenKind::EqualEqual) {
                BinaryOp::Equal
            } else {
                break;
            };
            let op_token = self.previous().clone();
            let right = self.comparison()?;
            left = self.mk_expr(ExprKind::Binary {
                left: Box::new(left),
                op,
                op_token,
                right: Box::new(right),
            });
        }
        Ok(left)
    }

    fn comparison(&mut self) -> ParseResult<Expr> {
        let mut left = self.term()?;
        loop {
            let op = if self.match_kind(TokenKind::Greater) {
                BinaryOp::Greater
            } else if self.match_kind(TokenKind::GreaterEqual) {
                BinaryOp::GreaterEqual
            } else if self.match_kind(TokenKind::Less) {
                BinaryOp::Less
            } else if self.match_kind(TokenKind::LessEqual) {
                BinaryOp::LessEqual
            } else {
                break;
            };
            let op_token = self.previous().clone();
            let right = self.term()?;
            left = self.mk_expr(ExprKind::Binary {
                left: Box::new(left),
                op,
                op_token,
                right: Box::new(right),
            });
        }
        Ok(left)
    }

    fn term(&mut self) -> ParseResult<Expr> {
        let mut left = self.factor()?;
        loop {
            let op = if self.match_kind(TokenKind::Minus) {
                BinaryOp::Subtract
            } else if self.match_kind(TokenKind::Plus) {
                BinaryOp::Add
            } else {
                break;
            };
            let op_token = self.previous().clone();
            let right = self.factor()?;
            left = self.mk_expr(ExprKind::Binary {
                left: Box::new(left),
                op,
                op_token,
                right: Box::new(right),
            });
        }
        Ok(left)
    }

    fn factor(&mut self) -> ParseResult<Expr> {
        let mut left = self.unary()?;
        loop {
            let op = if self.match_kind(TokenKind::Slash) {
                BinaryOp::Divide
            } else if self.match_kind(TokenKind::Star) {
                BinaryOp::Multiply
            } else {
                break;
            };
            let op_token = self.previous().clone();
            let right = self.unary()?;
            left = self.mk_expr(ExprKind::Binary {
                left: Box::new(left),
                op,
                op_token,
                right: Box::new(right),
            });
        }
        Ok(left)
    }

    fn unary(&mut self) -> ParseResult<Expr> {
        if self.match_kind(TokenKind::Bang) || self.match_kind(TokenKind::Minus) {
            let op_token = self.previous().clone();
            let op = if op_token.kind == TokenKind::Bang {
                UnaryOp::Not
            } else {
                UnaryOp::Negate
            };
            let right = self.unary()?;
            return Ok(self.mk_expr(ExprKind::Unary {
                op,
                op_token,
                right: Box::new(right),
            }));
        }
        self.call()
    }

    fn call(&mut self) -> ParseResult<Expr> {
        let mut expr = self.primary()?;
        loop {
            if self.match_kind(TokenKind::LeftParen) {
                expr = self.finish_call(expr)?;
            } else if self.match_kind(TokenKind::Dot) {
                let name = self.consume(TokenKind::Identifier, "Expected property name after '.'.")?;
                expr = self.mk_expr(ExprKind::GetProperty {
                    object: Box::new(expr),
                    name,
                });
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> ParseResult<Expr> {
        let mut arguments = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                if arguments.len() >= 255 {
                    self.errors
                        .push(LoxError::parse(self.peek(), "Can't have more than 255 arguments."));
                }
                arguments.push(self.expression()?);
                if !self.match_kind(TokenKind::Comma) {
                    break;
                }
            }
        }
        let paren = self.consume(TokenKind::RightParen, "Expected ')' after arguments.")?;
        Ok(self.mk_expr(ExprKind::Call {
            callee: Box::new(callee),
            paren,
            arguments,
        }))
    }

    fn primary(&mut self) -> ParseResult<Expr> {
        if self.match_kind(TokenKind::False) {
            return Ok(self.mk_expr(ExprKind::Literal(LiteralValue::False)));
        }
        if self.match_kind(TokenKind::True) {
            return Ok(self.mk_expr(ExprKind::Literal(LiteralValue::True)));
        }
        if self.match_kind(TokenKind::Nil) {
            return Ok(self.mk_expr(ExprKind::Literal(LiteralValue::Nil)));
        }
        if self.match_kind(TokenKind::Number) {
            let value = match &self.previous().literal {
                Some(TokLiteral::Number(n)) => *n,
                _ => return Err(LoxError::internal("number token missing literal")),
            };
            return Ok(self.mk_expr(ExprKind::Literal(LiteralValue::Number(value))));
        }
        if self.match_kind(TokenKind::String) {
            let value = match &self.previous().literal {
                Some(TokLiteral::Str(s)) => s.clone(),
                _ => return Err(LoxError::internal("string token missing literal")),
            };
            return Ok(self.mk_expr(ExprKind::Literal(LiteralValue::Str(value))));
        }
        if self.match_kind(TokenKind::This) {
            let keyword = self.previous().clone();
            return Ok(self.mk_expr(ExprKind::This { keyword }));
        }
        if self.match_kind(TokenKind::Identifier) {
            let name = self.previous().clone();
            return Ok(self.mk_expr(ExprKind::Var { name }));
        }
        if self.match_kind(TokenKind::LeftParen) {
            let inner = self.expression()?;
            self.consume(TokenKind::RightParen, "Expected ')' after expression.")?;
            return Ok(self.mk_expr(ExprKind::Grouping(Box::new(inner))));
        }
        Err(LoxError::parse(self.peek(), "Expected expression."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::Scanner;

    fn parse(source: &str) -> (Program, ErrorList) {
        let (tokens, errors) = Scanner::new(source).scan_tokens();
        assert!(errors.is_empty());
        Parser::new(tokens).parse()
    }

    #[test]
    fn parses_print_statement() {
        let (program, errors) = parse("print 1 + 2;");
        assert!(errors.is_empty());
        assert_eq!(program.len(), 1);
        assert!(matches!(program[0].kind, StmtKind::Print(_)));
    }

    #[test]
    fn invalid_assignment_target_does_not_consume_equals() {
        let (_, errors) = parse("1 = 2;");
        assert_eq!(errors.len(), 1);
        assert!(errors.iter().next().unwrap().to_string().contains("Invalid assignment target"));
    }

    #[test]
    fn for_loop_desugars_to_block_and_while() {
        let (program, errors) = parse("for (var i=0;i<3;i=i+1) print i;");
        assert!(errors.is_empty());
        assert_eq!(program.len(), 1);
        match &program[0].kind {
            StmtKind::Block(stmts) => {
                assert_eq!(stmts.len(), 2);
                assert!(matches!(stmts[0].kind, StmtKind::Var { .. }));
                assert!(matches!(stmts[1].kind, StmtKind::While { .. }));
            }
            other => panic!("expected desugared block, got {:?}", other),
        }
    }

    #[test]
    fn class_with_constructor_and_static_method() {
        let (program, errors) = parse("class C { init(x) { this.x = x; } class make() { return 1; } }");
        assert!(errors.is_empty());
        match &program[0].kind {
            StmtKind::Class {
                constructor,
                static_methods,
                methods,
                ..
            } => {
                assert!(constructor.is_some());
                assert_eq!(static_methods.len(), 1);
                assert!(methods.is_empty());
            }
            other => panic!("expected class statement, got {:?}", other),
        }
    }

    #[test]
    fn parse_error_recovers_via_synchronize() {
        let (_, errors) = parse("var; var ok = 1;");
        assert!(!errors.is_empty());
    }

    #[test]
    fn unterminated_block_reports_error() {
        let (_, errors) = parse("{ print 1;");
        assert_eq!(errors.len(), 1);
        assert!(errors.iter().next().unwrap().to_string().contains("'}'"));
    }
}
