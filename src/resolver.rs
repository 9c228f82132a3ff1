// ABOUTME: Static scope-distance resolver run between parsing and evaluation

use crate::ast::{Expr, ExprKind, FunctionDecl, NodeId, Program, Stmt, StmtKind};
use crate::error::{ErrorList, LoxError};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq)]
enum FunctionType {
    None,
    Function,
    Method,
    Initializer,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ClassType {
    None,
    Class,
}

/// Walks the AST once, building a map from expression id to lexical-scope
/// distance and collecting static errors (bad `this`, bad `return`, reading
/// a variable from its own initializer).
pub struct Resolver {
    scopes: Vec<HashMap<String, bool>>,
    distances: HashMap<NodeId, usize>,
    errors: ErrorList,
    current_function: FunctionType,
    current_class: ClassType,
}

impl Resolver {
    pub fn new() -> Self {
        Resolver {
            scopes: Vec::new(),
            distances: HashMap::new(),
            errors: ErrorList::new(),
            current_function: FunctionType::None,
            current_class: ClassType::None,
        }
    }

    pub fn resolve(mut self, program: &Program) -> (HashMap<NodeId, usize>, ErrorList) {
        self.resolve_stmts(program);
        (self.distances, self.errors)
    }

    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name_token: &crate::token::Token) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name_token.lexeme.clone(), false);
        }
    }

    fn define(&mut self, name_token: &crate::token::Token) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name_token.lexeme.clone(), true);
        }
    }

    fn resolve_local(&mut self, id: NodeId, name: &str) {
        let depth = self.scopes.len();
        for (i, scope) in self.scopes.iter().enumerate().rev() {
            if scope.contains_key(name) {
                self.distances.insert(id, depth - 1 - i);
                return;
            }
        }
        // Not found in any local scope: leave unrecorded, meaning global.
    }

    fn resolve_stmts(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            self.resolve_stmt(stmt);
        }
    }

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Print(expr) => self.resolve_expr(expr),
            StmtKind::Expr(expr) => self.resolve_expr(expr),
            StmtKind::Return { keyword, value } => {
                if self.current_function == FunctionType::Initializer && value.is_some() {
                    self.errors.push(LoxError::static_err(
                        keyword,
                        "Can't return a value from a constructor.",
                    ));
                }
                if let Some(value) = value {
                    self.resolve_expr(value);
                }
            }
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_stmt(then_branch);
                if let Some(else_branch) = else_branch {
                    self.resolve_stmt(else_branch);
                }
            }
            StmtKind::While { condition, body } => {
                self.resolve_expr(condition);
                self.resolve_stmt(body);
            }
            StmtKind::Block(stmts) => {
                self.begin_scope();
                self.resolve_stmts(stmts);
                self.end_scope();
            }
            StmtKind::Var { name, initializer } => {
                self.declare(name);
                if let Some(initializer) = initializer {
                    self.resolve_expr(initializer);
                }
                self.define(name);
            }
            StmtKind::Function(decl) => {
                self.declare(&decl.name);
                self.define(&decl.name);
                self.resolve_function(decl, FunctionType::Function);
            }
            StmtKind::Class {
                name,
                constructor,
                methods,
                static_methods,
            } => {
                let enclosing_class = self.current_class;
                self.current_class = ClassType::Class;
                self.declare(name);
                self.define(name);

                self.begin_scope();
                if let Some(scope) = self.scopes.last_mut() {
                    scope.insert("this".to_string(), true);
                }
                if let Some(constructor) = constructor {
                    self.resolve_function(constructor, FunctionType::Initializer);
                }
                for method in methods {
                    self.resolve_function(method, FunctionType::Method);
                }
                self.end_scope();

                // Static methods have no `this` binding available.
                for method in static_methods {
                    self.resolve_function(method, FunctionType::Function);
                }

                self.current_class = enclosing_class;
            }
        }
    }

    fn resolve_function(&mut self, decl: &FunctionDecl, fn_type: FunctionType) {
        let enclosing_function = self.current_function;
        self.current_function = fn_type;

        self.begin_scope();
        for param in &decl.params {
            self.declare(param);
            self.define(param);
        }
        self.resolve_stmts(&decl.body);
        self.end_scope();

        self.current_function = enclosing_function;
    }

    fn resolve_expr(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Literal(_) => {}
            ExprKind::Grouping(inner) => self.resolve_expr(inner),
            ExprKind::Unary { right, .. } => self.resolve_expr(right),
            ExprKind::Binary { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }
            ExprKind::Logical { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }
            ExprKind::Var { name } => {
                if let Some(scope) = self.scopes.last() {
                    if scope.get(&name.lexeme) == Some(&false) {
                        self.errors.push(LoxError::static_err(
                            name,
                            "Can't read local variable in its own initializer.",
                        ));
                    }
                }
                self.resolve_local(expr.id, &name.lexeme);
            }
            ExprKind::Assign { name, value } => {
                self.resolve_expr(value);
                self.resolve_local(expr.id, &name.lexeme);
            }
            ExprKind::Call { callee, arguments, .. } => {
                self.resolve_expr(callee);
                for arg in arguments {
                    self.resolve_expr(arg);
                }
            }
            ExprKind::GetProperty { object, .. } => self.resolve_expr(object),
            ExprKind::SetProperty { object, value, .. } => {
                self.resolve_expr(object);
                self.resolve_expr(value);
            }
            ExprKind::This { keyword } => {
                if self.current_class == ClassType::None {
                    self.errors
                        .push(LoxError::static_err(keyword, "Can't use 'this' outside of a class."));
                } else {
                    self.resolve_local(expr.id, "this");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use crate::scanner::Scanner;

    fn resolve_source(source: &str) -> (HashMap<NodeId, usize>, ErrorList) {
        let (tokens, scan_errors) = Scanner::new(source).scan_tokens();
        assert!(scan_errors.is_empty());
        let (program, parse_errors) = Parser::new(tokens).parse();
        assert!(parse_errors.is_empty(), "parse errors: {:?}", parse_errors);
        Resolver::new().resolve(&program)
    }

    #[test]
    fn reading_own_initializer_is_a_static_error() {
        let (_, errors) = resolve_source("{ var a = a; }");
        assert_eq!(errors.len(), 1);
        assert!(errors.iter().next().unwrap().to_string().contains("initializer"));
    }

    #[test]
    fn this_outside_class_is_a_static_error() {
        let (_, errors) = resolve_source("print this;");
        assert_eq!(errors.len(), 1);
        assert!(errors.iter().next().unwrap().to_string().contains("this"));
    }

    #[test]
    fn return_value_inside_constructor_is_a_static_error() {
        let (_, errors) = resolve_source("class C { init() { return 1; } }");
        assert_eq!(errors.len(), 1);
        assert!(errors.iter().next().unwrap().to_string().contains("return"));
    }

    #[test]
    fn local_variable_gets_zero_distance() {
        let (distances, errors) = resolve_source("{ var a = 1; print a; }");
        assert!(errors.is_empty());
        assert_eq!(distances.values().next().copied(), Some(0));
    }

    #[test]
    fn global_variable_is_unresolved() {
        let (distances, errors) = resolve_source("var a = 1; print a;");
        assert!(errors.is_empty());
        assert!(distances.is_empty());
    }

    #[test]
    fn closure_distance_counts_scope_depth() {
        let (distances, errors) =
            resolve_source("fun outer() { var a = 1; fun inner() { print a; } inner(); }");
        assert!(errors.is_empty());
        assert!(distances.values().any(|&d| d == 1));
    }
}
