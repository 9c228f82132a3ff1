// ABOUTME: S-expression AST pretty-printer backing the `parser` CLI subcommand

use crate::ast::{BinaryOp, Expr, ExprKind, FunctionDecl, LiteralValue, LogicalOp, Program, Stmt, StmtKind, UnaryOp};

pub fn print_program(program: &Program) -> String {
    program.iter().map(print_stmt).collect::<Vec<_>>().join("\n")
}

fn print_stmt(stmt: &Stmt) -> String {
    match &stmt.kind {
        StmtKind::Print(expr) => format!("(print {});", print_expr(expr)),
        StmtKind::Return { value, .. } => match value {
            Some(expr) => format!("(return {});", print_expr(expr)),
            None => "(return);".to_string(),
        },
        StmtKind::Expr(expr) => format!("{};", print_expr(expr)),
        StmtKind::If {
            condition,
            then_branch,
            else_branch,
        } => {
            let mut out = format!("if ({}):\n  {}", print_expr(condition), indent(&print_stmt(then_branch)));
            if let Some(else_branch) = else_branch {
                out.push_str(&format!("\nelse:\n  {}", indent(&print_stmt(else_branch))));
            }
            out
        }
        StmtKind::While { condition, body } => {
            format!("while ({}):\n  {}", print_expr(condition), indent(&print_stmt(body)))
        }
        StmtKind::Block(stmts) => {
            let inner = stmts
                .iter()
                .map(|s| indent(&print_stmt(s)))
                .collect::<Vec<_>>()
                .join("\n");
            format!("{{\n{}\n}}", inner)
        }
        StmtKind::Var { name, initializer } => match initializer {
            Some(expr) => format!("(var {} = {});", name.lexeme, print_expr(expr)),
            None => format!("(var {});", name.lexeme),
        },
        StmtKind::Function(decl) => print_function(decl, "fun"),
        StmtKind::Class {
            name,
            constructor,
            methods,
            static_methods,
        } => {
            let mut body = Vec::new();
            if let Some(ctor) = constructor {
                body.push(print_function(ctor, "method"));
            }
            for method in methods {
                body.push(print_function(method, "method"));
            }
            for method in static_methods {
                body.push(print_function(method, "static method"));
            }
            format!("(class {} {{\n{}\n}})", name.lexeme, indent(&body.join("\n")))
        }
    }
}

fn print_function(decl: &FunctionDecl, kind: &str) -> String {
    let params = decl
        .params
        .iter()
        .map(|p| p.lexeme.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    let body = decl
        .body
        .iter()
        .map(|s| indent(&print_stmt(s)))
        .collect::<Vec<_>>()
        .join("\n");
    format!("({} {}({}) {{\n{}\n}})", kind, decl.name.lexeme, params, body)
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|line| format!("  {}", line))
        .collect::<Vec<_>>()
        .join("\n")
}

fn print_expr(expr: &Expr) -> String {
    match &expr.kind {
        ExprKind::Literal(lit) => print_literal(lit),
        ExprKind::Grouping(inner) => format!("(group {})", print_expr(inner)),
        ExprKind::Unary { op, right, .. } => format!("({} {})", unary_symbol(op), print_expr(right)),
        ExprKind::Binary { left, op, right, .. } => {
            format!("({} {} {})", binary_symbol(op), print_expr(left), print_expr(right))
        }
        ExprKind::Logical { left, op, right } => {
            format!("({} {} {})", logical_symbol(op), print_expr(left), print_expr(right))
        }
        ExprKind::Var { name } => format!("(var {})", name.lexeme),
        ExprKind::Assign { name, value } => format!("(assign {} {})", name.lexeme, print_expr(value)),
        ExprKind::Call { callee, arguments, .. } => {
            let args = arguments.iter().map(print_expr).collect::<Vec<_>>().join(", ");
            format!("(call {}({}))", print_expr(callee), args)
        }
        ExprKind::GetProperty { object, name } => format!("(get {} {})", print_expr(object), name.lexeme),
        ExprKind::SetProperty { object, name, value } => {
            format!("(set {} {} {})", print_expr(object), name.lexeme, print_expr(value))
        }
        ExprKind::This { .. } => "(this)".to_string(),
    }
}

fn print_literal(lit: &LiteralValue) -> String {
    match lit {
        LiteralValue::Number(n) => crate::token::format_number(*n),
        LiteralValue::Str(s) => format!("\"{}\"", s),
        LiteralValue::True => "true".to_string(),
        LiteralValue::False => "false".to_string(),
        LiteralValue::Nil => "nil".to_string(),
    }
}

fn unary_symbol(op: &UnaryOp) -> &'static str {
    match op {
        UnaryOp::Negate => "-",
        UnaryOp::Not => "!",
    }
}

fn binary_symbol(op: &BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "+",
        BinaryOp::Subtract => "-",
        BinaryOp::Multiply => "*",
        BinaryOp::Divide => "/",
        BinaryOp::Equal => "==",
        BinaryOp::NotEqual => "!=",
        BinaryOp::Less => "<",
        BinaryOp::LessEqual => "<=",
        BinaryOp::Greater => ">",
        BinaryOp::GreaterEqual => ">=",
    }
}

fn logical_symbol(op: &LogicalOp) -> &'static str {
    match op {
        LogicalOp::And => "and",
        LogicalOp::Or => "or",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use crate::scanner::Scanner;

    fn print_source(source: &str) -> String {
        let (tokens, errors) = Scanner::new(source).scan_tokens();
        assert!(errors.is_empty());
        let (program, errors) = Parser::new(tokens).parse();
        assert!(errors.is_empty(), "{:?}", errors);
        print_program(&program)
    }

    #[test]
    fn binary_expression_statement() {
        assert_eq!(print_source("1 + 2;"), "(+ 1 2);");
    }

    #[test]
    fn grouping_expression() {
        assert_eq!(print_source("(1 + 2) * 3;"), "(* (group (+ 1 2)) 3);");
    }

    #[test]
    fn print_statement_shape() {
        assert_eq!(print_source("print \"hi\";"), "(print \"hi\");");
    }

    #[test]
    fn var_declaration_shape() {
        assert_eq!(print_source("var x = 1;"), "(var x = 1);");
    }

    #[test]
    fn assignment_and_call_shapes() {
        assert_eq!(print_source("x = 1;"), "(assign x 1);");
        assert_eq!(print_source("f(1, 2);"), "(call (var f)(1, 2));");
    }
}
