// ABOUTME: Tree-walking evaluator: statement/expression dispatch over the resolved AST

use crate::ast::{BinaryOp, Expr, ExprKind, LogicalOp, NodeId, Program, Stmt, StmtKind, UnaryOp, LiteralValue};
use crate::callable::{next_object_id, Callable, Instance, LoxClass, LoxFunction, NativeFunction};
use crate::environment::Environment;
use crate::error::LoxError;
use crate::token::Token;
use crate::value::Value;
use std::collections::HashMap;
use std::io::Write;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

/// The outcome of executing a statement: either normal fall-through, or a
/// non-local `return` carrying its value up to the nearest call frame.
pub enum ExecSignal {
    Normal,
    Return(Value),
}

/// Owns the persistent global scope and the current environment pointer.
/// A single instance is reused across REPL lines; scripts construct a fresh
/// one per run.
pub struct Interpreter {
    globals: Rc<Environment>,
    environment: Rc<Environment>,
    distances: HashMap<NodeId, usize>,
}

fn native_clock(_args: &[Value]) -> Value {
    let seconds = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0);
    Value::Number(seconds)
}

impl Interpreter {
    pub fn new() -> Self {
        let globals = Environment::new_global();
        globals.define_unchecked(
            "clock",
            Value::Callable(Callable::Native(Rc::new(NativeFunction {
                name: "clock".to_string(),
                arity: 0,
                func: native_clock,
                id: next_object_id(),
            }))),
        );
        Interpreter {
            environment: Rc::clone(&globals),
            globals,
            distances: HashMap::new(),
        }
    }

    /// Installs the resolver's distance map for the program about to run.
    /// In REPL mode this is replaced before every line, while `globals`
    /// (and therefore previously defined names) persists.
    pub fn set_distances(&mut self, distances: HashMap<NodeId, usize>) {
        self.distances = distances;
    }

    pub fn interpret(&mut self, program: &Program) -> Result<(), LoxError> {
        for stmt in program {
            self.execute_stmt(stmt)?;
        }
        Ok(())
    }

    fn lookup(&self, id: NodeId, name: &Token) -> Result<Value, LoxError> {
        if let Some(&distance) = self.distances.get(&id) {
            self.environment
                .get_at(distance, &name.lexeme)
                .ok_or_else(|| LoxError::runtime(name, format!("Variable '{}' is not defined.", name.lexeme)))
        } else {
            self.environment
                .get_global(&name.lexeme)
                .ok_or_else(|| LoxError::runtime(name, format!("Variable '{}' is not defined.", name.lexeme)))
        }
    }

    fn execute_block(&mut self, stmts: &[Stmt], env: Rc<Environment>) -> Result<ExecSignal, LoxError> {
        let previous = Rc::clone(&self.environment);
        self.environment = env;
        let mut outcome = Ok(ExecSignal::Normal);
        for stmt in stmts {
            match self.execute_stmt(stmt) {
                Ok(ExecSignal::Normal) => continue,
                Ok(signal @ ExecSignal::Return(_)) => {
                    outcome = Ok(signal);
                    break;
                }
                Err(err) => {
                    outcome = Err(err);
                    break;
                }
            }
        }
        self.environment = previous;
        outcome
    }

    fn execute_stmt(&mut self, stmt: &Stmt) -> Result<ExecSignal, LoxError> {
        match &stmt.kind {
            StmtKind::Print(expr) => {
                let value = self.evaluate(expr)?;
                print!("{}", value);
                std::io::stdout().flush().ok();
                Ok(ExecSignal::Normal)
            }
            StmtKind::Expr(expr) => {
                self.evaluate(expr)?;
                Ok(ExecSignal::Normal)
            }
            StmtKind::Return { value, .. } => {
                let result = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                Ok(ExecSignal::Return(result))
            }
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute_stmt(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute_stmt(else_branch)
                } else {
                    Ok(ExecSignal::Normal)
                }
            }
            StmtKind::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    match self.execute_stmt(body)? {
                        ExecSignal::Normal => continue,
                        signal @ ExecSignal::Return(_) => return Ok(signal),
                    }
                }
                Ok(ExecSignal::Normal)
            }
            StmtKind::Block(stmts) => {
                let env = Environment::child(&self.environment);
                self.execute_block(stmts, env)
            }
            StmtKind::Var { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                self.environment.define(name, value)?;
                Ok(ExecSignal::Normal)
            }
            StmtKind::Function(decl) => {
                let function = LoxFunction::new(decl, Rc::clone(&self.environment), false);
                self.environment
                    .define(&decl.name, Value::Callable(Callable::Function(Rc::new(function))))?;
                Ok(ExecSignal::Normal)
            }
            StmtKind::Class {
                name,
                constructor,
                methods,
                static_methods,
            } => {
                let closure = Rc::clone(&self.environment);
                let mut method_map = HashMap::new();
                for method in methods {
                    method_map.insert(
                        method.name.lexeme.clone(),
                        Rc::new(LoxFunction::new(method, Rc::clone(&closure), false)),
                    );
                }
                let mut static_map = HashMap::new();
                for method in static_methods {
                    static_map.insert(
                        method.name.lexeme.clone(),
                        Rc::new(LoxFunction::new(method, Rc::clone(&closure), false)),
                    );
                }
                let constructor_fn = constructor
                    .as_ref()
                    .map(|decl| Rc::new(LoxFunction::new(decl, Rc::clone(&closure), true)));
                let class = Rc::new(LoxClass {
                    name: name.lexeme.clone(),
                    constructor: constructor_fn,
                    methods: method_map,
                    static_methods: static_map,
                    id: next_object_id(),
                });
                self.environment
                    .define(name, Value::Callable(Callable::Class(class)))?;
                Ok(ExecSignal::Normal)
            }
        }
    }

    fn evaluate(&mut self, expr: &Expr) -> Result<Value, LoxError> {
        match &expr.kind {
            ExprKind::Literal(lit) => Ok(match lit {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::String(s.clone()),
                LiteralValue::True => Value::Bool(true),
                LiteralValue::False => Value::Bool(false),
                LiteralValue::Nil => Value::Nil,
            }),
            ExprKind::Grouping(inner) => self.evaluate(inner),
            ExprKind::Var { name } => self.lookup(expr.id, name),
            ExprKind::This { keyword } => self.lookup(expr.id, keyword),
            ExprKind::Assign { name, value } => {
                let v = self.evaluate(value)?;
                let wrote = if let Some(&distance) = self.distances.get(&expr.id) {
                    self.environment.set_at(distance, &name.lexeme, v.clone())
                } else {
                    self.environment.set_global(&name.lexeme, v.clone())
                };
                wrote.map_err(|_| LoxError::runtime(name, format!("Variable '{}' is not defined.", name.lexeme)))?;
                Ok(v)
            }
            ExprKind::Unary { op, op_token, right } => {
                let value = self.evaluate(right)?;
                match op {
                    UnaryOp::Negate => match value {
                        Value::Number(n) => Ok(Value::Number(-n)),
                        _ => Err(LoxError::runtime(op_token, "Operand must be a number.")),
                    },
                    UnaryOp::Not => Ok(Value::Bool(!value.is_truthy())),
                }
            }
            ExprKind::Logical { left, op, right } => {
                let left_val = self.evaluate(left)?;
                match op {
                    LogicalOp::Or => {
                        if left_val.is_truthy() {
                            Ok(left_val)
                        } else {
                            self.evaluate(right)
                        }
                    }
                    LogicalOp::And => {
                        if !left_val.is_truthy() {
                            Ok(left_val)
                        } else {
                            self.evaluate(right)
                        }
                    }
                }
            }
            ExprKind::Binary {
                left,
                op,
                op_token,
                right,
            } => self.evaluate_binary(left, op, op_token, right),
            ExprKind::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee_val = self.evaluate(callee)?;
                let mut args = Vec::with_capacity(arguments.len());
                for arg in arguments {
                    args.push(self.evaluate(arg)?);
                }
                self.call_value(callee_val, args, paren)
            }
            ExprKind::GetProperty { object, name } => {
                let obj_val = self.evaluate(object)?;
                self.get_property(obj_val, name)
            }
            ExprKind::SetProperty { object, name, value } => {
                let obj_val = self.evaluate(object)?;
                match obj_val {
                    Value::Instance(instance) => {
                        let v = self.evaluate(value)?;
                        instance.set_field(&name.lexeme, v.clone());
                        Ok(v)
                    }
                    _ => Err(LoxError::runtime(name, "Only instances have fields.")),
                }
            }
        }
    }

    fn evaluate_binary(
        &mut self,
        left: &Expr,
        op: &BinaryOp,
        op_token: &Token,
        right: &Expr,
    ) -> Result<Value, LoxError> {
        let left_val = self.evaluate(left)?;
        let right_val = self.evaluate(right)?;

        match op {
            BinaryOp::Equal => return Ok(Value::Bool(left_val == right_val)),
            BinaryOp::NotEqual => return Ok(Value::Bool(left_val != right_val)),
            _ => {}
        }

        let numbers = |op_token: &Token| -> Result<(f64, f64), LoxError> {
            match (&left_val, &right_val) {
                (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
                _ => Err(LoxError::runtime(op_token, "Operands must be numbers.")),
            }
        };

        match op {
            BinaryOp::Add => {
                let (a, b) = numbers(op_token)?;
                Ok(Value::Number(a + b))
            }
            BinaryOp::Subtract => {
                let (a, b) = numbers(op_token)?;
                Ok(Value::Number(a - b))
            }
            BinaryOp::Multiply => {
                let (a, b) = numbers(op_token)?;
                Ok(Value::Number(a * b))
            }
            BinaryOp::Divide => {
                let (a, b) = numbers(op_token)?;
                Ok(Value::Number(a / b))
            }
            BinaryOp::Less => {
                let (a, b) = numbers(op_token)?;
                Ok(Value::Bool(a < b))
            }
            BinaryOp::LessEqual => {
                let (a, b) = numbers(op_token)?;
                Ok(Value::Bool(a <= b))
            }
            BinaryOp::Greater => {
                let (a, b) = numbers(op_token)?;
                Ok(Value::Bool(a > b))
            }
            BinaryOp::GreaterEqual => {
                let (a, b) = numbers(op_token)?;
                Ok(Value::Bool(a >= b))
            }
            BinaryOp::Equal | BinaryOp::NotEqual => unreachable!("handled above"),
        }
    }

    fn call_value(&mut self, callee: Value, args: Vec<Value>, paren: &Token) -> Result<Value, LoxError> {
        let callable = match callee {
            Value::Callable(c) => c,
            _ => return Err(LoxError::runtime(paren, "Can only call functions and classes.")),
        };

        if args.len() != callable.arity() {
            return Err(LoxError::runtime(
                paren,
                format!("Expected {} arguments but got {}.", callable.arity(), args.len()),
            ));
        }

        match callable {
            Callable::Function(function) => self.invoke_function(&function, args),
            Callable::Native(native) => Ok((native.func)(&args)),
            Callable::Class(class) => {
                let instance = Rc::new(Instance::new(Rc::clone(&class)));
                if let Some(init) = &class.constructor {
                    let bound = init.bind(Rc::clone(&instance));
                    self.invoke_function(&bound, args)?;
                }
                Ok(Value::Instance(instance))
            }
        }
    }

    fn invoke_function(&mut self, function: &LoxFunction, args: Vec<Value>) -> Result<Value, LoxError> {
        let env = Environment::child(&function.closure);
        for (param, arg) in function.params.iter().zip(args.into_iter()) {
            env.define_unchecked(&param.lexeme, arg);
        }
        let signal = self.execute_block(&function.body, env)?;
        // An initializer always yields `this`, even on a bare `return;`
        // (the resolver forbids `return <value>;` here), so a direct
        // `instance.init()` call re-binds fields and still evaluates to
        // the instance rather than nil.
        if function.is_initializer {
            return Ok(function
                .closure
                .get_at(0, "this")
                .expect("initializer closure always binds this"));
        }
        match signal {
            ExecSignal::Return(v) => Ok(v),
            ExecSignal::Normal => Ok(Value::Nil),
        }
    }

    fn get_property(&self, object: Value, name: &Token) -> Result<Value, LoxError> {
        match object {
            Value::Instance(instance) => {
                if let Some(value) = instance.get_field(&name.lexeme) {
                    return Ok(value);
                }
                if let Some(method) = instance.class.find_method(&name.lexeme) {
                    let bound = method.bind(Rc::clone(&instance));
                    return Ok(Value::Callable(Callable::Function(Rc::new(bound))));
                }
                Err(LoxError::runtime(
                    name,
                    format!("Property '{}' is not defined on {}.", name.lexeme, instance.class.name),
                ))
            }
            Value::Callable(Callable::Class(class)) => {
                if let Some(method) = class.find_static_method(&name.lexeme) {
                    return Ok(Value::Callable(Callable::Function(method)));
                }
                Err(LoxError::runtime(
                    name,
                    format!("Property '{}' is not defined on {}.", name.lexeme, class.name),
                ))
            }
            _ => Err(LoxError::runtime(name, "Only instances and classes have properties.")),
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Interpreter::new()
    }
}
