// ABOUTME: Runtime representations of the four callable-protocol variants

use crate::ast::FunctionDecl;
use crate::environment::Environment;
use crate::token::Token;
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

/// Hands out a fresh opaque id, used to distinguish otherwise-identical
/// functions, classes, and instances in their `Display` rendering and for
/// reference-equality comparisons.
pub fn next_object_id() -> u64 {
    NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed)
}

/// A user-declared function or method, capturing the environment visible at
/// its declaration site (not its call site) as its closure.
#[derive(Debug)]
pub struct LoxFunction {
    pub name: String,
    pub params: Vec<Token>,
    pub body: Rc<Vec<crate::ast::Stmt>>,
    pub closure: Rc<Environment>,
    pub is_initializer: bool,
    pub id: u64,
}

impl LoxFunction {
    pub fn new(decl: &FunctionDecl, closure: Rc<Environment>, is_initializer: bool) -> Self {
        LoxFunction {
            name: decl.name.lexeme.clone(),
            params: decl.params.clone(),
            body: Rc::new(decl.body.clone()),
            closure,
            is_initializer,
            id: next_object_id(),
        }
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Produces a bound method: a fresh `LoxFunction` whose closure is this
    /// function's closure extended with a single `this` binding. Freshly
    /// constructed (and so not reference-equal to any other binding of the
    /// same method), but behaviourally identical — see testable property 5.
    pub fn bind(&self, instance: Rc<Instance>) -> LoxFunction {
        let env = Environment::child(&self.closure);
        env.define_unchecked("this", Value::Instance(instance));
        LoxFunction {
            name: self.name.clone(),
            params: self.params.clone(),
            body: Rc::clone(&self.body),
            closure: env,
            is_initializer: self.is_initializer,
            id: next_object_id(),
        }
    }
}

/// A class: its own methods, its static methods (looked up without an
/// instance), and an optional `init` constructor.
#[derive(Debug)]
pub struct LoxClass {
    pub name: String,
    pub constructor: Option<Rc<LoxFunction>>,
    pub methods: HashMap<String, Rc<LoxFunction>>,
    pub static_methods: HashMap<String, Rc<LoxFunction>>,
    pub id: u64,
}

impl LoxClass {
    pub fn arity(&self) -> usize {
        self.constructor.as_ref().map_or(0, |init| init.arity())
    }

    pub fn find_method(&self, name: &str) -> Option<Rc<LoxFunction>> {
        self.methods.get(name).cloned()
    }

    pub fn find_static_method(&self, name: &str) -> Option<Rc<LoxFunction>> {
        self.static_methods.get(name).cloned()
    }
}

/// A live instance of a class: a reference to its class plus a mutable,
/// per-instance property map.
#[derive(Debug)]
pub struct Instance {
    pub class: Rc<LoxClass>,
    pub fields: RefCell<HashMap<String, Value>>,
    pub id: u64,
}

impl Instance {
    pub fn new(class: Rc<LoxClass>) -> Self {
        Instance {
            class,
            fields: RefCell::new(HashMap::new()),
            id: next_object_id(),
        }
    }

    pub fn get_field(&self, name: &str) -> Option<Value> {
        self.fields.borrow().get(name).cloned()
    }

    pub fn set_field(&self, name: &str, value: Value) {
        self.fields.borrow_mut().insert(name.to_string(), value);
    }
}

/// A host-implemented function exposed to user code. The only native in
/// this language is `clock`.
pub struct NativeFunction {
    pub name: String,
    pub arity: usize,
    pub func: fn(&[Value]) -> Value,
    pub id: u64,
}

impl std::fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeFunction").field("name", &self.name).finish()
    }
}

/// The four-variant callable protocol collapsed into three Rust variants:
/// a bound method is modeled as a freshly `bind`-produced `LoxFunction`
/// rather than a distinct enum case (see DESIGN.md).
#[derive(Debug, Clone)]
pub enum Callable {
    Function(Rc<LoxFunction>),
    Class(Rc<LoxClass>),
    Native(Rc<NativeFunction>),
}

impl Callable {
    pub fn arity(&self) -> usize {
        match self {
            Callable::Function(f) => f.arity(),
            Callable::Class(c) => c.arity(),
            Callable::Native(n) => n.arity,
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            Callable::Function(f) => &f.name,
            Callable::Class(c) => &c.name,
            Callable::Native(n) => &n.name,
        }
    }

    pub fn id(&self) -> u64 {
        match self {
            Callable::Function(f) => f.id,
            Callable::Class(c) => c.id,
            Callable::Native(n) => n.id,
        }
    }
}

impl PartialEq for Callable {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Callable::Function(a), Callable::Function(b)) => Rc::ptr_eq(a, b),
            (Callable::Class(a), Callable::Class(b)) => Rc::ptr_eq(a, b),
            (Callable::Native(a), Callable::Native(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenKind;

    fn decl(name: &str) -> FunctionDecl {
        FunctionDecl {
            name: Token::new(TokenKind::Identifier, name, None, 1),
            params: vec![],
            body: vec![],
        }
    }

    #[test]
    fn bound_methods_are_not_reference_equal_but_share_behaviour() {
        let global = Environment::new_global();
        let function = LoxFunction::new(&decl("greet"), global, false);
        let class = Rc::new(LoxClass {
            name: "C".to_string(),
            constructor: None,
            methods: HashMap::new(),
            static_methods: HashMap::new(),
            id: next_object_id(),
        });
        let instance = Rc::new(Instance::new(class));

        let bound_a = function.bind(Rc::clone(&instance));
        let bound_b = function.bind(Rc::clone(&instance));
        assert_ne!(bound_a.id, bound_b.id);
        assert_eq!(bound_a.name, bound_b.name);
        assert_eq!(bound_a.closure.get_at(0, "this"), bound_b.closure.get_at(0, "this"));
    }

    #[test]
    fn class_arity_follows_constructor() {
        let global = Environment::new_global();
        let init = Rc::new(LoxFunction::new(
            &FunctionDecl {
                name: Token::new(TokenKind::Identifier, "init", None, 1),
                params: vec![
                    Token::new(TokenKind::Identifier, "a", None, 1),
                    Token::new(TokenKind::Identifier, "b", None, 1),
                ],
                body: vec![],
            },
            global,
            true,
        ));
        let class = LoxClass {
            name: "Box".to_string(),
            constructor: Some(init),
            methods: HashMap::new(),
            static_methods: HashMap::new(),
            id: next_object_id(),
        };
        assert_eq!(class.arity(), 2);
    }
}
