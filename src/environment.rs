// ABOUTME: Lexical scope chain with resolver-distance lookup and definition

use crate::error::LoxError;
use crate::token::Token;
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// A single scope's bindings plus an optional link to the enclosing scope.
/// Shared via `Rc` so that closures and bound methods can outlive the block
/// or call that created them.
#[derive(Debug)]
pub struct Environment {
    bindings: RefCell<HashMap<String, Value>>,
    parent: Option<Rc<Environment>>,
}

impl Environment {
    /// Creates the root (global) environment.
    pub fn new_global() -> Rc<Self> {
        Rc::new(Environment {
            bindings: RefCell::new(HashMap::new()),
            parent: None,
        })
    }

    /// Creates a fresh child scope of `parent` — used on entering a block,
    /// a call, or the `this`-binding scope of a bound method.
    pub fn child(parent: &Rc<Environment>) -> Rc<Self> {
        Rc::new(Environment {
            bindings: RefCell::new(HashMap::new()),
            parent: Some(Rc::clone(parent)),
        })
    }

    pub fn is_global(&self) -> bool {
        self.parent.is_none()
    }

    /// Declares `name` in this scope. Redefining a name already present in a
    /// local scope is a runtime error; the global scope allows redeclaration
    /// so REPL sessions can redefine names across lines (see DESIGN.md for
    /// this deviation from the source evaluator's stricter rule).
    pub fn define(&self, name_token: &Token, value: Value) -> Result<(), LoxError> {
        let name = &name_token.lexeme;
        if !self.is_global() && self.bindings.borrow().contains_key(name) {
            return Err(LoxError::runtime(
                name_token,
                format!("Name '{}' already defined.", name),
            ));
        }
        self.bindings.borrow_mut().insert(name.clone(), value);
        Ok(())
    }

    /// Defines without the redefinition check — used for parameter binding
    /// on each call, which must be allowed to rebind every invocation.
    pub fn define_unchecked(&self, name: &str, value: Value) {
        self.bindings.borrow_mut().insert(name.to_string(), value);
    }

    fn ancestor(self: &Rc<Self>, distance: usize) -> Rc<Environment> {
        let mut env = Rc::clone(self);
        for _ in 0..distance {
            let parent = env
                .parent
                .clone()
                .expect("resolver distance exceeds environment chain depth");
            env = parent;
        }
        env
    }

    pub fn get_at(self: &Rc<Self>, distance: usize, name: &str) -> Option<Value> {
        self.ancestor(distance).bindings.borrow().get(name).cloned()
    }

    pub fn set_at(self: &Rc<Self>, distance: usize, name: &str, value: Value) -> Result<(), ()> {
        let target = self.ancestor(distance);
        let mut bindings = target.bindings.borrow_mut();
        if bindings.contains_key(name) {
            bindings.insert(name.to_string(), value);
            Ok(())
        } else {
            Err(())
        }
    }

    fn global(self: &Rc<Self>) -> Rc<Environment> {
        let mut env = Rc::clone(self);
        while let Some(parent) = env.parent.clone() {
            env = parent;
        }
        env
    }

    pub fn get_global(self: &Rc<Self>, name: &str) -> Option<Value> {
        self.global().bindings.borrow().get(name).cloned()
    }

    pub fn set_global(self: &Rc<Self>, name: &str, value: Value) -> Result<(), ()> {
        let global = self.global();
        let mut bindings = global.bindings.borrow_mut();
        if bindings.contains_key(name) {
            bindings.insert(name.to_string(), value);
            Ok(())
        } else {
            Err(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenKind;

    fn ident(name: &str) -> Token {
        Token::new(TokenKind::Identifier, name, None, 1)
    }

    #[test]
    fn define_and_get_global() {
        let global = Environment::new_global();
        global.define(&ident("x"), Value::Number(42.0)).unwrap();
        assert_eq!(global.get_global("x"), Some(Value::Number(42.0)));
    }

    #[test]
    fn local_redefinition_is_an_error() {
        let global = Environment::new_global();
        let child = Environment::child(&global);
        child.define(&ident("x"), Value::Number(1.0)).unwrap();
        assert!(child.define(&ident("x"), Value::Number(2.0)).is_err());
    }

    #[test]
    fn global_redefinition_is_allowed() {
        let global = Environment::new_global();
        global.define(&ident("x"), Value::Number(1.0)).unwrap();
        assert!(global.define(&ident("x"), Value::Number(2.0)).is_ok());
        assert_eq!(global.get_global("x"), Some(Value::Number(2.0)));
    }

    #[test]
    fn get_at_walks_the_chain() {
        let global = Environment::new_global();
        global.define(&ident("a"), Value::Number(1.0)).unwrap();
        let child1 = Environment::child(&global);
        child1.define(&ident("b"), Value::Number(2.0)).unwrap();
        let child2 = Environment::child(&child1);
        child2.define(&ident("c"), Value::Number(3.0)).unwrap();

        assert_eq!(child2.get_at(0, "c"), Some(Value::Number(3.0)));
        assert_eq!(child2.get_at(1, "b"), Some(Value::Number(2.0)));
        assert_eq!(child2.get_at(2, "a"), Some(Value::Number(1.0)));
    }

    #[test]
    fn set_at_writes_through_the_chain() {
        let global = Environment::new_global();
        global.define(&ident("a"), Value::Number(1.0)).unwrap();
        let child = Environment::child(&global);
        child.set_at(1, "a", Value::Number(99.0)).unwrap();
        assert_eq!(global.get_global("a"), Some(Value::Number(99.0)));
    }

    #[test]
    fn closures_keep_their_declaration_environment_alive() {
        let global = Environment::new_global();
        let closure = {
            let inner = Environment::child(&global);
            inner.define(&ident("captured"), Value::Number(7.0)).unwrap();
            inner
        };
        assert_eq!(closure.get_at(0, "captured"), Some(Value::Number(7.0)));
    }
}
