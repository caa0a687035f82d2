use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{LoxError, Result};
use crate::value::Value;

/// One scope frame in the environment chain. The globals frame is the root
/// (no `enclosing`); every block, function call, and method binding pushes
/// a child frame on top of it.
#[derive(Debug)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: Rc<RefCell<Environment>>) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    /// Chain-walking lookup. Used for names the resolver left unannotated,
    /// i.e. globals.
    pub fn get(&self, name: &str, line: usize) -> Result<Value> {
        if let Some(value) = self.values.get(name) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name, line)
        } else {
            Err(undefined(name, line))
        }
    }

    /// Chain-walking assignment. Assigning a name that was never defined is
    /// a runtime error.
    pub fn assign(&mut self, name: &str, value: Value, line: usize) -> Result<()> {
        if self.values.contains_key(name) {
            self.values.insert(name.to_string(), value);
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value, line)
        } else {
            Err(undefined(name, line))
        }
    }

    /// Read `name` in the frame exactly `distance` hops up the chain. The
    /// resolver guarantees the name is defined there; a miss still reports
    /// an undefined-variable error rather than panicking.
    pub fn get_at(
        env: &Rc<RefCell<Environment>>,
        distance: usize,
        name: &str,
        line: usize,
    ) -> Result<Value> {
        let frame: Rc<RefCell<Environment>> =
            Self::ancestor(env, distance).ok_or_else(|| undefined(name, line))?;

        let value: Option<Value> = frame.borrow().values.get(name).cloned();

        value.ok_or_else(|| undefined(name, line))
    }

    /// Write `name` in the frame exactly `distance` hops up the chain.
    pub fn assign_at(
        env: &Rc<RefCell<Environment>>,
        distance: usize,
        name: &str,
        value: Value,
        line: usize,
    ) -> Result<()> {
        let frame: Rc<RefCell<Environment>> =
            Self::ancestor(env, distance).ok_or_else(|| undefined(name, line))?;

        frame.borrow_mut().values.insert(name.to_string(), value);

        Ok(())
    }

    fn ancestor(
        env: &Rc<RefCell<Environment>>,
        distance: usize,
    ) -> Option<Rc<RefCell<Environment>>> {
        let mut frame: Rc<RefCell<Environment>> = Rc::clone(env);

        for _ in 0..distance {
            let enclosing: Option<Rc<RefCell<Environment>>> = frame.borrow().enclosing.clone();
            frame = enclosing?;
        }

        Some(frame)
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

fn undefined(name: &str, line: usize) -> LoxError {
    LoxError::runtime(line, format!("Undefined variable '{}'.", name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wrap(env: Environment) -> Rc<RefCell<Environment>> {
        Rc::new(RefCell::new(env))
    }

    #[test]
    fn define_then_get() {
        let env = wrap(Environment::new());
        env.borrow_mut().define("a", Value::Number(1.0));

        assert_eq!(env.borrow().get("a", 1).unwrap(), Value::Number(1.0));
    }

    #[test]
    fn get_walks_enclosing_chain() {
        let globals = wrap(Environment::new());
        globals.borrow_mut().define("a", Value::Number(1.0));

        let inner = wrap(Environment::with_enclosing(globals));

        assert_eq!(inner.borrow().get("a", 1).unwrap(), Value::Number(1.0));
    }

    #[test]
    fn assign_to_undefined_is_an_error() {
        let env = wrap(Environment::new());

        let err = env
            .borrow_mut()
            .assign("missing", Value::Nil, 3)
            .unwrap_err();

        assert_eq!(err.to_string(), "Undefined variable 'missing'.\n[line 3]");
    }

    #[test]
    fn get_at_reads_exactly_that_frame() {
        let globals = wrap(Environment::new());
        globals.borrow_mut().define("a", Value::Number(1.0));

        let middle = wrap(Environment::with_enclosing(Rc::clone(&globals)));
        middle.borrow_mut().define("a", Value::Number(2.0));

        let inner = wrap(Environment::with_enclosing(Rc::clone(&middle)));

        assert_eq!(
            Environment::get_at(&inner, 1, "a", 1).unwrap(),
            Value::Number(2.0)
        );
        assert_eq!(
            Environment::get_at(&inner, 2, "a", 1).unwrap(),
            Value::Number(1.0)
        );
        // Depth 0 holds no `a`; that is a miss, not a chain walk.
        assert!(Environment::get_at(&inner, 0, "a", 1).is_err());
    }

    #[test]
    fn assign_at_writes_exactly_that_frame() {
        let globals = wrap(Environment::new());
        globals.borrow_mut().define("a", Value::Number(1.0));

        let inner = wrap(Environment::with_enclosing(Rc::clone(&globals)));

        Environment::assign_at(&inner, 1, "a", Value::Number(9.0), 1).unwrap();

        assert_eq!(globals.borrow().get("a", 1).unwrap(), Value::Number(9.0));
    }
}
