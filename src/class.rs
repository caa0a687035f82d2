use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::rc::Rc;

use crate::error::{LoxError, Result};
use crate::function::LoxFunction;
use crate::interpreter::Interpreter;
use crate::token::Token;
use crate::value::Value;

/// A class value. Cheap to clone; identity is the shared allocation.
#[derive(Clone)]
pub struct LoxClass(Rc<ClassData>);

struct ClassData {
    name: String,
    superclass: Option<LoxClass>,
    methods: HashMap<String, LoxFunction>,
}

impl LoxClass {
    pub fn new(
        name: String,
        superclass: Option<LoxClass>,
        methods: HashMap<String, LoxFunction>,
    ) -> Self {
        Self(Rc::new(ClassData {
            name,
            superclass,
            methods,
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Method lookup, walking the superclass chain outward.
    pub fn find_method(&self, name: &str) -> Option<LoxFunction> {
        self.0.methods.get(name).cloned().or_else(|| {
            self.0
                .superclass
                .as_ref()
                .and_then(|parent| parent.find_method(name))
        })
    }

    /// A class's arity is its initializer's arity, or zero without one.
    pub fn arity(&self) -> usize {
        self.find_method("init").map(|init| init.arity()).unwrap_or(0)
    }

    /// Calling a class constructs an instance, running `init` bound to it
    /// when the class (or an ancestor) declares one.
    pub fn call<W: Write>(
        &self,
        interpreter: &mut Interpreter<'_, W>,
        arguments: Vec<Value>,
    ) -> Result<Value> {
        let instance: LoxInstance = LoxInstance::new(self.clone());

        if let Some(initializer) = self.find_method("init") {
            initializer.bind(&instance).call(interpreter, arguments)?;
        }

        Ok(Value::Instance(instance))
    }
}

impl PartialEq for LoxClass {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Display for LoxClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.name)
    }
}

// Shallow by hand: the method table holds closures, and a derived Debug
// could recurse forever through cyclic environments.
impl fmt::Debug for LoxClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoxClass")
            .field("name", &self.0.name)
            .field("methods", &self.0.methods.len())
            .finish()
    }
}

/// An instance value. Field storage is shared, so clones alias the same
/// object; equality is identity.
#[derive(Clone)]
pub struct LoxInstance(Rc<RefCell<InstanceData>>);

struct InstanceData {
    class: LoxClass,
    fields: HashMap<String, Value>,
}

impl LoxInstance {
    pub fn new(class: LoxClass) -> Self {
        Self(Rc::new(RefCell::new(InstanceData {
            class,
            fields: HashMap::new(),
        })))
    }

    /// Property read: fields shadow methods; a method hit comes back bound
    /// to this instance.
    pub fn get(&self, name: &Token) -> Result<Value> {
        let data = self.0.borrow();

        if let Some(value) = data.fields.get(&name.lexeme) {
            return Ok(value.clone());
        }

        if let Some(method) = data.class.find_method(&name.lexeme) {
            return Ok(Value::Function(method.bind(self)));
        }

        Err(LoxError::runtime(
            name.line,
            format!("Undefined property '{}'.", name.lexeme),
        ))
    }

    /// Property write: fields are created on first assignment.
    pub fn set(&self, name: &str, value: Value) {
        self.0.borrow_mut().fields.insert(name.to_string(), value);
    }

    pub fn class_name(&self) -> String {
        self.0.borrow().class.name().to_string()
    }
}

impl PartialEq for LoxInstance {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Display for LoxInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} instance", self.class_name())
    }
}

impl fmt::Debug for LoxInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoxInstance")
            .field("class", &self.class_name())
            .finish()
    }
}
