use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Write};
use std::mem;
use std::rc::Rc;

use crate::class::LoxClass;
use crate::environment::Environment;
use crate::error::LoxError;
use crate::expr::Expr;
use crate::function::{clock_native, LoxFunction};
use crate::stmt::{FunctionDecl, Stmt};
use crate::token::{Token, TokenType};
use crate::value::Value;

/// Non-local exit channel for statement execution.
///
/// `Return` is caught exactly once, at the `LoxFunction::call` frame that is
/// currently executing; `Failure` keeps unwinding to the top of the run.
/// The two must never be conflated: a `return` inside a loop inside a
/// function is control flow, not an error.
#[derive(Debug)]
pub enum Unwind {
    Return(Value),
    Failure(LoxError),
}

impl From<LoxError> for Unwind {
    fn from(e: LoxError) -> Self {
        Unwind::Failure(e)
    }
}

impl From<io::Error> for Unwind {
    fn from(e: io::Error) -> Self {
        Unwind::Failure(LoxError::Io(e))
    }
}

/// Tree-walking evaluator. Owns the globals frame, the current environment
/// pointer, and the resolver-populated locals table. `print` output goes to
/// the injected writer so tests can capture it.
pub struct Interpreter<'o, W: Write> {
    output: &'o mut W,
    globals: Rc<RefCell<Environment>>,
    environment: Rc<RefCell<Environment>>,
    locals: HashMap<usize, usize>,
}

impl<'o, W: Write> Interpreter<'o, W> {
    pub fn new(output: &'o mut W) -> Self {
        let globals = Rc::new(RefCell::new(Environment::new()));

        globals.borrow_mut().define(
            "clock",
            Value::NativeFunction {
                name: "clock".to_string(),
                arity: 0,
                func: clock_native,
            },
        );

        Interpreter {
            output,
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
        }
    }

    /// Record a resolved variable occurrence: the node with this id reads
    /// or writes the frame `depth` hops from the current environment.
    /// Unannotated nodes fall through to the globals frame at runtime.
    pub fn note_local(&mut self, id: usize, depth: usize) {
        self.locals.insert(id, depth);
    }

    /// Run a resolved program. A runtime error abandons the remaining
    /// statements but leaves globals (and the locals table) intact, so a
    /// REPL can keep going with the next line.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<(), LoxError> {
        for stmt in statements {
            match self.execute(stmt) {
                Ok(()) => {}

                Err(Unwind::Failure(e)) => return Err(e),

                // The resolver rejects top-level `return`; nothing to do.
                Err(Unwind::Return(_)) => {}
            }
        }

        Ok(())
    }

    pub fn execute(&mut self, stmt: &Stmt) -> Result<(), Unwind> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;

                Ok(())
            }

            Stmt::Print(expr) => {
                let value: Value = self.evaluate(expr)?;

                writeln!(self.output, "{}", value)?;

                Ok(())
            }

            Stmt::Var { name, initializer } => {
                let value: Value = if let Some(expr) = initializer {
                    self.evaluate(expr)?
                } else {
                    Value::Nil
                };

                self.environment.borrow_mut().define(&name.lexeme, value);

                Ok(())
            }

            Stmt::Block(statements) => {
                let env = Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(
                    &self.environment,
                ))));

                self.execute_block(statements, env)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if is_truthy(&self.evaluate(condition)?) {
                    self.execute(then_branch)?;
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)?;
                }

                Ok(())
            }

            Stmt::While { condition, body } => {
                while is_truthy(&self.evaluate(condition)?) {
                    self.execute(body)?;
                }

                Ok(())
            }

            Stmt::Function(declaration) => {
                let function = LoxFunction::new(
                    Rc::clone(declaration),
                    Rc::clone(&self.environment),
                    false,
                );

                self.environment
                    .borrow_mut()
                    .define(&declaration.name.lexeme, Value::Function(function));

                Ok(())
            }

            Stmt::Return { keyword: _, value } => {
                let value: Value = self.evaluate(value)?;

                Err(Unwind::Return(value))
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => self.execute_class(name, superclass.as_ref(), methods),
        }
    }

    /// Execute `statements` inside `env`, restoring the previous
    /// environment pointer on every exit path, exceptional or not.
    pub fn execute_block(
        &mut self,
        statements: &[Stmt],
        env: Rc<RefCell<Environment>>,
    ) -> Result<(), Unwind> {
        let previous: Rc<RefCell<Environment>> = mem::replace(&mut self.environment, env);

        let result: Result<(), Unwind> = statements.iter().try_for_each(|stmt| self.execute(stmt));

        self.environment = previous;

        result
    }

    fn execute_class(
        &mut self,
        name: &Token,
        superclass: Option<&Expr>,
        methods: &[Rc<FunctionDecl>],
    ) -> Result<(), Unwind> {
        self.environment
            .borrow_mut()
            .define(&name.lexeme, Value::Nil);

        let superclass_value: Option<LoxClass> = match superclass {
            Some(expr) => match self.evaluate(expr)? {
                Value::Class(class) => Some(class),

                _ => {
                    let line = match expr {
                        Expr::Variable { name, .. } => name.line,
                        _ => name.line,
                    };

                    return Err(LoxError::runtime(line, "Superclass must be a class.").into());
                }
            },

            None => None,
        };

        // Methods close over an extra frame binding `super` when there is a
        // superclass; the resolver mirrors this exact scope layout.
        let previous: Option<Rc<RefCell<Environment>>> = superclass_value.as_ref().map(|class| {
            let env = Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(
                &self.environment,
            ))));

            env.borrow_mut()
                .define("super", Value::Class(class.clone()));

            mem::replace(&mut self.environment, env)
        });

        let mut method_table: HashMap<String, LoxFunction> = HashMap::new();

        for declaration in methods {
            let is_initializer: bool = declaration.name.lexeme == "init";

            let function = LoxFunction::new(
                Rc::clone(declaration),
                Rc::clone(&self.environment),
                is_initializer,
            );

            method_table.insert(declaration.name.lexeme.clone(), function);
        }

        let class = LoxClass::new(name.lexeme.clone(), superclass_value, method_table);

        if let Some(previous) = previous {
            self.environment = previous;
        }

        self.environment
            .borrow_mut()
            .assign(&name.lexeme, Value::Class(class), name.line)?;

        Ok(())
    }

    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value, Unwind> {
        match expr {
            Expr::Literal(token) => self.evaluate_literal(token),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => self.evaluate_unary(operator, right),

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right),

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left_val: Value = self.evaluate(left)?;

                // Short-circuit: hand back the operand that decided the
                // result, not a coerced bool.
                match operator.token_type {
                    TokenType::OR if is_truthy(&left_val) => Ok(left_val),

                    TokenType::AND if !is_truthy(&left_val) => Ok(left_val),

                    _ => self.evaluate(right),
                }
            }

            Expr::Variable { id, name } => self.look_up_variable(name, *id),

            Expr::This { id, keyword } => self.look_up_variable(keyword, *id),

            Expr::Assign { id, name, value } => {
                let value: Value = self.evaluate(value)?;

                match self.locals.get(id) {
                    Some(&distance) => Environment::assign_at(
                        &self.environment,
                        distance,
                        &name.lexeme,
                        value.clone(),
                        name.line,
                    )?,

                    None => self.globals.borrow_mut().assign(
                        &name.lexeme,
                        value.clone(),
                        name.line,
                    )?,
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => self.evaluate_call(callee, paren, arguments),

            Expr::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => Ok(instance.get(name)?),

                _ => Err(LoxError::runtime(name.line, "Only instances have properties.").into()),
            },

            Expr::Set {
                object,
                name,
                value,
            } => match self.evaluate(object)? {
                Value::Instance(instance) => {
                    let value: Value = self.evaluate(value)?;

                    instance.set(&name.lexeme, value.clone());

                    Ok(value)
                }

                _ => Err(LoxError::runtime(name.line, "Only instances have fields.").into()),
            },

            Expr::Super {
                id,
                keyword,
                method,
            } => self.evaluate_super(*id, keyword, method),
        }
    }

    fn evaluate_literal(&self, token: &Token) -> Result<Value, Unwind> {
        match &token.token_type {
            TokenType::NUMBER(n) => Ok(Value::Number(*n)),

            TokenType::STRING(s) => Ok(Value::String(s.clone())),

            TokenType::TRUE => Ok(Value::Bool(true)),

            TokenType::FALSE => Ok(Value::Bool(false)),

            TokenType::NIL => Ok(Value::Nil),

            _ => Err(LoxError::runtime(token.line, "Invalid literal.").into()),
        }
    }

    fn evaluate_unary(&mut self, operator: &Token, right: &Expr) -> Result<Value, Unwind> {
        let value: Value = self.evaluate(right)?;

        match operator.token_type {
            TokenType::MINUS => match value {
                Value::Number(n) => Ok(Value::Number(-n)),

                _ => Err(LoxError::runtime(operator.line, "Operand must be a number.").into()),
            },

            TokenType::BANG => Ok(Value::Bool(!is_truthy(&value))),

            _ => Err(LoxError::runtime(operator.line, "Invalid unary operator.").into()),
        }
    }

    fn evaluate_binary(
        &mut self,
        left: &Expr,
        operator: &Token,
        right: &Expr,
    ) -> Result<Value, Unwind> {
        let left_val: Value = self.evaluate(left)?;
        let right_val: Value = self.evaluate(right)?;

        let numbers_required =
            || Unwind::from(LoxError::runtime(operator.line, "Operands must be numbers."));

        match operator.token_type {
            TokenType::PLUS => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),

                (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),

                _ => Err(LoxError::runtime(
                    operator.line,
                    "Operands must be two numbers or two strings.",
                )
                .into()),
            },

            TokenType::MINUS => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a - b)),

                _ => Err(numbers_required()),
            },

            TokenType::STAR => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a * b)),

                _ => Err(numbers_required()),
            },

            // IEEE-754 division: 1/0 is infinity, 0/0 is NaN.
            TokenType::SLASH => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a / b)),

                _ => Err(numbers_required()),
            },

            TokenType::EQUAL_EQUAL => Ok(Value::Bool(is_equal(&left_val, &right_val))),

            TokenType::BANG_EQUAL => Ok(Value::Bool(!is_equal(&left_val, &right_val))),

            TokenType::LESS => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a < b)),

                _ => Err(numbers_required()),
            },

            TokenType::LESS_EQUAL => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a <= b)),

                _ => Err(numbers_required()),
            },

            TokenType::GREATER => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a > b)),

                _ => Err(numbers_required()),
            },

            TokenType::GREATER_EQUAL => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a >= b)),

                _ => Err(numbers_required()),
            },

            _ => Err(LoxError::runtime(operator.line, "Invalid binary operator.").into()),
        }
    }

    fn evaluate_call(
        &mut self,
        callee: &Expr,
        paren: &Token,
        arguments: &[Expr],
    ) -> Result<Value, Unwind> {
        let callee_val: Value = self.evaluate(callee)?;

        let mut arg_values: Vec<Value> = Vec::with_capacity(arguments.len());

        for argument in arguments {
            arg_values.push(self.evaluate(argument)?);
        }

        let provided: usize = arg_values.len();

        let check_arity = |expected: usize| -> Result<(), Unwind> {
            if provided != expected {
                Err(LoxError::runtime(
                    paren.line,
                    format!("Expected {} arguments but got {}.", expected, provided),
                )
                .into())
            } else {
                Ok(())
            }
        };

        match callee_val {
            Value::Function(function) => {
                check_arity(function.arity())?;

                Ok(function.call(self, arg_values)?)
            }

            Value::Class(class) => {
                check_arity(class.arity())?;

                Ok(class.call(self, arg_values)?)
            }

            Value::NativeFunction { arity, func, .. } => {
                check_arity(arity)?;

                func(&arg_values)
                    .map_err(|msg| LoxError::runtime(paren.line, msg).into())
            }

            _ => Err(LoxError::runtime(paren.line, "Can only call functions and classes.").into()),
        }
    }

    fn evaluate_super(&mut self, id: usize, keyword: &Token, method: &Token) -> Result<Value, Unwind> {
        let distance: usize = match self.locals.get(&id) {
            Some(&d) => d,

            None => {
                return Err(
                    LoxError::runtime(keyword.line, "Undefined variable 'super'.").into(),
                )
            }
        };

        let superclass: Value =
            Environment::get_at(&self.environment, distance, "super", keyword.line)?;

        // `this` always lives one frame inside the `super` frame.
        let object: Value =
            Environment::get_at(&self.environment, distance - 1, "this", keyword.line)?;

        match (superclass, object) {
            (Value::Class(superclass), Value::Instance(instance)) => superclass
                .find_method(&method.lexeme)
                .map(|found| Value::Function(found.bind(&instance)))
                .ok_or_else(|| {
                    LoxError::runtime(
                        method.line,
                        format!("Undefined property '{}'.", method.lexeme),
                    )
                    .into()
                }),

            _ => Err(LoxError::runtime(keyword.line, "Undefined variable 'super'.").into()),
        }
    }

    fn look_up_variable(&self, name: &Token, id: usize) -> Result<Value, Unwind> {
        match self.locals.get(&id) {
            Some(&distance) => {
                Ok(Environment::get_at(&self.environment, distance, &name.lexeme, name.line)?)
            }

            None => Ok(self.globals.borrow().get(&name.lexeme, name.line)?),
        }
    }
}

/// `nil` and `false` are falsey; every other value is truthy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Nil => false,

        Value::Bool(b) => *b,

        _ => true,
    }
}

fn is_equal(left: &Value, right: &Value) -> bool {
    left == right
}
