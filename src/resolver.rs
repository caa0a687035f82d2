//! Static resolution pass.
//!
//! A single AST walk that runs between parsing and evaluation:
//! 1. **Builds lexical scopes**: a stack of `HashMap<String, bool>` tracking
//!    declared (`false`) and fully defined (`true`) names per block or
//!    function. The globals frame is deliberately absent from the stack.
//! 2. **Enforces static rules**: redeclaration in the same scope, reading a
//!    variable in its own initializer, `return` outside a function, value
//!    returns from initializers, and `this`/`super` outside their classes.
//! 3. **Records binding distances**: every `Variable`, `Assign`, `This`,
//!    and `Super` occurrence that lands in some enclosing scope is noted in
//!    the interpreter's locals table at its depth; names that fall through
//!    to globals are left unannotated.
//!
//! Errors are recorded and the walk keeps going. Unlike the parser, which
//! abandons a broken statement and resynchronizes, resolution never skips
//! anything: two independent mistakes inside the same block or class body
//! both get diagnosed in one pass. Evaluation still never runs once any
//! error was recorded.

use std::collections::HashMap;
use std::io::Write;
use std::mem;
use std::rc::Rc;

use log::{debug, info};

use crate::error::LoxError;
use crate::expr::Expr;
use crate::interpreter::Interpreter;
use crate::stmt::{FunctionDecl, Stmt};
use crate::token::{Token, TokenType};

/// What kind of function body is being resolved. Validates `return`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
    Method,
    Initializer,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ClassType {
    /// Not inside any class
    None,

    /// Inside a class declaration _without_ a superclass
    Class,

    /// Inside a class declaration _with_ a superclass
    Subclass,
}

/// Resolver: tracks scopes, enforces static rules, and *records* binding
/// distances (locals vs. globals) by calling back into the interpreter.
pub struct Resolver<'i, 'o, W: Write> {
    interpreter: &'i mut Interpreter<'o, W>,
    scopes: Vec<HashMap<String, bool>>, // false=declared, true=defined
    current_function: FunctionType,
    current_class: ClassType,
    errors: Vec<LoxError>,
}

impl<'i, 'o, W: Write> Resolver<'i, 'o, W> {
    pub fn new(interpreter: &'i mut Interpreter<'o, W>) -> Self {
        info!("Resolver instantiated");
        Resolver {
            interpreter,
            scopes: Vec::new(),
            current_function: FunctionType::None,
            current_class: ClassType::None,
            errors: Vec::new(),
        }
    }

    /// Walk all top-level statements, accumulating every diagnostic the
    /// pass can find.
    pub fn resolve(&mut self, statements: &[Stmt]) -> Result<(), Vec<LoxError>> {
        for stmt in statements {
            self.resolve_stmt(stmt);
        }

        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(mem::take(&mut self.errors))
        }
    }

    fn error<S: Into<String>>(&mut self, token: &Token, message: S) {
        self.errors.push(LoxError::resolve(token, message));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statement resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Block(statements) => {
                self.begin_scope();

                for s in statements {
                    self.resolve_stmt(s);
                }

                self.end_scope();
            }

            Stmt::Var { name, initializer } => {
                // Declare first so the initializer sees the name as
                // "in flight" and self-reference can be rejected.
                self.declare(name);

                if let Some(expr) = initializer {
                    self.resolve_expr(expr);
                }

                self.define(name);
            }

            Stmt::Function(declaration) => {
                // Define eagerly so the function can recurse.
                self.declare(&declaration.name);
                self.define(&declaration.name);

                self.resolve_function(FunctionType::Function, declaration);
            }

            Stmt::Expression(expr) | Stmt::Print(expr) => {
                self.resolve_expr(expr);
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_stmt(then_branch);

                if let Some(eb) = else_branch.as_deref() {
                    self.resolve_stmt(eb);
                }
            }

            Stmt::While { condition, body } => {
                self.resolve_expr(condition);
                self.resolve_stmt(body);
            }

            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionType::None {
                    self.error(keyword, "Can't return from top-level code.");
                }

                // An initializer may only return bare (implicit nil).
                if self.current_function == FunctionType::Initializer && !is_nil_literal(value) {
                    self.error(keyword, "Can't return a value from an initializer.");
                }

                self.resolve_expr(value);
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                self.resolve_class(name, superclass.as_ref(), methods);
            }
        }
    }

    fn resolve_class(
        &mut self,
        name: &Token,
        superclass: Option<&Expr>,
        methods: &[Rc<FunctionDecl>],
    ) {
        let enclosing_class: ClassType = self.current_class;

        self.declare(name);
        self.define(name);

        if let Some(super_expr) = superclass {
            if let Expr::Variable {
                name: super_name, ..
            } = super_expr
            {
                if super_name.lexeme == name.lexeme {
                    self.error(super_name, "A class can't inherit from itself.");
                }
            }

            self.current_class = ClassType::Subclass;

            self.resolve_expr(super_expr);

            // Methods of a subclass close over a scope holding `super`.
            self.begin_scope();
            self.scope_insert("super", true);
        } else {
            self.current_class = ClassType::Class;
        }

        // The implicit `this` scope wraps every method body.
        self.begin_scope();
        self.scope_insert("this", true);

        for method in methods {
            let kind: FunctionType = if method.name.lexeme == "init" {
                FunctionType::Initializer
            } else {
                FunctionType::Method
            };

            self.resolve_function(kind, method);
        }

        self.end_scope();

        if superclass.is_some() {
            self.end_scope();
        }

        self.current_class = enclosing_class;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expression resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Literal(_) => {}

            Expr::Grouping(inner) => {
                self.resolve_expr(inner);
            }

            Expr::Unary { right, .. } => {
                self.resolve_expr(right);
            }

            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }

            Expr::Variable { id, name } => {
                // A name whose current-scope entry is still `false` is being
                // read inside its own initializer.
                let reads_itself: bool = self
                    .scopes
                    .last()
                    .is_some_and(|scope| scope.get(&name.lexeme) == Some(&false));

                if reads_itself {
                    self.error(name, "Can't read local variable in its own initializer.");
                }

                self.resolve_local(*id, name);
            }

            Expr::Assign { id, name, value } => {
                self.resolve_expr(value);
                self.resolve_local(*id, name);
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee);

                for argument in arguments {
                    self.resolve_expr(argument);
                }
            }

            Expr::Get { object, .. } => {
                self.resolve_expr(object);
            }

            Expr::Set { object, value, .. } => {
                self.resolve_expr(object);
                self.resolve_expr(value);
            }

            Expr::This { id, keyword } => {
                if self.current_class == ClassType::None {
                    self.error(keyword, "Can't use 'this' outside of a class.");
                    return;
                }

                self.resolve_local(*id, keyword);
            }

            Expr::Super { id, keyword, .. } => {
                if self.current_class == ClassType::None {
                    self.error(keyword, "Can't use 'super' outside of a class.");
                    return;
                }

                if self.current_class != ClassType::Subclass {
                    self.error(keyword, "Can't use 'super' in a class with no superclass.");
                    return;
                }

                self.resolve_local(*id, keyword);
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Function helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Enter a fresh scope for a function's parameters + body, resolving the
    /// body under `kind`.
    fn resolve_function(&mut self, kind: FunctionType, declaration: &FunctionDecl) {
        let enclosing: FunctionType = self.current_function;
        self.current_function = kind;

        self.begin_scope();

        for param in &declaration.params {
            self.declare(param);
            self.define(param);
        }

        for stmt in &declaration.body {
            self.resolve_stmt(stmt);
        }

        self.end_scope();
        self.current_function = enclosing;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Scope management
    // ─────────────────────────────────────────────────────────────────────────

    #[inline]
    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    #[inline]
    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    fn scope_insert(&mut self, name: &str, defined: bool) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), defined);
        }
    }

    fn declare(&mut self, name: &Token) {
        if self.scopes.is_empty() {
            // Global scope: redeclaration is allowed, nothing to track.
            return;
        }

        if self
            .scopes
            .last()
            .is_some_and(|scope| scope.contains_key(&name.lexeme))
        {
            self.error(name, "Already a variable with this name in this scope.");
        }

        self.scope_insert(&name.lexeme, false);
    }

    fn define(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme.clone(), true);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Binding-distance helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Record this occurrence as a local at its depth, or leave it for the
    /// globals frame when no enclosing scope knows the name.
    fn resolve_local(&mut self, id: usize, name: &Token) {
        for (depth, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(&name.lexeme) {
                debug!("Resolved '{}' at depth {}", name.lexeme, depth);

                self.interpreter.note_local(id, depth);
                return;
            }
        }

        debug!("Resolved '{}' as global", name.lexeme);
    }
}

fn is_nil_literal(expr: &Expr) -> bool {
    matches!(expr, Expr::Literal(token) if token.token_type == TokenType::NIL)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use crate::scanner::Scanner;

    fn resolve(source: &str) -> Result<(), Vec<LoxError>> {
        let tokens = Scanner::new(source.as_bytes().to_vec())
            .collect::<Result<Vec<_>, _>>()
            .expect("test source scans cleanly");

        let statements = Parser::new(tokens).parse().expect("test source parses");

        let mut sink: Vec<u8> = Vec::new();
        let mut interpreter = Interpreter::new(&mut sink);

        Resolver::new(&mut interpreter).resolve(&statements)
    }

    fn first_message(result: Result<(), Vec<LoxError>>) -> String {
        result.unwrap_err()[0].to_string()
    }

    #[test]
    fn top_level_return_is_rejected() {
        let msg = first_message(resolve("return 1;"));
        assert!(msg.contains("Can't return from top-level code."));
    }

    #[test]
    fn self_referential_initializer_is_rejected() {
        let msg = first_message(resolve("{ var a = a; }"));
        assert!(msg.contains("Can't read local variable in its own initializer."));
    }

    #[test]
    fn duplicate_local_is_rejected() {
        let msg = first_message(resolve("{ var a = 1; var a = 2; }"));
        assert!(msg.contains("Already a variable with this name in this scope."));
    }

    #[test]
    fn duplicate_global_is_allowed() {
        assert!(resolve("var a = 1; var a = 2;").is_ok());
    }

    #[test]
    fn this_outside_class_is_rejected() {
        let msg = first_message(resolve("print this;"));
        assert!(msg.contains("Can't use 'this' outside of a class."));
    }

    #[test]
    fn super_without_superclass_is_rejected() {
        let msg = first_message(resolve("class A { m() { super.m(); } }"));
        assert!(msg.contains("Can't use 'super' in a class with no superclass."));
    }

    #[test]
    fn super_outside_class_is_rejected() {
        let msg = first_message(resolve("fun f() { super.m(); }"));
        assert!(msg.contains("Can't use 'super' outside of a class."));
    }

    #[test]
    fn class_inheriting_itself_is_rejected() {
        let msg = first_message(resolve("class A < A {}"));
        assert!(msg.contains("A class can't inherit from itself."));
    }

    #[test]
    fn value_return_from_initializer_is_rejected() {
        let msg = first_message(resolve("class A { init() { return 1; } }"));
        assert!(msg.contains("Can't return a value from an initializer."));
    }

    #[test]
    fn bare_return_from_initializer_is_allowed() {
        assert!(resolve("class A { init() { return; } }").is_ok());
    }

    #[test]
    fn errors_are_collected_per_statement() {
        let errors = resolve("return 1; print this;").unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn errors_are_collected_within_a_statement() {
        // One block, two independent mistakes: resolution must not abandon
        // the rest of the block after the first.
        let errors = resolve("{ return 1; print this; }").unwrap_err();

        assert_eq!(errors.len(), 2);
        assert!(errors[0]
            .to_string()
            .contains("Can't return from top-level code."));
        assert!(errors[1]
            .to_string()
            .contains("Can't use 'this' outside of a class."));
    }

    #[test]
    fn errors_are_collected_across_sibling_methods() {
        let errors =
            resolve("class A { m() { super.m(); } n() { super.n(); } }").unwrap_err();

        assert_eq!(errors.len(), 2);
    }
}
