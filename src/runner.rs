//! Pipeline facade: source text in, effects out.
//!
//! `Runner` wires the scanner, parser, resolver, and interpreter together
//! and owns everything that must survive a REPL line: the interpreter (with
//! its globals and locals table) and the expression-id base handed to each
//! new parse. File mode simply uses one `Runner` for one run.

use std::io::Write;

use log::{debug, info};

use crate::error::LoxError;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::Scanner;
use crate::stmt::Stmt;
use crate::token::Token;

pub struct Runner<'o, W: Write> {
    interpreter: Interpreter<'o, W>,
    id_base: usize,
}

impl<'o, W: Write> Runner<'o, W> {
    pub fn new(output: &'o mut W) -> Self {
        Runner {
            interpreter: Interpreter::new(output),
            id_base: 0,
        }
    }

    /// Run one chunk of source. All scan and parse diagnostics are
    /// collected before giving up; any compile-stage error aborts before
    /// evaluation. Runtime errors come back as a single-element list.
    pub fn run(&mut self, source: &[u8]) -> Result<(), Vec<LoxError>> {
        info!("Running {} byte(s) of source", source.len());

        let mut tokens: Vec<Token> = Vec::new();
        let mut errors: Vec<LoxError> = Vec::new();

        for item in Scanner::new(source.to_vec()) {
            match item {
                Ok(token) => tokens.push(token),

                Err(e) => errors.push(e),
            }
        }

        // Parse even after scan errors so one bad character does not hide
        // syntax diagnostics further down the file.
        let mut parser: Parser = Parser::with_id_base(tokens, self.id_base);
        let parsed: Result<Vec<Stmt>, Vec<LoxError>> = parser.parse();
        self.id_base = parser.id_counter();

        let statements: Vec<Stmt> = match parsed {
            Ok(statements) => statements,

            Err(mut parse_errors) => {
                errors.append(&mut parse_errors);
                return Err(errors);
            }
        };

        if !errors.is_empty() {
            return Err(errors);
        }

        debug!("Resolving {} statement(s)", statements.len());

        Resolver::new(&mut self.interpreter).resolve(&statements)?;

        self.interpreter
            .interpret(&statements)
            .map_err(|e| vec![e])
    }
}
