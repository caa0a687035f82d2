use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::error::ErrorKind;
use clap::Parser as ClapParser;

use roxide::error::LoxError;
use roxide::runner::Runner;

#[derive(ClapParser, Debug)]
#[command(version, about = "Tree-walking interpreter for the Lox language", long_about = None)]
pub struct Cli {
    /// Script to execute; starts an interactive session when omitted
    script: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args: Cli = match Cli::try_parse() {
        Ok(args) => args,

        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.print()?;
            return Ok(());
        }

        // Anything else is a usage error.
        Err(e) => {
            e.print()?;
            std::process::exit(64);
        }
    };

    match args.script {
        Some(path) => run_file(&path),

        None => run_prompt(),
    }
}

fn run_file(path: &Path) -> anyhow::Result<()> {
    let source: Vec<u8> = fs::read(path)?;

    let mut stdout = io::stdout();
    let mut runner = Runner::new(&mut stdout);

    if let Err(errors) = runner.run(&source) {
        let had_runtime_error: bool = errors
            .iter()
            .any(|e| matches!(e, LoxError::Runtime { .. }));

        for e in &errors {
            eprintln!("{}", e);
        }

        std::process::exit(if had_runtime_error { 70 } else { 65 });
    }

    Ok(())
}

fn run_prompt() -> anyhow::Result<()> {
    let mut output = io::stdout();
    let mut runner = Runner::new(&mut output);

    let stdin = io::stdin();
    let mut line = String::new();

    loop {
        print!("> ");
        io::stdout().flush()?;

        line.clear();

        if stdin.read_line(&mut line)? == 0 {
            // EOF ends the session.
            break;
        }

        // Report and carry on; the next line starts with a clean slate
        // while globals and resolved bindings persist.
        if let Err(errors) = runner.run(line.as_bytes()) {
            for e in &errors {
                eprintln!("{}", e);
            }
        }
    }

    Ok(())
}
