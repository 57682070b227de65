use std::{
    fs,
    io::{self, Write},
    path::PathBuf,
    process,
};

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use minnow_rs::{InterpretResult, VirtualMachine};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Script to interpret; omit it to start a REPL
    #[arg(value_name = "FILE")]
    script: Option<PathBuf>,

    /// Print the stack and each instruction while executing
    #[arg(short, long)]
    trace: bool,

    /// Print the compiled bytecode before running
    #[arg(short, long)]
    disassemble: bool,
}

fn main() {
    let cli = Cli::try_parse().unwrap_or_else(|err| {
        let _ = err.print();
        match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => process::exit(0),
            _ => process::exit(64),
        }
    });

    let mut vm = VirtualMachine::new();
    vm.set_trace(cli.trace);
    vm.set_disassemble(cli.disassemble);

    match cli.script {
        Some(path) => {
            let result = execute_file(path, &mut vm).unwrap_or_else(|err| {
                eprintln!("{:#}", err);
                process::exit(74);
            });
            match result {
                InterpretResult::Ok => {}
                InterpretResult::CompileError => process::exit(65),
                InterpretResult::RuntimeError => process::exit(70),
            }
        }
        None => start_repl(vm),
    }
}

fn execute_file(path: PathBuf, vm: &mut VirtualMachine) -> Result<InterpretResult> {
    let source = fs::read_to_string(&path).context(format!("Failed to read {}", path.display()))?;
    Ok(vm.interpret(&source))
}

fn start_repl(mut vm: VirtualMachine) {
    loop {
        print!("> ");
        io::stdout().flush().expect("Failed to flush stdout");

        let mut input = String::new();
        match io::stdin().read_line(&mut input) {
            Ok(0) => break,
            Ok(_) => {
                vm.interpret(&input);
            }
            Err(err) => {
                eprintln!("Failed to read line: {}", err);
                break;
            }
        }
    }
}
