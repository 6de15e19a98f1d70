//! CLI host: compiles a source file and runs it, or dumps its token stream
//! / disassembled bytecode for inspection.

use std::fs;
use std::process::ExitCode;

use clap::Parser as ClapParser;

use au3c::scanner::Scanner;

#[derive(ClapParser, Debug)]
#[command(name = "au3c", about = "Compile and run an au3 script")]
struct Cli {
  /// Path to the source file.
  path: String,

  /// Print the token stream instead of running the script.
  #[arg(long)]
  dump_tokens: bool,

  /// Disassemble the compiled bytecode instead of running the script.
  #[arg(long)]
  dump_bytecode: bool,
}

fn main() -> ExitCode {
  env_logger::init();
  let cli = Cli::parse();

  let source = match fs::read_to_string(&cli.path) {
    Ok(s) => s,
    Err(e) => {
      eprintln!("au3c: can't read {}: {e}", cli.path);
      return ExitCode::FAILURE;
    }
  };

  if cli.dump_tokens {
    dump_tokens(&source);
    return ExitCode::SUCCESS;
  }

  let function = match au3c::compile(&source) {
    Ok(function) => function,
    Err(diagnostics) => {
      for diagnostic in &diagnostics {
        eprintln!("{diagnostic}");
      }
      return ExitCode::FAILURE;
    }
  };

  if cli.dump_bytecode {
    au3c::debug::disassemble_chunk(&function.chunk, "<script>");
    return ExitCode::SUCCESS;
  }

  let mut vm = au3c::Vm::new();
  match vm.interpret(function) {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      eprintln!("{err}");
      ExitCode::FAILURE
    }
  }
}

fn dump_tokens(source: &str) {
  let mut scanner = Scanner::bind(source);
  loop {
    let tok = scanner.scan_token();
    let done = tok.token_type == au3c::scanner::TokenType::Eof;
    println!("{:4}:{:<3} {:?} {:?}", tok.line, tok.column, tok.token_type, tok.lexeme);
    if done {
      break;
    }
  }
}
