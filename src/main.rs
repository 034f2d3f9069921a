use std::io::ErrorKind;
use std::process::exit;
use std::{env, fs, io};

use nscore::errors::CompileError;

fn main() {
  // Emitter warnings (for example the relaxed-comparison compatibility
  // notes) surface on stderr.
  tracing_subscriber::fmt().with_target(false).without_time().init();

  // structure: nsqb <mode> <input> <output>
  let args = env::args().collect::<Vec<String>>();
  let args = args.iter().map(String::as_str).collect::<Vec<&str>>();

  match args.as_slice() {
    [_, "compile", input, output] => compile_file(input, output),
    [_, "decompile", input, output] => decompile_file(input, output),
    _ => {
      eprintln!("usage: nsqb compile <input.ns> <output.qb>");
      eprintln!("       nsqb decompile <input.qb> <output.ns>");
      exit(64);
    }
  }
}

fn compile_file(input: &str, output: &str) {
  let source = match fs::read_to_string(input) {
    Ok(source) => source,
    Err(error) => exit_io(input, &error),
  };

  match nscompiler::compile(&source) {
    Ok(bytes) => write_file(output, &bytes),
    Err(CompileError::Parse(reports)) => {
      for report in reports {
        eprintln!("{}", report.message);
      }
      exit(1);
    }
    Err(error) => {
      eprintln!("CompileError: {}", error);
      exit(1);
    }
  }
}

fn decompile_file(input: &str, output: &str) {
  let bytes = match fs::read(input) {
    Ok(bytes) => bytes,
    Err(error) => exit_io(input, &error),
  };

  match nsdecompiler::decompile(&bytes) {
    Ok(text) => write_file(output, text.as_bytes()),
    Err(error) => {
      eprintln!("DecompileError: {}", error);
      exit(2);
    }
  }
}

fn write_file(filename: &str, contents: &[u8]) {
  if let Err(error) = fs::write(filename, contents) {
    exit_io(filename, &error);
  }
}

fn exit_io(filename: &str, error: &io::Error) -> ! {
  match error.kind() {
    ErrorKind::NotFound => eprintln!("File '{}' not found.", filename),
    ErrorKind::PermissionDenied => eprintln!("Need permission to open '{}'.", filename),
    _ => eprintln!("Unexpected error when accessing '{}'.", filename),
  };

  match error.raw_os_error() {
    Some(code) => exit(code),
    None => exit(70),
  }
}
