use std::ops::Range;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::{fs, io};

use clap::Parser;
use tracing_subscriber::EnvFilter;

use emulator::config::{Config, ConfigError};
use emulator::program::{Program, ProgramBuilder, ProgramError, ProgramSource};
use emulator::vm::Vm;

/// Run a program on the accumulator machine and print its trace
#[derive(Parser, Debug)]
#[command(name = "main", version, about)]
struct Cli {
  /// Program description (JSON); a small demo runs when omitted
  program: Option<PathBuf>,

  /// Machine configuration (JSON)
  #[arg(long)]
  config: Option<PathBuf>,

  /// Memory capacity, overriding the configuration
  #[arg(long)]
  capacity: Option<usize>,

  /// Run this many single cycles instead of a full run
  #[arg(long)]
  step: Option<usize>,

  /// Print the memory cells in `start..end` after running
  #[arg(long, value_parser = parse_range)]
  dump: Option<Range<usize>>,

  /// Print the registers after running
  #[arg(long)]
  registers: bool,
}

#[derive(thiserror::Error, Debug)]
enum Error {
  #[error("could not read {}: {source}", .path.display())]
  Read { path: PathBuf, source: io::Error },

  #[error("malformed program: {0}")]
  Source(#[from] serde_json::Error),

  #[error(transparent)]
  Config(#[from] ConfigError),

  #[error(transparent)]
  Program(#[from] ProgramError),
}

fn parse_range(s: &str) -> Result<Range<usize>, String> {
  let (start, end) = s
    .split_once("..")
    .ok_or_else(|| format!("expected `start..end`, got `{s}`"))?;
  let start = start.trim().parse().map_err(|e| format!("bad start: {e}"))?;
  let end = end.trim().parse().map_err(|e| format!("bad end: {e}"))?;
  Ok(start..end)
}

fn read(path: &Path) -> Result<String, Error> {
  fs::read_to_string(path).map_err(|source| Error::Read {
    path: path.to_path_buf(),
    source,
  })
}

// LOAD 10; ADD 11; STORE 12; HLT
fn demo(capacity: usize) -> Result<Program, ProgramError> {
  let mut builder = ProgramBuilder::new(capacity);
  builder
    .instruction("0", "LOAD", "10")?
    .instruction("1", "ADD", "11")?
    .instruction("2", "STORE", "12")?
    .instruction("3", "HLT", "")?
    .data("10", "5")?
    .data("11", "7")?;
  Ok(builder.build())
}

fn run(cli: Cli) -> Result<(), Error> {
  let mut config = match &cli.config {
    Some(path) => Config::from_json(&read(path)?)?,
    None => Config::default(),
  };
  if let Some(capacity) = cli.capacity {
    config = config.with_capacity(capacity)?;
  }

  let program = match &cli.program {
    Some(path) => {
      let source = ProgramSource::from_json(&read(path)?)?;
      Program::from_source(&source, config.capacity)?
    }
    None => demo(config.capacity)?,
  };

  let mut vm = Vm::with_config(config);
  vm.load(&program);
  match cli.step {
    Some(steps) => {
      for _ in 0..steps {
        if !vm.run_cycle() {
          break;
        }
      }
    }
    None => {
      vm.run_program();
    }
  }

  for line in vm.trace() {
    println!("{line}");
  }
  if cli.registers {
    println!("{}", vm.registers());
  }
  if let Some(range) = cli.dump {
    for line in vm.memory().dump(range.start, range.end) {
      println!("{line}");
    }
  }
  Ok(())
}

fn main() -> ExitCode {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .with_writer(io::stderr)
    .init();

  match run(Cli::parse()) {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      eprintln!("error: {e}");
      ExitCode::FAILURE
    }
  }
}
