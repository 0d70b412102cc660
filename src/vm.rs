use std::fmt;

use crate::config::Config;
use crate::memory::Memory;
use crate::opcode::{Decoded, Fault, Operand};
use crate::program::Program;
use crate::registers::{Registers, Word};

/// Width of the rule drawn around a full run in the trace
const RULE_WIDTH: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq)]
enum State {
  Active,
  Halted,
}

/// Where the machine is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
  /// No cycle has run since construction or the last reset
  Idle,
  Running,
  /// A `HLT` was executed
  Halted,
  /// The program counter ran off the end of memory. Stops the machine like
  /// a halt, but [`Vm::is_halted`] stays false.
  OutOfBounds,
}

/// A single-accumulator machine executing text instructions out of memory.
///
/// Each cycle fetches the instruction at `PC`, advances `PC` by one and
/// executes what was fetched, appending a line to the trace. Malformed
/// instructions are traced and skipped; the machine only stops on `HLT` or
/// when `PC` reaches the end of memory.
#[derive(Debug)]
pub struct Vm {
  registers: Registers,
  memory: Memory,
  state: State,
  trace: Vec<String>,
  cycles: u64,
}

impl Vm {
  /// Create a blank machine with the default memory capacity
  pub fn new() -> Self {
    Self::with_config(Config::default())
  }

  pub fn with_config(config: Config) -> Self {
    Self {
      registers: Registers::new(),
      memory: Memory::new(config.capacity),
      state: State::Active,
      trace: Vec::new(),
      cycles: 0,
    }
  }

  /// Write a program's instructions, then its data, into memory
  pub fn load(&mut self, program: &Program) {
    for (&address, text) in program.instructions() {
      self.memory.set_instruction(address, text.as_str());
    }
    for (&address, &value) in program.data() {
      self.memory.set_data(address, value);
    }
    tracing::debug!(
      instructions = program.instructions().len(),
      data = program.data().len(),
      "program loaded"
    );
  }

  pub fn registers(&self) -> &Registers {
    &self.registers
  }

  pub fn memory(&self) -> &Memory {
    &self.memory
  }

  /// Direct access to memory, for populating it cell by cell
  pub fn memory_mut(&mut self) -> &mut Memory {
    &mut self.memory
  }

  /// Every trace line recorded since the last full run or reset
  pub fn trace(&self) -> &[String] {
    &self.trace
  }

  pub fn is_halted(&self) -> bool {
    self.state == State::Halted
  }

  /// Number of fetches since construction or the last reset
  pub fn cycles(&self) -> u64 {
    self.cycles
  }

  pub fn status(&self) -> Status {
    if self.is_halted() {
      Status::Halted
    } else if self.registers.pc >= self.memory.capacity() {
      Status::OutOfBounds
    } else if self.cycles == 0 {
      Status::Idle
    } else {
      Status::Running
    }
  }

  /// Load the instruction at `PC` into `IR` and advance `PC`.
  ///
  /// `PC` advances even when the cell holds no instruction; such a cell
  /// simply yields empty text.
  pub fn fetch(&mut self) {
    let regs = &mut self.registers;
    // MAR ← PC
    regs.mar = regs.pc;
    // MDR ← m[MAR]
    regs.mdr = self.memory.instruction(regs.mar).to_owned();
    // IR ← MDR
    regs.ir.clone_from(&regs.mdr);
    // PC ← PC + 1
    regs.pc += 1;
    self.cycles += 1;
    tracing::trace!(mar = regs.mar, ir = %regs.ir, "fetch");
  }

  /// Execute the instruction in `IR`, appending one trace line.
  ///
  /// Nothing happens (and nothing is traced) when `IR` is blank or the
  /// machine has already halted.
  pub fn decode_execute(&mut self) {
    if self.state == State::Halted {
      return;
    }
    let decoded = Decoded::decode(&self.registers.ir);
    // the address this instruction was fetched from
    let pc = self.registers.pc.wrapping_sub(1) as isize;
    let mut task = Task::new(self, pc);
    match decoded {
      Decoded::Blank => {}
      Decoded::Halt => halt(&mut task),
      Decoded::Load(address) => load(&mut task, &address),
      Decoded::Store(address) => store(&mut task, &address),
      Decoded::Add(address) => add(&mut task, &address),
      Decoded::Sub(address) => sub(&mut task, &address),
      Decoded::Fault(fault) => malformed(&mut task, fault),
    }
  }

  /// Run one fetch-execute cycle, returning whether the machine can keep
  /// going. Does nothing once halted or once `PC` is past the end of memory.
  pub fn run_cycle(&mut self) -> bool {
    if self.state == State::Halted || self.registers.pc >= self.memory.capacity() {
      return false;
    }
    self.fetch();
    self.decode_execute();
    self.state != State::Halted
  }

  /// Run cycles until the machine stops, returning the whole trace.
  ///
  /// Unlike [`run_cycle`](Self::run_cycle), this starts the trace afresh.
  pub fn run_program(&mut self) -> &[String] {
    tracing::info!(pc = self.registers.pc, "run started");
    self.trace.clear();
    self.trace.push("Starting program execution...".to_owned());
    self.trace.push("=".repeat(RULE_WIDTH));

    while self.run_cycle() {}

    self.trace.push("=".repeat(RULE_WIDTH));
    self.trace.push("Program execution completed.".to_owned());
    tracing::info!(
      cycles = self.cycles,
      status = ?self.status(),
      ac = self.registers.ac,
      "run finished"
    );
    &self.trace
  }

  /// Return to a blank machine: registers zeroed, memory cleared, trace
  /// emptied. Memory must be populated again before running.
  pub fn reset(&mut self) {
    self.registers.reset();
    self.memory.clear();
    self.state = State::Active;
    self.trace.clear();
    self.cycles = 0;
  }

  // operands are not range checked, so a negative or oversized one reads 0
  // like any other out-of-range address
  fn read_word(&self, address: &Operand) -> Word {
    address.index().map_or(0, |address| self.memory.value(address))
  }

  fn write_word(&mut self, address: &Operand, value: Word) {
    if let Some(address) = address.index() {
      self.memory.set_data(address, value);
    }
  }
}

impl Default for Vm {
  fn default() -> Self {
    Self::new()
  }
}

/// The execution of a single fetched instruction
struct Task<'vm> {
  vm: &'vm mut Vm,
  pc: isize,
}

impl<'vm> Task<'vm> {
  fn new(vm: &'vm mut Vm, pc: isize) -> Self {
    Self { vm, pc }
  }

  fn record(&mut self, effect: fmt::Arguments<'_>) {
    let line = format!("PC={}\tIR={}\t{}", self.pc, self.vm.registers.ir, effect);
    tracing::debug!(target: "emulator::trace", "{line}");
    self.vm.trace.push(line);
  }
}

// AC ← m[a]
fn load(task: &mut Task<'_>, address: &Operand) {
  let value = task.vm.read_word(address);
  let before = task.vm.registers.ac;
  task.vm.registers.ac = value;
  task.record(format_args!(
    "AC={before}→{value}\t\t(loaded from memory[{address}]={value})"
  ));
}

// m[a] ← AC
fn store(task: &mut Task<'_>, address: &Operand) {
  let ac = task.vm.registers.ac;
  let before = task.vm.read_word(address);
  task.vm.write_word(address, ac);
  let after = task.vm.read_word(address);
  task.record(format_args!(
    "Memory[{address}]={before}→{after}\t(stored from AC={ac})"
  ));
}

// AC ← AC + m[a]
fn add(task: &mut Task<'_>, address: &Operand) {
  let value = task.vm.read_word(address);
  let before = task.vm.registers.ac;
  let after = before.wrapping_add(value);
  task.vm.registers.ac = after;
  task.record(format_args!(
    "AC={before}→{after}\t\t(added memory[{address}]={value})"
  ));
}

// AC ← AC − m[a]
fn sub(task: &mut Task<'_>, address: &Operand) {
  let value = task.vm.read_word(address);
  let before = task.vm.registers.ac;
  let after = before.wrapping_sub(value);
  task.vm.registers.ac = after;
  task.record(format_args!(
    "AC={before}→{after}\t\t(subtracted memory[{address}]={value})"
  ));
}

// (stop execution)
fn halt(task: &mut Task<'_>) {
  task.vm.state = State::Halted;
  task.record(format_args!("Program Halted."));
}

// (log and carry on)
fn malformed(task: &mut Task<'_>, fault: Fault) {
  tracing::warn!(pc = task.pc, ir = %task.vm.registers.ir, %fault, "malformed instruction");
  task.record(format_args!("Error: {fault}"));
}
