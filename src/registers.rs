use std::fmt;

/// The type of a single data word, as held by the accumulator and data cells.
///
/// Arithmetic on words wraps on overflow; it never clamps or panics.
pub type Word = i64;

/// The five named registers of the machine.
///
/// This is a plain state container; only the [`Vm`](crate::vm::Vm) mutates
/// it, and it performs no validation of its own.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registers {
  /// Accumulator
  pub ac: Word,
  /// Program counter, an index into memory
  pub pc: usize,
  /// Instruction register, the raw text of the last fetched instruction
  pub ir: String,
  /// Memory address register, the address last used to fetch
  pub mar: usize,
  /// Memory data register, the text last read by a fetch
  pub mdr: String,
}

impl Registers {
  /// Create a zeroed register file
  pub fn new() -> Self {
    Self::default()
  }

  /// Zero (or empty) every register in place
  pub fn reset(&mut self) {
    self.ac = 0;
    self.pc = 0;
    self.ir.clear();
    self.mar = 0;
    self.mdr.clear();
  }
}

impl fmt::Display for Registers {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "AC={}, PC={}, IR={}, MAR={}, MDR={}",
      self.ac, self.pc, self.ir, self.mar, self.mdr
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn new_is_zeroed() {
    let regs = Registers::new();
    assert_eq!(regs.to_string(), "AC=0, PC=0, IR=, MAR=0, MDR=");
  }

  #[test]
  fn reset() {
    let mut regs = Registers {
      ac: -12,
      pc: 7,
      ir: "ADD 3".into(),
      mar: 6,
      mdr: "ADD 3".into(),
    };
    assert_eq!(
      regs.to_string(),
      "AC=-12, PC=7, IR=ADD 3, MAR=6, MDR=ADD 3"
    );
    regs.reset();
    assert_eq!(regs, Registers::new());
  }
}
