use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
  /// Loads a memory word into the accumulator.
  ///
  /// | Operation | Semantics/RTL | Assembly |
  /// |-----------|---------------|----------|
  /// | Load      | `AC ← m[a]`   | `LOAD a` |
  Load,

  /// Stores the accumulator into memory.
  ///
  /// | Operation | Semantics/RTL | Assembly  |
  /// |-----------|---------------|-----------|
  /// | Store     | `m[a] ← AC`   | `STORE a` |
  Store,

  /// | Operation | Semantics/RTL    | Assembly |
  /// |-----------|------------------|----------|
  /// | Add       | `AC ← AC + m[a]` | `ADD a`  |
  Add,

  /// | Operation | Semantics/RTL    | Assembly |
  /// |-----------|------------------|----------|
  /// | Subtract  | `AC ← AC − m[a]` | `SUB a`  |
  Sub,

  /// | Operation | Semantics/RTL      | Assembly |
  /// |-----------|--------------------|----------|
  /// | Halt      | `(stop execution)` | `HLT`    |
  Halt,
}

impl Opcode {
  /// Every opcode, in mnemonic table order
  pub const ALL: [Opcode; 5] = [
    Opcode::Load,
    Opcode::Store,
    Opcode::Add,
    Opcode::Sub,
    Opcode::Halt,
  ];

  pub fn mnemonic(self) -> &'static str {
    match self {
      Self::Load => "LOAD",
      Self::Store => "STORE",
      Self::Add => "ADD",
      Self::Sub => "SUB",
      Self::Halt => "HLT",
    }
  }

  /// Whether the opcode takes an address operand
  pub fn requires_operand(self) -> bool {
    !matches!(self, Self::Halt)
  }
}

impl fmt::Display for Opcode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.mnemonic())
  }
}

/// Returned when text is not one of the (case-sensitive) mnemonics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownMnemonic;

impl FromStr for Opcode {
  type Err = UnknownMnemonic;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::ALL
      .into_iter()
      .find(|op| op.mnemonic() == s)
      .ok_or(UnknownMnemonic)
  }
}

/// A malformed instruction.
///
/// None of these stop the machine; each is recorded in the trace and the
/// next cycle proceeds as normal.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
  #[error("Missing operand")]
  MissingOperand,

  #[error("Invalid address")]
  InvalidOperand,

  #[error("Unknown instruction")]
  UnknownInstruction,
}

/// An operand address exactly as the instruction wrote it.
///
/// Any integer is accepted. Those too large for a machine address keep
/// their normalized digits so the trace can still show them; memory treats
/// them like any other out-of-range address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
  Address(usize),
  OutOfRange(String),
}

impl Operand {
  /// The memory index, if the operand can name one
  pub fn index(&self) -> Option<usize> {
    match self {
      Self::Address(address) => Some(*address),
      Self::OutOfRange(_) => None,
    }
  }
}

impl fmt::Display for Operand {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Address(address) => write!(f, "{address}"),
      Self::OutOfRange(literal) => f.write_str(literal),
    }
  }
}

impl FromStr for Operand {
  type Err = Fault;

  /// Integer syntax: an optional sign, then digits that may be grouped by
  /// single underscores (`1_000`)
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let (negative, body) = match s.strip_prefix('-') {
      Some(body) => (true, body),
      None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let digits = ungrouped_digits(body).ok_or(Fault::InvalidOperand)?;
    let digits = digits.trim_start_matches('0');
    if digits.is_empty() {
      return Ok(Self::Address(0));
    }
    if negative {
      return Ok(Self::OutOfRange(format!("-{digits}")));
    }
    Ok(
      digits
        .parse()
        .map_or_else(|_| Self::OutOfRange(digits.to_owned()), Self::Address),
    )
  }
}

// "1_000" -> "1000"; no leading, trailing or doubled underscores
fn ungrouped_digits(text: &str) -> Option<String> {
  let mut digits = String::with_capacity(text.len());
  let mut after_digit = false;
  for c in text.chars() {
    match c {
      '0'..='9' => {
        digits.push(c);
        after_digit = true;
      }
      '_' if after_digit => after_digit = false,
      _ => return None,
    }
  }
  after_digit.then_some(digits)
}

/// The result of decoding one fetched instruction text.
///
/// Operands are not range checked here; memory resolves out-of-range
/// addresses itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
  /// Nothing to execute (empty or whitespace-only text)
  Blank,
  Halt,
  Load(Operand),
  Store(Operand),
  Add(Operand),
  Sub(Operand),
  Fault(Fault),
}

impl Decoded {
  /// Decode a whitespace-separated instruction.
  ///
  /// The checks run in a fixed order: `HLT` first, then operand presence,
  /// then operand syntax, and only then the mnemonic. So `FOO` is a missing
  /// operand while `FOO 3` is an unknown instruction.
  pub fn decode(text: &str) -> Self {
    let mut tokens = text.split_whitespace();
    let Some(head) = tokens.next() else {
      return Self::Blank;
    };
    let opcode = head.parse::<Opcode>().ok();
    if opcode == Some(Opcode::Halt) {
      return Self::Halt;
    }
    let Some(operand) = tokens.next() else {
      return Self::Fault(Fault::MissingOperand);
    };
    let operand = match operand.parse::<Operand>() {
      Ok(operand) => operand,
      Err(fault) => return Self::Fault(fault),
    };
    match opcode {
      Some(Opcode::Load) => Self::Load(operand),
      Some(Opcode::Store) => Self::Store(operand),
      Some(Opcode::Add) => Self::Add(operand),
      Some(Opcode::Sub) => Self::Sub(operand),
      Some(Opcode::Halt) => Self::Halt,
      None => Self::Fault(Fault::UnknownInstruction),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  use rstest::rstest;

  #[rstest]
  #[case("", Decoded::Blank)]
  #[case("   \t ", Decoded::Blank)]
  #[case("HLT", Decoded::Halt)]
  #[case("HLT 12", Decoded::Halt)]
  #[case("  HLT  ", Decoded::Halt)]
  #[case("LOAD 10", Decoded::Load(Operand::Address(10)))]
  #[case("STORE   5", Decoded::Store(Operand::Address(5)))]
  #[case("ADD +3", Decoded::Add(Operand::Address(3)))]
  #[case("SUB -1", Decoded::Sub(Operand::OutOfRange("-1".into())))]
  #[case("LOAD 4 trailing", Decoded::Load(Operand::Address(4)))]
  #[case("LOAD 1_0", Decoded::Load(Operand::Address(10)))]
  #[case("LOAD 007", Decoded::Load(Operand::Address(7)))]
  #[case("SUB -0", Decoded::Sub(Operand::Address(0)))]
  #[case(
    "LOAD 99999999999999999999",
    Decoded::Load(Operand::OutOfRange("99999999999999999999".into()))
  )]
  #[case("STORE -00_12", Decoded::Store(Operand::OutOfRange("-12".into())))]
  #[case("ADD", Decoded::Fault(Fault::MissingOperand))]
  #[case("FOO", Decoded::Fault(Fault::MissingOperand))]
  #[case("SUB abc", Decoded::Fault(Fault::InvalidOperand))]
  #[case("FOO abc", Decoded::Fault(Fault::InvalidOperand))]
  #[case("LOAD 1.5", Decoded::Fault(Fault::InvalidOperand))]
  #[case("LOAD 1__0", Decoded::Fault(Fault::InvalidOperand))]
  #[case("LOAD _10", Decoded::Fault(Fault::InvalidOperand))]
  #[case("LOAD 10_", Decoded::Fault(Fault::InvalidOperand))]
  #[case("LOAD +-1", Decoded::Fault(Fault::InvalidOperand))]
  #[case("LOAD -", Decoded::Fault(Fault::InvalidOperand))]
  #[case("FOO 99999999999999999999", Decoded::Fault(Fault::UnknownInstruction))]
  #[case("FOO 3", Decoded::Fault(Fault::UnknownInstruction))]
  #[case("load 3", Decoded::Fault(Fault::UnknownInstruction))]
  #[case("hlt", Decoded::Fault(Fault::MissingOperand))]
  fn decode(#[case] text: &str, #[case] expected: Decoded) {
    assert_eq!(Decoded::decode(text), expected);
  }

  #[test]
  fn mnemonics_round_trip() {
    for op in Opcode::ALL {
      assert_eq!(op.to_string().parse::<Opcode>(), Ok(op));
    }
    assert_eq!("Load".parse::<Opcode>(), Err(UnknownMnemonic));
  }

  #[test]
  fn operand_display_is_normalized() {
    let shown = |text: &str| text.parse::<Operand>().unwrap().to_string();
    assert_eq!(shown("+0_12"), "12");
    assert_eq!(shown("-7"), "-7");
    assert_eq!(shown("123_456_789_012_345_678_901"), "123456789012345678901");
    assert_eq!("-7".parse::<Operand>().unwrap().index(), None);
    assert_eq!("12".parse::<Operand>().unwrap().index(), Some(12));
  }

  #[test]
  fn operand_requirements() {
    assert!(Opcode::Load.requires_operand());
    assert!(Opcode::Sub.requires_operand());
    assert!(!Opcode::Halt.requires_operand());
  }

  #[test]
  fn fault_messages() {
    assert_eq!(Fault::MissingOperand.to_string(), "Missing operand");
    assert_eq!(Fault::InvalidOperand.to_string(), "Invalid address");
    assert_eq!(Fault::UnknownInstruction.to_string(), "Unknown instruction");
  }
}
