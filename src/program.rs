//! Validated program images.
//!
//! The machine itself never checks its input. Everything a user types (addresses,
//! mnemonics, operands, data values) is checked here once, and the result is a
//! [`Program`] that can be loaded into a [`Vm`](crate::vm::Vm) as is.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Deserialize;

use crate::opcode::Opcode;
use crate::registers::Word;

/// An error found while assembling a program from user input
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ProgramError {
  #[error("address must be a valid integer, got `{0}`")]
  InvalidAddress(String),

  #[error("address {address} is outside 0..{capacity}")]
  AddressOutOfRange { address: i128, capacity: usize },

  #[error("data value must be a valid integer, got `{0}`")]
  InvalidValue(String),

  #[error("missing operand for instruction at address {0}")]
  MissingOperand(usize),

  #[error("unknown instruction `{mnemonic}` at address {address}")]
  UnknownMnemonic { address: usize, mnemonic: String },

  #[error("duplicate instruction at address {0}")]
  DuplicateInstruction(usize),

  #[error("instruction count must be between 1 and {capacity}, got `{count}`")]
  InvalidCount { count: String, capacity: usize },
}

/// Parse a user-typed address, requiring it to lie in `[0, capacity)`
pub fn parse_address(text: &str, capacity: usize) -> Result<usize, ProgramError> {
  let text = text.trim();
  let address: i128 = text
    .parse()
    .map_err(|_| ProgramError::InvalidAddress(text.to_owned()))?;
  usize::try_from(address)
    .ok()
    .filter(|&a| a < capacity)
    .ok_or(ProgramError::AddressOutOfRange { address, capacity })
}

/// Parse a user-typed signed data value
pub fn parse_value(text: &str) -> Result<Word, ProgramError> {
  let text = text.trim();
  text
    .parse()
    .map_err(|_| ProgramError::InvalidValue(text.to_owned()))
}

/// Parse how many instruction slots a program should have, `1..=capacity`
pub fn validate_instruction_count(
  text: &str,
  capacity: usize,
) -> Result<usize, ProgramError> {
  let invalid = || ProgramError::InvalidCount {
    count: text.trim().to_owned(),
    capacity,
  };
  let count: usize = text.trim().parse().map_err(|_| invalid())?;
  if count == 0 || count > capacity {
    return Err(invalid());
  }
  Ok(count)
}

/// A program ready to be loaded: instruction texts and initial data values,
/// both keyed by in-range address
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
  instructions: BTreeMap<usize, String>,
  data: BTreeMap<usize, Word>,
}

impl Program {
  pub fn builder(capacity: usize) -> ProgramBuilder {
    ProgramBuilder::new(capacity)
  }

  /// Validate a deserialized program description
  pub fn from_source(
    source: &ProgramSource,
    capacity: usize,
  ) -> Result<Self, ProgramError> {
    let mut builder = ProgramBuilder::new(capacity);
    for entry in &source.instructions {
      let operand = entry.operand.as_ref().map(Field::to_string);
      builder.instruction(
        &entry.address.to_string(),
        &entry.mnemonic,
        operand.as_deref().unwrap_or(""),
      )?;
    }
    for entry in &source.data {
      builder.data(&entry.address.to_string(), &entry.value.to_string())?;
    }
    Ok(builder.build())
  }

  pub fn instructions(&self) -> &BTreeMap<usize, String> {
    &self.instructions
  }

  pub fn data(&self) -> &BTreeMap<usize, Word> {
    &self.data
  }
}

/// Collects user input into a [`Program`], rejecting anything malformed
#[derive(Debug, Clone)]
pub struct ProgramBuilder {
  capacity: usize,
  instructions: BTreeMap<usize, String>,
  operands: BTreeSet<usize>,
  values: BTreeMap<usize, Word>,
}

impl ProgramBuilder {
  pub fn new(capacity: usize) -> Self {
    Self {
      capacity,
      instructions: BTreeMap::new(),
      operands: BTreeSet::new(),
      values: BTreeMap::new(),
    }
  }

  /// Place an instruction at `address`.
  ///
  /// An empty `mnemonic` leaves the slot unused. `HLT` ignores `operand`;
  /// every other opcode needs an in-range operand address.
  pub fn instruction(
    &mut self,
    address: &str,
    mnemonic: &str,
    operand: &str,
  ) -> Result<&mut Self, ProgramError> {
    let address = parse_address(address, self.capacity)?;
    let mnemonic = mnemonic.trim();
    if mnemonic.is_empty() {
      return Ok(self);
    }
    if self.instructions.contains_key(&address) {
      return Err(ProgramError::DuplicateInstruction(address));
    }
    let opcode: Opcode = mnemonic.parse().map_err(|_| ProgramError::UnknownMnemonic {
      address,
      mnemonic: mnemonic.to_owned(),
    })?;
    let text = if opcode.requires_operand() {
      if operand.trim().is_empty() {
        return Err(ProgramError::MissingOperand(address));
      }
      let target = parse_address(operand, self.capacity)?;
      self.operands.insert(target);
      format!("{opcode} {target}")
    } else {
      opcode.to_string()
    };
    self.instructions.insert(address, text);
    Ok(self)
  }

  /// Give `address` an initial value; empty text means 0
  pub fn data(
    &mut self,
    address: &str,
    value: &str,
  ) -> Result<&mut Self, ProgramError> {
    let address = parse_address(address, self.capacity)?;
    let value = if value.trim().is_empty() {
      0
    } else {
      parse_value(value)?
    };
    self.values.insert(address, value);
    Ok(self)
  }

  /// Finish the program. Every operand address gets a data value (0 unless
  /// one was given); values for addresses no instruction refers to are
  /// dropped.
  pub fn build(self) -> Program {
    for address in self.values.keys() {
      if !self.operands.contains(address) {
        tracing::debug!(address, "dropping value for unreferenced address");
      }
    }
    let data = self
      .operands
      .iter()
      .map(|&address| (address, self.values.get(&address).copied().unwrap_or(0)))
      .collect();
    Program {
      instructions: self.instructions,
      data,
    }
  }
}

/// A JSON field that users may write either as a number or as text
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Field {
  Number(i64),
  Text(String),
}

impl fmt::Display for Field {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Number(n) => write!(f, "{n}"),
      Self::Text(s) => f.write_str(s),
    }
  }
}

/// One instruction slot of a [`ProgramSource`]
#[derive(Debug, Clone, Deserialize)]
pub struct InstructionEntry {
  pub address: Field,
  #[serde(default)]
  pub mnemonic: String,
  #[serde(default)]
  pub operand: Option<Field>,
}

/// One data value of a [`ProgramSource`]
#[derive(Debug, Clone, Deserialize)]
pub struct DataEntry {
  pub address: Field,
  pub value: Field,
}

/// An unvalidated program description, as read from a JSON document
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProgramSource {
  #[serde(default)]
  pub instructions: Vec<InstructionEntry>,
  #[serde(default)]
  pub data: Vec<DataEntry>,
}

impl ProgramSource {
  pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
    serde_json::from_str(json)
  }
}
