use crate::registers::Word;

/// Number of cells in a default-sized memory
pub const DEFAULT_CAPACITY: usize = 256;

/// A single addressable cell.
///
/// Every cell carries a data word. A cell configured as an instruction
/// additionally carries its text, so the tag and the text can never disagree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Cell {
  value: Word,
  instruction: Option<String>,
}

/// Fixed-capacity linear memory with a data view and an instruction view.
///
/// Every access is bounds checked: reads outside `[0, capacity)` yield a
/// default, writes outside it are dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Memory {
  cells: Vec<Cell>,
}

impl Memory {
  /// Create a memory of `capacity` default cells
  pub fn new(capacity: usize) -> Self {
    Self {
      cells: vec![Cell::default(); capacity],
    }
  }

  /// Number of addressable cells
  pub fn capacity(&self) -> usize {
    self.cells.len()
  }

  /// Restore every cell to its default, keeping the capacity
  pub fn clear(&mut self) {
    self.cells.fill(Cell::default());
  }

  /// Mark `address` as an instruction cell holding `text`
  pub fn set_instruction(&mut self, address: usize, text: impl Into<String>) {
    if let Some(cell) = self.cells.get_mut(address) {
      cell.instruction = Some(text.into());
    }
  }

  /// Write `value` into the data view of `address`; the tag is untouched
  pub fn set_data(&mut self, address: usize, value: Word) {
    if let Some(cell) = self.cells.get_mut(address) {
      cell.value = value;
    }
  }

  /// Data word at `address`, or 0 when out of range
  pub fn value(&self, address: usize) -> Word {
    self.cells.get(address).map_or(0, |cell| cell.value)
  }

  /// Instruction text at `address`, or "" when out of range or unset
  pub fn instruction(&self, address: usize) -> &str {
    self
      .cells
      .get(address)
      .and_then(|cell| cell.instruction.as_deref())
      .unwrap_or("")
  }

  /// Whether `address` was configured as an instruction cell
  pub fn is_instruction_address(&self, address: usize) -> bool {
    self
      .cells
      .get(address)
      .is_some_and(|cell| cell.instruction.is_some())
  }

  /// Describe each cell in `[start, min(end, capacity))`, one line per cell
  pub fn dump(&self, start: usize, end: usize) -> Vec<String> {
    let end = end.min(self.capacity());
    (start..end)
      .map(|address| {
        let cell = &self.cells[address];
        match &cell.instruction {
          Some(text) => format!("Address {address}: INSTRUCTION = '{text}'"),
          None => format!("Address {address}: DATA = {}", cell.value),
        }
      })
      .collect()
  }
}

impl Default for Memory {
  fn default() -> Self {
    Self::new(DEFAULT_CAPACITY)
  }
}
