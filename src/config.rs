use serde::Deserialize;

use crate::memory::DEFAULT_CAPACITY;

/// An error produced while reading a machine configuration
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
  #[error("malformed configuration: {0}")]
  Malformed(#[from] serde_json::Error),

  #[error("memory capacity must be at least one cell")]
  ZeroCapacity,
}

/// Machine configuration, fixed for the lifetime of a [`Vm`](crate::vm::Vm)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
  /// Number of memory cells
  pub capacity: usize,
}

impl Config {
  /// Parse a configuration such as `{"capacity": 64}`; missing fields
  /// take their defaults
  pub fn from_json(json: &str) -> Result<Self, ConfigError> {
    let config: Self = serde_json::from_str(json)?;
    config.validate()
  }

  /// Replace the capacity, rejecting an empty memory
  pub fn with_capacity(self, capacity: usize) -> Result<Self, ConfigError> {
    Self { capacity }.validate()
  }

  fn validate(self) -> Result<Self, ConfigError> {
    if self.capacity == 0 {
      return Err(ConfigError::ZeroCapacity);
    }
    Ok(self)
  }
}

impl Default for Config {
  fn default() -> Self {
    Self {
      capacity: DEFAULT_CAPACITY,
    }
  }
}
