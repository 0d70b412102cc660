//! A single-accumulator machine with a five-instruction set
//!
//! Memory holds instruction text and data words side by side; the machine
//! fetches, decodes and executes one instruction per cycle and keeps a
//! human-readable trace of what each cycle did.

pub mod config;
pub mod memory;
pub mod opcode;
pub mod program;
pub mod registers;
pub mod vm;
