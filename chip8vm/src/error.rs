//! Result and errors.
use thiserror::Error;

use crate::constants::{Address, MAX_PROGRAM_SIZE};

pub type Chip8Result<T> = std::result::Result<T, Chip8Error>;

/// Fatal machine conditions.
///
/// None of these are recoverable at the VM level. They indicate either a
/// malformed program or a host bug, and abort the cycle they occur in.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Chip8Error {
    /// No instruction matches the opcode's nibble pattern.
    #[error("invalid opcode {0:04X}")]
    InvalidOpcode(u16),
    /// `CALL` with every stack slot occupied.
    #[error("call stack overflow calling {address:03X}")]
    StackOverflow { address: Address },
    /// `RET` with an empty call stack.
    #[error("call stack underflow")]
    StackUnderflow,
    /// Attempt to load a program that can't fit in memory.
    #[error("program of {len} bytes too large for VM memory (max {MAX_PROGRAM_SIZE})")]
    LargeProgram { len: usize },
    /// Instruction tried to touch memory outside the address space.
    #[error("memory access out of bounds at {address:04X}")]
    MemoryOutOfBounds { address: usize },
}
