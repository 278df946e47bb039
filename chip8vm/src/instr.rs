//! Decoded instructions.
//!
//! Each variant is bound to the operands sliced out of its opcode.
//! Decoding is pure; the program counter is advanced by the VM.
use std::fmt::{self, Formatter};

use crate::{
    bytecode::*,
    constants::Address,
    error::{Chip8Error, Chip8Result},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub enum Instr {
    /// Placeholder produced while the machine is idle.
    ///
    /// Not part of the instruction set, and never decoded from an opcode.
    Idle,
    /// 00E0 (CLS)
    ///
    /// Clear the screen.
    ClearScreen,
    /// 00EE (RET)
    ///
    /// Return from the sub-routine.
    Return,
    /// 1nnn (JP addr)
    ///
    /// Jump to the address in `nnn`.
    Jump { address: Address },
    /// 2nnn (CALL addr)
    ///
    /// Call the sub-routine at address `nnn`.
    Call { address: Address },
    /// 3xnn (SE Vx, byte)
    ///
    /// Skip the next instruction if register `Vx` equals value `nn`
    Skip_Eq_Byte { vx: u8, nn: u8 },
    /// 4xnn (SNE Vx, byte)
    ///
    /// Skip the next instruction if register `Vx` does not equal value `nn`.
    Skip_NotEq_Byte { vx: u8, nn: u8 },
    /// 5xy0 (SE Vx, Vy)
    ///
    /// Skip the next instruction if register `Vx` equals register `Vy`.
    Skip_Eq { vx: u8, vy: u8 },
    /// 6xnn (LD Vx, byte)
    Load_Byte { vx: u8, nn: u8 },
    /// 7xnn (ADD Vx, byte)
    ///
    /// Add byte to the value in register `Vx`, store the result in `Vx`.
    /// Carry flag is not set.
    Add_Byte { vx: u8, nn: u8 },

    // ------------------------------------------------------------------------
    // Math
    /// 8xy0 (LD Vx, Vy)
    Load_Vx_Vy { vx: u8, vy: u8 },
    /// 8xy1 (OR Vx, Vy)
    Or_Vx_Vy { vx: u8, vy: u8 },
    /// 8xy2 (AND Vx, Vy)
    And_Vx_Vy { vx: u8, vy: u8 },
    /// 8xy3 (XOR Vx, Vy)
    Xor_Vx_Vy { vx: u8, vy: u8 },
    /// 8xy4 (ADD Vx, Vy)
    ///
    /// Overflow is wrapped. If overflowed, set VF to 1, else 0.
    Add_Vx_Vy { vx: u8, vy: u8 },
    /// 8xy5 (SUB Vx, Vy)
    ///
    /// VF is set to 0 when there is a borrow, set to 1 when there isn't.
    Sub_Vx_Vy { vx: u8, vy: u8 },
    /// 8xy6 (SHR Vx)
    ///
    /// VF receives the bit shifted out. VY is unused.
    ShiftRight { vx: u8 },
    /// 8xy7 (SUBN Vx, Vy)
    ///
    /// Subtracts VX from VY, and stores the result in VX.
    SubReverse_Vx_Vy { vx: u8, vy: u8 },
    /// 8xyE (SHL Vx)
    ///
    /// VF receives the bit shifted out. VY is unused.
    ShiftLeft { vx: u8 },

    /// 9xy0 (SNE Vx, Vy)
    Skip_NotEq { vx: u8, vy: u8 },
    /// Annn (LD I, addr)
    ///
    /// Load address into register `I`.
    Load_Address { address: Address },
    /// Bnnn (JP V0, addr)
    ///
    /// Jump to location nnn + V0.
    Jump_V0 { address: Address },
    /// Cxnn (RND Vx, byte)
    ///
    /// Random byte masked with `nn`.
    Random { vx: u8, nn: u8 },
    /// Dxyn (DRW Vx, Vy, nibble)
    ///
    /// Draw sprite to the display buffer.
    Draw { vx: u8, vy: u8, n: u8 },

    // ------------------------------------------------------------------------
    // Keyboard
    /// Ex9E (SKP Vx)
    Skip_Key { vx: u8 },
    /// ExA1 (SKNP Vx)
    Skip_NotKey { vx: u8 },

    // ------------------------------------------------------------------------
    // Timers and memory
    /// Fx07 (LD Vx, DT)
    Load_Vx_Delay { vx: u8 },
    /// Fx0A (LD Vx, K)
    ///
    /// Stall until a key is pressed, then store it in `Vx`.
    Load_Vx_Key { vx: u8 },
    /// Fx15 (LD DT, Vx)
    Load_Delay_Vx { vx: u8 },
    /// Fx18 (LD ST, Vx)
    Load_Sound_Vx { vx: u8 },
    /// Fx1E (ADD I, Vx)
    Add_Address_Vx { vx: u8 },
    /// Fx29 (LD F, Vx)
    ///
    /// Point `I` at the built-in glyph for digit `Vx`.
    Load_Glyph { vx: u8 },
    /// Fx33 (LD B, Vx)
    ///
    /// Binary-coded decimal of `Vx` into `I`, `I+1`, `I+2`.
    Load_Bcd { vx: u8 },
    /// Fx55 (LD [I], Vx)
    Store_Registers { vx: u8 },
    /// Fx65 (LD Vx, [I])
    Load_Registers { vx: u8 },
}

impl Instr {
    /// Map an opcode to its instruction.
    pub fn decode(opcode: u16) -> Chip8Result<Instr> {
        let (vx, vy, n) = op_xyn(opcode);
        let nn = op_nn(opcode);
        let address = op_nnn(opcode);

        let instr = match op_code(opcode) {
            // Only two operations live under 0x0. Anything else here is
            // a machine language routine call, which is unsupported.
            0x0 => match opcode {
                0x00E0 => Instr::ClearScreen,
                0x00EE => Instr::Return,
                _ => return Err(Chip8Error::InvalidOpcode(opcode)),
            },
            0x1 => Instr::Jump { address },
            0x2 => Instr::Call { address },
            0x3 => Instr::Skip_Eq_Byte { vx, nn },
            0x4 => Instr::Skip_NotEq_Byte { vx, nn },
            0x5 => Instr::Skip_Eq { vx, vy },
            0x6 => Instr::Load_Byte { vx, nn },
            0x7 => Instr::Add_Byte { vx, nn },
            0x8 => match n {
                0x0 => Instr::Load_Vx_Vy { vx, vy },
                0x1 => Instr::Or_Vx_Vy { vx, vy },
                0x2 => Instr::And_Vx_Vy { vx, vy },
                0x3 => Instr::Xor_Vx_Vy { vx, vy },
                0x4 => Instr::Add_Vx_Vy { vx, vy },
                0x5 => Instr::Sub_Vx_Vy { vx, vy },
                0x6 => Instr::ShiftRight { vx },
                0x7 => Instr::SubReverse_Vx_Vy { vx, vy },
                0xE => Instr::ShiftLeft { vx },
                _ => return Err(Chip8Error::InvalidOpcode(opcode)),
            },
            0x9 => Instr::Skip_NotEq { vx, vy },
            0xA => Instr::Load_Address { address },
            0xB => Instr::Jump_V0 { address },
            0xC => Instr::Random { vx, nn },
            0xD => Instr::Draw { vx, vy, n },
            0xE => match nn {
                0x9E => Instr::Skip_Key { vx },
                0xA1 => Instr::Skip_NotKey { vx },
                _ => return Err(Chip8Error::InvalidOpcode(opcode)),
            },
            0xF => match nn {
                0x07 => Instr::Load_Vx_Delay { vx },
                0x0A => Instr::Load_Vx_Key { vx },
                0x15 => Instr::Load_Delay_Vx { vx },
                0x18 => Instr::Load_Sound_Vx { vx },
                0x1E => Instr::Add_Address_Vx { vx },
                0x29 => Instr::Load_Glyph { vx },
                0x33 => Instr::Load_Bcd { vx },
                0x55 => Instr::Store_Registers { vx },
                0x65 => Instr::Load_Registers { vx },
                _ => return Err(Chip8Error::InvalidOpcode(opcode)),
            },
            _ => return Err(Chip8Error::InvalidOpcode(opcode)),
        };

        Ok(instr)
    }
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match *self {
            Instr::Idle => write!(f, "IDLE"),
            Instr::ClearScreen => write!(f, "CLS"),
            Instr::Return => write!(f, "RET"),
            Instr::Jump { address } => write!(f, "JP 0x{address:03X}"),
            Instr::Call { address } => write!(f, "CALL 0x{address:03X}"),
            Instr::Skip_Eq_Byte { vx, nn } => write!(f, "SE V{vx:X}, 0x{nn:02X}"),
            Instr::Skip_NotEq_Byte { vx, nn } => write!(f, "SNE V{vx:X}, 0x{nn:02X}"),
            Instr::Skip_Eq { vx, vy } => write!(f, "SE V{vx:X}, V{vy:X}"),
            Instr::Load_Byte { vx, nn } => write!(f, "LD V{vx:X}, 0x{nn:02X}"),
            Instr::Add_Byte { vx, nn } => write!(f, "ADD V{vx:X}, 0x{nn:02X}"),
            // ------
            Instr::Load_Vx_Vy { vx, vy } => write!(f, "LD V{vx:X}, V{vy:X}"),
            Instr::Or_Vx_Vy { vx, vy } => write!(f, "OR V{vx:X}, V{vy:X}"),
            Instr::And_Vx_Vy { vx, vy } => write!(f, "AND V{vx:X}, V{vy:X}"),
            Instr::Xor_Vx_Vy { vx, vy } => write!(f, "XOR V{vx:X}, V{vy:X}"),
            Instr::Add_Vx_Vy { vx, vy } => write!(f, "ADD V{vx:X}, V{vy:X}"),
            Instr::Sub_Vx_Vy { vx, vy } => write!(f, "SUB V{vx:X}, V{vy:X}"),
            Instr::ShiftRight { vx } => write!(f, "SHR V{vx:X}"),
            Instr::SubReverse_Vx_Vy { vx, vy } => write!(f, "SUBN V{vx:X}, V{vy:X}"),
            Instr::ShiftLeft { vx } => write!(f, "SHL V{vx:X}"),
            // ------
            Instr::Skip_NotEq { vx, vy } => write!(f, "SNE V{vx:X}, V{vy:X}"),
            Instr::Load_Address { address } => write!(f, "LD I, 0x{address:03X}"),
            Instr::Jump_V0 { address } => write!(f, "JP V0, 0x{address:03X}"),
            Instr::Random { vx, nn } => write!(f, "RND V{vx:X}, 0x{nn:02X}"),
            Instr::Draw { vx, vy, n } => write!(f, "DRW V{vx:X}, V{vy:X}, {n}"),
            Instr::Skip_Key { vx } => write!(f, "SKP V{vx:X}"),
            Instr::Skip_NotKey { vx } => write!(f, "SKNP V{vx:X}"),
            // ------
            Instr::Load_Vx_Delay { vx } => write!(f, "LD V{vx:X}, DT"),
            Instr::Load_Vx_Key { vx } => write!(f, "LD V{vx:X}, K"),
            Instr::Load_Delay_Vx { vx } => write!(f, "LD DT, V{vx:X}"),
            Instr::Load_Sound_Vx { vx } => write!(f, "LD ST, V{vx:X}"),
            Instr::Add_Address_Vx { vx } => write!(f, "ADD I, V{vx:X}"),
            Instr::Load_Glyph { vx } => write!(f, "LD F, V{vx:X}"),
            Instr::Load_Bcd { vx } => write!(f, "LD B, V{vx:X}"),
            Instr::Store_Registers { vx } => write!(f, "LD [I], V{vx:X}"),
            Instr::Load_Registers { vx } => write!(f, "LD V{vx:X}, [I]"),
        }
    }
}
