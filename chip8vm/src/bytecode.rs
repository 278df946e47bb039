//! Helpers for extracting fields from opcodes.
//!
//! ```text
//! F000  op    primary format
//! 0F00  x     register Vx
//! 00F0  y     register Vy
//! 000F  n     nibble
//! 00FF  nn    byte
//! 0FFF  nnn   address
//! ```

/// Combine two bytes of memory into a big-endian opcode.
#[inline(always)]
pub fn op_word(hi: u8, lo: u8) -> u16 {
    ((hi as u16) << 8) | lo as u16
}

/// Extract the primary format nibble.
#[inline(always)]
pub fn op_code(opcode: u16) -> u8 {
    ((opcode & 0xF000) >> 12) as u8
}

/// Extract register index X.
#[inline(always)]
pub fn op_x(opcode: u16) -> u8 {
    ((opcode & 0x0F00) >> 8) as u8
}

/// Extract register index Y.
#[inline(always)]
pub fn op_y(opcode: u16) -> u8 {
    ((opcode & 0x00F0) >> 4) as u8
}

/// Extract the lowest nibble N.
#[inline(always)]
pub fn op_n(opcode: u16) -> u8 {
    (opcode & 0x000F) as u8
}

/// Extract the low byte NN.
#[inline(always)]
pub fn op_nn(opcode: u16) -> u8 {
    (opcode & 0x00FF) as u8
}

/// Extract the 12-bit address NNN.
#[inline(always)]
pub fn op_nnn(opcode: u16) -> u16 {
    opcode & 0x0FFF
}

/// Extract operands VX, VY and N.
#[inline(always)]
pub fn op_xyn(opcode: u16) -> (u8, u8, u8) {
    (op_x(opcode), op_y(opcode), op_n(opcode))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_fields() {
        let op = 0xABCD;
        assert_eq!(op_code(op), 0xA);
        assert_eq!(op_xyn(op), (0xB, 0xC, 0xD));
        assert_eq!(op_nn(op), 0xCD);
        assert_eq!(op_nnn(op), 0xBCD);
    }

    #[test]
    fn test_word_is_big_endian() {
        assert_eq!(op_word(0x6A, 0x05), 0x6A05);
    }
}
