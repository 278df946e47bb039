//! Disassembler.
use std::fmt::{self, Write as FmtWrite};

use crate::{bytecode::op_word, constants::MEM_START, instr::Instr};

pub struct Disassembler<'a> {
    bytecode: &'a [u8],
    cursor: usize,
}

impl<'a> Disassembler<'a> {
    pub fn new(bytecode: &'a [u8]) -> Self {
        Self {
            bytecode,
            cursor: 0,
        }
    }

    /// Disassemble the whole program into a string.
    pub fn disassemble_all(&mut self) -> Result<String, fmt::Error> {
        let mut s = String::new();
        self.cursor = 0;
        while self.cursor < self.bytecode.len() {
            self.disassemble(&mut s)?;
            self.cursor += 2;
        }
        self.cursor = 0;

        Ok(s)
    }

    /// Write a single instruction to the given writer.
    ///
    /// Words that don't decode are assumed to be data.
    pub fn disassemble<W: FmtWrite>(&self, w: &mut W) -> fmt::Result {
        let address = MEM_START + self.cursor;
        let Some(&hi) = self.bytecode.get(self.cursor) else {
            return Ok(());
        };
        // Programs with an odd length end with a lone data byte.
        let lo = self.bytecode.get(self.cursor + 1).copied().unwrap_or(0);
        let word = op_word(hi, lo);

        match Instr::decode(word) {
            Ok(instr) => writeln!(w, "{address:04X}: {word:04X}  {instr}"),
            Err(_) => writeln!(w, "{address:04X}: {word:04X}  DW 0x{word:04X}"),
        }
    }
}
