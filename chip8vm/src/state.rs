//! Machine state.
use log::debug;

use crate::{
    constants::*,
    error::{Chip8Error, Chip8Result},
};

/// Core state for a chip8 machine.
///
/// Performs no validation of its own. Instructions are responsible
/// for keeping indices into memory, registers and the stack in range.
#[derive(Clone)]
pub struct MachineState {
    // ------------------------------------------------------------------------
    // Registers
    /// Program counter pointing to the next instruction to fetch.
    pub pc: Address,
    /// Stack pointer, the number of return addresses on the stack.
    pub sp: usize,
    /// General purpose registers for temporary values.
    ///
    /// Register 16 (VF) is used for either the carry flag, borrow switch or
    /// sprite collision depending on opcode.
    pub registers: [u8; REGISTER_COUNT],
    /// (I) Pointer register used for temporarily storing an address.
    pub address: Address,
    /// (DT) Delay timer that counts down to 0.
    pub delay_timer: u8,
    /// (ST) Sound timer that counts down to 0. When it has a non-zero value, a beep is played.
    pub sound_timer: u8,
    /// Last fetched instruction word.
    pub opcode: u16,

    // ------------------------------------------------------------------------
    // Memory
    /// Main memory storage space.
    pub ram: Box<[u8; MEM_SIZE]>,
    /// Stack of return pointers used for jumping when a routine call finishes.
    pub stack: [Address; STACK_SIZE],
    /// Screen buffer that is drawn to, row-major.
    pub display: Box<[bool; DISPLAY_BUFFER_SIZE]>,
}

impl Default for MachineState {
    fn default() -> Self {
        Self {
            pc: MEM_START as Address,
            sp: 0,
            registers: [0; REGISTER_COUNT],
            address: 0,
            delay_timer: 0,
            sound_timer: 0,
            opcode: 0,

            ram: Box::new([0; MEM_SIZE]),
            stack: [0; STACK_SIZE],
            display: Box::new([false; DISPLAY_BUFFER_SIZE]),
        }
    }
}

impl MachineState {
    pub fn new() -> Self {
        Default::default()
    }

    /// Build a fresh machine with the built-in font and the given program loaded.
    ///
    /// Fails without building anything if the program doesn't fit in memory.
    pub fn bootstrap(rom: &[u8]) -> Chip8Result<Self> {
        if !check_program_size(rom) {
            return Err(Chip8Error::LargeProgram { len: rom.len() });
        }

        let mut state = Self::new();
        state.load_fontset();
        state.ram[MEM_START..MEM_START + rom.len()].copy_from_slice(rom);
        debug!("loaded {} byte program", rom.len());

        Ok(state)
    }

    /// Write the built-in hexadecimal glyphs to the low end of memory.
    pub fn load_fontset(&mut self) {
        self.ram[FONTSET_START..FONTSET_START + FONTSET_DATA_LENGTH].copy_from_slice(&FONTSET);
    }

    pub fn clear_display(&mut self) {
        self.display.fill(false);
    }

    /// Count down the delay timer.
    #[inline]
    pub fn tick_delay(&mut self) {
        self.delay_timer = self.delay_timer.saturating_sub(1);
    }

    #[inline]
    pub fn tick_sound(&mut self) {
        self.sound_timer = self.sound_timer.saturating_sub(1);
    }

    /// Push a return address onto the call stack.
    pub fn push_return(&mut self, callee: Address) -> Chip8Result<()> {
        if self.sp >= STACK_SIZE {
            return Err(Chip8Error::StackOverflow { address: callee });
        }
        self.stack[self.sp] = self.pc;
        self.sp += 1;
        Ok(())
    }

    /// Pop the most recent return address off the call stack.
    pub fn pop_return(&mut self) -> Chip8Result<Address> {
        if self.sp == 0 {
            return Err(Chip8Error::StackUnderflow);
        }
        self.sp -= 1;
        Ok(self.stack[self.sp])
    }

    /// Borrow `len` bytes of memory starting at `start`.
    pub fn mem(&self, start: usize, len: usize) -> Chip8Result<&[u8]> {
        check_mem_range(start, len)?;
        Ok(&self.ram[start..start + len])
    }

    /// Mutably borrow `len` bytes of memory starting at `start`.
    pub fn mem_mut(&mut self, start: usize, len: usize) -> Chip8Result<&mut [u8]> {
        check_mem_range(start, len)?;
        Ok(&mut self.ram[start..start + len])
    }
}

#[inline]
fn check_program_size(rom: &[u8]) -> bool {
    rom.len() <= MAX_PROGRAM_SIZE
}

#[inline]
fn check_mem_range(start: usize, len: usize) -> Chip8Result<()> {
    if start + len > MEM_SIZE {
        // Report the first cell that falls outside memory.
        return Err(Chip8Error::MemoryOutOfBounds {
            address: start.max(MEM_SIZE),
        });
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_new_state_is_blank() {
        let state = MachineState::new();
        assert_eq!(state.pc, 0x200);
        assert_eq!(state.sp, 0);
        assert_eq!(state.address, 0);
        assert_eq!(state.opcode, 0);
        assert_eq!(state.delay_timer, 0);
        assert_eq!(state.sound_timer, 0);
        assert!(state.ram.iter().all(|b| *b == 0));
        assert!(state.registers.iter().all(|v| *v == 0));
        assert!(state.stack.iter().all(|a| *a == 0));
        assert!(state.display.iter().all(|px| !px));
    }

    #[test]
    fn test_bootstrap_loads_font_and_rom() {
        let state = MachineState::bootstrap(&[0x12, 0x34, 0x56]).unwrap();
        assert_eq!(&state.ram[0..5], &[0xF0, 0x90, 0x90, 0x90, 0xF0]);
        assert_eq!(&state.ram[75..80], &[0xF0, 0x80, 0xF0, 0x80, 0x80]);
        assert_eq!(&state.ram[0x200..0x203], &[0x12, 0x34, 0x56]);
        assert_eq!(state.ram[0x203], 0);
    }

    #[test]
    fn test_bootstrap_rejects_large_program() {
        let rom = vec![0xAA; MAX_PROGRAM_SIZE + 1];
        assert_eq!(
            MachineState::bootstrap(&rom).err(),
            Some(Chip8Error::LargeProgram { len: 3585 })
        );

        // Exactly filling memory is fine.
        let rom = vec![0xAA; MAX_PROGRAM_SIZE];
        let state = MachineState::bootstrap(&rom).unwrap();
        assert_eq!(state.ram[MEM_SIZE - 1], 0xAA);
    }

    #[test]
    fn test_call_stack_bounds() {
        let mut state = MachineState::new();
        assert_eq!(state.pop_return(), Err(Chip8Error::StackUnderflow));

        for _ in 0..STACK_SIZE {
            state.push_return(0x300).unwrap();
        }
        assert_eq!(state.sp, 16);
        assert_eq!(
            state.push_return(0x300),
            Err(Chip8Error::StackOverflow { address: 0x300 })
        );
        assert_eq!(state.sp, 16);
    }

    #[test]
    fn test_timers_floor_at_zero() {
        let mut state = MachineState::new();
        state.delay_timer = 1;
        state.tick_delay();
        state.tick_delay();
        state.tick_sound();
        assert_eq!(state.delay_timer, 0);
        assert_eq!(state.sound_timer, 0);
    }

    #[test]
    fn test_mem_range() {
        let state = MachineState::new();
        assert!(state.mem(0xFFD, 3).is_ok());
        assert_eq!(
            state.mem(0xFFE, 3).err(),
            Some(Chip8Error::MemoryOutOfBounds { address: 0x1000 })
        );
        assert_eq!(
            state.mem(0x1200, 1).err(),
            Some(Chip8Error::MemoryOutOfBounds { address: 0x1200 })
        );
    }
}
