mod bytecode;
mod clock;
pub mod constants;
mod devices;
mod disasm;
mod error;
mod exec;
mod instr;
mod random;
mod state;
mod vm;

pub use self::{
    devices::{Devices, InvalidKeyCode, KeyCode, Keypad},
    vm::{Hz, Mode},
};

/// Read-only view of the display buffer, one `bool` per pixel, row-major.
pub type Chip8DisplayBuffer<'a> = &'a [bool; constants::DISPLAY_BUFFER_SIZE];

pub const IMPL_VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod prelude {
    pub use super::{
        clock::Clock,
        devices::{Devices, KeyCode, Keypad},
        disasm::Disassembler,
        error::{Chip8Error, Chip8Result},
        exec::Flow,
        instr::Instr,
        random::{FixedSequence, RandomSource},
        state::MachineState,
        vm::{Chip8Conf, Chip8Vm, Hz, Mode},
    };
}
