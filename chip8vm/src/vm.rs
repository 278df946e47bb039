//! Virtual machine.
use std::{
    fmt::{self, Write},
    time::Duration,
};

use log::{debug, trace};
use rand::{rngs::StdRng, SeedableRng};

use crate::{
    bytecode::op_word,
    constants::*,
    devices::Devices,
    error::Chip8Result,
    exec::Flow,
    instr::Instr,
    random::RandomSource,
    state::MachineState,
    Chip8DisplayBuffer,
};

/// Drives the fetch, decode and execute cycle of a single machine.
///
/// The VM never schedules itself. The host calls [`Chip8Vm::step`] at its
/// own instruction rate, and [`Chip8Vm::tick_timers`] at the timer rate.
pub struct Chip8Vm {
    state: MachineState,
    mode: Mode,
    rng: Box<dyn RandomSource>,
    conf: Chip8Conf,
}

impl Chip8Vm {
    /// Create a VM with the built-in font loaded and an empty program.
    pub fn new(conf: Chip8Conf) -> Self {
        let rng = match conf.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_random(conf, rng)
    }

    /// Create a VM that draws `RND` bytes from the given source.
    pub fn with_random(conf: Chip8Conf, rng: impl RandomSource + 'static) -> Self {
        let mut state = MachineState::new();
        state.load_fontset();

        Chip8Vm {
            state,
            mode: Mode::Running,
            rng: Box::new(rng),
            conf,
        }
    }

    /// Configuration that was used to instantiate the VM.
    pub fn config(&self) -> &Chip8Conf {
        &self.conf
    }

    /// Replace the machine with a freshly bootstrapped one running `rom`.
    ///
    /// On error the current machine is left untouched.
    pub fn load_rom(&mut self, rom: &[u8]) -> Chip8Result<()> {
        self.state = MachineState::bootstrap(rom)?;
        self.mode = Mode::Running;
        Ok(())
    }

    pub fn state(&self) -> &MachineState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut MachineState {
        &mut self.state
    }

    pub fn display_buffer(&self) -> Chip8DisplayBuffer {
        &self.state.display
    }
}

/// Execution mode of the VM.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Running,
    /// Instructions are not fetched or executed, but timers still count down.
    Idle,
}

/// VM Configuration Parameters.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Chip8Conf {
    /// Instruction cycles per second, for hosts that throttle.
    /// `None` runs as fast as possible.
    pub clock_frequency: Option<Hz>,
    /// Rate at which the delay and sound timers count down.
    pub timer_frequency: Hz,
    /// Seed for the random number generator. `None` seeds from the OS.
    pub seed: Option<u64>,
    /// Stop a headless run after this many cycles.
    pub max_cycles: Option<u64>,
}

impl Default for Chip8Conf {
    fn default() -> Self {
        Self {
            clock_frequency: None,
            timer_frequency: Hz(DELAY_FREQUENCY),
            seed: None,
            max_cycles: None,
        }
    }
}

/// Frequency, in hertz (per second)
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Hz(pub u64);

impl From<Hz> for Duration {
    fn from(freq: Hz) -> Self {
        if freq.0 == 0 {
            Duration::from_nanos(0)
        } else {
            Duration::from_nanos(NANOS_IN_SECOND / freq.0)
        }
    }
}

/// Interpreter
impl Chip8Vm {
    pub fn mode(&self) -> Mode {
        self.mode
    }

    #[inline]
    pub fn is_idle(&self) -> bool {
        self.mode == Mode::Idle
    }

    /// Suspend instruction execution. Timers keep running.
    pub fn idle(&mut self) {
        debug!("idle at {:04X}", self.state.pc);
        self.mode = Mode::Idle;
    }

    /// Continue instruction execution after [`Chip8Vm::idle`].
    pub fn resume(&mut self) {
        debug!("resume at {:04X}", self.state.pc);
        self.mode = Mode::Running;
    }

    /// Read the instruction word at the program counter into the opcode register.
    pub fn fetch(&mut self) -> Chip8Result<()> {
        if self.is_idle() {
            return Ok(());
        }

        // Each instruction is two bytes, big-endian.
        let instr = self.state.mem(self.state.pc as usize, 2)?;
        self.state.opcode = op_word(instr[0], instr[1]);

        Ok(())
    }

    /// Decode the fetched opcode.
    ///
    /// The program counter is advanced past the instruction before
    /// dispatch, even if the opcode turns out to be invalid.
    pub fn decode(&mut self) -> Chip8Result<Instr> {
        if self.is_idle() {
            return Ok(Instr::Idle);
        }

        self.state.pc = self.state.pc.wrapping_add(2);

        Instr::decode(self.state.opcode)
    }

    pub fn execute(&mut self, instr: Instr, devices: &mut dyn Devices) -> Chip8Result<Flow> {
        let flow = instr.execute(&mut self.state, devices, self.rng.as_mut())?;
        if flow == Flow::KeyWait {
            debug!("waiting for key at {:04X}", self.state.pc);
        }
        Ok(flow)
    }

    /// Run a single fetch, decode and execute cycle.
    pub fn step(&mut self, devices: &mut dyn Devices) -> Chip8Result<Flow> {
        self.fetch()?;
        let pc = self.state.pc;
        let instr = self.decode()?;
        if instr != Instr::Idle {
            trace!("{pc:04X}: {:04X} {instr}", self.state.opcode);
        }
        self.execute(instr, devices)
    }

    /// Run up to `step_count` cycles, returning the last control flow.
    pub fn run_steps(&mut self, step_count: usize, devices: &mut dyn Devices) -> Chip8Result<Flow> {
        let mut flow = Flow::Ok;

        for _ in 0..step_count {
            flow = self.step(devices)?;
        }

        Ok(flow)
    }

    /// Count down the delay and sound timers by one tick.
    ///
    /// Runs regardless of whether the machine is idle.
    pub fn tick_timers(&mut self) {
        self.state.tick_delay();
        self.state.tick_sound();
    }

    /// Buzzer should be on while the sound timer counts down.
    pub fn sound_active(&self) -> bool {
        self.state.sound_timer > 0
    }
}

/// Troubleshooting
impl Chip8Vm {
    /// Returns the contents of the program memory as a human readable string.
    pub fn dump_ram(&self, count: usize) -> Result<String, fmt::Error> {
        let iter = self
            .state
            .ram
            .iter()
            .enumerate()
            .skip(MEM_START)
            .take(count)
            .step_by(2);
        let mut buf = String::new();

        for (i, op) in iter {
            let lo = self.state.ram.get(i + 1).copied().unwrap_or_default();
            writeln!(buf, "{:04X}: {:02X}{:02X}", i, op, lo)?;
        }

        Ok(buf)
    }

    pub fn dump_display(&self) -> Result<String, fmt::Error> {
        let mut buf = String::new();

        for y in 0..DISPLAY_HEIGHT {
            for x in 0..DISPLAY_WIDTH {
                if self.state.display[x + y * DISPLAY_WIDTH] {
                    write!(buf, "#")?;
                } else {
                    write!(buf, ".")?;
                }
            }
            writeln!(buf)?;
        }

        Ok(buf)
    }

    pub fn dump_registers(&self) -> Result<String, fmt::Error> {
        let state = &self.state;
        let mut buf = String::new();

        for (i, v) in state.registers.iter().enumerate() {
            write!(buf, "V{i:X}={v:02X} ")?;
        }
        writeln!(buf)?;
        writeln!(
            buf,
            "PC={:04X} I={:04X} SP={} DT={} ST={}",
            state.pc, state.address, state.sp, state.delay_timer, state.sound_timer
        )?;

        Ok(buf)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{devices::Keypad, error::Chip8Error, random::FixedSequence};

    fn vm_with(rom: &[u8]) -> Chip8Vm {
        let mut vm = Chip8Vm::with_random(Chip8Conf::default(), FixedSequence::new([0xAB]));
        vm.load_rom(rom).unwrap();
        vm
    }

    #[test]
    fn test_clock_hz() {
        let interval: Duration = Hz(60).into();
        assert_eq!(interval.as_millis(), 16);
        let interval: Duration = Hz(0).into();
        assert_eq!(interval, Duration::ZERO);
    }

    #[test]
    fn test_fetch_is_big_endian() {
        let mut vm = vm_with(&[0xAA, 0xBB]);
        vm.fetch().unwrap();
        assert_eq!(vm.state().opcode, 0xAABB);
        assert_eq!(vm.state().pc, 0x200, "fetch must not advance pc");
    }

    #[test]
    fn test_decode_advances_pc_once() {
        let mut vm = vm_with(&[0x12, 0x00]);
        vm.fetch().unwrap();
        assert_eq!(vm.decode(), Ok(Instr::Jump { address: 0x200 }));
        assert_eq!(vm.state().pc, 0x202);
    }

    #[test]
    fn test_invalid_opcode_surfaces() {
        let mut vm = vm_with(&[0x01, 0x23]);
        let mut keys = Keypad::new();
        assert_eq!(vm.step(&mut keys), Err(Chip8Error::InvalidOpcode(0x0123)));
    }

    #[test]
    fn test_fetch_past_end_of_memory() {
        let mut vm = vm_with(&[]);
        vm.state_mut().pc = 0xFFF;
        assert_eq!(
            vm.fetch(),
            Err(Chip8Error::MemoryOutOfBounds { address: 0x1000 })
        );
    }

    /// Fx0A (LD Vx, K)
    ///
    /// The VM must stall while waiting, and signal the state to the outer executer.
    #[test]
    #[rustfmt::skip]
    fn test_key_wait() {
        let mut vm = vm_with(&[
            0xF1, 0x0A, // LD v1, K
            0x62, 0x42  // LD v2, 0x42  ; sentinal
        ]);
        let mut keys = Keypad::new();

        // machine must stall
        for _ in 0..6 {
            assert_eq!(vm.step(&mut keys), Ok(Flow::KeyWait));
            assert_eq!(vm.state().pc, MEM_START as Address);
        }

        keys.set_key(crate::KeyCode::Key5, true);

        // machine will now advance
        vm.step(&mut keys).unwrap();
        assert_eq!(vm.state().pc, MEM_START as Address + 2);
        assert_eq!(vm.state().registers[1], 0x05);

        vm.step(&mut keys).unwrap();
        assert_eq!(vm.state().pc, MEM_START as Address + 4);
        assert_eq!(vm.state().registers[2], 0x42); // sentinal
    }

    #[test]
    #[rustfmt::skip]
    fn test_idle_freezes_everything_but_timers() {
        let mut vm = vm_with(&[
            0x6A, 0x05, // LD VA, 5
            0x7A, 0x03, // ADD VA, 3
        ]);
        let mut keys = Keypad::new();
        vm.state_mut().delay_timer = 10;
        vm.state_mut().sound_timer = 3;

        vm.step(&mut keys).unwrap();
        vm.idle();
        assert!(vm.is_idle());

        let before = vm.state().clone();
        for _ in 0..4 {
            assert_eq!(vm.step(&mut keys), Ok(Flow::Idle));
            vm.tick_timers();
        }
        let after = vm.state();
        assert_eq!(after.pc, before.pc);
        assert_eq!(after.opcode, before.opcode);
        assert_eq!(after.registers, before.registers);
        assert_eq!(after.ram, before.ram);
        assert_eq!(after.display, before.display);
        assert_eq!(after.stack, before.stack);
        assert_eq!(after.delay_timer, 6);
        assert_eq!(after.sound_timer, 0);
        assert!(!vm.sound_active());

        vm.resume();
        vm.step(&mut keys).unwrap();
        assert_eq!(vm.state().registers[0xA], 8);
    }

    #[test]
    fn test_load_rom_resets_machine() {
        let mut vm = vm_with(&[0x6A, 0x05]);
        let mut keys = Keypad::new();
        vm.step(&mut keys).unwrap();
        vm.idle();

        vm.load_rom(&[0x00, 0xE0]).unwrap();
        assert_eq!(vm.mode(), Mode::Running);
        assert_eq!(vm.state().pc, 0x200);
        assert_eq!(vm.state().registers[0xA], 0);
        assert_eq!(&vm.state().ram[0x200..0x202], &[0x00, 0xE0]);
    }

    #[test]
    fn test_load_large_rom_leaves_machine_untouched() {
        let mut vm = vm_with(&[0x6A, 0x05]);
        let rom = vec![0x11; MAX_PROGRAM_SIZE + 1];
        assert_eq!(
            vm.load_rom(&rom),
            Err(Chip8Error::LargeProgram { len: rom.len() })
        );
        assert_eq!(&vm.state().ram[0x200..0x203], &[0x6A, 0x05, 0x00]);
    }

    #[test]
    fn test_random_source_is_injected() {
        let mut vm = vm_with(&[0xC3, 0xFF]);
        vm.run_steps(1, &mut Keypad::new()).unwrap();
        assert_eq!(vm.state().registers[3], 0xAB);
    }

    #[test]
    fn test_dump_registers() {
        let vm = vm_with(&[]);
        let dump = vm.dump_registers().unwrap();
        assert!(dump.starts_with("V0=00 V1=00"));
        assert!(dump.contains("PC=0200 I=0000 SP=0 DT=0 ST=0"));
    }
}
