//! Instruction semantics.
use crate::{
    constants::*,
    devices::{Devices, KeyCode},
    error::Chip8Result,
    instr::Instr,
    random::RandomSource,
    state::MachineState,
};

/// Control flow signal returned to the host after each step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Ok,
    /// Program counter has jumped to a new address.
    ///
    /// This is useful for the caller to avoid being
    /// blocked on infinite or long running loops.
    ///
    /// This is returned when the interpreter encounters:
    ///
    /// - 1nnn (`JP addr`)
    /// - 2nnn (`CALL addr`)
    /// - 00EE (`RET`)
    /// - Bnnn (`JP V0, addr`)
    Jump,
    /// The display buffer was drawn to.
    Draw,
    /// The sound timer was loaded.
    Sound,
    /// Wait for a keypress.
    ///
    /// This is triggered by the opcode `Fx0A` (`LD Vx, K`), which stalls
    /// on the same instruction until a key is pressed.
    KeyWait,
    /// The machine is idle and did not execute anything.
    Idle,
}

impl Instr {
    /// Apply the instruction's effect to the machine.
    ///
    /// The program counter must already point at the next instruction.
    pub fn execute(
        &self,
        cpu: &mut MachineState,
        devices: &mut dyn Devices,
        rng: &mut dyn RandomSource,
    ) -> Chip8Result<Flow> {
        let mut control_flow = Flow::Ok;

        match *self {
            Instr::Idle => control_flow = Flow::Idle,
            Instr::ClearScreen => cpu.clear_display(),
            // Set the program counter to the value at the top of the stack.
            Instr::Return => {
                cpu.pc = cpu.pop_return()?;
                control_flow = Flow::Jump;
            }
            Instr::Jump { address } => {
                cpu.pc = address;
                control_flow = Flow::Jump;
            }
            // Push the address of the next instruction, then jump.
            Instr::Call { address } => {
                cpu.push_return(address)?;
                cpu.pc = address;
                control_flow = Flow::Jump;
            }
            Instr::Skip_Eq_Byte { vx, nn } => {
                let cond = reg(cpu, vx) == nn;
                skip_if(cpu, cond);
            }
            Instr::Skip_NotEq_Byte { vx, nn } => {
                let cond = reg(cpu, vx) != nn;
                skip_if(cpu, cond);
            }
            Instr::Skip_Eq { vx, vy } => {
                let cond = reg(cpu, vx) == reg(cpu, vy);
                skip_if(cpu, cond);
            }
            Instr::Load_Byte { vx, nn } => cpu.registers[vx as usize] = nn,
            Instr::Add_Byte { vx, nn } => {
                cpu.registers[vx as usize] = reg(cpu, vx).wrapping_add(nn);
            }
            // ----------------------------------------------------------------
            // Math
            Instr::Load_Vx_Vy { vx, vy } => cpu.registers[vx as usize] = reg(cpu, vy),
            Instr::Or_Vx_Vy { vx, vy } => {
                let y = reg(cpu, vy);
                cpu.registers[vx as usize] |= y;
            }
            Instr::And_Vx_Vy { vx, vy } => {
                let y = reg(cpu, vy);
                cpu.registers[vx as usize] &= y;
            }
            Instr::Xor_Vx_Vy { vx, vy } => {
                let y = reg(cpu, vy);
                cpu.registers[vx as usize] ^= y;
            }
            Instr::Add_Vx_Vy { vx, vy } => {
                let (result, carry) = reg(cpu, vx).overflowing_add(reg(cpu, vy));
                cpu.registers[vx as usize] = result;
                cpu.registers[FLAG_REGISTER] = carry as u8;
            }
            Instr::Sub_Vx_Vy { vx, vy } => {
                let (x, y) = (reg(cpu, vx), reg(cpu, vy));
                cpu.registers[vx as usize] = x.wrapping_sub(y);
                cpu.registers[FLAG_REGISTER] = (x >= y) as u8;
            }
            Instr::ShiftRight { vx } => {
                let x = reg(cpu, vx);
                cpu.registers[FLAG_REGISTER] = x & 1;
                cpu.registers[vx as usize] = x >> 1;
            }
            Instr::SubReverse_Vx_Vy { vx, vy } => {
                let (x, y) = (reg(cpu, vx), reg(cpu, vy));
                cpu.registers[vx as usize] = y.wrapping_sub(x);
                cpu.registers[FLAG_REGISTER] = (y >= x) as u8;
            }
            Instr::ShiftLeft { vx } => {
                let x = reg(cpu, vx);
                cpu.registers[FLAG_REGISTER] = (x >> 7) & 1;
                cpu.registers[vx as usize] = x << 1;
            }
            // ----------------------------------------------------------------
            Instr::Skip_NotEq { vx, vy } => {
                let cond = reg(cpu, vx) != reg(cpu, vy);
                skip_if(cpu, cond);
            }
            Instr::Load_Address { address } => cpu.address = address,
            Instr::Jump_V0 { address } => {
                cpu.pc = address.wrapping_add(reg(cpu, 0) as Address);
                control_flow = Flow::Jump;
            }
            Instr::Random { vx, nn } => {
                cpu.registers[vx as usize] = rng.random_byte() & nn;
            }
            Instr::Draw { vx, vy, n } => {
                draw(cpu, vx, vy, n)?;
                devices.request_redraw();
                control_flow = Flow::Draw;
            }
            // ----------------------------------------------------------------
            // Keyboard
            Instr::Skip_Key { vx } => {
                let pressed = is_pressed(&*devices, reg(cpu, vx));
                skip_if(cpu, pressed);
            }
            Instr::Skip_NotKey { vx } => {
                let pressed = is_pressed(&*devices, reg(cpu, vx));
                skip_if(cpu, !pressed);
            }
            // ----------------------------------------------------------------
            // Timers and memory
            Instr::Load_Vx_Delay { vx } => cpu.registers[vx as usize] = cpu.delay_timer,
            Instr::Load_Vx_Key { vx } => match devices.first_pressed() {
                Some(key) => cpu.registers[vx as usize] = key.as_u8(),
                None => {
                    // Rewind the program counter to stall the machine.
                    cpu.pc = cpu.pc.wrapping_sub(2);
                    control_flow = Flow::KeyWait;
                }
            },
            Instr::Load_Delay_Vx { vx } => cpu.delay_timer = reg(cpu, vx),
            Instr::Load_Sound_Vx { vx } => {
                cpu.sound_timer = reg(cpu, vx);
                control_flow = Flow::Sound;
            }
            Instr::Add_Address_Vx { vx } => {
                cpu.address = cpu.address.wrapping_add(reg(cpu, vx) as Address);
            }
            Instr::Load_Glyph { vx } => {
                let digit = (reg(cpu, vx) & 0xF) as usize;
                cpu.address = (FONTSET_START + digit * FONTSET_HEIGHT) as Address;
            }
            #[rustfmt::skip]
            Instr::Load_Bcd { vx } => {
                let x = reg(cpu, vx);
                let addr = cpu.address as usize;
                let digits = cpu.mem_mut(addr, 3)?;
                digits[0] = x / 100 % 10;
                digits[1] = x / 10  % 10;
                digits[2] = x       % 10;
            }
            Instr::Store_Registers { vx } => {
                let count = vx as usize + 1;
                let (addr, registers) = (cpu.address as usize, cpu.registers);
                cpu.mem_mut(addr, count)?
                    .copy_from_slice(&registers[..count]);
            }
            Instr::Load_Registers { vx } => {
                let count = vx as usize + 1;
                let mut values = [0; REGISTER_COUNT];
                values[..count].copy_from_slice(cpu.mem(cpu.address as usize, count)?);
                cpu.registers[..count].copy_from_slice(&values[..count]);
            }
        }

        Ok(control_flow)
    }
}

#[inline(always)]
fn reg(cpu: &MachineState, index: u8) -> u8 {
    cpu.registers[index as usize]
}

#[inline(always)]
fn skip_if(cpu: &mut MachineState, cond: bool) {
    if cond {
        cpu.pc = cpu.pc.wrapping_add(2);
    }
}

/// Keys outside the keypad range are never pressed.
#[inline]
fn is_pressed(devices: &dyn Devices, key_id: u8) -> bool {
    KeyCode::try_from(key_id)
        .map(|key| devices.is_pressed(key))
        .unwrap_or(false)
}

/// XOR a sprite onto the display buffer.
///
/// Sprite is encoded as 8 pixels wide, N rows high, stored in memory
/// pointed to by address register I. Pixels drawn past an edge of the
/// display wrap around to the other side.
///
/// If the drawing operation erases existing pixels in the display buffer,
/// register VF is set to 1, and set to 0 if no display bits are unset.
fn draw(cpu: &mut MachineState, vx: u8, vy: u8, n: u8) -> Chip8Result<()> {
    let x = reg(cpu, vx) as usize;
    let y = reg(cpu, vy) as usize;

    let mut sprite = [0u8; 0x10];
    sprite[..n as usize].copy_from_slice(cpu.mem(cpu.address as usize, n as usize)?);

    let mut is_erased = false;

    for (r, row) in sprite.iter().take(n as usize).enumerate() {
        // Each row is 8 bits representing the 8 pixels of the sprite.
        for c in 0..8 {
            let d = ((x + c) % DISPLAY_WIDTH) + ((y + r) % DISPLAY_HEIGHT) * DISPLAY_WIDTH;

            let old_px = cpu.display[d];
            let new_px = (row >> (7 - c) & 1) != 0;

            // XOR erases a pixel when both the old and new values are both 1.
            is_erased |= old_px && new_px;

            cpu.display[d] = old_px ^ new_px;
        }
    }

    cpu.registers[FLAG_REGISTER] = is_erased as u8;

    Ok(())
}
