use std::num::Wrapping;

use serde::Deserialize;
use serde::Serialize;
use tracing::info;

use crate::cpu::Cpu;
use crate::error::Result;
use crate::instruction::RegOrPointer;
use crate::instruction::SomeByte;
use crate::lookup::Disassembly;
use crate::lookup::disassemble;
use crate::mem::MemoryBankController;
use crate::mem::MemoryLike;
use crate::mem::MemoryLikeExt;
use crate::mem::MemoryMap;

/// The number of machine cycles it takes the screen to draw one frame at normal speed.
pub const CYCLES_PER_FRAME: u32 = 17_556;

/// This is the core emulation primative. It contains the entire state machine of the emulated
/// handheld and is agnostic to usecase and how it is rendered (if at all). Notably, the `Gameboy`
/// does not provide a `run` or analogous method. It must be ticked forward.
///
/// This allows managing tick rate, processing IO, and more to be done externally.
#[derive(Debug, Serialize, Deserialize)]
pub struct Gameboy {
    cpu: Cpu,
    mem: MemoryMap,
}

impl Gameboy {
    /// Constructs a powered-on console without a cartridge. Nothing can be executed until one is
    /// inserted.
    pub fn new() -> Self {
        Self {
            cpu: Cpu::new(),
            mem: MemoryMap::new(),
        }
    }

    /// Takes data that represents the data stored on a game cartridge and uses it to construct a
    /// console that is ready to run it.
    pub fn load_cartridge(cart: Vec<u8>) -> Result<Self> {
        let mut digest = Self::new();
        digest.insert_cartridge(cart)?;
        Ok(digest)
    }

    /// Swaps in a new cartridge and power cycles the console. If the image can't be used, the
    /// console is left untouched.
    pub fn insert_cartridge(&mut self, cart: Vec<u8>) -> Result<()> {
        let mbc = MemoryBankController::new(cart)?;
        info!("Inserted '{}'", mbc.header().title);
        self.mem.mount(mbc);
        self.reset();
        Ok(())
    }

    /// Power cycles the console. The CPU returns to its post-boot state, RAM is cleared, and the
    /// cartridge's bank registers return to their initial values. Attached peripherals are kept,
    /// but reset.
    pub fn reset(&mut self) {
        self.cpu.reset();
        self.mem.reset();
    }

    /// Executes one instruction (or an idle tick while halted or stopped), services at most one
    /// interrupt, and returns the number of machine cycles that passed. The caller is expected to
    /// advance the peripherals by that many cycles before stepping again.
    pub fn step(&mut self) -> Result<u8> {
        self.cpu.step(&mut self.mem)
    }

    pub fn tick_peripherals(&mut self, cycles: u32) {
        self.mem.step_peripherals(cycles)
    }

    /// Steps the CPU and peripherals until a frame's worth of cycles has passed. The frame length
    /// does not depend on the CPU speed; pacing double-speed mode is left to the host. Returns the
    /// number of cycles run.
    pub fn run_frame(&mut self) -> Result<u32> {
        let mut elapsed = 0;
        while elapsed < CYCLES_PER_FRAME {
            let cycles = self.step()? as u32;
            self.tick_peripherals(cycles);
            elapsed += cycles;
        }
        Ok(elapsed)
    }

    /// Decodes the instruction the CPU is about to execute without changing any state.
    pub fn next_op(&self) -> Result<Disassembly> {
        disassemble(&self.mem, self.cpu.pc.0)
    }

    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Cpu {
        &mut self.cpu
    }

    pub fn mem(&self) -> &MemoryMap {
        &self.mem
    }

    pub fn mem_mut(&mut self) -> &mut MemoryMap {
        &mut self.mem
    }

    pub fn double_speed(&self) -> bool {
        self.mem.is_double_speed()
    }

    pub fn is_stopped(&self) -> bool {
        self.cpu.is_stopped()
    }

    pub fn is_halted(&self) -> bool {
        self.cpu.is_halted()
    }
}

impl Default for Gameboy {
    fn default() -> Self {
        Self::new()
    }
}

/// The CPU and the bus it is driving, borrowed together for the length of one instruction.
pub(crate) struct GameboyState<'a, M: ?Sized = MemoryMap> {
    pub cpu: &'a mut Cpu,
    pub mem: &'a mut M,
}

impl<'a, M: MemoryLike + ?Sized> GameboyState<'a, M> {
    pub fn new(cpu: &'a mut Cpu, mem: &'a mut M) -> Self {
        Self { cpu, mem }
    }

    /// Reads the byte at PC and advances PC past it.
    pub fn fetch_byte(&mut self) -> Result<u8> {
        let byte = self.mem.read_byte(self.cpu.pc.0)?;
        self.cpu.pc += Wrapping(1);
        Ok(byte)
    }

    /// Reads the little-endian word at PC and advances PC past it.
    pub fn fetch_word(&mut self) -> Result<u16> {
        let lo = self.fetch_byte()?;
        let hi = self.fetch_byte()?;
        Ok(u16::from_le_bytes([lo, hi]))
    }

    pub fn read_operand(&self, reg: RegOrPointer) -> Result<u8> {
        match reg {
            RegOrPointer::Reg(reg) => Ok(self.cpu[reg].0),
            RegOrPointer::Pointer => self.mem.read_byte(self.cpu.hl()),
        }
    }

    pub fn write_operand(&mut self, reg: RegOrPointer, value: u8) -> Result<()> {
        match reg {
            RegOrPointer::Reg(reg) => {
                self.cpu[reg] = Wrapping(value);
                Ok(())
            }
            RegOrPointer::Pointer => self.mem.write_byte(self.cpu.hl(), value),
        }
    }

    /// Applies `update` to a register or the byte HL points to. Returns the new value.
    pub fn update_operand(&mut self, reg: RegOrPointer, update: impl FnOnce(u8) -> u8) -> Result<u8> {
        match reg {
            RegOrPointer::Reg(reg) => {
                let byte = update(self.cpu[reg].0);
                self.cpu[reg] = Wrapping(byte);
                Ok(byte)
            }
            RegOrPointer::Pointer => self.mem.update_byte(self.cpu.hl(), update),
        }
    }

    /// Reads an operand that is either a register, the byte HL points to, or an immediate.
    pub fn read_some_byte(&mut self, byte: SomeByte) -> Result<u8> {
        match byte {
            SomeByte::Referenced(reg) => self.read_operand(reg),
            SomeByte::Direct => self.fetch_byte(),
        }
    }

    /// Pushes a word onto the stack, high byte first.
    pub fn push(&mut self, word: u16) -> Result<()> {
        let [lo, hi] = word.to_le_bytes();
        self.cpu.sp -= Wrapping(1);
        self.mem.write_byte(self.cpu.sp.0, hi)?;
        self.cpu.sp -= Wrapping(1);
        self.mem.write_byte(self.cpu.sp.0, lo)
    }

    pub fn pop(&mut self) -> Result<u16> {
        let lo = self.mem.read_byte(self.cpu.sp.0)?;
        self.cpu.sp += Wrapping(1);
        let hi = self.mem.read_byte(self.cpu.sp.0)?;
        self.cpu.sp += Wrapping(1);
        Ok(u16::from_le_bytes([lo, hi]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::mem::mbc::tests::cart;

    #[test]
    fn empty_console() {
        let mut gb = Gameboy::new();
        assert_eq!(gb.step(), Err(Error::UninitializedBus));
        assert!(!gb.is_stopped());
    }

    #[test]
    fn bad_cartridge_leaves_console_untouched() {
        let mut gb = Gameboy::load_cartridge(cart(0x00, 0x00, 0x00)).unwrap();
        assert!(gb.insert_cartridge(cart(0xFC, 0x00, 0x00)).is_err());
        assert!(gb.mem().cartridge().is_some());
    }

    #[test]
    fn frame_length() {
        // NOP; JP 0x0100
        let mut rom = cart(0x00, 0x00, 0x00);
        rom[0x100..0x104].copy_from_slice(&[0x00, 0xC3, 0x00, 0x01]);
        let mut gb = Gameboy::load_cartridge(rom).unwrap();
        // Each loop takes five cycles, so the frame ends right after a NOP
        assert_eq!(gb.run_frame(), Ok(CYCLES_PER_FRAME));
        assert_eq!(gb.cpu().pc.0, 0x0101);
    }

    #[test]
    fn stack_is_little_endian() {
        let mut cpu = Cpu::new();
        let mut mem = vec![0u8; 0x10000];
        let mut state = GameboyState::new(&mut cpu, &mut mem);
        state.push(0xBEEF).unwrap();
        assert_eq!(state.cpu.sp.0, 0xFFFC);
        assert_eq!(state.mem[0xFFFC], 0xEF);
        assert_eq!(state.mem[0xFFFD], 0xBE);
        assert_eq!(state.pop(), Ok(0xBEEF));
        assert_eq!(state.cpu.sp.0, 0xFFFE);
    }
}
