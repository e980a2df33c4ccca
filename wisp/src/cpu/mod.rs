use std::hash::Hash;
use std::num::Wrapping;
use std::ops::Index;
use std::ops::IndexMut;

use serde::Deserialize;
use serde::Serialize;
use tracing::trace;

use crate::error::Result;
use crate::instruction::HalfRegister;
use crate::instruction::InterruptOp;
use crate::instruction::WideReg;
use crate::instruction::WideRegWithoutSP;
use crate::lookup::OP_LOOKUP;
use crate::mem::MemoryLike;
use crate::GameboyState;


#[derive(
    Debug, Default, Hash, Clone, PartialEq, Eq, derive_more::Display, Serialize, Deserialize,
)]
#[display(
    "CPU {{ A=0x{:0>2X} F={} B=0x{:0>2X} C=0x{:0>2X} D=0x{:0>2X} E=0x{:0>2X} H=0x{:0>2X} L=0x{:0>2X} SP=0x{:0>4X} PC=0x{:0>4X} IME={} State={} }}",
    a,
    f,
    b,
    c,
    d,
    e,
    h,
    l,
    sp,
    pc,
    ime,
    state
)]
pub struct Cpu {
    pub a: Wrapping<u8>,
    pub f: Flags,
    pub b: Wrapping<u8>,
    pub c: Wrapping<u8>,
    pub d: Wrapping<u8>,
    pub e: Wrapping<u8>,
    pub h: Wrapping<u8>,
    pub l: Wrapping<u8>,
    /// The SP register
    pub sp: Wrapping<u16>,
    /// The PC register
    pub pc: Wrapping<u16>,
    pub ime: bool,
    /// Once the gameboy has halted, this flag is set. Note that the gameboy can continue to be
    /// stepped, but the PC is not moved, so it will continue to cycle without change until an
    /// interrupt wakes it.
    pub state: CpuState,
}

#[derive(
    Debug, Default, Hash, Clone, Copy, PartialEq, Eq, derive_more::Display, Serialize, Deserialize,
)]
pub enum CpuState {
    #[default]
    Running,
    Halted,
    Stopped,
}

/// Every register (or register pair) that can be read as a 16-bit value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FullRegister {
    AF,
    BC,
    DE,
    HL,
    SP,
    PC,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Hash, derive_more::Display, Serialize, Deserialize,
)]
#[display(
    "Flags(Z={} N={} H={} C={})",
    *z as u8,
    *n as u8,
    *h as u8,
    *c as u8
)]
pub struct Flags {
    /// The zero flag
    pub z: bool,
    /// The substraction flag
    pub n: bool,
    /// The half-carry flag
    pub h: bool,
    /// The full carry flag
    pub c: bool,
}

impl From<u8> for Flags {
    fn from(value: u8) -> Self {
        Self {
            z: check_bit_const::<7>(value),
            n: check_bit_const::<6>(value),
            h: check_bit_const::<5>(value),
            c: check_bit_const::<4>(value),
        }
    }
}

impl Flags {
    pub fn set_from_byte(&mut self, val: u8) {
        *self = val.into();
    }

    pub fn set_for_byte_shift_op(&mut self, z: bool, c: bool) {
        self.z = z;
        self.n = false;
        self.h = false;
        self.c = c;
    }

    /// The flags as they are stored in the F register. The low nibble is always zero.
    pub fn as_byte(&self) -> u8 {
        bool_to_mask::<7>(self.z)
            | bool_to_mask::<6>(self.n)
            | bool_to_mask::<5>(self.h)
            | bool_to_mask::<4>(self.c)
    }
}

const fn bit_select<const B: u8>() -> u8 {
    const {
        match B {
            n @ 0..=7 => 0x1 << n,
            _ => panic!("You must select between the 0th and 7th bit!"),
        }
    }
}

const fn bool_to_mask<const B: u8>(val: bool) -> u8 {
    (val as u8) << B
}

pub const fn check_bit_const<const B: u8>(src: u8) -> bool {
    (src & bit_select::<B>()) == bit_select::<B>()
}

impl Cpu {
    /// Constructs a new CPU with each register set to the value it holds after the boot ROM
    /// hands off control to the cartridge.
    pub fn new() -> Self {
        let mut digest = Self::default();
        digest.reset();
        digest
    }

    /// Returns every register to its power-on value.
    pub fn reset(&mut self) {
        *self = Self {
            a: Wrapping(0x11),
            f: Flags::from(0xB0),
            b: Wrapping(0x00),
            c: Wrapping(0x13),
            d: Wrapping(0x00),
            e: Wrapping(0xD8),
            h: Wrapping(0x01),
            l: Wrapping(0x4D),
            sp: Wrapping(0xFFFE),
            pc: Wrapping(0x0100),
            ime: false,
            state: CpuState::Running,
        };
    }

    /// Executes a single instruction (or one idle tick if halted or stopped), then checks for
    /// interrupts. Returns the number of machine cycles that were consumed.
    pub fn step<M: MemoryLike + ?Sized>(&mut self, mem: &mut M) -> Result<u8> {
        match self.state {
            // The stop latch is only cleared by tearing down the session
            CpuState::Stopped => return Ok(1),
            CpuState::Halted => {
                let cycles = 1;
                return Ok(cycles + self.check_interrupts(mem)?);
            }
            CpuState::Running => {}
        }
        let mut state = GameboyState::new(&mut *self, &mut *mem);
        let addr = state.cpu.pc.0;
        let op = OP_LOOKUP[state.fetch_byte()? as usize];
        trace!("Executing op @ 0x{addr:0>4X}: {op}");
        let cycles = op.execute(&mut state)?;
        Ok(cycles + self.check_interrupts(mem)?)
    }

    /// Wakes the CPU if an enabled interrupt is pending and, if the IME is set, services the
    /// highest-priority one. Any other pending interrupts are left for the next check. Returns the
    /// number of machine cycles spent servicing the interrupt.
    pub fn check_interrupts<M: MemoryLike + ?Sized>(&mut self, mem: &mut M) -> Result<u8> {
        if self.is_stopped() {
            return Ok(0);
        }
        let pending = mem.pending_interrupts()?;
        if pending == 0 {
            return Ok(0);
        }
        if self.is_halted() {
            trace!("Waking from halt, pending interrupts 0x{pending:0>2X}");
            self.state = CpuState::Running;
        }
        if !self.ime {
            return Ok(0);
        }
        match InterruptOp::highest_priority(pending) {
            Some(op) => op.execute(&mut GameboyState::new(&mut *self, &mut *mem)),
            None => Ok(0),
        }
    }

    /// Get the top four bits of the F register
    pub fn flags(&self) -> &Flags {
        &self.f
    }

    pub fn flags_mut(&mut self) -> &mut Flags {
        &mut self.f
    }

    /// Returns the value of the Z flag
    pub fn zero_flag(&self) -> bool {
        self.f.z
    }

    /// Returns the value of the N flag
    pub fn subtraction_flag(&self) -> bool {
        self.f.n
    }

    /// Returns the value of the H flag
    pub fn half_carry_flag(&self) -> bool {
        self.f.h
    }

    /// Returns the value of the C flag
    pub fn carry_flag(&self) -> bool {
        self.f.c
    }

    pub fn set_zero_flag(&mut self, val: bool) {
        self.f.z = val;
    }

    pub fn set_subtraction_flag(&mut self, val: bool) {
        self.f.n = val;
    }

    pub fn set_half_carry_flag(&mut self, val: bool) {
        self.f.h = val;
    }

    pub fn set_carry_flag(&mut self, val: bool) {
        self.f.c = val;
    }

    /// The F register as a byte.
    pub fn f(&self) -> u8 {
        self.f.as_byte()
    }

    /// Sets the F register. The low nibble is dropped.
    pub fn set_f(&mut self, val: u8) {
        self.f.set_from_byte(val);
    }

    pub fn is_halted(&self) -> bool {
        self.state == CpuState::Halted
    }

    pub fn is_stopped(&self) -> bool {
        self.state == CpuState::Stopped
    }

    pub(crate) fn enable_interupts(&mut self) {
        self.ime = true;
    }

    pub(crate) fn disable_interupts(&mut self) {
        self.ime = false;
    }

    pub(crate) fn halt(&mut self) {
        self.state = CpuState::Halted;
    }

    pub(crate) fn stop(&mut self) {
        self.state = CpuState::Stopped;
    }

    pub fn read(&self, reg: FullRegister) -> u16 {
        match reg {
            FullRegister::AF => self.af(),
            FullRegister::BC => self.bc(),
            FullRegister::DE => self.de(),
            FullRegister::HL => self.hl(),
            FullRegister::SP => self.sp.0,
            FullRegister::PC => self.pc.0,
        }
    }

    pub fn write(&mut self, reg: FullRegister, val: u16) {
        match reg {
            FullRegister::AF => self.write_af(val),
            FullRegister::BC => self.write_bc(val),
            FullRegister::DE => self.write_de(val),
            FullRegister::HL => self.write_hl(val),
            FullRegister::SP => self.sp = Wrapping(val),
            FullRegister::PC => self.pc = Wrapping(val),
        }
    }

    pub(crate) fn read_wide_reg(&self, reg: WideReg) -> u16 {
        match reg {
            WideReg::BC => self.bc(),
            WideReg::DE => self.de(),
            WideReg::HL => self.hl(),
            WideReg::SP => self.sp.0,
        }
    }

    pub(crate) fn write_wide_reg(&mut self, reg: WideReg, val: u16) {
        match reg {
            WideReg::BC => self.write_bc(val),
            WideReg::DE => self.write_de(val),
            WideReg::HL => self.write_hl(val),
            WideReg::SP => self.sp = Wrapping(val),
        }
    }

    pub(crate) fn update_wide_reg<F>(&mut self, reg: WideReg, update: F)
    where
        F: FnOnce(&mut u16),
    {
        let mut value = self.read_wide_reg(reg);
        update(&mut value);
        self.write_wide_reg(reg, value);
    }

    pub(crate) fn read_stack_reg(&self, reg: WideRegWithoutSP) -> u16 {
        match reg {
            WideRegWithoutSP::BC => self.bc(),
            WideRegWithoutSP::DE => self.de(),
            WideRegWithoutSP::HL => self.hl(),
            WideRegWithoutSP::AF => self.af(),
        }
    }

    pub(crate) fn write_stack_reg(&mut self, reg: WideRegWithoutSP, val: u16) {
        match reg {
            WideRegWithoutSP::BC => self.write_bc(val),
            WideRegWithoutSP::DE => self.write_de(val),
            WideRegWithoutSP::HL => self.write_hl(val),
            WideRegWithoutSP::AF => self.write_af(val),
        }
    }

    pub fn af(&self) -> u16 {
        u16::from_be_bytes([self.a.0, self.f.as_byte()])
    }

    pub fn write_af(&mut self, val: u16) {
        let [a, f] = val.to_be_bytes();
        self.a = Wrapping(a);
        self.f.set_from_byte(f);
    }

    pub fn bc(&self) -> u16 {
        u16::from_be_bytes([self.b.0, self.c.0])
    }

    pub fn write_bc(&mut self, val: u16) {
        let [b, c] = val.to_be_bytes().map(Wrapping);
        self.b = b;
        self.c = c;
    }

    pub fn de(&self) -> u16 {
        u16::from_be_bytes([self.d.0, self.e.0])
    }

    pub fn write_de(&mut self, val: u16) {
        let [d, e] = val.to_be_bytes().map(Wrapping);
        self.d = d;
        self.e = e;
    }

    pub fn hl(&self) -> u16 {
        u16::from_be_bytes([self.h.0, self.l.0])
    }

    pub fn write_hl(&mut self, val: u16) {
        let [h, l] = val.to_be_bytes().map(Wrapping);
        self.h = h;
        self.l = l;
    }
}

impl Index<HalfRegister> for Cpu {
    type Output = Wrapping<u8>;

    fn index(&self, index: HalfRegister) -> &Self::Output {
        match index {
            HalfRegister::A => &self.a,
            HalfRegister::B => &self.b,
            HalfRegister::C => &self.c,
            HalfRegister::D => &self.d,
            HalfRegister::E => &self.e,
            HalfRegister::H => &self.h,
            HalfRegister::L => &self.l,
        }
    }
}

impl IndexMut<HalfRegister> for Cpu {
    fn index_mut(&mut self, index: HalfRegister) -> &mut Self::Output {
        match index {
            HalfRegister::A => &mut self.a,
            HalfRegister::B => &mut self.b,
            HalfRegister::C => &mut self.c,
            HalfRegister::D => &mut self.d,
            HalfRegister::E => &mut self.e,
            HalfRegister::H => &mut self.h,
            HalfRegister::L => &mut self.l,
        }
    }
}
