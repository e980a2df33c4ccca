use std::num::Wrapping;

use derive_more::From;
use derive_more::IsVariant;
use serde::Deserialize;
use serde::Serialize;
use tracing::error;
use tracing::trace;

use crate::cpu::Cpu;
use crate::cpu::Flags;
use crate::error::Error;
use crate::error::Result;
use crate::lookup::PREFIXED_OP_LOOKUP;
use crate::mem::MemoryLike;
use crate::GameboyState;

mod arithmetic;
mod bit;
mod bit_shift;
mod control;
mod interrupt;
mod jump;
mod load;
mod prefixed;

pub use arithmetic::*;
pub use bit::*;
pub use bit_shift::*;
pub use control::*;
pub use interrupt::*;
pub use jump::*;
pub use load::*;
pub use prefixed::*;

/// A decoded, non-prefixed operation. Operations are constructed from their op code alone; any
/// immediate operands are fetched from the bus (via the PC) while the operation executes.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, derive_more::Display)]
#[display("{_variant}")]
pub enum Instruction {
    #[display("{_0}")]
    Load(LoadOp),
    #[display("{_0}")]
    ControlOp(ControlOp),
    #[display("{_0}")]
    Jump(JumpOp),
    #[display("{_0}")]
    Arithmetic(ArithmeticOp),
    #[display("DAA")]
    Daa,
    /// Set Carry.
    #[display("SCF")]
    Scf,
    /// ComPLement accumulator.
    #[display("CPL")]
    Cpl,
    /// CompLement carry flag.
    #[display("CCF")]
    Ccf,
    /// Disable interupts
    #[display("DI")]
    Di,
    /// Enable interupts
    #[display("EI")]
    Ei,
    /// The RLA, RLCA, RRA, RRCA are, in a sense, bit shift operations. However, they are the only
    /// shifting ops that are not prefixed, so they are classified as misc. Unlike their prefixed
    /// counterparts, they always clear the zero flag.
    #[display("RLA")]
    Rla,
    #[display("RLCA")]
    Rlca,
    #[display("RRA")]
    Rra,
    #[display("RRCA")]
    Rrca,
    /// Load the next byte as an op code for a prefixed instruction
    #[display("PREFIX CB")]
    Prefixed,
    /// Used for the handful of unused op codes
    #[display("UNUSED")]
    Unused,
}

impl Instruction {
    /// Executes the operation and returns the number of machine cycles that it took. By the time
    /// this is called, the op code has already been fetched and the PC points at the first byte
    /// after it.
    pub(crate) fn execute<M: MemoryLike + ?Sized>(
        self,
        state: &mut GameboyState<'_, M>,
    ) -> Result<u8> {
        let cpu = &mut *state.cpu;
        match self {
            Instruction::Load(op) => return op.execute(state),
            Instruction::ControlOp(op) => return op.execute(state),
            Instruction::Jump(op) => return op.execute(state),
            Instruction::Arithmetic(op) => return op.execute(state),
            Instruction::Daa => cpu.a = Wrapping(to_bcd(cpu.a.0, &mut cpu.f)),
            Instruction::Scf => {
                cpu.f.n = false;
                cpu.f.h = false;
                cpu.f.c = true;
            }
            Instruction::Cpl => {
                cpu.a = !cpu.a;
                cpu.f.n = true;
                cpu.f.h = true;
            }
            Instruction::Ccf => {
                cpu.f.n = false;
                cpu.f.h = false;
                cpu.f.c = !cpu.f.c;
            }
            Instruction::Di => cpu.disable_interupts(),
            Instruction::Ei => cpu.enable_interupts(),
            Instruction::Rlca => {
                let (byte, carry) = rotate_left_circular(cpu.a.0);
                cpu.a = Wrapping(byte);
                cpu.f.set_for_byte_shift_op(false, carry);
            }
            Instruction::Rla => {
                let (byte, carry) = rotate_left_through(cpu.a.0, cpu.f.c);
                cpu.a = Wrapping(byte);
                cpu.f.set_for_byte_shift_op(false, carry);
            }
            Instruction::Rrca => {
                let (byte, carry) = rotate_right_circular(cpu.a.0);
                cpu.a = Wrapping(byte);
                cpu.f.set_for_byte_shift_op(false, carry);
            }
            Instruction::Rra => {
                let (byte, carry) = rotate_right_through(cpu.a.0, cpu.f.c);
                cpu.a = Wrapping(byte);
                cpu.f.set_for_byte_shift_op(false, carry);
            }
            Instruction::Prefixed => {
                let addr = state.cpu.pc.0.wrapping_sub(1);
                let op = PREFIXED_OP_LOOKUP[state.fetch_byte()? as usize];
                trace!("Executing prefixed op @ 0x{addr:0>4X}: {op}");
                return Ok(self.length() + op.execute(state)?);
            }
            Instruction::Unused => {
                let address = state.cpu.pc.0.wrapping_sub(1);
                let opcode = state.mem.read_byte(address)?;
                error!("Attempted to execute unused op code 0x{opcode:0>2X} @ 0x{address:0>4X}");
                state.cpu.stop();
                return Err(Error::InvalidOpcode {
                    opcode,
                    prefixed: false,
                    address,
                });
            }
        }
        Ok(self.length())
    }

    /// Returns the number of machine cycles this instruction takes when any condition it has
    /// fails (or when it has none). For prefixed instructions, this is only the cost of reading
    /// the prefix.
    pub const fn length(&self) -> u8 {
        match self {
            Instruction::Load(op) => op.length(),
            Instruction::ControlOp(op) => op.length(),
            Instruction::Jump(op) => op.length(),
            Instruction::Arithmetic(op) => op.length(),
            Instruction::Daa
            | Instruction::Scf
            | Instruction::Cpl
            | Instruction::Ccf
            | Instruction::Di
            | Instruction::Ei
            | Instruction::Rla
            | Instruction::Rlca
            | Instruction::Rra
            | Instruction::Rrca => 1,
            Instruction::Prefixed => 1,
            Instruction::Unused => 0,
        }
    }

    /// Returns the size of the bytes to took to construct this instruction
    pub const fn size(&self) -> u8 {
        match self {
            Instruction::Load(op) => op.size(),
            Instruction::ControlOp(op) => op.size(),
            Instruction::Jump(op) => op.size(),
            Instruction::Arithmetic(op) => op.size(),
            Instruction::Daa
            | Instruction::Scf
            | Instruction::Cpl
            | Instruction::Ccf
            | Instruction::Di
            | Instruction::Ei
            | Instruction::Rla
            | Instruction::Rlca
            | Instruction::Rra
            | Instruction::Rrca => 1,
            Instruction::Prefixed => 2,
            Instruction::Unused => 1,
        }
    }
}

/// Either the byte held by some register (or pointed to by HL) or the byte immediately following
/// the op code.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, From, derive_more::Display)]
#[display("{_variant}")]
pub enum SomeByte {
    #[display("{_0}")]
    Referenced(RegOrPointer),
    #[display("n8")]
    #[from(ignore)]
    Direct,
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, derive_more::Display)]
#[display("{_variant}")]
pub enum WideReg {
    #[display("BC")]
    BC,
    #[display("DE")]
    DE,
    #[display("HL")]
    HL,
    #[display("SP")]
    SP,
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, derive_more::Display)]
#[display("{_variant}")]
pub enum WideRegWithoutSP {
    #[display("BC")]
    BC,
    #[display("DE")]
    DE,
    #[display("HL")]
    HL,
    #[display("AF")]
    AF,
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, derive_more::Display)]
#[display("{_variant}")]
pub enum Condition {
    #[display("Z")]
    Zero,
    #[display("NZ")]
    NotZero,
    #[display("C")]
    Carry,
    #[display("NC")]
    NotCarry,
}

impl Condition {
    pub fn passed(&self, cpu: &Cpu) -> bool {
        match self {
            Condition::Zero => cpu.zero_flag(),
            Condition::NotZero => !cpu.zero_flag(),
            Condition::Carry => cpu.carry_flag(),
            Condition::NotCarry => !cpu.carry_flag(),
        }
    }
}

/// There are special operations for loading into the A register, so it is easier to have a special
/// enum for the unique types of pointers they use.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, derive_more::Display)]
#[display("{_variant}")]
pub enum LoadAPointer {
    /// Use the BC register
    #[display("(BC)")]
    BC,
    /// Use the DE register
    #[display("(DE)")]
    DE,
    /// Use the HL register and increment after performing the operation
    #[display("(HL+)")]
    Hli,
    /// Use the HL register and decrement after performing the operation
    #[display("(HL-)")]
    Hld,
}

/// The 8-bit registers that can be named as an operand. The flags register is never an operand,
/// so it is accessed through `Cpu::f` and `Cpu::set_f` instead.
#[derive(
    Debug, Clone, Copy, Hash, PartialEq, Eq, derive_more::Display, Serialize, Deserialize,
)]
#[display("{_variant}")]
pub enum HalfRegister {
    #[display("A")]
    A,
    #[display("B")]
    B,
    #[display("C")]
    C,
    #[display("D")]
    D,
    #[display("E")]
    E,
    #[display("H")]
    H,
    #[display("L")]
    L,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, From, IsVariant, derive_more::Display)]
#[display("{_variant}")]
pub enum RegOrPointer {
    #[display("{_0}")]
    Reg(HalfRegister),
    #[display("(HL)")]
    Pointer,
}

/// A shorthand used while building the lookup tables.
pub(crate) enum InnerRegOrPointer {
    A,
    B,
    C,
    D,
    E,
    H,
    L,
    Pointer,
}

impl InnerRegOrPointer {
    pub(crate) const fn convert(self) -> RegOrPointer {
        match self {
            InnerRegOrPointer::A => RegOrPointer::Reg(HalfRegister::A),
            InnerRegOrPointer::B => RegOrPointer::Reg(HalfRegister::B),
            InnerRegOrPointer::C => RegOrPointer::Reg(HalfRegister::C),
            InnerRegOrPointer::D => RegOrPointer::Reg(HalfRegister::D),
            InnerRegOrPointer::E => RegOrPointer::Reg(HalfRegister::E),
            InnerRegOrPointer::H => RegOrPointer::Reg(HalfRegister::H),
            InnerRegOrPointer::L => RegOrPointer::Reg(HalfRegister::L),
            InnerRegOrPointer::Pointer => RegOrPointer::Pointer,
        }
    }
}

/// Adjusts the accumulator back into binary coded decimal after an addition or subtraction of
/// two BCD values.
pub(crate) fn to_bcd(mut val: u8, flags: &mut Flags) -> u8 {
    if !flags.n {
        // after an addition, adjust if (half-)carry occurred or if result is out of bounds
        if flags.c || val > 0x99 {
            val = val.wrapping_add(0x60);
            flags.c = true;
        }
        if flags.h || (val & 0x0f) > 0x09 {
            val = val.wrapping_add(0x6);
        }
    } else {
        if flags.c {
            val = val.wrapping_sub(0x60);
        }
        if flags.h {
            val = val.wrapping_sub(0x6);
        }
    }
    flags.z = val == 0;
    flags.h = false;
    val
}

/// Returns the rotated byte and the bit that was rotated out.
pub(crate) const fn rotate_left_circular(byte: u8) -> (u8, bool) {
    (byte.rotate_left(1), byte & 0x80 != 0)
}

pub(crate) const fn rotate_right_circular(byte: u8) -> (u8, bool) {
    (byte.rotate_right(1), byte & 0x01 != 0)
}

/// Rotates the byte left through the carry, returning the new byte and the new carry.
pub(crate) const fn rotate_left_through(byte: u8, carry: bool) -> (u8, bool) {
    ((byte << 1) | carry as u8, byte & 0x80 != 0)
}

pub(crate) const fn rotate_right_through(byte: u8, carry: bool) -> (u8, bool) {
    ((byte >> 1) | ((carry as u8) << 7), byte & 0x01 != 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bcd_after_addition() {
        let mut flags = Flags {
            z: false,
            n: false,
            h: false,
            c: true,
        };
        assert_eq!(to_bcd(0x01, &mut flags), 0x61);
        assert!(flags.c);
        assert!(!flags.z);

        let mut flags = Flags {
            z: false,
            n: false,
            h: true,
            c: false,
        };
        assert_eq!(to_bcd(0x01, &mut flags), 0x07);
        assert!(!flags.c);

        // 0x45 + 0x38 = 0x7D, which should be corrected to 0x83
        let mut flags = Flags::default();
        assert_eq!(to_bcd(0x7D, &mut flags), 0x83);
        assert!(!flags.c);

        // 0x99 + 0x01 = 0x9A, which should wrap around to 0x00
        let mut flags = Flags::default();
        assert_eq!(to_bcd(0x9A, &mut flags), 0x00);
        assert!(flags.c);
        assert!(flags.z);
    }

    #[test]
    fn bcd_after_subtraction() {
        // 0x42 - 0x09 = 0x39 with a half borrow, which should be corrected to 0x33
        let mut flags = Flags {
            z: false,
            n: true,
            h: true,
            c: false,
        };
        assert_eq!(to_bcd(0x39, &mut flags), 0x33);
        assert!(!flags.h);
        assert!(flags.n);
    }

    #[test]
    fn rotations() {
        assert_eq!(rotate_left_circular(0x85), (0x0B, true));
        assert_eq!(rotate_right_circular(0x01), (0x80, true));
        assert_eq!(rotate_left_through(0x80, false), (0x00, true));
        assert_eq!(rotate_left_through(0x00, true), (0x01, false));
        assert_eq!(rotate_right_through(0x01, false), (0x00, true));
        assert_eq!(rotate_right_through(0x00, true), (0x80, false));
    }
}
