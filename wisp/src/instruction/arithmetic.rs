use super::*;

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, derive_more::Display)]
#[display("{_variant}")]
pub enum ArithmeticOp {
    #[display("ADD A, {_0}")]
    Add(SomeByte),
    #[display("ADD HL, {_0}")]
    Add16(WideReg),
    #[display("ADD SP, e8")]
    AddSP,
    #[display("ADC A, {_0}")]
    Adc(SomeByte),
    #[display("SUB A, {_0}")]
    Sub(SomeByte),
    #[display("SBC A, {_0}")]
    Sbc(SomeByte),
    #[display("AND A, {_0}")]
    And(SomeByte),
    #[display("XOR A, {_0}")]
    Xor(SomeByte),
    #[display("OR A, {_0}")]
    Or(SomeByte),
    #[display("CP A, {_0}")]
    Cp(SomeByte),
    #[display("INC {_0}")]
    Inc(RegOrPointer),
    #[display("INC {_0}")]
    Inc16(WideReg),
    #[display("DEC {_0}")]
    Dec(RegOrPointer),
    #[display("DEC {_0}")]
    Dec16(WideReg),
}

impl ArithmeticOp {
    pub(crate) fn execute<M: MemoryLike + ?Sized>(
        self,
        state: &mut GameboyState<'_, M>,
    ) -> Result<u8> {
        match self {
            ArithmeticOp::Add(byte) => {
                let byte = state.read_some_byte(byte)?;
                let cpu = &mut *state.cpu;
                cpu.a = Wrapping(add_with_carry(cpu.a.0, byte, false, &mut cpu.f));
            }
            ArithmeticOp::Adc(byte) => {
                let byte = state.read_some_byte(byte)?;
                let cpu = &mut *state.cpu;
                let carry = cpu.f.c;
                cpu.a = Wrapping(add_with_carry(cpu.a.0, byte, carry, &mut cpu.f));
            }
            ArithmeticOp::Sub(byte) => {
                let byte = state.read_some_byte(byte)?;
                let cpu = &mut *state.cpu;
                cpu.a = Wrapping(sub_with_carry(cpu.a.0, byte, false, &mut cpu.f));
            }
            ArithmeticOp::Sbc(byte) => {
                let byte = state.read_some_byte(byte)?;
                let cpu = &mut *state.cpu;
                let carry = cpu.f.c;
                cpu.a = Wrapping(sub_with_carry(cpu.a.0, byte, carry, &mut cpu.f));
            }
            ArithmeticOp::Cp(byte) => {
                let byte = state.read_some_byte(byte)?;
                let cpu = &mut *state.cpu;
                sub_with_carry(cpu.a.0, byte, false, &mut cpu.f);
            }
            ArithmeticOp::And(byte) => {
                let byte = state.read_some_byte(byte)?;
                let cpu = &mut *state.cpu;
                cpu.a &= Wrapping(byte);
                cpu.f.z = cpu.a.0 == 0;
                cpu.f.n = false;
                cpu.f.h = true;
                cpu.f.c = false;
            }
            ArithmeticOp::Xor(byte) => {
                let byte = state.read_some_byte(byte)?;
                let cpu = &mut *state.cpu;
                cpu.a ^= Wrapping(byte);
                cpu.f.z = cpu.a.0 == 0;
                cpu.f.n = false;
                cpu.f.h = false;
                cpu.f.c = false;
            }
            ArithmeticOp::Or(byte) => {
                let byte = state.read_some_byte(byte)?;
                let cpu = &mut *state.cpu;
                cpu.a |= Wrapping(byte);
                cpu.f.z = cpu.a.0 == 0;
                cpu.f.n = false;
                cpu.f.h = false;
                cpu.f.c = false;
            }
            ArithmeticOp::Inc(reg) => {
                let mut h = false;
                let val = state.update_operand(reg, |byte| {
                    h = byte & 0x0F == 0x0F;
                    byte.wrapping_add(1)
                })?;
                let f = &mut state.cpu.f;
                f.z = val == 0;
                f.n = false;
                f.h = h;
            }
            ArithmeticOp::Dec(reg) => {
                let mut h = false;
                let val = state.update_operand(reg, |byte| {
                    h = byte & 0x0F == 0;
                    byte.wrapping_sub(1)
                })?;
                let f = &mut state.cpu.f;
                f.z = val == 0;
                f.n = true;
                f.h = h;
            }
            ArithmeticOp::Add16(reg) => {
                let cpu = &mut *state.cpu;
                let value = cpu.read_wide_reg(reg);
                let hl = cpu.hl();
                cpu.f.h = (hl & 0x0FFF) + (value & 0x0FFF) > 0x0FFF;
                let (hl, carry) = hl.overflowing_add(value);
                cpu.write_hl(hl);
                cpu.f.n = false;
                cpu.f.c = carry;
            }
            ArithmeticOp::Inc16(reg) => state
                .cpu
                .update_wide_reg(reg, |value| *value = value.wrapping_add(1)),
            ArithmeticOp::Dec16(reg) => state
                .cpu
                .update_wide_reg(reg, |value| *value = value.wrapping_sub(1)),
            ArithmeticOp::AddSP => {
                let offset = state.fetch_byte()?;
                let cpu = &mut *state.cpu;
                cpu.sp = Wrapping(offset_sp(cpu.sp.0, offset, &mut cpu.f));
            }
        }
        Ok(self.length())
    }

    /// Returns the number of machine cycles this instruction takes.
    pub const fn length(&self) -> u8 {
        match self {
            ArithmeticOp::Add(SomeByte::Referenced(RegOrPointer::Reg(_)))
            | ArithmeticOp::Adc(SomeByte::Referenced(RegOrPointer::Reg(_)))
            | ArithmeticOp::Sub(SomeByte::Referenced(RegOrPointer::Reg(_)))
            | ArithmeticOp::Sbc(SomeByte::Referenced(RegOrPointer::Reg(_)))
            | ArithmeticOp::And(SomeByte::Referenced(RegOrPointer::Reg(_)))
            | ArithmeticOp::Xor(SomeByte::Referenced(RegOrPointer::Reg(_)))
            | ArithmeticOp::Or(SomeByte::Referenced(RegOrPointer::Reg(_)))
            | ArithmeticOp::Cp(SomeByte::Referenced(RegOrPointer::Reg(_))) => 1,
            ArithmeticOp::Add(_)
            | ArithmeticOp::Adc(_)
            | ArithmeticOp::Sub(_)
            | ArithmeticOp::Sbc(_)
            | ArithmeticOp::And(_)
            | ArithmeticOp::Xor(_)
            | ArithmeticOp::Or(_)
            | ArithmeticOp::Cp(_) => 2,
            ArithmeticOp::Inc(RegOrPointer::Pointer) => 3,
            ArithmeticOp::Inc(RegOrPointer::Reg(_)) => 1,
            ArithmeticOp::Dec(RegOrPointer::Pointer) => 3,
            ArithmeticOp::Dec(RegOrPointer::Reg(_)) => 1,
            ArithmeticOp::Add16(_) => 2,
            ArithmeticOp::Inc16(_) => 2,
            ArithmeticOp::Dec16(_) => 2,
            ArithmeticOp::AddSP => 4,
        }
    }

    /// Returns the size of the bytes to took to construct this instruction
    pub const fn size(&self) -> u8 {
        match self {
            ArithmeticOp::Add(SomeByte::Direct)
            | ArithmeticOp::Adc(SomeByte::Direct)
            | ArithmeticOp::Sub(SomeByte::Direct)
            | ArithmeticOp::Sbc(SomeByte::Direct)
            | ArithmeticOp::And(SomeByte::Direct)
            | ArithmeticOp::Xor(SomeByte::Direct)
            | ArithmeticOp::Or(SomeByte::Direct)
            | ArithmeticOp::Cp(SomeByte::Direct) => 2,
            ArithmeticOp::AddSP => 2,
            _ => 1,
        }
    }
}

/// Adds two bytes (and optionally the carry) and sets all four flags accordingly.
pub(crate) fn add_with_carry(val: u8, op: u8, carry: bool, flags: &mut Flags) -> u8 {
    let carry = carry as u8;
    let (sum, c1) = val.overflowing_add(op);
    let (sum, c2) = sum.overflowing_add(carry);
    flags.z = sum == 0;
    flags.n = false;
    flags.h = (val & 0x0F) + (op & 0x0F) + carry > 0x0F;
    flags.c = c1 | c2;
    sum
}

/// Subtracts `op` (and optionally the carry) from `val` and sets all four flags accordingly.
pub(crate) fn sub_with_carry(val: u8, op: u8, carry: bool, flags: &mut Flags) -> u8 {
    let carry = carry as u8;
    let (diff, c1) = val.overflowing_sub(op);
    let (diff, c2) = diff.overflowing_sub(carry);
    let (nibble, h1) = (val & 0x0F).overflowing_sub(op & 0x0F);
    let (_, h2) = nibble.overflowing_sub(carry);
    flags.z = diff == 0;
    flags.n = true;
    flags.h = h1 | h2;
    flags.c = c1 | c2;
    diff
}

/// Adds a signed offset to the stack pointer. The half-carry and carry flags are computed from an
/// unsigned addition of the low byte of SP and the raw offset byte. Used by both `ADD SP, e8` and
/// `LD HL, SP + e8`.
pub(crate) fn offset_sp(sp: u16, offset: u8, flags: &mut Flags) -> u16 {
    flags.z = false;
    flags.n = false;
    flags.h = (sp & 0x000F) + (offset as u16 & 0x000F) > 0x000F;
    flags.c = (sp & 0x00FF) + offset as u16 > 0x00FF;
    sp.wrapping_add_signed(offset as i8 as i16)
}
