use super::*;

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, derive_more::Display)]
#[display("{_variant}")]
pub enum BitShiftOp {
    #[display("RLC {_0}")]
    Rlc(RegOrPointer),
    #[display("RRC {_0}")]
    Rrc(RegOrPointer),
    #[display("RL {_0}")]
    Rl(RegOrPointer),
    #[display("RR {_0}")]
    Rr(RegOrPointer),
    #[display("SLA {_0}")]
    Sla(RegOrPointer),
    #[display("SRA {_0}")]
    Sra(RegOrPointer),
    #[display("SWAP {_0}")]
    Swap(RegOrPointer),
    #[display("SRL {_0}")]
    Srl(RegOrPointer),
}

impl BitShiftOp {
    pub(crate) fn execute<M: MemoryLike + ?Sized>(
        self,
        state: &mut GameboyState<'_, M>,
    ) -> Result<u8> {
        let carry_in = state.cpu.f.c;
        let mut carry = false;
        let byte = state.update_operand(self.reg(), |byte| {
            let (byte, c) = match self {
                BitShiftOp::Rlc(_) => rotate_left_circular(byte),
                BitShiftOp::Rrc(_) => rotate_right_circular(byte),
                BitShiftOp::Rl(_) => rotate_left_through(byte, carry_in),
                BitShiftOp::Rr(_) => rotate_right_through(byte, carry_in),
                BitShiftOp::Sla(_) => (byte << 1, byte & 0x80 != 0),
                BitShiftOp::Sra(_) => ((byte >> 1) | (byte & 0x80), byte & 0x01 != 0),
                BitShiftOp::Swap(_) => (byte.rotate_left(4), false),
                BitShiftOp::Srl(_) => (byte >> 1, byte & 0x01 != 0),
            };
            carry = c;
            byte
        })?;
        state.cpu.f.set_for_byte_shift_op(byte == 0, carry);
        Ok(self.length())
    }

    /// The register (or pointer) this operation shifts.
    pub const fn reg(&self) -> RegOrPointer {
        match self {
            BitShiftOp::Rlc(reg)
            | BitShiftOp::Rrc(reg)
            | BitShiftOp::Rl(reg)
            | BitShiftOp::Rr(reg)
            | BitShiftOp::Sla(reg)
            | BitShiftOp::Sra(reg)
            | BitShiftOp::Swap(reg)
            | BitShiftOp::Srl(reg) => *reg,
        }
    }

    /// Returns the number of machine cycles this instruction takes, not counting the prefix.
    pub const fn length(&self) -> u8 {
        match self.reg() {
            RegOrPointer::Pointer => 4,
            RegOrPointer::Reg(_) => 2,
        }
    }

    /// Returns the size of the bytes to took to construct this instruction
    pub const fn size(&self) -> u8 {
        2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::Cpu;

    fn shift(op: BitShiftOp, a: u8, carry: bool) -> (u8, Flags) {
        let mut cpu = Cpu::new();
        let mut mem = vec![0u8; 0x10000];
        cpu.a = Wrapping(a);
        cpu.f.c = carry;
        let mut state = GameboyState::new(&mut cpu, &mut mem);
        assert_eq!(op.execute(&mut state).unwrap(), 2);
        (cpu.a.0, cpu.f)
    }

    #[test]
    fn shift_flags() {
        let a = RegOrPointer::Reg(HalfRegister::A);
        let (byte, f) = shift(BitShiftOp::Sra(a), 0x81, false);
        assert_eq!(byte, 0xC0);
        assert!(f.c && !f.z && !f.n && !f.h);

        let (byte, f) = shift(BitShiftOp::Srl(a), 0x01, false);
        assert_eq!(byte, 0x00);
        assert!(f.c && f.z);

        let (byte, f) = shift(BitShiftOp::Swap(a), 0xF1, true);
        assert_eq!(byte, 0x1F);
        assert!(!f.c && !f.z);

        let (byte, f) = shift(BitShiftOp::Rl(a), 0x80, false);
        assert_eq!(byte, 0x00);
        assert!(f.c && f.z);

        let (byte, f) = shift(BitShiftOp::Rr(a), 0x00, true);
        assert_eq!(byte, 0x80);
        assert!(!f.c && !f.z);
    }
}
