use super::*;

/// The BIT, RES, and SET operations. The bit index is baked into the op code.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, derive_more::Display)]
#[display("{op} {bit}, {reg}")]
pub struct BitOp {
    pub bit: u8,
    pub reg: RegOrPointer,
    pub op: BitOpInner,
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, derive_more::Display)]
#[display("{_variant}")]
pub enum BitOpInner {
    #[display("BIT")]
    Bit,
    #[display("RES")]
    Res,
    #[display("SET")]
    Set,
}

impl BitOp {
    pub(crate) fn execute<M: MemoryLike + ?Sized>(
        self,
        state: &mut GameboyState<'_, M>,
    ) -> Result<u8> {
        let BitOp { bit, reg, op } = self;
        debug_assert!(bit < 8);
        let mask = 0x1 << bit;
        match op {
            BitOpInner::Bit => {
                let byte = state.read_operand(reg)?;
                let f = &mut state.cpu.f;
                f.z = byte & mask == 0;
                f.n = false;
                f.h = true;
            }
            BitOpInner::Res => {
                state.update_operand(reg, |byte| byte & !mask)?;
            }
            BitOpInner::Set => {
                state.update_operand(reg, |byte| byte | mask)?;
            }
        }
        Ok(self.length())
    }

    /// Returns the number of machine cycles this instruction takes, not counting the prefix.
    pub const fn length(&self) -> u8 {
        match (self.op, self.reg) {
            (BitOpInner::Bit, RegOrPointer::Pointer) => 3,
            (_, RegOrPointer::Pointer) => 4,
            (_, RegOrPointer::Reg(_)) => 2,
        }
    }

    /// Returns the size of the bytes to took to construct this instruction
    pub const fn size(&self) -> u8 {
        2
    }
}
