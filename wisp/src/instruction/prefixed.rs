use super::*;

/// An operation reached through the 0xCB prefix.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, derive_more::Display)]
#[display("{_variant}")]
pub enum PrefixedInstruction {
    #[display("{_0}")]
    BitShift(BitShiftOp),
    #[display("{_0}")]
    Bit(BitOp),
}

impl PrefixedInstruction {
    pub(crate) fn execute<M: MemoryLike + ?Sized>(
        self,
        state: &mut GameboyState<'_, M>,
    ) -> Result<u8> {
        match self {
            PrefixedInstruction::BitShift(op) => op.execute(state),
            PrefixedInstruction::Bit(op) => op.execute(state),
        }
    }

    /// Returns the number of machine cycles this instruction takes, not counting the prefix.
    pub const fn length(&self) -> u8 {
        match self {
            PrefixedInstruction::BitShift(op) => op.length(),
            PrefixedInstruction::Bit(op) => op.length(),
        }
    }

    /// Returns the size of the bytes to took to construct this instruction, including the prefix.
    pub const fn size(&self) -> u8 {
        2
    }
}
