use super::*;

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, derive_more::Display)]
#[display("{_variant}")]
pub enum JumpOp {
    /// Op Codes: 0x20, 0x30, 0x28, 0x38
    #[display("JR {_0}, e8")]
    ConditionalRelative(Condition),
    /// Op Code: 0x18
    #[display("JR e8")]
    Relative,
    /// Op Codes: 0xC2, 0xD2, 0xCA, 0xDA
    #[display("JP {_0}, a16")]
    ConditionalAbsolute(Condition),
    /// Op Code: 0xC3
    #[display("JP a16")]
    Absolute,
    /// Op Code: 0xE9
    #[display("JP HL")]
    JumpToHL,
    /// Op Code: 0xCD
    #[display("CALL a16")]
    Call,
    /// Op Codes: 0xC4, 0xD4, 0xCC, 0xDC
    #[display("CALL {_0}, a16")]
    ConditionalCall(Condition),
    /// Op Code: 0xC9
    #[display("RET")]
    Return,
    /// Op Codes: 0xC0, 0xD0, 0xC8, 0xD8
    #[display("RET {_0}")]
    ConditionalReturn(Condition),
    /// Op Code: 0xD9
    /// Return from the subroutine and enable intrupts
    #[display("RETI")]
    ReturnAndEnable,
    /// Op Code: 0xC7
    #[display("RST 0x00")]
    RST00,
    /// Op Code: 0xCF
    #[display("RST 0x08")]
    RST08,
    /// Op Code: 0xD7
    #[display("RST 0x10")]
    RST10,
    /// Op Code: 0xDF
    #[display("RST 0x18")]
    RST18,
    /// Op Code: 0xE7
    #[display("RST 0x20")]
    RST20,
    /// Op Code: 0xEF
    #[display("RST 0x28")]
    RST28,
    /// Op Code: 0xF7
    #[display("RST 0x30")]
    RST30,
    /// Op Code: 0xFF
    #[display("RST 0x38")]
    RST38,
}

impl JumpOp {
    /// Executes the jump, returning the cycles it took. Conditional jumps whose condition fails
    /// still consume their operands.
    pub(crate) fn execute<M: MemoryLike + ?Sized>(
        self,
        state: &mut GameboyState<'_, M>,
    ) -> Result<u8> {
        match self {
            JumpOp::ConditionalRelative(cond) => {
                let offset = state.fetch_byte()? as i8;
                if cond.passed(state.cpu) {
                    jump_relative(state.cpu, offset);
                    return Ok(self.taken_length());
                }
            }
            JumpOp::Relative => {
                let offset = state.fetch_byte()? as i8;
                jump_relative(state.cpu, offset);
            }
            JumpOp::ConditionalAbsolute(cond) => {
                let addr = state.fetch_word()?;
                if cond.passed(state.cpu) {
                    state.cpu.pc = Wrapping(addr);
                    return Ok(self.taken_length());
                }
            }
            JumpOp::Absolute => state.cpu.pc = Wrapping(state.fetch_word()?),
            JumpOp::JumpToHL => state.cpu.pc = Wrapping(state.cpu.hl()),
            JumpOp::Call => {
                let addr = state.fetch_word()?;
                call(state, addr)?;
            }
            JumpOp::ConditionalCall(cond) => {
                let addr = state.fetch_word()?;
                if cond.passed(state.cpu) {
                    call(state, addr)?;
                    return Ok(self.taken_length());
                }
            }
            JumpOp::Return => state.cpu.pc = Wrapping(state.pop()?),
            JumpOp::ConditionalReturn(cond) => {
                if cond.passed(state.cpu) {
                    state.cpu.pc = Wrapping(state.pop()?);
                    return Ok(self.taken_length());
                }
            }
            JumpOp::ReturnAndEnable => {
                state.cpu.pc = Wrapping(state.pop()?);
                state.cpu.enable_interupts();
            }
            JumpOp::RST00 => call(state, 0x00)?,
            JumpOp::RST08 => call(state, 0x08)?,
            JumpOp::RST10 => call(state, 0x10)?,
            JumpOp::RST18 => call(state, 0x18)?,
            JumpOp::RST20 => call(state, 0x20)?,
            JumpOp::RST28 => call(state, 0x28)?,
            JumpOp::RST30 => call(state, 0x30)?,
            JumpOp::RST38 => call(state, 0x38)?,
        }
        Ok(self.length())
    }

    /// Returns the number of machine cycles this instruction takes. For conditional jumps, this
    /// is the cost when the condition fails.
    pub const fn length(&self) -> u8 {
        match self {
            JumpOp::ConditionalRelative(_) => 2,
            JumpOp::Relative => 3,
            JumpOp::ConditionalAbsolute(_) => 3,
            JumpOp::Absolute => 4,
            JumpOp::JumpToHL => 1,
            JumpOp::Call => 6,
            JumpOp::ConditionalCall(_) => 3,
            JumpOp::Return => 4,
            JumpOp::ConditionalReturn(_) => 2,
            JumpOp::ReturnAndEnable => 4,
            JumpOp::RST00
            | JumpOp::RST08
            | JumpOp::RST10
            | JumpOp::RST18
            | JumpOp::RST20
            | JumpOp::RST28
            | JumpOp::RST30
            | JumpOp::RST38 => 4,
        }
    }

    /// Returns the number of machine cycles this instruction takes when its condition passes.
    pub const fn taken_length(&self) -> u8 {
        match self {
            JumpOp::ConditionalRelative(_) => 3,
            JumpOp::ConditionalAbsolute(_) => 4,
            JumpOp::ConditionalCall(_) => 6,
            JumpOp::ConditionalReturn(_) => 5,
            op => op.length(),
        }
    }

    /// Returns the size of the bytes to took to construct this instruction
    pub const fn size(&self) -> u8 {
        match self {
            JumpOp::ConditionalRelative(_) => 2,
            JumpOp::Relative => 2,
            JumpOp::ConditionalAbsolute(_) => 3,
            JumpOp::Absolute => 3,
            JumpOp::JumpToHL => 1,
            JumpOp::Call => 3,
            JumpOp::ConditionalCall(_) => 3,
            JumpOp::Return => 1,
            JumpOp::ConditionalReturn(_) => 1,
            JumpOp::ReturnAndEnable => 1,
            JumpOp::RST00
            | JumpOp::RST08
            | JumpOp::RST10
            | JumpOp::RST18
            | JumpOp::RST20
            | JumpOp::RST28
            | JumpOp::RST30
            | JumpOp::RST38 => 1,
        }
    }
}

fn jump_relative(cpu: &mut Cpu, offset: i8) {
    cpu.pc = Wrapping(cpu.pc.0.wrapping_add_signed(offset as i16));
}

fn call<M: MemoryLike + ?Sized>(state: &mut GameboyState<'_, M>, addr: u16) -> Result<()> {
    state.push(state.cpu.pc.0)?;
    state.cpu.pc = Wrapping(addr);
    Ok(())
}
