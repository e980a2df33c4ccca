use super::*;

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, derive_more::Display)]
#[display("{_variant}")]
pub enum LoadOp {
    /// Used for opcodes in 0x40..0x80
    #[display("LD {dest}, {src}")]
    Basic {
        dest: RegOrPointer,
        src: RegOrPointer,
    },
    /// Used for opcodes 0x_1
    #[display("LD {_0}, n16")]
    Direct16(WideReg),
    /// Used for opcodes 0x_6 and 0x_E
    #[display("LD {_0}, n8")]
    Direct(RegOrPointer),
    /// Used for opcodes 0x_A
    #[display("LD A, {_0}")]
    LoadIntoA(LoadAPointer),
    /// Used for opcodes 0x_2
    #[display("LD {_0}, A")]
    StoreFromA(LoadAPointer),
    /// Opcode: 0x08
    /// Store SP & $FF at address n16 and SP >> 8 at address n16 + 1.
    #[display("LD (a16), SP")]
    StoreSP,
    /// Opcode: 0xF9
    #[display("LD SP, HL")]
    HLIntoSP,
    /// Opcode: 0xF8
    /// Add the signed value e8 to SP and store the result in HL.
    #[display("LD HL, SP + e8")]
    SPIntoHL,
    /// Used for opcodes 0x_1
    #[display("POP {_0}")]
    Pop(WideRegWithoutSP),
    /// Used for opcodes 0x_5
    #[display("PUSH {_0}")]
    Push(WideRegWithoutSP),
    /// Opcode: 0xE0
    #[display("LDH (a8), A")]
    StoreHigh,
    /// Opcode: 0xF0
    #[display("LDH A, (a8)")]
    LoadHigh,
    /// Opcode: 0xE2
    #[display("LD (C), A")]
    StoreHighC,
    /// Opcode: 0xF2
    #[display("LD A, (C)")]
    LoadHighC,
    /// Opcode: 0xEA
    #[display("LD (a16), A")]
    StoreA,
    /// Opcode: 0xFA
    #[display("LD A, (a16)")]
    LoadA,
}

impl LoadOp {
    pub(crate) fn execute<M: MemoryLike + ?Sized>(
        self,
        state: &mut GameboyState<'_, M>,
    ) -> Result<u8> {
        match self {
            LoadOp::Basic { dest, src } => {
                let byte = state.read_operand(src)?;
                state.write_operand(dest, byte)?;
            }
            LoadOp::Direct16(reg) => {
                let word = state.fetch_word()?;
                state.cpu.write_wide_reg(reg, word);
            }
            LoadOp::Direct(reg) => {
                let byte = state.fetch_byte()?;
                state.write_operand(reg, byte)?;
            }
            LoadOp::LoadIntoA(ptr) => {
                let addr = a_pointer(state.cpu, ptr);
                state.cpu.a = Wrapping(state.mem.read_byte(addr)?);
            }
            LoadOp::StoreFromA(ptr) => {
                let addr = a_pointer(state.cpu, ptr);
                state.mem.write_byte(addr, state.cpu.a.0)?;
            }
            LoadOp::StoreSP => {
                let addr = state.fetch_word()?;
                let [lo, hi] = state.cpu.sp.0.to_le_bytes();
                state.mem.write_byte(addr, lo)?;
                state.mem.write_byte(addr.wrapping_add(1), hi)?;
            }
            LoadOp::HLIntoSP => state.cpu.sp = Wrapping(state.cpu.hl()),
            LoadOp::SPIntoHL => {
                let offset = state.fetch_byte()?;
                let cpu = &mut *state.cpu;
                let hl = offset_sp(cpu.sp.0, offset, &mut cpu.f);
                cpu.write_hl(hl);
            }
            LoadOp::Pop(reg) => {
                let word = state.pop()?;
                state.cpu.write_stack_reg(reg, word);
            }
            LoadOp::Push(reg) => {
                let word = state.cpu.read_stack_reg(reg);
                state.push(word)?;
            }
            LoadOp::StoreHigh => {
                let addr = 0xFF00 | state.fetch_byte()? as u16;
                state.mem.write_byte(addr, state.cpu.a.0)?;
            }
            LoadOp::LoadHigh => {
                let addr = 0xFF00 | state.fetch_byte()? as u16;
                state.cpu.a = Wrapping(state.mem.read_byte(addr)?);
            }
            LoadOp::StoreHighC => {
                let addr = 0xFF00 | state.cpu.c.0 as u16;
                state.mem.write_byte(addr, state.cpu.a.0)?;
            }
            LoadOp::LoadHighC => {
                let addr = 0xFF00 | state.cpu.c.0 as u16;
                state.cpu.a = Wrapping(state.mem.read_byte(addr)?);
            }
            LoadOp::StoreA => {
                let addr = state.fetch_word()?;
                state.mem.write_byte(addr, state.cpu.a.0)?;
            }
            LoadOp::LoadA => {
                let addr = state.fetch_word()?;
                state.cpu.a = Wrapping(state.mem.read_byte(addr)?);
            }
        }
        Ok(self.length())
    }

    /// Returns the number of machine cycles this instruction takes.
    pub const fn length(&self) -> u8 {
        match self {
            LoadOp::Basic {
                dest: RegOrPointer::Pointer,
                ..
            }
            | LoadOp::Basic {
                src: RegOrPointer::Pointer,
                ..
            } => 2,
            LoadOp::Basic { .. } => 1,
            LoadOp::Direct16(_) => 3,
            LoadOp::Direct(RegOrPointer::Pointer) => 3,
            LoadOp::Direct(_) => 2,
            LoadOp::LoadIntoA(_) => 2,
            LoadOp::StoreFromA(_) => 2,
            LoadOp::StoreSP => 5,
            LoadOp::HLIntoSP => 2,
            LoadOp::SPIntoHL => 3,
            LoadOp::Pop(_) => 3,
            LoadOp::Push(_) => 4,
            LoadOp::StoreHigh => 3,
            LoadOp::LoadHigh => 3,
            LoadOp::StoreHighC => 2,
            LoadOp::LoadHighC => 2,
            LoadOp::StoreA => 4,
            LoadOp::LoadA => 4,
        }
    }

    /// Returns the size of the bytes to took to construct this instruction
    pub const fn size(&self) -> u8 {
        match self {
            LoadOp::Basic { .. } => 1,
            LoadOp::Direct16(_) => 3,
            LoadOp::Direct(_) => 2,
            LoadOp::LoadIntoA(_) => 1,
            LoadOp::StoreFromA(_) => 1,
            LoadOp::StoreSP => 3,
            LoadOp::HLIntoSP => 1,
            LoadOp::SPIntoHL => 2,
            LoadOp::Pop(_) => 1,
            LoadOp::Push(_) => 1,
            LoadOp::StoreHigh => 2,
            LoadOp::LoadHigh => 2,
            LoadOp::StoreHighC => 1,
            LoadOp::LoadHighC => 1,
            LoadOp::StoreA => 3,
            LoadOp::LoadA => 3,
        }
    }
}

/// Resolves the address used by the A-specific loads, applying the post increment or decrement
/// of HL.
fn a_pointer(cpu: &mut Cpu, ptr: LoadAPointer) -> u16 {
    match ptr {
        LoadAPointer::BC => cpu.bc(),
        LoadAPointer::DE => cpu.de(),
        LoadAPointer::Hli => {
            let hl = cpu.hl();
            cpu.write_hl(hl.wrapping_add(1));
            hl
        }
        LoadAPointer::Hld => {
            let hl = cpu.hl();
            cpu.write_hl(hl.wrapping_sub(1));
            hl
        }
    }
}
