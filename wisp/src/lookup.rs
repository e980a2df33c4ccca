use array_concat::concat_arrays;
use heapless::Vec as InlineVec;

use crate::error::Result;
use crate::instruction::*;
use crate::mem::MemoryLike;

type OpArray<const N: usize> = [Instruction; N];

type PrefixedOpArray<const N: usize> = [PrefixedInstruction; N];

/// An instruction decoded without being executed, along with the bytes that encode it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disassembly {
    pub addr: u16,
    pub op: DecodedOp,
    pub bytes: InlineVec<u8, 3>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
#[display("{_variant}")]
pub enum DecodedOp {
    #[display("{_0}")]
    Base(Instruction),
    #[display("{_0}")]
    Prefixed(PrefixedInstruction),
}

impl std::fmt::Display for Disassembly {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:0>4X}:", self.addr)?;
        for byte in self.bytes.iter() {
            write!(f, " {byte:0>2X}")?;
        }
        for _ in self.bytes.len()..3 {
            write!(f, "   ")?;
        }
        write!(f, "  {}", self.op)
    }
}

/// Decodes the instruction at `pc` without changing any state.
pub fn disassemble<M: MemoryLike + ?Sized>(mem: &M, pc: u16) -> Result<Disassembly> {
    let code = mem.read_byte(pc)?;
    let (op, size) = match OP_LOOKUP[code as usize] {
        Instruction::Prefixed => {
            let op = PREFIXED_OP_LOOKUP[mem.read_byte(pc.wrapping_add(1))? as usize];
            (DecodedOp::Prefixed(op), op.size())
        }
        op => (DecodedOp::Base(op), op.size()),
    };
    let mut bytes = InlineVec::new();
    for i in 0..size as u16 {
        // The size of every op is at most 3
        let _ = bytes.push(mem.read_byte(pc.wrapping_add(i))?);
    }
    Ok(Disassembly {
        addr: pc,
        op,
        bytes,
    })
}

macro_rules! define_op {
    () => {
        Instruction::Unused
    };
    (DAA) => {
        Instruction::Daa
    };
    (SCF) => {
        Instruction::Scf
    };
    (CPL) => {
        Instruction::Cpl
    };
    (CCF) => {
        Instruction::Ccf
    };
    (RLCA) => {
        Instruction::Rlca
    };
    (RLA) => {
        Instruction::Rla
    };
    (RRCA) => {
        Instruction::Rrca
    };
    (RRA) => {
        Instruction::Rra
    };
    (NOOP) => {
        Instruction::ControlOp(ControlOp::Noop)
    };
    (STOP) => {
        Instruction::ControlOp(ControlOp::Stop)
    };
    (JR) => {
        Instruction::Jump(JumpOp::Relative)
    };
    (JR, $r: ident) => {
        Instruction::Jump(JumpOp::ConditionalRelative(Condition::$r))
    };
    (JP) => {
        Instruction::Jump(JumpOp::Absolute)
    };
    (JP, HL) => {
        Instruction::Jump(JumpOp::JumpToHL)
    };
    (JP, $r: ident) => {
        Instruction::Jump(JumpOp::ConditionalAbsolute(Condition::$r))
    };
    (ADD) => {
        Instruction::Arithmetic(ArithmeticOp::Add(SomeByte::Direct))
    };
    (ADD, SP) => {
        Instruction::Arithmetic(ArithmeticOp::AddSP)
    };
    (ADD, $r: ident) => {
        Instruction::Arithmetic(ArithmeticOp::Add(SomeByte::Referenced(
            InnerRegOrPointer::$r.convert(),
        )))
    };
    (ADC) => {
        Instruction::Arithmetic(ArithmeticOp::Adc(SomeByte::Direct))
    };
    (ADC, $r: ident) => {
        Instruction::Arithmetic(ArithmeticOp::Adc(SomeByte::Referenced(
            InnerRegOrPointer::$r.convert(),
        )))
    };
    (SUB) => {
        Instruction::Arithmetic(ArithmeticOp::Sub(SomeByte::Direct))
    };
    (SUB, $r: ident) => {
        Instruction::Arithmetic(ArithmeticOp::Sub(SomeByte::Referenced(
            InnerRegOrPointer::$r.convert(),
        )))
    };
    (SBC) => {
        Instruction::Arithmetic(ArithmeticOp::Sbc(SomeByte::Direct))
    };
    (SBC, $r: ident) => {
        Instruction::Arithmetic(ArithmeticOp::Sbc(SomeByte::Referenced(
            InnerRegOrPointer::$r.convert(),
        )))
    };
    (AND) => {
        Instruction::Arithmetic(ArithmeticOp::And(SomeByte::Direct))
    };
    (AND, $r: ident) => {
        Instruction::Arithmetic(ArithmeticOp::And(SomeByte::Referenced(
            InnerRegOrPointer::$r.convert(),
        )))
    };
    (XOR) => {
        Instruction::Arithmetic(ArithmeticOp::Xor(SomeByte::Direct))
    };
    (XOR, $r: ident) => {
        Instruction::Arithmetic(ArithmeticOp::Xor(SomeByte::Referenced(
            InnerRegOrPointer::$r.convert(),
        )))
    };
    (OR) => {
        Instruction::Arithmetic(ArithmeticOp::Or(SomeByte::Direct))
    };
    (OR, $r: ident) => {
        Instruction::Arithmetic(ArithmeticOp::Or(SomeByte::Referenced(
            InnerRegOrPointer::$r.convert(),
        )))
    };
    (CP) => {
        Instruction::Arithmetic(ArithmeticOp::Cp(SomeByte::Direct))
    };
    (CP, $r: ident) => {
        Instruction::Arithmetic(ArithmeticOp::Cp(SomeByte::Referenced(
            InnerRegOrPointer::$r.convert(),
        )))
    };
    (ADD16, $r: ident) => {
        Instruction::Arithmetic(ArithmeticOp::Add16(WideReg::$r))
    };
    (INC, $r: ident) => {
        Instruction::Arithmetic(ArithmeticOp::Inc(InnerRegOrPointer::$r.convert()))
    };
    (INC16, $r: ident) => {
        Instruction::Arithmetic(ArithmeticOp::Inc16(WideReg::$r))
    };
    (DEC, $r: ident) => {
        Instruction::Arithmetic(ArithmeticOp::Dec(InnerRegOrPointer::$r.convert()))
    };
    (DEC16, $r: ident) => {
        Instruction::Arithmetic(ArithmeticOp::Dec16(WideReg::$r))
    };
    (LD, $r: ident, A) => {
        Instruction::Load(LoadOp::StoreFromA(LoadAPointer::$r))
    };
    (LD SP) => {
        Instruction::Load(LoadOp::StoreSP)
    };
    (LoadA) => {
        Instruction::Load(LoadOp::LoadA)
    };
    (StoreA) => {
        Instruction::Load(LoadOp::StoreA)
    };
    (LD, $r: ident) => {
        Instruction::Load(LoadOp::Direct(InnerRegOrPointer::$r.convert()))
    };
    (LD16, $r: ident) => {
        Instruction::Load(LoadOp::Direct16(WideReg::$r))
    };
    (LD, HL, SP) => {
        Instruction::Load(LoadOp::SPIntoHL)
    };
    (LD, SP, HL) => {
        Instruction::Load(LoadOp::HLIntoSP)
    };
    (LD, A, $r: ident) => {
        Instruction::Load(LoadOp::LoadIntoA(LoadAPointer::$r))
    };
    // 0x76 sits where `LD (HL), (HL)` would be
    (LD, Pointer, Pointer,) => {
        Instruction::ControlOp(ControlOp::Halt)
    };
    (LD, $r1: ident, $r2: ident,) => {
        Instruction::Load(LoadOp::Basic {
            dest: InnerRegOrPointer::$r1.convert(),
            src: InnerRegOrPointer::$r2.convert(),
        })
    };
    (POP, $r: ident) => {
        Instruction::Load(LoadOp::Pop(WideRegWithoutSP::$r))
    };
    (PUSH, $r: ident) => {
        Instruction::Load(LoadOp::Push(WideRegWithoutSP::$r))
    };
    (RET) => {
        Instruction::Jump(JumpOp::Return)
    };
    (RETI) => {
        Instruction::Jump(JumpOp::ReturnAndEnable)
    };
    (RET, $r: ident) => {
        Instruction::Jump(JumpOp::ConditionalReturn(Condition::$r))
    };
    (CALL) => {
        Instruction::Jump(JumpOp::Call)
    };
    (CALL, $r: ident) => {
        Instruction::Jump(JumpOp::ConditionalCall(Condition::$r))
    };
    (PREFIX) => {
        Instruction::Prefixed
    };
    (DI) => {
        Instruction::Di
    };
    (EI) => {
        Instruction::Ei
    };
    (RST00) => {
        Instruction::Jump(JumpOp::RST00)
    };
    (RST08) => {
        Instruction::Jump(JumpOp::RST08)
    };
    (RST10) => {
        Instruction::Jump(JumpOp::RST10)
    };
    (RST18) => {
        Instruction::Jump(JumpOp::RST18)
    };
    (RST20) => {
        Instruction::Jump(JumpOp::RST20)
    };
    (RST28) => {
        Instruction::Jump(JumpOp::RST28)
    };
    (RST30) => {
        Instruction::Jump(JumpOp::RST30)
    };
    (RST38) => {
        Instruction::Jump(JumpOp::RST38)
    };
    (StoreHigh) => {
        Instruction::Load(LoadOp::StoreHigh)
    };
    (LoadHigh) => {
        Instruction::Load(LoadOp::LoadHigh)
    };
    (StoreHighC) => {
        Instruction::Load(LoadOp::StoreHighC)
    };
    (LoadHighC) => {
        Instruction::Load(LoadOp::LoadHighC)
    };
    /* --- Prefixed op definitions --- */
    (RL, $r: ident) => {
        PrefixedInstruction::BitShift(BitShiftOp::Rl(InnerRegOrPointer::$r.convert()))
    };
    (RLC, $r: ident) => {
        PrefixedInstruction::BitShift(BitShiftOp::Rlc(InnerRegOrPointer::$r.convert()))
    };
    (RRC, $r: ident) => {
        PrefixedInstruction::BitShift(BitShiftOp::Rrc(InnerRegOrPointer::$r.convert()))
    };
    (RR, $r: ident) => {
        PrefixedInstruction::BitShift(BitShiftOp::Rr(InnerRegOrPointer::$r.convert()))
    };
    (SLA, $r: ident) => {
        PrefixedInstruction::BitShift(BitShiftOp::Sla(InnerRegOrPointer::$r.convert()))
    };
    (SRA, $r: ident) => {
        PrefixedInstruction::BitShift(BitShiftOp::Sra(InnerRegOrPointer::$r.convert()))
    };
    (SWAP, $r: ident) => {
        PrefixedInstruction::BitShift(BitShiftOp::Swap(InnerRegOrPointer::$r.convert()))
    };
    (SRL, $r: ident) => {
        PrefixedInstruction::BitShift(BitShiftOp::Srl(InnerRegOrPointer::$r.convert()))
    };
    (BIT, $b: literal, $r: ident) => {
        PrefixedInstruction::Bit(BitOp {
            bit: $b,
            reg: InnerRegOrPointer::$r.convert(),
            op: BitOpInner::Bit,
        })
    };
    (RES, $b: literal, $r: ident) => {
        PrefixedInstruction::Bit(BitOp {
            bit: $b,
            reg: InnerRegOrPointer::$r.convert(),
            op: BitOpInner::Res,
        })
    };
    (SET, $b: literal, $r: ident) => {
        PrefixedInstruction::Bit(BitOp {
            bit: $b,
            reg: InnerRegOrPointer::$r.convert(),
            op: BitOpInner::Set,
        })
    };
}

macro_rules! define_op_chunk {
    (LD) => {{
        const OPS: OpArray<0x40> = concat_arrays!(
            define_op_chunk!(LD, B),
            define_op_chunk!(LD, C),
            define_op_chunk!(LD, D),
            define_op_chunk!(LD, E),
            define_op_chunk!(LD, H),
            define_op_chunk!(LD, L),
            define_op_chunk!(LD, Pointer),
            define_op_chunk!(LD, A)
        );
        OPS
    }};
    ($x: ident, NUM) => {{
        const OPS: PrefixedOpArray<0x40> = concat_arrays!(
            define_op_chunk!($x, 0,),
            define_op_chunk!($x, 1,),
            define_op_chunk!($x, 2,),
            define_op_chunk!($x, 3,),
            define_op_chunk!($x, 4,),
            define_op_chunk!($x, 5,),
            define_op_chunk!($x, 6,),
            define_op_chunk!($x, 7,)
        );
        OPS
    }};
    ($x: ident, $i: literal,) => {{
        const OPS: PrefixedOpArray<0x08> = [
            define_op!($x, $i, B),
            define_op!($x, $i, C),
            define_op!($x, $i, D),
            define_op!($x, $i, E),
            define_op!($x, $i, H),
            define_op!($x, $i, L),
            define_op!($x, $i, Pointer),
            define_op!($x, $i, A),
        ];
        OPS
    }};
    (PREFIXED $x: ident) => {{
        const OPS: PrefixedOpArray<8> = [
            define_op!($x, B),
            define_op!($x, C),
            define_op!($x, D),
            define_op!($x, E),
            define_op!($x, H),
            define_op!($x, L),
            define_op!($x, Pointer),
            define_op!($x, A),
        ];
        OPS
    }};
    ($x: ident) => {{
        const OPS: OpArray<8> = [
            define_op!($x, B),
            define_op!($x, C),
            define_op!($x, D),
            define_op!($x, E),
            define_op!($x, H),
            define_op!($x, L),
            define_op!($x, Pointer),
            define_op!($x, A),
        ];
        OPS
    }};
    ($x: ident, $r: ident) => {{
        const OPS: OpArray<8> = [
            define_op!($x, $r, B,),
            define_op!($x, $r, C,),
            define_op!($x, $r, D,),
            define_op!($x, $r, E,),
            define_op!($x, $r, H,),
            define_op!($x, $r, L,),
            define_op!($x, $r, Pointer,),
            define_op!($x, $r, A,),
        ];
        OPS
    }};
}

macro_rules! define_op_lookup_table {
    () => {
        concat_arrays!(
            define_op_lookup_table!(CHUNK_ONE),
            define_op_lookup_table!(CHUNK_TWO),
            define_op_lookup_table!(CHUNK_THREE),
            define_op_lookup_table!(CHUNK_FOUR)
        )
    };
    (PREFIXED) => {
        concat_arrays!(
            define_op_chunk!(PREFIXED RLC),
            define_op_chunk!(PREFIXED RRC),
            define_op_chunk!(PREFIXED RL),
            define_op_chunk!(PREFIXED RR),
            define_op_chunk!(PREFIXED SLA),
            define_op_chunk!(PREFIXED SRA),
            define_op_chunk!(PREFIXED SWAP),
            define_op_chunk!(PREFIXED SRL),
            define_op_chunk!(BIT, NUM),
            define_op_chunk!(RES, NUM),
            define_op_chunk!(SET, NUM)
        )
    };
    // The top and bottom quarters of the table are defined in rows of four (one per high nibble
    // 0x0_ to 0x3_ or 0xC_ to 0xF_), then transposed into columns and concatinated.
    (CHUNK_ONE) => {{
        const TO_TRANSPOSED: [OpArray<4>; 0x10] = [
            [
                define_op!(NOOP),
                define_op!(STOP),
                define_op!(JR, NotZero),
                define_op!(JR, NotCarry),
            ],
            [
                define_op!(LD16, BC),
                define_op!(LD16, DE),
                define_op!(LD16, HL),
                define_op!(LD16, SP),
            ],
            [
                define_op!(LD, BC, A),
                define_op!(LD, DE, A),
                define_op!(LD, Hli, A),
                define_op!(LD, Hld, A),
            ],
            [
                define_op!(INC16, BC),
                define_op!(INC16, DE),
                define_op!(INC16, HL),
                define_op!(INC16, SP),
            ],
            [
                define_op!(INC, B),
                define_op!(INC, D),
                define_op!(INC, H),
                define_op!(INC, Pointer),
            ],
            [
                define_op!(DEC, B),
                define_op!(DEC, D),
                define_op!(DEC, H),
                define_op!(DEC, Pointer),
            ],
            [
                define_op!(LD, B),
                define_op!(LD, D),
                define_op!(LD, H),
                define_op!(LD, Pointer),
            ],
            [
                define_op!(RLCA),
                define_op!(RLA),
                define_op!(DAA),
                define_op!(SCF),
            ],
            [
                define_op!(LD SP),
                define_op!(JR),
                define_op!(JR, Zero),
                define_op!(JR, Carry),
            ],
            [
                define_op!(ADD16, BC),
                define_op!(ADD16, DE),
                define_op!(ADD16, HL),
                define_op!(ADD16, SP),
            ],
            [
                define_op!(LD, A, BC),
                define_op!(LD, A, DE),
                define_op!(LD, A, Hli),
                define_op!(LD, A, Hld),
            ],
            [
                define_op!(DEC16, BC),
                define_op!(DEC16, DE),
                define_op!(DEC16, HL),
                define_op!(DEC16, SP),
            ],
            [
                define_op!(INC, C),
                define_op!(INC, E),
                define_op!(INC, L),
                define_op!(INC, A),
            ],
            [
                define_op!(DEC, C),
                define_op!(DEC, E),
                define_op!(DEC, L),
                define_op!(DEC, A),
            ],
            [
                define_op!(LD, C),
                define_op!(LD, E),
                define_op!(LD, L),
                define_op!(LD, A),
            ],
            [
                define_op!(RRCA),
                define_op!(RRA),
                define_op!(CPL),
                define_op!(CCF),
            ],
        ];
        const TRANSPOSED: [OpArray<16>; 4] = transpose!(TO_TRANSPOSED);
        const CHUNK: OpArray<0x40> =
            concat_arrays!(TRANSPOSED[0], TRANSPOSED[1], TRANSPOSED[2], TRANSPOSED[3]);
        CHUNK
    }};
    (CHUNK_TWO) => {
        define_op_chunk!(LD)
    };
    (CHUNK_THREE) => {{
        const CHUNK: OpArray<0x40> = concat_arrays!(
            define_op_chunk!(ADD),
            define_op_chunk!(ADC),
            define_op_chunk!(SUB),
            define_op_chunk!(SBC),
            define_op_chunk!(AND),
            define_op_chunk!(XOR),
            define_op_chunk!(OR),
            define_op_chunk!(CP)
        );
        CHUNK
    }};
    (CHUNK_FOUR) => {{
        const TO_TRANSPOSED: [OpArray<4>; 0x10] = [
            [
                define_op!(RET, NotZero),
                define_op!(RET, NotCarry),
                define_op!(StoreHigh),
                define_op!(LoadHigh),
            ],
            [
                define_op!(POP, BC),
                define_op!(POP, DE),
                define_op!(POP, HL),
                define_op!(POP, AF),
            ],
            [
                define_op!(JP, NotZero),
                define_op!(JP, NotCarry),
                define_op!(StoreHighC),
                define_op!(LoadHighC),
            ],
            [define_op!(JP), define_op!(), define_op!(), define_op!(DI)],
            [
                define_op!(CALL, NotZero),
                define_op!(CALL, NotCarry),
                define_op!(),
                define_op!(),
            ],
            [
                define_op!(PUSH, BC),
                define_op!(PUSH, DE),
                define_op!(PUSH, HL),
                define_op!(PUSH, AF),
            ],
            [
                define_op!(ADD),
                define_op!(SUB),
                define_op!(AND),
                define_op!(OR),
            ],
            [
                define_op!(RST00),
                define_op!(RST10),
                define_op!(RST20),
                define_op!(RST30),
            ],
            [
                define_op!(RET, Zero),
                define_op!(RET, Carry),
                define_op!(ADD, SP),
                define_op!(LD, HL, SP),
            ],
            [
                define_op!(RET),
                define_op!(RETI),
                define_op!(JP, HL),
                define_op!(LD, SP, HL),
            ],
            [
                define_op!(JP, Zero),
                define_op!(JP, Carry),
                define_op!(StoreA),
                define_op!(LoadA),
            ],
            [define_op!(PREFIX), define_op!(), define_op!(), define_op!(EI)],
            [
                define_op!(CALL, Zero),
                define_op!(CALL, Carry),
                define_op!(),
                define_op!(),
            ],
            [define_op!(CALL), define_op!(), define_op!(), define_op!()],
            [
                define_op!(ADC),
                define_op!(SBC),
                define_op!(XOR),
                define_op!(CP),
            ],
            [
                define_op!(RST08),
                define_op!(RST18),
                define_op!(RST28),
                define_op!(RST38),
            ],
        ];
        const TRANSPOSED: [OpArray<16>; 4] = transpose!(TO_TRANSPOSED);
        const CHUNK: OpArray<0x40> =
            concat_arrays!(TRANSPOSED[0], TRANSPOSED[1], TRANSPOSED[2], TRANSPOSED[3]);
        CHUNK
    }};
}

macro_rules! transpose {
    ($arr: ident) => {{
        const TRANSPOSED: [OpArray<16>; 4] = [
            transpose!($arr, 0),
            transpose!($arr, 1),
            transpose!($arr, 2),
            transpose!($arr, 3),
        ];
        TRANSPOSED
    }};
    ($arr: ident, $i: literal) => {{
        const INNER: OpArray<16> = [
            $arr[0][$i],
            $arr[1][$i],
            $arr[2][$i],
            $arr[3][$i],
            $arr[4][$i],
            $arr[5][$i],
            $arr[6][$i],
            $arr[7][$i],
            $arr[8][$i],
            $arr[9][$i],
            $arr[10][$i],
            $arr[11][$i],
            $arr[12][$i],
            $arr[13][$i],
            $arr[14][$i],
            $arr[15][$i],
        ];
        INNER
    }};
}

// TODO: Fix this once array_concat doesn't emit it anymore
#[allow(unexpected_cfgs)]
pub(crate) static OP_LOOKUP: OpArray<0x100> = define_op_lookup_table!();
#[allow(unexpected_cfgs)]
pub(crate) static PREFIXED_OP_LOOKUP: PrefixedOpArray<0x100> =
    define_op_lookup_table!(PREFIXED);

#[cfg(test)]
mod test {
    use std::collections::HashSet;

    use super::*;

    const UNUSED: [u8; 11] = [
        0xD3, 0xDB, 0xDD, 0xE3, 0xE4, 0xEB, 0xEC, 0xED, 0xF4, 0xFC, 0xFD,
    ];

    #[test]
    fn dedupped_op_lookup_tables() {
        // Test standard ops
        let ops: HashSet<_> = OP_LOOKUP
            .iter()
            .filter(|op| !matches!(op, Instruction::Unused))
            .collect();
        // Ensure (almost) all of the operations are actually returning unique values
        assert_eq!(0x100 - UNUSED.len(), ops.len());
        for (code, op) in OP_LOOKUP.iter().enumerate() {
            assert_eq!(
                UNUSED.contains(&(code as u8)),
                matches!(op, Instruction::Unused),
                "0x{code:0>2X} => {op}"
            );
        }

        // Test prefixed ops
        let more_ops: HashSet<_> = PREFIXED_OP_LOOKUP.iter().collect();
        assert_eq!(0x100, more_ops.len());
    }

    #[test]
    fn spot_check_decoding() {
        assert_eq!(OP_LOOKUP[0x76], Instruction::ControlOp(ControlOp::Halt));
        assert_eq!(
            OP_LOOKUP[0x41],
            Instruction::Load(LoadOp::Basic {
                dest: RegOrPointer::Reg(HalfRegister::B),
                src: RegOrPointer::Reg(HalfRegister::C),
            })
        );
        assert_eq!(OP_LOOKUP[0xE0], Instruction::Load(LoadOp::StoreHigh));
        assert_eq!(OP_LOOKUP[0xFA], Instruction::Load(LoadOp::LoadA));
        assert_eq!(OP_LOOKUP[0xCB], Instruction::Prefixed);
        assert_eq!(
            OP_LOOKUP[0x3C],
            Instruction::Arithmetic(ArithmeticOp::Inc(RegOrPointer::Reg(HalfRegister::A)))
        );
        assert_eq!(
            PREFIXED_OP_LOOKUP[0x7E],
            PrefixedInstruction::Bit(BitOp {
                bit: 7,
                reg: RegOrPointer::Pointer,
                op: BitOpInner::Bit,
            })
        );
        assert_eq!(
            PREFIXED_OP_LOOKUP[0x37],
            PrefixedInstruction::BitShift(BitShiftOp::Swap(RegOrPointer::Reg(HalfRegister::A)))
        );
        assert_eq!(
            PREFIXED_OP_LOOKUP[0xC1],
            PrefixedInstruction::Bit(BitOp {
                bit: 0,
                reg: RegOrPointer::Reg(HalfRegister::C),
                op: BitOpInner::Set,
            })
        );
    }

    #[test]
    fn sizes_match_operands() {
        assert_eq!(OP_LOOKUP[0x01].size(), 3);
        assert_eq!(OP_LOOKUP[0x08].size(), 3);
        assert_eq!(OP_LOOKUP[0x10].size(), 2);
        assert_eq!(OP_LOOKUP[0x18].size(), 2);
        assert_eq!(OP_LOOKUP[0x3E].size(), 2);
        assert_eq!(OP_LOOKUP[0xC3].size(), 3);
        assert_eq!(OP_LOOKUP[0xE0].size(), 2);
        assert_eq!(OP_LOOKUP[0xE2].size(), 1);
        assert_eq!(OP_LOOKUP[0xFE].size(), 2);
        assert!(PREFIXED_OP_LOOKUP.iter().all(|op| op.size() == 2));
    }

    #[test]
    fn disassembly() {
        let mut mem = vec![0u8; 0x10000];
        mem[0x150..0x156].copy_from_slice(&[0x3E, 0x05, 0xCB, 0x37, 0xC3, 0x00]);
        let dis = disassemble(&mem, 0x150).unwrap();
        assert_eq!(dis.bytes.as_slice(), &[0x3E, 0x05]);
        assert_eq!(dis.to_string(), "0x0150: 3E 05     LD A, n8");
        let dis = disassemble(&mem, 0x152).unwrap();
        assert_eq!(dis.op.to_string(), "SWAP A");
        assert_eq!(dis.bytes.len(), 2);
        let dis = disassemble(&mem, 0x154).unwrap();
        assert_eq!(dis.bytes.as_slice(), &[0xC3, 0x00, 0x00]);
    }
}
