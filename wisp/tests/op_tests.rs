use std::num::Wrapping;

use wisp::cpu::Cpu;
use wisp::instruction::HalfRegister;
use wisp::instruction::InterruptOp;
use wisp::instruction::RegOrPointer;
use wisp::mem::InterruptFlags;
use wisp::mem::MemoryLike;
use wisp::Gameboy;
use wisp::Peripheral;

mod common;

use common::*;

const WRAM: u16 = 0xC010;

/// The operands in the order they are encoded in the low three bits of an op code.
fn reg_iter() -> &'static [RegOrPointer] {
    static REGS: &[RegOrPointer] = &[
        RegOrPointer::Reg(HalfRegister::B),
        RegOrPointer::Reg(HalfRegister::C),
        RegOrPointer::Reg(HalfRegister::D),
        RegOrPointer::Reg(HalfRegister::E),
        RegOrPointer::Reg(HalfRegister::H),
        RegOrPointer::Reg(HalfRegister::L),
        RegOrPointer::Pointer,
        RegOrPointer::Reg(HalfRegister::A),
    ];
    REGS
}

fn operand(gb: &Gameboy, reg: RegOrPointer) -> u8 {
    match reg {
        RegOrPointer::Reg(reg) => gb.cpu()[reg].0,
        RegOrPointer::Pointer => gb.mem().read_byte(gb.cpu().hl()).unwrap(),
    }
}

fn fill_registers(cpu: &mut Cpu) {
    cpu.a = Wrapping(0x77);
    cpu.b = Wrapping(0x11);
    cpu.c = Wrapping(0x22);
    cpu.d = Wrapping(0x33);
    cpu.e = Wrapping(0x44);
    cpu.write_hl(WRAM);
}

#[test]
fn test_cpl() {
    // LD A, 0x01; CPL; HALT
    let mut gb = console(simple_rom(&[0x3E, 0x01, 0x2F, 0x76]));
    run_until_halt(&mut gb, 10);
    let cpu = gb.cpu();
    assert_eq!(cpu.a.0, 0xFE);
    assert!(cpu.subtraction_flag(), "{cpu}");
    assert!(cpu.half_carry_flag(), "{cpu}");
}

#[test]
fn test_basic_loads() {
    for (i, dest) in reg_iter().iter().enumerate() {
        for (j, src) in reg_iter().iter().enumerate() {
            // 0x76 is HALT rather than LD (HL), (HL)
            if dest.is_pointer() && src.is_pointer() {
                continue;
            }
            let op = 0x40 | (i as u8) << 3 | j as u8;
            let mut gb = console(simple_rom(&[op, 0x76]));
            fill_registers(gb.cpu_mut());
            gb.mem_mut().write_byte(WRAM, 0x99).unwrap();
            let expected = operand(&gb, *src);
            assert_eq!(gb.step().unwrap(), if dest.is_pointer() || src.is_pointer() { 2 } else { 1 });
            if dest.is_pointer() {
                assert_eq!(gb.mem().read_byte(WRAM).unwrap(), expected, "LD {dest}, {src}");
            } else {
                assert_eq!(operand(&gb, *dest), expected, "LD {dest}, {src}");
            }
            assert_eq!(gb.cpu().pc.0, PROGRAM_START + 1);
        }
    }
}

#[test]
fn test_counting_loop() {
    // XOR A; LD B, 10; ADD A, B; DEC B; JR NZ, -4; HALT
    let mut gb = console(simple_rom(&[0xAF, 0x06, 0x0A, 0x80, 0x05, 0x20, 0xFC, 0x76]));
    run_until_halt(&mut gb, 100);
    assert_eq!(gb.cpu().a.0, 55);
    assert_eq!(gb.cpu().b.0, 0);
    assert!(gb.cpu().zero_flag());
}

#[test]
fn test_call_and_return() {
    // CALL 0x0158; HALT; ...; LD A, 0x42; RET
    let program = [0xCD, 0x58, 0x01, 0x76, 0, 0, 0, 0, 0x3E, 0x42, 0xC9];
    let mut gb = console(simple_rom(&program));
    assert_eq!(run_until_halt(&mut gb, 10), 4);
    assert_eq!(gb.cpu().a.0, 0x42);
    assert_eq!(gb.cpu().sp.0, 0xFFFE);
    assert_eq!(gb.cpu().pc.0, 0x0154);
}

#[test]
fn test_prefixed_ops() {
    // LD A, 0x1F; SWAP A; SET 7, A; RES 0, A; BIT 1, A; HALT
    let program = [0x3E, 0x1F, 0xCB, 0x37, 0xCB, 0xFF, 0xCB, 0x87, 0xCB, 0x4F, 0x76];
    let mut gb = console(simple_rom(&program));
    run_until_halt(&mut gb, 10);
    assert_eq!(gb.cpu().a.0, 0xF0);
    assert!(gb.cpu().zero_flag());
    assert!(gb.cpu().half_carry_flag());
}

#[test]
fn test_echo_ram() {
    // LD A, 0x5A; LD (0xC100), A; LD A, (0xE100); LD B, A; HALT
    let program = [0x3E, 0x5A, 0xEA, 0x00, 0xC1, 0xFA, 0x00, 0xE1, 0x47, 0x76];
    let mut gb = console(simple_rom(&program));
    run_until_halt(&mut gb, 10);
    assert_eq!(gb.cpu().b.0, 0x5A);
}

#[test]
fn test_rom_banking() {
    // LD A, 0x02; LD (0x2000), A; LD A, (0x4002); HALT
    let program = [0x3E, 0x02, 0xEA, 0x00, 0x20, 0xFA, 0x02, 0x40, 0x76];
    let mut gb = console(rom(0x01, 0x01, 0x00, &program));
    run_until_halt(&mut gb, 10);
    assert_eq!(gb.cpu().a.0, 0x02);
}

#[test]
fn test_cartridge_ram_enable() {
    let program = [
        0x3E, 0x0A, 0xEA, 0x00, 0x00, // LD A, 0x0A; LD (0x0000), A
        0x3E, 0x77, 0xEA, 0x00, 0xA0, // LD A, 0x77; LD (0xA000), A
        0xFA, 0x00, 0xA0, 0x47, // LD A, (0xA000); LD B, A
        0xAF, 0xEA, 0x00, 0x00, // XOR A; LD (0x0000), A
        0xFA, 0x00, 0xA0, 0x76, // LD A, (0xA000); HALT
    ];
    let mut gb = console(rom(0x03, 0x01, 0x02, &program));
    run_until_halt(&mut gb, 20);
    assert_eq!(gb.cpu().b.0, 0x77);
    assert_eq!(gb.cpu().a.0, 0xFF);
}

#[test]
fn test_oam_dma() {
    // LD A, 0xC1; LDH (0x46), A; HALT
    let mut gb = console(simple_rom(&[0x3E, 0xC1, 0xE0, 0x46, 0x76]));
    for i in 0..0xA0 {
        gb.mem_mut().write_byte(0xC100 + i, i as u8 ^ 0x55).unwrap();
    }
    run_until_halt(&mut gb, 10);
    for i in 0..0xA0 {
        assert_eq!(gb.mem().read_byte(0xFE00 + i).unwrap(), i as u8 ^ 0x55);
    }
    assert_eq!(gb.mem().read_byte(0xFF46).unwrap(), 0xC1);
}

/// Requests a timer interrupt once the given number of cycles have passed.
struct Countdown {
    remaining: u32,
}

impl Peripheral for Countdown {
    fn read_byte(&self, _: u16) -> u8 {
        0xFF
    }

    fn write_byte(&mut self, _: u16, _: u8) {}

    fn step(&mut self, cycles: u32, interrupts: &mut InterruptFlags) {
        if self.remaining == 0 {
            return;
        }
        self.remaining = self.remaining.saturating_sub(cycles);
        if self.remaining == 0 {
            interrupts.request(InterruptOp::Timer);
        }
    }
}

#[test_log::test]
fn test_interrupt_wakes_halt() {
    let program = [
        0x3E, 0x04, 0xE0, 0xFF, // LD A, 0x04; LDH (0xFF), A
        0xFB, 0x76, // EI; HALT
        0x47, 0x76, // LD B, A; HALT
    ];
    let mut image = simple_rom(&program);
    // LD A, 0x99; RETI
    patch(&mut image, 0x0050, &[0x3E, 0x99, 0xD9]);
    let mut gb = console(image);
    gb.mem_mut().attach_timer(Countdown { remaining: 100 });
    run_until_halt(&mut gb, 10);
    assert_eq!(gb.cpu().pc.0, PROGRAM_START + 6);

    // The console idles until the countdown fires
    let mut idle = 0;
    while gb.is_halted() {
        let cycles = gb.step().unwrap();
        gb.tick_peripherals(cycles as u32);
        idle += 1;
        assert!(idle < 200);
    }
    run_until_halt(&mut gb, 10);
    assert_eq!(gb.cpu().b.0, 0x99);
    assert!(gb.cpu().ime);
    assert!(!gb.mem().interrupt_flags().is_requested(InterruptOp::Timer));
}

#[test]
fn test_invalid_op_stops_console() {
    let mut gb = console(simple_rom(&[0x00, 0xDD]));
    gb.step().unwrap();
    let err = gb.step().unwrap_err();
    assert_eq!(
        err,
        wisp::Error::InvalidOpcode {
            opcode: 0xDD,
            prefixed: false,
            address: PROGRAM_START + 1,
        }
    );
    assert!(gb.is_stopped());
}
