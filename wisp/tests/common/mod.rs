#![allow(dead_code)]

use wisp::{CartridgeHeader, Gameboy};

pub const BANK_SIZE: usize = 16 * 1024;

/// Where [`rom`] places the program. The entry point at 0x0100 jumps here.
pub const PROGRAM_START: u16 = 0x0150;

/// Builds a cartridge image with a valid header. The first two bytes of each bank hold the bank's
/// index (little endian) and every other byte of a switchable bank holds the low byte of its index.
pub fn rom(cartridge_type: u8, rom_size: u8, ram_size: u8, program: &[u8]) -> Vec<u8> {
    let banks = 2usize << rom_size;
    let mut rom = vec![0; banks * BANK_SIZE];
    for (i, bank) in rom.chunks_mut(BANK_SIZE).enumerate().skip(1) {
        bank.fill(i as u8);
        bank[..2].copy_from_slice(&(i as u16).to_le_bytes());
    }
    // NOP; JP 0x0150
    rom[0x100..0x104].copy_from_slice(&[0x00, 0xC3, 0x50, 0x01]);
    rom[0x134..0x138].copy_from_slice(b"WISP");
    rom[0x147] = cartridge_type;
    rom[0x148] = rom_size;
    rom[0x149] = ram_size;
    let start = PROGRAM_START as usize;
    rom[start..start + program.len()].copy_from_slice(program);
    fix_checksum(&mut rom);
    rom
}

/// A 32 KiB cartridge without a bank controller.
pub fn simple_rom(program: &[u8]) -> Vec<u8> {
    rom(0x00, 0x00, 0x00, program)
}

/// Writes `bytes` into the image at `addr`.
pub fn patch(rom: &mut [u8], addr: u16, bytes: &[u8]) {
    let addr = addr as usize;
    rom[addr..addr + bytes.len()].copy_from_slice(bytes);
}

pub fn set_color(rom: &mut [u8]) {
    rom[0x143] = 0x80;
    fix_checksum(rom);
}

pub fn fix_checksum(rom: &mut [u8]) {
    rom[0x14D] = CartridgeHeader::checksum(rom);
}

/// Loads the image and skips past the entry point, so the next step executes the program.
pub fn console(rom: Vec<u8>) -> Gameboy {
    let mut gb = Gameboy::load_cartridge(rom).unwrap();
    gb.cpu_mut().pc.0 = PROGRAM_START;
    gb
}

/// Steps the console until it halts, panicking if that takes more than `limit` steps.
pub fn run_until_halt(gb: &mut Gameboy, limit: usize) -> usize {
    for steps in 0..limit {
        if gb.is_halted() {
            return steps;
        }
        let cycles = gb.step().unwrap();
        gb.tick_peripherals(cycles as u32);
    }
    panic!("Console did not halt within {limit} steps: {}", gb.cpu());
}
