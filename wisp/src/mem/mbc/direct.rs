use serde::Deserialize;
use serde::Serialize;

use super::RamBank;
use super::RomBank;
use super::bank_byte;
use super::rom_banks;

/// A cartridge without a controller chip. Two fixed ROM banks and 8 KiB of RAM that is always
/// accessible, whether or not the header claims it exists.
#[derive(Debug, Hash, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Direct {
    rom: Box<[RomBank]>,
    ram: RamBank,
}

impl Direct {
    pub fn new(cart: &[u8]) -> Self {
        Self {
            rom: rom_banks(cart, 2),
            ram: RamBank::new(),
        }
    }

    pub fn ram(&self) -> &[u8] {
        &self.ram.0[..]
    }

    pub(super) fn ram_mut(&mut self) -> &mut [u8] {
        &mut self.ram.0[..]
    }

    pub fn read_byte(&self, index: u16) -> u8 {
        match index {
            0x0000..0x4000 => bank_byte(&self.rom, 0, index),
            0x4000..0x8000 => bank_byte(&self.rom, 1, index),
            0xA000..0xC000 => self.ram[index],
            _ => 0xFF,
        }
    }

    /// There are no registers to write to, so only RAM writes have an effect.
    pub fn write_byte(&mut self, index: u16, value: u8) {
        if let 0xA000..0xC000 = index {
            self.ram[index] = value;
        }
    }
}
