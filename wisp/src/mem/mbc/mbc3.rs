use std::fmt::Display;

use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::info;

use super::RamBank;
use super::RomBank;
use super::bank_byte;
use super::bank_byte_mut;
use super::ram_banks;
use super::rom_banks;

/// The clock registers of this chip are not emulated. Writes to the latch range and RTC register
/// selects are ignored.
#[derive(Debug, Hash, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MBC3 {
    rom: Box<[RomBank]>,
    ram: Box<[RamBank]>,
    rom_bank: u8,
    ram_bank: u8,
    ram_enabled: bool,
    rom_index_mask: u8,
}

impl Display for MBC3 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "MBC3 {{")?;
        writeln!(f, "  RAMG:  {}", self.ram_enabled)?;
        writeln!(f, "  ROM:   0x{:0>2X} of {}", self.rom_bank, self.rom.len())?;
        writeln!(f, "  RAM:   0x{:0>2X} of {}", self.ram_bank, self.ram.len())?;
        write!(f, "}}")
    }
}

impl MBC3 {
    pub fn new(rom_count: usize, ram_count: usize, cart: &[u8]) -> Self {
        info!("MBC3 with {rom_count} ROM banks and {ram_count} RAM banks");
        Self {
            rom: rom_banks(cart, rom_count),
            ram: ram_banks(ram_count),
            rom_bank: 1,
            ram_bank: 0,
            ram_enabled: false,
            rom_index_mask: rom_count.saturating_sub(1) as u8,
        }
    }

    pub(super) fn ram_banks(&self) -> &[RamBank] {
        &self.ram
    }

    pub(super) fn ram_banks_mut(&mut self) -> &mut [RamBank] {
        &mut self.ram
    }

    pub(super) fn reset(&mut self) {
        self.rom_bank = 1;
        self.ram_bank = 0;
        self.ram_enabled = false;
    }

    pub fn read_byte(&self, index: u16) -> u8 {
        match index {
            0x0000..0x4000 => bank_byte(&self.rom, 0, index),
            0x4000..0x8000 => bank_byte(&self.rom, self.rom_bank as usize, index),
            0xA000..0xC000 if self.ram_enabled => {
                bank_byte(&self.ram, self.ram_bank as usize, index)
            }
            _ => 0xFF,
        }
    }

    pub fn write_byte(&mut self, index: u16, value: u8) {
        match index {
            0x0000..0x2000 => self.ram_enabled = (value & 0x0F) == 0x0A,
            0x2000..0x4000 => {
                // Bank 0 is never mapped here, even when the mask wraps a bank onto it
                self.rom_bank = match value & 0x7F & self.rom_index_mask {
                    0 => 1,
                    bank => bank,
                };
                debug!("MBC3 switched to ROM bank 0x{:0>2X}", self.rom_bank);
            }
            0x4000..0x6000 => {
                if value <= 0x03 && self.ram.len() > 1 {
                    self.ram_bank = value;
                    debug!("MBC3 switched to RAM bank {}", self.ram_bank);
                }
            }
            // Latches the clock
            0x6000..0x8000 => {}
            0xA000..0xC000 if self.ram_enabled => {
                if let Some(byte) = bank_byte_mut(&mut self.ram, self.ram_bank as usize, index) {
                    *byte = value;
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::MBC3;
    use crate::mem::mbc::tests::cart;

    #[test]
    fn rom_banking() {
        let mut mbc = MBC3::new(128, 0, &cart(0x11, 0x06, 0x00));
        assert_eq!(mbc.read_byte(0x4000), 0x01);
        mbc.write_byte(0x2000, 0x00);
        assert_eq!(mbc.read_byte(0x4000), 0x01);
        mbc.write_byte(0x2000, 0x45);
        assert_eq!(mbc.read_byte(0x4000), 0x45);
        // Bit 7 is not wired
        mbc.write_byte(0x2000, 0xC5);
        assert_eq!(mbc.read_byte(0x4000), 0x45);
        mbc.write_byte(0x2000, 0x80);
        assert_eq!(mbc.read_byte(0x4000), 0x01);
        assert_eq!(mbc.read_byte(0x0000), 0x00);
    }

    #[test]
    fn masked_bank_is_never_zero() {
        let mut mbc = MBC3::new(4, 0, &cart(0x11, 0x01, 0x00));
        mbc.write_byte(0x2000, 0x06);
        assert_eq!(mbc.read_byte(0x4000), 0x02);
        mbc.write_byte(0x2000, 0x04);
        assert_eq!(mbc.rom_bank, 1);
        assert_eq!(mbc.read_byte(0x4000), 0x01);
    }

    #[test]
    fn ram_banking() {
        let mut mbc = MBC3::new(4, 4, &cart(0x13, 0x01, 0x03));
        mbc.write_byte(0x0000, 0x0A);
        mbc.write_byte(0x4000, 0x03);
        mbc.write_byte(0xBFFF, 0x77);
        // RTC register selects are ignored
        mbc.write_byte(0x4000, 0x08);
        assert_eq!(mbc.read_byte(0xBFFF), 0x77);
        mbc.write_byte(0x4000, 0x00);
        assert_eq!(mbc.read_byte(0xBFFF), 0x00);
        mbc.write_byte(0x0000, 0x00);
        assert_eq!(mbc.read_byte(0xBFFF), 0xFF);
    }
}
