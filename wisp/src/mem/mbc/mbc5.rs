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

#[derive(Debug, Hash, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MBC5 {
    rom: Box<[RomBank]>,
    ram: Box<[RamBank]>,
    /// A nine bit bank index. Unlike the other controllers, bank 0 can be mapped at 0x4000.
    rom_bank: u16,
    ram_bank: u8,
    ram_enabled: bool,
}

impl Display for MBC5 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "MBC5 {{")?;
        writeln!(f, "  RAMG:  {}", self.ram_enabled)?;
        writeln!(f, "  ROM:   0x{:0>3X} of {}", self.rom_bank, self.rom.len())?;
        writeln!(f, "  RAM:   0x{:0>2X} of {}", self.ram_bank, self.ram.len())?;
        write!(f, "}}")
    }
}

impl MBC5 {
    pub fn new(rom_count: usize, ram_count: usize, cart: &[u8]) -> Self {
        info!("MBC5 with {rom_count} ROM banks and {ram_count} RAM banks");
        Self {
            rom: rom_banks(cart, rom_count),
            ram: ram_banks(ram_count),
            rom_bank: 1,
            ram_bank: 0,
            ram_enabled: false,
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
            0x2000..0x3000 => {
                self.rom_bank = (self.rom_bank & 0x100) | value as u16;
                debug!("MBC5 switched to ROM bank 0x{:0>3X}", self.rom_bank);
            }
            0x3000..0x4000 => {
                self.rom_bank = ((value as u16 & 0x01) << 8) | (self.rom_bank & 0xFF);
                debug!("MBC5 switched to ROM bank 0x{:0>3X}", self.rom_bank);
            }
            0x4000..0x6000 => {
                self.ram_bank = value & 0x0F;
                debug!("MBC5 switched to RAM bank {}", self.ram_bank);
            }
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
    use super::MBC5;
    use crate::mem::mbc::RomBank;
    use crate::mem::mbc::ram_banks;
    use crate::mem::mbc::tests::cart;

    #[test]
    fn bank_zero_is_mappable() {
        let mut mbc = MBC5::new(4, 0, &cart(0x19, 0x01, 0x00));
        assert_eq!(mbc.read_byte(0x4000), 0x01);
        mbc.write_byte(0x2000, 0x00);
        assert_eq!(mbc.read_byte(0x4000), 0x00);
        mbc.write_byte(0x2000, 0x03);
        assert_eq!(mbc.read_byte(0x7FFF), 0x03);
        // Past the end of the image
        mbc.write_byte(0x2000, 0x04);
        assert_eq!(mbc.read_byte(0x4000), 0xFF);
    }

    #[test]
    fn nine_bit_bank() {
        let rom = (0..512u16)
            .map(|i| RomBank::from_iter(std::iter::repeat((i >> 1) as u8)))
            .collect();
        let mut mbc = MBC5 {
            rom,
            ram: ram_banks(0),
            rom_bank: 1,
            ram_bank: 0,
            ram_enabled: false,
        };
        mbc.write_byte(0x2000, 0x02);
        mbc.write_byte(0x3000, 0x01);
        assert_eq!(mbc.rom_bank, 0x102);
        assert_eq!(mbc.read_byte(0x4000), 0x81);
        mbc.write_byte(0x2000, 0xFF);
        assert_eq!(mbc.rom_bank, 0x1FF);
        mbc.write_byte(0x3000, 0xFE);
        assert_eq!(mbc.rom_bank, 0x0FF);
    }

    #[test]
    fn sixteen_ram_banks() {
        let mut mbc = MBC5::new(2, 16, &cart(0x1A, 0x00, 0x04));
        mbc.write_byte(0x0000, 0x0A);
        for bank in 0..16 {
            mbc.write_byte(0x4000, bank);
            mbc.write_byte(0xA000, bank + 0x10);
        }
        mbc.write_byte(0x4000, 0x1C);
        assert_eq!(mbc.read_byte(0xA000), 0x1C);
        mbc.write_byte(0x4000, 0x00);
        assert_eq!(mbc.read_byte(0xA000), 0x10);
    }
}
