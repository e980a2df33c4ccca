use std::fmt::Display;

use serde::Deserialize;
use serde::Serialize;
use serde_with::serde_as;
use tracing::debug;
use tracing::info;

use super::RomBank;
use super::bank_byte;
use super::rom_banks;

/// The number of half-bytes of RAM built into the MBC2 chip.
pub const MBC2_RAM_SIZE: usize = 512;

#[serde_as]
#[derive(Debug, Hash, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MBC2 {
    rom: Box<[RomBank]>,
    /// Only the lower four bits of each byte are wired up.
    #[serde_as(as = "serde_with::Bytes")]
    ram: [u8; MBC2_RAM_SIZE],
    rom_bank: u8,
    ram_enabled: bool,
}

impl Display for MBC2 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "MBC2 {{")?;
        writeln!(f, "  RAMG:  {}", self.ram_enabled)?;
        writeln!(f, "  ROM:   0x{:0>2X} of {}", self.rom_bank, self.rom.len())?;
        write!(f, "}}")
    }
}

impl MBC2 {
    pub fn new(rom_count: usize, cart: &[u8]) -> Self {
        info!("MBC2 with {rom_count} ROM banks");
        Self {
            rom: rom_banks(cart, rom_count),
            ram: [0; MBC2_RAM_SIZE],
            rom_bank: 1,
            ram_enabled: false,
        }
    }

    pub fn ram(&self) -> &[u8; MBC2_RAM_SIZE] {
        &self.ram
    }

    pub(super) fn ram_mut(&mut self) -> &mut [u8; MBC2_RAM_SIZE] {
        &mut self.ram
    }

    pub(super) fn reset(&mut self) {
        self.rom_bank = 1;
        self.ram_enabled = false;
    }

    pub fn read_byte(&self, index: u16) -> u8 {
        match index {
            0x0000..0x4000 => bank_byte(&self.rom, 0, index),
            0x4000..0x8000 => bank_byte(&self.rom, self.rom_bank as usize, index),
            0xA000..0xC000 if self.ram_enabled => {
                self.ram[index as usize & (MBC2_RAM_SIZE - 1)] | 0xF0
            }
            _ => 0xFF,
        }
    }

    /// The chip only has one register range. Bit 8 of the address picks which register is
    /// written.
    pub fn write_byte(&mut self, index: u16, value: u8) {
        match index {
            0x0000..0x4000 if index & 0x0100 != 0 => {
                self.rom_bank = std::cmp::max(value & 0x0F, 1);
                debug!("MBC2 switched to ROM bank 0x{:0>2X}", self.rom_bank);
            }
            0x0000..0x4000 => self.ram_enabled = value == 0x0A,
            0xA000..0xC000 if self.ram_enabled => {
                self.ram[index as usize & (MBC2_RAM_SIZE - 1)] = value & 0x0F;
            }
            _ => {}
        }
    }
}
