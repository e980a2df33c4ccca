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
pub struct MBC1 {
    rom: Box<[RomBank]>,
    ram: Box<[RamBank]>,
    /// The full seven bit ROM bank mapped at 0x4000. The low five bits come from writes to
    /// 0x2000-0x3FFF and the upper two from writes to 0x4000-0x5FFF on large carts.
    rom_bank: u8,
    ram_bank: u8,
    /// Determines if RAM can be read from and written to. The actual hardware uses an 8-bit
    /// register, so RAM is enabled when the lower 4 bits are `0xA`.
    ///
    /// Initially set to `false`, any writes to the memory addresses 0x0000 through 0x1FFF write to
    /// this register.
    ram_enabled: bool,
    /// Set by writes to 0x6000 through 0x7FFF. Only the lowest bit is used.
    banking_mode: BankingMode,
    /// Calculated on construction and does not represent a register. Rather, it models the wiring
    /// to the banks on a cart. For example, if a cart only has four ROM banks, the highest needed
    /// index to a bank is three.
    ///
    /// This relies on the number of ROM banks being a power of two; otherwise, a simple bit
    /// mask would not work.
    rom_index_mask: u8,
}

impl Display for MBC1 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "MBC1 {{")?;
        writeln!(f, "  MODE:  {}", self.banking_mode)?;
        writeln!(f, "  RAMG:  {}", self.ram_enabled)?;
        writeln!(f, "  ROM:   0x{:0>2X} of {}", self.rom_bank, self.rom.len())?;
        writeln!(f, "  RAM:   0x{:0>2X} of {}", self.ram_bank, self.ram.len())?;
        write!(f, "}}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
pub enum BankingMode {
    /// The register at 0x4000 extends the ROM bank and RAM bank 0 is used.
    Rom = 0,
    /// The register at 0x4000 selects the RAM bank, and the 0x0000 window follows the upper ROM
    /// bank bits.
    Ram = 1,
}

impl BankingMode {
    fn from_byte(value: u8) -> Self {
        if (value & 0x1) == 0 {
            Self::Rom
        } else {
            Self::Ram
        }
    }
}

impl MBC1 {
    pub fn new(rom_count: usize, ram_count: usize, cart: &[u8]) -> Self {
        info!("MBC1 with {rom_count} ROM banks and {ram_count} RAM banks");
        Self {
            rom: rom_banks(cart, rom_count),
            ram: ram_banks(ram_count),
            rom_bank: 1,
            ram_bank: 0,
            ram_enabled: false,
            banking_mode: BankingMode::Rom,
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
        self.banking_mode = BankingMode::Rom;
    }

    #[inline]
    fn first_rom_bank(&self) -> usize {
        match self.banking_mode {
            BankingMode::Rom => 0,
            BankingMode::Ram => (self.rom_bank & 0x60) as usize,
        }
    }

    /// NOTE: This does *not* take RAM enablement into consideration.
    #[inline]
    fn ram_bank(&self) -> usize {
        match self.banking_mode {
            BankingMode::Rom => 0,
            BankingMode::Ram => self.ram_bank as usize,
        }
    }

    #[inline]
    pub fn read_byte(&self, index: u16) -> u8 {
        match index {
            0x0000..0x4000 => bank_byte(&self.rom, self.first_rom_bank(), index),
            0x4000..0x8000 => bank_byte(&self.rom, self.rom_bank as usize, index),
            0xA000..0xC000 if self.ram_enabled => bank_byte(&self.ram, self.ram_bank(), index),
            _ => 0xFF,
        }
    }

    /// Writes to a register or RAM bank
    #[inline]
    pub fn write_byte(&mut self, index: u16, value: u8) {
        match index {
            0x0000..0x2000 => self.ram_enabled = (value & 0x0F) == 0b1010,
            0x2000..0x4000 => {
                // Bank 0 is never mapped here, even when the mask wraps a bank onto it
                let low = std::cmp::max(0x1F & value & self.rom_index_mask, 1);
                self.rom_bank = (self.rom_bank & 0x60) | low;
                debug!("MBC1 switched to ROM bank 0x{:0>2X}", self.rom_bank);
            }
            0x4000..0x6000 => {
                if self.banking_mode == BankingMode::Rom && self.rom.len() >= 32 {
                    self.rom_bank = ((value & 0x03) << 5) | (self.rom_bank & 0x1F);
                    debug!("MBC1 switched to ROM bank 0x{:0>2X}", self.rom_bank);
                } else if self.ram.len() > 1 {
                    self.ram_bank = value & 0x03;
                    debug!("MBC1 switched to RAM bank {}", self.ram_bank);
                }
            }
            0x6000..0x8000 => {
                self.banking_mode = BankingMode::from_byte(value);
            }
            0xA000..0xC000 if self.ram_enabled => {
                let bank = self.ram_bank();
                if let Some(byte) = bank_byte_mut(&mut self.ram, bank, index) {
                    *byte = value;
                }
            }
            _ => {}
        }
    }
}
