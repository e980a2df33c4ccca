use serde::Deserialize;
use serde::Serialize;
use tracing::warn;

use crate::error::CartridgeError;

/// This struct represents the parts of a cartridge header that the console cares about. Per the
/// Pan Docs, the header of the ROM occupies the region between `0x100` and `0x14F`.
#[derive(Debug, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartridgeHeader {
    /// The memory region between `0x134` and `0x142`, up to the first null byte.
    pub title: String,
    /// The byte at `0x143`. `0x80` and `0xC0` mark a cartridge that uses color features.
    pub color_flag: u8,
    /// The byte at `0x147`, which names the memory bank controller and any extra hardware.
    pub cartridge_type: u8,
    /// The byte at `0x148`. The ROM holds `2 << rom_size` banks of 16 KiB.
    pub rom_size: u8,
    /// The byte at `0x149`. How this maps to a number of RAM banks depends on the controller.
    pub ram_size: u8,
    /// The byte at `0x14D`. The boot ROM refuses to start a cartridge whose header does not
    /// match this checksum, which is computed as:
    /// ```text
    /// let mut checksum = 0u8;
    /// for b in rom[0x134..0x14D] {
    ///     checksum = checksum - b - 1;
    /// }
    /// ```
    pub header_checksum: u8,
}

impl CartridgeHeader {
    pub const START_ADDR: usize = 0x100;
    pub const END_ADDR: usize = 0x14F;

    /// Pulls the header out of a full ROM image. A checksum mismatch is only reported, since
    /// plenty of homebrew and test ROMs never bother to fix it up.
    pub fn parse(rom: &[u8]) -> Result<Self, CartridgeError> {
        if rom.len() <= Self::END_ADDR {
            return Err(CartridgeError::TruncatedHeader { len: rom.len() });
        }
        let title = rom[0x134..=0x142]
            .iter()
            .take_while(|&&b| b != 0)
            .map(|&b| b as char)
            .collect();
        let rom_size = rom[0x148];
        if rom_size > 0x08 {
            return Err(CartridgeError::UnsupportedRomSize(rom_size));
        }
        let header = Self {
            title,
            color_flag: rom[0x143],
            cartridge_type: rom[0x147],
            rom_size,
            ram_size: rom[0x149],
            header_checksum: rom[0x14D],
        };
        let digest = Self::checksum(rom);
        if digest != header.header_checksum {
            warn!(
                "Header checksum mismatch for '{}': expected 0x{:0>2X}, computed 0x{digest:0>2X}",
                header.title, header.header_checksum
            );
        }
        Ok(header)
    }

    /// Computes the header checksum over `0x134..0x14D`.
    pub fn checksum(rom: &[u8]) -> u8 {
        rom.get(0x134..0x14D)
            .unwrap_or_default()
            .iter()
            .fold(0u8, |acc, b| acc.wrapping_sub(*b).wrapping_sub(1))
    }

    /// The number of 16 KiB ROM banks the header declares.
    pub const fn rom_banks(&self) -> usize {
        2 << self.rom_size
    }

    pub const fn is_color(&self) -> bool {
        matches!(self.color_flag, 0x80 | 0xC0)
    }

    /// Whether the external RAM is kept alive by a battery and should be persisted by the host.
    pub const fn has_battery(&self) -> bool {
        matches!(
            self.cartridge_type,
            0x03 | 0x06 | 0x0F | 0x10 | 0x13 | 0x1B | 0x1E
        )
    }
}
