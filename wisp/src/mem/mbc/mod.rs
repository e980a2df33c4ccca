use std::fmt::Debug;
use std::ops::Index;
use std::ops::IndexMut;

mod direct;
mod header;
mod mbc1;
mod mbc2;
mod mbc3;
mod mbc5;

pub use direct::*;
pub use header::*;
pub use mbc1::*;
pub use mbc2::*;
pub use mbc3::*;
pub use mbc5::*;
use serde::Deserialize;
use serde::Serialize;
use serde_with::serde_as;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::error::CartridgeError;
use crate::error::Result;

/// The size of a ROM banks, 16 KiB.
pub const ROM_BANK_SIZE: usize = 16 * 1024;

/// The size of a RAM banks, 8 KiB.
pub const RAM_BANK_SIZE: usize = 8 * 1024;

/// A cartridge: its parsed header plus the controller chip that maps its ROM and RAM onto the
/// bus.
#[derive(Debug, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryBankController {
    header: CartridgeHeader,
    controller: Controller,
}

#[derive(Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub enum Controller {
    /// There is no external MBC. The game ROM is mapped into the 32 KiB that starts at 0x0000 and
    /// extends to 0x7FFF. An additional 8 KiB of RAM could be connected. This 8 KiB starts at
    /// 0xA000 and extends to 0xBFFF.
    ///
    /// See the spec [here](https://gbdev.io/pandocs/nombc.html).
    Direct(Direct),
    /// This memory controller is the first MBC chip. It supports up to 2 MiB of ROM and 32 KiB of
    /// RAM, but the upper two bank bits are shared between the ROM and RAM.
    ///
    /// See the spec [here](https://gbdev.io/pandocs/MBC1.html).
    MBC1(MBC1),
    /// Up to 256 KiB of ROM and a built-in 512 x 4-bit RAM.
    ///
    /// See the spec [here](https://gbdev.io/pandocs/MBC2.html).
    MBC2(MBC2),
    /// Up to 2 MiB of ROM and 32 KiB of RAM. The real-time clock is not emulated.
    ///
    /// See the spec [here](https://gbdev.io/pandocs/MBC3.html).
    MBC3(MBC3),
    /// Up to 8 MiB of ROM and 128 KiB of RAM.
    ///
    /// See the spec [here](https://gbdev.io/pandocs/MBC5.html).
    MBC5(MBC5),
}

impl MemoryBankController {
    /// Parses the header of the given image and constructs the controller it asks for.
    pub fn new(cart: Vec<u8>) -> Result<Self> {
        let header = CartridgeHeader::parse(&cart).inspect_err(|e| error!("{e}"))?;
        let rom_count = header.rom_banks();
        info!(
            "Loading '{}': cartridge type 0x{:0>2X}, {rom_count} ROM banks, RAM code 0x{:0>2X}",
            header.title, header.cartridge_type, header.ram_size
        );
        if cart.len() < rom_count * ROM_BANK_SIZE {
            warn!(
                "ROM image is {} bytes but the header declares {} bytes; padding with 0xFF",
                cart.len(),
                rom_count * ROM_BANK_SIZE
            );
        }

        let unsupported_ram = CartridgeError::UnsupportedRamSize {
            controller: header.cartridge_type,
            code: header.ram_size,
        };
        let controller = match header.cartridge_type {
            0x00 => match header.ram_size {
                0x00..=0x02 => Controller::Direct(Direct::new(&cart)),
                _ => return Err(unsupported_ram.into()),
            },
            0x01..=0x03 => {
                let ram_count = standard_ram_banks(header.ram_size).ok_or(unsupported_ram)?;
                Controller::MBC1(MBC1::new(rom_count, ram_count, &cart))
            }
            0x05 | 0x06 => match header.ram_size {
                0x00 => Controller::MBC2(MBC2::new(rom_count, &cart)),
                _ => return Err(unsupported_ram.into()),
            },
            0x0F..=0x13 => {
                let ram_count = standard_ram_banks(header.ram_size).ok_or(unsupported_ram)?;
                Controller::MBC3(MBC3::new(rom_count, ram_count, &cart))
            }
            0x19..=0x1E => {
                let ram_count = match header.ram_size {
                    0x04 => 16,
                    code => standard_ram_banks(code).ok_or(unsupported_ram)?,
                };
                Controller::MBC5(MBC5::new(rom_count, ram_count, &cart))
            }
            n => {
                error!("Unknown cartridge type: 0x{n:0>2X}");
                return Err(CartridgeError::UnknownController(n).into());
            }
        };
        Ok(Self { header, controller })
    }

    pub fn header(&self) -> &CartridgeHeader {
        &self.header
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    pub fn has_battery(&self) -> bool {
        self.header.has_battery()
    }

    /// Returns a copy of all of the external RAM, bank after bank. This is what a host should
    /// persist for battery-backed cartridges.
    pub fn ram(&self) -> Vec<u8> {
        match &self.controller {
            Controller::Direct(c) => c.ram().to_vec(),
            Controller::MBC1(c) => flatten(c.ram_banks()),
            Controller::MBC2(c) => c.ram().to_vec(),
            Controller::MBC3(c) => flatten(c.ram_banks()),
            Controller::MBC5(c) => flatten(c.ram_banks()),
        }
    }

    /// Overwrites the external RAM with the given bytes, usually a save file. Extra bytes are
    /// ignored and missing bytes leave the RAM untouched.
    pub fn load_ram(&mut self, data: &[u8]) {
        let len = self.ram().len();
        if data.len() != len {
            warn!("Save data is {} bytes, but the cartridge has {len} bytes of RAM", data.len());
        }
        match &mut self.controller {
            Controller::Direct(c) => copy_into(c.ram_mut(), data),
            Controller::MBC1(c) => fill_banks(c.ram_banks_mut(), data),
            Controller::MBC2(c) => c
                .ram_mut()
                .iter_mut()
                .zip(data)
                .for_each(|(slot, b)| *slot = b & 0x0F),
            Controller::MBC3(c) => fill_banks(c.ram_banks_mut(), data),
            Controller::MBC5(c) => fill_banks(c.ram_banks_mut(), data),
        }
    }

    /// Puts the bank registers back into their power-on state. External RAM is kept.
    pub fn reset(&mut self) {
        match &mut self.controller {
            Controller::Direct(_) => {}
            Controller::MBC1(c) => c.reset(),
            Controller::MBC2(c) => c.reset(),
            Controller::MBC3(c) => c.reset(),
            Controller::MBC5(c) => c.reset(),
        }
    }

    pub fn read_byte(&self, index: u16) -> u8 {
        match &self.controller {
            Controller::Direct(c) => c.read_byte(index),
            Controller::MBC1(c) => c.read_byte(index),
            Controller::MBC2(c) => c.read_byte(index),
            Controller::MBC3(c) => c.read_byte(index),
            Controller::MBC5(c) => c.read_byte(index),
        }
    }

    pub fn write_byte(&mut self, index: u16, value: u8) {
        match &mut self.controller {
            Controller::Direct(c) => c.write_byte(index, value),
            Controller::MBC1(c) => c.write_byte(index, value),
            Controller::MBC2(c) => c.write_byte(index, value),
            Controller::MBC3(c) => c.write_byte(index, value),
            Controller::MBC5(c) => c.write_byte(index, value),
        }
    }
}

impl Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Controller::Direct(c) => write!(f, "Direct {{ ram_size: {} }}", c.ram().len()),
            Controller::MBC1(c) => write!(f, "{c}"),
            Controller::MBC2(c) => write!(f, "{c}"),
            Controller::MBC3(c) => write!(f, "{c}"),
            Controller::MBC5(c) => write!(f, "{c}"),
        }
    }
}

/// The number of 8 KiB RAM banks for the RAM size codes shared by MBC1, MBC3, and MBC5.
fn standard_ram_banks(code: u8) -> Option<usize> {
    match code {
        0x00 => Some(0),
        0x02 => Some(1),
        0x03 => Some(4),
        _ => None,
    }
}

fn flatten(banks: &[RamBank]) -> Vec<u8> {
    banks.iter().flat_map(|bank| bank.0.iter().copied()).collect()
}

fn fill_banks(banks: &mut [RamBank], data: &[u8]) {
    banks
        .iter_mut()
        .zip(data.chunks(RAM_BANK_SIZE))
        .for_each(|(bank, chunk)| copy_into(&mut bank.0[..], chunk));
}

fn copy_into(dest: &mut [u8], src: &[u8]) {
    dest.iter_mut().zip(src).for_each(|(slot, b)| *slot = *b);
}

/// Splits a cartridge image into `count` banks. Any bank the image is too short to fill is padded
/// with 0xFF, like an unconnected data bus.
pub(crate) fn rom_banks(cart: &[u8], count: usize) -> Box<[RomBank]> {
    (0..count)
        .map(|i| {
            cart.get(i * ROM_BANK_SIZE..)
                .unwrap_or_default()
                .iter()
                .copied()
                .collect()
        })
        .collect()
}

pub(crate) fn ram_banks(count: usize) -> Box<[RamBank]> {
    vec![RamBank::new(); count].into()
}

/// Reads a byte out of a bank, returning 0xFF if the bank does not exist.
pub(crate) fn bank_byte<B: Index<u16, Output = u8>>(banks: &[B], bank: usize, index: u16) -> u8 {
    banks.get(bank).map_or(0xFF, |b| b[index])
}

pub(crate) fn bank_byte_mut(banks: &mut [RamBank], bank: usize, index: u16) -> Option<&mut u8> {
    banks.get_mut(bank).map(|b| &mut b[index])
}

/// 16 KiB of ROM. Indexing masks the address down into the bank, so both `0x0123` and `0x4123`
/// name the same byte.
#[serde_as]
#[derive(Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct RomBank(#[serde_as(as = "serde_with::Bytes")] Box<[u8; ROM_BANK_SIZE]>);

impl FromIterator<u8> for RomBank {
    fn from_iter<T: IntoIterator<Item = u8>>(iter: T) -> Self {
        let mut data = Box::new([0xFF; ROM_BANK_SIZE]);
        data.iter_mut().zip(iter).for_each(|(slot, b)| *slot = b);
        Self(data)
    }
}

impl Index<u16> for RomBank {
    type Output = u8;

    fn index(&self, index: u16) -> &Self::Output {
        &self.0[index as usize & (ROM_BANK_SIZE - 1)]
    }
}

impl Debug for RomBank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RomBank({} bytes)", self.0.len())
    }
}

/// 8 KiB of external RAM, indexed the same way as a `RomBank`.
#[serde_as]
#[derive(Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct RamBank(#[serde_as(as = "serde_with::Bytes")] Box<[u8; RAM_BANK_SIZE]>);

impl RamBank {
    pub fn new() -> Self {
        Self(Box::new([0; RAM_BANK_SIZE]))
    }
}

impl Default for RamBank {
    fn default() -> Self {
        Self::new()
    }
}

impl Index<u16> for RamBank {
    type Output = u8;

    fn index(&self, index: u16) -> &Self::Output {
        &self.0[index as usize & (RAM_BANK_SIZE - 1)]
    }
}

impl IndexMut<u16> for RamBank {
    fn index_mut(&mut self, index: u16) -> &mut Self::Output {
        &mut self.0[index as usize & (RAM_BANK_SIZE - 1)]
    }
}

impl Debug for RamBank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RamBank({} bytes)", self.0.len())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::CartridgeHeader;
    use super::Controller;
    use super::MemoryBankController;
    use super::ROM_BANK_SIZE;
    use crate::error::CartridgeError;
    use crate::error::Error;

    /// Builds an image where every byte of a bank holds that bank's index.
    pub(crate) fn cart(cartridge_type: u8, rom_size: u8, ram_size: u8) -> Vec<u8> {
        let banks = 2usize << rom_size;
        let mut rom: Vec<u8> = (0..banks)
            .flat_map(|i| std::iter::repeat_n(i as u8, ROM_BANK_SIZE))
            .collect();
        rom[0x134..0x144].fill(0);
        rom[0x134..0x138].copy_from_slice(b"TEST");
        rom[0x147] = cartridge_type;
        rom[0x148] = rom_size;
        rom[0x149] = ram_size;
        rom[0x14D] = CartridgeHeader::checksum(&rom);
        rom
    }

    #[test]
    fn controller_selection() {
        let kind = |ty, ram| {
            MemoryBankController::new(cart(ty, 0x01, ram))
                .map(|mbc| std::mem::discriminant(mbc.controller()))
        };
        let direct = MemoryBankController::new(cart(0x00, 0x00, 0x00)).unwrap();
        assert!(matches!(direct.controller(), Controller::Direct(_)));
        assert!(matches!(
            MemoryBankController::new(cart(0x03, 0x01, 0x03)).unwrap().controller(),
            Controller::MBC1(_)
        ));
        assert!(matches!(
            MemoryBankController::new(cart(0x06, 0x01, 0x00)).unwrap().controller(),
            Controller::MBC2(_)
        ));
        assert!(matches!(
            MemoryBankController::new(cart(0x13, 0x01, 0x03)).unwrap().controller(),
            Controller::MBC3(_)
        ));
        assert!(matches!(
            MemoryBankController::new(cart(0x1B, 0x01, 0x04)).unwrap().controller(),
            Controller::MBC5(_)
        ));
        assert_eq!(kind(0x01, 0x02).ok(), kind(0x02, 0x00).ok());
    }

    #[test]
    fn unsupported_cartridges() {
        let err = MemoryBankController::new(cart(0xFC, 0x00, 0x00)).unwrap_err();
        assert_eq!(
            err,
            Error::UnsupportedCartridge(CartridgeError::UnknownController(0xFC))
        );
        let err = MemoryBankController::new(cart(0x01, 0x00, 0x04)).unwrap_err();
        assert_eq!(
            err,
            Error::UnsupportedCartridge(CartridgeError::UnsupportedRamSize {
                controller: 0x01,
                code: 0x04
            })
        );
        let err = MemoryBankController::new(cart(0x05, 0x00, 0x02)).unwrap_err();
        assert!(matches!(
            err,
            Error::UnsupportedCartridge(CartridgeError::UnsupportedRamSize { .. })
        ));
        let err = MemoryBankController::new(vec![0; 0x80]).unwrap_err();
        assert_eq!(
            err,
            Error::UnsupportedCartridge(CartridgeError::TruncatedHeader { len: 0x80 })
        );
    }

    #[test]
    fn short_images_are_padded() {
        let mut rom = cart(0x01, 0x00, 0x00);
        rom[0x148] = 0x02;
        rom[0x14D] = CartridgeHeader::checksum(&rom);
        let mut mbc = MemoryBankController::new(rom).unwrap();
        mbc.write_byte(0x2000, 0x07);
        assert_eq!(mbc.read_byte(0x4000), 0xFF);
        mbc.write_byte(0x2000, 0x01);
        assert_eq!(mbc.read_byte(0x4000), 0x01);
    }

    #[test]
    fn battery_ram_round_trip() {
        let mut mbc = MemoryBankController::new(cart(0x03, 0x01, 0x03)).unwrap();
        assert!(mbc.has_battery());
        assert_eq!(mbc.ram().len(), 4 * super::RAM_BANK_SIZE);
        let save: Vec<u8> = (0..mbc.ram().len()).map(|i| (i % 251) as u8).collect();
        mbc.load_ram(&save);
        assert_eq!(mbc.ram(), save);

        let mbc = MemoryBankController::new(cart(0x01, 0x01, 0x02)).unwrap();
        assert!(!mbc.has_battery());
    }

    #[test]
    fn reset_keeps_ram() {
        let mut mbc = MemoryBankController::new(cart(0x1B, 0x02, 0x03)).unwrap();
        mbc.write_byte(0x0000, 0x0A);
        mbc.write_byte(0xA000, 0x42);
        mbc.write_byte(0x2000, 0x05);
        mbc.reset();
        assert_eq!(mbc.read_byte(0x4000), 0x01);
        mbc.write_byte(0x0000, 0x0A);
        assert_eq!(mbc.read_byte(0xA000), 0x42);
    }
}
