use serde::Deserialize;
use serde::Serialize;
use serde_with::serde_as;
use tracing::debug;
use tracing::error;
use tracing::trace;

use crate::error::Error;
use crate::error::Result;
use crate::instruction::InterruptOp;

pub mod io;
pub mod mbc;

pub use io::InterruptFlags;
pub use io::Peripheral;
pub use io::PeripheralSlot;
pub use mbc::CartridgeHeader;
pub use mbc::MemoryBankController;

use io::IoRegisters;

/// This trait is used to abstract over the memory map. This is used during testing.
pub trait MemoryLike {
    fn read_byte(&self, addr: u16) -> Result<u8>;

    fn write_byte(&mut self, addr: u16, val: u8) -> Result<()>;

    /// The interrupts that are both requested (IF) and enabled (IE).
    fn pending_interrupts(&self) -> Result<u8> {
        Ok(self.read_byte(0xFFFF)? & self.read_byte(0xFF0F)? & 0x1F)
    }

    fn clear_interrupt_req(&mut self, op: InterruptOp) -> Result<()> {
        let flags = self.read_byte(0xFF0F)?;
        self.write_byte(0xFF0F, flags & !op.flag())
    }

    /// Whether the game has asked for a speed switch via KEY1.
    fn speed_switch_armed(&self) -> Result<bool> {
        Ok(self.read_byte(0xFF4D)? & 0x01 != 0)
    }

    /// Reads the current CPU speed out of KEY1.
    fn double_speed(&self) -> Result<bool> {
        Ok(self.read_byte(0xFF4D)? & 0x80 != 0)
    }

    /// Records the new CPU speed in KEY1 and disarms the switch.
    fn switch_speed(&mut self, double: bool) -> Result<()> {
        self.write_byte(0xFF4D, (double as u8) << 7)
    }
}

/// The `impl FnOnce` in `update_byte` would make `MemoryLike` non-object safe, so the helpers that
/// are built on top of reads and writes live here.
pub trait MemoryLikeExt: MemoryLike {
    /// Reads a byte, passes it through `update`, and writes back the result, which is returned.
    fn update_byte(&mut self, addr: u16, update: impl FnOnce(u8) -> u8) -> Result<u8> {
        let val = update(self.read_byte(addr)?);
        self.write_byte(addr, val)?;
        Ok(val)
    }

    /// Reads a little-endian word. The address of the high byte wraps around.
    fn read_word(&self, addr: u16) -> Result<u16> {
        let lo = self.read_byte(addr)?;
        let hi = self.read_byte(addr.wrapping_add(1))?;
        Ok(u16::from_le_bytes([lo, hi]))
    }

    fn write_word(&mut self, addr: u16, val: u16) -> Result<()> {
        let [lo, hi] = val.to_le_bytes();
        self.write_byte(addr, lo)?;
        self.write_byte(addr.wrapping_add(1), hi)
    }
}

impl<M: MemoryLike + ?Sized> MemoryLikeExt for M {}

/// The number of switchable work RAM banks in color mode, plus the fixed bank.
pub const WRAM_BANKS: usize = 8;

#[serde_as]
#[derive(Debug, Serialize, Deserialize)]
pub struct MemoryMap {
    // The MBC. Nothing on the bus can be accessed until this is mounted.
    mbc: Option<MemoryBankController>,
    // The video RAM
    #[serde_as(as = "serde_with::Bytes")]
    vram: [u8; 0x2000],
    // The working RAM. Bank 0 is fixed at 0xC000 and the selected bank is at 0xD000.
    #[serde(serialize_with = "crate::utils::serialize_slices_as_one")]
    #[serde(deserialize_with = "crate::utils::deserialize_slices_as_one")]
    wram: [[u8; 0x1000]; WRAM_BANKS],
    // The object attribute memory
    #[serde_as(as = "serde_with::Bytes")]
    oam: [u8; 0xA0],
    io: IoRegisters,
    // High RAM
    #[serde_as(as = "serde_with::Bytes")]
    hr: [u8; 0x7F],
    /// The interrupt enable register. Bits 0-4 flag where or not certain interrupt handlers can be
    /// called.
    ///  - Bit 0 corresponds to the VBlank interrupt
    ///  - Bit 1 corresponds to the LCD interrupt
    ///  - Bit 2 corresponds to the timer interrupt
    ///  - Bit 3 corresponds to the serial interrupt
    ///  - Bit 4 corresponds to the joypad interrupt
    /// When indexed, this register is at 0xFFFF.
    pub ie: u8,
}

impl MemoryLike for MemoryMap {
    fn read_byte(&self, addr: u16) -> Result<u8> {
        let mbc = self.mbc()?;
        let byte = match addr {
            n @ 0x0000..=0x7FFF => mbc.read_byte(n),
            n @ 0x8000..=0x9FFF => self.vram[n as usize - 0x8000],
            n @ 0xA000..=0xBFFF => mbc.read_byte(n),
            n @ 0xC000..=0xCFFF => self.wram[0][n as usize - 0xC000],
            n @ 0xD000..=0xDFFF => self.wram[self.io.wram_bank()][n as usize - 0xD000],
            // Echo RAM
            n @ 0xE000..=0xEFFF => self.wram[0][n as usize - 0xE000],
            n @ 0xF000..=0xFDFF => self.wram[self.io.wram_bank()][n as usize - 0xF000],
            n @ 0xFE00..=0xFE9F => self.oam[n as usize - 0xFE00],
            // NOTE: This region *should not* actually be accessed
            0xFEA0..=0xFEFF => 0xFF,
            n @ 0xFF00..=0xFF7F => self.io.read_byte(n),
            n @ 0xFF80..=0xFFFE => self.hr[n as usize - 0xFF80],
            0xFFFF => self.ie,
        };
        Ok(byte)
    }

    fn write_byte(&mut self, addr: u16, val: u8) -> Result<()> {
        self.mbc()?;
        trace!("Writing 0x{val:0>2X} to 0x{addr:0>4X}");
        match addr {
            n @ (0x0000..=0x7FFF | 0xA000..=0xBFFF) => {
                if let Some(mbc) = self.mbc.as_mut() {
                    mbc.write_byte(n, val)
                }
            }
            n @ 0x8000..=0x9FFF => self.vram[n as usize - 0x8000] = val,
            n @ 0xC000..=0xCFFF => self.wram[0][n as usize - 0xC000] = val,
            n @ 0xD000..=0xDFFF => self.wram[self.io.wram_bank()][n as usize - 0xD000] = val,
            // Echo RAM
            n @ 0xE000..=0xEFFF => self.wram[0][n as usize - 0xE000] = val,
            n @ 0xF000..=0xFDFF => self.wram[self.io.wram_bank()][n as usize - 0xF000] = val,
            n @ 0xFE00..=0xFE9F => self.oam[n as usize - 0xFE00] = val,
            // NOTE: This region *should not* actually be accessed
            0xFEA0..=0xFEFF => {}
            0xFF46 => {
                self.io.write_byte(addr, val);
                self.dma(val)?;
            }
            n @ 0xFF00..=0xFF7F => self.io.write_byte(n, val),
            n @ 0xFF80..=0xFFFE => self.hr[n as usize - 0xFF80] = val,
            0xFFFF => self.ie = val,
        }
        Ok(())
    }

    fn pending_interrupts(&self) -> Result<u8> {
        self.mbc()?;
        Ok(self.ie & self.io.interrupt_flags.bits() & 0x1F)
    }

    fn clear_interrupt_req(&mut self, op: InterruptOp) -> Result<()> {
        self.mbc()?;
        self.io.clear_interrupt_req(op);
        Ok(())
    }

    fn switch_speed(&mut self, double: bool) -> Result<()> {
        self.mbc()?;
        self.io.switch_speed(double);
        Ok(())
    }
}

impl MemoryMap {
    /// Constructs an empty bus. Every access fails until a cartridge is mounted.
    pub fn new() -> Self {
        Self {
            mbc: None,
            vram: [0; 0x2000],
            wram: [[0; 0x1000]; WRAM_BANKS],
            oam: [0; 0xA0],
            io: IoRegisters::default(),
            hr: [0; 0x7F],
            ie: 0,
        }
    }

    /// Constructs a bus with the given cartridge already mounted.
    pub fn with_cartridge(mbc: MemoryBankController) -> Self {
        let mut digest = Self::new();
        digest.mount(mbc);
        digest
    }

    fn mbc(&self) -> Result<&MemoryBankController> {
        self.mbc.as_ref().ok_or_else(|| {
            error!("Attempted to access the bus before mounting a cartridge");
            Error::UninitializedBus
        })
    }

    /// Mounts a cartridge, returning the previously mounted one (if any). The cartridge header
    /// decides whether or not color-only registers are available.
    pub fn mount(&mut self, mbc: MemoryBankController) -> Option<MemoryBankController> {
        self.io.color = mbc.header().is_color();
        debug!(
            "Mounting '{}' in {} mode",
            mbc.header().title,
            if self.io.color { "color" } else { "monochrome" }
        );
        self.mbc.replace(mbc)
    }

    pub fn eject(&mut self) -> Option<MemoryBankController> {
        self.io.color = false;
        self.mbc.take()
    }

    pub fn cartridge(&self) -> Option<&MemoryBankController> {
        self.mbc.as_ref()
    }

    pub fn cartridge_mut(&mut self) -> Option<&mut MemoryBankController> {
        self.mbc.as_mut()
    }

    pub fn is_color(&self) -> bool {
        self.io.color
    }

    /// Whether the CPU is running in double-speed mode, per KEY1.
    pub fn is_double_speed(&self) -> bool {
        self.io.double_speed()
    }

    pub fn interrupt_flags(&self) -> InterruptFlags {
        self.io.interrupt_flags
    }

    pub fn request_interrupt(&mut self, op: InterruptOp) {
        self.io.request_interrupt(op)
    }

    /// Copies 160 bytes starting at `page << 8` into OAM. Unlike the hardware, the transfer
    /// finishes immediately.
    pub fn dma(&mut self, page: u8) -> Result<()> {
        debug!("OAM DMA from 0x{page:0>2X}00");
        let src = (page as u16) << 8;
        for i in 0..self.oam.len() {
            self.oam[i] = self.read_byte(src.wrapping_add(i as u16))?;
        }
        Ok(())
    }

    /// Advances every attached peripheral by the given number of machine cycles.
    pub fn step_peripherals(&mut self, cycles: u32) {
        self.io.step_peripherals(cycles)
    }

    /// Attaches a peripheral to the given slot, returning the one that was there before.
    pub fn attach(
        &mut self,
        slot: PeripheralSlot,
        peripheral: Box<dyn Peripheral>,
    ) -> Option<Box<dyn Peripheral>> {
        debug!("Attaching {slot} peripheral");
        self.io.peripherals.slot_mut(slot).replace(peripheral)
    }

    pub fn attach_timer<P: Peripheral + 'static>(&mut self, timer: P) {
        self.attach(PeripheralSlot::Timer, Box::new(timer));
    }

    pub fn attach_input<P: Peripheral + 'static>(&mut self, input: P) {
        self.attach(PeripheralSlot::Input, Box::new(input));
    }

    pub fn attach_audio<P: Peripheral + 'static>(&mut self, audio: P) {
        self.attach(PeripheralSlot::Audio, Box::new(audio));
    }

    pub fn attach_graphics<P: Peripheral + 'static>(&mut self, graphics: P) {
        self.attach(PeripheralSlot::Graphics, Box::new(graphics));
    }

    pub fn detach(&mut self, slot: PeripheralSlot) -> Option<Box<dyn Peripheral>> {
        self.io.peripherals.slot_mut(slot).take()
    }

    pub fn peripheral(&self, slot: PeripheralSlot) -> Option<&dyn Peripheral> {
        self.io.peripherals.slot(slot)
    }

    /// Clears all RAM and registers, resets all attached peripherals, and puts the cartridge's
    /// bank registers back into their power-on state.
    pub fn reset(&mut self) {
        self.vram = [0; 0x2000];
        self.wram = [[0; 0x1000]; WRAM_BANKS];
        self.oam = [0; 0xA0];
        self.hr = [0; 0x7F];
        self.ie = 0;
        self.io.reset();
        if let Some(mbc) = self.mbc.as_mut() {
            mbc.reset();
        }
    }
}

impl Default for MemoryMap {
    fn default() -> Self {
        Self::new()
    }
}

/// A flat 64 KiB of memory, which makes writing CPU tests easier.
#[cfg(test)]
impl MemoryLike for Vec<u8> {
    fn read_byte(&self, addr: u16) -> Result<u8> {
        Ok(self.get(addr as usize).copied().unwrap_or(0xFF))
    }

    fn write_byte(&mut self, addr: u16, val: u8) -> Result<()> {
        if let Some(byte) = self.get_mut(addr as usize) {
            *byte = val;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::Mutex;

    use super::*;
    use crate::mem::mbc::tests::cart;

    fn mounted(color: bool) -> MemoryMap {
        let mut rom = cart(0x01, 0x01, 0x02);
        if color {
            rom[0x143] = 0x80;
            rom[0x14D] = CartridgeHeader::checksum(&rom);
        }
        MemoryMap::with_cartridge(MemoryBankController::new(rom).unwrap())
    }

    /// Records every write and requests a timer interrupt once enough cycles pass.
    #[derive(Default, Clone)]
    struct Recorder {
        writes: Arc<Mutex<Vec<(u16, u8)>>>,
        register: u8,
        cycles: u32,
    }

    impl Peripheral for Recorder {
        fn read_byte(&self, _addr: u16) -> u8 {
            self.register
        }

        fn write_byte(&mut self, addr: u16, value: u8) {
            self.register = value;
            self.writes.lock().unwrap().push((addr, value));
        }

        fn step(&mut self, cycles: u32, interrupts: &mut InterruptFlags) {
            self.cycles += cycles;
            if self.cycles >= 64 {
                self.cycles -= 64;
                interrupts.request(InterruptOp::Timer);
            }
        }

        fn reset(&mut self) {
            self.register = 0;
            self.cycles = 0;
        }
    }

    #[test]
    fn uninitialized_bus() {
        let mut mem = MemoryMap::new();
        assert_eq!(mem.read_byte(0xC000), Err(Error::UninitializedBus));
        assert_eq!(mem.write_byte(0xC000, 1), Err(Error::UninitializedBus));
        assert_eq!(mem.pending_interrupts(), Err(Error::UninitializedBus));
        mem.mount(mounted(false).eject().unwrap());
        assert_eq!(mem.read_byte(0xC000), Ok(0));
    }

    #[test]
    fn echo_ram() {
        let mut mem = mounted(false);
        mem.write_byte(0xC123, 0xAB).unwrap();
        assert_eq!(mem.read_byte(0xE123), Ok(0xAB));
        mem.write_byte(0xFDFF, 0xCD).unwrap();
        assert_eq!(mem.read_byte(0xDDFF), Ok(0xCD));
    }

    #[test]
    fn unusable_region() {
        let mut mem = mounted(false);
        mem.write_byte(0xFEA0, 0x12).unwrap();
        assert_eq!(mem.read_byte(0xFEA0), Ok(0xFF));
        assert_eq!(mem.read_byte(0xFEFF), Ok(0xFF));
    }

    #[test]
    fn high_ram_and_interrupt_enable() {
        let mut mem = mounted(false);
        mem.write_byte(0xFF80, 0x01).unwrap();
        mem.write_byte(0xFFFE, 0x02).unwrap();
        mem.write_byte(0xFFFF, 0x1F).unwrap();
        assert_eq!(mem.read_byte(0xFF80), Ok(0x01));
        assert_eq!(mem.read_byte(0xFFFE), Ok(0x02));
        assert_eq!(mem.ie, 0x1F);
        mem.request_interrupt(InterruptOp::Serial);
        assert_eq!(mem.pending_interrupts(), Ok(0x08));
        assert_eq!(mem.read_byte(0xFF0F), Ok(0xE8));
    }

    #[test]
    fn oam_dma() {
        let mut mem = mounted(false);
        for i in 0..0xA0u16 {
            mem.write_byte(0xC100 + i, i as u8).unwrap();
        }
        mem.write_byte(0xFF46, 0xC1).unwrap();
        assert_eq!(mem.read_byte(0xFF46), Ok(0xC1));
        assert_eq!(mem.read_byte(0xFE00), Ok(0x00));
        assert_eq!(mem.read_byte(0xFE9F), Ok(0x9F));

        // The source can be cartridge ROM too
        mem.write_byte(0xFF46, 0x40).unwrap();
        assert_eq!(mem.read_byte(0xFE50), Ok(0x01));
    }

    #[test]
    fn wram_banking() {
        let mut mem = mounted(false);
        mem.write_byte(0xFF70, 0x02).unwrap();
        mem.write_byte(0xD000, 0x11).unwrap();
        mem.write_byte(0xFF70, 0x01).unwrap();
        assert_eq!(mem.read_byte(0xD000), Ok(0x11));

        let mut mem = mounted(true);
        mem.write_byte(0xFF70, 0x02).unwrap();
        mem.write_byte(0xD000, 0x22).unwrap();
        mem.write_byte(0xFF70, 0x01).unwrap();
        assert_eq!(mem.read_byte(0xD000), Ok(0x00));
        mem.write_byte(0xFF70, 0x00).unwrap();
        assert_eq!(mem.read_byte(0xD000), Ok(0x00));
        mem.write_byte(0xFF70, 0x02).unwrap();
        assert_eq!(mem.read_byte(0xD000), Ok(0x22));
        assert_eq!(mem.read_byte(0xF000), Ok(0x22));
    }

    #[test]
    fn peripheral_forwarding() {
        let mut mem = mounted(false);
        let timer = Recorder::default();
        let writes = timer.writes.clone();
        mem.attach_timer(timer);
        mem.attach_graphics(Recorder::default());

        mem.write_byte(0xFF06, 0x42).unwrap();
        assert_eq!(mem.read_byte(0xFF06), Ok(0x42));
        assert_eq!(*writes.lock().unwrap(), vec![(0xFF06, 0x42)]);
        // Graphics sees the DMA register, but not KEY1 or SVBK
        mem.write_byte(0xFF46, 0xC0).unwrap();
        assert_eq!(mem.peripheral(PeripheralSlot::Graphics).unwrap().read_byte(0xFF40), 0xC0);
        mem.write_byte(0xFF4D, 0x01).unwrap();
        assert_eq!(mem.read_byte(0xFF4D), Ok(0x7F));
        assert_eq!(mem.read_byte(0xFF40), Ok(0xC0));

        mem.step_peripherals(40);
        assert_eq!(mem.interrupt_flags().bits(), 0);
        mem.step_peripherals(40);
        assert!(mem.interrupt_flags().is_requested(InterruptOp::Timer));
        assert_eq!(mem.interrupt_flags().bits(), 0x04);

        assert!(mem.detach(PeripheralSlot::Timer).is_some());
        assert_eq!(mem.read_byte(0xFF06), Ok(0xFF));
    }

    #[test]
    fn words_wrap() {
        let mut mem = mounted(false);
        mem.write_word(0xC000, 0xBEEF).unwrap();
        assert_eq!(mem.read_byte(0xC000), Ok(0xEF));
        assert_eq!(mem.read_word(0xC000), Ok(0xBEEF));
        mem.write_word(0xFFFF, 0x1F00).unwrap();
        assert_eq!(mem.ie, 0x00);
        // The high byte wraps around to the cartridge
        assert_eq!(mem.read_word(0xFFFF), Ok(0x0000));
    }

    #[test]
    fn reset_clears_ram() {
        let mut mem = mounted(false);
        mem.attach_timer(Recorder::default());
        mem.write_byte(0xFF05, 0x10).unwrap();
        mem.write_byte(0xC000, 0x10).unwrap();
        mem.write_byte(0xFF80, 0x10).unwrap();
        mem.request_interrupt(InterruptOp::VBlank);
        mem.reset();
        assert_eq!(mem.read_byte(0xC000), Ok(0));
        assert_eq!(mem.read_byte(0xFF80), Ok(0));
        assert_eq!(mem.read_byte(0xFF05), Ok(0));
        assert_eq!(mem.read_byte(0xFF0F), Ok(0xE0));
    }
}
