use std::fmt::Debug;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::instruction::InterruptOp;

/// A device that lives behind a range of the memory mapped IO registers, such as the timer or the
/// pixel processor. The bus owns each peripheral and forwards every access to its registers.
///
/// Peripherals never hold a reference back to the bus. Instead, each step is given the interrupt
/// flag register, which is how a peripheral requests an interrupt.
pub trait Peripheral: Send {
    /// Reads one of the peripheral's registers. A value written with `write_byte` must be visible
    /// to the very next read.
    fn read_byte(&self, addr: u16) -> u8;

    fn write_byte(&mut self, addr: u16, value: u8);

    /// Advances the peripheral by the given number of machine cycles.
    fn step(&mut self, cycles: u32, interrupts: &mut InterruptFlags);

    /// Returns the peripheral to its power-on state.
    fn reset(&mut self) {}
}

/// Names one of the peripheral slots on the bus.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, derive_more::Display)]
pub enum PeripheralSlot {
    /// ADDR FF04-FF07
    Timer,
    /// ADDR FF00
    Input,
    /// ADDR FF10-FF3F
    Audio,
    /// ADDR FF40-FF6C, except for the registers handled by the bus
    Graphics,
}

/// The interrupt flag register, ADDR FF0F. Only the lower five bits are stored.
#[derive(Debug, Default, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterruptFlags(u8);

impl InterruptFlags {
    pub fn request(&mut self, op: InterruptOp) {
        trace!("{op} interrupt requested");
        self.0 |= op.flag();
    }

    pub fn clear(&mut self, op: InterruptOp) {
        self.0 &= !op.flag();
    }

    pub fn is_requested(&self, op: InterruptOp) -> bool {
        self.0 & op.flag() != 0
    }

    pub fn bits(&self) -> u8 {
        self.0
    }

    pub fn set_bits(&mut self, value: u8) {
        self.0 = value & 0x1F;
    }
}

#[derive(Default)]
pub struct Peripherals {
    timer: Option<Box<dyn Peripheral>>,
    input: Option<Box<dyn Peripheral>>,
    audio: Option<Box<dyn Peripheral>>,
    graphics: Option<Box<dyn Peripheral>>,
}

impl Peripherals {
    pub(crate) fn slot(&self, slot: PeripheralSlot) -> Option<&dyn Peripheral> {
        match slot {
            PeripheralSlot::Timer => self.timer.as_deref(),
            PeripheralSlot::Input => self.input.as_deref(),
            PeripheralSlot::Audio => self.audio.as_deref(),
            PeripheralSlot::Graphics => self.graphics.as_deref(),
        }
    }

    pub(crate) fn slot_mut(&mut self, slot: PeripheralSlot) -> &mut Option<Box<dyn Peripheral>> {
        match slot {
            PeripheralSlot::Timer => &mut self.timer,
            PeripheralSlot::Input => &mut self.input,
            PeripheralSlot::Audio => &mut self.audio,
            PeripheralSlot::Graphics => &mut self.graphics,
        }
    }

    fn iter_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn Peripheral>> {
        [
            &mut self.timer,
            &mut self.input,
            &mut self.audio,
            &mut self.graphics,
        ]
        .into_iter()
        .flatten()
    }

    fn read_byte(&self, slot: PeripheralSlot, addr: u16) -> u8 {
        self.slot(slot).map_or(0xFF, |p| p.read_byte(addr))
    }

    fn write_byte(&mut self, slot: PeripheralSlot, addr: u16, value: u8) {
        if let Some(p) = self.slot_mut(slot) {
            p.write_byte(addr, value)
        }
    }
}

impl Debug for Peripherals {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Peripherals")
            .field("timer", &self.timer.is_some())
            .field("input", &self.input.is_some())
            .field("audio", &self.audio.is_some())
            .field("graphics", &self.graphics.is_some())
            .finish()
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct IoRegisters {
    /// ADDR FF0F
    pub(crate) interrupt_flags: InterruptFlags,
    /// ADDR FF46
    dma: u8,
    /// ADDR FF4D, bit 0. Set by the game before executing STOP to request a speed switch.
    speed_armed: bool,
    /// ADDR FF4D, bit 7
    double_speed: bool,
    /// ADDR FF70. Only the lower three bits are used.
    wram_select: u8,
    /// Whether or not the mounted cartridge uses color features. This gates the WRAM bank select.
    pub(super) color: bool,
    /// Peripherals are not part of a snapshot and must be reattached after loading one.
    #[serde(skip)]
    pub(super) peripherals: Peripherals,
}

impl IoRegisters {
    pub fn request_interrupt(&mut self, op: InterruptOp) {
        self.interrupt_flags.request(op)
    }

    pub(crate) fn clear_interrupt_req(&mut self, op: InterruptOp) {
        self.interrupt_flags.clear(op)
    }

    pub(super) fn step_peripherals(&mut self, cycles: u32) {
        let flags = &mut self.interrupt_flags;
        self.peripherals
            .iter_mut()
            .for_each(|p| p.step(cycles, flags));
    }

    pub(super) fn double_speed(&self) -> bool {
        self.double_speed
    }

    pub(super) fn switch_speed(&mut self, double: bool) {
        self.double_speed = double;
        self.speed_armed = false;
    }

    /// The index of the work RAM bank mapped at 0xD000.
    pub(super) fn wram_bank(&self) -> usize {
        match self.wram_select {
            0 => 1,
            n => n as usize,
        }
    }

    /// Clears every register and resets all attached peripherals. The attached peripherals and
    /// color mode are kept.
    pub(super) fn reset(&mut self) {
        self.interrupt_flags = InterruptFlags::default();
        self.dma = 0;
        self.speed_armed = false;
        self.double_speed = false;
        self.wram_select = 0;
        self.peripherals.iter_mut().for_each(|p| p.reset());
    }

    pub(crate) fn read_byte(&self, index: u16) -> u8 {
        match index {
            0xFF00 => self.peripherals.read_byte(PeripheralSlot::Input, index),
            0xFF04..=0xFF07 => self.peripherals.read_byte(PeripheralSlot::Timer, index),
            // The upper three bits are not wired and always read as set
            0xFF0F => self.interrupt_flags.bits() | 0xE0,
            0xFF10..=0xFF3F => self.peripherals.read_byte(PeripheralSlot::Audio, index),
            0xFF46 => self.dma,
            0xFF4D => ((self.double_speed as u8) << 7) | 0x7E | self.speed_armed as u8,
            0xFF40..=0xFF6C => self.peripherals.read_byte(PeripheralSlot::Graphics, index),
            0xFF70 if self.color => 0xF8 | self.wram_select,
            _ => 0xFF,
        }
    }

    /// Writes to a register. The bus itself handles the copy that a write to the DMA register
    /// starts.
    pub(crate) fn write_byte(&mut self, index: u16, value: u8) {
        match index {
            0xFF00 => self.peripherals.write_byte(PeripheralSlot::Input, index, value),
            0xFF04..=0xFF07 => self.peripherals.write_byte(PeripheralSlot::Timer, index, value),
            0xFF0F => self.interrupt_flags.set_bits(value),
            0xFF10..=0xFF3F => self.peripherals.write_byte(PeripheralSlot::Audio, index, value),
            0xFF46 => {
                self.dma = value;
                self.peripherals.write_byte(PeripheralSlot::Graphics, index, value);
            }
            // Only the arm bit can be written
            0xFF4D => self.speed_armed = value & 0x01 != 0,
            0xFF40..=0xFF6C => self.peripherals.write_byte(PeripheralSlot::Graphics, index, value),
            0xFF70 if self.color => self.wram_select = value & 0x07,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::InterruptFlags;
    use super::IoRegisters;
    use crate::instruction::InterruptOp;

    #[test]
    fn interrupt_flag_register() {
        let mut io = IoRegisters::default();
        assert_eq!(io.read_byte(0xFF0F), 0xE0);
        io.request_interrupt(InterruptOp::Timer);
        io.request_interrupt(InterruptOp::Joypad);
        assert_eq!(io.read_byte(0xFF0F), 0xF4);
        io.clear_interrupt_req(InterruptOp::Timer);
        assert_eq!(io.read_byte(0xFF0F), 0xF0);
        io.write_byte(0xFF0F, 0xFF);
        assert_eq!(io.interrupt_flags.bits(), 0x1F);
    }

    #[test]
    fn flags() {
        let mut flags = InterruptFlags::default();
        flags.request(InterruptOp::LCD);
        assert!(flags.is_requested(InterruptOp::LCD));
        assert!(!flags.is_requested(InterruptOp::VBlank));
        flags.clear(InterruptOp::LCD);
        assert_eq!(flags.bits(), 0);
    }

    #[test]
    fn speed_register() {
        let mut io = IoRegisters::default();
        assert_eq!(io.read_byte(0xFF4D), 0x7E);
        io.write_byte(0xFF4D, 0xFF);
        assert_eq!(io.read_byte(0xFF4D), 0x7F);
        io.switch_speed(true);
        assert_eq!(io.read_byte(0xFF4D), 0xFE);
    }

    #[test]
    fn wram_select_requires_color() {
        let mut io = IoRegisters::default();
        io.write_byte(0xFF70, 0x03);
        assert_eq!(io.read_byte(0xFF70), 0xFF);
        assert_eq!(io.wram_bank(), 1);

        io.color = true;
        io.write_byte(0xFF70, 0x03);
        assert_eq!(io.read_byte(0xFF70), 0xFB);
        assert_eq!(io.wram_bank(), 3);
        io.write_byte(0xFF70, 0x08);
        assert_eq!(io.wram_bank(), 1);
    }

    #[test]
    fn unattached_peripherals_are_open_bus() {
        let mut io = IoRegisters::default();
        for addr in [0xFF00, 0xFF05, 0xFF26, 0xFF44, 0xFF03, 0xFF7F] {
            io.write_byte(addr, 0x12);
            assert_eq!(io.read_byte(addr), 0xFF, "0x{addr:0>4X}");
        }
    }
}
