//! Wisp is the core crate for the wisp project. Contained here is all of the logic for stepping a
//! handheld console's CPU through a cartridge: the register file, both opcode tables, interrupt
//! dispatch, the memory map, and the cartridge bank controllers. This crate aims to be platform
//! agnostic and free of the UI-specifics. Rendering, audio, timers, and input are attached to the
//! bus as [`Peripheral`]s by whatever wraps this crate.
//!
//! # Notes
//! The CPU is little endian. Every cycle count in this crate is in machine cycles (four clock
//! ticks each).

pub mod cpu;
mod error;
mod gameboy;
pub mod instruction;
pub mod lookup;
pub mod mem;
mod utils;

pub use error::{CartridgeError, Error, Result};
pub use gameboy::{Gameboy, CYCLES_PER_FRAME};
pub(crate) use gameboy::GameboyState;
pub use mem::{
    CartridgeHeader, InterruptFlags, MemoryBankController, MemoryLike, MemoryMap, Peripheral,
    PeripheralSlot,
};
