use tracing::debug;

use super::*;

/// The five interrupt sources, in priority order. The discriminant of each is the address of its
/// handler.
#[derive(
    Debug, Clone, Copy, Hash, PartialEq, Eq, derive_more::Display, Serialize, Deserialize,
)]
#[display("{_variant}")]
#[repr(u16)]
pub enum InterruptOp {
    #[display("VBlank")]
    VBlank = 0x0040,
    #[display("LCD")]
    LCD = 0x0048,
    #[display("Timer")]
    Timer = 0x0050,
    #[display("Serial")]
    Serial = 0x0058,
    #[display("Joypad")]
    Joypad = 0x0060,
}

impl InterruptOp {
    /// All interrupts, from highest to lowest priority.
    pub const ALL: [InterruptOp; 5] = [
        InterruptOp::VBlank,
        InterruptOp::LCD,
        InterruptOp::Timer,
        InterruptOp::Serial,
        InterruptOp::Joypad,
    ];

    /// The bit that represents this interrupt in both the IE and IF registers.
    pub const fn flag(self) -> u8 {
        match self {
            InterruptOp::VBlank => 0x01,
            InterruptOp::LCD => 0x02,
            InterruptOp::Timer => 0x04,
            InterruptOp::Serial => 0x08,
            InterruptOp::Joypad => 0x10,
        }
    }

    /// The address of the interrupt's handler.
    pub const fn handler(self) -> u16 {
        self as u16
    }

    /// Returns the highest-priority interrupt whose bit is set in `pending`.
    pub fn highest_priority(pending: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|int| pending & int.flag() != 0)
    }

    /// Services the interrupt: acknowledges it, disables further interrupts, and calls the
    /// handler. Returns the number of machine cycles this took.
    pub(crate) fn execute<M: MemoryLike + ?Sized>(
        self,
        state: &mut GameboyState<'_, M>,
    ) -> Result<u8> {
        debug!("Servicing {self} interrupt from 0x{:0>4X}", state.cpu.pc.0);
        state.mem.clear_interrupt_req(self)?;
        state.cpu.ime = false;
        state.push(state.cpu.pc.0)?;
        state.cpu.pc = Wrapping(self.handler());
        Ok(5)
    }
}
