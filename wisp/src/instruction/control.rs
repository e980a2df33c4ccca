use tracing::info;

use super::*;

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, derive_more::Display)]
#[display("{_variant}")]
pub enum ControlOp {
    #[display("HALT")]
    Halt,
    #[display("NOP")]
    Noop,
    #[display("STOP")]
    Stop,
}

impl ControlOp {
    pub(crate) fn execute<M: MemoryLike + ?Sized>(
        self,
        state: &mut GameboyState<'_, M>,
    ) -> Result<u8> {
        match self {
            ControlOp::Noop => {}
            ControlOp::Halt => state.cpu.halt(),
            ControlOp::Stop => {
                // STOP is followed by a padding byte that is never executed
                state.cpu.pc += Wrapping(1);
                if state.mem.speed_switch_armed()? {
                    let double = !state.mem.double_speed()?;
                    state.mem.switch_speed(double)?;
                    info!("Switched to {} speed", if double { "double" } else { "normal" });
                } else {
                    state.cpu.stop();
                }
            }
        }
        Ok(self.length())
    }

    /// Returns the number of machine cycles this instruction takes.
    pub const fn length(&self) -> u8 {
        match self {
            ControlOp::Noop => 1,
            ControlOp::Stop => 1,
            ControlOp::Halt => 1,
        }
    }

    /// Returns the size of the bytes to took to construct this instruction
    pub const fn size(&self) -> u8 {
        match self {
            ControlOp::Noop => 1,
            ControlOp::Stop => 2,
            ControlOp::Halt => 1,
        }
    }
}
