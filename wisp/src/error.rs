//! The fatal conditions that can end an emulation session. Everything else the hardware can run
//! into (unmapped addresses, disabled cartridge RAM, out-of-range banks) resolves to open-bus
//! values and never surfaces here.

/// A convenience alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum Error {
    /// The byte fetched at `address` does not correspond to any operation. For prefixed
    /// operations, `address` is the location of the `0xCB` prefix.
    #[display(
        "Op code '0x{opcode:0>2X}'{} @ 0x{address:0>4X} does not correspond to any valid operation",
        if *prefixed { " (prefixed)" } else { "" }
    )]
    #[from(ignore)]
    InvalidOpcode {
        opcode: u8,
        prefixed: bool,
        address: u16,
    },
    /// The bus was accessed before a cartridge controller was attached.
    #[display("No cartridge has been mounted onto the bus")]
    #[from(ignore)]
    UninitializedBus,
    /// The cartridge header describes hardware that can not be emulated.
    #[display("Unsupported cartridge: {_0}")]
    UnsupportedCartridge(#[error(source)] CartridgeError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum CartridgeError {
    #[display("unknown memory bank controller type 0x{_0:0>2X}")]
    UnknownController(#[error(not(source))] u8),
    #[display("controller 0x{controller:0>2X} does not support RAM size code 0x{code:0>2X}")]
    UnsupportedRamSize { controller: u8, code: u8 },
    #[display("unknown ROM size code 0x{_0:0>2X}")]
    UnsupportedRomSize(#[error(not(source))] u8),
    #[display("the image is {len} bytes long, which is too short to hold a header")]
    TruncatedHeader { len: usize },
}
