use derive_more::derive::{Display, Error};
use embedded_hal::spi::ErrorKind;

/// A specialized `Result` where the error is this crate's `Error` type.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Define a unified error type for this crate.
#[derive(Debug, Display, Error, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Two panel descriptors share a sequence id.
    #[display("Duplicate panel id {_0}")]
    DuplicatePanelId(#[error(not(source))] u32),

    /// A panel resolved to zero width, height or pixel count.
    #[display("Panel {_0} has no pixels")]
    EmptyPanel(#[error(not(source))] u32),

    /// The topology contains no panels at all.
    #[display("Topology has no pixels")]
    NoPixels,

    /// A descriptor tried to change a property the panel kind does not allow.
    #[display("Panel {panel_id}: property '{property}' is locked for this panel type")]
    LockedProperty {
        /// Panel sequence id.
        panel_id: u32,
        /// Name of the rejected property.
        property: &'static str,
    },

    /// No catalog entry matches the descriptor's compatible tag.
    #[display("Panel {_0}: unknown compatible tag")]
    UnknownCompatible(#[error(not(source))] u32),

    /// A custom geometry table length differs from the panel pixel count.
    #[display("Panel {panel_id}: geometry maps {geometry} pixels, panel has {pixels}")]
    ShapeMismatch {
        /// Panel sequence id.
        panel_id: u32,
        /// Length of the geometry table.
        geometry: usize,
        /// Pixel count of the panel.
        pixels: usize,
    },

    /// More panels than a chain can hold.
    #[display("Too many panels in topology")]
    TooManyPanels,

    /// No panel with the given sequence id exists in the chain.
    #[display("Unknown panel id {_0}")]
    UnknownPanel(#[error(not(source))] u32),

    /// A chain-relative pixel index past the end of the chain.
    #[display("Pixel index {_0} out of range")]
    PixelIndexOutOfRange(#[error(not(source))] usize),

    /// Frame coordinates outside the canvas.
    #[display("Coordinates outside the canvas")]
    OffCanvas,

    /// Byte offset past the end of the frame plane.
    #[display("Frame offset {_0} past end of frame plane")]
    FrameOffsetOutOfRange(#[error(not(source))] usize),

    /// An attribute write exceeded the attribute's maximum.
    #[display("{attribute} value {value} exceeds maximum {max}")]
    OutOfRange {
        /// Attribute name.
        attribute: &'static str,
        /// Rejected value.
        value: u32,
        /// Largest accepted value.
        max: u32,
    },

    /// The rescale loop hit its iteration ceiling without meeting the limits.
    #[display("Current budget not satisfiable after {iterations} rescale passes")]
    BudgetUnsatisfiable {
        /// Rescale passes attempted.
        iterations: u16,
    },

    /// The SPI collaborator refused or failed the transfer.
    #[display("Transmission failed: {kind:?}")]
    Transmission {
        /// Error kind reported by the bus.
        kind: ErrorKind,
    },

    /// A stored topology record failed magic, length or CRC validation.
    #[display("Stored topology is invalid")]
    TopologyCorrupted,

    /// Serialization failed or a bounded buffer overflowed.
    #[display("Format error")]
    FormatError,
}

impl From<()> for Error {
    fn from((): ()) -> Self {
        Self::FormatError
    }
}

impl From<postcard::Error> for Error {
    fn from(_: postcard::Error) -> Self {
        Self::FormatError
    }
}
