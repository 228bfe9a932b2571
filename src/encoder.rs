//! Protocol encoders: scaled pixels → bytes for the SPI bus.
//!
//! An encoder owns the layout of the output buffer: how long it is for a
//! given pixel count, what framing surrounds the pixel data, and where each
//! pixel slot starts. [`Family`] picks the encoder and the panel catalog for a
//! LED product line.

pub mod apa102;
pub mod ws2812;

use serde::{Deserialize, Serialize};

pub use self::apa102::Apa102Encoder;
pub use self::ws2812::Ws2812Encoder;
use crate::frame::ScaledPixel;
use crate::panel::catalog::{APA102_PANELS, PanelKind, WS2812_PANELS, WS2812B_PANELS};

/// Converts scaled pixels into a protocol-specific byte stream.
///
/// Called with the same `pixel_count` for the life of a buffer: first
/// [`frame`](Self::frame) once, then [`encode`](Self::encode) per slot on every pass.
pub trait ProtocolEncoder {
    /// Total buffer length for `pixel_count` pixels, framing included.
    fn buffer_len(&self, pixel_count: usize) -> usize;

    /// Write the constant framing (start/end sequences, reset padding).
    fn frame(&self, buffer: &mut [u8], pixel_count: usize);

    /// Write one pixel into its slot. Slots outside the buffer are ignored.
    fn encode(&self, buffer: &mut [u8], slot: usize, pixel: ScaledPixel);

    /// SPI clock rate the buffer is meant to be shifted out at, in Hz.
    fn bus_hz(&self) -> u32;
}

/// LED product family of a whole chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Family {
    /// WS2812B, 800 kHz single-wire.
    Ws2812b,
    /// Original WS2812, 400 kHz single-wire.
    Ws2812,
    /// APA102, clocked two-wire with 5-bit global brightness.
    Apa102,
}

impl Family {
    /// Built-in panel types for this family.
    #[must_use]
    pub fn catalog(self) -> &'static [PanelKind] {
        match self {
            Self::Ws2812b => WS2812B_PANELS,
            Self::Ws2812 => WS2812_PANELS,
            Self::Apa102 => APA102_PANELS,
        }
    }

    /// Encoder for this family with default timing.
    #[must_use]
    pub const fn encoder(self) -> AnyEncoder {
        match self {
            Self::Ws2812b => AnyEncoder::Ws2812(Ws2812Encoder::WS2812B),
            Self::Ws2812 => AnyEncoder::Ws2812(Ws2812Encoder::WS2812),
            Self::Apa102 => AnyEncoder::Apa102(Apa102Encoder::new(Apa102Encoder::DEFAULT_BUS_HZ)),
        }
    }

    /// Lower-case family name, as used in device names.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Ws2812b => "ws2812b",
            Self::Ws2812 => "ws2812",
            Self::Apa102 => "apa102",
        }
    }
}

/// Encoder chosen at run time from a [`Family`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnyEncoder {
    /// WS2812 or WS2812B timing.
    Ws2812(Ws2812Encoder),
    /// APA102 framing.
    Apa102(Apa102Encoder),
}

impl ProtocolEncoder for AnyEncoder {
    fn buffer_len(&self, pixel_count: usize) -> usize {
        match self {
            Self::Ws2812(encoder) => encoder.buffer_len(pixel_count),
            Self::Apa102(encoder) => encoder.buffer_len(pixel_count),
        }
    }

    fn frame(&self, buffer: &mut [u8], pixel_count: usize) {
        match self {
            Self::Ws2812(encoder) => encoder.frame(buffer, pixel_count),
            Self::Apa102(encoder) => encoder.frame(buffer, pixel_count),
        }
    }

    fn encode(&self, buffer: &mut [u8], slot: usize, pixel: ScaledPixel) {
        match self {
            Self::Ws2812(encoder) => encoder.encode(buffer, slot, pixel),
            Self::Apa102(encoder) => encoder.encode(buffer, slot, pixel),
        }
    }

    fn bus_hz(&self) -> u32 {
        match self {
            Self::Ws2812(encoder) => encoder.bus_hz(),
            Self::Apa102(encoder) => encoder.bus_hz(),
        }
    }
}
