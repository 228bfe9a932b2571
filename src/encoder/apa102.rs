//! APA102 (DotStar) over SPI.
//!
//! ```text
//! | 00 00 00 00 | E0|b>>3  B  G  R | ... | FF × (ceil(N/8) + 1) |
//!   start frame   one word per pixel      end frame
//! ```
//!
//! Colors go out unscaled; the effective brightness is carried in the 5-bit
//! global-brightness field of each pixel word.

use super::ProtocolEncoder;
use crate::frame::ScaledPixel;

const START_FRAME_LEN: usize = 4;
const WORD_LEN: usize = 4;

/// Encoder for APA102 two-wire LEDs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Apa102Encoder {
    bus_hz: u32,
}

impl Apa102Encoder {
    /// Default SPI clock.
    pub const DEFAULT_BUS_HZ: u32 = 4_000_000;

    /// Encoder for a bus clocked at `bus_hz`.
    #[must_use]
    pub const fn new(bus_hz: u32) -> Self {
        Self { bus_hz }
    }

    /// End-frame length: one clock edge per two pixels must be pushed through, plus one byte.
    #[must_use]
    pub const fn end_frame_len(pixel_count: usize) -> usize {
        pixel_count.div_ceil(8).saturating_add(1)
    }

    /// Offset just past the first `count` pixel words.
    const fn words_end(count: usize) -> usize {
        START_FRAME_LEN.saturating_add(count.saturating_mul(WORD_LEN))
    }
}

impl ProtocolEncoder for Apa102Encoder {
    fn buffer_len(&self, pixel_count: usize) -> usize {
        Self::words_end(pixel_count).saturating_add(Self::end_frame_len(pixel_count))
    }

    fn frame(&self, buffer: &mut [u8], pixel_count: usize) {
        let end_start = Self::words_end(pixel_count);
        for (index, byte) in buffer.iter_mut().enumerate() {
            *byte = if index >= end_start { 0xFF } else { 0x00 };
        }
    }

    fn encode(&self, buffer: &mut [u8], slot: usize, pixel: ScaledPixel) {
        let Some(word) = buffer
            .get_mut(Self::words_end(slot)..)
            .and_then(<[u8]>::first_chunk_mut::<WORD_LEN>)
        else {
            return;
        };
        let color = pixel.color;
        *word = [0xE0 | (pixel.brightness >> 3), color.b, color.g, color.r];
    }

    fn bus_hz(&self) -> u32 {
        self.bus_hz
    }
}
