//! WS2812/WS2812B over SPI.
//!
//! The single-wire protocol is synthesized by clocking SPI at three times the
//! LED bit rate: each data bit becomes three SPI bits, `110` for one and `100`
//! for zero. A byte therefore expands to three SPI bytes, looked up from its
//! top 3, middle 2 and low 3 bits. Wire order is green, red, blue. The LEDs
//! have no brightness field, so brightness is folded into the channels.

use super::ProtocolEncoder;
use crate::frame::{ScaledPixel, scale8};

/// SPI bytes per pixel (3 channels × 3 bytes).
pub const BYTES_PER_PIXEL: usize = 9;

// Encodings of value bits 7..5 (plus the leading SPI bits of bit 5).
const HIGH: [u8; 8] = [0x92, 0x93, 0x9a, 0x9b, 0xd2, 0xd3, 0xda, 0xdb];
// Encodings of value bits 4..3.
const MID: [u8; 4] = [0x49, 0x4d, 0x69, 0x6d];
// Encodings of value bits 2..0.
const LOW: [u8; 8] = [0x24, 0x26, 0x34, 0x36, 0xa4, 0xa6, 0xb4, 0xb6];

/// Encoder for WS2812-style single-wire LEDs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Ws2812Encoder {
    led_hz: u32,
    reset_us: u32,
}

impl Ws2812Encoder {
    /// WS2812B timing: 800 kHz, 50 µs latch.
    pub const WS2812B: Self = Self::new(800_000, 50);
    /// WS2812 timing: 400 kHz, 50 µs latch.
    pub const WS2812: Self = Self::new(400_000, 50);

    /// Custom LED bit rate and latch time.
    #[must_use]
    pub const fn new(led_hz: u32, reset_us: u32) -> Self {
        Self { led_hz, reset_us }
    }

    /// Number of zero bytes appended so the line stays low for the latch time.
    #[must_use]
    pub fn reset_len(&self) -> usize {
        let bits = u64::from(self.reset_us).saturating_mul(u64::from(self.spi_hz()));
        usize::try_from(bits.div_ceil(8_000_000)).unwrap_or(usize::MAX)
    }

    /// SPI clock: three SPI bits per LED bit.
    #[must_use]
    pub const fn spi_hz(&self) -> u32 {
        self.led_hz.saturating_mul(3)
    }

    /// Three SPI bytes for one channel value.
    #[must_use]
    #[allow(
        clippy::indexing_slicing,
        reason = "indices are masked to the table sizes"
    )]
    pub const fn expand(value: u8) -> [u8; 3] {
        [
            HIGH[(value >> 5) as usize & 7],
            MID[(value >> 3) as usize & 3],
            LOW[value as usize & 7],
        ]
    }
}

impl ProtocolEncoder for Ws2812Encoder {
    fn buffer_len(&self, pixel_count: usize) -> usize {
        pixel_count
            .saturating_mul(BYTES_PER_PIXEL)
            .saturating_add(self.reset_len())
    }

    fn frame(&self, buffer: &mut [u8], _pixel_count: usize) {
        buffer.fill(0);
    }

    fn encode(&self, buffer: &mut [u8], slot: usize, pixel: ScaledPixel) {
        let Some(out) = slot
            .checked_mul(BYTES_PER_PIXEL)
            .and_then(|start| buffer.get_mut(start..))
            .and_then(<[u8]>::first_chunk_mut::<BYTES_PER_PIXEL>)
        else {
            return;
        };
        let color = pixel.color;
        for (chunk, value) in out.chunks_exact_mut(3).zip([color.g, color.r, color.b]) {
            chunk.copy_from_slice(&Self::expand(scale8(value, pixel.brightness)));
        }
    }

    fn bus_hz(&self) -> u32 {
        self.spi_hz()
    }
}
