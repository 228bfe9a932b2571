//! Frame plane: the writable canvas of 4-byte pixels the application draws into.
//!
//! Each pixel is stored as `[red, green, blue, brightness]`, row-major, with
//! a row stride of `width * 4` bytes. See [`FramePlane`].

use alloc::vec;
use alloc::vec::Vec;

use crate::{Error, Result};

/// Predefined RGB color constants from the `smart_leds` crate.
///
/// Common colors include `RED`, `GREEN`, `BLUE`, `YELLOW`, `WHITE`, `BLACK`, `CYAN`, `MAGENTA`, `ORANGE`, `PURPLE`.
#[doc(inline)]
pub use smart_leds::colors;
#[doc(inline)]
pub use smart_leds::RGB8;

/// One component of a stored pixel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Channel {
    /// Red intensity.
    Red,
    /// Green intensity.
    Green,
    /// Blue intensity.
    Blue,
    /// Per-pixel brightness.
    Brightness,
}

impl Channel {
    /// All channels in storage order.
    pub const ALL: [Self; 4] = [Self::Red, Self::Green, Self::Blue, Self::Brightness];

    /// Byte offset of this channel inside a stored pixel.
    #[must_use]
    pub const fn offset(self) -> usize {
        match self {
            Self::Red => 0,
            Self::Green => 1,
            Self::Blue => 2,
            Self::Brightness => 3,
        }
    }

    /// Short name used in exposed LED labels.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Green => "green",
            Self::Blue => "blue",
            Self::Brightness => "brightness",
        }
    }
}

/// A stored pixel: color plus its own brightness.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Pixel {
    /// Red intensity.
    pub red: u8,
    /// Green intensity.
    pub green: u8,
    /// Blue intensity.
    pub blue: u8,
    /// Per-pixel brightness, multiplied with panel and global brightness.
    pub brightness: u8,
}

impl Pixel {
    /// Bytes per stored pixel.
    pub const BYTES: usize = 4;

    /// All channels zero.
    pub const OFF: Self = Self::new(0, 0, 0, 0);

    /// Create a pixel from raw channel values.
    #[must_use]
    pub const fn new(red: u8, green: u8, blue: u8, brightness: u8) -> Self {
        Self {
            red,
            green,
            blue,
            brightness,
        }
    }

    /// Create a pixel from a `smart_leds` color and a brightness.
    #[must_use]
    pub const fn from_rgb(color: RGB8, brightness: u8) -> Self {
        Self::new(color.r, color.g, color.b, brightness)
    }

    /// The color part of the pixel.
    #[must_use]
    pub const fn rgb(self) -> RGB8 {
        RGB8::new(self.red, self.green, self.blue)
    }

    /// Storage form: `[red, green, blue, brightness]`.
    #[must_use]
    pub const fn to_bytes(self) -> [u8; Self::BYTES] {
        [self.red, self.green, self.blue, self.brightness]
    }

    /// Inverse of [`Pixel::to_bytes`].
    #[must_use]
    pub const fn from_bytes(bytes: [u8; Self::BYTES]) -> Self {
        let [red, green, blue, brightness] = bytes;
        Self::new(red, green, blue, brightness)
    }

    /// Read one channel.
    #[must_use]
    pub const fn channel(self, channel: Channel) -> u8 {
        match channel {
            Channel::Red => self.red,
            Channel::Green => self.green,
            Channel::Blue => self.blue,
            Channel::Brightness => self.brightness,
        }
    }

    /// Write one channel.
    pub fn set_channel(&mut self, channel: Channel, value: u8) {
        match channel {
            Channel::Red => self.red = value,
            Channel::Green => self.green = value,
            Channel::Blue => self.blue = value,
            Channel::Brightness => self.brightness = value,
        }
    }
}

/// `value * factor / 255`: the product of two 0..=255 levels.
pub(crate) fn scale8(value: u8, factor: u8) -> u8 {
    let product = u16::from(value).saturating_mul(u16::from(factor)) / 255;
    u8::try_from(product).unwrap_or(u8::MAX)
}

impl From<RGB8> for Pixel {
    fn from(color: RGB8) -> Self {
        Self::from_rgb(color, u8::MAX)
    }
}

/// A pixel after compositing: color plus the effective brightness to put on the wire.
///
/// Protocols without a brightness field (WS2812) fold the brightness into the
/// color channels; APA102 carries it in its global-brightness field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScaledPixel {
    /// Unscaled color.
    pub color: RGB8,
    /// Effective brightness (stored x panel x global).
    pub brightness: u8,
}

impl ScaledPixel {
    /// A dark pixel, used for coordinates outside the frame.
    pub const DARK: Self = Self {
        color: RGB8::new(0, 0, 0),
        brightness: 0,
    };

    /// Pair a color with the brightness it is shown at.
    #[must_use]
    pub const fn new(color: RGB8, brightness: u8) -> Self {
        Self { color, brightness }
    }
}

/// The writable frame: `width * height` pixels, 4 bytes each, row-major.
///
/// Coordinates outside the plane read as `None`; the compositor renders them dark.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FramePlane {
    width: u32,
    height: u32,
    bytes: Vec<u8>,
}

impl FramePlane {
    /// Create an all-zero plane.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        let len = (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(Pixel::BYTES);
        Self {
            width,
            height,
            bytes: vec![0; len],
        }
    }

    /// Width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per row.
    #[must_use]
    pub const fn stride(&self) -> usize {
        (self.width as usize).saturating_mul(Pixel::BYTES)
    }

    /// The whole plane in storage order.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Byte offset of `(x, y)`, or `None` when off-canvas.
    fn offset_of(&self, x: i32, y: i32) -> Option<usize> {
        let x = u32::try_from(x).ok().filter(|&x| x < self.width)?;
        let y = u32::try_from(y).ok().filter(|&y| y < self.height)?;
        let row = (y as usize).checked_mul(self.stride())?;
        row.checked_add((x as usize).checked_mul(Pixel::BYTES)?)
    }

    /// Stored pixel at `(x, y)`; `None` outside the plane.
    #[must_use]
    pub fn pixel(&self, x: i32, y: i32) -> Option<Pixel> {
        let offset = self.offset_of(x, y)?;
        let raw = self.bytes.get(offset..)?.first_chunk::<{ Pixel::BYTES }>()?;
        Some(Pixel::from_bytes(*raw))
    }

    /// Store a pixel at `(x, y)`.
    pub fn set_pixel(&mut self, x: i32, y: i32, pixel: Pixel) -> Result<()> {
        let offset = self.offset_of(x, y).ok_or(Error::OffCanvas)?;
        let raw = self
            .bytes
            .get_mut(offset..)
            .and_then(<[u8]>::first_chunk_mut::<{ Pixel::BYTES }>)
            .ok_or(Error::OffCanvas)?;
        *raw = pixel.to_bytes();
        Ok(())
    }

    /// Set every pixel to `pixel`.
    pub fn fill(&mut self, pixel: Pixel) {
        let raw = pixel.to_bytes();
        for chunk in self.bytes.chunks_exact_mut(Pixel::BYTES) {
            chunk.copy_from_slice(&raw);
        }
    }

    /// Write raw bytes starting at `offset`, truncating at the end of the plane.
    ///
    /// Returns the number of bytes written. An offset past the end is an error;
    /// an offset exactly at the end writes nothing.
    pub fn write(&mut self, offset: usize, data: &[u8]) -> Result<usize> {
        let tail = self
            .bytes
            .get_mut(offset..)
            .ok_or(Error::FrameOffsetOutOfRange(offset))?;
        let count = data.len().min(tail.len());
        let (head, _) = tail.split_at_mut(count);
        let (data, _) = data.split_at(count);
        head.copy_from_slice(data);
        Ok(count)
    }

    /// Read raw bytes starting at `offset` into `buffer`; returns the count copied.
    #[must_use]
    pub fn read(&self, offset: usize, buffer: &mut [u8]) -> usize {
        let Some(tail) = self.bytes.get(offset..) else {
            return 0;
        };
        let count = buffer.len().min(tail.len());
        let (head, _) = buffer.split_at_mut(count);
        let (tail, _) = tail.split_at(count);
        head.copy_from_slice(tail);
        count
    }

    /// Copy `other`'s contents into this plane (same dimensions).
    pub(crate) fn copy_from(&mut self, other: &Self) {
        self.bytes.copy_from_slice(&other.bytes);
    }
}
