//! Pixel compositor: frame coordinate → color plus effective brightness.
//!
//! The default sampler reads the stored pixel and multiplies its brightness by
//! the panel and global brightness:
//!
//! ```text
//! effective = stored * global * panel / 255 / 255
//! ```
//!
//! Coordinates outside the frame yield a dark pixel. Panels (via the catalog)
//! or whole chains (via [`Chain::with_sampler`](crate::topology::Chain::with_sampler))
//! can substitute their own [`PixelSampler`], e.g. [`GAMMA_2_2`].

use crate::frame::{FramePlane, RGB8, ScaledPixel};
use crate::panel::{Coord, Panel};
use crate::topology::Chain;

/// Brightness factors applied on top of a stored pixel's own brightness.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BrightnessScale {
    /// Device-wide brightness.
    pub global: u8,
    /// Panel brightness.
    pub panel: u8,
}

impl BrightnessScale {
    /// No attenuation.
    pub const FULL: Self = Self {
        global: u8::MAX,
        panel: u8::MAX,
    };

    /// Effective brightness for a stored brightness.
    #[must_use]
    pub fn apply(self, stored: u8) -> u8 {
        let scaled = u32::from(stored)
            .saturating_mul(u32::from(self.global))
            .saturating_mul(u32::from(self.panel))
            / 65_025;
        u8::try_from(scaled).unwrap_or(u8::MAX)
    }
}

/// Produces the output value for one frame coordinate.
pub trait PixelSampler: Sync {
    /// Sample `frame` at `coord` under `scale`.
    fn sample(&self, frame: &FramePlane, coord: Coord, scale: BrightnessScale) -> ScaledPixel;
}

/// The default sampling rule.
#[must_use]
pub fn sample(frame: &FramePlane, coord: Coord, scale: BrightnessScale) -> ScaledPixel {
    frame
        .pixel(coord.x, coord.y)
        .map_or(ScaledPixel::DARK, |pixel| {
            ScaledPixel::new(pixel.rgb(), scale.apply(pixel.brightness))
        })
}

/// [`PixelSampler`] form of [`sample`].
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultSampler;

impl PixelSampler for DefaultSampler {
    fn sample(&self, frame: &FramePlane, coord: Coord, scale: BrightnessScale) -> ScaledPixel {
        sample(frame, coord, scale)
    }
}

/// Composite the `index`-th pixel of `panel`.
///
/// Sampler precedence: panel override, then chain override, then default.
#[must_use]
pub fn composite(
    chain: &Chain,
    panel: &Panel,
    index: usize,
    frame: &FramePlane,
    global_brightness: u8,
) -> ScaledPixel {
    let coord = panel.map(index);
    let scale = BrightnessScale {
        global: global_brightness,
        panel: panel.brightness(),
    };
    match panel.sampler().or_else(|| chain.sampler()) {
        Some(sampler) => sampler.sample(frame, coord, scale),
        None => sample(frame, coord, scale),
    }
}

// ============================================================================
// Gamma Correction
// ============================================================================

/// Gamma correction curve.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Gamma {
    /// Linear gamma (no correction). Gamma = 1.0
    Linear,
    /// Standard gamma 2.2 correction for perceived brightness.
    #[default]
    Gamma2_2,
}

impl Gamma {
    /// Correct one 8-bit channel value.
    #[must_use]
    #[allow(
        clippy::indexing_slicing,
        reason = "the table has an entry for every u8"
    )]
    pub const fn correct(self, value: u8) -> u8 {
        match self {
            Self::Linear => value,
            Self::Gamma2_2 => GAMMA_2_2_TABLE[value as usize],
        }
    }

    /// Correct all three channels.
    #[must_use]
    pub const fn correct_rgb(self, color: RGB8) -> RGB8 {
        RGB8::new(
            self.correct(color.r),
            self.correct(color.g),
            self.correct(color.b),
        )
    }
}

/// Gamma 2.2 lookup table for 8-bit values.
/// Pre-computed to avoid floating point math: corrected = (value/255)^2.2 * 255
const GAMMA_2_2_TABLE: [u8; 256] = [
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 2, 2, 2, 2, 2, 2, 2,
    3, 3, 3, 3, 3, 4, 4, 4, 4, 5, 5, 5, 5, 6, 6, 6, 6, 7, 7, 7, 8, 8, 8, 9, 9, 9, 10, 10, 11, 11,
    11, 12, 12, 13, 13, 13, 14, 14, 15, 15, 16, 16, 17, 17, 18, 18, 19, 19, 20, 20, 21, 22, 22, 23,
    23, 24, 25, 25, 26, 26, 27, 28, 28, 29, 30, 30, 31, 32, 33, 33, 34, 35, 35, 36, 37, 38, 39, 39,
    40, 41, 42, 43, 43, 44, 45, 46, 47, 48, 49, 49, 50, 51, 52, 53, 54, 55, 56, 57, 58, 59, 60, 61,
    62, 63, 64, 65, 66, 67, 68, 69, 70, 71, 73, 74, 75, 76, 77, 78, 79, 81, 82, 83, 84, 85, 87, 88,
    89, 90, 91, 93, 94, 95, 97, 98, 99, 100, 102, 103, 105, 106, 107, 109, 110, 111, 113, 114, 116,
    117, 119, 120, 121, 123, 124, 126, 127, 129, 130, 132, 133, 135, 137, 138, 140, 141, 143, 145,
    146, 148, 149, 151, 153, 154, 156, 158, 159, 161, 163, 165, 166, 168, 170, 172, 173, 175, 177,
    179, 181, 182, 184, 186, 188, 190, 192, 194, 196, 197, 199, 201, 203, 205, 207, 209, 211, 213,
    215, 217, 219, 221, 223, 225, 227, 229, 231, 234, 236, 238, 240, 242, 244, 246, 248, 251, 253,
    255,
];

/// Sampler that gamma-corrects the color before the default brightness scaling.
#[derive(Clone, Copy, Debug, Default)]
pub struct GammaSampler(pub Gamma);

impl PixelSampler for GammaSampler {
    fn sample(&self, frame: &FramePlane, coord: Coord, scale: BrightnessScale) -> ScaledPixel {
        let sampled = sample(frame, coord, scale);
        ScaledPixel::new(self.0.correct_rgb(sampled.color), sampled.brightness)
    }
}

/// Gamma 2.2 sampler, ready to hand to a catalog entry or chain.
pub static GAMMA_2_2: GammaSampler = GammaSampler(Gamma::Gamma2_2);
