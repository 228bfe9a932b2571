//! Known panel types, looked up by compatible tag.
//!
//! Each [`PanelKind`] gives the defaults a descriptor starts from and which of
//! them a descriptor may change. The built-in tables cover the common
//! WorldSemi, NeoPixel, DotStar and Shiji products; applications with other
//! hardware pass their own table to
//! [`Chain::with_catalog`](crate::topology::Chain::with_catalog).

use core::fmt;

use super::shape::{ARC_15, RING_12, RING_16, RING_24};
use super::{Layout, Mapping};
use crate::compositor::PixelSampler;

/// Which properties a descriptor may override.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Overrides {
    /// Layout flags (column-major, inversions, meander).
    pub layout: bool,
    /// Panel width.
    pub width: bool,
    /// Panel height.
    pub height: bool,
    /// LED pitch.
    pub pitch: bool,
}

impl Overrides {
    /// Nothing may change.
    pub const NONE: Self = Self {
        layout: false,
        width: false,
        height: false,
        pitch: false,
    };

    /// Only the layout flags may change.
    pub const LAYOUT: Self = Self {
        layout: true,
        ..Self::NONE
    };

    /// Everything may change.
    pub const ALL: Self = Self {
        layout: true,
        width: true,
        height: true,
        pitch: true,
    };
}

/// The axis a descriptor's multiply factor extends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Multiply {
    /// Segments are chained horizontally.
    Width,
    /// Segments are stacked vertically.
    Height,
}

/// Defaults and permissions for one compatible tag.
#[derive(Clone, Copy)]
pub struct PanelKind {
    /// Tag descriptors refer to, e.g. `adafruit,neopixel,ring,16`.
    pub compatible: &'static str,
    /// Default width in pixels.
    pub width: u32,
    /// Default height in pixels.
    pub height: u32,
    /// Explicit pixel count; `None` means `width * height`.
    pub pixel_count: Option<usize>,
    /// LEDs per meter, 0 when not meaningful.
    pub pitch: u32,
    /// Wiring flags before any descriptor override.
    pub layout: Layout,
    /// Index to coordinate rule.
    pub mapping: Mapping,
    /// Sampler replacing the default one, if the hardware needs it.
    pub sampler: Option<&'static dyn PixelSampler>,
    /// What a descriptor may change.
    pub overrides: Overrides,
    /// Axis extended by the multiply factor; `None` forbids multiplying.
    pub multiply: Option<Multiply>,
    /// Default current limit in mA, 0 for none.
    pub current_limit: u32,
}

impl fmt::Debug for PanelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PanelKind")
            .field("compatible", &self.compatible)
            .field("size", &(self.width, self.height))
            .field("pixel_count", &self.pixel_count)
            .field("mapping", &self.mapping)
            .field("overrides", &self.overrides)
            .field("multiply", &self.multiply)
            .finish_non_exhaustive()
    }
}

impl PanelKind {
    /// A single-pixel segment meant to be multiplied into a strip.
    #[must_use]
    pub const fn strip(compatible: &'static str, pitch: u32, overrides: Overrides) -> Self {
        Self {
            compatible,
            width: 1,
            height: 1,
            pixel_count: None,
            pitch,
            layout: Layout::ROW_MAJOR,
            mapping: Mapping::Linear,
            sampler: None,
            overrides,
            multiply: Some(Multiply::Width),
            current_limit: 0,
        }
    }

    /// A fixed rectangular grid.
    #[must_use]
    pub const fn grid(compatible: &'static str, width: u32, height: u32, pitch: u32) -> Self {
        Self {
            compatible,
            width,
            height,
            pixel_count: None,
            pitch,
            layout: Layout::ROW_MAJOR,
            mapping: Mapping::Linear,
            sampler: None,
            overrides: Overrides::LAYOUT,
            multiply: None,
            current_limit: 0,
        }
    }

    /// A serpentine-wired matrix.
    #[must_use]
    pub const fn meander(
        compatible: &'static str,
        width: u32,
        height: u32,
        layout: Layout,
        pitch: u32,
    ) -> Self {
        Self {
            layout,
            mapping: Mapping::Meander,
            ..Self::grid(compatible, width, height, pitch)
        }
    }

    /// A non-grid panel placed by a coordinate table.
    #[must_use]
    pub const fn shaped(
        compatible: &'static str,
        width: u32,
        height: u32,
        pixel_count: usize,
        mapping: Mapping,
    ) -> Self {
        Self {
            pixel_count: Some(pixel_count),
            mapping,
            overrides: Overrides::NONE,
            ..Self::grid(compatible, width, height, 0)
        }
    }
}

/// WS2812B (800 kHz) panels.
pub static WS2812B_PANELS: &[PanelKind] = &[
    PanelKind::strip("worldsemi,ws2812b,strip", 0, Overrides::ALL),
    PanelKind::strip("adafruit,neopixel,strip,30", 30, Overrides::LAYOUT),
    PanelKind::strip("adafruit,neopixel,strip,60", 60, Overrides::LAYOUT),
    PanelKind::strip("adafruit,neopixel,strip,144", 144, Overrides::LAYOUT),
    PanelKind::shaped("adafruit,neopixel,ring,12", 6, 6, 12, Mapping::Custom(&RING_12)),
    PanelKind::shaped("adafruit,neopixel,ring,16", 8, 8, 16, Mapping::Custom(&RING_16)),
    PanelKind::shaped("adafruit,neopixel,ring,24", 10, 10, 24, Mapping::Custom(&RING_24)),
    PanelKind::shaped("adafruit,neopixel,arc,15", 8, 8, 15, Mapping::Custom(&ARC_15)),
    PanelKind::meander("adafruit,neopixel,matrix,8x8", 8, 8, Layout::ROW_MAJOR, 112),
    PanelKind::meander("adafruit,neopixel,matrix,16x16", 16, 16, Layout::ROW_MAJOR, 112),
    PanelKind::meander("adafruit,neopixel,matrix,32x8", 32, 8, Layout::COLUMN_MAJOR, 112),
    PanelKind::grid("adafruit,neopixel,stick,8", 8, 1, 156),
];

/// WS2812 (400 kHz) panels.
pub static WS2812_PANELS: &[PanelKind] =
    &[PanelKind::strip("worldsemi,ws2812,strip", 0, Overrides::ALL)];

/// APA102 panels.
pub static APA102_PANELS: &[PanelKind] = &[
    PanelKind::strip("shiji-led,apa102,strip,30", 30, Overrides::LAYOUT),
    PanelKind::strip("shiji-led,apa102,strip,60", 60, Overrides::LAYOUT),
    PanelKind::strip("shiji-led,apa102,strip,144", 144, Overrides::LAYOUT),
    PanelKind::strip("adafruit,dotstar,strip,30", 30, Overrides::LAYOUT),
    PanelKind::strip("adafruit,dotstar,strip,60", 60, Overrides::LAYOUT),
    PanelKind::strip("adafruit,dotstar,strip,144", 144, Overrides::LAYOUT),
];

/// Find the entry for `compatible`.
#[must_use]
pub fn find<'a>(catalog: &'a [PanelKind], compatible: &str) -> Option<&'a PanelKind> {
    catalog.iter().find(|kind| kind.compatible == compatible)
}
