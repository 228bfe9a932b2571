//! Panels and the geometry mapper: chain-local pixel index → frame coordinate.
//!
//! A panel is one physical segment of the chain (strip, matrix, ring). Its
//! [`Mapping`] decides where each pixel lands on the frame plane:
//!
//! - [`Mapping::Linear`]: index decomposed row-major (or column-major) over
//!   the panel's width and height, optionally inverted per axis.
//! - [`Mapping::Meander`]: like linear, but every odd column (column-major) or
//!   odd row (row-major) runs backwards, as on serpentine-wired matrices.
//! - [`Mapping::Custom`]: a [`PanelGeometry`] such as a [`shape::PixelMap`]
//!   table for rings and arcs.
//!
//! Results are offset by the panel origin. Coordinates that fall off the
//! frame are tolerated; the compositor renders them dark.

pub mod catalog;
pub mod shape;

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::compositor::PixelSampler;
use crate::topology::Label;

/// A signed frame coordinate. Values outside the frame are legal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Coord {
    /// Column, growing to the right.
    pub x: i32,
    /// Row, growing downward.
    pub y: i32,
}

impl Coord {
    /// A coordinate guaranteed to be off every frame.
    pub const OFF_CANVAS: Self = Self::new(-1, -1);

    /// Coordinate from its column and row.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Wiring order flags for rectangular panels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Layout {
    /// Pixels run down columns first (`y = i % height`, `x = i / height`).
    pub column_major: bool,
    /// Mirror horizontally within the panel.
    pub invert_x: bool,
    /// Mirror vertically within the panel.
    pub invert_y: bool,
}

impl Layout {
    /// Row-major, no inversion.
    pub const ROW_MAJOR: Self = Self {
        column_major: false,
        invert_x: false,
        invert_y: false,
    };

    /// Column-major, no inversion.
    pub const COLUMN_MAJOR: Self = Self {
        column_major: true,
        invert_x: false,
        invert_y: false,
    };
}

/// Custom per-panel geometry.
///
/// Implement this for panels whose pixels do not sit on a plain grid.
/// [`map`](Self::map) must return frame coordinates (origin already applied).
pub trait PanelGeometry: Sync {
    /// Frame coordinate of the panel's `index`-th pixel.
    fn map(&self, panel: &Panel, index: usize) -> Coord;

    /// Number of pixels the geometry knows about, if fixed.
    ///
    /// Chain construction rejects a panel whose pixel count differs.
    fn pixel_count(&self) -> Option<usize> {
        None
    }
}

/// How a panel's pixel indices map onto the frame.
#[derive(Clone, Copy)]
pub enum Mapping {
    /// Plain grid (see [`Layout`]).
    Linear,
    /// Serpentine grid.
    Meander,
    /// Caller-supplied geometry; takes precedence over the layout flags.
    Custom(&'static dyn PanelGeometry),
}

impl fmt::Debug for Mapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linear => f.write_str("Linear"),
            Self::Meander => f.write_str("Meander"),
            Self::Custom(_) => f.write_str("Custom"),
        }
    }
}

/// One resolved panel of a chain.
///
/// Panels are created by [`Chain`](crate::topology::Chain) construction and
/// are immutable afterwards.
#[derive(Clone)]
pub struct Panel {
    pub(crate) id: u32,
    pub(crate) compatible: Label,
    pub(crate) x: u32,
    pub(crate) y: u32,
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) pixel_count: usize,
    pub(crate) pitch: u32,
    pub(crate) layout: Layout,
    pub(crate) mapping: Mapping,
    pub(crate) sampler: Option<&'static dyn PixelSampler>,
    pub(crate) brightness: u8,
    pub(crate) current_limit: u32,
    pub(crate) first_slot: usize,
}

impl fmt::Debug for Panel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Panel")
            .field("id", &self.id)
            .field("compatible", &self.compatible)
            .field("origin", &(self.x, self.y))
            .field("size", &(self.width, self.height))
            .field("pixel_count", &self.pixel_count)
            .field("mapping", &self.mapping)
            .field("brightness", &self.brightness)
            .field("current_limit", &self.current_limit)
            .finish_non_exhaustive()
    }
}

impl Panel {
    /// Sequence id (chain order).
    #[must_use]
    pub const fn id(&self) -> u32 {
        self.id
    }

    /// Compatible tag the panel was resolved from.
    #[must_use]
    pub fn compatible(&self) -> &str {
        &self.compatible
    }

    /// Frame origin of the panel.
    #[must_use]
    pub const fn origin(&self) -> (u32, u32) {
        (self.x, self.y)
    }

    /// Extent in frame columns.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Extent in frame rows.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// LEDs on this panel; may differ from `width * height` for shaped panels.
    #[must_use]
    pub const fn pixel_count(&self) -> usize {
        self.pixel_count
    }

    /// Physical LED pitch in pixels per meter (informational, 0 if unknown).
    #[must_use]
    pub const fn pitch(&self) -> u32 {
        self.pitch
    }

    /// Resolved wiring flags.
    #[must_use]
    pub const fn layout(&self) -> Layout {
        self.layout
    }

    /// How indices become coordinates.
    #[must_use]
    pub const fn mapping(&self) -> Mapping {
        self.mapping
    }

    /// Panel-level sampler override, if any.
    #[must_use]
    pub fn sampler(&self) -> Option<&'static dyn PixelSampler> {
        self.sampler
    }

    /// Panel brightness (0..=255), independent of the device's global brightness.
    #[must_use]
    pub const fn brightness(&self) -> u8 {
        self.brightness
    }

    /// Panel current limit in mA; 0 means unlimited.
    #[must_use]
    pub const fn current_limit(&self) -> u32 {
        self.current_limit
    }

    /// Chain-relative index of this panel's first pixel.
    #[must_use]
    pub const fn first_slot(&self) -> usize {
        self.first_slot
    }

    /// Whether `chain_index` belongs to this panel.
    #[must_use]
    pub const fn contains_slot(&self, chain_index: usize) -> bool {
        chain_index >= self.first_slot
            && chain_index < self.first_slot.saturating_add(self.pixel_count)
    }

    /// Frame coordinate of the panel's `index`-th pixel.
    #[must_use]
    pub fn map(&self, index: usize) -> Coord {
        match self.mapping {
            Mapping::Linear => self.offset(self.grid_position(index)),
            Mapping::Meander => self.offset(self.meander_position(index)),
            Mapping::Custom(geometry) => geometry.map(self, index),
        }
    }

    /// Panel-local grid position with axis inversions applied.
    fn grid_position(&self, index: usize) -> (i64, i64) {
        let width = i64::from(self.width.max(1));
        let height = i64::from(self.height.max(1));
        let index = i64::try_from(index).unwrap_or(i64::MAX);

        let (mut x, mut y) = if self.layout.column_major {
            split(index, height)
        } else {
            let (y, x) = split(index, width);
            (x, y)
        };
        if self.layout.invert_x {
            x = mirror(x, width);
        }
        if self.layout.invert_y {
            y = mirror(y, height);
        }
        (x, y)
    }

    fn meander_position(&self, index: usize) -> (i64, i64) {
        let (mut x, mut y) = self.grid_position(index);
        if self.layout.column_major {
            if x & 1 != 0 {
                y = mirror(y, i64::from(self.height));
            }
        } else if y & 1 != 0 {
            x = mirror(x, i64::from(self.width));
        }
        (x, y)
    }

    fn offset(&self, (x, y): (i64, i64)) -> Coord {
        let x = x.saturating_add(i64::from(self.x));
        let y = y.saturating_add(i64::from(self.y));
        Coord::new(
            i32::try_from(x).unwrap_or(i32::MIN),
            i32::try_from(y).unwrap_or(i32::MIN),
        )
    }
}

/// `(index / span, index % span)`; `span` is at least 1.
fn split(index: i64, span: i64) -> (i64, i64) {
    (
        index.checked_div(span).unwrap_or(0),
        index.checked_rem(span).unwrap_or(0),
    )
}

/// Position `value` counted from the far end of `span`.
const fn mirror(value: i64, span: i64) -> i64 {
    span.saturating_sub(1).saturating_sub(value)
}
