//! Compile-time coordinate tables for panels that are not plain grids.
//!
//! See [`PixelMap`] for the table type and the built-in ring and arc shapes.

use super::{Coord, Panel, PanelGeometry};

/// Compile-time table of `(x, y)` cells, one per pixel in wiring order.
///
/// Unlike a full grid layout, a `PixelMap` may be sparse: a 12-pixel ring
/// occupies 12 cells of a 6×6 bounding box. Coordinates are relative to the
/// panel origin.
///
/// Tables are validated at **compile time** when built in a `const`:
/// - every coordinate lies inside the `width` × `height` box
/// - no cell is used twice
///
/// # Example
///
/// ```rust
/// use rgbled_canvas::panel::shape::PixelMap;
///
/// // A 4-pixel diamond in a 3×3 box.
/// const DIAMOND: PixelMap<4> = PixelMap::new(3, 3, [(1, 0), (2, 1), (1, 2), (0, 1)]);
/// const MIRRORED: PixelMap<4> = DIAMOND.flip_h();
/// assert_eq!(MIRRORED.index_to_xy(), &[(1, 0), (0, 1), (1, 2), (2, 1)]);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelMap<const N: usize> {
    width: u16,
    height: u16,
    map: [(u16, u16); N],
}

#[allow(
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects,
    reason = "const loops stay below N and coordinates are checked against the box"
)]
impl<const N: usize> PixelMap<N> {
    /// Constructor: verifies every cell is in-bounds and used at most once.
    #[must_use]
    pub const fn new(width: u16, height: u16, map: [(u16, u16); N]) -> Self {
        assert!(width > 0 && height > 0, "width and height must be positive");
        assert!(
            N <= width as usize * height as usize,
            "more pixels than cells"
        );

        let mut i = 0;
        while i < N {
            let (c, r) = map[i];
            assert!(c < width, "column out of bounds");
            assert!(r < height, "row out of bounds");

            let mut j = i + 1;
            while j < N {
                assert!(
                    !(map[j].0 == c && map[j].1 == r),
                    "duplicate (col,row) in mapping"
                );
                j += 1;
            }
            i += 1;
        }

        Self { width, height, map }
    }

    /// Return the array mapping wiring order to `(x, y)` coordinates.
    #[must_use]
    pub const fn index_to_xy(&self) -> &[(u16, u16); N] {
        &self.map
    }

    /// Width of the bounding box.
    #[must_use]
    pub const fn width(&self) -> u16 {
        self.width
    }

    /// Height of the bounding box.
    #[must_use]
    pub const fn height(&self) -> u16 {
        self.height
    }

    /// Number of pixels in the table.
    #[must_use]
    pub const fn len(&self) -> usize {
        N
    }

    /// True for a table without pixels.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        N == 0
    }

    /// Mirror left-to-right inside the bounding box.
    #[must_use]
    pub const fn flip_h(self) -> Self {
        let mut map = self.map;
        let mut i = 0;
        while i < N {
            map[i].0 = self.width - 1 - map[i].0;
            i += 1;
        }
        Self::new(self.width, self.height, map)
    }

    /// Mirror top-to-bottom inside the bounding box.
    #[must_use]
    pub const fn flip_v(self) -> Self {
        let mut map = self.map;
        let mut i = 0;
        while i < N {
            map[i].1 = self.height - 1 - map[i].1;
            i += 1;
        }
        Self::new(self.width, self.height, map)
    }

    /// Rotate 90° clockwise; the bounding box becomes `height` × `width`.
    #[must_use]
    pub const fn rotate_cw(self) -> Self {
        let mut map = self.map;
        let mut i = 0;
        while i < N {
            let (x, y) = self.map[i];
            map[i] = (self.height - 1 - y, x);
            i += 1;
        }
        Self::new(self.height, self.width, map)
    }
}

impl<const N: usize> PanelGeometry for PixelMap<N> {
    fn map(&self, panel: &Panel, index: usize) -> Coord {
        let Some(&(x, y)) = self.map.get(index) else {
            return Coord::OFF_CANVAS;
        };
        let (origin_x, origin_y) = panel.origin();
        let x = i64::from(origin_x).saturating_add(i64::from(x));
        let y = i64::from(origin_y).saturating_add(i64::from(y));
        match (i32::try_from(x), i32::try_from(y)) {
            (Ok(x), Ok(y)) => Coord::new(x, y),
            _ => Coord::OFF_CANVAS,
        }
    }

    fn pixel_count(&self) -> Option<usize> {
        Some(N)
    }
}

/// NeoPixel ring, 12 pixels, in a 6×6 box.
pub const RING_12: PixelMap<12> = PixelMap::new(
    6,
    6,
    [
        (2, 0),
        (4, 0),
        (5, 1),
        (5, 2),
        (5, 4),
        (4, 5),
        (3, 5),
        (1, 5),
        (0, 4),
        (0, 3),
        (0, 1),
        (1, 0),
    ],
);

/// NeoPixel ring, 16 pixels, in an 8×8 box.
pub const RING_16: PixelMap<16> = PixelMap::new(
    8,
    8,
    [
        (4, 0),
        (5, 0),
        (6, 1),
        (7, 2),
        (7, 4),
        (7, 5),
        (6, 6),
        (5, 7),
        (4, 7),
        (2, 7),
        (1, 6),
        (0, 5),
        (0, 4),
        (0, 2),
        (1, 1),
        (2, 0),
    ],
);

/// NeoPixel ring, 24 pixels, in a 10×10 box.
pub const RING_24: PixelMap<24> = PixelMap::new(
    10,
    10,
    [
        (4, 0),
        (6, 0),
        (7, 1),
        (8, 1),
        (8, 2),
        (9, 3),
        (9, 4),
        (9, 6),
        (8, 7),
        (8, 8),
        (7, 8),
        (6, 9),
        (5, 9),
        (3, 9),
        (2, 8),
        (1, 8),
        (1, 7),
        (0, 6),
        (0, 5),
        (0, 3),
        (1, 2),
        (1, 1),
        (2, 1),
        (3, 0),
    ],
);

/// NeoPixel arc (quarter-ring segments joined to 270°), 15 pixels, in an 8×8 box.
pub const ARC_15: PixelMap<15> = PixelMap::new(
    8,
    8,
    [
        (1, 6),
        (0, 5),
        (0, 4),
        (0, 3),
        (1, 2),
        (1, 1),
        (2, 0),
        (4, 0),
        (5, 0),
        (6, 1),
        (6, 2),
        (7, 3),
        (7, 4),
        (7, 5),
        (6, 6),
    ],
);
