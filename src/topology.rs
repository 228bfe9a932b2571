//! Chain topology: serde descriptors in, validated [`Chain`] of panels out.
//!
//! A [`Topology`] is plain configuration data (it can be stored with
//! [`blob`]). [`Chain::from_topology`] resolves every [`PanelDescriptor`]
//! against the family's panel catalog, validates the result, and lays the
//! panels out in ascending id order, which is the order they sit on the wire.

pub mod blob;

use heapless::Vec;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::compositor::PixelSampler;
use crate::encoder::Family;
use crate::panel::catalog::{self, Multiply, PanelKind};
use crate::panel::{Layout, Mapping, Panel};
use crate::{Error, Result};

/// Maximum panels per chain.
pub const MAX_PANELS: usize = 16;

/// Short, bounded text (names, compatible tags, labels).
pub type Label = heapless::String<32>;

/// Make a [`Label`] from a `&str`.
pub fn label(text: &str) -> Result<Label> {
    Ok(Label::try_from(text)?)
}

/// One panel as configured.
///
/// Optional fields fall back to the catalog defaults of the panel kind.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelDescriptor {
    /// Catalog tag of the panel kind.
    pub compatible: Label,
    /// Sequence id; panels are chained in ascending id order.
    pub id: u32,
    /// Frame column of the panel origin.
    pub x: u32,
    /// Frame row of the panel origin.
    pub y: u32,
    /// Width override.
    pub width: Option<u32>,
    /// Height override.
    pub height: Option<u32>,
    /// LED pitch override.
    pub pitch: Option<u32>,
    /// Request column-major wiring.
    pub column_major: bool,
    /// Request horizontal mirroring.
    pub invert_x: bool,
    /// Request vertical mirroring.
    pub invert_y: bool,
    /// Request serpentine wiring.
    pub meander: bool,
    /// Number of catalog segments joined into this panel.
    pub multiply: Option<u32>,
    /// Panel brightness; values above 255 are clamped.
    pub brightness: Option<u32>,
    /// Panel current limit in mA, combined with the kind's default by `min`.
    pub current_limit: Option<u32>,
}

impl PanelDescriptor {
    /// Descriptor with all defaults for `compatible`.
    pub fn new(compatible: &str, id: u32) -> Result<Self> {
        Ok(Self {
            compatible: label(compatible)?,
            id,
            ..Self::default()
        })
    }

    /// Place the panel origin.
    #[must_use]
    pub fn at(mut self, x: u32, y: u32) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    /// Override width and height.
    #[must_use]
    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// Request layout flags. They add to the flags of the panel kind.
    #[must_use]
    pub fn layout(mut self, layout: Layout) -> Self {
        self.column_major = layout.column_major;
        self.invert_x = layout.invert_x;
        self.invert_y = layout.invert_y;
        self
    }

    /// Request serpentine wiring.
    #[must_use]
    pub fn meander(mut self) -> Self {
        self.meander = true;
        self
    }

    /// Join `factor` catalog segments into one panel.
    #[must_use]
    pub fn multiply(mut self, factor: u32) -> Self {
        self.multiply = Some(factor);
        self
    }

    /// Set the panel brightness.
    #[must_use]
    pub fn brightness(mut self, brightness: u32) -> Self {
        self.brightness = Some(brightness);
        self
    }

    /// Set the panel current limit, mA.
    #[must_use]
    pub fn current_limit(mut self, milliamps: u32) -> Self {
        self.current_limit = Some(milliamps);
        self
    }

    const fn requested_layout(&self) -> Layout {
        Layout {
            column_major: self.column_major,
            invert_x: self.invert_x,
            invert_y: self.invert_y,
        }
    }

    /// Resolve against a catalog entry into a panel (slot assigned later).
    fn resolve(&self, kind: &PanelKind) -> Result<Panel> {
        let id = self.id;
        let locked = |property| Error::LockedProperty {
            panel_id: id,
            property,
        };

        // Requested flags add to the catalog layout; they never clear it.
        let mut layout = kind.layout;
        let mut mapping = kind.mapping;
        if self.requested_layout() != Layout::default() || self.meander {
            if !kind.overrides.layout {
                return Err(locked("layout"));
            }
            layout.column_major |= self.column_major;
            layout.invert_x |= self.invert_x;
            layout.invert_y |= self.invert_y;
            if self.meander {
                mapping = Mapping::Meander;
            }
        }

        let mut width = kind.width;
        if let Some(value) = self.width {
            if !kind.overrides.width {
                return Err(locked("width"));
            }
            width = value;
        }
        let mut height = kind.height;
        if let Some(value) = self.height {
            if !kind.overrides.height {
                return Err(locked("height"));
            }
            height = value;
        }
        let mut pitch = kind.pitch;
        if let Some(value) = self.pitch {
            if !kind.overrides.pitch {
                return Err(locked("pitch"));
            }
            pitch = value;
        }

        let mut pixel_count = kind.pixel_count;
        if let Some(factor) = self.multiply {
            match kind.multiply {
                Some(Multiply::Width) => width = width.saturating_mul(factor),
                Some(Multiply::Height) => height = height.saturating_mul(factor),
                None => return Err(locked("multiply")),
            }
            pixel_count = pixel_count.map(|count| count.saturating_mul(factor as usize));
        }
        let pixel_count =
            pixel_count.unwrap_or_else(|| (width as usize).saturating_mul(height as usize));
        if width == 0 || height == 0 || pixel_count == 0 {
            return Err(Error::EmptyPanel(id));
        }

        if let Mapping::Custom(geometry) = mapping {
            if let Some(geometry_len) = geometry.pixel_count() {
                if geometry_len != pixel_count {
                    return Err(Error::ShapeMismatch {
                        panel_id: id,
                        geometry: geometry_len,
                        pixels: pixel_count,
                    });
                }
            }
        }

        let current_limit = match (kind.current_limit, self.current_limit.unwrap_or(0)) {
            (0, configured) => configured,
            (default, 0) => default,
            (default, configured) => default.min(configured),
        };

        Ok(Panel {
            id,
            compatible: self.compatible.clone(),
            x: self.x,
            y: self.y,
            width,
            height,
            pixel_count,
            pitch,
            layout,
            mapping,
            sampler: kind.sampler,
            brightness: self.brightness.map_or(u8::MAX, clamp_u8),
            current_limit,
            first_slot: 0,
        })
    }
}

/// Device-wide settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSettings {
    /// Device name, used as the prefix of exposed LED labels.
    pub name: Label,
    /// LED family of the whole chain.
    pub family: Family,
    /// Initial global brightness; values above 255 are clamped.
    pub brightness: u32,
    /// Global current limit in mA; 0 means unlimited.
    pub current_limit: u32,
    /// Red LED current at full scale, mA.
    pub max_current_red: u32,
    /// Green LED current at full scale, mA.
    pub max_current_green: u32,
    /// Blue LED current at full scale, mA.
    pub max_current_blue: u32,
    /// Idle current per pixel, mA.
    pub base_current: u32,
    /// Shortest interval between refreshes, ms.
    pub refresh_floor_ms: u32,
}

impl DeviceSettings {
    /// Settings with typical 5050-package LED currents and no global limit.
    pub fn new(name: &str, family: Family) -> Result<Self> {
        Ok(Self {
            name: label(name)?,
            family,
            brightness: u32::from(u8::MAX),
            current_limit: 0,
            max_current_red: 20,
            max_current_green: 20,
            max_current_blue: 20,
            base_current: 1,
            refresh_floor_ms: 10,
        })
    }
}

/// Settings plus the panel list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topology {
    /// Device-wide settings.
    pub settings: DeviceSettings,
    /// Panels in configuration order (not necessarily chain order).
    pub panels: Vec<PanelDescriptor, MAX_PANELS>,
}

impl Topology {
    /// Topology without panels.
    #[must_use]
    pub const fn new(settings: DeviceSettings) -> Self {
        Self {
            settings,
            panels: Vec::new(),
        }
    }

    /// Append a panel descriptor.
    pub fn push(&mut self, panel: PanelDescriptor) -> Result<()> {
        self.panels.push(panel).map_err(|_| Error::TooManyPanels)
    }

    /// Builder form of [`push`](Self::push).
    pub fn with_panel(mut self, panel: PanelDescriptor) -> Result<Self> {
        self.push(panel)?;
        Ok(self)
    }
}

/// Validated, ordered panels plus the canvas extent.
#[derive(Clone, Debug)]
pub struct Chain {
    panels: Vec<Panel, MAX_PANELS>,
    width: u32,
    height: u32,
    pixel_count: usize,
    sampler: Option<SamplerRef>,
}

// Wrapper so `Chain` can derive `Debug`.
#[derive(Clone, Copy)]
struct SamplerRef(&'static dyn PixelSampler);

impl core::fmt::Debug for SamplerRef {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("PixelSampler")
    }
}

impl Chain {
    /// Resolve a topology against its family's built-in catalog.
    pub fn from_topology(topology: &Topology) -> Result<Self> {
        Self::with_catalog(&topology.panels, topology.settings.family.catalog())
    }

    /// Resolve descriptors against a caller-supplied catalog.
    pub fn with_catalog(descriptors: &[PanelDescriptor], catalog: &[PanelKind]) -> Result<Self> {
        if descriptors.is_empty() {
            warn!("topology: no panels");
            return Err(Error::NoPixels);
        }

        let mut panels: Vec<Panel, MAX_PANELS> = Vec::new();
        for descriptor in descriptors {
            let kind = catalog::find(catalog, &descriptor.compatible).ok_or_else(|| {
                warn!("topology: panel {} has unknown compatible", descriptor.id);
                Error::UnknownCompatible(descriptor.id)
            })?;
            let panel = descriptor.resolve(kind).inspect_err(|_| {
                warn!("topology: panel {} rejected", descriptor.id);
            })?;
            panels.push(panel).map_err(|_| Error::TooManyPanels)?;
        }

        panels.sort_unstable_by_key(Panel::id);
        if let Some((_, duplicate)) = panels
            .iter()
            .tuple_windows()
            .find(|(left, right)| left.id == right.id)
        {
            warn!("topology: duplicate panel id {}", duplicate.id);
            return Err(Error::DuplicatePanelId(duplicate.id));
        }

        let mut next_slot = 0usize;
        for panel in &mut panels {
            panel.first_slot = next_slot;
            next_slot = next_slot.saturating_add(panel.pixel_count);
        }

        let width = panels
            .iter()
            .map(|panel| panel.x.saturating_add(panel.width))
            .max()
            .unwrap_or(0);
        let height = panels
            .iter()
            .map(|panel| panel.y.saturating_add(panel.height))
            .max()
            .unwrap_or(0);

        info!(
            "topology: {} panels, {} pixels, canvas {}x{}",
            panels.len(),
            next_slot,
            width,
            height
        );
        Ok(Self {
            panels,
            width,
            height,
            pixel_count: next_slot,
            sampler: None,
        })
    }

    /// Use `sampler` for every panel without a panel-level override.
    #[must_use]
    pub fn with_sampler(mut self, sampler: &'static dyn PixelSampler) -> Self {
        self.sampler = Some(SamplerRef(sampler));
        self
    }

    /// Chain-level sampler override, if any.
    #[must_use]
    pub fn sampler(&self) -> Option<&'static dyn PixelSampler> {
        self.sampler.map(|SamplerRef(sampler)| sampler)
    }

    /// Panels in chain order.
    #[must_use]
    pub fn panels(&self) -> &[Panel] {
        &self.panels
    }

    /// Panel with sequence id `id`.
    pub fn panel(&self, id: u32) -> Result<&Panel> {
        self.panels
            .iter()
            .find(|panel| panel.id == id)
            .ok_or(Error::UnknownPanel(id))
    }

    /// Canvas width: rightmost panel edge.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Canvas height: bottom-most panel edge.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Total pixels across all panels.
    #[must_use]
    pub const fn pixel_count(&self) -> usize {
        self.pixel_count
    }

    /// Panel owning `chain_index` and the index within that panel.
    pub fn locate(&self, chain_index: usize) -> Result<(&Panel, usize)> {
        self.panels
            .iter()
            .find(|panel| panel.contains_slot(chain_index))
            .map(|panel| (panel, chain_index.saturating_sub(panel.first_slot)))
            .ok_or(Error::PixelIndexOutOfRange(chain_index))
    }
}

/// Clamp a configured value into brightness range.
pub(crate) fn clamp_u8(value: u32) -> u8 {
    u8::try_from(value).unwrap_or(u8::MAX)
}
