//! The shared device instance: frame plane, control attributes, statistics.
//!
//! [`LedCanvas`] is what applications and the refresh worker share. It is
//! `Sync`; on a target it normally lives in a `static` (e.g. via `StaticCell`)
//! and is handed out as `&'static LedCanvas`.
//!
//! - The **frame surface** ([`write`](LedCanvas::write), [`set_pixel`](LedCanvas::set_pixel),
//!   [`update`](LedCanvas::update), ...) edits the frame plane.
//! - The **control surface** ([`set_brightness`](LedCanvas::set_brightness),
//!   [`set_current_limit`](LedCanvas::set_current_limit), ...) changes device
//!   attributes and reads statistics.
//!
//! Every successful mutation raises the dirty signal; the
//! [`Refresher`](crate::refresh::Refresher) coalesces them into refreshes.

pub mod channel_led;

use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::Duration;
use heapless::Vec as BoundedVec;

use crate::budget::{Budget, Converged, PowerModel};
use crate::encoder::Family;
use crate::frame::{FramePlane, Pixel};
use crate::topology::{Chain, DeviceSettings, Label, MAX_PANELS, Topology, clamp_u8};
use crate::{Error, Result};

/// Signal raised whenever the canvas needs to be pushed to the LEDs.
pub type DirtySignal = Signal<CriticalSectionRawMutex, ()>;

/// One of the three LED colors, for per-color current settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Primary {
    /// Red LED.
    Red,
    /// Green LED.
    Green,
    /// Blue LED.
    Blue,
}

/// Current statistics of one panel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PanelCurrent {
    /// Estimated draw of the last transmitted frame, mA.
    pub current: u32,
    /// Highest draw seen, mA.
    pub current_max: u32,
}

#[derive(Debug)]
struct DeviceState {
    brightness: u8,
    current_limit: u32,
    power: PowerModel,
    current: u32,
    current_max: u32,
    updates: u32,
    /// Bumped by every attribute write.
    generation: u32,
    panels: BoundedVec<PanelCurrent, MAX_PANELS>,
}

/// A chain of LED panels with its frame plane and controls.
pub struct LedCanvas {
    name: Label,
    family: Family,
    chain: Chain,
    refresh_floor: Duration,
    frame: Mutex<CriticalSectionRawMutex, RefCell<FramePlane>>,
    state: Mutex<CriticalSectionRawMutex, RefCell<DeviceState>>,
    dirty: DirtySignal,
}

impl core::fmt::Debug for LedCanvas {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LedCanvas")
            .field("name", &self.name)
            .field("family", &self.family)
            .field("chain", &self.chain)
            .finish_non_exhaustive()
    }
}

impl LedCanvas {
    /// Largest global brightness.
    pub const MAX_BRIGHTNESS: u32 = 255;
    /// Largest global current limit, mA.
    pub const MAX_CURRENT_LIMIT: u32 = 100_000_000;
    /// Largest per-color LED current, mA.
    pub const MAX_LED_CURRENT: u32 = 10_000;

    /// Build a canvas from a topology using the family's built-in catalog.
    pub fn new(topology: &Topology) -> Result<Self> {
        let chain = Chain::from_topology(topology)?;
        Self::with_chain(&topology.settings, chain)
    }

    /// Build a canvas from an already-resolved chain.
    pub fn with_chain(settings: &DeviceSettings, chain: Chain) -> Result<Self> {
        check_range("current_limit", settings.current_limit, Self::MAX_CURRENT_LIMIT)?;
        for value in [
            settings.max_current_red,
            settings.max_current_green,
            settings.max_current_blue,
        ] {
            check_range("led_max_current", value, Self::MAX_LED_CURRENT)?;
        }

        let mut panels = BoundedVec::new();
        panels
            .resize(chain.panels().len(), PanelCurrent::default())
            .map_err(|()| Error::TooManyPanels)?;
        let state = DeviceState {
            brightness: clamp_u8(settings.brightness),
            current_limit: settings.current_limit,
            power: PowerModel {
                max_current_red: settings.max_current_red,
                max_current_green: settings.max_current_green,
                max_current_blue: settings.max_current_blue,
                base_current: settings.base_current,
            },
            current: 0,
            current_max: 0,
            updates: 0,
            generation: 0,
            panels,
        };

        let canvas = Self {
            name: settings.name.clone(),
            family: settings.family,
            frame: Mutex::new(RefCell::new(FramePlane::new(chain.width(), chain.height()))),
            chain,
            refresh_floor: Duration::from_millis(u64::from(settings.refresh_floor_ms)),
            state: Mutex::new(RefCell::new(state)),
            dirty: Signal::new(),
        };
        info!(
            "canvas: {} pixels ({}x{}) on {}",
            canvas.chain.pixel_count(),
            canvas.chain.width(),
            canvas.chain.height(),
            canvas.family.name()
        );
        // first refresh blanks whatever the LEDs showed at power-up
        canvas.dirty.signal(());
        Ok(canvas)
    }

    /// Device name from the settings.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// LED family the chain is encoded for.
    #[must_use]
    pub const fn family(&self) -> Family {
        self.family
    }

    /// The resolved panel chain.
    #[must_use]
    pub const fn chain(&self) -> &Chain {
        &self.chain
    }

    /// Frame plane width.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.chain.width()
    }

    /// Frame plane height.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.chain.height()
    }

    /// Total LEDs in the chain.
    #[must_use]
    pub const fn pixel_count(&self) -> usize {
        self.chain.pixel_count()
    }

    /// Shortest interval between refreshes.
    #[must_use]
    pub const fn refresh_floor(&self) -> Duration {
        self.refresh_floor
    }

    // ------------------------------------------------------------------
    // Frame surface
    // ------------------------------------------------------------------

    /// Write raw frame bytes at `offset`; returns the number written.
    pub fn write(&self, offset: usize, data: &[u8]) -> Result<usize> {
        let written = self.with_frame(|frame| frame.write(offset, data))?;
        self.request_refresh();
        Ok(written)
    }

    /// Read raw frame bytes at `offset`; returns the number read.
    #[must_use]
    pub fn read(&self, offset: usize, buffer: &mut [u8]) -> usize {
        self.with_frame(|frame| frame.read(offset, buffer))
    }

    /// Stored pixel at `(x, y)`; `None` off the canvas.
    #[must_use]
    pub fn pixel(&self, x: i32, y: i32) -> Option<Pixel> {
        self.with_frame(|frame| frame.pixel(x, y))
    }

    /// Store one pixel.
    pub fn set_pixel(&self, x: i32, y: i32, pixel: Pixel) -> Result<()> {
        self.with_frame(|frame| frame.set_pixel(x, y, pixel))?;
        self.request_refresh();
        Ok(())
    }

    /// Read-modify-write one pixel; returns the new value.
    pub fn update_pixel(&self, x: i32, y: i32, f: impl FnOnce(&mut Pixel)) -> Result<Pixel> {
        let pixel = self.with_frame(|frame| {
            let mut pixel = frame.pixel(x, y).ok_or(Error::OffCanvas)?;
            f(&mut pixel);
            frame.set_pixel(x, y, pixel)?;
            Ok::<_, Error>(pixel)
        })?;
        self.request_refresh();
        Ok(pixel)
    }

    /// Set every pixel of the canvas.
    pub fn fill(&self, pixel: Pixel) {
        self.with_frame(|frame| frame.fill(pixel));
        self.request_refresh();
    }

    /// Batch several edits under one lock and one refresh request.
    pub fn update<R>(&self, f: impl FnOnce(&mut FramePlane) -> R) -> R {
        let result = self.with_frame(f);
        self.request_refresh();
        result
    }

    fn with_frame<R>(&self, f: impl FnOnce(&mut FramePlane) -> R) -> R {
        self.frame.lock(|frame| f(&mut *frame.borrow_mut()))
    }

    // ------------------------------------------------------------------
    // Control surface
    // ------------------------------------------------------------------

    /// Global brightness.
    #[must_use]
    pub fn brightness(&self) -> u8 {
        self.with_state(|state| state.brightness)
    }

    /// Set the global brightness (0..=255).
    pub fn set_brightness(&self, value: u32) -> Result<()> {
        check_range("brightness", value, Self::MAX_BRIGHTNESS)?;
        self.write_attribute(|state| state.brightness = clamp_u8(value));
        Ok(())
    }

    /// Global current limit, mA; 0 means unlimited.
    #[must_use]
    pub fn current_limit(&self) -> u32 {
        self.with_state(|state| state.current_limit)
    }

    /// Set the global current limit, mA.
    pub fn set_current_limit(&self, value: u32) -> Result<()> {
        check_range("current_limit", value, Self::MAX_CURRENT_LIMIT)?;
        self.write_attribute(|state| state.current_limit = value);
        Ok(())
    }

    /// Full-scale current of one LED color, mA.
    #[must_use]
    pub fn led_max_current(&self, color: Primary) -> u32 {
        self.with_state(|state| match color {
            Primary::Red => state.power.max_current_red,
            Primary::Green => state.power.max_current_green,
            Primary::Blue => state.power.max_current_blue,
        })
    }

    /// Set the full-scale current of one LED color, mA.
    pub fn set_led_max_current(&self, color: Primary, value: u32) -> Result<()> {
        check_range("led_max_current", value, Self::MAX_LED_CURRENT)?;
        self.write_attribute(|state| match color {
            Primary::Red => state.power.max_current_red = value,
            Primary::Green => state.power.max_current_green = value,
            Primary::Blue => state.power.max_current_blue = value,
        });
        Ok(())
    }

    /// Idle current per pixel, mA.
    #[must_use]
    pub fn base_current(&self) -> u32 {
        self.with_state(|state| state.power.base_current)
    }

    /// Estimated draw of the last transmitted frame, mA.
    #[must_use]
    pub fn current(&self) -> u32 {
        self.with_state(|state| state.current)
    }

    /// Highest draw since the last attribute write, mA.
    #[must_use]
    pub fn current_max(&self) -> u32 {
        self.with_state(|state| state.current_max)
    }

    /// Number of completed refreshes.
    #[must_use]
    pub fn updates(&self) -> u32 {
        self.with_state(|state| state.updates)
    }

    /// Current statistics of panel `id`.
    pub fn panel_current(&self, id: u32) -> Result<PanelCurrent> {
        let slot = self
            .chain
            .panels()
            .iter()
            .position(|panel| panel.id() == id)
            .ok_or(Error::UnknownPanel(id))?;
        self.with_state(|state| state.panels.get(slot).copied())
            .ok_or(Error::UnknownPanel(id))
    }

    /// Ask the refresh worker to push the frame.
    pub fn request_refresh(&self) {
        self.dirty.signal(());
    }

    /// Whether a refresh has been requested and not yet started.
    #[must_use]
    pub fn refresh_pending(&self) -> bool {
        self.dirty.signaled()
    }

    fn write_attribute(&self, f: impl FnOnce(&mut DeviceState)) {
        self.with_state(|state| {
            f(&mut *state);
            state.current_max = 0;
            state.generation = state.generation.wrapping_add(1);
        });
        self.request_refresh();
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut DeviceState) -> R) -> R {
        self.state.lock(|state| f(&mut *state.borrow_mut()))
    }

    // ------------------------------------------------------------------
    // Refresh worker hooks
    // ------------------------------------------------------------------

    pub(crate) const fn dirty(&self) -> &DirtySignal {
        &self.dirty
    }

    /// Copy the frame plane into `snapshot` under the frame lock.
    pub(crate) fn snapshot_into(&self, snapshot: &mut FramePlane) {
        self.frame.lock(|frame| snapshot.copy_from(&*frame.borrow()));
    }

    /// Budget inputs as of now, with the write generation they belong to.
    pub(crate) fn budget(&self) -> (Budget, u32) {
        self.with_state(|state| {
            let budget = Budget {
                brightness: state.brightness,
                current_limit: state.current_limit,
                power: state.power,
            };
            (budget, state.generation)
        })
    }

    /// Record a transmitted frame; returns the new update count.
    ///
    /// The rescaled brightness only replaces the stored one if no attribute
    /// was written since `generation` was read, even one that stored the
    /// same value.
    pub(crate) fn commit(&self, generation: u32, converged: &Converged) -> u32 {
        self.with_state(|state| {
            if state.generation == generation {
                state.brightness = converged.brightness;
            }
            for (stats, &current) in state.panels.iter_mut().zip(&converged.panel_currents) {
                stats.current = current;
                stats.current_max = stats.current_max.max(current);
            }
            state.current = converged.current;
            state.current_max = state.current_max.max(converged.current);
            state.updates = state.updates.wrapping_add(1);
            state.updates
        })
    }
}

fn check_range(attribute: &'static str, value: u32, max: u32) -> Result<()> {
    if value > max {
        warn!("canvas: {} value {} exceeds {}", attribute, value, max);
        return Err(Error::OutOfRange {
            attribute,
            value,
            max,
        });
    }
    Ok(())
}
