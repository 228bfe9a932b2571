//! Current budget engine.
//!
//! Each pass composites every pixel, encodes it into the output buffer, and
//! estimates the current the chain will draw:
//!
//! ```text
//! panel mA = Σ (r·b·max_r + g·b·max_g + b_ch·b·max_b) / 255² + base · pixels
//! ```
//!
//! where `b` is the pixel's effective brightness. If a panel (first, in chain
//! order) or the whole chain exceeds its limit, the pass yields a rescale
//! factor `254 · limit / current` and the engine lowers the global brightness
//! by that factor and runs another pass, up to [`MAX_RESCALE_ITERATIONS`].

use alloc::vec;
use alloc::vec::Vec;

use heapless::Vec as BoundedVec;

use crate::compositor;
use crate::encoder::ProtocolEncoder;
use crate::frame::{FramePlane, ScaledPixel, scale8};
use crate::panel::Panel;
use crate::topology::{Chain, MAX_PANELS};
use crate::{Error, Result};

/// Upper bound on rescale passes in one refresh.
pub const MAX_RESCALE_ITERATIONS: u16 = 256;

const FULL_SCALE: u64 = 255 * 255;

/// Per-LED electrical model, all in mA.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PowerModel {
    /// Red LED current at full scale.
    pub max_current_red: u32,
    /// Green LED current at full scale.
    pub max_current_green: u32,
    /// Blue LED current at full scale.
    pub max_current_blue: u32,
    /// Idle current per pixel.
    pub base_current: u32,
}

impl PowerModel {
    /// Load of one pixel in mA·255², excluding base current.
    #[must_use]
    pub fn pixel_load(&self, pixel: ScaledPixel) -> u64 {
        let color = pixel.color;
        let weighted = [
            (color.r, self.max_current_red),
            (color.g, self.max_current_green),
            (color.b, self.max_current_blue),
        ]
        .into_iter()
        .fold(0u64, |sum, (level, max_current)| {
            sum.saturating_add(u64::from(level).saturating_mul(u64::from(max_current)))
        });
        weighted.saturating_mul(u64::from(pixel.brightness))
    }

    /// Current of `pixel_count` pixels whose summed load is `load`.
    #[must_use]
    pub fn current(&self, load: u64, pixel_count: usize) -> u32 {
        let base = u64::try_from(pixel_count)
            .unwrap_or(u64::MAX)
            .saturating_mul(u64::from(self.base_current));
        let milliamps = (load / FULL_SCALE).saturating_add(base);
        u32::try_from(milliamps).unwrap_or(u32::MAX)
    }
}

/// Inputs to one budget run, snapshotted from the device state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Budget {
    /// Global brightness at the start of the refresh.
    pub brightness: u8,
    /// Global current limit in mA, 0 for none.
    pub current_limit: u32,
    /// Electrical model the current is estimated with.
    pub power: PowerModel,
}

/// Result of one pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Verdict {
    /// All limits met; the buffer holds a complete frame.
    Within,
    /// A limit was exceeded; scale global brightness by `factor / 255`.
    Rescale(u8),
}

/// Outcome of a converged run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Converged {
    /// Global brightness the transmitted frame was encoded with.
    pub brightness: u8,
    /// Estimated chain current, mA.
    pub current: u32,
    /// Estimated current per panel, chain order.
    pub panel_currents: BoundedVec<u32, MAX_PANELS>,
    /// Rescale passes that were needed.
    pub iterations: u16,
}

/// Rescale factor for a measured current over a limit.
fn rescale_factor(limit: u32, current: u32) -> u8 {
    // current > limit, so the factor is below 254
    let factor = u64::from(limit)
        .saturating_mul(254)
        .checked_div(u64::from(current))
        .unwrap_or(0);
    u8::try_from(factor).unwrap_or(u8::MAX)
}

/// Owns the output buffer and runs passes over it.
#[derive(Debug)]
pub struct BudgetEngine<E> {
    encoder: E,
    buffer: Vec<u8>,
    pixel_count: usize,
    panel_currents: BoundedVec<u32, MAX_PANELS>,
    total: u32,
}

impl<E: ProtocolEncoder> BudgetEngine<E> {
    /// Size and frame an output buffer for `chain`.
    #[must_use]
    pub fn new(encoder: E, chain: &Chain) -> Self {
        let pixel_count = chain.pixel_count();
        let mut buffer = vec![0; encoder.buffer_len(pixel_count)];
        encoder.frame(&mut buffer, pixel_count);
        let mut panel_currents = BoundedVec::new();
        // a chain never holds more than MAX_PANELS panels
        let _ = panel_currents.resize(chain.panels().len(), 0);
        Self {
            encoder,
            buffer,
            pixel_count,
            panel_currents,
            total: 0,
        }
    }

    /// The encoded output of the most recent pass.
    #[must_use]
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    /// The protocol encoder filling the buffer.
    #[must_use]
    pub const fn encoder(&self) -> &E {
        &self.encoder
    }

    /// Per-panel current of the most recent pass (0 for panels it did not reach).
    #[must_use]
    pub fn panel_currents(&self) -> &[u32] {
        &self.panel_currents
    }

    /// Chain current accumulated by the most recent pass.
    #[must_use]
    pub const fn total_current(&self) -> u32 {
        self.total
    }

    /// Composite and encode one panel; return its estimated current.
    pub fn panel_pass(
        &mut self,
        chain: &Chain,
        panel: &Panel,
        frame: &FramePlane,
        brightness: u8,
        power: &PowerModel,
    ) -> u32 {
        let mut load = 0u64;
        for index in 0..panel.pixel_count() {
            let pixel = compositor::composite(chain, panel, index, frame, brightness);
            load = load.saturating_add(power.pixel_load(pixel));
            self.encoder
                .encode(&mut self.buffer, panel.first_slot().saturating_add(index), pixel);
        }
        power.current(load, panel.pixel_count())
    }

    /// One pass over the whole chain.
    ///
    /// Stops at the first panel over its own limit; otherwise checks the
    /// chain total against `current_limit`.
    pub fn pass_over_chain(
        &mut self,
        chain: &Chain,
        frame: &FramePlane,
        brightness: u8,
        current_limit: u32,
        power: &PowerModel,
    ) -> Verdict {
        self.panel_currents.iter_mut().for_each(|current| *current = 0);
        self.total = 0;

        for (slot, panel) in chain.panels().iter().enumerate() {
            let current = self.panel_pass(chain, panel, frame, brightness, power);
            if let Some(entry) = self.panel_currents.get_mut(slot) {
                *entry = current;
            }
            self.total = self.total.saturating_add(current);

            let limit = panel.current_limit();
            if limit > 0 && current > limit {
                let factor = rescale_factor(limit, current);
                warn!(
                    "budget: panel {} draws {} mA over limit {} mA, rescale {}",
                    panel.id(),
                    current,
                    limit,
                    factor
                );
                return Verdict::Rescale(factor);
            }
        }

        if current_limit > 0 && self.total > current_limit {
            let factor = rescale_factor(current_limit, self.total);
            warn!(
                "budget: chain draws {} mA over limit {} mA, rescale {}",
                self.total,
                current_limit,
                factor
            );
            return Verdict::Rescale(factor);
        }
        Verdict::Within
    }

    /// Run passes until every limit is met, lowering the global brightness as needed.
    ///
    /// Returns [`Error::BudgetUnsatisfiable`] when the ceiling is hit or the
    /// brightness cannot drop any further; the buffer then holds a frame that
    /// must not be transmitted.
    pub fn run(&mut self, chain: &Chain, frame: &FramePlane, budget: Budget) -> Result<Converged> {
        debug_assert_eq!(chain.pixel_count(), self.pixel_count);
        let power = budget.power;
        let mut brightness = budget.brightness;
        let mut iterations = 0u16;

        while let Verdict::Rescale(factor) =
            self.pass_over_chain(chain, frame, brightness, budget.current_limit, &power)
        {
            iterations = iterations.saturating_add(1);
            let next = scale8(brightness, factor);
            if iterations >= MAX_RESCALE_ITERATIONS || next == brightness {
                warn!(
                    "budget: limits unsatisfiable after {} passes at brightness {}",
                    iterations,
                    brightness
                );
                return Err(Error::BudgetUnsatisfiable { iterations });
            }
            brightness = next;
        }

        Ok(Converged {
            brightness,
            current: self.total,
            panel_currents: self.panel_currents.clone(),
            iterations,
        })
    }
}
