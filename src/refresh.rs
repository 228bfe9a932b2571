//! Update orchestrator: snapshot, budget, transmit, commit.
//!
//! A [`Refresher`] owns the output buffer and the SPI bus. One refresh:
//!
//! 1. copies the frame plane (under its lock) into a private snapshot;
//! 2. runs the [`BudgetEngine`] on the snapshot, which composites and encodes
//!    every pixel and lowers the global brightness until all limits hold;
//! 3. writes the buffer to the bus;
//! 4. commits brightness and current statistics to the canvas.
//!
//! Nothing is committed unless the bus accepted the frame. The background
//! loop ([`Refresher::run`]) waits for the canvas dirty signal, lets further
//! edits settle for the debounce interval, then refreshes once.
//!
//! # Example
//!
//! ```rust,ignore
//! #[embassy_executor::task]
//! async fn led_task(canvas: &'static LedCanvas, spi: Spi<'static, SPI0, Blocking>) -> ! {
//!     Refresher::new(canvas, spi).run().await
//! }
//! ```

use embassy_time::{Duration, Timer};
use embedded_hal::spi::{Error as _, SpiBus};

use crate::budget::BudgetEngine;
use crate::canvas::LedCanvas;
use crate::encoder::{AnyEncoder, ProtocolEncoder};
use crate::frame::FramePlane;
use crate::{Error, Result};

/// What one successful refresh did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RefreshReport {
    /// Global brightness the frame went out with.
    pub brightness: u8,
    /// Estimated chain current, mA.
    pub current: u32,
    /// Rescale passes needed.
    pub iterations: u16,
    /// Update count after this refresh.
    pub updates: u32,
}

/// Drives one [`LedCanvas`] onto one SPI bus.
#[derive(Debug)]
pub struct Refresher<'a, B, E = AnyEncoder> {
    canvas: &'a LedCanvas,
    engine: BudgetEngine<E>,
    snapshot: FramePlane,
    bus: B,
    debounce: Duration,
}

impl<'a, B: SpiBus> Refresher<'a, B> {
    /// Refresher using the canvas family's default encoder.
    #[must_use]
    pub fn new(canvas: &'a LedCanvas, bus: B) -> Self {
        Self::with_encoder(canvas, canvas.family().encoder(), bus)
    }
}

impl<'a, B: SpiBus, E: ProtocolEncoder> Refresher<'a, B, E> {
    /// Refresher with an explicit encoder (custom timing or protocol).
    #[must_use]
    pub fn with_encoder(canvas: &'a LedCanvas, encoder: E, bus: B) -> Self {
        let engine = BudgetEngine::new(encoder, canvas.chain());
        let transmit = transmission_time(engine.buffer().len(), engine.encoder().bus_hz());
        let debounce = canvas.refresh_floor().max(transmit);
        Self {
            canvas,
            snapshot: FramePlane::new(canvas.width(), canvas.height()),
            engine,
            bus,
            debounce,
        }
    }

    /// Interval between the first dirty signal and the refresh it triggers.
    #[must_use]
    pub const fn debounce(&self) -> Duration {
        self.debounce
    }

    /// The bytes sent by the last refresh (or the framed, blank buffer before any).
    #[must_use]
    pub fn buffer(&self) -> &[u8] {
        self.engine.buffer()
    }

    /// Give back the bus.
    #[must_use]
    pub fn into_bus(self) -> B {
        self.bus
    }

    /// Refresh now, regardless of the dirty signal.
    pub fn refresh(&mut self) -> Result<RefreshReport> {
        self.canvas.snapshot_into(&mut self.snapshot);
        let (budget, generation) = self.canvas.budget();
        let converged = self
            .engine
            .run(self.canvas.chain(), &self.snapshot, budget)?;

        let buffer = self.engine.buffer();
        self.bus
            .write(buffer)
            .and_then(|()| self.bus.flush())
            .map_err(|err| {
                let kind = err.kind();
                error!("refresh: transmission of {} bytes failed", buffer.len());
                Error::Transmission { kind }
            })?;

        let updates = self.canvas.commit(generation, &converged);
        debug!(
            "refresh: update {} at brightness {}, {} mA",
            updates,
            converged.brightness,
            converged.current
        );
        Ok(RefreshReport {
            brightness: converged.brightness,
            current: converged.current,
            iterations: converged.iterations,
            updates,
        })
    }

    /// Wait for the canvas to become dirty, debounce, then refresh.
    pub async fn next_refresh(&mut self) -> Result<RefreshReport> {
        self.canvas.dirty().wait().await;
        Timer::after(self.debounce).await;
        self.canvas.dirty().reset();
        self.refresh()
    }

    /// Refresh forever. Failed refreshes are logged and skipped.
    pub async fn run(mut self) -> ! {
        info!(
            "refresh: worker started, debounce {} us",
            self.debounce.as_micros()
        );
        loop {
            if let Err(err) = self.next_refresh().await {
                warn!("refresh: skipped: {}", err);
            }
        }
    }
}

/// Time to shift `len` bytes out at `bus_hz`.
fn transmission_time(len: usize, bus_hz: u32) -> Duration {
    let bits = u64::try_from(len).unwrap_or(u64::MAX).saturating_mul(8);
    bits.saturating_mul(1_000_000)
        .checked_div(u64::from(bus_hz))
        .map_or(Duration::from_ticks(0), Duration::from_micros)
}
