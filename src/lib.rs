//! Framebuffer core for chains of addressable RGB LED panels.
//!
//! A single SPI-driven chain of WS2812/WS2812B or APA102 LEDs, possibly made
//! of strips, matrices, rings and arcs of different shapes, is presented as
//! one rectangular canvas of 4-byte pixels (red, green, blue, brightness).
//! Whenever the canvas or a control attribute changes, a background worker
//! composites the canvas onto the physical pixels, encodes them for the LED
//! protocol, lowers the global brightness until every current limit holds,
//! and transmits the frame.
//!
//! # Glossary
//!
//! - **Chain:** the physical LEDs, wired in series, in transmission order.
//! - **Panel:** one segment of the chain with its own geometry, brightness and current limit.
//! - **Canvas / frame plane:** the rectangular pixel buffer covering the union of all panels.
//! - **Sampler:** the rule turning a canvas coordinate into a color and effective brightness.
//! - **Rescale:** lowering the global brightness so the estimated current fits the limits.
//!
//! # Example
//!
//! ```rust
//! use rgbled_canvas::encoder::Family;
//! use rgbled_canvas::frame::{Pixel, colors};
//! use rgbled_canvas::topology::{DeviceSettings, PanelDescriptor, Topology};
//! use rgbled_canvas::LedCanvas;
//!
//! # fn main() -> rgbled_canvas::Result<()> {
//! let settings = DeviceSettings::new("matrix", Family::Ws2812b)?;
//! let topology = Topology::new(settings)
//!     .with_panel(PanelDescriptor::new("adafruit,neopixel,matrix,8x8", 0)?)?
//!     .with_panel(PanelDescriptor::new("adafruit,neopixel,stick,8", 1)?.at(0, 8))?;
//! let canvas = LedCanvas::new(&topology)?;
//! assert_eq!((canvas.width(), canvas.height()), (8, 9));
//! canvas.set_pixel(3, 4, Pixel::from(colors::ORANGE))?;
//! canvas.set_current_limit(500)?;
//! # Ok(())
//! # }
//! ```
//!
//! On a target, the canvas lives in a `static` and a task drives it with
//! [`refresh::Refresher::run`].
#![cfg_attr(not(test), no_std)]

extern crate alloc;

// Must come first: the logging macros are used by every module below.
#[macro_use]
mod fmt;

pub mod budget;
pub mod canvas;
pub mod compositor;
pub mod encoder;
mod error;
pub mod frame;
pub mod panel;
pub mod refresh;
pub mod topology;

pub use crate::canvas::LedCanvas;
pub use crate::error::{Error, Result};
pub use crate::refresh::Refresher;
