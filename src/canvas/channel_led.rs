//! Single pixel channels exposed as individually controllable LEDs.
//!
//! A [`ChannelLed`] is a view onto one channel of one frame pixel, for
//! status-indicator style use ("make pixel 3 red"). Writes go through the
//! frame plane like any other edit and trigger a refresh.
//!
//! Two fix-ups keep a single write visible:
//! - writing red, green or blue on a pixel with brightness 0 raises its brightness to 255;
//! - writing brightness on a pixel whose color is black turns the color white.

use alloc::vec::Vec;
use core::fmt::Write as _;

use super::LedCanvas;
use crate::frame::{Channel, Pixel};
use crate::panel::Coord;
use crate::topology::{Label, label};
use crate::{Error, Result};

/// One channel of one pixel.
#[derive(Debug, Clone)]
pub struct ChannelLed<'a> {
    canvas: &'a LedCanvas,
    coord: Coord,
    channel: Channel,
    label: Label,
}

impl ChannelLed<'_> {
    /// Largest accepted brightness.
    pub const MAX_BRIGHTNESS: u32 = 255;

    /// Name the LED was exposed under.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Which byte of the pixel this LED drives.
    #[must_use]
    pub const fn channel(&self) -> Channel {
        self.channel
    }

    /// Frame coordinate the LED reads and writes.
    #[must_use]
    pub const fn coord(&self) -> Coord {
        self.coord
    }

    /// Current value of the channel.
    #[must_use]
    pub fn brightness(&self) -> u8 {
        self.canvas
            .pixel(self.coord.x, self.coord.y)
            .map_or(0, |pixel| pixel.channel(self.channel))
    }

    /// Set the channel to `value` (0..=255).
    pub fn set_brightness(&self, value: u32) -> Result<()> {
        let value = u8::try_from(value).map_err(|_| Error::OutOfRange {
            attribute: "led brightness",
            value,
            max: Self::MAX_BRIGHTNESS,
        })?;
        let channel = self.channel;
        self.canvas
            .update_pixel(self.coord.x, self.coord.y, |pixel| {
                pixel.set_channel(channel, value);
                make_visible(pixel, channel);
            })
            .map(|_| ())
    }
}

fn make_visible(pixel: &mut Pixel, written: Channel) {
    match written {
        Channel::Brightness => {
            if pixel.red == 0 && pixel.green == 0 && pixel.blue == 0 {
                pixel.red = u8::MAX;
                pixel.green = u8::MAX;
                pixel.blue = u8::MAX;
            }
        }
        Channel::Red | Channel::Green | Channel::Blue => {
            if pixel.brightness == 0 {
                pixel.brightness = u8::MAX;
            }
        }
    }
}

impl LedCanvas {
    /// Expose one channel of the pixel at chain-relative `index`.
    pub fn channel_led(&self, index: usize, channel: Channel, name: &str) -> Result<ChannelLed<'_>> {
        let coord = self.chain_coord(index)?;
        Ok(ChannelLed {
            canvas: self,
            coord,
            channel,
            label: label(name)?,
        })
    }

    /// Expose every channel of every pixel of panel `id`.
    ///
    /// Labels are `"{device}:{x}:{y}:{channel}"`. Pixels that map off the
    /// frame are skipped.
    pub fn panel_channel_leds(&self, id: u32) -> Result<Vec<ChannelLed<'_>>> {
        let panel = self.chain().panel(id)?;
        let mut leds = Vec::with_capacity(panel.pixel_count().saturating_mul(Channel::ALL.len()));
        for index in 0..panel.pixel_count() {
            let coord = panel.map(index);
            if self.pixel(coord.x, coord.y).is_none() {
                continue;
            }
            for channel in Channel::ALL {
                let mut text = Label::new();
                write!(
                    text,
                    "{}:{}:{}:{}",
                    self.name(),
                    coord.x,
                    coord.y,
                    channel.name()
                )
                .map_err(|_| Error::FormatError)?;
                leds.push(ChannelLed {
                    canvas: self,
                    coord,
                    channel,
                    label: text,
                });
            }
        }
        debug!("canvas: exposed {} channel LEDs for panel {}", leds.len(), id);
        Ok(leds)
    }

    fn chain_coord(&self, index: usize) -> Result<Coord> {
        let (panel, local) = self.chain().locate(index)?;
        let coord = panel.map(local);
        self.pixel(coord.x, coord.y)
            .map(|_| coord)
            .ok_or(Error::OffCanvas)
    }
}
