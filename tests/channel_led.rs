#![allow(
    missing_docs,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects,
    reason = "host tests unwrap expected successes and index known-good fixtures"
)]
//! Host-level tests for per-channel LED views.

use rgbled_canvas::encoder::Family;
use rgbled_canvas::frame::{Channel, Pixel};
use rgbled_canvas::panel::catalog::PanelKind;
use rgbled_canvas::panel::{Coord, Mapping, Panel, PanelGeometry};
use rgbled_canvas::topology::{Chain, DeviceSettings, PanelDescriptor, Topology};
use rgbled_canvas::{Error, LedCanvas};

fn canvas() -> LedCanvas {
    let settings = DeviceSettings::new("bar", Family::Ws2812b).unwrap();
    let topology = Topology::new(settings)
        .with_panel(PanelDescriptor::new("adafruit,neopixel,matrix,8x8", 0).unwrap())
        .unwrap()
        .with_panel(
            PanelDescriptor::new("adafruit,neopixel,stick,8", 1)
                .unwrap()
                .at(0, 8),
        )
        .unwrap();
    LedCanvas::new(&topology).unwrap()
}

#[test]
fn color_write_on_dark_pixel_turns_it_on() {
    let canvas = canvas();
    let red = canvas.channel_led(64 + 3, Channel::Red, "status").unwrap();
    assert_eq!(red.coord(), Coord::new(3, 8));
    assert_eq!(red.label(), "status");

    red.set_brightness(200).unwrap();
    assert_eq!(canvas.pixel(3, 8), Some(Pixel::new(200, 0, 0, 255)));
    assert_eq!(red.brightness(), 200);
}

#[test]
fn color_write_keeps_existing_brightness() {
    let canvas = canvas();
    canvas.set_pixel(0, 0, Pixel::new(0, 0, 50, 40)).unwrap();
    let green = canvas.channel_led(0, Channel::Green, "g").unwrap();
    green.set_brightness(10).unwrap();
    assert_eq!(canvas.pixel(0, 0), Some(Pixel::new(0, 10, 50, 40)));
}

#[test]
fn brightness_write_on_black_pixel_turns_it_white() {
    let canvas = canvas();
    let level = canvas.channel_led(0, Channel::Brightness, "level").unwrap();
    level.set_brightness(100).unwrap();
    assert_eq!(canvas.pixel(0, 0), Some(Pixel::new(255, 255, 255, 100)));

    canvas.set_pixel(1, 0, Pixel::new(5, 0, 0, 0)).unwrap();
    let level = canvas.channel_led(1, Channel::Brightness, "level").unwrap();
    level.set_brightness(30).unwrap();
    assert_eq!(canvas.pixel(1, 0), Some(Pixel::new(5, 0, 0, 30)));
}

#[test]
fn out_of_range_value_is_rejected() {
    let canvas = canvas();
    let blue = canvas.channel_led(5, Channel::Blue, "b").unwrap();
    assert_eq!(
        blue.set_brightness(256),
        Err(Error::OutOfRange {
            attribute: "led brightness",
            value: 256,
            max: 255
        })
    );
    assert_eq!(blue.brightness(), 0);
    assert_eq!(canvas.pixel(5, 0), Some(Pixel::OFF));
}

#[test]
fn chain_index_must_exist() {
    let canvas = canvas();
    assert_eq!(
        canvas.channel_led(72, Channel::Red, "x").unwrap_err(),
        Error::PixelIndexOutOfRange(72)
    );
}

#[test]
fn panel_leds_are_labelled_by_coordinate() {
    let canvas = canvas();
    let leds = canvas.panel_channel_leds(0).unwrap();
    assert_eq!(leds.len(), 64 * 4);
    assert_eq!(leds[0].label(), "bar:0:0:red");
    assert_eq!(leds[3].label(), "bar:0:0:brightness");
    // serpentine: chain index 8 is the right end of row 1
    assert_eq!(leds[8 * 4 + 1].label(), "bar:7:1:green");
    assert_eq!(leds[8 * 4 + 1].channel(), Channel::Green);

    let stick = canvas.panel_channel_leds(1).unwrap();
    assert_eq!(stick.len(), 8 * 4);
    assert_eq!(stick[31].label(), "bar:7:8:brightness");

    assert_eq!(
        canvas.panel_channel_leds(4).unwrap_err(),
        Error::UnknownPanel(4)
    );
}

#[test]
fn panel_leds_drive_the_frame() {
    let canvas = canvas();
    let leds = canvas.panel_channel_leds(1).unwrap();
    let blue = leds
        .iter()
        .find(|led| led.label() == "bar:2:8:blue")
        .unwrap();
    blue.set_brightness(7).unwrap();
    assert_eq!(canvas.pixel(2, 8), Some(Pixel::new(0, 0, 7, 255)));
}

/// Only even pixels are placed; odd ones fall off the canvas.
struct EveryOther;

impl PanelGeometry for EveryOther {
    fn map(&self, panel: &Panel, index: usize) -> Coord {
        if index % 2 == 1 {
            return Coord::OFF_CANVAS;
        }
        let (x, y) = panel.origin();
        Coord::new(
            i32::try_from(x).unwrap() + i32::try_from(index / 2).unwrap(),
            i32::try_from(y).unwrap(),
        )
    }
}

static EVERY_OTHER: EveryOther = EveryOther;

#[test]
fn off_canvas_pixels_are_skipped() {
    let catalog = [PanelKind {
        mapping: Mapping::Custom(&EVERY_OTHER),
        pixel_count: Some(6),
        ..PanelKind::grid("test,sparse", 3, 1, 0)
    }];
    let settings = DeviceSettings::new("sparse", Family::Ws2812b).unwrap();
    let chain = Chain::with_catalog(
        &[PanelDescriptor::new("test,sparse", 0).unwrap()],
        &catalog,
    )
    .unwrap();
    let canvas = LedCanvas::with_chain(&settings, chain).unwrap();

    assert_eq!(canvas.panel_channel_leds(0).unwrap().len(), 3 * 4);
    assert_eq!(
        canvas.channel_led(1, Channel::Red, "odd").unwrap_err(),
        Error::OffCanvas
    );
    assert!(canvas.channel_led(4, Channel::Red, "even").is_ok());
}
