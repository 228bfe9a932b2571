#![allow(
    missing_docs,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects,
    reason = "host tests unwrap expected successes and index known-good fixtures"
)]
//! Host-level tests for pixel compositing.

use rgbled_canvas::Error;
use rgbled_canvas::compositor::{
    self, BrightnessScale, GAMMA_2_2, Gamma, PixelSampler,
};
use rgbled_canvas::frame::{FramePlane, Pixel, RGB8, ScaledPixel, colors};
use rgbled_canvas::panel::Coord;
use rgbled_canvas::panel::catalog::PanelKind;
use rgbled_canvas::topology::{Chain, PanelDescriptor};

#[test]
fn brightness_scale_multiplies_three_factors() {
    let half_panel = BrightnessScale {
        global: 255,
        panel: 128,
    };
    assert_eq!(half_panel.apply(255), 128);
    assert_eq!(half_panel.apply(0), 0);
    assert_eq!(BrightnessScale::FULL.apply(255), 255);
    assert_eq!(BrightnessScale::FULL.apply(77), 77);

    let halves = BrightnessScale {
        global: 128,
        panel: 128,
    };
    assert_eq!(halves.apply(128), 32);
    assert_eq!(
        BrightnessScale {
            global: 0,
            panel: 255
        }
        .apply(255),
        0
    );
}

#[test]
fn default_sampler_reads_stored_pixel() {
    let mut frame = FramePlane::new(4, 2);
    frame
        .set_pixel(1, 1, Pixel::new(10, 20, 30, 200))
        .unwrap();
    let sampled = compositor::sample(&frame, Coord::new(1, 1), BrightnessScale::FULL);
    assert_eq!(sampled, ScaledPixel::new(RGB8::new(10, 20, 30), 200));
}

#[test]
fn frame_plane_edges() {
    let mut frame = FramePlane::new(4, 2);
    let last = Pixel::new(1, 2, 3, 4);
    frame.set_pixel(3, 1, last).unwrap();
    assert_eq!(frame.pixel(3, 1), Some(last));
    assert_eq!(frame.as_bytes()[28..], [1, 2, 3, 4]);

    assert_eq!(frame.set_pixel(4, 1, last), Err(Error::OffCanvas));
    assert_eq!(frame.set_pixel(3, 2, last), Err(Error::OffCanvas));
    assert_eq!(frame.set_pixel(-1, 0, last), Err(Error::OffCanvas));
    assert_eq!(frame.pixel(i32::MAX, i32::MAX), None);

    let empty = FramePlane::new(0, 3);
    assert!(empty.as_bytes().is_empty());
    assert_eq!(empty.pixel(0, 0), None);
}

#[test]
fn off_canvas_samples_dark() {
    let mut frame = FramePlane::new(2, 2);
    frame.fill(Pixel::from(colors::WHITE));
    for coord in [
        Coord::OFF_CANVAS,
        Coord::new(2, 0),
        Coord::new(0, 2),
        Coord::new(-1, 1),
    ] {
        assert_eq!(
            compositor::sample(&frame, coord, BrightnessScale::FULL),
            ScaledPixel::DARK
        );
    }
}

#[test]
fn gamma_curve_matches_table() {
    assert_eq!(Gamma::Linear.correct(128), 128);
    assert_eq!(Gamma::Gamma2_2.correct(0), 0);
    assert_eq!(Gamma::Gamma2_2.correct(64), 12);
    assert_eq!(Gamma::Gamma2_2.correct(128), 56);
    assert_eq!(Gamma::Gamma2_2.correct(200), 149);
    assert_eq!(Gamma::Gamma2_2.correct(255), 255);
    assert_eq!(
        Gamma::default().correct_rgb(RGB8::new(255, 128, 0)),
        RGB8::new(255, 56, 0)
    );
}

#[test]
fn gamma_sampler_keeps_brightness() {
    let mut frame = FramePlane::new(1, 1);
    frame.set_pixel(0, 0, Pixel::new(128, 200, 64, 255)).unwrap();
    let scale = BrightnessScale {
        global: 255,
        panel: 128,
    };
    let sampled = GAMMA_2_2.sample(&frame, Coord::new(0, 0), scale);
    assert_eq!(sampled, ScaledPixel::new(RGB8::new(56, 149, 12), 128));
}

struct Solid(RGB8);

impl PixelSampler for Solid {
    fn sample(&self, _frame: &FramePlane, _coord: Coord, scale: BrightnessScale) -> ScaledPixel {
        ScaledPixel::new(self.0, scale.apply(u8::MAX))
    }
}

static SOLID_RED: Solid = Solid(RGB8::new(255, 0, 0));
static SOLID_BLUE: Solid = Solid(RGB8::new(0, 0, 255));

#[test]
fn sampler_precedence_is_panel_then_chain_then_default() {
    let catalog = [
        PanelKind {
            sampler: Some(&SOLID_RED),
            ..PanelKind::grid("test,red", 2, 1, 0)
        },
        PanelKind::grid("test,plain", 2, 1, 0),
    ];
    let descriptors = [
        PanelDescriptor::new("test,red", 0).unwrap(),
        PanelDescriptor::new("test,plain", 1).unwrap().at(0, 1),
    ];
    let mut frame = FramePlane::new(2, 2);
    frame.fill(Pixel::new(0, 255, 0, 255));

    let plain = Chain::with_catalog(&descriptors, &catalog).unwrap();
    let overridden = plain.clone().with_sampler(&SOLID_BLUE);
    let [red_panel, plain_panel] = plain.panels() else {
        panic!("expected two panels");
    };

    // panel override wins over everything
    for chain in [&plain, &overridden] {
        assert_eq!(
            compositor::composite(chain, red_panel, 0, &frame, 255).color,
            RGB8::new(255, 0, 0)
        );
    }
    // chain override applies to panels without their own
    assert_eq!(
        compositor::composite(&overridden, plain_panel, 0, &frame, 255).color,
        RGB8::new(0, 0, 255)
    );
    // otherwise the stored pixel
    assert_eq!(
        compositor::composite(&plain, plain_panel, 0, &frame, 255).color,
        RGB8::new(0, 255, 0)
    );
}

#[test]
fn composite_applies_panel_and_global_brightness() {
    let catalog = [PanelKind::grid("test,plain", 2, 1, 0)];
    let chain = Chain::with_catalog(
        &[PanelDescriptor::new("test,plain", 0).unwrap().brightness(128)],
        &catalog,
    )
    .unwrap();
    let mut frame = FramePlane::new(2, 1);
    frame.fill(Pixel::new(40, 50, 60, 255));
    let panel = &chain.panels()[0];

    assert_eq!(
        compositor::composite(&chain, panel, 1, &frame, 255),
        ScaledPixel::new(RGB8::new(40, 50, 60), 128)
    );
    assert_eq!(
        compositor::composite(&chain, panel, 1, &frame, 128).brightness,
        64
    );
}
