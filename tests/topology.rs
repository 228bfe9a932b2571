#![allow(
    missing_docs,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects,
    reason = "host tests unwrap expected successes and index known-good fixtures"
)]
//! Host-level tests for topology resolution and the stored topology record.

use rgbled_canvas::Error;
use rgbled_canvas::budget::BudgetEngine;
use rgbled_canvas::encoder::{Family, ProtocolEncoder};
use rgbled_canvas::panel::catalog::{PanelKind, WS2812B_PANELS};
use rgbled_canvas::panel::{Coord, Layout, Mapping};
use rgbled_canvas::panel::shape::RING_12;
use rgbled_canvas::topology::{
    Chain, DeviceSettings, MAX_PANELS, PanelDescriptor, Topology, blob,
};

fn descriptor(compatible: &str, id: u32) -> PanelDescriptor {
    PanelDescriptor::new(compatible, id).unwrap()
}

fn mixed_topology() -> Topology {
    let settings = DeviceSettings::new("mixed", Family::Ws2812b).unwrap();
    Topology::new(settings)
        .with_panel(descriptor("adafruit,neopixel,ring,16", 2).at(8, 0))
        .unwrap()
        .with_panel(descriptor("adafruit,neopixel,matrix,8x8", 0))
        .unwrap()
        .with_panel(descriptor("adafruit,neopixel,strip,30", 1).multiply(12).at(0, 8))
        .unwrap()
}

#[test]
fn panels_are_chained_in_id_order() {
    let chain = Chain::from_topology(&mixed_topology()).unwrap();
    let ids: Vec<u32> = chain.panels().iter().map(|panel| panel.id()).collect();
    assert_eq!(ids, [0, 1, 2]);

    let slots: Vec<usize> = chain
        .panels()
        .iter()
        .map(|panel| panel.first_slot())
        .collect();
    assert_eq!(slots, [0, 64, 76]);
}

#[test]
fn pixel_count_is_sum_of_panels() {
    let chain = Chain::from_topology(&mixed_topology()).unwrap();
    let sum: usize = chain.panels().iter().map(|panel| panel.pixel_count()).sum();
    assert_eq!(sum, 64 + 12 + 16);
    assert_eq!(chain.pixel_count(), sum);
}

#[test]
fn canvas_extent_is_union_of_panels() {
    let chain = Chain::from_topology(&mixed_topology()).unwrap();
    // strip reaches x = 12, ring reaches x = 16; strip reaches y = 9
    assert_eq!((chain.width(), chain.height()), (16, 9));
}

#[test]
fn buffer_size_depends_only_on_pixel_count_and_family() {
    let mixed = Chain::from_topology(&mixed_topology()).unwrap();
    let strip = Chain::with_catalog(
        &[descriptor("worldsemi,ws2812b,strip", 5).multiply(92)],
        WS2812B_PANELS,
    )
    .unwrap();
    assert_eq!(mixed.pixel_count(), strip.pixel_count());

    for family in [Family::Ws2812b, Family::Ws2812, Family::Apa102] {
        let encoder = family.encoder();
        let expected = encoder.buffer_len(92);
        assert_eq!(BudgetEngine::new(encoder, &mixed).buffer().len(), expected);
        assert_eq!(BudgetEngine::new(encoder, &strip).buffer().len(), expected);
    }
}

#[test]
fn locate_finds_owning_panel() {
    let chain = Chain::from_topology(&mixed_topology()).unwrap();
    let (panel, local) = chain.locate(70).unwrap();
    assert_eq!((panel.id(), local), (1, 6));
    let (panel, local) = chain.locate(91).unwrap();
    assert_eq!((panel.id(), local), (2, 15));
    assert_eq!(
        chain.locate(92).unwrap_err(),
        Error::PixelIndexOutOfRange(92)
    );
}

#[test]
fn duplicate_ids_are_rejected() {
    let result = Chain::with_catalog(
        &[
            descriptor("adafruit,neopixel,stick,8", 3),
            descriptor("adafruit,neopixel,stick,8", 1).at(0, 1),
            descriptor("adafruit,neopixel,stick,8", 3).at(0, 2),
        ],
        WS2812B_PANELS,
    );
    assert_eq!(result.unwrap_err(), Error::DuplicatePanelId(3));
}

#[test]
fn empty_topology_is_rejected() {
    assert_eq!(
        Chain::with_catalog(&[], WS2812B_PANELS).unwrap_err(),
        Error::NoPixels
    );
}

#[test]
fn zero_sized_panels_are_rejected() {
    let zero_width = descriptor("worldsemi,ws2812b,strip", 4).size(0, 3);
    assert_eq!(
        Chain::with_catalog(&[zero_width], WS2812B_PANELS).unwrap_err(),
        Error::EmptyPanel(4)
    );

    let zero_multiply = descriptor("adafruit,neopixel,strip,60", 5).multiply(0);
    assert_eq!(
        Chain::with_catalog(&[zero_multiply], WS2812B_PANELS).unwrap_err(),
        Error::EmptyPanel(5)
    );
}

#[test]
fn locked_properties_are_rejected() {
    let ring_meander = descriptor("adafruit,neopixel,ring,12", 0).meander();
    assert_eq!(
        Chain::with_catalog(&[ring_meander], WS2812B_PANELS).unwrap_err(),
        Error::LockedProperty {
            panel_id: 0,
            property: "layout"
        }
    );

    let resized_strip = descriptor("adafruit,neopixel,strip,30", 1).size(4, 4);
    assert_eq!(
        Chain::with_catalog(&[resized_strip], WS2812B_PANELS).unwrap_err(),
        Error::LockedProperty {
            panel_id: 1,
            property: "width"
        }
    );

    let multiplied_stick = descriptor("adafruit,neopixel,stick,8", 2).multiply(2);
    assert_eq!(
        Chain::with_catalog(&[multiplied_stick], WS2812B_PANELS).unwrap_err(),
        Error::LockedProperty {
            panel_id: 2,
            property: "multiply"
        }
    );
}

#[test]
fn requested_flags_add_to_catalog_layout() {
    // the 32x8 matrix is wired column-major; mirroring it must keep that
    let mirrored = descriptor("adafruit,neopixel,matrix,32x8", 0).layout(Layout {
        invert_x: true,
        ..Layout::ROW_MAJOR
    });
    let chain = Chain::with_catalog(&[mirrored], WS2812B_PANELS).unwrap();
    let panel = chain.panel(0).unwrap();
    assert_eq!(
        panel.layout(),
        Layout {
            column_major: true,
            invert_x: true,
            invert_y: false,
        }
    );

    assert_eq!(panel.map(0), Coord::new(31, 7));
    assert_eq!(panel.map(7), Coord::new(31, 0));
    assert_eq!(panel.map(8), Coord::new(30, 0));
    assert_eq!(panel.map(255), Coord::new(0, 7));
}

#[test]
fn unknown_compatible_is_rejected() {
    let apa_strip_on_ws2812b = descriptor("adafruit,dotstar,strip,60", 7);
    assert_eq!(
        Chain::with_catalog(&[apa_strip_on_ws2812b], WS2812B_PANELS).unwrap_err(),
        Error::UnknownCompatible(7)
    );
}

#[test]
fn geometry_length_must_match_pixel_count() {
    let catalog = [PanelKind::shaped(
        "test,short-ring",
        6,
        6,
        10,
        Mapping::Custom(&RING_12),
    )];
    assert_eq!(
        Chain::with_catalog(&[descriptor("test,short-ring", 0)], &catalog).unwrap_err(),
        Error::ShapeMismatch {
            panel_id: 0,
            geometry: 12,
            pixels: 10
        }
    );
}

#[test]
fn panel_limits_and_brightness_resolve() {
    let catalog = [PanelKind {
        current_limit: 500,
        ..PanelKind::grid("test,limited", 4, 4, 0)
    }];
    let chain = Chain::with_catalog(
        &[
            descriptor("test,limited", 0).current_limit(300),
            descriptor("test,limited", 1).current_limit(800).at(4, 0),
            descriptor("test,limited", 2).brightness(1000).at(8, 0),
        ],
        &catalog,
    )
    .unwrap();
    let limits: Vec<u32> = chain
        .panels()
        .iter()
        .map(|panel| panel.current_limit())
        .collect();
    assert_eq!(limits, [300, 500, 500]);
    assert_eq!(chain.panel(2).unwrap().brightness(), 255);
    assert_eq!(chain.panel(0).unwrap().brightness(), 255);
    assert_eq!(chain.panel(9).unwrap_err(), Error::UnknownPanel(9));
}

#[test]
fn topology_capacity_is_bounded() {
    let settings = DeviceSettings::new("full", Family::Apa102).unwrap();
    let mut topology = Topology::new(settings);
    for id in 0..MAX_PANELS as u32 {
        topology
            .push(descriptor("adafruit,dotstar,strip,60", id))
            .unwrap();
    }
    assert_eq!(
        topology.push(descriptor("adafruit,dotstar,strip,60", 99)),
        Err(Error::TooManyPanels)
    );
}

#[test]
fn long_labels_are_rejected() {
    assert_eq!(
        PanelDescriptor::new("vendor,a-compatible-tag-that-is-far-too-long", 0).unwrap_err(),
        Error::FormatError
    );
}

#[test]
fn stored_topology_decodes() {
    let topology = mixed_topology();
    // erased flash reads as 0xFF
    let mut block = [0xFF_u8; blob::MAX_RECORD_SIZE];
    let len = blob::encode(&topology, &mut block).unwrap();
    assert!(len < block.len());

    let decoded = blob::decode(&block).unwrap();
    assert_eq!(decoded, topology);
    assert_eq!(
        Chain::from_topology(&decoded).unwrap().pixel_count(),
        Chain::from_topology(&topology).unwrap().pixel_count()
    );
}

#[test]
fn corrupted_records_are_rejected() {
    let topology = mixed_topology();
    let mut block = [0xFF_u8; blob::MAX_RECORD_SIZE];
    let len = blob::encode(&topology, &mut block).unwrap();

    let mut flipped = block;
    flipped[len / 2] ^= 0x01;
    assert_eq!(blob::decode(&flipped), Err(Error::TopologyCorrupted));

    let mut bad_magic = block;
    bad_magic[0] = 0;
    assert_eq!(blob::decode(&bad_magic), Err(Error::TopologyCorrupted));

    assert_eq!(blob::decode(&block[..len - 1]), Err(Error::TopologyCorrupted));
    assert_eq!(
        blob::decode(&[0xFF; blob::MAX_RECORD_SIZE]),
        Err(Error::TopologyCorrupted)
    );
}

#[test]
fn short_records_are_rejected() {
    let topology = mixed_topology();
    let mut block = [0xFF_u8; blob::MAX_RECORD_SIZE];
    let len = blob::encode(&topology, &mut block).unwrap();

    // shorter than the header
    assert_eq!(blob::decode(&block[..5]), Err(Error::TopologyCorrupted));
    assert_eq!(blob::decode(&[]), Err(Error::TopologyCorrupted));
    // header intact, payload cut short
    assert_eq!(blob::decode(&block[..8]), Err(Error::TopologyCorrupted));
    // payload intact, CRC cut short
    assert_eq!(blob::decode(&block[..len - 2]), Err(Error::TopologyCorrupted));
}

#[test]
fn record_fits_a_buffer_of_exactly_its_length() {
    let topology = mixed_topology();
    let mut block = [0xFF_u8; blob::MAX_RECORD_SIZE];
    let len = blob::encode(&topology, &mut block).unwrap();

    let mut exact = vec![0_u8; len];
    assert_eq!(blob::encode(&topology, &mut exact), Ok(len));
    assert_eq!(exact[..], block[..len]);
    assert_eq!(blob::decode(&exact), Ok(topology));
}

#[test]
fn record_needs_room() {
    let mut tiny = [0_u8; 8];
    assert_eq!(
        blob::encode(&mixed_topology(), &mut tiny),
        Err(Error::FormatError)
    );
}
