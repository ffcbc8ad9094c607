// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for range expansion and device classification in the
// printscout-discovery crate.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use printscout_bridge::traits::{BondState, BondedDevice, UsbDeviceInfo};
use printscout_discovery::bluetooth::is_bluetooth_printer;
use printscout_discovery::network::NetworkRange;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn bonded(name: &str, class: u32) -> BondedDevice {
    BondedDevice {
        address: "DC:0D:30:00:00:01".into(),
        name: Some(name.into()),
        device_class: Some(class),
        bond_state: BondState::Bonded,
    }
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Parse a /24 prefix and expand all 254 host addresses.
fn bench_range_expansion(c: &mut Criterion) {
    c.bench_function("NetworkRange parse + hosts (/24)", |b| {
        b.iter(|| {
            let range = NetworkRange::parse(black_box("192.168.1"), 1, 254, 9100).unwrap();
            range.hosts().count()
        });
    });
}

/// Bluetooth classification: class match, name match, and a miss that walks
/// every name hint.
fn bench_bluetooth_classification(c: &mut Criterion) {
    let devices = [
        bonded("PT-210", 0x0680),
        bonded("MTP-II Thermal Printer", 0x0404),
        bonded("WH-1000XM4 Wireless Headphones", 0x0404),
    ];

    c.bench_function("is_bluetooth_printer (3 devices)", |b| {
        b.iter(|| {
            devices
                .iter()
                .filter(|d| is_bluetooth_printer(black_box(d)))
                .count()
        });
    });
}

/// USB classification of a composite device with many interfaces.
fn bench_usb_classification(c: &mut Criterion) {
    let device = UsbDeviceInfo {
        device_name: "001/004".into(),
        vendor_id: 1046,
        product_id: 20497,
        device_class: 0,
        interface_classes: vec![3, 3, 2, 10, 8, 255, 7],
        product_name: None,
        manufacturer_name: None,
    };

    c.bench_function("UsbDeviceInfo::is_printer (composite)", |b| {
        b.iter(|| black_box(&device).is_printer());
    });
}

criterion_group!(
    benches,
    bench_range_expansion,
    bench_bluetooth_classification,
    bench_usb_classification,
);
criterion_main!(benches);
