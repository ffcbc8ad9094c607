// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// printscout discovery: one scanner per transport plus the aggregator that
// runs them. Scanners see the platform only through the capability traits in
// `printscout-bridge`, so every one of them can run against fakes.

pub mod bluetooth;
pub mod discovery;
pub mod network;
pub mod serial;
pub mod system;
pub mod usb;

pub use bluetooth::BluetoothScanner;
pub use discovery::{Hosts, PrinterDiscovery};
pub use network::{HostChecker, NetworkRange, NetworkScanner, TcpChecker};
pub use serial::SerialScanner;
pub use system::SystemQueueScanner;
pub use usb::UsbScanner;

#[cfg(feature = "icmp")]
pub use network::IcmpChecker;
