// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Desktop bridge: libusb for USB, BlueZ for Bluetooth, serialport for serial
// ports, the OS print system for queues, and the stub for whatever is not
// compiled in.

#[cfg(feature = "usb")]
pub mod libusb;

#[cfg(all(feature = "bluez", target_os = "linux"))]
pub mod bluez;

#[cfg(feature = "serial")]
pub mod serial;

pub mod queues;

use printscout_core::error::Result;

#[allow(unused_imports)]
use crate::stub::StubBridge;
use crate::traits::*;

/// Composes per-transport backends chosen at build time.
pub struct DesktopBridge {
    usb: Box<dyn UsbHost>,
    bluetooth: Box<dyn BluetoothHost>,
    serial: Box<dyn SerialHost>,
    queues: queues::SystemQueueHost,
    name: String,
}

impl DesktopBridge {
    /// Pick the best backend available for each transport.
    ///
    /// The BlueZ backend needs a tokio runtime; outside one, Bluetooth falls
    /// back to the stub (no adapter).
    pub fn new() -> Self {
        #[allow(unused_mut)]
        let mut parts: Vec<&str> = Vec::new();

        #[cfg(feature = "usb")]
        let usb: Box<dyn UsbHost> = {
            parts.push("libusb");
            Box::new(libusb::LibusbHost::new())
        };
        #[cfg(not(feature = "usb"))]
        let usb: Box<dyn UsbHost> = Box::new(StubBridge);

        #[cfg(all(feature = "bluez", target_os = "linux"))]
        let bluetooth: Box<dyn BluetoothHost> = match bluez::BluezHost::from_current_runtime() {
            Some(host) => {
                parts.push("bluez");
                Box::new(host)
            }
            None => {
                tracing::warn!("no tokio runtime; BlueZ backend disabled");
                Box::new(StubBridge)
            }
        };
        #[cfg(not(all(feature = "bluez", target_os = "linux")))]
        let bluetooth: Box<dyn BluetoothHost> = Box::new(StubBridge);

        #[cfg(feature = "serial")]
        let serial: Box<dyn SerialHost> = {
            parts.push("serialport");
            Box::new(serial::SerialportHost)
        };
        #[cfg(not(feature = "serial"))]
        let serial: Box<dyn SerialHost> = Box::new(StubBridge);

        let name = if parts.is_empty() {
            format!("{} (stub)", std::env::consts::OS)
        } else {
            format!("{} ({})", std::env::consts::OS, parts.join(", "))
        };

        Self {
            usb,
            bluetooth,
            serial,
            queues: queues::SystemQueueHost,
            name,
        }
    }
}

impl Default for DesktopBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl PlatformBridge for DesktopBridge {
    fn platform_name(&self) -> &str {
        &self.name
    }
}

impl UsbHost for DesktopBridge {
    fn device_names(&self) -> Result<Vec<String>> {
        self.usb.device_names()
    }

    fn describe_device(&self, device_name: &str) -> Result<UsbDeviceInfo> {
        self.usb.describe_device(device_name)
    }

    fn has_permission(&self, device_name: &str) -> Result<bool> {
        self.usb.has_permission(device_name)
    }
}

impl BluetoothHost for DesktopBridge {
    fn adapter_state(&self) -> Result<AdapterState> {
        self.bluetooth.adapter_state()
    }

    fn connect_permission(&self) -> PermissionState {
        self.bluetooth.connect_permission()
    }

    fn bonded_addresses(&self) -> Result<Vec<String>> {
        self.bluetooth.bonded_addresses()
    }

    fn describe_bonded(&self, address: &str) -> Result<BondedDevice> {
        self.bluetooth.describe_bonded(address)
    }
}

impl SerialHost for DesktopBridge {
    fn serial_ports(&self) -> Result<Vec<SerialPortInfo>> {
        self.serial.serial_ports()
    }
}

impl PrintQueueHost for DesktopBridge {
    fn printer_queues(&self) -> Result<Vec<PrinterQueue>> {
        self.queues.printer_queues()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_mentions_os() {
        let bridge = DesktopBridge::new();
        assert!(bridge.platform_name().starts_with(std::env::consts::OS));
    }

    #[cfg(not(feature = "usb"))]
    #[test]
    fn without_usb_feature_usb_is_unavailable() {
        let bridge = DesktopBridge::new();
        assert!(bridge.device_names().is_err());
    }

    #[cfg(not(feature = "serial"))]
    #[test]
    fn without_serial_feature_serial_is_unavailable() {
        let bridge = DesktopBridge::new();
        assert!(bridge.serial_ports().is_err());
    }
}
