// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic capability traits consumed by the scanners.
//
// Each trait mirrors what the operating system actually offers: a list of
// handles first, then per-handle reads that can fail on their own. That split
// is what lets a scanner skip one broken device and keep going.

use std::sync::Arc;

use printscout_core::error::Result;

/// USB "Printer" class code, for both device and interface descriptors.
pub const USB_CLASS_PRINTER: u8 = 7;

/// Bluetooth major class Imaging (0x0600) + minor Printer (0x0080).
pub const BLUETOOTH_CLASS_IMAGING_PRINTER: u32 = 0x0680;

/// Major + minor device class bits of a 24-bit Class of Device.
const BLUETOOTH_DEVICE_CLASS_MASK: u32 = 0x1FFC;

/// Reduce a raw Class of Device (service + major + minor + format bits) to
/// the major/minor device class, the form Android exposes.
pub fn bluetooth_device_class(class_of_device: u32) -> u32 {
    class_of_device & BLUETOOTH_DEVICE_CLASS_MASK
}

/// Everything the platform can tell about one attached USB device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsbDeviceInfo {
    /// Platform handle, e.g. `/dev/bus/usb/001/004` or `001/004`.
    pub device_name: String,
    pub vendor_id: u16,
    pub product_id: u16,
    /// `bDeviceClass` from the device descriptor.
    pub device_class: u8,
    /// `bInterfaceClass` of every interface (all alternate settings).
    pub interface_classes: Vec<u8>,
    pub product_name: Option<String>,
    pub manufacturer_name: Option<String>,
}

impl UsbDeviceInfo {
    /// Printer if the device, or any of its interfaces, is class 7.
    pub fn is_printer(&self) -> bool {
        self.device_class == USB_CLASS_PRINTER
            || self.interface_classes.contains(&USB_CLASS_PRINTER)
    }
}

/// Enumeration of attached USB devices.
pub trait UsbHost: Send + Sync {
    /// Handles of all currently attached devices.
    fn device_names(&self) -> Result<Vec<String>>;

    /// Read descriptors for one device.
    fn describe_device(&self, device_name: &str) -> Result<UsbDeviceInfo>;

    /// Whether this process may already open the device. Never prompts.
    fn has_permission(&self, device_name: &str) -> Result<bool>;
}

/// Power state of the local Bluetooth adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterState {
    /// No adapter on this host.
    Missing,
    PoweredOff,
    PoweredOn,
}

/// Result of checking (not requesting) a runtime permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    Granted,
    Denied,
    /// The platform has no such permission gate.
    NotRequired,
}

/// Bond state reported for a remote Bluetooth device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BondState {
    Bonded,
    Bonding,
    None,
}

/// What the platform knows about one paired device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BondedDevice {
    /// Hardware address, e.g. `DC:0D:30:12:34:56`.
    pub address: String,
    pub name: Option<String>,
    /// Major/minor device class (already masked, see [`bluetooth_device_class`]).
    pub device_class: Option<u32>,
    pub bond_state: BondState,
}

/// Access to the Bluetooth adapter and its bonded-device list.
///
/// Implementations must not start an inquiry scan and must not ask the user
/// for permission.
pub trait BluetoothHost: Send + Sync {
    fn adapter_state(&self) -> Result<AdapterState>;

    /// Status of the permission needed to read bonded devices.
    fn connect_permission(&self) -> PermissionState;

    /// Addresses of devices already bonded with this host.
    fn bonded_addresses(&self) -> Result<Vec<String>>;

    fn describe_bonded(&self, address: &str) -> Result<BondedDevice>;
}

/// Name of the Android runtime permission the Bluetooth scan checks.
pub const BLUETOOTH_CONNECT_PERMISSION: &str = "android.permission.BLUETOOTH_CONNECT";

/// USB adapter details for a serial port, when the OS exposes them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsbSerialInfo {
    pub vendor_id: u16,
    pub product_id: u16,
    pub manufacturer: Option<String>,
    pub product: Option<String>,
}

/// One serial port known to the operating system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialPortInfo {
    /// `/dev/ttyUSB0`, `COM3`, ...
    pub port_name: String,
    /// Present for USB-to-serial adapters.
    pub usb: Option<UsbSerialInfo>,
}

/// Enumeration of serial ports. Ports are listed, never opened.
pub trait SerialHost: Send + Sync {
    fn serial_ports(&self) -> Result<Vec<SerialPortInfo>>;
}

/// Queue state as reported by the OS print system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueState {
    Idle,
    Printing,
    Paused,
    Offline,
    Error,
    Unknown,
}

/// A printer queue configured in the OS print system (CUPS, Windows spooler).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrinterQueue {
    /// Queue name as the print system knows it.
    pub name: String,
    /// Backend URI or port, e.g. `usb://EPSON/TM-T20II` or `socket://10.0.0.7`.
    pub device_uri: String,
    pub state: QueueState,
}

/// Read-only access to the OS print system's configured queues.
pub trait PrintQueueHost: Send + Sync {
    fn printer_queues(&self) -> Result<Vec<PrinterQueue>>;
}

/// Unified bridge that groups all native discovery capabilities.
pub trait PlatformBridge: UsbHost + BluetoothHost + SerialHost + PrintQueueHost {
    /// Human-readable platform name (e.g. "Android", "Linux (libusb)").
    fn platform_name(&self) -> &str;
}

impl<T: UsbHost + ?Sized> UsbHost for Arc<T> {
    fn device_names(&self) -> Result<Vec<String>> {
        (**self).device_names()
    }

    fn describe_device(&self, device_name: &str) -> Result<UsbDeviceInfo> {
        (**self).describe_device(device_name)
    }

    fn has_permission(&self, device_name: &str) -> Result<bool> {
        (**self).has_permission(device_name)
    }
}

impl<T: BluetoothHost + ?Sized> BluetoothHost for Arc<T> {
    fn adapter_state(&self) -> Result<AdapterState> {
        (**self).adapter_state()
    }

    fn connect_permission(&self) -> PermissionState {
        (**self).connect_permission()
    }

    fn bonded_addresses(&self) -> Result<Vec<String>> {
        (**self).bonded_addresses()
    }

    fn describe_bonded(&self, address: &str) -> Result<BondedDevice> {
        (**self).describe_bonded(address)
    }
}

impl<T: SerialHost + ?Sized> SerialHost for Arc<T> {
    fn serial_ports(&self) -> Result<Vec<SerialPortInfo>> {
        (**self).serial_ports()
    }
}

impl<T: PrintQueueHost + ?Sized> PrintQueueHost for Arc<T> {
    fn printer_queues(&self) -> Result<Vec<PrinterQueue>> {
        (**self).printer_queues()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(device_class: u8, interfaces: &[u8]) -> UsbDeviceInfo {
        UsbDeviceInfo {
            device_name: "001/002".into(),
            vendor_id: 0x04b8,
            product_id: 0x0e28,
            device_class,
            interface_classes: interfaces.to_vec(),
            product_name: None,
            manufacturer_name: None,
        }
    }

    #[test]
    fn printer_by_device_or_interface_class() {
        assert!(device(7, &[]).is_printer());
        // Composite device: class 0 at device level, printer on interface 1.
        assert!(device(0, &[3, 7]).is_printer());
        assert!(!device(0, &[3, 8]).is_printer());
        assert!(!device(9, &[9]).is_printer());
    }

    #[test]
    fn class_of_device_is_masked() {
        // Rendering + Object Transfer service bits set on a printer CoD.
        assert_eq!(bluetooth_device_class(0x14_0680), BLUETOOTH_CLASS_IMAGING_PRINTER);
        assert_eq!(bluetooth_device_class(0x0680), 1664);
        // Imaging/Scanner is not a printer.
        assert_ne!(bluetooth_device_class(0x0640), BLUETOOTH_CLASS_IMAGING_PRINTER);
    }
}
