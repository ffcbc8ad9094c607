// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// USB enumeration through libusb (`rusb`).
//
// Device handles are `BBB/AAA` (bus/address). Product and manufacturer
// strings need the device to be opened; when that is refused the names stay
// `None` and the permission check reports the device as not yet accessible.

use rusb::{Device, GlobalContext};

use printscout_core::error::{Result, ScoutError};

use crate::device_cache::DeviceCache;
use crate::traits::{UsbDeviceInfo, UsbHost};

/// libusb-backed [`UsbHost`] using the global context.
///
/// `device_names` keeps the enumerated devices so the per-device reads that
/// follow in the same scan do not walk the bus again.
pub struct LibusbHost {
    devices: DeviceCache<Device<GlobalContext>>,
}

impl LibusbHost {
    pub fn new() -> Self {
        Self {
            devices: DeviceCache::new(),
        }
    }

    fn find(&self, device_name: &str) -> Result<Device<GlobalContext>> {
        self.devices
            .get_or_refresh(device_name, enumerate)?
            .ok_or_else(|| ScoutError::inspection(device_name, "device detached"))
    }
}

impl Default for LibusbHost {
    fn default() -> Self {
        Self::new()
    }
}

fn handle_name(device: &Device<GlobalContext>) -> String {
    format!("{:03}/{:03}", device.bus_number(), device.address())
}

fn enumeration_err(e: rusb::Error) -> ScoutError {
    match e {
        rusb::Error::NotSupported | rusb::Error::NoDevice => ScoutError::TransportUnavailable {
            transport: "usb",
            reason: format!("libusb: {e}"),
        },
        other => ScoutError::TransportEnumeration {
            transport: "usb",
            reason: format!("libusb: {other}"),
        },
    }
}

fn enumerate() -> Result<Vec<(String, Device<GlobalContext>)>> {
    let devices = rusb::devices().map_err(enumeration_err)?;
    Ok(devices.iter().map(|d| (handle_name(&d), d)).collect())
}

impl UsbHost for LibusbHost {
    fn device_names(&self) -> Result<Vec<String>> {
        let devices = enumerate()?;
        let names = devices.iter().map(|(name, _)| name.clone()).collect();
        self.devices.replace(devices);
        Ok(names)
    }

    fn describe_device(&self, device_name: &str) -> Result<UsbDeviceInfo> {
        let device = self.find(device_name)?;
        let descriptor = device
            .device_descriptor()
            .map_err(|e| ScoutError::inspection(device_name, e))?;

        let mut interface_classes = Vec::new();
        for index in 0..descriptor.num_configurations() {
            let config = match device.config_descriptor(index) {
                Ok(c) => c,
                Err(e) => {
                    tracing::debug!(device = device_name, index, error = %e, "config descriptor unreadable");
                    continue;
                }
            };
            for interface in config.interfaces() {
                interface_classes.extend(interface.descriptors().map(|d| d.class_code()));
            }
        }

        let (product_name, manufacturer_name) = match device.open() {
            Ok(handle) => (
                handle.read_product_string_ascii(&descriptor).ok(),
                handle.read_manufacturer_string_ascii(&descriptor).ok(),
            ),
            Err(e) => {
                tracing::trace!(device = device_name, error = %e, "cannot open device for strings");
                (None, None)
            }
        };

        Ok(UsbDeviceInfo {
            device_name: device_name.to_owned(),
            vendor_id: descriptor.vendor_id(),
            product_id: descriptor.product_id(),
            device_class: descriptor.class_code(),
            interface_classes,
            product_name,
            manufacturer_name,
        })
    }

    fn has_permission(&self, device_name: &str) -> Result<bool> {
        let device = self.find(device_name)?;
        match device.open() {
            Ok(_handle) => Ok(true),
            Err(rusb::Error::Access) => Ok(false),
            Err(e) => Err(ScoutError::inspection(device_name, e)),
        }
    }
}
