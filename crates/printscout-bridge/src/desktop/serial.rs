// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Serial port listing through the `serialport` crate.

use serialport::{SerialPortType, UsbPortInfo};

use printscout_core::error::{Result, ScoutError};

use crate::traits::{SerialHost, SerialPortInfo, UsbSerialInfo};

/// [`SerialHost`] over the OS serial port registry (udev, IOKit, SetupAPI).
pub struct SerialportHost;

impl SerialHost for SerialportHost {
    fn serial_ports(&self) -> Result<Vec<SerialPortInfo>> {
        let ports = serialport::available_ports().map_err(enumeration_err)?;
        tracing::debug!(count = ports.len(), "serial ports listed");
        Ok(ports
            .into_iter()
            .map(|port| SerialPortInfo {
                usb: usb_details(&port.port_type),
                port_name: port.port_name,
            })
            .collect())
    }
}

fn usb_details(port_type: &SerialPortType) -> Option<UsbSerialInfo> {
    match port_type {
        SerialPortType::UsbPort(UsbPortInfo {
            vid,
            pid,
            manufacturer,
            product,
            ..
        }) => Some(UsbSerialInfo {
            vendor_id: *vid,
            product_id: *pid,
            manufacturer: manufacturer.clone(),
            product: product.clone(),
        }),
        _ => None,
    }
}

fn enumeration_err(e: serialport::Error) -> ScoutError {
    match e.kind() {
        serialport::ErrorKind::NoDevice => ScoutError::TransportUnavailable {
            transport: "serial",
            reason: e.to_string(),
        },
        _ => ScoutError::TransportEnumeration {
            transport: "serial",
            reason: e.to_string(),
        },
    }
}
