// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Serial port scanner.
//
// A serial port cannot say what is on the other end without writing to it,
// and discovery never writes. Every port is reported as a candidate; USB
// adapters lend their product string as the name.

use std::sync::Arc;

use tracing::{debug, info, warn};

use printscout_bridge::traits::SerialHost;
use printscout_core::error::ScoutError;
use printscout_core::types::{PrinterDescriptor, TransportOutcome, TransportScan};

/// Scanner for printers on serial ports.
#[derive(Clone)]
pub struct SerialScanner {
    host: Arc<dyn SerialHost>,
}

impl SerialScanner {
    pub fn new(host: Arc<dyn SerialHost>) -> Self {
        Self { host }
    }

    pub fn scan(&self) -> TransportScan {
        let ports = match self.host.serial_ports() {
            Ok(ports) => ports,
            Err(err) => {
                if matches!(err, ScoutError::TransportUnavailable { .. }) {
                    info!(transport = "serial", kind = err.kind().as_str(), error = %err, "serial unavailable");
                } else {
                    warn!(transport = "serial", kind = err.kind().as_str(), error = %err, "serial port list failed");
                }
                return TransportScan::empty(TransportOutcome::from_error(&err));
            }
        };

        let printers: Vec<_> = ports
            .iter()
            .map(|port| {
                let product = port.usb.as_ref().and_then(|usb| usb.product.as_deref());
                debug!(port = %port.port_name, usb = port.usb.is_some(), "serial port");
                PrinterDescriptor::serial(&port.port_name, product)
            })
            .collect();

        info!(transport = "serial", found = printers.len(), "serial scan finished");
        TransportScan::completed(printers, 0)
    }

    /// Serial ports only, with every failure absorbed.
    pub fn list_serial_printers(&self) -> Vec<PrinterDescriptor> {
        self.scan().printers
    }
}
