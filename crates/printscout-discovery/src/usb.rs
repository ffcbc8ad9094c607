// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// USB printer scanner.
//
// Walks the attached-device list once, keeps the devices whose device class
// or any interface class is Printer (7), and reports whether this process can
// already open each one. Permission is never requested from here.

use std::sync::Arc;

use tracing::{debug, info, warn};

use printscout_bridge::traits::UsbHost;
use printscout_core::error::ScoutError;
use printscout_core::types::{PrinterDescriptor, TransportOutcome, TransportScan};

/// Scanner for printers attached over USB.
#[derive(Clone)]
pub struct UsbScanner {
    host: Arc<dyn UsbHost>,
}

impl UsbScanner {
    pub fn new(host: Arc<dyn UsbHost>) -> Self {
        Self { host }
    }

    /// Scan once and report how it went.
    ///
    /// A failing device is skipped and counted in
    /// `TransportOutcome::Completed { skipped }`; a failing device list ends
    /// the scan with no printers.
    pub fn scan(&self) -> TransportScan {
        let names = match self.host.device_names() {
            Ok(names) => names,
            Err(err) => {
                if matches!(err, ScoutError::TransportUnavailable { .. }) {
                    info!(transport = "usb", kind = err.kind().as_str(), error = %err, "USB unavailable");
                } else {
                    warn!(transport = "usb", kind = err.kind().as_str(), error = %err, "USB device list failed");
                }
                return TransportScan::empty(TransportOutcome::from_error(&err));
            }
        };

        let mut printers = Vec::new();
        let mut skipped = 0;
        for name in &names {
            match self.inspect(name) {
                Ok(Some(printer)) => printers.push(printer),
                Ok(None) => {}
                Err(err) => {
                    skipped += 1;
                    warn!(
                        transport = "usb",
                        kind = err.kind().as_str(),
                        device = %name,
                        error = %err,
                        "skipping USB device"
                    );
                }
            }
        }

        info!(
            transport = "usb",
            attached = names.len(),
            found = printers.len(),
            skipped,
            "USB scan finished"
        );
        TransportScan::completed(printers, skipped)
    }

    /// Printers only, with every failure absorbed.
    pub fn list_usb_printers(&self) -> Vec<PrinterDescriptor> {
        self.scan().printers
    }

    fn inspect(&self, device_name: &str) -> printscout_core::error::Result<Option<PrinterDescriptor>> {
        let info = self.host.describe_device(device_name)?;
        if !info.is_printer() {
            debug!(
                device = %device_name,
                class = info.device_class,
                interfaces = ?info.interface_classes,
                "not a printer"
            );
            return Ok(None);
        }

        let has_permission = self
            .host
            .has_permission(device_name)
            .map_err(|e| match e {
                e @ ScoutError::DeviceInspection { .. } => e,
                other => ScoutError::inspection(device_name, other),
            })?;

        Ok(Some(PrinterDescriptor::usb(
            info.product_name.as_deref(),
            info.manufacturer_name.as_deref(),
            info.vendor_id,
            info.product_id,
            has_permission,
        )))
    }
}
