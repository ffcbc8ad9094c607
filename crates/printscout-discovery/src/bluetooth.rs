// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bluetooth printer scanner.
//
// Only devices already bonded with this host are considered; no inquiry scan
// is started. Three preconditions short-circuit to an empty result, in order:
// the adapter exists, it is powered on, and the connect permission is held.

use std::sync::Arc;

use tracing::{debug, info, warn};

use printscout_bridge::traits::{
    AdapterState, BluetoothHost, BondState, BondedDevice, PermissionState,
    BLUETOOTH_CLASS_IMAGING_PRINTER, BLUETOOTH_CONNECT_PERMISSION,
};
use printscout_core::error::{Result, ScoutError};
use printscout_core::types::{PrinterDescriptor, PrinterStatus, TransportOutcome, TransportScan};

/// Name fragments that mark a paired device as a printer. "printer" is
/// subsumed by "print" but is kept so the list reads as the rule does.
const PRINTER_NAME_HINTS: &[&str] = &["printer", "print"];

/// Whether a bonded device looks like a printer, by class or by name.
pub fn is_bluetooth_printer(device: &BondedDevice) -> bool {
    if device.device_class == Some(BLUETOOTH_CLASS_IMAGING_PRINTER) {
        return true;
    }
    device.name.as_deref().is_some_and(|name| {
        let lower = name.to_lowercase();
        PRINTER_NAME_HINTS.iter().any(|hint| lower.contains(hint))
    })
}

/// Map a bond state to the status shown to the user.
pub fn bond_status(state: BondState) -> PrinterStatus {
    match state {
        BondState::Bonded => PrinterStatus::Paired,
        BondState::Bonding => PrinterStatus::Pairing,
        BondState::None => PrinterStatus::NotPaired,
    }
}

/// Scanner for paired Bluetooth printers.
#[derive(Clone)]
pub struct BluetoothScanner {
    host: Arc<dyn BluetoothHost>,
}

impl BluetoothScanner {
    pub fn new(host: Arc<dyn BluetoothHost>) -> Self {
        Self { host }
    }

    /// Scan the bonded-device list once.
    pub fn scan(&self) -> TransportScan {
        if let Err(err) = self.check_preconditions() {
            return TransportScan::empty(TransportOutcome::from_error(&err));
        }

        let addresses = match self.host.bonded_addresses() {
            Ok(addresses) => addresses,
            Err(err) => {
                warn!(
                    transport = "bluetooth",
                    kind = err.kind().as_str(),
                    error = %err,
                    "bonded device list failed"
                );
                return TransportScan::empty(TransportOutcome::from_error(&err));
            }
        };

        let mut printers = Vec::new();
        let mut skipped = 0;
        for address in &addresses {
            let device = match self.host.describe_bonded(address) {
                Ok(device) => device,
                Err(err) => {
                    skipped += 1;
                    let err = match err {
                        e @ ScoutError::DeviceInspection { .. } => e,
                        other => ScoutError::inspection(address.as_str(), other),
                    };
                    warn!(
                        transport = "bluetooth",
                        kind = err.kind().as_str(),
                        device = %address,
                        error = %err,
                        "skipping bonded device"
                    );
                    continue;
                }
            };

            if !is_bluetooth_printer(&device) {
                debug!(device = %address, class = ?device.device_class, "not a printer");
                continue;
            }
            printers.push(PrinterDescriptor::bluetooth(
                device.name.as_deref(),
                &device.address,
                bond_status(device.bond_state),
            ));
        }

        info!(
            transport = "bluetooth",
            bonded = addresses.len(),
            found = printers.len(),
            skipped,
            "Bluetooth scan finished"
        );
        TransportScan::completed(printers, skipped)
    }

    /// Printers only, with every failure absorbed.
    pub fn list_bluetooth_printers(&self) -> Vec<PrinterDescriptor> {
        self.scan().printers
    }

    /// Adapter present, adapter powered, connect permission held; the
    /// first that fails ends the scan.
    fn check_preconditions(&self) -> Result<()> {
        let state = self.host.adapter_state().inspect_err(|err| {
            warn!(transport = "bluetooth", kind = err.kind().as_str(), error = %err, "adapter query failed");
        })?;

        let unavailable = |reason: &str| ScoutError::TransportUnavailable {
            transport: "bluetooth",
            reason: reason.into(),
        };
        match state {
            AdapterState::Missing => {
                debug!(transport = "bluetooth", "no Bluetooth adapter");
                return Err(unavailable("no Bluetooth adapter"));
            }
            AdapterState::PoweredOff => {
                debug!(transport = "bluetooth", "Bluetooth adapter is off");
                return Err(unavailable("Bluetooth adapter is powered off"));
            }
            AdapterState::PoweredOn => {}
        }

        if self.host.connect_permission() == PermissionState::Denied {
            let err = ScoutError::PermissionDenied(BLUETOOTH_CONNECT_PERMISSION.into());
            info!(
                transport = "bluetooth",
                kind = err.kind().as_str(),
                permission = BLUETOOTH_CONNECT_PERMISSION,
                "connect permission not granted"
            );
            return Err(err);
        }
        Ok(())
    }
}
