// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stub bridge for builds without a native backend.
//
// USB, serial and print queues report the transport as unavailable and
// Bluetooth reports no adapter, so scanners degrade to an empty result
// instead of failing.

use printscout_core::error::{Result, ScoutError};

use crate::traits::*;

/// No-op bridge used when no platform backend is compiled in.
pub struct StubBridge;

impl PlatformBridge for StubBridge {
    fn platform_name(&self) -> &str {
        "Desktop (stub)"
    }
}

impl UsbHost for StubBridge {
    fn device_names(&self) -> Result<Vec<String>> {
        tracing::debug!("UsbHost::device_names called on stub bridge");
        Err(ScoutError::TransportUnavailable {
            transport: "usb",
            reason: "no USB backend compiled in (enable the `usb` feature)".into(),
        })
    }

    fn describe_device(&self, _device_name: &str) -> Result<UsbDeviceInfo> {
        Err(ScoutError::PlatformUnavailable)
    }

    fn has_permission(&self, _device_name: &str) -> Result<bool> {
        Err(ScoutError::PlatformUnavailable)
    }
}

impl BluetoothHost for StubBridge {
    fn adapter_state(&self) -> Result<AdapterState> {
        tracing::debug!("BluetoothHost::adapter_state called on stub bridge");
        Ok(AdapterState::Missing)
    }

    fn connect_permission(&self) -> PermissionState {
        PermissionState::NotRequired
    }

    fn bonded_addresses(&self) -> Result<Vec<String>> {
        Err(ScoutError::PlatformUnavailable)
    }

    fn describe_bonded(&self, _address: &str) -> Result<BondedDevice> {
        Err(ScoutError::PlatformUnavailable)
    }
}

impl SerialHost for StubBridge {
    fn serial_ports(&self) -> Result<Vec<SerialPortInfo>> {
        Err(ScoutError::TransportUnavailable {
            transport: "serial",
            reason: "no serial backend compiled in (enable the `serial` feature)".into(),
        })
    }
}

impl PrintQueueHost for StubBridge {
    fn printer_queues(&self) -> Result<Vec<PrinterQueue>> {
        Err(ScoutError::TransportUnavailable {
            transport: "system",
            reason: "no print system on this platform".into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use printscout_core::error::FailureKind;

    #[test]
    fn stub_usb_is_unavailable() {
        let err = StubBridge.device_names().unwrap_err();
        assert_eq!(err.kind(), FailureKind::TransportUnavailable);
    }

    #[test]
    fn stub_bluetooth_has_no_adapter() {
        assert_eq!(StubBridge.adapter_state().unwrap(), AdapterState::Missing);
        assert_eq!(StubBridge.connect_permission(), PermissionState::NotRequired);
    }

    #[test]
    fn stub_serial_and_queues_are_unavailable() {
        let serial = StubBridge.serial_ports().unwrap_err();
        assert_eq!(serial.kind(), FailureKind::TransportUnavailable);
        let queues = StubBridge.printer_queues().unwrap_err();
        assert_eq!(queues.kind(), FailureKind::TransportUnavailable);
    }
}
