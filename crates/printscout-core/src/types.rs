// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for printscout.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use uuid::Uuid;

use crate::error::ScoutError;

/// Fallback label for USB printers that report neither product nor manufacturer.
pub const USB_FALLBACK_NAME: &str = "USB Printer";

/// Fallback label for paired Bluetooth printers without a name.
pub const BLUETOOTH_FALLBACK_NAME: &str = "Bluetooth Printer";

/// Label used for every printer found by the network sweep.
pub const NETWORK_PRINTER_NAME: &str = "Network Printer";

/// Unique identifier for one discovery invocation (log correlation only).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScanId(pub Uuid);

impl ScanId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ScanId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ScanId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The discovery channel a printer was found on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Transport {
    #[serde(rename = "USB")]
    Usb,
    Bluetooth,
    Network,
    /// Serial ports (RS-232 and USB-to-serial adapters).
    Serial,
    /// Queues configured in the OS print system (CUPS, Windows spooler).
    System,
}

impl Transport {
    /// Wire name, as emitted in the `interfaceType` field.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Usb => "USB",
            Self::Bluetooth => "Bluetooth",
            Self::Network => "Network",
            Self::Serial => "Serial",
            Self::System => "System",
        }
    }

    /// Lowercase form used in log fields.
    pub fn log_name(&self) -> &'static str {
        match self {
            Self::Usb => "usb",
            Self::Bluetooth => "bluetooth",
            Self::Network => "network",
            Self::Serial => "serial",
            Self::System => "system",
        }
    }
}

impl std::fmt::Display for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transport-scoped state of a printer at the moment it was discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrinterStatus {
    /// USB: the process already holds access permission for the device.
    Connected,
    /// USB: attached, but access has not been granted yet.
    #[serde(rename = "Permission Required")]
    PermissionRequired,
    /// Bluetooth: bonded with this host.
    Paired,
    /// Bluetooth: bonding in progress.
    Pairing,
    /// Bluetooth: any other bond state.
    #[serde(rename = "Not Paired")]
    NotPaired,
    /// Network: host answered and the printer port accepted a connection.
    /// Serial: the port exists; nothing was sent to it.
    Available,
    /// System queue: idle and accepting jobs.
    Idle,
    /// System queue: a job is printing.
    Printing,
    /// System queue: stopped by an administrator.
    Paused,
    Offline,
    /// System queue: paper out, jam or another printer fault.
    Error,
    /// System queue: state not reported or not recognised.
    Unknown,
}

impl PrinterStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connected => "Connected",
            Self::PermissionRequired => "Permission Required",
            Self::Paired => "Paired",
            Self::Pairing => "Pairing",
            Self::NotPaired => "Not Paired",
            Self::Available => "Available",
            Self::Idle => "Idle",
            Self::Printing => "Printing",
            Self::Paused => "Paused",
            Self::Offline => "Offline",
            Self::Error => "Error",
            Self::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for PrinterStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A printer found during one discovery invocation.
///
/// Descriptors are snapshots: they hold no connection and are rebuilt from
/// scratch on every call. `identifier` is unique within its transport only;
/// the same printer seen over USB and Bluetooth is reported twice.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrinterDescriptor {
    pub name: String,
    #[serde(rename = "interfaceType")]
    pub transport: Transport,
    pub identifier: String,
    pub status: PrinterStatus,
}

impl PrinterDescriptor {
    /// Build a USB descriptor.
    ///
    /// Name falls back product → manufacturer → [`USB_FALLBACK_NAME`]; blank
    /// strings count as missing. The identifier uses the decimal ids, e.g.
    /// `VID:1208/PID:3624`.
    pub fn usb(
        product_name: Option<&str>,
        manufacturer_name: Option<&str>,
        vendor_id: u16,
        product_id: u16,
        has_permission: bool,
    ) -> Self {
        let name = non_blank(product_name)
            .or_else(|| non_blank(manufacturer_name))
            .unwrap_or(USB_FALLBACK_NAME)
            .to_owned();
        Self {
            name,
            transport: Transport::Usb,
            identifier: usb_identifier(vendor_id, product_id),
            status: if has_permission {
                PrinterStatus::Connected
            } else {
                PrinterStatus::PermissionRequired
            },
        }
    }

    /// Build a Bluetooth descriptor keyed by hardware address.
    pub fn bluetooth(name: Option<&str>, address: &str, status: PrinterStatus) -> Self {
        Self {
            name: non_blank(name).unwrap_or(BLUETOOTH_FALLBACK_NAME).to_owned(),
            transport: Transport::Bluetooth,
            identifier: address.to_owned(),
            status,
        }
    }

    /// Build a network descriptor for a host whose printer port accepted a connection.
    pub fn network(ip: Ipv4Addr, port: u16) -> Self {
        Self {
            name: NETWORK_PRINTER_NAME.to_owned(),
            transport: Transport::Network,
            identifier: format!("{ip}:{port}"),
            status: PrinterStatus::Available,
        }
    }

    /// Build a serial-port descriptor. Named after the adapter's product
    /// string when there is one, otherwise after the port.
    pub fn serial(port_name: &str, product: Option<&str>) -> Self {
        Self {
            name: non_blank(product).unwrap_or(port_name).to_owned(),
            transport: Transport::Serial,
            identifier: port_name.to_owned(),
            status: PrinterStatus::Available,
        }
    }

    /// Build a descriptor for an OS print queue. The identifier is the
    /// queue's device URI, or the queue name when the URI is unknown.
    pub fn system_queue(queue_name: &str, device_uri: &str, status: PrinterStatus) -> Self {
        let identifier = if device_uri.trim().is_empty() {
            queue_name
        } else {
            device_uri
        };
        Self {
            name: queue_name.to_owned(),
            transport: Transport::System,
            identifier: identifier.to_owned(),
            status,
        }
    }
}

/// `VID:<vendor>/PID:<product>` with decimal ids.
pub fn usb_identifier(vendor_id: u16, product_id: u16) -> String {
    format!("VID:{vendor_id}/PID:{product_id}")
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.trim().is_empty())
}

/// How a single transport's scan ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TransportOutcome {
    /// The scan ran to the end; `skipped` devices failed inspection.
    Completed { skipped: usize },
    /// No adapter, adapter powered off, or no backend on this platform.
    Unavailable { reason: String },
    /// A runtime permission the scan needs has not been granted.
    PermissionDenied { permission: String },
    /// The device list itself could not be read.
    EnumerationFailed { reason: String },
    /// Stopped by cancellation or deadline before finishing.
    Cancelled,
    /// Turned off in configuration.
    Disabled,
    /// The scanner task failed unexpectedly (panic in a capability provider).
    Crashed { reason: String },
}

impl TransportOutcome {
    /// Outcome of a scan that could not start because of `err`.
    pub fn from_error(err: &ScoutError) -> Self {
        match err {
            ScoutError::TransportUnavailable { reason, .. } => Self::Unavailable {
                reason: reason.clone(),
            },
            ScoutError::PlatformUnavailable => Self::Unavailable {
                reason: err.to_string(),
            },
            ScoutError::PermissionDenied(permission) => Self::PermissionDenied {
                permission: permission.clone(),
            },
            other => Self::EnumerationFailed {
                reason: other.to_string(),
            },
        }
    }

    /// Whether the scan covered every device it could see.
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// Result of running one scanner: the printers plus how the scan went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportScan {
    pub printers: Vec<PrinterDescriptor>,
    pub outcome: TransportOutcome,
}

impl TransportScan {
    pub fn completed(printers: Vec<PrinterDescriptor>, skipped: usize) -> Self {
        Self {
            printers,
            outcome: TransportOutcome::Completed { skipped },
        }
    }

    /// An empty scan that ended early for the given reason.
    pub fn empty(outcome: TransportOutcome) -> Self {
        Self {
            printers: Vec::new(),
            outcome,
        }
    }
}

/// Per-transport section of a [`DiscoveryReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportReport {
    pub transport: Transport,
    pub outcome: TransportOutcome,
    pub printers: Vec<PrinterDescriptor>,
    pub elapsed_ms: u64,
}

/// Everything one discovery invocation learned, transport by transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryReport {
    pub scan_id: ScanId,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub transports: Vec<TransportReport>,
}

impl DiscoveryReport {
    /// All printers, concatenated in transport order.
    pub fn printers(&self) -> Vec<PrinterDescriptor> {
        self.transports
            .iter()
            .flat_map(|t| t.printers.iter().cloned())
            .collect()
    }

    /// The section for one transport, if it was part of this invocation.
    pub fn transport(&self, transport: Transport) -> Option<&TransportReport> {
        self.transports.iter().find(|t| t.transport == transport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_serializes_with_interface_type() {
        let d = PrinterDescriptor::usb(Some("TM-T20III"), Some("EPSON"), 1208, 3624, false);
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["name"], "TM-T20III");
        assert_eq!(json["interfaceType"], "USB");
        assert_eq!(json["identifier"], "VID:1208/PID:3624");
        assert_eq!(json["status"], "Permission Required");
    }

    #[test]
    fn usb_name_fallback_chain() {
        let manufacturer_only = PrinterDescriptor::usb(None, Some("Xprinter"), 1, 2, true);
        assert_eq!(manufacturer_only.name, "Xprinter");
        assert_eq!(manufacturer_only.status, PrinterStatus::Connected);

        let blank_product = PrinterDescriptor::usb(Some("  "), None, 1, 2, true);
        assert_eq!(blank_product.name, USB_FALLBACK_NAME);
    }

    #[test]
    fn bluetooth_and_network_constructors() {
        let bt = PrinterDescriptor::bluetooth(None, "66:22:3A:10:B2:01", PrinterStatus::NotPaired);
        assert_eq!(bt.name, BLUETOOTH_FALLBACK_NAME);
        assert_eq!(bt.identifier, "66:22:3A:10:B2:01");
        assert_eq!(
            serde_json::to_value(&bt).unwrap()["status"],
            "Not Paired"
        );

        let net = PrinterDescriptor::network(Ipv4Addr::new(192, 168, 1, 50), 9100);
        assert_eq!(net.identifier, "192.168.1.50:9100");
        assert_eq!(net.name, NETWORK_PRINTER_NAME);
        assert_eq!(net.status, PrinterStatus::Available);
        assert_eq!(net.transport.to_string(), "Network");
    }

    #[test]
    fn serial_and_system_queue_constructors() {
        let usb_serial = PrinterDescriptor::serial("/dev/ttyUSB0", Some("POS58 Printer"));
        assert_eq!(usb_serial.name, "POS58 Printer");
        assert_eq!(usb_serial.identifier, "/dev/ttyUSB0");
        assert_eq!(serde_json::to_value(&usb_serial).unwrap()["interfaceType"], "Serial");

        let onboard = PrinterDescriptor::serial("COM1", None);
        assert_eq!(onboard.name, "COM1");

        let queue = PrinterDescriptor::system_queue(
            "TM-T20",
            "usb://EPSON/TM-T20II",
            PrinterStatus::Idle,
        );
        assert_eq!(queue.identifier, "usb://EPSON/TM-T20II");
        assert_eq!(queue.transport.to_string(), "System");

        let no_uri = PrinterDescriptor::system_queue("Office", "", PrinterStatus::Unknown);
        assert_eq!(no_uri.identifier, "Office");
    }

    #[test]
    fn outcome_from_error() {
        let denied = ScoutError::PermissionDenied("android.permission.BLUETOOTH_CONNECT".into());
        assert_eq!(
            TransportOutcome::from_error(&denied),
            TransportOutcome::PermissionDenied {
                permission: "android.permission.BLUETOOTH_CONNECT".into()
            }
        );

        let off = ScoutError::TransportUnavailable {
            transport: "bluetooth",
            reason: "adapter powered off".into(),
        };
        assert_eq!(
            TransportOutcome::from_error(&off),
            TransportOutcome::Unavailable {
                reason: "adapter powered off".into()
            }
        );

        let died = ScoutError::TransportEnumeration {
            transport: "usb",
            reason: "service died".into(),
        };
        assert!(matches!(
            TransportOutcome::from_error(&died),
            TransportOutcome::EnumerationFailed { .. }
        ));
    }

    #[test]
    fn descriptor_deserializes_from_bridge_json() {
        let json = r#"{"name":"PT-210","interfaceType":"Bluetooth","identifier":"DC:0D:30:AA:01:02","status":"Pairing"}"#;
        let d: PrinterDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(d.transport, Transport::Bluetooth);
        assert_eq!(d.status, PrinterStatus::Pairing);
    }

    #[test]
    fn report_flattens_in_transport_order() {
        let now = Utc::now();
        let report = DiscoveryReport {
            scan_id: ScanId::new(),
            started_at: now,
            finished_at: now,
            transports: vec![
                TransportReport {
                    transport: Transport::Usb,
                    outcome: TransportOutcome::Completed { skipped: 0 },
                    printers: vec![PrinterDescriptor::usb(None, None, 1, 1, true)],
                    elapsed_ms: 3,
                },
                TransportReport {
                    transport: Transport::Bluetooth,
                    outcome: TransportOutcome::PermissionDenied {
                        permission: "BLUETOOTH_CONNECT".into(),
                    },
                    printers: Vec::new(),
                    elapsed_ms: 1,
                },
            ],
        };
        assert_eq!(report.printers().len(), 1);
        assert!(!report.transport(Transport::Bluetooth).unwrap().outcome.is_complete());
        assert!(report.transport(Transport::Network).is_none());

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["transports"][1]["outcome"]["state"], "permission_denied");
    }
}
