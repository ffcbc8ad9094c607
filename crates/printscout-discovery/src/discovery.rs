// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Discovery aggregator: the one entry point callers use.
//
// Every scanner except the network sweep calls blocking platform APIs, so
// each runs on the blocking pool. A scanner that panics (usually a
// misbehaving capability provider) costs only its own transport: the join
// error is logged and that transport contributes nothing. Results are always
// concatenated USB first, then Bluetooth, then network, then serial ports and
// OS print queues.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use printscout_bridge::traits::{
    BluetoothHost, PlatformBridge, PrintQueueHost, SerialHost, UsbHost,
};
use printscout_core::config::DiscoveryConfig;
use printscout_core::types::{
    DiscoveryReport, PrinterDescriptor, ScanId, Transport, TransportOutcome, TransportReport,
    TransportScan,
};

use crate::bluetooth::BluetoothScanner;
use crate::network::{HostChecker, NetworkRange, NetworkScanner, TcpChecker};
use crate::serial::SerialScanner;
use crate::system::SystemQueueScanner;
use crate::usb::UsbScanner;

/// The capability providers one discovery instance reads from.
#[derive(Clone)]
pub struct Hosts {
    pub usb: Arc<dyn UsbHost>,
    pub bluetooth: Arc<dyn BluetoothHost>,
    pub serial: Arc<dyn SerialHost>,
    pub queues: Arc<dyn PrintQueueHost>,
}

impl Hosts {
    /// Every capability from one platform bridge.
    pub fn from_bridge(bridge: Arc<dyn PlatformBridge>) -> Self {
        Self {
            usb: Arc::new(Arc::clone(&bridge)),
            bluetooth: Arc::new(Arc::clone(&bridge)),
            serial: Arc::new(Arc::clone(&bridge)),
            queues: Arc::new(bridge),
        }
    }
}

/// Printer discovery across USB, paired Bluetooth, the local network, serial
/// ports and OS print queues.
///
/// Holds no state between calls: every invocation builds its descriptors
/// from scratch, so concurrent callers need no coordination.
#[derive(Clone)]
pub struct PrinterDiscovery {
    usb: UsbScanner,
    bluetooth: BluetoothScanner,
    network: NetworkScanner,
    serial: SerialScanner,
    queues: SystemQueueScanner,
    config: DiscoveryConfig,
}

impl PrinterDiscovery {
    /// Discovery over a platform bridge with the TCP network checker.
    pub fn new(bridge: Arc<dyn PlatformBridge>, config: DiscoveryConfig) -> Self {
        Self::with_hosts(Hosts::from_bridge(bridge), Arc::new(TcpChecker), config)
    }

    /// Discovery over explicitly supplied capability providers.
    pub fn with_hosts(hosts: Hosts, checker: Arc<dyn HostChecker>, config: DiscoveryConfig) -> Self {
        Self {
            usb: UsbScanner::new(hosts.usb),
            bluetooth: BluetoothScanner::new(hosts.bluetooth),
            network: NetworkScanner::new(config.network.clone(), checker),
            serial: SerialScanner::new(hosts.serial),
            queues: SystemQueueScanner::new(hosts.queues),
            config,
        }
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    // -- Plain list API --------------------------------------------------

    /// USB printers followed by Bluetooth printers. Never fails.
    pub async fn discover_all_printers(&self) -> Vec<PrinterDescriptor> {
        self.discover_all().await.printers()
    }

    /// Sweep `base_ip.start ..= base_ip.end` for hosts accepting `port`.
    pub async fn scan_network_range(
        &self,
        base_ip: &str,
        start: u8,
        end: u8,
        port: u16,
    ) -> Vec<PrinterDescriptor> {
        self.network.scan_network_range(base_ip, start, end, port).await
    }

    // The synchronous list methods run on the calling thread. Called from a
    // multi-threaded runtime worker, that worker is handed off first so a
    // provider may block on its own runtime. Async code on a current-thread
    // runtime should use `discover_all` instead; there a blocking provider
    // panics and the transport comes back empty.

    /// USB scan on the calling thread.
    pub fn list_usb_printers(&self) -> Vec<PrinterDescriptor> {
        if !self.config.usb_enabled {
            return Vec::new();
        }
        catch_scan(Transport::Usb, || self.usb.scan()).printers
    }

    /// Bluetooth scan on the calling thread.
    pub fn list_bluetooth_printers(&self) -> Vec<PrinterDescriptor> {
        if !self.config.bluetooth_enabled {
            return Vec::new();
        }
        catch_scan(Transport::Bluetooth, || self.bluetooth.scan()).printers
    }

    /// Serial ports on the calling thread.
    pub fn list_serial_printers(&self) -> Vec<PrinterDescriptor> {
        if !self.config.serial_enabled {
            return Vec::new();
        }
        catch_scan(Transport::Serial, || self.serial.scan()).printers
    }

    /// OS print queues on the calling thread.
    pub fn list_system_printers(&self) -> Vec<PrinterDescriptor> {
        if !self.config.system_queues_enabled {
            return Vec::new();
        }
        catch_scan(Transport::System, || self.queues.scan()).printers
    }

    // -- Reporting API ---------------------------------------------------

    /// USB and Bluetooth, with per-transport outcome and timing.
    pub async fn discover_all(&self) -> DiscoveryReport {
        let scan_id = ScanId::new();
        let started_at = Utc::now();
        info!(%scan_id, "discovery started");

        let (usb, bluetooth) = tokio::join!(self.run_usb(), self.run_bluetooth());
        finish(scan_id, started_at, vec![usb, bluetooth])
    }

    /// Sweep `range` under `cancel` and the configured deadline.
    pub async fn scan_network(
        &self,
        range: &NetworkRange,
        cancel: &CancellationToken,
    ) -> TransportScan {
        self.network.scan(range, cancel).await
    }

    /// Every transport at once: USB, Bluetooth, the configured network
    /// range, serial ports and OS print queues.
    ///
    /// Cancellation stops the network sweep; the other scans are short and
    /// always run to completion.
    pub async fn discover_everywhere(&self, cancel: &CancellationToken) -> DiscoveryReport {
        let scan_id = ScanId::new();
        let started_at = Utc::now();
        info!(%scan_id, "discovery started on all transports");

        let (usb, bluetooth, network, serial, queues) = tokio::join!(
            self.run_usb(),
            self.run_bluetooth(),
            self.run_network(cancel),
            self.run_serial(),
            self.run_queues()
        );
        finish(scan_id, started_at, vec![usb, bluetooth, network, serial, queues])
    }

    // -- Internals -------------------------------------------------------

    async fn run_usb(&self) -> TransportReport {
        let scanner = self.usb.clone();
        run_blocking(Transport::Usb, self.config.usb_enabled, move || scanner.scan()).await
    }

    async fn run_bluetooth(&self) -> TransportReport {
        let scanner = self.bluetooth.clone();
        run_blocking(Transport::Bluetooth, self.config.bluetooth_enabled, move || {
            scanner.scan()
        })
        .await
    }

    async fn run_serial(&self) -> TransportReport {
        let scanner = self.serial.clone();
        run_blocking(Transport::Serial, self.config.serial_enabled, move || scanner.scan()).await
    }

    async fn run_queues(&self) -> TransportReport {
        let scanner = self.queues.clone();
        run_blocking(Transport::System, self.config.system_queues_enabled, move || {
            scanner.scan()
        })
        .await
    }

    async fn run_network(&self, cancel: &CancellationToken) -> TransportReport {
        let started = Instant::now();
        let scan = match NetworkRange::from_config(&self.config.network) {
            Ok(range) => self.network.scan(&range, cancel).await,
            Err(err) => {
                warn!(transport = "network", kind = err.kind().as_str(), error = %err, "invalid sweep range");
                TransportScan::empty(TransportOutcome::from_error(&err))
            }
        };
        into_report(Transport::Network, scan, started)
    }
}

/// Run a blocking scanner on the blocking pool, absorbing panics.
async fn run_blocking<F>(transport: Transport, enabled: bool, scan: F) -> TransportReport
where
    F: FnOnce() -> TransportScan + Send + 'static,
{
    let started = Instant::now();
    if !enabled {
        info!(transport = transport.log_name(), "disabled in configuration");
        return into_report(transport, TransportScan::empty(TransportOutcome::Disabled), started);
    }

    let scan = match tokio::task::spawn_blocking(scan).await {
        Ok(scan) => scan,
        Err(e) => {
            let reason = join_error_reason(e);
            error!(transport = transport.log_name(), kind = "crashed", reason = %reason, "scanner failed");
            TransportScan::empty(TransportOutcome::Crashed { reason })
        }
    };
    into_report(transport, scan, started)
}

/// Same isolation as [`run_blocking`], on the calling thread.
fn catch_scan(transport: Transport, scan: impl FnOnce() -> TransportScan) -> TransportScan {
    let guarded = || std::panic::catch_unwind(AssertUnwindSafe(scan));
    let outcome = match Handle::try_current().map(|h| h.runtime_flavor()) {
        Ok(RuntimeFlavor::MultiThread) => tokio::task::block_in_place(guarded),
        _ => guarded(),
    };
    outcome.unwrap_or_else(|payload| {
        let reason = panic_reason(payload.as_ref());
        error!(transport = transport.log_name(), kind = "crashed", reason = %reason, "scanner failed");
        TransportScan::empty(TransportOutcome::Crashed { reason })
    })
}

fn into_report(transport: Transport, scan: TransportScan, started: Instant) -> TransportReport {
    TransportReport {
        transport,
        outcome: scan.outcome,
        printers: scan.printers,
        elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
    }
}

fn finish(
    scan_id: ScanId,
    started_at: chrono::DateTime<Utc>,
    transports: Vec<TransportReport>,
) -> DiscoveryReport {
    let report = DiscoveryReport {
        scan_id,
        started_at,
        finished_at: Utc::now(),
        transports,
    };
    info!(
        %scan_id,
        found = report.printers().len(),
        elapsed_ms = (report.finished_at - report.started_at).num_milliseconds(),
        "discovery finished"
    );
    report
}

fn join_error_reason(e: JoinError) -> String {
    if e.is_panic() {
        panic_reason(e.into_panic().as_ref())
    } else {
        e.to_string()
    }
}

fn panic_reason(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".into()
    }
}
