// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// OS print queue scanner (CUPS, Windows spooler).

use std::sync::Arc;

use tracing::{info, warn};

use printscout_bridge::traits::{PrintQueueHost, QueueState};
use printscout_core::error::ScoutError;
use printscout_core::types::{PrinterDescriptor, PrinterStatus, TransportOutcome, TransportScan};

/// Map a print-system queue state to the status shown to the user.
pub fn queue_status(state: QueueState) -> PrinterStatus {
    match state {
        QueueState::Idle => PrinterStatus::Idle,
        QueueState::Printing => PrinterStatus::Printing,
        QueueState::Paused => PrinterStatus::Paused,
        QueueState::Offline => PrinterStatus::Offline,
        QueueState::Error => PrinterStatus::Error,
        QueueState::Unknown => PrinterStatus::Unknown,
    }
}

/// Scanner for printers already configured in the OS print system.
#[derive(Clone)]
pub struct SystemQueueScanner {
    host: Arc<dyn PrintQueueHost>,
}

impl SystemQueueScanner {
    pub fn new(host: Arc<dyn PrintQueueHost>) -> Self {
        Self { host }
    }

    pub fn scan(&self) -> TransportScan {
        let queues = match self.host.printer_queues() {
            Ok(queues) => queues,
            Err(err) => {
                if matches!(err, ScoutError::TransportUnavailable { .. }) {
                    info!(transport = "system", kind = err.kind().as_str(), error = %err, "no print system");
                } else {
                    warn!(transport = "system", kind = err.kind().as_str(), error = %err, "print queue list failed");
                }
                return TransportScan::empty(TransportOutcome::from_error(&err));
            }
        };

        let printers: Vec<_> = queues
            .iter()
            .map(|q| PrinterDescriptor::system_queue(&q.name, &q.device_uri, queue_status(q.state)))
            .collect();

        info!(transport = "system", found = printers.len(), "print queue scan finished");
        TransportScan::completed(printers, 0)
    }

    /// Configured queues only, with every failure absorbed.
    pub fn list_system_printers(&self) -> Vec<PrinterDescriptor> {
        self.scan().printers
    }
}
