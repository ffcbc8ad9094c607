// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable explanations for empty or partial discovery results.
//
// The plain printer list cannot tell "no printers" apart from "Bluetooth is
// off"; the per-transport outcome can, and these hints turn it into something
// a till operator can act on.

use serde::Serialize;

use crate::error::ScoutError;
use crate::types::{Transport, TransportOutcome};

/// Severity of a hint from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Informational, nothing to fix.
    Info,
    /// User must do something (turn on Bluetooth, grant access).
    ActionRequired,
    /// Platform or hardware limitation; retrying will not help.
    Permanent,
    /// Something failed that may work on the next attempt.
    Transient,
}

/// A plain-English explanation with a suggestion.
#[derive(Debug, Clone, Serialize)]
pub struct HumanHint {
    pub message: String,
    pub suggestion: String,
    pub severity: Severity,
}

/// Explain a transport outcome. Returns `None` when the scan finished cleanly.
pub fn humanize_outcome(transport: Transport, outcome: &TransportOutcome) -> Option<HumanHint> {
    let hint = match (transport, outcome) {
        (_, TransportOutcome::Completed { skipped: 0 }) => return None,
        (_, TransportOutcome::Completed { skipped }) => HumanHint {
            message: format!("{skipped} {transport} device(s) could not be read."),
            suggestion: "Unplug and reconnect the printer, then search again.".into(),
            severity: Severity::Transient,
        },
        (Transport::Bluetooth, TransportOutcome::Unavailable { reason }) => HumanHint {
            message: "Bluetooth is off or not available.".into(),
            suggestion: format!(
                "Turn Bluetooth on and pair the printer in system settings first. ({reason})"
            ),
            severity: Severity::ActionRequired,
        },
        (Transport::System, TransportOutcome::Unavailable { reason }) => HumanHint {
            message: "No print system was found on this computer.".into(),
            suggestion: format!(
                "Install or start CUPS to see configured printer queues. ({reason})"
            ),
            severity: Severity::Permanent,
        },
        (_, TransportOutcome::Unavailable { reason }) => HumanHint {
            message: format!("{transport} printers can't be searched on this device."),
            suggestion: format!("Try another connection type. ({reason})"),
            severity: Severity::Permanent,
        },
        (_, TransportOutcome::PermissionDenied { permission }) => HumanHint {
            message: format!("This app isn't allowed to look for {transport} printers."),
            suggestion: format!("Grant the {permission} permission, then search again."),
            severity: Severity::ActionRequired,
        },
        (_, TransportOutcome::EnumerationFailed { reason }) => HumanHint {
            message: format!("The list of {transport} devices couldn't be read."),
            suggestion: format!("Try again in a moment. ({reason})"),
            severity: Severity::Transient,
        },
        (_, TransportOutcome::Cancelled) => HumanHint {
            message: format!("The {transport} search was stopped early."),
            suggestion: "Run the search again and let it finish.".into(),
            severity: Severity::Info,
        },
        (_, TransportOutcome::Disabled) => HumanHint {
            message: format!("{transport} search is turned off."),
            suggestion: "Enable it in the configuration file.".into(),
            severity: Severity::Info,
        },
        (_, TransportOutcome::Crashed { reason }) => HumanHint {
            message: format!("The {transport} search failed unexpectedly."),
            suggestion: format!("Try again. If it keeps happening, report it. ({reason})"),
            severity: Severity::Transient,
        },
    };
    Some(hint)
}

/// Explain a single error, e.g. a configuration problem surfaced by the CLI.
pub fn humanize_error(err: &ScoutError) -> HumanHint {
    match err {
        ScoutError::PermissionDenied(permission) => HumanHint {
            message: "A required permission is missing.".into(),
            suggestion: format!("Grant {permission}, then try again."),
            severity: Severity::ActionRequired,
        },
        ScoutError::TransportUnavailable { transport, reason } => HumanHint {
            message: format!("{transport} is not available."),
            suggestion: format!("Check that it is switched on. ({reason})"),
            severity: Severity::ActionRequired,
        },
        ScoutError::InvalidRange(detail) => HumanHint {
            message: "That network address range doesn't look right.".into(),
            suggestion: format!(
                "Use the first three numbers of your network, like 192.168.1. ({detail})"
            ),
            severity: Severity::ActionRequired,
        },
        ScoutError::Config(detail) => HumanHint {
            message: "The configuration file has a problem.".into(),
            suggestion: format!("Fix or delete the file to use defaults. ({detail})"),
            severity: Severity::ActionRequired,
        },
        ScoutError::PlatformUnavailable | ScoutError::Bridge(_) => HumanHint {
            message: "This feature isn't supported on this device.".into(),
            suggestion: err.to_string(),
            severity: Severity::Permanent,
        },
        other => HumanHint {
            message: "Something went wrong while searching for printers.".into(),
            suggestion: format!("Try again. ({other})"),
            severity: Severity::Transient,
        },
    }
}
