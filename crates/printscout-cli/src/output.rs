// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// JSON rendering for stdout.

use serde::Serialize;

use printscout_core::error::Result;
use printscout_core::human_errors::{humanize_outcome, HumanHint};
use printscout_core::types::{DiscoveryReport, Transport};

/// A discovery report plus a plain-English hint for every transport that
/// did not finish cleanly.
#[derive(Debug, Serialize)]
pub struct AnnotatedReport<'a> {
    #[serde(flatten)]
    pub report: &'a DiscoveryReport,
    pub hints: Vec<TransportHint>,
}

#[derive(Debug, Serialize)]
pub struct TransportHint {
    pub transport: Transport,
    #[serde(flatten)]
    pub hint: HumanHint,
}

pub fn annotate(report: &DiscoveryReport) -> AnnotatedReport<'_> {
    let hints = report
        .transports
        .iter()
        .filter_map(|t| {
            humanize_outcome(t.transport, &t.outcome).map(|hint| TransportHint {
                transport: t.transport,
                hint,
            })
        })
        .collect();
    AnnotatedReport { report, hints }
}

pub fn to_json<T: Serialize + ?Sized>(value: &T, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use printscout_core::types::{
        PrinterDescriptor, ScanId, TransportOutcome, TransportReport,
    };

    fn report() -> DiscoveryReport {
        let now = chrono::Utc::now();
        DiscoveryReport {
            scan_id: ScanId::new(),
            started_at: now,
            finished_at: now,
            transports: vec![
                TransportReport {
                    transport: Transport::Usb,
                    outcome: TransportOutcome::Completed { skipped: 0 },
                    printers: vec![PrinterDescriptor::usb(Some("TM-T88V"), None, 1208, 514, true)],
                    elapsed_ms: 4,
                },
                TransportReport {
                    transport: Transport::Bluetooth,
                    outcome: TransportOutcome::PermissionDenied {
                        permission: "android.permission.BLUETOOTH_CONNECT".into(),
                    },
                    printers: Vec::new(),
                    elapsed_ms: 1,
                },
            ],
        }
    }

    #[test]
    fn only_unclean_transports_get_hints() {
        let report = report();
        let annotated = annotate(&report);
        assert_eq!(annotated.hints.len(), 1);
        assert_eq!(annotated.hints[0].transport, Transport::Bluetooth);

        let json: serde_json::Value =
            serde_json::from_str(&to_json(&annotated, false).unwrap()).unwrap();
        assert_eq!(json["transports"][0]["printers"][0]["interfaceType"], "USB");
        assert_eq!(json["hints"][0]["transport"], "Bluetooth");
        assert!(json["hints"][0]["suggestion"].is_string());
    }

    #[test]
    fn printer_list_matches_bridge_shape() {
        let printers = report().printers();
        let json = to_json(printers.as_slice(), false).unwrap();
        assert_eq!(
            json,
            r#"[{"name":"TM-T88V","interfaceType":"USB","identifier":"VID:1208/PID:514","status":"Connected"}]"#
        );
    }
}
