// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Printer queues configured in the OS print system.
//
// Unix (Linux, macOS, BSD) asks CUPS through `lpstat -t`; Windows asks the
// spooler through PowerShell `Get-Printer`. Both are read-only: nothing is
// added, paused or printed.

use std::process::Command;

use printscout_core::error::{Result, ScoutError};

use crate::traits::{PrintQueueHost, PrinterQueue, QueueState};

/// [`PrintQueueHost`] that shells out to the platform's print tooling.
pub struct SystemQueueHost;

impl PrintQueueHost for SystemQueueHost {
    #[cfg(unix)]
    fn printer_queues(&self) -> Result<Vec<PrinterQueue>> {
        let mut command = Command::new("lpstat");
        command.arg("-t").env("LC_ALL", "C");
        let output = run(command, "lpstat")?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let queues = parse_lpstat(&stdout);

        if !output.status.success() && queues.is_empty() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if stdout.contains("scheduler is not running") || stderr.contains("scheduler is not running") {
                return Err(unavailable("CUPS scheduler is not running"));
            }
            // `lpstat -t` exits non-zero when no destinations are defined.
            if stderr.contains("No destinations added") {
                return Ok(Vec::new());
            }
            return Err(ScoutError::TransportEnumeration {
                transport: "system",
                reason: format!("lpstat: {}", stderr.trim()),
            });
        }
        tracing::debug!(count = queues.len(), "CUPS queues listed");
        Ok(queues)
    }

    #[cfg(windows)]
    fn printer_queues(&self) -> Result<Vec<PrinterQueue>> {
        let mut command = Command::new("powershell");
        command.args(["-NoProfile", "-NonInteractive", "-Command", GET_PRINTER_SCRIPT]);
        let output = run(command, "powershell")?;
        if !output.status.success() {
            return Err(ScoutError::TransportEnumeration {
                transport: "system",
                reason: format!(
                    "Get-Printer: {}",
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }
        let queues = parse_get_printer(&String::from_utf8_lossy(&output.stdout))?;
        tracing::debug!(count = queues.len(), "Windows print queues listed");
        Ok(queues)
    }

    #[cfg(not(any(unix, windows)))]
    fn printer_queues(&self) -> Result<Vec<PrinterQueue>> {
        Err(unavailable("no supported print system"))
    }
}

fn unavailable(reason: &str) -> ScoutError {
    ScoutError::TransportUnavailable {
        transport: "system",
        reason: reason.into(),
    }
}

#[cfg(any(unix, windows))]
fn run(mut command: Command, tool: &str) -> Result<std::process::Output> {
    command.output().map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => unavailable(&format!("{tool} not installed")),
        _ => ScoutError::TransportEnumeration {
            transport: "system",
            reason: format!("{tool}: {e}"),
        },
    })
}

// ---------------------------------------------------------------------------
// CUPS
// ---------------------------------------------------------------------------

/// Parse `lpstat -t` output (C locale).
///
/// Queues come from `printer NAME ...` lines in the order listed; each needs a
/// matching `device for NAME: URI` line, otherwise it has no backend and is
/// left out.
#[cfg(any(unix, test))]
pub(crate) fn parse_lpstat(output: &str) -> Vec<PrinterQueue> {
    use std::collections::HashMap;

    let mut devices = HashMap::new();
    let mut states = Vec::new();

    for line in output.lines().map(str::trim) {
        if let Some(rest) = line.strip_prefix("device for ") {
            if let Some((name, uri)) = rest.split_once(": ") {
                devices.insert(name.to_owned(), uri.trim().to_owned());
            }
        } else if let Some(rest) = line.strip_prefix("printer ") {
            let Some((name, status)) = rest.split_once(' ') else {
                continue;
            };
            let state = if status.starts_with("is idle") {
                QueueState::Idle
            } else if status.starts_with("now printing") {
                QueueState::Printing
            } else if status.starts_with("disabled") {
                QueueState::Paused
            } else {
                QueueState::Unknown
            };
            states.push((name.to_owned(), state));
        }
    }

    states
        .into_iter()
        .filter_map(|(name, state)| {
            let Some(device_uri) = devices.remove(&name) else {
                tracing::debug!(queue = %name, "CUPS queue without a device line skipped");
                return None;
            };
            Some(PrinterQueue {
                name,
                device_uri,
                state,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Windows spooler
// ---------------------------------------------------------------------------

#[cfg(windows)]
const GET_PRINTER_SCRIPT: &str = "Get-Printer | Select-Object Name, PortName, PrinterStatus, \
     @{Name='HostAddress';Expression={(Get-PrinterPort -Name $_.PortName -ErrorAction SilentlyContinue).PrinterHostAddress}} \
     | ConvertTo-Json -Compress";

#[cfg(any(windows, test))]
#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WinPrinter {
    name: String,
    #[serde(default)]
    port_name: Option<String>,
    #[serde(default)]
    printer_status: serde_json::Value,
    #[serde(default)]
    host_address: Option<String>,
}

/// `ConvertTo-Json` emits a bare object when there is exactly one printer.
#[cfg(any(windows, test))]
#[derive(Debug, serde::Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Many(Vec<WinPrinter>),
    One(WinPrinter),
}

#[cfg(any(windows, test))]
pub(crate) fn parse_get_printer(output: &str) -> Result<Vec<PrinterQueue>> {
    let output = output.trim();
    if output.is_empty() {
        return Ok(Vec::new());
    }
    let printers = match serde_json::from_str::<OneOrMany>(output)? {
        OneOrMany::Many(printers) => printers,
        OneOrMany::One(printer) => vec![printer],
    };
    Ok(printers
        .into_iter()
        .map(|p| {
            let device_uri = match (&p.host_address, &p.port_name) {
                (Some(host), _) if !host.is_empty() => format!("socket://{host}"),
                (_, Some(port)) => port.clone(),
                _ => String::new(),
            };
            PrinterQueue {
                state: windows_state(&p.printer_status),
                name: p.name,
                device_uri,
            }
        })
        .collect())
}

/// `PrinterStatus` arrives as a number (Windows PowerShell) or as the enum
/// name (PowerShell 7 with string enums).
#[cfg(any(windows, test))]
fn windows_state(status: &serde_json::Value) -> QueueState {
    match status {
        serde_json::Value::Number(n) => match n.as_u64() {
            Some(0) => QueueState::Idle,
            Some(1) => QueueState::Paused,
            Some(2 | 4 | 5 | 7) => QueueState::Error,
            Some(8) => QueueState::Offline,
            Some(9..=11) => QueueState::Printing,
            _ => QueueState::Unknown,
        },
        serde_json::Value::String(s) => match s.as_str() {
            "Normal" | "Idle" => QueueState::Idle,
            "Paused" => QueueState::Paused,
            "Error" | "PaperJam" | "PaperOut" | "PaperProblem" => QueueState::Error,
            "Offline" => QueueState::Offline,
            "Printing" | "Busy" | "IOActive" => QueueState::Printing,
            _ => QueueState::Unknown,
        },
        _ => QueueState::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LPSTAT: &str = "\
scheduler is running
system default destination: TM-T20
device for TM-T20: usb://EPSON/TM-T20II?serial=583248230000
device for Kitchen: socket://192.168.1.50:9100
device for Office: ipp://office.local/ipp/print
TM-T20 accepting requests since Mon 19 Oct 2026 09:12:01
Kitchen accepting requests since Mon 19 Oct 2026 09:12:01
Office accepting requests since Mon 19 Oct 2026 09:12:01
printer TM-T20 is idle.  enabled since Mon 19 Oct 2026 09:12:01
printer Kitchen now printing Kitchen-42.  enabled since Mon 19 Oct 2026 09:12:01
printer Office disabled since Mon 19 Oct 2026 09:12:01 -
\treason unknown
";

    #[test]
    fn lpstat_queues_keep_full_device_uri() {
        let queues = parse_lpstat(LPSTAT);
        assert_eq!(queues.len(), 3);
        assert_eq!(queues[0].name, "TM-T20");
        assert_eq!(queues[0].device_uri, "usb://EPSON/TM-T20II?serial=583248230000");
        assert_eq!(queues[1].device_uri, "socket://192.168.1.50:9100");
    }

    #[test]
    fn lpstat_states() {
        let states: Vec<_> = parse_lpstat(LPSTAT).into_iter().map(|q| q.state).collect();
        assert_eq!(
            states,
            [QueueState::Idle, QueueState::Printing, QueueState::Paused]
        );
    }

    #[test]
    fn lpstat_queue_without_device_is_skipped() {
        let queues = parse_lpstat("printer Ghost is idle.  enabled since today\n");
        assert!(queues.is_empty());
    }

    #[test]
    fn lpstat_empty_output() {
        assert!(parse_lpstat("scheduler is running\nno system default destination\n").is_empty());
    }

    #[test]
    fn get_printer_array() {
        let json = r#"[
            {"Name":"EPSON TM-T20II Receipt","PortName":"USB001","PrinterStatus":0,"HostAddress":null},
            {"Name":"Kitchen","PortName":"IP_192.168.1.50","PrinterStatus":8,"HostAddress":"192.168.1.50"}
        ]"#;
        let queues = parse_get_printer(json).unwrap();
        assert_eq!(queues.len(), 2);
        assert_eq!(queues[0].device_uri, "USB001");
        assert_eq!(queues[0].state, QueueState::Idle);
        assert_eq!(queues[1].device_uri, "socket://192.168.1.50");
        assert_eq!(queues[1].state, QueueState::Offline);
    }

    #[test]
    fn get_printer_single_object() {
        let json = r#"{"Name":"POS-80","PortName":"COM3","PrinterStatus":"Printing"}"#;
        let queues = parse_get_printer(json).unwrap();
        assert_eq!(queues.len(), 1);
        assert_eq!(queues[0].device_uri, "COM3");
        assert_eq!(queues[0].state, QueueState::Printing);
    }

    #[test]
    fn get_printer_no_printers() {
        assert!(parse_get_printer("  \r\n").unwrap().is_empty());
    }

    #[test]
    fn get_printer_garbage_is_an_error() {
        assert!(parse_get_printer("Get-Printer : The term is not recognized").is_err());
    }

    #[test]
    fn windows_status_codes() {
        assert_eq!(windows_state(&serde_json::json!(1)), QueueState::Paused);
        assert_eq!(windows_state(&serde_json::json!(5)), QueueState::Error);
        assert_eq!(windows_state(&serde_json::json!(11)), QueueState::Printing);
        assert_eq!(windows_state(&serde_json::json!(6)), QueueState::Unknown);
        assert_eq!(windows_state(&serde_json::Value::Null), QueueState::Unknown);
    }
}
