// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// printscout: find thermal receipt printers.
//
// Entry point. Initialises logging (stderr), loads the config, builds the
// platform bridge and prints discovery results as JSON on stdout.

mod config_path;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use printscout_core::config::{DiscoveryConfig, NetworkScanConfig};
use printscout_core::error::Result;
use printscout_core::human_errors::humanize_error;
use printscout_core::types::TransportOutcome;
use printscout_discovery::network::{HostChecker, NetworkRange, TcpChecker};
use printscout_discovery::{Hosts, PrinterDiscovery};

#[derive(Debug, Parser)]
#[command(name = "printscout", version, about = "Find thermal receipt printers over USB, Bluetooth and the local network")]
struct Cli {
    /// Config file (JSON). Defaults to $XDG_CONFIG_HOME/printscout/config.json.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List USB and paired Bluetooth printers.
    List,
    /// Like `list`, with per-transport outcome, timing and hints.
    Report,
    /// Sweep an IPv4 range for hosts accepting the printer port.
    ScanNet(SweepArgs),
    /// Every transport: USB, Bluetooth, the network range, serial ports and
    /// OS print queues.
    All(SweepArgs),
    /// Print the effective configuration.
    Config {
        /// Also write it to the default config path.
        #[arg(long)]
        write: bool,
    },
}

/// Overrides for the configured network sweep.
#[derive(Debug, Args)]
struct SweepArgs {
    /// First three octets, e.g. 192.168.1.
    #[arg(long)]
    base_ip: Option<String>,
    #[arg(long)]
    start: Option<u8>,
    #[arg(long)]
    end: Option<u8>,
    #[arg(long)]
    port: Option<u16>,
    #[arg(long)]
    reach_timeout_ms: Option<u64>,
    #[arg(long)]
    connect_timeout_ms: Option<u64>,
    /// Hosts checked at the same time (1 = sequential).
    #[arg(long)]
    concurrency: Option<usize>,
    /// Stop the sweep after this many milliseconds.
    #[arg(long)]
    deadline_ms: Option<u64>,
    /// Use ICMP echo for reachability (needs CAP_NET_RAW).
    #[cfg(feature = "icmp")]
    #[arg(long)]
    icmp: bool,
}

impl SweepArgs {
    fn apply(&self, network: &mut NetworkScanConfig) {
        if let Some(base_ip) = &self.base_ip {
            network.base_ip = base_ip.clone();
        }
        if let Some(start) = self.start {
            network.start = start;
        }
        if let Some(end) = self.end {
            network.end = end;
        }
        if let Some(port) = self.port {
            network.port = port;
        }
        if let Some(ms) = self.reach_timeout_ms {
            network.reach_timeout_ms = ms;
        }
        if let Some(ms) = self.connect_timeout_ms {
            network.connect_timeout_ms = ms;
        }
        if let Some(n) = self.concurrency {
            network.max_concurrent_checks = n;
        }
        if let Some(ms) = self.deadline_ms {
            network.sweep_deadline_ms = Some(ms);
        }
    }

    fn checker(&self) -> Arc<dyn HostChecker> {
        #[cfg(feature = "icmp")]
        if self.icmp {
            return Arc::new(printscout_discovery::network::IcmpChecker);
        }
        Arc::new(TcpChecker)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let hint = humanize_error(&e);
            tracing::error!(error = %e, "printscout failed");
            eprintln!("{}\n{}", hint.message, hint.suggestion);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = config_path::load_config(cli.config.as_deref())?;

    match cli.command {
        Command::List => {
            let printers = discovery(config, None).discover_all_printers().await;
            println!("{}", output::to_json(printers.as_slice(), cli.pretty)?);
        }
        Command::Report => {
            let report = discovery(config, None).discover_all().await;
            println!("{}", output::to_json(&output::annotate(&report), cli.pretty)?);
        }
        Command::ScanNet(args) => {
            args.apply(&mut config.network);
            config.network.validate()?;
            let range = NetworkRange::from_config(&config.network)?;
            let cancel = cancel_on_ctrl_c();

            let scan = discovery(config, Some(args.checker()))
                .scan_network(&range, &cancel)
                .await;
            if scan.outcome == TransportOutcome::Cancelled {
                tracing::warn!(found = scan.printers.len(), "sweep stopped early, results are partial");
            }
            println!("{}", output::to_json(scan.printers.as_slice(), cli.pretty)?);
        }
        Command::All(args) => {
            args.apply(&mut config.network);
            config.network.validate()?;
            let cancel = cancel_on_ctrl_c();

            let report = discovery(config, Some(args.checker()))
                .discover_everywhere(&cancel)
                .await;
            println!("{}", output::to_json(&output::annotate(&report), cli.pretty)?);
        }
        Command::Config { write } => {
            if write {
                let path = config_path::default_config_path();
                config.save(&path)?;
                tracing::info!(path = %path.display(), "config written");
            }
            println!("{}", output::to_json(&config, cli.pretty)?);
        }
    }
    Ok(())
}

fn discovery(config: DiscoveryConfig, checker: Option<Arc<dyn HostChecker>>) -> PrinterDiscovery {
    let bridge = printscout_bridge::platform_bridge();
    tracing::info!(platform = bridge.platform_name(), "platform bridge ready");
    match checker {
        Some(checker) => PrinterDiscovery::with_hosts(Hosts::from_bridge(bridge), checker, config),
        None => PrinterDiscovery::new(bridge, config),
    }
}

/// Token cancelled on the first Ctrl-C.
fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let on_signal = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, stopping sweep");
            on_signal.cancel();
        }
    });
    token
}
