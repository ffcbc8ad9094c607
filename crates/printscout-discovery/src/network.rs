// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Raw-socket printer sweep over an IPv4 range.
//
// Every host `base.start ..= base.end` goes through two stages: a short
// reachability check, then a TCP connect to the printer port (9100 by
// default). Only hosts passing both become descriptors. The TCP connection
// is dropped as soon as it is established; nothing is ever sent.
//
// Checks run concurrently under a semaphore. The sweep stops early on
// cancellation or when the configured deadline passes, aborting outstanding
// check tasks (their sockets close on drop) and keeping what was confirmed.

#[cfg(feature = "icmp")]
use std::net::IpAddr;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use printscout_core::config::NetworkScanConfig;
use printscout_core::error::{Result, ScoutError};
use printscout_core::types::{PrinterDescriptor, TransportOutcome, TransportScan};

/// Default raw TCP port (HP JetDirect).
pub const RAW_PORT: u16 = 9100;

/// Echo port used by the TCP reachability check.
const ECHO_PORT: u16 = 7;

// ---------------------------------------------------------------------------
// Address range
// ---------------------------------------------------------------------------

/// A validated `a.b.c.start ..= a.b.c.end` range plus the port to test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkRange {
    prefix: [u8; 3],
    start: u8,
    end: u8,
    port: u16,
}

impl NetworkRange {
    /// Parse a three-octet prefix such as `192.168.1`.
    pub fn parse(base_ip: &str, start: u8, end: u8, port: u16) -> Result<Self> {
        let parts: Vec<&str> = base_ip.trim().split('.').collect();
        if parts.len() != 3 {
            return Err(ScoutError::InvalidRange(format!(
                "base address `{base_ip}` must have exactly three octets"
            )));
        }

        let mut prefix = [0u8; 3];
        for (slot, part) in prefix.iter_mut().zip(&parts) {
            *slot = part.parse().map_err(|_| {
                ScoutError::InvalidRange(format!("`{part}` in `{base_ip}` is not an octet"))
            })?;
        }

        if start > end {
            return Err(ScoutError::InvalidRange(format!(
                "start {start} is after end {end}"
            )));
        }
        if port == 0 {
            return Err(ScoutError::InvalidRange("port 0 cannot be checked".into()));
        }

        Ok(Self {
            prefix,
            start,
            end,
            port,
        })
    }

    /// The range described by a sweep configuration.
    pub fn from_config(config: &NetworkScanConfig) -> Result<Self> {
        Self::parse(&config.base_ip, config.start, config.end, config.port)
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Number of hosts in the range.
    pub fn len(&self) -> usize {
        usize::from(self.end - self.start) + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Host addresses in ascending order.
    pub fn hosts(&self) -> impl Iterator<Item = Ipv4Addr> + use<> {
        let [a, b, c] = self.prefix;
        (self.start..=self.end).map(move |d| Ipv4Addr::new(a, b, c, d))
    }
}

impl std::fmt::Display for NetworkRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let [a, b, c] = self.prefix;
        write!(f, "{a}.{b}.{c}.{}-{} port {}", self.start, self.end, self.port)
    }
}

// ---------------------------------------------------------------------------
// Checkers
// ---------------------------------------------------------------------------

/// The two check stages, abstracted so sweeps can run against fakes.
#[async_trait]
pub trait HostChecker: Send + Sync {
    /// Stage 1: does anything answer at `ip` within `timeout`?
    async fn check_reachable(&self, ip: Ipv4Addr, timeout: Duration) -> Result<()>;

    /// Stage 2: does `addr` accept a TCP connection within `timeout`?
    async fn check_port(&self, addr: SocketAddrV4, timeout: Duration) -> Result<()>;
}

/// Open a TCP connection and drop it straight away.
async fn tcp_connect(addr: SocketAddrV4, timeout: Duration) -> std::io::Result<()> {
    match tokio::time::timeout(timeout, TcpStream::connect(SocketAddr::V4(addr))).await {
        Ok(Ok(_stream)) => Ok(()),
        Ok(Err(e)) => Err(e),
        Err(_) => Err(std::io::ErrorKind::TimedOut.into()),
    }
}

/// Unprivileged checker using TCP only.
///
/// Reachability is a connect to the echo port: an accepted or actively
/// refused connection both prove the host is up. Silence means unreachable.
#[derive(Debug, Default, Clone, Copy)]
pub struct TcpChecker;

#[async_trait]
impl HostChecker for TcpChecker {
    async fn check_reachable(&self, ip: Ipv4Addr, timeout: Duration) -> Result<()> {
        match tcp_connect(SocketAddrV4::new(ip, ECHO_PORT), timeout).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::ConnectionRefused => Ok(()),
            Err(e) => Err(ScoutError::AddressUnreachable(format!("{ip}: {e}"))),
        }
    }

    async fn check_port(&self, addr: SocketAddrV4, timeout: Duration) -> Result<()> {
        tcp_connect(addr, timeout)
            .await
            .map_err(|e| ScoutError::PortClosed(format!("{addr}: {e}")))
    }
}

/// ICMP echo for stage 1, TCP for stage 2. Needs raw-socket privileges
/// (root or `CAP_NET_RAW`).
#[cfg(feature = "icmp")]
#[derive(Debug, Default, Clone, Copy)]
pub struct IcmpChecker;

#[cfg(feature = "icmp")]
#[async_trait]
impl HostChecker for IcmpChecker {
    async fn check_reachable(&self, ip: Ipv4Addr, timeout: Duration) -> Result<()> {
        let payload = [0u8; 56];
        match tokio::time::timeout(timeout, surge_ping::ping(IpAddr::V4(ip), &payload)).await {
            Ok(Ok((_packet, _rtt))) => Ok(()),
            Ok(Err(e)) => Err(ScoutError::AddressUnreachable(format!("{ip}: {e}"))),
            Err(_) => Err(ScoutError::AddressUnreachable(format!("{ip}: no echo reply"))),
        }
    }

    async fn check_port(&self, addr: SocketAddrV4, timeout: Duration) -> Result<()> {
        TcpChecker.check_port(addr, timeout).await
    }
}

// ---------------------------------------------------------------------------
// Scanner
// ---------------------------------------------------------------------------

/// Sweeps an address range for hosts accepting connections on a port.
#[derive(Clone)]
pub struct NetworkScanner {
    config: NetworkScanConfig,
    checker: Arc<dyn HostChecker>,
}

impl NetworkScanner {
    pub fn new(config: NetworkScanConfig, checker: Arc<dyn HostChecker>) -> Self {
        Self { config, checker }
    }

    /// Scanner with the unprivileged TCP checker.
    pub fn with_tcp(config: NetworkScanConfig) -> Self {
        Self::new(config, Arc::new(TcpChecker))
    }

    pub fn config(&self) -> &NetworkScanConfig {
        &self.config
    }

    /// Sweep `base_ip.start ..= base_ip.end` on `port`.
    ///
    /// Never fails: an invalid range is logged and yields no printers, as
    /// does a range where nothing answers.
    pub async fn scan_network_range(
        &self,
        base_ip: &str,
        start: u8,
        end: u8,
        port: u16,
    ) -> Vec<PrinterDescriptor> {
        match NetworkRange::parse(base_ip, start, end, port) {
            Ok(range) => self.scan(&range, &CancellationToken::new()).await.printers,
            Err(err) => {
                warn!(transport = "network", kind = err.kind().as_str(), error = %err, "invalid sweep range");
                Vec::new()
            }
        }
    }

    /// Sweep `range`, stopping early if `cancel` fires or the configured
    /// deadline passes. Printers are returned in ascending address order.
    pub async fn scan(&self, range: &NetworkRange, cancel: &CancellationToken) -> TransportScan {
        let reach_timeout = self.config.reach_timeout();
        let connect_timeout = self.config.connect_timeout();
        let permits = Arc::new(Semaphore::new(self.config.concurrency()));
        let port = range.port();

        info!(
            transport = "network",
            range = %range,
            hosts = range.len(),
            concurrency = self.config.concurrency(),
            "network sweep started"
        );

        let mut tasks = JoinSet::new();
        for ip in range.hosts() {
            let checker = Arc::clone(&self.checker);
            let permits = Arc::clone(&permits);
            tasks.spawn(async move {
                let _permit = permits.acquire_owned().await.ok()?;
                if let Err(err) = checker.check_reachable(ip, reach_timeout).await {
                    trace!(transport = "network", kind = err.kind().as_str(), %ip, "skipped");
                    return None;
                }
                let addr = SocketAddrV4::new(ip, port);
                match checker.check_port(addr, connect_timeout).await {
                    Ok(()) => {
                        debug!(transport = "network", %addr, "printer port open");
                        Some((ip.octets()[3], PrinterDescriptor::network(ip, port)))
                    }
                    Err(err) => {
                        trace!(transport = "network", kind = err.kind().as_str(), %addr, "skipped");
                        None
                    }
                }
            });
        }

        let deadline = self.config.sweep_deadline().map(|d| Instant::now() + d);
        let expired = async move {
            match deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(expired);

        let mut found = Vec::new();
        let mut interrupted = None;
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    interrupted = Some("cancelled");
                    break;
                }
                _ = &mut expired => {
                    interrupted = Some("deadline reached");
                    break;
                }
                joined = tasks.join_next() => match joined {
                    None => break,
                    Some(Ok(Some(hit))) => found.push(hit),
                    Some(Ok(None)) => {}
                    Some(Err(e)) => {
                        warn!(transport = "network", error = %e, "check task failed");
                    }
                },
            }
        }

        if let Some(reason) = interrupted {
            let outstanding = tasks.len();
            tasks.shutdown().await;
            info!(
                transport = "network",
                reason,
                aborted = outstanding,
                found = found.len(),
                "network sweep stopped early"
            );
        } else {
            info!(transport = "network", found = found.len(), "network sweep finished");
        }

        found.sort_by_key(|(octet, _)| *octet);
        let printers = found.into_iter().map(|(_, printer)| printer).collect();
        match interrupted {
            Some(_) => TransportScan {
                printers,
                outcome: TransportOutcome::Cancelled,
            },
            None => TransportScan::completed(printers, 0),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use printscout_core::types::{PrinterStatus, Transport};
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::net::TcpListener;

    /// Fake network: `up` hosts answer stage 1, `open` hosts also accept the
    /// port. `stall` hosts hang for a minute in stage 1.
    #[derive(Default)]
    pub(crate) struct FakeNetwork {
        pub up: HashSet<u8>,
        pub open: HashSet<u8>,
        pub stall: HashSet<u8>,
        pub delay: Duration,
        pub in_flight: AtomicUsize,
        pub peak: AtomicUsize,
    }

    impl FakeNetwork {
        pub(crate) fn with(up: &[u8], open: &[u8]) -> Self {
            Self {
                up: up.iter().copied().collect(),
                open: open.iter().copied().collect(),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl HostChecker for FakeNetwork {
        async fn check_reachable(&self, ip: Ipv4Addr, _timeout: Duration) -> Result<()> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            let octet = ip.octets()[3];
            if self.stall.contains(&octet) {
                tokio::time::sleep(Duration::from_secs(60)).await;
            } else if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            if self.up.contains(&octet) {
                Ok(())
            } else {
                Err(ScoutError::AddressUnreachable(ip.to_string()))
            }
        }

        async fn check_port(&self, addr: SocketAddrV4, _timeout: Duration) -> Result<()> {
            if self.open.contains(&addr.ip().octets()[3]) {
                Ok(())
            } else {
                Err(ScoutError::PortClosed(addr.to_string()))
            }
        }
    }

    fn scanner(config: NetworkScanConfig, net: Arc<FakeNetwork>) -> NetworkScanner {
        NetworkScanner::new(config, net)
    }

    #[test]
    fn range_parsing() {
        let range = NetworkRange::parse("192.168.1", 1, 254, RAW_PORT).unwrap();
        assert_eq!(range.len(), 254);
        let hosts: Vec<_> = range.hosts().collect();
        assert_eq!(hosts.first(), Some(&Ipv4Addr::new(192, 168, 1, 1)));
        assert_eq!(hosts.last(), Some(&Ipv4Addr::new(192, 168, 1, 254)));

        assert_eq!(NetworkRange::parse("10.0.0", 7, 7, 9100).unwrap().len(), 1);

        for bad in ["192.168", "192.168.1.0", "192.168.x", "300.1.1", ""] {
            let err = NetworkRange::parse(bad, 1, 254, 9100).unwrap_err();
            assert!(matches!(err, ScoutError::InvalidRange(_)), "{bad}");
        }
        assert!(NetworkRange::parse("192.168.1", 20, 10, 9100).is_err());
        assert!(NetworkRange::parse("192.168.1", 1, 10, 0).is_err());
    }

    #[tokio::test]
    async fn finds_the_one_open_printer() {
        let net = Arc::new(FakeNetwork::with(&[1, 50, 77], &[50]));
        let printers = scanner(NetworkScanConfig::default(), net)
            .scan_network_range("192.168.1", 1, 254, 9100)
            .await;

        assert_eq!(printers.len(), 1);
        assert_eq!(printers[0].identifier, "192.168.1.50:9100");
        assert_eq!(printers[0].name, "Network Printer");
        assert_eq!(printers[0].status, PrinterStatus::Available);
        assert_eq!(printers[0].transport, Transport::Network);
    }

    #[tokio::test]
    async fn port_open_but_host_unreachable_is_skipped() {
        // Stage 2 is never attempted when stage 1 fails.
        let net = Arc::new(FakeNetwork::with(&[], &[50]));
        let printers = scanner(NetworkScanConfig::default(), net)
            .scan_network_range("192.168.1", 1, 254, 9100)
            .await;
        assert!(printers.is_empty());
    }

    #[tokio::test]
    async fn silent_network_is_empty_not_an_error() {
        let net = Arc::new(FakeNetwork::default());
        let range = NetworkRange::parse("10.1.2", 1, 254, 9100).unwrap();
        let scan = scanner(NetworkScanConfig::default(), net)
            .scan(&range, &CancellationToken::new())
            .await;
        assert_eq!(scan, TransportScan::completed(Vec::new(), 0));
    }

    #[tokio::test]
    async fn invalid_range_yields_empty() {
        let net = Arc::new(FakeNetwork::with(&[1], &[1]));
        let printers = scanner(NetworkScanConfig::default(), net)
            .scan_network_range("not-an-ip", 1, 254, 9100)
            .await;
        assert!(printers.is_empty());
    }

    #[tokio::test]
    async fn results_are_in_address_order() {
        let all: Vec<u8> = (1..=40).collect();
        let mut net = FakeNetwork::with(&all, &[40, 3, 17]);
        net.delay = Duration::from_millis(2);
        let printers = scanner(NetworkScanConfig::default(), Arc::new(net))
            .scan_network_range("192.168.1", 1, 40, 9100)
            .await;
        let ids: Vec<_> = printers.iter().map(|p| p.identifier.as_str()).collect();
        assert_eq!(ids, ["192.168.1.3:9100", "192.168.1.17:9100", "192.168.1.40:9100"]);
    }

    #[tokio::test]
    async fn concurrency_stays_within_bound() {
        let mut net = FakeNetwork::with(&[], &[]);
        net.delay = Duration::from_millis(5);
        let net = Arc::new(net);
        let config = NetworkScanConfig {
            max_concurrent_checks: 4,
            ..Default::default()
        };

        scanner(config, net.clone())
            .scan_network_range("192.168.1", 1, 64, 9100)
            .await;
        let peak = net.peak.load(Ordering::SeqCst);
        assert!((1..=4).contains(&peak), "peak was {peak}");
    }

    #[tokio::test]
    async fn sequential_when_bound_is_one() {
        let mut net = FakeNetwork::with(&[5], &[5]);
        net.delay = Duration::from_millis(1);
        let net = Arc::new(net);
        let config = NetworkScanConfig {
            max_concurrent_checks: 1,
            ..Default::default()
        };

        let printers = scanner(config, net.clone())
            .scan_network_range("192.168.1", 1, 10, 9100)
            .await;
        assert_eq!(printers.len(), 1);
        assert_eq!(net.peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cancellation_keeps_confirmed_printers() {
        let mut net = FakeNetwork::with(&[50], &[50]);
        net.stall = (1..=254).filter(|o| *o != 50).collect();
        let config = NetworkScanConfig {
            max_concurrent_checks: 254,
            ..Default::default()
        };
        let range = NetworkRange::parse("192.168.1", 1, 254, 9100).unwrap();
        let token = CancellationToken::new();

        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            canceller.cancel();
        });

        let scan = tokio::time::timeout(
            Duration::from_secs(5),
            scanner(config, Arc::new(net)).scan(&range, &token),
        )
        .await
        .expect("sweep should stop promptly after cancel");

        assert_eq!(scan.outcome, TransportOutcome::Cancelled);
        assert_eq!(scan.printers.len(), 1);
        assert_eq!(scan.printers[0].identifier, "192.168.1.50:9100");
    }

    #[tokio::test]
    async fn deadline_stops_the_sweep() {
        let mut net = FakeNetwork::with(&[], &[]);
        net.stall = (1..=10).collect();
        let config = NetworkScanConfig {
            sweep_deadline_ms: Some(50),
            ..Default::default()
        };
        let range = NetworkRange::parse("192.168.1", 1, 10, 9100).unwrap();

        let scan = tokio::time::timeout(
            Duration::from_secs(5),
            scanner(config, Arc::new(net)).scan(&range, &CancellationToken::new()),
        )
        .await
        .expect("deadline should end the sweep");
        assert_eq!(scan.outcome, TransportOutcome::Cancelled);
        assert!(scan.printers.is_empty());
    }

    #[tokio::test]
    async fn loopback_listener_is_found() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let printers = NetworkScanner::with_tcp(NetworkScanConfig::default())
            .scan_network_range("127.0.0", 1, 1, port)
            .await;
        assert_eq!(printers.len(), 1);
        assert_eq!(printers[0].identifier, format!("127.0.0.1:{port}"));
    }

    #[tokio::test]
    async fn closed_loopback_port_is_not_a_printer() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };

        let printers = NetworkScanner::with_tcp(NetworkScanConfig::default())
            .scan_network_range("127.0.0", 1, 1, port)
            .await;
        assert!(printers.is_empty());
    }
}
