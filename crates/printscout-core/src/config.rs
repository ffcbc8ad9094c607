// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Discovery configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScoutError};

/// Settings for the aggregate discovery call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Scan attached USB devices.
    pub usb_enabled: bool,
    /// Scan paired Bluetooth devices.
    pub bluetooth_enabled: bool,
    /// List serial ports as printer candidates.
    pub serial_enabled: bool,
    /// List queues configured in the OS print system.
    pub system_queues_enabled: bool,
    /// Range and timing for the network sweep.
    pub network: NetworkScanConfig,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            usb_enabled: true,
            bluetooth_enabled: true,
            serial_enabled: true,
            system_queues_enabled: true,
            network: NetworkScanConfig::default(),
        }
    }
}

impl DiscoveryConfig {
    /// Load settings from a JSON file. Missing keys take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.network.validate()?;
        Ok(config)
    }

    /// Write settings as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Parameters of an IPv4 /24 sweep for raw-socket printers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkScanConfig {
    /// First three octets, e.g. `192.168.1`.
    pub base_ip: String,
    /// First host octet checked (inclusive).
    pub start: u8,
    /// Last host octet checked (inclusive).
    pub end: u8,
    /// TCP port a printer must accept (9100 = raw/JetDirect).
    pub port: u16,
    /// Timeout of the reachability stage.
    pub reach_timeout_ms: u64,
    /// Timeout of the connect stage.
    pub connect_timeout_ms: u64,
    /// Upper bound on hosts checked at the same time. `1` checks sequentially.
    pub max_concurrent_checks: usize,
    /// Give up on the whole sweep after this long.
    pub sweep_deadline_ms: Option<u64>,
}

impl Default for NetworkScanConfig {
    fn default() -> Self {
        Self {
            base_ip: "192.168.1".into(),
            start: 1,
            end: 254,
            port: 9100,
            reach_timeout_ms: 100,
            connect_timeout_ms: 200,
            max_concurrent_checks: 32,
            sweep_deadline_ms: None,
        }
    }
}

impl NetworkScanConfig {
    pub fn reach_timeout(&self) -> Duration {
        Duration::from_millis(self.reach_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn sweep_deadline(&self) -> Option<Duration> {
        self.sweep_deadline_ms.map(Duration::from_millis)
    }

    /// Effective worker limit; zero is treated as one.
    pub fn concurrency(&self) -> usize {
        self.max_concurrent_checks.max(1)
    }

    /// Reject settings that can never produce a useful sweep.
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(ScoutError::Config("network.port must not be 0".into()));
        }
        if self.reach_timeout_ms == 0 || self.connect_timeout_ms == 0 {
            return Err(ScoutError::Config(
                "network check timeouts must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_sweep() {
        let net = NetworkScanConfig::default();
        assert_eq!(net.base_ip, "192.168.1");
        assert_eq!((net.start, net.end, net.port), (1, 254, 9100));
        assert_eq!(net.reach_timeout(), Duration::from_millis(100));
        assert_eq!(net.connect_timeout(), Duration::from_millis(200));
        assert!(net.sweep_deadline().is_none());
    }

    #[test]
    fn partial_file_takes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{ "bluetooth_enabled": false, "network": { "base_ip": "10.0.0", "port": 9101 } }"#,
        )
        .unwrap();

        let config = DiscoveryConfig::load(&path).unwrap();
        assert!(config.usb_enabled);
        assert!(!config.bluetooth_enabled);
        assert_eq!(config.network.base_ip, "10.0.0");
        assert_eq!(config.network.port, 9101);
        assert_eq!(config.network.end, 254);
        assert!(config.serial_enabled);
        assert!(config.system_queues_enabled);
    }

    #[test]
    fn save_then_load_preserves_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let mut config = DiscoveryConfig::default();
        config.network.sweep_deadline_ms = Some(5_000);
        config.network.max_concurrent_checks = 8;
        config.save(&path).unwrap();

        assert_eq!(DiscoveryConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn zero_timeout_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "network": { "connect_timeout_ms": 0 } }"#).unwrap();
        assert!(matches!(
            DiscoveryConfig::load(&path),
            Err(ScoutError::Config(_))
        ));
    }

    #[test]
    fn zero_concurrency_means_sequential() {
        let net = NetworkScanConfig {
            max_concurrent_checks: 0,
            ..NetworkScanConfig::default()
        };
        assert_eq!(net.concurrency(), 1);
    }
}
