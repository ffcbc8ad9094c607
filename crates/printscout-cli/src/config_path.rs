// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-aware config file resolution.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use printscout_core::config::DiscoveryConfig;
use printscout_core::error::Result;

const CONFIG_FILE: &str = "config.json";

/// Default location of the config file:
/// `$XDG_CONFIG_HOME/printscout/config.json`, else `~/.config/printscout/config.json`.
pub fn default_config_path() -> PathBuf {
    config_base(
        std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    )
    .join("printscout")
    .join(CONFIG_FILE)
}

fn config_base(xdg: Option<PathBuf>, home: Option<PathBuf>) -> PathBuf {
    // An empty XDG_CONFIG_HOME is treated as unset.
    if let Some(xdg) = xdg.filter(|p| !p.as_os_str().is_empty()) {
        return xdg;
    }
    if let Some(home) = home {
        return home.join(".config");
    }
    // Last resort
    PathBuf::from(".")
}

/// Load the configuration.
///
/// An explicit path must exist and parse. Without one, the default path is
/// used when the file exists; otherwise built-in defaults apply.
pub fn load_config(explicit: Option<&Path>) -> Result<DiscoveryConfig> {
    if let Some(path) = explicit {
        info!(path = %path.display(), "loading config");
        return DiscoveryConfig::load(path);
    }
    load_or_default(&default_config_path())
}

fn load_or_default(path: &Path) -> Result<DiscoveryConfig> {
    if path.exists() {
        info!(path = %path.display(), "loading config");
        DiscoveryConfig::load(path)
    } else {
        debug!(path = %path.display(), "no config file, using defaults");
        Ok(DiscoveryConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xdg_wins_over_home() {
        let base = config_base(Some("/xdg".into()), Some("/home/u".into()));
        assert_eq!(base, PathBuf::from("/xdg"));

        let base = config_base(Some("".into()), Some("/home/u".into()));
        assert_eq!(base, PathBuf::from("/home/u/.config"));

        assert_eq!(config_base(None, None), PathBuf::from("."));
    }

    #[test]
    fn missing_default_file_means_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_or_default(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, DiscoveryConfig::default());
    }

    #[test]
    fn explicit_path_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(Some(&dir.path().join("absent.json"))).is_err());
    }

    #[test]
    fn explicit_file_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, r#"{"bluetooth_enabled": false, "network": {"port": 9101}}"#).unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert!(!config.bluetooth_enabled);
        assert!(config.usb_enabled);
        assert_eq!(config.network.port, 9101);
        assert_eq!(config.network.base_ip, "192.168.1");
    }
}
