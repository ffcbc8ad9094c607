// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Paired-device listing through BlueZ (`bluer`, D-Bus).
//
// `bluer` is async while `BluetoothHost` is blocking, so each call drives its
// future on the runtime handle captured at construction (see
// `crate::blocking::block_on` for where that is allowed). One D-Bus session
// is opened lazily and reused for the life of the host. No discovery session
// is ever started.

use bluer::{Adapter, Address, Session};
use tokio::runtime::Handle;
use tokio::sync::OnceCell;

use printscout_core::error::{Result, ScoutError};

use crate::blocking::block_on;
use crate::traits::{
    bluetooth_device_class, AdapterState, BluetoothHost, BondState, BondedDevice,
    PermissionState,
};

/// BlueZ-backed [`BluetoothHost`] for the default adapter.
pub struct BluezHost {
    runtime: Handle,
    session: OnceCell<Session>,
}

impl BluezHost {
    /// Capture the current tokio runtime. Returns `None` outside a runtime.
    pub fn from_current_runtime() -> Option<Self> {
        Handle::try_current().ok().map(|runtime| Self {
            runtime,
            session: OnceCell::new(),
        })
    }

    async fn default_adapter(&self) -> std::result::Result<Option<Adapter>, bluer::Error> {
        let session = self.session.get_or_try_init(Session::new).await?;
        if session.adapter_names().await?.is_empty() {
            return Ok(None);
        }
        session.default_adapter().await.map(Some)
    }

    async fn require_adapter(&self) -> Result<Adapter> {
        match self.default_adapter().await {
            Ok(Some(adapter)) => Ok(adapter),
            Ok(None) => Err(ScoutError::TransportUnavailable {
                transport: "bluetooth",
                reason: "no adapter".into(),
            }),
            Err(e) => Err(bluez_enum_err(e)),
        }
    }
}

fn bluez_enum_err(e: bluer::Error) -> ScoutError {
    ScoutError::TransportEnumeration {
        transport: "bluetooth",
        reason: format!("BlueZ: {e}"),
    }
}

/// Whether a device belongs in the bonded list. A pairing state that cannot
/// be read leaves the device out, with a log line saying so.
fn keep_if_paired(address: &str, paired: std::result::Result<bool, impl std::fmt::Display>) -> bool {
    match paired {
        Ok(paired) => paired,
        Err(e) => {
            let err = ScoutError::inspection(address, e);
            tracing::debug!(
                transport = "bluetooth",
                device = %address,
                kind = err.kind().as_str(),
                error = %err,
                "pairing state unreadable; device left out"
            );
            false
        }
    }
}

impl BluetoothHost for BluezHost {
    fn adapter_state(&self) -> Result<AdapterState> {
        block_on(&self.runtime, async {
            let Some(adapter) = self.default_adapter().await.map_err(bluez_enum_err)? else {
                return Ok(AdapterState::Missing);
            };
            let powered = adapter.is_powered().await.map_err(bluez_enum_err)?;
            Ok(if powered {
                AdapterState::PoweredOn
            } else {
                AdapterState::PoweredOff
            })
        })
    }

    fn connect_permission(&self) -> PermissionState {
        // BlueZ is gated by D-Bus policy, not by a per-app runtime permission.
        PermissionState::NotRequired
    }

    fn bonded_addresses(&self) -> Result<Vec<String>> {
        block_on(&self.runtime, async {
            let adapter = self.require_adapter().await?;
            let mut bonded = Vec::new();
            for address in adapter.device_addresses().await.map_err(bluez_enum_err)? {
                let paired = match adapter.device(address) {
                    Ok(device) => device.is_paired().await,
                    Err(e) => Err(e),
                };
                if keep_if_paired(&address.to_string(), paired) {
                    bonded.push(address.to_string());
                }
            }
            Ok(bonded)
        })
    }

    fn describe_bonded(&self, address: &str) -> Result<BondedDevice> {
        let parsed: Address = address
            .parse()
            .map_err(|e| ScoutError::inspection(address, format!("bad address: {e}")))?;
        block_on(&self.runtime, async {
            let adapter = self.require_adapter().await?;
            let device = adapter
                .device(parsed)
                .map_err(|e| ScoutError::inspection(address, e))?;
            let name = device
                .name()
                .await
                .map_err(|e| ScoutError::inspection(address, e))?;
            let class = device
                .class()
                .await
                .map_err(|e| ScoutError::inspection(address, e))?;
            let paired = device
                .is_paired()
                .await
                .map_err(|e| ScoutError::inspection(address, e))?;
            Ok(BondedDevice {
                address: address.to_owned(),
                name,
                device_class: class.map(bluetooth_device_class),
                bond_state: if paired { BondState::Bonded } else { BondState::None },
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreadable_pairing_state_leaves_device_out() {
        assert!(keep_if_paired("DC:0D:30:12:34:56", Ok::<_, &str>(true)));
        assert!(!keep_if_paired("DC:0D:30:12:34:56", Ok::<_, &str>(false)));
        assert!(!keep_if_paired(
            "DC:0D:30:12:34:56",
            Err("org.freedesktop.DBus.Error.NoReply")
        ));
    }
}
