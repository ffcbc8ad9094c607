// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Handle-to-device map kept between a listing call and the per-device reads
// that follow it within the same scan.

use std::collections::HashMap;
use std::sync::Mutex;

/// Devices from the most recent enumeration, keyed by handle name.
pub(crate) struct DeviceCache<D> {
    devices: Mutex<HashMap<String, D>>,
}

impl<D: Clone> DeviceCache<D> {
    pub(crate) fn new() -> Self {
        Self {
            devices: Mutex::new(HashMap::new()),
        }
    }

    /// Replace the cached set with a fresh enumeration.
    pub(crate) fn replace(&self, devices: impl IntoIterator<Item = (String, D)>) {
        let mut cached = self.devices.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        cached.clear();
        cached.extend(devices);
    }

    /// Look up `name`; on a miss, re-enumerate once with `refresh` and retry.
    ///
    /// A handle that is still missing after the refresh has been detached.
    pub(crate) fn get_or_refresh<E>(
        &self,
        name: &str,
        refresh: impl FnOnce() -> Result<Vec<(String, D)>, E>,
    ) -> Result<Option<D>, E> {
        if let Some(device) = self.get(name) {
            return Ok(Some(device));
        }
        self.replace(refresh()?);
        Ok(self.get(name))
    }

    fn get(&self, name: &str) -> Option<D> {
        self.devices
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(name)
            .cloned()
    }
}
