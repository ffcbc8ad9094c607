// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// printscout bridge: native platform capability bridges.
//
// The scanners never talk to an OS API directly; they see the capability
// traits (`UsbHost`, `BluetoothHost`, `SerialHost`, `PrintQueueHost`). This
// crate provides the implementations: Android through JNI, desktop through
// libusb / BlueZ / serialport when their features are enabled plus the OS
// print system, and a stub everywhere else.

pub mod traits;

#[cfg(any(all(feature = "bluez", target_os = "linux"), test))]
mod blocking;

#[cfg(any(feature = "usb", test))]
mod device_cache;

#[cfg(any(target_os = "android", test))]
mod jvm_call;

#[cfg(target_os = "android")]
pub mod android;

#[cfg(not(target_os = "android"))]
pub mod desktop;

pub mod stub;

use std::sync::Arc;

/// Build the bridge implementation for the target operating system.
pub fn platform_bridge() -> Arc<dyn traits::PlatformBridge> {
    #[cfg(target_os = "android")]
    {
        Arc::new(android::AndroidBridge::new())
    }
    #[cfg(not(target_os = "android"))]
    {
        Arc::new(desktop::DesktopBridge::new())
    }
}
