// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for printscout.
//
// None of these are fatal to a discovery caller: scanners catch them at the
// layer closest to where they happen and turn them into an empty (or shorter)
// result plus a log line.

use thiserror::Error;

/// Top-level error type for all printscout operations.
#[derive(Debug, Error)]
pub enum ScoutError {
    // -- Transport-level --
    #[error("{transport} transport unavailable: {reason}")]
    TransportUnavailable {
        transport: &'static str,
        reason: String,
    },

    #[error("permission not granted: {0}")]
    PermissionDenied(String),

    #[error("failed to enumerate {transport} devices: {reason}")]
    TransportEnumeration {
        transport: &'static str,
        reason: String,
    },

    // -- Device-level --
    #[error("failed to inspect device {device}: {reason}")]
    DeviceInspection { device: String, reason: String },

    // -- Network checking --
    #[error("host {0} did not answer the reachability check")]
    AddressUnreachable(String),

    #[error("{0} refused or timed out the connection")]
    PortClosed(String),

    #[error("invalid network range: {0}")]
    InvalidRange(String),

    // -- Platform bridge --
    #[error("platform bridge error: {0}")]
    Bridge(String),

    #[error("feature not available on this platform")]
    PlatformUnavailable,

    // -- Configuration / persistence --
    #[error("configuration error: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Coarse classification used for log fields and test assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    TransportUnavailable,
    PermissionDenied,
    TransportEnumeration,
    DeviceInspection,
    AddressUnreachable,
    PortClosed,
    InvalidInput,
    Platform,
    Other,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TransportUnavailable => "transport_unavailable",
            Self::PermissionDenied => "permission_denied",
            Self::TransportEnumeration => "transport_enumeration",
            Self::DeviceInspection => "device_inspection",
            Self::AddressUnreachable => "address_unreachable",
            Self::PortClosed => "port_closed",
            Self::InvalidInput => "invalid_input",
            Self::Platform => "platform",
            Self::Other => "other",
        }
    }
}

impl ScoutError {
    /// Which branch of the failure taxonomy this error belongs to.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::TransportUnavailable { .. } => FailureKind::TransportUnavailable,
            Self::PermissionDenied(_) => FailureKind::PermissionDenied,
            Self::TransportEnumeration { .. } => FailureKind::TransportEnumeration,
            Self::DeviceInspection { .. } => FailureKind::DeviceInspection,
            Self::AddressUnreachable(_) => FailureKind::AddressUnreachable,
            Self::PortClosed(_) => FailureKind::PortClosed,
            Self::InvalidRange(_) | Self::Config(_) => FailureKind::InvalidInput,
            Self::Bridge(_) | Self::PlatformUnavailable => FailureKind::Platform,
            Self::Io(_) | Self::Serialization(_) => FailureKind::Other,
        }
    }

    /// Shorthand for a per-device inspection failure.
    pub fn inspection(device: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::DeviceInspection {
            device: device.into(),
            reason: reason.to_string(),
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ScoutError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_cover_taxonomy() {
        let err = ScoutError::TransportUnavailable {
            transport: "bluetooth",
            reason: "adapter powered off".into(),
        };
        assert_eq!(err.kind(), FailureKind::TransportUnavailable);
        assert!(err.to_string().contains("powered off"));

        assert_eq!(
            ScoutError::PortClosed("192.168.1.9:9100".into()).kind(),
            FailureKind::PortClosed
        );
        assert_eq!(
            ScoutError::inspection("/dev/bus/usb/001/004", "descriptor read failed").kind(),
            FailureKind::DeviceInspection
        );
        assert_eq!(ScoutError::PlatformUnavailable.kind(), FailureKind::Platform);
    }

    #[test]
    fn io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: ScoutError = io_err.into();
        assert!(matches!(err, ScoutError::Io(_)));
        assert_eq!(err.kind().as_str(), "other");
    }
}
