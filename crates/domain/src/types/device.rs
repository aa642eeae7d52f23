//! Managed devices linked to financed sales.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Device status state machine.
///
/// The reconciliation engine only ever drives `Active ⇄ Locked`. The three
/// administrative states are terminal as far as reconciliation is concerned:
/// devices in them are skipped by both passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceStatus {
    Active,
    Locked,
    Wiped,
    Returned,
    Lost,
}

impl DeviceStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "active" => Some(Self::Active),
            "locked" => Some(Self::Locked),
            "wiped" => Some(Self::Wiped),
            "returned" => Some(Self::Returned),
            "lost" => Some(Self::Lost),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Locked => "locked",
            Self::Wiped => "wiped",
            Self::Returned => "returned",
            Self::Lost => "lost",
        }
    }

    /// Terminal administrative states the reconciliation never touches.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Wiped | Self::Returned | Self::Lost)
    }
}

/// One device record per financed sale (at most one active link).
///
/// Status transitions are owned exclusively by the reconciliation engine and
/// the manual override path; linking a device to a sale happens elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagedDevice {
    pub id: i64,
    pub sale_id: i64,
    /// Identifier of the device in the external device-management backend.
    pub device_number: String,
    pub imei: String,
    pub status: DeviceStatus,
    pub last_locked_at: Option<DateTime<Utc>>,
    pub last_unlocked_at: Option<DateTime<Utc>>,
    pub lock_reason: Option<String>,
    pub tenant_id: String,
}
