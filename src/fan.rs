use std::fmt;

use serde::Serialize;

use crate::oid::Oid;

/// Rated speed of the front fan-board fans in RPM, the divisor for the
/// percentage readout.
pub const MAX_FRONT_FAN_SPEED: u32 = 12_000;

/// Capability flags advertised by a fan descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct FanCaps(u32);

impl FanCaps {
    pub const GET_RPM: FanCaps = FanCaps(1 << 0);
    pub const GET_PERCENTAGE: FanCaps = FanCaps(1 << 1);
    pub const SET_RPM: FanCaps = FanCaps(1 << 2);
    pub const SET_PERCENTAGE: FanCaps = FanCaps(1 << 3);
    pub const SET_DIR: FanCaps = FanCaps(1 << 4);

    pub const fn empty() -> FanCaps {
        FanCaps(0)
    }

    pub const fn union(self, other: FanCaps) -> FanCaps {
        FanCaps(self.0 | other.0)
    }

    pub const fn contains(self, other: FanCaps) -> bool {
        self.0 & other.0 == other.0
    }
}

/// Live status flags for a fan.
///
/// After a successful presence determination exactly one of PRESENT/FAILED
/// is set; neither means the presence check could not run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct FanStatus(u32);

impl FanStatus {
    pub const PRESENT: FanStatus = FanStatus(1 << 0);
    pub const FAILED: FanStatus = FanStatus(1 << 1);
    /// Back-to-front airflow.
    pub const B2F: FanStatus = FanStatus(1 << 2);

    pub const fn empty() -> FanStatus {
        FanStatus(0)
    }

    pub const fn union(self, other: FanStatus) -> FanStatus {
        FanStatus(self.0 | other.0)
    }

    pub const fn contains(self, other: FanStatus) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: FanStatus) {
        self.0 |= other.0;
    }

    /// Human-readable one-word summary for table output.
    pub fn summary(self) -> &'static str {
        if self.contains(Self::FAILED) {
            "failed"
        } else if self.contains(Self::PRESENT) {
            if self.contains(Self::B2F) {
                "present (b2f)"
            } else {
                "present"
            }
        } else {
            "unknown"
        }
    }
}

/// Chassis fan speed modes. Mode control is unsupported on this platform,
/// so descriptors carry `Invalid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FanMode {
    #[default]
    Invalid,
    Off,
    Slow,
    Normal,
    Fast,
    Max,
}

/// Airflow direction of a fan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FanDirection {
    FrontToBack,
    BackToFront,
}

/// One fan's descriptor plus its last-read status.
///
/// The static descriptor table holds one of these per physical fan with the
/// live fields zeroed; a query copies the table entry and fills in rpm,
/// percentage, and status flags.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FanInfo {
    pub oid: Oid,
    pub description: &'static str,
    pub caps: FanCaps,
    pub rpm: u32,
    pub percentage: u32,
    pub mode: FanMode,
    pub status: FanStatus,
}

impl FanInfo {
    pub const fn new(oid: Oid, description: &'static str, caps: FanCaps) -> Self {
        Self {
            oid,
            description,
            caps,
            rpm: 0,
            percentage: 0,
            mode: FanMode::Invalid,
            status: FanStatus::empty(),
        }
    }
}

impl Default for FanInfo {
    fn default() -> Self {
        Self::new(Oid::fan(0), "", FanCaps::empty())
    }
}

impl fmt::Display for FanInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} RPM ({}%) [{}]",
            self.description,
            self.rpm,
            self.percentage,
            self.status.summary()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caps_union_and_contains() {
        let caps = FanCaps::GET_RPM.union(FanCaps::GET_PERCENTAGE);
        assert!(caps.contains(FanCaps::GET_RPM));
        assert!(caps.contains(FanCaps::GET_PERCENTAGE));
        assert!(!caps.contains(FanCaps::SET_RPM));
    }

    #[test]
    fn status_summary_reflects_flags() {
        assert_eq!(FanStatus::empty().summary(), "unknown");
        assert_eq!(FanStatus::PRESENT.summary(), "present");
        assert_eq!(FanStatus::PRESENT.union(FanStatus::B2F).summary(), "present (b2f)");
        assert_eq!(FanStatus::FAILED.summary(), "failed");
    }

    #[test]
    fn descriptor_starts_with_live_fields_zeroed() {
        let info = FanInfo::new(Oid::fan(1), "Chassis Fan 1", FanCaps::GET_RPM);
        assert_eq!(info.rpm, 0);
        assert_eq!(info.percentage, 0);
        assert_eq!(info.mode, FanMode::Invalid);
        assert_eq!(info.status, FanStatus::empty());
    }

    #[test]
    fn display_includes_description_and_status() {
        let mut info = FanInfo::new(Oid::fan(2), "Chassis Fan 2", FanCaps::GET_RPM);
        info.rpm = 6000;
        info.percentage = 50;
        info.status.insert(FanStatus::PRESENT);
        assert_eq!(info.to_string(), "Chassis Fan 2: 6000 RPM (50%) [present]");
    }
}
