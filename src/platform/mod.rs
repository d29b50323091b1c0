mod agc7648sv1;

use crate::bus::BmcSensorBus;
use crate::errors::PlatformError;
use crate::fan::{FanDirection, FanInfo, FanMode};
use crate::oid::Oid;

pub use agc7648sv1::{Agc7648sv1, FAN_COUNT};

/// Chassis fan plugin interface, polled by the host framework.
pub trait FanPlatform {
    /// One-time setup; must run before any query.
    fn init(&self) -> Result<(), PlatformError>;

    /// Fill `info` with the static descriptor and live status for `oid`.
    ///
    /// On error the report still carries whatever fields were populated
    /// before the failure, so callers can render partial data.
    fn fan_info(&self, oid: Oid, info: &mut FanInfo) -> Result<(), PlatformError>;

    /// Set a fan's target speed in RPM.
    fn rpm_set(&self, oid: Oid, rpm: u32) -> Result<(), PlatformError>;

    /// Set a fan's target speed as a percentage of rated speed.
    fn percentage_set(&self, oid: Oid, percentage: u32) -> Result<(), PlatformError>;

    /// Set the chassis fan speed mode.
    fn mode_set(&self, oid: Oid, mode: FanMode) -> Result<(), PlatformError>;

    /// Set a fan's airflow direction.
    fn dir_set(&self, oid: Oid, dir: FanDirection) -> Result<(), PlatformError>;

    /// Generic platform-specific control op.
    fn control(&self, oid: Oid, code: u32) -> Result<(), PlatformError>;
}

/// Create the plugin wired to the real BMC bus.
pub fn create_platform() -> Box<dyn FanPlatform> {
    Box::new(Agc7648sv1::new(BmcSensorBus::new()))
}
