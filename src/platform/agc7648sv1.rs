//! Fan plugin for the Delta AGC7648SV1 chassis.
//!
//! Ten fans total: eight on a dedicated two-row fan board and one inside
//! each power supply. Tachometers are named BMC sensor channels; presence
//! comes from two CPLD registers that use the clear-bit-means-present
//! convention.

use log::{debug, warn};

use super::FanPlatform;
use crate::bus::{bus_lock_init, SensorBus, SensorKind};
use crate::errors::PlatformError;
use crate::fan::{FanCaps, FanDirection, FanInfo, FanMode, FanStatus, MAX_FRONT_FAN_SPEED};
use crate::oid::Oid;

/// SWPLD coordinates of the PSU presence/status register.
const SWPLD_BUS: u8 = 0x02;
const SWPLD_ADDR: u8 = 0x35;
const PSU_STATUS_REG: u8 = 0x0a;

/// Number of physical fans; local indices run 1..=FAN_COUNT.
pub const FAN_COUNT: u32 = 10;

/// Which physical subsystem a fan slot lives on, and where its presence
/// bit sits in that subsystem's register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Domain {
    FanBoard { presence_bit: u8 },
    Psu { presence_bit: u8 },
}

/// Per-slot wiring: tachometer channel name plus presence-bit location.
struct Slot {
    channel: &'static str,
    domain: Domain,
}

/// Indexed by local id - 1.
///
/// Fan-board slots pair by vertical position across the two rows: front
/// positions 1-4 share their presence bit with rear positions 5-8, bit 3
/// down to bit 0.
const SLOTS: [Slot; FAN_COUNT as usize] = [
    Slot { channel: "Fantray_1_1", domain: Domain::FanBoard { presence_bit: 3 } },
    Slot { channel: "Fantray_1_2", domain: Domain::FanBoard { presence_bit: 2 } },
    Slot { channel: "Fantray_1_3", domain: Domain::FanBoard { presence_bit: 1 } },
    Slot { channel: "Fantray_1_4", domain: Domain::FanBoard { presence_bit: 0 } },
    Slot { channel: "Fantray_2_1", domain: Domain::FanBoard { presence_bit: 3 } },
    Slot { channel: "Fantray_2_2", domain: Domain::FanBoard { presence_bit: 2 } },
    Slot { channel: "Fantray_2_3", domain: Domain::FanBoard { presence_bit: 1 } },
    Slot { channel: "Fantray_2_4", domain: Domain::FanBoard { presence_bit: 0 } },
    Slot { channel: "PSU1_Fan", domain: Domain::Psu { presence_bit: 0 } },
    Slot { channel: "PSU2_Fan", domain: Domain::Psu { presence_bit: 1 } },
];

const READ_CAPS: FanCaps = FanCaps::GET_RPM.union(FanCaps::GET_PERCENTAGE);

/// Static descriptor table; index 0 is reserved so that local ids index
/// directly.
const DESCRIPTORS: [FanInfo; FAN_COUNT as usize + 1] = [
    FanInfo::new(Oid::fan(0), "Reserved", FanCaps::empty()),
    FanInfo::new(Oid::fan(1), "Chassis Fan 1", READ_CAPS),
    FanInfo::new(Oid::fan(2), "Chassis Fan 2", READ_CAPS),
    FanInfo::new(Oid::fan(3), "Chassis Fan 3", READ_CAPS),
    FanInfo::new(Oid::fan(4), "Chassis Fan 4", READ_CAPS),
    FanInfo::new(Oid::fan(5), "Chassis Fan 5", READ_CAPS),
    FanInfo::new(Oid::fan(6), "Chassis Fan 6", READ_CAPS),
    FanInfo::new(Oid::fan(7), "Chassis Fan 7", READ_CAPS),
    FanInfo::new(Oid::fan(8), "Chassis Fan 8", READ_CAPS),
    FanInfo::new(Oid::fan(9), "Chassis PSU-1 Fan 1", READ_CAPS),
    FanInfo::new(Oid::fan(10), "Chassis PSU-2 Fan 1", READ_CAPS),
];

/// AGC7648SV1 fan plugin over a sensor bus client.
pub struct Agc7648sv1<B> {
    bus: B,
}

impl<B: SensorBus> Agc7648sv1<B> {
    pub fn new(bus: B) -> Self {
        Self { bus }
    }

    /// Read one fan-board slot: tachometer first, then the shared presence
    /// register.
    ///
    /// An RPM read failure leaves the rpm fields at their zeroed defaults
    /// and does not abort; only a failed presence read fails the call, and
    /// even then the bit decode runs on a zeroed byte.
    fn read_fan_board(
        &self,
        channel: &str,
        presence_bit: u8,
        info: &mut FanInfo,
    ) -> Result<(), PlatformError> {
        match self.bus.read_sensor(channel, 1, SensorKind::Fan) {
            Ok(rpm) => {
                info.rpm = rpm;
                info.percentage = rpm * 100 / MAX_FRONT_FAN_SPEED;
            }
            Err(err) => debug!("rpm read failed for {channel}: {err}"),
        }

        let (present_bits, rv) = match self.bus.read_fan_presence() {
            Ok(byte) => (byte, Ok(())),
            Err(err) => {
                warn!("fan presence read failed: {err}");
                (0, Err(PlatformError::Invalid))
            }
        };

        // Clear bit means present on this hardware.
        if present_bits & (1 << presence_bit) == 0 {
            info.status.insert(FanStatus::PRESENT);
        } else {
            info.status.insert(FanStatus::FAILED);
        }

        rv
    }

    /// Read one PSU-embedded fan.
    ///
    /// Success is gated on the SWPLD presence bit alone; a tachometer read
    /// failure just leaves rpm at zero. PSU fans on this chassis are fixed
    /// back-to-front airflow.
    fn read_psu_fan(
        &self,
        channel: &str,
        presence_bit: u8,
        info: &mut FanInfo,
    ) -> Result<(), PlatformError> {
        let psu_bits = match self.bus.read_register(SWPLD_BUS, SWPLD_ADDR, PSU_STATUS_REG) {
            Ok(byte) => byte,
            Err(err) => {
                debug!("psu status read failed: {err}");
                0
            }
        };

        let rpm = match self.bus.read_sensor(channel, 1, SensorKind::Fan) {
            Ok(rpm) => rpm,
            Err(err) => {
                debug!("rpm read failed for {channel}: {err}");
                0
            }
        };

        if psu_bits & (1 << presence_bit) == 0 {
            info.rpm = rpm;
            info.percentage = rpm * 100 / MAX_FRONT_FAN_SPEED;
            info.status.insert(FanStatus::PRESENT.union(FanStatus::B2F));
            Ok(())
        } else {
            info.status.insert(FanStatus::FAILED);
            Err(PlatformError::Invalid)
        }
    }
}

impl<B: SensorBus> FanPlatform for Agc7648sv1<B> {
    fn init(&self) -> Result<(), PlatformError> {
        bus_lock_init();
        Ok(())
    }

    fn fan_info(&self, oid: Oid, info: &mut FanInfo) -> Result<(), PlatformError> {
        if !oid.is_fan() {
            return Err(PlatformError::Invalid);
        }

        let local_id = oid.index() as usize;
        let Some(slot) = local_id.checked_sub(1).and_then(|i| SLOTS.get(i)) else {
            return Err(PlatformError::Invalid);
        };

        *info = DESCRIPTORS[local_id];

        match slot.domain {
            Domain::FanBoard { presence_bit } => {
                self.read_fan_board(slot.channel, presence_bit, info)
            }
            Domain::Psu { presence_bit } => self.read_psu_fan(slot.channel, presence_bit, info),
        }
    }

    fn rpm_set(&self, _oid: Oid, _rpm: u32) -> Result<(), PlatformError> {
        // No fan on this chassis advertises SET_RPM; accepted as a no-op to
        // satisfy the plugin contract.
        Ok(())
    }

    fn percentage_set(&self, _oid: Oid, _percentage: u32) -> Result<(), PlatformError> {
        Ok(())
    }

    fn mode_set(&self, _oid: Oid, _mode: FanMode) -> Result<(), PlatformError> {
        Err(PlatformError::Unsupported)
    }

    fn dir_set(&self, _oid: Oid, _dir: FanDirection) -> Result<(), PlatformError> {
        Err(PlatformError::Unsupported)
    }

    fn control(&self, _oid: Oid, _code: u32) -> Result<(), PlatformError> {
        Err(PlatformError::Unsupported)
    }
}
