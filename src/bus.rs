//! BMC sensor bus client.
//!
//! All hardware reads on this chassis go through the BMC: named sensor
//! channels via the SDR repository and CPLD registers via the IPMI master
//! write-read command. The `SensorBus` trait is the seam the platform code
//! consumes; `BmcSensorBus` is the production implementation backed by an
//! `ipmitool` subprocess.

use std::path::PathBuf;
use std::process::Command;
use std::sync::{Arc, Mutex, OnceLock};

use log::debug;

use crate::errors::PlatformError;

/// Sensor classes understood by the BMC read path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorKind {
    Fan,
    Thermal,
    Psu,
}

/// Synchronous access to the chassis sensor bus.
///
/// Every call is one blocking bus transaction; callers hold no lock across
/// calls, so two reads for the same fan are not atomic with respect to
/// other sensors being polled.
pub trait SensorBus {
    /// Read a named sensor channel, scaled by `multiplier`.
    fn read_sensor(
        &self,
        name: &str,
        multiplier: u32,
        kind: SensorKind,
    ) -> Result<u32, PlatformError>;

    /// Read the fan-board presence register (one byte, low 4 bits used).
    fn read_fan_presence(&self) -> Result<u8, PlatformError>;

    /// Read a raw CPLD register behind the given I2C bus and address.
    fn read_register(&self, bus: u8, addr: u8, reg: u8) -> Result<u8, PlatformError>;
}

/// Fan-board CPLD coordinates for the shared presence register.
const FAN_IO_BUS: u8 = 0x03;
const FAN_IO_ADDR: u8 = 0x27;
const FAN_PRESENT_REG: u8 = 0x26;

static BUS_LOCK: OnceLock<Arc<Mutex<()>>> = OnceLock::new();

/// Create (once) and hand out the process-wide lock that serializes BMC
/// transactions. Idempotent; every bus client shares the same handle.
pub fn bus_lock_init() -> Arc<Mutex<()>> {
    BUS_LOCK.get_or_init(|| Arc::new(Mutex::new(()))).clone()
}

/// BMC bus client backed by the `ipmitool` CLI.
pub struct BmcSensorBus {
    ipmitool: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl BmcSensorBus {
    pub fn new() -> Self {
        Self::with_command(PathBuf::from("ipmitool"))
    }

    /// Client using a custom ipmitool path (useful for testing).
    fn with_command(ipmitool: PathBuf) -> Self {
        Self {
            ipmitool,
            lock: bus_lock_init(),
        }
    }

    /// Run one ipmitool invocation under the bus lock and return its stdout.
    fn run(&self, args: &[&str]) -> Result<String, PlatformError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| PlatformError::Bus("bus lock poisoned".to_string()))?;

        let output = Command::new(&self.ipmitool).args(args).output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PlatformError::Bus(format!(
                "ipmitool {} failed: {}",
                args.join(" "),
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl Default for BmcSensorBus {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorBus for BmcSensorBus {
    fn read_sensor(
        &self,
        name: &str,
        multiplier: u32,
        kind: SensorKind,
    ) -> Result<u32, PlatformError> {
        let csv = self.run(&["-c", "sdr", "get", name])?;
        let value = parse_sdr_reading(&csv, name)?;
        debug!("sdr {name} ({kind:?}) = {value} x{multiplier}");
        Ok(value.saturating_mul(multiplier))
    }

    fn read_fan_presence(&self) -> Result<u8, PlatformError> {
        self.read_register(FAN_IO_BUS, FAN_IO_ADDR, FAN_PRESENT_REG)
    }

    fn read_register(&self, bus: u8, addr: u8, reg: u8) -> Result<u8, PlatformError> {
        // IPMI Master Write-Read (NetFn App 0x06, cmd 0x52), one byte back.
        let out = self.run(&[
            "raw",
            "0x06",
            "0x52",
            &format!("0x{:02x}", (bus << 1) | 1),
            &format!("0x{:02x}", addr << 1),
            "0x01",
            &format!("0x{reg:02x}"),
        ])?;
        parse_raw_byte(&out)
    }
}

/// Parse `ipmitool -c sdr get <name>` CSV output into a raw reading.
///
/// Record shape: `Fantray_1_1,8400,RPM,ok`. The reading column may carry a
/// decimal point for non-fan sensors, so it is parsed as a float and
/// truncated.
fn parse_sdr_reading(csv: &str, name: &str) -> Result<u32, PlatformError> {
    for line in csv.lines() {
        let cols: Vec<&str> = line.split(',').collect();
        if cols.len() >= 2 && cols[0].trim() == name {
            let value: f64 = cols[1]
                .trim()
                .parse()
                .map_err(|e| PlatformError::Bus(format!("bad reading for {name}: {e}")))?;
            return Ok(value as u32);
        }
    }
    Err(PlatformError::Bus(format!("sensor {name} not in sdr output")))
}

/// Parse `ipmitool raw` output (space-separated hex bytes) into its first byte.
fn parse_raw_byte(out: &str) -> Result<u8, PlatformError> {
    let token = out
        .split_whitespace()
        .next()
        .ok_or_else(|| PlatformError::Bus("empty raw response".to_string()))?;
    u8::from_str_radix(token, 16)
        .map_err(|e| PlatformError::Bus(format!("bad raw byte {token:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    /// Helper: write an executable fake ipmitool script into a temp dir.
    fn fake_ipmitool(dir: &TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("ipmitool");
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn parse_sdr_reading_finds_named_record() {
        let csv = "CPU Temp,42,degrees C,ok\nFantray_1_1,8400,RPM,ok";
        assert_eq!(parse_sdr_reading(csv, "Fantray_1_1").unwrap(), 8400);
    }

    #[test]
    fn parse_sdr_reading_rejects_missing_sensor() {
        let err = parse_sdr_reading("Fantray_1_1,8400,RPM,ok", "PSU1_Fan").unwrap_err();
        assert!(matches!(err, PlatformError::Bus(_)));
    }

    #[test]
    fn parse_raw_byte_reads_first_hex_token() {
        assert_eq!(parse_raw_byte(" 0f").unwrap(), 0x0f);
        assert_eq!(parse_raw_byte("03 00").unwrap(), 0x03);
        assert!(parse_raw_byte("").is_err());
        assert!(parse_raw_byte("zz").is_err());
    }

    #[test]
    fn bmc_sensor_read_parses_sdr_csv() {
        let dir = TempDir::new().unwrap();
        let tool = fake_ipmitool(&dir, "echo 'Fantray_1_1,8400,RPM,ok'");
        let bus = BmcSensorBus::with_command(tool);
        assert_eq!(bus.read_sensor("Fantray_1_1", 1, SensorKind::Fan).unwrap(), 8400);
    }

    #[test]
    fn bmc_sensor_read_applies_multiplier() {
        let dir = TempDir::new().unwrap();
        let tool = fake_ipmitool(&dir, "echo 'PSU1_Fan,150,RPM,ok'");
        let bus = BmcSensorBus::with_command(tool);
        assert_eq!(bus.read_sensor("PSU1_Fan", 10, SensorKind::Fan).unwrap(), 1500);
    }

    #[test]
    fn bmc_register_read_parses_raw_byte() {
        let dir = TempDir::new().unwrap();
        let tool = fake_ipmitool(&dir, "echo ' 0f'");
        let bus = BmcSensorBus::with_command(tool);
        assert_eq!(bus.read_register(0x02, 0x35, 0x0a).unwrap(), 0x0f);
    }

    #[test]
    fn bmc_failure_is_reported_as_bus_error() {
        let dir = TempDir::new().unwrap();
        let tool = fake_ipmitool(&dir, "echo 'no response' >&2; exit 1");
        let bus = BmcSensorBus::with_command(tool);
        let err = bus.read_fan_presence().unwrap_err();
        assert!(matches!(err, PlatformError::Bus(_)));
    }

    #[test]
    fn bus_lock_init_hands_out_the_same_lock() {
        let a = bus_lock_init();
        let b = bus_lock_init();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
