mod bus;
mod cli;
mod errors;
mod fan;
mod oid;
mod platform;

use std::fs::File;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use log::{info, warn};
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};

use cli::{Cli, Commands};
use errors::PlatformError;
use fan::FanInfo;
use oid::Oid;
use platform::{create_platform, FanPlatform, FAN_COUNT};

fn level_from_verbosity(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Log to agc7648sv1-fan.log next to the executable.
    let log_path = std::env::current_exe()
        .unwrap_or_default()
        .parent()
        .unwrap_or(std::path::Path::new("."))
        .join("agc7648sv1-fan.log");
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();
    let log_level = level_from_verbosity(cli.verbose);
    if let Ok(file) = File::create(&log_path) {
        let _ = WriteLogger::init(log_level, log_config, file);
    }
    info!("agc7648sv1-fan started (log level: {})", log_level);

    let platform = create_platform();
    platform.init()?;

    match cli.command {
        Commands::List { json } => cmd_list(&*platform, json),
        Commands::Get { fan, json } => cmd_get(&*platform, fan, json),
        Commands::Monitor { interval } => cmd_monitor(&*platform, interval),
        Commands::SetRpm { fan, rpm } => {
            platform.rpm_set(Oid::fan(fan), rpm)?;
            println!("Accepted RPM target {} for fan {}", rpm, fan);
            Ok(())
        }
        Commands::SetPercentage { fan, percentage } => {
            platform.percentage_set(Oid::fan(fan), percentage)?;
            println!("Accepted speed target {}% for fan {}", percentage, fan);
            Ok(())
        }
        Commands::SetMode { fan, mode } => {
            platform.mode_set(Oid::fan(fan), mode.into())?;
            Ok(())
        }
        Commands::SetDirection { fan, direction } => {
            platform.dir_set(Oid::fan(fan), direction.into())?;
            Ok(())
        }
    }
}

/// Query one fan, returning the report even when the call fails so partial
/// data can still be rendered.
fn query(platform: &dyn FanPlatform, fan: u32) -> (FanInfo, Result<(), PlatformError>) {
    let mut info = FanInfo::default();
    let rv = platform.fan_info(Oid::fan(fan), &mut info);
    (info, rv)
}

fn collect_all(platform: &dyn FanPlatform) -> Vec<FanInfo> {
    let mut fans = Vec::with_capacity(FAN_COUNT as usize);
    for id in 1..=FAN_COUNT {
        let (info, rv) = query(platform, id);
        if let Err(err) = rv {
            warn!("fan {}: {}", id, err);
        }
        fans.push(info);
    }
    fans
}

fn print_table(fans: &[FanInfo]) {
    println!("{:<4} {:<22} {:>8} {:>5}  STATUS", "ID", "DESCRIPTION", "RPM", "PCT");
    println!("{}", "-".repeat(58));
    for info in fans {
        println!(
            "{:<4} {:<22} {:>8} {:>4}%  {}",
            info.oid.index(),
            info.description,
            info.rpm,
            info.percentage,
            info.status.summary()
        );
    }
}

fn cmd_list(platform: &dyn FanPlatform, json: bool) -> Result<()> {
    let fans = collect_all(platform);
    if json {
        println!("{}", serde_json::to_string_pretty(&fans)?);
    } else {
        print_table(&fans);
    }
    Ok(())
}

fn cmd_get(platform: &dyn FanPlatform, fan: u32, json: bool) -> Result<()> {
    let (info, rv) = query(platform, fan);
    if let Err(err) = rv {
        // Still show whatever was read before failing.
        if !json {
            println!("{}", info);
        }
        return Err(err.into());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        println!("{}", info);
    }
    Ok(())
}

fn cmd_monitor(platform: &dyn FanPlatform, interval_secs: u64) -> Result<()> {
    println!("Monitoring fans (Ctrl+C to stop)...\n");
    loop {
        // Clear screen with ANSI escape
        print!("\x1B[2J\x1B[H");
        println!("Fan Monitor (every {}s) — Ctrl+C to stop\n", interval_secs);

        let fans = collect_all(platform);
        print_table(&fans);

        thread::sleep(Duration::from_secs(interval_secs));
    }
}
