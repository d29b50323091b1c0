use clap::{ArgAction, Parser, Subcommand, ValueEnum};

use crate::fan::{FanDirection, FanMode};

#[derive(Parser)]
#[command(name = "agc7648sv1-fan")]
#[command(about = "Fan status and control plugin for the Delta AGC7648SV1 chassis")]
#[command(version)]
pub struct Cli {
    /// Increase log verbosity (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show status for every chassis fan
    List {
        /// Emit machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Show status for one fan
    Get {
        /// Fan index (1-8 fan board, 9-10 PSU fans)
        fan: u32,

        /// Emit machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Poll all fans in a loop
    Monitor {
        /// Refresh interval in seconds
        #[arg(short, long, default_value = "1")]
        interval: u64,
    },

    /// Set a fan's target speed in RPM
    SetRpm {
        /// Fan index (1-8 fan board, 9-10 PSU fans)
        fan: u32,
        rpm: u32,
    },

    /// Set a fan's target speed as a percentage of rated speed
    SetPercentage {
        /// Fan index (1-8 fan board, 9-10 PSU fans)
        fan: u32,

        #[arg(value_parser = clap::value_parser!(u32).range(0..=100))]
        percentage: u32,
    },

    /// Set the chassis fan speed mode
    SetMode {
        /// Fan index (1-8 fan board, 9-10 PSU fans)
        fan: u32,

        #[arg(value_enum)]
        mode: ModeArg,
    },

    /// Set a fan's airflow direction
    SetDirection {
        /// Fan index (1-8 fan board, 9-10 PSU fans)
        fan: u32,

        #[arg(value_enum)]
        direction: DirectionArg,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ModeArg {
    Off,
    Slow,
    Normal,
    Fast,
    Max,
}

impl From<ModeArg> for FanMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Off => FanMode::Off,
            ModeArg::Slow => FanMode::Slow,
            ModeArg::Normal => FanMode::Normal,
            ModeArg::Fast => FanMode::Fast,
            ModeArg::Max => FanMode::Max,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum DirectionArg {
    /// Front-to-back airflow
    F2b,
    /// Back-to-front airflow
    B2f,
}

impl From<DirectionArg> for FanDirection {
    fn from(arg: DirectionArg) -> Self {
        match arg {
            DirectionArg::F2b => FanDirection::FrontToBack,
            DirectionArg::B2f => FanDirection::BackToFront,
        }
    }
}
