use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use roverlink_codec::CommandValues;
use roverlink_schema::Variant;
use roverlink_session::SessionConfig;

use crate::exit::{session_error, CliResult};
use crate::output::OutputFormat;

pub mod decode;
pub mod encode;
pub mod monitor;
pub mod schema;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Open a link and print decoded telemetry as it arrives.
    Monitor(MonitorArgs),
    /// Decode telemetry lines from stdin or a file.
    Decode(DecodeArgs),
    /// Build one command frame and print it.
    Encode(EncodeArgs),
    /// Print the field layouts of a protocol variant.
    Schema(SchemaArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Monitor(args) => monitor::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Encode(args) => encode::run(args, format),
        Command::Schema(args) => schema::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct MonitorArgs {
    /// Link address: a tty path, tcp:HOST:PORT or unix:PATH. Default: /dev/ttyACM0.
    pub link: Option<String>,
    /// Protocol variant (legacy-21, extended-25).
    #[arg(long)]
    pub variant: Option<Variant>,
    /// Serial baud rate.
    #[arg(long)]
    pub baud: Option<u32>,
    /// Send a command after every decoded frame.
    #[arg(long)]
    pub reply: bool,
    /// Command field value (repeatable), e.g. --set rightDesiredRpm=120.
    #[arg(long = "set", value_name = "NAME=VALUE", value_parser = parse_assignment)]
    pub set: Vec<(String, i64)>,
    /// Session configuration file (JSON).
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// Exit after printing N snapshots.
    #[arg(long)]
    pub count: Option<usize>,
    /// Reopen the link after a disconnect instead of exiting.
    #[arg(long)]
    pub reconnect: bool,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Read lines from this file instead of stdin.
    #[arg(long, value_name = "FILE")]
    pub file: Option<PathBuf>,
    /// Protocol variant (legacy-21, extended-25).
    #[arg(long, default_value_t = Variant::Legacy21)]
    pub variant: Variant,
    /// Decode command frames rather than telemetry.
    #[arg(long)]
    pub command: bool,
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Protocol variant (legacy-21, extended-25).
    #[arg(long)]
    pub variant: Option<Variant>,
    /// Command field value (repeatable); unset fields are zero.
    #[arg(long = "set", value_name = "NAME=VALUE", value_parser = parse_assignment)]
    pub set: Vec<(String, i64)>,
    /// Session configuration file (JSON) supplying the variant and base values.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct SchemaArgs {
    /// Protocol variant (legacy-21, extended-25).
    #[arg(long, default_value_t = Variant::Legacy21)]
    pub variant: Variant,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Parse `NAME=VALUE` with an integer value.
pub fn parse_assignment(input: &str) -> Result<(String, i64), String> {
    let (name, value) = input
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got {input:?}"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing field name in {input:?}"));
    }
    let value = value
        .trim()
        .parse::<i64>()
        .map_err(|err| format!("invalid value for {name}: {err}"))?;
    Ok((name.to_string(), value))
}

/// Load the config file if given, then apply command-line overrides.
pub fn session_config(
    path: Option<&Path>,
    variant: Option<Variant>,
    set: &[(String, i64)],
) -> CliResult<SessionConfig> {
    let mut config = match path {
        Some(path) => {
            SessionConfig::from_json_file(path).map_err(|err| session_error("config", err))?
        }
        None => SessionConfig::default(),
    };
    if let Some(variant) = variant {
        config.variant = variant;
    }
    let overrides: CommandValues = set.iter().map(|(name, value)| (name.as_str(), *value)).collect();
    config.command.merge(&overrides);
    Ok(config)
}
