//! `fs9721`: print readings from a multimeter on a serial port.

mod settings;

use anyhow::{Context, Result};
use clap::Parser;
use fs9721_core::SerialService;
use fs9721_decode::{Dmm, Reading};
use log::{error, info};
use settings::Settings;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Read values from your connected multimeter", long_about = None)]
struct Args {
    /// Serial port the meter is attached to, e.g. /dev/ttyUSB0 or COM3
    port: Option<String>,

    /// Seconds allowed for capturing one reading
    #[arg(short, long)]
    timeout: Option<f64>,

    /// Partial frames tolerated before a read fails
    #[arg(short, long)]
    retries: Option<u32>,

    /// Stop after this many readings
    #[arg(short = 'n', long)]
    count: Option<u64>,

    /// Print each reading as a JSON object
    #[arg(long)]
    json: bool,

    /// Append the raw frame in hex
    #[arg(long)]
    raw: bool,

    /// List available serial ports and exit
    #[arg(long)]
    list: bool,

    /// Settings file (defaults to <config dir>/fs9721/settings.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if args.list {
        for port in SerialService::list_ports() {
            println!("{port}");
        }
        return Ok(());
    }

    let mut settings = Settings::load_or_default(args.config.as_deref())?;
    settings.apply_overrides(args.port.clone(), args.retries, args.timeout);
    let port = settings
        .port
        .clone()
        .context("no serial port given (pass one or set \"port\" in the settings file)")?;
    let dmm_cfg = settings.dmm_config()?;

    let service = SerialService::open(settings.serial_config(&port))
        .with_context(|| format!("failed to open {port}"))?;
    let mut dmm = Dmm::with_config(service, dmm_cfg)
        .with_context(|| format!("no meter data on {port}"))?;
    info!("reading from {port} (retries {}, timeout {:?})", dmm_cfg.retries, dmm_cfg.timeout);

    let mut printed = 0u64;
    while args.count.map_or(true, |n| printed < n) {
        let reading = match dmm.read() {
            Ok(reading) => reading,
            Err(e) => {
                error!("stopping after {printed} readings from {port}");
                return Err(e).context("failed to read from meter");
            }
        };
        println!("{}", render(&reading, args.json, args.raw)?);
        printed += 1;
    }

    dmm.close().close();
    Ok(())
}

fn render(reading: &Reading, json: bool, raw: bool) -> Result<String> {
    if json {
        return Ok(serde_json::to_string(reading)?);
    }
    let mut line = reading.text.clone();
    if raw {
        line.push_str("  [");
        line.push_str(&hex::encode(reading.raw_bytes));
        line.push(']');
    }
    Ok(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fs9721_decode::{assemble, decode, RawFrame};

    fn reading() -> Reading {
        let frame = RawFrame::new([
            0x16, 0x2A, 0x37, 0x4B, 0x5F, 0x67, 0x7D, 0x87, 0x9D, 0xA0, 0xB8, 0xC0, 0xD4, 0xE0,
        ])
        .unwrap();
        assemble(decode(&frame), 0)
    }

    #[test]
    fn plain_output_is_the_text() {
        assert_eq!(render(&reading(), false, false).unwrap(), "-4.9 millivolts DC");
    }

    #[test]
    fn raw_output_appends_hex() {
        assert_eq!(
            render(&reading(), false, true).unwrap(),
            "-4.9 millivolts DC  [162a374b5f677d879da0b8c0d4e0]"
        );
    }

    #[test]
    fn json_output_is_one_line() {
        let line = render(&reading(), true, false).unwrap();
        assert!(!line.contains('\n'));
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["sane_value"], true);
        assert_eq!(value["read_errors"], 0);
        assert_eq!(value["numeric_val"], -0.0049);
    }

    #[test]
    fn args_parse() {
        let args = Args::try_parse_from(["fs9721", "/dev/ttyUSB0", "-t", "1.5", "-r", "5", "-n", "2", "--json"]).unwrap();
        assert_eq!(args.port.as_deref(), Some("/dev/ttyUSB0"));
        assert_eq!(args.timeout, Some(1.5));
        assert_eq!(args.retries, Some(5));
        assert_eq!(args.count, Some(2));
        assert!(args.json);
        assert!(!args.raw);
    }
}
