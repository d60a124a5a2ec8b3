use cangate::{CanFrame, SafetyGateway, SafetyModel, TxDecision};
use cangate::profile::{FLAG_EXTERNAL_INTERPOSER, FLAG_HW1, FLAG_HW2, FLAG_HW3};
use clap::{App, Arg};
use colored::*;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum ReplayEvent {
    Rx { frame: CanFrame },
    Tx { frame: CanFrame },
    Fwd { bus: u8, addr: u16 },
    Enable,
    Disable,
    Tick,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let matches = App::new("cangate-replay")
        .version("0.1.0")
        .author("Vehicle Safety Systems Team")
        .about("Deterministic frame-log replay through the CAN safety gateway")
        .arg(
            Arg::with_name("log")
                .short("l")
                .long("log")
                .value_name("FILE")
                .help("Replay log: one JSON event per line")
                .takes_value(true)
                .required(true),
        )
        .arg(
            Arg::with_name("hw")
                .long("hw")
                .value_name("REV")
                .help("Hardware revision")
                .takes_value(true)
                .possible_values(&["1", "2", "3"])
                .default_value("3"),
        )
        .arg(
            Arg::with_name("external")
                .long("external")
                .help("External interposer install"),
        )
        .arg(
            Arg::with_name("quiet")
                .short("q")
                .long("quiet")
                .help("Only print the final state snapshot"),
        )
        .get_matches();

    let mut param = match matches.value_of("hw") {
        Some("1") => FLAG_HW1,
        Some("2") => FLAG_HW2,
        _ => FLAG_HW3,
    };
    if matches.is_present("external") {
        param |= FLAG_EXTERNAL_INTERPOSER;
    }
    let quiet = matches.is_present("quiet");

    let mut gateway = SafetyGateway::try_new(SafetyModel::LegacyAngle, param)?;
    info!(param, "replay starting");

    let path = matches.value_of("log").unwrap();
    let reader = BufReader::new(File::open(path)?);

    let mut admitted = 0u32;
    let mut rejected = 0u32;
    let mut forwarded = 0u32;

    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let event: ReplayEvent = serde_json::from_str(&line)
            .map_err(|e| format!("line {}: {}", lineno + 1, e))?;

        match event {
            ReplayEvent::Rx { frame } => {
                gateway.rx_hook(&frame);
                if !quiet {
                    println!(
                        "{} addr={:#05x} bus={}",
                        "RX ".blue(),
                        frame.addr,
                        frame.bus
                    );
                }
            }
            ReplayEvent::Tx { frame } => {
                let decision = gateway.tx_hook(&frame);
                match decision {
                    TxDecision::Admit => {
                        admitted += 1;
                        if !quiet {
                            println!("{} addr={:#05x}", "TX ADMIT ".green(), frame.addr);
                        }
                    }
                    TxDecision::Reject(reason) => {
                        rejected += 1;
                        if !quiet {
                            println!(
                                "{} addr={:#05x} ({:?})",
                                "TX REJECT".red(),
                                frame.addr,
                                reason
                            );
                        }
                    }
                }
            }
            ReplayEvent::Fwd { bus, addr } => match gateway.fwd_hook(bus, addr) {
                Some(dest) => {
                    forwarded += 1;
                    if !quiet {
                        println!(
                            "{} addr={:#05x} bus {} -> {}",
                            "FWD      ".cyan(),
                            addr,
                            bus,
                            dest
                        );
                    }
                }
                None => {
                    if !quiet {
                        println!("{} addr={:#05x} bus {}", "FWD BLOCK".yellow(), addr, bus);
                    }
                }
            },
            ReplayEvent::Enable => {
                let honored = gateway.set_controls_allowed(true);
                if !quiet {
                    let tag = if honored {
                        "ENABLE   ".green()
                    } else {
                        "ENABLE ✗ ".red()
                    };
                    println!("{}", tag);
                }
            }
            ReplayEvent::Disable => {
                gateway.set_controls_allowed(false);
                if !quiet {
                    println!("{}", "DISABLE  ".yellow());
                }
            }
            ReplayEvent::Tick => gateway.tick(),
        }
    }

    println!();
    println!(
        "{} admitted={} rejected={} forwarded={} controls_allowed={}",
        "SUMMARY".bold(),
        admitted,
        rejected,
        forwarded,
        gateway.controls_allowed()
    );
    println!("{}", serde_json::to_string_pretty(&gateway.snapshot())?);

    Ok(())
}
