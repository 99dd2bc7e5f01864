use std::process::ExitCode;

use clap::Parser;
use log::{debug, info, LevelFilter};

mod report;
mod subnet;
mod wol;

use wol::MagicPacket;

/// Wake a device by broadcasting a magic packet to its subnet.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Hardware address to wake (AA:BB:CC:DD:EE:FF, AA-BB-CC-DD-EE-FF or AABBCCDDEEFF).
    #[arg(value_name = "MAC_ADDRESS")]
    mac: Option<String>,

    /// Subnet of the device in CIDR notation, e.g. 192.168.1.0/24.
    #[arg(value_name = "SUBNET_CIDR")]
    subnet: Option<String>,

    /// Destination UDP port.
    #[arg(short, long, default_value_t = subnet::WOL_PORT)]
    port: u16,

    /// Print debug output.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    let target = match report::validate_args(args.mac.as_deref(), args.subnet.as_deref()) {
        Ok(target) => target,
        Err(err) => {
            eprintln!("{}", err);
            eprintln!("{}", report::usage(&program_name()));
            return ExitCode::FAILURE;
        }
    };

    let destination = target.broadcast.with_port(args.port);
    match MagicPacket::new(&target.mac).broadcast(destination) {
        Ok(()) => {
            info!(
                "magic packet sent to {} port {} with MAC {}",
                destination.ip(),
                destination.port(),
                target.mac
            );
            println!("Ok");
            ExitCode::SUCCESS
        }
        Err(err) => {
            debug!("unable to send magic packet: {}", err);
            println!("Error");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { LevelFilter::Debug } else { LevelFilter::Warn };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(false)
        .init();
}

fn program_name() -> String {
    std::env::args_os()
        .next()
        .map(|arg| arg.to_string_lossy().into_owned())
        .unwrap_or_else(|| clap::crate_name!().to_string())
}
