mod config;

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{anyhow, bail};
use clap::ArgAction;
use slcan_gateway::proto::hex;
use slcan_gateway::{CanFrame, Gateway};

use crate::config::Config;

fn args() -> clap::Command {
    clap::command!()
        .subcommand_required(true)
        .arg(
            clap::Arg::new("config")
                .short('c')
                .long("config")
                .action(ArgAction::Set)
                .value_parser(clap::value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            clap::Arg::new("remote")
                .short('r')
                .long("remote")
                .action(ArgAction::Set)
                .help("Gateway MCU, host[:port]"),
        )
        .arg(
            clap::Arg::new("local")
                .short('l')
                .long("local")
                .action(ArgAction::Set)
                .value_parser(clap::value_parser!(SocketAddr))
                .help("Local address to bind"),
        )
        .subcommand(
            clap::Command::new("send")
                .about("Queue frames given as ID#DATA (or ID#R<dlc>) and flush them")
                .arg(
                    clap::Arg::new("frame")
                        .required(true)
                        .num_args(1..)
                        .action(ArgAction::Append)
                        .value_parser(parse_frame),
                ),
        )
        .subcommand(clap::Command::new("monitor").about("Print received frames until interrupted"))
}

/// Parses candump notation, `1ABCDEF0#010203` or `1ABCDEF0#R3`.
fn parse_frame(s: &str) -> anyhow::Result<CanFrame> {
    let (id, data) = s
        .split_once('#')
        .ok_or_else(|| anyhow!("expected ID#DATA, got {s:?}"))?;

    if id.is_empty() || id.len() > 8 {
        bail!("identifier must be 1 to 8 hex digits");
    }
    let id = hex::decode_hex(id.as_bytes(), id.len())?;

    if let Some(dlc) = data.strip_prefix(|c: char| c == 'R' || c == 'r') {
        let dlc = if dlc.is_empty() { 0 } else { dlc.parse()? };
        return Ok(CanFrame::new_remote(id, dlc)?);
    }

    if data.len() % 2 != 0 {
        bail!("data must be an even number of hex digits");
    }
    let bytes = data
        .as_bytes()
        .chunks_exact(2)
        .map(hex::decode_byte)
        .collect::<Result<Vec<u8>, _>>()?;

    Ok(CanFrame::new(id, &bytes)?)
}

async fn send(gateway: &Gateway, frames: impl Iterator<Item = CanFrame>) -> anyhow::Result<()> {
    let mut sent = 0;
    for frame in frames {
        match gateway.enqueue(frame).await {
            Ok(()) => {}
            Err(slcan_gateway::Error::QueueFull(full)) => {
                sent += gateway.flush().await?.into_result()?;
                gateway.enqueue(full.into_frame()).await?;
            }
            Err(e) => return Err(e.into()),
        }
    }
    sent += gateway.flush().await?.into_result()?;

    log::info!("Sent {sent} frames");
    Ok(())
}

async fn monitor(gateway: &Gateway) -> anyhow::Result<()> {
    loop {
        tokio::select! {
            received = gateway.receive() => match received {
                Ok(frame) => println!("{frame}"),
                Err(e @ slcan_gateway::Error::ReaderClosed) => return Err(e.into()),
                Err(e) => log::debug!("Skipped: {e}"),
            },
            _ = tokio::signal::ctrl_c() => {
                log::info!("Interrupted");
                return Ok(());
            }
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let matches = args().get_matches();

    let mut config = Config::load(matches.get_one::<PathBuf>("config").map(PathBuf::as_path))?;
    if let Some(remote) = matches.get_one::<String>("remote") {
        config.remote = remote.clone();
    }
    if let Some(local) = matches.get_one::<SocketAddr>("local") {
        config.gateway.local = *local;
    }

    let mut gateway = Gateway::new(config.gateway);
    gateway.connect(&config.remote).await?;

    match matches.subcommand() {
        Some(("send", submatches)) => {
            let frames = submatches
                .get_many::<CanFrame>("frame")
                .into_iter()
                .flatten()
                .copied();
            send(&gateway, frames).await?
        }
        Some(("monitor", _)) => monitor(&gateway).await?,
        _ => unreachable!(),
    }

    Ok(())
}
