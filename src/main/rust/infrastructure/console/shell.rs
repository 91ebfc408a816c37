use std::io::{BufRead, Write};

use anyhow::{anyhow, Result};

use super::command::{BridgeRequest, Command, HELP};
use crate::application::services::BridgeService;
use crate::domain::errors::DomainError;
use crate::domain::value_objects::{BridgeConfig, BridgeId, BridgeSummary};

const PROMPT: &str = "frame-bridge> ";

/// Read commands from `input` until `quit` or end of input.
/// Command errors are printed and the loop continues; only I/O errors end it.
pub fn run_console<R: BufRead, W: Write>(service: &BridgeService, input: R, mut output: W) -> Result<()> {
    write!(output, "{}", PROMPT)?;
    output.flush()?;

    for line in input.lines() {
        let line = line?;
        match Command::parse(&line) {
            Ok(Some(Command::Quit)) => break,
            Ok(Some(command)) => {
                if let Err(e) = execute(service, command, &mut output) {
                    writeln!(output, "error: {}", e)?;
                }
            }
            Ok(None) => {}
            Err(e) => writeln!(output, "error: {}", e)?,
        }
        write!(output, "{}", PROMPT)?;
        output.flush()?;
    }

    writeln!(output)?;
    Ok(())
}

fn execute<W: Write>(service: &BridgeService, command: Command, output: &mut W) -> Result<()> {
    match command {
        Command::List => print_bridges(&service.list_bridges(), output)?,
        Command::Sources(kind) => {
            let sources = service.discover_sources(kind);
            if sources.is_empty() {
                writeln!(output, "no {} sources found", kind)?;
            }
            for name in sources {
                writeln!(output, "  {}", name)?;
            }
        }
        Command::Create(request) => {
            let id = service.start_bridge(to_config(request)?).map_err(start_failure)?;
            writeln!(output, "started bridge {}", id)?;
        }
        Command::Edit { row, request } => {
            let id = bridge_at(service, row)?;
            let id = service
                .edit_bridge(id, to_config(request)?)
                .map_err(start_failure)?;
            writeln!(output, "restarted bridge {}", id)?;
        }
        Command::Remove { row } => {
            service
                .stop_and_remove_at(row - 1)
                .map_err(|e| match e {
                    DomainError::IndexOutOfRange { len, .. } => {
                        anyhow!("no bridge at row {} ({} active)", row, len)
                    }
                    other => other.into(),
                })?;
            writeln!(output, "removed bridge {}", row)?;
        }
        Command::Stats { row } => {
            let id = bridge_at(service, row)?;
            let stats = service
                .bridge_stats(id)
                .ok_or_else(|| anyhow!("bridge {} is gone", row))?;
            writeln!(
                output,
                "connect attempts: {}\nframes relayed: {}\nmissed pulls: {}\npublish failures: {}\nsend failures: {}",
                stats.connect_attempts,
                stats.frames_relayed,
                stats.missed_pulls,
                stats.publish_failures,
                stats.send_failures
            )?;
        }
        Command::Help => writeln!(output, "{}", HELP)?,
        Command::Quit => {}
    }
    Ok(())
}

fn to_config(request: BridgeRequest) -> Result<BridgeConfig> {
    Ok(BridgeConfig::new(
        request.source_name,
        request.bridge_name,
        request.direction,
        request.color_space,
    )?)
}

fn start_failure(e: DomainError) -> anyhow::Error {
    if e.is_start_error() {
        anyhow!("could not start bridge: {}", e)
    } else {
        e.into()
    }
}

fn bridge_at(service: &BridgeService, row: usize) -> Result<BridgeId> {
    let bridges = service.list_bridges();
    bridges
        .get(row - 1)
        .map(|bridge| bridge.id)
        .ok_or_else(|| anyhow!("no bridge at row {} ({} active)", row, bridges.len()))
}

fn print_bridges<W: Write>(bridges: &[BridgeSummary], output: &mut W) -> Result<()> {
    if bridges.is_empty() {
        writeln!(output, "no active bridges")?;
        return Ok(());
    }

    writeln!(
        output,
        "{:>3}  {:<24} {:<11} {:<24} {:<6} {}",
        "#", "Bridge Name", "Type", "Source", "Color", "State"
    )?;
    for (i, bridge) in bridges.iter().enumerate() {
        writeln!(
            output,
            "{:>3}  {:<24} {:<11} {:<24} {:<6} {}",
            i + 1,
            bridge.bridge_name,
            bridge.direction,
            bridge.source_name,
            bridge.color_space,
            bridge.state
        )?;
    }
    Ok(())
}
