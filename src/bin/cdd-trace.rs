// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::path::PathBuf;

use clap::Parser;
use log::{error, info, warn};
use mcdrive::core::cdd::{
    CddCommand, CommandBlock, DriveController, DriveStatus, InterruptMask, BLOCK_SIZE,
};
use mcdrive::core::config::DriveConfig;
use mcdrive::core::error::{EmulatorError, Result};
use mcdrive::core::loader::SheetDisc;
use serde::Serialize;

/// Mega-CD drive command tracer
#[derive(Parser)]
#[command(name = "cdd-trace")]
#[command(about = "Run CDD commands against a TOC sheet and dump the status block", long_about = None)]
struct Args {
    /// Path to a TOC sheet (.toml)
    toc_sheet: PathBuf,

    /// Drive configuration file (.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Command block as 9 hex digits (checksum added) or 10 raw digits,
    /// e.g. 300002000 for Play 00:02:00
    #[arg(short = 'c', long = "command")]
    commands: Vec<String>,

    /// Ticks to run after each command
    #[arg(short = 'n', long, default_value = "1")]
    ticks: usize,

    /// Print the trace as JSON
    #[arg(long)]
    json: bool,
}

/// One command and the drive state after its ticks
#[derive(Serialize)]
struct TraceStep {
    command: [u8; BLOCK_SIZE],
    name: String,
    status_block: [u8; BLOCK_SIZE],
    drive_status: DriveStatus,
    lba: i32,
    track: u8,
    reading: bool,
}

/// Parse a command block from hex digits
///
/// Spaces and underscores are ignored. Nine digits get a computed checksum;
/// ten are taken as written.
fn parse_command(text: &str) -> Result<CommandBlock> {
    let digits = text
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_')
        .map(|c| {
            c.to_digit(16)
                .map(|d| d as u8)
                .ok_or_else(|| EmulatorError::Parse(format!("bad hex digit '{}' in '{}'", c, text)))
        })
        .collect::<Result<Vec<u8>>>()?;

    match digits.len() {
        9 => {
            let mut params = [0u8; 8];
            params.copy_from_slice(&digits[1..]);
            Ok(CommandBlock::new(digits[0], params))
        }
        BLOCK_SIZE => {
            let mut bytes = [0u8; BLOCK_SIZE];
            bytes.copy_from_slice(&digits);
            let block = CommandBlock::from_bytes(bytes);
            if !block.has_valid_checksum() {
                warn!("Command '{}' has a bad checksum, sending anyway", text);
            }
            Ok(block)
        }
        n => Err(EmulatorError::Parse(format!(
            "command '{}' has {} digits, expected 9 or 10",
            text, n
        ))),
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

fn main() -> Result<()> {
    // Load .env file if present (MCDRIVE_* overrides, RUST_LOG)
    if let Err(e) = dotenvy::dotenv() {
        if !e.to_string().contains("not found") {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("cdd-trace v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => DriveConfig::load(path)?,
        None => DriveConfig::default(),
    };
    config.apply_env();

    // Parse everything up front so a typo doesn't leave a half-run trace
    let commands = args
        .commands
        .iter()
        .map(|text| parse_command(text))
        .collect::<Result<Vec<_>>>()?;

    let mut disc = SheetDisc::new();
    let mut drive = DriveController::with_config(config);
    drive.reset();

    let irq = InterruptMask::for_level(drive.config().interrupt_level);
    drive.registers_mut().set_interrupt_mask(irq);

    info!("Loading TOC sheet from: {}", args.toc_sheet.display());
    if let Err(e) = drive.insert_disc(&args.toc_sheet, &mut disc) {
        error!("Failed to load TOC sheet: {}", e);
        return Err(e.into());
    }

    if drive.status() == DriveStatus::TrayOpen {
        drive.submit_command(CommandBlock::new(0xC, [0; 8]), &mut disc);
        drive.tick(&mut disc);
    }

    info!(
        "Disc ready: {} tracks, lead-out {}",
        drive.toc().last_track(),
        drive.toc().lead_out()
    );

    let mut steps = Vec::with_capacity(commands.len());
    for block in commands {
        drive.submit_command(block, &mut disc);
        for _ in 0..args.ticks {
            drive.tick(&mut disc);
        }

        let step = TraceStep {
            command: block.bytes(),
            name: format!("{:?}", CddCommand::decode(&block)),
            status_block: drive.registers().status_bytes(),
            drive_status: drive.status(),
            lba: drive.cur_lba(),
            track: drive.cur_track(),
            reading: drive.is_reading(),
        };

        if !args.json {
            println!(
                "{} -> {} | {:?} LBA {} track {}{}",
                hex(&step.command),
                hex(&step.status_block),
                step.drive_status,
                step.lba,
                step.track,
                if step.reading { " (reading)" } else { "" }
            );
        }
        steps.push(step);
    }

    if args.json {
        let json = serde_json::to_string_pretty(&steps)
            .map_err(|e| EmulatorError::Parse(e.to_string()))?;
        println!("{}", json);
    }

    info!(
        "Trace complete: {} data sectors, {} audio ticks, {} audio starts, {} interrupts",
        disc.decoded_headers.len(),
        disc.audio_ticks,
        disc.audio_starts,
        disc.interrupts.len()
    );

    drive.shutdown(&mut disc);
    Ok(())
}
