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

//! Test fixtures for common drive scenarios

use std::io::Write;

use mcdrive::core::cdd::{CommandBlock, DriveController, InterruptMask};
use mcdrive::core::config::DriveConfig;
use mcdrive::core::loader::SheetDisc;
use tempfile::{Builder, NamedTempFile};

/// Data track at 00:02:00, two audio tracks, lead-out at 10:00:00
///
/// Track start LBAs: 0, 13350, 29100. Lead-out LBA 44850.
pub const THREE_TRACK_SHEET: &str = r#"
lead_out = "10:00:00"

[[track]]
start = "00:02:00"
title = "Data"

[[track]]
start = "03:00:00"
title = "Opening"

[[track]]
start = "06:30:00"
title = "Ending"
"#;

/// Write `text` into a temporary `.toml` file
#[allow(dead_code)]
pub fn write_sheet(text: &str) -> NamedTempFile {
    let mut file = Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("Failed to create temp file");
    file.write_all(text.as_bytes())
        .expect("Failed to write TOC sheet");
    file
}

/// Reset drive with interrupts enabled and the three-track sheet inserted
///
/// The sheet file is returned so it outlives the drive.
#[allow(dead_code)]
pub fn create_loaded_drive(config: DriveConfig) -> (DriveController, SheetDisc, NamedTempFile) {
    let sheet = write_sheet(THREE_TRACK_SHEET);
    let mut disc = SheetDisc::new();
    let mut drive = DriveController::with_config(config);

    drive.reset();
    drive
        .registers_mut()
        .set_interrupt_mask(InterruptMask::IEN4);
    drive
        .insert_disc(sheet.path(), &mut disc)
        .expect("Failed to insert TOC sheet");

    (drive, disc, sheet)
}

/// Command block for a Play/Seek to `minute:second:frame`
#[allow(dead_code)]
pub fn msf_command(opcode: u8, minute: u8, second: u8, frame: u8) -> CommandBlock {
    CommandBlock::new(
        opcode,
        [
            0,
            minute / 10,
            minute % 10,
            second / 10,
            second % 10,
            frame / 10,
            frame % 10,
            0,
        ],
    )
}

/// Read TOC command block
#[allow(dead_code)]
pub fn toc_command(sub: u8, track: u8) -> CommandBlock {
    CommandBlock::new(0x2, [0, 0, sub, track / 10, track % 10, 0, 0, 0])
}

/// Parameterless command block
#[allow(dead_code)]
pub fn simple_command(opcode: u8) -> CommandBlock {
    CommandBlock::new(opcode, [0; 8])
}

/// Submit `block` and run one tick so the response is exported
#[allow(dead_code)]
pub fn issue(drive: &mut DriveController, disc: &mut SheetDisc, block: CommandBlock) {
    drive.submit_command(block, disc);
    drive.tick(disc);
}

/// Run `count` ticks
#[allow(dead_code)]
pub fn run_ticks(drive: &mut DriveController, disc: &mut SheetDisc, count: usize) {
    for _ in 0..count {
        drive.tick(disc);
    }
}
