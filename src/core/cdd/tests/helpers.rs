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

use super::super::*;
use crate::core::error::CddError;
use std::path::Path;

/// Hooks double that records every call the drive makes
#[derive(Debug)]
pub struct RecordingHooks {
    /// TOC handed out by `load_disc`; `None` makes loading fail
    pub disc: Option<Toc>,
    /// Sectors reported consumed per data decode
    pub consumed: i32,
    pub loads: u32,
    pub unloads: u32,
    pub headers: Vec<[u8; 4]>,
    pub audio_starts: u32,
    pub interrupts: Vec<u8>,
    pub tray_opens: u32,
    pub tray_closes: u32,
}

impl RecordingHooks {
    pub fn new(disc: Option<Toc>) -> Self {
        Self {
            disc,
            consumed: 1,
            loads: 0,
            unloads: 0,
            headers: Vec::new(),
            audio_starts: 0,
            interrupts: Vec::new(),
            tray_opens: 0,
            tray_closes: 0,
        }
    }

    /// Headers of data sectors only (audio ticks pass all zeros)
    pub fn data_headers(&self) -> Vec<[u8; 4]> {
        self.headers
            .iter()
            .copied()
            .filter(|h| *h != [0; 4])
            .collect()
    }
}

impl DriveHooks for RecordingHooks {
    fn load_disc(&mut self, _path: &Path) -> Result<Toc, CddError> {
        self.loads += 1;
        self.disc
            .clone()
            .ok_or_else(|| CddError::DiscLoadError("no image".to_string()))
    }

    fn unload_disc(&mut self) {
        self.unloads += 1;
    }

    fn decode_sector(&mut self, header: [u8; 4]) -> i32 {
        self.headers.push(header);
        self.consumed
    }

    fn start_audio_playback(&mut self) {
        self.audio_starts += 1;
    }

    fn raise_interrupt(&mut self, level: u8) {
        self.interrupts.push(level);
    }

    fn on_tray_open(&mut self) {
        self.tray_opens += 1;
    }

    fn on_tray_close(&mut self) {
        self.tray_closes += 1;
    }
}

/// Data track at 00:02:00, audio at 03:00:00 and 06:30:00, lead-out 10:00:00
///
/// LBAs: 0, 13350, 29100, lead-out 44850.
pub fn test_toc() -> Toc {
    Toc::new(
        vec![Msf::new(0, 2, 0), Msf::new(3, 0, 0), Msf::new(6, 30, 0)],
        Msf::new(10, 0, 0),
    )
}

/// Drive with the test disc inserted and the tray closed
pub fn drive_with_disc() -> (DriveController, RecordingHooks) {
    let mut hooks = RecordingHooks::new(Some(test_toc()));
    let mut drive = DriveController::new();
    drive
        .insert_disc(Path::new("test.toml"), &mut hooks)
        .unwrap();
    (drive, hooks)
}

/// Drive without a disc
pub fn empty_drive() -> (DriveController, RecordingHooks) {
    (DriveController::new(), RecordingHooks::new(None))
}

/// Play/Seek parameters for `minute:second:frame`
pub fn msf_params(minute: u8, second: u8, frame: u8) -> [u8; 8] {
    [
        0,
        minute / 10,
        minute % 10,
        second / 10,
        second % 10,
        frame / 10,
        frame % 10,
        0,
    ]
}

/// Read TOC parameters for sub-opcode `sub` and track `track`
pub fn toc_params(sub: u8, track: u8) -> [u8; 8] {
    [0, 0, sub, track / 10, track % 10, 0, 0, 0]
}

pub fn send(drive: &mut DriveController, hooks: &mut RecordingHooks, opcode: u8, params: [u8; 8]) {
    drive.submit_command(CommandBlock::new(opcode, params), hooks);
}

pub fn play(drive: &mut DriveController, hooks: &mut RecordingHooks, m: u8, s: u8, f: u8) {
    send(drive, hooks, 0x3, msf_params(m, s, f));
}

pub fn seek(drive: &mut DriveController, hooks: &mut RecordingHooks, m: u8, s: u8, f: u8) {
    send(drive, hooks, 0x4, msf_params(m, s, f));
}

pub fn open_tray(drive: &mut DriveController, hooks: &mut RecordingHooks) {
    send(drive, hooks, 0xD, [0; 8]);
}

pub fn close_tray(drive: &mut DriveController, hooks: &mut RecordingHooks) {
    send(drive, hooks, 0xC, [0; 8]);
}

#[test]
fn test_helpers_insert_test_disc() {
    let (drive, hooks) = drive_with_disc();
    assert!(drive.has_disc());
    assert_eq!(drive.toc().last_track(), 3);
    assert_eq!(hooks.loads, 1);
}
