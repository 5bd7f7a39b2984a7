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

//! Mega-CD drive (CDD) and controller (CDC) emulation
//!
//! The drive is command driven: the sub-CPU writes a 10-byte command block,
//! the drive processes it, updates its status and queues a response. On the
//! next tick the response is exported into the status block and, if enabled,
//! interrupt level 4 is raised.
//!
//! # Commands
//!
//! | Opcode | Name         | Description                                |
//! |--------|--------------|--------------------------------------------|
//! | 0x0    | Status       | Report status, clearing one-shot sub-codes |
//! | 0x1    | Stop All     | Stop the transport and CDC read            |
//! | 0x2    | Read TOC     | Position/track/length queries (sub-opcode) |
//! | 0x3    | Play         | Seek to M:S:F and start reading/playing    |
//! | 0x4    | Seek         | Seek to M:S:F and hold                     |
//! | 0x6    | Pause        | Hold at the current position               |
//! | 0x7    | Resume       | Continue from the current position         |
//! | 0x8    | Fast Forward | Scan forward                               |
//! | 0x9    | Fast Rewind  | Scan backward                              |
//! | 0xA    | Recover      | Return to a known ready state              |
//! | 0xC    | Close Tray   | Close the tray                             |
//! | 0xD    | Open Tray    | Open the tray and unload the disc          |
//!
//! # Collaborators
//!
//! Disc image loading, sector decoding, CD-DA streaming and interrupt
//! delivery live outside this module and are reached through [`DriveHooks`].
//! The controller borrows the hooks for the duration of each call, so a
//! single owner serialises every entry point.
//!
//! # Example
//!
//! ```
//! use mcdrive::core::cdd::{CommandBlock, DriveController, DriveHooks, DriveStatus, Msf, Toc};
//! use mcdrive::core::error::CddError;
//! use std::path::Path;
//!
//! struct Host;
//!
//! impl DriveHooks for Host {
//!     fn load_disc(&mut self, _path: &Path) -> Result<Toc, CddError> {
//!         Ok(Toc::new(vec![Msf::new(0, 2, 0)], Msf::new(20, 0, 0)))
//!     }
//!     fn unload_disc(&mut self) {}
//!     fn decode_sector(&mut self, _header: [u8; 4]) -> i32 { 1 }
//!     fn start_audio_playback(&mut self) {}
//!     fn raise_interrupt(&mut self, _level: u8) {}
//! }
//!
//! let mut host = Host;
//! let mut drive = DriveController::new();
//! drive.insert_disc(Path::new("disc.toml"), &mut host).unwrap();
//!
//! // Play from 00:02:00 (the data track)
//! drive.submit_command(CommandBlock::new(0x3, [0, 0, 0, 0, 2, 0, 0, 0]), &mut host);
//! drive.tick(&mut host);
//!
//! assert_eq!(drive.status(), DriveStatus::Playing);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::config::DriveConfig;
use crate::core::error::CddError;

mod commands;
mod export;
mod registers;
#[cfg(test)]
mod tests;
mod timecode;

pub use commands::{BlockReason, CddCommand, GuardOutcome, TocQuery};
pub use export::sector_header;
pub use registers::{
    checksum, from_bcd_byte, from_bcd_word, to_bcd_byte, to_bcd_word, CdcFlags, CddControl,
    CommandBlock, HostRegisters, InterruptMask, StatusBlock, BLOCK_SIZE, RESET_CHECKSUM,
};
pub use timecode::{Msf, Toc, FRAMES_PER_SECOND, MIN_LBA, PAST_LAST_TRACK, PREGAP_SECTORS};

/// Track number of the data track; every other track is CD-DA
pub const DATA_TRACK: u8 = 1;

/// External collaborators of the drive
///
/// Everything the drive cannot do by itself: reading disc images, decoding
/// sectors, streaming audio and delivering interrupts to the host CPU.
pub trait DriveHooks {
    /// Load the disc image at `path` and return its Table of Contents
    fn load_disc(&mut self, path: &Path) -> Result<Toc, CddError>;

    /// Release the current disc image
    fn unload_disc(&mut self);

    /// Decode the sector described by `header` (BCD M, S, F, mode)
    ///
    /// Returns how many sectors were consumed, normally 1. An all-zero header
    /// marks an audio sector; its return value is ignored.
    fn decode_sector(&mut self, header: [u8; 4]) -> i32;

    /// Begin CD-DA playback from the drive's current position
    fn start_audio_playback(&mut self);

    /// Raise host interrupt `level`
    fn raise_interrupt(&mut self, level: u8);

    /// Tray finished opening
    fn on_tray_open(&mut self) {}

    /// Tray finished closing
    fn on_tray_close(&mut self) {}
}

/// Drive transport status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DriveStatus {
    /// No disc in the drive
    NoDisc,
    /// Tray is open
    TrayOpen,
    /// Motor stopped (after Stop or Close Tray)
    Stopped,
    /// Ready, also reported while seeking
    Ready,
    /// Scanning forward
    FastForward,
    /// Scanning backward
    FastReverse,
    /// Playing audio or reading data
    Playing,
}

impl DriveStatus {
    /// Status word reported to the host (status code in the high byte)
    ///
    /// Both scan directions report the same code.
    pub fn status_word(self) -> u16 {
        match self {
            DriveStatus::NoDisc => 0x0000,
            DriveStatus::Playing => 0x0100,
            DriveStatus::FastForward | DriveStatus::FastReverse => 0x0300,
            DriveStatus::Ready => 0x0400,
            DriveStatus::TrayOpen => 0x0500,
            DriveStatus::Stopped => 0x0900,
        }
    }
}

/// Mutable transport state of the drive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    /// Drive-level status
    pub(crate) status: DriveStatus,
    /// Current block address, -150 at the start of the pregap
    pub(crate) cur_lba: i32,
    /// Current track, [`PAST_LAST_TRACK`] past the lead-out
    pub(crate) cur_track: u8,
    /// CDC read in progress
    pub(crate) cdc_reading: bool,
    /// A response is waiting for the next export
    pub(crate) response_pending: bool,
    /// Ticks left before the next data sector is decoded
    pub(crate) read_start_delay: u32,
}

impl SessionState {
    fn new(status: DriveStatus) -> Self {
        Self {
            status,
            cur_lba: MIN_LBA,
            cur_track: 0,
            cdc_reading: false,
            response_pending: false,
            read_start_delay: 0,
        }
    }
}

/// CDD/CDC controller
///
/// Owns the session state, the response under construction, the host
/// register surface and the TOC of the inserted disc.
#[derive(Debug, Clone)]
pub struct DriveController {
    pub(crate) session: SessionState,
    pub(crate) response: StatusBlock,
    pub(crate) registers: HostRegisters,
    pub(crate) toc: Toc,
    pub(crate) disc_present: bool,
    pub(crate) config: DriveConfig,
}

impl DriveController {
    /// Create a drive with default configuration, no disc and a closed tray
    pub fn new() -> Self {
        Self::with_config(DriveConfig::default())
    }

    /// Create a drive with the given configuration
    pub fn with_config(config: DriveConfig) -> Self {
        Self {
            session: SessionState::new(DriveStatus::NoDisc),
            response: StatusBlock::default(),
            registers: HostRegisters::new(),
            toc: Toc::default(),
            disc_present: false,
            config,
        }
    }

    /// Reset the drive logic and the CDD registers
    ///
    /// An open tray stays open; otherwise the drive comes up Ready or NoDisc
    /// depending on disc presence.
    pub fn reset(&mut self) {
        let status = match self.session.status {
            DriveStatus::TrayOpen => DriveStatus::TrayOpen,
            _ if self.disc_present => DriveStatus::Ready,
            _ => DriveStatus::NoDisc,
        };
        self.session = SessionState::new(status);
        self.response = StatusBlock::default();
        self.registers.reset();

        log::debug!("CDD: Reset ({:?})", status);
    }

    /// Insert the disc image at `path`
    ///
    /// With the tray open the drive closes it when `auto_close_on_insert` is
    /// set; otherwise the host is expected to issue Close Tray itself.
    pub fn insert_disc<H: DriveHooks + ?Sized>(
        &mut self,
        path: &Path,
        hooks: &mut H,
    ) -> Result<(), CddError> {
        self.disc_present = false;

        let result = hooks.load_disc(path);
        match &result {
            Ok(toc) => {
                log::info!(
                    "CDD: Disc inserted: {} tracks, lead-out {}",
                    toc.last_track(),
                    toc.lead_out()
                );
                self.toc = toc.clone();
                self.disc_present = true;

                if self.session.status == DriveStatus::TrayOpen {
                    if self.config.auto_close_on_insert {
                        self.close_tray(hooks);
                    }
                } else {
                    self.session.status = DriveStatus::Ready;
                }
            }
            Err(e) => {
                log::warn!("CDD: Failed to load disc '{}': {}", path.display(), e);
                self.toc = Toc::default();
            }
        }

        if self.session.status != DriveStatus::TrayOpen && !self.disc_present {
            self.session.status = DriveStatus::NoDisc;
        }

        result.map(|_| ())
    }

    /// Remove the disc image without touching the tray
    ///
    /// Returns whether a disc was present.
    pub fn eject_disc<H: DriveHooks + ?Sized>(&mut self, hooks: &mut H) -> bool {
        let was_present = self.disc_present;

        hooks.unload_disc();
        self.disc_present = false;
        self.toc = Toc::default();

        log::info!("CDD: Disc ejected");
        was_present
    }

    /// Release the disc image at emulator shutdown
    pub fn shutdown<H: DriveHooks + ?Sized>(&mut self, hooks: &mut H) {
        hooks.unload_disc();
        self.disc_present = false;
    }

    /// Write `block` into the command registers and process it
    pub fn submit_command<H: DriveHooks + ?Sized>(&mut self, block: CommandBlock, hooks: &mut H) {
        self.registers.write_command(block.bytes());
        self.process_command(hooks);
    }

    /// Drive-level status
    pub fn status(&self) -> DriveStatus {
        self.session.status
    }

    /// Current block address
    pub fn cur_lba(&self) -> i32 {
        self.session.cur_lba
    }

    /// Current track number
    pub fn cur_track(&self) -> u8 {
        self.session.cur_track
    }

    /// True while the CDC is reading
    pub fn is_reading(&self) -> bool {
        self.session.cdc_reading
    }

    /// True when a response waits for the next tick
    pub fn response_pending(&self) -> bool {
        self.session.response_pending
    }

    /// Ticks left before data sectors are decoded
    pub fn read_start_delay(&self) -> u32 {
        self.session.read_start_delay
    }

    /// True when a disc is loaded
    pub fn has_disc(&self) -> bool {
        self.disc_present
    }

    /// Table of Contents of the inserted disc (empty without one)
    pub fn toc(&self) -> &Toc {
        &self.toc
    }

    /// Response waiting to be exported
    pub fn response(&self) -> &StatusBlock {
        &self.response
    }

    /// Session state
    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// Host register surface
    pub fn registers(&self) -> &HostRegisters {
        &self.registers
    }

    /// Host register surface for host-side writes
    pub fn registers_mut(&mut self) -> &mut HostRegisters {
        &mut self.registers
    }

    /// Drive configuration
    pub fn config(&self) -> &DriveConfig {
        &self.config
    }
}

impl Default for DriveController {
    fn default() -> Self {
        Self::new()
    }
}
