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

//! CDD command implementations
//!
//! This module decodes the host command block and implements every drive
//! command (Status, Stop, Read TOC, Play, Seek, ...). Each handler ends by
//! queueing a response for the next export.

use super::registers::{to_bcd_word, CommandBlock};
use super::timecode::{Msf, Toc, PAST_LAST_TRACK, PREGAP_SECTORS};
use super::{DriveController, DriveHooks, DriveStatus, DATA_TRACK};

/// Response status word while playing
const STATUS_PLAYING_ACK: u16 = 0x0102;

/// Response status word after a seek
const STATUS_SEEK_ACK: u16 = 0x0200;

/// Response status word after the tray opened
const STATUS_TRAY_OPEN_ACK: u16 = 0x0E00;

/// Scan responses flag the command as still in progress
const SCAN_IN_PROGRESS: u16 = 0x0002;

/// One-shot sub-codes the Status command folds back into the drive status
const TRANSIENT_SUB_CODES: [u16; 3] = [0x0200, 0x0700, 0x0E00];

/// Minute word reported for a position past the last track
const PAST_LAST_TRACK_WORD: u16 = 0x0A02;

/// Frame word flag marking the data track in a track start report
const DATA_TRACK_FLAG: u16 = 0x0800;

/// Seek distance is `|delta LBA| >> SEEK_DISTANCE_SHIFT` ticks
const SEEK_DISTANCE_SHIFT: u32 = 12;

/// Shortest seek once the head is past the disc start
const MIN_SEEK_TICKS: u32 = 13;

/// Spin-up cost when starting playback from a non-playing state
const SPIN_UP_TICKS: u32 = 20;

/// Why a command was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReason {
    /// The tray is open
    TrayOpen,
    /// No disc is loaded
    NoDisc,
}

/// Result of the pre-command checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardOutcome {
    /// The guard answered the command itself
    Blocked(BlockReason),
    /// The command may run
    Proceed,
}

impl GuardOutcome {
    /// True when the guard answered the command itself
    pub fn is_blocked(self) -> bool {
        matches!(self, GuardOutcome::Blocked(_))
    }
}

/// Which checks a command is subject to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Guard {
    /// Tray check only (status queries, Stop, Open Tray)
    Tray,
    /// Tray check, then disc presence (transport commands)
    TrayAndDisc,
}

/// Read TOC report selected by the sub-opcode digit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TocQuery {
    /// Current absolute position
    AbsolutePosition,
    /// Elapsed time in the current track
    RelativePosition,
    /// Current track number
    CurrentTrack,
    /// Total disc length (lead-out)
    DiscLength,
    /// First and last track numbers
    FirstLastTrack,
    /// Start position of the requested track
    TrackStart(u8),
    /// Unrecognized sub-opcode
    Invalid(u8),
}

impl TocQuery {
    fn decode(block: &CommandBlock) -> Self {
        match block.sub_opcode() {
            0x0 => TocQuery::AbsolutePosition,
            0x1 => TocQuery::RelativePosition,
            0x2 => TocQuery::CurrentTrack,
            0x3 => TocQuery::DiscLength,
            0x4 => TocQuery::FirstLastTrack,
            0x5 => TocQuery::TrackStart(block.track_number()),
            sub => TocQuery::Invalid(sub),
        }
    }

    /// Report type echoed in the low byte of the status word
    pub fn report_code(self) -> u16 {
        match self {
            TocQuery::AbsolutePosition => 0x0,
            TocQuery::RelativePosition => 0x1,
            TocQuery::CurrentTrack => 0x2,
            TocQuery::DiscLength => 0x3,
            TocQuery::FirstLastTrack => 0x4,
            TocQuery::TrackStart(_) => 0x5,
            TocQuery::Invalid(_) => 0xF,
        }
    }
}

/// Decoded drive command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CddCommand {
    Status,
    StopAll,
    ReadToc(TocQuery),
    Play(Msf),
    Seek(Msf),
    Pause,
    Resume,
    FastForward,
    FastRewind,
    Recover,
    CloseTray,
    OpenTray,
    Unknown(u8),
}

impl CddCommand {
    /// Decode a command block, keyed by its opcode nibble
    pub fn decode(block: &CommandBlock) -> Self {
        match block.opcode() {
            0x0 => CddCommand::Status,
            0x1 => CddCommand::StopAll,
            0x2 => CddCommand::ReadToc(TocQuery::decode(block)),
            0x3 => CddCommand::Play(block.msf()),
            0x4 => CddCommand::Seek(block.msf()),
            0x6 => CddCommand::Pause,
            0x7 => CddCommand::Resume,
            0x8 => CddCommand::FastForward,
            0x9 => CddCommand::FastRewind,
            0xA => CddCommand::Recover,
            0xC => CddCommand::CloseTray,
            0xD => CddCommand::OpenTray,
            op => CddCommand::Unknown(op),
        }
    }
}

/// Minute word naming `track`, with the past-the-end marker for track 100
fn track_word(track: u8) -> u16 {
    if track == PAST_LAST_TRACK {
        PAST_LAST_TRACK_WORD
    } else {
        to_bcd_word(track)
    }
}

impl DriveController {
    /// Process the command block currently in the command registers
    ///
    /// Never fails: malformed parameters clamp, unknown opcodes report the
    /// current status. The response is exported on the next [`tick`].
    ///
    /// [`tick`]: DriveController::tick
    pub fn process_command<H: DriveHooks + ?Sized>(&mut self, hooks: &mut H) {
        let block = *self.registers.command();
        log::trace!("CDD in: {:02X?}", block.bytes());

        match CddCommand::decode(&block) {
            CddCommand::Status => self.cmd_status(),
            CddCommand::StopAll => self.cmd_stop_all(),
            CddCommand::ReadToc(query) => self.cmd_read_toc(query),
            CddCommand::Play(msf) => self.cmd_play(msf, hooks),
            CddCommand::Seek(msf) => self.cmd_seek(msf),
            CddCommand::Pause => self.cmd_pause(),
            CddCommand::Resume => self.cmd_resume(hooks),
            CddCommand::FastForward => self.cmd_scan(DriveStatus::FastForward),
            CddCommand::FastRewind => self.cmd_scan(DriveStatus::FastReverse),
            CddCommand::Recover => self.cmd_recover(),
            CddCommand::CloseTray => self.close_tray(hooks),
            CddCommand::OpenTray => self.cmd_open_tray(hooks),
            CddCommand::Unknown(op) => {
                log::warn!("CDD: Unknown command 0x{:X}", op);
                self.cmd_passthrough();
            }
        }
    }

    /// Pre-command checks, tray first
    ///
    /// A blocked command has already been answered: status forced, timecode
    /// zeroed and the response queued.
    fn guard(&mut self, guard: Guard) -> GuardOutcome {
        if self.session.status == DriveStatus::TrayOpen {
            self.response.status = DriveStatus::TrayOpen.status_word();
            self.response.clear_timecode();
            self.session.response_pending = true;
            return GuardOutcome::Blocked(BlockReason::TrayOpen);
        }

        if guard == Guard::TrayAndDisc && !self.disc_present {
            self.session.status = DriveStatus::NoDisc;
            self.response.status = DriveStatus::NoDisc.status_word();
            self.response.clear_timecode();
            self.session.response_pending = true;
            return GuardOutcome::Blocked(BlockReason::NoDisc);
        }

        GuardOutcome::Proceed
    }

    /// Halt the CDC read
    fn stop_cdc(&mut self) {
        self.session.cdc_reading = false;
    }

    /// Flag the stream type for the current track, starting CD-DA if needed
    fn start_stream<H: DriveHooks + ?Sized>(&mut self, hooks: &mut H) {
        if self.session.cur_track == DATA_TRACK {
            self.registers.set_data_flag(true);
        } else {
            self.registers.set_data_flag(false);
            hooks.start_audio_playback();
        }
    }

    /// Command 0x0: Status
    ///
    /// Folds one-shot sub-codes (seek done, TOC read, tray ack) back into
    /// the real drive status. The report byte is kept.
    fn cmd_status(&mut self) {
        let sub_code = self.response.status & 0x0F00;
        if TRANSIENT_SUB_CODES.contains(&sub_code) {
            self.response.status =
                (self.session.status.status_word() & 0xFF00) | (self.response.status & 0x00FF);
        }

        self.session.response_pending = true;
    }

    /// Command 0x1: Stop All
    fn cmd_stop_all(&mut self) {
        if self.guard(Guard::Tray).is_blocked() {
            return;
        }

        self.stop_cdc();

        self.session.status = if self.disc_present {
            DriveStatus::Stopped
        } else {
            DriveStatus::NoDisc
        };
        self.response.status = 0x0000;
        // Stopped: nothing streams, report data
        self.registers.set_data_flag(true);
        self.response.clear_timecode();

        log::debug!("CDD: Stop ({:?})", self.session.status);
        self.session.response_pending = true;
    }

    /// Command 0x2: Read TOC
    fn cmd_read_toc(&mut self, query: TocQuery) {
        self.response.status = (self.response.status & 0xFF00) | query.report_code();

        if let TocQuery::Invalid(sub) = query {
            log::warn!("CDD: Invalid TOC sub-command 0x{:X}", sub);
            self.cmd_status();
            return;
        }

        if self.guard(Guard::Tray).is_blocked() {
            return;
        }

        self.response.status &= 0x00FF;
        if !self.disc_present {
            self.session.status = DriveStatus::NoDisc;
        }
        self.response.status |= self.session.status.status_word();

        match query {
            TocQuery::AbsolutePosition => {
                self.response.set_timecode(Msf::from_lba(self.session.cur_lba));
                self.response.ext = 0;
            }
            TocQuery::RelativePosition => {
                let track = self.toc.lba_to_track(self.session.cur_lba);
                let elapsed = self.session.cur_lba - self.toc.track_to_lba(track as i32);
                // Relative times carry no pregap
                self.response
                    .set_timecode(Msf::from_lba(elapsed - PREGAP_SECTORS));
                self.response.ext = 0;
            }
            TocQuery::CurrentTrack => {
                self.session.cur_track = self.toc.lba_to_track(self.session.cur_lba);
                self.response.clear_timecode();
                self.response.minute = track_word(self.session.cur_track);
            }
            TocQuery::DiscLength => {
                self.response.set_timecode(self.toc.lead_out());
                self.response.ext = 0;
            }
            TocQuery::FirstLastTrack => {
                self.response.clear_timecode();
                self.response.minute = to_bcd_word(1);
                self.response.second = to_bcd_word(self.toc.last_track());
            }
            TocQuery::TrackStart(requested) => {
                let track = requested.min(self.toc.last_track()).max(1);

                self.response.set_timecode(self.toc.track_to_msf(track as i32));
                self.response.ext = track % 10;
                if track == DATA_TRACK {
                    self.response.frame |= DATA_TRACK_FLAG;
                }
            }
            // Answered as Status above
            TocQuery::Invalid(_) => {}
        }

        log::trace!("CDD: TOC report {:?}", query);
        self.session.response_pending = true;
    }

    /// Command 0x3: Play (read)
    ///
    /// Seek latency is modelled as a tick delay before data sectors are
    /// decoded: `|delta| >> 12`, at least 13 once past the disc start, plus
    /// 20 if the drive was not already playing.
    fn cmd_play<H: DriveHooks + ?Sized>(&mut self, msf: Msf, hooks: &mut H) {
        if self.guard(Guard::TrayAndDisc).is_blocked() {
            return;
        }

        self.session.cur_track = self.toc.msf_to_track(msf);

        let new_lba = msf.to_lba();
        let mut delay = new_lba.abs_diff(self.session.cur_lba) >> SEEK_DISTANCE_SHIFT;
        if self.session.cur_lba > 0 && delay < MIN_SEEK_TICKS {
            delay = MIN_SEEK_TICKS;
        }

        self.session.cur_lba = new_lba;

        log::debug!(
            "CDD: Play {} (LBA {}, track {})",
            msf,
            new_lba,
            self.session.cur_track
        );

        if self.session.status != DriveStatus::Playing {
            delay += SPIN_UP_TICKS;
        }

        self.session.status = DriveStatus::Playing;
        self.response.status = STATUS_PLAYING_ACK;

        // A read already counting down keeps its delay
        if self.session.read_start_delay == 0 {
            self.session.read_start_delay = delay;
        }

        self.start_stream(hooks);

        self.response.clear_timecode();
        self.response.minute = track_word(self.session.cur_track);

        self.session.cdc_reading = true;
        self.session.response_pending = true;
    }

    /// Command 0x4: Seek
    fn cmd_seek(&mut self, msf: Msf) {
        if self.guard(Guard::TrayAndDisc).is_blocked() {
            return;
        }

        self.session.cur_track = self.toc.msf_to_track(msf);
        self.session.cur_lba = msf.to_lba();

        self.stop_cdc();

        self.session.status = DriveStatus::Ready;
        self.response.status = STATUS_SEEK_ACK;

        self.registers
            .set_data_flag(self.session.cur_track == DATA_TRACK);

        self.response.clear_timecode();

        log::debug!("CDD: Seek {} (LBA {})", msf, self.session.cur_lba);
        self.session.response_pending = true;
    }

    /// Command 0x6: Pause
    fn cmd_pause(&mut self) {
        if self.guard(Guard::TrayAndDisc).is_blocked() {
            return;
        }

        // A raw data read restarts from scratch after pause
        self.stop_cdc();

        self.session.status = DriveStatus::Ready;
        self.response.status = self.session.status.status_word();

        self.registers.set_data_flag(true);
        self.response.clear_timecode();

        log::debug!("CDD: Pause at LBA {}", self.session.cur_lba);
        self.session.response_pending = true;
    }

    /// Command 0x7: Resume
    fn cmd_resume<H: DriveHooks + ?Sized>(&mut self, hooks: &mut H) {
        if self.guard(Guard::TrayAndDisc).is_blocked() {
            return;
        }

        self.session.cur_track = self.toc.lba_to_track(self.session.cur_lba);

        log::debug!(
            "CDD: Resume at {} (LBA {})",
            Msf::from_lba(self.session.cur_lba),
            self.session.cur_lba
        );

        self.session.status = DriveStatus::Playing;
        self.response.status = STATUS_PLAYING_ACK;

        self.start_stream(hooks);

        self.response.clear_timecode();
        self.response.minute = track_word(self.session.cur_track);

        self.session.cdc_reading = true;
        self.session.response_pending = true;
    }

    /// Commands 0x8/0x9: Fast Forward / Fast Rewind
    ///
    /// The position itself moves in [`tick`](DriveController::tick).
    fn cmd_scan(&mut self, direction: DriveStatus) {
        if self.guard(Guard::TrayAndDisc).is_blocked() {
            return;
        }

        self.stop_cdc();

        self.session.status = direction;
        self.response.status = direction.status_word() | SCAN_IN_PROGRESS;

        self.response.clear_timecode();
        self.response.minute = to_bcd_word(self.session.cur_track);

        log::debug!("CDD: Scan {:?}", direction);
        self.session.response_pending = true;
    }

    /// Command 0xA: Recover
    fn cmd_recover(&mut self) {
        if self.guard(Guard::TrayAndDisc).is_blocked() {
            return;
        }

        self.stop_cdc();

        self.session.status = DriveStatus::Ready;
        self.response.status = self.session.status.status_word();

        self.response.clear_timecode();
        self.response.second = to_bcd_word(1);
        self.response.frame = to_bcd_word(1);

        self.session.response_pending = true;
    }

    /// Command 0xC: Close Tray
    ///
    /// Not guarded: closing is how the drive leaves the TrayOpen state.
    pub(super) fn close_tray<H: DriveHooks + ?Sized>(&mut self, hooks: &mut H) {
        self.stop_cdc();

        log::info!("CDD: Tray close");
        hooks.on_tray_close();

        self.session.status = if self.disc_present {
            DriveStatus::Stopped
        } else {
            DriveStatus::NoDisc
        };
        self.response.status = 0x0000;
        self.response.clear_timecode();

        self.session.response_pending = true;
    }

    /// Command 0xD: Open Tray
    ///
    /// Opening an open tray is answered by the tray guard.
    fn cmd_open_tray<H: DriveHooks + ?Sized>(&mut self, hooks: &mut H) {
        if self.guard(Guard::Tray).is_blocked() {
            return;
        }

        self.stop_cdc();

        log::info!("CDD: Tray open");

        hooks.unload_disc();
        self.disc_present = false;
        self.toc = Toc::default();

        hooks.on_tray_open();

        self.session.status = DriveStatus::TrayOpen;
        self.response.status = STATUS_TRAY_OPEN_ACK;
        self.response.clear_timecode();

        self.session.response_pending = true;
    }

    /// Unknown opcode: report the drive status unchanged
    fn cmd_passthrough(&mut self) {
        self.response.status = self.session.status.status_word();
        self.response.clear_timecode();

        self.session.response_pending = true;
    }
}
