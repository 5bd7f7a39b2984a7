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

//! CDC polling and status export
//!
//! [`DriveController::tick`] is called once per drive tick by the outer
//! scheduler. Each tick it:
//!
//! 1. Feeds the CDC: data sectors are decoded once the seek delay has run
//!    out; audio sectors hand an empty header to the decoder
//! 2. Exports a pending response into the status block and raises the
//!    CDD interrupt when the host has it enabled
//! 3. Moves the head while scanning

use super::registers::{to_bcd_byte, InterruptMask};
use super::timecode::{Msf, MIN_LBA};
use super::{DriveController, DriveHooks, DriveStatus, DATA_TRACK};

/// Mode byte of every data sector header handed to the decoder
const DATA_SECTOR_MODE: u8 = 0x01;

/// Build the 4-byte header of the data sector at `lba`
///
/// BCD minute, second and frame followed by the sector mode.
///
/// # Example
///
/// ```
/// use mcdrive::core::cdd::sector_header;
///
/// assert_eq!(sector_header(0), [0x00, 0x02, 0x00, 0x01]);
/// assert_eq!(sector_header(4500 * 12 + 75 * 34 + 56 - 150), [0x12, 0x34, 0x56, 0x01]);
/// ```
pub fn sector_header(lba: i32) -> [u8; 4] {
    let msf = Msf::from_lba(lba);
    [
        to_bcd_byte(msf.minute),
        to_bcd_byte(msf.second),
        to_bcd_byte(msf.frame),
        DATA_SECTOR_MODE,
    ]
}

impl DriveController {
    /// Advance the drive by one tick
    ///
    /// # Example
    ///
    /// ```
    /// use mcdrive::core::cdd::{CommandBlock, DriveController, DriveHooks, Toc};
    /// use mcdrive::core::error::CddError;
    /// use std::path::Path;
    ///
    /// struct Host { irqs: u32 }
    ///
    /// impl DriveHooks for Host {
    ///     fn load_disc(&mut self, _path: &Path) -> Result<Toc, CddError> { Err(CddError::NoDisc) }
    ///     fn unload_disc(&mut self) {}
    ///     fn decode_sector(&mut self, _header: [u8; 4]) -> i32 { 1 }
    ///     fn start_audio_playback(&mut self) {}
    ///     fn raise_interrupt(&mut self, _level: u8) { self.irqs += 1; }
    /// }
    ///
    /// let mut host = Host { irqs: 0 };
    /// let mut drive = DriveController::new();
    /// drive.registers_mut().set_interrupt_mask(mcdrive::core::cdd::InterruptMask::IEN4);
    ///
    /// drive.submit_command(CommandBlock::new(0x0, [0; 8]), &mut host);
    /// drive.tick(&mut host);
    ///
    /// assert!(!drive.response_pending());
    /// assert_eq!(host.irqs, 1);
    /// ```
    pub fn tick<H: DriveHooks + ?Sized>(&mut self, hooks: &mut H) {
        if self.session.cdc_reading {
            self.update_cdc(hooks);
        }

        if self.session.response_pending {
            self.session.response_pending = false;
            self.export_status(hooks);
        }

        let step = self.config.scan_step;
        match self.session.status {
            DriveStatus::FastForward => {
                self.session.cur_lba = self.session.cur_lba.saturating_add(step);
            }
            DriveStatus::FastReverse => {
                self.session.cur_lba = self.session.cur_lba.saturating_sub(step).max(MIN_LBA);
            }
            _ => {}
        }
    }

    /// Feed the sector decoder for the current read
    fn update_cdc<H: DriveHooks + ?Sized>(&mut self, hooks: &mut H) {
        if self.session.cur_track == DATA_TRACK {
            self.registers.set_data_flag(true);

            if self.session.read_start_delay == 0 {
                let header = sector_header(self.session.cur_lba);
                let consumed = hooks.decode_sector(header);
                self.session.cur_lba = self.session.cur_lba.saturating_add(consumed);

                log::trace!(
                    "CDC: Decoded {:02X?}, LBA now {}",
                    header,
                    self.session.cur_lba
                );
            } else {
                self.session.read_start_delay -= 1;
            }
        } else {
            // Audio samples come from the CD-DA streamer, not the decoder
            self.registers.set_data_flag(false);
            hooks.decode_sector([0; 4]);
        }
    }

    /// Write the response into the status block and signal the host
    pub fn export_status<H: DriveHooks + ?Sized>(&mut self, hooks: &mut H) {
        let bytes = self.response.to_bytes();
        self.registers.store_status(bytes);

        log::trace!("CDD out: {:02X?}", bytes);

        let level = self.config.interrupt_level;
        let enable = InterruptMask::for_level(level);
        if !enable.is_empty() && self.registers.interrupt_mask().contains(enable) {
            log::trace!("CDD: Raising interrupt level {}", level);
            hooks.raise_interrupt(level);
        }
    }
}
