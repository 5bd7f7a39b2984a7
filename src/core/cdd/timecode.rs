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

//! Timecode utilities
//!
//! Conversions between linear block addresses (LBA), Minute:Second:Frame
//! timecodes and track numbers, resolved against the disc's Table of Contents.
//!
//! # Addressing
//!
//! ```text
//! LBA = (minute * 60 + second) * 75 + frame - 150
//! ```
//!
//! The -150 offset is the two second pregap, so 00:02:00 is LBA 0 and the
//! lead-in area is addressed with negative LBAs down to -150.
//!
//! None of these conversions fail. Out-of-range inputs clamp to the nearest
//! valid answer, which is what the drive firmware does.

use serde::{Deserialize, Serialize};

/// Frames (sectors) per second
pub const FRAMES_PER_SECOND: i32 = 75;

/// Seconds per minute
pub const SECONDS_PER_MINUTE: i32 = 60;

/// Sectors in the pregap before LBA 0
pub const PREGAP_SECTORS: i32 = 150;

/// Lowest addressable LBA (start of the pregap)
pub const MIN_LBA: i32 = -PREGAP_SECTORS;

/// Track number reported when a position lies at or after the lead-out
pub const PAST_LAST_TRACK: u8 = 100;

/// Disc position in MSF (Minute:Second:Frame) format
///
/// All values are stored as decimal (not BCD).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Msf {
    /// Minute (0-99)
    pub minute: u8,
    /// Second (0-59)
    pub second: u8,
    /// Frame (0-74)
    pub frame: u8,
}

impl Msf {
    /// 00:00:00
    pub const ZERO: Msf = Msf::new(0, 0, 0);

    /// Create a new timecode
    pub const fn new(minute: u8, second: u8, frame: u8) -> Self {
        Self {
            minute,
            second,
            frame,
        }
    }

    /// Convert MSF to logical block address
    ///
    /// Total for any field values; callers clamp the result if they need to.
    ///
    /// # Example
    ///
    /// ```
    /// use mcdrive::core::cdd::Msf;
    ///
    /// assert_eq!(Msf::new(0, 2, 0).to_lba(), 0);
    /// assert_eq!(Msf::new(0, 0, 0).to_lba(), -150);
    /// ```
    pub fn to_lba(self) -> i32 {
        (self.minute as i32 * SECONDS_PER_MINUTE + self.second as i32) * FRAMES_PER_SECOND
            + self.frame as i32
            - PREGAP_SECTORS
    }

    /// Convert logical block address to MSF
    ///
    /// Addresses below the start of the pregap collapse to 00:00:00.
    /// Minutes past 255 saturate.
    pub fn from_lba(lba: i32) -> Self {
        let absolute = if lba < MIN_LBA {
            0
        } else {
            lba.saturating_add(PREGAP_SECTORS)
        };

        let minute = absolute / (SECONDS_PER_MINUTE * FRAMES_PER_SECOND);
        let second = (absolute / FRAMES_PER_SECOND) % SECONDS_PER_MINUTE;
        let frame = absolute % FRAMES_PER_SECOND;

        Self::new(
            u8::try_from(minute).unwrap_or(u8::MAX),
            second as u8,
            frame as u8,
        )
    }

    /// Packed comparison key, minute in the high byte
    ///
    /// Ordering on this key matches the firmware's track lookup, including
    /// for non-canonical timecodes decoded from the command block.
    fn sort_key(self) -> u32 {
        ((self.minute as u32) << 16) | ((self.second as u32) << 8) | self.frame as u32
    }
}

impl std::fmt::Display for Msf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.minute, self.second, self.frame)
    }
}

/// Table of Contents
///
/// Track start timecodes for tracks `1..=last_track`, followed by the
/// lead-out timecode that terminates the addressable range. Immutable once
/// built; the drive only ever reads it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toc {
    entries: Vec<Msf>,
}

impl Toc {
    /// Build a TOC from track start positions and the lead-out position
    ///
    /// # Example
    ///
    /// ```
    /// use mcdrive::core::cdd::{Msf, Toc};
    ///
    /// let toc = Toc::new(vec![Msf::new(0, 2, 0), Msf::new(3, 0, 0)], Msf::new(10, 0, 0));
    /// assert_eq!(toc.last_track(), 2);
    /// assert_eq!(toc.lba_to_track(0), 1);
    /// ```
    pub fn new(track_starts: Vec<Msf>, lead_out: Msf) -> Self {
        let mut entries = track_starts;
        entries.truncate(99);
        entries.push(lead_out);
        Self { entries }
    }

    /// Number of the last track (0 for an empty TOC)
    pub fn last_track(&self) -> u8 {
        self.entries.len().saturating_sub(1) as u8
    }

    /// True when the TOC has no tracks
    pub fn is_empty(&self) -> bool {
        self.last_track() == 0
    }

    /// Raw TOC entry by zero-based index
    ///
    /// Index `last_track()` is the lead-out. Missing entries read as 00:00:00.
    pub fn entry(&self, index: usize) -> Msf {
        self.entries.get(index).copied().unwrap_or_default()
    }

    /// Lead-out (end of disc) timecode
    pub fn lead_out(&self) -> Msf {
        self.entry(self.last_track() as usize)
    }

    /// Resolve the track containing `msf`
    ///
    /// Returns the last track whose start is not after `msf`, 1 for positions
    /// before the first track, and [`PAST_LAST_TRACK`] at or after the lead-out.
    pub fn msf_to_track(&self, msf: Msf) -> u8 {
        let key = msf.sort_key();
        let searched = self.last_track() as usize + 1;

        match self
            .entries
            .iter()
            .take(searched)
            .position(|entry| entry.sort_key() > key)
        {
            Some(index) => (index as u8).max(1),
            None => PAST_LAST_TRACK,
        }
    }

    /// Resolve the track containing `lba`
    pub fn lba_to_track(&self, lba: i32) -> u8 {
        self.msf_to_track(Msf::from_lba(lba))
    }

    /// Start timecode of `track`, clamped into `1..=last_track`
    pub fn track_to_msf(&self, track: i32) -> Msf {
        let track = track.min(self.last_track() as i32).max(1);
        self.entry(track as usize - 1)
    }

    /// Start LBA of `track`, clamped into `1..=last_track`
    pub fn track_to_lba(&self, track: i32) -> i32 {
        self.track_to_msf(track).to_lba()
    }
}
